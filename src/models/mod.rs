// veritext data models
// Configuration and report types shared across the engine

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;

/// Schema tag stamped into every report.
pub const REPORT_SCHEMA_VERSION: &str = "report-v1";

// ============ Errors ============

#[derive(Debug, Error)]
pub enum AnalysisError {
    /// A document-level precondition failed (e.g. blank document id).
    #[error("invalid input: {0}")]
    InvalidInput(String),
    /// A configuration parameter is out of range.
    #[error("configuration error: {0}")]
    Configuration(String),
}

// ============ Algorithm Identity ============

/// The similarity algorithms the engine can run for a document pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlgorithmKind {
    Cosine,
    Jaccard,
    Sequence,
    NgramOverlap,
}

impl AlgorithmKind {
    /// Canonical execution and report order.
    pub const ALL: [AlgorithmKind; 4] = [
        AlgorithmKind::Cosine,
        AlgorithmKind::Jaccard,
        AlgorithmKind::Sequence,
        AlgorithmKind::NgramOverlap,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AlgorithmKind::Cosine => "cosine",
            AlgorithmKind::Jaccard => "jaccard",
            AlgorithmKind::Sequence => "sequence",
            AlgorithmKind::NgramOverlap => "ngram_overlap",
        }
    }
}

// ============ Normalizer Options ============

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizerOptions {
    /// Lowercase token text (offsets always index the raw input).
    #[serde(default = "default_true")]
    pub case_fold: bool,
    /// Keep internal apostrophes and hyphens inside a single token,
    /// so "don't" stays one token instead of splitting into "don" + "t".
    #[serde(default)]
    pub keep_word_punctuation: bool,
    /// Case-folded tokens to drop from the normalized sequence.
    #[serde(default)]
    pub stop_words: HashSet<String>,
}

impl Default for NormalizerOptions {
    fn default() -> Self {
        Self {
            case_fold: true,
            keep_word_punctuation: false,
            stop_words: HashSet::new(),
        }
    }
}

// ============ Similarity Options ============

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimilarityOptions {
    /// Which algorithms to run; execution order follows `AlgorithmKind::ALL`.
    #[serde(default = "default_algorithms")]
    pub algorithms: Vec<AlgorithmKind>,
    /// Tokens per shingle for the Jaccard algorithm.
    #[serde(default = "default_shingle_len")]
    pub shingle_len: usize,
    /// Tokens per window for the n-gram overlap algorithm.
    #[serde(default = "default_ngram_len")]
    pub ngram_len: usize,
    /// Matched runs shorter than this many tokens are not reported as spans.
    #[serde(default = "default_min_span_tokens")]
    pub min_span_tokens: usize,
}

impl Default for SimilarityOptions {
    fn default() -> Self {
        Self {
            algorithms: default_algorithms(),
            shingle_len: default_shingle_len(),
            ngram_len: default_ngram_len(),
            min_span_tokens: default_min_span_tokens(),
        }
    }
}

// ============ AI Scorer Options ============

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AiScorerOptions {
    /// Below this many tokens the scorer returns the neutral low-confidence result.
    #[serde(default = "default_min_tokens")]
    pub min_tokens: usize,
    #[serde(default)]
    pub weights: AiFeatureWeights,
}

impl Default for AiScorerOptions {
    fn default() -> Self {
        Self {
            min_tokens: default_min_tokens(),
            weights: AiFeatureWeights::default(),
        }
    }
}

/// Relative weight of each feature contribution in the AI score.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AiFeatureWeights {
    #[serde(default = "default_w_burstiness")]
    pub burstiness: f64,
    #[serde(default = "default_w_repetition")]
    pub repetition: f64,
    #[serde(default = "default_w_vocabulary")]
    pub vocabulary: f64,
    #[serde(default = "default_w_predictability")]
    pub predictability: f64,
    #[serde(default = "default_w_sentence_len")]
    pub sentence_len: f64,
}

impl Default for AiFeatureWeights {
    fn default() -> Self {
        Self {
            burstiness: default_w_burstiness(),
            repetition: default_w_repetition(),
            vocabulary: default_w_vocabulary(),
            predictability: default_w_predictability(),
            sentence_len: default_w_sentence_len(),
        }
    }
}

// ============ Aggregation Options ============

/// How per-algorithm scores combine into one score per reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AggregationPolicy {
    Max,
    Mean,
    #[default]
    Weighted,
}

/// Per-algorithm weights for the weighted policy.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlgorithmWeights {
    #[serde(default = "default_aw_cosine")]
    pub cosine: f64,
    #[serde(default = "default_aw_jaccard")]
    pub jaccard: f64,
    #[serde(default = "default_aw_sequence")]
    pub sequence: f64,
    #[serde(default = "default_aw_ngram")]
    pub ngram_overlap: f64,
}

impl Default for AlgorithmWeights {
    fn default() -> Self {
        Self {
            cosine: default_aw_cosine(),
            jaccard: default_aw_jaccard(),
            sequence: default_aw_sequence(),
            ngram_overlap: default_aw_ngram(),
        }
    }
}

impl AlgorithmWeights {
    pub fn for_algorithm(&self, kind: AlgorithmKind) -> f64 {
        match kind {
            AlgorithmKind::Cosine => self.cosine,
            AlgorithmKind::Jaccard => self.jaccard,
            AlgorithmKind::Sequence => self.sequence,
            AlgorithmKind::NgramOverlap => self.ngram_overlap,
        }
    }
}

/// Severity band edges applied to the overall confidence (exclusive lower bounds).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeverityThresholds {
    #[serde(default = "default_sev_moderate")]
    pub moderate: f64,
    #[serde(default = "default_sev_high")]
    pub high: f64,
    #[serde(default = "default_sev_critical")]
    pub critical: f64,
}

impl Default for SeverityThresholds {
    fn default() -> Self {
        Self {
            moderate: default_sev_moderate(),
            high: default_sev_high(),
            critical: default_sev_critical(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregationOptions {
    #[serde(default)]
    pub policy: AggregationPolicy,
    #[serde(default)]
    pub algorithm_weights: AlgorithmWeights,
    /// Overall confidence above this threshold marks the candidate as flagged.
    #[serde(default = "default_flag_threshold")]
    pub flag_threshold: f64,
    #[serde(default)]
    pub severity: SeverityThresholds,
}

impl Default for AggregationOptions {
    fn default() -> Self {
        Self {
            policy: AggregationPolicy::default(),
            algorithm_weights: AlgorithmWeights::default(),
            flag_threshold: default_flag_threshold(),
            severity: SeverityThresholds::default(),
        }
    }
}

// ============ Top-level Config ============

/// Explicit per-call configuration; the engine reads no ambient state.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisConfig {
    #[serde(default)]
    pub normalizer: NormalizerOptions,
    #[serde(default)]
    pub similarity: SimilarityOptions,
    #[serde(default)]
    pub ai: AiScorerOptions,
    #[serde(default)]
    pub aggregation: AggregationOptions,
}

// ============ Spans & Similarity Results ============

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpanRange {
    /// UTF-8 byte offset (0-based) into the raw document text.
    pub start: usize,
    /// UTF-8 byte offset (0-based, end-exclusive) into the raw document text.
    pub end: usize,
}

impl SpanRange {
    pub fn overlaps_or_touches(&self, other: &SpanRange) -> bool {
        self.start <= other.end && other.start <= self.end
    }
}

/// A matched region in both documents, justified by one algorithm.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchedSpan {
    pub candidate: SpanRange,
    pub reference: SpanRange,
    /// Matched run length in tokens.
    pub tokens: usize,
}

/// One record per (algorithm, candidate/reference pair).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimilarityResult {
    pub algorithm: AlgorithmKind,
    pub reference_id: String,
    pub score: f64,
    #[serde(default)]
    pub spans: Vec<MatchedSpan>,
}

// ============ AI Score Results ============

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AiVerdict {
    AiGenerated,
    HumanWritten,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfidenceBand {
    High,
    Medium,
    Low,
}

/// Raw statistical feature values backing the AI score.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AiFeatures {
    pub token_count: usize,
    pub sentence_count: usize,
    pub mean_sentence_len: f64,
    pub sentence_len_stddev: f64,
    /// Coefficient of variation of sentence lengths (stddev / mean).
    pub burstiness: f64,
    /// Share of vocabulary items occurring at least three times.
    pub repetition_rate: f64,
    /// Type/token ratio.
    pub vocabulary_ratio: f64,
    /// 1 - H/ln(V): normalized inverse unigram entropy.
    pub predictability: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AiScoreResult {
    pub document_id: String,
    /// Confidence in [0,1] that the text is machine-generated.
    pub score: f64,
    /// True when the document was too short for a meaningful score.
    pub low_confidence: bool,
    pub verdict: AiVerdict,
    pub band: ConfidenceBand,
    pub features: AiFeatures,
    pub explanations: Vec<String>,
}

// ============ Aggregated Report ============

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Low,
    Moderate,
    High,
    Critical,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReferenceAssessment {
    pub reference_id: String,
    /// Policy-combined score for this reference.
    pub combined_score: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OverallAssessment {
    /// Maximum policy-combined score across references.
    pub plagiarism_confidence: f64,
    pub severity: Severity,
    pub flagged: bool,
    pub policy: AggregationPolicy,
    pub per_reference: Vec<ReferenceAssessment>,
}

/// A deduplicated candidate region that contributed to the verdict.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Highlight {
    pub range: SpanRange,
    /// Algorithms whose spans fall inside this range, in canonical order.
    pub algorithms: Vec<AlgorithmKind>,
    /// Best score among the contributing algorithms.
    pub score: f64,
    pub reason: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentSummary {
    pub id: String,
    /// Content hash, "sha256:<hex>".
    pub fingerprint: String,
    pub tokens: usize,
    pub chars: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisSummary {
    /// References requested by the caller.
    pub reference_count: usize,
    /// References actually compared (lower only when cancelled).
    pub compared_references: usize,
    pub cancelled: bool,
}

/// Everything one analysis produced. Holds no wall-clock data so that
/// identical inputs serialize to identical bytes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    pub schema_version: String,
    pub candidate: DocumentSummary,
    pub references: Vec<DocumentSummary>,
    pub similarity: Vec<SimilarityResult>,
    pub ai: AiScoreResult,
    pub overall: OverallAssessment,
    pub highlights: Vec<Highlight>,
    pub summary: AnalysisSummary,
}

// ============ Default Value Functions ============

fn default_true() -> bool { true }
fn default_algorithms() -> Vec<AlgorithmKind> { AlgorithmKind::ALL.to_vec() }
fn default_shingle_len() -> usize { 3 }
fn default_ngram_len() -> usize { 2 }
fn default_min_span_tokens() -> usize { 3 }
fn default_min_tokens() -> usize { 20 }
fn default_w_burstiness() -> f64 { 0.30 }
fn default_w_repetition() -> f64 { 0.20 }
fn default_w_vocabulary() -> f64 { 0.25 }
fn default_w_predictability() -> f64 { 0.15 }
fn default_w_sentence_len() -> f64 { 0.10 }
fn default_aw_cosine() -> f64 { 0.30 }
fn default_aw_jaccard() -> f64 { 0.20 }
fn default_aw_sequence() -> f64 { 0.30 }
fn default_aw_ngram() -> f64 { 0.20 }
fn default_flag_threshold() -> f64 { 0.50 }
fn default_sev_moderate() -> f64 { 0.40 }
fn default_sev_high() -> f64 { 0.60 }
fn default_sev_critical() -> f64 { 0.75 }
