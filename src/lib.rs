// veritext
// Document similarity scoring and statistical AI-content detection.
//
// The engine is a single synchronous boundary: `analyze` normalizes the
// candidate and reference texts, fans the per-reference comparisons out over
// a thread pool, scores the candidate for machine-generated style, and
// assembles one deterministic `Report`. Identical inputs and configuration
// always serialize to identical bytes.

pub mod models;
pub mod services;

pub use models::{
    AggregationOptions, AggregationPolicy, AiScoreResult, AiScorerOptions, AlgorithmKind,
    AnalysisConfig, AnalysisError, Highlight, NormalizerOptions, Report, SimilarityOptions,
    SimilarityResult,
};
pub use services::detection::{analyze, analyze_documents, analyze_with_cancel, CancelFlag};
pub use services::text_processor::{normalize, Document};
