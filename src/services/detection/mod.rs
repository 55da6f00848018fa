// Detection Engine
// Plagiarism analysis core organized into specialized submodules:
// - similarity: per-algorithm document comparison with matched spans
// - ai_scorer: statistical AI-content scoring
// - highlights: merged candidate regions across algorithms
// - aggregation: per-reference combination and report assembly

pub mod aggregation;
pub mod ai_scorer;
pub mod highlights;
pub mod similarity;

use rayon::prelude::*;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info};

use crate::models::{AnalysisConfig, AnalysisError, Report, SimilarityOptions, SimilarityResult};
use crate::services::text_processor::{normalize, Document};

pub use aggregation::{aggregate, combine_scores};
pub use ai_scorer::score as score_ai;
pub use highlights::extract_highlights;
pub use similarity::compare;

/// Cooperative cancellation handle. Cloning shares the flag.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self(Arc::new(AtomicBool::new(false)))
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Normalize raw texts and run the full analysis. The candidate is given the
/// id "candidate" and references "reference-1".."reference-N".
pub fn analyze(
    candidate_text: &str,
    reference_texts: &[&str],
    config: &AnalysisConfig,
) -> Result<Report, AnalysisError> {
    let candidate = normalize("candidate", candidate_text, &config.normalizer)?;
    let references = reference_texts
        .iter()
        .enumerate()
        .map(|(index, text)| {
            normalize(&format!("reference-{}", index + 1), text, &config.normalizer)
        })
        .collect::<Result<Vec<_>, _>>()?;
    analyze_documents(&candidate, &references, config)
}

/// Analysis over pre-normalized documents.
pub fn analyze_documents(
    candidate: &Document,
    references: &[Document],
    config: &AnalysisConfig,
) -> Result<Report, AnalysisError> {
    analyze_with_cancel(candidate, references, config, &CancelFlag::new())
}

/// Analysis with cooperative cancellation: comparisons not yet dispatched
/// when the flag is set are skipped, comparisons already running finish, and
/// whatever completed is aggregated with `summary.cancelled = true`.
pub fn analyze_with_cancel(
    candidate: &Document,
    references: &[Document],
    config: &AnalysisConfig,
    cancel: &CancelFlag,
) -> Result<Report, AnalysisError> {
    validate_similarity_options(&config.similarity)?;

    info!(
        candidate = %candidate.id,
        references = references.len(),
        tokens = candidate.tokens.len(),
        "analysis.start"
    );

    // flag checked once per reference, before its comparison starts
    let compared: Vec<(usize, Vec<SimilarityResult>)> = references
        .par_iter()
        .enumerate()
        .filter(|_| !cancel.is_cancelled())
        .map(|(index, reference)| {
            (
                index,
                similarity::compare(candidate, reference, &config.similarity),
            )
        })
        .collect();
    let cancelled = cancel.is_cancelled();

    let compared_refs: Vec<&Document> = compared
        .iter()
        .map(|(index, _)| &references[*index])
        .collect();
    let results: Vec<Vec<SimilarityResult>> =
        compared.into_iter().map(|(_, results)| results).collect();
    debug!(
        compared = compared_refs.len(),
        cancelled, "analysis.compared"
    );

    let ai = ai_scorer::score(candidate, &config.ai)?;
    debug!(
        score = ai.score,
        low_confidence = ai.low_confidence,
        "analysis.ai_scored"
    );

    let mut report = aggregation::aggregate(
        candidate,
        &compared_refs,
        results,
        ai,
        &config.aggregation,
    )?;
    report.summary.reference_count = references.len();
    report.summary.cancelled = cancelled;

    info!(
        confidence = report.overall.plagiarism_confidence,
        flagged = report.overall.flagged,
        highlights = report.highlights.len(),
        "analysis.done"
    );
    Ok(report)
}

fn validate_similarity_options(options: &SimilarityOptions) -> Result<(), AnalysisError> {
    if options.shingle_len == 0 {
        return Err(AnalysisError::Configuration(
            "shingleLen must be at least 1".to_string(),
        ));
    }
    if options.ngram_len == 0 {
        return Err(AnalysisError::Configuration(
            "ngramLen must be at least 1".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AlgorithmKind, Severity};

    const LONG_TEXT: &str = "The quick brown fox jumps over the lazy dog near \
                             the quiet river bank while evening settles slowly";

    #[test]
    fn test_identical_documents_are_flagged_with_full_highlight() {
        let report = analyze(LONG_TEXT, &[LONG_TEXT], &AnalysisConfig::default()).unwrap();
        assert!(report.overall.plagiarism_confidence >= 0.95);
        assert!(report.overall.flagged);
        assert_eq!(report.overall.severity, Severity::Critical);

        // one merged highlight covering the document end to end
        assert_eq!(report.highlights.len(), 1);
        let range = report.highlights[0].range;
        assert_eq!(range.start, 0);
        assert_eq!(range.end, LONG_TEXT.len());
        assert!(report.highlights[0]
            .algorithms
            .contains(&AlgorithmKind::Sequence));
    }

    #[test]
    fn test_empty_candidate_scores_zero_without_error() {
        let report = analyze("", &[LONG_TEXT], &AnalysisConfig::default()).unwrap();
        for result in &report.similarity {
            assert_eq!(result.score, 0.0);
        }
        assert_eq!(report.overall.plagiarism_confidence, 0.0);
        assert!(!report.overall.flagged);
        assert!(report.highlights.is_empty());
        assert!(report.ai.low_confidence);
        assert_eq!(report.summary.reference_count, 1);
        assert_eq!(report.summary.compared_references, 1);
    }

    #[test]
    fn test_empty_reference_document_scores_zero_without_error() {
        let report = analyze(LONG_TEXT, &[""], &AnalysisConfig::default()).unwrap();
        assert_eq!(report.similarity.len(), 4);
        for result in &report.similarity {
            assert_eq!(result.score, 0.0);
            assert!(result.spans.is_empty());
        }
        assert_eq!(report.overall.plagiarism_confidence, 0.0);
        assert!(report.highlights.is_empty());
        assert_eq!(report.references[0].tokens, 0);
    }

    #[test]
    fn test_report_round_trips_through_json() {
        let report = analyze(LONG_TEXT, &[LONG_TEXT], &AnalysisConfig::default()).unwrap();
        let json = serde_json::to_string(&report).unwrap();
        let back: Report = serde_json::from_str(&json).unwrap();
        assert_eq!(serde_json::to_string(&back).unwrap(), json);
    }

    #[test]
    fn test_no_references_still_reports_ai_score() {
        let report = analyze(LONG_TEXT, &[], &AnalysisConfig::default()).unwrap();
        assert!(report.similarity.is_empty());
        assert_eq!(report.overall.plagiarism_confidence, 0.0);
        assert_eq!(report.ai.document_id, "candidate");
        assert_eq!(report.summary.reference_count, 0);
    }

    #[test]
    fn test_results_ordered_by_reference_then_algorithm() {
        let report = analyze(
            LONG_TEXT,
            &["some first reference text", "another second reference text"],
            &AnalysisConfig::default(),
        )
        .unwrap();
        assert_eq!(report.similarity.len(), 8);
        let expected: Vec<(String, AlgorithmKind)> = ["reference-1", "reference-2"]
            .iter()
            .flat_map(|id| {
                AlgorithmKind::ALL
                    .into_iter()
                    .map(|kind| (id.to_string(), kind))
            })
            .collect();
        let actual: Vec<(String, AlgorithmKind)> = report
            .similarity
            .iter()
            .map(|r| (r.reference_id.clone(), r.algorithm))
            .collect();
        assert_eq!(actual, expected);
        assert_eq!(report.overall.per_reference.len(), 2);
        assert_eq!(report.overall.per_reference[0].reference_id, "reference-1");
    }

    #[test]
    fn test_identical_inputs_serialize_identically() {
        let config = AnalysisConfig::default();
        let first = analyze(LONG_TEXT, &["a different reference entirely"], &config).unwrap();
        let second = analyze(LONG_TEXT, &["a different reference entirely"], &config).unwrap();
        assert_eq!(
            serde_json::to_string(&first).unwrap(),
            serde_json::to_string(&second).unwrap()
        );
    }

    #[test]
    fn test_cancel_before_start_skips_all_references() {
        let candidate = normalize("cand", LONG_TEXT, &Default::default()).unwrap();
        let references = vec![
            normalize("r1", "first reference", &Default::default()).unwrap(),
            normalize("r2", "second reference", &Default::default()).unwrap(),
        ];
        let cancel = CancelFlag::new();
        cancel.cancel();
        let report =
            analyze_with_cancel(&candidate, &references, &AnalysisConfig::default(), &cancel)
                .unwrap();
        assert!(report.summary.cancelled);
        assert_eq!(report.summary.reference_count, 2);
        assert_eq!(report.summary.compared_references, 0);
        assert!(report.similarity.is_empty());
        assert!(report.references.is_empty());
        assert_eq!(report.overall.plagiarism_confidence, 0.0);
    }

    #[test]
    fn test_uncancelled_flag_leaves_summary_clean() {
        let candidate = normalize("cand", LONG_TEXT, &Default::default()).unwrap();
        let references = vec![normalize("r1", "some reference", &Default::default()).unwrap()];
        let report = analyze_with_cancel(
            &candidate,
            &references,
            &AnalysisConfig::default(),
            &CancelFlag::new(),
        )
        .unwrap();
        assert!(!report.summary.cancelled);
        assert_eq!(report.summary.compared_references, 1);
    }

    #[test]
    fn test_zero_shingle_len_is_configuration_error() {
        let mut config = AnalysisConfig::default();
        config.similarity.shingle_len = 0;
        let err = analyze(LONG_TEXT, &[], &config).unwrap_err();
        assert!(matches!(err, AnalysisError::Configuration(_)));
    }

    #[test]
    fn test_blank_id_is_invalid_input() {
        let blank = normalize(" ", "text", &Default::default());
        assert!(matches!(blank, Err(AnalysisError::InvalidInput(_))));
    }
}
