// Aggregation Logic
// Combines per-algorithm scores into one verdict per report

use crate::models::{
    AggregationOptions, AggregationPolicy, AiScoreResult, AnalysisError, AnalysisSummary,
    OverallAssessment, ReferenceAssessment, Report, Severity, SeverityThresholds,
    SimilarityResult, REPORT_SCHEMA_VERSION,
};
use crate::services::detection::highlights::extract_highlights;
use crate::services::detection::similarity::round4;
use crate::services::text_processor::Document;

/// Assemble the final report from per-reference similarity results and the
/// AI score. `similarity` is aligned index-by-index with `references`; the
/// summary fields assume nothing was skipped (the engine overwrites them on
/// the cancellation path).
pub fn aggregate(
    candidate: &Document,
    references: &[&Document],
    similarity: Vec<Vec<SimilarityResult>>,
    ai: AiScoreResult,
    options: &AggregationOptions,
) -> Result<Report, AnalysisError> {
    let mut per_reference = Vec::with_capacity(references.len());
    for (reference, results) in references.iter().zip(similarity.iter()) {
        per_reference.push(ReferenceAssessment {
            reference_id: reference.id.clone(),
            combined_score: combine_scores(results, options)?,
        });
    }

    let confidence = per_reference
        .iter()
        .map(|assessment| assessment.combined_score)
        .fold(0.0, f64::max);
    let overall = OverallAssessment {
        plagiarism_confidence: confidence,
        severity: severity_for(confidence, &options.severity),
        flagged: confidence > options.flag_threshold,
        policy: options.policy,
        per_reference,
    };

    let flat: Vec<SimilarityResult> = similarity.into_iter().flatten().collect();
    let highlights = extract_highlights(&flat);

    Ok(Report {
        schema_version: REPORT_SCHEMA_VERSION.to_string(),
        candidate: candidate.summary(),
        references: references.iter().map(|r| r.summary()).collect(),
        similarity: flat,
        ai,
        overall,
        highlights,
        summary: AnalysisSummary {
            reference_count: references.len(),
            compared_references: references.len(),
            cancelled: false,
        },
    })
}

/// Combine the per-algorithm scores for one reference under the configured
/// policy. The weighted policy renormalizes over whichever algorithms are
/// present; no results at all combine to 0.0.
pub fn combine_scores(
    results: &[SimilarityResult],
    options: &AggregationOptions,
) -> Result<f64, AnalysisError> {
    if results.is_empty() {
        return Ok(0.0);
    }
    let combined = match options.policy {
        AggregationPolicy::Max => results.iter().map(|r| r.score).fold(0.0, f64::max),
        AggregationPolicy::Mean => {
            results.iter().map(|r| r.score).sum::<f64>() / results.len() as f64
        }
        AggregationPolicy::Weighted => {
            let mut weighted = 0.0;
            let mut weight_sum = 0.0;
            for result in results {
                let weight = options.algorithm_weights.for_algorithm(result.algorithm);
                if !weight.is_finite() || weight < 0.0 {
                    return Err(AnalysisError::Configuration(format!(
                        "algorithm weight for {} must be finite and non-negative, got {}",
                        result.algorithm.as_str(),
                        weight
                    )));
                }
                weighted += weight * result.score;
                weight_sum += weight;
            }
            if weight_sum <= 0.0 {
                return Err(AnalysisError::Configuration(
                    "algorithm weights for the enabled algorithms sum to zero".to_string(),
                ));
            }
            weighted / weight_sum
        }
    };
    Ok(round4(combined.clamp(0.0, 1.0)))
}

fn severity_for(confidence: f64, thresholds: &SeverityThresholds) -> Severity {
    if confidence > thresholds.critical {
        Severity::Critical
    } else if confidence > thresholds.high {
        Severity::High
    } else if confidence > thresholds.moderate {
        Severity::Moderate
    } else {
        Severity::Low
    }
}
