// Highlight Extraction
// Merges per-algorithm matched spans into deduplicated candidate regions

use std::collections::HashSet;

use crate::models::{AlgorithmKind, Highlight, SimilarityResult, SpanRange};

struct Contribution {
    range: SpanRange,
    algorithm: AlgorithmKind,
    score: f64,
}

/// Merge every matched span's candidate range across all references into
/// non-overlapping highlights, ordered by start offset. Overlapping or
/// touching ranges collapse into one highlight carrying the union of
/// contributing algorithms and their best score.
pub fn extract_highlights(results: &[SimilarityResult]) -> Vec<Highlight> {
    let mut contributions: Vec<Contribution> = results
        .iter()
        .flat_map(|result| {
            result.spans.iter().map(|span| Contribution {
                range: span.candidate,
                algorithm: result.algorithm,
                score: result.score,
            })
        })
        .collect();
    if contributions.is_empty() {
        return vec![];
    }
    contributions.sort_by_key(|c| (c.range.start, c.range.end));

    let mut highlights = Vec::new();
    let mut range = contributions[0].range;
    let mut algorithms: HashSet<AlgorithmKind> = HashSet::new();
    algorithms.insert(contributions[0].algorithm);
    let mut best = contributions[0].score;

    for contribution in &contributions[1..] {
        if range.overlaps_or_touches(&contribution.range) {
            range.end = range.end.max(contribution.range.end);
            algorithms.insert(contribution.algorithm);
            best = best.max(contribution.score);
        } else {
            highlights.push(build_highlight(range, &algorithms, best));
            range = contribution.range;
            algorithms.clear();
            algorithms.insert(contribution.algorithm);
            best = contribution.score;
        }
    }
    highlights.push(build_highlight(range, &algorithms, best));

    highlights.sort_by_key(|h| (h.range.start, h.range.end));
    highlights
}

fn build_highlight(range: SpanRange, algorithms: &HashSet<AlgorithmKind>, score: f64) -> Highlight {
    // canonical order, not set order
    let ordered: Vec<AlgorithmKind> = AlgorithmKind::ALL
        .into_iter()
        .filter(|kind| algorithms.contains(kind))
        .collect();
    let names: Vec<&str> = ordered.iter().map(|kind| kind.as_str()).collect();
    Highlight {
        range,
        algorithms: ordered,
        score,
        reason: format!("matched by {}", names.join(", ")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MatchedSpan;

    fn result(
        algorithm: AlgorithmKind,
        score: f64,
        spans: Vec<(usize, usize)>,
    ) -> SimilarityResult {
        SimilarityResult {
            algorithm,
            reference_id: "ref".to_string(),
            score,
            spans: spans
                .into_iter()
                .map(|(start, end)| MatchedSpan {
                    candidate: SpanRange { start, end },
                    reference: SpanRange { start: 0, end: end - start },
                    tokens: 3,
                })
                .collect(),
        }
    }

    #[test]
    fn test_no_spans_no_highlights() {
        let results = vec![result(AlgorithmKind::Cosine, 0.9, vec![])];
        assert!(extract_highlights(&results).is_empty());
    }

    #[test]
    fn test_overlapping_spans_merge_with_canonical_algorithm_order() {
        let results = vec![
            result(AlgorithmKind::NgramOverlap, 0.4, vec![(10, 30)]),
            result(AlgorithmKind::Sequence, 0.7, vec![(20, 45)]),
        ];
        let highlights = extract_highlights(&results);
        assert_eq!(highlights.len(), 1);
        let h = &highlights[0];
        assert_eq!(h.range, SpanRange { start: 10, end: 45 });
        assert_eq!(
            h.algorithms,
            vec![AlgorithmKind::Sequence, AlgorithmKind::NgramOverlap]
        );
        assert_eq!(h.score, 0.7);
        assert_eq!(h.reason, "matched by sequence, ngram_overlap");
    }

    #[test]
    fn test_touching_spans_merge() {
        let results = vec![result(AlgorithmKind::Sequence, 0.5, vec![(0, 10), (10, 20)])];
        let highlights = extract_highlights(&results);
        assert_eq!(highlights.len(), 1);
        assert_eq!(highlights[0].range, SpanRange { start: 0, end: 20 });
    }

    #[test]
    fn test_separated_spans_stay_separate_and_sorted() {
        let results = vec![
            result(AlgorithmKind::Sequence, 0.5, vec![(40, 50)]),
            result(AlgorithmKind::NgramOverlap, 0.3, vec![(0, 10)]),
        ];
        let highlights = extract_highlights(&results);
        assert_eq!(highlights.len(), 2);
        assert_eq!(highlights[0].range, SpanRange { start: 0, end: 10 });
        assert_eq!(highlights[1].range, SpanRange { start: 40, end: 50 });
        assert_eq!(highlights[0].algorithms, vec![AlgorithmKind::NgramOverlap]);
    }

    #[test]
    fn test_same_algorithm_across_references_dedupes() {
        let mut first = result(AlgorithmKind::Sequence, 0.6, vec![(5, 15)]);
        first.reference_id = "ref-a".to_string();
        let mut second = result(AlgorithmKind::Sequence, 0.8, vec![(12, 25)]);
        second.reference_id = "ref-b".to_string();
        let highlights = extract_highlights(&[first, second]);
        assert_eq!(highlights.len(), 1);
        assert_eq!(highlights[0].algorithms, vec![AlgorithmKind::Sequence]);
        assert_eq!(highlights[0].score, 0.8);
    }
}
