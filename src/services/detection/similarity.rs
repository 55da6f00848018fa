// Similarity Algorithms
// Cosine, Jaccard, longest-block sequence matching, and n-gram overlap

use indexmap::IndexMap;
use std::collections::{HashMap, HashSet};

use crate::models::{AlgorithmKind, MatchedSpan, SimilarityOptions, SimilarityResult, SpanRange};
use crate::services::text_processor::Document;

/// Run the configured algorithms for one candidate/reference pair, in the
/// canonical `AlgorithmKind::ALL` order.
pub fn compare(
    candidate: &Document,
    reference: &Document,
    options: &SimilarityOptions,
) -> Vec<SimilarityResult> {
    AlgorithmKind::ALL
        .into_iter()
        .filter(|kind| options.algorithms.contains(kind))
        .map(|kind| {
            let (score, spans) = match kind {
                AlgorithmKind::Cosine => (cosine_similarity(candidate, reference), vec![]),
                AlgorithmKind::Jaccard => (
                    jaccard_similarity(candidate, reference, options.shingle_len),
                    vec![],
                ),
                AlgorithmKind::Sequence => {
                    sequence_similarity(candidate, reference, options.min_span_tokens)
                }
                AlgorithmKind::NgramOverlap => ngram_overlap(
                    candidate,
                    reference,
                    options.ngram_len,
                    options.min_span_tokens,
                ),
            };
            SimilarityResult {
                algorithm: kind,
                reference_id: reference.id.clone(),
                score: round4(score),
                spans,
            }
        })
        .collect()
}

pub(crate) fn round4(score: f64) -> f64 {
    (score * 10000.0).round() / 10000.0
}

/// Term-frequency vector in first-seen token order, so dot products
/// accumulate in the same order on every run.
fn term_frequencies(doc: &Document) -> IndexMap<&str, f64> {
    let mut tf: IndexMap<&str, f64> = IndexMap::new();
    for token in &doc.tokens {
        *tf.entry(token.text.as_str()).or_insert(0.0) += 1.0;
    }
    tf
}

/// Cosine similarity of term-frequency vectors. Symmetric; 0.0 when either
/// document has no tokens.
pub fn cosine_similarity(a: &Document, b: &Document) -> f64 {
    let tf_a = term_frequencies(a);
    let tf_b = term_frequencies(b);

    let mut dot = 0.0;
    for (term, freq_a) in &tf_a {
        if let Some(freq_b) = tf_b.get(term) {
            dot += freq_a * freq_b;
        }
    }
    let norm_a = tf_a.values().map(|f| f * f).sum::<f64>().sqrt();
    let norm_b = tf_b.values().map(|f| f * f).sum::<f64>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    (dot / (norm_a * norm_b)).clamp(0.0, 1.0)
}

fn shingle_set(doc: &Document, shingle_len: usize) -> HashSet<String> {
    let len = shingle_len.max(1);
    doc.token_texts()
        .windows(len)
        .map(|w| w.join("\u{1f}"))
        .collect()
}

/// Jaccard similarity over token shingles. Symmetric; a document shorter
/// than `shingle_len` contributes an empty set, and an empty union is 0.0.
pub fn jaccard_similarity(a: &Document, b: &Document, shingle_len: usize) -> f64 {
    let set_a = shingle_set(a, shingle_len);
    let set_b = shingle_set(b, shingle_len);
    let intersection = set_a.intersection(&set_b).count();
    let union = set_a.len() + set_b.len() - intersection;
    if union == 0 {
        return 0.0;
    }
    intersection as f64 / union as f64
}

/// Greedy longest-contiguous-block decomposition over token sequences,
/// score `2M/(len_a+len_b)`. Tie-breaking prefers the earliest block in
/// `a`, then in `b`, so swapping the arguments can change the block set;
/// callers treat this score as oriented candidate-vs-reference.
pub fn sequence_similarity(
    a: &Document,
    b: &Document,
    min_span_tokens: usize,
) -> (f64, Vec<MatchedSpan>) {
    let texts_a = a.token_texts();
    let texts_b = b.token_texts();
    let total = texts_a.len() + texts_b.len();
    if total == 0 {
        return (0.0, vec![]);
    }

    let blocks = matching_blocks(&texts_a, &texts_b);
    let matched: usize = blocks.iter().map(|&(_, _, size)| size).sum();
    let score = (2.0 * matched as f64 / total as f64).clamp(0.0, 1.0);

    let spans = blocks
        .iter()
        .filter(|&&(_, _, size)| size >= min_span_tokens.max(1))
        .map(|&(i, j, size)| MatchedSpan {
            candidate: token_span(a, i, size),
            reference: token_span(b, j, size),
            tokens: size,
        })
        .collect();
    (score, spans)
}

/// All maximal matching blocks `(a_index, b_index, size)`, sorted by
/// position in `a`.
fn matching_blocks(a: &[&str], b: &[&str]) -> Vec<(usize, usize, usize)> {
    let mut b2j: HashMap<&str, Vec<usize>> = HashMap::new();
    for (j, word) in b.iter().enumerate() {
        b2j.entry(word).or_default().push(j);
    }

    let mut blocks = Vec::new();
    let mut queue = vec![(0usize, a.len(), 0usize, b.len())];
    while let Some((alo, ahi, blo, bhi)) = queue.pop() {
        let (i, j, size) = longest_match(a, &b2j, alo, ahi, blo, bhi);
        if size > 0 {
            blocks.push((i, j, size));
            if alo < i && blo < j {
                queue.push((alo, i, blo, j));
            }
            if i + size < ahi && j + size < bhi {
                queue.push((i + size, ahi, j + size, bhi));
            }
        }
    }
    blocks.sort_unstable();
    blocks
}

/// Longest block of `a[alo..ahi]` appearing in `b[blo..bhi]`, ties broken
/// toward the smallest `i`, then the smallest `j`.
fn longest_match(
    a: &[&str],
    b2j: &HashMap<&str, Vec<usize>>,
    alo: usize,
    ahi: usize,
    blo: usize,
    bhi: usize,
) -> (usize, usize, usize) {
    let (mut best_i, mut best_j, mut best_size) = (alo, blo, 0usize);
    let mut j2len: HashMap<usize, usize> = HashMap::new();
    for i in alo..ahi {
        let mut new_j2len: HashMap<usize, usize> = HashMap::new();
        if let Some(positions) = b2j.get(a[i]) {
            for &j in positions {
                if j < blo {
                    continue;
                }
                if j >= bhi {
                    break;
                }
                let len = if j == 0 {
                    1
                } else {
                    j2len.get(&(j - 1)).copied().unwrap_or(0) + 1
                };
                new_j2len.insert(j, len);
                if len > best_size {
                    best_i = i + 1 - len;
                    best_j = j + 1 - len;
                    best_size = len;
                }
            }
        }
        j2len = new_j2len;
    }
    (best_i, best_j, best_size)
}

/// Jaccard over `ngram_len`-token windows, with spans for maximal runs of
/// consecutive candidate windows found in the reference. Each run maps to
/// the first reference occurrence of its opening window.
pub fn ngram_overlap(
    a: &Document,
    b: &Document,
    ngram_len: usize,
    min_span_tokens: usize,
) -> (f64, Vec<MatchedSpan>) {
    let n = ngram_len.max(1);
    let texts_a = a.token_texts();
    let texts_b = b.token_texts();

    let grams_a: Vec<String> = texts_a.windows(n).map(|w| w.join("\u{1f}")).collect();
    let grams_b: Vec<String> = texts_b.windows(n).map(|w| w.join("\u{1f}")).collect();

    let set_a: HashSet<&str> = grams_a.iter().map(|g| g.as_str()).collect();
    let set_b: HashSet<&str> = grams_b.iter().map(|g| g.as_str()).collect();
    let intersection = set_a.intersection(&set_b).count();
    let union = set_a.len() + set_b.len() - intersection;
    let score = if union == 0 {
        0.0
    } else {
        intersection as f64 / union as f64
    };

    let mut first_in_b: HashMap<&str, usize> = HashMap::new();
    for (j, gram) in grams_b.iter().enumerate() {
        first_in_b.entry(gram.as_str()).or_insert(j);
    }

    let mut spans = Vec::new();
    let mut i = 0usize;
    while i < grams_a.len() {
        if !set_b.contains(grams_a[i].as_str()) {
            i += 1;
            continue;
        }
        let run_start = i;
        while i < grams_a.len() && set_b.contains(grams_a[i].as_str()) {
            i += 1;
        }
        let run_tokens = (i - 1 - run_start) + n;
        if run_tokens < min_span_tokens.max(1) {
            continue;
        }
        if let Some(&j) = first_in_b.get(grams_a[run_start].as_str()) {
            let ref_tokens = run_tokens.min(texts_b.len() - j);
            spans.push(MatchedSpan {
                candidate: token_span(a, run_start, run_tokens),
                reference: token_span(b, j, ref_tokens),
                tokens: run_tokens,
            });
        }
    }
    (score, spans)
}

fn token_span(doc: &Document, start_index: usize, token_len: usize) -> SpanRange {
    SpanRange {
        start: doc.tokens[start_index].start,
        end: doc.tokens[start_index + token_len - 1].end,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NormalizerOptions;
    use crate::services::text_processor::normalize;

    fn doc(id: &str, text: &str) -> Document {
        normalize(id, text, &NormalizerOptions::default()).unwrap()
    }

    fn options() -> SimilarityOptions {
        SimilarityOptions::default()
    }

    #[test]
    fn test_identical_documents_score_one_everywhere() {
        let a = doc("a", "alpha beta gamma delta epsilon");
        let b = doc("b", "alpha beta gamma delta epsilon");
        let results = compare(&a, &b, &options());
        assert_eq!(results.len(), 4);
        for result in &results {
            assert_eq!(result.score, 1.0, "{:?}", result.algorithm);
        }
    }

    #[test]
    fn test_disjoint_documents_score_zero() {
        let a = doc("a", "alpha beta gamma");
        let b = doc("b", "delta epsilon zeta");
        for result in compare(&a, &b, &options()) {
            assert_eq!(result.score, 0.0, "{:?}", result.algorithm);
            assert!(result.spans.is_empty());
        }
    }

    #[test]
    fn test_empty_document_scores_zero_without_error() {
        let empty = doc("a", "");
        let full = doc("b", "some text to compare against");
        for result in compare(&empty, &full, &options()) {
            assert_eq!(result.score, 0.0);
            assert!(result.spans.is_empty());
        }
        for result in compare(&empty, &empty, &options()) {
            assert_eq!(result.score, 0.0);
        }
    }

    #[test]
    fn test_cosine_symmetry() {
        let a = doc("a", "the cat sat on the mat");
        let b = doc("b", "the dog sat on the log today");
        assert_eq!(cosine_similarity(&a, &b), cosine_similarity(&b, &a));
        let score = cosine_similarity(&a, &b);
        assert!(score > 0.0 && score < 1.0);
    }

    #[test]
    fn test_jaccard_symmetry_and_range() {
        let a = doc("a", "one two three four five six");
        let b = doc("b", "one two three four seven eight");
        let ab = jaccard_similarity(&a, &b, 3);
        let ba = jaccard_similarity(&b, &a, 3);
        assert_eq!(ab, ba);
        // shared shingles: "one two three", "two three four" of 6 distinct
        assert!((ab - 2.0 / 6.0).abs() < 1e-12);
    }

    #[test]
    fn test_jaccard_short_document_yields_zero() {
        let a = doc("a", "hello world");
        let b = doc("b", "hello world");
        // both below shingle_len, empty union
        assert_eq!(jaccard_similarity(&a, &b, 3), 0.0);
    }

    #[test]
    fn test_sequence_ratio_known_value() {
        let a = doc("a", "the quick brown fox jumps");
        let b = doc("b", "the lazy dog jumps");
        let (score, _) = sequence_similarity(&a, &b, 3);
        // matched tokens: "the" and "jumps" of 5 + 4 total
        assert!((score - 4.0 / 9.0).abs() < 1e-12);
    }

    #[test]
    fn test_sequence_spans_cover_matched_block() {
        let candidate_text = "intro words then a copied stretch of shared text here";
        let reference_text = "a copied stretch of shared text appears in the source";
        let a = doc("a", candidate_text);
        let b = doc("b", reference_text);
        let (score, spans) = sequence_similarity(&a, &b, 3);
        assert!(score > 0.0);
        assert_eq!(spans.len(), 1);
        let span = &spans[0];
        assert_eq!(span.tokens, 6);
        assert_eq!(
            &candidate_text[span.candidate.start..span.candidate.end],
            "a copied stretch of shared text"
        );
        assert_eq!(
            &reference_text[span.reference.start..span.reference.end],
            "a copied stretch of shared text"
        );
    }

    #[test]
    fn test_sequence_short_blocks_not_reported() {
        let a = doc("a", "the quick brown fox jumps");
        let b = doc("b", "the lazy dog jumps");
        let (_, spans) = sequence_similarity(&a, &b, 3);
        assert!(spans.is_empty());
    }

    #[test]
    fn test_ngram_overlap_known_value() {
        let a = doc("a", "red green blue white");
        let b = doc("b", "green blue white black");
        let (score, spans) = ngram_overlap(&a, &b, 2, 3);
        // A = {rg, gb, bw}, B = {gb, bw, wb}: 2 shared of 4 distinct
        assert!((score - 0.5).abs() < 1e-12);
        assert_eq!(spans.len(), 1);
        let span = &spans[0];
        assert_eq!(span.tokens, 3);
        assert_eq!(
            &"red green blue white"[span.candidate.start..span.candidate.end],
            "green blue white"
        );
        assert_eq!(
            &"green blue white black"[span.reference.start..span.reference.end],
            "green blue white"
        );
    }

    #[test]
    fn test_ngram_overlap_is_symmetric_in_score() {
        let a = doc("a", "w x y z p q");
        let b = doc("b", "x y z p q r");
        let (ab, _) = ngram_overlap(&a, &b, 2, 3);
        let (ba, _) = ngram_overlap(&b, &a, 2, 3);
        assert_eq!(ab, ba);
    }

    #[test]
    fn test_compare_respects_algorithm_subset_and_order() {
        let a = doc("a", "alpha beta gamma delta");
        let b = doc("b", "alpha beta gamma delta");
        let subset = SimilarityOptions {
            algorithms: vec![AlgorithmKind::Sequence, AlgorithmKind::Cosine],
            ..options()
        };
        let results = compare(&a, &b, &subset);
        let kinds: Vec<AlgorithmKind> = results.iter().map(|r| r.algorithm).collect();
        assert_eq!(kinds, vec![AlgorithmKind::Cosine, AlgorithmKind::Sequence]);
    }

    #[test]
    fn test_scores_rounded_to_four_decimals() {
        let a = doc("a", "one two three");
        let b = doc("b", "one four five");
        for result in compare(&a, &b, &options()) {
            let rescaled = result.score * 10000.0;
            assert!((rescaled - rescaled.round()).abs() < 1e-9);
        }
    }
}
