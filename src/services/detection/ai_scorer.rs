// AI Content Scoring
// Statistical style features mapped through soft thresholds to one score

use indexmap::IndexMap;

use crate::models::{
    AiFeatureWeights, AiFeatures, AiScoreResult, AiScorerOptions, AiVerdict, AnalysisError,
    ConfidenceBand,
};
use crate::services::detection::similarity::round4;
use crate::services::text_processor::Document;

/// Score one document for machine-generated style. Documents shorter than
/// `min_tokens` get the neutral 0.5 with `low_confidence = true`; their
/// features are still computed and reported.
pub fn score(
    document: &Document,
    options: &AiScorerOptions,
) -> Result<AiScoreResult, AnalysisError> {
    if options.min_tokens == 0 {
        return Err(AnalysisError::Configuration(
            "minTokens must be at least 1".to_string(),
        ));
    }
    let weight_sum = validate_weights(&options.weights)?;

    let features = compute_features(document);

    if features.token_count < options.min_tokens {
        return Ok(AiScoreResult {
            document_id: document.id.clone(),
            score: 0.5,
            low_confidence: true,
            verdict: verdict_for(0.5),
            band: band_for(0.5),
            explanations: vec![format!(
                "only {} tokens (minimum {}), neutral score",
                features.token_count, options.min_tokens
            )],
            features,
        });
    }

    let weights = &options.weights;
    let c_burstiness = sigmoid(features.burstiness, 0.45, 0.12);
    let c_repetition = sigmoid_inv(features.repetition_rate, 0.18, 0.06);
    let c_vocabulary = sigmoid(features.vocabulary_ratio, 0.55, 0.08);
    let c_predictability = sigmoid_inv(features.predictability, 0.35, 0.10);
    // short and very long mean sentence lengths both lean AI
    let c_sentence_len = 0.5 * sigmoid(features.mean_sentence_len, 5.0, 2.0)
        + 0.5 * sigmoid_inv(features.mean_sentence_len, 35.0, 8.0);

    let weighted = weights.burstiness * c_burstiness
        + weights.repetition * c_repetition
        + weights.vocabulary * c_vocabulary
        + weights.predictability * c_predictability
        + weights.sentence_len * c_sentence_len;
    let score = round4((weighted / weight_sum).clamp(0.0, 1.0));

    let explanations = vec![
        format!(
            "burstiness={:.3} contrib={:.2}",
            features.burstiness, c_burstiness
        ),
        format!(
            "repetition={:.3} contrib={:.2}",
            features.repetition_rate, c_repetition
        ),
        format!(
            "ttr={:.3} contrib={:.2}",
            features.vocabulary_ratio, c_vocabulary
        ),
        format!(
            "predictability={:.3} contrib={:.2}",
            features.predictability, c_predictability
        ),
        format!(
            "mean_sentence_len={:.1} contrib={:.2}",
            features.mean_sentence_len, c_sentence_len
        ),
    ];

    Ok(AiScoreResult {
        document_id: document.id.clone(),
        score,
        low_confidence: false,
        verdict: verdict_for(score),
        band: band_for(score),
        features,
        explanations,
    })
}

/// Decreasing soft threshold: 0.5 at `center`, ~1 well below, ~0 well above.
fn sigmoid(value: f64, center: f64, steepness: f64) -> f64 {
    1.0 / (1.0 + ((value - center) / steepness).exp())
}

fn sigmoid_inv(value: f64, center: f64, steepness: f64) -> f64 {
    1.0 - sigmoid(value, center, steepness)
}

fn verdict_for(score: f64) -> AiVerdict {
    if score > 0.6 {
        AiVerdict::AiGenerated
    } else {
        AiVerdict::HumanWritten
    }
}

fn band_for(score: f64) -> ConfidenceBand {
    if score > 0.7 {
        ConfidenceBand::High
    } else if score > 0.4 {
        ConfidenceBand::Medium
    } else {
        ConfidenceBand::Low
    }
}

fn validate_weights(weights: &AiFeatureWeights) -> Result<f64, AnalysisError> {
    let entries = [
        ("burstiness", weights.burstiness),
        ("repetition", weights.repetition),
        ("vocabulary", weights.vocabulary),
        ("predictability", weights.predictability),
        ("sentence_len", weights.sentence_len),
    ];
    let mut sum = 0.0;
    for (name, weight) in entries {
        if !weight.is_finite() || weight < 0.0 {
            return Err(AnalysisError::Configuration(format!(
                "ai weight {} must be finite and non-negative, got {}",
                name, weight
            )));
        }
        sum += weight;
    }
    if sum <= 0.0 {
        return Err(AnalysisError::Configuration(
            "ai weights must not sum to zero".to_string(),
        ));
    }
    Ok(sum)
}

fn compute_features(document: &Document) -> AiFeatures {
    let token_count = document.tokens.len();

    let lengths = document.sentence_token_counts();
    let sentence_count = lengths.len();
    let mean = if sentence_count == 0 {
        0.0
    } else {
        lengths.iter().sum::<usize>() as f64 / sentence_count as f64
    };
    let stddev = if sentence_count == 0 {
        0.0
    } else {
        let variance = lengths
            .iter()
            .map(|&len| {
                let diff = len as f64 - mean;
                diff * diff
            })
            .sum::<f64>()
            / sentence_count as f64;
        variance.sqrt()
    };
    let burstiness = if sentence_count < 2 || mean == 0.0 {
        0.0
    } else {
        stddev / mean
    };

    // first-seen order so the entropy sum is reproducible
    let mut counts: IndexMap<&str, usize> = IndexMap::new();
    for token in &document.tokens {
        *counts.entry(token.text.as_str()).or_insert(0) += 1;
    }
    let types = counts.len();
    let vocabulary_ratio = if token_count == 0 {
        0.0
    } else {
        types as f64 / token_count as f64
    };
    let repeated = counts.values().filter(|&&count| count >= 3).count();
    let repetition_rate = if types == 0 {
        0.0
    } else {
        repeated as f64 / types as f64
    };

    let predictability = if types < 2 {
        if token_count > 1 {
            1.0
        } else {
            0.0
        }
    } else {
        let total = token_count as f64;
        let entropy: f64 = counts
            .values()
            .map(|&count| {
                let p = count as f64 / total;
                -p * p.ln()
            })
            .sum();
        (1.0 - entropy / (types as f64).ln()).clamp(0.0, 1.0)
    };

    AiFeatures {
        token_count,
        sentence_count,
        mean_sentence_len: mean,
        sentence_len_stddev: stddev,
        burstiness,
        repetition_rate,
        vocabulary_ratio,
        predictability,
    }
}
