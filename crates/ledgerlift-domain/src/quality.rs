//! Blob extraction quality score
//!
//! The score ranks extractions for triage only. It is never used to decide
//! whether content is correct.
//!
//! score = min(length / length_scale, base_cap)
//!       + multi_method_bonus   (more than one method produced the result)
//!       + keyword_density * keyword_bonus_cap   (only with a type hint)
//!       - error_penalty * error_count
//!
//! clamped to [0, 1].

/// Characters of content that earn the full length term (default: 1000)
pub const LENGTH_SCALE: f64 = 1000.0;

/// Cap on the length term (default: 0.6)
pub const BASE_CAP: f64 = 0.6;

/// Bonus when more than one method combined to produce the result (default: 0.2)
pub const MULTI_METHOD_BONUS: f64 = 0.2;

/// Penalty per recorded strategy error (default: 0.1)
pub const ERROR_PENALTY: f64 = 0.1;

/// Maximum keyword density bonus (default: 0.2)
pub const KEYWORD_BONUS_CAP: f64 = 0.2;

/// Weights of the quality formula
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QualityWeights {
    /// Characters of content that earn the full length term
    pub length_scale: f64,
    /// Cap on the length term
    pub base_cap: f64,
    /// Bonus for multi-method results
    pub multi_method_bonus: f64,
    /// Penalty per error
    pub error_penalty: f64,
    /// Maximum keyword density bonus
    pub keyword_bonus_cap: f64,
}

impl Default for QualityWeights {
    fn default() -> Self {
        Self {
            length_scale: LENGTH_SCALE,
            base_cap: BASE_CAP,
            multi_method_bonus: MULTI_METHOD_BONUS,
            error_penalty: ERROR_PENALTY,
            keyword_bonus_cap: KEYWORD_BONUS_CAP,
        }
    }
}

/// Observations about one extraction
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct QualityInputs {
    /// Length of the extracted content in characters
    pub content_length: usize,
    /// Number of methods that produced the result
    pub method_count: usize,
    /// Number of strategy errors recorded
    pub error_count: usize,
    /// Fraction of hint keywords found in the content, when a hint was given
    pub keyword_density: Option<f64>,
}

/// Compute the advisory quality score
///
/// Empty content always scores 0.0. The result is always within [0, 1],
/// including for degenerate weights or a non-finite keyword density.
pub fn quality_score(inputs: &QualityInputs, weights: &QualityWeights) -> f64 {
    if inputs.content_length == 0 {
        return 0.0;
    }

    let base = if weights.length_scale > 0.0 {
        (inputs.content_length as f64 / weights.length_scale).min(weights.base_cap)
    } else {
        weights.base_cap
    };

    let method_bonus = if inputs.method_count > 1 {
        weights.multi_method_bonus
    } else {
        0.0
    };

    let keyword_bonus = match inputs.keyword_density {
        Some(density) if density.is_finite() => {
            density.clamp(0.0, 1.0) * weights.keyword_bonus_cap
        }
        _ => 0.0,
    };

    let penalty = weights.error_penalty * inputs.error_count as f64;

    let score = base + method_bonus + keyword_bonus - penalty;
    if score.is_finite() {
        score.clamp(0.0, 1.0)
    } else {
        0.0
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Property: the score stays within [0, 1] for any observation
        #[test]
        fn test_score_within_unit_interval(
            content_length in 0usize..10_000_000,
            method_count in 0usize..10,
            error_count in 0usize..50,
            density in proptest::option::of(any::<f64>()),
        ) {
            let inputs = QualityInputs {
                content_length,
                method_count,
                error_count,
                keyword_density: density,
            };
            let score = quality_score(&inputs, &QualityWeights::default());
            prop_assert!((0.0..=1.0).contains(&score));
        }

        /// Property: the bound holds for arbitrary weights too
        #[test]
        fn test_score_bounded_for_any_weights(
            content_length in 1usize..100_000,
            method_count in 0usize..5,
            error_count in 0usize..5,
            length_scale in -10.0f64..10_000.0,
            base_cap in -1.0f64..5.0,
            bonus in -1.0f64..5.0,
            penalty in -1.0f64..5.0,
        ) {
            let weights = QualityWeights {
                length_scale,
                base_cap,
                multi_method_bonus: bonus,
                error_penalty: penalty,
                keyword_bonus_cap: bonus,
            };
            let inputs = QualityInputs {
                content_length,
                method_count,
                error_count,
                keyword_density: Some(0.3),
            };
            let score = quality_score(&inputs, &weights);
            prop_assert!((0.0..=1.0).contains(&score));
        }
    }
}
