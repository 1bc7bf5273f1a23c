use std::collections::HashMap;

use crate::error::{AppError, AppResult};

/// Allowed drift of a weight pair from 1.0
pub const WEIGHT_TOLERANCE: f64 = 1e-3;

/// Validated pair of blend weights: content and one other signal
///
/// The other signal is the collaborative score for profile-driven requests and the
/// media popularity for caller-supplied candidates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BlendWeights {
    content: f64,
    other: f64,
}

impl BlendWeights {
    /// 0.4 content / 0.6 collaborative
    pub const PROFILE_DEFAULT: BlendWeights = BlendWeights {
        content: 0.4,
        other: 0.6,
    };

    /// 0.7 content / 0.3 popularity
    pub const SUPPLIED_DEFAULT: BlendWeights = BlendWeights {
        content: 0.7,
        other: 0.3,
    };

    pub fn new(content: f64, other: f64) -> AppResult<Self> {
        for weight in [content, other] {
            if !weight.is_finite() || !(0.0..=1.0).contains(&weight) {
                return Err(AppError::Configuration(format!(
                    "Weights must lie in [0, 1], got {}",
                    weight
                )));
            }
        }

        let total = content + other;
        if (total - 1.0).abs() > WEIGHT_TOLERANCE {
            return Err(AppError::Configuration(format!(
                "Weights must sum to 1.0, got {}",
                total
            )));
        }

        Ok(Self { content, other })
    }

    pub fn content(&self) -> f64 {
        self.content
    }

    pub fn other(&self) -> f64 {
        self.other
    }
}

/// Component and combined scores of one candidate, before rounding
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CombinedScore {
    pub content_score: f64,
    /// Collaborative score, or popularity for caller-supplied candidates
    pub other_score: f64,
    pub hybrid_score: f64,
}

/// Merges two per-candidate score maps into one weighted score
#[derive(Debug, Clone, Copy)]
pub struct HybridCombiner {
    weights: BlendWeights,
}

impl HybridCombiner {
    pub fn new(weights: BlendWeights) -> Self {
        Self { weights }
    }

    /// Combines content and other scores per candidate id
    ///
    /// Every id present in either map appears in the output; a missing component counts
    /// as 0. The hybrid score is clipped to [0, 1]. A non-finite input score is a
    /// computation error.
    pub fn combine(
        &self,
        content_scores: &HashMap<String, f64>,
        other_scores: &HashMap<String, f64>,
    ) -> AppResult<HashMap<String, CombinedScore>> {
        let mut combined: HashMap<String, CombinedScore> =
            HashMap::with_capacity(content_scores.len() + other_scores.len());

        for (media_id, &score) in content_scores {
            check_finite(media_id, "content", score)?;
            combined.entry(media_id.clone()).or_default().content_score = score;
        }

        for (media_id, &score) in other_scores {
            check_finite(media_id, "secondary", score)?;
            combined.entry(media_id.clone()).or_default().other_score = score;
        }

        for score in combined.values_mut() {
            let hybrid =
                score.content_score * self.weights.content + score.other_score * self.weights.other;
            // weights may sum to slightly more than 1 within the tolerance
            score.hybrid_score = hybrid.clamp(0.0, 1.0);
        }

        Ok(combined)
    }
}

fn check_finite(media_id: &str, signal: &str, score: f64) -> AppResult<()> {
    if score.is_finite() {
        Ok(())
    } else {
        Err(AppError::Computation(format!(
            "non-finite {} score {} for media {}",
            signal, score, media_id
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scores(entries: &[(&str, f64)]) -> HashMap<String, f64> {
        entries
            .iter()
            .map(|(id, score)| (id.to_string(), *score))
            .collect()
    }

    #[test]
    fn test_weights_must_sum_to_one() {
        assert!(BlendWeights::new(0.4, 0.6).is_ok());
        assert!(BlendWeights::new(0.7, 0.3).is_ok());
        assert!(BlendWeights::new(0.7004, 0.3).is_ok());

        let err = BlendWeights::new(0.5, 0.3).unwrap_err();
        assert!(matches!(err, AppError::Configuration(_)));
        assert!(err.to_string().contains("Weights must sum to 1.0"));

        assert!(BlendWeights::new(0.5, 0.502).is_err());
    }

    #[test]
    fn test_weights_out_of_range_fail() {
        assert!(BlendWeights::new(1.5, -0.5).is_err());
        assert!(BlendWeights::new(f64::NAN, 1.0).is_err());
    }

    #[test]
    fn test_default_weights_are_valid() {
        let profile = BlendWeights::PROFILE_DEFAULT;
        assert_eq!(
            BlendWeights::new(profile.content(), profile.other()).unwrap(),
            profile
        );
        let supplied = BlendWeights::SUPPLIED_DEFAULT;
        assert_eq!(
            BlendWeights::new(supplied.content(), supplied.other()).unwrap(),
            supplied
        );
    }

    #[test]
    fn test_combine_keeps_candidates_from_either_source() {
        let combiner = HybridCombiner::new(BlendWeights::PROFILE_DEFAULT);
        let content = scores(&[("a", 0.5), ("b", 1.0)]);
        let collaborative = scores(&[("b", 0.5), ("c", 1.0)]);

        let combined = combiner.combine(&content, &collaborative).unwrap();

        assert_eq!(combined.len(), 3);

        let a = combined["a"];
        assert_eq!(a.other_score, 0.0);
        assert!((a.hybrid_score - 0.2).abs() < 1e-9);

        let b = combined["b"];
        assert!((b.hybrid_score - (0.4 + 0.3)).abs() < 1e-9);

        let c = combined["c"];
        assert_eq!(c.content_score, 0.0);
        assert!((c.hybrid_score - 0.6).abs() < 1e-9);
    }

    #[test]
    fn test_combine_content_and_popularity_scenario() {
        // ACTION:8, THRILLER:6 against [ACTION, THRILLER] gives content 0.7
        let combiner = HybridCombiner::new(BlendWeights::SUPPLIED_DEFAULT);
        let combined = combiner
            .combine(&scores(&[("m", 0.7)]), &scores(&[("m", 0.9)]))
            .unwrap();

        assert!((combined["m"].hybrid_score - 0.76).abs() < 1e-9);
    }

    #[test]
    fn test_combine_stays_within_unit_range_at_weight_tolerance() {
        let combiner = HybridCombiner::new(BlendWeights::new(0.7009, 0.3).unwrap());
        let combined = combiner
            .combine(&scores(&[("m", 1.0)]), &scores(&[("m", 1.0)]))
            .unwrap();

        assert_eq!(combined["m"].hybrid_score, 1.0);
    }

    #[test]
    fn test_combine_rejects_non_finite_scores() {
        let combiner = HybridCombiner::new(BlendWeights::PROFILE_DEFAULT);
        let result = combiner.combine(&scores(&[("a", f64::NAN)]), &HashMap::new());
        assert!(matches!(result, Err(AppError::Computation(_))));
    }

    #[test]
    fn test_combine_empty_inputs() {
        let combiner = HybridCombiner::new(BlendWeights::PROFILE_DEFAULT);
        let combined = combiner.combine(&HashMap::new(), &HashMap::new()).unwrap();
        assert!(combined.is_empty());
    }
}
