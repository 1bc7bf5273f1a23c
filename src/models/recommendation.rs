use serde::{Deserialize, Serialize};

use super::MediaCandidate;

/// Score every fallback item carries; together with zero component scores it marks a
/// non-personalized result
pub const NEUTRAL_SCORE: f64 = 0.5;

/// Rounds a score to 4 decimal digits for output
pub fn round_score(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}

/// A media item with its recommendation scores, returned to the client
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScoredCandidate {
    #[serde(flatten)]
    pub media: MediaCandidate,
    /// Weighted combination of the component scores
    #[serde(rename = "recommendation_score")]
    pub hybrid_score: f64,
    pub content_score: f64,
    pub collaborative_score: f64,
}

impl ScoredCandidate {
    /// Builds an output entry, rounding every score to 4 digits
    pub fn new(
        media: MediaCandidate,
        content_score: f64,
        collaborative_score: f64,
        hybrid_score: f64,
    ) -> Self {
        Self {
            media,
            hybrid_score: round_score(hybrid_score),
            content_score: round_score(content_score),
            collaborative_score: round_score(collaborative_score),
        }
    }

    /// Non-personalized entry with the neutral 0.5/0/0 score pattern
    pub fn fallback(media: MediaCandidate) -> Self {
        Self {
            media,
            hybrid_score: NEUTRAL_SCORE,
            content_score: 0.0,
            collaborative_score: 0.0,
        }
    }

    pub fn is_fallback(&self) -> bool {
        self.hybrid_score == NEUTRAL_SCORE
            && self.content_score == 0.0
            && self.collaborative_score == 0.0
    }

    pub fn media_id(&self) -> &str {
        &self.media.media_id
    }
}

/// Per-user outcome inside a batch response
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum BatchEntry {
    Failure {
        error: String,
        recommendations: Vec<ScoredCandidate>,
        count: usize,
    },
    Success {
        recommendations: Vec<ScoredCandidate>,
        count: usize,
    },
}

impl BatchEntry {
    pub fn success(recommendations: Vec<ScoredCandidate>) -> Self {
        BatchEntry::Success {
            count: recommendations.len(),
            recommendations,
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        BatchEntry::Failure {
            error: error.into(),
            recommendations: Vec::new(),
            count: 0,
        }
    }

    pub fn recommendations(&self) -> &[ScoredCandidate] {
        match self {
            BatchEntry::Success {
                recommendations, ..
            }
            | BatchEntry::Failure {
                recommendations, ..
            } => recommendations,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            BatchEntry::Failure { error, .. } => Some(error),
            BatchEntry::Success { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_score() {
        assert_eq!(round_score(0.123456), 0.1235);
        assert_eq!(round_score(0.76), 0.76);
        assert_eq!(round_score(0.0), 0.0);
    }

    #[test]
    fn test_fallback_pattern() {
        let scored = ScoredCandidate::fallback(MediaCandidate::new("m1", ["ACTION"], 0.3));
        assert!(scored.is_fallback());

        let json = serde_json::to_value(&scored).unwrap();
        assert_eq!(json["recommendation_score"], 0.5);
        assert_eq!(json["content_score"], 0.0);
        assert_eq!(json["collaborative_score"], 0.0);
        assert_eq!(json["popularity_score"], 0.3);
    }

    #[test]
    fn test_batch_entry_shapes() {
        let failure = serde_json::to_value(BatchEntry::failure("invalid user id")).unwrap();
        assert_eq!(failure["error"], "invalid user id");
        assert_eq!(failure["count"], 0);
        assert_eq!(failure["recommendations"], serde_json::json!([]));

        let success = serde_json::to_value(BatchEntry::success(vec![])).unwrap();
        assert!(success.get("error").is_none());
        assert_eq!(success["count"], 0);
    }
}
