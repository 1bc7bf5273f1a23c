use std::collections::{BTreeSet, HashMap};

use crate::models::{MediaCandidate, MAX_GENRE_WEIGHT};

/// Content-based scoring of candidates against explicit genre preferences
///
/// The score averages the user's weights for the candidate genres they prefer, scales it
/// into `[0, 1]`, then boosts candidates whose genres are mostly preferred ones:
///
/// `score = min(avg / max_weight, 1) * (0.8 + 0.2 * matched / total_genres)`
#[derive(Debug, Clone, Copy)]
pub struct ContentScorer {
    max_weight: f64,
}

impl Default for ContentScorer {
    fn default() -> Self {
        Self::new(MAX_GENRE_WEIGHT)
    }
}

impl ContentScorer {
    pub fn new(max_weight: f64) -> Self {
        Self { max_weight }
    }

    /// Scores a single set of genres
    pub fn score(&self, genres: &BTreeSet<String>, preferences: &HashMap<String, f64>) -> f64 {
        if genres.is_empty() || preferences.is_empty() {
            return 0.0;
        }

        let matched: Vec<f64> = genres
            .iter()
            .filter_map(|genre| preferences.get(genre).copied())
            .collect();

        if matched.is_empty() {
            return 0.0;
        }

        let average = matched.iter().sum::<f64>() / matched.len() as f64;
        let normalized = (average / self.max_weight).clamp(0.0, 1.0);

        let match_ratio = matched.len() as f64 / genres.len() as f64;
        let boosted = normalized * (0.8 + 0.2 * match_ratio);

        boosted.clamp(0.0, 1.0)
    }

    /// Scores every candidate, keyed by media id
    ///
    /// Candidates without any overlap still get an entry with score 0.
    pub fn score_all(
        &self,
        candidates: &[MediaCandidate],
        preferences: &HashMap<String, f64>,
    ) -> HashMap<String, f64> {
        candidates
            .iter()
            .map(|candidate| {
                (
                    candidate.media_id.clone(),
                    self.score(&candidate.genres, preferences),
                )
            })
            .collect()
    }
}
