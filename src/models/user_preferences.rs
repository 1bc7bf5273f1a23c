use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::UserId;

/// Largest genre weight a user can configure
pub const MAX_GENRE_WEIGHT: f64 = 10.0;

/// Snapshot of a user's explicit genre preferences
///
/// Weights are expected in `[0, MAX_GENRE_WEIGHT]`. The snapshot is read once per request
/// and never mutated afterwards.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserPreference {
    pub user_id: UserId,
    pub genre_weights: HashMap<String, f64>,
}

impl UserPreference {
    pub fn new(user_id: UserId, genre_weights: HashMap<String, f64>) -> Self {
        Self {
            user_id,
            genre_weights,
        }
    }

    /// Preferred genres, sorted so that catalog queries are deterministic
    pub fn genres(&self) -> Vec<String> {
        let mut genres: Vec<String> = self.genre_weights.keys().cloned().collect();
        genres.sort();
        genres
    }
}

/// Caller-supplied profile for the stateless scoring variant
///
/// The profile is not looked up anywhere: the caller already knows the user's genre scores
/// and which media they have interacted with.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct UserProfile {
    #[serde(default)]
    pub user_id: String,
    #[serde(default)]
    pub genre_scores: HashMap<String, f64>,
    #[serde(default)]
    pub interacted_media_ids: Vec<String>,
}
