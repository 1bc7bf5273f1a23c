use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::Display;

use super::UserId;

/// Kind of user interaction with a media item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum InteractionType {
    Like,
    Dislike,
    Watch,
}

impl InteractionType {
    /// LIKE and WATCH count as positive signals for collaborative filtering
    pub fn is_positive(self) -> bool {
        matches!(self, InteractionType::Like | InteractionType::Watch)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            InteractionType::Like => "LIKE",
            InteractionType::Dislike => "DISLIKE",
            InteractionType::Watch => "WATCH",
        }
    }
}

impl Display for InteractionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One append-only interaction event
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InteractionRecord {
    pub user_id: UserId,
    pub media_id: String,
    #[serde(rename = "type")]
    pub interaction_type: InteractionType,
    pub value: f64,
    pub timestamp: DateTime<Utc>,
}

/// Per-media aggregate of one user's interactions within the lookback window
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InteractionSummary {
    pub media_id: String,
    pub interaction_count: i64,
    pub like_count: i64,
    pub dislike_count: i64,
    pub watch_count: i64,
    pub total_value: f64,
    pub last_interaction: Option<DateTime<Utc>>,
}

impl InteractionSummary {
    pub fn empty(media_id: impl Into<String>) -> Self {
        Self {
            media_id: media_id.into(),
            interaction_count: 0,
            like_count: 0,
            dislike_count: 0,
            watch_count: 0,
            total_value: 0.0,
            last_interaction: None,
        }
    }

    /// Folds one interaction into the aggregate
    pub fn record(&mut self, interaction: &InteractionRecord) {
        self.interaction_count += 1;
        match interaction.interaction_type {
            InteractionType::Like => self.like_count += 1,
            InteractionType::Dislike => self.dislike_count += 1,
            InteractionType::Watch => self.watch_count += 1,
        }
        self.total_value += interaction.value;
        if self
            .last_interaction
            .map_or(true, |last| interaction.timestamp > last)
        {
            self.last_interaction = Some(interaction.timestamp);
        }
    }
}

/// Media discovered through neighbors' positive interactions
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CollaborativeSignal {
    pub media_id: String,
    pub supporting_user_count: i64,
    pub raw_value: f64,
}

impl CollaborativeSignal {
    /// Un-normalized score: supporting users times summed interaction value
    pub fn raw_score(&self) -> f64 {
        self.supporting_user_count as f64 * self.raw_value
    }
}
