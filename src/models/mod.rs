use uuid::Uuid;

pub mod interaction;
pub mod media;
pub mod recommendation;
pub mod user_preferences;

pub use interaction::{CollaborativeSignal, InteractionRecord, InteractionSummary, InteractionType};
pub use media::{CatalogOrder, GenreMatch, MediaCandidate, MediaMetadata};
pub use recommendation::{round_score, BatchEntry, ScoredCandidate, NEUTRAL_SCORE};
pub use user_preferences::{UserPreference, UserProfile, MAX_GENRE_WEIGHT};

/// Identifier of a registered user
pub type UserId = Uuid;
