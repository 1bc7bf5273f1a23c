//! Backing-store access for the recommendation engine
//!
//! Each store is a trait so the engine can run against Postgres in production and
//! against the in-memory store (or mocks) in tests. Every operation is read-only.

use std::collections::{HashMap, HashSet};

#[cfg(test)]
use mockall::automock;

use crate::{
    error::AppResult,
    models::{
        CatalogOrder, CollaborativeSignal, GenreMatch, InteractionSummary, MediaCandidate,
        UserId, UserPreference,
    },
};

pub mod catalog;
pub mod interactions;
pub mod memory;
pub mod postgres;
pub mod preferences;

pub use catalog::PgCatalogStore;
pub use interactions::PgInteractionStore;
pub use memory::InMemoryStore;
pub use postgres::{create_pool, PoolSettings};
pub use preferences::PgPreferenceStore;

/// Explicit genre preferences of users
#[cfg_attr(test, automock)]
#[async_trait::async_trait]
pub trait PreferenceStore: Send + Sync {
    /// Fetch one user's preference snapshot
    ///
    /// `Ok(None)` means the user has no profile at all, which is a routing decision for the
    /// caller rather than a failure.
    async fn fetch(&self, user_id: UserId) -> AppResult<Option<UserPreference>>;

    /// Fetch several users at once; users without a profile are simply absent
    async fn fetch_batch(&self, user_ids: &[UserId])
        -> AppResult<HashMap<UserId, UserPreference>>;
}

/// Append-only interaction history
#[cfg_attr(test, automock)]
#[async_trait::async_trait]
pub trait InteractionStore: Send + Sync {
    /// Per-media aggregates of the user's interactions in the last `window_days` days
    async fn fetch_summary(
        &self,
        user_id: UserId,
        window_days: u32,
    ) -> AppResult<HashMap<String, InteractionSummary>>;

    /// Media positively interacted with by users who share positive interactions with
    /// `user_id`
    ///
    /// Seed items are the user's own LIKE/WATCH media in the window. At most `fanout_cap`
    /// neighbors are considered. Results are ordered by supporting user count, then summed
    /// value, both descending, and truncated to `candidate_cap`.
    async fn fetch_similar_user_candidates(
        &self,
        user_id: UserId,
        window_days: u32,
        fanout_cap: usize,
        candidate_cap: usize,
    ) -> AppResult<Vec<CollaborativeSignal>>;
}

/// Media catalog
#[cfg_attr(test, automock)]
#[async_trait::async_trait]
pub trait CatalogStore: Send + Sync {
    /// Whole catalog minus `exclude_ids`, in the given order, at most `limit` items
    async fn fetch_all(
        &self,
        exclude_ids: &HashSet<String>,
        limit: usize,
        order: CatalogOrder,
    ) -> AppResult<Vec<MediaCandidate>>;

    /// Lookup by id; unknown or deleted ids are absent from the map
    async fn fetch_by_ids(&self, ids: &[String]) -> AppResult<HashMap<String, MediaCandidate>>;

    /// Media carrying at least one of `genres`, most matches first
    async fn fetch_by_genres(
        &self,
        genres: &[String],
        limit: usize,
        exclude_ids: &HashSet<String>,
    ) -> AppResult<Vec<GenreMatch>>;
}
