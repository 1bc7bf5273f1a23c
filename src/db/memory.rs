use std::{
    cmp::Ordering,
    collections::{HashMap, HashSet},
    sync::Arc,
};

use tokio::sync::RwLock;

use crate::{
    db::{interactions::window_start, CatalogStore, InteractionStore, PreferenceStore},
    error::AppResult,
    models::{
        CatalogOrder, CollaborativeSignal, GenreMatch, InteractionRecord, InteractionSummary,
        MediaCandidate, UserId, UserPreference,
    },
    services::collaborative::aggregate_neighbors,
};

#[derive(Default)]
struct MemoryInner {
    preferences: HashMap<UserId, UserPreference>,
    media: HashMap<String, MediaCandidate>,
    interactions: Vec<InteractionRecord>,
}

/// Process-local store implementing every store trait
///
/// Orders results the same way the Postgres queries do, so the engine behaves identically
/// against either backend.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    inner: Arc<RwLock<MemoryInner>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert_preference(&self, preference: UserPreference) {
        let mut inner = self.inner.write().await;
        inner.preferences.insert(preference.user_id, preference);
    }

    pub async fn insert_media(&self, media: MediaCandidate) {
        let mut inner = self.inner.write().await;
        inner.media.insert(media.media_id.clone(), media);
    }

    /// Removes a media item from the catalog; its interactions stay
    pub async fn remove_media(&self, media_id: &str) {
        let mut inner = self.inner.write().await;
        inner.media.remove(media_id);
    }

    pub async fn record_interaction(&self, interaction: InteractionRecord) {
        let mut inner = self.inner.write().await;
        inner.interactions.push(interaction);
    }
}

fn compare_catalog(a: &MediaCandidate, b: &MediaCandidate, order: CatalogOrder) -> Ordering {
    let primary = match order {
        CatalogOrder::Popularity => b.popularity_score.total_cmp(&a.popularity_score),
        // None sorts before Some, so reversing puts undated media last
        CatalogOrder::Recency => b.metadata.created_at.cmp(&a.metadata.created_at),
    };
    primary.then_with(|| a.media_id.cmp(&b.media_id))
}

#[async_trait::async_trait]
impl PreferenceStore for InMemoryStore {
    async fn fetch(&self, user_id: UserId) -> AppResult<Option<UserPreference>> {
        let inner = self.inner.read().await;
        Ok(inner.preferences.get(&user_id).cloned())
    }

    async fn fetch_batch(
        &self,
        user_ids: &[UserId],
    ) -> AppResult<HashMap<UserId, UserPreference>> {
        let inner = self.inner.read().await;
        Ok(user_ids
            .iter()
            .filter_map(|id| inner.preferences.get(id).map(|p| (*id, p.clone())))
            .collect())
    }
}

#[async_trait::async_trait]
impl InteractionStore for InMemoryStore {
    async fn fetch_summary(
        &self,
        user_id: UserId,
        window_days: u32,
    ) -> AppResult<HashMap<String, InteractionSummary>> {
        let since = window_start(window_days);
        let inner = self.inner.read().await;

        let mut summary: HashMap<String, InteractionSummary> = HashMap::new();
        for record in inner
            .interactions
            .iter()
            .filter(|r| r.user_id == user_id && r.timestamp >= since)
        {
            summary
                .entry(record.media_id.clone())
                .or_insert_with(|| InteractionSummary::empty(record.media_id.clone()))
                .record(record);
        }

        Ok(summary)
    }

    async fn fetch_similar_user_candidates(
        &self,
        user_id: UserId,
        window_days: u32,
        fanout_cap: usize,
        candidate_cap: usize,
    ) -> AppResult<Vec<CollaborativeSignal>> {
        let inner = self.inner.read().await;
        Ok(aggregate_neighbors(
            &inner.interactions,
            user_id,
            window_start(window_days),
            fanout_cap,
            candidate_cap,
        ))
    }
}

#[async_trait::async_trait]
impl CatalogStore for InMemoryStore {
    async fn fetch_all(
        &self,
        exclude_ids: &HashSet<String>,
        limit: usize,
        order: CatalogOrder,
    ) -> AppResult<Vec<MediaCandidate>> {
        let inner = self.inner.read().await;

        let mut media: Vec<MediaCandidate> = inner
            .media
            .values()
            .filter(|m| !exclude_ids.contains(&m.media_id))
            .cloned()
            .collect();
        media.sort_by(|a, b| compare_catalog(a, b, order));
        media.truncate(limit);

        Ok(media)
    }

    async fn fetch_by_ids(&self, ids: &[String]) -> AppResult<HashMap<String, MediaCandidate>> {
        let inner = self.inner.read().await;
        Ok(ids
            .iter()
            .filter_map(|id| inner.media.get(id).map(|m| (id.clone(), m.clone())))
            .collect())
    }

    async fn fetch_by_genres(
        &self,
        genres: &[String],
        limit: usize,
        exclude_ids: &HashSet<String>,
    ) -> AppResult<Vec<GenreMatch>> {
        let inner = self.inner.read().await;

        let mut matches: Vec<GenreMatch> = inner
            .media
            .values()
            .filter(|m| !exclude_ids.contains(&m.media_id))
            .filter_map(|m| {
                let count = m.genre_match_count(genres);
                (count > 0).then(|| GenreMatch {
                    candidate: m.clone(),
                    genre_match_count: count as i64,
                })
            })
            .collect();

        matches.sort_by(|a, b| {
            b.genre_match_count
                .cmp(&a.genre_match_count)
                .then_with(|| compare_catalog(&a.candidate, &b.candidate, CatalogOrder::Popularity))
        });
        matches.truncate(limit);

        Ok(matches)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{InteractionType, MediaMetadata};
    use chrono::{Duration, TimeZone, Utc};
    use uuid::Uuid;

    fn interaction(
        user_id: UserId,
        media_id: &str,
        kind: InteractionType,
        age_days: i64,
    ) -> InteractionRecord {
        InteractionRecord {
            user_id,
            media_id: media_id.to_string(),
            interaction_type: kind,
            value: 1.0,
            timestamp: Utc::now() - Duration::days(age_days),
        }
    }

    async fn catalog() -> InMemoryStore {
        let store = InMemoryStore::new();
        store
            .insert_media(MediaCandidate::new("media-3", ["ACTION", "THRILLER"], 0.9))
            .await;
        store
            .insert_media(MediaCandidate::new("media-4", ["HORROR", "THRILLER"], 0.8))
            .await;
        store
            .insert_media(MediaCandidate::new("media-5", ["COMEDY", "ROMANCE"], 0.7))
            .await;
        store
            .insert_media(MediaCandidate::new("media-6", ["ACTION"], 0.9))
            .await;
        store
    }

    #[tokio::test]
    async fn test_fetch_all_orders_by_popularity_then_id() {
        let store = catalog().await;
        let media = store
            .fetch_all(&HashSet::from(["media-4".to_string()]), 10, CatalogOrder::Popularity)
            .await
            .unwrap();

        let ids: Vec<&str> = media.iter().map(|m| m.media_id.as_str()).collect();
        assert_eq!(ids, vec!["media-3", "media-6", "media-5"]);
    }

    #[tokio::test]
    async fn test_fetch_all_by_recency() {
        let store = InMemoryStore::new();
        for (id, year) in [("old", 2001), ("new", 2024)] {
            let created_at = Utc.with_ymd_and_hms(year, 1, 1, 0, 0, 0).single();
            store
                .insert_media(MediaCandidate::new(id, ["DRAMA"], 0.5).with_metadata(MediaMetadata {
                    created_at,
                    ..MediaMetadata::default()
                }))
                .await;
        }
        store.insert_media(MediaCandidate::new("undated", ["DRAMA"], 0.9)).await;

        let media = store
            .fetch_all(&HashSet::new(), 10, CatalogOrder::Recency)
            .await
            .unwrap();

        let ids: Vec<&str> = media.iter().map(|m| m.media_id.as_str()).collect();
        assert_eq!(ids, vec!["new", "old", "undated"]);
    }

    #[tokio::test]
    async fn test_fetch_by_genres_ranks_by_match_count() {
        let store = catalog().await;
        let genres = vec!["ACTION".to_string(), "THRILLER".to_string()];

        let matches = store
            .fetch_by_genres(&genres, 10, &HashSet::new())
            .await
            .unwrap();

        let ids: Vec<&str> = matches.iter().map(|m| m.candidate.media_id.as_str()).collect();
        assert_eq!(ids, vec!["media-3", "media-6", "media-4"]);
        assert_eq!(matches[0].genre_match_count, 2);
    }

    #[tokio::test]
    async fn test_fetch_by_ids_skips_removed_media() {
        let store = catalog().await;
        store.remove_media("media-5").await;

        let media = store
            .fetch_by_ids(&["media-3".to_string(), "media-5".to_string()])
            .await
            .unwrap();

        assert_eq!(media.len(), 1);
        assert!(media.contains_key("media-3"));
    }

    #[tokio::test]
    async fn test_fetch_summary_respects_window() {
        let store = InMemoryStore::new();
        let user = Uuid::new_v4();
        store.record_interaction(interaction(user, "m1", InteractionType::Like, 1)).await;
        store.record_interaction(interaction(user, "m1", InteractionType::Watch, 2)).await;
        store.record_interaction(interaction(user, "old", InteractionType::Like, 120)).await;
        store
            .record_interaction(interaction(Uuid::new_v4(), "other", InteractionType::Like, 1))
            .await;

        let summary = store.fetch_summary(user, 90).await.unwrap();

        assert_eq!(summary.len(), 1);
        assert_eq!(summary["m1"].interaction_count, 2);
        assert_eq!(summary["m1"].like_count, 1);
        assert_eq!(summary["m1"].watch_count, 1);
    }

    #[tokio::test]
    async fn test_fetch_batch_omits_users_without_profile() {
        let store = InMemoryStore::new();
        let known = Uuid::new_v4();
        store
            .insert_preference(UserPreference::new(
                known,
                HashMap::from([("ACTION".to_string(), 8.0)]),
            ))
            .await;

        let batch = store.fetch_batch(&[known, Uuid::new_v4()]).await.unwrap();

        assert_eq!(batch.len(), 1);
        assert!(batch.contains_key(&known));
    }
}
