use std::{
    collections::{HashMap, HashSet},
    sync::Arc,
};

use crate::{
    db::CatalogStore,
    error::AppResult,
    models::{MediaCandidate, UserId, UserPreference},
    services::{collaborative::CollaborativeScorer, content::ContentScorer},
};

/// What the second blend component measures
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SecondarySignal {
    Collaborative,
    Popularity,
}

/// Inputs shared by every candidate source for one request
#[derive(Debug, Clone, Copy)]
pub struct ScoringRequest<'a> {
    pub genre_weights: &'a HashMap<String, f64>,
    pub exclude_ids: &'a HashSet<String>,
}

/// Candidates gathered for one request with their two component score maps
#[derive(Debug, Default)]
pub struct Signals {
    pub candidates: HashMap<String, MediaCandidate>,
    pub content: HashMap<String, f64>,
    pub secondary: HashMap<String, f64>,
}

/// Where candidates come from and how their secondary signal is derived
///
/// Profile-driven requests read the catalog; stateless requests score media the caller
/// supplied. Both feed the same combine/rank pipeline.
#[async_trait::async_trait]
pub trait CandidateSource: Send + Sync {
    async fn gather(&self, request: &ScoringRequest<'_>) -> AppResult<Signals>;

    fn secondary_signal(&self) -> SecondarySignal;

    /// Source name for logging
    fn name(&self) -> &'static str;
}

/// Genre-matched catalog media plus media discovered through similar users
///
/// The content and collaborative branches run concurrently and both finish (or degrade
/// to nothing) before the signals are returned.
pub struct FetchFromCatalog {
    user_id: UserId,
    genres: Vec<String>,
    catalog: Arc<dyn CatalogStore>,
    collaborative: CollaborativeScorer,
    content: ContentScorer,
    content_limit: usize,
}

impl FetchFromCatalog {
    pub fn new(
        preference: &UserPreference,
        catalog: Arc<dyn CatalogStore>,
        collaborative: CollaborativeScorer,
        content: ContentScorer,
        content_limit: usize,
    ) -> Self {
        Self {
            user_id: preference.user_id,
            genres: preference.genres(),
            catalog,
            collaborative,
            content,
            content_limit,
        }
    }

    async fn content_candidates(&self, request: &ScoringRequest<'_>) -> Vec<MediaCandidate> {
        if self.genres.is_empty() {
            tracing::warn!(user_id = %self.user_id, "No genres found in user preferences");
            return Vec::new();
        }

        match self
            .catalog
            .fetch_by_genres(&self.genres, self.content_limit, request.exclude_ids)
            .await
        {
            Ok(matches) => matches.into_iter().map(|m| m.candidate).collect(),
            Err(e) => {
                tracing::warn!(
                    user_id = %self.user_id,
                    error = %e,
                    "Genre candidates unavailable, continuing without content signal"
                );
                Vec::new()
            }
        }
    }

    async fn collaborative_candidates(
        &self,
        request: &ScoringRequest<'_>,
    ) -> (HashMap<String, f64>, HashMap<String, MediaCandidate>) {
        let scores = self.collaborative.score(self.user_id).await;

        let mut ids: Vec<String> = scores
            .keys()
            .filter(|id| !request.exclude_ids.contains(*id))
            .cloned()
            .collect();
        if ids.is_empty() {
            return (HashMap::new(), HashMap::new());
        }
        ids.sort();

        match self.catalog.fetch_by_ids(&ids).await {
            Ok(media) => {
                // media missing from the catalog (deleted) lose their score
                let kept: Vec<_> = media
                    .keys()
                    .filter_map(|id| scores.get(id).map(|s| (id, s)))
                    .collect();
                let supporting_users: i64 =
                    kept.iter().map(|(_, s)| s.supporting_user_count).sum();
                tracing::debug!(
                    user_id = %self.user_id,
                    candidates = kept.len(),
                    supporting_users,
                    "Collaborative candidates hydrated"
                );
                let scores = kept
                    .into_iter()
                    .map(|(id, s)| (id.clone(), s.score))
                    .collect();
                (scores, media)
            }
            Err(e) => {
                tracing::warn!(
                    user_id = %self.user_id,
                    error = %e,
                    "Collaborative media lookup failed, continuing without collaborative signal"
                );
                (HashMap::new(), HashMap::new())
            }
        }
    }
}

#[async_trait::async_trait]
impl CandidateSource for FetchFromCatalog {
    async fn gather(&self, request: &ScoringRequest<'_>) -> AppResult<Signals> {
        let (content_media, (collaborative_scores, collaborative_media)) = tokio::join!(
            self.content_candidates(request),
            self.collaborative_candidates(request)
        );

        let content = self.content.score_all(&content_media, request.genre_weights);

        tracing::info!(
            user_id = %self.user_id,
            content_candidates = content.len(),
            collaborative_candidates = collaborative_scores.len(),
            "Gathered catalog candidates"
        );

        let mut candidates = collaborative_media;
        for media in content_media {
            candidates.entry(media.media_id.clone()).or_insert(media);
        }

        Ok(Signals {
            candidates,
            content,
            secondary: collaborative_scores,
        })
    }

    fn secondary_signal(&self) -> SecondarySignal {
        SecondarySignal::Collaborative
    }

    fn name(&self) -> &'static str {
        "catalog"
    }
}

/// Media supplied with the request, blended with their own popularity
pub struct SuppliedByCaller {
    media: Vec<MediaCandidate>,
    content: ContentScorer,
}

impl SuppliedByCaller {
    pub fn new(media: Vec<MediaCandidate>, content: ContentScorer) -> Self {
        Self { media, content }
    }
}

#[async_trait::async_trait]
impl CandidateSource for SuppliedByCaller {
    async fn gather(&self, request: &ScoringRequest<'_>) -> AppResult<Signals> {
        let mut candidates: HashMap<String, MediaCandidate> = HashMap::new();
        for media in &self.media {
            if request.exclude_ids.contains(&media.media_id) {
                continue;
            }
            candidates
                .entry(media.media_id.clone())
                .or_insert_with(|| media.clone());
        }

        let eligible: Vec<MediaCandidate> = candidates.values().cloned().collect();
        let content = self.content.score_all(&eligible, request.genre_weights);
        let secondary = candidates
            .iter()
            .map(|(id, media)| (id.clone(), media.popularity_score))
            .collect();

        Ok(Signals {
            candidates,
            content,
            secondary,
        })
    }

    fn secondary_signal(&self) -> SecondarySignal {
        SecondarySignal::Popularity
    }

    fn name(&self) -> &'static str {
        "supplied"
    }
}
