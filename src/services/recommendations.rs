use std::{
    collections::{HashMap, HashSet},
    sync::Arc,
};

use tracing::instrument;
use uuid::Uuid;

use crate::{
    config::EngineSettings,
    db::{CatalogStore, InteractionStore, PreferenceStore},
    error::{AppError, AppResult},
    models::{BatchEntry, MediaCandidate, ScoredCandidate, UserId, UserPreference, UserProfile},
    services::{
        candidates::{
            CandidateSource, FetchFromCatalog, ScoringRequest, SecondarySignal, SuppliedByCaller,
        },
        collaborative::CollaborativeScorer,
        content::ContentScorer,
        fallback::FallbackProvider,
        hybrid::HybridCombiner,
        ranking::{rank_and_paginate, Page},
    },
};

/// Hybrid recommendation engine
///
/// Blends content-based scores (explicit genre preferences) with collaborative scores
/// (similar users' interactions) and falls back to a plain catalog listing whenever no
/// personalized result can be produced. Every request is independent; the engine holds no
/// mutable state.
pub struct RecommendationEngine {
    preferences: Arc<dyn PreferenceStore>,
    interactions: Arc<dyn InteractionStore>,
    catalog: Arc<dyn CatalogStore>,
    content: ContentScorer,
    collaborative: CollaborativeScorer,
    profile_combiner: HybridCombiner,
    supplied_combiner: HybridCombiner,
    fallback: FallbackProvider,
    settings: EngineSettings,
}

impl RecommendationEngine {
    pub fn new(
        preferences: Arc<dyn PreferenceStore>,
        interactions: Arc<dyn InteractionStore>,
        catalog: Arc<dyn CatalogStore>,
        settings: EngineSettings,
    ) -> AppResult<Self> {
        settings.validate()?;

        Ok(Self {
            collaborative: CollaborativeScorer::new(interactions.clone(), &settings),
            fallback: FallbackProvider::new(catalog.clone(), settings.fallback_order),
            content: ContentScorer::default(),
            profile_combiner: HybridCombiner::new(settings.profile_weights),
            supplied_combiner: HybridCombiner::new(settings.supplied_weights),
            preferences,
            interactions,
            catalog,
            settings,
        })
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    /// Validates a requested window against this engine's limit ceiling
    pub fn page(&self, limit: i64, offset: i64) -> AppResult<Page> {
        Page::new(limit, offset, self.settings.max_limit)
    }

    /// Personalized recommendations for one stored user
    ///
    /// Only malformed parameters are errors. A user without preferences, or any failure
    /// during personalization, yields fallback recommendations instead.
    #[instrument(skip(self))]
    pub async fn compute(
        &self,
        user_id: UserId,
        limit: i64,
        offset: i64,
    ) -> AppResult<Vec<ScoredCandidate>> {
        let page = self.page(limit, offset)?;
        Ok(self.recommend_stored(user_id, page).await)
    }

    /// Looks up the user's preferences and recommends one validated page
    async fn recommend_stored(&self, user_id: UserId, page: Page) -> Vec<ScoredCandidate> {
        let preference = match self.preferences.fetch(user_id).await {
            Ok(Some(preference)) => preference,
            Ok(None) => {
                tracing::info!(user_id = %user_id, "No preferences found, using fallback");
                return self.fallback.recommend(page, &HashSet::new()).await;
            }
            Err(e) => {
                tracing::warn!(
                    user_id = %user_id,
                    error = %e,
                    "Preference lookup failed, using fallback"
                );
                return self.fallback.recommend(page, &HashSet::new()).await;
            }
        };

        self.personalize(preference, page).await
    }

    /// Scores caller-supplied media against a caller-supplied profile
    ///
    /// Nothing is read from the stores. The second blend component is each media item's
    /// own popularity, and results always start at offset 0.
    pub async fn compute_supplied(
        &self,
        profile: &UserProfile,
        available_media: Vec<MediaCandidate>,
        limit: i64,
    ) -> AppResult<Vec<ScoredCandidate>> {
        let page = self.page(limit, 0)?;

        if let Some(media) = available_media
            .iter()
            .find(|m| !(0.0..=1.0).contains(&m.popularity_score))
        {
            return Err(AppError::InvalidInput(format!(
                "popularity_score of media {} must be between 0 and 1",
                media.media_id
            )));
        }

        let exclude: HashSet<String> = profile.interacted_media_ids.iter().cloned().collect();
        let source = SuppliedByCaller::new(available_media, self.content);

        let recommendations = self
            .score_source(
                &source,
                &profile.genre_scores,
                &exclude,
                &self.supplied_combiner,
                page,
            )
            .await?;

        tracing::info!(
            user_id = %profile.user_id,
            count = recommendations.len(),
            "Scored supplied media"
        );

        Ok(recommendations)
    }

    /// Recommendations for several users in one call
    ///
    /// Preferences are read with a single batch lookup, then every user is computed
    /// concurrently. A failure for one user becomes an error entry for that user only.
    pub async fn compute_batch(
        self: &Arc<Self>,
        user_ids: Vec<String>,
        limit: i64,
    ) -> AppResult<HashMap<String, BatchEntry>> {
        if user_ids.is_empty() {
            return Err(AppError::InvalidInput(
                "user_ids must be a non-empty list".to_string(),
            ));
        }
        if user_ids.len() > self.settings.max_batch_size {
            return Err(AppError::InvalidInput(format!(
                "Maximum {} users per batch request",
                self.settings.max_batch_size
            )));
        }
        let page = self.page(limit, 0)?;

        let mut results: HashMap<String, BatchEntry> = HashMap::with_capacity(user_ids.len());
        let mut parsed: Vec<(String, UserId)> = Vec::with_capacity(user_ids.len());
        for raw in user_ids {
            if results.contains_key(&raw) || parsed.iter().any(|(seen, _)| *seen == raw) {
                continue;
            }
            match Uuid::parse_str(&raw) {
                Ok(user_id) => parsed.push((raw, user_id)),
                Err(_) => {
                    let entry = BatchEntry::failure(format!("Invalid user_id format: {}", raw));
                    results.insert(raw, entry);
                }
            }
        }

        let ids: Vec<UserId> = parsed.iter().map(|(_, id)| *id).collect();
        let mut prefetched = match self.preferences.fetch_batch(&ids).await {
            Ok(preferences) => Some(preferences),
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    users = ids.len(),
                    "Batch preference lookup failed, fetching users individually"
                );
                None
            }
        };

        let mut handles = Vec::with_capacity(parsed.len());
        for (raw, user_id) in parsed {
            let engine = Arc::clone(self);
            let preference = prefetched.as_mut().map(|map| map.remove(&user_id));

            let handle = tokio::spawn(async move {
                match preference {
                    Some(Some(preference)) => engine.personalize(preference, page).await,
                    Some(None) => engine.fallback.recommend(page, &HashSet::new()).await,
                    None => engine.recommend_stored(user_id, page).await,
                }
            });
            handles.push((raw, handle));
        }

        for (raw, handle) in handles {
            let entry = match handle.await {
                Ok(recommendations) => BatchEntry::success(recommendations),
                Err(e) => {
                    tracing::error!(user_id = %raw, error = %e, "Batch recommendation task failed");
                    BatchEntry::failure(format!("Task failed: {}", e))
                }
            };
            results.insert(raw, entry);
        }

        tracing::info!(users = results.len(), "Batch recommendations completed");

        Ok(results)
    }

    /// Runs the personalized pipeline, falling back on any failure
    async fn personalize(&self, preference: UserPreference, page: Page) -> Vec<ScoredCandidate> {
        let user_id = preference.user_id;
        let exclude = self.interacted_media(user_id).await;

        let source = FetchFromCatalog::new(
            &preference,
            self.catalog.clone(),
            self.collaborative.clone(),
            self.content,
            self.settings.content_candidate_limit,
        );

        match self
            .score_source(
                &source,
                &preference.genre_weights,
                &exclude,
                &self.profile_combiner,
                page,
            )
            .await
        {
            Ok(recommendations) => {
                tracing::info!(
                    user_id = %user_id,
                    count = recommendations.len(),
                    "Generated personalized recommendations"
                );
                recommendations
            }
            Err(e) => {
                tracing::error!(
                    user_id = %user_id,
                    error = %e,
                    "Personalized recommendations failed, using fallback"
                );
                self.fallback.recommend(page, &exclude).await
            }
        }
    }

    /// Media the user interacted with inside the lookback window
    ///
    /// An unavailable history means nothing is excluded.
    async fn interacted_media(&self, user_id: UserId) -> HashSet<String> {
        match self
            .interactions
            .fetch_summary(user_id, self.settings.lookback_days)
            .await
        {
            Ok(summary) => summary.into_keys().collect(),
            Err(e) => {
                tracing::warn!(
                    user_id = %user_id,
                    error = %e,
                    "Interaction history unavailable, nothing will be excluded"
                );
                HashSet::new()
            }
        }
    }

    async fn score_source(
        &self,
        source: &dyn CandidateSource,
        genre_weights: &HashMap<String, f64>,
        exclude: &HashSet<String>,
        combiner: &HybridCombiner,
        page: Page,
    ) -> AppResult<Vec<ScoredCandidate>> {
        let request = ScoringRequest {
            genre_weights,
            exclude_ids: exclude,
        };
        let mut signals = source.gather(&request).await?;

        let mut combined = combiner.combine(&signals.content, &signals.secondary)?;
        combined.retain(|media_id, _| !exclude.contains(media_id));

        let collaborative = source.secondary_signal() == SecondarySignal::Collaborative;

        rank_and_paginate(combined, page)
            .into_iter()
            .map(|(media_id, score)| {
                let media = signals.candidates.remove(&media_id).ok_or_else(|| {
                    AppError::Computation(format!(
                        "{} source scored unknown media {}",
                        source.name(),
                        media_id
                    ))
                })?;
                let collaborative_score = if collaborative {
                    score.other_score
                } else {
                    0.0
                };
                Ok(ScoredCandidate::new(
                    media,
                    score.content_score,
                    collaborative_score,
                    score.hybrid_score,
                ))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        db::{MockCatalogStore, MockInteractionStore, MockPreferenceStore},
        models::{CatalogOrder, CollaborativeSignal, GenreMatch, InteractionSummary},
    };

    fn preference(user_id: UserId, weights: &[(&str, f64)]) -> UserPreference {
        UserPreference::new(
            user_id,
            weights.iter().map(|(g, w)| (g.to_string(), *w)).collect(),
        )
    }

    fn genre_match(id: &str, genres: &[&str], popularity: f64) -> GenreMatch {
        GenreMatch {
            candidate: MediaCandidate::new(id, genres.iter().copied(), popularity),
            genre_match_count: genres.len() as i64,
        }
    }

    fn catalog_listing(count: usize) -> Vec<MediaCandidate> {
        (0..count)
            .map(|i| MediaCandidate::new(format!("popular-{}", i), ["DRAMA"], 0.9))
            .collect()
    }

    fn hydrating_catalog() -> MockCatalogStore {
        let mut catalog = MockCatalogStore::new();
        catalog.expect_fetch_by_ids().returning(|ids| {
            Ok(ids
                .iter()
                .map(|id| (id.clone(), MediaCandidate::new(id.clone(), ["DRAMA"], 0.5)))
                .collect())
        });
        catalog
    }

    fn engine(
        preferences: MockPreferenceStore,
        interactions: MockInteractionStore,
        catalog: MockCatalogStore,
    ) -> RecommendationEngine {
        RecommendationEngine::new(
            Arc::new(preferences),
            Arc::new(interactions),
            Arc::new(catalog),
            EngineSettings::default(),
        )
        .unwrap()
    }

    fn seen_summary() -> HashMap<String, InteractionSummary> {
        HashMap::from([("seen".to_string(), InteractionSummary::empty("seen"))])
    }

    #[tokio::test]
    async fn test_personalized_blend_and_exclusion() {
        let user_id = Uuid::new_v4();

        let mut preferences = MockPreferenceStore::new();
        preferences
            .expect_fetch()
            .returning(move |id| Ok(Some(preference(id, &[("ACTION", 8.0), ("THRILLER", 6.0)]))));

        let mut interactions = MockInteractionStore::new();
        interactions
            .expect_fetch_summary()
            .returning(|_, _| Ok(seen_summary()));
        interactions
            .expect_fetch_similar_user_candidates()
            .returning(|_, _, _, _| {
                Ok(vec![
                    CollaborativeSignal {
                        media_id: "media-9".to_string(),
                        supporting_user_count: 2,
                        raw_value: 2.0,
                    },
                    CollaborativeSignal {
                        media_id: "seen".to_string(),
                        supporting_user_count: 1,
                        raw_value: 1.0,
                    },
                ])
            });

        let mut catalog = hydrating_catalog();
        catalog.expect_fetch_by_genres().returning(|_, _, _| {
            Ok(vec![
                genre_match("media-3", &["ACTION", "THRILLER"], 0.9),
                genre_match("seen", &["ACTION"], 0.9),
            ])
        });

        let results = engine(preferences, interactions, catalog)
            .compute(user_id, 10, 0)
            .await
            .unwrap();

        let ids: Vec<&str> = results.iter().map(|r| r.media_id()).collect();
        assert_eq!(ids, vec!["media-9", "media-3"]);

        // collaborative only: 0.6 * 1.0
        assert_eq!(results[0].hybrid_score, 0.6);
        assert_eq!(results[0].collaborative_score, 1.0);
        assert_eq!(results[0].content_score, 0.0);
        // content only: 0.4 * 0.7
        assert_eq!(results[1].hybrid_score, 0.28);
        assert_eq!(results[1].content_score, 0.7);
    }

    #[tokio::test]
    async fn test_missing_preferences_use_fallback() {
        let mut preferences = MockPreferenceStore::new();
        preferences.expect_fetch().returning(|_| Ok(None));

        let mut interactions = MockInteractionStore::new();
        interactions.expect_fetch_summary().times(0);

        let mut catalog = MockCatalogStore::new();
        catalog
            .expect_fetch_all()
            .withf(|exclude, limit, order| {
                exclude.is_empty() && *limit == 5 && *order == CatalogOrder::Popularity
            })
            .returning(|_, limit, _| Ok(catalog_listing(limit)));

        let results = engine(preferences, interactions, catalog)
            .compute(Uuid::new_v4(), 5, 0)
            .await
            .unwrap();

        assert_eq!(results.len(), 5);
        assert!(results.iter().all(ScoredCandidate::is_fallback));
    }

    #[tokio::test]
    async fn test_preference_error_uses_fallback() {
        let mut preferences = MockPreferenceStore::new();
        preferences
            .expect_fetch()
            .returning(|_| Err(AppError::UpstreamUnavailable("timeout".into())));

        let mut catalog = MockCatalogStore::new();
        catalog
            .expect_fetch_all()
            .returning(|_, limit, _| Ok(catalog_listing(limit)));

        let results = engine(preferences, MockInteractionStore::new(), catalog)
            .compute(Uuid::new_v4(), 3, 0)
            .await
            .unwrap();

        assert_eq!(results.len(), 3);
        assert!(results.iter().all(ScoredCandidate::is_fallback));
    }

    #[tokio::test]
    async fn test_computation_error_falls_back_with_exclusions() {
        let mut preferences = MockPreferenceStore::new();
        preferences
            .expect_fetch()
            .returning(|id| Ok(Some(preference(id, &[("ACTION", f64::NAN)]))));

        let mut interactions = MockInteractionStore::new();
        interactions
            .expect_fetch_summary()
            .returning(|_, _| Ok(seen_summary()));
        interactions
            .expect_fetch_similar_user_candidates()
            .returning(|_, _, _, _| Ok(vec![]));

        let mut catalog = MockCatalogStore::new();
        catalog
            .expect_fetch_by_genres()
            .returning(|_, _, _| Ok(vec![genre_match("media-1", &["ACTION"], 0.5)]));
        catalog
            .expect_fetch_all()
            .withf(|exclude, _, _| exclude.contains("seen"))
            .times(1)
            .returning(|_, limit, _| Ok(catalog_listing(limit)));

        let results = engine(preferences, interactions, catalog)
            .compute(Uuid::new_v4(), 2, 0)
            .await
            .unwrap();

        assert_eq!(results.len(), 2);
        assert!(results.iter().all(ScoredCandidate::is_fallback));
    }

    #[tokio::test]
    async fn test_fallback_is_idempotent() {
        let mut preferences = MockPreferenceStore::new();
        preferences.expect_fetch().returning(|_| Ok(None));

        let mut catalog = MockCatalogStore::new();
        catalog
            .expect_fetch_all()
            .returning(|_, limit, _| Ok(catalog_listing(limit)));

        let engine = engine(preferences, MockInteractionStore::new(), catalog);
        let user_id = Uuid::new_v4();

        let first = engine.compute(user_id, 4, 1).await.unwrap();
        let second = engine.compute(user_id, 4, 1).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(first[0].media_id(), "popular-1");
    }

    #[tokio::test]
    async fn test_pages_are_slices_of_the_full_ranking() {
        let mut preferences = MockPreferenceStore::new();
        preferences
            .expect_fetch()
            .returning(|id| Ok(Some(preference(id, &[("ACTION", 10.0), ("COMEDY", 2.0)]))));

        let mut interactions = MockInteractionStore::new();
        interactions
            .expect_fetch_summary()
            .returning(|_, _| Ok(HashMap::new()));
        interactions
            .expect_fetch_similar_user_candidates()
            .returning(|_, _, _, _| Ok(vec![]));

        let mut catalog = MockCatalogStore::new();
        catalog.expect_fetch_by_genres().returning(|_, _, _| {
            Ok(vec![
                genre_match("a", &["ACTION"], 0.1),
                genre_match("b", &["ACTION", "COMEDY"], 0.1),
                genre_match("c", &["COMEDY"], 0.1),
                genre_match("d", &["ACTION", "DRAMA"], 0.1),
                genre_match("e", &["ACTION"], 0.1),
            ])
        });

        let engine = engine(preferences, interactions, catalog);
        let user_id = Uuid::new_v4();

        let full = engine.compute(user_id, 5, 0).await.unwrap();
        let page = engine.compute(user_id, 2, 1).await.unwrap();

        assert_eq!(page, full[1..3].to_vec());
        // equal scores keep ascending id order
        assert_eq!(full[0].media_id(), "a");
        assert_eq!(full[1].media_id(), "e");
    }

    #[tokio::test]
    async fn test_invalid_parameters_are_rejected() {
        let engine = engine(
            MockPreferenceStore::new(),
            MockInteractionStore::new(),
            MockCatalogStore::new(),
        );

        let zero = engine.compute(Uuid::new_v4(), 0, 0).await;
        assert!(matches!(zero, Err(AppError::InvalidInput(_))));

        let too_many = engine.compute(Uuid::new_v4(), 101, 0).await;
        assert!(matches!(too_many, Err(AppError::InvalidInput(_))));

        let negative = engine.compute(Uuid::new_v4(), 10, -1).await;
        assert!(matches!(negative, Err(AppError::InvalidInput(_))));
    }

    #[tokio::test]
    async fn test_supplied_profile_scoring() {
        let engine = engine(
            MockPreferenceStore::new(),
            MockInteractionStore::new(),
            MockCatalogStore::new(),
        );

        let profile = UserProfile {
            user_id: "user-1".to_string(),
            genre_scores: HashMap::from([
                ("ACTION".to_string(), 8.0),
                ("THRILLER".to_string(), 6.0),
                ("HORROR".to_string(), 3.0),
                ("COMEDY".to_string(), 1.0),
            ]),
            interacted_media_ids: vec!["media-1".to_string()],
        };
        let media = vec![
            MediaCandidate::new("media-1", ["ACTION"], 1.0),
            MediaCandidate::new("media-3", ["ACTION", "THRILLER"], 0.9),
            MediaCandidate::new("media-4", ["ROMANCE"], 0.2),
        ];

        let results = engine.compute_supplied(&profile, media, 10).await.unwrap();

        let ids: Vec<&str> = results.iter().map(|r| r.media_id()).collect();
        assert_eq!(ids, vec!["media-3", "media-4"]);
        assert_eq!(results[0].hybrid_score, 0.76);
        assert_eq!(results[0].content_score, 0.7);
        assert_eq!(results[0].collaborative_score, 0.0);
        // no genre overlap: popularity only
        assert_eq!(results[1].hybrid_score, 0.06);
    }

    #[tokio::test]
    async fn test_supplied_rejects_bad_popularity() {
        let engine = engine(
            MockPreferenceStore::new(),
            MockInteractionStore::new(),
            MockCatalogStore::new(),
        );

        let result = engine
            .compute_supplied(
                &UserProfile::default(),
                vec![MediaCandidate::new("m", ["ACTION"], 1.5)],
                10,
            )
            .await;

        assert!(matches!(result, Err(AppError::InvalidInput(_))));
    }

    #[tokio::test]
    async fn test_batch_mixes_personalized_fallback_and_invalid_ids() {
        let known = Uuid::new_v4();
        let unknown = Uuid::new_v4();

        let mut preferences = MockPreferenceStore::new();
        preferences
            .expect_fetch_batch()
            .times(1)
            .returning(move |ids| {
                assert_eq!(ids.len(), 2);
                Ok(HashMap::from([(known, preference(known, &[("ACTION", 10.0)]))]))
            });
        preferences.expect_fetch().times(0);

        let mut interactions = MockInteractionStore::new();
        interactions
            .expect_fetch_summary()
            .returning(|_, _| Ok(HashMap::new()));
        interactions
            .expect_fetch_similar_user_candidates()
            .returning(|_, _, _, _| Ok(vec![]));

        let mut catalog = MockCatalogStore::new();
        catalog
            .expect_fetch_by_genres()
            .returning(|_, _, _| Ok(vec![genre_match("action-1", &["ACTION"], 0.3)]));
        catalog
            .expect_fetch_all()
            .returning(|_, limit, _| Ok(catalog_listing(limit)));

        let engine = Arc::new(engine(preferences, interactions, catalog));
        let results = engine
            .compute_batch(
                vec![known.to_string(), unknown.to_string(), "not-a-uuid".to_string()],
                3,
            )
            .await
            .unwrap();

        assert_eq!(results.len(), 3);

        let personalized = results[&known.to_string()].recommendations();
        assert_eq!(personalized.len(), 1);
        assert!(!personalized[0].is_fallback());

        let fallback = results[&unknown.to_string()].recommendations();
        assert_eq!(fallback.len(), 3);
        assert!(fallback.iter().all(ScoredCandidate::is_fallback));

        let invalid = &results["not-a-uuid"];
        assert!(invalid.error().is_some());
        assert!(invalid.recommendations().is_empty());
    }

    #[tokio::test]
    async fn test_batch_lookup_failure_fetches_users_individually() {
        let known = Uuid::new_v4();
        let unreachable = Uuid::new_v4();

        let mut preferences = MockPreferenceStore::new();
        preferences
            .expect_fetch_batch()
            .times(1)
            .returning(|_| Err(AppError::UpstreamUnavailable("timeout".into())));
        preferences
            .expect_fetch()
            .times(2)
            .returning(move |id| {
                if id == known {
                    Ok(Some(preference(id, &[("ACTION", 10.0)])))
                } else {
                    Err(AppError::UpstreamUnavailable("timeout".into()))
                }
            });

        let mut interactions = MockInteractionStore::new();
        interactions
            .expect_fetch_summary()
            .returning(|_, _| Ok(HashMap::new()));
        interactions
            .expect_fetch_similar_user_candidates()
            .returning(|_, _, _, _| Ok(vec![]));

        let mut catalog = MockCatalogStore::new();
        catalog
            .expect_fetch_by_genres()
            .returning(|_, _, _| Ok(vec![genre_match("action-1", &["ACTION"], 0.3)]));
        catalog
            .expect_fetch_all()
            .returning(|_, limit, _| Ok(catalog_listing(limit)));

        let engine = Arc::new(engine(preferences, interactions, catalog));
        let results = engine
            .compute_batch(vec![known.to_string(), unreachable.to_string()], 2)
            .await
            .unwrap();

        assert_eq!(results.len(), 2);

        let personalized = &results[&known.to_string()];
        assert!(personalized.error().is_none());
        assert_eq!(personalized.recommendations().len(), 1);
        assert!(!personalized.recommendations()[0].is_fallback());

        let fallback = &results[&unreachable.to_string()];
        assert!(fallback.error().is_none());
        assert_eq!(fallback.recommendations().len(), 2);
        assert!(fallback.recommendations().iter().all(ScoredCandidate::is_fallback));
    }

    #[tokio::test]
    async fn test_batch_validation() {
        let engine = Arc::new(engine(
            MockPreferenceStore::new(),
            MockInteractionStore::new(),
            MockCatalogStore::new(),
        ));

        let empty = engine.compute_batch(vec![], 10).await;
        assert!(matches!(empty, Err(AppError::InvalidInput(_))));

        let oversized: Vec<String> = (0..51).map(|_| Uuid::new_v4().to_string()).collect();
        let err = engine.compute_batch(oversized, 10).await.unwrap_err();
        assert_eq!(err.to_string(), "Invalid input: Maximum 50 users per batch request");
    }
}
