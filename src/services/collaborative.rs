use chrono::{DateTime, Utc};
use std::{
    cmp::Ordering,
    collections::{BTreeSet, HashMap, HashSet},
    sync::Arc,
};

use crate::{
    config::EngineSettings,
    db::InteractionStore,
    models::{CollaborativeSignal, InteractionRecord, UserId},
};

/// Normalized collaborative score of one candidate
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CollaborativeScore {
    pub score: f64,
    pub supporting_user_count: i64,
}

/// Scores candidates by how strongly similar users engaged with them
///
/// Similar users are those sharing at least one positive (LIKE/WATCH) interaction with the
/// target user inside the lookback window.
#[derive(Clone)]
pub struct CollaborativeScorer {
    interactions: Arc<dyn InteractionStore>,
    window_days: u32,
    fanout_cap: usize,
    candidate_cap: usize,
}

impl CollaborativeScorer {
    pub fn new(interactions: Arc<dyn InteractionStore>, settings: &EngineSettings) -> Self {
        Self {
            interactions,
            window_days: settings.lookback_days,
            fanout_cap: settings.neighbor_fanout,
            candidate_cap: settings.collaborative_candidate_cap,
        }
    }

    /// Collaborative scores keyed by media id
    ///
    /// A failed or timed out fetch yields an empty map: the request loses this signal but
    /// still completes.
    pub async fn score(&self, user_id: UserId) -> HashMap<String, CollaborativeScore> {
        let signals = match self
            .interactions
            .fetch_similar_user_candidates(
                user_id,
                self.window_days,
                self.fanout_cap,
                self.candidate_cap,
            )
            .await
        {
            Ok(signals) => signals,
            Err(e) => {
                tracing::warn!(
                    user_id = %user_id,
                    error = %e,
                    "Collaborative candidates unavailable, continuing without them"
                );
                return HashMap::new();
            }
        };

        let capped = rank_and_cap(signals, self.candidate_cap);
        let scores = normalize(&capped);

        tracing::info!(
            user_id = %user_id,
            candidates = scores.len(),
            "Collaborative scoring completed"
        );

        scores
    }
}

fn compare_signals(a: &CollaborativeSignal, b: &CollaborativeSignal) -> Ordering {
    b.supporting_user_count
        .cmp(&a.supporting_user_count)
        .then_with(|| b.raw_value.total_cmp(&a.raw_value))
        .then_with(|| a.media_id.cmp(&b.media_id))
}

/// Orders by supporting users, then summed value (both descending), then media id, and
/// keeps the first `cap`
///
/// Truncation happens on this order, before normalization, so the cap prunes by support
/// rather than by final score.
pub fn rank_and_cap(mut signals: Vec<CollaborativeSignal>, cap: usize) -> Vec<CollaborativeSignal> {
    signals.sort_by(compare_signals);
    signals.truncate(cap);
    signals
}

/// Divides each raw score by the largest raw score in the set
///
/// All scores are 0 when the largest raw score is not positive.
pub fn normalize(signals: &[CollaborativeSignal]) -> HashMap<String, CollaborativeScore> {
    let max_raw = signals
        .iter()
        .map(CollaborativeSignal::raw_score)
        .fold(0.0_f64, f64::max);

    signals
        .iter()
        .map(|signal| {
            let score = if max_raw > 0.0 {
                (signal.raw_score() / max_raw).clamp(0.0, 1.0)
            } else {
                0.0
            };
            (
                signal.media_id.clone(),
                CollaborativeScore {
                    score,
                    supporting_user_count: signal.supporting_user_count,
                },
            )
        })
        .collect()
}

/// In-process three-pass aggregation over raw interaction records
///
/// 1. seed set: media the user positively interacted with since `since`
/// 2. neighbors: other users with a positive interaction on a seed item, lowest ids first,
///    at most `fanout_cap`
/// 3. every other media the neighbors positively interacted with, excluding seeds, grouped
///    into distinct supporting users and summed value, ranked and capped
pub fn aggregate_neighbors(
    records: &[InteractionRecord],
    user_id: UserId,
    since: DateTime<Utc>,
    fanout_cap: usize,
    candidate_cap: usize,
) -> Vec<CollaborativeSignal> {
    let positive: Vec<&InteractionRecord> = records
        .iter()
        .filter(|r| r.timestamp >= since && r.interaction_type.is_positive())
        .collect();

    let seeds: HashSet<&str> = positive
        .iter()
        .filter(|r| r.user_id == user_id)
        .map(|r| r.media_id.as_str())
        .collect();

    if seeds.is_empty() {
        return Vec::new();
    }

    let neighbors: HashSet<UserId> = positive
        .iter()
        .filter(|r| r.user_id != user_id && seeds.contains(r.media_id.as_str()))
        .map(|r| r.user_id)
        .collect::<BTreeSet<UserId>>()
        .into_iter()
        .take(fanout_cap)
        .collect();

    let mut grouped: HashMap<&str, (HashSet<UserId>, f64)> = HashMap::new();
    for record in positive
        .iter()
        .filter(|r| neighbors.contains(&r.user_id) && !seeds.contains(r.media_id.as_str()))
    {
        let (users, total) = grouped.entry(record.media_id.as_str()).or_default();
        users.insert(record.user_id);
        *total += record.value;
    }

    let signals = grouped
        .into_iter()
        .map(|(media_id, (users, total))| CollaborativeSignal {
            media_id: media_id.to_string(),
            supporting_user_count: users.len() as i64,
            raw_value: total,
        })
        .collect();

    rank_and_cap(signals, candidate_cap)
}
