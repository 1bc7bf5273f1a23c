use chrono::{DateTime, Duration as WindowDuration, Utc};
use sqlx::PgPool;
use std::{collections::HashMap, time::Duration};

use crate::{
    db::{postgres::with_read_timeout, InteractionStore},
    error::AppResult,
    models::{CollaborativeSignal, InteractionSummary, UserId},
};

/// Earliest timestamp inside a lookback window ending now
pub fn window_start(window_days: u32) -> DateTime<Utc> {
    Utc::now() - WindowDuration::days(i64::from(window_days))
}

#[derive(Debug, sqlx::FromRow)]
struct SummaryRow {
    media_id: String,
    interaction_count: i64,
    like_count: i64,
    dislike_count: i64,
    watch_count: i64,
    total_value: f64,
    last_interaction: Option<DateTime<Utc>>,
}

#[derive(Debug, sqlx::FromRow)]
struct SignalRow {
    media_id: String,
    user_count: i64,
    total_value: f64,
}

/// Interaction history backed by the `interaction` table
#[derive(Clone)]
pub struct PgInteractionStore {
    pool: PgPool,
    read_timeout: Duration,
}

impl PgInteractionStore {
    pub fn new(pool: PgPool, read_timeout: Duration) -> Self {
        Self { pool, read_timeout }
    }
}

#[async_trait::async_trait]
impl InteractionStore for PgInteractionStore {
    async fn fetch_summary(
        &self,
        user_id: UserId,
        window_days: u32,
    ) -> AppResult<HashMap<String, InteractionSummary>> {
        let rows: Vec<SummaryRow> = with_read_timeout(
            self.read_timeout,
            "interaction summary",
            sqlx::query_as(
                r#"
                SELECT
                    media_id::text AS media_id,
                    COUNT(*) AS interaction_count,
                    COUNT(*) FILTER (WHERE type = 'LIKE') AS like_count,
                    COUNT(*) FILTER (WHERE type = 'DISLIKE') AS dislike_count,
                    COUNT(*) FILTER (WHERE type = 'WATCH') AS watch_count,
                    COALESCE(SUM(interaction_value), 0)::float8 AS total_value,
                    MAX("timestamp") AS last_interaction
                FROM interaction
                WHERE user_id = $1
                  AND "timestamp" >= $2
                GROUP BY media_id
                "#,
            )
            .bind(user_id)
            .bind(window_start(window_days))
            .fetch_all(&self.pool),
        )
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| {
                (
                    row.media_id.clone(),
                    InteractionSummary {
                        media_id: row.media_id,
                        interaction_count: row.interaction_count,
                        like_count: row.like_count,
                        dislike_count: row.dislike_count,
                        watch_count: row.watch_count,
                        total_value: row.total_value,
                        last_interaction: row.last_interaction,
                    },
                )
            })
            .collect())
    }

    async fn fetch_similar_user_candidates(
        &self,
        user_id: UserId,
        window_days: u32,
        fanout_cap: usize,
        candidate_cap: usize,
    ) -> AppResult<Vec<CollaborativeSignal>> {
        // seed set -> capped neighbor set -> aggregated, capped candidates
        let rows: Vec<SignalRow> = with_read_timeout(
            self.read_timeout,
            "similar user candidates",
            sqlx::query_as(
                r#"
                WITH seed_media AS (
                    SELECT DISTINCT media_id
                    FROM interaction
                    WHERE user_id = $1
                      AND "timestamp" >= $2
                      AND type IN ('LIKE', 'WATCH')
                ),
                neighbors AS (
                    SELECT DISTINCT i.user_id
                    FROM interaction i
                    INNER JOIN seed_media s ON i.media_id = s.media_id
                    WHERE i.user_id <> $1
                      AND i."timestamp" >= $2
                      AND i.type IN ('LIKE', 'WATCH')
                    ORDER BY i.user_id
                    LIMIT $3
                )
                SELECT
                    i.media_id::text AS media_id,
                    COUNT(DISTINCT i.user_id) AS user_count,
                    COALESCE(SUM(i.interaction_value), 0)::float8 AS total_value
                FROM interaction i
                INNER JOIN neighbors n ON i.user_id = n.user_id
                WHERE i."timestamp" >= $2
                  AND i.type IN ('LIKE', 'WATCH')
                  AND i.media_id NOT IN (SELECT media_id FROM seed_media)
                GROUP BY i.media_id
                ORDER BY user_count DESC, total_value DESC, media_id ASC
                LIMIT $4
                "#,
            )
            .bind(user_id)
            .bind(window_start(window_days))
            .bind(fanout_cap as i64)
            .bind(candidate_cap as i64)
            .fetch_all(&self.pool),
        )
        .await?;

        tracing::debug!(
            user_id = %user_id,
            candidates = rows.len(),
            "Fetched collaborative candidates"
        );

        Ok(rows
            .into_iter()
            .map(|row| CollaborativeSignal {
                media_id: row.media_id,
                supporting_user_count: row.user_count,
                raw_value: row.total_value,
            })
            .collect())
    }
}
