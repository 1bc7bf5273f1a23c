use chrono::{DateTime, Utc};
use sqlx::PgPool;
use std::{
    collections::{HashMap, HashSet},
    time::Duration,
};

use crate::{
    db::{postgres::with_read_timeout, CatalogStore},
    error::AppResult,
    models::{CatalogOrder, GenreMatch, MediaCandidate, MediaMetadata},
};

/// Columns shared by every catalog query; genres are aggregated in one pass to avoid N+1
const MEDIA_COLUMNS: &str = r#"
    m.id::text AS id,
    m.title,
    m.description,
    m.release_year,
    m.media_type,
    m.cover_url,
    COALESCE(m.popularity_score, 0)::float8 AS popularity_score,
    m.create_at,
    COALESCE(
        array_agg(DISTINCT mg.genre_name) FILTER (WHERE mg.genre_name IS NOT NULL),
        ARRAY[]::text[]
    ) AS genres
"#;

#[derive(Debug, sqlx::FromRow)]
struct MediaRow {
    id: String,
    title: Option<String>,
    description: Option<String>,
    release_year: Option<i32>,
    media_type: Option<String>,
    cover_url: Option<String>,
    popularity_score: f64,
    create_at: Option<DateTime<Utc>>,
    genres: Vec<String>,
}

impl From<MediaRow> for MediaCandidate {
    fn from(row: MediaRow) -> Self {
        let metadata = MediaMetadata {
            title: row.title,
            description: row.description,
            release_year: row.release_year,
            media_type: row.media_type,
            cover_url: row.cover_url,
            created_at: row.create_at,
        };
        MediaCandidate::new(row.id, row.genres, row.popularity_score).with_metadata(metadata)
    }
}

#[derive(Debug, sqlx::FromRow)]
struct GenreMatchRow {
    #[sqlx(flatten)]
    media: MediaRow,
    genre_match_count: i64,
}

/// Catalog backed by the `medias` and `tb_media_genre` tables
#[derive(Clone)]
pub struct PgCatalogStore {
    pool: PgPool,
    read_timeout: Duration,
}

impl PgCatalogStore {
    pub fn new(pool: PgPool, read_timeout: Duration) -> Self {
        Self { pool, read_timeout }
    }
}

fn order_clause(order: CatalogOrder) -> &'static str {
    match order {
        CatalogOrder::Popularity => "ORDER BY popularity_score DESC, id ASC",
        CatalogOrder::Recency => "ORDER BY create_at DESC NULLS LAST, id ASC",
    }
}

fn exclusion_list(exclude_ids: &HashSet<String>) -> Vec<String> {
    exclude_ids.iter().cloned().collect()
}

#[async_trait::async_trait]
impl CatalogStore for PgCatalogStore {
    async fn fetch_all(
        &self,
        exclude_ids: &HashSet<String>,
        limit: usize,
        order: CatalogOrder,
    ) -> AppResult<Vec<MediaCandidate>> {
        let query = format!(
            r#"
            SELECT {columns}
            FROM medias m
            LEFT JOIN tb_media_genre mg ON mg.media_id = m.id
            WHERE m.deleted_at IS NULL
              AND NOT (m.id::text = ANY($1))
            GROUP BY m.id
            {order}
            LIMIT $2
            "#,
            columns = MEDIA_COLUMNS,
            order = order_clause(order),
        );

        let rows: Vec<MediaRow> = with_read_timeout(
            self.read_timeout,
            "catalog fetch_all",
            sqlx::query_as(&query)
                .bind(exclusion_list(exclude_ids))
                .bind(limit as i64)
                .fetch_all(&self.pool),
        )
        .await?;

        tracing::debug!(count = rows.len(), ?order, "Fetched catalog page");

        Ok(rows.into_iter().map(MediaCandidate::from).collect())
    }

    async fn fetch_by_ids(&self, ids: &[String]) -> AppResult<HashMap<String, MediaCandidate>> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        let query = format!(
            r#"
            SELECT {columns}
            FROM medias m
            LEFT JOIN tb_media_genre mg ON mg.media_id = m.id
            WHERE m.id::text = ANY($1) AND m.deleted_at IS NULL
            GROUP BY m.id
            "#,
            columns = MEDIA_COLUMNS,
        );

        let rows: Vec<MediaRow> = with_read_timeout(
            self.read_timeout,
            "catalog fetch_by_ids",
            sqlx::query_as(&query).bind(ids).fetch_all(&self.pool),
        )
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| (row.id.clone(), MediaCandidate::from(row)))
            .collect())
    }

    async fn fetch_by_genres(
        &self,
        genres: &[String],
        limit: usize,
        exclude_ids: &HashSet<String>,
    ) -> AppResult<Vec<GenreMatch>> {
        if genres.is_empty() {
            return Ok(Vec::new());
        }

        let query = format!(
            r#"
            SELECT {columns},
                COUNT(DISTINCT mg.genre_name)
                    FILTER (WHERE mg.genre_name = ANY($1)) AS genre_match_count
            FROM medias m
            LEFT JOIN tb_media_genre mg ON mg.media_id = m.id
            WHERE m.deleted_at IS NULL
              AND NOT (m.id::text = ANY($2))
            GROUP BY m.id
            HAVING COUNT(DISTINCT mg.genre_name) FILTER (WHERE mg.genre_name = ANY($1)) > 0
            ORDER BY genre_match_count DESC, popularity_score DESC, id ASC
            LIMIT $3
            "#,
            columns = MEDIA_COLUMNS,
        );

        let rows: Vec<GenreMatchRow> = with_read_timeout(
            self.read_timeout,
            "catalog fetch_by_genres",
            sqlx::query_as(&query)
                .bind(genres)
                .bind(exclusion_list(exclude_ids))
                .bind(limit as i64)
                .fetch_all(&self.pool),
        )
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| GenreMatch {
                candidate: MediaCandidate::from(row.media),
                genre_match_count: row.genre_match_count,
            })
            .collect())
    }
}
