use sqlx::PgPool;
use std::{collections::HashMap, time::Duration};

use crate::{
    db::{postgres::with_read_timeout, PreferenceStore},
    error::AppResult,
    models::{UserId, UserPreference},
};

/// One profile row joined with at most one genre weight
#[derive(Debug, sqlx::FromRow)]
struct PreferenceRow {
    user_id: UserId,
    genre_name: Option<String>,
    weight: Option<f64>,
}

/// Folds joined rows into one snapshot per user
///
/// A profile row without genres still yields a (empty) snapshot: the user has a profile.
fn group_rows(rows: Vec<PreferenceRow>) -> HashMap<UserId, UserPreference> {
    let mut preferences: HashMap<UserId, UserPreference> = HashMap::new();

    for row in rows {
        let entry = preferences
            .entry(row.user_id)
            .or_insert_with(|| UserPreference::new(row.user_id, HashMap::new()));

        if let Some(genre) = row.genre_name {
            entry.genre_weights.insert(genre, row.weight.unwrap_or(0.0));
        }
    }

    preferences
}

/// Preferences backed by `user_preferences` and `tb_user_genre`
#[derive(Clone)]
pub struct PgPreferenceStore {
    pool: PgPool,
    read_timeout: Duration,
}

impl PgPreferenceStore {
    pub fn new(pool: PgPool, read_timeout: Duration) -> Self {
        Self { pool, read_timeout }
    }
}

#[async_trait::async_trait]
impl PreferenceStore for PgPreferenceStore {
    async fn fetch(&self, user_id: UserId) -> AppResult<Option<UserPreference>> {
        let rows: Vec<PreferenceRow> = with_read_timeout(
            self.read_timeout,
            "user preferences",
            sqlx::query_as(
                r#"
                SELECT up.user_id, ug.genre_name, ug.weight::float8 AS weight
                FROM user_preferences up
                LEFT JOIN tb_user_genre ug ON ug.user_id = up.user_id
                WHERE up.user_id = $1
                "#,
            )
            .bind(user_id)
            .fetch_all(&self.pool),
        )
        .await?;

        Ok(group_rows(rows).remove(&user_id))
    }

    async fn fetch_batch(
        &self,
        user_ids: &[UserId],
    ) -> AppResult<HashMap<UserId, UserPreference>> {
        if user_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let rows: Vec<PreferenceRow> = with_read_timeout(
            self.read_timeout,
            "batch user preferences",
            sqlx::query_as(
                r#"
                SELECT up.user_id, ug.genre_name, ug.weight::float8 AS weight
                FROM user_preferences up
                LEFT JOIN tb_user_genre ug ON ug.user_id = up.user_id
                WHERE up.user_id = ANY($1)
                "#,
            )
            .bind(user_ids)
            .fetch_all(&self.pool),
        )
        .await?;

        Ok(group_rows(rows))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_group_rows() {
        let with_genres = Uuid::new_v4();
        let without_genres = Uuid::new_v4();

        let rows = vec![
            PreferenceRow {
                user_id: with_genres,
                genre_name: Some("ACTION".to_string()),
                weight: Some(8.0),
            },
            PreferenceRow {
                user_id: with_genres,
                genre_name: Some("THRILLER".to_string()),
                weight: Some(6.0),
            },
            PreferenceRow {
                user_id: without_genres,
                genre_name: None,
                weight: None,
            },
        ];

        let grouped = group_rows(rows);

        assert_eq!(grouped.len(), 2);
        assert_eq!(grouped[&with_genres].genre_weights["ACTION"], 8.0);
        assert_eq!(grouped[&with_genres].genre_weights.len(), 2);
        assert!(grouped[&without_genres].genre_weights.is_empty());
    }
}
