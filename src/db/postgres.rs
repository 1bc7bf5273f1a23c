use sqlx::{postgres::PgPoolOptions, PgPool};
use std::{future::Future, time::Duration};

use crate::error::{AppError, AppResult};

/// Bounds applied to every store pool
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolSettings {
    pub max_connections: u32,
    /// Wait for a pooled connection
    pub connect_timeout: Duration,
    /// Wait for a single query
    pub read_timeout: Duration,
}

impl Default for PoolSettings {
    fn default() -> Self {
        Self {
            max_connections: 5,
            connect_timeout: Duration::from_millis(3_000),
            read_timeout: Duration::from_millis(5_000),
        }
    }
}

/// Creates a PostgreSQL connection pool
///
/// The pool connects lazily so the service starts even if a store is down; requests
/// against an unreachable store degrade instead of failing.
pub fn create_pool(database_url: &str, settings: &PoolSettings) -> anyhow::Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(settings.max_connections)
        .acquire_timeout(settings.connect_timeout)
        .connect_lazy(database_url)?;

    Ok(pool)
}

/// Runs a query under the read timeout
///
/// An elapsed timeout becomes [`AppError::UpstreamUnavailable`]; query failures become
/// [`AppError::Database`].
pub async fn with_read_timeout<T, F>(
    read_timeout: Duration,
    operation: &str,
    query: F,
) -> AppResult<T>
where
    F: Future<Output = Result<T, sqlx::Error>>,
{
    match tokio::time::timeout(read_timeout, query).await {
        Ok(result) => result.map_err(AppError::from),
        Err(_) => {
            tracing::warn!(
                operation = operation,
                timeout_ms = read_timeout.as_millis() as u64,
                "Store query timed out"
            );
            Err(AppError::UpstreamUnavailable(format!(
                "{} timed out after {}ms",
                operation,
                read_timeout.as_millis()
            )))
        }
    }
}
