use std::sync::Arc;

use anyhow::Context;
use sqlx::PgPool;
use tracing_subscriber::EnvFilter;

use recommendation_engine::{
    api::{create_router, AppState},
    config::Config,
    db::{create_pool, PgCatalogStore, PgInteractionStore, PgPreferenceStore},
    services::RecommendationEngine,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = Config::from_env()?;
    let pool_settings = config.pool_settings();

    let preferences_pool = create_pool(&config.preferences_database_url, &pool_settings)
        .context("invalid preferences database url")?;
    let interactions_pool = create_pool(&config.interactions_database_url, &pool_settings)
        .context("invalid interactions database url")?;
    let catalog_pool = create_pool(&config.catalog_database_url, &pool_settings)
        .context("invalid catalog database url")?;

    if config.run_migrations {
        run_migrations(&preferences_pool, &interactions_pool, &catalog_pool).await?;
    }

    let engine = RecommendationEngine::new(
        Arc::new(PgPreferenceStore::new(preferences_pool, pool_settings.read_timeout)),
        Arc::new(PgInteractionStore::new(interactions_pool, pool_settings.read_timeout)),
        Arc::new(PgCatalogStore::new(catalog_pool, pool_settings.read_timeout)),
        config.engine_settings()?,
    )?;

    let app = create_router(AppState::new(engine));

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    tracing::info!(%addr, "Recommendation engine listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn run_migrations(
    preferences: &PgPool,
    interactions: &PgPool,
    catalog: &PgPool,
) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations/preferences")
        .run(preferences)
        .await
        .context("preferences migrations failed")?;
    sqlx::migrate!("./migrations/interactions")
        .run(interactions)
        .await
        .context("interactions migrations failed")?;
    sqlx::migrate!("./migrations/catalog")
        .run(catalog)
        .await
        .context("catalog migrations failed")?;

    tracing::info!("Migrations applied");
    Ok(())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => tracing::info!("Shutdown signal received"),
        Err(err) => tracing::error!(?err, "Failed to listen for shutdown signal"),
    }
}
