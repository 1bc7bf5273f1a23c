use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use super::handlers;
use super::AppState;
use crate::middleware::{make_span_with_request_id, request_id_middleware};

/// Creates the main API router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health_check))
        // Personalized
        .route(
            "/api/recommendations/batch",
            post(handlers::batch_recommendations),
        )
        .route(
            "/api/recommendations/:user_id",
            get(handlers::get_recommendations),
        )
        // Stateless scoring
        .route(
            "/api/recommendations/score",
            post(handlers::score_recommendations),
        )
        .fallback(handlers::not_found)
        .with_state(state)
        // request id first, so the trace span can carry it
        .layer(
            ServiceBuilder::new()
                .layer(middleware::from_fn(request_id_middleware))
                .layer(TraceLayer::new_for_http().make_span_with(make_span_with_request_id))
                .layer(CorsLayer::permissive()),
        )
}
