use std::collections::HashMap;

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    middleware::RequestId,
    models::{BatchEntry, MediaCandidate, ScoredCandidate, UserProfile},
};

use super::AppState;

const DEFAULT_LIMIT: i64 = 10;

// Request/Response types

/// Raw query parameters; parsed by hand so bad values get the documented messages
#[derive(Debug, Default, Deserialize)]
pub struct RecommendationQuery {
    pub limit: Option<String>,
    pub offset: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct RecommendationResponse {
    pub user_id: String,
    pub recommendations: Vec<ScoredCandidate>,
    pub count: usize,
    pub limit: i64,
    pub offset: i64,
}

#[derive(Debug, Deserialize)]
pub struct BatchRequest {
    #[serde(default)]
    pub user_ids: Option<Vec<String>>,
    #[serde(default)]
    pub limit: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct BatchResponse {
    pub results: HashMap<String, BatchEntry>,
    pub total_users: usize,
}

#[derive(Debug, Deserialize)]
pub struct ScoreRequest {
    pub user_profile: UserProfile,
    #[serde(default)]
    pub available_media: Vec<MediaCandidate>,
    #[serde(default)]
    pub limit: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct ScoreResponse {
    pub user_id: String,
    pub recommendations: Vec<ScoredCandidate>,
    pub count: usize,
}

fn parse_param(raw: Option<&str>, default: i64, name: &str, expectation: &str) -> AppResult<i64> {
    match raw {
        None => Ok(default),
        Some(value) => value.trim().parse::<i64>().map_err(|_| {
            AppError::InvalidInput(format!("Invalid {} parameter. {}", name, expectation))
        }),
    }
}

/// Unwraps a JSON body, reporting malformed bodies as invalid input
fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> AppResult<T> {
    payload
        .map(|Json(body)| body)
        .map_err(|rejection| AppError::InvalidInput(rejection.body_text()))
}

// Handlers

/// Health check endpoint
pub async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "service": "recommendation-engine",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// Personalized recommendations for one user
pub async fn get_recommendations(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    Path(user_id): Path<String>,
    Query(query): Query<RecommendationQuery>,
) -> AppResult<Json<RecommendationResponse>> {
    let max_limit = state.engine.settings().max_limit;
    let limit = parse_param(
        query.limit.as_deref(),
        DEFAULT_LIMIT,
        "limit",
        &format!("Must be between 1 and {}", max_limit),
    )?;
    let offset = parse_param(query.offset.as_deref(), 0, "offset", "Must be non-negative")?;

    let parsed = Uuid::parse_str(&user_id)
        .map_err(|_| AppError::InvalidInput(format!("Invalid user_id format: {}", user_id)))?;

    tracing::info!(
        request_id = %request_id,
        user_id = %parsed,
        limit,
        offset,
        "Getting recommendations"
    );

    let recommendations = state.engine.compute(parsed, limit, offset).await?;

    Ok(Json(RecommendationResponse {
        user_id,
        count: recommendations.len(),
        recommendations,
        limit,
        offset,
    }))
}

/// Recommendations for up to `max_batch_size` users
pub async fn batch_recommendations(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    payload: Result<Json<BatchRequest>, JsonRejection>,
) -> AppResult<Json<BatchResponse>> {
    let request = json_body(payload)?;
    let user_ids = request.user_ids.ok_or_else(|| {
        AppError::InvalidInput("Missing user_ids in request body".to_string())
    })?;
    let total_users = user_ids.len();

    tracing::info!(
        request_id = %request_id,
        users = total_users,
        "Getting batch recommendations"
    );

    let results = state
        .engine
        .compute_batch(user_ids, request.limit.unwrap_or(DEFAULT_LIMIT))
        .await?;

    Ok(Json(BatchResponse {
        results,
        total_users,
    }))
}

/// Scores caller-supplied media against a caller-supplied profile
pub async fn score_recommendations(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    payload: Result<Json<ScoreRequest>, JsonRejection>,
) -> AppResult<Json<ScoreResponse>> {
    let request = json_body(payload)?;
    tracing::info!(
        request_id = %request_id,
        user_id = %request.user_profile.user_id,
        media = request.available_media.len(),
        "Scoring supplied media"
    );

    let recommendations = state
        .engine
        .compute_supplied(
            &request.user_profile,
            request.available_media,
            request.limit.unwrap_or(DEFAULT_LIMIT),
        )
        .await?;

    Ok(Json(ScoreResponse {
        user_id: request.user_profile.user_id,
        count: recommendations.len(),
        recommendations,
    }))
}

/// Fallback for unknown routes
pub async fn not_found() -> (StatusCode, Json<Value>) {
    (
        StatusCode::NOT_FOUND,
        Json(json!({ "error": "Endpoint not found" })),
    )
}
