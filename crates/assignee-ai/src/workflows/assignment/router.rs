use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};

use crate::error::AppError;

use super::service::{AssignmentService, RecommendOptions, RecommendationResult};
use super::state::AssignmentState;

/// Router builder exposing the recommendation entry point and state maintenance.
pub fn assignment_router(service: Arc<AssignmentService>) -> Router {
    Router::new()
        .route(
            "/api/v1/issues/:issue_key/recommendation",
            post(recommend_handler),
        )
        .route(
            "/api/v1/issues/:issue_key/assignment-state",
            get(state_handler).delete(clear_state_handler),
        )
        .with_state(service)
}

pub(crate) async fn recommend_handler(
    State(service): State<Arc<AssignmentService>>,
    Path(issue_key): Path<String>,
    Json(options): Json<RecommendOptions>,
) -> Result<Json<RecommendationResult>, AppError> {
    let result = service.recommend(&issue_key, options).await?;
    Ok(Json(result))
}

pub(crate) async fn state_handler(
    State(service): State<Arc<AssignmentService>>,
    Path(issue_key): Path<String>,
) -> Result<Json<AssignmentState>, AppError> {
    let state = service.get_state(&issue_key).await?;
    Ok(Json(state))
}

pub(crate) async fn clear_state_handler(
    State(service): State<Arc<AssignmentService>>,
    Path(issue_key): Path<String>,
) -> Result<StatusCode, AppError> {
    service.clear_state(&issue_key).await?;
    Ok(StatusCode::NO_CONTENT)
}
