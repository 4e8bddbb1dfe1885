//! Routes for the saga path progress map.

use axum::{
    Router,
    extract::{Path, State},
    response::Json as ResponseJson,
    routing::{get, post},
};
use services::services::{progression::PathView, saga_path::CompletionResult};
use utils::response::ApiResponse;
use uuid::Uuid;

use crate::{AppState, error::ApiError};

/// GET /api/users/{user_id}/path
/// Nodes with status and layout side, recomputed from the current day pointer
pub async fn get_path(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> Result<ResponseJson<ApiResponse<PathView>>, ApiError> {
    let view = state.saga_path.get_path(user_id).await?;
    Ok(ResponseJson(ApiResponse::success(view)))
}

/// POST /api/users/{user_id}/path/complete
/// Complete the current day and apply its rewards
pub async fn complete_day(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> Result<ResponseJson<ApiResponse<CompletionResult>>, ApiError> {
    let result = state.saga_path.complete_day(user_id).await?;
    Ok(ResponseJson(ApiResponse::success(result)))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/users/{user_id}/path", get(get_path))
        .route("/users/{user_id}/path/complete", post(complete_day))
}
