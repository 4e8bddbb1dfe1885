use axum::{
    Router,
    extract::{Path, State},
    response::Json as ResponseJson,
    routing::{get, post},
};
use chrono::Utc;
use services::services::gamification::{StreakStatus, Wallet};
use utils::response::ApiResponse;
use uuid::Uuid;

use crate::{AppState, error::ApiError};

/// GET /api/users/{user_id}/wallet
pub async fn get_wallet(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> Result<ResponseJson<ApiResponse<Wallet>>, ApiError> {
    let wallet = state.gamification.wallet(user_id).await?;
    Ok(ResponseJson(ApiResponse::success(wallet)))
}

/// GET /api/users/{user_id}/streak
pub async fn get_streak(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> Result<ResponseJson<ApiResponse<StreakStatus>>, ApiError> {
    let status = state
        .gamification
        .streak_status(user_id, Utc::now().date_naive())
        .await?;
    Ok(ResponseJson(ApiResponse::success(status)))
}

/// POST /api/users/{user_id}/streak/freeze
/// Spend gems to keep an at-risk streak alive
pub async fn use_freeze(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> Result<ResponseJson<ApiResponse<StreakStatus>>, ApiError> {
    let status = state
        .gamification
        .use_freeze(user_id, Utc::now().date_naive())
        .await?;
    Ok(ResponseJson(ApiResponse::success(status)))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/users/{user_id}/wallet", get(get_wallet))
        .route("/users/{user_id}/streak", get(get_streak))
        .route("/users/{user_id}/streak/freeze", post(use_freeze))
}
