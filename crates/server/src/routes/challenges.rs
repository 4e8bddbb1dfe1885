//! Routes for provisioning challenges and enrolling users.

use axum::{
    Router,
    extract::{Path, State},
    response::Json as ResponseJson,
    routing::post,
};
use db::models::{
    challenge::{Challenge, CreateChallenge},
    user_progress::UserProgress,
};
use utils::response::ApiResponse;
use uuid::Uuid;

use crate::{AppState, error::ApiError};

/// POST /api/challenges
/// Create a challenge together with its day tasks
pub async fn create_challenge(
    State(state): State<AppState>,
    axum::Json(payload): axum::Json<CreateChallenge>,
) -> Result<ResponseJson<ApiResponse<Challenge>>, ApiError> {
    let challenge = state.challenges.create(payload).await?;
    Ok(ResponseJson(ApiResponse::success(challenge)))
}

/// GET /api/challenges
pub async fn list_challenges(
    State(state): State<AppState>,
) -> Result<ResponseJson<ApiResponse<Vec<Challenge>>>, ApiError> {
    let challenges = state.challenges.list().await?;
    Ok(ResponseJson(ApiResponse::success(challenges)))
}

/// POST /api/users/{user_id}/challenges/{challenge_id}/start
pub async fn start_challenge(
    State(state): State<AppState>,
    Path((user_id, challenge_id)): Path<(Uuid, Uuid)>,
) -> Result<ResponseJson<ApiResponse<UserProgress>>, ApiError> {
    let progress = state.challenges.start(user_id, challenge_id).await?;
    Ok(ResponseJson(ApiResponse::success(progress)))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/challenges", post(create_challenge).get(list_challenges))
        .route(
            "/users/{user_id}/challenges/{challenge_id}/start",
            post(start_challenge),
        )
}

