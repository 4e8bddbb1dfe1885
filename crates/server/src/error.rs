use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use services::services::{
    challenge::ChallengeError, gamification::GamificationError, saga_path::SagaPathError,
};
use thiserror::Error;
use utils::response::ApiResponse;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    SagaPath(#[from] SagaPathError),
    #[error(transparent)]
    Gamification(#[from] GamificationError),
    #[error(transparent)]
    Challenge(#[from] ChallengeError),
    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

fn gamification_status(err: &GamificationError) -> StatusCode {
    match err {
        GamificationError::Freeze(_) | GamificationError::StreakContention => StatusCode::CONFLICT,
        GamificationError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::SagaPath(err) => match err {
                SagaPathError::NoPathFound => StatusCode::NOT_FOUND,
                SagaPathError::NoCurrentDay => StatusCode::CONFLICT,
                SagaPathError::Gamification(inner) => gamification_status(inner),
                SagaPathError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            ApiError::Gamification(err) => gamification_status(err),
            ApiError::Challenge(err) => match err {
                ChallengeError::NotFound => StatusCode::NOT_FOUND,
                ChallengeError::AlreadyInProgress => StatusCode::CONFLICT,
                ChallengeError::InvalidDayIndex(_)
                | ChallengeError::DuplicateDayIndex(_)
                | ChallengeError::NegativeValue { .. } => StatusCode::BAD_REQUEST,
                ChallengeError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            ApiError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
            "Internal server error".to_string()
        } else {
            self.to_string()
        };
        (status, Json(ApiResponse::<()>::error(&message))).into_response()
    }
}
