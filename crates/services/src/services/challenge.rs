//! Challenge provisioning and enrolment.

use std::collections::HashSet;

use db::models::{
    challenge::{Challenge, CreateChallenge},
    user_progress::UserProgress,
};
use sqlx::SqlitePool;
use thiserror::Error;
use tracing::info;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum ChallengeError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("challenge not found")]
    NotFound,
    #[error("challenge already in progress")]
    AlreadyInProgress,
    #[error("invalid day index: {0}")]
    InvalidDayIndex(i64),
    #[error("duplicate day index: {0}")]
    DuplicateDayIndex(i64),
    #[error("day {day_index}: {field} must not be negative")]
    NegativeValue {
        day_index: i64,
        field: &'static str,
    },
}

#[derive(Clone)]
pub struct ChallengeService {
    pool: SqlitePool,
}

impl ChallengeService {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, data: CreateChallenge) -> Result<Challenge, ChallengeError> {
        validate_tasks(&data)?;
        let challenge = Challenge::create(&self.pool, Uuid::new_v4(), &data).await?;
        info!(
            challenge_id = %challenge.id,
            days = data.tasks.len(),
            "Challenge provisioned"
        );
        Ok(challenge)
    }

    pub async fn list(&self) -> Result<Vec<Challenge>, ChallengeError> {
        Ok(Challenge::find_all(&self.pool).await?)
    }

    /// Enrol `user_id` at day 1. A user holds at most one in-progress challenge.
    pub async fn start(
        &self,
        user_id: Uuid,
        challenge_id: Uuid,
    ) -> Result<UserProgress, ChallengeError> {
        Challenge::find_by_id(&self.pool, challenge_id)
            .await?
            .ok_or(ChallengeError::NotFound)?;

        if UserProgress::find_in_progress_by_user_id(&self.pool, user_id)
            .await?
            .is_some()
        {
            return Err(ChallengeError::AlreadyInProgress);
        }

        // The partial unique index catches a concurrent enrolment that slipped past the check.
        let progress = UserProgress::create(&self.pool, Uuid::new_v4(), user_id, challenge_id)
            .await
            .map_err(|e| match e {
                sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
                    ChallengeError::AlreadyInProgress
                }
                other => ChallengeError::Database(other),
            })?;

        info!(user_id = %user_id, challenge_id = %challenge_id, "Challenge started");
        Ok(progress)
    }
}

/// Day indexes are unique and 1-based; rewards and durations are never negative, since a
/// completed day's rewards are applied after its pointer advance has been committed.
fn validate_tasks(data: &CreateChallenge) -> Result<(), ChallengeError> {
    let mut seen = HashSet::new();
    for task in &data.tasks {
        if task.day_index < 1 {
            return Err(ChallengeError::InvalidDayIndex(task.day_index));
        }
        if !seen.insert(task.day_index) {
            return Err(ChallengeError::DuplicateDayIndex(task.day_index));
        }
        for (field, value) in [
            ("xp_reward", task.xp_reward),
            ("gems_reward", task.gems_reward),
            ("duration_minutes", task.duration_minutes),
        ] {
            if value < 0 {
                return Err(ChallengeError::NegativeValue {
                    day_index: task.day_index,
                    field,
                });
            }
        }
    }
    Ok(())
}
