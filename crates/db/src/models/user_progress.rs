use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{Executor, FromRow, Sqlite, SqlitePool, Type};
use strum_macros::{Display, EnumString};
use ts_rs::TS;
use uuid::Uuid;

#[derive(
    Debug, Clone, Copy, Type, Serialize, Deserialize, PartialEq, Eq, TS, EnumString, Display, Default,
)]
#[sqlx(type_name = "progress_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ProgressStatus {
    #[default]
    InProgress,
    Completed,
}

/// A user's position inside a challenge. `current_day_index` is the next day to complete
/// and only ever moves forward.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, TS)]
pub struct UserProgress {
    pub id: Uuid,
    pub user_id: Uuid,
    pub challenge_id: Uuid,
    #[ts(type = "number")]
    pub current_day_index: i64,
    pub status: ProgressStatus,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl UserProgress {
    pub async fn create(
        pool: &SqlitePool,
        id: Uuid,
        user_id: Uuid,
        challenge_id: Uuid,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, UserProgress>(
            r#"INSERT INTO user_progress (id, user_id, challenge_id, current_day_index, status, started_at)
            VALUES ($1, $2, $3, 1, $4, $5)
            RETURNING id, user_id, challenge_id, current_day_index, status, started_at, completed_at"#,
        )
        .bind(id)
        .bind(user_id)
        .bind(challenge_id)
        .bind(ProgressStatus::InProgress)
        .bind(Utc::now())
        .fetch_one(pool)
        .await
    }

    pub async fn find_by_id(pool: &SqlitePool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, UserProgress>(
            r#"SELECT id, user_id, challenge_id, current_day_index, status, started_at, completed_at
            FROM user_progress
            WHERE id = $1"#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    pub async fn find_in_progress_by_user_id(
        pool: &SqlitePool,
        user_id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, UserProgress>(
            r#"SELECT id, user_id, challenge_id, current_day_index, status, started_at, completed_at
            FROM user_progress
            WHERE user_id = $1 AND status = $2"#,
        )
        .bind(user_id)
        .bind(ProgressStatus::InProgress)
        .fetch_optional(pool)
        .await
    }

    /// The progress the path view should show: the in-progress challenge if there is one,
    /// otherwise the most recently started finished one.
    pub async fn find_current_by_user_id(
        pool: &SqlitePool,
        user_id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, UserProgress>(
            r#"SELECT id, user_id, challenge_id, current_day_index, status, started_at, completed_at
            FROM user_progress
            WHERE user_id = $1
            ORDER BY status = $2 DESC, started_at DESC
            LIMIT 1"#,
        )
        .bind(user_id)
        .bind(ProgressStatus::InProgress)
        .fetch_optional(pool)
        .await
    }

    /// Move the user's in-progress pointer forward by one and return the updated row.
    /// Being a single UPDATE, this takes the write lock before the old value is observed,
    /// so callers running it first inside a transaction never double-advance.
    pub async fn advance_in_progress<'e, E>(
        executor: E,
        user_id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        sqlx::query_as::<_, UserProgress>(
            r#"UPDATE user_progress
            SET current_day_index = current_day_index + 1
            WHERE user_id = $1 AND status = $2
            RETURNING id, user_id, challenge_id, current_day_index, status, started_at, completed_at"#,
        )
        .bind(user_id)
        .bind(ProgressStatus::InProgress)
        .fetch_optional(executor)
        .await
    }

    pub async fn mark_completed<'e, E>(
        executor: E,
        id: Uuid,
        completed_at: DateTime<Utc>,
    ) -> Result<(), sqlx::Error>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        sqlx::query("UPDATE user_progress SET status = $2, completed_at = $3 WHERE id = $1")
            .bind(id)
            .bind(ProgressStatus::Completed)
            .bind(completed_at)
            .execute(executor)
            .await?;
        Ok(())
    }
}
