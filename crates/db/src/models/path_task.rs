use serde::{Deserialize, Serialize};
use sqlx::{Executor, FromRow, Sqlite, SqlitePool};
use ts_rs::TS;
use uuid::Uuid;

/// One day of work inside a challenge. Immutable once the challenge is provisioned.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, TS)]
pub struct PathTask {
    pub id: Uuid,
    pub challenge_id: Uuid, // Foreign key to Challenge
    #[ts(type = "number")]
    pub day_index: i64,     // 1-based, unique within a challenge
    pub title: String,
    pub subtitle: Option<String>,
    #[ts(type = "number")]
    pub duration_minutes: i64,
    #[ts(type = "number")]
    pub xp_reward: i64,
    #[ts(type = "number")]
    pub gems_reward: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct CreatePathTask {
    #[ts(type = "number")]
    pub day_index: i64,
    pub title: String,
    pub subtitle: Option<String>,
    #[ts(type = "number")]
    pub duration_minutes: i64,
    #[ts(type = "number")]
    pub xp_reward: i64,
    #[ts(type = "number")]
    pub gems_reward: i64,
}

impl PathTask {
    pub async fn create<'e, E>(
        executor: E,
        id: Uuid,
        challenge_id: Uuid,
        data: &CreatePathTask,
    ) -> Result<Self, sqlx::Error>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        sqlx::query_as::<_, PathTask>(
            r#"INSERT INTO path_tasks
                (id, challenge_id, day_index, title, subtitle, duration_minutes, xp_reward, gems_reward)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING id, challenge_id, day_index, title, subtitle, duration_minutes, xp_reward, gems_reward"#,
        )
        .bind(id)
        .bind(challenge_id)
        .bind(data.day_index)
        .bind(&data.title)
        .bind(&data.subtitle)
        .bind(data.duration_minutes)
        .bind(data.xp_reward)
        .bind(data.gems_reward)
        .fetch_one(executor)
        .await
    }

    /// All tasks of a challenge, ascending by `day_index`.
    pub async fn find_by_challenge_id(
        pool: &SqlitePool,
        challenge_id: Uuid,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, PathTask>(
            r#"SELECT id, challenge_id, day_index, title, subtitle, duration_minutes, xp_reward, gems_reward
            FROM path_tasks
            WHERE challenge_id = $1
            ORDER BY day_index ASC"#,
        )
        .bind(challenge_id)
        .fetch_all(pool)
        .await
    }

    pub async fn find_by_day<'e, E>(
        executor: E,
        challenge_id: Uuid,
        day_index: i64,
    ) -> Result<Option<Self>, sqlx::Error>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        sqlx::query_as::<_, PathTask>(
            r#"SELECT id, challenge_id, day_index, title, subtitle, duration_minutes, xp_reward, gems_reward
            FROM path_tasks
            WHERE challenge_id = $1 AND day_index = $2"#,
        )
        .bind(challenge_id)
        .bind(day_index)
        .fetch_optional(executor)
        .await
    }

    pub async fn count_by_challenge_id<'e, E>(
        executor: E,
        challenge_id: Uuid,
    ) -> Result<i64, sqlx::Error>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM path_tasks WHERE challenge_id = $1")
            .bind(challenge_id)
            .fetch_one(executor)
            .await
    }
}
