use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{Executor, FromRow, Sqlite, SqlitePool};
use ts_rs::TS;
use uuid::Uuid;

pub const DEFAULT_HEARTS: i64 = 5;

/// Gamification counters for a user. Created lazily on first access.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, TS)]
pub struct UserStats {
    pub user_id: Uuid,
    pub xp: i64,
    pub gems: i64,
    pub hearts: i64,
    pub hearts_max: i64,
    pub current_streak: i64,
    pub longest_streak: i64,
    pub last_activity_date: Option<NaiveDate>, // UTC calendar day
    pub updated_at: DateTime<Utc>,
}

impl UserStats {
    pub async fn find_or_create(pool: &SqlitePool, user_id: Uuid) -> Result<Self, sqlx::Error> {
        sqlx::query(
            r#"INSERT INTO user_stats (user_id, hearts, hearts_max, updated_at)
            VALUES ($1, $2, $2, $3)
            ON CONFLICT(user_id) DO NOTHING"#,
        )
        .bind(user_id)
        .bind(DEFAULT_HEARTS)
        .bind(Utc::now())
        .execute(pool)
        .await?;

        sqlx::query_as::<_, UserStats>(
            r#"SELECT user_id, xp, gems, hearts, hearts_max, current_streak, longest_streak,
                   last_activity_date, updated_at
            FROM user_stats
            WHERE user_id = $1"#,
        )
        .bind(user_id)
        .fetch_one(pool)
        .await
    }

    pub async fn add_xp(pool: &SqlitePool, user_id: Uuid, amount: i64) -> Result<Self, sqlx::Error> {
        Self::find_or_create(pool, user_id).await?;
        sqlx::query_as::<_, UserStats>(
            r#"UPDATE user_stats
            SET xp = xp + $2, updated_at = $3
            WHERE user_id = $1
            RETURNING user_id, xp, gems, hearts, hearts_max, current_streak, longest_streak,
                      last_activity_date, updated_at"#,
        )
        .bind(user_id)
        .bind(amount)
        .bind(Utc::now())
        .fetch_one(pool)
        .await
    }

    pub async fn add_gems(
        pool: &SqlitePool,
        user_id: Uuid,
        amount: i64,
    ) -> Result<Self, sqlx::Error> {
        Self::find_or_create(pool, user_id).await?;
        sqlx::query_as::<_, UserStats>(
            r#"UPDATE user_stats
            SET gems = gems + $2, updated_at = $3
            WHERE user_id = $1
            RETURNING user_id, xp, gems, hearts, hearts_max, current_streak, longest_streak,
                      last_activity_date, updated_at"#,
        )
        .bind(user_id)
        .bind(amount)
        .bind(Utc::now())
        .fetch_one(pool)
        .await
    }

    /// Write new streak counters, guarded on `last_activity_date` still holding the value
    /// they were computed from. Returns false when another writer got there first.
    pub async fn update_streak<'e, E>(
        executor: E,
        user_id: Uuid,
        expected_last_activity_date: Option<NaiveDate>,
        current_streak: i64,
        longest_streak: i64,
        last_activity_date: Option<NaiveDate>,
    ) -> Result<bool, sqlx::Error>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let result = sqlx::query(
            r#"UPDATE user_stats
            SET current_streak = $3, longest_streak = $4, last_activity_date = $5, updated_at = $6
            WHERE user_id = $1 AND last_activity_date IS $2"#,
        )
        .bind(user_id)
        .bind(expected_last_activity_date)
        .bind(current_streak)
        .bind(longest_streak)
        .bind(last_activity_date)
        .bind(Utc::now())
        .execute(executor)
        .await?;
        Ok(result.rows_affected() == 1)
    }

    /// Move `last_activity_date` forward to `date`, only if there is a recorded activity
    /// strictly older than it. Returns whether the row changed.
    pub async fn backfill_activity_date<'e, E>(
        executor: E,
        user_id: Uuid,
        date: NaiveDate,
    ) -> Result<bool, sqlx::Error>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let result = sqlx::query(
            r#"UPDATE user_stats
            SET last_activity_date = $2, updated_at = $3
            WHERE user_id = $1 AND last_activity_date IS NOT NULL AND last_activity_date < $2"#,
        )
        .bind(user_id)
        .bind(date)
        .bind(Utc::now())
        .execute(executor)
        .await?;
        Ok(result.rows_affected() == 1)
    }

    /// Deduct `amount` gems only if the balance covers it. Returns whether the spend happened.
    pub async fn spend_gems<'e, E>(
        executor: E,
        user_id: Uuid,
        amount: i64,
    ) -> Result<bool, sqlx::Error>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let result = sqlx::query(
            r#"UPDATE user_stats
            SET gems = gems - $2, updated_at = $3
            WHERE user_id = $1 AND gems >= $2"#,
        )
        .bind(user_id)
        .bind(amount)
        .bind(Utc::now())
        .execute(executor)
        .await?;
        Ok(result.rows_affected() == 1)
    }
}
