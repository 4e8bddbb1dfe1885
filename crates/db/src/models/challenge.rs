use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool};
use ts_rs::TS;
use uuid::Uuid;

use super::path_task::{CreatePathTask, PathTask};

/// A provisioned challenge track. Owns the ordered day tasks that make up a saga path.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, TS)]
pub struct Challenge {
    pub id: Uuid,
    pub title: String,
    pub phase_label: String,
    #[ts(type = "number")]
    pub phase_number: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct CreateChallenge {
    pub title: String,
    pub phase_label: String,
    #[ts(type = "number")]
    pub phase_number: i64,
    pub tasks: Vec<CreatePathTask>,
}

impl Challenge {
    /// Insert the challenge and all of its tasks in one transaction.
    pub async fn create(
        pool: &SqlitePool,
        id: Uuid,
        data: &CreateChallenge,
    ) -> Result<Self, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let challenge = sqlx::query_as::<_, Challenge>(
            r#"INSERT INTO challenges (id, title, phase_label, phase_number, created_at)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, title, phase_label, phase_number, created_at"#,
        )
        .bind(id)
        .bind(&data.title)
        .bind(&data.phase_label)
        .bind(data.phase_number)
        .bind(Utc::now())
        .fetch_one(&mut *tx)
        .await?;

        for task in &data.tasks {
            PathTask::create(&mut *tx, Uuid::new_v4(), challenge.id, task).await?;
        }

        tx.commit().await?;
        Ok(challenge)
    }

    pub async fn find_by_id(pool: &SqlitePool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Challenge>(
            r#"SELECT id, title, phase_label, phase_number, created_at
            FROM challenges
            WHERE id = $1"#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    pub async fn find_all(pool: &SqlitePool) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Challenge>(
            r#"SELECT id, title, phase_label, phase_number, created_at
            FROM challenges
            ORDER BY created_at ASC"#,
        )
        .fetch_all(pool)
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DBService;

    fn task(day_index: i64) -> CreatePathTask {
        CreatePathTask {
            day_index,
            title: format!("Day {day_index}"),
            subtitle: None,
            duration_minutes: 10,
            xp_reward: 50,
            gems_reward: 10,
        }
    }

    #[tokio::test]
    async fn create_inserts_tasks_with_challenge() {
        let db = DBService::in_memory().await.unwrap();
        let data = CreateChallenge {
            title: "21 day reset".to_string(),
            phase_label: "Foundation".to_string(),
            phase_number: 1,
            tasks: vec![task(1), task(2), task(3)],
        };

        let challenge = Challenge::create(&db.pool, Uuid::new_v4(), &data).await.unwrap();
        let tasks = PathTask::find_by_challenge_id(&db.pool, challenge.id).await.unwrap();

        assert_eq!(challenge.phase_label, "Foundation");
        assert_eq!(tasks.iter().map(|t| t.day_index).collect::<Vec<_>>(), vec![1, 2, 3]);
        assert_eq!(Challenge::find_all(&db.pool).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn duplicate_day_rolls_back_whole_challenge() {
        let db = DBService::in_memory().await.unwrap();
        let data = CreateChallenge {
            title: "Broken".to_string(),
            phase_label: "Foundation".to_string(),
            phase_number: 1,
            tasks: vec![task(1), task(1)],
        };

        assert!(Challenge::create(&db.pool, Uuid::new_v4(), &data).await.is_err());
        assert!(Challenge::find_all(&db.pool).await.unwrap().is_empty());
    }
}
