//! Saga path use cases: reading the progress map and completing the current day.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use db::models::{
    challenge::Challenge, path_task::PathTask, user_progress::UserProgress,
};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use thiserror::Error;
use tracing::{info, warn};
use ts_rs::TS;
use uuid::Uuid;

use super::{
    gamification::{Gamification, GamificationError},
    progression::{PathView, RawPathTask, build_nodes},
};

#[derive(Debug, Error)]
pub enum SagaPathError {
    #[error("No path found for user")]
    NoPathFound,
    #[error("No current day to complete")]
    NoCurrentDay,
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error(transparent)]
    Gamification(#[from] GamificationError),
}

/// Everything needed to render a user's path, as read from storage.
#[derive(Debug, Clone)]
pub struct PathSnapshot {
    pub phase_label: String,
    pub phase_number: i64,
    pub current_day_index: i64,
    pub tasks: Vec<RawPathTask>, // ascending by day_index
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct CompletionResult {
    #[ts(type = "number")]
    pub completed_day_index: i64,
    #[ts(type = "number")]
    pub xp_reward: i64,
    #[ts(type = "number")]
    pub gems_reward: i64,
}

/// Storage boundary for path reads and the day pointer.
#[async_trait]
pub trait PathStore: Send + Sync {
    async fn get_path_for_user(&self, user_id: Uuid)
    -> Result<Option<PathSnapshot>, SagaPathError>;

    /// Advance the user's in-progress pointer by one, atomically. `None` when the user has
    /// no challenge in progress.
    async fn complete_current_day(
        &self,
        user_id: Uuid,
    ) -> Result<Option<CompletionResult>, SagaPathError>;
}

#[derive(Clone)]
pub struct SqlitePathStore {
    pool: SqlitePool,
}

impl SqlitePathStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PathStore for SqlitePathStore {
    async fn get_path_for_user(
        &self,
        user_id: Uuid,
    ) -> Result<Option<PathSnapshot>, SagaPathError> {
        let Some(progress) = UserProgress::find_current_by_user_id(&self.pool, user_id).await?
        else {
            return Ok(None);
        };
        let Some(challenge) = Challenge::find_by_id(&self.pool, progress.challenge_id).await?
        else {
            return Ok(None);
        };
        let tasks = PathTask::find_by_challenge_id(&self.pool, challenge.id).await?;

        Ok(Some(PathSnapshot {
            phase_label: challenge.phase_label,
            phase_number: challenge.phase_number,
            current_day_index: progress.current_day_index,
            tasks: tasks.into_iter().map(RawPathTask::from).collect(),
        }))
    }

    async fn complete_current_day(
        &self,
        user_id: Uuid,
    ) -> Result<Option<CompletionResult>, SagaPathError> {
        let mut tx = self.pool.begin().await?;

        // The increment runs first so the write lock is held before the pointer is read.
        let Some(progress) = UserProgress::advance_in_progress(&mut *tx, user_id).await? else {
            return Ok(None);
        };
        let completed_day_index = progress.current_day_index - 1;
        let task = PathTask::find_by_day(&mut *tx, progress.challenge_id, completed_day_index).await?;
        let total_days = PathTask::count_by_challenge_id(&mut *tx, progress.challenge_id).await?;

        let finished = progress.current_day_index > total_days;
        if finished {
            UserProgress::mark_completed(&mut *tx, progress.id, Utc::now()).await?;
        }
        tx.commit().await?;

        if finished {
            info!(
                user_id = %user_id,
                challenge_id = %progress.challenge_id,
                "Challenge completed"
            );
        }

        let (xp_reward, gems_reward) = match task {
            Some(task) => (task.xp_reward, task.gems_reward),
            None => {
                warn!(
                    user_id = %user_id,
                    challenge_id = %progress.challenge_id,
                    day_index = completed_day_index,
                    "No task for completed day, awarding nothing"
                );
                (0, 0)
            }
        };

        Ok(Some(CompletionResult {
            completed_day_index,
            xp_reward,
            gems_reward,
        }))
    }
}

#[derive(Clone)]
pub struct SagaPathService {
    store: Arc<dyn PathStore>,
    gamification: Arc<dyn Gamification>,
}

impl SagaPathService {
    pub fn new(store: Arc<dyn PathStore>, gamification: Arc<dyn Gamification>) -> Self {
        Self {
            store,
            gamification,
        }
    }

    pub async fn get_path(&self, user_id: Uuid) -> Result<PathView, SagaPathError> {
        let snapshot = self
            .store
            .get_path_for_user(user_id)
            .await?
            .ok_or(SagaPathError::NoPathFound)?;

        Ok(PathView {
            nodes: build_nodes(&snapshot.tasks, snapshot.current_day_index),
            phase_label: snapshot.phase_label,
            phase_number: snapshot.phase_number,
            current_day_index: snapshot.current_day_index,
        })
    }

    pub async fn complete_day(&self, user_id: Uuid) -> Result<CompletionResult, SagaPathError> {
        self.complete_day_on(user_id, Utc::now().date_naive()).await
    }

    /// Complete the current day and then apply XP, streak and gems, in that order. The three
    /// effects always run, zero rewards included, and none run if nothing was completed.
    pub async fn complete_day_on(
        &self,
        user_id: Uuid,
        today: NaiveDate,
    ) -> Result<CompletionResult, SagaPathError> {
        let result = self
            .store
            .complete_current_day(user_id)
            .await?
            .ok_or(SagaPathError::NoCurrentDay)?;

        self.gamification
            .award_xp(user_id, result.xp_reward)
            .await?;
        self.gamification.update_streak(user_id, today).await?;
        self.gamification
            .add_gems(user_id, result.gems_reward)
            .await?;

        info!(
            user_id = %user_id,
            day_index = result.completed_day_index,
            xp = result.xp_reward,
            gems = result.gems_reward,
            "Day completed"
        );

        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use db::{
        DBService,
        models::{
            challenge::CreateChallenge,
            path_task::CreatePathTask,
            user_progress::ProgressStatus,
            user_stats::UserStats,
        },
    };

    use super::*;
    use crate::services::{
        gamification::GamificationService,
        progression::{NodeSide, NodeStatus},
        streak::DEFAULT_FREEZE_COST,
    };

    #[derive(Debug, Clone, PartialEq, Eq)]
    enum Effect {
        AwardXp(i64),
        UpdateStreak(NaiveDate),
        AddGems(i64),
    }

    #[derive(Default)]
    struct RecordingGamification {
        effects: Mutex<Vec<Effect>>,
    }

    impl RecordingGamification {
        fn effects(&self) -> Vec<Effect> {
            self.effects.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Gamification for RecordingGamification {
        async fn award_xp(&self, _user_id: Uuid, amount: i64) -> Result<(), GamificationError> {
            self.effects.lock().unwrap().push(Effect::AwardXp(amount));
            Ok(())
        }

        async fn update_streak(
            &self,
            _user_id: Uuid,
            today: NaiveDate,
        ) -> Result<(), GamificationError> {
            self.effects.lock().unwrap().push(Effect::UpdateStreak(today));
            Ok(())
        }

        async fn add_gems(&self, _user_id: Uuid, amount: i64) -> Result<(), GamificationError> {
            self.effects.lock().unwrap().push(Effect::AddGems(amount));
            Ok(())
        }
    }

    struct FixedStore {
        completion: Option<CompletionResult>,
    }

    #[async_trait]
    impl PathStore for FixedStore {
        async fn get_path_for_user(
            &self,
            _user_id: Uuid,
        ) -> Result<Option<PathSnapshot>, SagaPathError> {
            Ok(None)
        }

        async fn complete_current_day(
            &self,
            _user_id: Uuid,
        ) -> Result<Option<CompletionResult>, SagaPathError> {
            Ok(self.completion.clone())
        }
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 7, 4).unwrap()
    }

    fn task(day_index: i64, xp_reward: i64, gems_reward: i64) -> CreatePathTask {
        CreatePathTask {
            day_index,
            title: format!("Day {day_index}"),
            subtitle: Some("Full body".to_string()),
            duration_minutes: 20,
            xp_reward,
            gems_reward,
        }
    }

    struct Fixture {
        db: DBService,
        service: SagaPathService,
        user_id: Uuid,
        progress_id: Uuid,
    }

    /// Provision a challenge, enrol a user and move the pointer to `current_day_index`.
    async fn fixture(tasks: Vec<CreatePathTask>, current_day_index: i64) -> Fixture {
        fixture_on(DBService::in_memory().await.unwrap(), tasks, current_day_index).await
    }

    async fn fixture_on(
        db: DBService,
        tasks: Vec<CreatePathTask>,
        current_day_index: i64,
    ) -> Fixture {
        let challenge = Challenge::create(
            &db.pool,
            Uuid::new_v4(),
            &CreateChallenge {
                title: "Strength".to_string(),
                phase_label: "Phase 1".to_string(),
                phase_number: 1,
                tasks,
            },
        )
        .await
        .unwrap();
        let user_id = Uuid::new_v4();
        let progress = UserProgress::create(&db.pool, Uuid::new_v4(), user_id, challenge.id)
            .await
            .unwrap();
        for _ in 1..current_day_index {
            UserProgress::advance_in_progress(&db.pool, user_id)
                .await
                .unwrap();
        }

        let service = SagaPathService::new(
            Arc::new(SqlitePathStore::new(db.pool.clone())),
            Arc::new(GamificationService::new(db.pool.clone(), DEFAULT_FREEZE_COST)),
        );
        Fixture {
            db,
            service,
            user_id,
            progress_id: progress.id,
        }
    }

    #[tokio::test]
    async fn nothing_to_complete_applies_no_effects() {
        let gamification = Arc::new(RecordingGamification::default());
        let service = SagaPathService::new(
            Arc::new(FixedStore { completion: None }),
            gamification.clone(),
        );

        let err = service
            .complete_day_on(Uuid::new_v4(), today())
            .await
            .unwrap_err();

        assert!(matches!(err, SagaPathError::NoCurrentDay));
        assert_eq!(err.to_string(), "No current day to complete");
        assert!(gamification.effects().is_empty());
    }

    #[tokio::test]
    async fn effects_run_in_order_even_for_zero_rewards() {
        let gamification = Arc::new(RecordingGamification::default());
        let completion = CompletionResult {
            completed_day_index: 4,
            xp_reward: 0,
            gems_reward: 0,
        };
        let service = SagaPathService::new(
            Arc::new(FixedStore {
                completion: Some(completion.clone()),
            }),
            gamification.clone(),
        );

        let result = service.complete_day_on(Uuid::new_v4(), today()).await.unwrap();

        assert_eq!(result, completion);
        assert_eq!(
            gamification.effects(),
            vec![
                Effect::AwardXp(0),
                Effect::UpdateStreak(today()),
                Effect::AddGems(0),
            ]
        );
    }

    #[tokio::test]
    async fn missing_path_is_reported() {
        let service = SagaPathService::new(
            Arc::new(FixedStore { completion: None }),
            Arc::new(RecordingGamification::default()),
        );

        let err = service.get_path(Uuid::new_v4()).await.unwrap_err();

        assert!(matches!(err, SagaPathError::NoPathFound));
    }

    #[tokio::test]
    async fn user_without_progress_has_no_path() {
        let f = fixture(vec![task(1, 50, 10)], 1).await;

        let err = f.service.get_path(Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, SagaPathError::NoPathFound));

        let err = f.service.complete_day_on(Uuid::new_v4(), today()).await.unwrap_err();
        assert!(matches!(err, SagaPathError::NoCurrentDay));
    }

    #[tokio::test]
    async fn missing_day_task_degrades_to_zero_rewards() {
        let f = fixture(vec![task(1, 50, 10), task(3, 100, 25), task(4, 100, 25)], 2).await;

        let result = f.service.complete_day_on(f.user_id, today()).await.unwrap();

        assert_eq!(
            result,
            CompletionResult {
                completed_day_index: 2,
                xp_reward: 0,
                gems_reward: 0,
            }
        );
        let progress = UserProgress::find_by_id(&f.db.pool, f.progress_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(progress.current_day_index, 3);
        assert_eq!(progress.status, ProgressStatus::InProgress);

        let stats = UserStats::find_or_create(&f.db.pool, f.user_id).await.unwrap();
        assert_eq!(stats.xp, 0);
        assert_eq!(stats.current_streak, 1);
    }

    #[tokio::test]
    async fn completing_last_day_finishes_challenge() {
        let f = fixture(vec![task(1, 50, 10), task(2, 60, 10), task(3, 100, 25)], 3).await;

        let result = f.service.complete_day_on(f.user_id, today()).await.unwrap();
        assert_eq!(result.completed_day_index, 3);

        let progress = UserProgress::find_by_id(&f.db.pool, f.progress_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(progress.current_day_index, 4);
        assert_eq!(progress.status, ProgressStatus::Completed);
        assert!(progress.completed_at.is_some());

        // Finished challenges still render, fully completed, but cannot advance further.
        let view = f.service.get_path(f.user_id).await.unwrap();
        assert!(view.nodes.iter().all(|n| n.status == NodeStatus::Completed));
        let err = f.service.complete_day_on(f.user_id, today()).await.unwrap_err();
        assert!(matches!(err, SagaPathError::NoCurrentDay));
    }

    #[tokio::test]
    async fn mid_challenge_completion_end_to_end() {
        let f = fixture(vec![task(1, 50, 10), task(2, 60, 10), task(3, 100, 25)], 2).await;

        let view = f.service.get_path(f.user_id).await.unwrap();
        assert_eq!(view.phase_label, "Phase 1");
        assert_eq!(view.current_day_index, 2);
        assert_eq!(
            view.nodes.iter().map(|n| n.status).collect::<Vec<_>>(),
            vec![NodeStatus::Completed, NodeStatus::Active, NodeStatus::Locked]
        );
        assert_eq!(
            view.nodes.iter().map(|n| n.side).collect::<Vec<_>>(),
            vec![NodeSide::Left, NodeSide::Right, NodeSide::Left]
        );

        let result = f.service.complete_day_on(f.user_id, today()).await.unwrap();
        assert_eq!(
            result,
            CompletionResult {
                completed_day_index: 2,
                xp_reward: 60,
                gems_reward: 10,
            }
        );

        let view = f.service.get_path(f.user_id).await.unwrap();
        assert_eq!(view.current_day_index, 3);

        let stats = UserStats::find_or_create(&f.db.pool, f.user_id).await.unwrap();
        assert_eq!(stats.xp, 60);
        assert_eq!(stats.gems, 10);
        assert_eq!(stats.current_streak, 1);
        assert_eq!(stats.last_activity_date, Some(today()));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_completions_advance_one_day_each() {
        const DAYS: i64 = 20;

        // A file database so the pool hands out separate connections that really race.
        let dir = tempfile::tempdir().unwrap();
        let url = format!("sqlite://{}", dir.path().join("saga.db").display());
        let db = DBService::new(&url).await.unwrap();
        let f = fixture_on(db, (1..=DAYS).map(|day| task(day, 1, 1)).collect(), 1).await;

        let handles: Vec<_> = (0..DAYS)
            .map(|_| {
                let service = f.service.clone();
                let user_id = f.user_id;
                tokio::spawn(async move { service.complete_day_on(user_id, today()).await })
            })
            .collect();

        let mut days = Vec::new();
        for handle in handles {
            days.push(handle.await.unwrap().unwrap().completed_day_index);
        }
        days.sort();
        assert_eq!(days, (1..=DAYS).collect::<Vec<_>>());

        let progress = UserProgress::find_by_id(&f.db.pool, f.progress_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(progress.current_day_index, DAYS + 1);
        assert_eq!(progress.status, ProgressStatus::Completed);

        let stats = UserStats::find_or_create(&f.db.pool, f.user_id).await.unwrap();
        assert_eq!(stats.xp, DAYS);
        assert_eq!(stats.gems, DAYS);
        assert_eq!(stats.current_streak, 1);

        let err = f.service.complete_day_on(f.user_id, today()).await.unwrap_err();
        assert!(matches!(err, SagaPathError::NoCurrentDay));
    }
}
