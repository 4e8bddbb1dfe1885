//! XP, gems and streak bookkeeping on top of `user_stats`.

use async_trait::async_trait;
use chrono::NaiveDate;
use db::models::user_stats::UserStats;
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use thiserror::Error;
use tracing::{debug, info, warn};
use ts_rs::TS;
use uuid::Uuid;

use super::streak::{
    FreezeRejection, Streak, can_use_freeze, evaluate_freeze, is_at_risk, yesterday,
};

const STREAK_UPDATE_ATTEMPTS: usize = 3;

#[derive(Debug, Error)]
pub enum GamificationError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error(transparent)]
    Freeze(#[from] FreezeRejection),
    #[error("streak update kept conflicting with concurrent writers")]
    StreakContention,
}

/// Side effects applied after a day is completed.
#[async_trait]
pub trait Gamification: Send + Sync {
    async fn award_xp(&self, user_id: Uuid, amount: i64) -> Result<(), GamificationError>;

    /// Record activity on `today` (UTC calendar day).
    async fn update_streak(&self, user_id: Uuid, today: NaiveDate)
    -> Result<(), GamificationError>;

    async fn add_gems(&self, user_id: Uuid, amount: i64) -> Result<(), GamificationError>;
}

/// Header display of a user's balances.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct Wallet {
    #[ts(type = "number")]
    pub hearts: i64,
    #[ts(type = "number")]
    pub hearts_max: i64,
    #[ts(type = "number")]
    pub gems: i64,
    #[ts(type = "number")]
    pub streak: i64,
}

impl From<&UserStats> for Wallet {
    fn from(stats: &UserStats) -> Self {
        Self {
            hearts: stats.hearts,
            hearts_max: stats.hearts_max,
            gems: stats.gems,
            streak: stats.current_streak,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct StreakStatus {
    #[ts(type = "number")]
    pub current_streak: i64,
    #[ts(type = "number")]
    pub longest_streak: i64,
    pub last_activity_date: Option<NaiveDate>,
    pub at_risk: bool,
    pub can_use_freeze: bool,
    #[ts(type = "number")]
    pub freeze_cost: i64,
}

#[derive(Clone)]
pub struct GamificationService {
    pool: SqlitePool,
    freeze_cost: i64,
}

impl GamificationService {
    pub fn new(pool: SqlitePool, freeze_cost: i64) -> Self {
        Self { pool, freeze_cost }
    }

    pub async fn wallet(&self, user_id: Uuid) -> Result<Wallet, GamificationError> {
        let stats = UserStats::find_or_create(&self.pool, user_id).await?;
        Ok(Wallet::from(&stats))
    }

    pub async fn streak_status(
        &self,
        user_id: Uuid,
        today: NaiveDate,
    ) -> Result<StreakStatus, GamificationError> {
        let stats = UserStats::find_or_create(&self.pool, user_id).await?;
        Ok(self.status_of(&stats, today))
    }

    /// Spend `freeze_cost` gems to bridge the missed day(s) by recording activity yesterday.
    pub async fn use_freeze(
        &self,
        user_id: Uuid,
        today: NaiveDate,
    ) -> Result<StreakStatus, GamificationError> {
        let stats = UserStats::find_or_create(&self.pool, user_id).await?;
        let at_risk = is_at_risk(stats.last_activity_date, today);
        evaluate_freeze(at_risk, stats.gems, self.freeze_cost)?;

        // Backfill first so the transaction holds the write lock before the gem check.
        let mut tx = self.pool.begin().await?;
        if !UserStats::backfill_activity_date(&mut *tx, user_id, yesterday(today)).await? {
            return Err(FreezeRejection::NotAtRisk.into());
        }
        if !UserStats::spend_gems(&mut *tx, user_id, self.freeze_cost).await? {
            return Err(FreezeRejection::NotEnoughGems.into());
        }
        tx.commit().await?;

        info!(
            user_id = %user_id,
            cost = self.freeze_cost,
            streak = stats.current_streak,
            "Streak freeze used"
        );

        self.streak_status(user_id, today).await
    }

    fn status_of(&self, stats: &UserStats, today: NaiveDate) -> StreakStatus {
        let at_risk = is_at_risk(stats.last_activity_date, today);
        StreakStatus {
            current_streak: stats.current_streak,
            longest_streak: stats.longest_streak,
            last_activity_date: stats.last_activity_date,
            at_risk,
            can_use_freeze: can_use_freeze(at_risk, stats.gems, self.freeze_cost),
            freeze_cost: self.freeze_cost,
        }
    }
}

#[async_trait]
impl Gamification for GamificationService {
    async fn award_xp(&self, user_id: Uuid, amount: i64) -> Result<(), GamificationError> {
        let stats = UserStats::add_xp(&self.pool, user_id, amount).await?;
        debug!(user_id = %user_id, amount, total = stats.xp, "XP awarded");
        Ok(())
    }

    async fn update_streak(
        &self,
        user_id: Uuid,
        today: NaiveDate,
    ) -> Result<(), GamificationError> {
        for attempt in 1..=STREAK_UPDATE_ATTEMPTS {
            let stats = UserStats::find_or_create(&self.pool, user_id).await?;
            let previous = Streak {
                current: stats.current_streak,
                longest: stats.longest_streak,
                last_activity_date: stats.last_activity_date,
            };
            let next = previous.record_activity(today);
            if next == previous {
                return Ok(());
            }

            if UserStats::update_streak(
                &self.pool,
                user_id,
                previous.last_activity_date,
                next.current,
                next.longest,
                next.last_activity_date,
            )
            .await?
            {
                debug!(
                    user_id = %user_id,
                    current = next.current,
                    longest = next.longest,
                    "Streak updated"
                );
                return Ok(());
            }

            warn!(user_id = %user_id, attempt, "Streak changed underneath update, retrying");
        }
        Err(GamificationError::StreakContention)
    }

    async fn add_gems(&self, user_id: Uuid, amount: i64) -> Result<(), GamificationError> {
        let stats = UserStats::add_gems(&self.pool, user_id, amount).await?;
        debug!(user_id = %user_id, amount, total = stats.gems, "Gems added");
        Ok(())
    }
}
