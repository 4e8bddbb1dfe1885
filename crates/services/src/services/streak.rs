//! Streak rules over UTC calendar days.

use chrono::{Days, NaiveDate};
use thiserror::Error;

/// Gem price of a streak freeze. Same for every user and every streak length.
pub const DEFAULT_FREEZE_COST: i64 = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Streak {
    pub current: i64,
    pub longest: i64,
    pub last_activity_date: Option<NaiveDate>,
}

impl Streak {
    /// Apply an activity on `date`. Consecutive days extend the streak, the same (or an
    /// earlier) day is a no-op, a gap or a first activity restarts it at 1.
    pub fn record_activity(self, date: NaiveDate) -> Streak {
        let current = match self.last_activity_date {
            None => 1,
            Some(last) => match (date - last).num_days() {
                ..=0 => self.current,
                1 => self.current + 1,
                _ => 1,
            },
        };
        // Out-of-order dates never move the recorded day backwards.
        let last_activity_date = match self.last_activity_date {
            Some(last) if last > date => Some(last),
            _ => Some(date),
        };
        Streak {
            current,
            longest: self.longest.max(current),
            last_activity_date,
        }
    }
}

pub fn yesterday(today: NaiveDate) -> NaiveDate {
    today.checked_sub_days(Days::new(1)).unwrap_or(NaiveDate::MIN)
}

/// A streak is at risk once a full day has passed since the last activity.
/// Without any recorded activity there is nothing to lose.
pub fn is_at_risk(last_activity_date: Option<NaiveDate>, today: NaiveDate) -> bool {
    last_activity_date.is_some_and(|last| last < yesterday(today))
}

pub fn can_use_freeze(at_risk: bool, gem_balance: i64, cost: i64) -> bool {
    at_risk && gem_balance >= cost
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum FreezeRejection {
    #[error("Streak is not at risk")]
    NotAtRisk,
    #[error("Not enough gems")]
    NotEnoughGems,
}

/// Decide whether a freeze may be bought. Risk is checked before the balance.
pub fn evaluate_freeze(at_risk: bool, gem_balance: i64, cost: i64) -> Result<(), FreezeRejection> {
    if !at_risk {
        return Err(FreezeRejection::NotAtRisk);
    }
    if !can_use_freeze(at_risk, gem_balance, cost) {
        return Err(FreezeRejection::NotEnoughGems);
    }
    Ok(())
}
