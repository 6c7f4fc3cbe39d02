//! # Progress Evaluator
//!
//! Read-only derivations over a user's activity: consecutive-day streaks and the
//! metric snapshot that achievements are measured against. Nothing here writes.

use std::sync::Arc;

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::achievements::{AchievementTable, GroupedProgress};
use crate::models::ActivityKind;
use crate::traits::ActivityRepo;

/// A per-user counter an achievement can be measured against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    Points,
    BooksAdded,
    BooksFinished,
    TasksCompleted,
    QuotesAdded,
    ReadingStreak,
    ProductivityStreak,
    ClubsJoined,
    ClubsCreated,
}

/// Snapshot of every metric for one user.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserStats {
    pub points: i64,
    pub books_added: i64,
    pub books_finished: i64,
    pub tasks_completed: i64,
    pub quotes_added: i64,
    pub reading_streak: i64,
    pub productivity_streak: i64,
    pub clubs_joined: i64,
    pub clubs_created: i64,
}

impl UserStats {
    pub fn value(&self, metric: Metric) -> i64 {
        match metric {
            Metric::Points => self.points,
            Metric::BooksAdded => self.books_added,
            Metric::BooksFinished => self.books_finished,
            Metric::TasksCompleted => self.tasks_completed,
            Metric::QuotesAdded => self.quotes_added,
            Metric::ReadingStreak => self.reading_streak,
            Metric::ProductivityStreak => self.productivity_streak,
            Metric::ClubsJoined => self.clubs_joined,
            Metric::ClubsCreated => self.clubs_created,
        }
    }
}

/// `[day 00:00, day+1 00:00)` in UTC.
pub fn day_bounds(day: NaiveDate) -> (DateTime<Utc>, DateTime<Utc>) {
    let start = day.and_time(NaiveTime::MIN).and_utc();
    (start, start + Duration::days(1))
}

/// Walks backward from a reference day counting consecutive active days.
#[derive(Clone)]
pub struct StreakScanner {
    activity: Arc<dyn ActivityRepo>,
    /// `None` scans until the first gap, however far back that is.
    max_lookback_days: Option<u32>,
}

impl StreakScanner {
    pub fn new(activity: Arc<dyn ActivityRepo>, max_lookback_days: Option<u32>) -> Self {
        Self {
            activity,
            max_lookback_days,
        }
    }

    /// Consecutive active days ending at `reference`, which must itself be active.
    ///
    /// Storage failures yield `0` instead of an error: streak display degrades
    /// silently rather than failing the request.
    pub async fn compute(&self, user_id: Uuid, kind: ActivityKind, reference: NaiveDate) -> u32 {
        match self.scan(user_id, kind, reference).await {
            Ok(streak) => streak,
            Err(err) => {
                log::warn!("{kind:?} streak for user {user_id} reported as 0 after storage failure: {err:#}");
                0
            }
        }
    }

    pub async fn reading(&self, user_id: Uuid, today: NaiveDate) -> u32 {
        self.compute(user_id, ActivityKind::Reading, today).await
    }

    pub async fn productivity(&self, user_id: Uuid, today: NaiveDate) -> u32 {
        self.compute(user_id, ActivityKind::Productivity, today).await
    }

    async fn scan(&self, user_id: Uuid, kind: ActivityKind, reference: NaiveDate) -> anyhow::Result<u32> {
        let mut streak = 0u32;
        let mut day = reference;

        loop {
            if self.max_lookback_days.is_some_and(|cap| streak >= cap) {
                break;
            }

            let (start, end) = day_bounds(day);
            if self.activity.count_activity(user_id, kind, start, end).await? == 0 {
                break;
            }
            streak += 1;

            day = match day.pred_opt() {
                Some(previous) => previous,
                None => break,
            };
        }

        Ok(streak)
    }
}

/// Measures `stats` against every achievement in `table`.
pub fn evaluate_achievements(table: &AchievementTable, stats: &UserStats) -> GroupedProgress {
    table.evaluate(stats)
}
