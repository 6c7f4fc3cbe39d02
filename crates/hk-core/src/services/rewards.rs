//! # Rewards, stats and dashboard
//!
//! Read-only views over the ledger and the per-module counters. Nothing in this
//! module appends to the ledger.

use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, Duration};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::Services;
use crate::achievements::GroupedProgress;
use crate::error::{AppError, Result};
use crate::ledger::LedgerBalance;
use crate::models::{
    ActiveTimer, Book, BookStatus, LedgerEntry, LedgerQuery, PageRequest, Paginated, PointSource,
    MAX_PAGE_LIMIT,
};
use crate::progress::{day_bounds, UserStats};

pub const DEFAULT_HISTORY_DAYS: u32 = 30;
pub const DEFAULT_LEADERBOARD_SIZE: u32 = 10;
const RECENT_REWARDS: u32 = 5;
const RECENT_BOOKS: u32 = 3;

#[derive(Debug, Clone, Serialize)]
pub struct RewardHistory {
    pub rewards: Paginated<LedgerEntry>,
    /// Sum over this page only
    pub total_points: i64,
    pub pages: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct AchievementReport {
    pub achievements: GroupedProgress,
    pub stats: UserStats,
    pub completed_count: usize,
    pub total_count: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LeaderboardCategory {
    #[default]
    Points,
    Reading,
    Productivity,
}

impl fmt::Display for LeaderboardCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            LeaderboardCategory::Points => "points",
            LeaderboardCategory::Reading => "reading",
            LeaderboardCategory::Productivity => "productivity",
        })
    }
}

impl FromStr for LeaderboardCategory {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "points" => Ok(LeaderboardCategory::Points),
            "reading" => Ok(LeaderboardCategory::Reading),
            "productivity" => Ok(LeaderboardCategory::Productivity),
            other => Err(AppError::validation(format!("unknown leaderboard category '{other}'"))),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct LeaderboardEntry {
    pub rank: u32,
    pub user_id: Uuid,
    pub username: String,
    pub display_name: String,
    /// Points, books finished or tasks completed, depending on the board
    pub score: i64,
    pub level: i32,
}

#[derive(Debug, Clone, Serialize)]
pub struct Leaderboard {
    pub category: LeaderboardCategory,
    pub leaderboard: Vec<LeaderboardEntry>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DashboardUser {
    pub username: String,
    pub points: i64,
    pub level: i32,
    pub theme: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ReadingSummary {
    pub total_books: u64,
    pub finished_books: u64,
    pub currently_reading: u64,
    pub to_read: u64,
    pub pages_read_today: i64,
    pub reading_time_today: i64,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ProductivitySummary {
    pub total_tasks: u64,
    pub tasks_today: u64,
    /// Since Monday 00:00 UTC
    pub tasks_this_week: u64,
    pub tasks_this_month: u64,
    pub focus_time_today: i64,
}

#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct Streaks {
    pub reading_streak: u32,
    pub productivity_streak: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct DashboardSummary {
    pub user: DashboardUser,
    pub reading_stats: ReadingSummary,
    pub productivity_stats: ProductivitySummary,
    pub streaks: Streaks,
    pub recent_rewards: Vec<LedgerEntry>,
    pub active_timer: Option<ActiveTimer>,
    pub recent_books: Vec<Book>,
}

impl Services {
    /// Ledger entries newest first. `days == 0` disables the date filter.
    pub async fn reward_history(
        &self,
        user_id: Uuid,
        source: Option<PointSource>,
        days: u32,
        page: PageRequest,
    ) -> Result<RewardHistory> {
        let since = (days > 0).then(|| self.clock.now() - Duration::days(i64::from(days)));
        let rewards = self
            .ledger
            .query(LedgerQuery {
                user_id,
                source,
                since,
                page,
            })
            .await?;
        Ok(RewardHistory {
            total_points: rewards.items.iter().map(|e| e.points).sum(),
            pages: rewards.pages(),
            rewards,
        })
    }

    /// Current value of every achievement metric. Streaks are measured from today (UTC).
    pub async fn user_stats(&self, user_id: Uuid) -> Result<UserStats> {
        let user = self.user(user_id).await?;
        let today = self.today();
        let books = &self.repos.books;
        let clubs = &self.repos.clubs;

        Ok(UserStats {
            points: user.points,
            books_added: count(books.count_books(user_id, None).await?),
            books_finished: count(books.count_books(user_id, Some(BookStatus::Finished)).await?),
            tasks_completed: count(self.repos.timers.count_completed(user_id, None).await?),
            quotes_added: count(books.count_quotes(user_id).await?),
            reading_streak: i64::from(self.streaks.reading(user_id, today).await),
            productivity_streak: i64::from(self.streaks.productivity(user_id, today).await),
            clubs_joined: count(clubs.count_memberships(user_id).await?),
            clubs_created: count(clubs.count_created(user_id).await?),
        })
    }

    pub async fn achievements(&self, user_id: Uuid) -> Result<AchievementReport> {
        let stats = self.user_stats(user_id).await?;
        let achievements = self.achievements.evaluate(&stats);
        let completed_count = achievements
            .values()
            .flatten()
            .filter(|progress| progress.completed)
            .count();
        Ok(AchievementReport {
            achievements,
            stats,
            completed_count,
            total_count: self.achievements.len(),
        })
    }

    pub async fn leaderboard(&self, category: LeaderboardCategory, limit: u32) -> Result<Leaderboard> {
        if limit == 0 || limit > MAX_PAGE_LIMIT {
            return Err(AppError::validation(format!(
                "limit must be between 1 and {MAX_PAGE_LIMIT}"
            )));
        }

        let ranked: Vec<(Uuid, i64)> = match category {
            LeaderboardCategory::Points => {
                let users = self.repos.users.top_by_points(limit).await?;
                let leaderboard = users
                    .into_iter()
                    .zip(1..)
                    .map(|(user, rank)| LeaderboardEntry {
                        rank,
                        user_id: user.id,
                        score: user.points,
                        level: user.level,
                        display_name: user.profile.display_name,
                        username: user.username,
                    })
                    .collect();
                return Ok(Leaderboard {
                    category,
                    leaderboard,
                });
            }
            LeaderboardCategory::Reading => self.repos.books.top_finishers(limit).await?,
            LeaderboardCategory::Productivity => self.repos.timers.top_completers(limit).await?,
        }
        .into_iter()
        .map(|(id, n)| (id, count(n)))
        .collect();

        let mut leaderboard = Vec::with_capacity(ranked.len());
        for (user_id, score) in ranked {
            // Entries for deleted accounts are skipped.
            let Some(user) = self.repos.users.get_user(user_id).await? else {
                continue;
            };
            leaderboard.push(LeaderboardEntry {
                rank: leaderboard.len() as u32 + 1,
                user_id,
                score,
                level: user.level,
                display_name: user.profile.display_name,
                username: user.username,
            });
        }
        Ok(Leaderboard {
            category,
            leaderboard,
        })
    }

    /// Cached counter vs. ledger sum. Reports drift, never repairs it.
    pub async fn ledger_balance(&self, user_id: Uuid) -> Result<LedgerBalance> {
        let user = self.user(user_id).await?;
        let balance = self.ledger.balance(user_id, user.points).await?;
        if balance.drift != 0 {
            log::warn!(
                "user {user_id} cached points {} differ from ledger sum {} by {}",
                balance.cached_points,
                balance.ledger_points,
                balance.drift
            );
        }
        Ok(balance)
    }

    pub async fn dashboard_summary(&self, user_id: Uuid) -> Result<DashboardSummary> {
        let user = self.user(user_id).await?;
        let today = self.today();
        let (today_start, _) = day_bounds(today);
        let week_start = today_start - Duration::days(i64::from(today.weekday().num_days_from_monday()));
        let month_start = today_start - Duration::days(i64::from(today.day0()));

        // 1. Reading
        let books = &self.repos.books;
        let sessions = books.sessions_since(user_id, today_start).await?;
        let reading_stats = ReadingSummary {
            total_books: books.count_books(user_id, None).await?,
            finished_books: books.count_books(user_id, Some(BookStatus::Finished)).await?,
            currently_reading: books.count_books(user_id, Some(BookStatus::Reading)).await?,
            to_read: books.count_books(user_id, Some(BookStatus::ToRead)).await?,
            pages_read_today: sessions.iter().map(|s| i64::from(s.pages_read)).sum(),
            reading_time_today: sessions.iter().map(|s| i64::from(s.duration_minutes)).sum(),
        };

        // 2. Productivity
        let timers = &self.repos.timers;
        let tasks_today = timers.completed_since(user_id, today_start).await?;
        let productivity_stats = ProductivitySummary {
            total_tasks: timers.count_completed(user_id, None).await?,
            tasks_today: tasks_today.len() as u64,
            tasks_this_week: timers.count_completed(user_id, Some(week_start)).await?,
            tasks_this_month: timers.count_completed(user_id, Some(month_start)).await?,
            focus_time_today: tasks_today.iter().map(|t| i64::from(t.actual_duration)).sum(),
        };

        // 3. Streaks, recent activity and the running timer
        let streaks = Streaks {
            reading_streak: self.streaks.reading(user_id, today).await,
            productivity_streak: self.streaks.productivity(user_id, today).await,
        };
        let recent_rewards = self
            .ledger
            .query(LedgerQuery {
                user_id,
                source: None,
                since: None,
                page: PageRequest::new(1, RECENT_REWARDS)?,
            })
            .await?
            .items;
        let (recent_books, _) = books
            .list_books(user_id, None, PageRequest::new(1, RECENT_BOOKS)?)
            .await?;
        let active_timer = timers.get_active(user_id).await?;

        Ok(DashboardSummary {
            user: DashboardUser {
                username: user.username,
                points: user.points,
                level: user.level,
                theme: user.profile.theme,
            },
            reading_stats,
            productivity_stats,
            streaks,
            recent_rewards,
            active_timer,
            recent_books,
        })
    }
}

fn count(n: u64) -> i64 {
    i64::try_from(n).unwrap_or(i64::MAX)
}
