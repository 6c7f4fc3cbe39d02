//! # Services
//!
//! Orchestration for every user-facing action. Each service takes the acting
//! user's id explicitly and never assumes an authenticated context; guards live at
//! the request-dispatch boundary. Every point award goes through [`Ledger::append`].

pub mod accounts;
pub mod admin;
pub mod clubs;
pub mod hook;
pub mod nook;
pub mod quotes;
pub mod rewards;

use std::sync::Arc;

use chrono::NaiveDate;
use serde::Serialize;
use uuid::Uuid;

use crate::achievements::AchievementTable;
use crate::error::{AppError, Result};
use crate::ledger::Ledger;
use crate::models::User;
use crate::progress::StreakScanner;
use crate::traits::{
    ActivityRepo, AuthProvider, BookRepo, ClubRepo, Clock, LedgerRepo, QuoteRepo, SystemClock,
    TimerRepo, UserRepo,
};

/// The storage ports, usually all backed by one plugin.
#[derive(Clone)]
pub struct Repos {
    pub users: Arc<dyn UserRepo>,
    pub ledger: Arc<dyn LedgerRepo>,
    pub activity: Arc<dyn ActivityRepo>,
    pub books: Arc<dyn BookRepo>,
    pub timers: Arc<dyn TimerRepo>,
    pub quotes: Arc<dyn QuoteRepo>,
    pub clubs: Arc<dyn ClubRepo>,
}

impl Repos {
    /// Uses a single store for every port.
    pub fn from_store<S>(store: Arc<S>) -> Self
    where
        S: UserRepo
            + LedgerRepo
            + ActivityRepo
            + BookRepo
            + TimerRepo
            + QuoteRepo
            + ClubRepo
            + 'static,
    {
        Self {
            users: store.clone(),
            ledger: store.clone(),
            activity: store.clone(),
            books: store.clone(),
            timers: store.clone(),
            quotes: store.clone(),
            clubs: store,
        }
    }
}

/// Tunables that are not ports.
#[derive(Debug, Clone)]
pub struct ServiceOptions {
    pub max_streak_lookback_days: Option<u32>,
    pub achievements: AchievementTable,
}

impl Default for ServiceOptions {
    fn default() -> Self {
        Self {
            max_streak_lookback_days: None,
            achievements: AchievementTable::standard(),
        }
    }
}

#[derive(Clone)]
pub struct Services {
    repos: Repos,
    auth: Arc<dyn AuthProvider>,
    clock: Arc<dyn Clock>,
    ledger: Ledger,
    streaks: StreakScanner,
    achievements: Arc<AchievementTable>,
}

impl Services {
    pub fn new(repos: Repos, auth: Arc<dyn AuthProvider>) -> Self {
        Self::with_options(repos, auth, Arc::new(SystemClock), ServiceOptions::default())
    }

    pub fn with_options(
        repos: Repos,
        auth: Arc<dyn AuthProvider>,
        clock: Arc<dyn Clock>,
        options: ServiceOptions,
    ) -> Self {
        let ledger = Ledger::new(repos.ledger.clone(), clock.clone());
        let streaks = StreakScanner::new(repos.activity.clone(), options.max_streak_lookback_days);
        Self {
            repos,
            auth,
            clock,
            ledger,
            streaks,
            achievements: Arc::new(options.achievements),
        }
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    pub fn streaks(&self) -> &StreakScanner {
        &self.streaks
    }

    pub fn auth(&self) -> &dyn AuthProvider {
        self.auth.as_ref()
    }

    /// Current UTC calendar day; the streak reference day.
    pub fn today(&self) -> NaiveDate {
        self.clock.now().date_naive()
    }

    /// Loads a user or fails with `NotFound`.
    pub async fn user(&self, user_id: Uuid) -> Result<User> {
        self.repos
            .users
            .get_user(user_id)
            .await?
            .ok_or_else(|| AppError::not_found("User", user_id))
    }

    /// Loads a user and requires the admin flag.
    pub async fn require_admin(&self, user_id: Uuid) -> Result<User> {
        let user = self.user(user_id).await?;
        if !user.is_admin {
            return Err(AppError::Forbidden("admin privileges required".into()));
        }
        Ok(user)
    }
}

/// The result of an action together with the points it earned.
#[derive(Debug, Clone, Serialize)]
pub struct Awarded<T> {
    #[serde(flatten)]
    pub value: T,
    pub points_earned: i64,
}

impl<T> Awarded<T> {
    pub fn new(value: T, points_earned: i64) -> Self {
        Self { value, points_earned }
    }
}

/// Trims and rejects empty strings.
pub(crate) fn required(value: &str, field: &str) -> Result<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(AppError::validation(format!("{field} is required")));
    }
    Ok(trimmed.to_string())
}
