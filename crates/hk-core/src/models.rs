//! # Domain Models
//!
//! These structs represent the core entities of the Hooks backend.
//! We use UUID v7 for time-ordered, globally unique identification.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppError;

pub const MAX_PAGE_LIMIT: u32 = 100;

/// Subsystem that generated a ledger entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PointSource {
    Nook,
    Hook,
    Club,
    Quiz,
    Quotes,
    System,
}

impl PointSource {
    pub const ALL: [PointSource; 6] = [
        PointSource::Nook,
        PointSource::Hook,
        PointSource::Club,
        PointSource::Quiz,
        PointSource::Quotes,
        PointSource::System,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PointSource::Nook => "nook",
            PointSource::Hook => "hook",
            PointSource::Club => "club",
            PointSource::Quiz => "quiz",
            PointSource::Quotes => "quotes",
            PointSource::System => "system",
        }
    }
}

impl fmt::Display for PointSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PointSource {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PointSource::ALL
            .into_iter()
            .find(|source| source.as_str() == s)
            .ok_or_else(|| AppError::UnknownSource(s.to_string()))
    }
}

/// One immutable point-earning event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub id: Uuid,
    pub user_id: Uuid,
    pub points: i64,
    pub source: PointSource,
    /// Display text only; never used in computation
    pub description: String,
    pub earned_at: DateTime<Utc>,
    /// Display-only attachment (e.g. which book or task produced the entry)
    pub metadata: serde_json::Value,
}

/// Caller-supplied half of a ledger entry; `id` and `earned_at` are assigned on append.
#[derive(Debug, Clone)]
pub struct NewLedgerEntry {
    pub user_id: Uuid,
    pub points: i64,
    pub source: PointSource,
    pub description: String,
    pub metadata: serde_json::Value,
}

impl NewLedgerEntry {
    pub fn new(user_id: Uuid, points: i64, source: PointSource, description: impl Into<String>) -> Self {
        Self {
            user_id,
            points,
            source,
            description: description.into(),
            metadata: serde_json::json!({}),
        }
    }

    pub fn with_metadata(mut self, metadata: serde_json::Value) -> Self {
        self.metadata = metadata;
        self
    }
}

/// Offset-based pagination. Page 1 starts at offset 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    pub page: u32,
    pub limit: u32,
}

impl PageRequest {
    pub fn new(page: u32, limit: u32) -> Result<Self, AppError> {
        if page == 0 {
            return Err(AppError::validation("page must be at least 1"));
        }
        if limit == 0 || limit > MAX_PAGE_LIMIT {
            return Err(AppError::validation(format!(
                "limit must be between 1 and {MAX_PAGE_LIMIT}"
            )));
        }
        Ok(Self { page, limit })
    }

    pub fn offset(&self) -> u64 {
        (u64::from(self.page) - 1) * u64::from(self.limit)
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self { page: 1, limit: 20 }
    }
}

/// A page of results plus the total number of matches.
#[derive(Debug, Clone, Serialize)]
pub struct Paginated<T> {
    pub items: Vec<T>,
    pub page: u32,
    pub limit: u32,
    pub total: u64,
}

impl<T> Paginated<T> {
    pub fn new(items: Vec<T>, request: PageRequest, total: u64) -> Self {
        Self {
            items,
            page: request.page,
            limit: request.limit,
            total,
        }
    }

    pub fn pages(&self) -> u64 {
        self.total.div_ceil(u64::from(self.limit.max(1)))
    }
}

/// Filters for `QueryLedger`.
#[derive(Debug, Clone)]
pub struct LedgerQuery {
    pub user_id: Uuid,
    pub source: Option<PointSource>,
    /// Inclusive lower bound on `earned_at`
    pub since: Option<DateTime<Utc>>,
    pub page: PageRequest,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub theme: String,
    pub avatar_style: String,
    pub display_name: String,
    pub bio: String,
    pub timezone: String,
}

impl Profile {
    pub fn for_username(username: &str) -> Self {
        Self {
            theme: "light".into(),
            avatar_style: "initials".into(),
            display_name: username.to_string(),
            bio: String::new(),
            timezone: "UTC".into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Preferences {
    pub notifications: bool,
    pub timer_sound: bool,
    pub default_timer_duration: i32,
    pub animations: bool,
    pub compact_mode: bool,
    pub dashboard_layout: String,
    pub timer_presets: Vec<CustomPreset>,
}

/// A timer preset saved by the user next to the built-in ones.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomPreset {
    pub name: String,
    pub duration: i32,
    #[serde(rename = "type")]
    pub timer_type: TimerType,
    pub category: String,
    pub color: String,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            notifications: true,
            timer_sound: true,
            default_timer_duration: 25,
            animations: true,
            compact_mode: false,
            dashboard_layout: "default".into(),
            timer_presets: Vec::new(),
        }
    }
}

/// An account. `points` is the cached counter kept next to the ledger.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub is_admin: bool,
    pub is_active: bool,
    pub points: i64,
    pub level: i32,
    pub profile: Profile,
    pub preferences: Preferences,
    pub created_at: DateTime<Utc>,
    pub last_login: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookStatus {
    ToRead,
    Reading,
    Finished,
}

impl BookStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookStatus::ToRead => "to_read",
            BookStatus::Reading => "reading",
            BookStatus::Finished => "finished",
        }
    }
}

impl FromStr for BookStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "to_read" => Ok(BookStatus::ToRead),
            "reading" => Ok(BookStatus::Reading),
            "finished" => Ok(BookStatus::Finished),
            other => Err(AppError::validation(format!("unknown book status '{other}'"))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookQuote {
    pub text: String,
    pub page: String,
    pub context: String,
    pub added_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Takeaway {
    pub takeaway: String,
    pub page_reference: String,
    pub added_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Book {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub authors: Vec<String>,
    pub description: String,
    pub page_count: i32,
    pub current_page: i32,
    pub status: BookStatus,
    pub rating: i32,
    pub cover_image: String,
    pub genre: String,
    pub isbn: String,
    pub added_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub quotes: Vec<BookQuote>,
    pub takeaways: Vec<Takeaway>,
}

impl Book {
    pub fn progress_percentage(&self) -> f64 {
        f64::from(self.current_page) / f64::from(self.page_count.max(1)) * 100.0
    }
}

/// One progress log against a book. Its `date` drives the reading streak.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReadingSession {
    pub id: Uuid,
    pub user_id: Uuid,
    pub book_id: Uuid,
    pub pages_read: i32,
    pub current_page: i32,
    pub duration_minutes: i32,
    pub notes: String,
    pub date: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimerStatus {
    Active,
    Paused,
}

impl TimerStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TimerStatus::Active => "active",
            TimerStatus::Paused => "paused",
        }
    }
}

impl FromStr for TimerStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(TimerStatus::Active),
            "paused" => Ok(TimerStatus::Paused),
            other => Err(AppError::validation(format!("unknown timer status '{other}'"))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimerType {
    Work,
    Break,
}

impl TimerType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TimerType::Work => "work",
            TimerType::Break => "break",
        }
    }
}

impl FromStr for TimerType {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "work" => Ok(TimerType::Work),
            "break" => Ok(TimerType::Break),
            other => Err(AppError::validation(format!("unknown timer type '{other}'"))),
        }
    }
}

/// The single running focus timer a user may have.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActiveTimer {
    pub id: Uuid,
    pub user_id: Uuid,
    pub task_name: String,
    /// Planned length in minutes
    pub duration: i32,
    pub category: String,
    pub timer_type: TimerType,
    pub status: TimerStatus,
    pub started_at: DateTime<Utc>,
    pub paused_at: Option<DateTime<Utc>>,
    pub total_paused_secs: f64,
}

/// A finished focus session. Its `completed_at` drives the productivity streak.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletedTask {
    pub id: Uuid,
    pub user_id: Uuid,
    pub task_name: String,
    pub planned_duration: i32,
    pub actual_duration: i32,
    pub category: String,
    pub timer_type: TimerType,
    pub mood_rating: Option<i32>,
    pub notes: String,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuoteStatus {
    Pending,
    Verified,
    Rejected,
}

impl QuoteStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            QuoteStatus::Pending => "pending",
            QuoteStatus::Verified => "verified",
            QuoteStatus::Rejected => "rejected",
        }
    }
}

impl FromStr for QuoteStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(QuoteStatus::Pending),
            "verified" => Ok(QuoteStatus::Verified),
            "rejected" => Ok(QuoteStatus::Rejected),
            other => Err(AppError::validation(format!("unknown quote status '{other}'"))),
        }
    }
}

/// A quote sent in for moderator verification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuoteSubmission {
    pub id: Uuid,
    pub user_id: Uuid,
    pub book_id: Uuid,
    pub text: String,
    pub page: String,
    pub context: String,
    pub status: QuoteStatus,
    pub reward_amount: i64,
    pub submitted_at: DateTime<Utc>,
    pub verified_at: Option<DateTime<Utc>>,
    pub verified_by: Option<Uuid>,
    pub verification_reason: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Club {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub topic: String,
    pub creator_id: Uuid,
    pub members: Vec<Uuid>,
    pub is_private: bool,
    pub created_at: DateTime<Utc>,
    pub current_book: Option<String>,
}

impl Club {
    pub fn member_count(&self) -> usize {
        self.members.len()
    }
}

/// Which record type counts toward a streak.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivityKind {
    /// A reading session logged that day
    Reading,
    /// A focus session completed that day
    Productivity,
}
