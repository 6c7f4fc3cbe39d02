//! # Core Traits (Ports)
//!
//! Any storage or auth plugin must implement these traits to be used by the binary.
//! Ports speak `anyhow::Result`; the services translate failures into `AppError`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::models::{
    ActiveTimer, ActivityKind, Book, BookQuote, BookStatus, Club, CompletedTask, LedgerEntry,
    LedgerQuery, PageRequest, QuoteStatus, QuoteSubmission, ReadingSession, Takeaway, User,
};

/// Account persistence.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait UserRepo: Send + Sync {
    async fn create_user(&self, user: User) -> anyhow::Result<()>;
    async fn get_user(&self, id: Uuid) -> anyhow::Result<Option<User>>;
    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<User>>;
    async fn find_by_username(&self, username: &str) -> anyhow::Result<Option<User>>;
    /// Persists profile, preferences, credentials and login time.
    /// Never writes `points`; that counter is owned by [`LedgerRepo::increment_points`].
    async fn update_user(&self, user: User) -> anyhow::Result<()>;
    /// Active users ordered by cached points, highest first.
    async fn top_by_points(&self, limit: u32) -> anyhow::Result<Vec<User>>;
    /// All accounts, or only active ones, optionally created at or after `since`.
    async fn count_users(
        &self,
        active_only: bool,
        since: Option<DateTime<Utc>>,
    ) -> anyhow::Result<u64>;
    /// Newest accounts first. `search` matches username or email, case-insensitively.
    async fn search_users(
        &self,
        search: Option<String>,
        page: PageRequest,
    ) -> anyhow::Result<(Vec<User>, u64)>;
}

/// Append-only point ledger plus the per-user cached counter.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait LedgerRepo: Send + Sync {
    /// Inserts an immutable entry. Entries are never updated or deleted.
    async fn insert_entry(&self, entry: LedgerEntry) -> anyhow::Result<()>;
    /// Atomically adds `points` to the user's cached total.
    async fn increment_points(&self, user_id: Uuid, points: i64) -> anyhow::Result<()>;
    /// Newest first (`earned_at` desc, later insertions first on ties) with total match count.
    async fn query_entries(&self, query: LedgerQuery) -> anyhow::Result<(Vec<LedgerEntry>, u64)>;
    async fn sum_points(&self, user_id: Uuid) -> anyhow::Result<i64>;
}

/// Point-in-time activity counts backing the streak scan.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait ActivityRepo: Send + Sync {
    /// Qualifying records for `user_id` inside the half-open range `[start, end)`.
    async fn count_activity(
        &self,
        user_id: Uuid,
        kind: ActivityKind,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> anyhow::Result<u64>;
}

/// Personal library ("Nook") persistence.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait BookRepo: Send + Sync {
    async fn create_book(&self, book: Book) -> anyhow::Result<()>;
    /// Only returns the book when it belongs to `user_id`.
    async fn get_book(&self, user_id: Uuid, book_id: Uuid) -> anyhow::Result<Option<Book>>;
    /// Most recently added first.
    async fn list_books(
        &self,
        user_id: Uuid,
        status: Option<BookStatus>,
        page: PageRequest,
    ) -> anyhow::Result<(Vec<Book>, u64)>;
    async fn count_books(&self, user_id: Uuid, status: Option<BookStatus>) -> anyhow::Result<u64>;
    /// Persists scalar fields; quotes and takeaways are appended separately.
    async fn update_book(&self, book: Book) -> anyhow::Result<()>;
    /// Moves the book into `finished` unless it already is.
    /// Returns `false` when another writer got there first.
    async fn mark_finished(
        &self,
        user_id: Uuid,
        book_id: Uuid,
        finished_at: DateTime<Utc>,
    ) -> anyhow::Result<bool>;
    async fn add_quote(&self, book_id: Uuid, quote: BookQuote) -> anyhow::Result<()>;
    async fn add_takeaway(&self, book_id: Uuid, takeaway: Takeaway) -> anyhow::Result<()>;
    /// Personal quotes across all of the user's books.
    async fn count_quotes(&self, user_id: Uuid) -> anyhow::Result<u64>;
    async fn record_session(&self, session: ReadingSession) -> anyhow::Result<()>;
    async fn sessions_since(
        &self,
        user_id: Uuid,
        since: DateTime<Utc>,
    ) -> anyhow::Result<Vec<ReadingSession>>;
    /// `(user_id, finished book count)`, highest first.
    async fn top_finishers(&self, limit: u32) -> anyhow::Result<Vec<(Uuid, u64)>>;
    /// Books across every user, optionally added at or after `since`.
    async fn count_all_books(&self, since: Option<DateTime<Utc>>) -> anyhow::Result<u64>;
}

/// Focus timer ("Hook") persistence.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait TimerRepo: Send + Sync {
    async fn get_active(&self, user_id: Uuid) -> anyhow::Result<Option<ActiveTimer>>;
    async fn insert_active(&self, timer: ActiveTimer) -> anyhow::Result<()>;
    async fn update_active(&self, timer: ActiveTimer) -> anyhow::Result<()>;
    async fn delete_active(&self, timer_id: Uuid) -> anyhow::Result<()>;
    async fn insert_completed(&self, task: CompletedTask) -> anyhow::Result<()>;
    /// Most recently completed first.
    async fn list_completed(
        &self,
        user_id: Uuid,
        category: Option<String>,
        since: Option<DateTime<Utc>>,
        page: PageRequest,
    ) -> anyhow::Result<(Vec<CompletedTask>, u64)>;
    async fn count_completed(
        &self,
        user_id: Uuid,
        since: Option<DateTime<Utc>>,
    ) -> anyhow::Result<u64>;
    async fn completed_since(
        &self,
        user_id: Uuid,
        since: DateTime<Utc>,
    ) -> anyhow::Result<Vec<CompletedTask>>;
    /// `(user_id, completed task count)`, highest first.
    async fn top_completers(&self, limit: u32) -> anyhow::Result<Vec<(Uuid, u64)>>;
    /// Completed tasks across every user, optionally completed at or after `since`.
    async fn count_all_completed(&self, since: Option<DateTime<Utc>>) -> anyhow::Result<u64>;
}

/// Quote verification queue.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait QuoteRepo: Send + Sync {
    async fn insert_submission(&self, submission: QuoteSubmission) -> anyhow::Result<()>;
    async fn get_submission(&self, id: Uuid) -> anyhow::Result<Option<QuoteSubmission>>;
    /// Stores the verdict only while the stored submission is still `pending`.
    /// Returns `false` when it had already been processed.
    async fn resolve_submission(&self, submission: QuoteSubmission) -> anyhow::Result<bool>;
    /// Newest submission first.
    async fn list_for_user(
        &self,
        user_id: Uuid,
        status: Option<QuoteStatus>,
        page: PageRequest,
    ) -> anyhow::Result<(Vec<QuoteSubmission>, u64)>;
    /// Oldest submission first.
    async fn list_pending(&self) -> anyhow::Result<Vec<QuoteSubmission>>;
    async fn count_pending(&self) -> anyhow::Result<u64>;
    /// Sum of `reward_amount` over the user's verified submissions.
    async fn verified_earnings(&self, user_id: Uuid) -> anyhow::Result<i64>;
}

/// Reading clubs and their membership lists.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait ClubRepo: Send + Sync {
    /// Stores the club together with its initial `members`.
    async fn create_club(&self, club: Club) -> anyhow::Result<()>;
    async fn get_club(&self, id: Uuid) -> anyhow::Result<Option<Club>>;
    async fn add_member(&self, club_id: Uuid, user_id: Uuid) -> anyhow::Result<()>;
    async fn clubs_for_member(&self, user_id: Uuid) -> anyhow::Result<Vec<Club>>;
    async fn public_clubs_excluding(&self, user_id: Uuid, limit: u32) -> anyhow::Result<Vec<Club>>;
    async fn count_memberships(&self, user_id: Uuid) -> anyhow::Result<u64>;
    async fn count_created(&self, user_id: Uuid) -> anyhow::Result<u64>;
}

/// Which of the two bearer tokens is being issued or checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Access,
    Refresh,
}

impl TokenKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenKind::Access => "access",
            TokenKind::Refresh => "refresh",
        }
    }
}

/// Credential hashing and token contract.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
pub trait AuthProvider: Send + Sync {
    fn hash_password(&self, password: &str) -> anyhow::Result<String>;

    /// Verifies a password against a stored hash. Malformed hashes never verify.
    fn verify_password(&self, password: &str, hash: &str) -> bool;

    fn issue_token(&self, user_id: Uuid, kind: TokenKind) -> anyhow::Result<String>;

    /// Returns the token's subject when it is valid, unexpired and of `kind`.
    fn verify_token(&self, token: &str, kind: TokenKind) -> anyhow::Result<Uuid>;
}

/// Source of "now" for timestamps and the streak reference day.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
