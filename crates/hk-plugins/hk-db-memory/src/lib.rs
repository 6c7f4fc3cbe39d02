//! # hk-db-memory
//!
//! Process-local implementation of every storage port. State lives behind one
//! `tokio::sync::RwLock`, so each port call is atomic on its own; nothing spans calls.
//!
//! [`Faults`] switches let tests make individual writes fail, which is how the
//! cached-counter drift hazard of the two-write ledger append is exercised.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use hk_core::models::{
    ActiveTimer, ActivityKind, Book, BookQuote, BookStatus, Club, CompletedTask, LedgerEntry,
    LedgerQuery, PageRequest, QuoteStatus, QuoteSubmission, ReadingSession, Takeaway, User,
};
use hk_core::traits::{
    ActivityRepo, BookRepo, ClubRepo, LedgerRepo, QuoteRepo, TimerRepo, UserRepo,
};
use tokio::sync::RwLock;
use uuid::Uuid;

/// Per-operation failure switches.
#[derive(Debug, Default)]
pub struct Faults {
    pub ledger_insert: AtomicBool,
    pub point_increment: AtomicBool,
    pub activity_reads: AtomicBool,
}

impl Faults {
    fn check(flag: &AtomicBool, operation: &str) -> anyhow::Result<()> {
        if flag.load(Ordering::SeqCst) {
            anyhow::bail!("injected failure: {operation}");
        }
        Ok(())
    }
}

#[derive(Default)]
struct State {
    users: HashMap<Uuid, User>,
    /// Insertion order doubles as the tie-break sequence.
    ledger: Vec<LedgerEntry>,
    books: Vec<Book>,
    sessions: Vec<ReadingSession>,
    active_timers: HashMap<Uuid, ActiveTimer>,
    completed: Vec<CompletedTask>,
    quotes: Vec<QuoteSubmission>,
    clubs: Vec<Club>,
}

#[derive(Default)]
pub struct MemoryStore {
    state: RwLock<State>,
    pub faults: Faults,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_ledger_inserts(&self, fail: bool) {
        self.faults.ledger_insert.store(fail, Ordering::SeqCst);
    }

    pub fn fail_point_increments(&self, fail: bool) {
        self.faults.point_increment.store(fail, Ordering::SeqCst);
    }

    pub fn fail_activity_reads(&self, fail: bool) {
        self.faults.activity_reads.store(fail, Ordering::SeqCst);
    }
}

/// Newest first; later insertions win ties.
fn newest_first<T: Clone>(
    items: impl DoubleEndedIterator<Item = T>,
    at: impl Fn(&T) -> DateTime<Utc>,
) -> Vec<T> {
    let mut out: Vec<T> = items.rev().collect();
    // stable sort keeps reverse insertion order among equal timestamps
    out.sort_by_key(|item| std::cmp::Reverse(at(item)));
    out
}

fn page_of<T>(items: Vec<T>, page: PageRequest) -> (Vec<T>, u64) {
    let total = items.len() as u64;
    let offset = usize::try_from(page.offset()).unwrap_or(usize::MAX);
    let slice = items
        .into_iter()
        .skip(offset)
        .take(page.limit as usize)
        .collect();
    (slice, total)
}

fn ranking(counts: HashMap<Uuid, (u64, DateTime<Utc>)>, limit: u32) -> Vec<(Uuid, u64)> {
    let mut rows: Vec<_> = counts.into_iter().collect();
    rows.sort_by(|(_, (n1, first1)), (_, (n2, first2))| n2.cmp(n1).then(first1.cmp(first2)));
    rows.into_iter()
        .take(limit as usize)
        .map(|(user_id, (n, _))| (user_id, n))
        .collect()
}

#[async_trait]
impl UserRepo for MemoryStore {
    async fn create_user(&self, user: User) -> anyhow::Result<()> {
        let mut state = self.state.write().await;
        if state
            .users
            .values()
            .any(|u| u.email == user.email || u.username == user.username)
        {
            anyhow::bail!("user {} violates a uniqueness constraint", user.id);
        }
        state.users.insert(user.id, user);
        Ok(())
    }

    async fn get_user(&self, id: Uuid) -> anyhow::Result<Option<User>> {
        Ok(self.state.read().await.users.get(&id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<User>> {
        let state = self.state.read().await;
        Ok(state.users.values().find(|u| u.email == email).cloned())
    }

    async fn find_by_username(&self, username: &str) -> anyhow::Result<Option<User>> {
        let state = self.state.read().await;
        Ok(state.users.values().find(|u| u.username == username).cloned())
    }

    async fn update_user(&self, user: User) -> anyhow::Result<()> {
        let mut state = self.state.write().await;
        let Some(stored) = state.users.get_mut(&user.id) else {
            anyhow::bail!("user {} does not exist", user.id);
        };
        let points = stored.points;
        *stored = User { points, ..user };
        Ok(())
    }

    async fn top_by_points(&self, limit: u32) -> anyhow::Result<Vec<User>> {
        let state = self.state.read().await;
        let mut users: Vec<User> = state.users.values().filter(|u| u.is_active).cloned().collect();
        users.sort_by(|a, b| b.points.cmp(&a.points).then(a.created_at.cmp(&b.created_at)));
        users.truncate(limit as usize);
        Ok(users)
    }

    async fn count_users(
        &self,
        active_only: bool,
        since: Option<DateTime<Utc>>,
    ) -> anyhow::Result<u64> {
        let state = self.state.read().await;
        Ok(state
            .users
            .values()
            .filter(|u| (!active_only || u.is_active) && since.is_none_or(|s| u.created_at >= s))
            .count() as u64)
    }

    async fn search_users(
        &self,
        search: Option<String>,
        page: PageRequest,
    ) -> anyhow::Result<(Vec<User>, u64)> {
        let state = self.state.read().await;
        let needle = search.map(|s| s.to_lowercase());
        let matching = state.users.values().filter(|u| {
            needle.as_ref().is_none_or(|n| {
                u.username.to_lowercase().contains(n) || u.email.to_lowercase().contains(n)
            })
        });
        let mut users: Vec<User> = matching.cloned().collect();
        users.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(page_of(users, page))
    }
}

#[async_trait]
impl LedgerRepo for MemoryStore {
    async fn insert_entry(&self, entry: LedgerEntry) -> anyhow::Result<()> {
        Faults::check(&self.faults.ledger_insert, "ledger insert")?;
        if entry.points < 0 {
            anyhow::bail!("ledger entry {} has negative points", entry.id);
        }
        self.state.write().await.ledger.push(entry);
        Ok(())
    }

    async fn increment_points(&self, user_id: Uuid, points: i64) -> anyhow::Result<()> {
        Faults::check(&self.faults.point_increment, "point increment")?;
        let mut state = self.state.write().await;
        let Some(user) = state.users.get_mut(&user_id) else {
            anyhow::bail!("user {user_id} does not exist");
        };
        user.points += points;
        Ok(())
    }

    async fn query_entries(&self, query: LedgerQuery) -> anyhow::Result<(Vec<LedgerEntry>, u64)> {
        let state = self.state.read().await;
        let matching = state.ledger.iter().filter(|e| {
            e.user_id == query.user_id
                && query.source.is_none_or(|s| e.source == s)
                && query.since.is_none_or(|since| e.earned_at >= since)
        });
        let ordered = newest_first(matching.cloned(), |e| e.earned_at);
        Ok(page_of(ordered, query.page))
    }

    async fn sum_points(&self, user_id: Uuid) -> anyhow::Result<i64> {
        let state = self.state.read().await;
        Ok(state
            .ledger
            .iter()
            .filter(|e| e.user_id == user_id)
            .map(|e| e.points)
            .sum())
    }
}

#[async_trait]
impl ActivityRepo for MemoryStore {
    async fn count_activity(
        &self,
        user_id: Uuid,
        kind: ActivityKind,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> anyhow::Result<u64> {
        Faults::check(&self.faults.activity_reads, "activity read")?;
        let state = self.state.read().await;
        let in_range = |at: DateTime<Utc>| at >= start && at < end;
        let n = match kind {
            ActivityKind::Reading => state
                .sessions
                .iter()
                .filter(|s| s.user_id == user_id && in_range(s.date))
                .count(),
            ActivityKind::Productivity => state
                .completed
                .iter()
                .filter(|t| t.user_id == user_id && in_range(t.completed_at))
                .count(),
        };
        Ok(n as u64)
    }
}

#[async_trait]
impl BookRepo for MemoryStore {
    async fn create_book(&self, book: Book) -> anyhow::Result<()> {
        self.state.write().await.books.push(book);
        Ok(())
    }

    async fn get_book(&self, user_id: Uuid, book_id: Uuid) -> anyhow::Result<Option<Book>> {
        let state = self.state.read().await;
        Ok(state
            .books
            .iter()
            .find(|b| b.id == book_id && b.user_id == user_id)
            .cloned())
    }

    async fn list_books(
        &self,
        user_id: Uuid,
        status: Option<BookStatus>,
        page: PageRequest,
    ) -> anyhow::Result<(Vec<Book>, u64)> {
        let state = self.state.read().await;
        let matching = state
            .books
            .iter()
            .filter(|b| b.user_id == user_id && status.is_none_or(|s| b.status == s));
        let ordered = newest_first(matching.cloned(), |b| b.added_at);
        Ok(page_of(ordered, page))
    }

    async fn count_books(&self, user_id: Uuid, status: Option<BookStatus>) -> anyhow::Result<u64> {
        let state = self.state.read().await;
        Ok(state
            .books
            .iter()
            .filter(|b| b.user_id == user_id && status.is_none_or(|s| b.status == s))
            .count() as u64)
    }

    async fn update_book(&self, book: Book) -> anyhow::Result<()> {
        let mut state = self.state.write().await;
        let Some(stored) = state
            .books
            .iter_mut()
            .find(|b| b.id == book.id && b.user_id == book.user_id)
        else {
            anyhow::bail!("book {} does not exist", book.id);
        };
        let quotes = std::mem::take(&mut stored.quotes);
        let takeaways = std::mem::take(&mut stored.takeaways);
        *stored = Book {
            quotes,
            takeaways,
            ..book
        };
        Ok(())
    }

    async fn mark_finished(
        &self,
        user_id: Uuid,
        book_id: Uuid,
        finished_at: DateTime<Utc>,
    ) -> anyhow::Result<bool> {
        let mut state = self.state.write().await;
        let Some(book) = state
            .books
            .iter_mut()
            .find(|b| b.id == book_id && b.user_id == user_id && b.status != BookStatus::Finished)
        else {
            return Ok(false);
        };
        book.status = BookStatus::Finished;
        book.finished_at = Some(finished_at);
        Ok(true)
    }

    async fn add_quote(&self, book_id: Uuid, quote: BookQuote) -> anyhow::Result<()> {
        let mut state = self.state.write().await;
        let Some(book) = state.books.iter_mut().find(|b| b.id == book_id) else {
            anyhow::bail!("book {book_id} does not exist");
        };
        book.quotes.push(quote);
        Ok(())
    }

    async fn add_takeaway(&self, book_id: Uuid, takeaway: Takeaway) -> anyhow::Result<()> {
        let mut state = self.state.write().await;
        let Some(book) = state.books.iter_mut().find(|b| b.id == book_id) else {
            anyhow::bail!("book {book_id} does not exist");
        };
        book.takeaways.push(takeaway);
        Ok(())
    }

    async fn count_quotes(&self, user_id: Uuid) -> anyhow::Result<u64> {
        let state = self.state.read().await;
        Ok(state
            .books
            .iter()
            .filter(|b| b.user_id == user_id)
            .map(|b| b.quotes.len() as u64)
            .sum())
    }

    async fn record_session(&self, session: ReadingSession) -> anyhow::Result<()> {
        self.state.write().await.sessions.push(session);
        Ok(())
    }

    async fn sessions_since(
        &self,
        user_id: Uuid,
        since: DateTime<Utc>,
    ) -> anyhow::Result<Vec<ReadingSession>> {
        let state = self.state.read().await;
        let mut sessions: Vec<ReadingSession> = state
            .sessions
            .iter()
            .filter(|s| s.user_id == user_id && s.date >= since)
            .cloned()
            .collect();
        sessions.sort_by_key(|s| s.date);
        Ok(sessions)
    }

    async fn top_finishers(&self, limit: u32) -> anyhow::Result<Vec<(Uuid, u64)>> {
        let state = self.state.read().await;
        let mut counts: HashMap<Uuid, (u64, DateTime<Utc>)> = HashMap::new();
        for book in state.books.iter().filter(|b| b.status == BookStatus::Finished) {
            let finished = book.finished_at.unwrap_or(book.added_at);
            let slot = counts.entry(book.user_id).or_insert((0, finished));
            slot.0 += 1;
            slot.1 = slot.1.min(finished);
        }
        Ok(ranking(counts, limit))
    }

    async fn count_all_books(&self, since: Option<DateTime<Utc>>) -> anyhow::Result<u64> {
        let state = self.state.read().await;
        Ok(state
            .books
            .iter()
            .filter(|b| since.is_none_or(|s| b.added_at >= s))
            .count() as u64)
    }
}

#[async_trait]
impl TimerRepo for MemoryStore {
    async fn get_active(&self, user_id: Uuid) -> anyhow::Result<Option<ActiveTimer>> {
        Ok(self.state.read().await.active_timers.get(&user_id).cloned())
    }

    async fn insert_active(&self, timer: ActiveTimer) -> anyhow::Result<()> {
        let mut state = self.state.write().await;
        if state.active_timers.contains_key(&timer.user_id) {
            anyhow::bail!("user {} already has an active timer", timer.user_id);
        }
        state.active_timers.insert(timer.user_id, timer);
        Ok(())
    }

    async fn update_active(&self, timer: ActiveTimer) -> anyhow::Result<()> {
        let mut state = self.state.write().await;
        match state.active_timers.get_mut(&timer.user_id) {
            Some(stored) if stored.id == timer.id => {
                *stored = timer;
                Ok(())
            }
            _ => anyhow::bail!("timer {} is no longer active", timer.id),
        }
    }

    async fn delete_active(&self, timer_id: Uuid) -> anyhow::Result<()> {
        self.state
            .write()
            .await
            .active_timers
            .retain(|_, timer| timer.id != timer_id);
        Ok(())
    }

    async fn insert_completed(&self, task: CompletedTask) -> anyhow::Result<()> {
        self.state.write().await.completed.push(task);
        Ok(())
    }

    async fn list_completed(
        &self,
        user_id: Uuid,
        category: Option<String>,
        since: Option<DateTime<Utc>>,
        page: PageRequest,
    ) -> anyhow::Result<(Vec<CompletedTask>, u64)> {
        let state = self.state.read().await;
        let matching = state.completed.iter().filter(|t| {
            t.user_id == user_id
                && category.as_ref().is_none_or(|c| &t.category == c)
                && since.is_none_or(|s| t.completed_at >= s)
        });
        let ordered = newest_first(matching.cloned(), |t| t.completed_at);
        Ok(page_of(ordered, page))
    }

    async fn count_completed(
        &self,
        user_id: Uuid,
        since: Option<DateTime<Utc>>,
    ) -> anyhow::Result<u64> {
        let state = self.state.read().await;
        Ok(state
            .completed
            .iter()
            .filter(|t| t.user_id == user_id && since.is_none_or(|s| t.completed_at >= s))
            .count() as u64)
    }

    async fn completed_since(
        &self,
        user_id: Uuid,
        since: DateTime<Utc>,
    ) -> anyhow::Result<Vec<CompletedTask>> {
        let state = self.state.read().await;
        let mut tasks: Vec<CompletedTask> = state
            .completed
            .iter()
            .filter(|t| t.user_id == user_id && t.completed_at >= since)
            .cloned()
            .collect();
        tasks.sort_by_key(|t| t.completed_at);
        Ok(tasks)
    }

    async fn top_completers(&self, limit: u32) -> anyhow::Result<Vec<(Uuid, u64)>> {
        let state = self.state.read().await;
        let mut counts: HashMap<Uuid, (u64, DateTime<Utc>)> = HashMap::new();
        for task in &state.completed {
            let slot = counts.entry(task.user_id).or_insert((0, task.completed_at));
            slot.0 += 1;
            slot.1 = slot.1.min(task.completed_at);
        }
        Ok(ranking(counts, limit))
    }

    async fn count_all_completed(&self, since: Option<DateTime<Utc>>) -> anyhow::Result<u64> {
        let state = self.state.read().await;
        Ok(state
            .completed
            .iter()
            .filter(|t| since.is_none_or(|s| t.completed_at >= s))
            .count() as u64)
    }
}

#[async_trait]
impl QuoteRepo for MemoryStore {
    async fn insert_submission(&self, submission: QuoteSubmission) -> anyhow::Result<()> {
        self.state.write().await.quotes.push(submission);
        Ok(())
    }

    async fn get_submission(&self, id: Uuid) -> anyhow::Result<Option<QuoteSubmission>> {
        let state = self.state.read().await;
        Ok(state.quotes.iter().find(|q| q.id == id).cloned())
    }

    async fn resolve_submission(&self, submission: QuoteSubmission) -> anyhow::Result<bool> {
        let mut state = self.state.write().await;
        let Some(stored) = state.quotes.iter_mut().find(|q| q.id == submission.id) else {
            anyhow::bail!("quote submission {} does not exist", submission.id);
        };
        if stored.status != QuoteStatus::Pending {
            return Ok(false);
        }
        *stored = submission;
        Ok(true)
    }

    async fn list_for_user(
        &self,
        user_id: Uuid,
        status: Option<QuoteStatus>,
        page: PageRequest,
    ) -> anyhow::Result<(Vec<QuoteSubmission>, u64)> {
        let state = self.state.read().await;
        let matching = state
            .quotes
            .iter()
            .filter(|q| q.user_id == user_id && status.is_none_or(|s| q.status == s));
        let ordered = newest_first(matching.cloned(), |q| q.submitted_at);
        Ok(page_of(ordered, page))
    }

    async fn list_pending(&self) -> anyhow::Result<Vec<QuoteSubmission>> {
        let state = self.state.read().await;
        let mut pending: Vec<QuoteSubmission> = state
            .quotes
            .iter()
            .filter(|q| q.status == QuoteStatus::Pending)
            .cloned()
            .collect();
        pending.sort_by_key(|q| q.submitted_at);
        Ok(pending)
    }

    async fn count_pending(&self) -> anyhow::Result<u64> {
        let state = self.state.read().await;
        Ok(state
            .quotes
            .iter()
            .filter(|q| q.status == QuoteStatus::Pending)
            .count() as u64)
    }

    async fn verified_earnings(&self, user_id: Uuid) -> anyhow::Result<i64> {
        let state = self.state.read().await;
        Ok(state
            .quotes
            .iter()
            .filter(|q| q.user_id == user_id && q.status == QuoteStatus::Verified)
            .map(|q| q.reward_amount)
            .sum())
    }
}

#[async_trait]
impl ClubRepo for MemoryStore {
    async fn create_club(&self, club: Club) -> anyhow::Result<()> {
        self.state.write().await.clubs.push(club);
        Ok(())
    }

    async fn get_club(&self, id: Uuid) -> anyhow::Result<Option<Club>> {
        let state = self.state.read().await;
        Ok(state.clubs.iter().find(|c| c.id == id).cloned())
    }

    async fn add_member(&self, club_id: Uuid, user_id: Uuid) -> anyhow::Result<()> {
        let mut state = self.state.write().await;
        let Some(club) = state.clubs.iter_mut().find(|c| c.id == club_id) else {
            anyhow::bail!("club {club_id} does not exist");
        };
        if club.members.contains(&user_id) {
            anyhow::bail!("user {user_id} is already a member of club {club_id}");
        }
        club.members.push(user_id);
        Ok(())
    }

    async fn clubs_for_member(&self, user_id: Uuid) -> anyhow::Result<Vec<Club>> {
        let state = self.state.read().await;
        let matching = state.clubs.iter().filter(|c| c.members.contains(&user_id));
        Ok(newest_first(matching.cloned(), |c| c.created_at))
    }

    async fn public_clubs_excluding(&self, user_id: Uuid, limit: u32) -> anyhow::Result<Vec<Club>> {
        let state = self.state.read().await;
        let matching = state
            .clubs
            .iter()
            .filter(|c| !c.is_private && !c.members.contains(&user_id));
        let mut clubs = newest_first(matching.cloned(), |c| c.created_at);
        clubs.truncate(limit as usize);
        Ok(clubs)
    }

    async fn count_memberships(&self, user_id: Uuid) -> anyhow::Result<u64> {
        let state = self.state.read().await;
        Ok(state
            .clubs
            .iter()
            .filter(|c| c.members.contains(&user_id))
            .count() as u64)
    }

    async fn count_created(&self, user_id: Uuid) -> anyhow::Result<u64> {
        let state = self.state.read().await;
        Ok(state.clubs.iter().filter(|c| c.creator_id == user_id).count() as u64)
    }
}

#[cfg(test)]
mod tests;
