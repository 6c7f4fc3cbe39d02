//! # Quote verification
//!
//! Users submit quotes from their own books; a moderator approves or rejects
//! each one exactly once. Only approval earns the stored reward.
//!
//! The verdict is stored with a compare-and-set on `pending`, so concurrent
//! moderators cannot both pay the same submission. The reward is appended after
//! the verdict is stored. If that append fails the submission stays `verified`
//! without a `quotes` entry, and a retry answers `Conflict`; this is the same
//! two-write gap the ledger has between its entry and the cached counter.

use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use super::{Awarded, Services};
use crate::error::{AppError, Result};
use crate::models::{
    NewLedgerEntry, PageRequest, Paginated, PointSource, QuoteStatus, QuoteSubmission,
};
use crate::policy::DEFAULT_QUOTE_REWARD;

pub const MIN_QUOTE_CHARS: usize = 10;
pub const MAX_QUOTE_CHARS: usize = 1000;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct QuoteDraft {
    pub book_id: Option<Uuid>,
    pub text: String,
    pub page: String,
    pub context: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VerifyAction {
    Approve,
    Reject,
}

#[derive(Debug, Clone, Serialize)]
pub struct MySubmissions {
    pub submissions: Paginated<QuoteSubmission>,
    pub total_earnings: i64,
}

/// A queued submission with enough context for a moderator to judge it.
#[derive(Debug, Clone, Serialize)]
pub struct PendingQuote {
    #[serde(flatten)]
    pub submission: QuoteSubmission,
    pub username: Option<String>,
    pub book_title: Option<String>,
    pub book_authors: Vec<String>,
}

impl Services {
    pub async fn submit_quote(&self, user_id: Uuid, draft: QuoteDraft) -> Result<QuoteSubmission> {
        let text = draft.text.trim();
        let Some(book_id) = draft.book_id else {
            return Err(AppError::validation("book_id and quote text are required"));
        };
        if text.is_empty() {
            return Err(AppError::validation("book_id and quote text are required"));
        }
        let chars = text.chars().count();
        if !(MIN_QUOTE_CHARS..=MAX_QUOTE_CHARS).contains(&chars) {
            return Err(AppError::validation(format!(
                "quote must be between {MIN_QUOTE_CHARS} and {MAX_QUOTE_CHARS} characters"
            )));
        }
        let book = self.get_book(user_id, book_id).await?;

        let submission = QuoteSubmission {
            id: Uuid::now_v7(),
            user_id,
            book_id: book.id,
            text: text.to_string(),
            page: draft.page.trim().to_string(),
            context: draft.context.trim().to_string(),
            status: QuoteStatus::Pending,
            reward_amount: DEFAULT_QUOTE_REWARD,
            submitted_at: self.clock.now(),
            verified_at: None,
            verified_by: None,
            verification_reason: String::new(),
        };
        self.repos.quotes.insert_submission(submission.clone()).await?;
        Ok(submission)
    }

    pub async fn my_submissions(
        &self,
        user_id: Uuid,
        status: Option<QuoteStatus>,
        page: PageRequest,
    ) -> Result<MySubmissions> {
        let (items, total) = self.repos.quotes.list_for_user(user_id, status, page).await?;
        let total_earnings = self.repos.quotes.verified_earnings(user_id).await?;
        Ok(MySubmissions {
            submissions: Paginated::new(items, page, total),
            total_earnings,
        })
    }

    /// Oldest first. Moderators only.
    pub async fn pending_submissions(&self, moderator_id: Uuid) -> Result<Vec<PendingQuote>> {
        self.require_admin(moderator_id).await?;

        let pending = self.repos.quotes.list_pending().await?;
        let mut queue = Vec::with_capacity(pending.len());
        for submission in pending {
            let username = self
                .repos
                .users
                .get_user(submission.user_id)
                .await?
                .map(|u| u.username);
            let book = self
                .repos
                .books
                .get_book(submission.user_id, submission.book_id)
                .await?;
            queue.push(PendingQuote {
                username,
                book_title: book.as_ref().map(|b| b.title.clone()),
                book_authors: book.map(|b| b.authors).unwrap_or_default(),
                submission,
            });
        }
        Ok(queue)
    }

    /// Approves or rejects a pending submission. Approval credits `reward_amount` under `quotes`.
    pub async fn verify_submission(
        &self,
        moderator_id: Uuid,
        submission_id: Uuid,
        action: VerifyAction,
        reason: &str,
    ) -> Result<Awarded<QuoteSubmission>> {
        self.require_admin(moderator_id).await?;

        let mut submission = self
            .repos
            .quotes
            .get_submission(submission_id)
            .await?
            .ok_or_else(|| AppError::not_found("Quote submission", submission_id))?;
        if submission.status != QuoteStatus::Pending {
            return Err(AppError::Conflict("quote has already been processed".into()));
        }

        submission.status = match action {
            VerifyAction::Approve => QuoteStatus::Verified,
            VerifyAction::Reject => QuoteStatus::Rejected,
        };
        submission.verified_at = Some(self.clock.now());
        submission.verified_by = Some(moderator_id);
        submission.verification_reason = reason.trim().to_string();
        if !self.repos.quotes.resolve_submission(submission.clone()).await? {
            return Err(AppError::Conflict("quote has already been processed".into()));
        }

        if action == VerifyAction::Reject {
            log::info!("quote {submission_id} rejected by {moderator_id}");
            return Ok(Awarded::new(submission, 0));
        }

        let reward = submission.reward_amount;
        self.ledger
            .append(
                NewLedgerEntry::new(
                    submission.user_id,
                    reward,
                    PointSource::Quotes,
                    format!("Verified quote reward: {reward}"),
                )
                .with_metadata(json!({ "quote_id": submission.id })),
            )
            .await?;
        log::info!("quote {submission_id} approved by {moderator_id}");
        Ok(Awarded::new(submission, reward))
    }
}
