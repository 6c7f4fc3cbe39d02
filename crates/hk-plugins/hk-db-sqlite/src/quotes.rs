use async_trait::async_trait;
use hk_core::models::{PageRequest, QuoteStatus, QuoteSubmission};
use hk_core::traits::QuoteRepo;
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use uuid::Uuid;

use crate::{blob_to_uuid, count, uuid_to_blob, SqliteStore};

const SUBMISSION_COLUMNS: &str = "id, user_id, book_id, text, page, context, status, reward_amount, \
                                  submitted_at, verified_at, verified_by, verification_reason";

fn submission_from_row(row: &SqliteRow) -> anyhow::Result<QuoteSubmission> {
    let verified_by = row
        .try_get::<Option<Vec<u8>>, _>("verified_by")?
        .map(|blob| blob_to_uuid(&blob))
        .transpose()?;

    Ok(QuoteSubmission {
        id: blob_to_uuid(row.try_get::<Vec<u8>, _>("id")?.as_slice())?,
        user_id: blob_to_uuid(row.try_get::<Vec<u8>, _>("user_id")?.as_slice())?,
        book_id: blob_to_uuid(row.try_get::<Vec<u8>, _>("book_id")?.as_slice())?,
        text: row.try_get("text")?,
        page: row.try_get("page")?,
        context: row.try_get("context")?,
        status: row.try_get::<String, _>("status")?.parse::<QuoteStatus>()?,
        reward_amount: row.try_get("reward_amount")?,
        submitted_at: row.try_get("submitted_at")?,
        verified_at: row.try_get("verified_at")?,
        verified_by,
        verification_reason: row.try_get("verification_reason")?,
    })
}

#[async_trait]
impl QuoteRepo for SqliteStore {
    async fn insert_submission(&self, submission: QuoteSubmission) -> anyhow::Result<()> {
        sqlx::query(
            "INSERT INTO quote_submissions (id, user_id, book_id, text, page, context, status, reward_amount, \
             submitted_at, verified_at, verified_by, verification_reason) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(uuid_to_blob(submission.id))
        .bind(uuid_to_blob(submission.user_id))
        .bind(uuid_to_blob(submission.book_id))
        .bind(&submission.text)
        .bind(&submission.page)
        .bind(&submission.context)
        .bind(submission.status.as_str())
        .bind(submission.reward_amount)
        .bind(submission.submitted_at)
        .bind(submission.verified_at)
        .bind(submission.verified_by.map(uuid_to_blob))
        .bind(&submission.verification_reason)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get_submission(&self, id: Uuid) -> anyhow::Result<Option<QuoteSubmission>> {
        let sql = format!("SELECT {SUBMISSION_COLUMNS} FROM quote_submissions WHERE id = ?");
        let row = sqlx::query(&sql)
            .bind(uuid_to_blob(id))
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(submission_from_row).transpose()
    }

    async fn resolve_submission(&self, submission: QuoteSubmission) -> anyhow::Result<bool> {
        let result = sqlx::query(
            "UPDATE quote_submissions SET status = ?, verified_at = ?, verified_by = ?, verification_reason = ? \
             WHERE id = ? AND status = 'pending'",
        )
        .bind(submission.status.as_str())
        .bind(submission.verified_at)
        .bind(submission.verified_by.map(uuid_to_blob))
        .bind(&submission.verification_reason)
        .bind(uuid_to_blob(submission.id))
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn list_for_user(
        &self,
        user_id: Uuid,
        status: Option<QuoteStatus>,
        page: PageRequest,
    ) -> anyhow::Result<(Vec<QuoteSubmission>, u64)> {
        let user = uuid_to_blob(user_id);
        let status = status.map(|s| s.as_str());

        let sql = format!(
            "SELECT {SUBMISSION_COLUMNS} FROM quote_submissions WHERE user_id = ?1 AND (?2 IS NULL OR status = ?2) \
             ORDER BY submitted_at DESC, seq DESC LIMIT ?3 OFFSET ?4"
        );
        let items = sqlx::query(&sql)
            .bind(&user)
            .bind(status)
            .bind(i64::from(page.limit))
            .bind(i64::try_from(page.offset())?)
            .fetch_all(&self.pool)
            .await?
            .iter()
            .map(submission_from_row)
            .collect::<anyhow::Result<Vec<_>>>()?;

        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM quote_submissions WHERE user_id = ?1 AND (?2 IS NULL OR status = ?2)",
        )
        .bind(&user)
        .bind(status)
        .fetch_one(&self.pool)
        .await?;

        Ok((items, count(total)))
    }

    async fn list_pending(&self) -> anyhow::Result<Vec<QuoteSubmission>> {
        let sql = format!(
            "SELECT {SUBMISSION_COLUMNS} FROM quote_submissions WHERE status = 'pending' \
             ORDER BY submitted_at ASC, seq ASC"
        );
        sqlx::query(&sql)
            .fetch_all(&self.pool)
            .await?
            .iter()
            .map(submission_from_row)
            .collect()
    }

    async fn count_pending(&self) -> anyhow::Result<u64> {
        let n: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM quote_submissions WHERE status = 'pending'")
            .fetch_one(&self.pool)
            .await?;
        Ok(count(n))
    }

    async fn verified_earnings(&self, user_id: Uuid) -> anyhow::Result<i64> {
        let sum: i64 = sqlx::query_scalar(
            "SELECT COALESCE(SUM(reward_amount), 0) FROM quote_submissions WHERE user_id = ? AND status = 'verified'",
        )
        .bind(uuid_to_blob(user_id))
        .fetch_one(&self.pool)
        .await?;
        Ok(sum)
    }
}
