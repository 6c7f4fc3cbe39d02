use async_trait::async_trait;
use hk_core::models::{LedgerEntry, LedgerQuery, PointSource};
use hk_core::traits::LedgerRepo;
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use uuid::Uuid;

use crate::{blob_to_uuid, count, uuid_to_blob, SqliteStore};

fn entry_from_row(row: &SqliteRow) -> anyhow::Result<LedgerEntry> {
    Ok(LedgerEntry {
        id: blob_to_uuid(row.try_get::<Vec<u8>, _>("id")?.as_slice())?,
        user_id: blob_to_uuid(row.try_get::<Vec<u8>, _>("user_id")?.as_slice())?,
        points: row.try_get("points")?,
        source: row.try_get::<String, _>("source")?.parse::<PointSource>()?,
        description: row.try_get("description")?,
        earned_at: row.try_get("earned_at")?,
        metadata: serde_json::from_str(&row.try_get::<String, _>("metadata")?).unwrap_or_default(),
    })
}

// ?1 user, ?2 source (nullable), ?3 since (nullable)
const LEDGER_FILTER: &str =
    "WHERE user_id = ?1 AND (?2 IS NULL OR source = ?2) AND (?3 IS NULL OR earned_at >= ?3)";

#[async_trait]
impl LedgerRepo for SqliteStore {
    async fn insert_entry(&self, entry: LedgerEntry) -> anyhow::Result<()> {
        sqlx::query(
            "INSERT INTO rewards (id, user_id, points, source, description, earned_at, metadata) \
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(uuid_to_blob(entry.id))
        .bind(uuid_to_blob(entry.user_id))
        .bind(entry.points)
        .bind(entry.source.as_str())
        .bind(&entry.description)
        .bind(entry.earned_at)
        .bind(serde_json::to_string(&entry.metadata)?)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Single-statement increment; concurrent increments never lose updates.
    async fn increment_points(&self, user_id: Uuid, points: i64) -> anyhow::Result<()> {
        let result = sqlx::query("UPDATE users SET points = points + ? WHERE id = ?")
            .bind(points)
            .bind(uuid_to_blob(user_id))
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            anyhow::bail!("user {user_id} does not exist");
        }
        Ok(())
    }

    async fn query_entries(&self, query: LedgerQuery) -> anyhow::Result<(Vec<LedgerEntry>, u64)> {
        let user = uuid_to_blob(query.user_id);
        let source = query.source.map(|s| s.as_str());

        // 1. The page, newest first; `seq` orders entries sharing a timestamp
        let sql = format!(
            "SELECT id, user_id, points, source, description, earned_at, metadata FROM rewards \
             {LEDGER_FILTER} ORDER BY earned_at DESC, seq DESC LIMIT ?4 OFFSET ?5"
        );
        let entries = sqlx::query(&sql)
            .bind(&user)
            .bind(source)
            .bind(query.since)
            .bind(i64::from(query.page.limit))
            .bind(i64::try_from(query.page.offset())?)
            .fetch_all(&self.pool)
            .await?
            .iter()
            .map(entry_from_row)
            .collect::<anyhow::Result<Vec<_>>>()?;

        // 2. Total matches for the same filter
        let sql = format!("SELECT COUNT(*) FROM rewards {LEDGER_FILTER}");
        let total: i64 = sqlx::query_scalar(&sql)
            .bind(&user)
            .bind(source)
            .bind(query.since)
            .fetch_one(&self.pool)
            .await?;

        Ok((entries, count(total)))
    }

    async fn sum_points(&self, user_id: Uuid) -> anyhow::Result<i64> {
        let sum: i64 = sqlx::query_scalar("SELECT COALESCE(SUM(points), 0) FROM rewards WHERE user_id = ?")
            .bind(uuid_to_blob(user_id))
            .fetch_one(&self.pool)
            .await?;
        Ok(sum)
    }
}
