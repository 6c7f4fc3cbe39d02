use async_trait::async_trait;
use chrono::{DateTime, Utc};
use hk_core::models::ActivityKind;
use hk_core::traits::ActivityRepo;
use uuid::Uuid;

use crate::{count, uuid_to_blob, SqliteStore};

#[async_trait]
impl ActivityRepo for SqliteStore {
    async fn count_activity(
        &self,
        user_id: Uuid,
        kind: ActivityKind,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> anyhow::Result<u64> {
        let sql = match kind {
            ActivityKind::Reading => {
                "SELECT COUNT(*) FROM reading_sessions WHERE user_id = ? AND date >= ? AND date < ?"
            }
            ActivityKind::Productivity => {
                "SELECT COUNT(*) FROM completed_tasks WHERE user_id = ? AND completed_at >= ? AND completed_at < ?"
            }
        };
        let n: i64 = sqlx::query_scalar(sql)
            .bind(uuid_to_blob(user_id))
            .bind(start)
            .bind(end)
            .fetch_one(&self.pool)
            .await?;
        Ok(count(n))
    }
}
