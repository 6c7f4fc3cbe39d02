use async_trait::async_trait;
use chrono::{DateTime, Utc};
use hk_core::models::{ActiveTimer, CompletedTask, PageRequest, TimerStatus, TimerType};
use hk_core::traits::TimerRepo;
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use uuid::Uuid;

use crate::{blob_to_uuid, count, uuid_to_blob, SqliteStore};

const TASK_COLUMNS: &str = "id, user_id, task_name, planned_duration, actual_duration, category, timer_type, \
                            mood_rating, notes, started_at, completed_at";

fn timer_from_row(row: &SqliteRow) -> anyhow::Result<ActiveTimer> {
    Ok(ActiveTimer {
        id: blob_to_uuid(row.try_get::<Vec<u8>, _>("id")?.as_slice())?,
        user_id: blob_to_uuid(row.try_get::<Vec<u8>, _>("user_id")?.as_slice())?,
        task_name: row.try_get("task_name")?,
        duration: row.try_get("duration")?,
        category: row.try_get("category")?,
        timer_type: row.try_get::<String, _>("timer_type")?.parse::<TimerType>()?,
        status: row.try_get::<String, _>("status")?.parse::<TimerStatus>()?,
        started_at: row.try_get("started_at")?,
        paused_at: row.try_get("paused_at")?,
        total_paused_secs: row.try_get("total_paused_secs")?,
    })
}

fn task_from_row(row: &SqliteRow) -> anyhow::Result<CompletedTask> {
    Ok(CompletedTask {
        id: blob_to_uuid(row.try_get::<Vec<u8>, _>("id")?.as_slice())?,
        user_id: blob_to_uuid(row.try_get::<Vec<u8>, _>("user_id")?.as_slice())?,
        task_name: row.try_get("task_name")?,
        planned_duration: row.try_get("planned_duration")?,
        actual_duration: row.try_get("actual_duration")?,
        category: row.try_get("category")?,
        timer_type: row.try_get::<String, _>("timer_type")?.parse::<TimerType>()?,
        mood_rating: row.try_get("mood_rating")?,
        notes: row.try_get("notes")?,
        started_at: row.try_get("started_at")?,
        completed_at: row.try_get("completed_at")?,
    })
}

// ?1 user, ?2 category (nullable), ?3 since (nullable)
const TASK_FILTER: &str =
    "WHERE user_id = ?1 AND (?2 IS NULL OR category = ?2) AND (?3 IS NULL OR completed_at >= ?3)";

#[async_trait]
impl TimerRepo for SqliteStore {
    async fn get_active(&self, user_id: Uuid) -> anyhow::Result<Option<ActiveTimer>> {
        let row = sqlx::query(
            "SELECT id, user_id, task_name, duration, category, timer_type, status, started_at, paused_at, \
             total_paused_secs FROM active_timers WHERE user_id = ?",
        )
        .bind(uuid_to_blob(user_id))
        .fetch_optional(&self.pool)
        .await?;
        row.as_ref().map(timer_from_row).transpose()
    }

    /// The UNIQUE constraint on `user_id` rejects a second active timer.
    async fn insert_active(&self, timer: ActiveTimer) -> anyhow::Result<()> {
        sqlx::query(
            "INSERT INTO active_timers (id, user_id, task_name, duration, category, timer_type, status, \
             started_at, paused_at, total_paused_secs) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(uuid_to_blob(timer.id))
        .bind(uuid_to_blob(timer.user_id))
        .bind(&timer.task_name)
        .bind(timer.duration)
        .bind(&timer.category)
        .bind(timer.timer_type.as_str())
        .bind(timer.status.as_str())
        .bind(timer.started_at)
        .bind(timer.paused_at)
        .bind(timer.total_paused_secs)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn update_active(&self, timer: ActiveTimer) -> anyhow::Result<()> {
        let result = sqlx::query(
            "UPDATE active_timers SET status = ?, paused_at = ?, total_paused_secs = ? WHERE id = ?",
        )
        .bind(timer.status.as_str())
        .bind(timer.paused_at)
        .bind(timer.total_paused_secs)
        .bind(uuid_to_blob(timer.id))
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            anyhow::bail!("timer {} is no longer active", timer.id);
        }
        Ok(())
    }

    async fn delete_active(&self, timer_id: Uuid) -> anyhow::Result<()> {
        sqlx::query("DELETE FROM active_timers WHERE id = ?")
            .bind(uuid_to_blob(timer_id))
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn insert_completed(&self, task: CompletedTask) -> anyhow::Result<()> {
        sqlx::query(
            "INSERT INTO completed_tasks (id, user_id, task_name, planned_duration, actual_duration, category, \
             timer_type, mood_rating, notes, started_at, completed_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(uuid_to_blob(task.id))
        .bind(uuid_to_blob(task.user_id))
        .bind(&task.task_name)
        .bind(task.planned_duration)
        .bind(task.actual_duration)
        .bind(&task.category)
        .bind(task.timer_type.as_str())
        .bind(task.mood_rating)
        .bind(&task.notes)
        .bind(task.started_at)
        .bind(task.completed_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn list_completed(
        &self,
        user_id: Uuid,
        category: Option<String>,
        since: Option<DateTime<Utc>>,
        page: PageRequest,
    ) -> anyhow::Result<(Vec<CompletedTask>, u64)> {
        let user = uuid_to_blob(user_id);

        let sql = format!(
            "SELECT {TASK_COLUMNS} FROM completed_tasks {TASK_FILTER} \
             ORDER BY completed_at DESC, seq DESC LIMIT ?4 OFFSET ?5"
        );
        let tasks = sqlx::query(&sql)
            .bind(&user)
            .bind(category.as_deref())
            .bind(since)
            .bind(i64::from(page.limit))
            .bind(i64::try_from(page.offset())?)
            .fetch_all(&self.pool)
            .await?
            .iter()
            .map(task_from_row)
            .collect::<anyhow::Result<Vec<_>>>()?;

        let sql = format!("SELECT COUNT(*) FROM completed_tasks {TASK_FILTER}");
        let total: i64 = sqlx::query_scalar(&sql)
            .bind(&user)
            .bind(category.as_deref())
            .bind(since)
            .fetch_one(&self.pool)
            .await?;

        Ok((tasks, count(total)))
    }

    async fn count_completed(
        &self,
        user_id: Uuid,
        since: Option<DateTime<Utc>>,
    ) -> anyhow::Result<u64> {
        let n: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM completed_tasks WHERE user_id = ?1 AND (?2 IS NULL OR completed_at >= ?2)",
        )
        .bind(uuid_to_blob(user_id))
        .bind(since)
        .fetch_one(&self.pool)
        .await?;
        Ok(count(n))
    }

    async fn completed_since(
        &self,
        user_id: Uuid,
        since: DateTime<Utc>,
    ) -> anyhow::Result<Vec<CompletedTask>> {
        let sql = format!(
            "SELECT {TASK_COLUMNS} FROM completed_tasks WHERE user_id = ? AND completed_at >= ? \
             ORDER BY completed_at ASC, seq ASC"
        );
        sqlx::query(&sql)
            .bind(uuid_to_blob(user_id))
            .bind(since)
            .fetch_all(&self.pool)
            .await?
            .iter()
            .map(task_from_row)
            .collect()
    }

    async fn top_completers(&self, limit: u32) -> anyhow::Result<Vec<(Uuid, u64)>> {
        self.ranking(
            "SELECT user_id, COUNT(*) AS n FROM completed_tasks \
             GROUP BY user_id ORDER BY n DESC, MIN(completed_at) ASC LIMIT ?",
            limit,
        )
        .await
    }

    async fn count_all_completed(&self, since: Option<DateTime<Utc>>) -> anyhow::Result<u64> {
        let n: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM completed_tasks WHERE ?1 IS NULL OR completed_at >= ?1")
                .bind(since)
                .fetch_one(&self.pool)
                .await?;
        Ok(count(n))
    }
}
