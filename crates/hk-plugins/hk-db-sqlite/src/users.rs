use async_trait::async_trait;
use chrono::{DateTime, Utc};
use hk_core::models::{PageRequest, User};
use hk_core::traits::UserRepo;
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use uuid::Uuid;

use crate::{blob_to_uuid, count, uuid_to_blob, SqliteStore};

const USER_COLUMNS: &str = "id, username, email, password_hash, is_admin, is_active, points, level, \
                            profile, preferences, created_at, last_login";

/// `instr` keeps `%` and `_` in the search text literal.
const SEARCH_FILTER: &str = "WHERE ?1 IS NULL \
                             OR instr(lower(username), ?1) > 0 OR instr(lower(email), ?1) > 0";

fn user_from_row(row: &SqliteRow) -> anyhow::Result<User> {
    Ok(User {
        id: blob_to_uuid(row.try_get::<Vec<u8>, _>("id")?.as_slice())?,
        username: row.try_get("username")?,
        email: row.try_get("email")?,
        password_hash: row.try_get("password_hash")?,
        is_admin: row.try_get("is_admin")?,
        is_active: row.try_get("is_active")?,
        points: row.try_get("points")?,
        level: row.try_get("level")?,
        profile: serde_json::from_str(&row.try_get::<String, _>("profile")?)?,
        preferences: serde_json::from_str(&row.try_get::<String, _>("preferences")?)?,
        created_at: row.try_get("created_at")?,
        last_login: row.try_get("last_login")?,
    })
}

impl SqliteStore {
    async fn find_user_by(&self, column: &str, value: &str) -> anyhow::Result<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE {column} = ?");
        let row = sqlx::query(&sql)
            .bind(value)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(user_from_row).transpose()
    }
}

#[async_trait]
impl UserRepo for SqliteStore {
    async fn create_user(&self, user: User) -> anyhow::Result<()> {
        sqlx::query(
            "INSERT INTO users (id, username, email, password_hash, is_admin, is_active, points, level, \
             profile, preferences, created_at, last_login) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(uuid_to_blob(user.id))
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.is_admin)
        .bind(user.is_active)
        .bind(user.points)
        .bind(user.level)
        .bind(serde_json::to_string(&user.profile)?)
        .bind(serde_json::to_string(&user.preferences)?)
        .bind(user.created_at)
        .bind(user.last_login)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get_user(&self, id: Uuid) -> anyhow::Result<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?");
        let row = sqlx::query(&sql)
            .bind(uuid_to_blob(id))
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(user_from_row).transpose()
    }

    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<User>> {
        self.find_user_by("email", email).await
    }

    async fn find_by_username(&self, username: &str) -> anyhow::Result<Option<User>> {
        self.find_user_by("username", username).await
    }

    /// Leaves `points` untouched.
    async fn update_user(&self, user: User) -> anyhow::Result<()> {
        let result = sqlx::query(
            "UPDATE users SET username = ?, email = ?, password_hash = ?, is_admin = ?, is_active = ?, \
             level = ?, profile = ?, preferences = ?, last_login = ? WHERE id = ?",
        )
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.is_admin)
        .bind(user.is_active)
        .bind(user.level)
        .bind(serde_json::to_string(&user.profile)?)
        .bind(serde_json::to_string(&user.preferences)?)
        .bind(user.last_login)
        .bind(uuid_to_blob(user.id))
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            anyhow::bail!("user {} does not exist", user.id);
        }
        Ok(())
    }

    async fn top_by_points(&self, limit: u32) -> anyhow::Result<Vec<User>> {
        let sql = format!(
            "SELECT {USER_COLUMNS} FROM users WHERE is_active = 1 \
             ORDER BY points DESC, created_at ASC LIMIT ?"
        );
        sqlx::query(&sql)
            .bind(i64::from(limit))
            .fetch_all(&self.pool)
            .await?
            .iter()
            .map(user_from_row)
            .collect()
    }

    async fn count_users(
        &self,
        active_only: bool,
        since: Option<DateTime<Utc>>,
    ) -> anyhow::Result<u64> {
        let n: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM users WHERE (?1 = 0 OR is_active = 1) AND (?2 IS NULL OR created_at >= ?2)",
        )
        .bind(active_only)
        .bind(since)
        .fetch_one(&self.pool)
        .await?;
        Ok(count(n))
    }

    async fn search_users(
        &self,
        search: Option<String>,
        page: PageRequest,
    ) -> anyhow::Result<(Vec<User>, u64)> {
        let search = search.map(|s| s.to_lowercase());

        let sql = format!(
            "SELECT {USER_COLUMNS} FROM users {SEARCH_FILTER} \
             ORDER BY created_at DESC, rowid DESC LIMIT ?2 OFFSET ?3"
        );
        let users = sqlx::query(&sql)
            .bind(search.as_deref())
            .bind(i64::from(page.limit))
            .bind(i64::try_from(page.offset())?)
            .fetch_all(&self.pool)
            .await?
            .iter()
            .map(user_from_row)
            .collect::<anyhow::Result<Vec<_>>>()?;

        let total: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM users {SEARCH_FILTER}"))
            .bind(search.as_deref())
            .fetch_one(&self.pool)
            .await?;

        Ok((users, count(total)))
    }
}
