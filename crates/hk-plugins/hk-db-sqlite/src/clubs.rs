use async_trait::async_trait;
use hk_core::models::Club;
use hk_core::traits::ClubRepo;
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use uuid::Uuid;

use crate::{blob_to_uuid, count, uuid_to_blob, SqliteStore};

const CLUB_COLUMNS: &str = "c.id, c.name, c.description, c.topic, c.creator_id, c.is_private, c.created_at, c.current_book";

/// Club without its member list.
fn club_from_row(row: &SqliteRow) -> anyhow::Result<Club> {
    Ok(Club {
        id: blob_to_uuid(row.try_get::<Vec<u8>, _>("id")?.as_slice())?,
        name: row.try_get("name")?,
        description: row.try_get("description")?,
        topic: row.try_get("topic")?,
        creator_id: blob_to_uuid(row.try_get::<Vec<u8>, _>("creator_id")?.as_slice())?,
        members: Vec::new(),
        is_private: row.try_get("is_private")?,
        created_at: row.try_get("created_at")?,
        current_book: row.try_get("current_book")?,
    })
}

impl SqliteStore {
    async fn with_members(&self, rows: Vec<SqliteRow>) -> anyhow::Result<Vec<Club>> {
        let mut clubs = Vec::with_capacity(rows.len());
        for row in &rows {
            let mut club = club_from_row(row)?;
            club.members = sqlx::query_scalar::<_, Vec<u8>>(
                "SELECT user_id FROM club_members WHERE club_id = ? ORDER BY seq ASC",
            )
            .bind(uuid_to_blob(club.id))
            .fetch_all(&self.pool)
            .await?
            .iter()
            .map(|blob| blob_to_uuid(blob))
            .collect::<anyhow::Result<_>>()?;
            clubs.push(club);
        }
        Ok(clubs)
    }
}

#[async_trait]
impl ClubRepo for SqliteStore {
    /// Club row and initial members commit together.
    async fn create_club(&self, club: Club) -> anyhow::Result<()> {
        let mut tx = self.pool.begin().await?;

        // 1. Insert Club
        sqlx::query(
            "INSERT INTO clubs (id, name, description, topic, creator_id, is_private, created_at, current_book) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(uuid_to_blob(club.id))
        .bind(&club.name)
        .bind(&club.description)
        .bind(&club.topic)
        .bind(uuid_to_blob(club.creator_id))
        .bind(club.is_private)
        .bind(club.created_at)
        .bind(&club.current_book)
        .execute(&mut *tx)
        .await?;

        // 2. Insert Members
        for member in &club.members {
            sqlx::query("INSERT INTO club_members (club_id, user_id) VALUES (?, ?)")
                .bind(uuid_to_blob(club.id))
                .bind(uuid_to_blob(*member))
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn get_club(&self, id: Uuid) -> anyhow::Result<Option<Club>> {
        let sql = format!("SELECT {CLUB_COLUMNS} FROM clubs c WHERE c.id = ?");
        let rows = sqlx::query(&sql)
            .bind(uuid_to_blob(id))
            .fetch_all(&self.pool)
            .await?;
        Ok(self.with_members(rows).await?.into_iter().next())
    }

    async fn add_member(&self, club_id: Uuid, user_id: Uuid) -> anyhow::Result<()> {
        sqlx::query("INSERT INTO club_members (club_id, user_id) VALUES (?, ?)")
            .bind(uuid_to_blob(club_id))
            .bind(uuid_to_blob(user_id))
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn clubs_for_member(&self, user_id: Uuid) -> anyhow::Result<Vec<Club>> {
        let sql = format!(
            "SELECT {CLUB_COLUMNS} FROM clubs c JOIN club_members m ON m.club_id = c.id \
             WHERE m.user_id = ? ORDER BY c.created_at DESC, c.seq DESC"
        );
        let rows = sqlx::query(&sql)
            .bind(uuid_to_blob(user_id))
            .fetch_all(&self.pool)
            .await?;
        self.with_members(rows).await
    }

    async fn public_clubs_excluding(&self, user_id: Uuid, limit: u32) -> anyhow::Result<Vec<Club>> {
        let sql = format!(
            "SELECT {CLUB_COLUMNS} FROM clubs c WHERE c.is_private = 0 AND NOT EXISTS \
             (SELECT 1 FROM club_members m WHERE m.club_id = c.id AND m.user_id = ?) \
             ORDER BY c.created_at DESC, c.seq DESC LIMIT ?"
        );
        let rows = sqlx::query(&sql)
            .bind(uuid_to_blob(user_id))
            .bind(i64::from(limit))
            .fetch_all(&self.pool)
            .await?;
        self.with_members(rows).await
    }

    async fn count_memberships(&self, user_id: Uuid) -> anyhow::Result<u64> {
        let n: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM club_members WHERE user_id = ?")
            .bind(uuid_to_blob(user_id))
            .fetch_one(&self.pool)
            .await?;
        Ok(count(n))
    }

    async fn count_created(&self, user_id: Uuid) -> anyhow::Result<u64> {
        let n: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM clubs WHERE creator_id = ?")
            .bind(uuid_to_blob(user_id))
            .fetch_one(&self.pool)
            .await?;
        Ok(count(n))
    }
}
