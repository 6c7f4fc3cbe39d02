use async_trait::async_trait;
use chrono::{DateTime, Utc};
use hk_core::models::{Book, BookQuote, BookStatus, PageRequest, ReadingSession, Takeaway};
use hk_core::traits::BookRepo;
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use uuid::Uuid;

use crate::{blob_to_uuid, count, uuid_to_blob, SqliteStore};

const BOOK_COLUMNS: &str = "id, user_id, title, authors, description, page_count, current_page, status, \
                            rating, cover_image, genre, isbn, added_at, finished_at";

/// Scalar columns only; quotes and takeaways are attached by [`SqliteStore::hydrate`].
fn book_from_row(row: &SqliteRow) -> anyhow::Result<Book> {
    Ok(Book {
        id: blob_to_uuid(row.try_get::<Vec<u8>, _>("id")?.as_slice())?,
        user_id: blob_to_uuid(row.try_get::<Vec<u8>, _>("user_id")?.as_slice())?,
        title: row.try_get("title")?,
        authors: serde_json::from_str(&row.try_get::<String, _>("authors")?).unwrap_or_default(),
        description: row.try_get("description")?,
        page_count: row.try_get("page_count")?,
        current_page: row.try_get("current_page")?,
        status: row.try_get::<String, _>("status")?.parse::<BookStatus>()?,
        rating: row.try_get("rating")?,
        cover_image: row.try_get("cover_image")?,
        genre: row.try_get("genre")?,
        isbn: row.try_get("isbn")?,
        added_at: row.try_get("added_at")?,
        finished_at: row.try_get("finished_at")?,
        quotes: Vec::new(),
        takeaways: Vec::new(),
    })
}

fn session_from_row(row: &SqliteRow) -> anyhow::Result<ReadingSession> {
    Ok(ReadingSession {
        id: blob_to_uuid(row.try_get::<Vec<u8>, _>("id")?.as_slice())?,
        user_id: blob_to_uuid(row.try_get::<Vec<u8>, _>("user_id")?.as_slice())?,
        book_id: blob_to_uuid(row.try_get::<Vec<u8>, _>("book_id")?.as_slice())?,
        pages_read: row.try_get("pages_read")?,
        current_page: row.try_get("current_page")?,
        duration_minutes: row.try_get("duration_minutes")?,
        notes: row.try_get("notes")?,
        date: row.try_get("date")?,
    })
}

impl SqliteStore {
    async fn hydrate(&self, mut book: Book) -> anyhow::Result<Book> {
        let id = uuid_to_blob(book.id);

        book.quotes = sqlx::query(
            "SELECT text, page, context, added_at FROM book_quotes WHERE book_id = ? ORDER BY seq ASC",
        )
        .bind(&id)
        .fetch_all(&self.pool)
        .await?
        .iter()
        .map(|row| -> anyhow::Result<BookQuote> {
            Ok(BookQuote {
                text: row.try_get("text")?,
                page: row.try_get("page")?,
                context: row.try_get("context")?,
                added_at: row.try_get("added_at")?,
            })
        })
        .collect::<anyhow::Result<_>>()?;

        book.takeaways = sqlx::query(
            "SELECT takeaway, page_reference, added_at FROM book_takeaways WHERE book_id = ? ORDER BY seq ASC",
        )
        .bind(&id)
        .fetch_all(&self.pool)
        .await?
        .iter()
        .map(|row| -> anyhow::Result<Takeaway> {
            Ok(Takeaway {
                takeaway: row.try_get("takeaway")?,
                page_reference: row.try_get("page_reference")?,
                added_at: row.try_get("added_at")?,
            })
        })
        .collect::<anyhow::Result<_>>()?;

        Ok(book)
    }

    /// Runs a `(user, aggregate)` ranking query.
    pub(crate) async fn ranking(&self, sql: &str, limit: u32) -> anyhow::Result<Vec<(Uuid, u64)>> {
        sqlx::query(sql)
            .bind(i64::from(limit))
            .fetch_all(&self.pool)
            .await?
            .iter()
            .map(|row| -> anyhow::Result<(Uuid, u64)> {
                Ok((
                    blob_to_uuid(row.try_get::<Vec<u8>, _>("user_id")?.as_slice())?,
                    count(row.try_get::<i64, _>("n")?),
                ))
            })
            .collect()
    }
}

#[async_trait]
impl BookRepo for SqliteStore {
    async fn create_book(&self, book: Book) -> anyhow::Result<()> {
        sqlx::query(
            "INSERT INTO books (id, user_id, title, authors, description, page_count, current_page, status, \
             rating, cover_image, genre, isbn, added_at, finished_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(uuid_to_blob(book.id))
        .bind(uuid_to_blob(book.user_id))
        .bind(&book.title)
        .bind(serde_json::to_string(&book.authors)?)
        .bind(&book.description)
        .bind(book.page_count)
        .bind(book.current_page)
        .bind(book.status.as_str())
        .bind(book.rating)
        .bind(&book.cover_image)
        .bind(&book.genre)
        .bind(&book.isbn)
        .bind(book.added_at)
        .bind(book.finished_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get_book(&self, user_id: Uuid, book_id: Uuid) -> anyhow::Result<Option<Book>> {
        let sql = format!("SELECT {BOOK_COLUMNS} FROM books WHERE id = ? AND user_id = ?");
        let row = sqlx::query(&sql)
            .bind(uuid_to_blob(book_id))
            .bind(uuid_to_blob(user_id))
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => Ok(Some(self.hydrate(book_from_row(&row)?).await?)),
            None => Ok(None),
        }
    }

    async fn list_books(
        &self,
        user_id: Uuid,
        status: Option<BookStatus>,
        page: PageRequest,
    ) -> anyhow::Result<(Vec<Book>, u64)> {
        let user = uuid_to_blob(user_id);
        let status = status.map(|s| s.as_str());

        let sql = format!(
            "SELECT {BOOK_COLUMNS} FROM books WHERE user_id = ?1 AND (?2 IS NULL OR status = ?2) \
             ORDER BY added_at DESC, seq DESC LIMIT ?3 OFFSET ?4"
        );
        let rows = sqlx::query(&sql)
            .bind(&user)
            .bind(status)
            .bind(i64::from(page.limit))
            .bind(i64::try_from(page.offset())?)
            .fetch_all(&self.pool)
            .await?;

        let mut books = Vec::with_capacity(rows.len());
        for row in &rows {
            books.push(self.hydrate(book_from_row(row)?).await?);
        }

        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM books WHERE user_id = ?1 AND (?2 IS NULL OR status = ?2)",
        )
        .bind(&user)
        .bind(status)
        .fetch_one(&self.pool)
        .await?;

        Ok((books, count(total)))
    }

    async fn count_books(&self, user_id: Uuid, status: Option<BookStatus>) -> anyhow::Result<u64> {
        let n: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM books WHERE user_id = ?1 AND (?2 IS NULL OR status = ?2)",
        )
        .bind(uuid_to_blob(user_id))
        .bind(status.map(|s| s.as_str()))
        .fetch_one(&self.pool)
        .await?;
        Ok(count(n))
    }

    async fn update_book(&self, book: Book) -> anyhow::Result<()> {
        let result = sqlx::query(
            "UPDATE books SET title = ?, authors = ?, description = ?, page_count = ?, current_page = ?, \
             status = ?, rating = ?, cover_image = ?, genre = ?, isbn = ?, finished_at = ? \
             WHERE id = ? AND user_id = ?",
        )
        .bind(&book.title)
        .bind(serde_json::to_string(&book.authors)?)
        .bind(&book.description)
        .bind(book.page_count)
        .bind(book.current_page)
        .bind(book.status.as_str())
        .bind(book.rating)
        .bind(&book.cover_image)
        .bind(&book.genre)
        .bind(&book.isbn)
        .bind(book.finished_at)
        .bind(uuid_to_blob(book.id))
        .bind(uuid_to_blob(book.user_id))
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            anyhow::bail!("book {} does not exist", book.id);
        }
        Ok(())
    }

    async fn mark_finished(
        &self,
        user_id: Uuid,
        book_id: Uuid,
        finished_at: DateTime<Utc>,
    ) -> anyhow::Result<bool> {
        let result = sqlx::query(
            "UPDATE books SET status = 'finished', finished_at = ? \
             WHERE id = ? AND user_id = ? AND status != 'finished'",
        )
        .bind(finished_at)
        .bind(uuid_to_blob(book_id))
        .bind(uuid_to_blob(user_id))
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn add_quote(&self, book_id: Uuid, quote: BookQuote) -> anyhow::Result<()> {
        sqlx::query("INSERT INTO book_quotes (book_id, text, page, context, added_at) VALUES (?, ?, ?, ?, ?)")
            .bind(uuid_to_blob(book_id))
            .bind(&quote.text)
            .bind(&quote.page)
            .bind(&quote.context)
            .bind(quote.added_at)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn add_takeaway(&self, book_id: Uuid, takeaway: Takeaway) -> anyhow::Result<()> {
        sqlx::query("INSERT INTO book_takeaways (book_id, takeaway, page_reference, added_at) VALUES (?, ?, ?, ?)")
            .bind(uuid_to_blob(book_id))
            .bind(&takeaway.takeaway)
            .bind(&takeaway.page_reference)
            .bind(takeaway.added_at)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn count_quotes(&self, user_id: Uuid) -> anyhow::Result<u64> {
        let n: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM book_quotes q JOIN books b ON b.id = q.book_id WHERE b.user_id = ?",
        )
        .bind(uuid_to_blob(user_id))
        .fetch_one(&self.pool)
        .await?;
        Ok(count(n))
    }

    async fn record_session(&self, session: ReadingSession) -> anyhow::Result<()> {
        sqlx::query(
            "INSERT INTO reading_sessions (id, user_id, book_id, pages_read, current_page, duration_minutes, \
             notes, date) VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(uuid_to_blob(session.id))
        .bind(uuid_to_blob(session.user_id))
        .bind(uuid_to_blob(session.book_id))
        .bind(session.pages_read)
        .bind(session.current_page)
        .bind(session.duration_minutes)
        .bind(&session.notes)
        .bind(session.date)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn sessions_since(
        &self,
        user_id: Uuid,
        since: DateTime<Utc>,
    ) -> anyhow::Result<Vec<ReadingSession>> {
        sqlx::query(
            "SELECT id, user_id, book_id, pages_read, current_page, duration_minutes, notes, date \
             FROM reading_sessions WHERE user_id = ? AND date >= ? ORDER BY date ASC, seq ASC",
        )
        .bind(uuid_to_blob(user_id))
        .bind(since)
        .fetch_all(&self.pool)
        .await?
        .iter()
        .map(session_from_row)
        .collect()
    }

    async fn top_finishers(&self, limit: u32) -> anyhow::Result<Vec<(Uuid, u64)>> {
        self.ranking(
            "SELECT user_id, COUNT(*) AS n FROM books WHERE status = 'finished' \
             GROUP BY user_id ORDER BY n DESC, MIN(finished_at) ASC LIMIT ?",
            limit,
        )
        .await
    }

    async fn count_all_books(&self, since: Option<DateTime<Utc>>) -> anyhow::Result<u64> {
        let n: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM books WHERE ?1 IS NULL OR added_at >= ?1")
            .bind(since)
            .fetch_one(&self.pool)
            .await?;
        Ok(count(n))
    }
}
