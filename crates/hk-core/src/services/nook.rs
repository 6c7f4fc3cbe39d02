//! # Nook
//!
//! The personal library: books, reading progress, quotes and takeaways.

use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use super::{required, Awarded, Services};
use crate::error::{AppError, Result};
use crate::models::{
    Book, BookQuote, BookStatus, NewLedgerEntry, PageRequest, Paginated, PointSource,
    ReadingSession, Takeaway,
};
use crate::policy::{self, ADD_BOOK_POINTS, ADD_QUOTE_POINTS, ADD_TAKEAWAY_POINTS, FINISH_BOOK_POINTS};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct NewBook {
    pub title: String,
    pub authors: Vec<String>,
    pub description: String,
    pub page_count: i32,
    pub current_page: i32,
    pub status: Option<BookStatus>,
    pub cover_image: String,
    pub genre: String,
    pub isbn: String,
}

/// Partial update; `None` leaves a field untouched.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct BookUpdate {
    pub title: Option<String>,
    pub authors: Option<Vec<String>>,
    pub description: Option<String>,
    pub page_count: Option<i32>,
    pub status: Option<BookStatus>,
    pub rating: Option<i32>,
    pub genre: Option<String>,
    pub isbn: Option<String>,
}

impl BookUpdate {
    fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.authors.is_none()
            && self.description.is_none()
            && self.page_count.is_none()
            && self.status.is_none()
            && self.rating.is_none()
            && self.genre.is_none()
            && self.isbn.is_none()
    }
}

/// `current_page` is required; a log without it must not rewind the book.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProgressLog {
    pub current_page: Option<i32>,
    #[serde(default)]
    pub duration_minutes: i32,
    #[serde(default, alias = "session_notes")]
    pub notes: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatusCounts {
    pub total: u64,
    pub to_read: u64,
    pub reading: u64,
    pub finished: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct Shelf {
    pub books: Paginated<Book>,
    pub counts: StatusCounts,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProgressUpdate {
    pub book: Book,
    pub session: ReadingSession,
    pub pages_read: i32,
}

fn non_negative(value: i32, field: &str) -> Result<i32> {
    if value < 0 {
        return Err(AppError::validation(format!("{field} cannot be negative")));
    }
    Ok(value)
}

fn valid_rating(rating: i32) -> Result<i32> {
    if !(0..=5).contains(&rating) {
        return Err(AppError::validation("rating must be between 0 and 5"));
    }
    Ok(rating)
}

impl Services {
    pub async fn add_book(&self, user_id: Uuid, new: NewBook) -> Result<Awarded<Book>> {
        let title = required(&new.title, "title")?;
        let now = self.clock.now();
        let status = new.status.unwrap_or(BookStatus::ToRead);

        let book = Book {
            id: Uuid::now_v7(),
            user_id,
            title,
            authors: new.authors,
            description: new.description,
            page_count: non_negative(new.page_count, "page_count")?,
            current_page: non_negative(new.current_page, "current_page")?,
            status,
            rating: 0,
            cover_image: new.cover_image,
            genre: new.genre,
            isbn: new.isbn,
            added_at: now,
            finished_at: (status == BookStatus::Finished).then_some(now),
            quotes: Vec::new(),
            takeaways: Vec::new(),
        };
        self.repos.books.create_book(book.clone()).await?;

        self.ledger
            .append(
                NewLedgerEntry::new(
                    user_id,
                    ADD_BOOK_POINTS,
                    PointSource::Nook,
                    format!("Added book: {}", book.title),
                )
                .with_metadata(json!({ "book_id": book.id })),
            )
            .await?;

        Ok(Awarded::new(book, ADD_BOOK_POINTS))
    }

    /// The user's books, newest first, with per-status counts.
    pub async fn list_books(
        &self,
        user_id: Uuid,
        status: Option<BookStatus>,
        page: PageRequest,
    ) -> Result<Shelf> {
        let books = &self.repos.books;
        let (items, total) = books.list_books(user_id, status, page).await?;
        let counts = StatusCounts {
            total: books.count_books(user_id, None).await?,
            to_read: books.count_books(user_id, Some(BookStatus::ToRead)).await?,
            reading: books.count_books(user_id, Some(BookStatus::Reading)).await?,
            finished: books.count_books(user_id, Some(BookStatus::Finished)).await?,
        };
        Ok(Shelf {
            books: Paginated::new(items, page, total),
            counts,
        })
    }

    pub async fn get_book(&self, user_id: Uuid, book_id: Uuid) -> Result<Book> {
        self.repos
            .books
            .get_book(user_id, book_id)
            .await?
            .ok_or_else(|| AppError::not_found("Book", book_id))
    }

    /// Moving a book into `finished` from any other status earns the finish bonus once.
    pub async fn update_book(
        &self,
        user_id: Uuid,
        book_id: Uuid,
        update: BookUpdate,
    ) -> Result<Awarded<Book>> {
        if update.is_empty() {
            return Err(AppError::validation("no valid fields to update"));
        }
        let mut book = self.get_book(user_id, book_id).await?;
        let was_finished = book.status == BookStatus::Finished;

        if let Some(title) = update.title {
            book.title = required(&title, "title")?;
        }
        if let Some(authors) = update.authors {
            book.authors = authors;
        }
        if let Some(description) = update.description {
            book.description = description;
        }
        if let Some(page_count) = update.page_count {
            book.page_count = non_negative(page_count, "page_count")?;
        }
        if let Some(rating) = update.rating {
            book.rating = valid_rating(rating)?;
        }
        if let Some(genre) = update.genre {
            book.genre = genre;
        }
        if let Some(isbn) = update.isbn {
            book.isbn = isbn;
        }
        if let Some(status) = update.status {
            book.status = status;
        }

        let mut newly_finished = !was_finished && book.status == BookStatus::Finished;
        if newly_finished {
            let now = self.clock.now();
            newly_finished = self.repos.books.mark_finished(user_id, book_id, now).await?;
            book.finished_at = if newly_finished {
                Some(now)
            } else {
                // A concurrent writer finished it first and owns the bonus.
                self.get_book(user_id, book_id).await?.finished_at
            };
        }
        self.repos.books.update_book(book.clone()).await?;

        if !newly_finished {
            return Ok(Awarded::new(book, 0));
        }
        self.ledger
            .append(
                NewLedgerEntry::new(
                    user_id,
                    FINISH_BOOK_POINTS,
                    PointSource::Nook,
                    format!("Finished book: {}", book.title),
                )
                .with_metadata(json!({ "book_id": book.id })),
            )
            .await?;
        log::info!("user {user_id} finished book {}", book.id);
        Ok(Awarded::new(book, FINISH_BOOK_POINTS))
    }

    /// Records a reading session. Reaching the last page finishes the book without the finish bonus.
    pub async fn log_progress(
        &self,
        user_id: Uuid,
        book_id: Uuid,
        log: ProgressLog,
    ) -> Result<Awarded<ProgressUpdate>> {
        let Some(current_page) = log.current_page else {
            return Err(AppError::validation("current page is required"));
        };
        let current_page = non_negative(current_page, "current_page")?;
        let duration_minutes = non_negative(log.duration_minutes, "duration_minutes")?;
        let mut book = self.get_book(user_id, book_id).await?;
        let now = self.clock.now();

        let pages_read = (current_page - book.current_page).max(0);
        book.current_page = current_page;
        if current_page > 0 && book.status == BookStatus::ToRead {
            book.status = BookStatus::Reading;
        } else if book.page_count > 0
            && current_page >= book.page_count
            && book.status != BookStatus::Finished
        {
            book.status = BookStatus::Finished;
            book.finished_at = Some(now);
        }
        self.repos.books.update_book(book.clone()).await?;

        let session = ReadingSession {
            id: Uuid::now_v7(),
            user_id,
            book_id,
            pages_read,
            current_page,
            duration_minutes,
            notes: log.notes,
            date: now,
        };
        self.repos.books.record_session(session.clone()).await?;

        let points = policy::reading_points(i64::from(pages_read));
        if points > 0 {
            self.ledger
                .append(
                    NewLedgerEntry::new(
                        user_id,
                        points,
                        PointSource::Nook,
                        format!("Read {pages_read} pages of {}", book.title),
                    )
                    .with_metadata(json!({ "book_id": book.id, "pages_read": pages_read })),
                )
                .await?;
        }

        Ok(Awarded::new(
            ProgressUpdate {
                book,
                session,
                pages_read,
            },
            points,
        ))
    }

    pub async fn add_quote(
        &self,
        user_id: Uuid,
        book_id: Uuid,
        text: &str,
        page: &str,
        context: &str,
    ) -> Result<Awarded<BookQuote>> {
        let text = required(text, "quote text")?;
        let book = self.get_book(user_id, book_id).await?;

        let quote = BookQuote {
            text,
            page: page.trim().to_string(),
            context: context.trim().to_string(),
            added_at: self.clock.now(),
        };
        self.repos.books.add_quote(book.id, quote.clone()).await?;

        self.ledger
            .append(
                NewLedgerEntry::new(
                    user_id,
                    ADD_QUOTE_POINTS,
                    PointSource::Nook,
                    format!("Added quote from {}", book.title),
                )
                .with_metadata(json!({ "book_id": book.id })),
            )
            .await?;
        Ok(Awarded::new(quote, ADD_QUOTE_POINTS))
    }

    pub async fn add_takeaway(
        &self,
        user_id: Uuid,
        book_id: Uuid,
        takeaway: &str,
        page_reference: &str,
    ) -> Result<Awarded<Takeaway>> {
        let takeaway = required(takeaway, "takeaway")?;
        let book = self.get_book(user_id, book_id).await?;

        let takeaway = Takeaway {
            takeaway,
            page_reference: page_reference.trim().to_string(),
            added_at: self.clock.now(),
        };
        self.repos.books.add_takeaway(book.id, takeaway.clone()).await?;

        self.ledger
            .append(
                NewLedgerEntry::new(
                    user_id,
                    ADD_TAKEAWAY_POINTS,
                    PointSource::Nook,
                    format!("Added takeaway from {}", book.title),
                )
                .with_metadata(json!({ "book_id": book.id })),
            )
            .await?;
        Ok(Awarded::new(takeaway, ADD_TAKEAWAY_POINTS))
    }
}
