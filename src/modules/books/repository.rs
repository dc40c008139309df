//! Persistence gateway for the `books` table.

use std::sync::Arc;

use async_trait::async_trait;
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;

use super::models::{Book, BookError, BookUpdate};

/// What delete and update report when the id matches no row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MissingRowPolicy {
    /// Report success; the statement simply affected nothing.
    #[default]
    Ignore,
    /// Report `BookError::NotFound`.
    Report,
}

impl MissingRowPolicy {
    pub fn from_flag(report_missing_rows: bool) -> Self {
        if report_missing_rows {
            MissingRowPolicy::Report
        } else {
            MissingRowPolicy::Ignore
        }
    }

    /// Outcome of a delete or update that touched `rows_affected` rows.
    pub fn check(self, rows_affected: u64) -> Result<(), BookError> {
        match (self, rows_affected) {
            (MissingRowPolicy::Report, 0) => Err(BookError::NotFound),
            _ => Ok(()),
        }
    }
}

#[async_trait]
pub trait BookRepository: Send + Sync {
    /// Insert a book and return the id the store assigned.
    async fn create(&self, book: &Book) -> Result<u64, BookError>;

    async fn fetch_by_id(&self, id: u64) -> Result<Book, BookError>;

    async fn delete(&self, id: u64) -> Result<(), BookError>;

    /// One page in ascending id order; `NotFound` when the page is empty.
    async fn list(&self, limit: u64, offset: u64) -> Result<Vec<Book>, BookError>;

    /// Replace title, author, genre and `updated_at` of the row `update.id`.
    async fn update(&self, update: &BookUpdate) -> Result<(), BookError>;
}

#[async_trait]
impl<T: BookRepository + ?Sized> BookRepository for Arc<T> {
    async fn create(&self, book: &Book) -> Result<u64, BookError> {
        (**self).create(book).await
    }

    async fn fetch_by_id(&self, id: u64) -> Result<Book, BookError> {
        (**self).fetch_by_id(id).await
    }

    async fn delete(&self, id: u64) -> Result<(), BookError> {
        (**self).delete(id).await
    }

    async fn list(&self, limit: u64, offset: u64) -> Result<Vec<Book>, BookError> {
        (**self).list(limit, offset).await
    }

    async fn update(&self, update: &BookUpdate) -> Result<(), BookError> {
        (**self).update(update).await
    }
}

const INSERT_BOOK: &str = "INSERT INTO books (title, author, genre, created_at) \
     VALUES ($1, $2, $3, $4) RETURNING id";

const SELECT_BOOK: &str = "SELECT id, title, author, genre, created_at, updated_at \
     FROM books WHERE id = $1";

const SELECT_PAGE: &str = "SELECT id, title, author, genre, created_at, updated_at \
     FROM books ORDER BY id ASC LIMIT $1 OFFSET $2";

const DELETE_BOOK: &str = "DELETE FROM books WHERE id = $1";

const UPDATE_BOOK: &str = "UPDATE books SET title = $1, author = $2, genre = $3, updated_at = $4 \
     WHERE id = $5";

#[derive(Debug, FromRow)]
struct BookRow {
    id: i64,
    title: String,
    author: String,
    genre: String,
    created_at: OffsetDateTime,
    updated_at: Option<OffsetDateTime>,
}

impl From<BookRow> for Book {
    fn from(row: BookRow) -> Self {
        Self {
            // BIGSERIAL never yields a negative id.
            id: row.id as u64,
            title: row.title,
            author: row.author,
            genre: row.genre,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Ids past `i64::MAX` cannot name a `BIGSERIAL` row.
fn row_id(id: u64) -> Result<i64, BookError> {
    i64::try_from(id).map_err(|_| BookError::NotFound)
}

/// Postgres counts are signed; anything larger is as good as unbounded.
fn clamp(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

/// `BookRepository` over the process-wide Postgres pool.
#[derive(Debug, Clone)]
pub struct PgBookRepository {
    pool: PgPool,
    missing_rows: MissingRowPolicy,
}

impl PgBookRepository {
    pub fn new(pool: PgPool, missing_rows: MissingRowPolicy) -> Self {
        Self { pool, missing_rows }
    }
}

#[async_trait]
impl BookRepository for PgBookRepository {
    async fn create(&self, book: &Book) -> Result<u64, BookError> {
        let id: i64 = sqlx::query_scalar(INSERT_BOOK)
            .bind(&book.title)
            .bind(&book.author)
            .bind(&book.genre)
            .bind(book.created_at)
            .fetch_one(&self.pool)
            .await
            .map_err(BookError::Database)?;

        Ok(id as u64)
    }

    async fn fetch_by_id(&self, id: u64) -> Result<Book, BookError> {
        let row: BookRow = sqlx::query_as(SELECT_BOOK)
            .bind(row_id(id)?)
            .fetch_one(&self.pool)
            .await?;

        Ok(row.into())
    }

    async fn delete(&self, id: u64) -> Result<(), BookError> {
        let id = match row_id(id) {
            Ok(id) => id,
            Err(_) => return self.missing_rows.check(0),
        };

        let result = sqlx::query(DELETE_BOOK)
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(BookError::Database)?;

        self.missing_rows.check(result.rows_affected())
    }

    async fn list(&self, limit: u64, offset: u64) -> Result<Vec<Book>, BookError> {
        let rows: Vec<BookRow> = sqlx::query_as(SELECT_PAGE)
            .bind(clamp(limit))
            .bind(clamp(offset))
            .fetch_all(&self.pool)
            .await
            .map_err(BookError::Database)?;

        if rows.is_empty() {
            return Err(BookError::NotFound);
        }

        Ok(rows.into_iter().map(Book::from).collect())
    }

    async fn update(&self, update: &BookUpdate) -> Result<(), BookError> {
        let id = match row_id(update.id) {
            Ok(id) => id,
            Err(_) => return self.missing_rows.check(0),
        };

        let result = sqlx::query(UPDATE_BOOK)
            .bind(&update.title)
            .bind(&update.author)
            .bind(&update.genre)
            .bind(update.updated_at)
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(BookError::Database)?;

        self.missing_rows.check(result.rows_affected())
    }
}
