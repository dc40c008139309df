//! Business rules between the handlers and the persistence gateway.

use async_trait::async_trait;
use time::OffsetDateTime;

use super::dto::{AddBookResponse, BookPayload, ListBooksResponse};
use super::models::{Book, BookError, BookUpdate};
use super::repository::BookRepository;

pub const DEFAULT_PAGE: u64 = 1;
pub const DEFAULT_LIMIT: u64 = 10;

/// Operations the HTTP handlers call; ids and paging values arrive raw.
#[async_trait]
pub trait BookService: Send + Sync {
    async fn add_book(&self, book: BookPayload) -> Result<AddBookResponse, BookError>;

    async fn delete_book(&self, book_id: &str) -> Result<(), BookError>;

    async fn get_book(&self, book_id: &str) -> Result<BookPayload, BookError>;

    async fn update_book(&self, book_id: &str, book: BookPayload) -> Result<(), BookError>;

    /// Empty `page` or `limit` means "use the default".
    async fn list_books(&self, page: &str, limit: &str) -> Result<ListBooksResponse, BookError>;
}

/// Decimal digits only; no sign, no whitespace.
fn parse_unsigned(raw: &str) -> Option<u64> {
    if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    raw.parse().ok()
}

fn parse_id(raw: &str) -> Result<u64, BookError> {
    parse_unsigned(raw).ok_or(BookError::InvalidId)
}

/// Now, truncated to the microsecond precision of `TIMESTAMPTZ`.
fn now_micros() -> OffsetDateTime {
    let now = OffsetDateTime::now_utc();
    now.replace_nanosecond(now.nanosecond() / 1_000 * 1_000)
        .unwrap_or(now)
}

/// Resolved `LIMIT`/`OFFSET` for one page of results.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    pub limit: u64,
    pub offset: u64,
}

impl Window {
    /// Unset or zero page is page 1; unset or zero limit is `DEFAULT_LIMIT`.
    pub fn from_query(page: &str, limit: &str) -> Result<Self, BookError> {
        let page = match page {
            "" => 0,
            raw => parse_unsigned(raw).ok_or(BookError::InvalidPage)?,
        };
        let limit = match limit {
            "" => 0,
            raw => parse_unsigned(raw).ok_or(BookError::InvalidLimit)?,
        };

        let page = page.max(DEFAULT_PAGE);
        let limit = if limit == 0 { DEFAULT_LIMIT } else { limit };

        Ok(Self {
            limit,
            offset: (page - 1).saturating_mul(limit),
        })
    }
}

/// `BookService` backed by any `BookRepository`.
pub struct BookCatalog<R> {
    repo: R,
}

impl<R: BookRepository> BookCatalog<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }
}

#[async_trait]
impl<R: BookRepository> BookService for BookCatalog<R> {
    async fn add_book(&self, book: BookPayload) -> Result<AddBookResponse, BookError> {
        let created_at = now_micros();

        let id = self
            .repo
            .create(&Book {
                id: 0,
                title: book.title,
                author: book.author,
                genre: book.genre,
                created_at,
                updated_at: None,
            })
            .await?;

        tracing::debug!(book_id = id, "book created");
        Ok(AddBookResponse { id, created_at })
    }

    async fn delete_book(&self, book_id: &str) -> Result<(), BookError> {
        let id = parse_id(book_id)?;
        self.repo.delete(id).await
    }

    async fn get_book(&self, book_id: &str) -> Result<BookPayload, BookError> {
        let id = parse_id(book_id)?;
        let book = self.repo.fetch_by_id(id).await?;
        Ok(book.into())
    }

    async fn update_book(&self, book_id: &str, book: BookPayload) -> Result<(), BookError> {
        let id = parse_id(book_id)?;

        self.repo
            .update(&BookUpdate {
                id,
                title: book.title,
                author: book.author,
                genre: book.genre,
                updated_at: now_micros(),
            })
            .await
    }

    async fn list_books(&self, page: &str, limit: &str) -> Result<ListBooksResponse, BookError> {
        let window = Window::from_query(page, limit)?;

        let books = self.repo.list(window.limit, window.offset).await?;

        Ok(ListBooksResponse {
            books: books.into_iter().map(BookPayload::from).collect(),
        })
    }
}
