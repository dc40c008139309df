use thiserror::Error;
use time::OffsetDateTime;

/// A row of the `books` table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Book {
    /// Store-assigned; zero until the row is inserted.
    pub id: u64,
    pub title: String,
    pub author: String,
    pub genre: String,
    /// Set once on create.
    pub created_at: OffsetDateTime,
    /// Set by every update; `None` until the first one.
    pub updated_at: Option<OffsetDateTime>,
}

/// Wholesale replacement of a book's mutable columns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookUpdate {
    pub id: u64,
    pub title: String,
    pub author: String,
    pub genre: String,
    pub updated_at: OffsetDateTime,
}

/// Coarse classification used to pick a response status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidInput,
    NotFound,
    Unknown,
}

#[derive(Debug, Error)]
pub enum BookError {
    #[error("book id is invalid")]
    InvalidId,

    #[error("page number is invalid")]
    InvalidPage,

    #[error("limit number is invalid")]
    InvalidLimit,

    #[error("Invalid request body")]
    InvalidBody { reason: String },

    #[error("nothing was found")]
    NotFound,

    #[error("deadline of {timeout_ms}ms exceeded")]
    DeadlineExceeded { timeout_ms: u64 },

    #[error("database error: {0}")]
    Database(#[source] sqlx::Error),
}

impl BookError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            BookError::InvalidId
            | BookError::InvalidPage
            | BookError::InvalidLimit
            | BookError::InvalidBody { .. } => ErrorKind::InvalidInput,
            BookError::NotFound => ErrorKind::NotFound,
            BookError::DeadlineExceeded { .. } | BookError::Database(_) => ErrorKind::Unknown,
        }
    }
}

/// Zero matching rows is the one store failure with a domain meaning.
impl From<sqlx::Error> for BookError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => BookError::NotFound,
            other => BookError::Database(other),
        }
    }
}
