//! Request and response bodies for the books endpoints.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use super::models::{Book, BookError};

/// Upper bound on `title`, `author` and `genre`, in characters.
pub const MAX_FIELD_CHARS: usize = 100;

/// The transport shape of a book: body of create/update, result of reads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookPayload {
    pub title: String,
    pub author: String,
    pub genre: String,
}

impl BookPayload {
    pub fn new(
        title: impl Into<String>,
        author: impl Into<String>,
        genre: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            author: author.into(),
            genre: genre.into(),
        }
    }

    /// Every field must hold 1 to `MAX_FIELD_CHARS` characters.
    pub fn validate(&self) -> Result<(), BookError> {
        for (field, value) in [
            ("title", &self.title),
            ("author", &self.author),
            ("genre", &self.genre),
        ] {
            let chars = value.chars().count();
            if chars == 0 {
                return Err(BookError::InvalidBody {
                    reason: format!("{field} is required"),
                });
            }
            if chars > MAX_FIELD_CHARS {
                return Err(BookError::InvalidBody {
                    reason: format!("{field} must be at most {MAX_FIELD_CHARS} characters"),
                });
            }
        }
        Ok(())
    }
}

impl From<Book> for BookPayload {
    fn from(book: Book) -> Self {
        Self {
            title: book.title,
            author: book.author,
            genre: book.genre,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddBookResponse {
    pub id: u64,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListBooksResponse {
    pub books: Vec<BookPayload>,
}
