//! HTTP handlers: bind the request, call the service under a deadline, map
//! the outcome to a status code.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    Json,
};
use bookstore_http::error::AppError;

use super::dto::{AddBookResponse, BookPayload, ListBooksResponse};
use super::models::{BookError, ErrorKind};
use super::service::BookService;

/// Shared by every books handler.
#[derive(Clone)]
pub struct BooksState {
    service: Arc<dyn BookService>,
    deadline: Duration,
}

impl BooksState {
    pub fn new(service: Arc<dyn BookService>, deadline: Duration) -> Self {
        Self { service, deadline }
    }

    /// The deadline starts here, whatever budget the inbound request has left.
    async fn within_deadline<T>(
        &self,
        call: impl Future<Output = Result<T, BookError>>,
    ) -> Result<T, BookError> {
        tokio::time::timeout(self.deadline, call)
            .await
            .map_err(|_| BookError::DeadlineExceeded {
                timeout_ms: self.deadline.as_millis() as u64,
            })?
    }
}

/// Raw `page` and `limit` values. A repeated key keeps its first value.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct ListParams {
    page: String,
    limit: String,
}

impl ListParams {
    fn from_pairs(pairs: Vec<(String, String)>) -> Self {
        let mut page = None;
        let mut limit = None;
        for (key, value) in pairs {
            match key.as_str() {
                "page" if page.is_none() => page = Some(value),
                "limit" if limit.is_none() => limit = Some(value),
                _ => {}
            }
        }

        Self {
            page: page.unwrap_or_default(),
            limit: limit.unwrap_or_default(),
        }
    }
}

/// `action` completes "Unknown error occurred while ..." for 500 responses.
fn to_app_error(err: BookError, action: &str) -> AppError {
    match err.kind() {
        ErrorKind::InvalidInput => AppError::bad_request(err.to_string()),
        ErrorKind::NotFound => AppError::not_found(err.to_string()),
        ErrorKind::Unknown => {
            AppError::internal(format!("Unknown error occurred while {action}"), err)
        }
    }
}

fn path_id(path: Result<Path<String>, PathRejection>) -> Result<String, AppError> {
    let Path(book_id) = path.map_err(|rejection| {
        tracing::warn!(reason = %rejection.body_text(), "invalid book id");
        AppError::bad_request(BookError::InvalidId.to_string())
    })?;
    Ok(book_id)
}

fn list_params(
    query: Result<Query<Vec<(String, String)>>, QueryRejection>,
) -> Result<ListParams, AppError> {
    let Query(pairs) = query.map_err(|rejection| {
        tracing::warn!(reason = %rejection.body_text(), "invalid list query");
        AppError::bad_request(BookError::InvalidPage.to_string())
    })?;
    Ok(ListParams::from_pairs(pairs))
}

fn bind(body: Result<Json<BookPayload>, JsonRejection>) -> Result<BookPayload, AppError> {
    let invalid = |reason: String| {
        tracing::warn!(%reason, "invalid request body");
        AppError::bad_request(BookError::InvalidBody { reason }.to_string())
    };

    let Json(book) = body.map_err(|rejection| invalid(rejection.body_text()))?;
    match book.validate() {
        Ok(()) => Ok(book),
        Err(BookError::InvalidBody { reason }) => Err(invalid(reason)),
        Err(other) => Err(to_app_error(other, "validating the book")),
    }
}

pub async fn add_book(
    State(state): State<BooksState>,
    body: Result<Json<BookPayload>, JsonRejection>,
) -> Result<(StatusCode, Json<AddBookResponse>), AppError> {
    let book = bind(body)?;

    let created = state
        .within_deadline(state.service.add_book(book))
        .await
        .map_err(|err| to_app_error(err, "adding the book"))?;

    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn list_books(
    State(state): State<BooksState>,
    query: Result<Query<Vec<(String, String)>>, QueryRejection>,
) -> Result<Json<ListBooksResponse>, AppError> {
    let params = list_params(query)?;

    let books = state
        .within_deadline(state.service.list_books(&params.page, &params.limit))
        .await
        .map_err(|err| to_app_error(err, "listing the books"))?;

    Ok(Json(books))
}

pub async fn get_book(
    State(state): State<BooksState>,
    path: Result<Path<String>, PathRejection>,
) -> Result<Json<BookPayload>, AppError> {
    let book_id = path_id(path)?;
    let book = state
        .within_deadline(state.service.get_book(&book_id))
        .await
        .map_err(|err| to_app_error(err, "getting the book"))?;

    Ok(Json(book))
}

pub async fn update_book(
    State(state): State<BooksState>,
    path: Result<Path<String>, PathRejection>,
    body: Result<Json<BookPayload>, JsonRejection>,
) -> Result<StatusCode, AppError> {
    let book_id = path_id(path)?;
    let book = bind(body)?;

    state
        .within_deadline(state.service.update_book(&book_id, book))
        .await
        .map_err(|err| to_app_error(err, "updating the book"))?;

    Ok(StatusCode::OK)
}

pub async fn delete_book(
    State(state): State<BooksState>,
    path: Result<Path<String>, PathRejection>,
) -> Result<StatusCode, AppError> {
    let book_id = path_id(path)?;
    state
        .within_deadline(state.service.delete_book(&book_id))
        .await
        .map_err(|err| to_app_error(err, "deleting the book"))?;

    Ok(StatusCode::OK)
}
