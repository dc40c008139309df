use axum::{routing::get, Router};

use super::handlers::{self, BooksState};

/// Static route table for `/books`. The collection answers with and without
/// the trailing slash.
pub fn router(state: BooksState) -> Router {
    Router::new()
        .route(
            "/books/",
            get(handlers::list_books).post(handlers::add_book),
        )
        .route(
            "/books",
            get(handlers::list_books).post(handlers::add_book),
        )
        .route(
            "/books/{id}",
            get(handlers::get_book)
                .put(handlers::update_book)
                .delete(handlers::delete_book),
        )
        .with_state(state)
}
