pub mod dto;
pub mod handlers;
pub mod models;
pub mod repository;
pub mod routes;
pub mod service;

use std::sync::Arc;

use async_trait::async_trait;
use axum::Router;
use bookstore_kernel::{settings::BooksSettings, InitCtx, Migration, Module};
use serde_json::json;
use sqlx::PgPool;

use handlers::BooksState;
use repository::{MissingRowPolicy, PgBookRepository};
use service::{BookCatalog, BookService};

/// Schema owned by the books module.
pub const MIGRATIONS: &[Migration] = &[Migration {
    id: "001_create_books",
    up: r#"
        CREATE TABLE IF NOT EXISTS books (
            id         BIGSERIAL PRIMARY KEY,
            title      TEXT NOT NULL,
            author     TEXT NOT NULL,
            genre      TEXT NOT NULL,
            created_at TIMESTAMPTZ NOT NULL,
            updated_at TIMESTAMPTZ
        );
        "#,
}];

/// CRUD over the `books` table at `/books`.
pub struct BooksModule {
    state: BooksState,
}

impl BooksModule {
    pub fn new(service: Arc<dyn BookService>, settings: &BooksSettings) -> Self {
        Self {
            state: BooksState::new(service, settings.request_timeout()),
        }
    }
}

#[async_trait]
impl Module for BooksModule {
    fn name(&self) -> &'static str {
        "books"
    }

    async fn init(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(
            module = self.name(),
            environment = ?ctx.settings.environment,
            request_timeout_ms = ctx.settings.books.request_timeout_ms,
            report_missing_rows = ctx.settings.books.report_missing_rows,
            "books module initialized"
        );
        Ok(())
    }

    fn routes(&self) -> Router {
        routes::router(self.state.clone())
    }

    fn openapi(&self) -> Option<serde_json::Value> {
        Some(openapi_fragment())
    }

    fn migrations(&self) -> Vec<Migration> {
        MIGRATIONS.to_vec()
    }

    async fn stop(&self) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "books module stopped");
        Ok(())
    }
}

fn error_response(description: &str) -> serde_json::Value {
    json!({
        "description": description,
        "content": {
            "application/json": {
                "schema": { "$ref": "#/components/schemas/ErrorResponse" }
            }
        }
    })
}

fn json_response(description: &str, schema: &str) -> serde_json::Value {
    json!({
        "description": description,
        "content": {
            "application/json": {
                "schema": { "$ref": format!("#/components/schemas/{schema}") }
            }
        }
    })
}

fn openapi_fragment() -> serde_json::Value {
    let book_body = json!({
        "required": true,
        "content": {
            "application/json": {
                "schema": { "$ref": "#/components/schemas/Book" }
            }
        }
    });
    let id_param = json!({
        "name": "id", "in": "path", "required": true, "schema": { "type": "string" }
    });
    let text_field = json!({ "type": "string", "minLength": 1, "maxLength": dto::MAX_FIELD_CHARS });

    json!({
        "paths": {
            "/books/": {
                "post": {
                    "summary": "Adds a new book",
                    "tags": ["books"],
                    "requestBody": book_body.clone(),
                    "responses": {
                        "201": json_response("Book created", "AddBookResponse"),
                        "400": error_response("Invalid request body"),
                        "500": error_response("Unknown error occurred while adding the book")
                    }
                },
                "get": {
                    "summary": "Lists the books",
                    "tags": ["books"],
                    "parameters": [
                        { "name": "page", "in": "query", "required": false, "schema": { "type": "string" } },
                        { "name": "limit", "in": "query", "required": false, "schema": { "type": "string" } }
                    ],
                    "responses": {
                        "200": json_response("One page of books", "ListBooksResponse"),
                        "400": error_response("page number is invalid / limit number is invalid"),
                        "404": error_response("nothing was found"),
                        "500": error_response("Unknown error occurred while listing the books")
                    }
                }
            },
            "/books/{id}": {
                "get": {
                    "summary": "Returns the book",
                    "tags": ["books"],
                    "parameters": [id_param.clone()],
                    "responses": {
                        "200": json_response("The book", "Book"),
                        "400": error_response("book id is invalid"),
                        "404": error_response("nothing was found"),
                        "500": error_response("Unknown error occurred while getting the book")
                    }
                },
                "put": {
                    "summary": "Updates the book",
                    "tags": ["books"],
                    "parameters": [id_param.clone()],
                    "requestBody": book_body,
                    "responses": {
                        "200": { "description": "Book updated" },
                        "400": error_response("Invalid request body / book id is invalid"),
                        "404": error_response("nothing was found"),
                        "500": error_response("Unknown error occurred while updating the book")
                    }
                },
                "delete": {
                    "summary": "Deletes the book",
                    "tags": ["books"],
                    "parameters": [id_param],
                    "responses": {
                        "200": { "description": "Book deleted" },
                        "400": error_response("book id is invalid"),
                        "404": error_response("nothing was found"),
                        "500": error_response("Unknown error occurred while deleting the book")
                    }
                }
            }
        },
        "components": {
            "schemas": {
                "Book": {
                    "type": "object",
                    "properties": {
                        "title": text_field.clone(),
                        "author": text_field.clone(),
                        "genre": text_field
                    },
                    "required": ["title", "author", "genre"]
                },
                "AddBookResponse": {
                    "type": "object",
                    "properties": {
                        "id": { "type": "integer", "format": "int64", "minimum": 1 },
                        "created_at": { "type": "string", "format": "date-time" }
                    },
                    "required": ["id", "created_at"]
                },
                "ListBooksResponse": {
                    "type": "object",
                    "properties": {
                        "books": { "type": "array", "items": { "$ref": "#/components/schemas/Book" } }
                    },
                    "required": ["books"]
                }
            }
        }
    })
}

/// Wire the books stack onto the shared pool.
pub fn create_module(pool: PgPool, settings: &BooksSettings) -> Arc<dyn Module> {
    let repository = PgBookRepository::new(
        pool,
        MissingRowPolicy::from_flag(settings.report_missing_rows),
    );
    let service: Arc<dyn BookService> = Arc::new(BookCatalog::new(repository));

    Arc::new(BooksModule::new(service, settings))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn migration_creates_books_table() {
        assert_eq!(MIGRATIONS.len(), 1);
        assert_eq!(MIGRATIONS[0].id, "001_create_books");
        assert!(MIGRATIONS[0].up.contains("CREATE TABLE IF NOT EXISTS books"));
    }

    #[test]
    fn openapi_documents_every_route() {
        let fragment = openapi_fragment();

        for (path, verb) in [
            ("/books/", "post"),
            ("/books/", "get"),
            ("/books/{id}", "get"),
            ("/books/{id}", "put"),
            ("/books/{id}", "delete"),
        ] {
            assert!(
                fragment["paths"][path][verb].is_object(),
                "{verb} {path} is undocumented"
            );
        }
        assert_eq!(
            fragment["components"]["schemas"]["Book"]["properties"]["title"]["maxLength"],
            100
        );
    }
}
