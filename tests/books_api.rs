use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use bookstore_app::modules::books::{
    models::{Book, BookError, BookUpdate},
    repository::{BookRepository, MissingRowPolicy},
    service::BookCatalog,
    BooksModule,
};
use bookstore_kernel::{settings::Settings, ModuleRegistry};
use serde_json::{json, Value};
use tower::ServiceExt;

#[derive(Default)]
struct InMemoryBooks {
    rows: Mutex<BTreeMap<u64, Book>>,
    next_id: Mutex<u64>,
    missing_rows: MissingRowPolicy,
}

#[async_trait]
impl BookRepository for InMemoryBooks {
    async fn create(&self, book: &Book) -> Result<u64, BookError> {
        let mut next = self.next_id.lock().unwrap();
        *next += 1;
        let mut stored = book.clone();
        stored.id = *next;
        self.rows.lock().unwrap().insert(*next, stored);
        Ok(*next)
    }

    async fn fetch_by_id(&self, id: u64) -> Result<Book, BookError> {
        self.rows
            .lock()
            .unwrap()
            .get(&id)
            .cloned()
            .ok_or(BookError::NotFound)
    }

    async fn delete(&self, id: u64) -> Result<(), BookError> {
        let removed = self.rows.lock().unwrap().remove(&id);
        self.missing_rows.check(u64::from(removed.is_some()))
    }

    async fn list(&self, limit: u64, offset: u64) -> Result<Vec<Book>, BookError> {
        let books: Vec<Book> = self
            .rows
            .lock()
            .unwrap()
            .values()
            .skip(offset as usize)
            .take(limit as usize)
            .cloned()
            .collect();
        if books.is_empty() {
            return Err(BookError::NotFound);
        }
        Ok(books)
    }

    async fn update(&self, update: &BookUpdate) -> Result<(), BookError> {
        let mut rows = self.rows.lock().unwrap();
        let Some(row) = rows.get_mut(&update.id) else {
            return self.missing_rows.check(0);
        };
        row.title = update.title.clone();
        row.author = update.author.clone();
        row.genre = update.genre.clone();
        row.updated_at = Some(update.updated_at);
        Ok(())
    }
}

fn app() -> Router {
    app_with(MissingRowPolicy::Ignore)
}

fn app_with(missing_rows: MissingRowPolicy) -> Router {
    let settings = Settings::default();
    let catalog = Arc::new(BookCatalog::new(InMemoryBooks {
        missing_rows,
        ..InMemoryBooks::default()
    }));

    let mut registry = ModuleRegistry::new();
    registry.register_custom(Arc::new(BooksModule::new(catalog, &settings.books)));

    bookstore_http::build_router(&registry, &settings)
}

struct Reply {
    status: StatusCode,
    request_id: Option<String>,
    body: Value,
}

async fn call(router: &Router, method: Method, uri: &str, body: Option<Value>) -> Reply {
    let mut request = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(value) => {
            request = request.header(header::CONTENT_TYPE, "application/json");
            Body::from(value.to_string())
        }
        None => Body::empty(),
    };

    let response = router
        .clone()
        .oneshot(request.body(body).unwrap())
        .await
        .unwrap();

    let status = response.status();
    let request_id = response
        .headers()
        .get("x-request-id")
        .map(|value| value.to_str().unwrap().to_string());
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes)
            .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
    };

    Reply {
        status,
        request_id,
        body,
    }
}

fn dune() -> Value {
    json!({"title": "Dune", "author": "Herbert", "genre": "SciFi"})
}

#[tokio::test]
async fn added_book_reads_back_unchanged() {
    let router = app();

    let created = call(&router, Method::POST, "/books/", Some(dune())).await;
    assert_eq!(created.status, StatusCode::CREATED);
    assert_eq!(created.body["id"], 1);
    assert!(created.body["created_at"].as_str().is_some());

    let fetched = call(&router, Method::GET, "/books/1", None).await;
    assert_eq!(fetched.status, StatusCode::OK);
    assert_eq!(fetched.body, dune());
}

#[tokio::test]
async fn list_returns_added_books_in_id_order() {
    let router = app();
    call(&router, Method::POST, "/books", Some(dune())).await;
    call(
        &router,
        Method::POST,
        "/books",
        Some(json!({"title": "Emma", "author": "Austen", "genre": "Novel"})),
    )
    .await;

    let listed = call(&router, Method::GET, "/books/?page=1&limit=10", None).await;
    assert_eq!(listed.status, StatusCode::OK);
    assert_eq!(
        listed.body,
        json!({"books": [
            {"title": "Dune", "author": "Herbert", "genre": "SciFi"},
            {"title": "Emma", "author": "Austen", "genre": "Novel"}
        ]})
    );

    let second_page = call(&router, Method::GET, "/books/?page=2&limit=1", None).await;
    assert_eq!(second_page.body["books"][0]["title"], "Emma");
}

#[tokio::test]
async fn update_replaces_all_fields() {
    let router = app();
    call(&router, Method::POST, "/books/", Some(dune())).await;

    let replacement = json!({"title": "Dune Messiah", "author": "Frank Herbert", "genre": "Sci-Fi"});
    let updated = call(&router, Method::PUT, "/books/1", Some(replacement.clone())).await;
    assert_eq!(updated.status, StatusCode::OK);
    assert_eq!(updated.body, Value::Null);

    let fetched = call(&router, Method::GET, "/books/1", None).await;
    assert_eq!(fetched.body, replacement);
}

#[tokio::test]
async fn deleted_book_is_gone() {
    let router = app();
    call(&router, Method::POST, "/books/", Some(dune())).await;

    let deleted = call(&router, Method::DELETE, "/books/1", None).await;
    assert_eq!(deleted.status, StatusCode::OK);

    let fetched = call(&router, Method::GET, "/books/1", None).await;
    assert_eq!(fetched.status, StatusCode::NOT_FOUND);
    assert_eq!(fetched.body, json!({"error": "nothing was found"}));
}

#[tokio::test]
async fn empty_catalog_lists_as_not_found() {
    let router = app();

    let listed = call(&router, Method::GET, "/books/", None).await;
    assert_eq!(listed.status, StatusCode::NOT_FOUND);
    assert_eq!(listed.body, json!({"error": "nothing was found"}));
}

#[tokio::test]
async fn malformed_input_is_a_bad_request() {
    let router = app();

    for (method, uri, body, message) in [
        (Method::GET, "/books/abc", None, "book id is invalid"),
        (Method::GET, "/books/%FF", None, "book id is invalid"),
        (Method::DELETE, "/books/-1", None, "book id is invalid"),
        (Method::PUT, "/books/x1", Some(dune()), "book id is invalid"),
        (Method::GET, "/books/?page=abc", None, "page number is invalid"),
        (Method::GET, "/books/?limit=-3", None, "limit number is invalid"),
        (
            Method::POST,
            "/books/",
            Some(json!({"title": "Dune"})),
            "Invalid request body",
        ),
    ] {
        let reply = call(&router, method.clone(), uri, body).await;
        assert_eq!(reply.status, StatusCode::BAD_REQUEST, "{method} {uri}");
        assert_eq!(reply.body, json!({ "error": message }), "{method} {uri}");
    }
}

#[tokio::test]
async fn every_response_carries_a_request_id() {
    let router = app();

    let ok = call(&router, Method::GET, "/healthz", None).await;
    let missing = call(&router, Method::GET, "/books/7", None).await;

    assert_eq!(ok.body, Value::String("ok".to_string()));
    assert!(ok.request_id.is_some());
    assert!(missing.request_id.is_some());
    assert_ne!(ok.request_id, missing.request_id);
}

#[tokio::test]
async fn openapi_document_lists_book_routes() {
    let router = app();

    let docs = call(&router, Method::GET, "/docs/openapi.json", None).await;
    assert_eq!(docs.status, StatusCode::OK);
    assert!(docs.body["paths"]["/books/{id}"]["put"].is_object());
    assert!(docs.body["components"]["schemas"]["ErrorResponse"].is_object());
}

#[tokio::test]
async fn missing_ids_succeed_silently_by_default() {
    let router = app();

    let deleted = call(&router, Method::DELETE, "/books/42", None).await;
    let updated = call(&router, Method::PUT, "/books/42", Some(dune())).await;

    assert_eq!(deleted.status, StatusCode::OK);
    assert_eq!(updated.status, StatusCode::OK);
}

#[tokio::test]
async fn missing_ids_are_not_found_when_reported() {
    let router = app_with(MissingRowPolicy::Report);

    let deleted = call(&router, Method::DELETE, "/books/42", None).await;
    assert_eq!(deleted.status, StatusCode::NOT_FOUND);
    assert_eq!(deleted.body, json!({"error": "nothing was found"}));

    let updated = call(&router, Method::PUT, "/books/42", Some(dune())).await;
    assert_eq!(updated.status, StatusCode::NOT_FOUND);
    assert_eq!(updated.body, json!({"error": "nothing was found"}));

    call(&router, Method::POST, "/books/", Some(dune())).await;
    let existing = call(&router, Method::DELETE, "/books/1", None).await;
    assert_eq!(existing.status, StatusCode::OK);
}

#[tokio::test]
async fn repeated_query_keys_keep_the_first_value() {
    let router = app();
    call(&router, Method::POST, "/books/", Some(dune())).await;

    let listed = call(&router, Method::GET, "/books/?page=1&page=2", None).await;
    assert_eq!(listed.status, StatusCode::OK);
    assert_eq!(listed.body["books"][0]["title"], "Dune");
}
