use std::sync::Arc;

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query, State,
    },
    routing::{get, post},
    Json, Router,
};
use catalog_http::{query::page_request, AppError, Created, Envelope, PageQuery};
use catalog_kernel::Page;

use super::{
    models::{Book, BookId, BookPayload},
    search::SearchQuery,
    service::BookService,
};
use crate::modules::authors::models::AuthorId;

pub const DELETED_MESSAGE: &str = "Book was deleted or not exists";

pub fn router(service: Arc<BookService>) -> Router {
    Router::new()
        .route("/", post(create_book))
        .route("/health", get(health_check))
        .route("/search", get(search_books))
        .route("/by-author/{author_id}", get(books_by_author))
        .route("/{id}", get(get_book).put(update_book).delete(delete_book))
        .with_state(service)
}

async fn health_check() -> &'static str {
    "books module is healthy"
}

async fn search_books(
    State(service): State<Arc<BookService>>,
    query: Result<Query<SearchQuery>, QueryRejection>,
) -> Result<Json<Page<Book>>, AppError> {
    let Query(query) = query?;
    let request = page_request(query.page, query.size)?;
    let page = service.search(&query.filter(), request).await?;
    Ok(Json(page))
}

async fn books_by_author(
    State(service): State<Arc<BookService>>,
    author_id: Result<Path<i64>, PathRejection>,
    query: Result<Query<PageQuery>, QueryRejection>,
) -> Result<Json<Page<Book>>, AppError> {
    let Path(author_id) = author_id?;
    let Query(query) = query?;
    let page = service
        .find_by_author(AuthorId::new(author_id), query.page_request()?)
        .await?;
    Ok(Json(page))
}

async fn get_book(
    State(service): State<Arc<BookService>>,
    id: Result<Path<i64>, PathRejection>,
) -> Result<Envelope<Book>, AppError> {
    let Path(id) = id?;
    Ok(Envelope::body(service.find(BookId::new(id)).await?))
}

async fn create_book(
    State(service): State<Arc<BookService>>,
    payload: Result<Json<BookPayload>, JsonRejection>,
) -> Result<Created<Book>, AppError> {
    let Json(payload) = payload?;
    let book = service.create(payload.validate()?).await?;
    Ok(Created(book))
}

async fn update_book(
    State(service): State<Arc<BookService>>,
    id: Result<Path<i64>, PathRejection>,
    payload: Result<Json<BookPayload>, JsonRejection>,
) -> Result<Envelope<Book>, AppError> {
    let Path(id) = id?;
    let Json(payload) = payload?;
    let book = service.update(BookId::new(id), payload.validate()?).await?;
    Ok(Envelope::body(book))
}

async fn delete_book(
    State(service): State<Arc<BookService>>,
    id: Result<Path<i64>, PathRejection>,
) -> Result<Envelope<()>, AppError> {
    let Path(id) = id?;
    service.delete(BookId::new(id)).await?;
    Ok(Envelope::message(DELETED_MESSAGE))
}
