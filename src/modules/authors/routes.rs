use std::sync::Arc;

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query, State,
    },
    routing::get,
    Json, Router,
};
use catalog_http::{AppError, Created, Envelope, PageQuery};
use catalog_kernel::Page;

use super::{
    models::{Author, AuthorId, AuthorPayload},
    service::AuthorService,
};

pub const DELETED_MESSAGE: &str = "Author was deleted or not exists";

pub fn router(service: Arc<AuthorService>) -> Router {
    Router::new()
        .route("/", get(list_authors).post(create_author))
        .route("/health", get(health_check))
        .route(
            "/{id}",
            get(get_author).put(update_author).delete(delete_author),
        )
        .with_state(service)
}

async fn health_check() -> &'static str {
    "authors module is healthy"
}

async fn list_authors(
    State(service): State<Arc<AuthorService>>,
    query: Result<Query<PageQuery>, QueryRejection>,
) -> Result<Json<Page<Author>>, AppError> {
    let Query(query) = query?;
    let page = service.list(query.page_request()?).await?;
    Ok(Json(page))
}

async fn get_author(
    State(service): State<Arc<AuthorService>>,
    id: Result<Path<i64>, PathRejection>,
) -> Result<Envelope<Author>, AppError> {
    let Path(id) = id?;
    let author = service.find(AuthorId::new(id)).await?;
    Ok(Envelope::body(author))
}

async fn create_author(
    State(service): State<Arc<AuthorService>>,
    payload: Result<Json<AuthorPayload>, JsonRejection>,
) -> Result<Created<Author>, AppError> {
    let Json(payload) = payload?;
    let author = service.create(payload.validate()?).await?;
    Ok(Created(author))
}

async fn update_author(
    State(service): State<Arc<AuthorService>>,
    id: Result<Path<i64>, PathRejection>,
    payload: Result<Json<AuthorPayload>, JsonRejection>,
) -> Result<Envelope<Author>, AppError> {
    let Path(id) = id?;
    let Json(payload) = payload?;
    let author = service
        .update(AuthorId::new(id), payload.validate()?)
        .await?;
    Ok(Envelope::body(author))
}

async fn delete_author(
    State(service): State<Arc<AuthorService>>,
    id: Result<Path<i64>, PathRejection>,
) -> Result<Envelope<()>, AppError> {
    let Path(id) = id?;
    service.delete(AuthorId::new(id)).await?;
    Ok(Envelope::message(DELETED_MESSAGE))
}
