use std::{fmt::Debug, sync::Arc};

use async_trait::async_trait;
use catalog_kernel::{CatalogResult, Page, PageRequest};

use super::{
    models::{Book, BookId, NewBook},
    search::SearchFilter,
};
use crate::modules::authors::models::AuthorId;

/// Persistence operations for books and their authorships.
///
/// Each method is one unit of work: it commits completely or not at all.
/// Returned books always carry their materialized authors.
#[async_trait]
pub trait BookRepository: Debug + Send + Sync {
    async fn find_by_id(&self, id: BookId) -> CatalogResult<Option<Book>>;

    /// Stores the book and one join row per author.
    ///
    /// Unknown authors fail with `IntegrityViolation(Authors)`, a taken ISBN
    /// with `IntegrityViolation(Isbn)`.
    async fn insert(&self, book: NewBook) -> CatalogResult<Book>;

    /// Overwrites the book's fields and reconciles its join rows with
    /// `book.author_ids`.
    ///
    /// The stored authors are read inside the same unit of work as the write,
    /// so concurrent updates of one book resolve as last writer wins. A missing
    /// book fails with `EntityNotFound`.
    async fn update(&self, id: BookId, book: NewBook) -> CatalogResult<Book>;

    /// Removes the book and its join rows; absent ids are not an error.
    async fn delete_by_id(&self, id: BookId) -> CatalogResult<()>;

    /// Books matching `filter`, ordered by title then id.
    async fn search(&self, filter: &SearchFilter, request: PageRequest) -> CatalogResult<Page<Book>>;

    /// Books written by `author_id`, ordered by title then id.
    async fn find_by_author(
        &self,
        author_id: AuthorId,
        request: PageRequest,
    ) -> CatalogResult<Page<Book>>;
}

pub type BookRepositoryArc = Arc<dyn BookRepository>;
