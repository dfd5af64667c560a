use std::{fmt::Debug, sync::Arc};

use async_trait::async_trait;
use catalog_kernel::{CatalogResult, Page, PageRequest};

use super::models::{Author, AuthorId, NewAuthor};

/// Persistence operations for authors. Every method is one unit of work.
#[async_trait]
pub trait AuthorRepository: Debug + Send + Sync {
    async fn find_by_id(&self, id: AuthorId) -> CatalogResult<Option<Author>>;

    async fn insert(&self, author: NewAuthor) -> CatalogResult<Author>;

    /// Overwrites the mutable fields of an existing author.
    ///
    /// Fails with `EntityNotFound` if the row vanished since it was read.
    async fn update(&self, author: &Author) -> CatalogResult<Author>;

    /// Removes the author and its authorships; absent ids are not an error.
    async fn delete_by_id(&self, id: AuthorId) -> CatalogResult<()>;

    /// One page of authors ordered by name, then id.
    async fn find_all(&self, request: PageRequest) -> CatalogResult<Page<Author>>;
}

pub type AuthorRepositoryArc = Arc<dyn AuthorRepository>;
