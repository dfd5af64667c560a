use catalog_kernel::{ensure_found, CatalogError, CatalogResult, Criteria, EntityKind, Page, PageRequest};

use super::{
    models::{Author, AuthorId, NewAuthor},
    repository::AuthorRepositoryArc,
};

#[derive(Debug, Clone)]
pub struct AuthorService {
    repository: AuthorRepositoryArc,
}

impl AuthorService {
    pub fn new(repository: AuthorRepositoryArc) -> Self {
        Self { repository }
    }

    #[tracing::instrument(skip(self), err(level = "debug"))]
    pub async fn list(&self, request: PageRequest) -> CatalogResult<Page<Author>> {
        let page = self.repository.find_all(request).await?;
        ensure_found(&page, Criteria::None)?;
        Ok(page)
    }

    #[tracing::instrument(skip(self), err(level = "debug"))]
    pub async fn find(&self, id: AuthorId) -> CatalogResult<Author> {
        self.repository
            .find_by_id(id)
            .await?
            .ok_or_else(|| CatalogError::entity_not_found(EntityKind::Author, id.get()))
    }

    #[tracing::instrument(skip(self, candidate), fields(name = %candidate.name), err(level = "debug"))]
    pub async fn create(&self, candidate: NewAuthor) -> CatalogResult<Author> {
        let author = self.repository.insert(candidate).await?;
        tracing::info!(author_id = %author.id, "author created");
        Ok(author)
    }

    #[tracing::instrument(skip(self, candidate), err(level = "debug"))]
    pub async fn update(&self, id: AuthorId, candidate: NewAuthor) -> CatalogResult<Author> {
        let mut stored = self.find(id).await?;

        stored.name = candidate.name;
        stored.birth_date = candidate.birth_date;
        stored.country = candidate.country;

        let author = self.repository.update(&stored).await?;
        tracing::info!(author_id = %author.id, "author updated");
        Ok(author)
    }

    #[tracing::instrument(skip(self), err(level = "debug"))]
    pub async fn delete(&self, id: AuthorId) -> CatalogResult<()> {
        self.repository.delete_by_id(id).await
    }
}
