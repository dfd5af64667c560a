use catalog_kernel::{ensure_found, CatalogError, CatalogResult, Criteria, EntityKind, Page, PageRequest};

use super::{
    models::{Book, BookId, NewBook},
    repository::BookRepositoryArc,
    search::SearchFilter,
};
use crate::modules::authors::models::AuthorId;

#[derive(Debug, Clone)]
pub struct BookService {
    repository: BookRepositoryArc,
}

impl BookService {
    pub fn new(repository: BookRepositoryArc) -> Self {
        Self { repository }
    }

    #[tracing::instrument(skip(self), err(level = "debug"))]
    pub async fn search(&self, filter: &SearchFilter, request: PageRequest) -> CatalogResult<Page<Book>> {
        let page = self.repository.search(filter, request).await?;
        ensure_found(&page, Criteria::Parameters(&filter.values()))?;
        Ok(page)
    }

    #[tracing::instrument(skip(self), err(level = "debug"))]
    pub async fn find(&self, id: BookId) -> CatalogResult<Book> {
        self.repository
            .find_by_id(id)
            .await?
            .ok_or_else(|| CatalogError::entity_not_found(EntityKind::Book, id.get()))
    }

    #[tracing::instrument(skip(self), err(level = "debug"))]
    pub async fn find_by_author(&self, author_id: AuthorId, request: PageRequest) -> CatalogResult<Page<Book>> {
        let page = self.repository.find_by_author(author_id, request).await?;
        ensure_found(&page, Criteria::Parameter(&author_id.to_string()))?;
        Ok(page)
    }

    #[tracing::instrument(skip(self, candidate), fields(isbn = %candidate.isbn), err(level = "debug"))]
    pub async fn create(&self, candidate: NewBook) -> CatalogResult<Book> {
        let book = self.repository.insert(candidate).await?;
        tracing::info!(book_id = %book.id, authors = book.authors.len(), "book created");
        Ok(book)
    }

    #[tracing::instrument(skip(self, candidate), err(level = "debug"))]
    pub async fn update(&self, id: BookId, candidate: NewBook) -> CatalogResult<Book> {
        let book = self.repository.update(id, candidate).await?;
        tracing::info!(book_id = %book.id, "book updated");
        Ok(book)
    }

    #[tracing::instrument(skip(self), err(level = "debug"))]
    pub async fn delete(&self, id: BookId) -> CatalogResult<()> {
        self.repository.delete_by_id(id).await
    }
}

#[cfg(test)]
mod tests {
    use std::{
        collections::BTreeSet,
        sync::{Arc, Mutex},
    };

    use async_trait::async_trait;
    use chrono::NaiveDate;

    use super::*;
    use crate::{
        modules::{
            authors::{models::NewAuthor, repository::AuthorRepository},
            books::repository::BookRepository,
        },
        store::MemoryCatalog,
    };
    use catalog_kernel::IntegritySubject;

    /// Commits a queued update of another writer right before delegating one.
    #[derive(Debug)]
    struct InterleavedWrites {
        inner: Arc<MemoryCatalog>,
        pending: Mutex<Option<(BookId, NewBook)>>,
    }

    #[async_trait]
    impl BookRepository for InterleavedWrites {
        async fn find_by_id(&self, id: BookId) -> CatalogResult<Option<Book>> {
            BookRepository::find_by_id(self.inner.as_ref(), id).await
        }

        async fn insert(&self, book: NewBook) -> CatalogResult<Book> {
            BookRepository::insert(self.inner.as_ref(), book).await
        }

        async fn update(&self, id: BookId, book: NewBook) -> CatalogResult<Book> {
            let pending = self.pending.lock().unwrap().take();
            if let Some((other_id, other)) = pending {
                BookRepository::update(self.inner.as_ref(), other_id, other).await?;
            }
            BookRepository::update(self.inner.as_ref(), id, book).await
        }

        async fn delete_by_id(&self, id: BookId) -> CatalogResult<()> {
            BookRepository::delete_by_id(self.inner.as_ref(), id).await
        }

        async fn search(&self, filter: &SearchFilter, request: PageRequest) -> CatalogResult<Page<Book>> {
            self.inner.search(filter, request).await
        }

        async fn find_by_author(
            &self,
            author_id: AuthorId,
            request: PageRequest,
        ) -> CatalogResult<Page<Book>> {
            self.inner.find_by_author(author_id, request).await
        }
    }

    struct Fixture {
        catalog: Arc<MemoryCatalog>,
        service: BookService,
    }

    impl Fixture {
        fn new() -> Self {
            let catalog = Arc::new(MemoryCatalog::new());
            let service = BookService::new(catalog.clone());
            Self { catalog, service }
        }

        async fn author(&self, name: &str) -> AuthorId {
            let author = NewAuthor {
                name: name.into(),
                birth_date: NaiveDate::from_ymd_opt(1948, 10, 17).unwrap(),
                country: "США".into(),
            };
            AuthorRepository::insert(self.catalog.as_ref(), author)
                .await
                .unwrap()
                .id
        }
    }

    fn candidate(title: &str, isbn: &str, authors: &[AuthorId]) -> NewBook {
        NewBook {
            title: title.into(),
            isbn: isbn.into(),
            num_pages: 800,
            publication_date: NaiveDate::from_ymd_opt(1990, 1, 15).unwrap(),
            author_ids: authors.iter().copied().collect(),
        }
    }

    #[tokio::test]
    async fn create_materializes_authors() {
        let fx = Fixture::new();
        let jordan = fx.author("Роберт Джордан").await;

        let book = fx
            .service
            .create(candidate("Колесо Времени. Око Мира", "9785170666126", &[jordan]))
            .await
            .unwrap();

        assert_eq!(book.authors.len(), 1);
        assert_eq!(book.authors[0].name, "Роберт Джордан");
        assert_eq!(fx.service.find(book.id).await.unwrap(), book);
    }

    #[tokio::test]
    async fn create_with_unknown_author_is_rejected() {
        let fx = Fixture::new();
        let err = fx
            .service
            .create(candidate("Сирота", "9785170666126", &[AuthorId::new(99)]))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            CatalogError::IntegrityViolation(IntegritySubject::Authors)
        ));
    }

    #[tokio::test]
    async fn update_replaces_authorships_on_both_sides() {
        let fx = Fixture::new();
        let jordan = fx.author("Роберт Джордан").await;
        let sanderson = fx.author("Брэндон Сандерсон").await;
        let book = fx
            .service
            .create(candidate("Память света", "9785000000014", &[jordan]))
            .await
            .unwrap();

        let updated = fx
            .service
            .update(book.id, candidate("Память света", "9785000000014", &[sanderson]))
            .await
            .unwrap();

        assert_eq!(updated.author_ids(), BTreeSet::from([sanderson]));
        assert!(fx
            .service
            .find_by_author(jordan, PageRequest::default())
            .await
            .unwrap_err()
            .is_not_found());
        let sandersons = fx
            .service
            .find_by_author(sanderson, PageRequest::default())
            .await
            .unwrap();
        assert_eq!(sandersons.items, vec![updated]);
    }

    #[tokio::test]
    async fn interleaved_update_resolves_to_last_writer() {
        let fx = Fixture::new();
        let jordan = fx.author("Роберт Джордан").await;
        let sanderson = fx.author("Брэндон Сандерсон").await;
        let book = fx
            .service
            .create(candidate("Память света", "9785000000014", &[jordan]))
            .await
            .unwrap();

        let service = BookService::new(Arc::new(InterleavedWrites {
            inner: fx.catalog.clone(),
            pending: Mutex::new(Some((
                book.id,
                candidate("Другой писатель", "9785000000014", &[sanderson]),
            ))),
        }));
        let updated = service
            .update(book.id, candidate("Последний писатель", "9785000000014", &[jordan]))
            .await
            .unwrap();

        assert_eq!(updated.title, "Последний писатель");
        assert_eq!(updated.author_ids(), BTreeSet::from([jordan]));

        let stored = fx.service.find(book.id).await.unwrap();
        assert_eq!(stored.title, "Последний писатель");
        assert_eq!(stored.author_ids(), BTreeSet::from([jordan]));
    }

    #[tokio::test]
    async fn update_of_missing_book_fails() {
        let fx = Fixture::new();
        let err = fx
            .service
            .update(BookId::new(5), candidate("Нет", "9785170666126", &[]))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Book with id=5 not found");
    }

    #[tokio::test]
    async fn search_without_matches_names_the_filters() {
        let fx = Fixture::new();
        let err = fx
            .service
            .search(&SearchFilter::new("NoSuchTitleExists", "", ""), PageRequest::default())
            .await
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Data by parameters [NoSuchTitleExists] not found"
        );
    }

    #[tokio::test]
    async fn books_by_missing_author_names_the_author() {
        let fx = Fixture::new();
        let err = fx
            .service
            .find_by_author(AuthorId::new(3), PageRequest::default())
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Data by parameter '3' not found");
    }

    #[tokio::test]
    async fn delete_is_idempotent() {
        let fx = Fixture::new();
        let book = fx
            .service
            .create(candidate("1984", "9785306018119", &[]))
            .await
            .unwrap();

        fx.service.delete(book.id).await.unwrap();
        fx.service.delete(book.id).await.unwrap();
        assert!(fx.service.find(book.id).await.unwrap_err().is_not_found());
    }
}
