//! In-process catalog used by tests and by the `memory` backend.

use std::{
    collections::{BTreeMap, BTreeSet},
    sync::Arc,
};

use async_trait::async_trait;
use catalog_kernel::{CatalogError, CatalogResult, EntityKind, IntegritySubject, Page, PageRequest};
use chrono::NaiveDate;
use tokio::sync::RwLock;

use crate::modules::{
    authors::{
        models::{Author, AuthorId, NewAuthor},
        repository::AuthorRepository,
    },
    books::{
        association::{attach_on_create, reconcile, AuthorshipChange, Authorships},
        models::{Book, BookId, NewBook},
        repository::BookRepository,
        search::SearchFilter,
    },
};

#[derive(Debug, Clone)]
struct BookRecord {
    title: String,
    isbn: String,
    num_pages: i32,
    publication_date: NaiveDate,
}

#[derive(Debug, Clone, Default)]
struct State {
    authors: BTreeMap<AuthorId, Author>,
    books: BTreeMap<BookId, BookRecord>,
    authorships: Authorships,
    last_author_id: i64,
    last_book_id: i64,
}

impl State {
    fn book(&self, id: BookId) -> Option<Book> {
        self.books.get(&id).map(|record| self.materialize(id, record))
    }

    fn materialize(&self, id: BookId, record: &BookRecord) -> Book {
        let mut authors: Vec<Author> = self
            .authorships
            .authors_of(id)
            .into_iter()
            .filter_map(|author_id| self.authors.get(&author_id).cloned())
            .collect();
        authors.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));

        Book {
            id,
            title: record.title.clone(),
            isbn: record.isbn.clone(),
            num_pages: record.num_pages,
            publication_date: record.publication_date,
            authors,
        }
    }

    /// Unique ISBN, existing authors and a positive page count, as the
    /// relational schema enforces them.
    fn check_book(
        &self,
        id: Option<BookId>,
        record: &BookRecord,
        authors: Option<&BTreeSet<AuthorId>>,
    ) -> CatalogResult<()> {
        let isbn_taken = self
            .books
            .iter()
            .any(|(other, stored)| Some(*other) != id && stored.isbn == record.isbn);
        if isbn_taken {
            return Err(CatalogError::IntegrityViolation(IntegritySubject::Isbn));
        }
        if record.num_pages <= 0 {
            return Err(CatalogError::IntegrityViolation(IntegritySubject::Values));
        }
        if let Some(authors) = authors {
            if authors.iter().any(|author| !self.authors.contains_key(author)) {
                return Err(CatalogError::IntegrityViolation(IntegritySubject::Authors));
            }
        }
        Ok(())
    }
}

/// Both repositories over one `RwLock`-guarded state.
///
/// Writes are staged on a copy of the state that replaces the live one only
/// when the whole operation succeeds.
#[derive(Debug, Default)]
pub struct MemoryCatalog {
    state: Arc<RwLock<State>>,
}

impl MemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    async fn write<T>(&self, op: impl FnOnce(&mut State) -> CatalogResult<T>) -> CatalogResult<T> {
        let mut live = self.state.write().await;
        let mut staged = live.clone();
        let result = op(&mut staged)?;
        *live = staged;
        Ok(result)
    }
}

fn paginate<T>(items: Vec<T>, request: PageRequest) -> Page<T> {
    let total = items.len() as u64;
    let offset = usize::try_from(request.offset()).unwrap_or(usize::MAX);
    let limit = usize::try_from(request.limit()).unwrap_or(usize::MAX);
    let items = items.into_iter().skip(offset).take(limit).collect();
    Page::new(items, request, total)
}

fn sort_books(books: &mut [Book]) {
    books.sort_by(|a, b| a.title.cmp(&b.title).then(a.id.cmp(&b.id)));
}

#[async_trait]
impl AuthorRepository for MemoryCatalog {
    async fn find_by_id(&self, id: AuthorId) -> CatalogResult<Option<Author>> {
        Ok(self.state.read().await.authors.get(&id).cloned())
    }

    async fn insert(&self, author: NewAuthor) -> CatalogResult<Author> {
        self.write(|state| {
            state.last_author_id += 1;
            let author = author.into_author(AuthorId::new(state.last_author_id));
            state.authors.insert(author.id, author.clone());
            Ok(author)
        })
        .await
    }

    async fn update(&self, author: &Author) -> CatalogResult<Author> {
        self.write(|state| match state.authors.get_mut(&author.id) {
            Some(stored) => {
                *stored = author.clone();
                Ok(author.clone())
            }
            None => Err(CatalogError::entity_not_found(
                EntityKind::Author,
                author.id.get(),
            )),
        })
        .await
    }

    async fn delete_by_id(&self, id: AuthorId) -> CatalogResult<()> {
        self.write(|state| {
            if state.authors.remove(&id).is_some() {
                state.authorships.detach_author(id);
            }
            Ok(())
        })
        .await
    }

    async fn find_all(&self, request: PageRequest) -> CatalogResult<Page<Author>> {
        let state = self.state.read().await;
        let mut authors: Vec<Author> = state.authors.values().cloned().collect();
        authors.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        Ok(paginate(authors, request))
    }
}

#[async_trait]
impl BookRepository for MemoryCatalog {
    async fn find_by_id(&self, id: BookId) -> CatalogResult<Option<Book>> {
        Ok(self.state.read().await.book(id))
    }

    async fn insert(&self, book: NewBook) -> CatalogResult<Book> {
        self.write(|state| {
            let record = BookRecord {
                title: book.title,
                isbn: book.isbn,
                num_pages: book.num_pages,
                publication_date: book.publication_date,
            };
            state.check_book(None, &record, Some(&book.author_ids))?;

            state.last_book_id += 1;
            let id = BookId::new(state.last_book_id);
            state.books.insert(id, record);
            state
                .authorships
                .attach(attach_on_create(id, &book.author_ids));

            state
                .book(id)
                .ok_or_else(|| CatalogError::entity_not_found(EntityKind::Book, id.get()))
        })
        .await
    }

    async fn update(&self, id: BookId, book: NewBook) -> CatalogResult<Book> {
        self.write(|state| {
            if !state.books.contains_key(&id) {
                return Err(CatalogError::entity_not_found(EntityKind::Book, id.get()));
            }

            let change = reconcile(&state.authorships.authors_of(id), &book.author_ids);
            tracing::debug!(book_id = %id, ?change, "authorship change");

            let record = BookRecord {
                title: book.title,
                isbn: book.isbn,
                num_pages: book.num_pages,
                publication_date: book.publication_date,
            };
            let replacement = match &change {
                AuthorshipChange::Unchanged => None,
                AuthorshipChange::Replace(ids) => Some(ids),
            };
            state.check_book(Some(id), &record, replacement)?;

            state.books.insert(id, record);
            state.authorships.apply(id, &change);

            state
                .book(id)
                .ok_or_else(|| CatalogError::entity_not_found(EntityKind::Book, id.get()))
        })
        .await
    }

    async fn delete_by_id(&self, id: BookId) -> CatalogResult<()> {
        self.write(|state| {
            if state.books.remove(&id).is_some() {
                state.authorships.detach_book(id);
            }
            Ok(())
        })
        .await
    }

    async fn search(&self, filter: &SearchFilter, request: PageRequest) -> CatalogResult<Page<Book>> {
        let state = self.state.read().await;
        let mut books: Vec<Book> = state
            .books
            .iter()
            .map(|(id, record)| state.materialize(*id, record))
            .filter(|book| filter.matches(book))
            .collect();
        sort_books(&mut books);
        Ok(paginate(books, request))
    }

    async fn find_by_author(
        &self,
        author_id: AuthorId,
        request: PageRequest,
    ) -> CatalogResult<Page<Book>> {
        let state = self.state.read().await;
        let mut books: Vec<Book> = state
            .authorships
            .books_of(author_id)
            .into_iter()
            .filter_map(|id| state.book(id))
            .collect();
        sort_books(&mut books);
        Ok(paginate(books, request))
    }
}
