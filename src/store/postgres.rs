//! sqlx/Postgres catalog.
//!
//! Reads run in `REPEATABLE READ, READ ONLY` transactions so that a page's
//! total, rows and authors come from one snapshot. Writes run in a single
//! transaction each; book updates lock the book row before reading its authors.

use std::collections::{BTreeSet, HashMap};

use async_trait::async_trait;
use catalog_db::store_error;
use catalog_kernel::{CatalogError, CatalogResult, EntityKind, Page, PageRequest};
use chrono::NaiveDate;
use sqlx::{PgConnection, PgPool, Postgres, Transaction};

use crate::modules::{
    authors::{
        models::{Author, AuthorId, NewAuthor},
        repository::AuthorRepository,
    },
    books::{
        association::{attach_on_create, reconcile, AuthorshipChange},
        models::{Book, BookId, NewBook},
        repository::BookRepository,
        search::SearchFilter,
    },
};

const BOOK_COLUMNS: &str = "b.book_id, b.title, b.isbn, b.num_pages, b.publication_date";

const SEARCH_PREDICATE: &str = r#"
    ($1::text IS NULL OR b.title ILIKE $1)
    AND ($2::text IS NULL OR b.isbn ILIKE $2)
    AND ($3::text IS NULL OR EXISTS (
        SELECT 1
        FROM t_authors_books ab
        JOIN t_authors a ON a.author_id = ab.author_id
        WHERE ab.book_id = b.book_id AND a.name ILIKE $3
    ))
"#;

#[derive(Debug, Clone, sqlx::FromRow)]
struct AuthorRow {
    author_id: i64,
    name: String,
    birth_date: NaiveDate,
    country: String,
}

impl From<AuthorRow> for Author {
    fn from(row: AuthorRow) -> Self {
        Self {
            id: AuthorId::new(row.author_id),
            name: row.name,
            birth_date: row.birth_date,
            country: row.country,
        }
    }
}

#[derive(Debug, Clone, sqlx::FromRow)]
struct BookRow {
    book_id: i64,
    title: String,
    isbn: String,
    num_pages: i32,
    publication_date: NaiveDate,
}

#[derive(Debug, Clone, sqlx::FromRow)]
struct AuthorshipRow {
    book_id: i64,
    #[sqlx(flatten)]
    author: AuthorRow,
}

#[derive(Debug, Clone)]
pub struct PgCatalog {
    pool: PgPool,
}

impl PgCatalog {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    async fn begin(&self) -> CatalogResult<Transaction<'static, Postgres>> {
        self.pool.begin().await.map_err(store_error)
    }

    async fn begin_read_only(&self) -> CatalogResult<Transaction<'static, Postgres>> {
        let mut tx = self.begin().await?;
        sqlx::query("SET TRANSACTION ISOLATION LEVEL REPEATABLE READ, READ ONLY")
            .execute(&mut *tx)
            .await
            .map_err(store_error)?;
        Ok(tx)
    }
}

fn window(request: PageRequest) -> (i64, i64) {
    let limit = i64::try_from(request.limit()).unwrap_or(i64::MAX);
    let offset = i64::try_from(request.offset()).unwrap_or(i64::MAX);
    (limit, offset)
}

fn total(count: i64) -> u64 {
    u64::try_from(count).unwrap_or_default()
}

/// Authors of every listed book in one query, each list ordered by name.
async fn load_authors(
    conn: &mut PgConnection,
    book_ids: &[i64],
) -> CatalogResult<HashMap<i64, Vec<Author>>> {
    if book_ids.is_empty() {
        return Ok(HashMap::new());
    }

    let rows = sqlx::query_as::<_, AuthorshipRow>(
        r#"
        SELECT ab.book_id, a.author_id, a.name, a.birth_date, a.country
        FROM t_authors_books ab
        JOIN t_authors a ON a.author_id = ab.author_id
        WHERE ab.book_id = ANY($1)
        ORDER BY a.name, a.author_id
        "#,
    )
    .bind(book_ids)
    .fetch_all(&mut *conn)
    .await
    .map_err(store_error)?;

    let mut authors: HashMap<i64, Vec<Author>> = HashMap::new();
    for row in rows {
        authors.entry(row.book_id).or_default().push(row.author.into());
    }
    Ok(authors)
}

async fn materialize(conn: &mut PgConnection, rows: Vec<BookRow>) -> CatalogResult<Vec<Book>> {
    let ids: Vec<i64> = rows.iter().map(|row| row.book_id).collect();
    let mut authors = load_authors(conn, &ids).await?;

    Ok(rows
        .into_iter()
        .map(|row| Book {
            id: BookId::new(row.book_id),
            authors: authors.remove(&row.book_id).unwrap_or_default(),
            title: row.title,
            isbn: row.isbn,
            num_pages: row.num_pages,
            publication_date: row.publication_date,
        })
        .collect())
}

async fn materialize_one(conn: &mut PgConnection, row: BookRow) -> CatalogResult<Book> {
    let id = row.book_id;
    materialize(conn, vec![row])
        .await?
        .pop()
        .ok_or_else(|| CatalogError::entity_not_found(EntityKind::Book, id))
}

async fn attach(conn: &mut PgConnection, book_id: BookId, author_ids: Vec<i64>) -> CatalogResult<()> {
    if author_ids.is_empty() {
        return Ok(());
    }

    sqlx::query(
        "INSERT INTO t_authors_books (book_id, author_id) SELECT $1, UNNEST($2::bigint[])",
    )
    .bind(book_id.get())
    .bind(author_ids)
    .execute(&mut *conn)
    .await
    .map_err(store_error)?;
    Ok(())
}

#[async_trait]
impl AuthorRepository for PgCatalog {
    async fn find_by_id(&self, id: AuthorId) -> CatalogResult<Option<Author>> {
        let row = sqlx::query_as::<_, AuthorRow>(
            "SELECT author_id, name, birth_date, country FROM t_authors WHERE author_id = $1",
        )
        .bind(id.get())
        .fetch_optional(&self.pool)
        .await
        .map_err(store_error)?;
        Ok(row.map(Author::from))
    }

    async fn insert(&self, author: NewAuthor) -> CatalogResult<Author> {
        let row = sqlx::query_as::<_, AuthorRow>(
            r#"
            INSERT INTO t_authors (name, birth_date, country)
            VALUES ($1, $2, $3)
            RETURNING author_id, name, birth_date, country
            "#,
        )
        .bind(&author.name)
        .bind(author.birth_date)
        .bind(&author.country)
        .fetch_one(&self.pool)
        .await
        .map_err(store_error)?;
        Ok(row.into())
    }

    async fn update(&self, author: &Author) -> CatalogResult<Author> {
        let row = sqlx::query_as::<_, AuthorRow>(
            r#"
            UPDATE t_authors SET name = $2, birth_date = $3, country = $4
            WHERE author_id = $1
            RETURNING author_id, name, birth_date, country
            "#,
        )
        .bind(author.id.get())
        .bind(&author.name)
        .bind(author.birth_date)
        .bind(&author.country)
        .fetch_optional(&self.pool)
        .await
        .map_err(store_error)?;

        row.map(Author::from)
            .ok_or_else(|| CatalogError::entity_not_found(EntityKind::Author, author.id.get()))
    }

    async fn delete_by_id(&self, id: AuthorId) -> CatalogResult<()> {
        sqlx::query("DELETE FROM t_authors WHERE author_id = $1")
            .bind(id.get())
            .execute(&self.pool)
            .await
            .map_err(store_error)?;
        Ok(())
    }

    async fn find_all(&self, request: PageRequest) -> CatalogResult<Page<Author>> {
        let (limit, offset) = window(request);
        let mut tx = self.begin_read_only().await?;

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM t_authors")
            .fetch_one(&mut *tx)
            .await
            .map_err(store_error)?;

        let rows = sqlx::query_as::<_, AuthorRow>(
            r#"
            SELECT author_id, name, birth_date, country
            FROM t_authors
            ORDER BY name, author_id
            LIMIT $1 OFFSET $2
            "#,
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(&mut *tx)
        .await
        .map_err(store_error)?;

        tx.commit().await.map_err(store_error)?;

        let authors = rows.into_iter().map(Author::from).collect();
        Ok(Page::new(authors, request, total(count)))
    }
}

#[async_trait]
impl BookRepository for PgCatalog {
    async fn find_by_id(&self, id: BookId) -> CatalogResult<Option<Book>> {
        let mut tx = self.begin_read_only().await?;

        let row = sqlx::query_as::<_, BookRow>(&format!(
            "SELECT {BOOK_COLUMNS} FROM t_books b WHERE b.book_id = $1"
        ))
        .bind(id.get())
        .fetch_optional(&mut *tx)
        .await
        .map_err(store_error)?;

        let book = match row {
            Some(row) => Some(materialize_one(&mut tx, row).await?),
            None => None,
        };
        tx.commit().await.map_err(store_error)?;
        Ok(book)
    }

    async fn insert(&self, book: NewBook) -> CatalogResult<Book> {
        let mut tx = self.begin().await?;

        let row = sqlx::query_as::<_, BookRow>(
            r#"
            INSERT INTO t_books (title, isbn, num_pages, publication_date)
            VALUES ($1, $2, $3, $4)
            RETURNING book_id, title, isbn, num_pages, publication_date
            "#,
        )
        .bind(&book.title)
        .bind(&book.isbn)
        .bind(book.num_pages)
        .bind(book.publication_date)
        .fetch_one(&mut *tx)
        .await
        .map_err(store_error)?;

        let book_id = BookId::new(row.book_id);
        let author_ids = attach_on_create(book_id, &book.author_ids)
            .into_iter()
            .map(|row| row.author_id.get())
            .collect();
        attach(&mut tx, book_id, author_ids).await?;

        let book = materialize_one(&mut tx, row).await?;
        tx.commit().await.map_err(store_error)?;
        Ok(book)
    }

    async fn update(&self, id: BookId, book: NewBook) -> CatalogResult<Book> {
        let mut tx = self.begin().await?;

        let locked: Option<i64> =
            sqlx::query_scalar("SELECT book_id FROM t_books WHERE book_id = $1 FOR UPDATE")
                .bind(id.get())
                .fetch_optional(&mut *tx)
                .await
                .map_err(store_error)?;
        if locked.is_none() {
            return Err(CatalogError::entity_not_found(EntityKind::Book, id.get()));
        }

        let current: BTreeSet<AuthorId> =
            sqlx::query_scalar::<_, i64>("SELECT author_id FROM t_authors_books WHERE book_id = $1")
                .bind(id.get())
                .fetch_all(&mut *tx)
                .await
                .map_err(store_error)?
                .into_iter()
                .map(AuthorId::new)
                .collect();
        let change = reconcile(&current, &book.author_ids);
        tracing::debug!(book_id = %id, ?change, "authorship change");

        let row = sqlx::query_as::<_, BookRow>(
            r#"
            UPDATE t_books SET title = $2, isbn = $3, num_pages = $4, publication_date = $5
            WHERE book_id = $1
            RETURNING book_id, title, isbn, num_pages, publication_date
            "#,
        )
        .bind(id.get())
        .bind(&book.title)
        .bind(&book.isbn)
        .bind(book.num_pages)
        .bind(book.publication_date)
        .fetch_one(&mut *tx)
        .await
        .map_err(store_error)?;

        if let AuthorshipChange::Replace(author_ids) = change {
            sqlx::query("DELETE FROM t_authors_books WHERE book_id = $1")
                .bind(id.get())
                .execute(&mut *tx)
                .await
                .map_err(store_error)?;
            let author_ids = author_ids.into_iter().map(AuthorId::get).collect();
            attach(&mut tx, id, author_ids).await?;
        }

        let book = materialize_one(&mut tx, row).await?;
        tx.commit().await.map_err(store_error)?;
        Ok(book)
    }

    async fn delete_by_id(&self, id: BookId) -> CatalogResult<()> {
        sqlx::query("DELETE FROM t_books WHERE book_id = $1")
            .bind(id.get())
            .execute(&self.pool)
            .await
            .map_err(store_error)?;
        Ok(())
    }

    async fn search(&self, filter: &SearchFilter, request: PageRequest) -> CatalogResult<Page<Book>> {
        let (limit, offset) = window(request);
        let title = filter.title_pattern();
        let isbn = filter.isbn_pattern();
        let author = filter.author_pattern();

        let mut tx = self.begin_read_only().await?;

        let count: i64 = sqlx::query_scalar(&format!(
            "SELECT COUNT(*) FROM t_books b WHERE {SEARCH_PREDICATE}"
        ))
        .bind(&title)
        .bind(&isbn)
        .bind(&author)
        .fetch_one(&mut *tx)
        .await
        .map_err(store_error)?;

        let rows = sqlx::query_as::<_, BookRow>(&format!(
            r#"
            SELECT {BOOK_COLUMNS}
            FROM t_books b
            WHERE {SEARCH_PREDICATE}
            ORDER BY b.title, b.book_id
            LIMIT $4 OFFSET $5
            "#
        ))
        .bind(&title)
        .bind(&isbn)
        .bind(&author)
        .bind(limit)
        .bind(offset)
        .fetch_all(&mut *tx)
        .await
        .map_err(store_error)?;

        let books = materialize(&mut tx, rows).await?;
        tx.commit().await.map_err(store_error)?;

        tracing::debug!(total = count, returned = books.len(), "book search executed");
        Ok(Page::new(books, request, total(count)))
    }

    async fn find_by_author(
        &self,
        author_id: AuthorId,
        request: PageRequest,
    ) -> CatalogResult<Page<Book>> {
        let (limit, offset) = window(request);
        let mut tx = self.begin_read_only().await?;

        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM t_authors_books WHERE author_id = $1")
                .bind(author_id.get())
                .fetch_one(&mut *tx)
                .await
                .map_err(store_error)?;

        let rows = sqlx::query_as::<_, BookRow>(&format!(
            r#"
            SELECT {BOOK_COLUMNS}
            FROM t_books b
            JOIN t_authors_books ab ON ab.book_id = b.book_id
            WHERE ab.author_id = $1
            ORDER BY b.title, b.book_id
            LIMIT $2 OFFSET $3
            "#
        ))
        .bind(author_id.get())
        .bind(limit)
        .bind(offset)
        .fetch_all(&mut *tx)
        .await
        .map_err(store_error)?;

        let books = materialize(&mut tx, rows).await?;
        tx.commit().await.map_err(store_error)?;
        Ok(Page::new(books, request, total(count)))
    }
}
