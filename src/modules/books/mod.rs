pub mod association;
pub mod isbn;
pub mod models;
pub mod repository;
pub mod routes;
pub mod search;
pub mod service;

use std::sync::Arc;

use async_trait::async_trait;
use axum::Router;
use catalog_kernel::{InitCtx, Migration, Module};
use serde_json::json;

use self::{repository::BookRepositoryArc, service::BookService};
use super::openapi::{error_response, page_parameters, page_schema};

/// Books: CRUD, multi-field search and per-author listing
pub struct BooksModule {
    service: Arc<BookService>,
}

impl BooksModule {
    pub const NAME: &'static str = "books";

    pub fn new(repository: BookRepositoryArc) -> Self {
        Self {
            service: Arc::new(BookService::new(repository)),
        }
    }

    pub fn service(&self) -> Arc<BookService> {
        Arc::clone(&self.service)
    }
}

#[async_trait]
impl Module for BooksModule {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn depends_on(&self) -> &'static [&'static str] {
        &["authors"]
    }

    async fn init(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(
            module = self.name(),
            environment = ?ctx.settings.environment,
            "books module initialized"
        );
        Ok(())
    }

    fn routes(&self) -> Router {
        routes::router(self.service())
    }

    fn openapi(&self) -> Option<serde_json::Value> {
        let book_body = json!({
            "type": "object",
            "properties": { "body": { "$ref": "#/components/schemas/Book" } }
        });
        let book_page = json!({
            "description": "One page of books ordered by title",
            "content": { "application/json": { "schema": { "$ref": "#/components/schemas/BookPage" } } }
        });
        let payload = json!({
            "required": true,
            "content": { "application/json": { "schema": { "$ref": "#/components/schemas/BookPayload" } } }
        });

        let mut search_parameters = json!([
            { "name": "title", "in": "query", "required": false, "schema": { "type": "string", "default": "" } },
            { "name": "isbn", "in": "query", "required": false, "schema": { "type": "string", "default": "" } },
            { "name": "author", "in": "query", "required": false, "schema": { "type": "string", "default": "" } }
        ]);
        if let (Some(search), Some(paging)) = (
            search_parameters.as_array_mut(),
            page_parameters().as_array().cloned(),
        ) {
            search.extend(paging);
        }

        let mut by_author_parameters = json!([
            { "name": "author_id", "in": "path", "required": true, "schema": { "type": "integer", "format": "int64" } }
        ]);
        if let (Some(by_author), Some(paging)) = (
            by_author_parameters.as_array_mut(),
            page_parameters().as_array().cloned(),
        ) {
            by_author.extend(paging);
        }

        Some(json!({
            "paths": {
                "": {
                    "post": {
                        "summary": "Create a book with its authorships",
                        "tags": ["Books"],
                        "requestBody": payload,
                        "responses": {
                            "201": {
                                "description": "Stored book",
                                "content": { "application/json": { "schema": book_body } }
                            },
                            "400": error_response("Validation failed or unknown author / duplicate ISBN")
                        }
                    }
                },
                "/search": {
                    "get": {
                        "summary": "Search books by title, ISBN and author name",
                        "description": "Each non-empty filter is a case-insensitive substring match; filters are combined with AND.",
                        "tags": ["Books"],
                        "parameters": search_parameters,
                        "responses": {
                            "200": book_page,
                            "400": error_response("Invalid page request"),
                            "404": error_response("No books match")
                        }
                    }
                },
                "/by-author/{author_id}": {
                    "get": {
                        "summary": "Books written by an author",
                        "tags": ["Books"],
                        "parameters": by_author_parameters,
                        "responses": {
                            "200": book_page,
                            "400": error_response("Invalid page request"),
                            "404": error_response("Author has no books on this page")
                        }
                    }
                },
                "/{id}": {
                    "parameters": [
                        { "name": "id", "in": "path", "required": true, "schema": { "type": "integer", "format": "int64" } }
                    ],
                    "get": {
                        "summary": "Fetch a book",
                        "tags": ["Books"],
                        "responses": {
                            "200": {
                                "description": "Book",
                                "content": { "application/json": { "schema": book_body } }
                            },
                            "404": error_response("Book not found")
                        }
                    },
                    "put": {
                        "summary": "Replace a book's fields and authors",
                        "tags": ["Books"],
                        "requestBody": payload,
                        "responses": {
                            "200": {
                                "description": "Updated book",
                                "content": { "application/json": { "schema": book_body } }
                            },
                            "400": error_response("Validation failed or unknown author / duplicate ISBN"),
                            "404": error_response("Book not found")
                        }
                    },
                    "delete": {
                        "summary": "Delete a book and its authorships",
                        "tags": ["Books"],
                        "responses": {
                            "200": {
                                "description": "Deleted or never existed",
                                "content": { "application/json": { "schema": { "$ref": "#/components/schemas/Message" } } }
                            }
                        }
                    }
                },
                "/health": {
                    "get": {
                        "summary": "Books health check",
                        "tags": ["Books"],
                        "responses": {
                            "200": {
                                "description": "OK",
                                "content": { "text/plain": { "schema": { "type": "string" } } }
                            }
                        }
                    }
                }
            },
            "components": {
                "schemas": {
                    "Book": {
                        "type": "object",
                        "properties": {
                            "id": { "type": "integer", "format": "int64" },
                            "title": { "type": "string" },
                            "isbn": { "type": "string", "description": "ISBN-10 or ISBN-13 without separators" },
                            "num_pages": { "type": "integer", "minimum": 1 },
                            "publication_date": { "type": "string", "format": "date" },
                            "authors": { "type": "array", "items": { "$ref": "#/components/schemas/Author" } }
                        },
                        "required": ["id", "title", "isbn", "num_pages", "publication_date", "authors"]
                    },
                    "BookPayload": {
                        "type": "object",
                        "properties": {
                            "title": { "type": "string" },
                            "isbn": { "type": "string" },
                            "num_pages": { "type": "integer", "minimum": 1 },
                            "publication_date": { "type": "string", "format": "date" },
                            "authors": {
                                "type": "array",
                                "items": {
                                    "type": "object",
                                    "properties": { "id": { "type": "integer", "format": "int64" } },
                                    "required": ["id"]
                                }
                            }
                        },
                        "required": ["title", "isbn", "num_pages", "publication_date", "authors"]
                    },
                    "BookPage": page_schema("Book")
                }
            }
        }))
    }

    fn migrations(&self) -> Vec<Migration> {
        vec![Migration {
            id: "001_books",
            up: r#"
                CREATE TABLE IF NOT EXISTS t_books (
                    book_id          BIGSERIAL PRIMARY KEY,
                    title            TEXT NOT NULL,
                    isbn             TEXT NOT NULL,
                    num_pages        INTEGER NOT NULL CHECK (num_pages > 0),
                    publication_date DATE NOT NULL,
                    CONSTRAINT t_books_isbn_key UNIQUE (isbn)
                );
                CREATE INDEX IF NOT EXISTS t_books_title_idx ON t_books (title, book_id);

                CREATE TABLE IF NOT EXISTS t_authors_books (
                    book_id   BIGINT NOT NULL REFERENCES t_books (book_id) ON DELETE CASCADE,
                    author_id BIGINT NOT NULL REFERENCES t_authors (author_id) ON DELETE CASCADE,
                    PRIMARY KEY (book_id, author_id)
                );
                CREATE INDEX IF NOT EXISTS t_authors_books_author_idx ON t_authors_books (author_id);
                "#,
        }]
    }

    async fn start(&self, _ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "books module started");
        Ok(())
    }

    async fn stop(&self) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "books module stopped");
        Ok(())
    }
}
