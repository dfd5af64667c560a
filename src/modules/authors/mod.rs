pub mod models;
pub mod repository;
pub mod routes;
pub mod service;

use std::sync::Arc;

use async_trait::async_trait;
use axum::Router;
use catalog_kernel::{InitCtx, Migration, Module};
use serde_json::json;

use self::{repository::AuthorRepositoryArc, service::AuthorService};
use super::openapi::{error_response, page_schema, page_parameters};

/// Authors: CRUD plus a name-ordered listing
pub struct AuthorsModule {
    service: Arc<AuthorService>,
}

impl AuthorsModule {
    pub const NAME: &'static str = "authors";

    pub fn new(repository: AuthorRepositoryArc) -> Self {
        Self {
            service: Arc::new(AuthorService::new(repository)),
        }
    }

    pub fn service(&self) -> Arc<AuthorService> {
        Arc::clone(&self.service)
    }
}

#[async_trait]
impl Module for AuthorsModule {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    async fn init(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(
            module = self.name(),
            environment = ?ctx.settings.environment,
            "authors module initialized"
        );
        Ok(())
    }

    fn routes(&self) -> Router {
        routes::router(self.service())
    }

    fn openapi(&self) -> Option<serde_json::Value> {
        let author_body = json!({
            "type": "object",
            "properties": { "body": { "$ref": "#/components/schemas/Author" } }
        });

        Some(json!({
            "paths": {
                "": {
                    "get": {
                        "summary": "List authors ordered by name",
                        "tags": ["Authors"],
                        "parameters": page_parameters(),
                        "responses": {
                            "200": {
                                "description": "One page of authors",
                                "content": { "application/json": { "schema": { "$ref": "#/components/schemas/AuthorPage" } } }
                            },
                            "400": error_response("Invalid page request"),
                            "404": error_response("No authors on this page")
                        }
                    },
                    "post": {
                        "summary": "Create an author",
                        "tags": ["Authors"],
                        "requestBody": {
                            "required": true,
                            "content": { "application/json": { "schema": { "$ref": "#/components/schemas/AuthorPayload" } } }
                        },
                        "responses": {
                            "201": {
                                "description": "Stored author",
                                "content": { "application/json": { "schema": author_body } }
                            },
                            "400": error_response("Validation failed")
                        }
                    }
                },
                "/{id}": {
                    "parameters": [
                        { "name": "id", "in": "path", "required": true, "schema": { "type": "integer", "format": "int64" } }
                    ],
                    "get": {
                        "summary": "Fetch an author",
                        "tags": ["Authors"],
                        "responses": {
                            "200": {
                                "description": "Author",
                                "content": { "application/json": { "schema": author_body } }
                            },
                            "404": error_response("Author not found")
                        }
                    },
                    "put": {
                        "summary": "Replace an author's fields",
                        "tags": ["Authors"],
                        "requestBody": {
                            "required": true,
                            "content": { "application/json": { "schema": { "$ref": "#/components/schemas/AuthorPayload" } } }
                        },
                        "responses": {
                            "200": {
                                "description": "Updated author",
                                "content": { "application/json": { "schema": author_body } }
                            },
                            "400": error_response("Validation failed"),
                            "404": error_response("Author not found")
                        }
                    },
                    "delete": {
                        "summary": "Delete an author and its authorships",
                        "tags": ["Authors"],
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
                        "summary": "Authors health check",
                        "tags": ["Authors"],
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
                    "Author": {
                        "type": "object",
                        "properties": {
                            "id": { "type": "integer", "format": "int64" },
                            "name": { "type": "string" },
                            "birth_date": { "type": "string", "format": "date" },
                            "country": { "type": "string" }
                        },
                        "required": ["id", "name", "birth_date", "country"]
                    },
                    "AuthorPayload": {
                        "type": "object",
                        "properties": {
                            "name": { "type": "string" },
                            "birth_date": { "type": "string", "format": "date" },
                            "country": { "type": "string" }
                        },
                        "required": ["name", "birth_date", "country"]
                    },
                    "AuthorPage": page_schema("Author"),
                    "Message": {
                        "type": "object",
                        "properties": { "message": { "type": "string" } },
                        "required": ["message"]
                    }
                }
            }
        }))
    }

    fn migrations(&self) -> Vec<Migration> {
        vec![Migration {
            id: "001_authors",
            up: r#"
                CREATE TABLE IF NOT EXISTS t_authors (
                    author_id  BIGSERIAL PRIMARY KEY,
                    name       TEXT NOT NULL,
                    birth_date DATE NOT NULL,
                    country    TEXT NOT NULL
                );
                CREATE INDEX IF NOT EXISTS t_authors_name_idx ON t_authors (name);
                "#,
        }]
    }

    async fn start(&self, _ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "authors module started");
        Ok(())
    }

    async fn stop(&self) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "authors module stopped");
        Ok(())
    }
}
