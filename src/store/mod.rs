//! Entity store implementations behind the module repository traits.

pub mod memory;
pub mod postgres;

use std::sync::Arc;

use sqlx::PgPool;

use crate::modules::{authors::repository::AuthorRepositoryArc, books::repository::BookRepositoryArc};

pub use memory::MemoryCatalog;
pub use postgres::PgCatalog;

/// The backend shared by every module. Both repositories of one store see
/// the same data.
#[derive(Debug, Clone)]
pub enum RepositoryStore {
    Postgres(Arc<PgCatalog>),
    Memory(Arc<MemoryCatalog>),
}

impl RepositoryStore {
    pub fn postgres(pool: PgPool) -> Self {
        Self::Postgres(Arc::new(PgCatalog::new(pool)))
    }

    pub fn memory() -> Self {
        Self::Memory(Arc::new(MemoryCatalog::new()))
    }

    pub fn authors(&self) -> AuthorRepositoryArc {
        match self {
            Self::Postgres(catalog) => catalog.clone(),
            Self::Memory(catalog) => catalog.clone(),
        }
    }

    pub fn books(&self) -> BookRepositoryArc {
        match self {
            Self::Postgres(catalog) => catalog.clone(),
            Self::Memory(catalog) => catalog.clone(),
        }
    }

    pub fn backend_name(&self) -> &'static str {
        match self {
            Self::Postgres(_) => "postgres",
            Self::Memory(_) => "memory",
        }
    }
}
