//! Book and author catalog: domain modules, entity stores and bootstrap.

pub mod bootstrap;
pub mod modules;
pub mod store;

pub use bootstrap::{build_app, build_registry, migrate, open_store, run};
pub use store::RepositoryStore;
