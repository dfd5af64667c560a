//! Core building blocks shared by every catalog crate: settings, the module
//! lifecycle, the domain error taxonomy, and pagination primitives.

pub mod entity;
pub mod error;
pub mod module;
pub mod page;
pub mod registry;
pub mod settings;
pub mod validation;

pub use entity::{same_entity, Entity, EntityKind, EntityRef};
pub use error::{CatalogError, CatalogResult, FieldViolation, IntegritySubject};
pub use module::{InitCtx, Migration, Module};
pub use page::{ensure_found, Criteria, Page, PageRequest};
pub use registry::ModuleRegistry;
