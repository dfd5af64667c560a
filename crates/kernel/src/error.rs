//! Domain error taxonomy shared by services and stores.

use std::fmt;

use serde::Serialize;
use thiserror::Error;

use crate::entity::EntityKind;

pub type CatalogResult<T> = std::result::Result<T, CatalogError>;

/// A single failed field rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldViolation {
    pub field: String,
    pub message: String,
}

impl FieldViolation {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// What a store-level constraint failure was about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntegritySubject {
    Authors,
    Books,
    Isbn,
    Values,
}

impl fmt::Display for IntegritySubject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Authors => write!(f, "authors"),
            Self::Books => write!(f, "books"),
            Self::Isbn => write!(f, "ISBN"),
            Self::Values => write!(f, "values"),
        }
    }
}

#[derive(Error, Debug)]
pub enum CatalogError {
    /// Update or lookup target is missing.
    #[error("{kind} with id={id} not found")]
    EntityNotFound { kind: EntityKind, id: i64 },

    /// A list or search produced no rows.
    #[error("{0}")]
    DataNotFound(String),

    #[error("{message}")]
    Validation {
        message: String,
        violations: Vec<FieldViolation>,
    },

    #[error("Data has errors: One or more {0} is incorrect. Check id's and other values")]
    IntegrityViolation(IntegritySubject),

    #[error(transparent)]
    Store(anyhow::Error),
}

impl CatalogError {
    pub fn entity_not_found(kind: EntityKind, id: i64) -> Self {
        Self::EntityNotFound { kind, id }
    }

    pub fn store(err: impl Into<anyhow::Error>) -> Self {
        Self::Store(err.into())
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::EntityNotFound { .. } | Self::DataNotFound(_))
    }
}
