//! Entity identity.
//!
//! Persisted entities are compared by `(kind, id)` only. Field values never
//! take part in equality, and an entity without an identifier (not yet
//! persisted) is equal to nothing, itself included.

use std::fmt;

/// Kinds of entities held by the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EntityKind {
    Author,
    Book,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Author => write!(f, "Author"),
            Self::Book => write!(f, "Book"),
        }
    }
}

/// A `(kind, identifier)` pair naming one stored entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EntityRef {
    pub kind: EntityKind,
    pub id: i64,
}

impl EntityRef {
    pub const fn new(kind: EntityKind, id: i64) -> Self {
        Self { kind, id }
    }
}

/// Implemented by every domain object that can be persisted.
pub trait Entity {
    const KIND: EntityKind;

    /// Store-assigned identifier, `None` until the first persist.
    fn raw_id(&self) -> Option<i64>;

    fn entity_ref(&self) -> Option<EntityRef> {
        self.raw_id().map(|id| EntityRef::new(Self::KIND, id))
    }
}

/// Identity equality: both sides must be persisted and name the same entity.
pub fn same_entity(a: Option<EntityRef>, b: Option<EntityRef>) -> bool {
    matches!((a, b), (Some(a), Some(b)) if a == b)
}
