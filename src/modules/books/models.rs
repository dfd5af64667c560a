use std::{collections::BTreeSet, fmt};

use catalog_kernel::{same_entity, validation::Violations, CatalogResult, Entity, EntityKind};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::isbn;
use crate::modules::authors::models::{Author, AuthorId};

/// Store-assigned book identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BookId(i64);

impl BookId {
    pub const fn new(id: i64) -> Self {
        Self(id)
    }

    pub const fn get(self) -> i64 {
        self.0
    }
}

impl fmt::Display for BookId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// A persisted book with its authors materialized from the join table.
#[derive(Debug, Clone, Serialize)]
pub struct Book {
    pub id: BookId,
    pub title: String,
    pub isbn: String,
    pub num_pages: i32,
    pub publication_date: NaiveDate,
    /// Ordered by name, then id.
    pub authors: Vec<Author>,
}

impl Book {
    pub fn author_ids(&self) -> BTreeSet<AuthorId> {
        self.authors.iter().map(|author| author.id).collect()
    }
}

impl Entity for Book {
    const KIND: EntityKind = EntityKind::Book;

    fn raw_id(&self) -> Option<i64> {
        Some(self.id.get())
    }
}

impl PartialEq for Book {
    fn eq(&self, other: &Self) -> bool {
        same_entity(self.entity_ref(), other.entity_ref())
    }
}

impl Eq for Book {}

/// Book candidate that has not been stored yet. `isbn` is already normalized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewBook {
    pub title: String,
    pub isbn: String,
    pub num_pages: i32,
    pub publication_date: NaiveDate,
    pub author_ids: BTreeSet<AuthorId>,
}

/// Reference to an existing author inside a book payload; other author
/// fields sent by clients are ignored.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AuthorRef {
    pub id: Option<i64>,
}

/// Request body for create and update.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BookPayload {
    pub id: Option<i64>,
    pub title: Option<String>,
    pub isbn: Option<String>,
    pub num_pages: Option<i32>,
    pub publication_date: Option<NaiveDate>,
    pub authors: Option<Vec<AuthorRef>>,
}

impl BookPayload {
    pub fn validate(self) -> CatalogResult<NewBook> {
        let mut violations = Violations::new("Book");

        violations.check(self.id.is_none(), "id", "must be null");
        let title = violations.required_text("title", self.title.as_deref());

        let isbn = match violations.required_text("isbn", self.isbn.as_deref()) {
            Some(raw) => {
                let parsed = isbn::parse(&raw);
                violations.check(parsed.is_some(), "isbn", "invalid ISBN");
                parsed
            }
            None => None,
        };

        let num_pages = violations.required("num_pages", self.num_pages.as_ref());
        if let Some(pages) = num_pages {
            violations.check(pages >= 1, "num_pages", "must be greater than or equal to 1");
        }

        let publication_date =
            violations.required("publication_date", self.publication_date.as_ref());

        let mut author_ids = BTreeSet::new();
        match &self.authors {
            None => violations.push("authors", "must not be null"),
            Some(authors) => {
                for (index, author) in authors.iter().enumerate() {
                    match author.id {
                        Some(id) => {
                            author_ids.insert(AuthorId::new(id));
                        }
                        None => violations.push(&format!("authors[{index}].id"), "must not be null"),
                    }
                }
            }
        }

        violations.finish()?;

        Ok(NewBook {
            title: title.unwrap_or_default(),
            isbn: isbn.unwrap_or_default(),
            num_pages: num_pages.unwrap_or_default(),
            publication_date: publication_date.unwrap_or_default(),
            author_ids,
        })
    }
}
