use std::fmt;

use catalog_kernel::{same_entity, validation::Violations, CatalogResult, Entity, EntityKind};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Store-assigned author identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AuthorId(i64);

impl AuthorId {
    pub const fn new(id: i64) -> Self {
        Self(id)
    }

    pub const fn get(self) -> i64 {
        self.0
    }
}

impl fmt::Display for AuthorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// A persisted author. Its books live in the join table and are read through
/// `BookRepository::find_by_author`.
#[derive(Debug, Clone, Serialize)]
pub struct Author {
    pub id: AuthorId,
    pub name: String,
    pub birth_date: NaiveDate,
    pub country: String,
}

impl Entity for Author {
    const KIND: EntityKind = EntityKind::Author;

    fn raw_id(&self) -> Option<i64> {
        Some(self.id.get())
    }
}

impl PartialEq for Author {
    fn eq(&self, other: &Self) -> bool {
        same_entity(self.entity_ref(), other.entity_ref())
    }
}

impl Eq for Author {}

/// Author candidate that has not been stored yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAuthor {
    pub name: String,
    pub birth_date: NaiveDate,
    pub country: String,
}

impl NewAuthor {
    pub fn into_author(self, id: AuthorId) -> Author {
        Author {
            id,
            name: self.name,
            birth_date: self.birth_date,
            country: self.country,
        }
    }
}

/// Request body for create and update.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AuthorPayload {
    pub id: Option<i64>,
    pub name: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub country: Option<String>,
}

impl AuthorPayload {
    pub fn validate(self) -> CatalogResult<NewAuthor> {
        let mut violations = Violations::new("Author");

        violations.check(self.id.is_none(), "id", "must be null");
        let name = violations.required_text("name", self.name.as_deref());
        let birth_date = violations.required("birth_date", self.birth_date.as_ref());
        let country = violations.required_text("country", self.country.as_deref());

        violations.finish()?;

        Ok(NewAuthor {
            name: name.unwrap_or_default(),
            birth_date: birth_date.unwrap_or_default(),
            country: country.unwrap_or_default(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use catalog_kernel::CatalogError;

    fn payload() -> AuthorPayload {
        AuthorPayload {
            id: None,
            name: Some("Лев Толстой".into()),
            birth_date: NaiveDate::from_ymd_opt(1828, 9, 9),
            country: Some("Россия".into()),
        }
    }

    #[test]
    fn valid_payload_becomes_candidate() {
        let author = payload().validate().unwrap();
        assert_eq!(author.name, "Лев Толстой");
        assert_eq!(author.country, "Россия");
    }

    #[test]
    fn violations_are_aggregated() {
        let err = AuthorPayload {
            id: Some(3),
            name: Some("  ".into()),
            ..AuthorPayload::default()
        }
        .validate()
        .unwrap_err();

        match err {
            CatalogError::Validation {
                message,
                violations,
            } => {
                assert_eq!(
                    message,
                    "Author not saved: id - must be null; name - must not be blank; \
                     birth_date - must not be null; country - must not be blank; "
                );
                assert_eq!(violations.len(), 4);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn identity_is_by_id() {
        let a = payload().validate().unwrap().into_author(AuthorId::new(1));
        let mut b = a.clone();
        b.name = "Другое имя".into();
        assert_eq!(a, b);

        let c = payload().validate().unwrap().into_author(AuthorId::new(2));
        assert_ne!(a, c);
    }
}
