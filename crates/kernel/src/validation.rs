//! Collector for field-level rule failures.

use crate::error::{CatalogError, FieldViolation};

/// Accumulates violations for one entity and turns them into a single
/// `CatalogError::Validation` whose message reads
/// `"<Entity> not saved: field - message; ..."`.
#[derive(Debug)]
pub struct Violations {
    entity: &'static str,
    items: Vec<FieldViolation>,
}

impl Violations {
    pub fn new(entity: &'static str) -> Self {
        Self {
            entity,
            items: Vec::new(),
        }
    }

    pub fn push(&mut self, field: &str, message: &str) {
        self.items.push(FieldViolation::new(field, message));
    }

    /// Records `message` for `field` unless `ok` holds.
    pub fn check(&mut self, ok: bool, field: &str, message: &str) {
        if !ok {
            self.push(field, message);
        }
    }

    /// Returns the trimmed-nonempty value, recording a violation otherwise.
    pub fn required_text(&mut self, field: &str, value: Option<&str>) -> Option<String> {
        match value {
            Some(text) if !text.trim().is_empty() => Some(text.to_string()),
            _ => {
                self.push(field, "must not be blank");
                None
            }
        }
    }

    pub fn required<T: Clone>(&mut self, field: &str, value: Option<&T>) -> Option<T> {
        if value.is_none() {
            self.push(field, "must not be null");
        }
        value.cloned()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn finish(self) -> Result<(), CatalogError> {
        if self.items.is_empty() {
            return Ok(());
        }

        let mut message = format!("{} not saved: ", self.entity);
        for violation in &self.items {
            message.push_str(&format!("{} - {}; ", violation.field, violation.message));
        }

        Err(CatalogError::Validation {
            message,
            violations: self.items,
        })
    }
}
