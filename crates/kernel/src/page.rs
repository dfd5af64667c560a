//! Pagination primitives and the empty-page guard.

use serde::Serialize;

use crate::error::{CatalogError, CatalogResult, FieldViolation};

/// A validated request for one page of results.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    index: u32,
    size: u32,
}

impl PageRequest {
    pub const DEFAULT_SIZE: u32 = 10;

    /// Build a request from raw, possibly negative, query values.
    pub fn new(index: i64, size: i64) -> CatalogResult<Self> {
        let mut violations = Vec::new();
        if index < 0 {
            violations.push(FieldViolation::new(
                "page",
                "must be greater than or equal to 0",
            ));
        } else if index > i64::from(u32::MAX) {
            violations.push(FieldViolation::new("page", "is too large"));
        }
        if size < 1 {
            violations.push(FieldViolation::new("size", "must be greater than 0"));
        } else if size > i64::from(u32::MAX) {
            violations.push(FieldViolation::new("size", "is too large"));
        }

        if !violations.is_empty() {
            let message = violations
                .iter()
                .map(|v| format!("{} - {}", v.field, v.message))
                .collect::<Vec<_>>()
                .join("; ");
            return Err(CatalogError::Validation {
                message: format!("Invalid page request: {message}"),
                violations,
            });
        }

        Ok(Self {
            index: index as u32,
            size: size as u32,
        })
    }

    pub const fn first(size: u32) -> Self {
        Self {
            index: 0,
            size: if size == 0 { 1 } else { size },
        }
    }

    pub const fn index(&self) -> u32 {
        self.index
    }

    pub const fn size(&self) -> u32 {
        self.size
    }

    /// Number of rows to skip.
    pub const fn offset(&self) -> u64 {
        self.index as u64 * self.size as u64
    }

    pub const fn limit(&self) -> u64 {
        self.size as u64
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::first(Self::DEFAULT_SIZE)
    }
}

/// An ordered slice of a larger result set.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub index: u32,
    pub size: u32,
    pub total: u64,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, request: PageRequest, total: u64) -> Self {
        Self {
            items,
            index: request.index(),
            size: request.size(),
            total,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn total_pages(&self) -> u64 {
        self.total.div_ceil(u64::from(self.size.max(1)))
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            index: self.index,
            size: self.size,
            total: self.total,
        }
    }
}

/// Request parameters echoed in the not-found message.
#[derive(Debug, Clone, Copy)]
pub enum Criteria<'a> {
    None,
    Parameter(&'a str),
    Parameters(&'a [&'a str]),
}

/// Fails with `DataNotFound` when the page holds no items.
pub fn ensure_found<T>(page: &Page<T>, criteria: Criteria<'_>) -> CatalogResult<()> {
    if !page.is_empty() {
        return Ok(());
    }

    let mut message = String::from("Data");
    match criteria {
        Criteria::None => {}
        Criteria::Parameter(value) => {
            message.push_str(&format!(" by parameter '{value}'"));
        }
        Criteria::Parameters(values) => {
            let joined = values
                .iter()
                .filter(|value| !value.is_empty())
                .copied()
                .collect::<Vec<_>>()
                .join(";");
            message.push_str(&format!(" by parameters [{joined}]"));
        }
    }
    message.push_str(" not found");

    Err(CatalogError::DataNotFound(message))
}
