//! Multi-field book search filter.
//!
//! Every non-empty field is a case-insensitive substring match; empty fields
//! match everything and the fields are combined with AND. Stores evaluate the
//! filter either with `matches` or with the SQL `LIKE` patterns.

use serde::Deserialize;

use super::{isbn, models::Book};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchFilter {
    title: String,
    isbn: String,
    author: String,
}

impl SearchFilter {
    pub fn new(title: &str, isbn_fragment: &str, author: &str) -> Self {
        Self {
            title: title.to_string(),
            isbn: isbn::normalize(isbn_fragment),
            author: author.to_string(),
        }
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn isbn(&self) -> &str {
        &self.isbn
    }

    pub fn author(&self) -> &str {
        &self.author
    }

    /// Filter values in the order they are echoed by the empty-page error.
    pub fn values(&self) -> [&str; 3] {
        [&self.title, &self.isbn, &self.author]
    }

    pub fn matches(&self, book: &Book) -> bool {
        contains_ignore_case(&book.title, &self.title)
            && contains_ignore_case(&book.isbn, &self.isbn)
            && (self.author.is_empty()
                || book
                    .authors
                    .iter()
                    .any(|author| contains_ignore_case(&author.name, &self.author)))
    }

    pub fn title_pattern(&self) -> Option<String> {
        like_pattern(&self.title)
    }

    pub fn isbn_pattern(&self) -> Option<String> {
        like_pattern(&self.isbn)
    }

    pub fn author_pattern(&self) -> Option<String> {
        like_pattern(&self.author)
    }
}

/// Raw `?title=&isbn=&author=&page=&size=` query.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub isbn: String,
    #[serde(default)]
    pub author: String,
    pub page: Option<i64>,
    pub size: Option<i64>,
}

impl SearchQuery {
    pub fn filter(&self) -> SearchFilter {
        SearchFilter::new(&self.title, &self.isbn, &self.author)
    }
}

fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    needle.is_empty() || haystack.to_lowercase().contains(&needle.to_lowercase())
}

/// `%fragment%` with `\`, `%` and `_` escaped; `None` for an empty fragment.
fn like_pattern(fragment: &str) -> Option<String> {
    if fragment.is_empty() {
        return None;
    }

    let mut pattern = String::with_capacity(fragment.len() + 2);
    pattern.push('%');
    for c in fragment.chars() {
        if matches!(c, '\\' | '%' | '_') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    Some(pattern)
}
