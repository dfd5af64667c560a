//! Book↔author relation maintenance.
//!
//! The relation is stored only as join rows; both sides are read from the same
//! rows, so "B lists A" and "A lists B" can never disagree.

use std::collections::BTreeSet;

use super::models::BookId;
use crate::modules::authors::models::AuthorId;

/// One join row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Authorship {
    pub book_id: BookId,
    pub author_id: AuthorId,
}

/// What an update has to do to the book's join rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthorshipChange {
    Unchanged,
    /// Drop every row of the book, then insert one per author.
    Replace(BTreeSet<AuthorId>),
}

/// Join rows for a freshly inserted book.
pub fn attach_on_create(book_id: BookId, author_ids: &BTreeSet<AuthorId>) -> Vec<Authorship> {
    author_ids
        .iter()
        .map(|&author_id| Authorship { book_id, author_id })
        .collect()
}

pub fn reconcile(current: &BTreeSet<AuthorId>, proposed: &BTreeSet<AuthorId>) -> AuthorshipChange {
    if current == proposed {
        AuthorshipChange::Unchanged
    } else {
        AuthorshipChange::Replace(proposed.clone())
    }
}

/// In-memory join table.
#[derive(Debug, Clone, Default)]
pub struct Authorships {
    rows: BTreeSet<(BookId, AuthorId)>,
}

impl Authorships {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn attach(&mut self, rows: impl IntoIterator<Item = Authorship>) {
        self.rows
            .extend(rows.into_iter().map(|row| (row.book_id, row.author_id)));
    }

    pub fn replace(&mut self, book_id: BookId, author_ids: &BTreeSet<AuthorId>) {
        self.detach_book(book_id);
        self.attach(attach_on_create(book_id, author_ids));
    }

    pub fn apply(&mut self, book_id: BookId, change: &AuthorshipChange) {
        if let AuthorshipChange::Replace(author_ids) = change {
            self.replace(book_id, author_ids);
        }
    }

    pub fn detach_book(&mut self, book_id: BookId) {
        self.rows.retain(|(book, _)| *book != book_id);
    }

    pub fn detach_author(&mut self, author_id: AuthorId) {
        self.rows.retain(|(_, author)| *author != author_id);
    }

    pub fn authors_of(&self, book_id: BookId) -> BTreeSet<AuthorId> {
        self.rows
            .range((book_id, AuthorId::new(i64::MIN))..=(book_id, AuthorId::new(i64::MAX)))
            .map(|(_, author)| *author)
            .collect()
    }

    pub fn books_of(&self, author_id: AuthorId) -> BTreeSet<BookId> {
        self.rows
            .iter()
            .filter(|(_, author)| *author == author_id)
            .map(|(book, _)| *book)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
