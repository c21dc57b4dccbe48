//! Persistence for book records.

mod memory;
mod surreal;

pub use memory::MemoryBookStore;
pub use surreal::SurrealBookStore;
#[cfg(test)]
pub(crate) use surreal::ISBN_INDEX;

use async_trait::async_trait;
use thiserror::Error;

use super::models::{Book, BookChanges, ListQuery, NewBook};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("a book with isbn '{0}' already exists")]
    DuplicateIsbn(String),

    #[error("database error: {0}")]
    Database(#[from] surrealdb::Error),

    #[error("unreadable book record: {0}")]
    Corrupt(String),
}

/// Storage operations behind the book routes.
///
/// Lookups by an unknown id are not errors: they yield `Ok(None)`.
#[async_trait]
pub trait BookStore: Send + Sync {
    /// Short backend name for logs.
    fn backend(&self) -> &'static str;

    /// Persist a new record. Fails with [`StoreError::DuplicateIsbn`] when the
    /// isbn is already taken.
    async fn create(&self, book: NewBook) -> Result<Book, StoreError>;

    async fn list(&self, query: &ListQuery) -> Result<Vec<Book>, StoreError>;

    async fn find(&self, id: &str) -> Result<Option<Book>, StoreError>;

    /// Apply `changes` to the record and return it as stored afterwards.
    async fn update(&self, id: &str, changes: BookChanges) -> Result<Option<Book>, StoreError>;

    /// Remove the record, returning it if it existed.
    async fn delete(&self, id: &str) -> Result<Option<Book>, StoreError>;
}
