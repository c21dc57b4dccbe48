use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{BookStore, StoreError};
use crate::modules::books::models::{Book, BookChanges, ListQuery, NewBook, SortDirection};

/// Process-local store. Records keep insertion order, which also breaks
/// ties when sorting.
#[derive(Debug, Default)]
pub struct MemoryBookStore {
    books: RwLock<Vec<Book>>,
}

impl MemoryBookStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.books.read().await.len()
    }
}

#[async_trait]
impl BookStore for MemoryBookStore {
    fn backend(&self) -> &'static str {
        "memory"
    }

    async fn create(&self, book: NewBook) -> Result<Book, StoreError> {
        let mut books = self.books.write().await;

        if books.iter().any(|existing| existing.isbn == book.isbn()) {
            return Err(StoreError::DuplicateIsbn(book.isbn().to_string()));
        }

        let book = Book::from_new(Uuid::now_v7().to_string(), book, Utc::now());
        books.push(book.clone());
        Ok(book)
    }

    async fn list(&self, query: &ListQuery) -> Result<Vec<Book>, StoreError> {
        let books = self.books.read().await;

        let mut matched: Vec<&Book> = books
            .iter()
            .filter(|book| {
                query
                    .genre
                    .as_deref()
                    .map_or(true, |genre| book.genre.as_str() == genre)
            })
            .collect();

        // Stable sorts: equal keys stay in insertion order either way.
        match query.direction {
            SortDirection::Ascending => matched.sort_by(|a, b| query.sort_by.compare(a, b)),
            SortDirection::Descending => matched.sort_by(|a, b| query.sort_by.compare(b, a)),
        }

        Ok(matched
            .into_iter()
            .take(query.limit)
            .cloned()
            .collect())
    }

    async fn find(&self, id: &str) -> Result<Option<Book>, StoreError> {
        let books = self.books.read().await;
        Ok(books.iter().find(|book| book.id == id).cloned())
    }

    async fn update(&self, id: &str, changes: BookChanges) -> Result<Option<Book>, StoreError> {
        let mut books = self.books.write().await;

        let Some(index) = books.iter().position(|book| book.id == id) else {
            return Ok(None);
        };

        if let Some(isbn) = changes.isbn() {
            if books.iter().any(|book| book.id != id && book.isbn == isbn) {
                return Err(StoreError::DuplicateIsbn(isbn.to_string()));
            }
        }

        let book = &mut books[index];
        book.apply(&changes, Utc::now());
        Ok(Some(book.clone()))
    }

    async fn delete(&self, id: &str) -> Result<Option<Book>, StoreError> {
        let mut books = self.books.write().await;
        Ok(books
            .iter()
            .position(|book| book.id == id)
            .map(|index| books.remove(index)))
    }
}
