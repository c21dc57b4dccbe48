use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use shelf_db::Db;
use uuid::Uuid;

use super::{BookStore, StoreError};
use crate::modules::books::models::{Book, BookChanges, Genre, ListQuery, NewBook};

/// Unique index backing the isbn invariant, defined by the `001_init`
/// migration.
pub(crate) const ISBN_INDEX: &str = "book_isbn_unique";

/// Columns returned for every read. `id` is reduced to its key; the raw
/// timestamps stay selected so they can be ordered on, and are decoded from
/// their string casts.
const PROJECTION: &str = "record::id(id) AS id, title, author, genre, isbn, description, \
                          copies, available, createdAt, updatedAt, \
                          <string> createdAt AS createdAtText, <string> updatedAt AS updatedAtText";

/// Row shape as selected with [`PROJECTION`].
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BookRow {
    id: String,
    title: String,
    author: String,
    genre: Genre,
    isbn: String,
    description: String,
    copies: u32,
    available: bool,
    created_at_text: String,
    updated_at_text: String,
}

fn parse_timestamp(field: &str, value: &str) -> Result<DateTime<Utc>, StoreError> {
    DateTime::parse_from_rfc3339(value)
        .map(|timestamp| timestamp.with_timezone(&Utc))
        .map_err(|err| StoreError::Corrupt(format!("{field} '{value}' is not RFC 3339: {err}")))
}

impl TryFrom<BookRow> for Book {
    type Error = StoreError;

    fn try_from(row: BookRow) -> Result<Self, Self::Error> {
        Ok(Book {
            created_at: parse_timestamp("createdAt", &row.created_at_text)?,
            updated_at: parse_timestamp("updatedAt", &row.updated_at_text)?,
            id: row.id,
            title: row.title,
            author: row.author,
            genre: row.genre,
            isbn: row.isbn,
            description: row.description,
            copies: row.copies,
            available: row.available,
        })
    }
}

/// Book store on SurrealDB. Field assertions and timestamps are enforced by
/// the table schema; see the books module migrations.
#[derive(Clone)]
pub struct SurrealBookStore {
    db: Db,
}

impl SurrealBookStore {
    pub fn new(db: Db) -> Self {
        Self { db }
    }

    /// Build the listing statement. Sort field and direction come from closed
    /// enums, so interpolating them is safe; the genre and limit are bound.
    fn list_statement(query: &ListQuery) -> String {
        let mut statement = format!("SELECT {PROJECTION} FROM book");
        if query.genre.is_some() {
            statement.push_str(" WHERE genre = $genre");
        }
        statement.push_str(&format!(
            " ORDER BY {} {} LIMIT $limit",
            query.sort_by.as_str(),
            query.direction.as_sql()
        ));
        statement
    }
}

/// Map a write failure on the isbn index to [`StoreError::DuplicateIsbn`].
fn classify_write_error(err: surrealdb::Error, isbn: Option<&str>) -> StoreError {
    match isbn {
        Some(isbn) if err.to_string().contains(ISBN_INDEX) => {
            StoreError::DuplicateIsbn(isbn.to_string())
        }
        _ => StoreError::Database(err),
    }
}

fn first(rows: Vec<BookRow>) -> Result<Option<Book>, StoreError> {
    rows.into_iter().next().map(Book::try_from).transpose()
}

#[async_trait]
impl BookStore for SurrealBookStore {
    fn backend(&self) -> &'static str {
        "surrealdb"
    }

    async fn create(&self, book: NewBook) -> Result<Book, StoreError> {
        let id = Uuid::now_v7().to_string();
        let isbn = book.isbn().to_string();

        let mut response = self
            .db
            .query("CREATE type::thing('book', $id) CONTENT $content RETURN NONE")
            .query(format!("SELECT {PROJECTION} FROM type::thing('book', $id)"))
            .bind(("id", id.clone()))
            .bind(("content", book))
            .await?
            .check()
            .map_err(|err| classify_write_error(err, Some(&isbn)))?;

        let rows: Vec<BookRow> = response.take(1)?;
        first(rows)?.ok_or_else(|| StoreError::Corrupt(format!("book {id} missing after create")))
    }

    async fn list(&self, query: &ListQuery) -> Result<Vec<Book>, StoreError> {
        // SurrealDB rejects a LIMIT above u32::MAX.
        let limit = i64::from(u32::try_from(query.limit).unwrap_or(u32::MAX));

        let mut response = self
            .db
            .query(Self::list_statement(query))
            .bind(("genre", query.genre.clone()))
            .bind(("limit", limit))
            .await?;

        let rows: Vec<BookRow> = response.take(0)?;
        rows.into_iter().map(Book::try_from).collect()
    }

    async fn find(&self, id: &str) -> Result<Option<Book>, StoreError> {
        let mut response = self
            .db
            .query(format!("SELECT {PROJECTION} FROM type::thing('book', $id)"))
            .bind(("id", id.to_string()))
            .await?;

        let rows: Vec<BookRow> = response.take(0)?;
        first(rows)
    }

    async fn update(&self, id: &str, changes: BookChanges) -> Result<Option<Book>, StoreError> {
        let isbn = changes.isbn().map(str::to_string);

        // UPDATE on a missing record id is a no-op, so the follow-up SELECT
        // comes back empty.
        let mut response = self
            .db
            .query("UPDATE type::thing('book', $id) MERGE $changes RETURN NONE")
            .query(format!("SELECT {PROJECTION} FROM type::thing('book', $id)"))
            .bind(("id", id.to_string()))
            .bind(("changes", changes))
            .await?
            .check()
            .map_err(|err| classify_write_error(err, isbn.as_deref()))?;

        let rows: Vec<BookRow> = response.take(1)?;
        first(rows)
    }

    async fn delete(&self, id: &str) -> Result<Option<Book>, StoreError> {
        let mut response = self
            .db
            .query(format!("SELECT {PROJECTION} FROM type::thing('book', $id)"))
            .query("DELETE type::thing('book', $id)")
            .bind(("id", id.to_string()))
            .await?
            .check()?;

        let rows: Vec<BookRow> = response.take(0)?;
        first(rows)
    }
}
