//! HTTP handlers for the books module.
//!
//! Every failure of an operation is reported with that operation's fixed
//! status: 400 for create and update, 500 for list, get and delete. Lookups
//! of unknown ids answer 200 with `book: null`.

use std::sync::Arc;

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use shelf_http::error::{AppError, Failure};

use super::models::{
    Book, BookChanges, CreateBookRequest, ListQuery, NewBook, SortDirection, SortField,
    UpdateBookRequest, DEFAULT_LIST_LIMIT,
};
use super::store::{BookStore, StoreError};
use super::validation::ValidationErrors;

pub type SharedStore = Arc<dyn BookStore>;

const VALIDATION_FAILED: &str = "Validation failed";
const LIST_FAILED: &str = "Failed to retrieve books";
const GET_FAILED: &str = "Failed to retrieve book";
const DELETE_FAILED: &str = "Failed to delete book";

pub fn router(store: SharedStore) -> Router {
    Router::new()
        .route("/", get(list_books).post(create_book))
        .route("/health", get(health_check))
        .route(
            "/{id}",
            get(get_book).put(update_book).delete(delete_book),
        )
        .with_state(store)
}

/// Success envelope for single-record operations.
#[derive(Debug, Serialize, Deserialize)]
pub struct BookEnvelope {
    pub success: bool,
    pub message: String,
    pub book: Option<Book>,
}

impl BookEnvelope {
    fn new(message: &str, book: Option<Book>) -> Json<Self> {
        Json(Self {
            success: true,
            message: message.to_string(),
            book,
        })
    }
}

/// Success envelope for listings.
#[derive(Debug, Serialize, Deserialize)]
pub struct BooksEnvelope {
    pub success: bool,
    pub message: String,
    pub books: Vec<Book>,
}

/// Raw listing parameters, as they appear in the query string.
#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    pub filter: Option<String>,
    #[serde(rename = "sortBy")]
    pub sort_by: Option<String>,
    pub sort: Option<String>,
    pub limit: Option<String>,
}

impl ListParams {
    /// Resolve defaults: an empty `filter` or `sortBy` counts as absent.
    pub fn into_query(self) -> Result<ListQuery, ValidationErrors> {
        let sort_by = match self.sort_by.as_deref() {
            None | Some("") => SortField::default(),
            Some(name) => SortField::parse(name).ok_or_else(|| {
                ValidationErrors::single("sortBy", format!("cannot sort by unknown field '{name}'"))
            })?,
        };

        Ok(ListQuery {
            genre: self.filter.filter(|genre| !genre.is_empty()),
            sort_by,
            direction: SortDirection::from_param(self.sort.as_deref()),
            limit: parse_limit(self.limit.as_deref()),
        })
    }
}

/// Leading-integer parse of `limit`: `"5abc"` is 5, a negative value counts
/// by magnitude, and zero or no digits fall back to the default.
pub fn parse_limit(raw: Option<&str>) -> usize {
    let Some(raw) = raw else {
        return DEFAULT_LIST_LIMIT;
    };

    let raw = raw.trim_start();
    let unsigned = raw
        .strip_prefix('-')
        .or_else(|| raw.strip_prefix('+'))
        .unwrap_or(raw);
    let digits_end = unsigned
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(unsigned.len());

    match unsigned[..digits_end].parse::<usize>() {
        Ok(0) => DEFAULT_LIST_LIMIT,
        Ok(limit) => limit,
        // Too many digits to fit still means "more than we have".
        Err(_) if digits_end > 0 => usize::MAX,
        Err(_) => DEFAULT_LIST_LIMIT,
    }
}

impl From<ValidationErrors> for AppError {
    fn from(errors: ValidationErrors) -> Self {
        let details = errors
            .errors()
            .iter()
            .map(|error| json!({ "field": error.field, "message": error.message }))
            .collect();
        AppError::validation(details, errors.to_string())
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::DuplicateIsbn(isbn) => {
                let message = format!("a book with isbn '{isbn}' already exists");
                AppError::conflict(
                    vec![json!({ "field": "isbn", "message": message.clone() })],
                    message,
                )
            }
            other => AppError::Internal(anyhow::Error::new(other)),
        }
    }
}

fn rejected(err: impl Into<AppError>) -> Failure {
    err.into().with_status(StatusCode::BAD_REQUEST, VALIDATION_FAILED)
}

fn json_rejection(rejection: JsonRejection) -> AppError {
    AppError::bad_request(rejection.body_text())
}

async fn health_check() -> &'static str {
    "books module is healthy"
}

async fn create_book(
    State(store): State<SharedStore>,
    payload: Result<Json<CreateBookRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<BookEnvelope>), Failure> {
    let Json(request) = payload.map_err(|rejection| rejected(json_rejection(rejection)))?;
    request.validate().map_err(rejected)?;

    let new_book = NewBook::from_request(request).map_err(rejected)?;
    let book = store.create(new_book).await.map_err(rejected)?;

    tracing::info!(book_id = %book.id, isbn = %book.isbn, "book created");
    Ok((
        StatusCode::CREATED,
        BookEnvelope::new("Book created successfully", Some(book)),
    ))
}

async fn list_books(
    State(store): State<SharedStore>,
    params: Result<Query<ListParams>, QueryRejection>,
) -> Result<Json<BooksEnvelope>, Failure> {
    let failed = |err: AppError| err.with_status(StatusCode::INTERNAL_SERVER_ERROR, LIST_FAILED);

    let Query(params) =
        params.map_err(|rejection| failed(AppError::bad_request(rejection.body_text())))?;
    let query = params.into_query().map_err(|err| failed(err.into()))?;

    let books = store
        .list(&query)
        .await
        .map_err(|err| failed(err.into()))?;

    tracing::debug!(
        count = books.len(),
        genre = ?query.genre,
        sort_by = query.sort_by.as_str(),
        "books listed"
    );
    Ok(Json(BooksEnvelope {
        success: true,
        message: "Books retrieved successfully".to_string(),
        books,
    }))
}

async fn get_book(
    State(store): State<SharedStore>,
    Path(id): Path<String>,
) -> Result<Json<BookEnvelope>, Failure> {
    let book = store.find(&id).await.map_err(|err| {
        AppError::from(err).with_status(StatusCode::INTERNAL_SERVER_ERROR, GET_FAILED)
    })?;

    Ok(BookEnvelope::new("Book retrieved successfully", book))
}

async fn update_book(
    State(store): State<SharedStore>,
    Path(id): Path<String>,
    payload: Result<Json<UpdateBookRequest>, JsonRejection>,
) -> Result<Json<BookEnvelope>, Failure> {
    let Json(request) = payload.map_err(|rejection| rejected(json_rejection(rejection)))?;

    let changes = BookChanges::from_request(request).map_err(rejected)?;
    let book = store.update(&id, changes).await.map_err(rejected)?;

    match &book {
        Some(book) => tracing::info!(book_id = %book.id, "book updated"),
        None => tracing::debug!(book_id = %id, "update matched no book"),
    }
    Ok(BookEnvelope::new("Book updated successfully", book))
}

async fn delete_book(
    State(store): State<SharedStore>,
    Path(id): Path<String>,
) -> Result<Json<BookEnvelope>, Failure> {
    let removed = store.delete(&id).await.map_err(|err| {
        AppError::from(err).with_status(StatusCode::INTERNAL_SERVER_ERROR, DELETE_FAILED)
    })?;

    if removed.is_some() {
        tracing::info!(book_id = %id, "book deleted");
    }
    Ok(BookEnvelope::new("Book deleted successfully", None))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(
        filter: Option<&str>,
        sort_by: Option<&str>,
        sort: Option<&str>,
        limit: Option<&str>,
    ) -> ListParams {
        ListParams {
            filter: filter.map(str::to_string),
            sort_by: sort_by.map(str::to_string),
            sort: sort.map(str::to_string),
            limit: limit.map(str::to_string),
        }
    }

    #[test]
    fn empty_params_resolve_to_defaults() {
        assert_eq!(ListParams::default().into_query().unwrap(), ListQuery::default());
        assert_eq!(
            params(Some(""), Some(""), None, Some("")).into_query().unwrap(),
            ListQuery::default()
        );
    }

    #[test]
    fn params_map_onto_query() {
        let query = params(Some("SCIENCE"), Some("title"), Some("asc"), Some("3"))
            .into_query()
            .unwrap();

        assert_eq!(
            query,
            ListQuery {
                genre: Some("SCIENCE".to_string()),
                sort_by: SortField::Title,
                direction: SortDirection::Ascending,
                limit: 3,
            }
        );
    }

    #[test]
    fn unknown_sort_field_is_rejected() {
        let errors = params(None, Some("$where"), None, None)
            .into_query()
            .unwrap_err();
        assert!(errors.has_field("sortBy"));
    }

    #[test]
    fn limit_parses_leading_integer() {
        assert_eq!(parse_limit(None), DEFAULT_LIST_LIMIT);
        assert_eq!(parse_limit(Some("25")), 25);
        assert_eq!(parse_limit(Some(" 7 books")), 7);
        assert_eq!(parse_limit(Some("2.9")), 2);
        assert_eq!(parse_limit(Some("-4")), 4);
        assert_eq!(parse_limit(Some("0")), DEFAULT_LIST_LIMIT);
        assert_eq!(parse_limit(Some("ten")), DEFAULT_LIST_LIMIT);
        assert_eq!(parse_limit(Some("-")), DEFAULT_LIST_LIMIT);
        assert_eq!(parse_limit(Some("99999999999999999999999")), usize::MAX);
    }

    #[test]
    fn duplicate_isbn_maps_to_conflict() {
        let error = AppError::from(StoreError::DuplicateIsbn("0306406152".to_string()));
        assert!(matches!(error, AppError::Conflict { .. }));
    }
}
