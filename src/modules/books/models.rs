use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use super::validation::{self, ValidationErrors, GENRE_MESSAGE, ISBN_LENGTH_MESSAGE};

/// Genres a book may be filed under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Genre {
    Fiction,
    NonFiction,
    Science,
    History,
    Biography,
    Fantasy,
}

impl Genre {
    pub const ALL: [Genre; 6] = [
        Genre::Fiction,
        Genre::NonFiction,
        Genre::Science,
        Genre::History,
        Genre::Biography,
        Genre::Fantasy,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Genre::Fiction => "FICTION",
            Genre::NonFiction => "NON_FICTION",
            Genre::Science => "SCIENCE",
            Genre::History => "HISTORY",
            Genre::Biography => "BIOGRAPHY",
            Genre::Fantasy => "FANTASY",
        }
    }
}

impl FromStr for Genre {
    type Err = ValidationErrors;

    /// Case-insensitive: `science` and `SCIENCE` both parse.
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let upper = value.to_uppercase();
        Genre::ALL
            .into_iter()
            .find(|genre| genre.as_str() == upper)
            .ok_or_else(|| ValidationErrors::single("genre", GENRE_MESSAGE))
    }
}

impl fmt::Display for Genre {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A persisted book record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Book {
    pub id: String,
    pub title: String,
    pub author: String,
    pub genre: Genre,
    pub isbn: String,
    pub description: String,
    pub copies: u32,
    pub available: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Book {
    pub fn from_new(id: String, new_book: NewBook, now: DateTime<Utc>) -> Self {
        Self {
            id,
            title: new_book.title,
            author: new_book.author,
            genre: new_book.genre,
            isbn: new_book.isbn,
            description: new_book.description,
            copies: new_book.copies,
            available: new_book.available,
            created_at: now,
            updated_at: now,
        }
    }

    /// Overwrite the supplied fields and refresh `updated_at`.
    pub fn apply(&mut self, changes: &BookChanges, now: DateTime<Utc>) {
        if let Some(title) = &changes.title {
            self.title = title.clone();
        }
        if let Some(author) = &changes.author {
            self.author = author.clone();
        }
        if let Some(genre) = changes.genre {
            self.genre = genre;
        }
        if let Some(isbn) = &changes.isbn {
            self.isbn = isbn.clone();
        }
        if let Some(description) = &changes.description {
            self.description = description.clone();
        }
        if let Some(copies) = changes.copies {
            self.copies = copies;
        }
        if let Some(available) = changes.available {
            self.available = available;
        }
        self.updated_at = now;
    }
}

/// Inbound create payload.
///
/// Deserialization enforces field presence and types; [`validate`] adds the
/// ISBN length rule. Normalisation and the remaining rules belong to
/// [`NewBook::from_request`].
///
/// [`validate`]: CreateBookRequest::validate
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateBookRequest {
    pub title: String,
    pub author: String,
    pub genre: String,
    pub isbn: String,
    #[serde(default)]
    pub description: Option<String>,
    pub copies: i64,
    #[serde(default)]
    pub available: Option<bool>,
}

impl CreateBookRequest {
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        if !validation::isbn_has_valid_length(&self.isbn) {
            errors.push("isbn", ISBN_LENGTH_MESSAGE);
        }
        errors.finish(())
    }
}

/// Inbound update payload; every field is optional.
///
/// Fields the model requires are doubly wrapped: the outer `Option` records
/// whether the key was sent at all, so `{"title": null}` can be told apart
/// from an omitted title and rejected. `description` and `available` treat
/// `null` as omitted.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateBookRequest {
    #[serde(default, deserialize_with = "present")]
    pub title: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub author: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub genre: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub isbn: Option<Option<String>>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "present")]
    pub copies: Option<Option<i64>>,
    #[serde(default)]
    pub available: Option<bool>,
}

/// A key that is present deserializes to `Some`, even when its value is
/// `null`; a missing key falls back to `None` through `#[serde(default)]`.
fn present<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// A book that passed the model rules and is ready to be stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewBook {
    title: String,
    author: String,
    genre: Genre,
    isbn: String,
    description: String,
    copies: u32,
    available: bool,
}

impl NewBook {
    /// Normalise and validate a create request: trim text fields, uppercase
    /// the genre, apply defaults and collect every violated rule.
    pub fn from_request(request: CreateBookRequest) -> Result<Self, ValidationErrors> {
        let mut errors = ValidationErrors::new();

        let title = validation::required_trimmed(&mut errors, "title", &request.title);
        let author = validation::required_trimmed(&mut errors, "author", &request.author);
        let genre = parse_genre(&mut errors, &request.genre);
        if !validation::isbn_has_valid_length(&request.isbn) {
            errors.push("isbn", ISBN_LENGTH_MESSAGE);
        }
        let copies = validation::copies(&mut errors, request.copies);
        let description = request
            .description
            .as_deref()
            .map(str::trim)
            .unwrap_or_default()
            .to_string();

        errors.finish(Self {
            title,
            author,
            genre: genre.unwrap_or(Genre::Fiction),
            isbn: request.isbn,
            description,
            copies,
            available: request.available.unwrap_or(true),
        })
    }

    pub fn isbn(&self) -> &str {
        &self.isbn
    }
}

/// Validated partial update. Only `Some` fields are written.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BookChanges {
    #[serde(skip_serializing_if = "Option::is_none")]
    title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    author: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    genre: Option<Genre>,
    #[serde(skip_serializing_if = "Option::is_none")]
    isbn: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    copies: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    available: Option<bool>,
}

impl BookChanges {
    /// Run the model rules over the fields present in `request`.
    pub fn from_request(request: UpdateBookRequest) -> Result<Self, ValidationErrors> {
        let mut errors = ValidationErrors::new();

        let title = validation::not_null(&mut errors, "title", request.title)
            .map(|title| validation::required_trimmed(&mut errors, "title", &title));
        let author = validation::not_null(&mut errors, "author", request.author)
            .map(|author| validation::required_trimmed(&mut errors, "author", &author));
        let genre = validation::not_null(&mut errors, "genre", request.genre)
            .and_then(|genre| parse_genre(&mut errors, &genre));
        let isbn = validation::not_null(&mut errors, "isbn", request.isbn);
        if let Some(isbn) = &isbn {
            if !validation::isbn_has_valid_length(isbn) {
                errors.push("isbn", ISBN_LENGTH_MESSAGE);
            }
        }
        let copies = validation::not_null(&mut errors, "copies", request.copies)
            .map(|copies| validation::copies(&mut errors, copies));
        let description = request
            .description
            .map(|description| description.trim().to_string());

        errors.finish(Self {
            title,
            author,
            genre,
            isbn,
            description,
            copies,
            available: request.available,
        })
    }

    pub fn isbn(&self) -> Option<&str> {
        self.isbn.as_deref()
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

fn parse_genre(errors: &mut ValidationErrors, value: &str) -> Option<Genre> {
    match value.parse::<Genre>() {
        Ok(genre) => Some(genre),
        Err(_) => {
            errors.push("genre", GENRE_MESSAGE);
            None
        }
    }
}

/// Fields a listing can be ordered by, named as they appear in JSON.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortField {
    Id,
    Title,
    Author,
    Genre,
    Isbn,
    Description,
    Copies,
    Available,
    #[default]
    CreatedAt,
    UpdatedAt,
}

impl SortField {
    const ALL: [SortField; 10] = [
        SortField::Id,
        SortField::Title,
        SortField::Author,
        SortField::Genre,
        SortField::Isbn,
        SortField::Description,
        SortField::Copies,
        SortField::Available,
        SortField::CreatedAt,
        SortField::UpdatedAt,
    ];

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|field| field.as_str() == value)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SortField::Id => "id",
            SortField::Title => "title",
            SortField::Author => "author",
            SortField::Genre => "genre",
            SortField::Isbn => "isbn",
            SortField::Description => "description",
            SortField::Copies => "copies",
            SortField::Available => "available",
            SortField::CreatedAt => "createdAt",
            SortField::UpdatedAt => "updatedAt",
        }
    }

    /// Ascending order of two books on this field.
    pub fn compare(self, a: &Book, b: &Book) -> Ordering {
        match self {
            SortField::Id => a.id.cmp(&b.id),
            SortField::Title => a.title.cmp(&b.title),
            SortField::Author => a.author.cmp(&b.author),
            SortField::Genre => a.genre.as_str().cmp(b.genre.as_str()),
            SortField::Isbn => a.isbn.cmp(&b.isbn),
            SortField::Description => a.description.cmp(&b.description),
            SortField::Copies => a.copies.cmp(&b.copies),
            SortField::Available => a.available.cmp(&b.available),
            SortField::CreatedAt => a.created_at.cmp(&b.created_at),
            SortField::UpdatedAt => a.updated_at.cmp(&b.updated_at),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    Ascending,
    #[default]
    Descending,
}

impl SortDirection {
    /// `asc` sorts ascending; anything else, including nothing, descending.
    pub fn from_param(value: Option<&str>) -> Self {
        match value {
            Some("asc") => SortDirection::Ascending,
            _ => SortDirection::Descending,
        }
    }

    pub fn as_sql(self) -> &'static str {
        match self {
            SortDirection::Ascending => "ASC",
            SortDirection::Descending => "DESC",
        }
    }
}

pub const DEFAULT_LIST_LIMIT: usize = 10;

/// A resolved listing request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListQuery {
    /// Exact match on the stored genre.
    pub genre: Option<String>,
    pub sort_by: SortField,
    pub direction: SortDirection,
    pub limit: usize,
}

impl Default for ListQuery {
    fn default() -> Self {
        Self {
            genre: None,
            sort_by: SortField::default(),
            direction: SortDirection::default(),
            limit: DEFAULT_LIST_LIMIT,
        }
    }
}
