//! Field-level validation shared by the request schema and the book model.

use serde::Serialize;
use thiserror::Error;

pub const ISBN_LENGTH_MESSAGE: &str = "ISBN must be exactly 10 or 13 characters long";
pub const GENRE_MESSAGE: &str = "Genre must be one of the predefined values";
pub const COPIES_MESSAGE: &str = "Copies must be a positive number";

/// One rejected field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

/// Every problem found while validating one payload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Error)]
#[error("{}", join(.errors))]
pub struct ValidationErrors {
    errors: Vec<FieldError>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn single(field: &'static str, message: impl Into<String>) -> Self {
        let mut errors = Self::new();
        errors.push(field, message);
        errors
    }

    pub fn push(&mut self, field: &'static str, message: impl Into<String>) {
        self.errors.push(FieldError {
            field,
            message: message.into(),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn errors(&self) -> &[FieldError] {
        &self.errors
    }

    pub fn has_field(&self, field: &str) -> bool {
        self.errors.iter().any(|error| error.field == field)
    }

    /// `Ok(value)` when nothing was recorded.
    pub fn finish<T>(self, value: T) -> Result<T, Self> {
        if self.is_empty() {
            Ok(value)
        } else {
            Err(self)
        }
    }
}

fn join(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(|error| format!("{}: {}", error.field, error.message))
        .collect::<Vec<_>>()
        .join("; ")
}

fn required(field: &str) -> String {
    format!("{field} is required")
}

pub fn isbn_has_valid_length(isbn: &str) -> bool {
    matches!(isbn.chars().count(), 10 | 13)
}

/// Trim `value`, recording a "required" error when nothing is left.
pub fn required_trimmed(errors: &mut ValidationErrors, field: &'static str, value: &str) -> String {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        errors.push(field, required(field));
    }
    trimmed.to_string()
}

/// Unwrap an update field that may be omitted but not cleared: a key sent
/// as `null` records a "required" error.
pub fn not_null<T>(
    errors: &mut ValidationErrors,
    field: &'static str,
    value: Option<Option<T>>,
) -> Option<T> {
    match value {
        Some(None) => {
            errors.push(field, required(field));
            None
        }
        value => value.flatten(),
    }
}

/// Convert a signed copy count, recording an error when it is negative or
/// does not fit.
pub fn copies(errors: &mut ValidationErrors, value: i64) -> u32 {
    match u32::try_from(value) {
        Ok(copies) => copies,
        Err(_) if value < 0 => {
            errors.push("copies", COPIES_MESSAGE);
            0
        }
        Err(_) => {
            errors.push("copies", format!("copies must not exceed {}", u32::MAX));
            0
        }
    }
}
