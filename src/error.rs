use std::fmt;

use serde::Serialize;
use thiserror::Error;

/// A single violated form field and the message shown next to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: &'static str,
    pub message: &'static str,
}

/// Every field-level violation found by one validation pass.
///
/// Validation never stops at the first problem, so a form can surface all of
/// its messages at once.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationErrors {
    pub errors: Vec<FieldError>,
}

impl ValidationErrors {
    pub fn push(&mut self, field: &'static str, message: &'static str) {
        self.errors.push(FieldError { field, message });
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Message for `field`, if that field failed.
    pub fn message_for(&self, field: &str) -> Option<&'static str> {
        self.errors
            .iter()
            .find(|e| e.field == field)
            .map(|e| e.message)
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let messages: Vec<&str> = self.errors.iter().map(|e| e.message).collect();
        write!(f, "{}", messages.join("; "))
    }
}

/// Everything the dashboard can report back to a user.
///
/// None of these are fatal: the store is left consistent and the caller shows
/// the message.
#[derive(Debug, Error)]
pub enum DashboardError {
    #[error("validation failed: {0}")]
    Validation(ValidationErrors),

    #[error("Invalid range '{input}'. Total records: {total}")]
    InvalidRange { input: String, total: usize },

    #[error("The uploaded file contains no rows")]
    EmptyImport,

    #[error("No data available to export")]
    NothingToExport,

    #[error("Unsupported file type: {0}")]
    UnsupportedFormat(String),

    #[error("File is {size} bytes, the limit is {limit} bytes")]
    FileTooLarge { size: usize, limit: usize },

    #[error("Failed to read file: {0}")]
    Decode(String),

    #[error("Failed to write file: {0}")]
    Encode(String),

    #[error("storage error: {0}")]
    Storage(#[from] std::io::Error),

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl From<ValidationErrors> for DashboardError {
    fn from(errors: ValidationErrors) -> Self {
        Self::Validation(errors)
    }
}

pub type DashboardResult<T> = Result<T, DashboardError>;
