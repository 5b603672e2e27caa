//! Error types for domain validation

use thiserror::Error;

/// Rejections raised before a vote ever reaches the store.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Required field missing: {field}")]
    RequiredFieldMissing { field: String },

    #[error("Unknown nomination: {nomination}")]
    UnknownNomination { nomination: String },

    #[error("Choice is longer than {max} characters")]
    ChoiceTooLong { max: usize },

    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },
}

impl ValidationError {
    pub fn missing(field: &str) -> Self {
        Self::RequiredFieldMissing {
            field: field.to_string(),
        }
    }
}

/// Errors raised while building a nomination catalog.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CatalogError {
    #[error("Nomination catalog must contain at least one nomination")]
    Empty,

    #[error("Duplicate nomination in catalog: {0}")]
    Duplicate(String),
}
