//! Error types for the organizer ecosystem.

use rust_decimal::Decimal;
use thiserror::Error;

/// Errors that can occur in organizer operations.
#[derive(Error, Debug)]
pub enum OrganizerError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid event: {0}")]
    InvalidEvent(String),

    #[error("Event not found: {0}")]
    EventNotFound(String),

    #[error("Invalid tax input: {field} must not be negative (got {value})")]
    InvalidTaxInput { field: &'static str, value: Decimal },

    #[error("Tax calculation overflowed: {0}")]
    TaxOverflow(String),

    #[error("Invalid bracket table: {0}")]
    InvalidBracketTable(String),

    #[error("No tax table configured for year {0}")]
    TaxYearNotFound(i32),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for OrganizerError {
    fn from(e: serde_json::Error) -> Self {
        OrganizerError::Serialization(e.to_string())
    }
}

/// Result type alias for organizer operations.
pub type OrganizerResult<T> = Result<T, OrganizerError>;
