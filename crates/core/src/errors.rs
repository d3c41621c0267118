//! Core error types for the holdings pipeline.
//!
//! Every failure a single fund can hit is a variant of [`Error`]. The batch
//! driver keeps these per fund, so one broken export never aborts a run.

use thiserror::Error;

/// Type alias for Result using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Root error type for the holdings pipeline.
#[derive(Error, Debug)]
pub enum Error {
    /// No adapter is registered for the broker.
    #[error("No adapter registered for broker '{0}'")]
    UnknownBroker(String),

    /// The bytes could not be parsed under the adapter's declared source kind.
    #[error("Unreadable {kind} file: {reason}")]
    UnreadableFile { kind: String, reason: String },

    /// The spreadsheet XML document is not well-formed.
    #[error("Malformed spreadsheet document: {0}")]
    MalformedDocument(String),

    /// An expected worksheet or column is absent from the source.
    #[error("Schema mismatch: {0}")]
    SchemaMismatch(String),

    /// None of the required canonical columns is present in a harmonized set.
    #[error("Schema violation: none of the required columns {required:?} is present (found {found:?})")]
    SchemaViolation {
        required: Vec<String>,
        found: Vec<String>,
    },

    /// The file source could not provide the bytes for a fund.
    #[error("Source unavailable for fund {fund_isin}: {reason}")]
    SourceUnavailable { fund_isin: String, reason: String },

    /// The adapter table is invalid.
    #[error("Invalid adapter configuration: {0}")]
    Configuration(String),

    #[error("Input validation failed: {0}")]
    Validation(#[from] ValidationError),

    /// Processing a fund panicked; the batch recovered and moved on.
    #[error("Processing aborted unexpectedly: {0}")]
    Internal(String),
}

impl Error {
    pub(crate) fn unreadable(kind: impl ToString, reason: impl Into<String>) -> Self {
        Error::UnreadableFile {
            kind: kind.to_string(),
            reason: reason.into(),
        }
    }

    /// Short machine-friendly label for status reports.
    pub fn code(&self) -> &'static str {
        match self {
            Error::UnknownBroker(_) => "UNKNOWN_BROKER",
            Error::UnreadableFile { .. } => "UNREADABLE_FILE",
            Error::MalformedDocument(_) => "MALFORMED_DOCUMENT",
            Error::SchemaMismatch(_) => "SCHEMA_MISMATCH",
            Error::SchemaViolation { .. } => "SCHEMA_VIOLATION",
            Error::SourceUnavailable { .. } => "SOURCE_UNAVAILABLE",
            Error::Configuration(_) => "CONFIGURATION",
            Error::Validation(_) => "VALIDATION",
            Error::Internal(_) => "INTERNAL",
        }
    }
}

/// Validation errors for low-level parsing.
#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Failed to parse decimal number: {0}")]
    DecimalParse(#[from] rust_decimal::Error),
}

// === From implementations for common error types ===

impl From<rust_decimal::Error> for Error {
    fn from(err: rust_decimal::Error) -> Self {
        Error::Validation(ValidationError::DecimalParse(err))
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Configuration(err.to_string())
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Validation(ValidationError::InvalidInput(err.to_string()))
    }
}

impl From<Error> for String {
    fn from(err: Error) -> Self {
        err.to_string()
    }
}
