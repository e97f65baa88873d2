/// Error Module
///
/// This module defines the error taxonomy for sqlhelper. Every driver error
/// is classified before it is turned into one of these variants, so callers
/// can branch on the kind of failure instead of parsing messages.
use thiserror::Error;

/// Error type for all sqlhelper operations.
///
/// Driver failures carry the SQLSTATE-tagged message they were classified
/// from, unchanged:
/// - Connection failures (any class, raised by `connect`)
/// - Unique-constraint violations, with the offending key when known
/// - Authorization failures and read-only writes
/// - SQL syntax errors
/// - Everything else the driver reports
#[derive(Error, Debug)]
pub enum SqlHelperError {
    /// The database could not be opened or verified
    #[error("Connection error: {message}")]
    Connection { message: String },

    /// A unique or primary key constraint rejected the row
    #[error("Duplicate key error: {message}")]
    DuplicateKey {
        /// Column named in the violated key, if the driver reported one
        column: Option<String>,
        message: String,
    },

    /// The session is not allowed to perform the statement
    #[error("Access denied: {message}")]
    AccessDenied { message: String },

    /// The generated statement was rejected by the SQL parser
    #[error("Syntax error: {message}")]
    Syntax { message: String },

    /// A driver error the classifier does not recognise
    #[error("Database error: {message}")]
    UnknownDatabase { message: String },

    /// The request was rejected before any SQL was built
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Configuration loading and validation errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// File system and I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON rendering errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl SqlHelperError {
    /// The driver message this error was classified from, if any.
    pub fn driver_message(&self) -> Option<&str> {
        match self {
            SqlHelperError::Connection { message }
            | SqlHelperError::DuplicateKey { message, .. }
            | SqlHelperError::AccessDenied { message }
            | SqlHelperError::Syntax { message }
            | SqlHelperError::UnknownDatabase { message } => Some(message),
            _ => None,
        }
    }
}

/// Type alias for Result to use SqlHelperError as the error type.
pub type Result<T> = std::result::Result<T, SqlHelperError>;
