//! Error types for the milou mailbox engine.

use thiserror::Error;

/// Common error type for milou operations.
#[derive(Error, Debug)]
pub enum MilouError {
    /// Store (database) error.
    ///
    /// The only fatal class: it aborts the current operation and
    /// propagates unchanged. Errors from rusqlite are automatically
    /// converted.
    #[error("store error: {0}")]
    Store(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Authentication error (login).
    #[error("authentication error: {0}")]
    Auth(String),

    /// Authorization error: the requester is neither sender nor recipient.
    #[error("not allowed: {0}")]
    Authorization(String),

    /// Validation error for user input.
    #[error("validation error: {0}")]
    Validation(String),

    /// Resource not found.
    #[error("{0} not found")]
    NotFound(String),

    /// Uniqueness conflict (duplicate account email).
    #[error("conflict: {0}")]
    Conflict(String),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

// Constraint violations that carry domain meaning (duplicate email,
// duplicate code) are mapped to typed errors at the repository layer
// before this catch-all applies.
impl From<rusqlite::Error> for MilouError {
    fn from(e: rusqlite::Error) -> Self {
        MilouError::Store(e.to_string())
    }
}

/// Result type alias for milou operations.
pub type Result<T> = std::result::Result<T, MilouError>;
