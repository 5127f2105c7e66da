//! Error types for parcel storage
//!
//! Storage errors are passed through from rusqlite as-is. A missing row on a
//! single-row lookup surfaces as [`rusqlite::Error::QueryReturnedNoRows`];
//! use [`Error::is_not_found`] to recognise it.

use thiserror::Error;

/// Result type alias for parcel storage operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for parcel storage
#[derive(Error, Debug)]
pub enum Error {
    /// The database could not be opened
    #[error("failed to open database at {path}: {source}")]
    Open {
        /// Path that was passed to the engine
        path: String,
        /// Underlying engine error
        #[source]
        source: rusqlite::Error,
    },

    /// Statement execution error, including "no rows" on single-row lookups
    #[error(transparent)]
    Storage(#[from] rusqlite::Error),

    /// Statement execution error with minimal context
    #[error("db exec error: {0}")]
    Exec(#[source] rusqlite::Error),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// True when the engine reported that a single-row lookup matched nothing.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::Storage(rusqlite::Error::QueryReturnedNoRows))
    }
}
