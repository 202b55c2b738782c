//! Error types for memrank
//!
//! Scoring and boosting never return errors; these only surface at the
//! configuration and store-adapter boundaries.

use thiserror::Error;

/// Main error type for memrank operations
#[derive(Error, Debug)]
pub enum RankError {
    /// Item or edge store failures (SQLite, in-memory adapters)
    #[error("Storage error: {0}")]
    Storage(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// General errors
    #[error("{0}")]
    General(String),
}

impl From<rusqlite::Error> for RankError {
    fn from(e: rusqlite::Error) -> Self {
        RankError::Storage(e.to_string())
    }
}

impl From<serde_json::Error> for RankError {
    fn from(e: serde_json::Error) -> Self {
        RankError::Serialization(e.to_string())
    }
}

/// Result type alias for memrank operations
pub type Result<T> = std::result::Result<T, RankError>;
