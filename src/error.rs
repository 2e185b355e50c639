//! Error types for shelfdb
//!
//! Provides a unified error type for all operations. Backend faults are
//! converted here so no raw `rusqlite::Error` crosses the public API.

use thiserror::Error;

/// Result type alias using ShelfError
pub type Result<T> = std::result::Result<T, ShelfError>;

/// Unified error type for shelfdb operations
#[derive(Debug, Error)]
pub enum ShelfError {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // -------------------------------------------------------------------------
    // Backend Errors
    // -------------------------------------------------------------------------
    /// The database file could not be opened, created or migrated
    #[error("Backend unavailable: {0}")]
    BackendUnavailable(String),

    /// A statement failed to execute
    #[error("Backend error: {0}")]
    Backend(String),

    // -------------------------------------------------------------------------
    // Record Errors
    // -------------------------------------------------------------------------
    /// Decomposition could not determine an identity for the element at
    /// `position` (0 for a scalar)
    #[error("Missing identity for element at position {position}")]
    MissingIdentity { position: usize },

    #[error("Collection not found: {0}")]
    CollectionNotFound(String),

    /// Removal targeted identities that are not in the collection
    #[error("Identities not found in {key}: {missing:?}")]
    IdentityNotFound { key: String, missing: Vec<String> },

    // -------------------------------------------------------------------------
    // Serialization Errors
    // -------------------------------------------------------------------------
    #[error("Serialization error: {0}")]
    Serialization(String),

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<rusqlite::Error> for ShelfError {
    fn from(err: rusqlite::Error) -> Self {
        ShelfError::Backend(err.to_string())
    }
}

impl From<serde_json::Error> for ShelfError {
    fn from(err: serde_json::Error) -> Self {
        ShelfError::Serialization(err.to_string())
    }
}
