//! Error types for plusfs
//!
//! Provides a unified error type for all operations. Every entry operation
//! reports failure through [`PfsError`]; the front end decides how each kind
//! is shown to the user.

use thiserror::Error;

/// Result type alias using PfsError
pub type Result<T> = std::result::Result<T, PfsError>;

/// Unified error type for plusfs operations
#[derive(Debug, Error)]
pub enum PfsError {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // -------------------------------------------------------------------------
    // Namespace Errors
    // -------------------------------------------------------------------------
    #[error("No such file or directory: {0}")]
    NotFound(String),

    #[error("Already exists: {0}")]
    AlreadyExists(String),

    #[error("Directory not empty: {0}")]
    NotEmpty(String),

    #[error("Not a file: {0}")]
    NotAFile(String),

    #[error("Not a directory: {0}")]
    NotADirectory(String),

    #[error("Invalid path: {0}")]
    InvalidPath(String),

    // -------------------------------------------------------------------------
    // Operation Errors
    // -------------------------------------------------------------------------
    #[error("Invalid destination: {0}")]
    InvalidDestination(String),

    #[error("Invalid source: {0}")]
    InvalidSource(String),

    // -------------------------------------------------------------------------
    // Storage Errors
    // -------------------------------------------------------------------------
    #[error("Corrupt store: {0}")]
    CorruptStore(String),

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

impl PfsError {
    /// Process exit code for this error kind
    ///
    /// Groups related kinds so scripts can branch on the category of failure.
    pub fn exit_code(&self) -> i32 {
        match self {
            PfsError::NotFound(_) => 1,
            PfsError::AlreadyExists(_) | PfsError::NotEmpty(_) => 2,
            PfsError::NotAFile(_) | PfsError::NotADirectory(_) => 3,
            PfsError::InvalidPath(_)
            | PfsError::InvalidDestination(_)
            | PfsError::InvalidSource(_)
            | PfsError::Config(_) => 4,
            PfsError::CorruptStore(_) | PfsError::Serialization(_) => 5,
            PfsError::Io(_) => 6,
        }
    }
}
