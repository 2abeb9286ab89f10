//! Error types for the session-store crate

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for session store operations
pub type Result<T> = std::result::Result<T, SessionStoreError>;

#[derive(Error, Debug)]
pub enum SessionStoreError {
    /// IO operations failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// No session directory matches the query. Callers treat this as "no cached result".
    #[error("No session found for {query}")]
    SessionNotFound { query: String },

    /// A session directory exists but its document is missing or unreadable
    #[error("Malformed session document at {path:?}: {reason}")]
    MalformedSession { path: PathBuf, reason: String },

    /// Failed to create data directory
    #[error("Failed to create data directory: {path:?}")]
    DataDirectoryCreationFailed { path: PathBuf },

    /// Failed to determine system data directory
    #[error("Failed to determine system data directory")]
    SystemDataDirectoryNotFound,

    /// A `network:address` target string could not be parsed
    #[error("Invalid target {target}: {reason}")]
    InvalidTarget { target: String, reason: String },
}

impl SessionStoreError {
    /// Both variants mean "nothing usable is cached for this key".
    pub fn is_absent(&self) -> bool {
        matches!(
            self,
            SessionStoreError::SessionNotFound { .. } | SessionStoreError::MalformedSession { .. }
        )
    }
}
