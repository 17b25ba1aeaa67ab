//! Error taxonomy for the sync service.
//!
//! Validation and storage failures surface to the write caller; delivery
//! failures during a broadcast never do — they only remove the failing
//! connection.

use thiserror::Error;

/// Persistence layer failures.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("state serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("database task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// Failures a sync request can surface to its caller.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Malformed write request (e.g. missing `objects`).
    #[error("invalid state payload: {0}")]
    Validation(String),

    /// Admin password header missing or mismatched.
    #[error("unauthorized")]
    Unauthorized,

    /// Persistence unavailable or failed; no broadcast happens on this path.
    #[error(transparent)]
    Storage(#[from] StoreError),
}
