//! Store error types.

use thiserror::Error;

/// Errors raised by a [`RoomStore`](super::RoomStore) implementation
#[derive(Debug, Error)]
pub enum StoreError {
    /// Transport is unreachable (network failure, offline client)
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    /// Path contains an empty or forbidden segment
    #[error("Invalid store path: {0}")]
    InvalidPath(String),

    /// Value could not be encoded or decoded
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Subscription channel was closed by the store
    #[error("Subscription closed")]
    Closed,
}

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;
