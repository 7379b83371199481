//! Room lifecycle error types.

use crate::{models::RoomId, store::StoreError};
use thiserror::Error;

/// Room lifecycle errors
#[derive(Debug, Error)]
pub enum RoomError {
    /// Input rejected before touching the store (empty id, blank name)
    #[error("Validation error: {0}")]
    Validation(String),

    /// Room absent at join/check time
    #[error("Room not found: {0}")]
    NotFound(RoomId),

    /// Non-creator attempted a creator-only action (only when enforcement is on)
    #[error("User {user_id} is not allowed to {action}")]
    Unauthorized { action: String, user_id: String },

    /// Snapshot could not be interpreted as a room
    #[error("Invalid room snapshot: {0}")]
    InvalidSnapshot(#[from] serde_json::Error),

    /// Transport failure on read or write
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

impl RoomError {
    /// Message safe to show to end users
    ///
    /// Transport and snapshot details stay in the logs.
    pub fn client_message(&self) -> String {
        match self {
            RoomError::Store(_) => "Connection problem, please try again".to_string(),
            RoomError::InvalidSnapshot(_) => "Room data is unavailable".to_string(),
            RoomError::NotFound(_) => "Room does not exist".to_string(),
            RoomError::Unauthorized { .. } => "Only the room creator can do that".to_string(),
            RoomError::Validation(_) => self.to_string(),
        }
    }
}

/// Result type for room operations
pub type RoomResult<T> = Result<T, RoomError>;
