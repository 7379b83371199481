//! Voting round error types.

use super::state_machine::RoundTransition;
use crate::{models::RoundStatus, room::RoomError, store::StoreError};
use thiserror::Error;

/// Voting round errors
#[derive(Debug, Error)]
pub enum VotingError {
    #[error("can't {transition} while round is {from}")]
    InvalidTransition {
        from: RoundStatus,
        transition: RoundTransition,
    },

    #[error("cards can only be picked while voting (round is {0})")]
    VotingClosed(RoundStatus),

    #[error("user {0} is not a participant")]
    NotParticipant(String),

    #[error(transparent)]
    Room(#[from] RoomError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Result type for voting operations
pub type VotingResult<T> = Result<T, VotingError>;
