//! Raffle error types.

use super::state_machine::RaffleTransition;
use crate::{models::RaffleStatus, room::RoomError, store::StoreError};
use thiserror::Error;

/// Raffle errors
#[derive(Debug, Error)]
pub enum RaffleError {
    #[error("raffle roster is empty")]
    EmptyRoster,

    #[error("can't {transition} a raffle that is {from}")]
    InvalidTransition {
        from: RaffleStatus,
        transition: RaffleTransition,
    },

    #[error("raffle entry name must not be empty")]
    BlankName,

    #[error("raffle entry {0} does not exist")]
    UnknownEntry(String),

    #[error(transparent)]
    Room(#[from] RoomError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Result type for raffle operations
pub type RaffleResult<T> = Result<T, RaffleError>;
