//! Schema'd record types for the shared room document.
//!
//! Snapshots arrive loosely typed from the store; [`Room::from_snapshot`]
//! validates and defaults them before any other module looks at them.

pub mod card;
pub mod raffle;
pub mod room;

pub use card::{CARD_DOMAIN, CardValue, InvalidCard, UNKNOWN_CARD};
pub use raffle::{
    DEFAULT_AVATAR_URL, MANUAL_ENTRY_PREFIX, Raffle, RaffleEntry, RaffleStatus, RaffleType,
    RaffleWinner, WinnerKind,
};
pub use room::{BreakStatus, Identity, Participant, Reaction, Room, RoomId, RoundStatus, UserId};
