//! Voting round state machine.
//!
//! States cycle `waiting -> voting -> completed -> voting -> ...`:
//! - [`RoundStatus::apply`]: pure transition returning the next status and
//!   the store patch that realises it
//! - [`VotingRound`]: reads the room, applies a transition, writes the patch
//!   in one call; also handles card selection
//! - [`RevealGate`]: per-client reveal delay, a presentation concern that is
//!   never written to the store

pub mod errors;
pub mod reveal;
pub mod round;
pub mod state_machine;

pub use errors::{VotingError, VotingResult};
pub use reveal::{RevealAction, RevealGate};
pub use round::VotingRound;
pub use state_machine::RoundTransition;
