//! # Story Poker
//!
//! Session coordination and voting-consensus logic for a real-time planning
//! poker tool.
//!
//! There is no server process: every client talks to a shared,
//! eventually-consistent room document and derives the same conclusions from
//! the same snapshots. Writes from different clients may race; the store
//! resolves same-field races last-write-wins.
//!
//! ## Round lifecycle
//!
//! - **Waiting**: room created, participants joining
//! - **Voting**: every participant privately picks a card
//! - **Completed**: cards revealed (each client delays the visible flip)
//! - **Voting** again, with every point reset in the same write
//!
//! ## Core Modules
//!
//! - [`store`]: shared document store interface and in-memory implementation
//! - [`models`]: typed room, participant, card and raffle records
//! - [`room`]: create/join/leave/kick and presence
//! - [`voting`]: round state machine, card selection, reveal delay
//! - [`tally`]: average, nearest card, proximity, consensus, outliers
//! - [`raffle`]: roster, draw arbitration and winner recording
//! - [`breaks`]: self-declared breaks with a countdown
//! - [`reactions`]: ephemeral emoji reactions
//! - [`session`]: per-client loop owning all local timers
//!
//! ## Example
//!
//! ```
//! use story_poker::models::{CardValue, Participant, Identity};
//! use story_poker::tally;
//!
//! let mut a = Participant::joining(&Identity::new("a", "A"));
//! let mut b = Participant::joining(&Identity::new("b", "B"));
//! a.point = Some(CardValue::Points(3));
//! b.point = Some(CardValue::Points(5));
//!
//! let summary = tally::summarize([&a, &b]);
//! assert_eq!(summary.average, 4.0);
//! assert_eq!(summary.rounded_average, CardValue::Points(3));
//! ```

pub mod breaks;
pub mod config;
pub mod models;
pub mod raffle;
pub mod reactions;
pub mod room;
pub mod session;
pub mod store;
pub mod tally;
pub mod voting;

pub use breaks::{BREAK_OPTIONS, BreakOption, BreakTick, BreakTimer};
pub use config::SessionConfig;
pub use models::{
    BreakStatus, CardValue, Identity, Participant, Raffle, RaffleStatus, RaffleWinner, Room,
    RoomId, RoundStatus, UserId,
};
pub use raffle::{DrawPolicy, RaffleError, RaffleManager};
pub use reactions::ReactionBoard;
pub use room::{RoomError, RoomManager};
pub use session::{ClientSession, SessionEvent, SessionHandle};
pub use store::{MemoryStore, RoomStore, StoreError};
pub use tally::{TallySummary, summarize};
pub use voting::{RevealGate, VotingError, VotingRound};
