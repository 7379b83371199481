//! Raffle mini-feature: pick a random participant.
//!
//! The roster mixes room members (drawn only while active) and free-text
//! entries. Starting a raffle writes `status = pending`; every client then
//! runs a local countdown and, on expiry, the client(s) allowed by the
//! [`DrawPolicy`] draw a winner and write it together with
//! `status = completed`. `complete` re-reads the raffle and refuses to replace
//! an existing winner.
//!
//! ## Example
//!
//! ```
//! use story_poker::models::{Identity, RaffleStatus};
//! use story_poker::raffle::RaffleManager;
//! use story_poker::room::RoomManager;
//! use story_poker::store::MemoryStore;
//! use std::sync::Arc;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let rooms = RoomManager::new(Arc::new(MemoryStore::new()), Identity::new("alice", "Alice"));
//! let room_id = rooms.create_room("Friday demo").await?;
//!
//! let raffles = RaffleManager::new(rooms.clone());
//! raffles.add_participant(&room_id, "alice").await?;
//! raffles.add_manual_participant(&room_id, "Guest").await?;
//! raffles.start(&room_id).await?;
//!
//! let winner = raffles.draw(&room_id).await?;
//! assert!(winner.is_some());
//! let raffle = rooms.snapshot(&room_id).await?.raffle_or_default();
//! assert_eq!(raffle.status, RaffleStatus::Completed);
//! # Ok(())
//! # }
//! ```

pub mod draw;
pub mod errors;
pub mod manager;
pub mod state_machine;

pub use draw::{DrawPolicy, designated_drawer, draw_pool, draw_winner};
pub use errors::{RaffleError, RaffleResult};
pub use manager::RaffleManager;
pub use state_machine::RaffleTransition;
