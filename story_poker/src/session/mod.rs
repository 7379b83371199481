//! Client session: the per-client cooperative loop.
//!
//! This module implements:
//! - ClientSession: enters a room, follows its snapshots and owns every local
//!   timer of one client
//! - SessionHandle: stops the session (unmount), marking the user inactive
//! - Countdown/Ticker: cancellable timers posting into the session inbox
//!
//! ## Architecture
//!
//! Each session runs in its own Tokio task and selects over the room
//! subscription and an mpsc inbox fed by its timers. Sessions never talk to
//! each other; all coordination goes through the shared store, and every
//! decision (reveal, kick detection, raffle draw) is derived from the latest
//! whole-room snapshot.
//!
//! ## Example
//!
//! ```
//! use story_poker::config::SessionConfig;
//! use story_poker::models::Identity;
//! use story_poker::room::RoomManager;
//! use story_poker::session::{ClientSession, SessionEvent};
//! use story_poker::store::MemoryStore;
//! use std::sync::Arc;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let store = Arc::new(MemoryStore::new());
//! let alice = Identity::new("alice", "Alice");
//! let room_id = RoomManager::new(store.clone(), alice.clone())
//!     .create_room("Sprint 12")
//!     .await?;
//!
//! let (handle, mut events) =
//!     ClientSession::spawn(store, alice, &room_id, None, SessionConfig::default()).await?;
//!
//! assert!(matches!(events.recv().await, Some(SessionEvent::Snapshot(_))));
//! handle.shutdown().await?;
//! # Ok(())
//! # }
//! ```

pub mod actor;
pub mod messages;
pub mod timer;

pub use actor::{ClientSession, EVENT_CAPACITY, SessionHandle};
pub use messages::{SessionEvent, SessionMessage, TimerEvent};
pub use timer::{Countdown, Ticker};
