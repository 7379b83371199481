//! Room lifecycle management.
//!
//! This module implements:
//! - RoomManager: create/join/leave/kick and presence toggling
//! - The page-entry flow (`enter_room`) run when a client mounts a room
//! - Room and participant edits (rename, username, avatar)
//!
//! Authorization is trust-based by default: any client may kick or drive
//! creator-only transitions. `with_creator_enforcement(true)` turns the
//! creator check into a hard error.
//!
//! ## Example
//!
//! ```
//! use story_poker::models::Identity;
//! use story_poker::room::RoomManager;
//! use story_poker::store::MemoryStore;
//! use std::sync::Arc;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let store = Arc::new(MemoryStore::new());
//! let alice = RoomManager::new(store.clone(), Identity::new("alice", "Alice"));
//! let bob = RoomManager::new(store, Identity::new("bob", "Bob"));
//!
//! let room_id = alice.create_room("Sprint 12").await?;
//! bob.join_room(&room_id).await?;
//!
//! let room = alice.snapshot(&room_id).await?;
//! assert_eq!(room.participants.len(), 2);
//! # Ok(())
//! # }
//! ```

pub mod errors;
pub mod manager;

pub use errors::{RoomError, RoomResult};
pub use manager::RoomManager;
