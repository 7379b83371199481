//! Shared document store interface.
//!
//! Every client talks to the same eventually-consistent room document tree.
//! This module defines the contract the rest of the crate depends on:
//!
//! - [`RoomStore`]: snapshot reads, whole-snapshot subscriptions, field
//!   set/patch/remove
//! - [`StorePath`] / [`StorePatch`]: addressing and atomic multi-field updates
//! - [`MemoryStore`]: in-process implementation used by tests and the simulator
//!
//! Writes to different fields never conflict. Concurrent writes to the same
//! field resolve last-write-wins with no merge.
//!
//! ## Example
//!
//! ```
//! use story_poker::store::{MemoryStore, RoomStore, StorePatch, StorePath};
//! use serde_json::json;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let store = MemoryStore::new();
//! store.set(&StorePath::room("r1"), json!({ "roomName": "Sprint 12" })).await?;
//! store
//!     .patch(&StorePath::room("r1"), StorePatch::new().set("status", "voting"))
//!     .await?;
//!
//! let status = store.get(&StorePath::room("r1").child("status")).await?;
//! assert_eq!(status, Some(json!("voting")));
//! # Ok(())
//! # }
//! ```

pub mod errors;
pub mod memory;
pub mod path;

pub use errors::{StoreError, StoreResult};
pub use memory::MemoryStore;
pub use path::{ROOMS_ROOT, StorePatch, StorePath};

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::broadcast::{self, error::RecvError};

/// Whole room document as last observed; `None` when the room is absent
pub type Snapshot = Option<Value>;

/// Contract of the shared room document store.
///
/// Implementations must deliver complete room snapshots (not diffs) to every
/// subscriber after each successful write.
#[async_trait]
pub trait RoomStore: Send + Sync {
    /// Read the value at `path`, if any
    async fn get(&self, path: &StorePath) -> StoreResult<Option<Value>>;

    /// Subscribe to every change of a room document
    async fn subscribe(&self, room_id: &str) -> StoreResult<Subscription>;

    /// Overwrite the value at `path`; `null` removes it
    async fn set(&self, path: &StorePath, value: Value) -> StoreResult<()>;

    /// Apply all fields of `patch` relative to `path` in one atomic write
    async fn patch(&self, path: &StorePath, patch: StorePatch) -> StoreResult<()>;

    /// Remove the value at `path`
    async fn remove(&self, path: &StorePath) -> StoreResult<()>;
}

/// Push-based stream of whole-room snapshots.
///
/// The first item is the state at subscription time.
pub struct Subscription {
    room_id: String,
    initial: Option<Snapshot>,
    updates: broadcast::Receiver<Snapshot>,
}

impl Subscription {
    pub fn new(
        room_id: impl Into<String>,
        current: Snapshot,
        updates: broadcast::Receiver<Snapshot>,
    ) -> Self {
        Self {
            room_id: room_id.into(),
            initial: Some(current),
            updates,
        }
    }

    pub fn room_id(&self) -> &str {
        &self.room_id
    }

    /// Next snapshot, or `None` once the store closed the channel.
    ///
    /// Cancel-safe. A lagging subscriber skips straight to newer snapshots.
    pub async fn next(&mut self) -> Option<Snapshot> {
        if let Some(current) = self.initial.take() {
            return Some(current);
        }

        loop {
            match self.updates.recv().await {
                Ok(snapshot) => return Some(snapshot),
                Err(RecvError::Lagged(skipped)) => {
                    log::warn!(
                        "Subscription to room {} lagged, skipped {} snapshots",
                        self.room_id,
                        skipped
                    );
                }
                Err(RecvError::Closed) => return None,
            }
        }
    }
}
