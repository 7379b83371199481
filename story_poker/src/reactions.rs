//! Ephemeral emoji reactions thrown at participants.
//!
//! Reactions live under `reactions/{id}` and are swept by every client once
//! they are older than the TTL. Concurrent sweeps remove the same keys, which
//! is harmless.

use crate::{
    models::{Reaction, Room},
    room::{RoomError, RoomManager, RoomResult},
    store::{StoreError, StorePatch, StorePath},
};
use chrono::Utc;
use std::time::Duration;
use uuid::Uuid;

#[derive(Clone)]
pub struct ReactionBoard {
    rooms: RoomManager,
    ttl: Duration,
}

impl ReactionBoard {
    pub fn new(rooms: RoomManager, ttl: Duration) -> Self {
        Self { rooms, ttl }
    }

    /// Throw `emoji` at `target_user_id`; returns the reaction id
    pub async fn add_reaction(&self, room_id: &str, target_user_id: &str, emoji: &str) -> RoomResult<String> {
        if emoji.trim().is_empty() {
            return Err(RoomError::Validation("reaction must not be empty".to_string()));
        }

        let reaction = Reaction {
            user_id: target_user_id.to_string(),
            emoji: emoji.to_string(),
            timestamp: Utc::now().timestamp_millis(),
        };

        let reaction_id = Uuid::new_v4().simple().to_string();
        self.rooms
            .store()
            .set(
                &StorePath::reactions(room_id).child(&reaction_id),
                serde_json::to_value(&reaction).map_err(StoreError::from)?,
            )
            .await?;

        Ok(reaction_id)
    }

    /// Ids of reactions older than the TTL at `now_ms`
    pub fn expired(&self, room: &Room, now_ms: i64) -> Vec<String> {
        let ttl_ms = i64::try_from(self.ttl.as_millis()).unwrap_or(i64::MAX);
        let cutoff = now_ms.saturating_sub(ttl_ms);

        room.reactions
            .iter()
            .filter(|(_, reaction)| reaction.timestamp < cutoff)
            .map(|(id, _)| id.clone())
            .collect()
    }

    /// Remove expired reactions in one patch; returns how many were removed
    pub async fn clean_old_reactions(&self, room_id: &str, now_ms: i64) -> RoomResult<usize> {
        let room = self.rooms.snapshot(room_id).await?;
        let expired = self.expired(&room, now_ms);
        if expired.is_empty() {
            return Ok(0);
        }

        let patch = expired
            .iter()
            .fold(StorePatch::new(), |patch, id| patch.clear(id.as_str()));
        self.rooms
            .store()
            .patch(&StorePath::reactions(room_id), patch)
            .await?;

        log::debug!("Room {}: swept {} reactions", room_id, expired.len());
        Ok(expired.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{models::Identity, store::MemoryStore};
    use std::sync::Arc;

    #[tokio::test]
    async fn test_add_and_sweep() {
        let store = Arc::new(MemoryStore::new());
        let rooms = RoomManager::new(store, Identity::new("alice", "Alice"));
        let room_id = rooms.create_room("r").await.unwrap();
        let board = ReactionBoard::new(rooms.clone(), Duration::from_secs(10));

        let id = board.add_reaction(&room_id, "alice", "🎉").await.unwrap();
        let room = rooms.snapshot(&room_id).await.unwrap();
        let reaction = &room.reactions[&id];
        assert_eq!(reaction.emoji, "🎉");

        let fresh = reaction.timestamp + 5_000;
        assert_eq!(board.clean_old_reactions(&room_id, fresh).await.unwrap(), 0);

        let stale = reaction.timestamp + 10_001;
        assert_eq!(board.clean_old_reactions(&room_id, stale).await.unwrap(), 1);
        assert!(rooms.snapshot(&room_id).await.unwrap().reactions.is_empty());
    }

    #[tokio::test]
    async fn test_empty_reaction_rejected() {
        let store = Arc::new(MemoryStore::new());
        let rooms = RoomManager::new(store, Identity::new("alice", "Alice"));
        let board = ReactionBoard::new(rooms, Duration::from_secs(10));

        let result = board.add_reaction("r", "alice", " ").await;
        assert!(matches!(result, Err(RoomError::Validation(_))));
    }
}
