//! Room lifecycle: create, join, leave, presence and kick.

use super::errors::{RoomError, RoomResult};
use crate::{
    models::{Identity, Participant, Room, RoomId, RoundStatus},
    store::{RoomStore, StoreError, StorePatch, StorePath},
};
use chrono::Utc;
use serde_json::{Value, json};
use std::sync::Arc;
use uuid::Uuid;

/// Room lifecycle operations issued on behalf of one identity
#[derive(Clone)]
pub struct RoomManager {
    store: Arc<dyn RoomStore>,
    identity: Identity,
    enforce_creator: bool,
}

impl RoomManager {
    /// Create a new room manager
    ///
    /// # Arguments
    ///
    /// * `store` - Shared document store
    /// * `identity` - The caller all writes are issued for
    pub fn new(store: Arc<dyn RoomStore>, identity: Identity) -> Self {
        Self {
            store,
            identity,
            enforce_creator: false,
        }
    }

    /// Reject creator-only actions from other users
    #[must_use]
    pub fn with_creator_enforcement(mut self, enforce: bool) -> Self {
        self.enforce_creator = enforce;
        self
    }

    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    pub fn user_id(&self) -> &str {
        &self.identity.user_id
    }

    pub fn store(&self) -> &Arc<dyn RoomStore> {
        &self.store
    }

    /// Create a room with the caller as its only participant
    ///
    /// # Returns
    ///
    /// * `RoomResult<RoomId>` - Generated room ID
    ///
    /// # Errors
    ///
    /// * `RoomError::Validation` - Blank room name
    pub async fn create_room(&self, room_name: &str) -> RoomResult<RoomId> {
        let room_name = room_name.trim();
        if room_name.is_empty() {
            return Err(RoomError::Validation("room name must not be empty".to_string()));
        }

        let room_id = Uuid::new_v4().simple().to_string();
        let creator = Participant::joining(&self.identity);

        let document = json!({
            "roomId": room_id,
            "roomName": room_name,
            "status": RoundStatus::Waiting,
            "createdBy": self.identity.user_id,
            "createdAt": Utc::now().timestamp_millis(),
            "participants": { self.identity.user_id.clone(): creator },
        });

        self.store.set(&StorePath::room(&room_id), document).await?;
        log::info!(
            "User {} created room {} '{}'",
            self.identity.user_id,
            room_id,
            room_name
        );

        Ok(room_id)
    }

    pub async fn room_exists(&self, room_id: &str) -> RoomResult<bool> {
        validate_room_id(room_id)?;
        Ok(self.store.get(&StorePath::room(room_id)).await?.is_some())
    }

    /// Typed read of the current room snapshot
    ///
    /// # Errors
    ///
    /// * `RoomError::NotFound` - No document for `room_id`
    pub async fn snapshot(&self, room_id: &str) -> RoomResult<Room> {
        validate_room_id(room_id)?;
        let value = self
            .store
            .get(&StorePath::room(room_id))
            .await?
            .ok_or_else(|| RoomError::NotFound(room_id.to_string()))?;
        Ok(Room::from_snapshot(room_id, &value)?)
    }

    pub async fn is_participant(&self, room_id: &str, user_id: &str) -> RoomResult<bool> {
        validate_room_id(room_id)?;
        let entry = self
            .store
            .get(&StorePath::participant(room_id, user_id))
            .await?;
        Ok(entry.is_some())
    }

    /// Write (or overwrite) the caller's participant entry.
    ///
    /// Always resets `point` to null, also when rejoining mid-round.
    ///
    /// # Errors
    ///
    /// * `RoomError::NotFound` - Room absent at join time
    pub async fn join_room(&self, room_id: &str) -> RoomResult<()> {
        if !self.room_exists(room_id).await? {
            return Err(RoomError::NotFound(room_id.to_string()));
        }

        let participant = serde_json::to_value(Participant::joining(&self.identity))
            .map_err(StoreError::from)?;
        self.store
            .set(&StorePath::participant(room_id, self.user_id()), participant)
            .await?;

        log::info!("User {} joined room {}", self.identity.user_id, room_id);
        Ok(())
    }

    /// Hard-remove the caller from the room
    pub async fn leave_room(&self, room_id: &str) -> RoomResult<()> {
        validate_room_id(room_id)?;
        self.store
            .remove(&StorePath::participant(room_id, self.user_id()))
            .await?;

        log::info!("User {} left room {}", self.identity.user_id, room_id);
        Ok(())
    }

    /// Presence on (mount)
    pub async fn set_active(&self, room_id: &str) -> RoomResult<()> {
        self.write_presence(room_id, true).await
    }

    /// Presence off (unmount, tab close)
    pub async fn set_inactive(&self, room_id: &str) -> RoomResult<()> {
        self.write_presence(room_id, false).await
    }

    async fn write_presence(&self, room_id: &str, is_active: bool) -> RoomResult<()> {
        if !self.still_member(room_id, "presence update").await? {
            return Ok(());
        }

        self.store
            .set(
                &StorePath::participant(room_id, self.user_id()).child("isActive"),
                Value::Bool(is_active),
            )
            .await?;
        Ok(())
    }

    /// Remove another participant.
    ///
    /// The target's own client notices its absence on the next snapshot.
    pub async fn kick(&self, room_id: &str, target_user_id: &str) -> RoomResult<()> {
        if target_user_id.trim().is_empty() {
            return Err(RoomError::Validation("target user id must not be empty".to_string()));
        }

        if self.enforce_creator {
            let room = self.snapshot(room_id).await?;
            self.ensure_creator(&room, "kick participants")?;
        } else {
            validate_room_id(room_id)?;
        }

        self.store
            .remove(&StorePath::participant(room_id, target_user_id))
            .await?;

        log::info!(
            "User {} kicked {} from room {}",
            self.identity.user_id,
            target_user_id,
            room_id
        );
        Ok(())
    }

    /// Page-entry flow: leave the previous room's presence, verify the room,
    /// join if needed and mark the caller active.
    ///
    /// # Arguments
    ///
    /// * `room_id` - Room being entered
    /// * `previous_room` - Room the caller was last in, if any
    pub async fn enter_room(&self, room_id: &str, previous_room: Option<&str>) -> RoomResult<Room> {
        validate_room_id(room_id)?;

        if let Some(previous) = previous_room.filter(|previous| *previous != room_id) {
            self.set_inactive(previous).await?;

            if !self.room_exists(room_id).await? {
                return Err(RoomError::NotFound(room_id.to_string()));
            }
        }

        if !self.is_participant(room_id, self.user_id()).await? {
            self.join_room(room_id).await?;
        }

        self.set_active(room_id).await?;
        self.snapshot(room_id).await
    }

    pub async fn rename_room(&self, room_id: &str, room_name: &str) -> RoomResult<()> {
        validate_room_id(room_id)?;
        let room_name = room_name.trim();
        if room_name.is_empty() {
            return Err(RoomError::Validation("room name must not be empty".to_string()));
        }

        self.store
            .set(
                &StorePath::room(room_id).child("roomName"),
                Value::String(room_name.to_string()),
            )
            .await?;
        Ok(())
    }

    pub async fn update_username(&self, room_id: &str, username: &str) -> RoomResult<()> {
        let username = username.trim();
        if username.is_empty() {
            return Err(RoomError::Validation("username must not be empty".to_string()));
        }
        self.patch_self(room_id, StorePatch::new().set("username", username))
            .await
    }

    pub async fn update_avatar(&self, room_id: &str, image_url: &str) -> RoomResult<()> {
        self.patch_self(room_id, StorePatch::new().set("imageUrl", image_url))
            .await
    }

    /// Patch fields of the caller's own participant entry.
    ///
    /// Skipped once the caller was removed from the room.
    pub(crate) async fn patch_self(&self, room_id: &str, patch: StorePatch) -> RoomResult<()> {
        if !self.still_member(room_id, "participant update").await? {
            return Ok(());
        }

        self.store
            .patch(&StorePath::participant(room_id, self.user_id()), patch)
            .await?;
        Ok(())
    }

    /// A field write on a removed entry would resurrect a partial participant
    async fn still_member(&self, room_id: &str, what: &str) -> RoomResult<bool> {
        if self.is_participant(room_id, self.user_id()).await? {
            return Ok(true);
        }

        log::debug!(
            "User {} not in room {}, skipping {}",
            self.identity.user_id,
            room_id,
            what
        );
        Ok(false)
    }

    /// Check the caller may perform a creator-only action.
    ///
    /// Always passes unless creator enforcement is on.
    pub fn ensure_creator(&self, room: &Room, action: &str) -> RoomResult<()> {
        if !self.enforce_creator || room.is_creator(self.user_id()) {
            return Ok(());
        }

        log::warn!(
            "User {} attempted creator-only action '{}' in room {}",
            self.identity.user_id,
            action,
            room.room_id
        );
        Err(RoomError::Unauthorized {
            action: action.to_string(),
            user_id: self.identity.user_id.clone(),
        })
    }
}

fn validate_room_id(room_id: &str) -> RoomResult<()> {
    if room_id.trim().is_empty() {
        Err(RoomError::Validation("room id must not be empty".to_string()))
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn manager(store: &Arc<MemoryStore>, user_id: &str) -> RoomManager {
        RoomManager::new(store.clone(), Identity::new(user_id, user_id.to_uppercase()))
    }

    #[tokio::test]
    async fn test_create_room_initial_state() {
        let store = Arc::new(MemoryStore::new());
        let alice = manager(&store, "alice");

        let room_id = alice.create_room("  Sprint 12 ").await.unwrap();
        let room = alice.snapshot(&room_id).await.unwrap();

        assert_eq!(room.room_name, "Sprint 12");
        assert_eq!(room.status, RoundStatus::Waiting);
        assert_eq!(room.created_by, "alice");
        assert!(room.created_at > 0);
        assert_eq!(room.participants.len(), 1);
        assert!(room.participant("alice").unwrap().is_active);
    }

    #[tokio::test]
    async fn test_create_room_rejects_blank_name() {
        let store = Arc::new(MemoryStore::new());
        let result = manager(&store, "alice").create_room("   ").await;
        assert!(matches!(result, Err(RoomError::Validation(_))));
    }

    #[tokio::test]
    async fn test_join_missing_room() {
        let store = Arc::new(MemoryStore::new());
        let result = manager(&store, "bob").join_room("nope").await;
        assert!(matches!(result, Err(RoomError::NotFound(id)) if id == "nope"));
    }

    #[tokio::test]
    async fn test_empty_room_id_is_validation_error() {
        let store = Arc::new(MemoryStore::new());
        let result = manager(&store, "bob").join_room("").await;
        assert!(matches!(result, Err(RoomError::Validation(_))));
    }

    #[tokio::test]
    async fn test_presence_toggle_does_not_resurrect_removed_participant() {
        let store = Arc::new(MemoryStore::new());
        let alice = manager(&store, "alice");
        let bob = manager(&store, "bob");
        let room_id = alice.create_room("r").await.unwrap();

        bob.join_room(&room_id).await.unwrap();
        bob.set_inactive(&room_id).await.unwrap();
        assert!(!alice.snapshot(&room_id).await.unwrap().participant("bob").unwrap().is_active);

        alice.kick(&room_id, "bob").await.unwrap();
        bob.set_inactive(&room_id).await.unwrap();

        assert!(alice.snapshot(&room_id).await.unwrap().participant("bob").is_none());
    }

    #[tokio::test]
    async fn test_stale_client_edits_do_not_resurrect_kicked_participant() {
        let store = Arc::new(MemoryStore::new());
        let alice = manager(&store, "alice");
        let bob = manager(&store, "bob");
        let room_id = alice.create_room("r").await.unwrap();
        bob.join_room(&room_id).await.unwrap();

        alice.kick(&room_id, "bob").await.unwrap();
        bob.update_username(&room_id, "Robert").await.unwrap();
        bob.update_avatar(&room_id, "/avatars/2.png").await.unwrap();

        assert!(!alice.is_participant(&room_id, "bob").await.unwrap());
        let room = store.get(&StorePath::room(&room_id)).await.unwrap().unwrap();
        assert!(room["participants"].get("bob").is_none());
    }

    #[tokio::test]
    async fn test_kick_enforced_for_non_creator() {
        let store = Arc::new(MemoryStore::new());
        let alice = manager(&store, "alice");
        let bob = manager(&store, "bob").with_creator_enforcement(true);
        let room_id = alice.create_room("r").await.unwrap();
        bob.join_room(&room_id).await.unwrap();

        let result = bob.kick(&room_id, "alice").await;

        assert!(matches!(result, Err(RoomError::Unauthorized { .. })));
        assert!(alice.is_participant(&room_id, "alice").await.unwrap());
    }

    #[test]
    fn test_client_message_hides_transport_details() {
        let err = RoomError::Store(crate::store::StoreError::Unavailable("tcp reset".into()));
        assert!(!err.client_message().contains("tcp"));
    }
}
