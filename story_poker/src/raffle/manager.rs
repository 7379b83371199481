//! Store-backed raffle operations.

use super::{
    draw::{draw_pool, draw_winner},
    errors::{RaffleError, RaffleResult},
    state_machine::RaffleTransition,
};
use crate::{
    models::{MANUAL_ENTRY_PREFIX, RaffleEntry, RaffleType, RaffleWinner, Room},
    room::{RoomError, RoomManager},
    store::{StoreError, StorePath},
};
use rand::Rng;
use serde_json::{Value, json};
use uuid::Uuid;

/// Raffle roster and lifecycle for one client
#[derive(Clone)]
pub struct RaffleManager {
    rooms: RoomManager,
}

impl RaffleManager {
    pub fn new(rooms: RoomManager) -> Self {
        Self { rooms }
    }

    pub async fn set_type(&self, room_id: &str, raffle_type: RaffleType) -> RaffleResult<()> {
        self.rooms
            .store()
            .set(
                &StorePath::raffle(room_id).child("type"),
                Value::String(raffle_type.to_string()),
            )
            .await?;
        Ok(())
    }

    /// Add a room member to the roster; re-adding is a no-op
    pub async fn add_participant(&self, room_id: &str, user_id: &str) -> RaffleResult<()> {
        if user_id.trim().is_empty() {
            return Err(RoomError::Validation("user id must not be empty".to_string()).into());
        }

        let entry = serde_json::to_value(RaffleEntry::Member {
            user_id: user_id.to_string(),
        })
        .map_err(StoreError::from)?;

        self.rooms
            .store()
            .set(&entry_path(room_id, user_id), entry)
            .await?;
        Ok(())
    }

    /// Add a free-text entry
    ///
    /// # Returns
    ///
    /// * `RaffleResult<String>` - Generated `manual-...` entry id
    pub async fn add_manual_participant(&self, room_id: &str, name: &str) -> RaffleResult<String> {
        let name = name.trim();
        if name.is_empty() {
            return Err(RaffleError::BlankName);
        }

        let entry_id = format!("{MANUAL_ENTRY_PREFIX}{}", Uuid::new_v4().simple());
        self.rooms
            .store()
            .set(&entry_path(room_id, &entry_id), json!({ "name": name }))
            .await?;

        Ok(entry_id)
    }

    pub async fn remove_participant(&self, room_id: &str, entry_id: &str) -> RaffleResult<()> {
        if entry_id.trim().is_empty() {
            return Err(RaffleError::UnknownEntry(entry_id.to_string()));
        }
        self.rooms
            .store()
            .remove(&entry_path(room_id, entry_id))
            .await?;
        Ok(())
    }

    /// `none -> pending`; rejected with an empty roster
    pub async fn start(&self, room_id: &str) -> RaffleResult<()> {
        let room = self.rooms.snapshot(room_id).await?;
        self.rooms.ensure_creator(&room, "start the raffle")?;

        self.apply(&room, RaffleTransition::Start).await?;
        log::info!("Room {}: raffle started by {}", room_id, self.rooms.user_id());
        Ok(())
    }

    /// Record `winner` unless one is already set.
    ///
    /// Re-reads the room first so a client whose countdown expired late does
    /// not overwrite a recorded winner.
    ///
    /// # Returns
    ///
    /// * `RaffleResult<bool>` - Whether this call wrote the winner
    pub async fn complete(&self, room_id: &str, winner: RaffleWinner) -> RaffleResult<bool> {
        let room = self.rooms.snapshot(room_id).await?;
        let name = winner.name.clone();

        let written = self.apply(&room, RaffleTransition::Complete(winner)).await?;
        if written {
            log::info!("Room {}: raffle winner {} drawn by {}", room_id, name, self.rooms.user_id());
        } else {
            log::debug!("Room {}: raffle winner already recorded", room_id);
        }
        Ok(written)
    }

    /// Clear status and winner for another draw, keeping the roster
    pub async fn reset_for_new_draw(&self, room_id: &str) -> RaffleResult<()> {
        let room = self.rooms.snapshot(room_id).await?;
        self.apply(&room, RaffleTransition::Reset).await?;
        Ok(())
    }

    /// Draw from `room` and record the result
    ///
    /// # Returns
    ///
    /// * `RaffleResult<Option<RaffleWinner>>` - Winner written by this call
    pub async fn draw(&self, room_id: &str) -> RaffleResult<Option<RaffleWinner>> {
        let room = self.rooms.snapshot(room_id).await?;
        let winner = {
            let mut rng = rand::rng();
            Self::pick_winner(&room, &mut rng)
        };

        let Some(winner) = winner else {
            log::warn!("Room {}: no eligible raffle entries", room_id);
            return Ok(None);
        };

        let written = self.complete(room_id, winner.clone()).await?;
        Ok(written.then_some(winner))
    }

    /// Uniform pick over the room's current draw pool
    pub fn pick_winner<R: Rng + ?Sized>(room: &Room, rng: &mut R) -> Option<RaffleWinner> {
        let raffle = room.raffle_or_default();
        let pool = draw_pool(&raffle, &room.participants);
        draw_winner(&pool, rng)
    }

    async fn apply(&self, room: &Room, transition: RaffleTransition) -> RaffleResult<bool> {
        let Some(patch) = room.raffle_or_default().apply(transition)? else {
            return Ok(false);
        };

        self.rooms
            .store()
            .patch(&StorePath::raffle(&room.room_id), patch)
            .await?;
        Ok(true)
    }
}

fn entry_path(room_id: &str, entry_id: &str) -> StorePath {
    StorePath::raffle(room_id)
        .child("participants")
        .child(entry_id)
}
