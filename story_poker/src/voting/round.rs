//! Store-backed round transitions and card selection.

use super::{
    errors::{VotingError, VotingResult},
    state_machine::RoundTransition,
};
use crate::{
    breaks::BreakTimer,
    models::{CardValue, Room, RoundStatus},
    room::RoomManager,
    store::{StorePatch, StorePath},
};
use serde_json::Value;

/// Voting round operations for one client
#[derive(Clone)]
pub struct VotingRound {
    rooms: RoomManager,
    breaks: BreakTimer,
}

impl VotingRound {
    pub fn new(rooms: RoomManager) -> Self {
        let breaks = BreakTimer::new(rooms.clone());
        Self { rooms, breaks }
    }

    /// `waiting -> voting`
    pub async fn start(&self, room_id: &str) -> VotingResult<RoundStatus> {
        self.transition(room_id, RoundTransition::Start).await
    }

    /// `voting -> completed`
    pub async fn reveal(&self, room_id: &str) -> VotingResult<RoundStatus> {
        self.transition(room_id, RoundTransition::Reveal).await
    }

    /// `completed -> voting`, clearing every point in the same write
    pub async fn start_again(&self, room_id: &str) -> VotingResult<RoundStatus> {
        self.transition(room_id, RoundTransition::StartAgain).await
    }

    async fn transition(
        &self,
        room_id: &str,
        transition: RoundTransition,
    ) -> VotingResult<RoundStatus> {
        let room = self.rooms.snapshot(room_id).await?;
        self.rooms
            .ensure_creator(&room, &format!("{transition} the round"))?;

        let (next, patch) = room.status.apply(transition, &room.participants)?;
        self.rooms
            .store()
            .patch(&StorePath::room(room_id), patch)
            .await?;

        log::info!(
            "Room {}: {} -> {} by {}",
            room_id,
            room.status,
            next,
            self.rooms.user_id()
        );
        Ok(next)
    }

    /// Pick (or un-pick) a card for the caller.
    ///
    /// Picking the card already held clears the point. A caller on break
    /// leaves the break first, in a separate write.
    ///
    /// # Arguments
    ///
    /// * `room` - Latest observed snapshot
    /// * `card` - Card clicked
    ///
    /// # Returns
    ///
    /// * `VotingResult<Option<CardValue>>` - The point now recorded
    pub async fn select_card(&self, room: &Room, card: CardValue) -> VotingResult<Option<CardValue>> {
        if room.status != RoundStatus::Voting {
            return Err(VotingError::VotingClosed(room.status));
        }

        let user_id = self.rooms.user_id();
        let participant = room
            .participant(user_id)
            .ok_or_else(|| VotingError::NotParticipant(user_id.to_string()))?;

        if participant.is_on_break() {
            self.breaks.clear_break(&room.room_id).await?;
        }

        let point = if participant.point == Some(card) {
            None
        } else {
            Some(card)
        };

        let value = point.map_or(Value::Null, |card| Value::String(card.to_string()));
        self.rooms
            .patch_self(&room.room_id, StorePatch::new().set("point", value))
            .await?;

        log::debug!("User {} picked {:?} in room {}", user_id, point, room.room_id);
        Ok(point)
    }
}
