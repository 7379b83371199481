//! Self-declared breaks with an optional countdown.
//!
//! Only the owning participant's client decrements `breakSeconds`, one tick
//! at a time, persisting every step. If that client goes away the countdown
//! stalls until it comes back.

use crate::{
    models::{BreakStatus, Participant},
    room::{RoomError, RoomManager, RoomResult},
    store::StorePatch,
};

/// A break choice offered to participants
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BreakOption {
    pub label: &'static str,
    pub status: BreakStatus,
    pub seconds: u32,
}

/// Break presets: open-ended, 2 minutes, 5 minutes
pub const BREAK_OPTIONS: [BreakOption; 3] = [
    BreakOption {
        label: "Indefinite",
        status: BreakStatus::Indefinite,
        seconds: 0,
    },
    BreakOption {
        label: "2 min",
        status: BreakStatus::Time,
        seconds: 120,
    },
    BreakOption {
        label: "5 min",
        status: BreakStatus::Time,
        seconds: 300,
    },
];

/// Outcome of one countdown tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BreakTick {
    /// Seconds left after this tick
    Continue(u32),
    /// Countdown hit zero and the break was cleared
    Ended,
    /// Participant is not on a timed break
    Idle,
}

/// Break writes for the caller's own participant entry
#[derive(Clone)]
pub struct BreakTimer {
    rooms: RoomManager,
}

impl BreakTimer {
    pub fn new(rooms: RoomManager) -> Self {
        Self { rooms }
    }

    /// Write `{breakStatus, breakSeconds}` in one call
    ///
    /// # Errors
    ///
    /// * `RoomError::Validation` - Timed break without seconds
    pub async fn set_break(&self, room_id: &str, status: BreakStatus, seconds: u32) -> RoomResult<()> {
        let seconds = match status {
            BreakStatus::Time if seconds == 0 => {
                return Err(RoomError::Validation(
                    "timed break needs a positive duration".to_string(),
                ));
            }
            BreakStatus::Time => seconds,
            BreakStatus::None | BreakStatus::Indefinite => 0,
        };

        self.rooms
            .patch_self(room_id, break_patch(status, seconds))
            .await?;

        log::info!(
            "User {} break in room {}: {} ({}s)",
            self.rooms.user_id(),
            room_id,
            status,
            seconds
        );
        Ok(())
    }

    pub async fn clear_break(&self, room_id: &str) -> RoomResult<()> {
        self.set_break(room_id, BreakStatus::None, 0).await
    }

    /// Advance the countdown by one tick.
    ///
    /// # Arguments
    ///
    /// * `participant` - Caller's entry from the latest snapshot
    pub async fn tick(&self, room_id: &str, participant: &Participant) -> RoomResult<BreakTick> {
        if participant.break_status != BreakStatus::Time {
            return Ok(BreakTick::Idle);
        }

        let remaining = participant.break_seconds.saturating_sub(1);
        if remaining == 0 {
            self.clear_break(room_id).await?;
            return Ok(BreakTick::Ended);
        }

        self.rooms
            .patch_self(room_id, StorePatch::new().set("breakSeconds", remaining))
            .await?;
        Ok(BreakTick::Continue(remaining))
    }
}

fn break_patch(status: BreakStatus, seconds: u32) -> StorePatch {
    StorePatch::new()
        .set("breakStatus", status.to_string())
        .set("breakSeconds", seconds)
}

/// Remaining time as `m:ss`
pub fn format_remaining(seconds: u32) -> String {
    format!("{}:{:02}", seconds / 60, seconds % 60)
}
