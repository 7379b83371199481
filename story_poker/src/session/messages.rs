//! Client session message types.

use crate::{
    models::{RaffleWinner, Reaction, Room},
    tally::TallySummary,
};
use tokio::sync::oneshot;

/// Messages delivered to a ClientSession inbox
#[derive(Debug)]
pub enum SessionMessage {
    /// A local timer fired
    Timer(TimerEvent),

    /// Unmount: mark the participant inactive and stop
    Shutdown { response: oneshot::Sender<()> },
}

/// Local timers owned by a session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerEvent {
    RevealElapsed,
    RaffleCountdownElapsed,
    BreakTick,
    SweepReactions,
}

/// What a session reports to its UI
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    /// Validated room state after every change
    Snapshot(Room),

    /// Round observed flipping to completed; cards show after the delay
    RevealCountdownStarted,

    /// Cards are now visible
    CardsRevealed(TallySummary),

    /// A new round started; cards are hidden again
    CardsHidden,

    RaffleCountdownStarted,

    /// Winner recorded in the room (by this or another client)
    RaffleDrawn(RaffleWinner),

    /// This participant's timed break ran out
    BreakEnded,

    /// A reaction appeared in the room
    ReactionReceived(Reaction),

    /// This participant was removed from the room; the session has stopped
    Kicked,

    /// The room document is gone; the session has stopped
    RoomClosed,
}
