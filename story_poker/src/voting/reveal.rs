//! Client-side reveal delay.
//!
//! The stored status flips to `completed` immediately; each client defers the
//! visible flip by a fixed window after observing the edge. A client that
//! first sees the room already completed reveals at once.

use crate::models::RoundStatus;

/// What the client should do after observing a status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RevealAction {
    Nothing,
    /// Observed `voting -> completed`: start the reveal countdown
    StartCountdown,
    /// First observation is already `completed`: show cards immediately
    RevealNow,
    /// Round left `completed`: hide cards, cancel any countdown
    Hide,
}

/// Edge detector over the observed round status
#[derive(Debug, Clone, Default)]
pub struct RevealGate {
    previous: Option<RoundStatus>,
    revealed: bool,
}

impl RevealGate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn observe(&mut self, status: RoundStatus) -> RevealAction {
        let previous = self.previous.replace(status);

        match (previous, status) {
            (None, RoundStatus::Completed) => {
                self.revealed = true;
                RevealAction::RevealNow
            }
            (Some(prev), RoundStatus::Completed) if prev != RoundStatus::Completed => {
                RevealAction::StartCountdown
            }
            (Some(RoundStatus::Completed), _) if status != RoundStatus::Completed => {
                self.revealed = false;
                RevealAction::Hide
            }
            _ => RevealAction::Nothing,
        }
    }

    /// Countdown expired; returns whether cards should now be shown
    pub fn countdown_elapsed(&mut self) -> bool {
        if self.previous == Some(RoundStatus::Completed) && !self.revealed {
            self.revealed = true;
            true
        } else {
            false
        }
    }

    pub fn is_revealed(&self) -> bool {
        self.revealed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_observed_edge_starts_countdown() {
        let mut gate = RevealGate::new();
        assert_eq!(gate.observe(RoundStatus::Voting), RevealAction::Nothing);
        assert_eq!(gate.observe(RoundStatus::Completed), RevealAction::StartCountdown);
        assert!(!gate.is_revealed());

        assert!(gate.countdown_elapsed());
        assert!(gate.is_revealed());
        assert!(!gate.countdown_elapsed());
    }

    #[test]
    fn test_mount_on_completed_reveals_immediately() {
        let mut gate = RevealGate::new();
        assert_eq!(gate.observe(RoundStatus::Completed), RevealAction::RevealNow);
        assert!(gate.is_revealed());
        assert_eq!(gate.observe(RoundStatus::Completed), RevealAction::Nothing);
    }

    #[test]
    fn test_start_again_hides() {
        let mut gate = RevealGate::new();
        gate.observe(RoundStatus::Voting);
        gate.observe(RoundStatus::Completed);
        gate.countdown_elapsed();

        assert_eq!(gate.observe(RoundStatus::Voting), RevealAction::Hide);
        assert!(!gate.is_revealed());
    }

    #[test]
    fn test_stale_countdown_after_hide_is_ignored() {
        let mut gate = RevealGate::new();
        gate.observe(RoundStatus::Voting);
        gate.observe(RoundStatus::Completed);
        gate.observe(RoundStatus::Voting);

        assert!(!gate.countdown_elapsed());
    }
}
