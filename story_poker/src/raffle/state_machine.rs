//! Raffle status transitions.
//!
//! `none -> pending -> completed -> (reset) -> none -> ...`. Patches are
//! relative to the room's `raffle` node.

use super::errors::{RaffleError, RaffleResult};
use crate::{
    models::{Raffle, RaffleStatus, RaffleWinner},
    store::{StoreError, StorePatch},
};
use serde_json::Value;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RaffleTransition {
    /// Begin the countdown
    Start,
    /// Record the drawn winner
    Complete(RaffleWinner),
    /// Clear status and winner, keep the roster
    Reset,
}

impl fmt::Display for RaffleTransition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RaffleTransition::Start => write!(f, "start"),
            RaffleTransition::Complete(_) => write!(f, "complete"),
            RaffleTransition::Reset => write!(f, "reset"),
        }
    }
}

impl Raffle {
    /// Patch realising `transition`, or `None` when it is a no-op.
    ///
    /// # Errors
    ///
    /// * `RaffleError::EmptyRoster` - Start with nobody to draw from
    /// * `RaffleError::InvalidTransition` - Start while running, or complete
    ///   a raffle that is not pending
    pub fn apply(&self, transition: RaffleTransition) -> RaffleResult<Option<StorePatch>> {
        match transition {
            RaffleTransition::Start => {
                if self.status != RaffleStatus::None {
                    return Err(RaffleError::InvalidTransition {
                        from: self.status,
                        transition,
                    });
                }
                if !self.has_entries() {
                    return Err(RaffleError::EmptyRoster);
                }

                Ok(Some(
                    StorePatch::new()
                        .set("type", self.raffle_type.to_string())
                        .set("status", RaffleStatus::Pending.to_string())
                        .clear("winner"),
                ))
            }
            RaffleTransition::Complete(winner) => {
                // At most one winner per draw cycle
                if self.winner.is_some() {
                    return Ok(None);
                }
                if self.status != RaffleStatus::Pending {
                    return Err(RaffleError::InvalidTransition {
                        from: self.status,
                        transition: RaffleTransition::Complete(winner),
                    });
                }

                let winner = serde_json::to_value(&winner).map_err(StoreError::from)?;
                Ok(Some(
                    StorePatch::new()
                        .set("winner", winner)
                        .set("status", RaffleStatus::Completed.to_string()),
                ))
            }
            RaffleTransition::Reset => Ok(Some(
                StorePatch::new()
                    .set("status", Value::Null)
                    .set("winner", Value::Null),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{RaffleEntry, WinnerKind};

    fn roster() -> Raffle {
        let mut raffle = Raffle::default();
        raffle.participants.insert(
            "u1".to_string(),
            RaffleEntry::Member {
                user_id: "u1".to_string(),
            },
        );
        raffle
    }

    fn winner() -> RaffleWinner {
        RaffleWinner {
            kind: WinnerKind::Manual,
            name: "Pat".to_string(),
            image_url: None,
            user_id: None,
        }
    }

    #[test]
    fn test_start_requires_entries() {
        let result = Raffle::default().apply(RaffleTransition::Start);
        assert!(matches!(result, Err(RaffleError::EmptyRoster)));
    }

    #[test]
    fn test_start_sets_pending() {
        let patch = roster().apply(RaffleTransition::Start).unwrap().unwrap();
        assert_eq!(patch.get("status"), Some(&Value::from("pending")));
        assert_eq!(patch.get("type"), Some(&Value::from("single-selection")));
    }

    #[test]
    fn test_start_while_pending_is_invalid() {
        let mut raffle = roster();
        raffle.status = RaffleStatus::Pending;
        let result = raffle.apply(RaffleTransition::Start);
        assert!(matches!(result, Err(RaffleError::InvalidTransition { .. })));
    }

    #[test]
    fn test_complete_once() {
        let mut raffle = roster();
        raffle.status = RaffleStatus::Pending;

        let patch = raffle
            .apply(RaffleTransition::Complete(winner()))
            .unwrap()
            .unwrap();
        assert_eq!(patch.get("status"), Some(&Value::from("completed")));

        raffle.status = RaffleStatus::Completed;
        raffle.winner = Some(winner());
        assert!(raffle.apply(RaffleTransition::Complete(winner())).unwrap().is_none());
    }

    #[test]
    fn test_complete_requires_pending() {
        let result = roster().apply(RaffleTransition::Complete(winner()));
        assert!(matches!(result, Err(RaffleError::InvalidTransition { .. })));
    }

    #[test]
    fn test_reset_clears_status_and_winner() {
        let patch = roster().apply(RaffleTransition::Reset).unwrap().unwrap();
        assert_eq!(patch.len(), 2);
        assert_eq!(patch.get("status"), Some(&Value::Null));
        assert_eq!(patch.get("winner"), Some(&Value::Null));
    }
}
