//! Round status transitions as pure functions returning store patches.

use super::errors::{VotingError, VotingResult};
use crate::{
    models::{Participant, RoundStatus, UserId},
    store::StorePatch,
};
use serde_json::Value;
use std::{collections::BTreeMap, fmt};

/// Creator-triggered round transitions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoundTransition {
    /// `waiting -> voting`
    Start,
    /// `voting -> completed`
    Reveal,
    /// `completed -> voting`, resetting every point
    StartAgain,
}

impl fmt::Display for RoundTransition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RoundTransition::Start => write!(f, "start"),
            RoundTransition::Reveal => write!(f, "reveal"),
            RoundTransition::StartAgain => write!(f, "start again"),
        }
    }
}

impl RoundStatus {
    /// Apply `transition` to the current status.
    ///
    /// The returned patch is relative to the room root and must be written in
    /// a single store call, so status and point resets land together.
    ///
    /// # Errors
    ///
    /// * `VotingError::InvalidTransition` - Transition not allowed from `self`
    pub fn apply(
        self,
        transition: RoundTransition,
        participants: &BTreeMap<UserId, Participant>,
    ) -> VotingResult<(RoundStatus, StorePatch)> {
        let next = match (self, transition) {
            (RoundStatus::Waiting, RoundTransition::Start) => RoundStatus::Voting,
            (RoundStatus::Voting, RoundTransition::Reveal) => RoundStatus::Completed,
            (RoundStatus::Completed, RoundTransition::StartAgain) => RoundStatus::Voting,
            (from, transition) => {
                return Err(VotingError::InvalidTransition { from, transition });
            }
        };

        let mut patch = StorePatch::new().set("status", next.to_string());

        // Every entry into voting starts from a clean slate
        if next == RoundStatus::Voting {
            for user_id in participants.keys() {
                patch.insert(format!("participants/{user_id}/point"), Value::Null);
            }
        }

        Ok((next, patch))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CardValue, Identity};

    fn participants(points: &[(&str, Option<CardValue>)]) -> BTreeMap<UserId, Participant> {
        points
            .iter()
            .map(|(user_id, point)| {
                let mut participant = Participant::joining(&Identity::new(*user_id, *user_id));
                participant.point = *point;
                (user_id.to_string(), participant)
            })
            .collect()
    }

    #[test]
    fn test_start_from_waiting() {
        let roster = participants(&[("a", None)]);
        let (next, patch) = RoundStatus::Waiting
            .apply(RoundTransition::Start, &roster)
            .unwrap();

        assert_eq!(next, RoundStatus::Voting);
        assert_eq!(patch.get("status"), Some(&Value::from("voting")));
        assert_eq!(patch.get("participants/a/point"), Some(&Value::Null));
    }

    #[test]
    fn test_reveal_writes_status_only() {
        let roster = participants(&[("a", Some(CardValue::Points(5)))]);
        let (next, patch) = RoundStatus::Voting
            .apply(RoundTransition::Reveal, &roster)
            .unwrap();

        assert_eq!(next, RoundStatus::Completed);
        assert_eq!(patch.len(), 1);
        assert_eq!(patch.get("status"), Some(&Value::from("completed")));
    }

    #[test]
    fn test_start_again_resets_every_point() {
        let roster = participants(&[
            ("a", Some(CardValue::Points(3))),
            ("b", Some(CardValue::Unknown)),
            ("c", None),
        ]);
        let (next, patch) = RoundStatus::Completed
            .apply(RoundTransition::StartAgain, &roster)
            .unwrap();

        assert_eq!(next, RoundStatus::Voting);
        assert_eq!(patch.len(), 4);
        for user_id in ["a", "b", "c"] {
            assert_eq!(
                patch.get(&format!("participants/{user_id}/point")),
                Some(&Value::Null)
            );
        }
    }

    #[test]
    fn test_invalid_transitions() {
        let roster = BTreeMap::new();
        let invalid = [
            (RoundStatus::Waiting, RoundTransition::Reveal),
            (RoundStatus::Waiting, RoundTransition::StartAgain),
            (RoundStatus::Voting, RoundTransition::Start),
            (RoundStatus::Voting, RoundTransition::StartAgain),
            (RoundStatus::Completed, RoundTransition::Start),
            (RoundStatus::Completed, RoundTransition::Reveal),
        ];

        for (from, transition) in invalid {
            let result = from.apply(transition, &roster);
            assert!(
                matches!(result, Err(VotingError::InvalidTransition { .. })),
                "{from} --{transition}--> should be rejected"
            );
        }
    }
}
