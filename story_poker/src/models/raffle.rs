//! Raffle sub-document models.

use super::room::UserId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Avatar shown for a member winner without one
pub const DEFAULT_AVATAR_URL: &str = "/images/default-avatar.png";

/// Prefix of manually entered roster ids
pub const MANUAL_ENTRY_PREFIX: &str = "manual-";

/// Raffle variants
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RaffleType {
    /// Draw exactly one winner
    #[default]
    SingleSelection,
}

impl std::fmt::Display for RaffleType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RaffleType::SingleSelection => write!(f, "single-selection"),
        }
    }
}

/// Raffle phase
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RaffleStatus {
    /// Configuring the roster, or ready for another draw
    #[default]
    None,
    /// Countdown running, winner not drawn yet
    Pending,
    /// Winner recorded
    Completed,
}

impl std::fmt::Display for RaffleStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RaffleStatus::None => write!(f, "none"),
            RaffleStatus::Pending => write!(f, "pending"),
            RaffleStatus::Completed => write!(f, "completed"),
        }
    }
}

/// One roster entry: a room participant, or a free-text name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RaffleEntry {
    Member {
        #[serde(rename = "userId")]
        user_id: UserId,
    },
    Manual {
        name: String,
    },
}

impl RaffleEntry {
    pub fn is_manual(&self) -> bool {
        matches!(self, RaffleEntry::Manual { .. })
    }
}

/// Where a winner came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WinnerKind {
    Active,
    Manual,
}

/// Drawn winner as recorded in the room
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RaffleWinner {
    #[serde(rename = "type")]
    pub kind: WinnerKind,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<UserId>,
}

/// Raffle state stored under `raffle`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Raffle {
    #[serde(rename = "type", default)]
    pub raffle_type: RaffleType,

    #[serde(default)]
    pub status: RaffleStatus,

    /// Roster keyed by entry id (user id for members)
    #[serde(default)]
    pub participants: BTreeMap<String, RaffleEntry>,

    #[serde(default)]
    pub winner: Option<RaffleWinner>,
}

impl Raffle {
    pub fn has_entries(&self) -> bool {
        !self.participants.is_empty()
    }

    pub fn has_member(&self, user_id: &str) -> bool {
        matches!(
            self.participants.get(user_id),
            Some(RaffleEntry::Member { .. })
        )
    }

    /// Member entries in key order
    pub fn members(&self) -> impl Iterator<Item = &UserId> {
        self.participants.values().filter_map(|entry| match entry {
            RaffleEntry::Member { user_id } => Some(user_id),
            RaffleEntry::Manual { .. } => None,
        })
    }

    /// Manual entries in key order as `(entry_id, name)`
    pub fn manual_entries(&self) -> impl Iterator<Item = (&str, &str)> {
        self.participants
            .iter()
            .filter_map(|(id, entry)| match entry {
                RaffleEntry::Manual { name } => Some((id.as_str(), name.as_str())),
                RaffleEntry::Member { .. } => None,
            })
    }
}
