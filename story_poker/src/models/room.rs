//! Room, participant and reaction models.

use super::{card::CardValue, raffle::Raffle};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Room ID type
pub type RoomId = String;

/// User ID type
pub type UserId = String;

/// Caller identity handed to the core by the identity collaborator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub user_id: UserId,
    pub username: String,
    pub image_url: Option<String>,
}

impl Identity {
    pub fn new(user_id: impl Into<UserId>, username: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            username: username.into(),
            image_url: None,
        }
    }

    #[must_use]
    pub fn with_image_url(mut self, image_url: impl Into<String>) -> Self {
        self.image_url = Some(image_url.into());
        self
    }
}

/// Phase of a voting round
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoundStatus {
    Waiting,
    #[default]
    Voting,
    Completed,
}

impl std::fmt::Display for RoundStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RoundStatus::Waiting => write!(f, "waiting"),
            RoundStatus::Voting => write!(f, "voting"),
            RoundStatus::Completed => write!(f, "completed"),
        }
    }
}

/// Self-declared away status
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BreakStatus {
    #[default]
    None,
    /// Timed break counting down `break_seconds`
    Time,
    #[serde(alias = "Indefinite")]
    Indefinite,
}

impl std::fmt::Display for BreakStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BreakStatus::None => write!(f, "none"),
            BreakStatus::Time => write!(f, "time"),
            BreakStatus::Indefinite => write!(f, "indefinite"),
        }
    }
}

/// A user bound to a room
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Participant {
    #[serde(default)]
    pub user_id: UserId,

    #[serde(default)]
    pub username: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,

    #[serde(default, deserialize_with = "lenient_point")]
    pub point: Option<CardValue>,

    #[serde(default)]
    pub is_active: bool,

    #[serde(default)]
    pub break_status: BreakStatus,

    #[serde(default, deserialize_with = "lenient_seconds")]
    pub break_seconds: u32,
}

impl Participant {
    /// Fresh entry written on join: no point, active, not on break
    pub fn joining(identity: &Identity) -> Self {
        Self {
            user_id: identity.user_id.clone(),
            username: identity.username.clone(),
            image_url: identity.image_url.clone(),
            point: None,
            is_active: true,
            break_status: BreakStatus::None,
            break_seconds: 0,
        }
    }

    pub fn is_on_break(&self) -> bool {
        self.break_status != BreakStatus::None
    }

    pub fn has_voted(&self) -> bool {
        self.point.is_some()
    }
}

/// Emoji thrown at a participant; expires after a fixed TTL
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reaction {
    /// Target participant
    pub user_id: UserId,
    #[serde(rename = "reaction")]
    pub emoji: String,
    /// Epoch milliseconds
    pub timestamp: i64,
}

/// Typed view of one room snapshot
#[derive(Debug, Clone, PartialEq)]
pub struct Room {
    pub room_id: RoomId,
    pub room_name: String,
    pub status: RoundStatus,
    pub created_by: UserId,
    /// Epoch milliseconds
    pub created_at: i64,
    pub participants: BTreeMap<UserId, Participant>,
    pub raffle: Option<Raffle>,
    pub reactions: BTreeMap<String, Reaction>,
}

/// Loosely-typed shape of the stored document
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawRoom {
    #[serde(default)]
    room_name: String,
    #[serde(default)]
    status: Option<Value>,
    #[serde(default)]
    created_by: String,
    #[serde(default)]
    created_at: Option<Value>,
    #[serde(default)]
    participants: BTreeMap<String, Value>,
    #[serde(default)]
    raffle: Option<Value>,
    #[serde(default)]
    reactions: BTreeMap<String, Value>,
}

impl Room {
    /// Validate and default a raw snapshot.
    ///
    /// Only a non-object document is an error. Malformed entries inside it are
    /// dropped (participants, reactions) or defaulted (status, raffle) with a
    /// warning, so one bad write cannot blind every client.
    pub fn from_snapshot(room_id: &str, snapshot: &Value) -> Result<Self, serde_json::Error> {
        let raw = RawRoom::deserialize(snapshot)?;

        let status = match raw.status {
            Some(value) => RoundStatus::deserialize(&value).unwrap_or_else(|err| {
                log::warn!("Room {room_id}: unknown status {value}, assuming voting: {err}");
                RoundStatus::default()
            }),
            None => RoundStatus::default(),
        };

        let participants = raw
            .participants
            .into_iter()
            .filter_map(|(user_id, value)| match Participant::deserialize(&value) {
                Ok(mut participant) => {
                    if participant.user_id.is_empty() {
                        participant.user_id = user_id.clone();
                    }
                    Some((user_id, participant))
                }
                Err(err) => {
                    log::warn!("Room {room_id}: dropping malformed participant {user_id}: {err}");
                    None
                }
            })
            .collect();

        let raffle = raw.raffle.and_then(|value| match Raffle::deserialize(&value) {
            Ok(raffle) => Some(raffle),
            Err(err) => {
                log::warn!("Room {room_id}: ignoring malformed raffle: {err}");
                None
            }
        });

        let reactions = raw
            .reactions
            .into_iter()
            .filter_map(|(id, value)| Reaction::deserialize(&value).ok().map(|r| (id, r)))
            .collect();

        Ok(Self {
            room_id: room_id.to_string(),
            room_name: raw.room_name,
            status,
            created_by: raw.created_by,
            created_at: raw.created_at.as_ref().and_then(Value::as_i64).unwrap_or(0),
            participants,
            raffle,
            reactions,
        })
    }

    pub fn participant(&self, user_id: &str) -> Option<&Participant> {
        self.participants.get(user_id)
    }

    pub fn is_creator(&self, user_id: &str) -> bool {
        self.created_by == user_id
    }

    pub fn active_participants(&self) -> impl Iterator<Item = &Participant> {
        self.participants.values().filter(|p| p.is_active)
    }

    /// Raffle state, defaulted when never configured
    pub fn raffle_or_default(&self) -> Raffle {
        self.raffle.clone().unwrap_or_default()
    }
}

fn lenient_point<'de, D>(deserializer: D) -> Result<Option<CardValue>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw = Option::<Value>::deserialize(deserializer)?;
    Ok(raw.and_then(|value| match CardValue::deserialize(&value) {
        Ok(card) => Some(card),
        Err(err) => {
            log::warn!("Ignoring invalid point {value}: {err}");
            None
        }
    }))
}

fn lenient_seconds<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw = Option::<Value>::deserialize(deserializer)?;
    Ok(raw
        .as_ref()
        .and_then(Value::as_f64)
        .map(|seconds| seconds.clamp(0.0, f64::from(u32::MAX)) as u32)
        .unwrap_or(0))
}
