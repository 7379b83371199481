//! Winner selection and draw arbitration.

use crate::models::{
    DEFAULT_AVATAR_URL, Participant, Raffle, RaffleWinner, Room, UserId, WinnerKind,
};
use rand::{Rng, seq::IndexedRandom};
use std::{collections::BTreeMap, fmt, str::FromStr};

/// Which clients write the raffle winner once the countdown expires
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DrawPolicy {
    /// Only the designated drawer writes; everyone else waits for its result
    #[default]
    CreatorOnly,
    /// Every observing client draws and writes; last write wins
    EveryClient,
}

impl DrawPolicy {
    pub fn should_draw(&self, room: &Room, user_id: &str) -> bool {
        match self {
            DrawPolicy::EveryClient => true,
            DrawPolicy::CreatorOnly => designated_drawer(room) == Some(user_id),
        }
    }
}

impl fmt::Display for DrawPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DrawPolicy::CreatorOnly => write!(f, "creator"),
            DrawPolicy::EveryClient => write!(f, "every-client"),
        }
    }
}

impl FromStr for DrawPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "creator" | "creator-only" => Ok(DrawPolicy::CreatorOnly),
            "every-client" | "all" => Ok(DrawPolicy::EveryClient),
            other => Err(format!("unknown draw policy: {other}")),
        }
    }
}

/// The single client that draws under [`DrawPolicy::CreatorOnly`].
///
/// The creator while present, otherwise the lowest active user id, so the
/// draw still happens after the creator closed the tab.
pub fn designated_drawer(room: &Room) -> Option<&str> {
    let creator_active = room
        .participant(&room.created_by)
        .is_some_and(|participant| participant.is_active);

    if creator_active {
        return Some(room.created_by.as_str());
    }

    room.participants
        .iter()
        .find(|(_, participant)| participant.is_active)
        .map(|(user_id, _)| user_id.as_str())
}

/// Candidates in draw order: active members by key, then manual entries
pub fn draw_pool(raffle: &Raffle, participants: &BTreeMap<UserId, Participant>) -> Vec<RaffleWinner> {
    let members = raffle.members().filter_map(|user_id| {
        participants
            .get(user_id)
            .filter(|participant| participant.is_active)
            .map(|participant| RaffleWinner {
                kind: WinnerKind::Active,
                name: participant.username.clone(),
                image_url: Some(
                    participant
                        .image_url
                        .clone()
                        .unwrap_or_else(|| DEFAULT_AVATAR_URL.to_string()),
                ),
                user_id: Some(user_id.clone()),
            })
    });

    let manual = raffle.manual_entries().filter_map(|(_, name)| {
        let name = name.trim();
        (!name.is_empty()).then(|| RaffleWinner {
            kind: WinnerKind::Manual,
            name: name.to_string(),
            image_url: None,
            user_id: None,
        })
    });

    members.chain(manual).collect()
}

/// Uniform pick over the pool; `None` when nobody is eligible
pub fn draw_winner<R: Rng + ?Sized>(pool: &[RaffleWinner], rng: &mut R) -> Option<RaffleWinner> {
    pool.choose(rng).cloned()
}
