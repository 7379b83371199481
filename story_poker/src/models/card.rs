//! The fixed card domain participants vote with.

use serde::{
    Deserialize, Deserializer, Serialize, Serializer,
    de::{self, Visitor},
};
use std::{fmt, str::FromStr};
use thiserror::Error;

/// Ordered numeric card values
pub const CARD_DOMAIN: [u8; 7] = [1, 2, 3, 5, 8, 13, 21];

/// Wire form of the abstain card
pub const UNKNOWN_CARD: &str = "?";

/// Value outside the card domain
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid card value: {0}")]
pub struct InvalidCard(pub String);

/// A participant's estimate.
///
/// `Points` only ever holds a member of [`CARD_DOMAIN`] when built through
/// [`CardValue::points`], parsing or deserialization. `Unknown` ("?") takes
/// part in consensus but never in numeric averaging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CardValue {
    Points(u8),
    Unknown,
}

impl CardValue {
    /// Card for `value` if it belongs to the domain
    pub fn points(value: u8) -> Option<Self> {
        CARD_DOMAIN.contains(&value).then_some(Self::Points(value))
    }

    /// Numeric value, `None` for "?"
    pub fn numeric(&self) -> Option<f64> {
        match self {
            Self::Points(value) => Some(f64::from(*value)),
            Self::Unknown => None,
        }
    }

    /// Position within [`CARD_DOMAIN`], `None` for "?"
    pub fn domain_index(&self) -> Option<usize> {
        match self {
            Self::Points(value) => CARD_DOMAIN.iter().position(|card| card == value),
            Self::Unknown => None,
        }
    }

    /// Every selectable card, domain order first, "?" last
    pub fn deck() -> impl Iterator<Item = CardValue> {
        CARD_DOMAIN
            .iter()
            .map(|&value| Self::Points(value))
            .chain(std::iter::once(Self::Unknown))
    }
}

impl fmt::Display for CardValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Points(value) => write!(f, "{value}"),
            Self::Unknown => f.write_str(UNKNOWN_CARD),
        }
    }
}

impl FromStr for CardValue {
    type Err = InvalidCard;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed == UNKNOWN_CARD {
            return Ok(Self::Unknown);
        }
        trimmed
            .parse::<u8>()
            .ok()
            .and_then(Self::points)
            .ok_or_else(|| InvalidCard(s.to_string()))
    }
}

impl Serialize for CardValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for CardValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(CardValueVisitor)
    }
}

/// Accepts `"5"`, `5`, `5.0` and `"?"`
struct CardValueVisitor;

impl Visitor<'_> for CardValueVisitor {
    type Value = CardValue;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a card value (1, 2, 3, 5, 8, 13, 21 or \"?\")")
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<CardValue, E> {
        v.parse().map_err(E::custom)
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<CardValue, E> {
        u8::try_from(v)
            .ok()
            .and_then(CardValue::points)
            .ok_or_else(|| E::custom(InvalidCard(v.to_string())))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<CardValue, E> {
        u64::try_from(v)
            .map_err(|_| E::custom(InvalidCard(v.to_string())))
            .and_then(|v| self.visit_u64(v))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<CardValue, E> {
        if v.fract() == 0.0 && (0.0..=f64::from(u8::MAX)).contains(&v) {
            self.visit_u64(v as u64)
        } else {
            Err(E::custom(InvalidCard(v.to_string())))
        }
    }
}
