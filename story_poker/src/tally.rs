//! Pure tally engine.
//!
//! Every client recomputes the whole tally from each snapshot it receives, so
//! these functions hold no state and must agree across clients given the same
//! participants.

use crate::models::{CARD_DOMAIN, CardValue, Participant};

const MIN_CARD: u8 = CARD_DOMAIN[0];
const MAX_CARD: u8 = CARD_DOMAIN[CARD_DOMAIN.len() - 1];

/// Minimum active voters for consensus to be meaningful
pub const MIN_CONSENSUS_VOTERS: usize = 2;

/// Index distance at which a vote is flagged as an outlier
pub const OUTLIER_DISTANCE: usize = 2;

/// Mean over numeric points; `0.0` means "no data", never a real vote.
pub fn average<'a>(participants: impl IntoIterator<Item = &'a Participant>) -> f64 {
    let (sum, count) = participants
        .into_iter()
        .filter_map(|participant| participant.point.and_then(|card| card.numeric()))
        .fold((0.0, 0_u32), |(sum, count), value| (sum + value, count + 1));

    if count == 0 {
        0.0
    } else {
        sum / f64::from(count)
    }
}

/// Closest card in the domain.
///
/// Ties go to the lower card: the domain is scanned ascending and only a
/// strictly smaller difference replaces the current best.
pub fn nearest_card_value(value: f64) -> CardValue {
    let mut closest = MIN_CARD;
    let mut min_diff = (value - f64::from(closest)).abs();

    for card in CARD_DOMAIN {
        let diff = (value - f64::from(card)).abs();
        if diff < min_diff {
            min_diff = diff;
            closest = card;
        }
    }

    CardValue::Points(closest)
}

/// Where an average falls on the card scale
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Proximity {
    Exact(CardValue),
    Between {
        lower: CardValue,
        upper: CardValue,
        /// Position from `lower` (0) to `upper` (100)
        percentage: f64,
    },
}

impl Proximity {
    pub fn is_exact_match(&self) -> bool {
        matches!(self, Proximity::Exact(_))
    }

    pub fn lower_card(&self) -> CardValue {
        match self {
            Proximity::Exact(card) => *card,
            Proximity::Between { lower, .. } => *lower,
        }
    }

    pub fn upper_card(&self) -> CardValue {
        match self {
            Proximity::Exact(card) => *card,
            Proximity::Between { upper, .. } => *upper,
        }
    }

    /// 50 for an exact match
    pub fn percentage(&self) -> f64 {
        match self {
            Proximity::Exact(_) => 50.0,
            Proximity::Between { percentage, .. } => *percentage,
        }
    }

    /// Upper card past the midpoint, lower card otherwise
    pub fn closest_card(&self) -> CardValue {
        match self {
            Proximity::Exact(card) => *card,
            Proximity::Between {
                lower,
                upper,
                percentage,
            } => {
                if *percentage > 50.0 {
                    *upper
                } else {
                    *lower
                }
            }
        }
    }
}

/// Bracket `value` (clamped into the domain range) between two cards
pub fn proximity(value: f64) -> Proximity {
    let clamped = if value.is_nan() {
        f64::from(MIN_CARD)
    } else {
        value.clamp(f64::from(MIN_CARD), f64::from(MAX_CARD))
    };

    if let Some(&card) = CARD_DOMAIN.iter().find(|&&card| f64::from(card) == clamped) {
        return Proximity::Exact(CardValue::Points(card));
    }

    let (lower, upper) = CARD_DOMAIN
        .windows(2)
        .map(|pair| (pair[0], pair[1]))
        .find(|&(lower, upper)| clamped > f64::from(lower) && clamped < f64::from(upper))
        .unwrap_or((MIN_CARD, MAX_CARD));

    let percentage =
        (clamped - f64::from(lower)) / (f64::from(upper) - f64::from(lower)) * 100.0;

    Proximity::Between {
        lower: CardValue::Points(lower),
        upper: CardValue::Points(upper),
        percentage,
    }
}

/// Consensus among active voters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Consensus {
    pub has_consensus: bool,
    pub consensus_point: Option<CardValue>,
    /// Active participants with a point
    pub active_voters: usize,
}

/// Unanimity among active participants with a point ("?" included).
pub fn consensus<'a>(participants: impl IntoIterator<Item = &'a Participant>) -> Consensus {
    let points: Vec<CardValue> = participants
        .into_iter()
        .filter(|participant| participant.is_active)
        .filter_map(|participant| participant.point)
        .collect();

    let active_voters = points.len();
    let unanimous = points
        .first()
        .filter(|first| points.iter().all(|point| point == *first))
        .copied();

    match unanimous {
        Some(point) if active_voters >= MIN_CONSENSUS_VOTERS => Consensus {
            has_consensus: true,
            consensus_point: Some(point),
            active_voters,
        },
        _ => Consensus {
            has_consensus: false,
            consensus_point: None,
            active_voters,
        },
    }
}

/// Whether to flag a vote far from the rounded average
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OutlierTooltip {
    pub should_show: bool,
    pub is_lower: bool,
    pub is_higher: bool,
}

/// Flag `point` when it sits two or more domain steps from `rounded_average`.
///
/// Never fires for "?" or a missing point.
pub fn outlier_tooltip(point: Option<CardValue>, rounded_average: Option<CardValue>) -> OutlierTooltip {
    let indices = point
        .and_then(|card| card.domain_index())
        .zip(rounded_average.and_then(|card| card.domain_index()));

    match indices {
        Some((user, average)) if user.abs_diff(average) >= OUTLIER_DISTANCE => OutlierTooltip {
            should_show: true,
            is_lower: user < average,
            is_higher: user > average,
        },
        _ => OutlierTooltip::default(),
    }
}

/// Everything shown once cards are revealed
#[derive(Debug, Clone, PartialEq)]
pub struct TallySummary {
    /// Mean rounded to one decimal, 0 without numeric votes
    pub average: f64,
    /// Nearest card; "1" without numeric votes
    pub rounded_average: CardValue,
    pub proximity: Proximity,
    pub consensus: Consensus,
}

impl TallySummary {
    pub fn outlier_for(&self, point: Option<CardValue>) -> OutlierTooltip {
        outlier_tooltip(point, Some(self.rounded_average))
    }
}

pub fn summarize<'a, I>(participants: I) -> TallySummary
where
    I: IntoIterator<Item = &'a Participant>,
    I::IntoIter: Clone,
{
    let participants = participants.into_iter();
    let mean = average(participants.clone());

    TallySummary {
        average: (mean * 10.0).round() / 10.0,
        rounded_average: if mean == 0.0 {
            CardValue::Points(MIN_CARD)
        } else {
            nearest_card_value(mean)
        },
        proximity: proximity(mean),
        consensus: consensus(participants),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Identity;

    fn voter(user_id: &str, point: Option<CardValue>, is_active: bool) -> Participant {
        let mut participant = Participant::joining(&Identity::new(user_id, user_id));
        participant.point = point;
        participant.is_active = is_active;
        participant
    }

    fn pts(value: u8) -> Option<CardValue> {
        CardValue::points(value)
    }

    #[test]
    fn test_average_ignores_unknown_and_null() {
        let roster = [
            voter("a", pts(3), true),
            voter("b", pts(5), false),
            voter("c", Some(CardValue::Unknown), true),
            voter("d", None, true),
        ];
        assert_eq!(average(&roster), 4.0);
    }

    #[test]
    fn test_average_no_data() {
        let roster = [voter("a", Some(CardValue::Unknown), true)];
        assert_eq!(average(&roster), 0.0);
        assert_eq!(average(std::iter::empty()), 0.0);
    }

    #[test]
    fn test_nearest_card_tie_goes_low() {
        assert_eq!(nearest_card_value(4.0), CardValue::Points(3));
        assert_eq!(nearest_card_value(4.1), CardValue::Points(5));
        assert_eq!(nearest_card_value(17.0), CardValue::Points(13));
        assert_eq!(nearest_card_value(100.0), CardValue::Points(21));
        assert_eq!(nearest_card_value(0.0), CardValue::Points(1));
    }

    #[test]
    fn test_proximity_between() {
        let result = proximity(4.0);
        assert!(!result.is_exact_match());
        assert_eq!(result.lower_card(), CardValue::Points(3));
        assert_eq!(result.upper_card(), CardValue::Points(5));
        assert_eq!(result.percentage(), 50.0);
        assert_eq!(result.closest_card(), CardValue::Points(3));

        let result = proximity(7.0);
        assert_eq!(result.percentage(), (2.0 / 3.0) * 100.0);
        assert_eq!(result.closest_card(), CardValue::Points(8));
    }

    #[test]
    fn test_proximity_exact_and_clamped() {
        assert_eq!(proximity(8.0), Proximity::Exact(CardValue::Points(8)));
        assert_eq!(proximity(0.0), Proximity::Exact(CardValue::Points(1)));
        assert_eq!(proximity(40.0), Proximity::Exact(CardValue::Points(21)));
        assert_eq!(proximity(f64::NAN), Proximity::Exact(CardValue::Points(1)));
        assert_eq!(proximity(8.0).percentage(), 50.0);
    }

    #[test]
    fn test_consensus_all_same() {
        let roster = [
            voter("a", pts(5), true),
            voter("b", pts(5), true),
            voter("c", pts(5), true),
        ];
        let result = consensus(&roster);
        assert_eq!(
            result,
            Consensus {
                has_consensus: true,
                consensus_point: pts(5),
                active_voters: 3,
            }
        );
    }

    #[test]
    fn test_consensus_unknown_counts() {
        let roster = [
            voter("a", Some(CardValue::Unknown), true),
            voter("b", Some(CardValue::Unknown), true),
        ];
        assert_eq!(consensus(&roster).consensus_point, Some(CardValue::Unknown));
    }

    #[test]
    fn test_consensus_needs_two_active_voters() {
        let roster = [
            voter("a", pts(8), true),
            voter("b", pts(8), false),
            voter("c", None, true),
        ];
        let result = consensus(&roster);
        assert!(!result.has_consensus);
        assert_eq!(result.active_voters, 1);
    }

    #[test]
    fn test_consensus_disagreement() {
        let roster = [voter("a", pts(8), true), voter("b", pts(13), true)];
        let result = consensus(&roster);
        assert!(!result.has_consensus);
        assert_eq!(result.consensus_point, None);
        assert_eq!(result.active_voters, 2);
    }

    #[test]
    fn test_outlier_tooltip() {
        let result = outlier_tooltip(pts(1), pts(8));
        assert_eq!(
            result,
            OutlierTooltip {
                should_show: true,
                is_lower: true,
                is_higher: false,
            }
        );

        assert!(outlier_tooltip(pts(21), pts(5)).is_higher);
        assert!(!outlier_tooltip(pts(3), pts(5)).should_show);
        assert!(!outlier_tooltip(Some(CardValue::Unknown), pts(5)).should_show);
        assert!(!outlier_tooltip(None, pts(5)).should_show);
        assert!(!outlier_tooltip(pts(5), None).should_show);
    }

    #[test]
    fn test_summarize() {
        let roster = [voter("a", pts(3), true), voter("b", pts(5), true)];
        let summary = summarize(&roster);

        assert_eq!(summary.average, 4.0);
        assert_eq!(summary.rounded_average, CardValue::Points(3));
        assert!(!summary.consensus.has_consensus);
        assert!(summary.outlier_for(pts(13)).should_show);
    }

    #[test]
    fn test_summarize_rounds_to_one_decimal() {
        let roster = [
            voter("a", pts(1), true),
            voter("b", pts(2), true),
            voter("c", pts(2), true),
        ];
        assert_eq!(summarize(&roster).average, 1.7);
    }

    #[test]
    fn test_summarize_without_numeric_votes() {
        let summary = summarize(&[voter("a", Some(CardValue::Unknown), true)]);
        assert_eq!(summary.average, 0.0);
        assert_eq!(summary.rounded_average, CardValue::Points(1));
    }
}
