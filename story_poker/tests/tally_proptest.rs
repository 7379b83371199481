/// Property-based tests for the tally engine using proptest
///
/// These tests verify that consensus, rounding and proximity hold across a
/// wide range of randomly generated participant sets.
use proptest::prelude::*;
use story_poker::{
    CardValue, Identity, Participant,
    models::CARD_DOMAIN,
    tally::{average, consensus, nearest_card_value, outlier_tooltip, proximity},
};

// Strategy to generate any card, "?" included
fn card_strategy() -> impl Strategy<Value = CardValue> {
    prop_oneof![
        6 => prop::sample::select(CARD_DOMAIN.to_vec()).prop_map(CardValue::Points),
        1 => Just(CardValue::Unknown),
    ]
}

// Strategy to generate a participant with an optional point and presence
fn participant_strategy() -> impl Strategy<Value = (Option<CardValue>, bool)> {
    (prop::option::of(card_strategy()), any::<bool>())
}

fn build(specs: &[(Option<CardValue>, bool)]) -> Vec<Participant> {
    specs
        .iter()
        .enumerate()
        .map(|(i, (point, is_active))| {
            let mut participant = Participant::joining(&Identity::new(format!("u{i}"), "U"));
            participant.point = *point;
            participant.is_active = *is_active;
            participant
        })
        .collect()
}

proptest! {
    #[test]
    fn test_consensus_iff_literal_equal(specs in prop::collection::vec(participant_strategy(), 0..12)) {
        let participants = build(&specs);
        let result = consensus(&participants);

        let voters: Vec<CardValue> = participants
            .iter()
            .filter(|p| p.is_active)
            .filter_map(|p| p.point)
            .collect();

        prop_assert_eq!(result.active_voters, voters.len());

        let all_equal = voters.windows(2).all(|pair| pair[0] == pair[1]);
        let expected = voters.len() >= 2 && all_equal;
        prop_assert_eq!(result.has_consensus, expected);

        if expected {
            prop_assert_eq!(result.consensus_point, Some(voters[0]));
        } else {
            prop_assert_eq!(result.consensus_point, None);
        }
    }

    #[test]
    fn test_nearest_card_is_minimal(value in 0.0f64..30.0) {
        let nearest = nearest_card_value(value);
        let nearest_value = nearest.numeric().unwrap();
        let best_diff = (value - nearest_value).abs();

        for card in CARD_DOMAIN {
            let diff = (value - f64::from(card)).abs();
            prop_assert!(best_diff <= diff, "{} is closer to {} than {}", card, value, nearest);
            // Ties resolve to the lower card
            if diff == best_diff {
                prop_assert!(nearest_value <= f64::from(card));
            }
        }
    }

    #[test]
    fn test_average_within_card_range(specs in prop::collection::vec(participant_strategy(), 1..12)) {
        let participants = build(&specs);
        let mean = average(&participants);
        let has_numeric = participants.iter().any(|p| p.point.is_some_and(|c| c != CardValue::Unknown));

        if has_numeric {
            prop_assert!((1.0..=21.0).contains(&mean));
        } else {
            prop_assert_eq!(mean, 0.0);
        }
    }

    #[test]
    fn test_proximity_brackets_value(value in -10.0f64..40.0) {
        let result = proximity(value);
        let clamped = value.clamp(1.0, 21.0);
        let lower = result.lower_card().numeric().unwrap();
        let upper = result.upper_card().numeric().unwrap();

        prop_assert!(lower <= clamped && clamped <= upper);
        prop_assert!((0.0..=100.0).contains(&result.percentage()));
        if result.is_exact_match() {
            prop_assert_eq!(lower, clamped);
        } else {
            prop_assert_eq!(result.lower_card().domain_index().unwrap() + 1,
                            result.upper_card().domain_index().unwrap());
        }
    }

    #[test]
    fn test_outlier_is_antisymmetric(user in card_strategy(), avg in card_strategy()) {
        let forward = outlier_tooltip(Some(user), Some(avg));
        let backward = outlier_tooltip(Some(avg), Some(user));

        prop_assert_eq!(forward.should_show, backward.should_show);
        prop_assert_eq!(forward.is_lower, backward.is_higher);
        prop_assert!(!(forward.is_lower && forward.is_higher));
        if user == CardValue::Unknown || avg == CardValue::Unknown {
            prop_assert!(!forward.should_show);
        }
    }
}
