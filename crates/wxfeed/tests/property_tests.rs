use proptest::prelude::*;
use wxfeed::scale::select_scale_values;
use wxfeed::{Appended, CapacityPolicy, ScaleMode, Series};

// Property: a fixed-count buffer holds exactly the n newest samples, ascending
proptest! {
    #[test]
    fn prop_fixed_count_keeps_newest(capacity in 1usize..20,
                                     steps in prop::collection::vec(0u32..50, 1..200)) {
        let mut series = Series::new(CapacityPolicy::fixed_count(capacity)).unwrap();
        let mut ts = 0.0;
        let mut appended = Vec::new();

        for step in steps {
            ts += step as f64;
            prop_assert_eq!(series.append(ts, ts * 2.0), Appended::Accepted);
            appended.push(ts);

            prop_assert!(series.len() <= capacity);
            let expected: Vec<f64> = appended
                .iter()
                .skip(appended.len().saturating_sub(capacity))
                .copied()
                .collect();
            let held: Vec<f64> = series.points().iter().map(|s| s.ts).collect();
            prop_assert_eq!(held, expected);
        }
    }
}

// Property: a time-span buffer never spans more than seconds x multiplier
proptest! {
    #[test]
    fn prop_time_span_bound(seconds in 1.0f64..500.0,
                            multiplier in 1.0f64..5.0,
                            steps in prop::collection::vec(0.0f64..300.0, 1..200)) {
        let mut series = Series::new(CapacityPolicy::time_span(seconds, multiplier)).unwrap();
        let mut ts = 1_700_000_000.0;

        for step in steps {
            ts += step;
            series.append(ts, 1.0);

            prop_assert!(!series.is_empty());
            prop_assert!(series.span() <= seconds * multiplier);
            prop_assert_eq!(series.newest().map(|s| s.ts), Some(ts));
        }
    }
}

// Property: points stay non-decreasing and last accepted never moves back
proptest! {
    #[test]
    fn prop_order_and_last_accepted(cadence in 0.0f64..30.0,
                                    stamps in prop::collection::vec(0.0f64..1000.0, 1..200)) {
        let mut series = Series::new(CapacityPolicy::fixed_count(50))
            .unwrap()
            .with_cadence(cadence);
        let mut last = None;

        for ts in stamps {
            series.append(ts, 0.0);

            let held: Vec<f64> = series.points().iter().map(|s| s.ts).collect();
            prop_assert!(held.windows(2).all(|w| w[0] <= w[1]));

            let current = series.last_accepted_ts();
            if let (Some(before), Some(after)) = (last, current) {
                prop_assert!(after >= before);
            }
            last = current;
        }
    }
}

// Property: the cadence gate drops exactly the samples that come too soon
proptest! {
    #[test]
    fn prop_cadence_gate(cadence in 1.0f64..100.0, gap in 0.0f64..200.0) {
        let mut series = Series::new(CapacityPolicy::fixed_count(10))
            .unwrap()
            .with_cadence(cadence);
        series.append(1000.0, 1.0);
        let before = series.len();

        let ts = 1000.0 + gap;
        let outcome = series.append(ts, 2.0);
        if ts - 1000.0 < cadence {
            prop_assert_eq!(outcome, Appended::Throttled);
            prop_assert_eq!(series.len(), before);
        } else {
            prop_assert_eq!(outcome, Appended::Accepted);
            prop_assert_eq!(series.len(), before + 1);
        }
    }
}

// Property: scale choice ignores the order of the values
proptest! {
    #[test]
    fn prop_scale_is_order_independent(values in prop::collection::vec(-500.0f64..500.0, 0..64),
                                       seed in any::<u64>()) {
        let mut shuffled = values.clone();
        // Deterministic rotation + reversal stands in for a permutation
        if !shuffled.is_empty() {
            let len = shuffled.len();
            shuffled.rotate_left((seed as usize) % len);
        }
        if seed % 2 == 0 {
            shuffled.reverse();
        }

        prop_assert_eq!(
            select_scale_values(values.iter().copied()),
            select_scale_values(shuffled.iter().copied())
        );

        let expected = match (
            values.iter().copied().fold(f64::INFINITY, f64::min),
            values.iter().copied().fold(f64::NEG_INFINITY, f64::max),
        ) {
            (lo, hi) if !values.is_empty() && hi - lo > 100.0 => ScaleMode::Logarithmic,
            _ => ScaleMode::Linear,
        };
        prop_assert_eq!(select_scale_values(values), expected);
    }
}
