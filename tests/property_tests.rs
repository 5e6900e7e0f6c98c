//! Property-based tests for the detection pipeline.
//!
//! These tests verify invariants that should hold for all valid inputs,
//! using randomly generated light curves.

use proptest::prelude::*;
use transit_search::core::{CandidateWindow, Series};
use transit_search::preprocess::preprocess;
use transit_search::rank::{confidence, is_alias, is_harmonic};
use transit_search::search::order_candidates;
use transit_search::simulate::{LightCurveGenerator, NoiseModel};
use transit_search::transform::rolling_median;
use transit_search::{detect_transits, DetectionConfig, TransitError};

/// Strategy for irregularly sampled light curves around unit brightness.
/// Times may repeat and arrive out of order.
fn raw_series_strategy(min_len: usize, max_len: usize) -> impl Strategy<Value = Series> {
    prop::collection::vec((0.0..30.0_f64, 0.9..1.1_f64), min_len..max_len).prop_map(|pairs| {
        let (times, flux): (Vec<f64>, Vec<f64>) = pairs.into_iter().unzip();
        Series::from_arrays(&times, &flux).unwrap()
    })
}

/// Strategy for synthetic transit light curves.
fn transit_series_strategy() -> impl Strategy<Value = Series> {
    (1.0..6.0_f64, 0.0..0.03_f64, 0.05..0.25_f64, any::<u64>()).prop_map(
        |(period, depth, duration, seed)| {
            LightCurveGenerator::new()
                .with_transit(period, depth, duration)
                .with_noise(NoiseModel::Gaussian { sigma: 0.002 })
                .with_seed(seed)
                .generate()
        },
    )
}

// =============================================================================
// Property: Confidence mapping
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn confidence_stays_in_range(s in 0.0..1e9_f64, k in 0.1..100.0_f64) {
        let c = confidence(s, k);
        prop_assert!((0.0..100.0).contains(&c), "confidence {} out of range", c);
    }

    #[test]
    fn confidence_is_monotonic(a in 0.0..1e4_f64, b in 0.0..1e4_f64, k in 0.1..100.0_f64) {
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        prop_assert!(confidence(lo, k) <= confidence(hi, k));
    }

    #[test]
    fn harmonic_match_is_symmetric(a in 0.1..20.0_f64, b in 0.1..20.0_f64) {
        prop_assert_eq!(is_harmonic(a, b, 0.02), is_harmonic(b, a, 0.02));
    }

    #[test]
    fn integer_multiples_are_harmonics(p in 0.5..10.0_f64, n in 1u32..6) {
        prop_assert!(is_harmonic(p, p * n as f64, 0.02));
    }

    #[test]
    fn alias_match_is_symmetric(a in 0.1..20.0_f64, b in 0.1..20.0_f64) {
        let config = DetectionConfig::default();
        prop_assert_eq!(is_alias(a, b, &config), is_alias(b, a, &config));
    }

    #[test]
    fn small_ratio_multiples_are_aliases(p in 0.5..10.0_f64, num in 1u32..8, den in 1u32..5) {
        let config = DetectionConfig::default();
        prop_assert!(is_alias(p, p * num as f64 / den as f64, &config));
    }
}

// =============================================================================
// Property: Candidate ordering
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    #[test]
    fn ordering_keeps_the_best_and_respects_limit(
        scores in prop::collection::vec(0.1..100.0_f64, 1..40),
        limit in 1usize..15
    ) {
        let windows: Vec<CandidateWindow> = scores
            .iter()
            .enumerate()
            .map(|(i, &score)| CandidateWindow {
                // No two of these periods are in a small integer ratio.
                period: 0.5 + i as f64 * 0.113,
                epoch: 0.0,
                duration: 0.05,
                score,
            })
            .collect();
        let best = scores.iter().copied().fold(f64::NEG_INFINITY, f64::max);

        let config = DetectionConfig::default()
            .with_harmonic_tolerance(0.0)
            .with_period_resolution(1e-4)
            .with_tie_epsilon(0.0)
            .with_max_candidates(limit);
        let ordered = order_candidates(windows, &config);
        prop_assert_eq!(ordered.len(), limit.min(scores.len()));
        prop_assert_eq!(ordered[0].score, best);
        for pair in ordered.windows(2) {
            prop_assert!(pair[0].score >= pair[1].score);
        }
    }
}

// =============================================================================
// Property: Preprocessing output
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(50))]

    #[test]
    fn preprocessed_series_is_strictly_ordered(series in raw_series_strategy(2, 300)) {
        match preprocess(&series, &DetectionConfig::default()) {
            Ok(cleaned) => {
                prop_assert!(cleaned.is_strictly_increasing());
                prop_assert!(cleaned.len() <= series.len());
                prop_assert!(cleaned.usable_count() >= 50);
                for s in cleaned.usable() {
                    prop_assert!(s.brightness.is_finite());
                }
            }
            Err(TransitError::InsufficientData { needed, got }) => {
                prop_assert_eq!(needed, 50);
                prop_assert!(got < needed);
            }
            Err(other) => prop_assert!(false, "unexpected error {:?}", other),
        }
    }

    #[test]
    fn rolling_median_of_constant_is_constant(
        level in 0.5..2.0_f64,
        n in 5usize..100,
        half_width in 0.05..2.0_f64
    ) {
        let times: Vec<f64> = (0..n).map(|i| i as f64 * 0.05).collect();
        let values = vec![level; n];
        for m in rolling_median(&times, &values, half_width) {
            prop_assert!((m - level).abs() < 1e-12);
        }
    }
}

// =============================================================================
// Property: Detection results are well formed
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(8))]

    #[test]
    fn detection_results_are_well_formed(series in transit_series_strategy()) {
        let result = detect_transits(&series).unwrap();
        let threshold = result.threshold();

        prop_assert!((0.0..100.0).contains(&result.confidence()));
        for c in result.candidates() {
            prop_assert!(c.significance >= threshold);
            prop_assert!(c.depth > 0.0 && c.depth < 1.0);
            prop_assert!(c.duration > 0.0);
            prop_assert!(c.transit_count >= 2);
            prop_assert!((0.0..100.0).contains(&c.confidence));
            prop_assert_eq!(c.orbital_period, c.period);
        }
        for pair in result.candidates().windows(2) {
            prop_assert!(pair[0].significance >= pair[1].significance);
        }
    }
}
