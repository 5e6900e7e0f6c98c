//! Candidate ranking and confidence scoring.

use crate::config::DetectionConfig;
use crate::core::{DetectionResult, TransitCandidate};
use crate::refine::RefinedCandidate;

/// Upper bound on reported confidence. Keeps the mapping strictly below 100
/// even where `s / (s + k)` rounds to 1 in floating point.
const MAX_CONFIDENCE: f64 = 99.999_999;

/// Map a significance to a confidence percentage.
///
/// `100 s / (s + k)`: monotonic, 0 at `s = 0`, 50 at `s = k`, and
/// approaching but never reaching 100.
pub fn confidence(significance: f64, k: f64) -> f64 {
    if !(significance > 0.0) || !(k > 0.0) {
        return 0.0;
    }
    if significance.is_infinite() {
        return MAX_CONFIDENCE;
    }
    (100.0 * significance / (significance + k)).min(MAX_CONFIDENCE)
}

/// Largest denominator `q` checked when matching `p/q` period aliases.
pub const MAX_ALIAS_DENOMINATOR: u32 = 4;

/// Whether the longer period is an integer multiple of the shorter one: the
/// fundamental it implies (`long / n` for the nearest integer `n`) lies
/// within `tolerance` (relative) of the shorter period. Equal periods match.
pub fn is_harmonic(a: f64, b: f64, tolerance: f64) -> bool {
    if !(a > 0.0 && b > 0.0) {
        return false;
    }
    let (short, long) = (a.min(b), a.max(b));
    let n = (long / short).round().max(1.0);
    ((long / n - short) / short).abs() <= tolerance
}

/// Whether two periods describe the same signal.
///
/// True for harmonics (see [`is_harmonic`]) and for rational aliases
/// `long = short * p / q` with `q <= MAX_ALIAS_DENOMINATOR`. Folding a light
/// curve at `p/q` of the true period stacks every `p`-th event in phase, so
/// such periods score even though most of their events hold no dip. Rational
/// aliases are exact up to the grid, so they are matched within one
/// `period_resolution` per unit of each period.
pub fn is_alias(a: f64, b: f64, config: &DetectionConfig) -> bool {
    if is_harmonic(a, b, config.harmonic_tolerance) {
        return true;
    }
    if !(a > 0.0 && b > 0.0) {
        return false;
    }
    let (short, long) = (a.min(b), a.max(b));
    (1..=MAX_ALIAS_DENOMINATOR).any(|q| {
        let q = f64::from(q);
        let p = (long * q / short).round();
        if p < 1.0 {
            return false;
        }
        let ratio = p / q;
        (long - short * ratio).abs() <= config.period_resolution * (1.0 + ratio)
    })
}

/// Turn refined candidates into the final ordered result.
///
/// Invalid candidates and candidates below `significance_threshold` are
/// dropped. The rest are sorted by descending significance (shorter period
/// first on ties), and any candidate whose period is an alias of an already
/// kept, more significant one is removed (see [`is_alias`]).
pub fn rank_candidates(refined: &[RefinedCandidate], config: &DetectionConfig) -> DetectionResult {
    let threshold = config.significance_threshold;
    let k = config.confidence_k();

    let mut pool: Vec<TransitCandidate> = refined
        .iter()
        .filter(|r| r.is_valid() && r.candidate.significance >= threshold)
        .map(|r| r.candidate)
        .collect();
    pool.sort_by(|a, b| {
        b.significance
            .total_cmp(&a.significance)
            .then(a.period.total_cmp(&b.period))
    });

    let mut kept: Vec<TransitCandidate> = Vec::with_capacity(pool.len());
    for mut candidate in pool {
        if kept
            .iter()
            .any(|c| is_alias(c.period, candidate.period, config))
        {
            continue;
        }
        candidate.confidence = confidence(candidate.significance, k);
        kept.push(candidate);
    }

    DetectionResult::new(kept, threshold)
}
