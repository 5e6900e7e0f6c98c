//! Transit shape fitting and significance.
//!
//! The search only knows a box. Refinement looks at the folded light curve
//! around the box and assumes the dip is parabolic,
//! `1 - D (1 - x^2)` with `x = (t - mid) / (W / 2)`:
//!
//! - the mid-time and duration come from the contiguous run of phase bins
//!   below half the peak depth (a parabola is `W / sqrt(2)` wide there);
//! - a small least-squares grid polishes the mid-time and duration;
//! - the depth `D` is the least-squares amplitude of the parabola at the
//!   half-depth width, against the median out-of-transit level;
//! - the significance is the least-squares SNR of the depth,
//!   `D sqrt(sum g^2) / sigma_out` with `g = 1 - x^2`.
//!
//! Candidates seen in fewer than two complete transits, with a depth outside
//! (0, 1), or whose dip shows up in at most half of the complete events are
//! marked invalid rather than failing the run.

use crate::config::{DetectionConfig, SOLAR_RADIUS_IN_EARTH_RADII};
use crate::core::{CandidateWindow, Series, TransitCandidate};
use crate::utils::stats::{false_alarm_probability, mean, median, robust_sigma, std_dev};
use rayon::prelude::*;
use std::collections::BTreeMap;
use std::f64::consts::SQRT_2;

/// Noise floor for numerically noise-free series.
const MIN_SIGMA: f64 = 1e-9;

/// Fewest complete transit events needed to confirm a period.
pub const MIN_TRANSITS: usize = 2;

/// Why a candidate could not be confirmed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    /// Fewer than [`MIN_TRANSITS`] complete events inside the series.
    TooFewTransits { observed: usize },
    /// No usable samples fell inside the fitted transit window.
    NoInTransitData,
    /// Too few out-of-transit samples to estimate the baseline.
    NoBaseline,
    /// Fitted depth is not in (0, 1).
    NonPhysicalDepth,
    /// At most half of the complete events show the dip on their own, as
    /// when folding at a rational alias of the true period.
    InconsistentEvents { consistent: usize, complete: usize },
}

/// Outcome of refining one search window.
#[derive(Debug, Clone, PartialEq)]
pub struct RefinedCandidate {
    /// The search window this candidate came from.
    pub window: CandidateWindow,
    /// Fitted parameters. Only meaningful when `rejection` is `None`.
    pub candidate: TransitCandidate,
    /// Reason the candidate is invalid, if it is.
    pub rejection: Option<Rejection>,
}

impl RefinedCandidate {
    pub fn is_valid(&self) -> bool {
        self.rejection.is_none()
    }

    fn rejected(window: &CandidateWindow, candidate: TransitCandidate, why: Rejection) -> Self {
        Self {
            window: *window,
            candidate,
            rejection: Some(why),
        }
    }
}

/// Folded-phase bin accumulator.
#[derive(Debug, Clone, Copy, Default)]
struct PhaseBin {
    count: usize,
    flux: f64,
    phase: f64,
}

impl PhaseBin {
    fn mean_flux(&self) -> f64 {
        self.flux / self.count as f64
    }

    fn mean_phase(&self) -> f64 {
        self.phase / self.count as f64
    }
}

/// Signed offset of `t` from the nearest transit centered on `epoch`.
fn phase_offset(t: f64, epoch: f64, period: f64) -> f64 {
    let d = (t - epoch).rem_euclid(period);
    if d >= period / 2.0 {
        d - period
    } else {
        d
    }
}

/// Refine a single search window against the normalized series.
pub fn refine_candidate(
    window: &CandidateWindow,
    series: &Series,
    config: &DetectionConfig,
) -> RefinedCandidate {
    let period = window.period;
    let mut candidate = TransitCandidate {
        period,
        epoch: window.epoch,
        duration: window.duration,
        depth: 0.0,
        significance: 0.0,
        false_alarm_probability: 1.0,
        confidence: 0.0,
        planet_radius: 0.0,
        orbital_period: period,
        transit_count: 0,
        in_transit_points: 0,
    };

    let points: Vec<(f64, f64)> = series.usable().map(|s| (s.time, s.brightness)).collect();
    let (Some(start), Some(end)) = (series.start(), series.end()) else {
        return RefinedCandidate::rejected(window, candidate, Rejection::NoInTransitData);
    };

    // Shape: mid-time and duration from the folded curve.
    let Some((mid_offset, seed_width)) = fit_shape(window, &points, config.phase_bins) else {
        return RefinedCandidate::rejected(window, candidate, Rejection::NonPhysicalDepth);
    };
    let (mid, duration) = polish_fit(&points, period, window.epoch + mid_offset, seed_width);
    let epoch = normalize_epoch(mid, start, period);
    candidate.epoch = epoch;
    candidate.duration = duration;

    // The depth template keeps the seeded width: the polished width is
    // chosen on the same samples and would carry its noise into the depth.
    let half = seed_width / 2.0;
    let gap = duration.max(seed_width);
    let mut in_transit: Vec<(f64, f64, i64)> = Vec::new();
    let mut out_of_transit: Vec<f64> = Vec::new();
    for &(t, f) in &points {
        let d = phase_offset(t, epoch, period);
        if d.abs() < half {
            let x = d / half;
            let event = ((t - epoch) / period).round() as i64;
            in_transit.push((f, 1.0 - x * x, event));
        } else if d.abs() >= gap {
            out_of_transit.push(f);
        }
    }
    candidate.in_transit_points = in_transit.len();

    if in_transit.is_empty() {
        return RefinedCandidate::rejected(window, candidate, Rejection::NoInTransitData);
    }
    if out_of_transit.len() < 2 {
        return RefinedCandidate::rejected(window, candidate, Rejection::NoBaseline);
    }

    let baseline = median(&out_of_transit);
    let sigma_out = noise_level(&out_of_transit);

    // (sum r g, sum g^2) per transit event.
    let mut events: BTreeMap<i64, (f64, f64)> = BTreeMap::new();
    for &(f, g, k) in &in_transit {
        let sums = events.entry(k).or_insert((0.0, 0.0));
        sums.0 += (baseline - f) * g;
        sums.1 += g * g;
    }
    let complete: Vec<(f64, f64)> = events
        .iter()
        .filter(|&(&k, _)| {
            let mid = epoch + k as f64 * period;
            mid - half >= start && mid + half <= end
        })
        .map(|(_, &sums)| sums)
        .collect();
    candidate.transit_count = complete.len();

    let sum_rg: f64 = events.values().map(|&(rg, _)| rg).sum();
    let sum_gg: f64 = events.values().map(|&(_, gg)| gg).sum();
    if !(sum_gg > 0.0) {
        return RefinedCandidate::rejected(window, candidate, Rejection::NoInTransitData);
    }
    let depth = sum_rg / sum_gg;
    candidate.depth = depth;

    if complete.len() < MIN_TRANSITS {
        return RefinedCandidate::rejected(
            window,
            candidate,
            Rejection::TooFewTransits {
                observed: complete.len(),
            },
        );
    }
    if !(depth > 0.0 && depth < 1.0) {
        return RefinedCandidate::rejected(window, candidate, Rejection::NonPhysicalDepth);
    }

    let consistent = complete
        .iter()
        .filter(|&&(rg, gg)| event_is_consistent(rg, gg, depth, sigma_out))
        .count();
    if 2 * consistent <= complete.len() {
        return RefinedCandidate::rejected(
            window,
            candidate,
            Rejection::InconsistentEvents {
                consistent,
                complete: complete.len(),
            },
        );
    }

    // Least-squares SNR of the depth: depth / (sigma_out / sqrt(sum g^2)).
    candidate.significance = (depth * sum_gg.sqrt() / sigma_out).max(0.0);
    candidate.false_alarm_probability = false_alarm_probability(candidate.significance);
    candidate.planet_radius =
        depth.sqrt() * config.stellar_radius_solar * SOLAR_RADIUS_IN_EARTH_RADII;

    RefinedCandidate {
        window: *window,
        candidate,
        rejection: None,
    }
}

/// Per-sample noise of the out-of-transit flux. Robust to the dips of other
/// signals in the same light curve.
fn noise_level(flux: &[f64]) -> f64 {
    let robust = robust_sigma(flux);
    let sigma = if robust > MIN_SIGMA { robust } else { std_dev(flux) };
    if sigma > MIN_SIGMA {
        sigma
    } else {
        MIN_SIGMA
    }
}

/// Whether one event's own depth estimate reaches half the fitted depth,
/// within one standard error.
fn event_is_consistent(sum_rg: f64, sum_gg: f64, depth: f64, sigma: f64) -> bool {
    if !(sum_gg > 0.0) {
        return false;
    }
    sum_rg / sum_gg >= depth / 2.0 - sigma / sum_gg.sqrt()
}

/// Refine several windows in parallel, preserving their order.
pub fn refine_all(
    windows: &[CandidateWindow],
    series: &Series,
    config: &DetectionConfig,
) -> Vec<RefinedCandidate> {
    windows
        .par_iter()
        .map(|w| refine_candidate(w, series, config))
        .collect()
}

/// Estimate mid-time offset (relative to the window epoch) and full
/// duration from the folded, binned light curve.
fn fit_shape(
    window: &CandidateWindow,
    points: &[(f64, f64)],
    phase_bins: usize,
) -> Option<(f64, f64)> {
    let period = window.period;
    let nb = phase_bins.max(8);
    let bin_width = period / nb as f64;
    let mut bins = vec![PhaseBin::default(); nb];
    let mut out_flux = Vec::new();

    for &(t, f) in points {
        let d = phase_offset(t, window.epoch, period);
        let idx = (((d + period / 2.0) / bin_width) as usize).min(nb - 1);
        let bin = &mut bins[idx];
        bin.count += 1;
        bin.flux += f;
        bin.phase += d;
        if d.abs() >= window.duration {
            out_flux.push(f);
        }
    }
    if out_flux.is_empty() {
        return None;
    }
    let level = mean(&out_flux);

    // Deepest populated bin inside the search box.
    let half_box = window.duration / 2.0;
    let deepest = bins
        .iter()
        .enumerate()
        .filter(|(_, b)| b.count > 0 && b.mean_phase().abs() <= half_box)
        .min_by(|(_, a), (_, b)| a.mean_flux().total_cmp(&b.mean_flux()))
        .map(|(i, _)| i)?;

    let peak = level - bins[deepest].mean_flux();
    if !(peak > 0.0) {
        return None;
    }
    let threshold = level - peak / 2.0;
    let reach = (window.duration / bin_width).ceil() as usize + 1;

    let left = run_edge(&bins, deepest, threshold, reach, Direction::Left);
    let right = run_edge(&bins, deepest, threshold, reach, Direction::Right);
    let width = (right - left).max(bin_width);

    Some(((left + right) / 2.0, width * SQRT_2))
}

/// Duration multipliers tried around the seeded width.
const DURATION_SCALES: [f64; 5] = [1.0, 0.8, 0.9, 1.1, 1.2];

/// Mid-time shifts tried around the seeded mid, in units of `duration / 20`.
const MID_STEPS: [f64; 5] = [0.0, -2.0, -1.0, 1.0, 2.0];

/// Polish a seeded `(mid, duration)` by least squares.
///
/// With the baseline fixed, the residual sum of squares of the parabolic
/// model is `sum(r^2) - sum(r g)^2 / sum(g^2)`, so the best grid point is the
/// one maximizing `sum(r g)^2 / sum(g^2)` with a positive `sum(r g)`. The seed
/// is kept unless another point improves on it.
fn polish_fit(points: &[(f64, f64)], period: f64, mid: f64, duration: f64) -> (f64, f64) {
    let widest = duration * DURATION_SCALES.iter().copied().fold(1.0, f64::max);
    let baseline_flux: Vec<f64> = points
        .iter()
        .filter(|&&(t, _)| phase_offset(t, mid, period).abs() >= widest)
        .map(|&(_, f)| f)
        .collect();
    if baseline_flux.len() < 2 {
        return (mid, duration);
    }
    let baseline = mean(&baseline_flux);

    let fit = |shift: f64, width: f64| -> f64 {
        let half = width / 2.0;
        let (mut sum_rg, mut sum_gg) = (0.0, 0.0);
        for &(t, f) in points {
            let d = phase_offset(t, mid + shift, period);
            if d.abs() < half {
                let x = d / half;
                let g = 1.0 - x * x;
                sum_rg += (baseline - f) * g;
                sum_gg += g * g;
            }
        }
        if sum_rg > 0.0 && sum_gg > 0.0 {
            sum_rg * sum_rg / sum_gg
        } else {
            f64::NEG_INFINITY
        }
    };

    let step = duration / 20.0;
    let mut best = (fit(0.0, duration), 0.0, duration);
    for scale in DURATION_SCALES {
        for k in MID_STEPS {
            let (shift, width) = (k * step, duration * scale);
            let quality = fit(shift, width);
            if quality > best.0 {
                best = (quality, shift, width);
            }
        }
    }
    (mid + best.1, best.2)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    Left,
    Right,
}

/// Phase of the edge of the below-threshold run containing `from`.
///
/// Walks populated bins away from `from` until one rises above `threshold`
/// and places the edge halfway between that bin and the last one below.
/// Gives up after `reach` bins and uses the last bin below.
fn run_edge(
    bins: &[PhaseBin],
    from: usize,
    threshold: f64,
    reach: usize,
    direction: Direction,
) -> f64 {
    let mut last_below = bins[from].mean_phase();
    for step in 1..=reach {
        let idx = match direction {
            Direction::Left => match from.checked_sub(step) {
                Some(i) => i,
                None => break,
            },
            Direction::Right => {
                if from + step >= bins.len() {
                    break;
                }
                from + step
            }
        };
        let bin = &bins[idx];
        if bin.count == 0 {
            continue;
        }
        if bin.mean_flux() > threshold {
            return (last_below + bin.mean_phase()) / 2.0;
        }
        last_below = bin.mean_phase();
    }
    last_below
}

/// Shift `epoch` by whole periods into `[start, start + period)`.
fn normalize_epoch(epoch: f64, start: f64, period: f64) -> f64 {
    start + (epoch - start).rem_euclid(period)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::preprocess::preprocess;
    use crate::simulate::{DipShape, LightCurveGenerator, NoiseModel};
    use approx::assert_relative_eq;

    fn scenario_window() -> CandidateWindow {
        CandidateWindow {
            period: 3.5,
            epoch: 0.075,
            duration: 0.15,
            score: 50.0,
        }
    }

    #[test]
    fn phase_offset_wraps_to_nearest_transit() {
        assert_relative_eq!(phase_offset(3.6, 0.1, 3.5), 0.0, epsilon = 1e-12);
        assert_relative_eq!(phase_offset(3.4, 0.1, 3.5), -0.2, epsilon = 1e-12);
        assert_relative_eq!(phase_offset(2.0, 0.0, 3.5), -1.5, epsilon = 1e-12);
    }

    #[test]
    fn normalize_epoch_moves_into_first_period() {
        assert_relative_eq!(normalize_epoch(7.1, 0.0, 3.5), 0.1, epsilon = 1e-12);
        assert_relative_eq!(normalize_epoch(-3.4, 0.0, 3.5), 0.1, epsilon = 1e-12);
    }

    #[test]
    fn fits_noise_free_parabolic_transit() {
        let raw = LightCurveGenerator::new()
            .with_noise(NoiseModel::None)
            .generate();
        let config = DetectionConfig::default();
        let series = preprocess(&raw, &config).unwrap();

        let refined = refine_candidate(&scenario_window(), &series, &config);
        assert!(refined.is_valid(), "rejected: {:?}", refined.rejection);

        let c = refined.candidate;
        assert!((c.depth - 0.02).abs() < 0.003, "depth {}", c.depth);
        assert!((c.duration - 0.15).abs() < 0.04, "duration {}", c.duration);
        assert!((c.epoch - 0.075).abs() < 0.03, "epoch {}", c.epoch);
        assert!((8..=9).contains(&c.transit_count));
        assert_eq!(c.orbital_period, 3.5);
        assert!(c.significance > 100.0);
        assert!(c.false_alarm_probability < 1e-12);
    }

    #[test]
    fn planet_radius_scales_with_sqrt_depth() {
        let raw = LightCurveGenerator::new()
            .with_shape(DipShape::Box)
            .with_transit(3.5, 0.01, 0.3)
            .with_noise(NoiseModel::Gaussian { sigma: 0.0005 })
            .generate();
        let config = DetectionConfig::default().with_stellar_radius(0.5);
        let series = preprocess(&raw, &config).unwrap();
        let window = CandidateWindow {
            period: 3.5,
            epoch: 0.15,
            duration: 0.3,
            score: 40.0,
        };

        let c = refine_candidate(&window, &series, &config).candidate;
        assert_relative_eq!(
            c.planet_radius,
            c.depth.sqrt() * 0.5 * SOLAR_RADIUS_IN_EARTH_RADII,
            epsilon = 1e-9
        );
    }

    #[test]
    fn single_event_is_rejected() {
        let raw = LightCurveGenerator::new()
            .with_span(6.0, 0.05)
            .with_transit(5.0, 0.02, 0.2)
            .with_first_transit(2.0)
            .with_noise(NoiseModel::Gaussian { sigma: 0.001 })
            .generate();
        let config = DetectionConfig::default();
        let series = preprocess(&raw, &config).unwrap();
        let window = CandidateWindow {
            period: 5.0,
            epoch: 2.1,
            duration: 0.2,
            score: 20.0,
        };

        let refined = refine_candidate(&window, &series, &config);
        assert!(!refined.is_valid());
        assert!(matches!(
            refined.rejection,
            Some(Rejection::TooFewTransits { observed: 1 })
        ));
    }

    #[test]
    fn rational_alias_is_rejected() {
        // Cadence divides both 3.5 and 7/3, so every fold lands on the same
        // phase grid.
        let raw = LightCurveGenerator::new()
            .with_span(30.0, 7.0 / 150.0)
            .with_noise(NoiseModel::None)
            .generate();
        let config = DetectionConfig::default();
        let series = preprocess(&raw, &config).unwrap();
        // Two thirds of the true period: only every third fold holds a dip.
        let window = CandidateWindow {
            period: 3.5 * 2.0 / 3.0,
            epoch: 0.075,
            duration: 0.15,
            score: 15.0,
        };

        let refined = refine_candidate(&window, &series, &config);
        assert!(
            matches!(
                refined.rejection,
                Some(Rejection::InconsistentEvents { consistent, complete })
                    if 2 * consistent <= complete
            ),
            "rejection {:?}",
            refined.rejection
        );
    }

    #[test]
    fn event_consistency_tolerates_noise() {
        assert!(event_is_consistent(0.02, 1.0, 0.02, 0.001));
        assert!(event_is_consistent(0.005, 1.0, 0.02, 0.006));
        assert!(!event_is_consistent(0.0, 1.0, 0.02, 0.001));
        assert!(!event_is_consistent(0.01, 0.0, 0.02, 0.001));
    }

    #[test]
    fn depth_is_unbiased_under_noise() {
        let config = DetectionConfig::default();
        let depths: Vec<f64> = (0..20)
            .map(|seed| {
                let raw = LightCurveGenerator::new()
                    .with_noise(NoiseModel::Gaussian { sigma: 0.005 })
                    .with_seed(seed)
                    .generate();
                let series = preprocess(&raw, &config).unwrap();
                refine_candidate(&scenario_window(), &series, &config)
                    .candidate
                    .depth
            })
            .collect();

        let average = mean(&depths);
        assert!((average - 0.02).abs() < 0.002, "mean depth {}", average);
    }

    #[test]
    fn significance_is_least_squares_snr() {
        let raw = LightCurveGenerator::new()
            .with_noise(NoiseModel::Gaussian { sigma: 0.002 })
            .with_seed(9)
            .generate();
        let config = DetectionConfig::default();
        let series = preprocess(&raw, &config).unwrap();

        let refined = refine_candidate(&scenario_window(), &series, &config);
        assert!(refined.is_valid(), "rejected: {:?}", refined.rejection);
        let c = refined.candidate;
        // sigma 0.002 over about 18 in-transit points of weight ~0.77
        assert!(
            c.significance > 20.0 && c.significance < 80.0,
            "significance {}",
            c.significance
        );
    }

    #[test]
    fn flat_series_is_rejected_without_panicking() {
        let raw = LightCurveGenerator::new()
            .without_transit()
            .with_noise(NoiseModel::None)
            .generate();
        let config = DetectionConfig::default();
        let series = preprocess(&raw, &config).unwrap();

        let refined = refine_candidate(&scenario_window(), &series, &config);
        assert!(!refined.is_valid());
    }

    #[test]
    fn refine_all_preserves_order() {
        let raw = LightCurveGenerator::new().generate();
        let config = DetectionConfig::default();
        let series = preprocess(&raw, &config).unwrap();
        let windows = vec![
            scenario_window(),
            CandidateWindow {
                period: 2.1,
                epoch: 1.0,
                duration: 0.1,
                score: 3.0,
            },
        ];

        let refined = refine_all(&windows, &series, &config);
        assert_eq!(refined.len(), 2);
        assert_eq!(refined[0].window.period, 3.5);
        assert_eq!(refined[1].window.period, 2.1);
    }
}
