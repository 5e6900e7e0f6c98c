//! Box-shaped dip scoring over phase-folded light curves.

use super::{PeriodScorer, SearchInput};
use crate::config::DetectionConfig;
use crate::core::CandidateWindow;

/// Fewest in-transit samples a box may hold before it is scored.
pub const MIN_IN_TRANSIT: usize = 3;

/// Box-least-squares style scorer.
///
/// Folds the series at the trial period, accumulates `phase_bins` bins and
/// slides a wrap-around box of every allowed width over them. A box scores
///
/// ```text
/// (mean_out - mean_in) / (sigma * sqrt(1/n_in + 1/n_out))
/// ```
///
/// i.e. the depth of the dip in units of its standard error, which weights
/// the depth by how many points back it up. Only dips score.
#[derive(Debug, Clone)]
pub struct BoxLeastSquares {
    /// Number of phase bins.
    pub phase_bins: usize,
    /// Shortest box, as a fraction of the period.
    pub min_duration_fraction: f64,
    /// Longest box, as a fraction of the period.
    pub max_duration_fraction: f64,
}

impl Default for BoxLeastSquares {
    fn default() -> Self {
        Self::from_config(&DetectionConfig::default())
    }
}

impl BoxLeastSquares {
    /// Create a scorer with custom parameters.
    pub fn new(phase_bins: usize, min_duration_fraction: f64, max_duration_fraction: f64) -> Self {
        Self {
            phase_bins: phase_bins.max(2),
            min_duration_fraction,
            max_duration_fraction: max_duration_fraction.max(min_duration_fraction),
        }
    }

    /// Create a scorer from the detection configuration.
    pub fn from_config(config: &DetectionConfig) -> Self {
        Self::new(
            config.phase_bins,
            config.min_transit_duration_fraction,
            config.max_transit_duration_fraction,
        )
    }

    /// Range of box widths in bins.
    fn width_range(&self) -> (usize, usize) {
        let nb = self.phase_bins as f64;
        let q_min = ((self.min_duration_fraction * nb).round() as usize).max(1);
        let q_max = ((self.max_duration_fraction * nb).round() as usize)
            .max(q_min)
            .min(self.phase_bins / 2);
        (q_min.min(q_max), q_max)
    }
}

impl PeriodScorer for BoxLeastSquares {
    fn score_period(&self, input: &SearchInput, period: f64) -> Option<CandidateWindow> {
        let n_total = input.len();
        if !(period > 0.0) || n_total < 2 * MIN_IN_TRANSIT {
            return None;
        }

        let nb = self.phase_bins;
        let mut counts = vec![0usize; nb];
        let mut sums = vec![0.0; nb];
        for (&t, &f) in input.times.iter().zip(input.flux.iter()) {
            let phase = (t / period).fract();
            let bin = ((phase * nb as f64) as usize).min(nb - 1);
            counts[bin] += 1;
            sums[bin] += f;
        }

        // Prefix sums over two laps so boxes can wrap past phase 1.
        let mut cum_count = vec![0usize; 2 * nb + 1];
        let mut cum_sum = vec![0.0; 2 * nb + 1];
        for i in 0..2 * nb {
            cum_count[i + 1] = cum_count[i] + counts[i % nb];
            cum_sum[i + 1] = cum_sum[i] + sums[i % nb];
        }

        let total = input.total;
        let (q_min, q_max) = self.width_range();
        let mut best: Option<(f64, usize, usize)> = None;

        for q in q_min..=q_max {
            for start in 0..nb {
                let n_in = cum_count[start + q] - cum_count[start];
                if n_in < MIN_IN_TRANSIT || n_total - n_in < MIN_IN_TRANSIT {
                    continue;
                }
                let s_in = cum_sum[start + q] - cum_sum[start];
                let n_out = n_total - n_in;
                let depth = (total - s_in) / n_out as f64 - s_in / n_in as f64;
                if depth <= 0.0 {
                    continue;
                }
                let score =
                    depth / (input.sigma * (1.0 / n_in as f64 + 1.0 / n_out as f64).sqrt());
                if best.map_or(true, |(s, _, _)| score > s) {
                    best = Some((score, start, q));
                }
            }
        }

        best.map(|(score, start, q)| {
            let bin_width = period / nb as f64;
            let center = (start as f64 + q as f64 / 2.0) * bin_width;
            CandidateWindow {
                period,
                epoch: input.t0 + center % period,
                duration: q as f64 * bin_width,
                score,
            }
        })
    }

    fn name(&self) -> &'static str {
        "BoxLeastSquares"
    }
}
