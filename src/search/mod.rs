//! Periodicity search over a normalized light curve.
//!
//! Every trial period on the grid is scored independently by a
//! [`PeriodScorer`], in parallel on the rayon pool. The per-period maxima
//! form a periodogram whose local peaks become [`CandidateWindow`]s, ordered
//! by score with a tie-break towards shorter periods. Aliases of an already
//! selected peak are dropped before the list is capped at `max_candidates`.

mod bls;
mod grid;

pub use bls::{BoxLeastSquares, MIN_IN_TRANSIT};
pub use grid::period_grid;

use crate::config::DetectionConfig;
use crate::core::{CandidateWindow, Series};
use crate::error::{Result, TransitError};
use crate::rank::is_alias;
use crate::utils::stats::{mean, robust_sigma, std_dev};
use log::debug;
use rayon::prelude::*;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

/// Noise floor used when a series is (numerically) noise-free.
const MIN_SIGMA: f64 = 1e-9;

/// Usable samples prepared for folding.
#[derive(Debug, Clone)]
pub struct SearchInput {
    /// Reference time; `times` are relative to it.
    pub t0: f64,
    /// Sample times minus `t0`.
    pub times: Vec<f64>,
    /// Normalized brightness.
    pub flux: Vec<f64>,
    /// Sum of `flux`.
    pub total: f64,
    /// Robust per-sample noise.
    pub sigma: f64,
}

impl SearchInput {
    /// Collect the usable samples of a series. Returns `None` with fewer
    /// than two usable samples.
    pub fn from_series(series: &Series) -> Option<Self> {
        let usable: Vec<(f64, f64)> = series.usable().map(|s| (s.time, s.brightness)).collect();
        if usable.len() < 2 {
            return None;
        }

        let t0 = usable[0].0;
        let times: Vec<f64> = usable.iter().map(|(t, _)| t - t0).collect();
        let flux: Vec<f64> = usable.iter().map(|(_, f)| *f).collect();
        let total = flux.iter().sum();

        let mut sigma = robust_sigma(&flux);
        if !(sigma > MIN_SIGMA) {
            sigma = std_dev(&flux);
        }
        if !(sigma > MIN_SIGMA) {
            sigma = MIN_SIGMA;
        }

        Some(Self {
            t0,
            times,
            flux,
            total,
            sigma,
        })
    }

    pub fn len(&self) -> usize {
        self.flux.len()
    }

    pub fn is_empty(&self) -> bool {
        self.flux.is_empty()
    }

    /// Mean normalized brightness.
    pub fn mean(&self) -> f64 {
        mean(&self.flux)
    }
}

/// Scores a single trial period.
///
/// Implementations must be pure: the search calls them concurrently from
/// the rayon pool.
pub trait PeriodScorer: Sync {
    /// Best dip hypothesis at `period`, or `None` if no dip scores.
    fn score_period(&self, input: &SearchInput, period: f64) -> Option<CandidateWindow>;

    /// Name of the scoring method.
    fn name(&self) -> &'static str;
}

/// Best score found at each trial period.
#[derive(Debug, Clone, Default)]
pub struct Periodogram {
    /// Trial periods, ascending.
    pub periods: Vec<f64>,
    /// Best window per trial period (`None` when nothing scored).
    pub windows: Vec<Option<CandidateWindow>>,
}

impl Periodogram {
    /// Score for each trial period, 0.0 where nothing scored.
    pub fn scores(&self) -> Vec<f64> {
        self.windows
            .iter()
            .map(|w| w.map(|w| w.score).unwrap_or(0.0))
            .collect()
    }

    /// The single best window on the grid.
    pub fn best(&self) -> Option<CandidateWindow> {
        self.windows
            .iter()
            .flatten()
            .copied()
            .max_by(|a, b| a.score.total_cmp(&b.score).then(b.period.total_cmp(&a.period)))
    }

    /// Windows sitting on local maxima of the score curve.
    pub fn peaks(&self) -> Vec<CandidateWindow> {
        let scores = self.scores();
        let n = scores.len();
        (0..n)
            .filter(|&i| {
                let s = scores[i];
                let left = if i > 0 { scores[i - 1] } else { f64::NEG_INFINITY };
                let right = if i + 1 < n { scores[i + 1] } else { f64::NEG_INFINITY };
                s > 0.0 && s >= left && s > right
            })
            .filter_map(|i| self.windows[i])
            .collect()
    }
}

/// Score every trial period in parallel.
///
/// `cancel` is checked at each trial period; once set, remaining periods are
/// skipped and [`TransitError::Cancelled`] is returned.
pub fn compute_periodogram<S: PeriodScorer>(
    scorer: &S,
    series: &Series,
    config: &DetectionConfig,
    cancel: Option<&AtomicBool>,
) -> Result<Periodogram> {
    let Some(input) = SearchInput::from_series(series) else {
        return Ok(Periodogram::default());
    };

    let span = input.times.last().copied().unwrap_or(0.0);
    let periods = period_grid(config, series.cadence(), span);
    let is_cancelled = || cancel.is_some_and(|c| c.load(Ordering::Relaxed));

    let windows: Vec<Option<CandidateWindow>> = periods
        .par_iter()
        .map(|&period| {
            if is_cancelled() {
                return None;
            }
            scorer.score_period(&input, period)
        })
        .collect();

    if is_cancelled() {
        return Err(TransitError::Cancelled);
    }

    Ok(Periodogram { periods, windows })
}

/// Search a normalized series for periodic dips with the default
/// box-least-squares scorer.
pub fn search_periods(series: &Series, config: &DetectionConfig) -> Result<Vec<CandidateWindow>> {
    search_periods_with(&BoxLeastSquares::from_config(config), series, config, None)
}

/// Cancellable variant of [`search_periods`].
pub fn search_periods_with_cancel(
    series: &Series,
    config: &DetectionConfig,
    cancel: &AtomicBool,
) -> Result<Vec<CandidateWindow>> {
    search_periods_with(
        &BoxLeastSquares::from_config(config),
        series,
        config,
        Some(cancel),
    )
}

/// Search with an arbitrary scorer.
pub fn search_periods_with<S: PeriodScorer>(
    scorer: &S,
    series: &Series,
    config: &DetectionConfig,
    cancel: Option<&AtomicBool>,
) -> Result<Vec<CandidateWindow>> {
    config.validate()?;
    let started = Instant::now();

    let periodogram = compute_periodogram(scorer, series, config, cancel)?;
    let peaks = periodogram.peaks();
    let candidates = order_candidates(peaks, config);

    debug!(
        "{}: {} trial periods, {} peaks, {} candidates kept in {:?}",
        scorer.name(),
        periodogram.periods.len(),
        periodogram.windows.iter().flatten().count(),
        candidates.len(),
        started.elapsed()
    );
    Ok(candidates)
}

/// Order windows by descending score.
///
/// Windows whose score lies within `tie_epsilon` (relative) of the best
/// remaining score are considered tied; among tied windows the shortest
/// period goes first, so a harmonic multiple never displaces its fundamental.
/// A window that is an alias of one already selected (see
/// [`is_alias`](crate::rank::is_alias)) is dropped without taking a slot. At
/// most `max_candidates` windows are returned.
pub fn order_candidates(
    mut windows: Vec<CandidateWindow>,
    config: &DetectionConfig,
) -> Vec<CandidateWindow> {
    let limit = config.max_candidates;
    let epsilon = config.tie_epsilon;
    windows.sort_by(|a, b| {
        b.score
            .total_cmp(&a.score)
            .then(a.period.total_cmp(&b.period))
    });

    let mut ordered: Vec<CandidateWindow> = Vec::with_capacity(limit.min(windows.len()));
    while !windows.is_empty() && ordered.len() < limit {
        let lead = windows[0].score;
        let cutoff = lead - epsilon * lead.abs();
        let pick = windows
            .iter()
            .enumerate()
            .take_while(|(_, w)| w.score >= cutoff)
            .min_by(|(_, a), (_, b)| a.period.total_cmp(&b.period))
            .map(|(i, _)| i)
            .unwrap_or(0);
        let window = windows.remove(pick);
        if ordered
            .iter()
            .any(|w| is_alias(w.period, window.period, config))
        {
            continue;
        }
        ordered.push(window);
    }
    ordered
}
