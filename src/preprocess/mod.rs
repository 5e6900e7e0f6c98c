//! Light curve cleaning and normalization.
//!
//! Turns a raw [`Series`] into the form the period search expects:
//!
//! 1. Samples with non-finite brightness are dropped.
//! 2. Samples sharing a timestamp are merged by averaging.
//! 3. Brightness is divided by its median so the baseline becomes 1.0.
//! 4. A centered rolling median over `detrend_window_days` is divided out,
//!    removing slow stellar variability while leaving short dips intact.
//! 5. Samples deviating upward from the trend by more than
//!    `sigma_clip_threshold` local noise sigmas are flagged
//!    [`QualityFlag::Clipped`] (downward too with `clip_dips`). They stay in
//!    the output for display but are skipped by the search.

use crate::config::DetectionConfig;
use crate::core::{QualityFlag, Sample, Series};
use crate::error::{Result, TransitError};
use crate::transform::{rolling_median, rolling_robust_sigma};
use crate::utils::stats::{median, robust_sigma};
use log::debug;

/// Noise levels below this are treated as a noise-free series.
const MIN_NOISE: f64 = 1e-12;

/// Clean, normalize and detrend a light curve.
///
/// Fails with [`TransitError::InsufficientData`] when fewer than
/// `config.min_samples` usable samples remain after clipping.
pub fn preprocess(series: &Series, config: &DetectionConfig) -> Result<Series> {
    let needed = config.min_samples.max(2);
    if series.len() < 2 {
        return Err(TransitError::InsufficientData {
            needed,
            got: series.len(),
        });
    }

    let merged = merge_duplicates(series.samples());
    let merged_away = series.len() - merged.len();

    let good: Vec<f64> = merged
        .iter()
        .filter(|s| s.flag != QualityFlag::Bad)
        .map(|s| s.brightness)
        .collect();
    if good.len() < needed {
        return Err(TransitError::InsufficientData {
            needed,
            got: good.len(),
        });
    }

    let baseline = median(&good);
    if !(baseline.is_finite() && baseline > 0.0) {
        return Err(TransitError::InvalidSeries(format!(
            "median brightness must be positive to normalize, got {}",
            baseline
        )));
    }

    let times: Vec<f64> = merged.iter().map(|s| s.time).collect();
    let normalized: Vec<f64> = merged.iter().map(|s| s.brightness / baseline).collect();

    // Bad samples are excluded from the trend and noise estimates.
    let masked: Vec<f64> = merged
        .iter()
        .zip(normalized.iter())
        .map(|(s, &v)| if s.flag == QualityFlag::Bad { f64::NAN } else { v })
        .collect();

    let half_window = config.detrend_window_days / 2.0;
    let trend = rolling_median(&times, &masked, half_window);
    let detrended: Vec<f64> = normalized
        .iter()
        .zip(trend.iter())
        .map(|(&v, &t)| if t.is_finite() && t > 0.0 { v / t } else { v })
        .collect();

    let residuals: Vec<f64> = detrended
        .iter()
        .zip(masked.iter())
        .map(|(&d, &m)| if m.is_finite() { d - 1.0 } else { f64::NAN })
        .collect();
    let finite_residuals: Vec<f64> = residuals.iter().copied().filter(|r| r.is_finite()).collect();
    let global_sigma = robust_sigma(&finite_residuals);
    let local_sigma = rolling_robust_sigma(&times, &residuals, half_window);

    let mut clipped = 0usize;
    let samples: Vec<Sample> = merged
        .iter()
        .enumerate()
        .map(|(i, s)| {
            let mut flag = s.flag;
            if flag != QualityFlag::Bad {
                let sigma = noise_floor(local_sigma[i], global_sigma);
                if sigma > MIN_NOISE && is_outlier(residuals[i], sigma, config) {
                    flag = QualityFlag::Clipped;
                    clipped += 1;
                }
            }
            Sample {
                time: s.time,
                brightness: detrended[i],
                flag,
            }
        })
        .collect();

    let cleaned = Series::from_sorted(samples, baseline);
    let usable = cleaned.usable_count();
    debug!(
        "preprocess: {} samples in, {} merged, {} clipped, {} usable, baseline {:.6}, noise {:.3e}",
        series.len(),
        merged_away,
        clipped,
        usable,
        baseline,
        global_sigma
    );

    if usable < needed {
        return Err(TransitError::InsufficientData { needed, got: usable });
    }
    Ok(cleaned)
}

/// Local noise, never below half the global noise so quiet stretches do not
/// over-clip.
fn noise_floor(local: f64, global: f64) -> f64 {
    let floor = if global.is_finite() { 0.5 * global } else { 0.0 };
    if local.is_finite() {
        local.max(floor)
    } else {
        floor
    }
}

fn is_outlier(residual: f64, sigma: f64, config: &DetectionConfig) -> bool {
    let limit = config.sigma_clip_threshold * sigma;
    if config.clip_dips {
        residual.abs() > limit
    } else {
        residual > limit
    }
}

/// Drop non-finite samples and average samples sharing a timestamp.
///
/// Input must be sorted by time. Previous clipping is discarded; a merged
/// sample is `Bad` only when every source sample was.
fn merge_duplicates(samples: &[Sample]) -> Vec<Sample> {
    let mut merged: Vec<Sample> = Vec::with_capacity(samples.len());
    let mut i = 0;

    while i < samples.len() {
        let time = samples[i].time;
        let mut j = i;
        while j < samples.len() && samples[j].time == time {
            j += 1;
        }

        let group: Vec<&Sample> = samples[i..j]
            .iter()
            .filter(|s| s.brightness.is_finite())
            .collect();
        let good: Vec<f64> = group
            .iter()
            .filter(|s| s.flag != QualityFlag::Bad)
            .map(|s| s.brightness)
            .collect();

        if !good.is_empty() {
            merged.push(Sample::new(time, good.iter().sum::<f64>() / good.len() as f64));
        } else if !group.is_empty() {
            let avg = group.iter().map(|s| s.brightness).sum::<f64>() / group.len() as f64;
            merged.push(Sample::new(time, avg).with_flag(QualityFlag::Bad));
        }
        i = j;
    }

    merged
}
