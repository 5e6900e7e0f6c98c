//! Trial period grid.

use crate::config::DetectionConfig;

/// Build the list of trial periods for a series.
///
/// Periods run from `min_period_days` in steps of `period_resolution` up to
/// the smaller of `max_period_days` and the series span. Periods shorter than
/// twice the cadence cannot be resolved and are left out.
pub fn period_grid(config: &DetectionConfig, cadence: f64, span: f64) -> Vec<f64> {
    let min = config.min_period_days;
    let max = config.max_period_days.min(span);
    let step = config.period_resolution;
    if !(min > 0.0 && step > 0.0) || max < min {
        return Vec::new();
    }

    let steps = ((max - min) / step + 1e-9).floor() as usize;
    let shortest = 2.0 * cadence;
    (0..=steps)
        .map(|i| min + i as f64 * step)
        .filter(|&p| p >= shortest)
        .collect()
}
