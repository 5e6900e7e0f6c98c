//! Time-based rolling window functions.
//!
//! Light curves have gaps, so windows are defined in time units rather than
//! sample counts: the window around sample `i` holds every sample whose time
//! lies within `half_width` of `times[i]`.

use crate::utils::stats::{median_of_sorted, MAD_TO_SIGMA};

/// Compute a centered rolling median over a time window.
///
/// # Arguments
/// * `times` - Sample times, sorted ascending
/// * `values` - Values aligned with `times`
/// * `half_width` - Half the window length, in the units of `times`
pub fn rolling_median(times: &[f64], values: &[f64], half_width: f64) -> Vec<f64> {
    rolling_apply(times, values, half_width, median_of_sorted)
}

/// Compute a centered rolling robust standard deviation (scaled MAD).
pub fn rolling_robust_sigma(times: &[f64], values: &[f64], half_width: f64) -> Vec<f64> {
    rolling_apply(times, values, half_width, |sorted| {
        let m = median_of_sorted(sorted);
        let mut deviations: Vec<f64> = sorted.iter().map(|x| (x - m).abs()).collect();
        deviations.sort_by(|a, b| a.total_cmp(b));
        median_of_sorted(&deviations) * MAD_TO_SIGMA
    })
}

/// Generic centered rolling application over a time window.
///
/// `f` receives the window values sorted ascending. Returns NaN everywhere
/// when the inputs are misaligned or the width is not positive.
fn rolling_apply<F>(times: &[f64], values: &[f64], half_width: f64, f: F) -> Vec<f64>
where
    F: Fn(&[f64]) -> f64,
{
    let n = values.len();
    if times.len() != n || half_width.is_nan() || half_width <= 0.0 {
        return vec![f64::NAN; n];
    }

    let mut result = Vec::with_capacity(n);
    let mut start = 0;
    let mut end = 0;
    let mut window = Vec::new();

    for i in 0..n {
        let t = times[i];
        while start < n && times[start] < t - half_width {
            start += 1;
        }
        if end < start {
            end = start;
        }
        while end < n && times[end] <= t + half_width {
            end += 1;
        }

        window.clear();
        window.extend(values[start..end].iter().copied().filter(|v| v.is_finite()));
        if window.is_empty() {
            result.push(f64::NAN);
            continue;
        }
        window.sort_by(|a, b| a.total_cmp(b));
        result.push(f(&window));
    }

    result
}
