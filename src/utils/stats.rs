//! Statistical utility functions.

use statrs::distribution::{ContinuousCDF, Normal};

/// Scale factor turning a MAD into a Gaussian-consistent standard deviation.
pub const MAD_TO_SIGMA: f64 = 1.4826;

/// Calculate the mean of a slice.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Calculate the variance of a slice (sample variance with n-1 denominator).
pub fn variance(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return f64::NAN;
    }
    let m = mean(values);
    let sum_sq: f64 = values.iter().map(|x| (x - m).powi(2)).sum();
    sum_sq / (values.len() - 1) as f64
}

/// Calculate the standard deviation of a slice.
pub fn std_dev(values: &[f64]) -> f64 {
    variance(values).sqrt()
}

/// Calculate the median of a slice.
pub fn median(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    median_of_sorted(&sorted)
}

/// Median of an already sorted slice.
pub(crate) fn median_of_sorted(sorted: &[f64]) -> f64 {
    let n = sorted.len();
    if n == 0 {
        return f64::NAN;
    }
    if n % 2 == 0 {
        (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0
    } else {
        sorted[n / 2]
    }
}

/// Median absolute deviation around the median.
pub fn mad(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    let m = median(values);
    let deviations: Vec<f64> = values.iter().map(|x| (x - m).abs()).collect();
    median(&deviations)
}

/// Robust standard deviation estimate (scaled MAD).
pub fn robust_sigma(values: &[f64]) -> f64 {
    mad(values) * MAD_TO_SIGMA
}

/// One-sided false alarm probability of a Gaussian signal-to-noise ratio.
///
/// Probability that pure white noise produces a dip at least `snr` standard
/// errors deep at a single trial.
pub fn false_alarm_probability(snr: f64) -> f64 {
    if !snr.is_finite() {
        return if snr > 0.0 { 0.0 } else { 1.0 };
    }
    match Normal::new(0.0, 1.0) {
        Ok(normal) => normal.sf(snr),
        Err(_) => f64::NAN,
    }
}
