//! Detection configuration.
//!
//! Every stage of the pipeline reads its knobs from a single
//! [`DetectionConfig`]. Configs can be built in code with the `with_*`
//! setters or deserialized from JSON using the camelCase option names
//! (`minPeriodDays`, `maxPeriodDays`, `periodResolution`, ...).
//!
//! ```
//! use transit_search::DetectionConfig;
//!
//! let config = DetectionConfig::from_json_str(
//!     r#"{ "minPeriodDays": 1.0, "maxPeriodDays": 10.0, "maxCandidates": 5 }"#,
//! )
//! .unwrap();
//! assert_eq!(config.max_candidates, 5);
//! assert_eq!(config.period_resolution, 0.005);
//! ```

use crate::error::{Result, TransitError};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Solar radius expressed in Earth radii.
pub const SOLAR_RADIUS_IN_EARTH_RADII: f64 = 109.2;

/// Configuration for transit detection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DetectionConfig {
    /// Shortest trial period (days).
    pub min_period_days: f64,
    /// Longest trial period (days). Also capped by the series span.
    pub max_period_days: f64,
    /// Step between trial periods (days).
    pub period_resolution: f64,
    /// Shortest trial transit duration, as a fraction of the period.
    pub min_transit_duration_fraction: f64,
    /// Longest trial transit duration, as a fraction of the period.
    pub max_transit_duration_fraction: f64,
    /// Number of phase bins used when folding.
    pub phase_bins: usize,
    /// Length of the rolling-median detrending window (days).
    pub detrend_window_days: f64,
    /// Clip samples deviating more than this many local noise sigmas.
    pub sigma_clip_threshold: f64,
    /// Also clip downward outliers. Off by default so deep transits survive.
    pub clip_dips: bool,
    /// Minimum number of usable samples after clipping.
    pub min_samples: usize,
    /// Significance a candidate must reach to count as a detection.
    pub significance_threshold: f64,
    /// Maximum number of candidates passed from the search to the refiner.
    pub max_candidates: usize,
    /// Relative score difference under which two periods count as tied.
    pub tie_epsilon: f64,
    /// Relative tolerance between a period and the fundamental implied by a
    /// longer one (`long / n`) when matching harmonics.
    pub harmonic_tolerance: f64,
    /// Calibration constant `k` of `confidence = 100 s / (s + k)`.
    /// Defaults to the significance threshold.
    pub confidence_scale: Option<f64>,
    /// Host star radius in solar radii, used for the planet radius.
    pub stellar_radius_solar: f64,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            min_period_days: 0.5,
            max_period_days: 15.0,
            period_resolution: 0.005,
            min_transit_duration_fraction: 0.01,
            max_transit_duration_fraction: 0.1,
            phase_bins: 200,
            detrend_window_days: 1.0,
            sigma_clip_threshold: 5.0,
            clip_dips: false,
            min_samples: 50,
            significance_threshold: 7.1,
            max_candidates: 10,
            tie_epsilon: 0.01,
            harmonic_tolerance: 0.02,
            confidence_scale: None,
            stellar_radius_solar: 1.0,
        }
    }
}

impl DetectionConfig {
    /// Create a configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the trial period range (days).
    pub fn with_period_range(mut self, min: f64, max: f64) -> Self {
        self.min_period_days = min;
        self.max_period_days = max;
        self
    }

    /// Set the period grid step (days).
    pub fn with_period_resolution(mut self, resolution: f64) -> Self {
        self.period_resolution = resolution;
        self
    }

    /// Set the trial duration range as fractions of the period.
    pub fn with_duration_fractions(mut self, min: f64, max: f64) -> Self {
        self.min_transit_duration_fraction = min;
        self.max_transit_duration_fraction = max;
        self
    }

    pub fn with_phase_bins(mut self, bins: usize) -> Self {
        self.phase_bins = bins;
        self
    }

    pub fn with_detrend_window(mut self, days: f64) -> Self {
        self.detrend_window_days = days;
        self
    }

    pub fn with_sigma_clip(mut self, threshold: f64) -> Self {
        self.sigma_clip_threshold = threshold;
        self
    }

    pub fn with_clip_dips(mut self, clip: bool) -> Self {
        self.clip_dips = clip;
        self
    }

    pub fn with_min_samples(mut self, min: usize) -> Self {
        self.min_samples = min;
        self
    }

    pub fn with_significance_threshold(mut self, threshold: f64) -> Self {
        self.significance_threshold = threshold;
        self
    }

    pub fn with_max_candidates(mut self, max: usize) -> Self {
        self.max_candidates = max;
        self
    }

    pub fn with_tie_epsilon(mut self, epsilon: f64) -> Self {
        self.tie_epsilon = epsilon;
        self
    }

    pub fn with_harmonic_tolerance(mut self, tolerance: f64) -> Self {
        self.harmonic_tolerance = tolerance;
        self
    }

    pub fn with_confidence_scale(mut self, k: f64) -> Self {
        self.confidence_scale = Some(k);
        self
    }

    pub fn with_stellar_radius(mut self, solar_radii: f64) -> Self {
        self.stellar_radius_solar = solar_radii;
        self
    }

    /// Calibration constant used by the confidence mapping.
    pub fn confidence_k(&self) -> f64 {
        self.confidence_scale.unwrap_or(self.significance_threshold)
    }

    /// Check that all values are consistent.
    pub fn validate(&self) -> Result<()> {
        fn invalid(msg: String) -> Result<()> {
            Err(TransitError::InvalidConfiguration(msg))
        }

        if !(self.min_period_days.is_finite() && self.min_period_days > 0.0) {
            return invalid(format!(
                "minPeriodDays must be positive, got {}",
                self.min_period_days
            ));
        }
        if !(self.max_period_days.is_finite() && self.max_period_days > self.min_period_days) {
            return invalid(format!(
                "maxPeriodDays ({}) must exceed minPeriodDays ({})",
                self.max_period_days, self.min_period_days
            ));
        }
        if !(self.period_resolution.is_finite() && self.period_resolution > 0.0) {
            return invalid(format!(
                "periodResolution must be positive, got {}",
                self.period_resolution
            ));
        }
        let min_frac = self.min_transit_duration_fraction;
        let max_frac = self.max_transit_duration_fraction;
        if !(min_frac > 0.0 && min_frac < 1.0) {
            return invalid(format!(
                "minTransitDurationFraction must lie in (0, 1), got {}",
                min_frac
            ));
        }
        if !(max_frac >= min_frac && max_frac < 1.0) {
            return invalid(format!(
                "maxTransitDurationFraction must lie in [{}, 1), got {}",
                min_frac, max_frac
            ));
        }
        if self.phase_bins < 8 {
            return invalid(format!(
                "phaseBins must be at least 8, got {}",
                self.phase_bins
            ));
        }
        if !(self.detrend_window_days.is_finite() && self.detrend_window_days > 0.0) {
            return invalid(format!(
                "detrendWindowDays must be positive, got {}",
                self.detrend_window_days
            ));
        }
        if !(self.sigma_clip_threshold > 0.0) {
            return invalid(format!(
                "sigmaClipThreshold must be positive, got {}",
                self.sigma_clip_threshold
            ));
        }
        if self.min_samples < 2 {
            return invalid(format!(
                "minSamples must be at least 2, got {}",
                self.min_samples
            ));
        }
        if !(self.significance_threshold.is_finite() && self.significance_threshold > 0.0) {
            return invalid(format!(
                "significanceThreshold must be positive, got {}",
                self.significance_threshold
            ));
        }
        if self.max_candidates == 0 {
            return invalid("maxCandidates must be at least 1".to_string());
        }
        if !(self.tie_epsilon >= 0.0) {
            return invalid(format!(
                "tieEpsilon must be non-negative, got {}",
                self.tie_epsilon
            ));
        }
        if !(self.harmonic_tolerance >= 0.0 && self.harmonic_tolerance < 0.5) {
            return invalid(format!(
                "harmonicTolerance must lie in [0, 0.5), got {}",
                self.harmonic_tolerance
            ));
        }
        if let Some(k) = self.confidence_scale {
            if !(k.is_finite() && k > 0.0) {
                return invalid(format!("confidenceScale must be positive, got {}", k));
            }
        }
        if !(self.stellar_radius_solar.is_finite() && self.stellar_radius_solar > 0.0) {
            return invalid(format!(
                "stellarRadiusSolar must be positive, got {}",
                self.stellar_radius_solar
            ));
        }
        Ok(())
    }

    /// Parse and validate a configuration from JSON. Missing keys take
    /// their default values.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: DetectionConfig = serde_json::from_str(json)
            .map_err(|e| TransitError::InvalidConfiguration(format!("bad config JSON: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a configuration file.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path).map_err(|e| {
            TransitError::InvalidConfiguration(format!(
                "failed to read config {}: {e}",
                path.display()
            ))
        })?;
        Self::from_json_str(&contents)
    }
}
