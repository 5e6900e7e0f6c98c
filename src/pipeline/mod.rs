//! End-to-end transit detection.
//!
//! [`TransitDetector`] runs the four stages in order:
//!
//! 1. [`preprocess`] normalizes, detrends and sigma-clips the raw series;
//! 2. the period search scores a grid of trial periods and keeps the best
//!    local peaks;
//! 3. [`refine_all`] fits a parabolic transit to each peak;
//! 4. [`rank_candidates`] filters, deduplicates and scores the survivors.
//!
//! # Example
//!
//! ```
//! use transit_search::pipeline::TransitDetector;
//! use transit_search::simulate::LightCurveGenerator;
//! use transit_search::DetectionConfig;
//!
//! let series = LightCurveGenerator::new().generate();
//! let detector = TransitDetector::new(DetectionConfig::default()).unwrap();
//! let result = detector.detect(&series).unwrap();
//!
//! if let Some(top) = result.top() {
//!     println!("period {:.3} d, depth {:.4}", top.period, top.depth);
//! }
//! ```

use crate::config::DetectionConfig;
use crate::core::{CandidateWindow, DetectionResult, Series};
use crate::error::Result;
use crate::preprocess::preprocess;
use crate::rank::rank_candidates;
use crate::refine::{refine_all, RefinedCandidate};
use crate::search::{search_periods_with, BoxLeastSquares, PeriodScorer};
use log::{debug, info};
use std::sync::atomic::AtomicBool;
use std::time::Instant;

/// Intermediate products of one run, for inspection and plotting.
#[derive(Debug, Clone)]
pub struct DetectionReport {
    /// Preprocessed series the search ran on.
    pub cleaned: Series,
    /// Search windows, in search order.
    pub windows: Vec<CandidateWindow>,
    /// Refinement outcome for each window, in the same order.
    pub refined: Vec<RefinedCandidate>,
    /// Final ranked result.
    pub result: DetectionResult,
}

/// Configured transit detector.
///
/// Stateless between calls: the same detector can be shared across threads
/// and reused for any number of series.
#[derive(Debug, Clone)]
pub struct TransitDetector<S: PeriodScorer = BoxLeastSquares> {
    config: DetectionConfig,
    scorer: S,
}

impl TransitDetector<BoxLeastSquares> {
    /// Create a detector with the box-least-squares scorer.
    ///
    /// Fails with `InvalidConfiguration` if `config` does not validate.
    pub fn new(config: DetectionConfig) -> Result<Self> {
        config.validate()?;
        let scorer = BoxLeastSquares::from_config(&config);
        Ok(Self { config, scorer })
    }
}

impl<S: PeriodScorer> TransitDetector<S> {
    /// Create a detector with a custom period scorer.
    pub fn with_scorer(config: DetectionConfig, scorer: S) -> Result<Self> {
        config.validate()?;
        Ok(Self { config, scorer })
    }

    pub fn config(&self) -> &DetectionConfig {
        &self.config
    }

    pub fn scorer(&self) -> &S {
        &self.scorer
    }

    /// Run the full pipeline on a raw series.
    pub fn detect(&self, series: &Series) -> Result<DetectionResult> {
        self.run(series, None).map(|report| report.result)
    }

    /// Like [`detect`](Self::detect), but stops with `Cancelled` once
    /// `cancel` is set. The flag is checked at every trial period.
    pub fn detect_with_cancel(
        &self,
        series: &Series,
        cancel: &AtomicBool,
    ) -> Result<DetectionResult> {
        self.run(series, Some(cancel)).map(|report| report.result)
    }

    /// Run the full pipeline and keep every intermediate product.
    pub fn detect_report(&self, series: &Series) -> Result<DetectionReport> {
        self.run(series, None)
    }

    fn run(&self, series: &Series, cancel: Option<&AtomicBool>) -> Result<DetectionReport> {
        let started = Instant::now();

        let cleaned = preprocess(series, &self.config)?;
        debug!(
            "preprocessed {} samples ({} usable, cadence {:.4} d)",
            cleaned.len(),
            cleaned.usable_count(),
            cleaned.cadence()
        );

        let windows = search_periods_with(&self.scorer, &cleaned, &self.config, cancel)?;
        let refined = refine_all(&windows, &cleaned, &self.config);
        debug!(
            "refined {} windows, {} valid",
            refined.len(),
            refined.iter().filter(|r| r.is_valid()).count()
        );

        let result = rank_candidates(&refined, &self.config);
        match result.top() {
            Some(top) => info!(
                "transit candidate: period {:.4} d, depth {:.5}, significance {:.1}, \
                 confidence {:.1}% ({} candidates, {:?})",
                top.period,
                top.depth,
                top.significance,
                result.confidence(),
                result.len(),
                started.elapsed()
            ),
            None => info!("no periodic transit signal ({:?})", started.elapsed()),
        }

        Ok(DetectionReport {
            cleaned,
            windows,
            refined,
            result,
        })
    }
}

/// Detect transits with the default configuration.
pub fn detect_transits(series: &Series) -> Result<DetectionResult> {
    TransitDetector::new(DetectionConfig::default())?.detect(series)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TransitError;
    use crate::simulate::{LightCurveGenerator, NoiseModel};

    #[test]
    fn rejects_invalid_configuration() {
        let config = DetectionConfig::default().with_period_range(5.0, 1.0);
        let err = TransitDetector::new(config).unwrap_err();
        assert!(matches!(err, TransitError::InvalidConfiguration(_)));
    }

    #[test]
    fn detects_injected_transit() {
        let series = LightCurveGenerator::new().generate();
        let result = detect_transits(&series).unwrap();

        assert!(result.transit_detected());
        let top = result.top().unwrap();
        assert!((top.period - 3.5).abs() <= 0.05, "period {}", top.period);
    }

    #[test]
    fn report_keeps_stage_outputs_aligned() {
        let series = LightCurveGenerator::new().generate();
        let detector = TransitDetector::new(DetectionConfig::default()).unwrap();
        let report = detector.detect_report(&series).unwrap();

        assert_eq!(report.cleaned.len(), series.len());
        assert_eq!(report.windows.len(), report.refined.len());
        assert!(report.windows.len() <= detector.config().max_candidates);
        assert!(report.result.len() <= report.refined.len());
    }

    #[test]
    fn cancelled_run_returns_cancelled() {
        let series = LightCurveGenerator::new().generate();
        let detector = TransitDetector::new(DetectionConfig::default()).unwrap();
        let cancel = AtomicBool::new(true);

        let err = detector.detect_with_cancel(&series, &cancel).unwrap_err();
        assert_eq!(err, TransitError::Cancelled);
    }

    #[test]
    fn short_series_is_insufficient() {
        let series = LightCurveGenerator::new()
            .with_span(1.0, 0.05)
            .with_noise(NoiseModel::None)
            .generate();
        let err = detect_transits(&series).unwrap_err();
        assert!(matches!(
            err,
            TransitError::InsufficientData { needed: 50, got: 20 }
        ));
    }
}
