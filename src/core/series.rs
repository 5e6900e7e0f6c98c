//! Light curve samples and the series container.

use crate::error::{Result, TransitError};
use crate::utils::stats::median;
use serde::{Deserialize, Serialize};

/// Quality marker attached to a sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QualityFlag {
    /// Usable measurement.
    #[default]
    Good,
    /// Rejected by sigma clipping. Kept for display, skipped by the search.
    Clipped,
    /// Marked unusable by the data source.
    Bad,
}

/// A single brightness measurement.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    /// Observation time in days.
    pub time: f64,
    /// Measured brightness (flux), arbitrary units before normalization.
    pub brightness: f64,
    /// Quality marker.
    #[serde(default)]
    pub flag: QualityFlag,
}

impl Sample {
    pub fn new(time: f64, brightness: f64) -> Self {
        Self {
            time,
            brightness,
            flag: QualityFlag::Good,
        }
    }

    pub fn with_flag(mut self, flag: QualityFlag) -> Self {
        self.flag = flag;
        self
    }

    /// Whether the sample may take part in the period search.
    pub fn is_usable(&self) -> bool {
        self.flag == QualityFlag::Good && self.brightness.is_finite()
    }
}

/// An ordered light curve.
///
/// Samples are kept sorted by time. Duplicate timestamps are tolerated here
/// and merged by the preprocessor, whose output has strictly increasing
/// times.
#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    samples: Vec<Sample>,
    cadence: f64,
    baseline: f64,
}

impl Series {
    /// Create a series from samples in any order.
    ///
    /// Samples are stably sorted by time. Fails if any timestamp is not
    /// finite.
    pub fn new(mut samples: Vec<Sample>) -> Result<Self> {
        if let Some(pos) = samples.iter().position(|s| !s.time.is_finite()) {
            return Err(TransitError::InvalidSeries(format!(
                "sample {} has a non-finite timestamp",
                pos
            )));
        }
        samples.sort_by(|a, b| a.time.total_cmp(&b.time));
        Ok(Self::from_sorted(samples, 1.0))
    }

    /// Create a series from parallel time and brightness arrays.
    pub fn from_arrays(times: &[f64], brightness: &[f64]) -> Result<Self> {
        if times.len() != brightness.len() {
            return Err(TransitError::InvalidSeries(format!(
                "got {} timestamps but {} brightness values",
                times.len(),
                brightness.len()
            )));
        }
        let samples = times
            .iter()
            .zip(brightness.iter())
            .map(|(&t, &b)| Sample::new(t, b))
            .collect();
        Self::new(samples)
    }

    /// Build from samples already sorted by time.
    pub(crate) fn from_sorted(samples: Vec<Sample>, baseline: f64) -> Self {
        let cadence = median_spacing(&samples);
        Self {
            samples,
            cadence,
            baseline,
        }
    }

    /// Number of samples, including flagged ones.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    /// Median spacing between consecutive distinct timestamps (days).
    pub fn cadence(&self) -> f64 {
        self.cadence
    }

    /// Brightness level the samples were divided by (1.0 if never normalized).
    pub fn baseline(&self) -> f64 {
        self.baseline
    }

    /// Time of the first sample.
    pub fn start(&self) -> Option<f64> {
        self.samples.first().map(|s| s.time)
    }

    /// Time of the last sample.
    pub fn end(&self) -> Option<f64> {
        self.samples.last().map(|s| s.time)
    }

    /// Time covered by the series (0.0 when empty).
    pub fn span(&self) -> f64 {
        match (self.start(), self.end()) {
            (Some(a), Some(b)) => b - a,
            _ => 0.0,
        }
    }

    /// Iterate over the samples usable by the search.
    pub fn usable(&self) -> impl Iterator<Item = &Sample> {
        self.samples.iter().filter(|s| s.is_usable())
    }

    pub fn usable_count(&self) -> usize {
        self.usable().count()
    }

    /// Count samples carrying the given flag.
    pub fn count_flagged(&self, flag: QualityFlag) -> usize {
        self.samples.iter().filter(|s| s.flag == flag).count()
    }

    /// Times of all samples.
    pub fn times(&self) -> Vec<f64> {
        self.samples.iter().map(|s| s.time).collect()
    }

    /// Brightness of all samples.
    pub fn brightness(&self) -> Vec<f64> {
        self.samples.iter().map(|s| s.brightness).collect()
    }

    /// Whether timestamps are strictly increasing.
    pub fn is_strictly_increasing(&self) -> bool {
        self.samples.windows(2).all(|w| w[1].time > w[0].time)
    }
}

fn median_spacing(samples: &[Sample]) -> f64 {
    let gaps: Vec<f64> = samples
        .windows(2)
        .map(|w| w[1].time - w[0].time)
        .filter(|d| *d > 0.0)
        .collect();
    if gaps.is_empty() {
        return 0.0;
    }
    median(&gaps)
}
