//! Core data structures for light curves and detections.

mod detection;
mod series;

pub use detection::{CandidateWindow, DetectionResult, TransitCandidate, TransitSummary};
pub use series::{QualityFlag, Sample, Series};
