//! # transit-search
//!
//! Detection of periodic transit dips in stellar light curves.
//!
//! A raw brightness series goes through four stages: preprocessing
//! (normalization, detrending, sigma clipping), a box-least-squares period
//! search, parabolic refinement of the best candidates, and ranking with a
//! confidence score. [`pipeline::TransitDetector`] wires them together; every
//! stage is also usable on its own.

// Allow some clippy warnings for cleaner code in specific cases
#![allow(clippy::too_many_arguments)]
#![allow(clippy::needless_range_loop)]
#![allow(clippy::neg_cmp_op_on_partial_ord)]

pub mod config;
pub mod core;
pub mod error;
pub mod io;
pub mod pipeline;
pub mod preprocess;
pub mod rank;
pub mod refine;
pub mod search;
pub mod simulate;
pub mod transform;
pub mod utils;

pub use config::DetectionConfig;
pub use error::{Result, TransitError};
pub use pipeline::{detect_transits, TransitDetector};

pub mod prelude {
    pub use crate::config::DetectionConfig;
    pub use crate::core::{
        CandidateWindow, DetectionResult, QualityFlag, Sample, Series, TransitCandidate,
        TransitSummary,
    };
    pub use crate::error::{Result, TransitError};
    pub use crate::pipeline::{detect_transits, DetectionReport, TransitDetector};
    pub use crate::search::{BoxLeastSquares, PeriodScorer};
}
