//! Data transformations for light curves.
//!
//! # Example
//!
//! ```
//! use transit_search::transform::rolling_median;
//!
//! let times = vec![0.0, 0.5, 1.0, 1.5, 2.0];
//! let flux = vec![1.0, 1.02, 0.97, 1.01, 1.0];
//!
//! // Centered median over a one-day window
//! let trend = rolling_median(&times, &flux, 0.5);
//! assert_eq!(trend.len(), flux.len());
//! ```

pub mod window;

pub use window::{rolling_median, rolling_robust_sigma};
