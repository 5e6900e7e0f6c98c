//! Utility functions shared by the pipeline stages.

pub mod stats;

pub use stats::{false_alarm_probability, mad, mean, median, robust_sigma, std_dev};
