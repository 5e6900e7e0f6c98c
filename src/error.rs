//! Error types for the transit-search library.

use thiserror::Error;

/// Result type alias for transit search operations.
pub type Result<T> = std::result::Result<T, TransitError>;

/// Errors that can occur while detecting transits.
///
/// Only structural problems are surfaced. A series without a periodic dip is
/// not an error: the pipeline returns an empty
/// [`DetectionResult`](crate::core::DetectionResult) instead.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TransitError {
    /// Too few usable samples remain for the operation.
    #[error("insufficient data: need at least {needed}, got {got}")]
    InsufficientData { needed: usize, got: usize },

    /// Configuration values are inconsistent or out of range.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// Samples handed to a series constructor violate its invariants.
    #[error("invalid series: {0}")]
    InvalidSeries(String),

    /// The caller abandoned the run.
    #[error("detection cancelled")]
    Cancelled,

    /// Light-curve input could not be parsed.
    #[error("parse error: {0}")]
    Parse(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_messages_are_descriptive() {
        let err = TransitError::InsufficientData {
            needed: 50,
            got: 12,
        };
        assert_eq!(
            err.to_string(),
            "insufficient data: need at least 50, got 12"
        );

        let err = TransitError::InvalidConfiguration("min period must be positive".to_string());
        assert_eq!(
            err.to_string(),
            "invalid configuration: min period must be positive"
        );

        let err = TransitError::InvalidSeries("times must be increasing".to_string());
        assert_eq!(err.to_string(), "invalid series: times must be increasing");

        assert_eq!(TransitError::Cancelled.to_string(), "detection cancelled");

        let err = TransitError::Parse("line 3: bad float".to_string());
        assert_eq!(err.to_string(), "parse error: line 3: bad float");
    }

    #[test]
    fn errors_are_clonable_and_comparable() {
        let err1 = TransitError::Cancelled;
        let err2 = err1.clone();
        assert_eq!(err1, err2);
    }
}
