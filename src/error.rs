//! Error types for the fraud detection pipeline

use thiserror::Error;

/// Result type alias for pipeline operations
pub type Result<T> = std::result::Result<T, FraudError>;

/// Main error type for the pipeline
#[derive(Error, Debug)]
pub enum FraudError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Data error: {0}")]
    Data(String),

    #[error("Missing column: {0}")]
    MissingColumn(String),

    #[error("Invalid label {value} in column {column}: expected 0 or 1")]
    InvalidLabel { column: String, value: String },

    #[error("Invalid shape: expected {expected}, got {actual}")]
    Shape { expected: String, actual: String },

    #[error("Degenerate class distribution: {0}")]
    DegenerateClasses(String),

    #[error("Invalid parameter: {name} = {value}, {reason}")]
    InvalidParameter {
        name: String,
        value: String,
        reason: String,
    },

    #[error("Model not fitted")]
    ModelNotFitted,

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Reloaded model disagrees with the original on {mismatches} of {total} rows")]
    RoundTripMismatch { mismatches: usize, total: usize },

    #[error("Plot error: {0}")]
    Plot(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl FraudError {
    pub(crate) fn invalid_parameter(
        name: &str,
        value: impl ToString,
        reason: impl Into<String>,
    ) -> Self {
        FraudError::InvalidParameter {
            name: name.to_string(),
            value: value.to_string(),
            reason: reason.into(),
        }
    }
}

impl From<polars::error::PolarsError> for FraudError {
    fn from(err: polars::error::PolarsError) -> Self {
        FraudError::Data(err.to_string())
    }
}

impl From<serde_json::Error> for FraudError {
    fn from(err: serde_json::Error) -> Self {
        FraudError::Serialization(err.to_string())
    }
}

impl From<bincode::Error> for FraudError {
    fn from(err: bincode::Error) -> Self {
        FraudError::Serialization(err.to_string())
    }
}

impl From<ndarray::ShapeError> for FraudError {
    fn from(err: ndarray::ShapeError) -> Self {
        FraudError::Shape {
            expected: "valid shape".to_string(),
            actual: err.to_string(),
        }
    }
}

impl From<image::ImageError> for FraudError {
    fn from(err: image::ImageError) -> Self {
        FraudError::Plot(err.to_string())
    }
}

impl From<toml::de::Error> for FraudError {
    fn from(err: toml::de::Error) -> Self {
        FraudError::Config(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = FraudError::MissingColumn("Amount".to_string());
        assert_eq!(err.to_string(), "Missing column: Amount");
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: FraudError = io_err.into();
        assert!(matches!(err, FraudError::Io(_)));
    }

    #[test]
    fn test_round_trip_mismatch_display() {
        let err = FraudError::RoundTripMismatch { mismatches: 3, total: 10 };
        assert_eq!(
            err.to_string(),
            "Reloaded model disagrees with the original on 3 of 10 rows"
        );
    }
}
