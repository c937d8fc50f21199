//! Error types for gridspline.
//!
//! This module defines the single error enum shared by grid construction,
//! interpolation, spectral resampling and configuration loading.

use thiserror::Error;

/// The main error type for gridspline operations.
#[derive(Error, Debug)]
pub enum GridSplineError {
    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration errors, including unknown method names
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Node coordinates that cannot form a grid axis
    #[error("Invalid grid: {message}")]
    InvalidGrid { message: String },

    /// Node, sample or query arrays whose shapes disagree
    #[error("Shape mismatch: {message}")]
    ShapeMismatch { message: String },

    /// Invalid parameter errors
    #[error("Invalid parameter: {param} - {message}")]
    InvalidParameter { param: String, message: String },

    /// Interpolation errors
    #[error("Interpolation error: {message}")]
    Interpolation { message: String },
}

impl GridSplineError {
    pub(crate) fn invalid_parameter(param: &str, message: impl Into<String>) -> Self {
        Self::InvalidParameter {
            param: param.to_string(),
            message: message.into(),
        }
    }
}

/// Convenience type alias for Results with GridSplineError
pub type Result<T> = std::result::Result<T, GridSplineError>;
