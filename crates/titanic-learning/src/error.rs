//! Error types for the titanic-learning crate.
//!
//! This module defines [`LearningError`], the error type returned by every
//! fallible operation in the crate.
//!
//! # Example
//!
//! ```
//! use titanic_learning::{LearningError, TrainerConfig};
//!
//! fn build() -> Result<TrainerConfig, LearningError> {
//!     // Errors are propagated with ?
//!     let config = TrainerConfig::builder().n_estimators(50).build()?;
//!     Ok(config)
//! }
//! # build().unwrap();
//! ```

use thiserror::Error;

/// The main error type for titanic-learning operations.
///
/// This enum is marked `#[non_exhaustive]` to allow adding new variants
/// without breaking downstream code.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum LearningError {
    /// Invalid trainer hyperparameters.
    ///
    /// Check the error message for the offending field and the accepted range.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Invalid data provided for training or prediction.
    ///
    /// Common causes:
    /// - A feature column the model was trained on is missing
    /// - A feature or label contains null values
    /// - The frame has no rows
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// `predict` or `evaluate` was called before `fit`.
    #[error("Model has not been fitted")]
    Unfitted,

    /// The label column was not found in the DataFrame.
    ///
    /// Column names are case-sensitive.
    #[error("Target column '{0}' not found")]
    TargetNotFound(String),

    /// The underlying smartcore model failed to fit or predict.
    #[error("Model error: {0}")]
    Model(#[from] smartcore::error::Failed),

    /// Polars failed while reading feature columns.
    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),
}

impl LearningError {
    /// Get a stable error code, e.g. for CLI reporting.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidConfig(_) => "INVALID_CONFIG",
            Self::InvalidData(_) => "INVALID_DATA",
            Self::Unfitted => "UNFITTED",
            Self::TargetNotFound(_) => "TARGET_NOT_FOUND",
            Self::Model(_) => "MODEL_ERROR",
            Self::Polars(_) => "POLARS_ERROR",
        }
    }
}

/// Result type alias for learning operations.
pub type Result<T> = std::result::Result<T, LearningError>;
