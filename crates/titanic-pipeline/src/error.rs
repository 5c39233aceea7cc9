//! Error types for the training pipeline.

use thiserror::Error;
use titanic_learning::LearningError;
use titanic_processing::ProcessingError;

/// The main error type for pipeline orchestration.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// Ingestion, validation or preprocessing failed.
    #[error(transparent)]
    Processing(#[from] ProcessingError),

    /// Training, prediction or evaluation failed.
    #[error(transparent)]
    Learning(#[from] LearningError),

    /// Unknown step name, or a step whose prerequisites are missing.
    #[error("Invalid option: {0}")]
    InvalidOption(String),

    /// A checkpoint could not be written or read back.
    #[error("Checkpoint error: {0}")]
    Checkpoint(String),

    /// A reloaded configuration conflicts with work already done.
    #[error("Reloaded configuration conflicts with the checkpoint: {}", .0.join("; "))]
    StaleConfig(Vec<String>),

    /// The configuration file is missing, malformed or invalid.
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),
}

impl PipelineError {
    /// Get a stable error code, e.g. for CLI reporting.
    ///
    /// Wrapped library errors report their own code.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Processing(e) => e.error_code(),
            Self::Learning(e) => e.error_code(),
            Self::InvalidOption(_) => "INVALID_OPTION",
            Self::Checkpoint(_) => "CHECKPOINT",
            Self::StaleConfig(_) => "STALE_CONFIG",
            Self::Config(_) => "CONFIG",
            Self::Io(_) => "IO_ERROR",
            Self::Json(_) => "JSON_ERROR",
            Self::Yaml(_) => "YAML_ERROR",
            Self::Polars(_) => "POLARS_ERROR",
        }
    }

    pub fn is_stale_config(&self) -> bool {
        matches!(self, Self::StaleConfig(_))
    }
}

/// Result type alias for pipeline operations.
pub type Result<T> = std::result::Result<T, PipelineError>;
