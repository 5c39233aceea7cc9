//! Custom error types for ingestion, validation and preprocessing.
//!
//! This module provides the error hierarchy using `thiserror`. Every error
//! is raised at the point of detection and propagated unrecovered; callers
//! decide whether to report and exit.

use thiserror::Error;

/// The main error type for the processing crate.
#[derive(Error, Debug)]
pub enum ProcessingError {
    /// A data file or archive is missing or has the wrong extension.
    #[error("Data source error: {0}")]
    DataSource(String),

    /// A frame violates the declared schema.
    #[error("Schema violation in column '{column}': {rule}")]
    DataValidation { column: String, rule: String },

    /// `transform` was called before `fit`.
    #[error("{0} was used to transform data before being fitted")]
    Unfitted(&'static str),

    /// An unsupported option (e.g. a split name) was supplied.
    #[error("Invalid option: {0}")]
    InvalidOption(String),

    /// Column was not found in the frame.
    #[error("Column '{0}' not found in dataset")]
    ColumnNotFound(String),

    /// No valid values found in a column for computation.
    #[error("No valid values found in column '{0}'")]
    NoValidValues(String),

    /// IO error wrapper.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Polars error wrapper.
    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    /// Zip archive error wrapper.
    #[error("Archive error: {0}")]
    Archive(#[from] zip::result::ZipError),

    /// Generic error with context.
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<ProcessingError>,
    },
}

impl ProcessingError {
    /// Add context to an error.
    pub fn with_context(self, context: impl Into<String>) -> Self {
        ProcessingError::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Shorthand for a schema violation.
    pub fn validation(column: impl Into<String>, rule: impl Into<String>) -> Self {
        ProcessingError::DataValidation {
            column: column.into(),
            rule: rule.into(),
        }
    }

    /// Get a stable error code, e.g. for CLI reporting.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::DataSource(_) => "DATA_SOURCE",
            Self::DataValidation { .. } => "DATA_VALIDATION",
            Self::Unfitted(_) => "UNFITTED",
            Self::InvalidOption(_) => "INVALID_OPTION",
            Self::ColumnNotFound(_) => "COLUMN_NOT_FOUND",
            Self::NoValidValues(_) => "NO_VALID_VALUES",
            Self::Io(_) => "IO_ERROR",
            Self::Polars(_) => "POLARS_ERROR",
            Self::Archive(_) => "ARCHIVE_ERROR",
            Self::WithContext { source, .. } => source.error_code(),
        }
    }

    /// Walk through context wrappers to the underlying error.
    pub fn root(&self) -> &ProcessingError {
        match self {
            Self::WithContext { source, .. } => source.root(),
            other => other,
        }
    }

    /// Check if this error is a data source problem.
    pub fn is_data_source(&self) -> bool {
        matches!(self.root(), Self::DataSource(_))
    }

    /// Check if this error is a schema violation.
    pub fn is_validation(&self) -> bool {
        matches!(self.root(), Self::DataValidation { .. })
    }

    /// Check if this error comes from an unfitted transformer.
    pub fn is_unfitted(&self) -> bool {
        matches!(self.root(), Self::Unfitted(_))
    }
}

/// Result type alias for processing operations.
pub type Result<T> = std::result::Result<T, ProcessingError>;

/// Extension trait for adding context to Results.
pub trait ResultExt<T> {
    /// Add context to an error result.
    fn context(self, context: impl Into<String>) -> Result<T>;
}

impl<T> ResultExt<T> for Result<T> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.with_context(context))
    }
}

impl<T> ResultExt<T> for std::result::Result<T, polars::error::PolarsError> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| ProcessingError::Polars(e).with_context(context))
    }
}
