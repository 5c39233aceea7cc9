//! titanic-learning: random forest training for the Titanic pipeline.
//!
//! This crate provides the [`Trainer`], which owns one [`RandomForest`]
//! classifier together with the [`TrainerConfig`] used to build and fit it,
//! and the [`ClassificationReport`] produced by evaluation.
//!
//! # Features
//!
//! - **Random forest**: smartcore's CART ensemble with `gini` or `entropy`
//!   splits, stratified bootstrap sampling and per-split feature subsampling
//! - **Deterministic**: a fixed `random_state` always yields the same forest
//! - **Serializable**: fitted forests serialize with serde, ready for checkpoints
//! - **Name-based features**: prediction reads columns by name, not position
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use titanic_learning::{Trainer, TrainerConfig};
//!
//! let config = TrainerConfig::builder()
//!     .n_estimators(200)
//!     .max_depth(6)
//!     .build()?;
//!
//! let mut trainer = Trainer::new(config);
//! trainer.fit_frame(&train, "Survived")?;
//!
//! let report = trainer.evaluate_frame(&train, "Survived")?;
//! println!("{}", report);
//!
//! let labels = trainer.predict(&test)?;
//! ```
//!
//! # Error Handling
//!
//! All fallible operations return [`Result<T, LearningError>`]:
//!
//! - [`LearningError::InvalidConfig`] - Invalid hyperparameters
//! - [`LearningError::InvalidData`] - Missing, non-numeric or null features
//! - [`LearningError::Unfitted`] - Prediction before training
//! - [`LearningError::TargetNotFound`] - Label column absent
//! - [`LearningError::Model`] - The smartcore model failed

mod config;
mod error;
mod forest;
mod matrix;
mod metrics;
mod trainer;

// Configuration types
pub use config::{Criterion, MaxFeatures, TrainerConfig, TrainerConfigBuilder};
// Error types
pub use error::{LearningError, Result};
// Model types
pub use forest::RandomForest;
pub use matrix::{FeatureMatrix, labels};
// Metrics
pub use metrics::{AveragedMetrics, ClassMetrics, ClassificationReport};
// Trainer
pub use trainer::{FitRecord, Trainer};

static_assertions::assert_impl_all!(Trainer: Send, Sync);
static_assertions::assert_impl_all!(RandomForest: Send, Sync);
