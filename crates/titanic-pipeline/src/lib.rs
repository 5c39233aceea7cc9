//! Titanic Training Pipeline
//!
//! Orchestrates ingestion, preprocessing, training and evaluation as a
//! sequence of checkpointed steps.
//!
//! # Overview
//!
//! - **Steps**: [`PipelineStep`] in the fixed order `ingest → preprocessing → train → evaluate`
//! - **Checkpoints**: the full [`PipelineState`] is written before every step as a
//!   versioned JSON file under `<base_runs_folder>/run_<N>/<step>/`
//! - **Resume**: any checkpoint can be loaded and resumed in a new run folder,
//!   optionally with a reloaded [`TrainConfig`]
//! - **Prediction**: a trained checkpoint predicts raw or preprocessed CSV rows
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use titanic_pipeline::{TrainConfig, TrainModelPipeline};
//!
//! let config = TrainConfig::from_yaml_file("titanic_train.yaml")?;
//! let mut pipeline = TrainModelPipeline::new(config)?;
//! pipeline.run()?;
//!
//! if let Some(report) = pipeline.evaluation() {
//!     println!("{}", report);
//! }
//! ```

pub mod checkpoint;
pub mod config;
pub mod error;
pub mod pipeline;
pub mod predict;
pub mod runs;
pub mod step;

pub use config::{DataSource, TrainConfig};
pub use error::{PipelineError, Result};
pub use pipeline::{PipelineState, TARGET_COLUMN, TrainModelPipeline};
pub use predict::{predict_file, prediction_frame, write_predictions};
pub use runs::{RunDirectory, find_latest_checkpoint};
pub use step::PipelineStep;

static_assertions::assert_impl_all!(TrainConfig: Send, Sync);
