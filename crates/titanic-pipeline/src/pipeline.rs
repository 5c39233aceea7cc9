//! The checkpointed training pipeline.
//!
//! [`TrainModelPipeline`] runs `ingest → preprocessing → train → evaluate` in
//! order. Immediately before each step it writes the whole pipeline state to
//! `<run>/<step>/<model_ckpt_name>.ckpt`, so every checkpoint is the state to
//! retry that step from. Loading a checkpoint and calling
//! [`resume`](TrainModelPipeline::resume) continues in a fresh run folder
//! without recomputing anything fitted upstream.

use crate::checkpoint;
use crate::config::TrainConfig;
use crate::error::{PipelineError, Result};
use crate::runs::{CHECKPOINT_EXTENSION, RunDirectory};
use crate::step::PipelineStep;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::path::Path;
use titanic_learning::{ClassificationReport, LearningError, Trainer};
use titanic_processing::{DataCleaner, FeatureEnricher, FrameSnapshot};
use tracing::{debug, info, warn};

/// Label column of the train split.
pub const TARGET_COLUMN: &str = "Survived";

type StepFn = fn(&mut TrainModelPipeline) -> Result<()>;

/// Step functions, in execution order.
static STEP_TABLE: [(PipelineStep, StepFn); 4] = [
    (PipelineStep::Ingest, TrainModelPipeline::ingest as StepFn),
    (PipelineStep::Preprocessing, TrainModelPipeline::preprocessing as StepFn),
    (PipelineStep::Train, TrainModelPipeline::train as StepFn),
    (PipelineStep::Evaluate, TrainModelPipeline::evaluate as StepFn),
];

fn step_fn(step: PipelineStep) -> Option<StepFn> {
    STEP_TABLE
        .iter()
        .find(|(candidate, _)| *candidate == step)
        .map(|(_, f)| *f)
}

/// Serializable snapshot of a pipeline, as stored in checkpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineState {
    pub next_step: PipelineStep,
    pub config: TrainConfig,
    pub train_data: Option<FrameSnapshot>,
    pub test_data: Option<FrameSnapshot>,
    pub cleaner: DataCleaner,
    pub enricher: FeatureEnricher,
    pub trainer: Option<Trainer>,
    pub evaluation: Option<ClassificationReport>,
}

/// Resumable training pipeline for the Titanic dataset.
///
/// # Example
///
/// ```rust,ignore
/// use titanic_pipeline::{TrainConfig, TrainModelPipeline, PipelineStep};
///
/// let config = TrainConfig::from_yaml_file("titanic_train.yaml")?;
/// let mut pipeline = TrainModelPipeline::new(config)?;
/// pipeline.run()?;
///
/// // Later, retrain with new hyperparameters on the same preprocessed data
/// let mut pipeline = TrainModelPipeline::load("runs/run_0/evaluate/train_pipeline.ckpt")?;
/// pipeline.reload_config(new_config, PipelineStep::Train, false)?;
/// pipeline.resume(Some(PipelineStep::Train))?;
/// ```
#[derive(Debug)]
pub struct TrainModelPipeline {
    next_step: PipelineStep,
    config: TrainConfig,
    run_dir: Option<RunDirectory>,
    train_data: Option<DataFrame>,
    test_data: Option<DataFrame>,
    cleaner: DataCleaner,
    enricher: FeatureEnricher,
    trainer: Option<Trainer>,
    evaluation: Option<ClassificationReport>,
}

static_assertions::assert_impl_all!(TrainModelPipeline: Send);
static_assertions::assert_impl_all!(PipelineState: Send, Sync);

impl TrainModelPipeline {
    /// Create a pipeline and its run folder under `config.base_runs_folder`.
    pub fn new(config: TrainConfig) -> Result<Self> {
        config.validate()?;
        let run_dir = RunDirectory::create(&config.base_runs_folder)?;
        Ok(Self {
            next_step: PipelineStep::Ingest,
            config,
            run_dir: Some(run_dir),
            train_data: None,
            test_data: None,
            cleaner: DataCleaner::new(),
            enricher: FeatureEnricher::new(),
            trainer: None,
            evaluation: None,
        })
    }

    /// Restore a pipeline from a checkpoint file.
    ///
    /// No run folder is created until the pipeline runs again.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let has_extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext == CHECKPOINT_EXTENSION);
        if path.is_file() && !has_extension {
            return Err(PipelineError::Checkpoint(format!(
                "The file at {} is not a .{} file",
                path.display(),
                CHECKPOINT_EXTENSION
            )));
        }

        let envelope = checkpoint::load::<PipelineState>(path)?;
        info!(
            "Loaded checkpoint {} (written {}, next step: {})",
            path.display(),
            envelope.created_at,
            envelope.state.next_step
        );
        Self::from_state(envelope.state)
    }

    /// Rebuild a pipeline from a snapshot.
    pub fn from_state(state: PipelineState) -> Result<Self> {
        let train_data = state.train_data.as_ref().map(FrameSnapshot::to_frame).transpose()?;
        let test_data = state.test_data.as_ref().map(FrameSnapshot::to_frame).transpose()?;
        Ok(Self {
            next_step: state.next_step,
            config: state.config,
            run_dir: None,
            train_data,
            test_data,
            cleaner: state.cleaner,
            enricher: state.enricher,
            trainer: state.trainer,
            evaluation: state.evaluation,
        })
    }

    /// Snapshot the current state.
    pub fn state(&self) -> Result<PipelineState> {
        let train_data = self.train_data.as_ref().map(FrameSnapshot::from_frame).transpose()?;
        let test_data = self.test_data.as_ref().map(FrameSnapshot::from_frame).transpose()?;
        Ok(PipelineState {
            next_step: self.next_step,
            config: self.config.clone(),
            train_data,
            test_data,
            cleaner: self.cleaner.clone(),
            enricher: self.enricher.clone(),
            trainer: self.trainer.clone(),
            evaluation: self.evaluation.clone(),
        })
    }

    pub fn next_step(&self) -> PipelineStep {
        self.next_step
    }

    pub fn config(&self) -> &TrainConfig {
        &self.config
    }

    /// Folder this pipeline writes checkpoints into, once one exists.
    pub fn run_dir(&self) -> Option<&RunDirectory> {
        self.run_dir.as_ref()
    }

    pub fn train_data(&self) -> Option<&DataFrame> {
        self.train_data.as_ref()
    }

    pub fn test_data(&self) -> Option<&DataFrame> {
        self.test_data.as_ref()
    }

    pub fn cleaner(&self) -> &DataCleaner {
        &self.cleaner
    }

    pub fn enricher(&self) -> &FeatureEnricher {
        &self.enricher
    }

    pub fn trainer(&self) -> Option<&Trainer> {
        self.trainer.as_ref()
    }

    /// Report of the last completed `evaluate` step.
    pub fn evaluation(&self) -> Option<&ClassificationReport> {
        self.evaluation.as_ref()
    }

    /// Run every step from `ingest` through `evaluate`.
    pub fn run(&mut self) -> Result<()> {
        if self.run_dir.is_none() {
            self.run_dir = Some(RunDirectory::create(&self.config.base_runs_folder)?);
        }
        self.run_from(PipelineStep::Ingest)
    }

    /// Continue in a new run folder from `step`, or from the stored next step.
    ///
    /// Resuming a finished pipeline without a step does nothing.
    pub fn resume(&mut self, step: Option<PipelineStep>) -> Result<()> {
        self.run_dir = Some(RunDirectory::create(&self.config.base_runs_folder)?);

        let start = step.unwrap_or(self.next_step);
        if start.is_done() {
            info!("Pipeline already finished; nothing to resume");
            return Ok(());
        }
        info!("Resuming pipeline from step: {}", start);
        self.run_from(start)
    }

    /// Problems with replacing the configuration before resuming at `from`.
    ///
    /// A changed data source is stale once the data has been ingested, and
    /// changed hyperparameters are stale once the model has been trained.
    pub fn config_conflicts(&self, config: &TrainConfig, from: PipelineStep) -> Vec<String> {
        let mut conflicts = Vec::new();
        if from > PipelineStep::Ingest && config.data_source != self.config.data_source {
            conflicts.push(format!(
                "data source changed but the dataset was already ingested; resume from {} to reload it",
                PipelineStep::Ingest
            ));
        }
        if from > PipelineStep::Train && config.trainer_args != self.config.trainer_args {
            conflicts.push(format!(
                "trainer_args changed but the model was already trained; resume from {} to retrain",
                PipelineStep::Train
            ));
        }
        conflicts
    }

    /// Replace the configuration before resuming at `from`.
    ///
    /// Nothing fitted is recomputed. Conflicts with work already done are
    /// logged; unless `force` is set they fail with
    /// [`PipelineError::StaleConfig`] and the old configuration stays.
    pub fn reload_config(&mut self, config: TrainConfig, from: PipelineStep, force: bool) -> Result<()> {
        config.validate()?;

        let conflicts = self.config_conflicts(&config, from);
        for conflict in &conflicts {
            warn!("Stale configuration: {}", conflict);
        }
        if !conflicts.is_empty() && !force {
            return Err(PipelineError::StaleConfig(conflicts));
        }

        debug!("Reloaded configuration: {:?}", config);
        self.config = config;
        Ok(())
    }

    fn run_from(&mut self, start: PipelineStep) -> Result<()> {
        let mut step = start;
        while let Some(run_step) = step_fn(step) {
            self.check_prerequisites(step)?;
            self.next_step = step;
            self.save_checkpoint(step)?;

            info!("Step: {}", step);
            run_step(self)?;
            step = step.next();
        }
        self.next_step = PipelineStep::Done;
        info!("Pipeline finished");
        Ok(())
    }

    fn check_prerequisites(&self, step: PipelineStep) -> Result<()> {
        let missing = |what: &str| -> Result<()> {
            Err(PipelineError::InvalidOption(format!(
                "cannot run step {}: {}",
                step, what
            )))
        };

        match step {
            PipelineStep::Ingest | PipelineStep::Done => Ok(()),
            PipelineStep::Preprocessing => {
                if self.train_data.is_none() || self.test_data.is_none() {
                    missing("no dataset has been ingested")
                } else if self.cleaner.is_fitted() {
                    missing("the dataset is already preprocessed; resume from ingest instead")
                } else {
                    Ok(())
                }
            }
            PipelineStep::Train => {
                if self.train_data.is_none() {
                    missing("no dataset has been ingested")
                } else if !self.cleaner.is_fitted() || !self.enricher.is_fitted() {
                    missing("the dataset has not been preprocessed")
                } else {
                    Ok(())
                }
            }
            PipelineStep::Evaluate => {
                if self.train_data.is_none() {
                    missing("no dataset has been ingested")
                } else if !self.trainer.as_ref().is_some_and(Trainer::is_fitted) {
                    missing("no model has been trained")
                } else {
                    Ok(())
                }
            }
        }
    }

    fn save_checkpoint(&self, step: PipelineStep) -> Result<()> {
        let run_dir = self.run_dir.as_ref().ok_or_else(|| {
            PipelineError::Checkpoint("pipeline has no run folder".to_string())
        })?;
        let path = run_dir.checkpoint_path(step, &self.config.model_ckpt_name);
        checkpoint::save(&path, &self.state()?)?;
        info!("Checkpoint saved: {}", path.display());
        Ok(())
    }

    fn ingest(&mut self) -> Result<()> {
        let dataset = self.config.data_source.load()?;
        let (train, test) = dataset.into_parts();
        info!(
            "Ingested train {:?} and test {:?}",
            train.shape(),
            test.shape()
        );
        self.train_data = Some(train);
        self.test_data = Some(test);
        self.cleaner = DataCleaner::new();
        self.enricher = FeatureEnricher::new();
        self.trainer = None;
        self.evaluation = None;
        Ok(())
    }

    fn preprocessing(&mut self) -> Result<()> {
        let (Some(train), Some(test)) = (self.train_data.take(), self.test_data.take()) else {
            return Err(PipelineError::InvalidOption(
                "cannot preprocess before ingesting".to_string(),
            ));
        };

        let mut cleaner = DataCleaner::new();
        let mut enricher = FeatureEnricher::new();

        let train = cleaner.fit_transform(&train)?;
        let train = enricher.fit_transform(&train)?;

        let test = cleaner.transform(&test)?;
        let test = enricher.transform(&test)?;

        info!(
            "Preprocessed train {:?} and test {:?}",
            train.shape(),
            test.shape()
        );
        self.cleaner = cleaner;
        self.enricher = enricher;
        self.train_data = Some(train);
        self.test_data = Some(test);
        Ok(())
    }

    fn train(&mut self) -> Result<()> {
        let train = self.train_data.as_ref().ok_or_else(|| {
            PipelineError::InvalidOption("cannot train before ingesting".to_string())
        })?;

        let mut trainer = Trainer::new(self.config.trainer_args.clone());
        trainer.fit_frame(train, TARGET_COLUMN)?;
        self.trainer = Some(trainer);
        self.evaluation = None;
        Ok(())
    }

    fn evaluate(&mut self) -> Result<()> {
        let train = self.train_data.as_ref().ok_or_else(|| {
            PipelineError::InvalidOption("cannot evaluate before ingesting".to_string())
        })?;
        let trainer = self
            .trainer
            .as_ref()
            .ok_or(LearningError::Unfitted)?;

        let report = trainer.evaluate_frame(train, TARGET_COLUMN)?;
        info!("Evaluation metrics:\n{}", report);
        self.evaluation = Some(report);
        Ok(())
    }

    fn fitted_trainer(&self) -> Result<&Trainer> {
        Ok(self
            .trainer
            .as_ref()
            .ok_or(LearningError::Unfitted)?)
    }

    /// Predict survival for already preprocessed features.
    pub fn predict(&self, features: &DataFrame) -> Result<Vec<i64>> {
        Ok(self.fitted_trainer()?.predict(features)?)
    }

    /// Clean, enrich and predict raw rows shaped like the test split.
    pub fn transform_predict(&self, raw: &DataFrame) -> Result<Vec<i64>> {
        let trainer = self.fitted_trainer()?;
        let cleaned = self.cleaner.transform(raw)?;
        let features = self.enricher.transform(&cleaned)?;
        Ok(trainer.predict(&features)?)
    }
}
