//! Pipeline configuration loaded from YAML.
//!
//! ```yaml
//! data_zip: data/titanic.zip        # or train_path + test_path
//! base_runs_folder: runs            # optional
//! model_ckpt_name: train_pipeline   # optional
//! trainer_args:
//!   n_estimators: 200
//!   max_depth: 6
//! ```

use crate::error::{PipelineError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use titanic_learning::TrainerConfig;
use titanic_processing::TitanicDataset;

/// Default folder holding the numbered runs.
pub const DEFAULT_RUNS_FOLDER: &str = "runs";

/// Default checkpoint file stem.
pub const DEFAULT_CKPT_NAME: &str = "train_pipeline";

/// Where the train and test splits come from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataSource {
    /// A zip archive holding `train.csv` and `test.csv`.
    Archive(PathBuf),
    /// Two separate CSV files.
    Files { train_path: PathBuf, test_path: PathBuf },
}

impl DataSource {
    /// Load and validate both splits.
    pub fn load(&self) -> titanic_processing::Result<TitanicDataset> {
        match self {
            DataSource::Archive(path) => TitanicDataset::from_archive(path),
            DataSource::Files {
                train_path,
                test_path,
            } => TitanicDataset::load(train_path, test_path),
        }
    }
}

/// Everything a pipeline run is configured with.
///
/// On disk the data source is written as either `data_zip` or the
/// `train_path`/`test_path` pair; giving both, or neither, is an error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "ConfigFile", into = "ConfigFile")]
pub struct TrainConfig {
    pub data_source: DataSource,
    pub base_runs_folder: PathBuf,
    pub model_ckpt_name: String,
    pub trainer_args: TrainerConfig,
}

impl TrainConfig {
    /// Configuration with default folder, checkpoint name and hyperparameters.
    pub fn new(data_source: DataSource) -> Self {
        Self {
            data_source,
            base_runs_folder: PathBuf::from(DEFAULT_RUNS_FOLDER),
            model_ckpt_name: DEFAULT_CKPT_NAME.to_string(),
            trainer_args: TrainerConfig::default(),
        }
    }

    pub fn with_base_runs_folder(mut self, folder: impl Into<PathBuf>) -> Self {
        self.base_runs_folder = folder.into();
        self
    }

    pub fn with_model_ckpt_name(mut self, name: impl Into<String>) -> Self {
        self.model_ckpt_name = name.into();
        self
    }

    pub fn with_trainer_args(mut self, trainer_args: TrainerConfig) -> Self {
        self.trainer_args = trainer_args;
        self
    }

    /// Read a `.yaml`/`.yml` file.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::Config`] if the file does not exist or has
    /// another extension, and [`PipelineError::Yaml`] if it does not parse.
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(PipelineError::Config(format!(
                "There is no file in the specified path: {}",
                path.display()
            )));
        }
        let is_yaml = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext == "yaml" || ext == "yml");
        if !is_yaml {
            return Err(PipelineError::Config(format!(
                "The file at {} is not a .yaml or .yml file",
                path.display()
            )));
        }

        let contents = fs::read_to_string(path)?;
        Self::from_yaml_str(&contents)
    }

    pub fn from_yaml_str(contents: &str) -> Result<Self> {
        let config: TrainConfig = serde_yaml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Check the checkpoint name and the trainer hyperparameters.
    pub fn validate(&self) -> Result<()> {
        if self.model_ckpt_name.is_empty()
            || self.model_ckpt_name.contains(['/', '\\'])
        {
            return Err(PipelineError::Config(format!(
                "model_ckpt_name must be a plain file stem, got '{}'",
                self.model_ckpt_name
            )));
        }
        self.trainer_args.validate()?;
        Ok(())
    }
}

/// Flat file layout of [`TrainConfig`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    data_zip: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    train_path: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    test_path: Option<PathBuf>,
    #[serde(default = "default_runs_folder")]
    base_runs_folder: PathBuf,
    #[serde(default = "default_ckpt_name")]
    model_ckpt_name: String,
    #[serde(default)]
    trainer_args: TrainerConfig,
}

fn default_runs_folder() -> PathBuf {
    PathBuf::from(DEFAULT_RUNS_FOLDER)
}

fn default_ckpt_name() -> String {
    DEFAULT_CKPT_NAME.to_string()
}

impl TryFrom<ConfigFile> for TrainConfig {
    type Error = PipelineError;

    fn try_from(file: ConfigFile) -> Result<Self> {
        let data_source = match (file.data_zip, file.train_path, file.test_path) {
            (Some(zip), None, None) => DataSource::Archive(zip),
            (None, Some(train_path), Some(test_path)) => DataSource::Files {
                train_path,
                test_path,
            },
            (None, None, None) => {
                return Err(PipelineError::Config(
                    "either data_zip or train_path and test_path must be set".to_string(),
                ));
            }
            (Some(_), _, _) => {
                return Err(PipelineError::Config(
                    "data_zip cannot be combined with train_path or test_path".to_string(),
                ));
            }
            (None, _, _) => {
                return Err(PipelineError::Config(
                    "train_path and test_path must be given together".to_string(),
                ));
            }
        };

        Ok(Self {
            data_source,
            base_runs_folder: file.base_runs_folder,
            model_ckpt_name: file.model_ckpt_name,
            trainer_args: file.trainer_args,
        })
    }
}

impl From<TrainConfig> for ConfigFile {
    fn from(config: TrainConfig) -> Self {
        let (data_zip, train_path, test_path) = match config.data_source {
            DataSource::Archive(zip) => (Some(zip), None, None),
            DataSource::Files {
                train_path,
                test_path,
            } => (None, Some(train_path), Some(test_path)),
        };
        Self {
            data_zip,
            train_path,
            test_path,
            base_runs_folder: config.base_runs_folder,
            model_ckpt_name: config.model_ckpt_name,
            trainer_args: config.trainer_args,
        }
    }
}
