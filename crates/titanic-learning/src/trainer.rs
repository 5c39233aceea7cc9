//! The [`Trainer`]: one classifier plus the configuration used to fit it.

use crate::config::TrainerConfig;
use crate::error::{LearningError, Result};
use crate::forest::RandomForest;
use crate::matrix::{FeatureMatrix, labels};
use crate::metrics::ClassificationReport;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// What the last successful `fit` was run with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FitRecord {
    pub n_rows: usize,
    pub feature_names: Vec<String>,
    pub config: TrainerConfig,
}

/// Wraps a [`RandomForest`] with its hyperparameters.
///
/// Features are matched by column name, so the column order of frames passed
/// to [`predict`](Self::predict) and [`evaluate`](Self::evaluate) does not
/// matter.
///
/// # Example
///
/// ```
/// use polars::prelude::*;
/// use titanic_learning::{Trainer, TrainerConfig};
///
/// let x = df!["a" => [0.0, 1.0, 10.0, 11.0]].unwrap();
/// let y = [0i64, 0, 1, 1];
///
/// let config = TrainerConfig::builder().n_estimators(5).build().unwrap();
/// let mut trainer = Trainer::new(config);
/// trainer.fit(&x, &y).unwrap();
/// assert_eq!(trainer.predict(&x).unwrap(), vec![0, 0, 1, 1]);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Trainer {
    config: TrainerConfig,
    model: Option<RandomForest>,
    fit_record: Option<FitRecord>,
}

impl Trainer {
    pub fn new(config: TrainerConfig) -> Self {
        Self {
            config,
            model: None,
            fit_record: None,
        }
    }

    /// Hyperparameters the next `fit` will use.
    pub fn config(&self) -> &TrainerConfig {
        &self.config
    }

    /// Replace the hyperparameters. An already fitted model is kept until the
    /// next `fit`.
    pub fn set_config(&mut self, config: TrainerConfig) {
        self.config = config;
    }

    pub fn model(&self) -> Option<&RandomForest> {
        self.model.as_ref()
    }

    pub fn fit_record(&self) -> Option<&FitRecord> {
        self.fit_record.as_ref()
    }

    pub fn is_fitted(&self) -> bool {
        self.model.is_some()
    }

    /// Train on every column of `x` against labels `y`, replacing any earlier model.
    pub fn fit(&mut self, x: &DataFrame, y: &[i64]) -> Result<()> {
        let matrix = FeatureMatrix::from_frame(x)?;
        let forest = RandomForest::fit(&matrix, y, &self.config)?;

        info!(
            "Trained random forest: {} trees on {} rows x {} features",
            forest.n_trees(),
            matrix.n_rows(),
            matrix.n_features()
        );
        debug!("Trainer config: {:?}", self.config);

        self.fit_record = Some(FitRecord {
            n_rows: matrix.n_rows(),
            feature_names: matrix.names().to_vec(),
            config: self.config.clone(),
        });
        self.model = Some(forest);
        Ok(())
    }

    /// Train on a frame holding both features and the `target` label column.
    pub fn fit_frame(&mut self, df: &DataFrame, target: &str) -> Result<()> {
        let y = labels(df, target)?;
        let x = df.drop(target)?;
        self.fit(&x, &y)
    }

    fn fitted(&self) -> Result<&RandomForest> {
        self.model.as_ref().ok_or(LearningError::Unfitted)
    }

    /// Predict labels for `x`, reading the training features by name.
    pub fn predict(&self, x: &DataFrame) -> Result<Vec<i64>> {
        let forest = self.fitted()?;
        let matrix = FeatureMatrix::select(x, forest.feature_names())?;
        forest.predict(&matrix)
    }

    /// Score the fitted model on `x` against `y`. Never retrains.
    pub fn evaluate(&self, x: &DataFrame, y: &[i64]) -> Result<ClassificationReport> {
        let predicted = self.predict(x)?;
        ClassificationReport::new(y, &predicted)
    }

    /// [`evaluate`](Self::evaluate) on a frame that also holds the `target` column.
    pub fn evaluate_frame(&self, df: &DataFrame, target: &str) -> Result<ClassificationReport> {
        let y = labels(df, target)?;
        self.evaluate(df, &y)
    }
}
