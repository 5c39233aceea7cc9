//! Random forest classifier backed by smartcore.
//!
//! [`RandomForest`] keeps the fitted smartcore model next to the feature names
//! and classes it was trained on, so inputs are checked by name before they
//! reach the model.

use crate::config::{Criterion, TrainerConfig};
use crate::error::{LearningError, Result};
use crate::matrix::FeatureMatrix;
use serde::{Deserialize, Serialize};
use smartcore::ensemble::random_forest_classifier::{
    RandomForestClassifier, RandomForestClassifierParameters,
};
use smartcore::linalg::basic::matrix::DenseMatrix;
use smartcore::tree::decision_tree_classifier::SplitCriterion;
use std::sync::Arc;

type Classifier = RandomForestClassifier<f64, i64, DenseMatrix<f64>, Vec<i64>>;

/// A fitted random forest classifier.
///
/// Each tree is grown on a class-stratified bootstrap sample. Prediction is a
/// majority vote over the trees; ties go to the smallest label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RandomForest {
    classes: Vec<i64>,
    feature_names: Vec<String>,
    n_trees: usize,
    model: Arc<Classifier>,
}

fn split_criterion(criterion: Criterion) -> SplitCriterion {
    match criterion {
        Criterion::Gini => SplitCriterion::Gini,
        Criterion::Entropy => SplitCriterion::Entropy,
    }
}

fn out_of_range(field: &str, value: usize) -> LearningError {
    LearningError::InvalidConfig(format!("{} = {} is out of range", field, value))
}

/// Map `config` onto smartcore's hyperparameters for `n_features` columns.
fn parameters(
    config: &TrainerConfig,
    n_features: usize,
) -> Result<RandomForestClassifierParameters> {
    let mut params = RandomForestClassifierParameters::default()
        .with_criterion(split_criterion(config.criterion))
        .with_n_trees(
            config
                .n_estimators
                .try_into()
                .map_err(|_| out_of_range("n_estimators", config.n_estimators))?,
        )
        .with_min_samples_split(config.min_samples_split)
        .with_min_samples_leaf(config.min_samples_leaf)
        .with_m(config.max_features.resolve(n_features))
        .with_seed(config.random_state);

    if let Some(depth) = config.max_depth {
        params = params.with_max_depth(
            depth
                .try_into()
                .map_err(|_| out_of_range("max_depth", depth))?,
        );
    }
    Ok(params)
}

fn dense(x: &FeatureMatrix) -> DenseMatrix<f64> {
    let values: Vec<f64> = (0..x.n_features())
        .flat_map(|feature| x.column(feature).iter().copied())
        .collect();
    DenseMatrix::new(x.n_rows(), x.n_features(), values, true)
}

impl RandomForest {
    /// Fit a forest on `x` and the integer labels `y`.
    ///
    /// # Errors
    ///
    /// Returns [`LearningError::InvalidData`] when `x` is empty, its row
    /// count differs from `y` or `y` holds a single class, and
    /// [`LearningError::InvalidConfig`] for an invalid `config`.
    pub fn fit(x: &FeatureMatrix, y: &[i64], config: &TrainerConfig) -> Result<Self> {
        config.validate()?;
        if x.n_rows() == 0 || x.n_features() == 0 {
            return Err(LearningError::InvalidData(
                "cannot fit on an empty feature matrix".to_string(),
            ));
        }
        if x.n_rows() != y.len() {
            return Err(LearningError::InvalidData(format!(
                "{} feature rows but {} labels",
                x.n_rows(),
                y.len()
            )));
        }

        let mut classes = y.to_vec();
        classes.sort_unstable();
        classes.dedup();
        if classes.len() < 2 {
            return Err(LearningError::InvalidData(format!(
                "labels need at least two classes, got {:?}",
                classes
            )));
        }

        let params = parameters(config, x.n_features())?;
        let model = Classifier::fit(&dense(x), &y.to_vec(), params)?;

        Ok(Self {
            classes,
            feature_names: x.names().to_vec(),
            n_trees: config.n_estimators,
            model: Arc::new(model),
        })
    }

    /// Class labels, ascending.
    pub fn classes(&self) -> &[i64] {
        &self.classes
    }

    /// Feature columns the forest was trained on, in training order.
    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    pub fn n_trees(&self) -> usize {
        self.n_trees
    }

    fn check_features(&self, x: &FeatureMatrix) -> Result<()> {
        if x.names() != self.feature_names.as_slice() {
            return Err(LearningError::InvalidData(format!(
                "expected features {:?}, got {:?}",
                self.feature_names,
                x.names()
            )));
        }
        Ok(())
    }

    /// Predicted label of every row.
    pub fn predict(&self, x: &FeatureMatrix) -> Result<Vec<i64>> {
        self.check_features(x)?;
        if x.n_rows() == 0 {
            return Ok(Vec::new());
        }
        Ok(self.model.predict(&dense(x))?)
    }
}
