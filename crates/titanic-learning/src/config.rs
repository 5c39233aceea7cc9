//! Hyperparameters for the random forest trainer.
//!
//! This module provides [`TrainerConfig`] and its builder, together with the
//! [`Criterion`] and [`MaxFeatures`] enums.
//!
//! The config is also the `trainer_args` section of the pipeline YAML file,
//! so it derives `Deserialize`, fills omitted keys with defaults and rejects
//! unknown keys.
//!
//! # Example
//!
//! ```
//! use titanic_learning::{Criterion, TrainerConfig};
//!
//! let config = TrainerConfig::builder()
//!     .n_estimators(200)
//!     .max_depth(8)
//!     .criterion(Criterion::Entropy)
//!     .build()
//!     .expect("valid config");
//! assert_eq!(config.random_state, 42);
//! ```

use crate::error::LearningError;
use serde::{Deserialize, Serialize};

/// Impurity measure used to choose splits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Criterion {
    /// Gini impurity.
    #[default]
    Gini,
    /// Shannon entropy.
    Entropy,
}

impl Criterion {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Criterion::Gini => "gini",
            Criterion::Entropy => "entropy",
        }
    }
}

/// Number of features considered at each split.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MaxFeatures {
    /// `ceil(sqrt(n_features))`.
    #[default]
    Sqrt,
    /// `ceil(log2(n_features))`, at least one.
    Log2,
    /// Every feature.
    All,
}

impl MaxFeatures {
    /// Resolve to a concrete count for `n_features` columns.
    ///
    /// ```
    /// use titanic_learning::MaxFeatures;
    ///
    /// assert_eq!(MaxFeatures::Sqrt.resolve(10), 4);
    /// assert_eq!(MaxFeatures::Log2.resolve(10), 4);
    /// assert_eq!(MaxFeatures::All.resolve(10), 10);
    /// ```
    #[must_use]
    pub fn resolve(&self, n_features: usize) -> usize {
        let n = n_features as f64;
        let count = match self {
            MaxFeatures::Sqrt => n.sqrt().ceil() as usize,
            MaxFeatures::Log2 => n.log2().ceil() as usize,
            MaxFeatures::All => n_features,
        };
        count.clamp(1, n_features.max(1))
    }
}

/// Configuration for [`Trainer`](crate::Trainer).
///
/// Use [`TrainerConfig::builder()`] to construct a validated configuration.
///
/// # Validation
///
/// [`validate()`](Self::validate) (called by the builder) checks:
/// - `n_estimators` is at least 1
/// - `min_samples_split` is at least 2
/// - `min_samples_leaf` is at least 1
/// - `max_depth`, when set, is at least 1
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TrainerConfig {
    /// Number of trees in the forest (default: 100).
    pub n_estimators: usize,

    /// Maximum tree depth (default: unlimited).
    pub max_depth: Option<usize>,

    /// Minimum samples required to split a node (default: 2).
    pub min_samples_split: usize,

    /// Minimum samples required in each leaf (default: 1).
    pub min_samples_leaf: usize,

    /// Features considered per split (default: `sqrt`).
    pub max_features: MaxFeatures,

    /// Split quality measure (default: `gini`).
    pub criterion: Criterion,

    /// Seed for bootstrap and feature sampling (default: 42).
    ///
    /// The same seed and data always produce the same forest.
    pub random_state: u64,
}

impl Default for TrainerConfig {
    fn default() -> Self {
        Self {
            n_estimators: 100,
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
            max_features: MaxFeatures::default(),
            criterion: Criterion::default(),
            random_state: 42,
        }
    }
}

impl TrainerConfig {
    /// Create a new builder for `TrainerConfig`.
    #[must_use]
    pub fn builder() -> TrainerConfigBuilder {
        TrainerConfigBuilder::default()
    }

    /// Check every constraint, e.g. after deserializing.
    ///
    /// # Errors
    ///
    /// Returns [`LearningError::InvalidConfig`] naming the first invalid field.
    pub fn validate(&self) -> Result<(), LearningError> {
        if self.n_estimators == 0 {
            return Err(LearningError::InvalidConfig(
                "n_estimators must be at least 1".to_string(),
            ));
        }

        if self.min_samples_split < 2 {
            return Err(LearningError::InvalidConfig(
                "min_samples_split must be at least 2".to_string(),
            ));
        }

        if self.min_samples_leaf == 0 {
            return Err(LearningError::InvalidConfig(
                "min_samples_leaf must be at least 1".to_string(),
            ));
        }

        if self.max_depth == Some(0) {
            return Err(LearningError::InvalidConfig(
                "max_depth must be at least 1 when set".to_string(),
            ));
        }

        Ok(())
    }
}

/// Builder for [`TrainerConfig`].
///
/// All setters return `self` to allow method chaining.
#[derive(Debug, Clone, Default)]
pub struct TrainerConfigBuilder {
    config: TrainerConfig,
}

impl TrainerConfigBuilder {
    /// Set the number of trees (default: 100).
    #[must_use]
    pub fn n_estimators(mut self, n: usize) -> Self {
        self.config.n_estimators = n;
        self
    }

    /// Limit tree depth (default: unlimited).
    #[must_use]
    pub fn max_depth(mut self, depth: usize) -> Self {
        self.config.max_depth = Some(depth);
        self
    }

    #[must_use]
    pub fn min_samples_split(mut self, n: usize) -> Self {
        self.config.min_samples_split = n;
        self
    }

    #[must_use]
    pub fn min_samples_leaf(mut self, n: usize) -> Self {
        self.config.min_samples_leaf = n;
        self
    }

    #[must_use]
    pub fn max_features(mut self, max_features: MaxFeatures) -> Self {
        self.config.max_features = max_features;
        self
    }

    #[must_use]
    pub fn criterion(mut self, criterion: Criterion) -> Self {
        self.config.criterion = criterion;
        self
    }

    /// Set the random seed for reproducibility (default: 42).
    #[must_use]
    pub fn random_state(mut self, seed: u64) -> Self {
        self.config.random_state = seed;
        self
    }

    /// Build the configuration, validating all settings.
    ///
    /// # Errors
    ///
    /// Returns [`LearningError::InvalidConfig`] when a constraint listed on
    /// [`TrainerConfig`] is violated.
    pub fn build(self) -> Result<TrainerConfig, LearningError> {
        self.config.validate()?;
        Ok(self.config)
    }
}
