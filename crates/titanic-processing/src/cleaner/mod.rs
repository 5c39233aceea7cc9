//! Missing-value cleaning for the raw splits.
//!
//! `DataCleaner` learns the mean fare from the training split and applies it,
//! together with a fixed embarkation port, to any split.

use crate::error::{ProcessingError, Result};
use crate::utils::{f64_values, fill_numeric_nulls, fill_string_nulls, mean_ignoring_nulls, series};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Port used for passengers with no recorded embarkation.
pub const DEFAULT_EMBARKED: &str = "S";

/// Identifier column removed from cleaned frames.
pub const ID_COLUMN: &str = "PassengerId";

/// Statistics learned by [`DataCleaner::fit`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CleaningParams {
    /// Mean `Fare` over the non-missing training values.
    pub fare_mean: f64,
}

impl CleaningParams {
    /// Compute the parameters from a training frame.
    pub fn from_frame(df: &DataFrame) -> Result<Self> {
        let fares = f64_values(df, "Fare")?;
        let fare_mean = mean_ignoring_nulls(&fares)
            .ok_or_else(|| ProcessingError::NoValidValues("Fare".to_string()))?;
        Ok(Self { fare_mean })
    }
}

/// Stateful imputer for `Fare` and `Embarked`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DataCleaner {
    params: Option<CleaningParams>,
}

impl DataCleaner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Restore a cleaner from previously fitted parameters.
    pub fn from_params(params: CleaningParams) -> Self {
        Self {
            params: Some(params),
        }
    }

    pub fn params(&self) -> Option<&CleaningParams> {
        self.params.as_ref()
    }

    pub fn is_fitted(&self) -> bool {
        self.params.is_some()
    }

    /// Learn the fare mean from `df`, replacing any earlier fit.
    pub fn fit(&mut self, df: &DataFrame) -> Result<&CleaningParams> {
        let params = CleaningParams::from_frame(df)?;
        debug!("DataCleaner fitted: fare_mean = {:.4}", params.fare_mean);
        Ok(&*self.params.insert(params))
    }

    /// Fill missing `Fare` and `Embarked` and drop `PassengerId`.
    pub fn transform(&self, df: &DataFrame) -> Result<DataFrame> {
        let params = self
            .params
            .as_ref()
            .ok_or(ProcessingError::Unfitted("DataCleaner"))?;

        let mut out = df.clone();

        let fare = fill_numeric_nulls(series(df, "Fare")?, params.fare_mean)?;
        out.replace("Fare", fare)?;

        let embarked = fill_string_nulls(series(df, "Embarked")?, DEFAULT_EMBARKED)?;
        out.replace("Embarked", embarked)?;

        if out.column(ID_COLUMN).is_err() {
            return Err(ProcessingError::ColumnNotFound(ID_COLUMN.to_string()));
        }
        Ok(out.drop(ID_COLUMN)?)
    }

    /// `fit` followed by `transform` on the same frame.
    pub fn fit_transform(&mut self, df: &DataFrame) -> Result<DataFrame> {
        self.fit(df)?;
        self.transform(df)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame() -> DataFrame {
        df![
            "PassengerId" => [1i64, 2, 3],
            "Fare" => [Some(10.0), None, Some(20.0)],
            "Embarked" => [Some("C"), Some("Q"), None],
            "Pclass" => [1i64, 2, 3],
        ]
        .unwrap()
    }

    #[test]
    fn test_transform_before_fit_fails() {
        let err = DataCleaner::new().transform(&frame()).unwrap_err();
        assert!(err.is_unfitted());
        assert!(err.to_string().contains("DataCleaner"));
    }

    #[test]
    fn test_fit_records_fare_mean() {
        let mut cleaner = DataCleaner::new();
        let params = cleaner.fit(&frame()).unwrap();
        assert_eq!(params.fare_mean, 15.0);
        assert!(cleaner.is_fitted());
    }

    #[test]
    fn test_transform_fills_and_drops() {
        let mut cleaner = DataCleaner::new();
        let out = cleaner.fit_transform(&frame()).unwrap();

        assert!(out.column(ID_COLUMN).is_err());
        assert_eq!(
            f64_values(&out, "Fare").unwrap(),
            vec![Some(10.0), Some(15.0), Some(20.0)]
        );
        let embarked = series(&out, "Embarked").unwrap().str().unwrap().clone();
        assert_eq!(embarked.get(2), Some(DEFAULT_EMBARKED));
        assert_eq!(out.width(), 3);
    }

    #[test]
    fn test_fit_then_transform_matches_fit_transform() {
        let df = frame();
        let mut separate = DataCleaner::new();
        separate.fit(&df).unwrap();
        let a = separate.transform(&df).unwrap();

        let b = DataCleaner::new().fit_transform(&df).unwrap();
        assert!(a.equals_missing(&b));
    }

    #[test]
    fn test_fitted_params_apply_to_other_frames() {
        let mut cleaner = DataCleaner::new();
        cleaner.fit(&frame()).unwrap();

        let other = df![
            "PassengerId" => [9i64],
            "Fare" => [Option::<f64>::None],
            "Embarked" => [Option::<&str>::None],
        ]
        .unwrap();
        let out = cleaner.transform(&other).unwrap();
        assert_eq!(f64_values(&out, "Fare").unwrap(), vec![Some(15.0)]);
    }

    #[test]
    fn test_all_missing_fares_cannot_be_fitted() {
        let df = df![
            "PassengerId" => [1i64],
            "Fare" => [Option::<f64>::None],
            "Embarked" => ["S"],
        ]
        .unwrap();
        let err = DataCleaner::new().fit(&df).unwrap_err();
        assert!(matches!(err, ProcessingError::NoValidValues(_)));
    }
}
