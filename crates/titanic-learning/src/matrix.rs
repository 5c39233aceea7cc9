//! Conversion from DataFrames to dense numeric inputs.

use crate::error::{LearningError, Result};
use polars::prelude::*;

/// Dense, column-major feature matrix with named columns.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureMatrix {
    names: Vec<String>,
    columns: Vec<Vec<f64>>,
    n_rows: usize,
}

impl FeatureMatrix {
    /// Build a matrix from explicit columns.
    ///
    /// # Errors
    ///
    /// Returns [`LearningError::InvalidData`] if the names and columns do not
    /// line up or the columns differ in length.
    pub fn new(names: Vec<String>, columns: Vec<Vec<f64>>) -> Result<Self> {
        if names.len() != columns.len() {
            return Err(LearningError::InvalidData(format!(
                "{} feature names for {} columns",
                names.len(),
                columns.len()
            )));
        }
        let n_rows = columns.first().map_or(0, Vec::len);
        if let Some((name, column)) = names.iter().zip(&columns).find(|(_, c)| c.len() != n_rows) {
            return Err(LearningError::InvalidData(format!(
                "column '{}' has {} rows, expected {}",
                name,
                column.len(),
                n_rows
            )));
        }
        Ok(Self {
            names,
            columns,
            n_rows,
        })
    }

    /// Read every column of `df` as a feature.
    pub fn from_frame(df: &DataFrame) -> Result<Self> {
        let names: Vec<String> = df
            .get_column_names()
            .iter()
            .map(|name| name.to_string())
            .collect();
        Self::select(df, &names)
    }

    /// Read the named columns of `df`, in the given order.
    ///
    /// # Errors
    ///
    /// Returns [`LearningError::InvalidData`] if a column is missing, is not
    /// numeric or boolean, or contains nulls.
    pub fn select(df: &DataFrame, names: &[String]) -> Result<Self> {
        let mut columns = Vec::with_capacity(names.len());
        for name in names {
            let column = df.column(name).map_err(|_| {
                LearningError::InvalidData(format!("feature column '{}' is missing", name))
            })?;
            columns.push(numeric_column(column.as_materialized_series())?);
        }
        Self::new(names.to_vec(), columns)
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn n_rows(&self) -> usize {
        self.n_rows
    }

    pub fn n_features(&self) -> usize {
        self.columns.len()
    }

    /// Value of `feature` in `row`.
    #[inline]
    pub fn value(&self, row: usize, feature: usize) -> f64 {
        self.columns[feature][row]
    }

    pub fn column(&self, feature: usize) -> &[f64] {
        &self.columns[feature]
    }
}

fn numeric_column(series: &Series) -> Result<Vec<f64>> {
    let dtype = series.dtype();
    let accepted = matches!(
        dtype,
        DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
            | DataType::UInt64
            | DataType::Float32
            | DataType::Float64
            | DataType::Boolean
    );
    if !accepted {
        return Err(LearningError::InvalidData(format!(
            "feature column '{}' has non-numeric dtype {}",
            series.name(),
            dtype
        )));
    }
    let casted = series.cast(&DataType::Float64)?;
    casted
        .f64()?
        .into_iter()
        .map(|value| {
            value.ok_or_else(|| {
                LearningError::InvalidData(format!(
                    "feature column '{}' contains null values",
                    series.name()
                ))
            })
        })
        .collect()
}

/// Read integer class labels from `target`.
///
/// # Errors
///
/// Returns [`LearningError::TargetNotFound`] if the column is absent and
/// [`LearningError::InvalidData`] if it contains nulls.
pub fn labels(df: &DataFrame, target: &str) -> Result<Vec<i64>> {
    let column = df
        .column(target)
        .map_err(|_| LearningError::TargetNotFound(target.to_string()))?;
    let casted = column.as_materialized_series().cast(&DataType::Int64)?;
    casted
        .i64()?
        .into_iter()
        .map(|value| {
            value.ok_or_else(|| {
                LearningError::InvalidData(format!("label column '{}' contains null values", target))
            })
        })
        .collect()
}
