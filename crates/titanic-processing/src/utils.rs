//! Shared utilities for reading and rebuilding frame columns.
//!
//! The transformers in this crate materialize columns into plain Rust vectors,
//! compute on them, and write the result back with [`Series::new`]. These
//! helpers keep the casting and error mapping in one place.

use crate::error::{ProcessingError, Result};
use polars::prelude::*;

// =============================================================================
// Data Type Utilities
// =============================================================================

/// Check if a DataType is an integer type.
#[inline]
pub fn is_integer_dtype(dtype: &DataType) -> bool {
    matches!(
        dtype,
        DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
            | DataType::UInt64
    )
}

/// Check if a DataType is numeric (integer or float).
#[inline]
pub fn is_numeric_dtype(dtype: &DataType) -> bool {
    is_integer_dtype(dtype) || matches!(dtype, DataType::Float32 | DataType::Float64)
}

// =============================================================================
// Column Access
// =============================================================================

/// Get a column as a materialized Series, mapping absence to `ColumnNotFound`.
pub fn series<'a>(df: &'a DataFrame, name: &str) -> Result<&'a Series> {
    df.column(name)
        .map(|col| col.as_materialized_series())
        .map_err(|_| ProcessingError::ColumnNotFound(name.to_string()))
}

/// Read a column as nullable `f64` values, casting numeric types.
/// NaN reads as missing.
pub fn f64_values(df: &DataFrame, name: &str) -> Result<Vec<Option<f64>>> {
    let casted = series(df, name)?.cast(&DataType::Float64)?;
    Ok(casted
        .f64()?
        .into_iter()
        .map(|v| v.filter(|x| !x.is_nan()))
        .collect())
}

/// Read a column as nullable `i64` values, casting numeric types.
pub fn i64_values(df: &DataFrame, name: &str) -> Result<Vec<Option<i64>>> {
    let casted = series(df, name)?.cast(&DataType::Int64)?;
    Ok(casted.i64()?.into_iter().collect())
}

/// Read a column as nullable strings, rendering non-string values.
pub fn string_values(df: &DataFrame, name: &str) -> Result<Vec<Option<String>>> {
    let casted = series(df, name)?.cast(&DataType::String)?;
    Ok(casted
        .str()?
        .into_iter()
        .map(|opt| opt.map(str::to_string))
        .collect())
}

// =============================================================================
// Series Transformation Utilities
// =============================================================================

/// Fill null values in a numeric Series with a specific value.
pub fn fill_numeric_nulls(series: &Series, fill_value: f64) -> PolarsResult<Series> {
    let casted = series.cast(&DataType::Float64)?;
    let filled: Vec<f64> = casted
        .f64()?
        .into_iter()
        .map(|opt| opt.unwrap_or(fill_value))
        .collect();
    Ok(Series::new(series.name().clone(), filled))
}

/// Fill null values in a string Series with a specific value.
pub fn fill_string_nulls(series: &Series, fill_value: &str) -> PolarsResult<Series> {
    let casted = series.cast(&DataType::String)?;
    let filled: Vec<String> = casted
        .str()?
        .into_iter()
        .map(|opt| opt.unwrap_or(fill_value).to_string())
        .collect();
    Ok(Series::new(series.name().clone(), filled))
}

/// Mean of the non-null values, `None` when there are none.
pub fn mean_ignoring_nulls(values: &[Option<f64>]) -> Option<f64> {
    let (sum, count) = values
        .iter()
        .flatten()
        .fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
    (count > 0).then(|| sum / count as f64)
}

/// Owned column names of a frame, in order.
pub fn column_names(df: &DataFrame) -> Vec<String> {
    df.get_column_names()
        .iter()
        .map(|name| name.to_string())
        .collect()
}

/// Build a frame from a list of Series.
pub fn frame_from_series(columns: Vec<Series>) -> Result<DataFrame> {
    Ok(DataFrame::new(columns.into_iter().map(Column::from).collect())?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fill_numeric_nulls() {
        let series = Series::new("values".into(), &[Some(1.0), None, Some(3.0)]);
        let filled = fill_numeric_nulls(&series, 2.0).unwrap();
        assert_eq!(filled.null_count(), 0);
        assert_eq!(filled.get(1).unwrap().try_extract::<f64>().unwrap(), 2.0);
        assert_eq!(filled.name().as_str(), "values");
    }

    #[test]
    fn test_fill_string_nulls() {
        let series = Series::new("port".into(), &[Some("C"), None]);
        let filled = fill_string_nulls(&series, "S").unwrap();
        assert_eq!(filled.null_count(), 0);
        assert_eq!(filled.str().unwrap().get(1), Some("S"));
    }

    #[test]
    fn test_mean_ignoring_nulls() {
        assert_eq!(mean_ignoring_nulls(&[Some(1.0), None, Some(5.0)]), Some(3.0));
        assert_eq!(mean_ignoring_nulls(&[None, None]), None);
        assert_eq!(mean_ignoring_nulls(&[]), None);
    }

    #[test]
    fn test_column_accessors_cast() {
        let df = df![
            "Pclass" => [1i64, 3],
            "Fare" => [Some(7.25), None],
        ]
        .unwrap();

        assert_eq!(f64_values(&df, "Pclass").unwrap(), vec![Some(1.0), Some(3.0)]);
        assert_eq!(
            string_values(&df, "Pclass").unwrap(),
            vec![Some("1".to_string()), Some("3".to_string())]
        );
        assert_eq!(i64_values(&df, "Pclass").unwrap(), vec![Some(1), Some(3)]);
        assert!(matches!(
            f64_values(&df, "Age"),
            Err(ProcessingError::ColumnNotFound(_))
        ));
    }

    #[test]
    fn test_f64_values_read_nan_as_missing() {
        let df = df!["Age" => [Some(22.0), Some(f64::NAN), None]].unwrap();
        assert_eq!(f64_values(&df, "Age").unwrap(), vec![Some(22.0), None, None]);
    }
}
