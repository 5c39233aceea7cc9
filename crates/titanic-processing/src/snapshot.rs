//! Serializable frame snapshots.
//!
//! Frames are persisted as an explicit list of typed columns instead of
//! relying on Polars' own serialization, so checkpoint files stay readable
//! and independent of the in-memory layout.

use crate::error::{ProcessingError, Result};
use crate::utils::frame_from_series;
use polars::prelude::*;
use serde::{Deserialize, Serialize};

/// Values of a single column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "dtype", content = "values", rename_all = "snake_case")]
pub enum ColumnValues {
    Int64(Vec<Option<i64>>),
    Float64(Vec<Option<f64>>),
    Boolean(Vec<Option<bool>>),
    Utf8(Vec<Option<String>>),
}

/// A named column inside a [`FrameSnapshot`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnSnapshot {
    pub name: String,
    pub values: ColumnValues,
}

/// Ordered, typed copy of a frame.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FrameSnapshot {
    pub columns: Vec<ColumnSnapshot>,
}

impl FrameSnapshot {
    /// Capture a frame. Integer columns are widened to `Int64`, float columns
    /// to `Float64`, and all-null columns are stored as strings.
    pub fn from_frame(df: &DataFrame) -> Result<Self> {
        let mut columns = Vec::with_capacity(df.width());

        for column in df.get_columns() {
            let series = column.as_materialized_series();
            let name = series.name().to_string();
            let values = match series.dtype() {
                dtype if crate::utils::is_integer_dtype(dtype) => {
                    let casted = series.cast(&DataType::Int64)?;
                    ColumnValues::Int64(casted.i64()?.into_iter().collect())
                }
                DataType::Float32 | DataType::Float64 => {
                    let casted = series.cast(&DataType::Float64)?;
                    ColumnValues::Float64(casted.f64()?.into_iter().collect())
                }
                DataType::Boolean => ColumnValues::Boolean(series.bool()?.into_iter().collect()),
                DataType::String | DataType::Null => {
                    let casted = series.cast(&DataType::String)?;
                    ColumnValues::Utf8(
                        casted
                            .str()?
                            .into_iter()
                            .map(|opt| opt.map(str::to_string))
                            .collect(),
                    )
                }
                other => {
                    return Err(ProcessingError::InvalidOption(format!(
                        "column '{}' has unsupported dtype {} for snapshots",
                        name, other
                    )));
                }
            };
            columns.push(ColumnSnapshot { name, values });
        }

        Ok(Self { columns })
    }

    /// Rebuild the frame.
    pub fn to_frame(&self) -> Result<DataFrame> {
        let series = self
            .columns
            .iter()
            .map(|column| {
                let name: PlSmallStr = column.name.as_str().into();
                match &column.values {
                    ColumnValues::Int64(values) => Series::new(name, values),
                    ColumnValues::Float64(values) => Series::new(name, values),
                    ColumnValues::Boolean(values) => Series::new(name, values),
                    ColumnValues::Utf8(values) => Series::new(name, values),
                }
            })
            .collect();

        frame_from_series(series)
    }

    /// Number of rows, zero for an empty snapshot.
    pub fn height(&self) -> usize {
        self.columns.first().map_or(0, |column| match &column.values {
            ColumnValues::Int64(v) => v.len(),
            ColumnValues::Float64(v) => v.len(),
            ColumnValues::Boolean(v) => v.len(),
            ColumnValues::Utf8(v) => v.len(),
        })
    }
}
