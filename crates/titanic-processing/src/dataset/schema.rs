//! Column schemas for the raw Titanic splits.
//!
//! Each split declares its columns, their types and value checks. Validation
//! coerces the harmless CSV-inference artifacts (integers read where floats
//! or strings were declared, all-null columns) and rejects everything else.

use crate::error::{ProcessingError, Result};
use crate::utils::{is_integer_dtype, is_numeric_dtype, series};
use polars::prelude::*;
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;
use tracing::debug;

/// Which partition of the dataset a frame belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Split {
    /// Labeled partition, carries `Survived`.
    Train,
    /// Unlabeled partition.
    Test,
}

impl Split {
    pub fn as_str(&self) -> &'static str {
        match self {
            Split::Train => "train",
            Split::Test => "test",
        }
    }
}

impl fmt::Display for Split {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Split {
    type Err = ProcessingError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "train" => Ok(Split::Train),
            "test" => Ok(Split::Test),
            other => Err(ProcessingError::InvalidOption(format!(
                "{} is an invalid option for split. Valid options are \"train\" or \"test\".",
                other
            ))),
        }
    }
}

/// Declared storage type of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    Integer,
    Float,
    Text,
}

impl ColumnType {
    fn dtype(&self) -> DataType {
        match self {
            ColumnType::Integer => DataType::Int64,
            ColumnType::Float => DataType::Float64,
            ColumnType::Text => DataType::String,
        }
    }
}

/// A value-level check applied to the non-null cells of a column.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Check {
    /// Integer value must be one of the listed values.
    InIntegers(&'static [i64]),
    /// String value must be one of the listed values.
    InStrings(&'static [&'static str]),
    /// Numeric value must be `>= 0`.
    NonNegative,
}

impl fmt::Display for Check {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Check::InIntegers(allowed) => write!(f, "isin {:?}", allowed),
            Check::InStrings(allowed) => write!(f, "isin {:?}", allowed),
            Check::NonNegative => f.write_str("greater_than_or_equal_to(0)"),
        }
    }
}

/// Rule for a single column.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnRule {
    pub name: &'static str,
    pub column_type: ColumnType,
    pub nullable: bool,
    pub checks: &'static [Check],
    pub unique: bool,
}

impl ColumnRule {
    const fn new(name: &'static str, column_type: ColumnType) -> Self {
        Self {
            name,
            column_type,
            nullable: false,
            checks: &[],
            unique: false,
        }
    }

    const fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    const fn checks(mut self, checks: &'static [Check]) -> Self {
        self.checks = checks;
        self
    }

    const fn unique(mut self) -> Self {
        self.unique = true;
        self
    }
}

const TEST_COLUMNS: [ColumnRule; 11] = [
    ColumnRule::new("PassengerId", ColumnType::Integer).unique(),
    ColumnRule::new("Pclass", ColumnType::Integer).checks(&[Check::InIntegers(&[1, 2, 3])]),
    ColumnRule::new("Name", ColumnType::Text),
    ColumnRule::new("Sex", ColumnType::Text).checks(&[Check::InStrings(&["male", "female"])]),
    ColumnRule::new("Age", ColumnType::Float)
        .nullable()
        .checks(&[Check::NonNegative]),
    ColumnRule::new("SibSp", ColumnType::Integer).checks(&[Check::NonNegative]),
    ColumnRule::new("Parch", ColumnType::Integer).checks(&[Check::NonNegative]),
    ColumnRule::new("Ticket", ColumnType::Text),
    ColumnRule::new("Fare", ColumnType::Float)
        .nullable()
        .checks(&[Check::NonNegative]),
    ColumnRule::new("Cabin", ColumnType::Text).nullable(),
    ColumnRule::new("Embarked", ColumnType::Text)
        .nullable()
        .checks(&[Check::InStrings(&["S", "C", "Q"])]),
];

const SURVIVED: ColumnRule =
    ColumnRule::new("Survived", ColumnType::Integer).checks(&[Check::InIntegers(&[0, 1])]);

/// The set of rules a split must satisfy.
#[derive(Debug, Clone)]
pub struct DatasetSchema {
    split: Split,
    columns: Vec<ColumnRule>,
}

impl DatasetSchema {
    /// Schema for the given split. The train schema adds `Survived`.
    pub fn for_split(split: Split) -> Self {
        let mut columns = TEST_COLUMNS.to_vec();
        if split == Split::Train {
            columns.push(SURVIVED);
        }
        Self { split, columns }
    }

    pub fn split(&self) -> Split {
        self.split
    }

    pub fn columns(&self) -> &[ColumnRule] {
        &self.columns
    }

    /// Validate a frame, returning it with declared types applied.
    ///
    /// Columns not named by the schema are kept as they are.
    pub fn validate(&self, mut df: DataFrame) -> Result<DataFrame> {
        for rule in &self.columns {
            let Ok(column) = series(&df, rule.name) else {
                return Err(ProcessingError::validation(rule.name, "column is required"));
            };
            let coerced = coerce_column(column, rule)?;
            check_column(&coerced, rule)?;
            df.with_column(coerced)?;
        }

        debug!(
            "Validated {} rows against the {} schema",
            df.height(),
            self.split
        );
        Ok(df)
    }
}

/// Validate a frame against the schema of a split given by name.
///
/// Fails with `InvalidOption` for names other than `"train"` and `"test"`.
pub fn validate_data_schema(df: DataFrame, split: &str) -> Result<DataFrame> {
    let split: Split = split.parse()?;
    DatasetSchema::for_split(split).validate(df)
}

/// Float cells holding NaN are missing values, not numbers.
fn nan_to_null(series: Series) -> Result<Series> {
    let values = series.f64()?;
    if !values.into_iter().flatten().any(f64::is_nan) {
        return Ok(series);
    }
    let cleaned: Vec<Option<f64>> = values
        .into_iter()
        .map(|v| v.filter(|x| !x.is_nan()))
        .collect();
    Ok(Series::new(series.name().clone(), cleaned))
}

fn coerce_column(series: &Series, rule: &ColumnRule) -> Result<Series> {
    let coerced = cast_column(series, rule)?;
    match rule.column_type {
        ColumnType::Float => nan_to_null(coerced),
        _ => Ok(coerced),
    }
}

fn cast_column(series: &Series, rule: &ColumnRule) -> Result<Series> {
    let dtype = series.dtype();
    let target = rule.column_type.dtype();

    if dtype == &target {
        return Ok(series.clone());
    }

    let all_null = series.null_count() == series.len();
    let compatible = all_null
        || matches!(dtype, DataType::Null)
        || match rule.column_type {
            ColumnType::Integer => is_integer_dtype(dtype),
            ColumnType::Float => is_numeric_dtype(dtype),
            ColumnType::Text => is_integer_dtype(dtype),
        };

    if !compatible {
        return Err(ProcessingError::validation(
            rule.name,
            format!("expected {:?} column, found dtype {}", rule.column_type, dtype),
        ));
    }

    Ok(series.cast(&target)?)
}

fn check_column(series: &Series, rule: &ColumnRule) -> Result<()> {
    if !rule.nullable && series.null_count() > 0 {
        return Err(ProcessingError::validation(
            rule.name,
            format!("{} null values in a non-nullable column", series.null_count()),
        ));
    }

    for check in rule.checks {
        if let Some(bad) = first_violation(series, check)? {
            return Err(ProcessingError::validation(
                rule.name,
                format!("{} failed for value {}", check, bad),
            ));
        }
    }

    if rule.unique {
        let mut seen = HashSet::new();
        let casted = series.cast(&DataType::String)?;
        for value in casted.str()?.into_iter().flatten() {
            if !seen.insert(value) {
                return Err(ProcessingError::validation(
                    rule.name,
                    format!("duplicate value {}", value),
                ));
            }
        }
    }

    Ok(())
}

/// Render the first non-null value that fails `check`, if any.
fn first_violation(series: &Series, check: &Check) -> Result<Option<String>> {
    let violation = match check {
        Check::InIntegers(allowed) => {
            let casted = series.cast(&DataType::Int64)?;
            casted
                .i64()?
                .into_iter()
                .flatten()
                .find(|v| !allowed.contains(v))
                .map(|v| v.to_string())
        }
        Check::InStrings(allowed) => {
            let casted = series.cast(&DataType::String)?;
            casted
                .str()?
                .into_iter()
                .flatten()
                .find(|v| !allowed.contains(v))
                .map(|v| format!("'{}'", v))
        }
        Check::NonNegative => {
            let casted = series.cast(&DataType::Float64)?;
            casted
                .f64()?
                .into_iter()
                .flatten()
                .find(|v| *v < 0.0)
                .map(|v| v.to_string())
        }
    };
    Ok(violation)
}
