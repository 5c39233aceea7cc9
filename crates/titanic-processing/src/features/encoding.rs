//! Fitted encodings: quantile bins and one-hot vocabularies.

use serde::{Deserialize, Serialize};

/// Quantiles used for the cabin number bins.
pub const CABIN_QUANTILES: [f64; 4] = [0.0, 1.0 / 3.0, 2.0 / 3.0, 1.0];

/// Linear-interpolated quantile of sorted values.
fn quantile(sorted: &[f64], q: f64) -> f64 {
    let position = q * (sorted.len() - 1) as f64;
    let lower = position.floor() as usize;
    let upper = position.ceil() as usize;
    sorted[lower] + (sorted[upper] - sorted[lower]) * (position - lower as f64)
}

/// Bin edges fixed at fit time.
///
/// Intervals are right-closed, with the first one also closed on the left.
/// A single edge (all fitted values equal) makes one bin holding that value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QuantileBins {
    pub edges: Vec<f64>,
}

impl QuantileBins {
    /// Compute edges from the non-missing values. Duplicate edges collapse.
    pub fn fit(values: &[Option<f64>], quantiles: &[f64]) -> Self {
        let mut sorted: Vec<f64> = values.iter().flatten().copied().collect();
        if sorted.is_empty() {
            return Self::default();
        }
        sorted.sort_by(f64::total_cmp);

        let mut edges: Vec<f64> = quantiles.iter().map(|&q| quantile(&sorted, q)).collect();
        edges.dedup();
        Self { edges }
    }

    pub fn len(&self) -> usize {
        match self.edges.len() {
            0 | 1 => self.edges.len(),
            n => n - 1,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    /// Index of the bin holding `value`, `None` when out of range.
    pub fn bin(&self, value: f64) -> Option<usize> {
        match self.edges.as_slice() {
            [] => None,
            [only] => (value == *only).then_some(0),
            edges => {
                if value == edges[0] {
                    return Some(0);
                }
                edges
                    .windows(2)
                    .position(|pair| pair[0] < value && value <= pair[1])
            }
        }
    }

    /// Indicator rows for every value: one vector per bin.
    pub fn indicators(&self, values: &[Option<f64>]) -> Vec<Vec<i64>> {
        let mut columns = vec![vec![0i64; values.len()]; self.len()];
        for (row, value) in values.iter().enumerate() {
            if let Some(bin) = value.and_then(|v| self.bin(v)) {
                columns[bin][row] = 1;
            }
        }
        columns
    }
}

/// Levels of one categorical column, in first-appearance order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OneHotVocabulary {
    pub column: String,
    pub levels: Vec<String>,
}

impl OneHotVocabulary {
    /// Record the distinct non-missing levels of `values`.
    pub fn fit(column: impl Into<String>, values: &[Option<String>]) -> Self {
        let mut levels: Vec<String> = Vec::new();
        for value in values.iter().flatten() {
            if !levels.contains(value) {
                levels.push(value.clone());
            }
        }
        Self {
            column: column.into(),
            levels,
        }
    }

    /// Output column names, `"<column>_<level>"`.
    pub fn output_names(&self) -> Vec<String> {
        self.levels
            .iter()
            .map(|level| format!("{}_{}", self.column, level))
            .collect()
    }

    /// One indicator vector per recorded level. Unseen levels encode as all zeros.
    pub fn encode(&self, values: &[Option<String>]) -> Vec<Vec<i64>> {
        self.levels
            .iter()
            .map(|level| {
                values
                    .iter()
                    .map(|v| i64::from(v.as_deref() == Some(level.as_str())))
                    .collect()
            })
            .collect()
    }
}
