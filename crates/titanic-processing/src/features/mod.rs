//! Feature engineering for cleaned frames.
//!
//! [`FeatureEnricher`] derives the engineered columns, imputes `Age` from
//! `(Name_Title, Pclass)` group means, bins cabin numbers and one-hot encodes
//! the categorical columns. Everything data-dependent is learned once by
//! `fit` and stored in [`EnrichmentParams`], so transforming the test split
//! reuses the training statistics verbatim.
//!
//! Output column order:
//! 1. passthrough input columns, in input order (`Age` imputed in place)
//! 2. `Name_Len`, `Age_Null_Flag`, `Ticket_Len`
//! 3. `Cabin_num_<i>` bin indicators
//! 4. one-hot indicators, grouped by [`ONE_HOT_COLUMNS`]

mod derive;
mod encoding;

pub use derive::{
    CABIN_NUMBER, DERIVED_CATEGORICAL, DERIVED_NUMERIC, cabin_letter, cabin_number, derive,
    family_size, name_title, ticket_letter,
};
pub use encoding::{CABIN_QUANTILES, OneHotVocabulary, QuantileBins};

use crate::error::{ProcessingError, Result};
use crate::utils::{column_names, f64_values, frame_from_series, i64_values, mean_ignoring_nulls, series, string_values};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

/// Columns one-hot encoded by the enricher, in output order.
pub const ONE_HOT_COLUMNS: [&str; 7] = [
    "Pclass",
    "Sex",
    "Embarked",
    "Ticket_Lett",
    "Cabin_Letter",
    "Name_Title",
    "Fam_Size",
];

/// Fit-time mean `Age` keyed by title then passenger class.
pub type AgeGroups = BTreeMap<String, BTreeMap<i64, f64>>;

/// Everything [`FeatureEnricher::fit`] learns from the training frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrichmentParams {
    /// Mean known `Age` per `(Name_Title, Pclass)`.
    pub age_groups: AgeGroups,
    /// Mean of all known ages, used for groups unseen at fit.
    pub age_fallback: f64,
    /// Cabin number bin edges.
    pub cabin_bins: QuantileBins,
    /// One vocabulary per one-hot column, in [`ONE_HOT_COLUMNS`] order.
    pub vocabularies: Vec<OneHotVocabulary>,
}

impl EnrichmentParams {
    /// Learn the parameters from a frame that has already gone through [`derive`].
    pub fn from_derived(derived: &DataFrame) -> Result<Self> {
        let ages = f64_values(derived, "Age")?;
        let age_fallback = mean_ignoring_nulls(&ages)
            .ok_or_else(|| ProcessingError::NoValidValues("Age".to_string()))?;

        let titles = string_values(derived, "Name_Title")?;
        let classes = i64_values(derived, "Pclass")?;

        let mut sums: BTreeMap<(String, i64), (f64, usize)> = BTreeMap::new();
        for ((age, title), class) in ages.iter().zip(&titles).zip(&classes) {
            if let (Some(age), Some(title), Some(class)) = (age, title, class) {
                let entry = sums.entry((title.clone(), *class)).or_insert((0.0, 0));
                entry.0 += age;
                entry.1 += 1;
            }
        }
        let mut age_groups = AgeGroups::new();
        for ((title, class), (sum, count)) in sums {
            age_groups
                .entry(title)
                .or_default()
                .insert(class, sum / count as f64);
        }

        let cabin_bins = QuantileBins::fit(&f64_values(derived, CABIN_NUMBER)?, &CABIN_QUANTILES);

        let mut vocabularies = Vec::with_capacity(ONE_HOT_COLUMNS.len());
        for column in ONE_HOT_COLUMNS {
            vocabularies.push(OneHotVocabulary::fit(column, &string_values(derived, column)?));
        }

        Ok(Self {
            age_groups,
            age_fallback,
            cabin_bins,
            vocabularies,
        })
    }

    /// Imputation value for a passenger with unknown age.
    pub fn age_for(&self, title: Option<&str>, class: Option<i64>) -> f64 {
        title
            .zip(class)
            .and_then(|(title, class)| self.age_groups.get(title)?.get(&class).copied())
            .unwrap_or(self.age_fallback)
    }

    /// Names of every column `transform` emits after the passthrough columns.
    pub fn encoded_names(&self) -> Vec<String> {
        let bins = (0..self.cabin_bins.len()).map(|i| format!("{}_{}", CABIN_NUMBER, i));
        DERIVED_NUMERIC
            .iter()
            .map(|name| name.to_string())
            .chain(bins)
            .chain(self.vocabularies.iter().flat_map(|v| v.output_names()))
            .collect()
    }
}

/// Stateful feature engineering step.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeatureEnricher {
    params: Option<EnrichmentParams>,
}

impl FeatureEnricher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_params(params: EnrichmentParams) -> Self {
        Self {
            params: Some(params),
        }
    }

    pub fn params(&self) -> Option<&EnrichmentParams> {
        self.params.as_ref()
    }

    pub fn is_fitted(&self) -> bool {
        self.params.is_some()
    }

    /// Learn group means, bin edges and vocabularies from `df`.
    pub fn fit(&mut self, df: &DataFrame) -> Result<&EnrichmentParams> {
        let derived = derive(df)?;
        self.fit_derived(&derived)
    }

    fn fit_derived(&mut self, derived: &DataFrame) -> Result<&EnrichmentParams> {
        let params = EnrichmentParams::from_derived(derived)?;
        debug!(
            "FeatureEnricher fitted: {} title groups, {} cabin bins, {} one-hot columns",
            params.age_groups.len(),
            params.cabin_bins.len(),
            params.vocabularies.iter().map(|v| v.levels.len()).sum::<usize>()
        );
        Ok(&*self.params.insert(params))
    }

    /// Derive and encode `df` with the fitted parameters.
    pub fn transform(&self, df: &DataFrame) -> Result<DataFrame> {
        self.fitted()?;
        let derived = derive(df)?;
        self.transform_derived(&derived)
    }

    /// Encode a frame that has already been through [`derive`].
    pub fn transform_derived(&self, derived: &DataFrame) -> Result<DataFrame> {
        let params = self.fitted()?;

        let ages = f64_values(derived, "Age")?;
        let titles = string_values(derived, "Name_Title")?;
        let classes = i64_values(derived, "Pclass")?;
        let imputed: Vec<f64> = ages
            .iter()
            .zip(&titles)
            .zip(&classes)
            .map(|((age, title), class)| {
                age.unwrap_or_else(|| params.age_for(title.as_deref(), *class))
            })
            .collect();

        let mut columns: Vec<Series> = Vec::new();
        for name in column_names(derived) {
            let name = name.as_str();
            if name == "Age" {
                columns.push(Series::new("Age".into(), imputed.clone()));
            } else if !ONE_HOT_COLUMNS.contains(&name)
                && !DERIVED_NUMERIC.contains(&name)
                && !DERIVED_CATEGORICAL.contains(&name)
                && name != CABIN_NUMBER
            {
                columns.push(series(derived, name)?.clone());
            }
        }

        for name in DERIVED_NUMERIC {
            columns.push(series(derived, name)?.clone());
        }

        let cabin_numbers = f64_values(derived, CABIN_NUMBER)?;
        for (i, values) in params.cabin_bins.indicators(&cabin_numbers).into_iter().enumerate() {
            columns.push(Series::new(format!("{}_{}", CABIN_NUMBER, i).into(), values));
        }

        for vocabulary in &params.vocabularies {
            let values = string_values(derived, &vocabulary.column)?;
            let names = vocabulary.output_names();
            for (name, indicator) in names.into_iter().zip(vocabulary.encode(&values)) {
                columns.push(Series::new(name.into(), indicator));
            }
        }

        frame_from_series(columns)
    }

    /// Fit on `df` and transform it, deriving only once.
    pub fn fit_transform(&mut self, df: &DataFrame) -> Result<DataFrame> {
        let derived = derive(df)?;
        self.fit_derived(&derived)?;
        self.transform_derived(&derived)
    }

    fn fitted(&self) -> Result<&EnrichmentParams> {
        self.params
            .as_ref()
            .ok_or(ProcessingError::Unfitted("FeatureEnricher"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn cleaned_train() -> DataFrame {
        df![
            "Survived" => [0i64, 1, 1, 0],
            "Pclass" => [3i64, 1, 3, 3],
            "Name" => [
                "Braund, Mr. Owen Harris",
                "Cumings, Mrs. John Bradley (Florence Briggs Thayer)",
                "Heikkinen, Miss. Laina",
                "Allen, Mr. William Henry",
            ],
            "Sex" => ["male", "female", "female", "male"],
            "Age" => [Some(22.0), Some(38.0), Some(26.0), None],
            "SibSp" => [1i64, 1, 0, 0],
            "Parch" => [0i64, 0, 0, 0],
            "Ticket" => ["A/5 21171", "PC 17599", "STON/O2. 3101282", "373450"],
            "Fare" => [7.25, 71.2833, 7.925, 8.05],
            "Cabin" => [Some("C100"), Some("C85"), Some("C20"), None],
            "Embarked" => ["S", "C", "S", "S"],
        ]
        .unwrap()
    }

    fn cleaned_test() -> DataFrame {
        df![
            "Pclass" => [3i64, 2],
            "Name" => ["Kelly, Mr. James", "Myles, Dr. Thomas Francis"],
            "Sex" => ["male", "male"],
            "Age" => [None, Option::<f64>::None],
            "SibSp" => [0i64, 0],
            "Parch" => [0i64, 0],
            "Ticket" => ["W.E.P. 330911", "240276"],
            "Fare" => [7.8292, 9.6875],
            "Cabin" => [Some("B500"), None],
            "Embarked" => ["Q", "Q"],
        ]
        .unwrap()
    }

    #[test]
    fn test_transform_before_fit_fails() {
        let err = FeatureEnricher::new().transform(&cleaned_train()).unwrap_err();
        assert!(err.is_unfitted());
        assert!(err.to_string().contains("FeatureEnricher"));
    }

    #[test]
    fn test_fit_learns_group_means() {
        let mut enricher = FeatureEnricher::new();
        let params = enricher.fit(&cleaned_train()).unwrap();

        assert_eq!(params.age_groups["Mr."][&3], 22.0);
        assert_eq!(params.age_groups["Mrs."][&1], 38.0);
        assert_eq!(params.age_fallback, (22.0 + 38.0 + 26.0) / 3.0);
        assert_eq!(params.cabin_bins.edges.first(), Some(&20.0));
        assert_eq!(params.cabin_bins.edges.last(), Some(&100.0));
    }

    #[test]
    fn test_output_layout() {
        let mut enricher = FeatureEnricher::new();
        let out = enricher.fit_transform(&cleaned_train()).unwrap();

        let names = column_names(&out);
        assert_eq!(&names[..3], &["Survived", "Age", "Fare"]);
        assert_eq!(&names[3..], enricher.params().unwrap().encoded_names().as_slice());
        assert!(names.contains(&"Pclass_3".to_string()));
        assert!(names.contains(&"Cabin_Letter_n".to_string()));
        assert!(names.contains(&"Cabin_num_2".to_string()));
        assert!(!names.contains(&"Name".to_string()));
        assert_eq!(out.height(), 4);
    }

    #[test]
    fn test_missing_age_uses_group_then_fallback() {
        let mut enricher = FeatureEnricher::new();
        enricher.fit(&cleaned_train()).unwrap();

        let train_out = enricher.transform(&cleaned_train()).unwrap();
        assert_eq!(f64_values(&train_out, "Age").unwrap()[3], Some(22.0));
        assert_eq!(i64_values(&train_out, "Age_Null_Flag").unwrap()[3], Some(1));

        let test_out = enricher.transform(&cleaned_test()).unwrap();
        let fallback = enricher.params().unwrap().age_fallback;
        assert_eq!(
            f64_values(&test_out, "Age").unwrap(),
            vec![Some(22.0), Some(fallback)]
        );
    }

    #[test]
    fn test_test_split_uses_fit_schema() {
        let mut enricher = FeatureEnricher::new();
        let train_out = enricher.fit_transform(&cleaned_train()).unwrap();
        let test_out = enricher.transform(&cleaned_test()).unwrap();

        let train_names = column_names(&train_out);
        let test_names = column_names(&test_out);
        assert_eq!(&train_names[1..], test_names.as_slice());

        // "Q", "Dr." and class 2 never appeared in the training split
        assert!(!test_names.contains(&"Embarked_Q".to_string()));
        assert!(!test_names.contains(&"Name_Title_Dr.".to_string()));
        assert!(!test_names.contains(&"Pclass_2".to_string()));

        // B500 is above the fitted range
        for i in 0..3 {
            let bin = i64_values(&test_out, &format!("Cabin_num_{}", i)).unwrap();
            assert_eq!(bin, vec![Some(0), Some(0)]);
        }
    }

    #[test]
    fn test_fit_then_transform_matches_fit_transform() {
        let train = cleaned_train();
        let test = cleaned_test();

        let mut separate = FeatureEnricher::new();
        separate.fit(&train).unwrap();
        let train_a = separate.transform(&train).unwrap();
        let test_a = separate.transform(&test).unwrap();

        let mut combined = FeatureEnricher::new();
        let train_b = combined.fit_transform(&train).unwrap();
        let test_b = combined.transform(&test).unwrap();

        assert!(train_a.equals_missing(&train_b));
        assert!(test_a.equals_missing(&test_b));
        assert_eq!(separate, combined);
    }

    #[test]
    fn test_all_missing_ages_cannot_be_fitted() {
        let mut df = cleaned_train();
        df.with_column(Series::new("Age".into(), vec![Option::<f64>::None; 4]))
            .unwrap();
        let err = FeatureEnricher::new().fit(&df).unwrap_err();
        assert!(matches!(err, ProcessingError::NoValidValues(ref c) if c == "Age"));
    }

    #[test]
    fn test_params_serialize() {
        let mut enricher = FeatureEnricher::new();
        enricher.fit(&cleaned_train()).unwrap();

        let json = serde_json::to_string(&enricher).unwrap();
        let restored: FeatureEnricher = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, enricher);
    }
}
