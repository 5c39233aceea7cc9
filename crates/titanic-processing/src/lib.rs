//! Titanic Data Processing Library
//!
//! Ingestion, validation and preprocessing for the Titanic survival dataset,
//! built on Polars.
//!
//! # Overview
//!
//! - **Dataset loading**: read `train.csv`/`test.csv` directly or from a zip archive
//! - **Schema validation**: per-split column types, domains and uniqueness
//! - **Cleaning**: [`DataCleaner`] fills missing fares and ports
//! - **Feature engineering**: [`FeatureEnricher`] derives, imputes, bins and one-hot encodes
//! - **Snapshots**: [`FrameSnapshot`] persists frames without Polars serialization
//!
//! Both transformers follow the fit/transform contract: `fit` learns explicit
//! parameter structs from the training split, `transform` applies them to any
//! split, and `transform` before `fit` is an error.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use titanic_processing::{DataCleaner, FeatureEnricher, TitanicDataset};
//!
//! let dataset = TitanicDataset::from_archive("data/titanic.zip")?;
//!
//! let mut cleaner = DataCleaner::new();
//! let train = cleaner.fit_transform(dataset.train_data())?;
//! let test = cleaner.transform(dataset.test_data())?;
//!
//! let mut enricher = FeatureEnricher::new();
//! let train = enricher.fit_transform(&train)?;
//! let test = enricher.transform(&test)?;
//! ```

pub mod cleaner;
pub mod dataset;
pub mod error;
pub mod features;
pub mod snapshot;
pub mod utils;

pub use cleaner::{CleaningParams, DataCleaner};
pub use dataset::{DatasetSchema, Split, TitanicDataset, validate_data_schema};
pub use error::{ProcessingError, Result, ResultExt};
pub use features::{EnrichmentParams, FeatureEnricher, OneHotVocabulary, QuantileBins};
pub use snapshot::{ColumnSnapshot, ColumnValues, FrameSnapshot};

static_assertions::assert_impl_all!(DataCleaner: Send, Sync);
static_assertions::assert_impl_all!(FeatureEnricher: Send, Sync);
static_assertions::assert_impl_all!(TitanicDataset: Send, Sync);
