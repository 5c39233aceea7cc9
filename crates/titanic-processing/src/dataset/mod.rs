//! Dataset ingestion.
//!
//! Reads the train and test CSV files, either directly or unpacked from a zip
//! archive, and validates both against their split schema.

pub mod schema;

pub use schema::{Check, ColumnRule, ColumnType, DatasetSchema, Split, validate_data_schema};

use crate::error::{ProcessingError, Result, ResultExt};
use polars::prelude::*;
use std::fs::File;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Archive member holding the labeled split.
pub const TRAIN_FILE_NAME: &str = "train.csv";
/// Archive member holding the unlabeled split.
pub const TEST_FILE_NAME: &str = "test.csv";

/// The validated train and test splits.
#[derive(Debug, Clone)]
pub struct TitanicDataset {
    train_data: DataFrame,
    test_data: DataFrame,
}

impl TitanicDataset {
    /// Build a dataset from frames that are already in memory.
    ///
    /// Both frames are validated against their split schema.
    pub fn new(train_data: DataFrame, test_data: DataFrame) -> Result<Self> {
        let train_data = DatasetSchema::for_split(Split::Train)
            .validate(train_data)
            .context("Invalid train data")?;
        let test_data = DatasetSchema::for_split(Split::Test)
            .validate(test_data)
            .context("Invalid test data")?;
        Ok(Self {
            train_data,
            test_data,
        })
    }

    /// Read and validate the two CSV files.
    pub fn load(train_path: impl AsRef<Path>, test_path: impl AsRef<Path>) -> Result<Self> {
        let train_path = train_path.as_ref();
        let test_path = test_path.as_ref();
        check_extension(train_path, "csv")?;
        check_extension(test_path, "csv")?;

        let train_data = read_csv(train_path)?;
        let test_data = read_csv(test_path)?;
        let dataset = Self::new(train_data, test_data)?;

        info!(
            "Loaded dataset: {} train rows, {} test rows",
            dataset.train_data.height(),
            dataset.test_data.height()
        );
        Ok(dataset)
    }

    /// Unpack `train.csv` and `test.csv` from a zip archive and load them.
    ///
    /// Members are matched by file name anywhere in the archive. The scratch
    /// directory is removed when this returns, whether loading succeeded or not.
    pub fn from_archive(archive_path: impl AsRef<Path>) -> Result<Self> {
        let archive_path = archive_path.as_ref();
        check_extension(archive_path, "zip")?;

        let scratch = tempfile::TempDir::new()?;
        let (train_path, test_path) = extract_splits(archive_path, scratch.path())
            .context(format!("Failed to unpack {}", archive_path.display()))?;
        debug!("Unpacked archive into {}", scratch.path().display());

        Self::load(train_path, test_path)
    }

    pub fn train_data(&self) -> &DataFrame {
        &self.train_data
    }

    pub fn test_data(&self) -> &DataFrame {
        &self.test_data
    }

    /// Consume the dataset, returning `(train, test)`.
    pub fn into_parts(self) -> (DataFrame, DataFrame) {
        (self.train_data, self.test_data)
    }
}

/// Read a CSV file with a header row, inferring types over the whole file.
pub fn read_csv(path: &Path) -> Result<DataFrame> {
    CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(None)
        .try_into_reader_with_file_path(Some(path.to_path_buf()))?
        .finish()
        .context(format!("Failed to read {}", path.display()))
}

/// Fail with `DataSource` unless `path` is a file with the given extension.
///
/// The extension match is case-sensitive.
pub fn check_extension(path: &Path, extension: &str) -> Result<()> {
    if !path.is_file() {
        return Err(ProcessingError::DataSource(format!(
            "{} does not exist or is not a file",
            path.display()
        )));
    }
    let matches = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext == extension);
    if !matches {
        return Err(ProcessingError::DataSource(format!(
            "{} is not a .{} file",
            path.display(),
            extension
        )));
    }
    Ok(())
}

fn extract_splits(archive_path: &Path, target: &Path) -> Result<(PathBuf, PathBuf)> {
    let mut archive = ::zip::ZipArchive::new(File::open(archive_path)?)?;
    let mut train_path = None;
    let mut test_path = None;

    for index in 0..archive.len() {
        let mut entry = archive.by_index(index)?;
        if entry.is_dir() {
            continue;
        }
        let Some(file_name) = Path::new(entry.name())
            .file_name()
            .and_then(|name| name.to_str())
            .map(str::to_string)
        else {
            continue;
        };

        let slot = match file_name.as_str() {
            TRAIN_FILE_NAME => &mut train_path,
            TEST_FILE_NAME => &mut test_path,
            _ => continue,
        };

        let destination = target.join(&file_name);
        let mut output = File::create(&destination)?;
        std::io::copy(&mut entry, &mut output)?;
        *slot = Some(destination);
    }

    match (train_path, test_path) {
        (Some(train), Some(test)) => Ok((train, test)),
        (train, _) => {
            let missing = if train.is_none() {
                TRAIN_FILE_NAME
            } else {
                TEST_FILE_NAME
            };
            Err(ProcessingError::DataSource(format!(
                "{} not found in {}",
                missing,
                archive_path.display()
            )))
        }
    }
}
