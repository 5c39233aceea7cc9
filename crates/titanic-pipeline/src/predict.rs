//! Offline prediction from a trained pipeline checkpoint.

use crate::error::{PipelineError, Result};
use crate::pipeline::{TARGET_COLUMN, TrainModelPipeline};
use polars::prelude::*;
use std::fs::File;
use std::io::{self, Write};
use std::path::Path;
use titanic_processing::dataset::{check_extension, read_csv};
use titanic_processing::{Split, validate_data_schema};
use tracing::info;

/// Predict every row of the CSV at `data_path`.
///
/// Raw rows are validated against the test schema, then cleaned and enriched
/// with the pipeline's fitted transformers. With `processed` set the rows are
/// taken to already hold the model's features.
pub fn predict_file(
    pipeline: &TrainModelPipeline,
    data_path: &Path,
    processed: bool,
) -> Result<DataFrame> {
    check_extension(data_path, "csv")?;
    let data = read_csv(data_path)?;
    info!("Predicting {} rows from {}", data.height(), data_path.display());

    let (data, predictions) = if processed {
        let predictions = pipeline.predict(&data)?;
        (data, predictions)
    } else {
        let data = validate_data_schema(data, Split::Test.as_str())?;
        let predictions = pipeline.transform_predict(&data)?;
        (data, predictions)
    };
    prediction_frame(&data, &predictions)
}

/// Pair the leading (identifier) column of `data` with `predictions`.
pub fn prediction_frame(data: &DataFrame, predictions: &[i64]) -> Result<DataFrame> {
    let Some(ids) = data.get_columns().first() else {
        return Err(PipelineError::InvalidOption(
            "cannot predict a frame without columns".to_string(),
        ));
    };
    let survived = Series::new(TARGET_COLUMN.into(), predictions.to_vec());
    Ok(DataFrame::new(vec![ids.clone(), survived.into()])?)
}

/// Write predictions as CSV with a header, to `output` or to stdout.
pub fn write_predictions(predictions: &mut DataFrame, output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)?;
            }
            let mut file = File::create(path)?;
            write_csv(predictions, &mut file)?;
            info!("Predictions saved: {}", path.display());
        }
        None => {
            let mut stdout = io::stdout().lock();
            write_csv(predictions, &mut stdout)?;
            stdout.flush()?;
        }
    }
    Ok(())
}

fn write_csv<W: Write>(df: &mut DataFrame, writer: &mut W) -> Result<()> {
    CsvWriter::new(writer)
        .include_header(true)
        .with_separator(b',')
        .finish(df)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use titanic_processing::utils::column_names;

    #[test]
    fn test_prediction_frame_uses_leading_column() {
        let data = df![
            "PassengerId" => [892i64, 893],
            "Fare" => [7.8, 7.0],
        ]
        .unwrap();

        let frame = prediction_frame(&data, &[0, 1]).unwrap();
        assert_eq!(column_names(&frame), vec!["PassengerId", "Survived"]);
        assert!(prediction_frame(&DataFrame::empty(), &[]).is_err());
    }

    #[test]
    fn test_write_predictions_to_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out").join("predictions.csv");
        let data = df!["PassengerId" => [892i64, 893]].unwrap();
        let mut frame = prediction_frame(&data, &[0, 1]).unwrap();

        write_predictions(&mut frame, Some(&path)).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text, "PassengerId,Survived\n892,0\n893,1\n");
    }
}
