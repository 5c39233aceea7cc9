//! End-to-end tests for running, checkpointing and resuming the pipeline.

use pretty_assertions::assert_eq;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use titanic_learning::TrainerConfig;
use titanic_pipeline::{
    DataSource, PipelineError, PipelineStep, TrainConfig, TrainModelPipeline, predict_file,
};
use titanic_processing::utils::{f64_values, i64_values};
use zip::write::SimpleFileOptions;

// ============================================================================
// Helper Functions
// ============================================================================

fn fixtures_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

fn file_source() -> DataSource {
    DataSource::Files {
        train_path: fixtures_path().join("train.csv"),
        test_path: fixtures_path().join("test.csv"),
    }
}

fn trainer_args(n_estimators: usize) -> TrainerConfig {
    TrainerConfig::builder()
        .n_estimators(n_estimators)
        .max_depth(4)
        .build()
        .unwrap()
}

fn config(runs: &Path) -> TrainConfig {
    TrainConfig::new(file_source())
        .with_base_runs_folder(runs)
        .with_trainer_args(trainer_args(10))
}

/// Config over the three-passenger train split and `test_small.csv`.
fn small_config(runs: &Path, train_path: PathBuf) -> TrainConfig {
    TrainConfig::new(DataSource::Files {
        train_path,
        test_path: fixtures_path().join("test_small.csv"),
    })
    .with_base_runs_folder(runs)
    .with_trainer_args(trainer_args(10))
}

fn write_archive(dir: &Path) -> PathBuf {
    let path = dir.join("titanic.zip");
    let mut writer = zip::ZipWriter::new(File::create(&path).unwrap());
    for name in ["train.csv", "test.csv"] {
        let content = fs::read(fixtures_path().join(name)).unwrap();
        writer
            .start_file(format!("titanic/{}", name), SimpleFileOptions::default())
            .unwrap();
        writer.write_all(&content).unwrap();
    }
    writer.finish().unwrap();
    path
}

/// Run the full pipeline once and return it with the path of its evaluate checkpoint.
fn finished_pipeline(runs: &Path) -> (TrainModelPipeline, PathBuf) {
    let mut pipeline = TrainModelPipeline::new(config(runs)).unwrap();
    pipeline.run().unwrap();
    let ckpt = pipeline
        .run_dir()
        .unwrap()
        .checkpoint_path(PipelineStep::Evaluate, "train_pipeline");
    (pipeline, ckpt)
}

fn step_folders(run: &Path) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(run)
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().to_string())
        .collect();
    names.sort();
    names
}

// ============================================================================
// Full runs
// ============================================================================

#[test]
fn test_run_writes_one_checkpoint_per_step() {
    let dir = TempDir::new().unwrap();
    let runs = dir.path().join("runs");
    let (pipeline, _) = finished_pipeline(&runs);

    assert_eq!(pipeline.next_step(), PipelineStep::Done);
    let run = runs.join("run_0");
    assert_eq!(
        step_folders(&run),
        vec!["evaluate", "ingest", "preprocessing", "train"]
    );
    for step in PipelineStep::RUNNABLE {
        let files: Vec<_> = fs::read_dir(run.join(step.as_str())).unwrap().collect();
        assert_eq!(files.len(), 1, "{}", step);
        assert!(run.join(step.as_str()).join("train_pipeline.ckpt").is_file());
    }

    let report = pipeline.evaluation().unwrap();
    assert_eq!(report.support, 10);
    assert!(report.accuracy > 0.5);

    let test = pipeline.test_data().unwrap();
    assert_eq!(test.height(), 6);
    assert!(test.column("PassengerId").is_err());
}

#[test]
fn test_run_from_archive_and_yaml() {
    let dir = TempDir::new().unwrap();
    let archive = write_archive(dir.path());
    let yaml_path = dir.path().join("titanic_train.yaml");
    fs::write(
        &yaml_path,
        format!(
            "data_zip: {}\nbase_runs_folder: {}\nmodel_ckpt_name: titanic\ntrainer_args:\n  n_estimators: 5\n",
            archive.display(),
            dir.path().join("runs").display()
        ),
    )
    .unwrap();

    let config = TrainConfig::from_yaml_file(&yaml_path).unwrap();
    let mut pipeline = TrainModelPipeline::new(config).unwrap();
    pipeline.run().unwrap();

    assert!(
        dir.path()
            .join("runs/run_0/evaluate/titanic.ckpt")
            .is_file()
    );
    assert_eq!(
        pipeline.trainer().unwrap().model().unwrap().n_trees(),
        5
    );
}

#[test]
fn test_runs_are_deterministic() {
    let dir = TempDir::new().unwrap();
    let (first, _) = finished_pipeline(&dir.path().join("a"));
    let (second, _) = finished_pipeline(&dir.path().join("b"));

    assert_eq!(first.trainer(), second.trainer());
    assert_eq!(first.evaluation(), second.evaluation());
}

#[test]
fn test_small_dataset_runs_and_resumes_without_refitting() {
    let dir = TempDir::new().unwrap();
    let runs = dir.path().join("runs");
    let config = small_config(&runs, fixtures_path().join("train_small.csv"));
    let mut pipeline = TrainModelPipeline::new(config).unwrap();
    pipeline.run().unwrap();

    let run = runs.join("run_0");
    assert_eq!(
        step_folders(&run),
        vec!["evaluate", "ingest", "preprocessing", "train"]
    );
    for step in PipelineStep::RUNNABLE {
        let files: Vec<_> = fs::read_dir(run.join(step.as_str())).unwrap().collect();
        assert_eq!(files.len(), 1, "{}", step);
    }
    assert_eq!(pipeline.evaluation().unwrap().support, 3);

    let mut resumed = TrainModelPipeline::load(run.join("train/train_pipeline.ckpt")).unwrap();
    assert_eq!(resumed.next_step(), PipelineStep::Train);
    resumed.resume(None).unwrap();
    assert_eq!(resumed.next_step(), PipelineStep::Done);
    assert_eq!(resumed.cleaner(), pipeline.cleaner());
    assert_eq!(resumed.enricher(), pipeline.enricher());
    assert_eq!(resumed.evaluation(), pipeline.evaluation());
    assert_eq!(
        step_folders(&runs.join("run_1")),
        vec!["evaluate", "train"]
    );

    let mut evaluated =
        TrainModelPipeline::load(run.join("evaluate/train_pipeline.ckpt")).unwrap();
    let trainer = evaluated.trainer().cloned();
    evaluated.resume(None).unwrap();
    assert_eq!(evaluated.trainer().cloned(), trainer);
    assert_eq!(evaluated.evaluation(), pipeline.evaluation());
    assert_eq!(step_folders(&runs.join("run_2")), vec!["evaluate"]);

    let predictions =
        predict_file(&evaluated, &fixtures_path().join("test_small.csv"), false).unwrap();
    assert_eq!(
        i64_values(&predictions, "PassengerId").unwrap(),
        vec![Some(892), Some(893), Some(894)]
    );
}

#[test]
fn test_nan_ages_are_imputed_and_checkpoints_reload() {
    let dir = TempDir::new().unwrap();
    let train = fs::read_to_string(fixtures_path().join("train_small.csv"))
        .unwrap()
        .replace("female,26,", "female,NaN,");
    let train_path = dir.path().join("train.csv");
    fs::write(&train_path, train).unwrap();

    let runs = dir.path().join("runs");
    let mut pipeline = TrainModelPipeline::new(small_config(&runs, train_path)).unwrap();
    pipeline.run().unwrap();
    assert_eq!(pipeline.enricher().params().unwrap().age_fallback, 30.0);

    for step in PipelineStep::RUNNABLE {
        let ckpt = runs
            .join("run_0")
            .join(step.as_str())
            .join("train_pipeline.ckpt");
        assert!(TrainModelPipeline::load(&ckpt).is_ok(), "{}", step);
    }

    let restored = TrainModelPipeline::load(runs.join("run_0/evaluate/train_pipeline.ckpt")).unwrap();
    assert_eq!(restored.enricher(), pipeline.enricher());
    let train_data = restored.train_data().unwrap();
    assert_eq!(
        i64_values(train_data, "Age_Null_Flag").unwrap(),
        vec![Some(0), Some(0), Some(1)]
    );
    assert_eq!(f64_values(train_data, "Age").unwrap()[2], Some(30.0));
}

// ============================================================================
// Checkpoints
// ============================================================================

#[test]
fn test_checkpoint_restores_frames_params_and_predictions() {
    let dir = TempDir::new().unwrap();
    let (pipeline, ckpt) = finished_pipeline(&dir.path().join("runs"));

    let restored = TrainModelPipeline::load(&ckpt).unwrap();
    assert_eq!(restored.next_step(), PipelineStep::Evaluate);
    assert!(restored.run_dir().is_none());
    assert_eq!(restored.cleaner(), pipeline.cleaner());
    assert_eq!(restored.enricher(), pipeline.enricher());
    assert_eq!(restored.trainer(), pipeline.trainer());
    assert!(
        restored
            .train_data()
            .unwrap()
            .equals_missing(pipeline.train_data().unwrap())
    );

    let test = pipeline.test_data().unwrap();
    assert_eq!(
        restored.predict(test).unwrap(),
        pipeline.predict(test).unwrap()
    );
}

#[test]
fn test_unknown_checkpoint_version_is_rejected() {
    let dir = TempDir::new().unwrap();
    let (_, ckpt) = finished_pipeline(&dir.path().join("runs"));

    let contents = fs::read_to_string(&ckpt).unwrap();
    assert!(contents.starts_with("{\"format_version\":1,"));
    fs::write(&ckpt, contents.replacen("\"format_version\":1,", "\"format_version\":7,", 1)).unwrap();

    let err = TrainModelPipeline::load(&ckpt).unwrap_err();
    assert!(matches!(err, PipelineError::Checkpoint(_)));
}

#[test]
fn test_load_rejects_wrong_extension() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("pipeline.json");
    fs::write(&path, "{}").unwrap();

    let err = TrainModelPipeline::load(&path).unwrap_err();
    assert_eq!(err.error_code(), "CHECKPOINT");
    assert!(err.to_string().contains(".ckpt"));
}

// ============================================================================
// Resume
// ============================================================================

#[test]
fn test_resume_from_preprocessing_reproduces_the_run() {
    let dir = TempDir::new().unwrap();
    let runs = dir.path().join("runs");
    let (pipeline, _) = finished_pipeline(&runs);

    let ckpt = runs.join("run_0/preprocessing/train_pipeline.ckpt");
    let mut resumed = TrainModelPipeline::load(&ckpt).unwrap();
    assert_eq!(resumed.next_step(), PipelineStep::Preprocessing);
    resumed.resume(None).unwrap();

    assert_eq!(resumed.run_dir().unwrap().version(), 1);
    assert_eq!(
        step_folders(&runs.join("run_1")),
        vec!["evaluate", "preprocessing", "train"]
    );
    assert_eq!(resumed.enricher(), pipeline.enricher());
    assert_eq!(resumed.evaluation(), pipeline.evaluation());
}

#[test]
fn test_resume_train_with_new_hyperparameters() {
    let dir = TempDir::new().unwrap();
    let runs = dir.path().join("runs");
    let (pipeline, ckpt) = finished_pipeline(&runs);

    let mut resumed = TrainModelPipeline::load(&ckpt).unwrap();
    let retuned = config(&runs).with_trainer_args(trainer_args(3));
    resumed
        .reload_config(retuned.clone(), PipelineStep::Train, false)
        .unwrap();
    resumed.resume(Some(PipelineStep::Train)).unwrap();

    assert_eq!(resumed.config(), &retuned);
    assert_eq!(resumed.cleaner(), pipeline.cleaner());
    assert_eq!(resumed.enricher(), pipeline.enricher());
    assert_eq!(
        resumed.trainer().unwrap().model().unwrap().n_trees(),
        3
    );
    assert!(resumed.evaluation().is_some());
    assert_eq!(
        step_folders(&runs.join("run_1")),
        vec!["evaluate", "train"]
    );
}

#[test]
fn test_stale_config_is_rejected_unless_forced() {
    let dir = TempDir::new().unwrap();
    let runs = dir.path().join("runs");
    let (_, ckpt) = finished_pipeline(&runs);
    let mut resumed = TrainModelPipeline::load(&ckpt).unwrap();

    let moved_data = TrainConfig {
        data_source: DataSource::Archive(dir.path().join("other.zip")),
        ..config(&runs)
    };
    let err = resumed
        .reload_config(moved_data.clone(), PipelineStep::Train, false)
        .unwrap_err();
    match err {
        PipelineError::StaleConfig(conflicts) => {
            assert_eq!(conflicts.len(), 1);
            assert!(conflicts[0].contains("data source"));
        }
        other => panic!("expected StaleConfig, got {:?}", other),
    }
    assert_eq!(resumed.config(), &config(&runs));

    let retuned = config(&runs).with_trainer_args(trainer_args(4));
    assert!(
        resumed
            .reload_config(retuned, resumed.next_step(), false)
            .unwrap_err()
            .is_stale_config()
    );

    resumed
        .reload_config(moved_data.clone(), PipelineStep::Train, true)
        .unwrap();
    assert_eq!(resumed.config(), &moved_data);
    // the moved source is never read when resuming past ingest
    resumed.resume(Some(PipelineStep::Train)).unwrap();
}

#[test]
fn test_resume_done_is_a_no_op() {
    let dir = TempDir::new().unwrap();
    let runs = dir.path().join("runs");
    let (mut pipeline, _) = finished_pipeline(&runs);
    let trainer = pipeline.trainer().cloned();

    pipeline.resume(None).unwrap();
    assert_eq!(pipeline.next_step(), PipelineStep::Done);
    assert_eq!(pipeline.trainer().cloned(), trainer);
    assert!(step_folders(&runs.join("run_1")).is_empty());
}

#[test]
fn test_resume_rejects_unknown_step_and_missing_prerequisites() {
    let err = "other".parse::<PipelineStep>().unwrap_err();
    assert!(matches!(err, PipelineError::InvalidOption(_)));

    let dir = TempDir::new().unwrap();
    let runs = dir.path().join("runs");
    finished_pipeline(&runs);

    let ingest_ckpt = runs.join("run_0/ingest/train_pipeline.ckpt");
    let mut pipeline = TrainModelPipeline::load(&ingest_ckpt).unwrap();
    let err = pipeline.resume(Some(PipelineStep::Train)).unwrap_err();
    assert!(matches!(err, PipelineError::InvalidOption(_)));

    let evaluate_ckpt = runs.join("run_0/evaluate/train_pipeline.ckpt");
    let mut pipeline = TrainModelPipeline::load(&evaluate_ckpt).unwrap();
    let err = pipeline
        .resume(Some(PipelineStep::Preprocessing))
        .unwrap_err();
    assert!(matches!(err, PipelineError::InvalidOption(_)));
}

// ============================================================================
// Prediction
// ============================================================================

#[test]
fn test_transform_predict_matches_processed_predict() {
    let dir = TempDir::new().unwrap();
    let (pipeline, _) = finished_pipeline(&dir.path().join("runs"));

    let raw = predict_file(&pipeline, &fixtures_path().join("test.csv"), false).unwrap();
    assert_eq!(raw.height(), 6);
    let ids: Vec<Option<i64>> = raw
        .column("PassengerId")
        .unwrap()
        .as_materialized_series()
        .i64()
        .unwrap()
        .into_iter()
        .collect();
    assert_eq!(ids, (892..=897).map(Some).collect::<Vec<_>>());

    let predicted: Vec<Option<i64>> = raw
        .column("Survived")
        .unwrap()
        .as_materialized_series()
        .i64()
        .unwrap()
        .into_iter()
        .collect();
    let expected = pipeline.predict(pipeline.test_data().unwrap()).unwrap();
    assert_eq!(predicted, expected.into_iter().map(Some).collect::<Vec<_>>());
}

#[test]
fn test_predict_rejects_non_csv() {
    let dir = TempDir::new().unwrap();
    let (pipeline, _) = finished_pipeline(&dir.path().join("runs"));

    let err = predict_file(&pipeline, &dir.path().join("rows.txt"), false).unwrap_err();
    assert_eq!(err.error_code(), "DATA_SOURCE");
}
