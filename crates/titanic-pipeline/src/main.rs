//! CLI entry point for the Titanic training pipeline.

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use titanic_pipeline::config::DEFAULT_CKPT_NAME;
use titanic_pipeline::{
    PipelineStep, TrainConfig, TrainModelPipeline, find_latest_checkpoint, predict_file,
    write_predictions,
};
use tracing::{error, info};

const DEFAULT_CONFIG_FILE_PATH: &str = "./titanic_train.yaml";
const DEFAULT_RUNS_FOLDER: &str = "./runs";

#[derive(Parser, Debug)]
#[command(
    version,
    about = "Checkpointed training pipeline for the Titanic survival dataset",
    long_about = "Train, resume and apply a random forest survival classifier.\n\n\
                  EXAMPLES:\n  \
                  # Run the whole pipeline\n  \
                  titanic-train run --config-file titanic_train.yaml\n\n  \
                  # Retrain from a checkpoint with the current config\n  \
                  titanic-train resume --ckpt-file runs/run_0/evaluate/train_pipeline.ckpt --step train\n\n  \
                  # Predict raw test rows with the newest trained checkpoint\n  \
                  titanic-train predict data/test.csv --output-path predictions.csv"
)]
struct Cli {
    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info", global = true)]
    log_level: String,

    /// Only show warnings and errors
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the whole training pipeline
    Run {
        /// Path to config file
        #[arg(long, default_value = DEFAULT_CONFIG_FILE_PATH)]
        config_file: PathBuf,
    },

    /// Resume the training pipeline from a checkpoint
    ///
    /// By default the config file is read again and replaces the
    /// checkpoint's configuration before resuming.
    Resume {
        /// Path to checkpoint file
        #[arg(long)]
        ckpt_file: PathBuf,

        /// Keep the configuration stored in the checkpoint
        #[arg(long)]
        no_reload_configs: bool,

        /// Path to config file
        #[arg(long, default_value = DEFAULT_CONFIG_FILE_PATH)]
        config_file: PathBuf,

        /// Step to resume from (ingest, preprocessing, train, evaluate)
        ///
        /// Defaults to the step stored in the checkpoint.
        #[arg(long)]
        step: Option<String>,

        /// Apply a reloaded config even if it conflicts with finished steps
        #[arg(long)]
        force: bool,
    },

    /// Use a previously trained pipeline to make predictions on new data
    Predict {
        /// CSV file with the rows to predict
        data_path: PathBuf,

        /// The data is already preprocessed rather than raw
        #[arg(long)]
        processed: bool,

        /// Where to save the predictions (stdout if omitted)
        #[arg(long)]
        output_path: Option<PathBuf>,

        /// Pipeline checkpoint (newest evaluate checkpoint under ./runs if omitted)
        #[arg(long)]
        pipeline_ckpt: Option<PathBuf>,
    },
}

/// Initialize the tracing subscriber for logging.
fn init_logging(level: &str, quiet: bool) {
    use tracing_subscriber::EnvFilter;

    let effective_level = if quiet { "warn" } else { level };

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(effective_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(&cli.log_level, cli.quiet);

    let outcome = match cli.command {
        Command::Run { config_file } => run(&config_file),
        Command::Resume {
            ckpt_file,
            no_reload_configs,
            config_file,
            step,
            force,
        } => resume(
            &ckpt_file,
            (!no_reload_configs).then_some(config_file.as_path()),
            step.as_deref(),
            force,
        ),
        Command::Predict {
            data_path,
            processed,
            output_path,
            pipeline_ckpt,
        } => predict(
            &data_path,
            processed,
            output_path.as_deref(),
            pipeline_ckpt.as_deref(),
        ),
    };

    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("Failed: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(config_file: &Path) -> Result<()> {
    let config = TrainConfig::from_yaml_file(config_file)?;
    let mut pipeline = TrainModelPipeline::new(config)?;
    pipeline.run()?;

    print_evaluation(&pipeline);
    info!("Pipeline completed successfully");
    Ok(())
}

fn resume(
    ckpt_file: &Path,
    config_file: Option<&Path>,
    step: Option<&str>,
    force: bool,
) -> Result<()> {
    let step = step.map(str::parse::<PipelineStep>).transpose()?;
    let mut pipeline = TrainModelPipeline::load(ckpt_file)?;

    if let Some(config_file) = config_file {
        let config = TrainConfig::from_yaml_file(config_file)?;
        let from = step.unwrap_or(pipeline.next_step());
        pipeline
            .reload_config(config, from, force)
            .context("Pass --force to apply the config anyway, or --no-reload-configs to keep the checkpoint's")?;
    }

    pipeline.resume(step)?;

    print_evaluation(&pipeline);
    info!("Pipeline resumed successfully");
    Ok(())
}

fn predict(
    data_path: &Path,
    processed: bool,
    output_path: Option<&Path>,
    pipeline_ckpt: Option<&Path>,
) -> Result<()> {
    let ckpt = match pipeline_ckpt {
        Some(path) => path.to_path_buf(),
        None => match find_latest_checkpoint(DEFAULT_RUNS_FOLDER, DEFAULT_CKPT_NAME)? {
            Some(path) => path,
            None => bail!(
                "No trained checkpoint found under {}; pass --pipeline-ckpt",
                DEFAULT_RUNS_FOLDER
            ),
        },
    };
    info!("Using checkpoint: {}", ckpt.display());

    let pipeline = TrainModelPipeline::load(&ckpt)?;
    let mut predictions = predict_file(&pipeline, data_path, processed)?;
    write_predictions(&mut predictions, output_path)?;
    Ok(())
}

/// Print the evaluation report to stdout, where it is always visible.
fn print_evaluation(pipeline: &TrainModelPipeline) {
    if let Some(report) = pipeline.evaluation() {
        println!("\nEvaluation Metrics\n");
        println!("{}", report);
    }
}
