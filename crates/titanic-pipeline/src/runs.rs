//! Numbered run folders under a base directory.
//!
//! Every pipeline instantiation or resume gets its own `run_<N>` folder, where
//! `N` is one more than the highest existing suffix. Gaps left by deleted runs
//! are never reused. Two pipelines creating runs in the same base folder at
//! the same time may race on the number.

use crate::error::Result;
use crate::step::PipelineStep;
use once_cell::sync::Lazy;
use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

static RUN_FOLDER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^run_(\d+)$").expect("Invalid regex: run folder"));

/// Extension of checkpoint files.
pub const CHECKPOINT_EXTENSION: &str = "ckpt";

/// One `run_<N>` folder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunDirectory {
    path: PathBuf,
    version: u64,
}

impl RunDirectory {
    /// Create the next numbered run folder under `base`, creating `base` if needed.
    pub fn create(base: impl AsRef<Path>) -> Result<Self> {
        let base = base.as_ref();
        fs::create_dir_all(base)?;

        let version = run_versions(base)?
            .into_iter()
            .map(|(version, _)| version)
            .max()
            .map_or(0, |last| last + 1);

        let path = base.join(format!("run_{}", version));
        fs::create_dir_all(&path)?;
        info!("Run directory: {}", path.display());

        Ok(Self { path, version })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    /// `<run>/<step>/<name>.ckpt`
    pub fn checkpoint_path(&self, step: PipelineStep, checkpoint_name: &str) -> PathBuf {
        self.path
            .join(step.as_str())
            .join(format!("{}.{}", checkpoint_name, CHECKPOINT_EXTENSION))
    }
}

/// Numbered run folders directly under `base`, unordered.
fn run_versions(base: &Path) -> Result<Vec<(u64, PathBuf)>> {
    let mut runs = Vec::new();
    for entry in fs::read_dir(base)? {
        let entry = entry?;
        if !entry.file_type()?.is_dir() {
            continue;
        }
        let name = entry.file_name();
        let Some(name) = name.to_str() else {
            continue;
        };
        let Some(version) = RUN_FOLDER
            .captures(name)
            .and_then(|caps| caps[1].parse::<u64>().ok())
        else {
            debug!("Ignoring non-run folder: {}", name);
            continue;
        };
        runs.push((version, entry.path()));
    }
    Ok(runs)
}

/// Newest `run_<N>/evaluate/<name>.ckpt` under `base`, searching runs from the
/// highest number down.
pub fn find_latest_checkpoint(
    base: impl AsRef<Path>,
    checkpoint_name: &str,
) -> Result<Option<PathBuf>> {
    let base = base.as_ref();
    if !base.is_dir() {
        return Ok(None);
    }

    let mut runs = run_versions(base)?;
    runs.sort_by(|a, b| b.0.cmp(&a.0));

    let file_name = format!("{}.{}", checkpoint_name, CHECKPOINT_EXTENSION);
    Ok(runs
        .into_iter()
        .map(|(_, path)| path.join(PipelineStep::Evaluate.as_str()).join(&file_name))
        .find(|candidate| candidate.is_file()))
}
