//! Versioned JSON checkpoint files.
//!
//! A checkpoint wraps a state in an envelope carrying the format version and
//! the time it was written. Files are written next to their destination and
//! renamed into place, so a crash never leaves a half-written checkpoint under
//! the final name.

use crate::error::{PipelineError, Result};
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;
use tracing::debug;

/// Version written into every new checkpoint.
pub const FORMAT_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
pub struct Envelope<S> {
    pub format_version: u32,
    pub created_at: DateTime<Utc>,
    pub state: S,
}

#[derive(Deserialize)]
struct Header {
    format_version: u32,
}

/// Write `state` to `path`, creating parent folders as needed.
pub fn save<S: Serialize>(path: &Path, state: &S) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let envelope = Envelope {
        format_version: FORMAT_VERSION,
        created_at: Utc::now(),
        state,
    };

    let mut tmp_name = path.as_os_str().to_owned();
    tmp_name.push(".tmp");
    let tmp_path = Path::new(&tmp_name);

    let mut writer = BufWriter::new(File::create(tmp_path)?);
    serde_json::to_writer(&mut writer, &envelope)?;
    writer.flush()?;
    drop(writer);

    fs::rename(tmp_path, path)?;
    debug!("Checkpoint written: {}", path.display());
    Ok(())
}

/// Read a checkpoint written by [`save`].
///
/// # Errors
///
/// Returns [`PipelineError::Checkpoint`] if the file is missing or was written
/// with a different format version.
pub fn load<S: DeserializeOwned>(path: &Path) -> Result<Envelope<S>> {
    if !path.is_file() {
        return Err(PipelineError::Checkpoint(format!(
            "There is no file in the specified path: {}",
            path.display()
        )));
    }

    let header: Header = serde_json::from_reader(BufReader::new(File::open(path)?))
        .map_err(|e| PipelineError::Checkpoint(format!("{} is not a checkpoint: {}", path.display(), e)))?;
    if header.format_version != FORMAT_VERSION {
        return Err(PipelineError::Checkpoint(format!(
            "{} has format version {}, expected {}",
            path.display(),
            header.format_version,
            FORMAT_VERSION
        )));
    }

    let envelope = serde_json::from_reader(BufReader::new(File::open(path)?))?;
    Ok(envelope)
}
