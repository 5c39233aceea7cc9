//! Pipeline steps and their fixed order.

use crate::error::{PipelineError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A stage of the training pipeline.
///
/// Variants are declared in execution order, so `Ord` follows the chain
/// `Ingest → Preprocessing → Train → Evaluate → Done`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStep {
    /// Load and validate the train/test splits.
    Ingest,
    /// Fit the cleaner and enricher on train, apply both to test.
    Preprocessing,
    /// Fit the classifier on the processed train split.
    Train,
    /// Score the fitted classifier on the train split.
    Evaluate,
    /// Terminal state; nothing left to run.
    Done,
}

impl PipelineStep {
    /// Every step that does work, in order.
    pub const RUNNABLE: [PipelineStep; 4] = [
        PipelineStep::Ingest,
        PipelineStep::Preprocessing,
        PipelineStep::Train,
        PipelineStep::Evaluate,
    ];

    /// Name used for step folders and on the command line.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ingest => "ingest",
            Self::Preprocessing => "preprocessing",
            Self::Train => "train",
            Self::Evaluate => "evaluate",
            Self::Done => "done",
        }
    }

    /// The step that follows this one. `Done` is its own successor.
    pub fn next(&self) -> PipelineStep {
        match self {
            Self::Ingest => Self::Preprocessing,
            Self::Preprocessing => Self::Train,
            Self::Train => Self::Evaluate,
            Self::Evaluate | Self::Done => Self::Done,
        }
    }

    pub fn is_done(&self) -> bool {
        matches!(self, Self::Done)
    }
}

impl fmt::Display for PipelineStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PipelineStep {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self> {
        Self::RUNNABLE
            .into_iter()
            .find(|step| step.as_str() == s)
            .ok_or_else(|| {
                PipelineError::InvalidOption(format!(
                    "{} is an invalid option for step. Valid options are \"ingest\", \"preprocessing\", \"train\" or \"evaluate\".",
                    s
                ))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chain_order() {
        let mut step = PipelineStep::Ingest;
        let mut visited = vec![step];
        while !step.is_done() {
            step = step.next();
            visited.push(step);
        }
        assert_eq!(
            visited,
            vec![
                PipelineStep::Ingest,
                PipelineStep::Preprocessing,
                PipelineStep::Train,
                PipelineStep::Evaluate,
                PipelineStep::Done,
            ]
        );
        assert!(PipelineStep::Preprocessing > PipelineStep::Ingest);
        assert!(PipelineStep::Done > PipelineStep::Evaluate);
    }

    #[test]
    fn test_parse_step_names() {
        for step in PipelineStep::RUNNABLE {
            assert_eq!(step.as_str().parse::<PipelineStep>().unwrap(), step);
        }

        for bad in ["other", "done", "Train"] {
            let err = bad.parse::<PipelineStep>().unwrap_err();
            assert!(matches!(err, PipelineError::InvalidOption(_)), "{}", bad);
        }
    }

    #[test]
    fn test_serde_names() {
        let json = serde_json::to_string(&PipelineStep::Preprocessing).unwrap();
        assert_eq!(json, "\"preprocessing\"");
    }
}
