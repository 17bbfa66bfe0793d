//! Planned and completed transfers.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// One planned transfer, before conflict resolution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferPair {
    /// Absolute path of the matched source file.
    pub source_path: PathBuf,
    /// Where the file would land if nothing is in the way.
    pub planned_destination: PathBuf,
}

impl TransferPair {
    /// Create a new transfer pair.
    pub fn new(source_path: impl Into<PathBuf>, planned_destination: impl Into<PathBuf>) -> Self {
        Self {
            source_path: source_path.into(),
            planned_destination: planned_destination.into(),
        }
    }
}

/// A transfer that completed successfully.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferOutcome {
    /// Absolute path of the source file.
    pub source_path: PathBuf,
    /// The path actually written. Differs from the planned one under rename.
    #[serde(rename = "path")]
    pub final_destination: PathBuf,
    /// Bytes written to the destination.
    #[serde(default)]
    pub bytes: u64,
}

impl TransferOutcome {
    /// Create a new outcome.
    pub fn new(
        source_path: impl Into<PathBuf>,
        final_destination: impl Into<PathBuf>,
        bytes: u64,
    ) -> Self {
        Self {
            source_path: source_path.into(),
            final_destination: final_destination.into(),
            bytes,
        }
    }
}

/// Total bytes across a list of outcomes.
pub fn total_bytes(outcomes: &[TransferOutcome]) -> u64 {
    outcomes.iter().map(|o| o.bytes).sum()
}
