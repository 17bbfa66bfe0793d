//! Progress reporting types for batch transfers.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use filebatch_core::{TransferError, TransferOutcome};

/// The kind of batch being run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationType {
    Copy,
    Move,
}

impl OperationType {
    /// Past-tense verb used in messages, e.g. "No files copied."
    pub fn past_tense(&self) -> &'static str {
        match self {
            Self::Copy => "copied",
            Self::Move => "moved",
        }
    }
}

impl std::fmt::Display for OperationType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Copy => write!(f, "Copy"),
            Self::Move => write!(f, "Move"),
        }
    }
}

/// Progress information for a running batch.
#[derive(Debug, Clone)]
pub struct TransferProgress {
    /// The type of operation.
    pub operation: OperationType,
    /// Number of files transferred so far.
    pub files_completed: usize,
    /// Number of files planned.
    pub files_total: usize,
    /// Number of bytes written so far.
    pub bytes_processed: u64,
    /// The source file currently being transferred.
    pub current_file: Option<PathBuf>,
}

impl TransferProgress {
    /// Create a new progress tracker for a batch.
    pub fn new(operation: OperationType, files_total: usize) -> Self {
        Self {
            operation,
            files_completed: 0,
            files_total,
            bytes_processed: 0,
            current_file: None,
        }
    }

    /// Get the progress as a percentage (0.0 to 100.0).
    pub fn percentage(&self) -> f64 {
        if self.files_total > 0 {
            (self.files_completed as f64 / self.files_total as f64) * 100.0
        } else {
            0.0
        }
    }

    /// Update the current file being processed.
    pub fn set_current_file(&mut self, path: Option<PathBuf>) {
        self.current_file = path;
    }

    /// Increment the completed count and add bytes.
    pub fn complete_file(&mut self, bytes: u64) {
        self.files_completed += 1;
        self.bytes_processed += bytes;
    }
}

/// Event sent through the channel of a spawned batch.
#[derive(Debug)]
pub enum BatchEvent {
    /// Progress update.
    Progress(TransferProgress),
    /// The batch finished. Always the last event.
    Complete(Result<Vec<TransferOutcome>, TransferError>),
}

/// Get a human-readable summary of a finished batch.
pub fn summary(operation: OperationType, outcomes: &[TransferOutcome]) -> String {
    let action = match operation {
        OperationType::Copy => "Copied",
        OperationType::Move => "Moved",
    };
    let noun = if outcomes.len() == 1 { "file" } else { "files" };
    format!("{} {} {}", action, outcomes.len(), noun)
}
