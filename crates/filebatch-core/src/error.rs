//! Error types for batch transfers.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can end a copy or move batch.
#[derive(Debug, Error)]
pub enum TransferError {
    /// Source directory does not exist or cannot be read.
    #[error("Directory not found: {path}")]
    DirectoryNotFound { path: PathBuf },

    /// The glob pattern could not be compiled.
    #[error("Invalid pattern '{pattern}': {message}")]
    InvalidPattern { pattern: String, message: String },

    /// Target directory is absent and creating it was not allowed.
    #[error("Target directory does not exist: {path}")]
    TargetDirectoryMissing { path: PathBuf },

    /// Planned destinations collide with each other or with existing files.
    #[error("{}", conflict_message(.duplicates, .existing, .operation))]
    Conflict {
        /// Destinations planned for more than one source.
        duplicates: Vec<PathBuf>,
        /// Destinations that already exist on disk.
        existing: Vec<PathBuf>,
        /// Past-tense verb for the batch, e.g. "copied".
        operation: &'static str,
    },

    /// Overwriting would delete files this batch still has to read.
    #[error(
        "Destination(s) are source files of this batch and would be overwritten: {}. No files {operation}.",
        join_paths(.paths)
    )]
    OverwritesSource {
        paths: Vec<PathBuf>,
        /// Past-tense verb for the batch, e.g. "copied".
        operation: &'static str,
    },

    /// The transfer primitive failed for one file.
    #[error("Failed to transfer {} to {}: {source}", .source_path.display(), .destination.display())]
    Transfer {
        source_path: PathBuf,
        destination: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Generic I/O error while preparing a destination.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Every numeric suffix for a renamed destination is taken.
    #[error("No free name left for {path}")]
    RenameExhausted { path: PathBuf },

    /// The batch was cancelled.
    #[error("Operation cancelled")]
    Cancelled,
}

fn conflict_message(duplicates: &[PathBuf], existing: &[PathBuf], operation: &str) -> String {
    let mut parts = Vec::new();
    if !duplicates.is_empty() {
        parts.push(format!(
            "Multiple files written to {}. The files would get overwritten.",
            join_paths(duplicates)
        ));
    }
    if !existing.is_empty() {
        parts.push(format!("File(s) already exist: {}.", join_paths(existing)));
    }
    parts.push(format!("No files {operation}."));
    parts.join(" ")
}

fn join_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

impl TransferError {
    /// Create an I/O error with path context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        match source.kind() {
            std::io::ErrorKind::NotFound => Self::DirectoryNotFound { path },
            _ => Self::Io { path, source },
        }
    }

    /// Create a transfer primitive error.
    pub fn transfer(
        source_path: impl Into<PathBuf>,
        destination: impl Into<PathBuf>,
        source: std::io::Error,
    ) -> Self {
        Self::Transfer {
            source_path: source_path.into(),
            destination: destination.into(),
            source,
        }
    }

    /// Every path named by a conflict error.
    pub fn conflicting_paths(&self) -> Vec<&PathBuf> {
        match self {
            Self::Conflict {
                duplicates,
                existing,
                ..
            } => duplicates.iter().chain(existing).collect(),
            Self::OverwritesSource { paths, .. } => paths.iter().collect(),
            _ => Vec::new(),
        }
    }

    /// Check whether the batch stopped because it was cancelled.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    /// Check whether the error was raised before anything was written.
    pub fn is_preflight(&self) -> bool {
        matches!(
            self,
            Self::DirectoryNotFound { .. }
                | Self::InvalidPattern { .. }
                | Self::TargetDirectoryMissing { .. }
                | Self::Conflict { .. }
                | Self::OverwritesSource { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transfer_error_io() {
        let err = TransferError::io(
            "/test/path",
            std::io::Error::new(std::io::ErrorKind::NotFound, "missing"),
        );
        assert!(matches!(err, TransferError::DirectoryNotFound { .. }));

        let err = TransferError::io(
            "/test/path",
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        );
        assert!(matches!(err, TransferError::Io { .. }));
    }

    #[test]
    fn test_conflict_message_lists_every_path() {
        let err = TransferError::Conflict {
            duplicates: Vec::new(),
            existing: vec![PathBuf::from("/out/a.txt"), PathBuf::from("/out/b.txt")],
            operation: "copied",
        };
        let message = err.to_string();
        assert!(message.contains("/out/a.txt"));
        assert!(message.contains("/out/b.txt"));
        assert!(message.ends_with("No files copied."));
        assert_eq!(err.conflicting_paths().len(), 2);
        assert!(err.is_preflight());
    }

    #[test]
    fn test_duplicate_conflict_message() {
        let err = TransferError::Conflict {
            duplicates: vec![PathBuf::from("/out/test.txt")],
            existing: vec![PathBuf::from("/out/other.txt")],
            operation: "moved",
        };
        let message = err.to_string();
        assert!(message.starts_with("Multiple files written to /out/test.txt"));
        assert!(message.contains("already exist: /out/other.txt"));
        assert!(message.ends_with("No files moved."));
    }

    #[test]
    fn test_overwrites_source_message() {
        let err = TransferError::OverwritesSource {
            paths: vec![PathBuf::from("/data/a.txt")],
            operation: "copied",
        };
        let message = err.to_string();
        assert!(message.contains("/data/a.txt"));
        assert!(message.ends_with("No files copied."));
        assert_eq!(err.conflicting_paths(), vec![&PathBuf::from("/data/a.txt")]);
        assert!(err.is_preflight());
    }

    #[test]
    fn test_cancelled() {
        assert!(TransferError::Cancelled.is_cancelled());
        assert!(!TransferError::Cancelled.is_preflight());
    }
}
