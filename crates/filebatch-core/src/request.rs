//! Batch transfer request configuration.

use std::path::{Path, PathBuf};

use derive_builder::Builder;
use serde::{Deserialize, Serialize};

/// What to do when a planned destination file already exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ConflictPolicy {
    /// Refuse the whole batch before anything is written.
    #[default]
    Fail,
    /// Delete the existing file and write over it.
    Overwrite,
    /// Write next to it as `name(N).ext`.
    Rename,
}

impl std::fmt::Display for ConflictPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Fail => write!(f, "fail"),
            Self::Overwrite => write!(f, "overwrite"),
            Self::Rename => write!(f, "rename"),
        }
    }
}

/// Immutable configuration for one copy or move batch.
#[derive(Debug, Clone, PartialEq, Eq, Builder, Serialize, Deserialize)]
#[builder(setter(into), build_fn(validate = "Self::validate"))]
pub struct TransferRequest {
    /// Root directory where pattern matching starts.
    pub source_directory: PathBuf,

    /// Glob pattern (`*`, `**` and literal segments) relative to the source directory.
    pub pattern: String,

    /// Directory the matched files are written into.
    pub target_directory: PathBuf,

    /// Reproduce the matched file's relative subdirectories under the target.
    #[builder(default = "false")]
    #[serde(default)]
    pub preserve_structure: bool,

    /// Create the target directory (and subdirectories) when missing.
    #[builder(default = "true")]
    #[serde(default = "default_true")]
    pub create_target_directories: bool,

    /// Conflict resolution policy.
    #[builder(default)]
    #[serde(default)]
    pub on_conflict: ConflictPolicy,
}

fn default_true() -> bool {
    true
}

impl TransferRequestBuilder {
    fn validate(&self) -> Result<(), String> {
        validate_directory("Source directory", self.source_directory.as_deref())?;
        validate_directory("Target directory", self.target_directory.as_deref())?;

        match self.pattern {
            Some(ref pattern) if pattern.trim().is_empty() => {
                Err("Pattern cannot be empty".to_string())
            }
            Some(_) => Ok(()),
            None => Err("Pattern is required".to_string()),
        }
    }
}

fn validate_directory(label: &str, path: Option<&Path>) -> Result<(), String> {
    let Some(path) = path else {
        return Err(format!("{label} is required"));
    };
    if path.as_os_str().is_empty() {
        return Err(format!("{label} cannot be empty"));
    }
    if !path.is_absolute() {
        return Err(format!("{label} must be absolute: {}", path.display()));
    }
    Ok(())
}

impl TransferRequest {
    /// Create a new request builder.
    pub fn builder() -> TransferRequestBuilder {
        TransferRequestBuilder::default()
    }

    /// Create a request with default options.
    pub fn new(
        source_directory: impl Into<PathBuf>,
        pattern: impl Into<String>,
        target_directory: impl Into<PathBuf>,
    ) -> Self {
        Self {
            source_directory: source_directory.into(),
            pattern: pattern.into(),
            target_directory: target_directory.into(),
            preserve_structure: false,
            create_target_directories: true,
            on_conflict: ConflictPolicy::Fail,
        }
    }

    /// Set the conflict policy.
    pub fn with_conflict_policy(mut self, policy: ConflictPolicy) -> Self {
        self.on_conflict = policy;
        self
    }

    /// Set whether relative directory structure is preserved.
    pub fn with_preserve_structure(mut self, preserve: bool) -> Self {
        self.preserve_structure = preserve;
        self
    }

    /// Set whether missing target directories are created.
    pub fn with_create_target_directories(mut self, create: bool) -> Self {
        self.create_target_directories = create;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_builder() {
        let request = TransferRequest::builder()
            .source_directory("/data/in")
            .pattern("**/*.xml")
            .target_directory("/data/out")
            .on_conflict(ConflictPolicy::Rename)
            .build()
            .unwrap();

        assert_eq!(request.source_directory, PathBuf::from("/data/in"));
        assert_eq!(request.pattern, "**/*.xml");
        assert!(!request.preserve_structure);
        assert!(request.create_target_directories);
        assert_eq!(request.on_conflict, ConflictPolicy::Rename);
    }

    #[test]
    fn test_builder_rejects_relative_paths() {
        let err = TransferRequest::builder()
            .source_directory("in")
            .pattern("*.txt")
            .target_directory("/data/out")
            .build()
            .unwrap_err();

        assert!(err.to_string().contains("must be absolute"));
    }

    #[test]
    fn test_builder_rejects_empty_pattern() {
        let err = TransferRequest::builder()
            .source_directory("/data/in")
            .pattern("  ")
            .target_directory("/data/out")
            .build()
            .unwrap_err();

        assert!(err.to_string().contains("Pattern cannot be empty"));
    }

    #[test]
    fn test_conflict_policy_display() {
        assert_eq!(ConflictPolicy::Fail.to_string(), "fail");
        assert_eq!(ConflictPolicy::Overwrite.to_string(), "overwrite");
        assert_eq!(ConflictPolicy::Rename.to_string(), "rename");
    }
}
