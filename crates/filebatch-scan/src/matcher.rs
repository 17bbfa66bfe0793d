//! Glob-based file discovery.

use std::cmp::Ordering;
use std::path::{Component, Path, PathBuf};

use globset::{GlobBuilder, GlobMatcher};
use jwalk::{Parallelism, WalkDir};

use filebatch_core::TransferError;

/// Matches files under a directory against an include pattern.
///
/// `*` and `?` stay within one path segment, `**` spans any number of
/// directories (including none). Backslashes are read as separators.
#[derive(Debug, Clone)]
pub struct PatternMatcher {
    pattern: String,
    matcher: GlobMatcher,
}

impl PatternMatcher {
    /// Compile a pattern.
    pub fn new(pattern: &str) -> Result<Self, TransferError> {
        let normalized = normalize_pattern(pattern);

        let glob = GlobBuilder::new(&normalized)
            .literal_separator(true)
            .backslash_escape(false)
            .build()
            .map_err(|e| TransferError::InvalidPattern {
                pattern: pattern.to_string(),
                message: e.kind().to_string(),
            })?;

        Ok(Self {
            pattern: normalized,
            matcher: glob.compile_matcher(),
        })
    }

    /// The normalized pattern text.
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Check a path relative to the search root.
    pub fn is_match(&self, relative: &Path) -> bool {
        self.matcher.is_match(relative)
    }

    /// Find every regular file under `directory` matching the pattern.
    ///
    /// Returns paths relative to `directory` in discovery order. A missing
    /// or unreadable directory is an error; no matches is an empty list.
    pub fn find(&self, directory: &Path) -> Result<Vec<PathBuf>, TransferError> {
        if let Err(e) = std::fs::read_dir(directory) {
            tracing::debug!(path = %directory.display(), error = %e, "cannot read source directory");
            return Err(TransferError::DirectoryNotFound {
                path: directory.to_path_buf(),
            });
        }

        let walker = WalkDir::new(directory)
            .parallelism(Parallelism::Serial)
            .skip_hidden(false)
            .follow_links(false)
            .sort(true);

        let mut matches = Vec::new();

        for entry_result in walker {
            let entry = match entry_result {
                Ok(e) => e,
                Err(err) => {
                    tracing::warn!(error = %err, "skipping unreadable entry during discovery");
                    continue;
                }
            };

            let file_type = entry.file_type();
            let path = entry.path();
            let is_file = file_type.is_file() || (file_type.is_symlink() && path.is_file());
            if !is_file {
                continue;
            }

            let Ok(relative) = path.strip_prefix(directory) else {
                continue;
            };

            if self.is_match(relative) {
                matches.push(relative.to_path_buf());
            }
        }

        matches.sort_by(|a, b| discovery_order(a, b));

        tracing::debug!(
            directory = %directory.display(),
            pattern = %self.pattern,
            matches = matches.len(),
            "discovery finished"
        );

        Ok(matches)
    }
}

/// Find files under `directory` matching `pattern`.
pub fn find_matching_files(directory: &Path, pattern: &str) -> Result<Vec<PathBuf>, TransferError> {
    PatternMatcher::new(pattern)?.find(directory)
}

/// Ordering of relative paths as they are discovered.
///
/// Within one directory, files come before subdirectories; each group is
/// sorted by name. Subdirectories are visited depth-first.
pub fn discovery_order(a: &Path, b: &Path) -> Ordering {
    let a_parts: Vec<Component<'_>> = a.components().collect();
    let b_parts: Vec<Component<'_>> = b.components().collect();

    for (i, (x, y)) in a_parts.iter().zip(&b_parts).enumerate() {
        if x == y {
            continue;
        }

        let x_is_file = i + 1 == a_parts.len();
        let y_is_file = i + 1 == b_parts.len();

        return match (x_is_file, y_is_file) {
            (true, false) => Ordering::Less,
            (false, true) => Ordering::Greater,
            _ => x.as_os_str().cmp(y.as_os_str()),
        };
    }

    a_parts.len().cmp(&b_parts.len())
}

fn normalize_pattern(pattern: &str) -> String {
    let unified = pattern.trim().replace('\\', "/");
    let mut rest = unified.as_str();
    loop {
        if let Some(stripped) = rest.strip_prefix("./") {
            rest = stripped;
        } else if let Some(stripped) = rest.strip_prefix('/') {
            rest = stripped;
        } else {
            break;
        }
    }
    rest.to_string()
}
