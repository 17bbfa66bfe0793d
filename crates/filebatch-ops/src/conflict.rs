//! Conflict detection and resolution for batch transfers.

use std::collections::HashSet;
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

use itertools::Itertools;

use filebatch_core::{ConflictPolicy, TransferError, TransferPair};

use crate::plan::normalize_path;

/// Pre-flight validation for the fail policy.
///
/// Fails if any planned destination appears more than once, or already
/// exists on disk. Every offending path is reported. Nothing is written.
pub fn check_conflicts(pairs: &[TransferPair], operation: &'static str) -> Result<(), TransferError> {
    let duplicates: Vec<PathBuf> = pairs
        .iter()
        .map(|p| &p.planned_destination)
        .duplicates()
        .cloned()
        .collect();

    let existing: Vec<PathBuf> = pairs
        .iter()
        .map(|p| &p.planned_destination)
        .unique()
        .filter(|p| occupied(p))
        .cloned()
        .collect();

    if duplicates.is_empty() && existing.is_empty() {
        return Ok(());
    }

    Err(TransferError::Conflict {
        duplicates,
        existing,
        operation,
    })
}

/// Pre-flight validation for the overwrite policy.
///
/// Fails if an existing destination is one of the batch's own sources, for
/// example when the target directory is the source directory. Overwriting
/// it would delete a file before it is read.
pub fn check_source_overwrites(
    pairs: &[TransferPair],
    operation: &'static str,
) -> Result<(), TransferError> {
    let sources: HashSet<PathBuf> = pairs.iter().map(|p| file_identity(&p.source_path)).collect();

    let paths: Vec<PathBuf> = pairs
        .iter()
        .map(|p| &p.planned_destination)
        .unique()
        .filter(|p| occupied(p) && sources.contains(&file_identity(p)))
        .cloned()
        .collect();

    if paths.is_empty() {
        return Ok(());
    }

    Err(TransferError::OverwritesSource { paths, operation })
}

/// Whether anything, including a dangling symlink, sits at `path`.
fn occupied(path: &Path) -> bool {
    fs::symlink_metadata(path).is_ok()
}

/// The resolved path of a file, falling back to a lexical form.
fn file_identity(path: &Path) -> PathBuf {
    fs::canonicalize(path).unwrap_or_else(|_| normalize_path(path))
}

/// Decides the path each file in a batch is written to.
///
/// Lives for one batch. Remembers the destinations already finalized so a
/// later file never renames onto a path chosen earlier in the same run.
#[derive(Debug)]
pub struct ConflictResolver {
    policy: ConflictPolicy,
    claimed: HashSet<PathBuf>,
}

impl ConflictResolver {
    /// Create a resolver for one batch.
    pub fn new(policy: ConflictPolicy) -> Self {
        Self {
            policy,
            claimed: HashSet::new(),
        }
    }

    /// The policy this resolver applies.
    pub fn policy(&self) -> ConflictPolicy {
        self.policy
    }

    /// Resolve the actual destination for a planned path.
    ///
    /// Under overwrite an existing file is deleted here.
    pub fn resolve(&self, planned: &Path) -> Result<PathBuf, TransferError> {
        match self.policy {
            // Pre-flight already proved nothing is in the way.
            ConflictPolicy::Fail => Ok(planned.to_path_buf()),
            ConflictPolicy::Overwrite => {
                if occupied(planned) {
                    tracing::debug!(path = %planned.display(), "removing existing destination");
                    fs::remove_file(planned).map_err(|e| TransferError::Io {
                        path: planned.to_path_buf(),
                        source: e,
                    })?;
                }
                Ok(planned.to_path_buf())
            }
            ConflictPolicy::Rename => self.rename(planned),
        }
    }

    /// Record a destination as written by this batch.
    pub fn claim(&mut self, destination: PathBuf) {
        self.claimed.insert(destination);
    }

    /// Check whether a path was written earlier in this batch.
    pub fn is_claimed(&self, path: &Path) -> bool {
        self.claimed.contains(path)
    }

    fn is_taken(&self, path: &Path) -> bool {
        self.is_claimed(path) || occupied(path)
    }

    fn rename(&self, planned: &Path) -> Result<PathBuf, TransferError> {
        if !self.is_taken(planned) {
            return Ok(planned.to_path_buf());
        }

        for n in 1..=u64::MAX {
            let candidate = rename_candidate(planned, n);
            if !self.is_taken(&candidate) {
                tracing::debug!(
                    planned = %planned.display(),
                    renamed = %candidate.display(),
                    "destination taken, renaming"
                );
                return Ok(candidate);
            }
        }

        Err(TransferError::RenameExhausted {
            path: planned.to_path_buf(),
        })
    }
}

/// The `n`-th rename candidate for a path.
///
/// For `name.ext` this is `name(n).ext`; without an extension, `name(n)`.
pub fn rename_candidate(path: &Path, n: u64) -> PathBuf {
    let mut name: OsString = path.file_stem().map(OsString::from).unwrap_or_default();
    name.push(format!("({n})"));
    if let Some(extension) = path.extension() {
        name.push(".");
        name.push(extension);
    }

    match path.parent() {
        Some(parent) => parent.join(name),
        None => PathBuf::from(name),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_rename_candidate() {
        assert_eq!(
            rename_candidate(Path::new("/tmp/test.txt"), 1),
            PathBuf::from("/tmp/test(1).txt")
        );
        assert_eq!(
            rename_candidate(Path::new("/tmp/testfile"), 3),
            PathBuf::from("/tmp/testfile(3)")
        );
        assert_eq!(
            rename_candidate(Path::new("/tmp/archive.tar.gz"), 2),
            PathBuf::from("/tmp/archive.tar(2).gz")
        );
    }

    #[test]
    fn test_rename_skips_existing_and_claimed() {
        let temp = TempDir::new().unwrap();
        let planned = temp.path().join("test.txt");
        fs::write(&planned, "existing").unwrap();
        fs::write(temp.path().join("test(1).txt"), "existing").unwrap();

        let mut resolver = ConflictResolver::new(ConflictPolicy::Rename);
        let first = resolver.resolve(&planned).unwrap();
        assert_eq!(first, temp.path().join("test(2).txt"));

        // Not written to disk yet, but claimed.
        resolver.claim(first);
        let second = resolver.resolve(&planned).unwrap();
        assert_eq!(second, temp.path().join("test(3).txt"));
    }

    #[test]
    fn test_rename_keeps_free_path() {
        let temp = TempDir::new().unwrap();
        let planned = temp.path().join("free.txt");

        let resolver = ConflictResolver::new(ConflictPolicy::Rename);
        assert_eq!(resolver.resolve(&planned).unwrap(), planned);
    }

    #[test]
    fn test_rename_counters_are_per_stem() {
        let temp = TempDir::new().unwrap();
        let a = temp.path().join("a.txt");
        let b = temp.path().join("b.txt");

        let mut resolver = ConflictResolver::new(ConflictPolicy::Rename);
        resolver.claim(a.clone());
        resolver.claim(temp.path().join("a(1).txt"));
        resolver.claim(b.clone());

        assert_eq!(resolver.resolve(&a).unwrap(), temp.path().join("a(2).txt"));
        assert_eq!(resolver.resolve(&b).unwrap(), temp.path().join("b(1).txt"));
    }

    #[test]
    fn test_overwrite_removes_existing() {
        let temp = TempDir::new().unwrap();
        let planned = temp.path().join("out.txt");
        fs::write(&planned, "old").unwrap();

        let resolver = ConflictResolver::new(ConflictPolicy::Overwrite);
        assert_eq!(resolver.resolve(&planned).unwrap(), planned);
        assert!(!planned.exists());
    }

    #[test]
    fn test_fail_resolve_is_identity() {
        let resolver = ConflictResolver::new(ConflictPolicy::Fail);
        let planned = PathBuf::from("/out/x.txt");
        assert_eq!(resolver.resolve(&planned).unwrap(), planned);
        assert_eq!(resolver.policy(), ConflictPolicy::Fail);
    }

    #[test]
    fn test_check_conflicts_reports_duplicates_and_existing() {
        let temp = TempDir::new().unwrap();
        let taken = temp.path().join("taken.txt");
        fs::write(&taken, "existing").unwrap();
        let shared = temp.path().join("shared.txt");

        let pairs = vec![
            TransferPair::new("/in/a/shared.txt", shared.clone()),
            TransferPair::new("/in/b/shared.txt", shared.clone()),
            TransferPair::new("/in/taken.txt", taken.clone()),
            TransferPair::new("/in/fine.txt", temp.path().join("fine.txt")),
        ];

        let err = check_conflicts(&pairs, "copied").unwrap_err();
        match err {
            TransferError::Conflict {
                duplicates,
                existing,
                operation,
            } => {
                assert_eq!(duplicates, vec![shared]);
                assert_eq!(existing, vec![taken]);
                assert_eq!(operation, "copied");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_check_source_overwrites_rejects_own_sources() {
        let temp = TempDir::new().unwrap();
        let a = temp.path().join("a.txt");
        let b = temp.path().join("b.txt");
        fs::write(&a, "a").unwrap();
        fs::write(&b, "b").unwrap();
        fs::create_dir(temp.path().join("sub")).unwrap();

        let pairs = vec![
            TransferPair::new(a.clone(), a.clone()),
            TransferPair::new(b.clone(), temp.path().join("sub/../b.txt")),
        ];

        let err = check_source_overwrites(&pairs, "copied").unwrap_err();
        assert!(matches!(err, TransferError::OverwritesSource { .. }));
        assert_eq!(err.conflicting_paths().len(), 2);
        assert!(a.exists());
        assert!(b.exists());
    }

    #[test]
    fn test_check_source_overwrites_allows_other_files() {
        let temp = TempDir::new().unwrap();
        let source = temp.path().join("in.txt");
        let existing = temp.path().join("out.txt");
        fs::write(&source, "in").unwrap();
        fs::write(&existing, "old").unwrap();

        let pairs = vec![TransferPair::new(source, existing)];
        assert!(check_source_overwrites(&pairs, "copied").is_ok());
    }

    #[cfg(unix)]
    #[test]
    fn test_dangling_symlink_counts_as_existing() {
        let temp = TempDir::new().unwrap();
        let link = temp.path().join("link.txt");
        std::os::unix::fs::symlink(temp.path().join("missing.txt"), &link).unwrap();
        assert!(!link.exists());

        let pairs = vec![TransferPair::new("/in/link.txt", link.clone())];
        let err = check_conflicts(&pairs, "copied").unwrap_err();
        assert_eq!(err.conflicting_paths(), vec![&link]);

        let resolver = ConflictResolver::new(ConflictPolicy::Rename);
        assert_eq!(resolver.resolve(&link).unwrap(), temp.path().join("link(1).txt"));

        let resolver = ConflictResolver::new(ConflictPolicy::Overwrite);
        assert_eq!(resolver.resolve(&link).unwrap(), link);
        assert!(fs::symlink_metadata(&link).is_err());
    }

    #[test]
    fn test_check_conflicts_passes_clean_plan() {
        let temp = TempDir::new().unwrap();
        let pairs = vec![
            TransferPair::new("/in/a.txt", temp.path().join("a.txt")),
            TransferPair::new("/in/b.txt", temp.path().join("b.txt")),
        ];
        assert!(check_conflicts(&pairs, "moved").is_ok());
    }
}
