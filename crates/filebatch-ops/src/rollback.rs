//! Compensation for partially completed batches.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Destinations written by the running batch, in creation order.
///
/// Owned by one batch execution. On failure the log is consumed by
/// [`CompensationLog::compensate`], which removes exactly these files.
#[derive(Debug, Default)]
pub struct CompensationLog {
    written: Vec<PathBuf>,
}

impl CompensationLog {
    /// Create an empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a destination file this batch created.
    pub fn record(&mut self, path: PathBuf) {
        self.written.push(path);
    }

    /// Number of recorded destinations.
    pub fn len(&self) -> usize {
        self.written.len()
    }

    /// Check if nothing has been written yet.
    pub fn is_empty(&self) -> bool {
        self.written.is_empty()
    }

    /// Recorded destinations in creation order.
    pub fn paths(&self) -> &[PathBuf] {
        &self.written
    }

    /// Delete every recorded destination, newest first.
    pub async fn compensate(self) -> RemovalReport {
        if self.written.is_empty() {
            return RemovalReport::default();
        }

        tracing::info!(files = self.written.len(), "rolling back written destinations");

        let mut paths = self.written;
        paths.reverse();
        remove_files_blocking(paths).await
    }
}

/// Outcome of a best-effort removal pass.
#[derive(Debug, Default)]
pub struct RemovalReport {
    /// Files that were deleted.
    pub removed: usize,
    /// Files that could not be deleted.
    pub failures: Vec<(PathBuf, io::Error)>,
}

impl RemovalReport {
    /// Check if every file was removed (or already gone).
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Delete each path, logging and continuing past individual failures.
///
/// A path that is already gone counts as removed. Paths listed twice are
/// only attempted once.
pub fn remove_files(paths: &[PathBuf]) -> RemovalReport {
    let mut report = RemovalReport::default();
    let mut seen: Vec<&Path> = Vec::with_capacity(paths.len());

    for path in paths {
        if seen.contains(&path.as_path()) {
            continue;
        }
        seen.push(path);

        match fs::remove_file(path) {
            Ok(()) => report.removed += 1,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "failed to remove file");
                report.failures.push((path.clone(), e));
            }
        }
    }

    report
}

/// Run [`remove_files`] on the blocking pool.
pub async fn remove_files_blocking(paths: Vec<PathBuf>) -> RemovalReport {
    match tokio::task::spawn_blocking(move || remove_files(&paths)).await {
        Ok(report) => report,
        Err(e) => {
            tracing::warn!(error = %e, "removal task failed");
            RemovalReport {
                removed: 0,
                failures: vec![(PathBuf::new(), io::Error::other(e))],
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_log_records_in_order() {
        let mut log = CompensationLog::new();
        assert!(log.is_empty());

        log.record(PathBuf::from("/out/a"));
        log.record(PathBuf::from("/out/b"));

        assert_eq!(log.len(), 2);
        assert_eq!(log.paths(), &[PathBuf::from("/out/a"), PathBuf::from("/out/b")]);
    }

    #[test]
    fn test_remove_files_tolerates_missing_and_duplicates() {
        let temp = TempDir::new().unwrap();
        let a = temp.path().join("a.txt");
        let b = temp.path().join("b.txt");
        fs::write(&a, "a").unwrap();

        let report = remove_files(&[a.clone(), b, a.clone()]);

        assert_eq!(report.removed, 1);
        assert!(report.is_clean());
        assert!(!a.exists());
    }

    #[test]
    fn test_remove_files_reports_failures() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("not_a_file");
        fs::create_dir(&dir).unwrap();

        let report = remove_files(&[dir.clone()]);

        assert_eq!(report.removed, 0);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].0, dir);
        assert!(dir.exists());
    }

    #[tokio::test]
    async fn test_compensate_removes_written_files() {
        let temp = TempDir::new().unwrap();
        let first = temp.path().join("first.txt");
        let second = temp.path().join("second.txt");
        let untouched = temp.path().join("untouched.txt");
        for path in [&first, &second, &untouched] {
            fs::write(path, "data").unwrap();
        }

        let mut log = CompensationLog::new();
        log.record(first.clone());
        log.record(second.clone());

        let report = log.compensate().await;

        assert_eq!(report.removed, 2);
        assert!(!first.exists());
        assert!(!second.exists());
        assert!(untouched.exists());
    }
}
