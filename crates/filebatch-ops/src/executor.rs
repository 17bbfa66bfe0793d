//! Batch executor: discovery, planning, conflict handling and rollback.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use filebatch_core::{
    ConflictPolicy, TransferError, TransferOutcome, TransferPair, TransferRequest,
};
use filebatch_scan::find_matching_files;

use crate::conflict::{check_conflicts, check_source_overwrites, ConflictResolver};
use crate::plan::plan_transfers;
use crate::progress::{BatchEvent, OperationType, TransferProgress};
use crate::rollback::CompensationLog;
use crate::transfer::TransferPrimitive;

/// Runs one batch at a time through a transfer primitive.
///
/// Files are transferred strictly in discovery order. If any file fails, or
/// the batch is cancelled, every destination written so far is deleted
/// before the original error is returned.
#[derive(Debug)]
pub struct BatchExecutor<T> {
    transfer: T,
    progress: Option<mpsc::Sender<BatchEvent>>,
}

impl<T: TransferPrimitive> BatchExecutor<T> {
    /// Create an executor using the given transfer primitive.
    pub fn new(transfer: T) -> Self {
        Self {
            transfer,
            progress: None,
        }
    }

    /// Send progress updates to a channel.
    pub fn with_progress(mut self, tx: mpsc::Sender<BatchEvent>) -> Self {
        self.progress = Some(tx);
        self
    }

    /// The transfer primitive in use.
    pub fn transfer(&self) -> &T {
        &self.transfer
    }

    /// Copy every file matched by the request.
    pub async fn execute(
        &self,
        request: &TransferRequest,
        cancel: &CancellationToken,
    ) -> Result<Vec<TransferOutcome>, TransferError> {
        self.run_batch(OperationType::Copy, request, cancel).await
    }

    pub(crate) async fn run_batch(
        &self,
        operation: OperationType,
        request: &TransferRequest,
        cancel: &CancellationToken,
    ) -> Result<Vec<TransferOutcome>, TransferError> {
        tracing::info!(
            operation = %operation,
            source = %request.source_directory.display(),
            pattern = %request.pattern,
            target = %request.target_directory.display(),
            policy = %request.on_conflict,
            "starting batch"
        );

        let relative_paths = discover(&request.source_directory, &request.pattern).await?;
        if relative_paths.is_empty() {
            tracing::info!("pattern matched no files");
            return Ok(Vec::new());
        }

        let pairs = plan_transfers(
            &relative_paths,
            &request.source_directory,
            &request.target_directory,
            request.preserve_structure,
        );

        match request.on_conflict {
            ConflictPolicy::Fail => check_conflicts(&pairs, operation.past_tense())?,
            ConflictPolicy::Overwrite => check_source_overwrites(&pairs, operation.past_tense())?,
            ConflictPolicy::Rename => {}
        }

        prepare_target(&request.target_directory, request.create_target_directories)?;

        let mut log = CompensationLog::new();
        match self.transfer_all(operation, request, &pairs, cancel, &mut log).await {
            Ok(outcomes) => {
                tracing::info!(operation = %operation, files = outcomes.len(), "batch finished");
                Ok(outcomes)
            }
            Err(err) => {
                tracing::info!(error = %err, written = log.len(), "batch failed");
                let report = log.compensate().await;
                if !report.is_clean() {
                    tracing::warn!(
                        failures = report.failures.len(),
                        "rollback left destinations behind"
                    );
                }
                Err(err)
            }
        }
    }

    async fn transfer_all(
        &self,
        operation: OperationType,
        request: &TransferRequest,
        pairs: &[TransferPair],
        cancel: &CancellationToken,
        log: &mut CompensationLog,
    ) -> Result<Vec<TransferOutcome>, TransferError> {
        let mut resolver = ConflictResolver::new(request.on_conflict);
        let mut progress = TransferProgress::new(operation, pairs.len());
        let mut outcomes = Vec::with_capacity(pairs.len());

        for pair in pairs {
            if cancel.is_cancelled() {
                return Err(TransferError::Cancelled);
            }

            if request.create_target_directories {
                if let Some(parent) = pair.planned_destination.parent() {
                    ensure_directory(parent)?;
                }
            }

            let destination = resolver.resolve(&pair.planned_destination)?;

            progress.set_current_file(Some(pair.source_path.clone()));
            self.report(&progress).await;

            let bytes = self
                .transfer
                .transfer(&pair.source_path, &destination)
                .await
                .map_err(|e| TransferError::transfer(&pair.source_path, &destination, e))?;

            tracing::debug!(
                source = %pair.source_path.display(),
                destination = %destination.display(),
                bytes,
                "transferred"
            );

            log.record(destination.clone());
            resolver.claim(destination.clone());
            outcomes.push(TransferOutcome::new(pair.source_path.clone(), destination, bytes));

            progress.complete_file(bytes);
            self.report(&progress).await;
        }

        Ok(outcomes)
    }

    async fn report(&self, progress: &TransferProgress) {
        if let Some(tx) = &self.progress {
            let _ = tx.send(BatchEvent::Progress(progress.clone())).await;
        }
    }
}

/// Run discovery on the blocking pool.
async fn discover(directory: &Path, pattern: &str) -> Result<Vec<PathBuf>, TransferError> {
    let owned_directory = directory.to_path_buf();
    let owned_pattern = pattern.to_string();

    tokio::task::spawn_blocking(move || find_matching_files(&owned_directory, &owned_pattern))
        .await
        .map_err(|e| TransferError::Io {
            path: directory.to_path_buf(),
            source: io::Error::other(e),
        })?
}

/// Make sure the target root is usable before any file is written.
fn prepare_target(target: &Path, create: bool) -> Result<(), TransferError> {
    if create {
        ensure_directory(target)
    } else if target.is_dir() {
        Ok(())
    } else {
        Err(TransferError::TargetDirectoryMissing {
            path: target.to_path_buf(),
        })
    }
}

fn ensure_directory(path: &Path) -> Result<(), TransferError> {
    fs::create_dir_all(path).map_err(|e| TransferError::Io {
        path: path.to_path_buf(),
        source: e,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transfer::CopyFile;
    use tempfile::TempDir;

    #[test]
    fn test_prepare_target_missing() {
        let temp = TempDir::new().unwrap();
        let target = temp.path().join("out");

        let err = prepare_target(&target, false).unwrap_err();
        assert!(matches!(err, TransferError::TargetDirectoryMissing { .. }));
        assert!(!target.exists());

        prepare_target(&target, true).unwrap();
        assert!(target.is_dir());
        prepare_target(&target, false).unwrap();
    }

    #[tokio::test]
    async fn test_progress_events() {
        let temp = TempDir::new().unwrap();
        let source = temp.path().join("in");
        fs::create_dir(&source).unwrap();
        fs::write(source.join("a.txt"), "aa").unwrap();
        fs::write(source.join("b.txt"), "bbb").unwrap();

        let (tx, mut rx) = mpsc::channel(16);
        let executor = BatchExecutor::new(CopyFile).with_progress(tx);
        let request = TransferRequest::new(&source, "*.txt", temp.path().join("out"));

        let outcomes = executor
            .execute(&request, &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(outcomes.len(), 2);
        drop(executor);

        let mut last = None;
        while let Some(event) = rx.recv().await {
            if let BatchEvent::Progress(p) = event {
                last = Some(p);
            }
        }
        let last = last.unwrap();
        assert_eq!(last.operation, OperationType::Copy);
        assert_eq!(last.files_completed, 2);
        assert_eq!(last.files_total, 2);
        assert_eq!(last.bytes_processed, 5);
    }
}
