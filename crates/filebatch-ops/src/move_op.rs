//! Batch move operation.
//!
//! A move is a batch copy followed, only on success, by deletion of every
//! source. Destinations are never produced by a native rename, so a failed
//! move rolls back exactly like a failed copy and works across volumes.

use std::path::PathBuf;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use filebatch_core::{TransferError, TransferOutcome, TransferRequest};

use crate::executor::BatchExecutor;
use crate::progress::{BatchEvent, OperationType};
use crate::rollback::remove_files_blocking;
use crate::transfer::{CopyFile, TransferPrimitive};
use crate::OPERATION_CHANNEL_SIZE;

impl<T: TransferPrimitive> BatchExecutor<T> {
    /// Move every file matched by the request.
    ///
    /// Sources are deleted only after the whole batch succeeded. A source
    /// that cannot be deleted is logged; its destination is kept.
    pub async fn execute_move(
        &self,
        request: &TransferRequest,
        cancel: &CancellationToken,
    ) -> Result<Vec<TransferOutcome>, TransferError> {
        let outcomes = self.run_batch(OperationType::Move, request, cancel).await?;

        let sources: Vec<PathBuf> = outcomes.iter().map(|o| o.source_path.clone()).collect();
        let report = remove_files_blocking(sources).await;
        if !report.is_clean() {
            tracing::warn!(
                failures = report.failures.len(),
                "some moved sources could not be deleted"
            );
        }

        Ok(outcomes)
    }
}

/// Move every file matched by the request.
pub async fn move_files(
    request: &TransferRequest,
    cancel: &CancellationToken,
) -> Result<Vec<TransferOutcome>, TransferError> {
    BatchExecutor::new(CopyFile).execute_move(request, cancel).await
}

/// Start an async move batch.
///
/// Returns a receiver for progress updates; the final event is always
/// [`BatchEvent::Complete`].
pub fn start_move(request: TransferRequest, cancel: CancellationToken) -> mpsc::Receiver<BatchEvent> {
    let (tx, rx) = mpsc::channel(OPERATION_CHANNEL_SIZE);

    tokio::spawn(async move {
        let executor = BatchExecutor::new(CopyFile).with_progress(tx.clone());
        let result = executor.execute_move(&request, &cancel).await;
        let _ = tx.send(BatchEvent::Complete(result)).await;
    });

    rx
}
