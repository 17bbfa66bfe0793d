//! Batch copy operation.

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use filebatch_core::{TransferError, TransferOutcome, TransferRequest};

use crate::executor::BatchExecutor;
use crate::progress::BatchEvent;
use crate::transfer::CopyFile;
use crate::OPERATION_CHANNEL_SIZE;

/// Copy every file matched by the request.
///
/// Returns the completed transfers in discovery order.
pub async fn copy_files(
    request: &TransferRequest,
    cancel: &CancellationToken,
) -> Result<Vec<TransferOutcome>, TransferError> {
    BatchExecutor::new(CopyFile).execute(request, cancel).await
}

/// Start an async copy batch.
///
/// Returns a receiver for progress updates; the final event is always
/// [`BatchEvent::Complete`].
pub fn start_copy(request: TransferRequest, cancel: CancellationToken) -> mpsc::Receiver<BatchEvent> {
    let (tx, rx) = mpsc::channel(OPERATION_CHANNEL_SIZE);

    tokio::spawn(async move {
        let executor = BatchExecutor::new(CopyFile).with_progress(tx.clone());
        let result = executor.execute(&request, &cancel).await;
        let _ = tx.send(BatchEvent::Complete(result)).await;
    });

    rx
}
