//! Batch transfer engine for filebatch.
//!
//! This crate discovers files by pattern, maps them onto a target directory,
//! applies a conflict policy and copies or moves them one at a time. If a
//! file fails or the batch is cancelled, destinations already written by
//! the batch are deleted again before the error is returned.

mod conflict;
mod copy;
mod executor;
mod move_op;
mod plan;
mod progress;
mod rollback;
mod transfer;

pub use conflict::{check_conflicts, check_source_overwrites, rename_candidate, ConflictResolver};
pub use copy::{copy_files, start_copy};
pub use executor::BatchExecutor;
pub use move_op::{move_files, start_move};
pub use plan::{normalize_path, plan_transfers};
pub use progress::{summary, BatchEvent, OperationType, TransferProgress};
pub use rollback::{remove_files, CompensationLog, RemovalReport};
pub use transfer::{CopyFile, TransferPrimitive};

pub use filebatch_core::{
    ConflictPolicy, TransferError, TransferOutcome, TransferPair, TransferRequest,
};
pub use tokio_util::sync::CancellationToken;

/// Default channel buffer size for batch progress updates.
pub const OPERATION_CHANNEL_SIZE: usize = 100;
