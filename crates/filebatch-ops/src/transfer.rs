//! Single-file transfer primitives.

use std::fs::{self, File, OpenOptions};
use std::future::Future;
use std::io;
use std::path::Path;

/// Transfers one file to a destination that must not exist yet.
///
/// The batch executor awaits each call before starting the next file.
pub trait TransferPrimitive: Send + Sync {
    /// Write `source` to `destination`, returning the bytes written.
    ///
    /// Must fail rather than overwrite when `destination` already exists.
    fn transfer(
        &self,
        source: &Path,
        destination: &Path,
    ) -> impl Future<Output = io::Result<u64>> + Send;
}

/// Byte-for-byte file copy on the blocking pool.
#[derive(Debug, Clone, Copy, Default)]
pub struct CopyFile;

impl TransferPrimitive for CopyFile {
    fn transfer(
        &self,
        source: &Path,
        destination: &Path,
    ) -> impl Future<Output = io::Result<u64>> + Send {
        let source = source.to_path_buf();
        let destination = destination.to_path_buf();

        async move {
            tokio::task::spawn_blocking(move || copy_file(&source, &destination))
                .await
                .map_err(|e| io::Error::other(format!("Task failed: {e}")))?
        }
    }
}

/// Copy a single file into a newly created destination.
///
/// A partially written destination is removed again if the copy fails.
fn copy_file(source: &Path, destination: &Path) -> io::Result<u64> {
    let mut reader = File::open(source)?;
    let mut writer = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(destination)?;

    match io::copy(&mut reader, &mut writer).and_then(|bytes| writer.sync_all().map(|()| bytes)) {
        Ok(bytes) => Ok(bytes),
        Err(e) => {
            drop(writer);
            if let Err(cleanup) = fs::remove_file(destination) {
                tracing::warn!(
                    path = %destination.display(),
                    error = %cleanup,
                    "failed to remove partial destination"
                );
            }
            Err(e)
        }
    }
}
