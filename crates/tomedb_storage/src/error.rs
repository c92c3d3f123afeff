//! Error types for storage operations.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors that can occur during storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    /// An I/O error occurred while reading or preparing a write.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Moving the temporary file over the target failed.
    ///
    /// The target keeps its previous contents; the temporary file has
    /// already been removed when this error is returned.
    #[error("failed to replace {}: {source}", path.display())]
    Replace {
        /// The target path that was not replaced.
        path: PathBuf,
        /// The rename failure.
        source: io::Error,
    },
}
