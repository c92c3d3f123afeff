//! Storage backend trait definition.

use crate::error::StorageResult;

/// A whole-document storage backend for tomedb.
///
/// Backends are **opaque byte stores** holding a single document. They
/// provide two operations: read the entire current document and durably
/// replace it. tomedb owns all format interpretation - backends do not
/// understand collections, records, or JSON.
///
/// # Invariants
///
/// - `read` returns exactly the bytes of the last successful `write`,
///   or `None` if the target has never been written
/// - `write` is all-or-nothing: after a failed write the previous
///   document is still intact and readable
/// - Implementations serialize their own internal access; callers may
///   share a backend across threads (`Send + Sync` is required so the
///   database's background writer can hold one)
///
/// # Implementors
///
/// - [`super::MemoryBackend`] - For testing and ephemeral stores
/// - [`super::FileBackend`] - For persistent storage
pub trait StorageBackend: Send + Sync {
    /// Reads the entire current document.
    ///
    /// Returns `None` if the target does not exist yet (never written).
    ///
    /// # Errors
    ///
    /// Returns an error if the document exists but cannot be read.
    fn read(&self) -> StorageResult<Option<Vec<u8>>>;

    /// Durably replaces the document with `data`.
    ///
    /// After this returns successfully the new document is what `read`
    /// observes, and it survives process termination for persistent
    /// backends.
    ///
    /// # Errors
    ///
    /// Returns an error if the write or the replacement step fails. The
    /// previous document remains intact in that case.
    fn write(&self, data: &[u8]) -> StorageResult<()>;

    /// A human-readable description of the target, for log messages.
    fn describe(&self) -> String;
}
