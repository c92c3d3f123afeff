//! In-memory storage backend for testing.

use crate::backend::StorageBackend;
use crate::error::StorageResult;
use parking_lot::RwLock;

/// An in-memory storage backend.
///
/// The document lives in process memory. Suitable for:
/// - Unit tests
/// - Integration tests
/// - Ephemeral stores that don't need persistence
///
/// # Thread Safety
///
/// This backend is thread-safe and can be shared across threads.
///
/// # Example
///
/// ```rust
/// use tomedb_storage::{MemoryBackend, StorageBackend};
///
/// let backend = MemoryBackend::new();
/// backend.write(b"{\"todos\":[]}").unwrap();
/// assert_eq!(backend.read().unwrap().unwrap(), b"{\"todos\":[]}");
/// ```
#[derive(Debug, Default)]
pub struct MemoryBackend {
    document: RwLock<Option<Vec<u8>>>,
}

impl MemoryBackend {
    /// Creates a backend with no document (reads as `None`).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a backend pre-loaded with a document.
    ///
    /// Useful for testing bootstrap and recovery scenarios.
    #[must_use]
    pub fn with_document(document: Vec<u8>) -> Self {
        Self {
            document: RwLock::new(Some(document)),
        }
    }

    /// Returns a copy of the current document, if any.
    ///
    /// Useful for asserting on persisted bytes in tests.
    #[must_use]
    pub fn document(&self) -> Option<Vec<u8>> {
        self.document.read().clone()
    }

    /// Removes the document, returning the backend to its unwritten state.
    pub fn clear(&self) {
        *self.document.write() = None;
    }
}

impl StorageBackend for MemoryBackend {
    fn read(&self) -> StorageResult<Option<Vec<u8>>> {
        Ok(self.document.read().clone())
    }

    fn write(&self, data: &[u8]) -> StorageResult<()> {
        *self.document.write() = Some(data.to_vec());
        Ok(())
    }

    fn describe(&self) -> String {
        String::from("<memory>")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn memory_new_has_no_document() {
        let backend = MemoryBackend::new();
        assert!(backend.read().unwrap().is_none());
        assert!(backend.document().is_none());
    }

    #[test]
    fn memory_write_then_read() {
        let backend = MemoryBackend::new();
        backend.write(b"hello").unwrap();

        assert_eq!(backend.read().unwrap().unwrap(), b"hello");
    }

    #[test]
    fn memory_write_replaces_whole_document() {
        let backend = MemoryBackend::new();
        backend.write(b"first version").unwrap();
        backend.write(b"second").unwrap();

        assert_eq!(backend.read().unwrap().unwrap(), b"second");
    }

    #[test]
    fn memory_with_document() {
        let backend = MemoryBackend::with_document(b"preloaded".to_vec());
        assert_eq!(backend.read().unwrap().unwrap(), b"preloaded");
    }

    #[test]
    fn memory_clear() {
        let backend = MemoryBackend::new();
        backend.write(b"some data").unwrap();
        backend.clear();

        assert!(backend.read().unwrap().is_none());
    }

    #[test]
    fn memory_empty_document_is_not_none() {
        let backend = MemoryBackend::new();
        backend.write(b"").unwrap();

        assert_eq!(backend.read().unwrap().unwrap(), b"");
    }

    proptest! {
        #[test]
        fn memory_roundtrips_any_bytes(data in proptest::collection::vec(any::<u8>(), 0..4096)) {
            let backend = MemoryBackend::new();
            backend.write(&data).unwrap();
            prop_assert_eq!(backend.read().unwrap().unwrap(), data);
        }
    }
}
