//! Instrumented storage backends.
//!
//! Each backend delegates to an in-memory document store while letting
//! tests observe or disturb the write path: counting writes, holding
//! them until released, or failing a leading run of them.

use parking_lot::{Condvar, Mutex};
use std::io;
use std::sync::atomic::{AtomicUsize, Ordering};
use tomedb_storage::{MemoryBackend, StorageBackend, StorageResult};

/// Counts writes while delegating to an in-memory store.
#[derive(Debug, Default)]
pub struct CountingBackend {
    inner: MemoryBackend,
    writes: AtomicUsize,
}

impl CountingBackend {
    /// Creates an empty counting backend.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of completed writes.
    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// The current document, if any write has happened.
    pub fn document(&self) -> Option<Vec<u8>> {
        self.inner.document()
    }
}

impl StorageBackend for CountingBackend {
    fn read(&self) -> StorageResult<Option<Vec<u8>>> {
        self.inner.read()
    }

    fn write(&self, data: &[u8]) -> StorageResult<()> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.inner.write(data)
    }

    fn describe(&self) -> String {
        "<memory, counting>".to_owned()
    }
}

/// Holds every write until the test hands out a permit.
///
/// `write` blocks the calling thread, so it must only be driven from a
/// context that tolerates blocking (the store's writer already runs
/// writes on a blocking thread). Release permits with [`release`]
/// or open the gate for good with [`release_all`].
///
/// [`release`]: GatedBackend::release
/// [`release_all`]: GatedBackend::release_all
#[derive(Debug, Default)]
pub struct GatedBackend {
    inner: MemoryBackend,
    permits: Mutex<usize>,
    released: Condvar,
    started: AtomicUsize,
    finished: AtomicUsize,
}

impl GatedBackend {
    /// Creates a gated backend with no permits; the first write blocks.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of writes that have entered the gate.
    pub fn started(&self) -> usize {
        self.started.load(Ordering::SeqCst)
    }

    /// Number of writes that have completed.
    pub fn finished(&self) -> usize {
        self.finished.load(Ordering::SeqCst)
    }

    /// Lets `count` more writes through.
    pub fn release(&self, count: usize) {
        *self.permits.lock() += count;
        self.released.notify_all();
    }

    /// Lets every current and future write through.
    pub fn release_all(&self) {
        *self.permits.lock() = usize::MAX;
        self.released.notify_all();
    }

    /// The current document, if any write has happened.
    pub fn document(&self) -> Option<Vec<u8>> {
        self.inner.document()
    }
}

impl StorageBackend for GatedBackend {
    fn read(&self) -> StorageResult<Option<Vec<u8>>> {
        self.inner.read()
    }

    fn write(&self, data: &[u8]) -> StorageResult<()> {
        self.started.fetch_add(1, Ordering::SeqCst);
        {
            let mut permits = self.permits.lock();
            while *permits == 0 {
                self.released.wait(&mut permits);
            }
            if *permits != usize::MAX {
                *permits -= 1;
            }
        }
        let result = self.inner.write(data);
        self.finished.fetch_add(1, Ordering::SeqCst);
        result
    }

    fn describe(&self) -> String {
        "<memory, gated>".to_owned()
    }
}

/// Fails the first `n` writes with an injected I/O error.
#[derive(Debug)]
pub struct FailingBackend {
    inner: MemoryBackend,
    failures_left: Mutex<usize>,
    attempts: AtomicUsize,
}

impl FailingBackend {
    /// Creates a backend whose first `times` writes fail.
    pub fn failing(times: usize) -> Self {
        Self {
            inner: MemoryBackend::new(),
            failures_left: Mutex::new(times),
            attempts: AtomicUsize::new(0),
        }
    }

    /// Number of write attempts, failed ones included.
    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }

    /// The current document, if any write has succeeded.
    pub fn document(&self) -> Option<Vec<u8>> {
        self.inner.document()
    }
}

impl StorageBackend for FailingBackend {
    fn read(&self) -> StorageResult<Option<Vec<u8>>> {
        self.inner.read()
    }

    fn write(&self, data: &[u8]) -> StorageResult<()> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        {
            let mut left = self.failures_left.lock();
            if *left > 0 {
                *left -= 1;
                return Err(io::Error::other("injected write failure").into());
            }
        }
        self.inner.write(data)
    }

    fn describe(&self) -> String {
        "<memory, failing>".to_owned()
    }
}
