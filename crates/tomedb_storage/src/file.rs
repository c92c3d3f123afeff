//! File-based storage backend for persistent storage.

use crate::backend::StorageBackend;
use crate::error::{StorageError, StorageResult};
use parking_lot::Mutex;
use std::fs::{self, File};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

/// Suffix carried by every temporary file created during a write.
///
/// Temporaries are uniquely-named siblings of the target
/// (`<file-name>.<random><TEMP_SUFFIX>`), so the final rename never
/// crosses a filesystem boundary. After any completed write - success
/// or failure - no file with this suffix remains in the directory.
pub const TEMP_SUFFIX: &str = ".tmp";

/// A file-based storage backend.
///
/// The document lives in a single file. Every write goes through a
/// uniquely-named temporary file in the same directory, which is flushed
/// and then atomically renamed over the target. The target is never
/// observable in a partially written state; if the write fails at any
/// step, the previous contents stay intact and the temporary file is
/// removed before the error is returned.
///
/// # Durability
///
/// With `sync_on_write` enabled (the default), the temporary file is
/// `sync_all`ed before the rename and the directory is fsynced after it,
/// so a completed write survives power loss. Disabling it skips both
/// syncs and leaves durability to the OS.
///
/// # Thread Safety
///
/// Writes are serialized by an internal lock; the backend can be shared
/// across threads.
///
/// # Example
///
/// ```no_run
/// use tomedb_storage::{FileBackend, StorageBackend};
///
/// let backend = FileBackend::new("data.json");
/// backend.write(b"{}").unwrap();
/// assert_eq!(backend.read().unwrap().unwrap(), b"{}");
/// ```
#[derive(Debug)]
pub struct FileBackend {
    path: PathBuf,
    sync_on_write: bool,
    write_lock: Mutex<()>,
}

impl FileBackend {
    /// Creates a backend targeting the given path.
    ///
    /// The file is not created until the first write; a missing file
    /// reads as `None`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            sync_on_write: true,
            write_lock: Mutex::new(()),
        }
    }

    /// Controls whether writes fsync the file and directory.
    ///
    /// Defaults to `true`. Turning it off trades crash durability for
    /// speed, which can be acceptable in tests and bulk loads.
    #[must_use]
    pub fn with_sync_on_write(mut self, sync_on_write: bool) -> Self {
        self.sync_on_write = sync_on_write;
        self
    }

    /// Returns the path of the target file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The directory that holds the target and its temporaries.
    fn dir(&self) -> &Path {
        match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        }
    }
}

impl StorageBackend for FileBackend {
    fn read(&self) -> StorageResult<Option<Vec<u8>>> {
        match fs::read(&self.path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    fn write(&self, data: &[u8]) -> StorageResult<()> {
        let _guard = self.write_lock.lock();

        let prefix = match self.path.file_name() {
            Some(name) => format!("{}.", name.to_string_lossy()),
            None => String::from("tomedb."),
        };

        // The temp file is deleted on drop, so every early return below
        // leaves the directory clean.
        let mut temp = tempfile::Builder::new()
            .prefix(&prefix)
            .suffix(TEMP_SUFFIX)
            .tempfile_in(self.dir())?;

        temp.write_all(data)?;
        if self.sync_on_write {
            temp.as_file().sync_all()?;
        }

        temp.persist(&self.path).map_err(|err| StorageError::Replace {
            path: self.path.clone(),
            source: err.error,
        })?;

        if self.sync_on_write {
            sync_directory(self.dir())?;
        }

        Ok(())
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

/// Fsyncs the directory so the rename itself is durable.
///
/// On Windows, directory fsync is not supported the way it is on Unix;
/// NTFS journaling provides the equivalent metadata durability, so the
/// explicit fsync is skipped there.
#[cfg(unix)]
fn sync_directory(dir: &Path) -> StorageResult<()> {
    let handle = File::open(dir)?;
    handle.sync_all()?;
    Ok(())
}

#[cfg(not(unix))]
fn sync_directory(_dir: &Path) -> StorageResult<()> {
    Ok(())
}
