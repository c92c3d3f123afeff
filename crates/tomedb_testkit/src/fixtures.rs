//! Test fixtures and store helpers.
//!
//! Provides convenience types for setting up file-backed test stores
//! with automatic cleanup.

use std::ops::Deref;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tomedb_core::{Config, CoreResult, Database};

/// A file-backed store in a fresh temporary directory.
///
/// The directory lives as long as the fixture; dropping the fixture
/// removes it together with the document and any stray files.
pub struct TestStore {
    /// The open database.
    pub db: Database,
    path: PathBuf,
    _dir: TempDir,
}

impl TestStore {
    /// Opens an empty store with default configuration.
    pub async fn new() -> Self {
        Self::with_config(Config::default()).await
    }

    /// Opens an empty store with custom configuration.
    pub async fn with_config(config: Config) -> Self {
        let dir = TempDir::new().expect("create temp directory");
        let path = dir.path().join("store.json");
        let db = Database::load_with_config(&path, config)
            .await
            .expect("load empty store");
        Self { db, path, _dir: dir }
    }

    /// Path of the backing document.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Re-opens the backing document as an independent database.
    ///
    /// Useful for asserting what actually reached disk rather than what
    /// the original handle holds in memory.
    pub async fn reload(&self) -> CoreResult<Database> {
        Database::load(&self.path).await
    }
}

impl Deref for TestStore {
    type Target = Database;

    fn deref(&self) -> &Self::Target {
        &self.db
    }
}

/// Pre-populated store scenarios.
pub mod scenarios {
    use super::*;
    use tomedb_core::Record;

    /// A store with `count` records `{"n": 0..count}` in one collection.
    pub async fn populated(collection: &str, count: usize) -> TestStore {
        let store = TestStore::new().await;
        let handle = store.collection(collection);
        for n in 0..count {
            handle
                .store(Record::new().with("n", n as u64))
                .await
                .expect("store record");
        }
        store
    }
}
