//! Database facade and bootstrap.

use crate::collection::{Collection, CollectionData};
use crate::config::Config;
use crate::error::{CoreError, CoreResult};
use crate::record::Record;
use crate::save::SaveState;
use parking_lot::{Mutex, RwLock};
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use tomedb_storage::{FileBackend, MemoryBackend, StorageBackend};
use tracing::debug;

/// State shared by a database and every collection handle under it.
pub(crate) struct Shared {
    /// The whole-document store everything persists through.
    pub(crate) backend: Arc<dyn StorageBackend>,
    /// Load-time configuration.
    pub(crate) config: Config,
    /// Collection name -> records and id index. A `BTreeMap` keeps the
    /// persisted document's key order deterministic.
    pub(crate) collections: RwLock<BTreeMap<String, CollectionData>>,
    /// The save scheduler's state.
    pub(crate) save: Mutex<SaveState>,
}

/// A set of named collections persisted to one JSON document.
///
/// `Database` is the entry point of the store. Open one with
/// [`load`](Self::load) (or [`load_sync`](Self::load_sync)), hand out
/// [`Collection`] handles with [`collection`](Self::collection), and
/// mutate through those handles; every mutation schedules a durable
/// write of the full document, with concurrent saves coalesced into as
/// few physical writes as possible.
///
/// Handles are cheap to clone; all clones share the same state.
///
/// ```rust
/// use tomedb_core::{Database, Record};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> tomedb_core::CoreResult<()> {
/// let db = Database::in_memory();
/// let users = db.collection("users");
///
/// let alice = users.store(Record::new().with("name", "alice")).await?;
/// assert_eq!(alice.id().map(|id| id.as_u64()), Some(1));
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct Database {
    shared: Arc<Shared>,
}

impl Database {
    /// Loads a store from a file path with default configuration.
    ///
    /// A missing file starts an empty store; the file appears on the
    /// first save. Must run inside a tokio runtime (the mutating API
    /// requires one as well).
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::CorruptStore`] if the file exists but cannot
    /// be decoded, or [`CoreError::Io`] for any other read failure.
    pub async fn load(path: impl Into<PathBuf>) -> CoreResult<Self> {
        Self::load_with_config(path, Config::default()).await
    }

    /// Loads a store from a file path with custom configuration.
    pub async fn load_with_config(path: impl Into<PathBuf>, config: Config) -> CoreResult<Self> {
        let path = path.into();
        match tokio::task::spawn_blocking(move || Self::load_sync_with_config(path, config)).await
        {
            Ok(result) => result,
            Err(err) => Err(CoreError::task_failed(format!("load task: {err}"))),
        }
    }

    /// Synchronous variant of [`load`](Self::load) with default
    /// configuration.
    ///
    /// Useful during startup before an async runtime exists. Mutating
    /// operations on the loaded store still require one.
    pub fn load_sync(path: impl Into<PathBuf>) -> CoreResult<Self> {
        Self::load_sync_with_config(path, Config::default())
    }

    /// Synchronous variant of [`load_with_config`](Self::load_with_config).
    pub fn load_sync_with_config(path: impl Into<PathBuf>, config: Config) -> CoreResult<Self> {
        let backend = FileBackend::new(path.into()).with_sync_on_write(config.sync_on_save);
        Self::with_backend(Arc::new(backend), config)
    }

    /// Creates an empty memory-backed store.
    ///
    /// Nothing is persisted beyond the process; useful for tests and
    /// ephemeral data.
    #[must_use]
    pub fn in_memory() -> Self {
        Self::from_parts(
            Arc::new(MemoryBackend::new()),
            Config::default(),
            BTreeMap::new(),
        )
    }

    /// Opens a store over a pre-configured backend.
    ///
    /// This is the lower-level constructor behind the `load` family;
    /// tests use it to observe or disturb writes through instrumented
    /// backends.
    pub fn with_backend(backend: Arc<dyn StorageBackend>, config: Config) -> CoreResult<Self> {
        let collections = decode_document(backend.as_ref())?;
        let records: usize = collections.values().map(CollectionData::len).sum();
        debug!(
            store = %backend.describe(),
            collections = collections.len(),
            records,
            "loaded store"
        );
        Ok(Self::from_parts(backend, config, collections))
    }

    fn from_parts(
        backend: Arc<dyn StorageBackend>,
        config: Config,
        collections: BTreeMap<String, CollectionData>,
    ) -> Self {
        Self {
            shared: Arc::new(Shared {
                backend,
                config,
                collections: RwLock::new(collections),
                save: Mutex::new(SaveState::Idle),
            }),
        }
    }

    /// Returns a handle to the named collection, creating it empty if it
    /// does not exist yet.
    ///
    /// The created collection becomes part of the persisted document on
    /// the next save.
    pub fn collection(&self, name: impl Into<String>) -> Collection {
        let name = name.into();
        {
            let mut collections = self.shared.collections.write();
            collections.entry(name.clone()).or_default();
        }
        Collection::new(name, Arc::clone(&self.shared))
    }

    /// Creates a new named collection, failing if the name is taken.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::CollectionExists`] if a collection with this
    /// name already exists.
    pub fn create_collection(&self, name: impl Into<String>) -> CoreResult<Collection> {
        let name = name.into();
        {
            let mut collections = self.shared.collections.write();
            if collections.contains_key(&name) {
                return Err(CoreError::collection_exists(name));
            }
            collections.insert(name.clone(), CollectionData::default());
        }
        Ok(Collection::new(name, Arc::clone(&self.shared)))
    }

    /// Names of all collections, sorted.
    #[must_use]
    pub fn collection_names(&self) -> Vec<String> {
        self.shared.collections.read().keys().cloned().collect()
    }

    /// Persists the current snapshot of every collection.
    ///
    /// Mutating operations schedule this themselves; call it directly to
    /// persist collections created empty, or to force a write at a known
    /// point. Resolves once a write that began at or after this call is
    /// durable; concurrent calls coalesce into at most one follow-up
    /// write.
    pub async fn save(&self) -> CoreResult<()> {
        crate::save::request_save(&self.shared).await
    }

    /// The configuration the store was loaded with.
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.shared.config
    }
}

/// Reads and decodes the backing document into collection state.
///
/// A missing document, or one that is empty or whitespace-only, is an
/// empty store. Anything else must be a JSON object mapping collection
/// names to record arrays, with a usable unique id on every record.
fn decode_document(backend: &dyn StorageBackend) -> CoreResult<BTreeMap<String, CollectionData>> {
    let bytes = match backend.read()? {
        Some(bytes) => bytes,
        None => return Ok(BTreeMap::new()),
    };

    let text = String::from_utf8(bytes).map_err(|err| {
        CoreError::corrupt_store(backend.describe(), format!("not UTF-8: {err}"))
    })?;
    if text.trim().is_empty() {
        return Ok(BTreeMap::new());
    }

    let decoded: BTreeMap<String, Vec<Record>> = serde_json::from_str(&text)
        .map_err(|err| CoreError::corrupt_store(backend.describe(), err.to_string()))?;

    let mut collections = BTreeMap::new();
    for (name, records) in decoded {
        let data = CollectionData::from_records(records).map_err(|reason| {
            CoreError::corrupt_store(backend.describe(), format!("collection {name:?}: {reason}"))
        })?;
        collections.insert(name, data);
    }
    Ok(collections)
}

impl fmt::Debug for Database {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Database")
            .field("store", &self.shared.backend.describe())
            .field("collections", &self.collection_names())
            .finish_non_exhaustive()
    }
}
