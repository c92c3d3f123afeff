//! Named record collections: lookup, id allocation, store/delete/update.

use crate::database::Shared;
use crate::error::{CoreError, CoreResult};
use crate::record::{Record, RecordId, ID_FIELD};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// In-memory state of one collection: records in insertion order plus a
/// derived id index.
///
/// Invariants: `index` and `records` always describe the same set of
/// records, every stored record carries a positive integer id, and ids
/// are unique. Mutations keep the index in sync; loads rebuild it.
#[derive(Debug, Default)]
pub(crate) struct CollectionData {
    /// Records in insertion order. Order only affects serialization
    /// stability, never lookup.
    records: Vec<Record>,
    /// id -> position in `records`.
    index: HashMap<u64, usize>,
}

impl CollectionData {
    /// Rebuilds collection state from decoded records.
    ///
    /// Every record must carry a usable, unique id; `Err` carries a
    /// description for corrupt-store reporting. Coercible id forms
    /// (strings, integral floats) are normalized here so the in-memory
    /// state always holds plain integers.
    pub(crate) fn from_records(records: Vec<Record>) -> Result<Self, String> {
        let mut data = Self::default();
        for (position, mut record) in records.into_iter().enumerate() {
            let id = match record.coerced_id() {
                Ok(Some(id)) => id,
                Ok(None) => return Err(format!("record at index {position} has no id")),
                Err(err) => return Err(format!("record at index {position}: {err}")),
            };
            if data.index.contains_key(&id.as_u64()) {
                return Err(format!("duplicate id {id} at index {position}"));
            }
            record.set_id(id);
            data.index.insert(id.as_u64(), data.records.len());
            data.records.push(record);
        }
        Ok(data)
    }

    /// Highest id currently in use, or 0 for an empty collection.
    fn highest_id(&self) -> u64 {
        self.index.keys().copied().max().unwrap_or(0)
    }

    /// The id a new record receives: `max(existing ids) + 1`, or 1 for
    /// an empty collection. Fails once the id space is exhausted.
    fn next_id(&self) -> CoreResult<RecordId> {
        let highest = self.highest_id();
        highest
            .checked_add(1)
            .map(RecordId::new)
            .ok_or_else(|| CoreError::invalid_id(format!("id space exhausted at {highest}")))
    }

    /// Stores one record with a pre-resolved id, allocating if `None`.
    ///
    /// A record whose id matches an existing one replaces it whole: the
    /// old record is dropped and the new one appended, like a fresh
    /// insert. Returns a copy of what was stored.
    pub(crate) fn apply_store(
        &mut self,
        mut record: Record,
        resolved: Option<RecordId>,
    ) -> CoreResult<Record> {
        let id = match resolved {
            Some(id) => id,
            None => self.next_id()?,
        };
        record.set_id(id);
        self.remove(id);
        self.index.insert(id.as_u64(), self.records.len());
        self.records.push(record.clone());
        Ok(record)
    }

    /// Stores a batch of records, resolving all ids before applying any.
    ///
    /// An invalid id or an exhausted id space anywhere in the batch
    /// leaves the collection untouched.
    pub(crate) fn store_batch(&mut self, records: Vec<Record>) -> CoreResult<Vec<Record>> {
        let mut resolved = Vec::with_capacity(records.len());
        for record in &records {
            resolved.push(record.coerced_id()?);
        }

        // Walk the allocations the batch will make so an overflow is
        // caught before any record is applied.
        let mut highest = self.highest_id();
        for id in &resolved {
            highest = match id {
                Some(id) => highest.max(id.as_u64()),
                None => highest.checked_add(1).ok_or_else(|| {
                    CoreError::invalid_id(format!("id space exhausted at {highest}"))
                })?,
            };
        }

        let mut stored = Vec::with_capacity(records.len());
        for (record, id) in records.into_iter().zip(resolved) {
            stored.push(self.apply_store(record, id)?);
        }
        Ok(stored)
    }

    /// Removes a record by id, returning it.
    pub(crate) fn remove(&mut self, id: RecordId) -> Option<Record> {
        let position = self.index.remove(&id.as_u64())?;
        let record = self.records.remove(position);
        // Records after the removed one shifted down by one.
        for slot in self.index.values_mut() {
            if *slot > position {
                *slot -= 1;
            }
        }
        Some(record)
    }

    /// Looks up a record by id.
    pub(crate) fn get(&self, id: RecordId) -> Option<&Record> {
        let position = *self.index.get(&id.as_u64())?;
        self.records.get(position)
    }

    /// All records in storage order.
    pub(crate) fn records(&self) -> &[Record] {
        &self.records
    }

    /// Number of records.
    pub(crate) fn len(&self) -> usize {
        self.records.len()
    }
}

/// A named set of records inside a [`Database`](crate::Database).
///
/// Handles are cheap to clone and share the owning database's state;
/// every mutation through any handle is applied in memory immediately
/// and then persisted through the database's coalescing save scheduler.
///
/// Reads are synchronous and return independent copies. Filtering uses
/// plain Rust predicates rather than a query language:
///
/// ```rust
/// use tomedb_core::{Database, Record};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> tomedb_core::CoreResult<()> {
/// let db = Database::in_memory();
/// let todos = db.collection("todos");
///
/// todos.store(Record::new().with("title", "water plants")).await?;
/// let open = todos.filter(|todo| todo.get("done").is_none());
/// assert_eq!(open.len(), 1);
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct Collection {
    name: String,
    shared: Arc<Shared>,
}

impl Collection {
    pub(crate) fn new(name: String, shared: Arc<Shared>) -> Self {
        Self { name, shared }
    }

    /// The collection's name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns copies of all records in storage order.
    #[must_use]
    pub fn list(&self) -> Vec<Record> {
        let collections = self.shared.collections.read();
        match collections.get(&self.name) {
            Some(data) => data.records().to_vec(),
            None => Vec::new(),
        }
    }

    /// Returns a copy of the record with the given id.
    #[must_use]
    pub fn get(&self, id: impl Into<RecordId>) -> Option<Record> {
        let collections = self.shared.collections.read();
        collections.get(&self.name)?.get(id.into()).cloned()
    }

    /// Returns the first record matching the predicate.
    #[must_use]
    pub fn find(&self, predicate: impl Fn(&Record) -> bool) -> Option<Record> {
        self.list().into_iter().find(|record| predicate(record))
    }

    /// Returns all records matching the predicate.
    #[must_use]
    pub fn filter(&self, predicate: impl Fn(&Record) -> bool) -> Vec<Record> {
        self.list()
            .into_iter()
            .filter(|record| predicate(record))
            .collect()
    }

    /// Whether any record matches the predicate.
    #[must_use]
    pub fn any(&self, predicate: impl Fn(&Record) -> bool) -> bool {
        self.list().iter().any(|record| predicate(record))
    }

    /// Number of records in the collection.
    #[must_use]
    pub fn len(&self) -> usize {
        let collections = self.shared.collections.read();
        collections.get(&self.name).map_or(0, CollectionData::len)
    }

    /// Whether the collection has no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Stores one record and persists the store.
    ///
    /// Id policy:
    /// - no id (absent, `null`, or zero): a fresh id is allocated as
    ///   `max(existing ids) + 1`, or 1 for an empty collection
    /// - an id matching an existing record: that record is replaced
    ///   whole, never field-merged
    /// - an id that cannot be read as a positive integer: the call fails
    ///   with [`CoreError::InvalidId`] before anything changes
    ///
    /// Returns an independent copy of the stored record with its id set.
    /// The in-memory change is visible to readers immediately; the
    /// returned future resolves once a write containing it is durable.
    pub async fn store(&self, record: Record) -> CoreResult<Record> {
        let stored = {
            let resolved = record.coerced_id()?;
            let mut collections = self.shared.collections.write();
            let data = collections.entry(self.name.clone()).or_default();
            data.apply_store(record, resolved)?
        };
        crate::save::request_save(&self.shared).await?;
        Ok(stored)
    }

    /// Stores a batch of records with a single persistence request.
    ///
    /// Applies the same id policy as [`store`](Self::store) per record;
    /// ids allocated within one batch are sequential. An invalid id in
    /// any record fails the whole call before anything changes. All
    /// records resolve together with the one underlying write.
    pub async fn store_many(&self, records: Vec<Record>) -> CoreResult<Vec<Record>> {
        let stored = {
            let mut collections = self.shared.collections.write();
            let data = collections.entry(self.name.clone()).or_default();
            data.store_batch(records)?
        };
        crate::save::request_save(&self.shared).await?;
        Ok(stored)
    }

    /// Removes the record with the given id and persists the change.
    ///
    /// Returns the removed record, or `None` if the id was not present
    /// (the persistence request is made either way).
    pub async fn delete(&self, id: impl Into<RecordId>) -> CoreResult<Option<Record>> {
        let removed = {
            let mut collections = self.shared.collections.write();
            let data = collections.entry(self.name.clone()).or_default();
            data.remove(id.into())
        };
        crate::save::request_save(&self.shared).await?;
        Ok(removed)
    }

    /// Removes a batch of records with a single persistence request.
    ///
    /// The result has one entry per requested id, `None` where nothing
    /// was stored under it. An empty batch resolves immediately without
    /// touching storage.
    pub async fn delete_many(&self, ids: &[RecordId]) -> CoreResult<Vec<Option<Record>>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let removed = {
            let mut collections = self.shared.collections.write();
            let data = collections.entry(self.name.clone()).or_default();
            ids.iter().map(|id| data.remove(*id)).collect()
        };
        crate::save::request_save(&self.shared).await?;
        Ok(removed)
    }

    /// Shallow-merges `changes` onto every record matching the predicate
    /// and stores the merged records.
    ///
    /// Fails with [`CoreError::ImmutableField`] before touching anything
    /// if `changes` tries to set the id field. Returns the updated
    /// records.
    pub async fn update(
        &self,
        changes: &Record,
        predicate: impl Fn(&Record) -> bool,
    ) -> CoreResult<Vec<Record>> {
        ensure_updatable(changes)?;
        let merged: Vec<Record> = self
            .list()
            .into_iter()
            .filter(|record| predicate(record))
            .map(|mut record| {
                record.merge(changes);
                record
            })
            .collect();
        self.store_many(merged).await
    }

    /// Shallow-merges `changes` onto the record with the given id.
    ///
    /// Returns `Ok(None)` without touching storage if no record has
    /// that id. Fails with [`CoreError::ImmutableField`] if `changes`
    /// tries to set the id field.
    pub async fn update_by_id(
        &self,
        changes: &Record,
        id: impl Into<RecordId>,
    ) -> CoreResult<Option<Record>> {
        ensure_updatable(changes)?;
        let merged = {
            let collections = self.shared.collections.read();
            collections
                .get(&self.name)
                .and_then(|data| data.get(id.into()).cloned())
        };
        match merged {
            None => Ok(None),
            Some(mut record) => {
                record.merge(changes);
                let stored = self.store(record).await?;
                Ok(Some(stored))
            }
        }
    }
}

/// Rejects change sets that try to touch the reserved id field.
fn ensure_updatable(changes: &Record) -> CoreResult<()> {
    if changes.get(ID_FIELD).is_some() {
        return Err(CoreError::immutable_field(ID_FIELD));
    }
    Ok(())
}

impl fmt::Debug for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Collection")
            .field("name", &self.name)
            .field("len", &self.len())
            .finish()
    }
}
