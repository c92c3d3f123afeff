//! Records and record ids.

use crate::error::{CoreError, CoreResult};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Name of the reserved id field.
pub const ID_FIELD: &str = "id";

/// Unique identifier of a record within its collection.
///
/// Ids are positive integers. The collection allocates them as
/// `max(existing ids) + 1`, starting at 1; zero is never a valid id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RecordId(pub u64);

impl RecordId {
    /// Creates a record id from a raw value.
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the raw id value.
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }

    /// Reads an id out of a JSON value, coercing where the value clearly
    /// denotes an integer.
    ///
    /// Accepted forms: a positive integer, a float with an exact positive
    /// integral value (`3.0`), and a string holding a positive integer
    /// (`"3"`). `Null` and zero mean "not assigned yet" and come back as
    /// `Ok(None)`. Anything else is an [`CoreError::InvalidId`].
    pub(crate) fn from_value(value: &Value) -> CoreResult<Option<Self>> {
        match value {
            Value::Null => Ok(None),
            Value::Number(number) => {
                if let Some(id) = number.as_u64() {
                    if id == 0 {
                        Ok(None)
                    } else {
                        Ok(Some(Self(id)))
                    }
                } else if let Some(float) = number.as_f64() {
                    // `u64::MAX as f64` rounds up to 2^64, which would
                    // saturate on the cast below; the bound must be strict.
                    if float.fract() == 0.0 && float >= 0.0 && float < u64::MAX as f64 {
                        let id = float as u64;
                        if id == 0 {
                            Ok(None)
                        } else {
                            Ok(Some(Self(id)))
                        }
                    } else {
                        Err(CoreError::invalid_id(value.to_string()))
                    }
                } else {
                    // Negative integer.
                    Err(CoreError::invalid_id(value.to_string()))
                }
            }
            Value::String(text) => match text.trim().parse::<u64>() {
                Ok(0) => Ok(None),
                Ok(id) => Ok(Some(Self(id))),
                Err(_) => Err(CoreError::invalid_id(value.to_string())),
            },
            other => Err(CoreError::invalid_id(other.to_string())),
        }
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for RecordId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

/// A single record: a schema-less JSON object with a reserved `id` field.
///
/// The store never interprets fields other than [`ID_FIELD`]. Records are
/// value types from the caller's perspective: every accessor on a
/// collection hands out an independent copy, so mutating a returned
/// record never changes stored state.
///
/// A record serializes as the plain JSON object it wraps.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record {
    fields: Map<String, Value>,
}

impl Record {
    /// Creates an empty record with no fields and no id.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Wraps a JSON object in a record.
    ///
    /// Returns `None` if `value` is not a JSON object.
    #[must_use]
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Object(fields) => Some(Self { fields }),
            _ => None,
        }
    }

    /// Adds a field, consuming and returning the record.
    ///
    /// Convenient for building records inline:
    ///
    /// ```rust
    /// use tomedb_core::Record;
    ///
    /// let record = Record::new().with("title", "buy milk").with("done", false);
    /// assert_eq!(record.get("done"), Some(&false.into()));
    /// ```
    #[must_use]
    pub fn with(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(field.into(), value.into());
        self
    }

    /// Returns a field value, if present.
    #[must_use]
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    /// Sets a field value.
    pub fn set(&mut self, field: impl Into<String>, value: impl Into<Value>) {
        self.fields.insert(field.into(), value.into());
    }

    /// Removes a field, returning its previous value.
    pub fn remove(&mut self, field: &str) -> Option<Value> {
        self.fields.remove(field)
    }

    /// The record's id, if it has one in normalized form.
    ///
    /// Records handed out by a collection always carry a normalized id (a
    /// positive integer number). Hand-built records may hold the id in a
    /// coercible form instead; `store` resolves those.
    #[must_use]
    pub fn id(&self) -> Option<RecordId> {
        let id = self.fields.get(ID_FIELD)?.as_u64()?;
        if id == 0 {
            None
        } else {
            Some(RecordId(id))
        }
    }

    /// Borrows the underlying field map.
    #[must_use]
    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    /// Reads the id field with input coercion, as `store` sees it.
    pub(crate) fn coerced_id(&self) -> CoreResult<Option<RecordId>> {
        match self.fields.get(ID_FIELD) {
            Some(value) => RecordId::from_value(value),
            None => Ok(None),
        }
    }

    /// Writes the id field in normalized form.
    pub(crate) fn set_id(&mut self, id: RecordId) {
        self.fields
            .insert(ID_FIELD.to_string(), Value::from(id.as_u64()));
    }

    /// Shallow-merges another record's fields onto this one.
    ///
    /// Existing fields with the same name are overwritten; other fields
    /// are kept.
    pub(crate) fn merge(&mut self, changes: &Record) {
        for (field, value) in &changes.fields {
            self.fields.insert(field.clone(), value.clone());
        }
    }
}

impl From<Map<String, Value>> for Record {
    fn from(fields: Map<String, Value>) -> Self {
        Self { fields }
    }
}
