//! Error types for tomedb core.

use std::sync::Arc;
use thiserror::Error;
use tomedb_storage::StorageError;

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors that can occur in tomedb core operations.
///
/// The enum is `Clone` (causes are held behind `Arc`) because a single
/// write outcome is delivered to every save call coalesced into it.
#[derive(Debug, Clone, Error)]
pub enum CoreError {
    /// Reading or writing the backing store failed.
    #[error("I/O error: {0}")]
    Io(#[source] Arc<StorageError>),

    /// A supplied record id could not be read as a positive integer.
    #[error("invalid record id: {value}")]
    InvalidId {
        /// Rendering of the offending id value.
        value: String,
    },

    /// An update attempted to set a field that updates may never change.
    #[error("field `{field}` cannot be changed by an update")]
    ImmutableField {
        /// Name of the protected field.
        field: String,
    },

    /// Explicit creation of a collection name that is already taken.
    #[error("collection already exists: {name}")]
    CollectionExists {
        /// The requested collection name.
        name: String,
    },

    /// The persisted document could not be decoded into collections.
    #[error("corrupt store at {path}: {reason}")]
    CorruptStore {
        /// Location of the backing document.
        path: String,
        /// What was wrong with it.
        reason: String,
    },

    /// Serializing the snapshot for a write failed.
    #[error("failed to encode snapshot: {0}")]
    Encode(#[source] Arc<serde_json::Error>),

    /// A background task stopped before reporting its outcome.
    #[error("background task failed: {reason}")]
    TaskFailed {
        /// What the task was doing.
        reason: String,
    },
}

impl CoreError {
    /// Creates an invalid id error from the offending value.
    pub fn invalid_id(value: impl Into<String>) -> Self {
        Self::InvalidId {
            value: value.into(),
        }
    }

    /// Creates an immutable field error.
    pub fn immutable_field(field: impl Into<String>) -> Self {
        Self::ImmutableField {
            field: field.into(),
        }
    }

    /// Creates a collection exists error.
    pub fn collection_exists(name: impl Into<String>) -> Self {
        Self::CollectionExists { name: name.into() }
    }

    /// Creates a corrupt store error.
    pub fn corrupt_store(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::CorruptStore {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Creates a task failed error.
    pub fn task_failed(reason: impl Into<String>) -> Self {
        Self::TaskFailed {
            reason: reason.into(),
        }
    }
}

impl From<StorageError> for CoreError {
    fn from(err: StorageError) -> Self {
        Self::Io(Arc::new(err))
    }
}

impl From<serde_json::Error> for CoreError {
    fn from(err: serde_json::Error) -> Self {
        Self::Encode(Arc::new(err))
    }
}
