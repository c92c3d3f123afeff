//! # tomedb Storage
//!
//! Storage backend trait and implementations for tomedb.
//!
//! This crate provides the lowest-level storage abstraction for tomedb.
//! Backends are **whole-document byte stores**: they hold exactly one
//! opaque document and replace it atomically on every write. They do not
//! interpret the bytes they store.
//!
//! ## Design Principles
//!
//! - Backends hold one document (read all, replace all)
//! - A write is all-or-nothing: the previous document survives a failed write
//! - No knowledge of tomedb's JSON layout; the core owns interpretation
//! - Must be `Send + Sync` so a background writer can share them
//!
//! ## Available Backends
//!
//! - [`MemoryBackend`] - For testing and ephemeral stores
//! - [`FileBackend`] - Persistent storage via write-temp-then-rename
//!
//! ## Example
//!
//! ```rust
//! use tomedb_storage::{MemoryBackend, StorageBackend};
//!
//! let backend = MemoryBackend::new();
//! assert!(backend.read().unwrap().is_none());
//! backend.write(b"{\"notes\":[]}").unwrap();
//! assert_eq!(backend.read().unwrap().unwrap(), b"{\"notes\":[]}");
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod backend;
mod error;
mod file;
mod memory;

pub use backend::StorageBackend;
pub use error::{StorageError, StorageResult};
pub use file::{FileBackend, TEMP_SUFFIX};
pub use memory::MemoryBackend;
