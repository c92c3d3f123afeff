//! # TomeDB Core
//!
//! Embedded JSON record store for TomeDB.
//!
//! This crate provides:
//! - A [`Database`] of named collections persisted to one JSON document
//! - [`Collection`] handles for storing, querying, and updating records
//! - Schemaless [`Record`]s with store-managed integer ids
//! - Coalesced, atomic whole-document saves
//!
//! ```rust
//! use tomedb_core::{Database, Record};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> tomedb_core::CoreResult<()> {
//! let db = Database::in_memory();
//! let todos = db.collection("todos");
//!
//! todos
//!     .store(Record::new().with("title", "water plants").with("done", false))
//!     .await?;
//! todos
//!     .update(&Record::new().with("done", true), |todo| {
//!         todo.get("title").and_then(|v| v.as_str()) == Some("water plants")
//!     })
//!     .await?;
//!
//! assert!(todos.any(|todo| todo.get("done").and_then(|v| v.as_bool()) == Some(true)));
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod collection;
mod config;
mod database;
mod error;
mod record;
mod save;

pub use collection::Collection;
pub use config::Config;
pub use database::Database;
pub use error::{CoreError, CoreResult};
pub use record::{Record, RecordId, ID_FIELD};
