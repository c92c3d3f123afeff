//! # TomeDB Testkit
//!
//! Test utilities for TomeDB.
//!
//! This crate provides:
//! - Temporary-directory store fixtures with automatic cleanup
//! - Property-based test generators using proptest
//! - Instrumented storage backends that count, hold, or fail writes
//!
//! ## Usage
//!
//! ```rust,ignore
//! use tomedb_testkit::prelude::*;
//!
//! #[tokio::test]
//! async fn survives_a_reload() {
//!     let store = TestStore::new().await;
//!     // ... store records, then:
//!     let reloaded = store.reload().await.unwrap();
//! }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod backends;
pub mod fixtures;
pub mod generators;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::backends::*;
    pub use crate::fixtures::*;
    pub use crate::generators::*;
}

pub use backends::*;
pub use fixtures::*;
pub use generators::*;
