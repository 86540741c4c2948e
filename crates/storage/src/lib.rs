//! Storage collaborators for embedstore
//!
//! This crate implements the `EmbeddingSource` / `EmbeddingSink` traits with:
//! - SqliteStore: durable single-file table via rusqlite (WAL journal)
//! - MemoryStore: insertion-ordered table behind a `parking_lot::RwLock`
//!
//! Both order ids by insertion and apply multi-row writes atomically.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod memory;
pub mod sqlite;

pub use error::StorageError;
pub use memory::MemoryStore;
pub use sqlite::{SqliteOptions, SqliteStore};
