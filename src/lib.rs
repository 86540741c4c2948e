//! embedstore - Embedded embedding store with exact nearest-neighbor search
//!
//! embedstore keeps a table of id → numeric vector records with one element
//! type and one vector length per database, and answers exact top-k queries
//! over it.
//!
//! # Quick Start
//!
//! ```ignore
//! use embedstore::{EmbeddingDb, EngineConfig, Embedding, SearchStrategy};
//!
//! let mut db = EmbeddingDb::open("vectors.db", EngineConfig::default())?;
//! db.initialize(3, "float32", "demo")?;
//! db.insert_one("1", Embedding::Float32(vec![1.0, 0.0, 0.0]))?;
//!
//! let hits = db.search(
//!     &Embedding::Float32(vec![1.0, 0.0, 0.0]),
//!     "euclidean",
//!     2,
//!     SearchStrategy::WholeTable,
//! )?;
//! ```
//!
//! # Architecture
//!
//! - `embedstore-core`: element types, `BigFloat`, typed `Embedding`, payload
//!   codec, collaborator traits
//! - `embedstore-storage`: `SqliteStore` and `MemoryStore`
//! - `embedstore-engine`: metrics, top-k selector, search strategies,
//!   `EmbeddingDb`, configuration

pub use embedstore_core::*;
pub use embedstore_engine::*;
pub use embedstore_storage::{MemoryStore, SqliteOptions, SqliteStore, StorageError};
