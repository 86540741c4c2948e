//! Storage collaborator traits
//!
//! The engine never talks to a concrete database. Search strategies consume
//! [`EmbeddingSource`]; the validated CRUD layer additionally needs
//! [`EmbeddingSink`]. Implementations live in `embedstore-storage`.
//!
//! # Ordering Contract
//!
//! Every implementation exposes one total order over ids (insertion order).
//! `fetch_all`, `fetch_ids` and repeated `fetch_adjacent(.., Next)` calls must
//! all visit records in that order; search strategies rely on it to produce
//! identical results.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::codec;
use crate::embedding::Embedding;
use crate::error::{EmbedError, EmbedResult};
use crate::types::ElementType;

/// A stored row before decoding
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawEmbedding {
    /// Record identifier
    pub id: String,
    /// Flat little-endian payload
    pub payload: Vec<u8>,
    /// Registered type name the payload was encoded with
    pub type_name: String,
}

impl RawEmbedding {
    /// Create a new raw row
    pub fn new(id: impl Into<String>, payload: Vec<u8>, type_name: impl Into<String>) -> Self {
        RawEmbedding {
            id: id.into(),
            payload,
            type_name: type_name.into(),
        }
    }

    /// Decode the payload, expecting `length` elements
    pub fn decode(&self, length: usize) -> EmbedResult<Embedding> {
        codec::decode(&self.payload, &self.type_name, length)
    }

    /// Decode into a typed record
    pub fn into_record(self, length: usize) -> EmbedResult<EmbeddingRecord> {
        let embedding = self.decode(length)?;
        Ok(EmbeddingRecord {
            id: self.id,
            embedding,
        })
    }
}

/// A decoded record
#[derive(Debug, Clone, PartialEq)]
pub struct EmbeddingRecord {
    /// Record identifier
    pub id: String,
    /// Decoded vector
    pub embedding: Embedding,
}

/// Per-database settings and cached bookkeeping
///
/// `element_type` and `dimension` are immutable after initialization.
/// `count` is a reporting cache, not a source of truth.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseMeta {
    /// Element type of every stored vector
    pub element_type: ElementType,
    /// Length of every stored vector
    pub dimension: usize,
    /// Free-text description
    pub description: String,
    /// Cached record count
    pub count: u64,
}

impl DatabaseMeta {
    /// Create meta for a fresh database
    pub fn new(element_type: ElementType, dimension: usize, description: impl Into<String>) -> Self {
        DatabaseMeta {
            element_type,
            dimension,
            description: description.into(),
            count: 0,
        }
    }
}

/// Traversal direction for adjacency queries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Towards later records
    #[default]
    Next,
    /// Towards earlier records
    Previous,
}

impl Direction {
    /// Parse `"next"`, `"previous"` or `"prev"` (case-insensitive)
    pub fn parse(s: &str) -> EmbedResult<Self> {
        match s.to_ascii_lowercase().as_str() {
            "next" => Ok(Direction::Next),
            "previous" | "prev" => Ok(Direction::Previous),
            other => Err(EmbedError::invalid_input(format!(
                "direction must be \"next\" or \"previous\", got \"{}\"",
                other
            ))),
        }
    }
}

/// Read side of the storage collaborator
///
/// Errors from the underlying store surface as `EmbedError::Collaborator`.
pub trait EmbeddingSource {
    /// Element type and vector length declared at initialization
    ///
    /// Fails with `NotFound` if the database was never initialized.
    fn declared_meta(&self) -> EmbedResult<DatabaseMeta>;

    /// Every row, in id order
    fn fetch_all(&self) -> EmbedResult<Vec<RawEmbedding>>;

    /// Every id, in id order
    fn fetch_ids(&self) -> EmbedResult<Vec<String>>;

    /// Rows for a subset of ids; absent ids are omitted from the map
    fn fetch_by_ids(&self, ids: &[String]) -> EmbedResult<HashMap<String, RawEmbedding>>;

    /// A single row, `None` if absent
    fn fetch_one(&self, id: &str) -> EmbedResult<Option<RawEmbedding>>;

    /// The row adjacent to `current` in `direction`
    ///
    /// `None` as `current` anchors at the first (`Next`) or last (`Previous`)
    /// record. Returns `Ok(None)` when the traversal is exhausted and
    /// `NotFound` when `current` itself does not exist.
    fn fetch_adjacent(
        &self,
        current: Option<&str>,
        direction: Direction,
    ) -> EmbedResult<Option<RawEmbedding>>;

    /// Up to `n` rows chosen uniformly at random
    fn fetch_random(&self, n: usize) -> EmbedResult<Vec<RawEmbedding>>;

    /// Exact number of stored rows
    fn count(&self) -> EmbedResult<u64>;
}

/// Write side of the storage collaborator
///
/// Every multi-row operation is atomic: it either applies to all rows or
/// leaves the table untouched.
pub trait EmbeddingSink: EmbeddingSource {
    /// Persist the meta row; the caller has already checked compatibility
    fn initialize(&mut self, meta: &DatabaseMeta) -> EmbedResult<()>;

    /// Meta row if the database has been initialized
    fn stored_meta(&self) -> EmbedResult<Option<DatabaseMeta>>;

    /// Insert new rows; an id that already exists fails the whole batch
    fn insert_rows(&mut self, rows: &[RawEmbedding]) -> EmbedResult<()>;

    /// Replace payloads of existing rows; a missing id is `NotFound`
    fn update_rows(&mut self, rows: &[RawEmbedding]) -> EmbedResult<()>;

    /// Delete rows by id, ignoring absent ids; returns the number removed
    fn delete_rows(&mut self, ids: &[String]) -> EmbedResult<u64>;

    /// Delete every row and reset the cached count
    fn delete_all(&mut self) -> EmbedResult<()>;

    /// Replace the description
    fn set_description(&mut self, description: &str) -> EmbedResult<()>;

    /// Replace the cached count
    fn set_cached_count(&mut self, count: u64) -> EmbedResult<()>;
}
