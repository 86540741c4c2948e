//! MemoryStore: in-process collaborator
//!
//! Rows live in a `BTreeMap<u64, RawEmbedding>` keyed by a monotonically
//! increasing sequence number, which gives the same insertion-order id
//! semantics as the SQLite `seq` column. An id → seq map serves point
//! lookups. All state sits behind one `parking_lot::RwLock`, so every write
//! is applied under a single lock acquisition and is atomic with respect to
//! readers.

use std::collections::{BTreeMap, HashMap};
use std::ops::Bound::{Excluded, Unbounded};
use std::sync::Arc;

use parking_lot::RwLock;
use rand::seq::SliceRandom;

use embedstore_core::{
    DatabaseMeta, Direction, EmbedError, EmbedResult, EmbeddingSink, EmbeddingSource,
    RawEmbedding,
};

#[derive(Debug, Default)]
struct Table {
    meta: Option<DatabaseMeta>,
    rows: BTreeMap<u64, RawEmbedding>,
    seq_by_id: HashMap<String, u64>,
    next_seq: u64,
}

impl Table {
    fn seq_of(&self, id: &str) -> EmbedResult<u64> {
        self.seq_by_id
            .get(id)
            .copied()
            .ok_or_else(|| EmbedError::not_found(id))
    }
}

/// In-memory embedding table
///
/// Cloning yields another handle to the same table.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Arc<RwLock<Table>>,
}

impl MemoryStore {
    /// Create an empty, uninitialized store
    pub fn new() -> Self {
        Self::default()
    }
}

impl EmbeddingSource for MemoryStore {
    fn declared_meta(&self) -> EmbedResult<DatabaseMeta> {
        self.inner
            .read()
            .meta
            .clone()
            .ok_or_else(|| EmbedError::not_found("embedding_meta"))
    }

    fn fetch_all(&self) -> EmbedResult<Vec<RawEmbedding>> {
        Ok(self.inner.read().rows.values().cloned().collect())
    }

    fn fetch_ids(&self) -> EmbedResult<Vec<String>> {
        Ok(self
            .inner
            .read()
            .rows
            .values()
            .map(|row| row.id.clone())
            .collect())
    }

    fn fetch_by_ids(&self, ids: &[String]) -> EmbedResult<HashMap<String, RawEmbedding>> {
        let table = self.inner.read();
        Ok(ids
            .iter()
            .filter_map(|id| {
                table
                    .seq_by_id
                    .get(id)
                    .and_then(|seq| table.rows.get(seq))
                    .map(|row| (id.clone(), row.clone()))
            })
            .collect())
    }

    fn fetch_one(&self, id: &str) -> EmbedResult<Option<RawEmbedding>> {
        let table = self.inner.read();
        Ok(table
            .seq_by_id
            .get(id)
            .and_then(|seq| table.rows.get(seq))
            .cloned())
    }

    fn fetch_adjacent(
        &self,
        current: Option<&str>,
        direction: Direction,
    ) -> EmbedResult<Option<RawEmbedding>> {
        let table = self.inner.read();
        let row = match (current, direction) {
            (None, Direction::Next) => table.rows.values().next(),
            (None, Direction::Previous) => table.rows.values().next_back(),
            (Some(id), Direction::Next) => {
                let seq = table.seq_of(id)?;
                table.rows.range((Excluded(seq), Unbounded)).next().map(|(_, r)| r)
            }
            (Some(id), Direction::Previous) => {
                let seq = table.seq_of(id)?;
                table.rows.range(..seq).next_back().map(|(_, r)| r)
            }
        };
        Ok(row.cloned())
    }

    fn fetch_random(&self, n: usize) -> EmbedResult<Vec<RawEmbedding>> {
        let table = self.inner.read();
        let rows: Vec<&RawEmbedding> = table.rows.values().collect();
        let mut rng = rand::thread_rng();
        Ok(rows
            .choose_multiple(&mut rng, n)
            .map(|row| (*row).clone())
            .collect())
    }

    fn count(&self) -> EmbedResult<u64> {
        Ok(self.inner.read().rows.len() as u64)
    }
}

impl EmbeddingSink for MemoryStore {
    fn initialize(&mut self, meta: &DatabaseMeta) -> EmbedResult<()> {
        self.inner.write().meta = Some(meta.clone());
        Ok(())
    }

    fn stored_meta(&self) -> EmbedResult<Option<DatabaseMeta>> {
        Ok(self.inner.read().meta.clone())
    }

    fn insert_rows(&mut self, rows: &[RawEmbedding]) -> EmbedResult<()> {
        let mut table = self.inner.write();

        let mut seen = std::collections::HashSet::with_capacity(rows.len());
        for row in rows {
            if table.seq_by_id.contains_key(&row.id) || !seen.insert(row.id.as_str()) {
                return Err(EmbedError::invalid_input(format!(
                    "id '{}' already exists",
                    row.id
                )));
            }
        }

        for row in rows {
            table.next_seq += 1;
            let seq = table.next_seq;
            table.seq_by_id.insert(row.id.clone(), seq);
            table.rows.insert(seq, row.clone());
        }
        Ok(())
    }

    fn update_rows(&mut self, rows: &[RawEmbedding]) -> EmbedResult<()> {
        let mut table = self.inner.write();

        let seqs = rows
            .iter()
            .map(|row| table.seq_of(&row.id))
            .collect::<EmbedResult<Vec<u64>>>()?;

        for (seq, row) in seqs.into_iter().zip(rows) {
            table.rows.insert(seq, row.clone());
        }
        Ok(())
    }

    fn delete_rows(&mut self, ids: &[String]) -> EmbedResult<u64> {
        let mut table = self.inner.write();
        let mut removed = 0;
        for id in ids {
            if let Some(seq) = table.seq_by_id.remove(id) {
                table.rows.remove(&seq);
                removed += 1;
            }
        }
        Ok(removed)
    }

    fn delete_all(&mut self) -> EmbedResult<()> {
        let mut table = self.inner.write();
        table.rows.clear();
        table.seq_by_id.clear();
        if let Some(meta) = table.meta.as_mut() {
            meta.count = 0;
        }
        Ok(())
    }

    fn set_description(&mut self, description: &str) -> EmbedResult<()> {
        let mut table = self.inner.write();
        let meta = table
            .meta
            .as_mut()
            .ok_or_else(|| EmbedError::not_found("embedding_meta"))?;
        meta.description = description.to_string();
        Ok(())
    }

    fn set_cached_count(&mut self, count: u64) -> EmbedResult<()> {
        let mut table = self.inner.write();
        let meta = table
            .meta
            .as_mut()
            .ok_or_else(|| EmbedError::not_found("embedding_meta"))?;
        meta.count = count;
        Ok(())
    }
}
