//! EmbeddingDb: validated CRUD and search over a storage collaborator
//!
//! Every write is validated in full before the collaborator is touched, so a
//! rejected batch never alters the table:
//!
//! 1. `ids.len() == vectors.len()`
//! 2. batch size within `bulk_limit`
//! 3. ids non-empty and unique within the call
//! 4. every vector has the declared length
//! 5. every vector encodes exactly to the declared element type
//!
//! The cached record count in the meta row is refreshed after each write.

use std::collections::{BTreeMap, HashSet};
use std::path::Path;

use tracing::{debug, info, warn};

use embedstore_core::{
    check_bulk_limit, encode, DatabaseMeta, Direction, ElementType, EmbedError, EmbedResult,
    Embedding, EmbeddingRecord, EmbeddingSink, RawEmbedding,
};
use embedstore_storage::SqliteStore;

use crate::config::{EngineConfig, CONFIG_FILE_NAME};
use crate::distance::{MetricFn, MetricRegistry};
use crate::search::{SearchEngine, SearchStrategy};
use crate::topk::TopKEntry;

/// Embedding database over any [`EmbeddingSink`]
#[derive(Debug)]
pub struct EmbeddingDb<S: EmbeddingSink> {
    store: S,
    config: EngineConfig,
    engine: SearchEngine,
}

impl EmbeddingDb<SqliteStore> {
    /// Open a SQLite-backed database file with an explicit configuration
    pub fn open(path: impl AsRef<Path>, config: EngineConfig) -> EmbedResult<Self> {
        config.validate()?;
        let store = SqliteStore::open(path, &config.sqlite)?;
        Self::new(store, config)
    }

    /// Open a SQLite-backed database, reading `embedstore.toml` beside it
    ///
    /// A default config file is written if none exists.
    pub fn open_with_config_file(path: impl AsRef<Path>) -> EmbedResult<Self> {
        let path = path.as_ref();
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => std::path::PathBuf::from("."),
        };
        std::fs::create_dir_all(&dir).map_err(EmbedError::collaborator)?;

        let config_path = dir.join(CONFIG_FILE_NAME);
        EngineConfig::write_default_if_missing(&config_path)?;
        let config = EngineConfig::from_file(&config_path)?;
        Self::open(path, config)
    }

    /// Close the underlying connection
    pub fn close(self) -> EmbedResult<()> {
        self.store.close()
    }
}

impl<S: EmbeddingSink> EmbeddingDb<S> {
    /// Wrap a collaborator
    pub fn new(store: S, config: EngineConfig) -> EmbedResult<Self> {
        config.validate()?;
        let engine = SearchEngine::new(MetricRegistry::default(), config.parallel_threshold);
        Ok(EmbeddingDb {
            store,
            config,
            engine,
        })
    }

    /// The collaborator
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Active configuration
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Add a custom distance metric for subsequent searches
    pub fn register_metric(&mut self, name: &str, func: MetricFn) {
        self.engine.metrics_mut().register(name, func);
    }

    /// Metric names available to `search`, sorted
    pub fn metric_names(&self) -> Vec<String> {
        self.engine.metrics().names()
    }

    /// Declare element type and vector length
    ///
    /// Re-initializing with the same type and length is a no-op; anything
    /// else on an initialized database is `ConfigMismatch`.
    pub fn initialize(
        &mut self,
        dimension: usize,
        type_name: &str,
        description: &str,
    ) -> EmbedResult<DatabaseMeta> {
        if dimension == 0 {
            return Err(EmbedError::invalid_input("dimension must be at least 1"));
        }
        let element_type = ElementType::resolve(type_name)?;

        if let Some(existing) = self.store.stored_meta()? {
            if existing.element_type != element_type {
                return Err(EmbedError::ConfigMismatch {
                    field: "data_type".to_string(),
                    existing: existing.element_type.name().to_string(),
                    requested: element_type.name().to_string(),
                });
            }
            if existing.dimension != dimension {
                return Err(EmbedError::ConfigMismatch {
                    field: "embedding_length".to_string(),
                    existing: existing.dimension.to_string(),
                    requested: dimension.to_string(),
                });
            }
            return Ok(existing);
        }

        let mut meta = DatabaseMeta::new(element_type, dimension, description);
        meta.count = self.store.count()?;
        self.store.initialize(&meta)?;
        info!(
            target: "embedstore::db",
            data_type = element_type.name(),
            dimension,
            "Initialized embedding database"
        );
        Ok(meta)
    }

    /// Declared meta; `NotFound` before initialization
    pub fn meta(&self) -> EmbedResult<DatabaseMeta> {
        self.store.declared_meta()
    }

    /// Replace the free-text description
    pub fn update_description(&mut self, description: &str) -> EmbedResult<()> {
        self.store.set_description(description)
    }

    fn validate_batch(
        &self,
        meta: &DatabaseMeta,
        ids: &[String],
        vectors: &[Embedding],
    ) -> EmbedResult<Vec<RawEmbedding>> {
        if ids.len() != vectors.len() {
            return Err(EmbedError::invalid_input(format!(
                "{} ids but {} vectors",
                ids.len(),
                vectors.len()
            )));
        }
        check_bulk_limit(ids.len(), self.config.bulk_limit)?;

        let mut seen = HashSet::with_capacity(ids.len());
        for id in ids {
            if id.is_empty() {
                return Err(EmbedError::invalid_input("ids must be non-empty"));
            }
            if !seen.insert(id.as_str()) {
                return Err(EmbedError::invalid_input(format!(
                    "id '{}' appears more than once",
                    id
                )));
            }
        }

        let type_name = meta.element_type.name();
        ids.iter()
            .zip(vectors)
            .map(|(id, vector)| {
                if vector.len() != meta.dimension {
                    return Err(EmbedError::DimensionMismatch {
                        expected: meta.dimension,
                        got: vector.len(),
                    });
                }
                if self.config.strict_types && vector.element_type() != meta.element_type {
                    return Err(EmbedError::type_mismatch(format!(
                        "vector for '{}' is {}, database is declared {}",
                        id,
                        vector.element_type(),
                        type_name
                    )));
                }
                let payload = encode(vector, type_name)?;
                Ok(RawEmbedding::new(id.as_str(), payload, type_name))
            })
            .collect()
    }

    fn refresh_cached_count(&mut self) -> EmbedResult<u64> {
        let n = self.store.count()?;
        self.store.set_cached_count(n)?;
        Ok(n)
    }

    /// Insert new records; an id already stored rejects the whole batch
    pub fn insert(&mut self, ids: &[String], vectors: &[Embedding]) -> EmbedResult<()> {
        let meta = self.meta()?;
        let rows = self.validate_batch(&meta, ids, vectors)?;
        if rows.is_empty() {
            return Ok(());
        }

        let existing = self.store.fetch_by_ids(ids)?;
        if !existing.is_empty() {
            let mut taken: Vec<&str> = existing.keys().map(String::as_str).collect();
            taken.sort_unstable();
            return Err(EmbedError::invalid_input(format!(
                "ids already exist: {}",
                taken.join(", ")
            )));
        }

        self.store.insert_rows(&rows)?;
        let count = self.refresh_cached_count()?;
        debug!(target: "embedstore::db", inserted = rows.len(), count, "Inserted embeddings");
        Ok(())
    }

    /// Insert one record
    pub fn insert_one(&mut self, id: &str, vector: Embedding) -> EmbedResult<()> {
        self.insert(&[id.to_string()], &[vector])
    }

    /// Replace vectors of existing records; a missing id is `NotFound`
    pub fn update(&mut self, ids: &[String], vectors: &[Embedding]) -> EmbedResult<()> {
        let meta = self.meta()?;
        let rows = self.validate_batch(&meta, ids, vectors)?;
        if rows.is_empty() {
            return Ok(());
        }
        self.store.update_rows(&rows)?;
        debug!(target: "embedstore::db", updated = rows.len(), "Updated embeddings");
        Ok(())
    }

    /// Replace one record's vector
    pub fn update_one(&mut self, id: &str, vector: Embedding) -> EmbedResult<()> {
        self.update(&[id.to_string()], &[vector])
    }

    /// Delete records, ignoring absent ids; returns the number removed
    pub fn delete(&mut self, ids: &[String]) -> EmbedResult<u64> {
        check_bulk_limit(ids.len(), self.config.bulk_limit)?;
        let removed = self.store.delete_rows(ids)?;
        let count = self.refresh_cached_count()?;
        debug!(
            target: "embedstore::db",
            requested = ids.len(),
            removed,
            count,
            "Deleted embeddings"
        );
        Ok(removed)
    }

    /// Delete every record; the meta row is kept
    pub fn delete_all(&mut self) -> EmbedResult<()> {
        self.store.delete_all()?;
        info!(target: "embedstore::db", "Deleted all embeddings");
        Ok(())
    }

    /// One record's vector
    pub fn get(&self, id: &str) -> EmbedResult<Option<Embedding>> {
        let dimension = self.meta()?.dimension;
        self.store
            .fetch_one(id)?
            .map(|row| row.decode(dimension))
            .transpose()
    }

    /// Vectors for the given ids; absent ids are omitted
    pub fn get_many(&self, ids: &[String]) -> EmbedResult<BTreeMap<String, Embedding>> {
        let dimension = self.meta()?.dimension;
        self.store
            .fetch_by_ids(ids)?
            .into_values()
            .map(|row| {
                let embedding = row.decode(dimension)?;
                Ok((row.id, embedding))
            })
            .collect()
    }

    /// Every record in id order
    pub fn all_embeddings(&self) -> EmbedResult<Vec<EmbeddingRecord>> {
        let dimension = self.meta()?.dimension;
        self.store
            .fetch_all()?
            .into_iter()
            .map(|row| row.into_record(dimension))
            .collect()
    }

    /// Every id in id order
    pub fn all_ids(&self) -> EmbedResult<Vec<String>> {
        self.store.fetch_ids()
    }

    /// Up to `n` records chosen at random
    pub fn random(&self, n: usize) -> EmbedResult<Vec<EmbeddingRecord>> {
        let dimension = self.meta()?.dimension;
        self.store
            .fetch_random(n)?
            .into_iter()
            .map(|row| row.into_record(dimension))
            .collect()
    }

    /// Record next to `id` (or the first/last record when `id` is `None`)
    pub fn adjacent(
        &self,
        id: Option<&str>,
        direction: Direction,
    ) -> EmbedResult<Option<EmbeddingRecord>> {
        let dimension = self.meta()?.dimension;
        self.store
            .fetch_adjacent(id, direction)?
            .map(|row| row.into_record(dimension))
            .transpose()
    }

    /// Id of the record next to `id`
    pub fn adjacent_id(&self, id: Option<&str>, direction: Direction) -> EmbedResult<Option<String>> {
        Ok(self.store.fetch_adjacent(id, direction)?.map(|row| row.id))
    }

    /// Exact record count, optionally rewriting the cached count
    pub fn count(&mut self, refresh_meta: bool) -> EmbedResult<u64> {
        let n = self.store.count()?;
        if refresh_meta {
            let cached = self.meta()?.count;
            if cached != n {
                warn!(
                    target: "embedstore::db",
                    cached,
                    actual = n,
                    "Cached embedding count was stale"
                );
            }
            self.store.set_cached_count(n)?;
        }
        Ok(n)
    }

    /// The `top_k` nearest records under `metric`
    pub fn search(
        &self,
        query: &Embedding,
        metric: &str,
        top_k: usize,
        strategy: SearchStrategy,
    ) -> EmbedResult<Vec<TopKEntry>> {
        self.engine
            .search(&self.store, query, metric, top_k, strategy)
    }

    /// Search with the configured default top-k and strategy
    pub fn search_default(&self, query: &Embedding, metric: &str) -> EmbedResult<Vec<TopKEntry>> {
        let strategy = self.config.strategy()?;
        self.search(query, metric, self.config.default_top_k, strategy)
    }
}
