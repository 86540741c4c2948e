//! Shared helpers for the comprehensive suite

#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::Once;

use embedstore::{
    EmbeddingDb, EmbeddingSink, Embedding, EngineConfig, MemoryStore, SearchStrategy,
    SqliteStore,
};
use tempfile::TempDir;

static INIT_TRACING: Once = Once::new();

/// Install a test-writer subscriber once per process
pub fn init_tracing() {
    INIT_TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_test_writer()
            .try_init();
    });
}

/// Every strategy, with batch sizes that do and do not divide the table
pub fn all_strategies() -> Vec<SearchStrategy> {
    vec![
        SearchStrategy::WholeTable,
        SearchStrategy::Batched { batch_size: 1 },
        SearchStrategy::Batched { batch_size: 3 },
        SearchStrategy::Batched { batch_size: 1000 },
        SearchStrategy::IdFirst,
        SearchStrategy::Cursor,
    ]
}

/// SQLite-backed database in a temp directory
pub struct TestDb {
    pub db: EmbeddingDb<SqliteStore>,
    pub dir: TempDir,
}

impl TestDb {
    pub fn new(dimension: usize, type_name: &str) -> Self {
        Self::with_config(dimension, type_name, EngineConfig::default())
    }

    pub fn with_config(dimension: usize, type_name: &str, config: EngineConfig) -> Self {
        init_tracing();
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let mut db = EmbeddingDb::open(dir.path().join("vectors.db"), config)
            .expect("Failed to open test database");
        db.initialize(dimension, type_name, "test")
            .expect("Failed to initialize test database");
        TestDb { db, dir }
    }

    pub fn path(&self) -> PathBuf {
        self.dir.path().join("vectors.db")
    }
}

/// In-memory database
pub fn memory_db(dimension: usize, type_name: &str) -> EmbeddingDb<MemoryStore> {
    init_tracing();
    let mut db = EmbeddingDb::new(MemoryStore::new(), EngineConfig::default())
        .expect("Failed to create memory database");
    db.initialize(dimension, type_name, "test")
        .expect("Failed to initialize memory database");
    db
}

/// Insert `vectors` under ids "0", "1", ...
pub fn populate<S: EmbeddingSink>(db: &mut EmbeddingDb<S>, vectors: &[Embedding]) {
    let ids: Vec<String> = (0..vectors.len()).map(|i| i.to_string()).collect();
    db.insert(&ids, vectors).expect("populate failed");
}

pub fn ids(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

/// Fixed seed for reproducible vectors
pub const SEED: u64 = 0xDEADBEEF_CAFEBABE;

fn lcg_next(state: &mut u64) -> u64 {
    *state = state.wrapping_mul(6364136223846793005).wrapping_add(1);
    *state
}

/// Deterministic float32 vectors with small integer components
pub fn grid_vectors(count: usize, dimension: usize, seed: u64) -> Vec<Embedding> {
    let mut state = seed;
    (0..count)
        .map(|_| {
            Embedding::Float32(
                (0..dimension)
                    .map(|_| ((lcg_next(&mut state) >> 33) % 7) as f32 - 3.0)
                    .collect(),
            )
        })
        .collect()
}
