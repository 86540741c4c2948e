//! Tier 5: SQLite Store
//!
//! Persistence across reopen, meta immutability, bulk limits and the
//! file lifecycle.

use embedstore::{
    DatabaseMeta, Direction, EmbedError, EmbeddingDb, EmbeddingSource, Embedding, EngineConfig,
    SqliteOptions, SqliteStore,
};

use crate::test_utils::*;

#[test]
fn tier5_records_survive_reopen() {
    let t = TestDb::new(3, "int64");
    let path = t.path();
    let TestDb { mut db, dir: _dir } = t;

    db.insert(
        &ids(&["x", "y"]),
        &[Embedding::Int64(vec![1, 2, 3]), Embedding::Int64(vec![-4, 5, -6])],
    )
    .unwrap();
    db.close().unwrap();

    let mut db = EmbeddingDb::open(&path, EngineConfig::default()).unwrap();
    assert_eq!(db.all_ids().unwrap(), vec!["x", "y"]);
    assert_eq!(db.get("y").unwrap(), Some(Embedding::Int64(vec![-4, 5, -6])));
    assert_eq!(db.count(false).unwrap(), 2);
    assert_eq!(db.meta().unwrap().count, 2);

    // Same declaration is accepted, a different one is not.
    db.initialize(3, "int64", "again").unwrap();
    let err = db.initialize(3, "uint64", "").unwrap_err();
    assert!(matches!(err, EmbedError::ConfigMismatch { .. }));
    let err = db.initialize(2, "int64", "").unwrap_err();
    assert!(matches!(err, EmbedError::ConfigMismatch { .. }));
}

#[test]
fn tier5_meta_row_layout() {
    let t = TestDb::new(4, "Float16");
    let meta: DatabaseMeta = t.db.meta().unwrap();
    assert_eq!(meta.element_type.name(), "float16");
    assert_eq!(meta.dimension, 4);
    assert_eq!(meta.description, "test");
    assert_eq!(meta.count, 0);
}

#[test]
fn tier5_bulk_limit_default_is_1000() {
    let mut t = TestDb::new(1, "uint16");
    let ids: Vec<String> = (0..1001).map(|i| format!("id{}", i)).collect();
    let vectors: Vec<Embedding> = (0..1001u16).map(|i| Embedding::UInt16(vec![i])).collect();

    let err = t.db.insert(&ids, &vectors).unwrap_err();
    assert!(matches!(
        err,
        EmbedError::LimitExceeded {
            requested: 1001,
            max: 1000
        }
    ));
    assert_eq!(t.db.count(false).unwrap(), 0);

    t.db.insert(&ids[..1000], &vectors[..1000]).unwrap();
    assert_eq!(t.db.count(false).unwrap(), 1000);
}

#[test]
fn tier5_update_is_atomic() {
    let mut t = TestDb::new(2, "int8");
    t.db.insert(
        &ids(&["a", "b"]),
        &[Embedding::Int8(vec![1, 1]), Embedding::Int8(vec![2, 2])],
    )
    .unwrap();

    let err = t
        .db
        .update(
            &ids(&["a", "missing"]),
            &[Embedding::Int8(vec![9, 9]), Embedding::Int8(vec![9, 9])],
        )
        .unwrap_err();
    assert!(err.is_not_found());
    assert_eq!(t.db.get("a").unwrap(), Some(Embedding::Int8(vec![1, 1])));
}

#[test]
fn tier5_cursor_walk_both_directions() {
    let mut t = TestDb::new(1, "uint8");
    let names = ["m", "c", "x", "a"];
    let vectors: Vec<Embedding> = (0..4u8).map(|i| Embedding::UInt8(vec![i])).collect();
    t.db.insert(&ids(&names), &vectors).unwrap();

    let mut forward = Vec::new();
    let mut current = None;
    while let Some(id) = t.db.adjacent_id(current.as_deref(), Direction::Next).unwrap() {
        forward.push(id.clone());
        current = Some(id);
    }
    assert_eq!(forward, names);

    let mut backward = Vec::new();
    let mut current = None;
    while let Some(id) = t
        .db
        .adjacent_id(current.as_deref(), Direction::parse("prev").unwrap())
        .unwrap()
    {
        backward.push(id.clone());
        current = Some(id);
    }
    backward.reverse();
    assert_eq!(backward, names);
}

#[test]
fn tier5_description_and_delete_all() {
    let mut t = TestDb::new(1, "int8");
    t.db.update_description("renamed").unwrap();
    t.db.insert(&ids(&["a"]), &[Embedding::Int8(vec![1])]).unwrap();
    t.db.delete_all().unwrap();

    let meta = t.db.meta().unwrap();
    assert_eq!(meta.description, "renamed");
    assert_eq!(meta.count, 0);
    assert!(t.db.all_embeddings().unwrap().is_empty());
}

#[test]
fn tier5_destroy_lifecycle() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("db.sqlite");
    let store = SqliteStore::open(&path, &SqliteOptions::default()).unwrap();
    assert_eq!(store.count().unwrap(), 0);
    store.close().unwrap();

    SqliteStore::destroy(&path).unwrap();
    assert!(!path.exists());
    let err = SqliteStore::destroy(&path).unwrap_err();
    assert!(err.is_not_found());
}

#[test]
fn tier5_uninitialized_search_is_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let db = EmbeddingDb::open(dir.path().join("empty.db"), EngineConfig::default()).unwrap();
    let err = db
        .search_default(&Embedding::Float32(vec![1.0]), "euclidean")
        .unwrap_err();
    assert!(err.is_not_found());
}
