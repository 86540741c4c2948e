//! Tier 6: Reference Scenarios
//!
//! A float32 database of length 3 holding
//! `1 → [1,0,0]`, `2 → [0,1,0]`, `3 → [1,1,0]`.

use embedstore::{EmbedError, EmbeddingDb, EmbeddingSink, Embedding, TopKEntry};

use crate::test_utils::*;

fn load<S: EmbeddingSink>(db: &mut EmbeddingDb<S>) {
    db.insert(
        &ids(&["1", "2", "3"]),
        &[
            Embedding::Float32(vec![1.0, 0.0, 0.0]),
            Embedding::Float32(vec![0.0, 1.0, 0.0]),
            Embedding::Float32(vec![1.0, 1.0, 0.0]),
        ],
    )
    .unwrap();
}

fn query() -> Embedding {
    Embedding::Float32(vec![1.0, 0.0, 0.0])
}

#[test]
fn tier6_euclidean_top2() {
    let mut t = TestDb::new(3, "float32");
    load(&mut t.db);
    for strategy in all_strategies() {
        let out = t.db.search(&query(), "euclidean", 2, strategy).unwrap();
        assert_eq!(
            out,
            vec![TopKEntry::new(0.0, "1"), TopKEntry::new(1.0, "3")],
            "strategy {}",
            strategy
        );
    }
}

#[test]
fn tier6_cosine_top1() {
    let mut t = TestDb::new(3, "float32");
    load(&mut t.db);
    for strategy in all_strategies() {
        let out = t.db.search(&query(), "cosine", 1, strategy).unwrap();
        assert_eq!(out, vec![TopKEntry::new(0.0, "1")], "strategy {}", strategy);
    }
}

#[test]
fn tier6_wrong_length_insert_leaves_table_unchanged() {
    let mut t = TestDb::new(3, "float32");
    load(&mut t.db);
    let before = t.db.all_embeddings().unwrap();

    let err = t
        .db
        .insert_one("4", Embedding::Float32(vec![1.0, 0.0, 0.0, 0.0]))
        .unwrap_err();
    assert!(matches!(
        err,
        EmbedError::DimensionMismatch {
            expected: 3,
            got: 4
        }
    ));
    assert!(err.is_validation_error());
    assert_eq!(t.db.all_embeddings().unwrap(), before);
    assert_eq!(t.db.count(true).unwrap(), 3);
}

#[test]
fn tier6_same_results_in_memory() {
    let mut db = memory_db(3, "float32");
    load(&mut db);
    let out = db.search(&query(), "euclidean", 3, embedstore::SearchStrategy::Cursor).unwrap();
    assert_eq!(out[0], TopKEntry::new(0.0, "1"));
    assert_eq!(out[1], TopKEntry::new(1.0, "3"));
    assert_eq!(out[2].id, "2");
    assert!((out[2].distance - 2f64.sqrt()).abs() < 1e-12);
}
