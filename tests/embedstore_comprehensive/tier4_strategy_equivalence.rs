//! Tier 4: Strategy Equivalence
//!
//! Whole-table is the reference; every other strategy must return the same
//! ordered results (or fail alike) for the same table and query.

use embedstore::{EmbeddingDb, EmbeddingSink, Embedding, SearchStrategy, TopKEntry};
use proptest::prelude::*;

use crate::test_utils::*;

fn assert_equivalent<S: EmbeddingSink>(
    db: &EmbeddingDb<S>,
    query: &Embedding,
    metric: &str,
    top_k: usize,
) -> Result<(), TestCaseError> {
    let reference = db.search(query, metric, top_k, SearchStrategy::WholeTable);
    for strategy in all_strategies() {
        let other = db.search(query, metric, top_k, strategy);
        match (&reference, &other) {
            (Ok(a), Ok(b)) => {
                prop_assert_eq!(a, b, "strategy {}", strategy);
            }
            (Err(_), Err(_)) => {}
            _ => {
                prop_assert!(
                    false,
                    "strategy {} diverged: {:?} vs {:?}",
                    strategy,
                    reference,
                    other
                );
            }
        }
    }
    Ok(())
}

fn table() -> impl Strategy<Value = (Vec<Vec<i8>>, Vec<i8>)> {
    (1usize..6).prop_flat_map(|dim| {
        (
            prop::collection::vec(prop::collection::vec(-3i8..=3, dim), 0..40),
            prop::collection::vec(-3i8..=3, dim),
        )
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn tier4_memory_store_equivalence((rows, query) in table(), top_k in 0usize..45) {
        let mut db = memory_db(query.len(), "int8");
        let vectors: Vec<Embedding> = rows.into_iter().map(Embedding::Int8).collect();
        populate(&mut db, &vectors);
        let query = Embedding::Int8(query);

        assert_equivalent(&db, &query, "euclidean", top_k)?;
        assert_equivalent(&db, &query, "cosine", top_k)?;
    }
}

#[test]
fn tier4_sqlite_store_equivalence() {
    let t = TestDb::new(8, "float32");
    let mut db = t.db;
    let vectors = grid_vectors(257, 8, SEED);
    for (chunk_index, chunk) in vectors.chunks(100).enumerate() {
        let ids: Vec<String> = (0..chunk.len())
            .map(|i| format!("v{:04}", chunk_index * 100 + i))
            .collect();
        db.insert(&ids, chunk).unwrap();
    }

    let queries = grid_vectors(5, 8, SEED ^ 0x5555);
    for query in &queries {
        for top_k in [1, 10, 300] {
            assert_equivalent(&db, query, "euclidean", top_k).unwrap();
        }
    }
}

#[test]
fn tier4_results_after_deletes_and_updates() {
    let mut db = memory_db(2, "int32");
    let vectors: Vec<Embedding> = (0..30)
        .map(|i| Embedding::Int32(vec![i % 5, i % 3]))
        .collect();
    populate(&mut db, &vectors);

    db.delete(&ids(&["0", "7", "29", "15"])).unwrap();
    db.update(
        &ids(&["3", "20"]),
        &[Embedding::Int32(vec![0, 0]), Embedding::Int32(vec![0, 0])],
    )
    .unwrap();

    let query = Embedding::Int32(vec![0, 0]);
    assert_equivalent(&db, &query, "euclidean", 6).unwrap();

    let top = db
        .search(&query, "euclidean", 2, SearchStrategy::Cursor)
        .unwrap();
    // "0" and "15" were deleted; "3" and "20" were moved onto the query.
    assert_eq!(
        top,
        vec![TopKEntry::new(0.0, "20"), TopKEntry::new(0.0, "3")]
    );
}
