//! Tier 3: Top-K Selection
//!
//! With distinct distances the selector must agree with a full sort.

use embedstore::{TopK, TopKEntry};
use proptest::prelude::*;

fn distinct_candidates() -> impl Strategy<Value = Vec<(String, f64)>> {
    prop::collection::btree_set(0u32..100_000, 0..200)
        .prop_map(|set| set.into_iter().collect::<Vec<_>>())
        .prop_shuffle()
        .prop_map(|values| {
            values
                .into_iter()
                .enumerate()
                .map(|(i, v)| (format!("c{}", i), v as f64 / 7.0))
                .collect()
        })
}

proptest! {
    #[test]
    fn tier3_selects_k_smallest(cands in distinct_candidates(), k in 0usize..50) {
        let mut top = TopK::new(k);
        for (id, d) in &cands {
            top.offer(id.as_str(), *d);
        }

        let mut expected: Vec<TopKEntry> = cands
            .iter()
            .map(|(id, d)| TopKEntry::new(*d, id.as_str()))
            .collect();
        expected.sort_by(TopKEntry::result_cmp);
        expected.truncate(k);

        prop_assert_eq!(top.drain_sorted(), expected);
    }

    #[test]
    fn tier3_worst_distance_tracks_kth(cands in distinct_candidates(), k in 1usize..20) {
        let mut top = TopK::new(k);
        for (id, d) in &cands {
            top.offer(id.as_str(), *d);
        }
        let mut ds: Vec<f64> = cands.iter().map(|(_, d)| *d).collect();
        ds.sort_by(f64::total_cmp);
        let kth = ds.get(k.min(ds.len()).saturating_sub(1)).copied();
        prop_assert_eq!(top.worst_distance(), kth);
    }
}

#[test]
fn tier3_all_equal_distances_keep_first_seen() {
    let mut top = TopK::new(3);
    for id in ["e", "d", "c", "b", "a"] {
        top.offer(id, 1.0);
    }
    let ids: Vec<String> = top.drain_sorted().into_iter().map(|e| e.id).collect();
    assert_eq!(ids, vec!["c", "d", "e"]);
}
