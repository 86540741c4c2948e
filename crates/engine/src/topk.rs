//! Bounded top-k selection
//!
//! A max-heap of at most `k` entries keyed by distance; the root is the worst
//! retained candidate. `offer` is O(log k). A candidate tying the current
//! worst is rejected (first seen wins). Among retained entries of equal
//! distance the most recently offered one is evicted first, so the retained
//! set is exactly the first `k` candidates of a stable sort by distance.
//! Identifier order only breaks ties when the result is drained.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use serde::{Deserialize, Serialize};

/// One search result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopKEntry {
    /// Distance to the query
    pub distance: f64,
    /// Record identifier
    pub id: String,
}

impl TopKEntry {
    /// Create an entry
    pub fn new(distance: f64, id: impl Into<String>) -> Self {
        TopKEntry {
            distance,
            id: id.into(),
        }
    }

    /// Result ordering: ascending distance, then identifier
    pub fn result_cmp(&self, other: &Self) -> Ordering {
        self.distance
            .total_cmp(&other.distance)
            .then_with(|| self.id.cmp(&other.id))
    }
}

/// Heap entry ordered by (distance, arrival)
#[derive(Debug)]
struct MaxHeapEntry {
    entry: TopKEntry,
    arrival: u64,
}

impl PartialEq for MaxHeapEntry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for MaxHeapEntry {}

impl PartialOrd for MaxHeapEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for MaxHeapEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        self.entry
            .distance
            .total_cmp(&other.entry.distance)
            .then_with(|| self.arrival.cmp(&other.arrival))
    }
}

/// Keeps the `k` smallest-distance candidates seen so far
#[derive(Debug)]
pub struct TopK {
    k: usize,
    arrivals: u64,
    heap: BinaryHeap<MaxHeapEntry>,
}

impl TopK {
    /// Selector retaining at most `k` entries
    pub fn new(k: usize) -> Self {
        TopK {
            k,
            arrivals: 0,
            heap: BinaryHeap::with_capacity(k.min(4096) + 1),
        }
    }

    /// Capacity
    pub fn k(&self) -> usize {
        self.k
    }

    /// Number of retained entries
    pub fn len(&self) -> usize {
        self.heap.len()
    }

    /// Whether nothing is retained
    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    /// Whether `k` entries are retained
    pub fn is_full(&self) -> bool {
        self.heap.len() >= self.k
    }

    /// Largest retained distance
    pub fn worst_distance(&self) -> Option<f64> {
        self.heap.peek().map(|e| e.entry.distance)
    }

    /// Offer a candidate; returns whether it was retained
    pub fn offer(&mut self, id: impl Into<String>, distance: f64) -> bool {
        if self.k == 0 {
            return false;
        }
        if self.heap.len() >= self.k {
            let beats_worst = self
                .heap
                .peek()
                .map_or(false, |worst| distance.total_cmp(&worst.entry.distance) == Ordering::Less);
            if !beats_worst {
                return false;
            }
            self.heap.pop();
        }
        self.arrivals += 1;
        self.heap.push(MaxHeapEntry {
            entry: TopKEntry::new(distance, id),
            arrival: self.arrivals,
        });
        true
    }

    /// Retained entries by ascending distance, ties by identifier
    pub fn drain_sorted(self) -> Vec<TopKEntry> {
        let mut entries: Vec<TopKEntry> = self.heap.into_iter().map(|e| e.entry).collect();
        entries.sort_by(TopKEntry::result_cmp);
        entries
    }
}
