//! embedstore Comprehensive Test Suite
//!
//! ## Test Tier Structure
//!
//! - **Tier 1: Codec** (round-trip, payload length, exactness)
//! - **Tier 2: Distance Metrics** (euclidean/cosine sanity, degenerate input)
//! - **Tier 3: Top-K Selection** (correctness against a full sort)
//! - **Tier 4: Strategy Equivalence** (all strategies, both stores)
//! - **Tier 5: SQLite Store** (persistence, atomic writes, destroy)
//! - **Tier 6: Reference Scenarios** (the documented worked examples)
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test --test embedstore_comprehensive
//! cargo test --test embedstore_comprehensive tier4
//! ```

mod test_utils;

mod tier1_codec;
mod tier2_distance;
mod tier3_topk;
mod tier4_strategy_equivalence;
mod tier5_sqlite_store;
mod tier6_reference_scenarios;
