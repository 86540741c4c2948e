//! Exhaustive nearest-neighbor search
//!
//! Four strategies feed candidates from an [`EmbeddingSource`] into one
//! [`TopK`] selector. They differ only in how rows are retrieved:
//!
//! | Strategy | Retrieval | Payload memory |
//! |----------|-----------|----------------|
//! | `WholeTable` | `fetch_all` once | O(table) |
//! | `Batched` | `fetch_ids`, then `fetch_by_ids` per chunk | O(batch) |
//! | `IdFirst` | `fetch_ids`, then `fetch_one` per id | O(1) |
//! | `Cursor` | `fetch_adjacent(.., Next)` until exhausted | O(1) |
//!
//! Every strategy visits candidates in the collaborator's id order and offers
//! them to the selector in that order, so all four return identical results
//! for the same table. Any retrieval, decode or metric error aborts the whole
//! search; candidates are never skipped.

use std::fmt;
use std::time::Instant;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

use embedstore_core::{
    Direction, EmbedError, EmbedResult, Embedding, EmbeddingSource, RawEmbedding,
    DEFAULT_BATCH_SIZE,
};

use crate::distance::{Metric, MetricRegistry};
use crate::topk::{TopK, TopKEntry};

/// Candidate count at or above which scoring runs on the rayon pool
pub const DEFAULT_PARALLEL_THRESHOLD: usize = 4096;

/// How candidates are retrieved from the collaborator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchStrategy {
    /// Materialize the whole table with one retrieval
    WholeTable,
    /// Fetch ids once, then rows in fixed-size chunks
    Batched {
        /// Ids per `fetch_by_ids` call; must be non-zero
        batch_size: usize,
    },
    /// Fetch ids once, then each row individually
    IdFirst,
    /// Walk the table through adjacency queries
    Cursor,
}

impl Default for SearchStrategy {
    fn default() -> Self {
        SearchStrategy::Batched {
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }
}

impl SearchStrategy {
    /// Every strategy name accepted by [`SearchStrategy::parse`]
    pub const NAMES: [&'static str; 4] = ["whole_table", "batched", "id_first", "cursor"];

    /// Parse a strategy name; `batch_size` only applies to `batched`
    pub fn parse(name: &str, batch_size: usize) -> EmbedResult<Self> {
        let strategy = match name.to_ascii_lowercase().replace('-', "_").as_str() {
            "whole_table" => SearchStrategy::WholeTable,
            "batched" => SearchStrategy::Batched { batch_size },
            "id_first" => SearchStrategy::IdFirst,
            "cursor" => SearchStrategy::Cursor,
            other => {
                return Err(EmbedError::invalid_input(format!(
                    "unknown search strategy '{}', expected one of {:?}",
                    other,
                    Self::NAMES
                )))
            }
        };
        strategy.validate()?;
        Ok(strategy)
    }

    /// Reject a zero batch size
    pub fn validate(&self) -> EmbedResult<()> {
        if let SearchStrategy::Batched { batch_size: 0 } = self {
            return Err(EmbedError::invalid_input("batch_size must be at least 1"));
        }
        Ok(())
    }

    /// Snake-case name
    pub fn name(&self) -> &'static str {
        match self {
            SearchStrategy::WholeTable => "whole_table",
            SearchStrategy::Batched { .. } => "batched",
            SearchStrategy::IdFirst => "id_first",
            SearchStrategy::Cursor => "cursor",
        }
    }
}

impl fmt::Display for SearchStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SearchStrategy::Batched { batch_size } => write!(f, "batched({})", batch_size),
            other => f.write_str(other.name()),
        }
    }
}

/// Runs searches against any [`EmbeddingSource`]
#[derive(Debug, Clone)]
pub struct SearchEngine {
    metrics: MetricRegistry,
    parallel_threshold: usize,
}

impl Default for SearchEngine {
    fn default() -> Self {
        SearchEngine::new(MetricRegistry::default(), DEFAULT_PARALLEL_THRESHOLD)
    }
}

/// Per-call scoring context
struct Scorer<'a> {
    metric: Metric<'a>,
    query: Vec<f64>,
    dimension: usize,
    parallel_threshold: usize,
}

impl Scorer<'_> {
    fn score(&self, row: &RawEmbedding) -> EmbedResult<f64> {
        let candidate = row.decode(self.dimension)?.to_f64_vec();
        self.metric.distance(&self.query, &candidate)
    }

    /// Scores in visiting order; parallel above the threshold
    fn score_all(&self, rows: &[RawEmbedding]) -> EmbedResult<Vec<f64>> {
        if self.parallel_threshold > 0 && rows.len() >= self.parallel_threshold {
            rows.par_iter().map(|row| self.score(row)).collect()
        } else {
            rows.iter().map(|row| self.score(row)).collect()
        }
    }

    fn offer_all(&self, top: &mut TopK, rows: Vec<RawEmbedding>) -> EmbedResult<usize> {
        let distances = self.score_all(&rows)?;
        let n = rows.len();
        for (row, distance) in rows.into_iter().zip(distances) {
            top.offer(row.id, distance);
        }
        Ok(n)
    }
}

impl SearchEngine {
    /// Engine over `metrics`; a `parallel_threshold` of 0 disables rayon
    pub fn new(metrics: MetricRegistry, parallel_threshold: usize) -> Self {
        SearchEngine {
            metrics,
            parallel_threshold,
        }
    }

    /// Registered metrics
    pub fn metrics(&self) -> &MetricRegistry {
        &self.metrics
    }

    /// Mutable access for registering custom metrics
    pub fn metrics_mut(&mut self) -> &mut MetricRegistry {
        &mut self.metrics
    }

    /// The `top_k` records nearest to `query`, ascending by distance
    ///
    /// Validation order: metric name, strategy, query length against the
    /// declared meta. `top_k == 0` returns an empty result without retrieving
    /// any candidate.
    pub fn search<S>(
        &self,
        source: &S,
        query: &Embedding,
        metric: &str,
        top_k: usize,
        strategy: SearchStrategy,
    ) -> EmbedResult<Vec<TopKEntry>>
    where
        S: EmbeddingSource + ?Sized,
    {
        let started = Instant::now();
        let metric = self.metrics.get(metric)?;
        strategy.validate()?;

        let meta = source.declared_meta()?;
        if query.len() != meta.dimension {
            return Err(EmbedError::DimensionMismatch {
                expected: meta.dimension,
                got: query.len(),
            });
        }
        if top_k == 0 {
            return Ok(Vec::new());
        }

        let scorer = Scorer {
            metric,
            query: query.to_f64_vec(),
            dimension: meta.dimension,
            parallel_threshold: self.parallel_threshold,
        };
        let mut top = TopK::new(top_k);

        let candidates = match strategy {
            SearchStrategy::WholeTable => whole_table(source, &scorer, &mut top)?,
            SearchStrategy::Batched { batch_size } => {
                batched(source, &scorer, &mut top, batch_size)?
            }
            SearchStrategy::IdFirst => id_first(source, &scorer, &mut top)?,
            SearchStrategy::Cursor => cursor(source, &scorer, &mut top)?,
        };

        let results = top.drain_sorted();
        debug!(
            target: "embedstore::search",
            strategy = %strategy,
            metric = metric.name(),
            top_k,
            candidates,
            results = results.len(),
            elapsed_us = started.elapsed().as_micros() as u64,
            "Search completed"
        );
        Ok(results)
    }
}

fn whole_table<S>(source: &S, scorer: &Scorer<'_>, top: &mut TopK) -> EmbedResult<usize>
where
    S: EmbeddingSource + ?Sized,
{
    let rows = source.fetch_all()?;
    scorer.offer_all(top, rows)
}

fn batched<S>(
    source: &S,
    scorer: &Scorer<'_>,
    top: &mut TopK,
    batch_size: usize,
) -> EmbedResult<usize>
where
    S: EmbeddingSource + ?Sized,
{
    let ids = source.fetch_ids()?;
    let mut visited = 0;
    for chunk in ids.chunks(batch_size) {
        let mut fetched = source.fetch_by_ids(chunk)?;
        // Reorder to id order; an id that vanished since fetch_ids is an error.
        let rows = chunk
            .iter()
            .map(|id| fetched.remove(id).ok_or_else(|| EmbedError::not_found(id.as_str())))
            .collect::<EmbedResult<Vec<_>>>()?;
        visited += scorer.offer_all(top, rows)?;
    }
    Ok(visited)
}

fn id_first<S>(source: &S, scorer: &Scorer<'_>, top: &mut TopK) -> EmbedResult<usize>
where
    S: EmbeddingSource + ?Sized,
{
    let ids = source.fetch_ids()?;
    for id in &ids {
        let row = source
            .fetch_one(id)?
            .ok_or_else(|| EmbedError::not_found(id.as_str()))?;
        let distance = scorer.score(&row)?;
        top.offer(row.id, distance);
    }
    Ok(ids.len())
}

fn cursor<S>(source: &S, scorer: &Scorer<'_>, top: &mut TopK) -> EmbedResult<usize>
where
    S: EmbeddingSource + ?Sized,
{
    let mut current: Option<String> = None;
    let mut visited = 0;
    while let Some(row) = source.fetch_adjacent(current.as_deref(), Direction::Next)? {
        let distance = scorer.score(&row)?;
        top.offer(row.id.clone(), distance);
        current = Some(row.id);
        visited += 1;
    }
    Ok(visited)
}
