//! Search engine for embedstore
//!
//! This crate provides:
//! - Distance metrics and the metric registry
//! - TopK: bounded selector of the nearest candidates
//! - SearchEngine: whole-table, batched, id-first and cursor strategies
//! - EmbeddingDb: validated CRUD plus search over a storage collaborator
//! - EngineConfig: `embedstore.toml` configuration

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod db;
pub mod distance;
pub mod search;
pub mod topk;

pub use config::{EngineConfig, CONFIG_FILE_NAME};
pub use db::EmbeddingDb;
pub use distance::{
    cosine, default_metrics, distance, euclidean, list_supported_metrics, Metric, MetricFn,
    MetricRegistry, COSINE, EUCLIDEAN,
};
pub use search::{SearchEngine, SearchStrategy, DEFAULT_PARALLEL_THRESHOLD};
pub use topk::{TopK, TopKEntry};
