//! Engine configuration via `embedstore.toml`
//!
//! A default `embedstore.toml` is written next to the database file on first
//! open. To change settings, edit the file and reopen.

use std::path::Path;

use serde::{Deserialize, Serialize};

use embedstore_core::{EmbedError, EmbedResult, DEFAULT_BATCH_SIZE, DEFAULT_BULK_LIMIT, DEFAULT_TOP_K};
use embedstore_storage::SqliteOptions;

use crate::search::{SearchStrategy, DEFAULT_PARALLEL_THRESHOLD};

/// Config file name placed beside the database file.
pub const CONFIG_FILE_NAME: &str = "embedstore.toml";

/// Engine configuration loaded from `embedstore.toml`.
///
/// # Example
///
/// ```toml
/// bulk_limit = 1000
/// batch_size = 1000
/// default_top_k = 5
/// default_strategy = "batched"
/// strict_types = false
/// parallel_threshold = 4096
///
/// [sqlite]
/// journal_mode = "WAL"
/// synchronous = "NORMAL"
/// busy_timeout_ms = 5000
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Maximum records per insert/update/delete call.
    #[serde(default = "default_bulk_limit")]
    pub bulk_limit: usize,
    /// Chunk size for the batched strategy.
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    /// Results returned by `search_default`.
    #[serde(default = "default_top_k")]
    pub default_top_k: usize,
    /// Strategy used by `search_default`: `"whole_table"`, `"batched"`,
    /// `"id_first"` or `"cursor"`.
    #[serde(default = "default_strategy_str")]
    pub default_strategy: String,
    /// Require inserted vectors to already have the declared element type.
    #[serde(default)]
    pub strict_types: bool,
    /// Candidate count at which scoring goes parallel; 0 disables.
    #[serde(default = "default_parallel_threshold")]
    pub parallel_threshold: usize,
    /// SQLite connection settings.
    #[serde(default)]
    pub sqlite: SqliteOptions,
}

fn default_bulk_limit() -> usize {
    DEFAULT_BULK_LIMIT
}

fn default_batch_size() -> usize {
    DEFAULT_BATCH_SIZE
}

fn default_top_k() -> usize {
    DEFAULT_TOP_K
}

fn default_strategy_str() -> String {
    "batched".to_string()
}

fn default_parallel_threshold() -> usize {
    DEFAULT_PARALLEL_THRESHOLD
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            bulk_limit: default_bulk_limit(),
            batch_size: default_batch_size(),
            default_top_k: default_top_k(),
            default_strategy: default_strategy_str(),
            strict_types: false,
            parallel_threshold: default_parallel_threshold(),
            sqlite: SqliteOptions::default(),
        }
    }
}

impl EngineConfig {
    /// Parse `default_strategy` (with `batch_size`) into a `SearchStrategy`.
    ///
    /// # Errors
    ///
    /// Returns an error for an unknown name or a zero batch size.
    pub fn strategy(&self) -> EmbedResult<SearchStrategy> {
        SearchStrategy::parse(&self.default_strategy, self.batch_size)
    }

    /// Check every field.
    pub fn validate(&self) -> EmbedResult<()> {
        if self.bulk_limit == 0 {
            return Err(EmbedError::invalid_input(
                "bulk_limit in embedstore.toml must be at least 1",
            ));
        }
        if self.batch_size == 0 {
            return Err(EmbedError::invalid_input(
                "batch_size in embedstore.toml must be at least 1",
            ));
        }
        self.strategy()?;
        Ok(())
    }

    /// Returns the default config file content with comments.
    pub fn default_toml() -> &'static str {
        r#"# embedstore configuration
#
# Maximum records per insert / update / delete call (default: 1000)
bulk_limit = 1000

# Ids fetched per chunk by the "batched" search strategy (default: 1000)
batch_size = 1000

# Results returned when no top_k is given (default: 5)
default_top_k = 5

# Strategy used when none is given:
#   "whole_table" = one retrieval, memory O(table)
#   "batched"     = chunks of batch_size ids (default)
#   "id_first"    = one retrieval per id
#   "cursor"      = adjacency traversal
default_strategy = "batched"

# Reject vectors whose element type differs from the declared type, even
# when every value converts exactly (default: false)
strict_types = false

# Score candidates on the rayon pool at or above this count; 0 disables
parallel_threshold = 4096

[sqlite]
journal_mode = "WAL"
synchronous = "NORMAL"
busy_timeout_ms = 5000
"#
    }

    /// Read and parse config from a file path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed or validated.
    pub fn from_file(path: &Path) -> EmbedResult<Self> {
        let content = std::fs::read_to_string(path).map_err(EmbedError::collaborator)?;
        let config: EngineConfig = toml::from_str(&content).map_err(|e| {
            EmbedError::invalid_input(format!(
                "Failed to parse config file '{}': {}",
                path.display(),
                e
            ))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Write the default config file if it does not already exist.
    pub fn write_default_if_missing(path: &Path) -> EmbedResult<()> {
        if !path.exists() {
            std::fs::write(path, Self::default_toml()).map_err(EmbedError::collaborator)?;
        }
        Ok(())
    }

    /// Serialize this config to TOML and write it to the given path.
    pub fn write_to_file(&self, path: &Path) -> EmbedResult<()> {
        let content = toml::to_string_pretty(self).map_err(|e| {
            EmbedError::invalid_input(format!("Failed to serialize config: {}", e))
        })?;
        std::fs::write(path, content).map_err(EmbedError::collaborator)
    }
}
