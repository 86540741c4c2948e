//! Default limits
//!
//! These defaults are used when no `embedstore.toml` overrides them.

use crate::error::{EmbedError, EmbedResult};

/// Maximum records per bulk insert/update/delete
pub const DEFAULT_BULK_LIMIT: usize = 1000;

/// Ids fetched per chunk by the batched search strategy
pub const DEFAULT_BATCH_SIZE: usize = 1000;

/// Results returned when the caller does not choose `top_k`
pub const DEFAULT_TOP_K: usize = 5;

/// Fail with `LimitExceeded` if `requested > max`
pub fn check_bulk_limit(requested: usize, max: usize) -> EmbedResult<()> {
    if requested > max {
        return Err(EmbedError::LimitExceeded { requested, max });
    }
    Ok(())
}
