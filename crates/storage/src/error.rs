//! Storage-side error bridge
//!
//! Backend failures (SQLite, filesystem) are wrapped as
//! `EmbedError::Collaborator` so callers see a single error type while the
//! original error stays reachable through `source()`.

use embedstore_core::{EmbedError, EmbedResult};
use thiserror::Error;

/// Failure inside a storage backend
#[derive(Debug, Error)]
pub enum StorageError {
    /// SQLite error
    #[error("sqlite: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// Filesystem error
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

impl From<StorageError> for EmbedError {
    fn from(e: StorageError) -> Self {
        EmbedError::collaborator(e)
    }
}

/// Lift backend results into [`EmbedResult`]
pub(crate) trait CollaboratorResultExt<T> {
    fn collab(self) -> EmbedResult<T>;
}

impl<T, E> CollaboratorResultExt<T> for Result<T, E>
where
    E: Into<StorageError>,
{
    fn collab(self) -> EmbedResult<T> {
        self.map_err(|e| EmbedError::from(e.into()))
    }
}
