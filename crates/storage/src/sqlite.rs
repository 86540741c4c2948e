//! SqliteStore: durable single-file collaborator
//!
//! # File Layout
//!
//! ```text
//! <path>          SQLite database
//! <path>-wal      write-ahead log (journal_mode = WAL)
//! <path>-shm      WAL shared-memory index
//! ```
//!
//! # Schema
//!
//! ```text
//! embeddings(seq INTEGER PRIMARY KEY AUTOINCREMENT,
//!            id_text TEXT UNIQUE NOT NULL,
//!            embedding BLOB NOT NULL,
//!            data_type TEXT NOT NULL)
//!
//! embedding_meta(id INTEGER PRIMARY KEY CHECK (id = 0),
//!                embedding_count INTEGER NOT NULL,
//!                embedding_length INTEGER NOT NULL,
//!                data_type TEXT NOT NULL,
//!                description TEXT NOT NULL)
//! ```
//!
//! `seq` defines id order and adjacency. Multi-row writes run inside a
//! single transaction.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use embedstore_core::{
    DatabaseMeta, Direction, EmbedError, EmbedResult, ElementType, EmbeddingSink,
    EmbeddingSource, RawEmbedding,
};

use crate::error::CollaboratorResultExt;

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS embeddings (
    seq INTEGER PRIMARY KEY AUTOINCREMENT,
    id_text TEXT UNIQUE NOT NULL,
    embedding BLOB NOT NULL,
    data_type TEXT NOT NULL
);
CREATE TABLE IF NOT EXISTS embedding_meta (
    id INTEGER PRIMARY KEY CHECK (id = 0),
    embedding_count INTEGER NOT NULL DEFAULT 0,
    embedding_length INTEGER NOT NULL,
    data_type TEXT NOT NULL,
    description TEXT NOT NULL DEFAULT ''
);
";

const ROW_COLUMNS: &str = "id_text, embedding, data_type";

/// Bound parameters per `IN (...)` lookup
const ID_CHUNK: usize = 500;

const META_ROW: &str = "embedding_meta";

/// Connection settings applied at open
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SqliteOptions {
    /// `PRAGMA journal_mode`
    pub journal_mode: String,
    /// `PRAGMA synchronous`
    pub synchronous: String,
    /// Busy handler timeout in milliseconds
    pub busy_timeout_ms: u64,
}

impl Default for SqliteOptions {
    fn default() -> Self {
        SqliteOptions {
            journal_mode: "WAL".to_string(),
            synchronous: "NORMAL".to_string(),
            busy_timeout_ms: 5000,
        }
    }
}

/// Embedding table backed by a SQLite file
#[derive(Debug)]
pub struct SqliteStore {
    conn: Connection,
    path: Option<PathBuf>,
}

fn read_row(row: &Row<'_>) -> rusqlite::Result<RawEmbedding> {
    Ok(RawEmbedding {
        id: row.get(0)?,
        payload: row.get(1)?,
        type_name: row.get(2)?,
    })
}

fn side_files(path: &Path) -> [PathBuf; 2] {
    let mut wal = path.as_os_str().to_owned();
    wal.push("-wal");
    let mut shm = path.as_os_str().to_owned();
    shm.push("-shm");
    [PathBuf::from(wal), PathBuf::from(shm)]
}

impl SqliteStore {
    /// Open or create a database file
    ///
    /// Missing parent directories are created.
    pub fn open(path: impl AsRef<Path>, options: &SqliteOptions) -> EmbedResult<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).collab()?;
            }
        }

        let conn = Connection::open(path).collab()?;
        let mode: String = conn
            .pragma_update_and_check(None, "journal_mode", &options.journal_mode, |row| {
                row.get(0)
            })
            .collab()?;
        conn.pragma_update(None, "synchronous", &options.synchronous)
            .collab()?;
        conn.busy_timeout(Duration::from_millis(options.busy_timeout_ms))
            .collab()?;
        conn.execute_batch(SCHEMA).collab()?;

        info!(
            target: "embedstore::sqlite",
            path = %path.display(),
            journal_mode = %mode,
            "Opened embedding database"
        );

        Ok(SqliteStore {
            conn,
            path: Some(path.to_path_buf()),
        })
    }

    /// Open a private in-memory database
    pub fn open_in_memory() -> EmbedResult<Self> {
        let conn = Connection::open_in_memory().collab()?;
        conn.execute_batch(SCHEMA).collab()?;
        Ok(SqliteStore { conn, path: None })
    }

    /// File path, `None` for in-memory databases
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Close the connection, surfacing any error from SQLite
    pub fn close(self) -> EmbedResult<()> {
        let path = self.path.clone();
        self.conn.close().map_err(|(_, e)| e).collab()?;
        if let Some(path) = path {
            debug!(target: "embedstore::sqlite", path = %path.display(), "Closed embedding database");
        }
        Ok(())
    }

    /// Delete a database file and its WAL side files
    ///
    /// The handle must be closed first. A missing file is `NotFound`.
    pub fn destroy(path: impl AsRef<Path>) -> EmbedResult<()> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(EmbedError::not_found(path.display().to_string()));
        }
        fs::remove_file(path).collab()?;
        for side in side_files(path) {
            if side.exists() {
                fs::remove_file(&side).collab()?;
            }
        }
        info!(target: "embedstore::sqlite", path = %path.display(), "Destroyed embedding database");
        Ok(())
    }

    fn query_rows(&self, sql: &str, params: impl rusqlite::Params) -> EmbedResult<Vec<RawEmbedding>> {
        let mut stmt = self.conn.prepare_cached(sql).collab()?;
        let rows = stmt
            .query_map(params, read_row)
            .collab()?
            .collect::<rusqlite::Result<Vec<_>>>()
            .collab()?;
        Ok(rows)
    }

    fn query_one(&self, sql: &str, params: impl rusqlite::Params) -> EmbedResult<Option<RawEmbedding>> {
        self.conn
            .query_row(sql, params, read_row)
            .optional()
            .collab()
    }

    fn seq_of(&self, id: &str) -> EmbedResult<i64> {
        self.conn
            .query_row(
                "SELECT seq FROM embeddings WHERE id_text = ?1",
                params![id],
                |row| row.get(0),
            )
            .optional()
            .collab()?
            .ok_or_else(|| EmbedError::not_found(id))
    }

    fn update_meta_column(&self, sql: &str, params: impl rusqlite::Params) -> EmbedResult<()> {
        let changed = self.conn.execute(sql, params).collab()?;
        if changed == 0 {
            return Err(EmbedError::not_found(META_ROW));
        }
        Ok(())
    }
}

impl EmbeddingSource for SqliteStore {
    fn declared_meta(&self) -> EmbedResult<DatabaseMeta> {
        self.stored_meta()?
            .ok_or_else(|| EmbedError::not_found(META_ROW))
    }

    fn fetch_all(&self) -> EmbedResult<Vec<RawEmbedding>> {
        self.query_rows(
            &format!("SELECT {} FROM embeddings ORDER BY seq", ROW_COLUMNS),
            [],
        )
    }

    fn fetch_ids(&self) -> EmbedResult<Vec<String>> {
        let mut stmt = self
            .conn
            .prepare_cached("SELECT id_text FROM embeddings ORDER BY seq")
            .collab()?;
        let ids = stmt
            .query_map([], |row| row.get(0))
            .collab()?
            .collect::<rusqlite::Result<Vec<String>>>()
            .collab()?;
        Ok(ids)
    }

    fn fetch_by_ids(&self, ids: &[String]) -> EmbedResult<HashMap<String, RawEmbedding>> {
        let mut found = HashMap::with_capacity(ids.len());
        for chunk in ids.chunks(ID_CHUNK) {
            let placeholders = vec!["?"; chunk.len()].join(", ");
            let sql = format!(
                "SELECT {} FROM embeddings WHERE id_text IN ({})",
                ROW_COLUMNS, placeholders
            );
            for row in self.query_rows(&sql, params_from_iter(chunk.iter()))? {
                found.insert(row.id.clone(), row);
            }
        }
        Ok(found)
    }

    fn fetch_one(&self, id: &str) -> EmbedResult<Option<RawEmbedding>> {
        self.query_one(
            &format!("SELECT {} FROM embeddings WHERE id_text = ?1", ROW_COLUMNS),
            params![id],
        )
    }

    fn fetch_adjacent(
        &self,
        current: Option<&str>,
        direction: Direction,
    ) -> EmbedResult<Option<RawEmbedding>> {
        let (cmp, order) = match direction {
            Direction::Next => (">", "ASC"),
            Direction::Previous => ("<", "DESC"),
        };
        match current {
            None => self.query_one(
                &format!(
                    "SELECT {} FROM embeddings ORDER BY seq {} LIMIT 1",
                    ROW_COLUMNS, order
                ),
                [],
            ),
            Some(id) => {
                let seq = self.seq_of(id)?;
                self.query_one(
                    &format!(
                        "SELECT {} FROM embeddings WHERE seq {} ?1 ORDER BY seq {} LIMIT 1",
                        ROW_COLUMNS, cmp, order
                    ),
                    params![seq],
                )
            }
        }
    }

    fn fetch_random(&self, n: usize) -> EmbedResult<Vec<RawEmbedding>> {
        if n == 0 {
            return Ok(Vec::new());
        }
        let limit = i64::try_from(n).unwrap_or(i64::MAX);
        self.query_rows(
            &format!(
                "SELECT {} FROM embeddings ORDER BY RANDOM() LIMIT ?1",
                ROW_COLUMNS
            ),
            params![limit],
        )
    }

    fn count(&self) -> EmbedResult<u64> {
        let n: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM embeddings", [], |row| row.get(0))
            .collab()?;
        Ok(n as u64)
    }
}

impl EmbeddingSink for SqliteStore {
    fn initialize(&mut self, meta: &DatabaseMeta) -> EmbedResult<()> {
        self.conn
            .execute(
                "INSERT OR REPLACE INTO embedding_meta
                     (id, embedding_count, embedding_length, data_type, description)
                 VALUES (0, ?1, ?2, ?3, ?4)",
                params![
                    meta.count as i64,
                    meta.dimension as i64,
                    meta.element_type.name(),
                    meta.description
                ],
            )
            .collab()?;
        info!(
            target: "embedstore::sqlite",
            data_type = meta.element_type.name(),
            dimension = meta.dimension,
            "Initialized embedding_meta"
        );
        Ok(())
    }

    fn stored_meta(&self) -> EmbedResult<Option<DatabaseMeta>> {
        let row = self
            .conn
            .query_row(
                "SELECT embedding_count, embedding_length, data_type, description
                 FROM embedding_meta WHERE id = 0",
                [],
                |row| {
                    Ok((
                        row.get::<_, i64>(0)?,
                        row.get::<_, i64>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, String>(3)?,
                    ))
                },
            )
            .optional()
            .collab()?;

        let Some((count, dimension, data_type, description)) = row else {
            return Ok(None);
        };
        let element_type = ElementType::parse(&data_type).ok_or_else(|| {
            EmbedError::corrupt_payload(format!(
                "embedding_meta.data_type '{}' is not a registered type",
                data_type
            ))
        })?;
        let dimension = usize::try_from(dimension).map_err(|_| {
            EmbedError::corrupt_payload(format!(
                "embedding_meta.embedding_length {} is negative",
                dimension
            ))
        })?;
        let count = u64::try_from(count).map_err(|_| {
            EmbedError::corrupt_payload(format!(
                "embedding_meta.embedding_count {} is negative",
                count
            ))
        })?;
        Ok(Some(DatabaseMeta {
            element_type,
            dimension,
            description,
            count,
        }))
    }

    fn insert_rows(&mut self, rows: &[RawEmbedding]) -> EmbedResult<()> {
        let tx = self.conn.transaction().collab()?;
        {
            let mut stmt = tx
                .prepare_cached(
                    "INSERT INTO embeddings (id_text, embedding, data_type) VALUES (?1, ?2, ?3)",
                )
                .collab()?;
            for row in rows {
                stmt.execute(params![row.id, row.payload, row.type_name])
                    .collab()?;
            }
        }
        tx.commit().collab()?;
        debug!(target: "embedstore::sqlite", rows = rows.len(), "Inserted rows");
        Ok(())
    }

    fn update_rows(&mut self, rows: &[RawEmbedding]) -> EmbedResult<()> {
        let tx = self.conn.transaction().collab()?;
        {
            let mut stmt = tx
                .prepare_cached(
                    "UPDATE embeddings SET embedding = ?2, data_type = ?3 WHERE id_text = ?1",
                )
                .collab()?;
            for row in rows {
                let changed = stmt
                    .execute(params![row.id, row.payload, row.type_name])
                    .collab()?;
                if changed == 0 {
                    // Dropping the transaction rolls back earlier updates.
                    return Err(EmbedError::not_found(row.id.as_str()));
                }
            }
        }
        tx.commit().collab()?;
        debug!(target: "embedstore::sqlite", rows = rows.len(), "Updated rows");
        Ok(())
    }

    fn delete_rows(&mut self, ids: &[String]) -> EmbedResult<u64> {
        let tx = self.conn.transaction().collab()?;
        let mut removed = 0u64;
        {
            let mut stmt = tx
                .prepare_cached("DELETE FROM embeddings WHERE id_text = ?1")
                .collab()?;
            for id in ids {
                removed += stmt.execute(params![id]).collab()? as u64;
            }
        }
        tx.commit().collab()?;
        debug!(target: "embedstore::sqlite", requested = ids.len(), removed, "Deleted rows");
        Ok(removed)
    }

    fn delete_all(&mut self) -> EmbedResult<()> {
        let tx = self.conn.transaction().collab()?;
        tx.execute("DELETE FROM embeddings", []).collab()?;
        tx.execute(
            "UPDATE embedding_meta SET embedding_count = 0 WHERE id = 0",
            [],
        )
        .collab()?;
        tx.commit().collab()?;
        debug!(target: "embedstore::sqlite", "Deleted all rows");
        Ok(())
    }

    fn set_description(&mut self, description: &str) -> EmbedResult<()> {
        self.update_meta_column(
            "UPDATE embedding_meta SET description = ?1 WHERE id = 0",
            params![description],
        )
    }

    fn set_cached_count(&mut self, count: u64) -> EmbedResult<()> {
        self.update_meta_column(
            "UPDATE embedding_meta SET embedding_count = ?1 WHERE id = 0",
            params![count as i64],
        )
    }
}
