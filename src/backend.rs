//! Backend Module
//!
//! Thin wrapper over a single SQLite connection.
//!
//! ## Responsibilities
//! - Open (or create) the database file and apply connection pragmas
//! - Execute parameterized statements and collect rows
//! - Convert every `rusqlite::Error` into a `ShelfError`
//!
//! The backend does no locking of its own; callers serialize access through
//! the StorageManager.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use rusqlite::{Connection, OptionalExtension, Params, Row};
use tracing::debug;

use crate::config::Config;
use crate::error::{Result, ShelfError};

/// An open SQLite connection
pub struct Backend {
    conn: Connection,

    /// File backing the connection (`None` when in memory)
    path: Option<PathBuf>,
}

impl Backend {
    /// Open the database described by `config`
    ///
    /// Any failure here is reported as `BackendUnavailable`.
    pub fn open(config: &Config) -> Result<Self> {
        let conn = match &config.db_path {
            Some(path) => {
                if config.create_parent_dirs {
                    Self::create_parent_dir(path)?;
                }
                Connection::open(path)
            }
            None => Connection::open_in_memory(),
        }
        .map_err(unavailable)?;

        conn.busy_timeout(Duration::from_millis(config.busy_timeout_ms))
            .map_err(unavailable)?;

        // journal_mode reports the mode actually in effect; in-memory
        // databases always answer "memory"
        let mode: String = conn
            .pragma_update_and_check(None, "journal_mode", config.journal_mode.as_pragma(), |row| {
                row.get(0)
            })
            .map_err(unavailable)?;

        debug!(path = ?config.db_path, journal_mode = %mode, "opened backend");

        Ok(Self {
            conn,
            path: config.db_path.clone(),
        })
    }

    /// Execute a statement, returning the number of changed rows
    pub fn execute<P: Params>(&self, sql: &str, params: P) -> Result<usize> {
        let mut stmt = self.conn.prepare_cached(sql)?;
        Ok(stmt.execute(params)?)
    }

    /// Execute several statements separated by semicolons (no parameters)
    pub fn execute_batch(&self, sql: &str) -> Result<()> {
        Ok(self.conn.execute_batch(sql)?)
    }

    /// Run a query and map every row
    pub fn query<T, P, F>(&self, sql: &str, params: P, f: F) -> Result<Vec<T>>
    where
        P: Params,
        F: FnMut(&Row<'_>) -> rusqlite::Result<T>,
    {
        let mut stmt = self.conn.prepare_cached(sql)?;
        let rows = stmt.query_map(params, f)?;
        Ok(rows.collect::<rusqlite::Result<Vec<T>>>()?)
    }

    /// Run a query expected to return at most one row
    pub fn query_row<T, P, F>(&self, sql: &str, params: P, f: F) -> Result<Option<T>>
    where
        P: Params,
        F: FnOnce(&Row<'_>) -> rusqlite::Result<T>,
    {
        let mut stmt = self.conn.prepare_cached(sql)?;
        Ok(stmt.query_row(params, f).optional()?)
    }

    /// Close the connection, flushing SQLite's caches
    pub fn close(self) -> Result<()> {
        debug!(path = ?self.path, "closing backend");
        self.conn.close().map_err(|(_, e)| ShelfError::from(e))
    }

    /// File backing this connection
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    // =========================================================================
    // Private Helpers
    // =========================================================================

    fn create_parent_dir(path: &Path) -> Result<()> {
        match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => fs::create_dir_all(parent)
                .map_err(|e| {
                    ShelfError::BackendUnavailable(format!(
                        "cannot create {}: {}",
                        parent.display(),
                        e
                    ))
                }),
            _ => Ok(()),
        }
    }
}

fn unavailable(err: rusqlite::Error) -> ShelfError {
    ShelfError::BackendUnavailable(err.to_string())
}
