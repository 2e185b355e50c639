//! Configuration for shelfdb
//!
//! Centralized configuration with sensible defaults.

use std::path::PathBuf;

use crate::error::{Result, ShelfError};
use crate::schema::{ORDER_INDEX_SUFFIX, VERSION_TABLE_SUFFIX};

/// Main configuration for a StorageManager instance
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Storage Configuration
    // -------------------------------------------------------------------------
    /// Database file. `None` keeps everything in memory for the lifetime of
    /// the connection.
    pub db_path: Option<PathBuf>,

    /// Create missing parent directories of `db_path` on first open
    pub create_parent_dirs: bool,

    // -------------------------------------------------------------------------
    // Schema Configuration
    // -------------------------------------------------------------------------
    /// Table holding single-value entries (one row per caller key)
    pub default_table: String,

    /// Prefix for per-collection tables: `{prefix}{collection key}`
    pub collection_prefix: String,

    // -------------------------------------------------------------------------
    // SQLite Configuration
    // -------------------------------------------------------------------------
    /// Journal mode applied when the connection opens
    pub journal_mode: JournalMode,

    /// How long SQLite waits on a lock held by another process (milliseconds)
    pub busy_timeout_ms: u64,
}

/// SQLite journal mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JournalMode {
    /// Write-ahead log (concurrent readers, one writer)
    Wal,

    /// Rollback journal deleted after each transaction
    Delete,

    /// Journal kept in RAM (fast, not crash safe)
    Memory,
}

impl JournalMode {
    pub(crate) fn as_pragma(&self) -> &'static str {
        match self {
            JournalMode::Wal => "WAL",
            JournalMode::Delete => "DELETE",
            JournalMode::Memory => "MEMORY",
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            db_path: Some(PathBuf::from("./shelfdb_data/store.sqlite")),
            create_parent_dirs: true,
            default_table: "shelf_default".to_string(),
            collection_prefix: "shelf_list_".to_string(),
            journal_mode: JournalMode::Wal,
            busy_timeout_ms: 5000,
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Check that the table names can be derived safely.
    ///
    /// The default table, its version table and its index must not start
    /// with the collection prefix (ignoring ASCII case), otherwise a
    /// collection key could alias one of them.
    pub fn validate(&self) -> Result<()> {
        if self.default_table.is_empty() {
            return Err(ShelfError::Config("default_table must not be empty".to_string()));
        }
        if self.collection_prefix.is_empty() {
            return Err(ShelfError::Config(
                "collection_prefix must not be empty".to_string(),
            ));
        }
        if self
            .collection_prefix
            .to_ascii_lowercase()
            .starts_with("sqlite_")
        {
            return Err(ShelfError::Config(format!(
                "collection_prefix '{}' uses the reserved sqlite_ prefix",
                self.collection_prefix
            )));
        }

        // SQLite names are case-insensitive and tables share one namespace
        // with indexes, so no fixed name may fall under the prefix
        let prefix = self.collection_prefix.to_ascii_lowercase();
        let fixed = [
            self.default_table.clone(),
            format!("{}{VERSION_TABLE_SUFFIX}", self.default_table),
            format!("{}{ORDER_INDEX_SUFFIX}", self.default_table),
        ];
        if let Some(name) = fixed
            .iter()
            .find(|name| name.to_ascii_lowercase().starts_with(&prefix))
        {
            return Err(ShelfError::Config(format!(
                "'{name}' collides with collection_prefix '{}'",
                self.collection_prefix
            )));
        }
        Ok(())
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the database file path
    pub fn db_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.db_path = Some(path.into());
        self
    }

    /// Keep the database in memory instead of a file
    pub fn in_memory(mut self) -> Self {
        self.config.db_path = None;
        self
    }

    /// Whether missing parent directories are created on open
    pub fn create_parent_dirs(mut self, create: bool) -> Self {
        self.config.create_parent_dirs = create;
        self
    }

    /// Set the single-value table name
    pub fn default_table(mut self, name: impl Into<String>) -> Self {
        self.config.default_table = name.into();
        self
    }

    /// Set the per-collection table prefix
    pub fn collection_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.config.collection_prefix = prefix.into();
        self
    }

    /// Set the SQLite journal mode
    pub fn journal_mode(mut self, mode: JournalMode) -> Self {
        self.config.journal_mode = mode;
        self
    }

    /// Set the busy timeout (in milliseconds)
    pub fn busy_timeout_ms(mut self, ms: u64) -> Self {
        self.config.busy_timeout_ms = ms;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
