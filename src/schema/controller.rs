//! Schema Controller
//!
//! Creates the default table on open and collection tables on demand.
//!
//! ## Responsibilities
//! - Derive (quoted) table names from collection keys; keys are hex encoded
//!   so names stay distinct under SQLite's case-insensitive matching
//! - Create tables lazily and idempotently
//! - Remember which collections exist so repeated writes skip the DDL

use std::collections::HashSet;

use rusqlite::params;
use tracing::debug;

use crate::backend::Backend;
use crate::config::Config;
use crate::error::{Result, ShelfError};

/// Current schema version written on first open
pub const SCHEMA_VERSION: &str = "1";

/// Appended to the default table name for the version table
pub const VERSION_TABLE_SUFFIX: &str = "_version";

/// Appended to a record table name for its ordering index
pub const ORDER_INDEX_SUFFIX: &str = "_order_idx";

/// Handle to an existing collection table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionHandle {
    key: String,

    /// Quoted table name, safe to splice into SQL
    table: String,
}

impl CollectionHandle {
    /// The caller's collection key
    pub fn key(&self) -> &str {
        &self.key
    }

    /// The quoted table name
    pub fn table(&self) -> &str {
        &self.table
    }
}

/// Tracks and creates the tables backing the store
///
/// Not internally synchronized; the StorageManager lock guards it together
/// with the connection.
pub struct SchemaController {
    /// Unquoted name of the single-value table
    default_table: String,

    /// Prefix of every collection table
    prefix: String,

    /// Collection keys whose table is known to exist
    known: HashSet<String>,
}

impl SchemaController {
    pub fn new(config: &Config) -> Self {
        Self {
            default_table: config.default_table.clone(),
            prefix: config.collection_prefix.clone(),
            known: HashSet::new(),
        }
    }

    /// Create the default and version tables (first use of a connection)
    pub fn init(&mut self, backend: &Backend) -> Result<()> {
        let version_table =
            quote_identifier(&format!("{}{VERSION_TABLE_SUFFIX}", self.default_table));

        backend
            .execute_batch(&format!(
                "CREATE TABLE IF NOT EXISTS {version_table} (
                    version TEXT NOT NULL,
                    applied_at TEXT NOT NULL DEFAULT (datetime('now'))
                );
                {records}",
                records = record_table_ddl(&self.default_table),
            ))
            .map_err(migration_failed)?;

        let existing: Option<String> = backend
            .query_row(&format!("SELECT version FROM {version_table} LIMIT 1"), [], |row| {
                row.get(0)
            })
            .map_err(migration_failed)?;

        if existing.is_none() {
            backend
                .execute(
                    &format!("INSERT INTO {version_table} (version) VALUES (?1)"),
                    params![SCHEMA_VERSION],
                )
                .map_err(migration_failed)?;
        }

        Ok(())
    }

    /// Quoted name of the single-value table
    pub fn default_table(&self) -> String {
        quote_identifier(&self.default_table)
    }

    /// Return the handle for `key`, creating its table if absent
    pub fn ensure_collection(&mut self, backend: &Backend, key: &str) -> Result<CollectionHandle> {
        let name = self.table_name(key);

        if !self.known.contains(key) {
            backend.execute_batch(&record_table_ddl(&name))?;
            debug!(key, table = %name, "ensured collection table");
            self.known.insert(key.to_string());
        }

        Ok(self.handle(key, &name))
    }

    /// Return the handle for `key` only if its table exists
    pub fn lookup_collection(
        &mut self,
        backend: &Backend,
        key: &str,
    ) -> Result<Option<CollectionHandle>> {
        let name = self.table_name(key);

        if self.known.contains(key) {
            return Ok(Some(self.handle(key, &name)));
        }

        let found = backend
            .query_row(
                "SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1",
                params![name],
                |_| Ok(()),
            )?
            .is_some();

        if found {
            self.known.insert(key.to_string());
            Ok(Some(self.handle(key, &name)))
        } else {
            Ok(None)
        }
    }

    /// Forget cached table existence (the connection was closed)
    pub fn reset(&mut self) {
        self.known.clear();
    }

    /// Number of collections known to exist on this connection
    pub fn known_count(&self) -> usize {
        self.known.len()
    }

    /// Unquoted table name for `key`
    ///
    /// "Orders" → "shelf_list_4f7264657273". The hex digits are lowercase and
    /// never contain `_`, so no key can reach another key's table or index.
    pub fn table_name(&self, key: &str) -> String {
        format!("{}{}", self.prefix, hex::encode(key.as_bytes()))
    }

    // =========================================================================
    // Private Helpers
    // =========================================================================

    fn handle(&self, key: &str, name: &str) -> CollectionHandle {
        CollectionHandle {
            key: key.to_string(),
            table: quote_identifier(name),
        }
    }
}

/// Quote a name as an SQL identifier, doubling embedded quotes
///
/// `my "list"` → `"my ""list"""`
pub fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// DDL for a record table and its ordering index
fn record_table_ddl(name: &str) -> String {
    let table = quote_identifier(name);
    let index = quote_identifier(&format!("{name}{ORDER_INDEX_SUFFIX}"));

    format!(
        "CREATE TABLE IF NOT EXISTS {table} (
            identity TEXT PRIMARY KEY NOT NULL,
            value TEXT NOT NULL,
            created_time INTEGER NOT NULL,
            order_key TEXT
        );
        CREATE INDEX IF NOT EXISTS {index} ON {table} (COALESCE(order_key, created_time));"
    )
}

/// Failures while creating the store's fixed tables mean it cannot be used
fn migration_failed(err: ShelfError) -> ShelfError {
    match err {
        ShelfError::Backend(msg) => ShelfError::BackendUnavailable(msg),
        other => other,
    }
}
