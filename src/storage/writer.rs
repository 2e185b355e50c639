//! Write Path
//!
//! Single-value upsert/delete, batched collection upsert, and removal.
//! Every statement autocommits; a failed batch leaves earlier rows in place.

use std::collections::{BTreeSet, HashSet};
use std::time::{SystemTime, UNIX_EPOCH};

use rusqlite::{params, params_from_iter};
use serde::Serialize;
use tracing::{debug, trace};

use super::manager::Session;
use crate::backend::Backend;
use crate::error::{Result, ShelfError};
use crate::record::{decompose_for_store, resolve_order, Extract, Shape, ValueCodec};

/// Issues `created_time` stamps that never go backwards, even if the
/// system clock does
#[derive(Debug, Default)]
pub(crate) struct WriteClock {
    last: i64,
}

impl WriteClock {
    pub fn stamp(&mut self) -> i64 {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_micros() as i64)
            .unwrap_or(0);
        self.last = self.last.max(now);
        self.last
    }
}

/// Upsert or (with `None`) delete the single value stored under `key`
pub(crate) fn store<T, C>(session: &mut Session<'_, C>, key: &str, value: Option<&T>) -> Result<()>
where
    T: Serialize + ?Sized,
    C: ValueCodec,
{
    let table = session.schema.default_table();

    match value {
        None => {
            let removed = session.backend.execute(
                &format!("DELETE FROM {table} WHERE identity = ?1"),
                params![key],
            )?;
            debug!(key, removed, "cleared single value");
        }
        Some(value) => {
            let text = session.codec.encode(value)?;
            let now = session.clock.stamp();
            upsert(session.backend, &table, key, &text, now, None)?;
            debug!(key, "stored single value");
        }
    }

    Ok(())
}

/// Upsert every element of `shape` into the collection `key`
///
/// Stops at the first failing element. Returns the number of rows written.
pub(crate) fn set_collection<T, C>(
    session: &mut Session<'_, C>,
    key: &str,
    shape: Shape<'_, T>,
    identity: &dyn Extract<T>,
    order: Option<&dyn Extract<T>>,
) -> Result<usize>
where
    T: Serialize,
    C: ValueCodec,
{
    let handle = session.schema.ensure_collection(session.backend, key)?;
    let mut written = 0;

    for pending in decompose_for_store(shape, identity) {
        let pending = pending?;
        let text = session.codec.encode(pending.value)?;
        let order_key = resolve_order(pending.value, order);
        let now = session.clock.stamp();

        upsert(
            session.backend,
            handle.table(),
            &pending.identity,
            &text,
            now,
            order_key.as_deref(),
        )?;
        trace!(key, identity = %pending.identity, "upserted record");
        written += 1;
    }

    debug!(key, rows = written, "set collection");
    Ok(written)
}

/// Delete records from the collection `key`
///
/// An empty `identities` clears the collection. Otherwise the present
/// identities are deleted and any absent ones are reported through
/// `IdentityNotFound` (the deletions are kept). Returns the number of rows
/// deleted.
pub(crate) fn remove<C>(session: &mut Session<'_, C>, key: &str, identities: &[&str]) -> Result<usize> {
    let handle = session
        .schema
        .lookup_collection(session.backend, key)?
        .ok_or_else(|| ShelfError::CollectionNotFound(key.to_string()))?;
    let table = handle.table();

    if identities.is_empty() {
        let removed = session
            .backend
            .execute(&format!("DELETE FROM {table}"), [])?;
        debug!(key, removed, "cleared collection");
        return Ok(removed);
    }

    let requested: BTreeSet<&str> = identities.iter().copied().collect();
    let in_list = placeholders(requested.len());

    let present: HashSet<String> = session
        .backend
        .query(
            &format!("SELECT identity FROM {table} WHERE identity IN ({in_list})"),
            params_from_iter(requested.iter()),
            |row| row.get(0),
        )?
        .into_iter()
        .collect();

    let removed = if present.is_empty() {
        0
    } else {
        session.backend.execute(
            &format!(
                "DELETE FROM {table} WHERE identity IN ({})",
                placeholders(present.len())
            ),
            params_from_iter(present.iter()),
        )?
    };
    debug!(key, removed, "removed records");

    let missing: Vec<String> = requested
        .into_iter()
        .filter(|identity| !present.contains(*identity))
        .map(str::to_string)
        .collect();

    if missing.is_empty() {
        Ok(removed)
    } else {
        Err(ShelfError::IdentityNotFound {
            key: key.to_string(),
            missing,
        })
    }
}

// =============================================================================
// Helpers
// =============================================================================

/// Insert or replace one row; replacing gives the row a fresh rowid so it
/// sorts after older rows with the same created_time
fn upsert(
    backend: &Backend,
    table: &str,
    identity: &str,
    value: &str,
    created_time: i64,
    order_key: Option<&str>,
) -> Result<()> {
    backend.execute(
        &format!(
            "INSERT OR REPLACE INTO {table} (identity, value, created_time, order_key)
             VALUES (?1, ?2, ?3, ?4)"
        ),
        params![identity, value, created_time, order_key],
    )?;
    Ok(())
}

/// "?1, ?2, ?3"
pub(crate) fn placeholders(count: usize) -> String {
    (1..=count)
        .map(|i| format!("?{i}"))
        .collect::<Vec<_>>()
        .join(", ")
}
