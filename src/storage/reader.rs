//! Read Path
//!
//! Count, paginated ordered listing and single-record lookup.
//! Reads never create tables: an absent collection reads as empty.

use rusqlite::types::Value;
use rusqlite::{params, params_from_iter};
use serde::de::DeserializeOwned;

use super::manager::Session;
use super::writer::placeholders;
use crate::error::Result;
use crate::record::{Order, Record, StoredRow, ValueCodec};

/// Number of records in the collection `key` (0 if absent)
pub(crate) fn count<C>(session: &mut Session<'_, C>, key: &str) -> Result<usize> {
    let Some(handle) = session.schema.lookup_collection(session.backend, key)? else {
        return Ok(0);
    };

    let count: Option<i64> = session.backend.query_row(
        &format!("SELECT COUNT(*) FROM {}", handle.table()),
        [],
        |row| row.get(0),
    )?;

    Ok(count.unwrap_or(0) as usize)
}

/// One page of the collection `key`
///
/// Sorted by order key, falling back to created time, in `order`; ties
/// break on created time then insertion order. `condition` filters before
/// paginating, and `page_size == 0` returns every match.
pub(crate) fn list<T, C>(
    session: &mut Session<'_, C>,
    key: &str,
    page_index: usize,
    page_size: usize,
    order: Order,
    condition: Option<&[&str]>,
) -> Result<Vec<Record<T>>>
where
    T: DeserializeOwned,
    C: ValueCodec,
{
    let Some(handle) = session.schema.lookup_collection(session.backend, key)? else {
        return Ok(Vec::new());
    };

    let mut args: Vec<Value> = Vec::new();
    let mut sql = format!("SELECT {} FROM {}", StoredRow::COLUMNS, handle.table());

    if let Some(identities) = condition {
        if identities.is_empty() {
            return Ok(Vec::new());
        }
        sql.push_str(&format!(
            " WHERE identity IN ({})",
            placeholders(identities.len())
        ));
        args.extend(identities.iter().map(|id| Value::Text(id.to_string())));
    }

    let dir = order.as_sql();
    sql.push_str(&format!(
        " ORDER BY COALESCE(order_key, created_time) {dir}, created_time {dir}, rowid {dir}"
    ));

    if page_size > 0 {
        let offset = page_index
            .checked_mul(page_size)
            .and_then(|offset| i64::try_from(offset).ok());
        let Some(offset) = offset else {
            // past any addressable row
            return Ok(Vec::new());
        };
        let n = args.len();
        sql.push_str(&format!(" LIMIT ?{} OFFSET ?{}", n + 1, n + 2));
        args.push(Value::Integer(i64::try_from(page_size).unwrap_or(i64::MAX)));
        args.push(Value::Integer(offset));
    }

    let rows = session
        .backend
        .query(&sql, params_from_iter(args), StoredRow::from_row)?;

    rows.into_iter()
        .map(|row| row.decode(session.codec))
        .collect()
}

/// Look up one record of the collection `key`
///
/// With `identity`, an exact match. Without, the most recently ordered
/// record; if the collection is absent or empty, the single value stored
/// under `key`.
pub(crate) fn get<T, C>(
    session: &mut Session<'_, C>,
    key: &str,
    identity: Option<&str>,
) -> Result<Option<Record<T>>>
where
    T: DeserializeOwned,
    C: ValueCodec,
{
    let Some(identity) = identity else {
        let latest = list(session, key, 0, 1, Order::Descending, None)?;
        return match latest.into_iter().next() {
            Some(record) => Ok(Some(record)),
            None => load(session, key),
        };
    };

    let Some(handle) = session.schema.lookup_collection(session.backend, key)? else {
        return Ok(None);
    };

    find(session, handle.table(), identity)
}

/// The single value stored under `key`
pub(crate) fn load<T, C>(session: &mut Session<'_, C>, key: &str) -> Result<Option<Record<T>>>
where
    T: DeserializeOwned,
    C: ValueCodec,
{
    let table = session.schema.default_table();
    find(session, &table, key)
}

fn find<T, C>(session: &Session<'_, C>, table: &str, identity: &str) -> Result<Option<Record<T>>>
where
    T: DeserializeOwned,
    C: ValueCodec,
{
    let row = session.backend.query_row(
        &format!(
            "SELECT {} FROM {table} WHERE identity = ?1",
            StoredRow::COLUMNS
        ),
        params![identity],
        StoredRow::from_row,
    )?;

    row.map(|row| row.decode(session.codec)).transpose()
}
