//! Record Module
//!
//! The logical record model and its mapping to table rows.
//!
//! ## Responsibilities
//! - Describe caller input as a `Shape` (scalar, sequence or keyed mapping)
//! - Decompose shapes into (identity, value) pairs for the write path
//! - Decode persisted rows back into typed `Record`s

mod codec;
mod serializer;

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use rusqlite::Row;
use serde::de::DeserializeOwned;

use crate::error::Result;

pub use codec::{decompose_for_store, resolve_order, Extract, Field, Pending};
pub use serializer::{JsonCodec, ValueCodec};

/// A persisted record, decoded
#[derive(Debug, Clone, PartialEq)]
pub struct Record<T> {
    /// Unique key within the collection
    pub identity: String,

    /// The decoded value
    pub value: T,

    /// Write time (unix micros), non-decreasing across writes
    pub created_time: i64,

    /// Sort key extracted at write time, if any
    pub order_key: Option<String>,
}

impl<T> Record<T> {
    /// `created_time` as a SystemTime
    pub fn created_at(&self) -> SystemTime {
        UNIX_EPOCH + Duration::from_micros(self.created_time.max(0) as u64)
    }
}

/// Sort direction for list reads
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Order {
    #[default]
    Ascending,
    Descending,
}

impl Order {
    pub(crate) fn as_sql(&self) -> &'static str {
        match self {
            Order::Ascending => "ASC",
            Order::Descending => "DESC",
        }
    }
}

/// Input to a collection write
///
/// Matched exhaustively by the codec; nested sequences are not flattened.
#[derive(Debug)]
pub enum Shape<'a, T> {
    /// One value; identity comes from the extractor
    Scalar(&'a T),

    /// Ordered values; identity comes from the extractor per element
    Sequence(&'a [T]),

    /// Identity → value pairs; the key is the identity
    Keyed(Vec<(&'a str, &'a T)>),
}

impl<'a, T> Shape<'a, T> {
    pub fn scalar(value: &'a T) -> Self {
        Shape::Scalar(value)
    }

    pub fn sequence(values: &'a [T]) -> Self {
        Shape::Sequence(values)
    }

    /// Build a keyed shape from any map-like iterator (`&BTreeMap`, `&HashMap`, ...)
    pub fn keyed<I, K>(entries: I) -> Self
    where
        I: IntoIterator<Item = (&'a K, &'a T)>,
        K: AsRef<str> + ?Sized + 'a,
    {
        Shape::Keyed(
            entries
                .into_iter()
                .map(|(key, value)| (key.as_ref(), value))
                .collect(),
        )
    }

    /// Number of elements the shape decomposes into
    pub fn len(&self) -> usize {
        match self {
            Shape::Scalar(_) => 1,
            Shape::Sequence(values) => values.len(),
            Shape::Keyed(entries) => entries.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A row as stored, value still encoded
#[derive(Debug, Clone)]
pub(crate) struct StoredRow {
    pub identity: String,
    pub value: String,
    pub created_time: i64,
    pub order_key: Option<String>,
}

impl StoredRow {
    /// Column list matching `from_row`
    pub const COLUMNS: &'static str = "identity, value, created_time, order_key";

    pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            identity: row.get(0)?,
            value: row.get(1)?,
            created_time: row.get(2)?,
            order_key: row.get(3)?,
        })
    }

    pub fn decode<T, C>(self, codec: &C) -> Result<Record<T>>
    where
        T: DeserializeOwned,
        C: ValueCodec,
    {
        Ok(Record {
            value: codec.decode(&self.value)?,
            identity: self.identity,
            created_time: self.created_time,
            order_key: self.order_key,
        })
    }
}
