//! Record Codec
//!
//! Splits a `Shape` into the (identity, value) pairs the write path upserts,
//! and resolves the optional order key of each value.

use serde::Serialize;
use serde_json::Value;

use super::Shape;
use crate::error::{Result, ShelfError};

/// Pulls a string key (identity or order key) out of a value
///
/// Implemented for closures `Fn(&T) -> Option<String>` and for `Field`.
pub trait Extract<T: ?Sized> {
    fn extract(&self, value: &T) -> Option<String>;
}

impl<T: ?Sized, F> Extract<T> for F
where
    F: Fn(&T) -> Option<String>,
{
    fn extract(&self, value: &T) -> Option<String> {
        self(value)
    }
}

/// Looks up a named top-level field on the value's JSON form
///
/// Strings are returned verbatim, numbers and booleans as their JSON text.
/// Null, missing fields and non-object values extract nothing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    name: String,
}

impl Field {
    pub fn named(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl<T: Serialize + ?Sized> Extract<T> for Field {
    fn extract(&self, value: &T) -> Option<String> {
        let json = serde_json::to_value(value).ok()?;
        match json.get(&self.name)? {
            Value::Null => None,
            Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }
}

/// One decomposed element, ready to encode and upsert
#[derive(Debug, PartialEq)]
pub struct Pending<'a, T> {
    pub identity: String,
    pub value: &'a T,
}

/// Decompose `shape` into identity/value pairs, in input order
///
/// Scalars and sequence elements take their identity from `identity`; an
/// absent or empty identity yields `MissingIdentity` for that position.
/// Keyed entries use the mapping key as-is.
///
/// The iterator is lazy so a caller can stop at the first error.
pub fn decompose_for_store<'a, T>(
    shape: Shape<'a, T>,
    identity: &'a dyn Extract<T>,
) -> impl Iterator<Item = Result<Pending<'a, T>>> + 'a {
    let entries: Vec<(Option<&'a str>, &'a T)> = match shape {
        Shape::Scalar(value) => vec![(None, value)],
        Shape::Sequence(values) => values.iter().map(|value| (None, value)).collect(),
        Shape::Keyed(entries) => entries
            .into_iter()
            .map(|(key, value)| (Some(key), value))
            .collect(),
    };

    entries
        .into_iter()
        .enumerate()
        .map(move |(position, (key, value))| {
            let id = match key {
                Some(key) => Some(key.to_string()),
                None => identity.extract(value).filter(|id| !id.is_empty()),
            };

            id.map(|identity| Pending { identity, value })
                .ok_or(ShelfError::MissingIdentity { position })
        })
}

/// Order key for `value`, or `None` to fall back to created time at read
pub fn resolve_order<T: ?Sized>(value: &T, order: Option<&dyn Extract<T>>) -> Option<String> {
    order.and_then(|extractor| extractor.extract(value))
}
