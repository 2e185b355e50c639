//! Schema Module
//!
//! Owns table definitions for the store.
//!
//! ## Layout
//! ```text
//! {default_table}              one row per single-value key
//! {default_table}_version      schema version marker
//! {prefix}{hex(key)}           one table per collection, created on first write
//! {table}_order_idx            ordering index of each record table
//!
//! every record table:
//! ┌──────────────┬───────┬──────────────┬────────────┐
//! │ identity (PK)│ value │ created_time │ order_key? │
//! └──────────────┴───────┴──────────────┴────────────┘
//! ```

mod controller;

pub use controller::{
    quote_identifier, CollectionHandle, SchemaController, ORDER_INDEX_SUFFIX, SCHEMA_VERSION,
    VERSION_TABLE_SUFFIX,
};
