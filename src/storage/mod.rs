//! Storage Module
//!
//! The store's public facade and the read/write paths behind it.
//!
//! ## Flow
//! ```text
//! caller ──► StorageManager (lock, lazy open)
//!                 │
//!                 ├──► SchemaController  ensure / look up table
//!                 ├──► writer            decompose → encode → upsert
//!                 └──► reader            select → order → page → decode
//!                           │
//!                           ▼
//!                        Backend (SQLite)
//! ```

mod manager;
mod reader;
mod writer;

pub use manager::StorageManager;
