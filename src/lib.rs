//! # shelfdb
//!
//! An embedded, file-backed store over SQLite with two access patterns:
//! - Single values addressed by a unique key
//! - Named, ordered collections of values addressed by key + identity
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     StorageManager                           │
//! │              (lazy open, one lock per operation)             │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//!          ┌────────────┼─────────────┐
//!          │            │             │
//!          ▼            ▼             ▼
//!   ┌────────────┐ ┌──────────┐ ┌──────────┐
//!   │   Schema   │ │  Write   │ │   Read   │
//!   │ Controller │ │   Path   │ │   Path   │
//!   └─────┬──────┘ └────┬─────┘ └────┬─────┘
//!         │             │  Record    │
//!         │             │  Codec     │
//!         ▼             ▼            ▼
//!   ┌─────────────────────────────────────┐
//!   │          Backend (SQLite)           │
//!   └─────────────────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```no_run
//! use serde::{Deserialize, Serialize};
//! use shelfdb::{Field, Order, Shape, StorageManager};
//!
//! #[derive(Serialize, Deserialize)]
//! struct Message {
//!     id: String,
//!     text: String,
//! }
//!
//! # fn main() -> shelfdb::Result<()> {
//! let store = StorageManager::with_path("./data/store.sqlite")?;
//!
//! let inbox = vec![
//!     Message { id: "m1".into(), text: "hello".into() },
//!     Message { id: "m2".into(), text: "world".into() },
//! ];
//! store.set_collection("inbox", Shape::sequence(&inbox), &Field::named("id"), None)?;
//!
//! let page: Vec<shelfdb::Record<Message>> = store.list("inbox", 0, 20, Order::Descending, None)?;
//! assert_eq!(page.len(), 2);
//! # Ok(())
//! # }
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod backend;
pub mod schema;
pub mod record;
pub mod storage;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{Result, ShelfError};
pub use config::{Config, JournalMode};
pub use record::{Extract, Field, JsonCodec, Order, Record, Shape, ValueCodec};
pub use storage::StorageManager;

// =============================================================================
// Version Info
// =============================================================================

/// Current version of shelfdb
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
