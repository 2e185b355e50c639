//! Storage Manager
//!
//! Public facade over the schema controller, write path and read path.
//!
//! ## Responsibilities
//! - Open the backend lazily on the first operation and reuse it
//! - Serialize every logical operation behind one lock
//! - Expose a clean-shutdown hook (`close`)

use std::path::Path;

use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use super::reader;
use super::writer::{self, WriteClock};
use crate::backend::Backend;
use crate::config::Config;
use crate::error::{Result, ShelfError};
use crate::record::{Extract, JsonCodec, Order, Record, Shape, ValueCodec};
use crate::schema::SchemaController;

/// Borrowed view of the open connection handed to the read/write paths
/// while the manager's lock is held
pub(crate) struct Session<'a, C> {
    pub backend: &'a Backend,
    pub schema: &'a mut SchemaController,
    pub clock: &'a mut WriteClock,
    pub codec: &'a C,
}

/// Mutable state guarded by the manager's lock
struct State {
    /// `None` until the first operation, and again after `close`
    backend: Option<Backend>,
    schema: SchemaController,
    clock: WriteClock,
}

/// The store's public surface
///
/// ## Concurrency:
/// - One SQLite connection, opened on first use
/// - `state` is held for a whole logical operation, so a batch written by
///   `set_collection` is never observed half-done by readers
/// - All methods use `&self`; share the manager with `Arc`
pub struct StorageManager<C = JsonCodec> {
    config: Config,
    codec: C,
    state: Mutex<State>,
}

impl StorageManager<JsonCodec> {
    /// Create a manager for `config` using JSON value encoding
    ///
    /// Nothing is opened until the first operation.
    pub fn new(config: Config) -> Result<Self> {
        Self::with_codec(config, JsonCodec)
    }

    /// Manager for a database file, other settings default
    pub fn with_path(path: impl AsRef<Path>) -> Result<Self> {
        Self::new(Config::builder().db_path(path.as_ref()).build())
    }

    /// Manager over an in-memory database
    ///
    /// Contents are lost on `close`.
    pub fn in_memory() -> Result<Self> {
        Self::new(Config::builder().in_memory().build())
    }
}

impl<C: ValueCodec> StorageManager<C> {
    /// Create a manager with a custom value codec
    pub fn with_codec(config: Config, codec: C) -> Result<Self> {
        config.validate()?;
        let schema = SchemaController::new(&config);

        Ok(Self {
            config,
            codec,
            state: Mutex::new(State {
                backend: None,
                schema,
                clock: WriteClock::default(),
            }),
        })
    }

    // =========================================================================
    // Write Path
    // =========================================================================

    /// Store `value` under `key`, replacing any previous value
    ///
    /// `None` deletes the stored value.
    pub fn store<T>(&self, key: &str, value: Option<&T>) -> Result<()>
    where
        T: Serialize + ?Sized,
    {
        self.with_session(|session| writer::store(session, key, value))
    }

    /// Upsert `shape` into the collection `key`
    ///
    /// `identity` names each scalar or sequence element (keyed shapes use
    /// their keys); `order` optionally extracts a sort key. Writing an
    /// existing identity overwrites it.
    ///
    /// Not a transaction: on error the elements before the failing one stay
    /// written. Returns the number of records written.
    pub fn set_collection<T>(
        &self,
        key: &str,
        shape: Shape<'_, T>,
        identity: &dyn Extract<T>,
        order: Option<&dyn Extract<T>>,
    ) -> Result<usize>
    where
        T: Serialize,
    {
        self.with_session(|session| writer::set_collection(session, key, shape, identity, order))
    }

    /// Remove records from the collection `key`
    ///
    /// An empty `identities` clears the collection. Fails with
    /// `CollectionNotFound` if the collection was never written, and with
    /// `IdentityNotFound` if some identities were absent (the present ones
    /// are still removed). Returns the number of records removed.
    pub fn remove(&self, key: &str, identities: &[&str]) -> Result<usize> {
        self.with_session(|session| writer::remove(session, key, identities))
    }

    /// Remove every record of the collection `key`, keeping its table
    pub fn clear(&self, key: &str) -> Result<usize> {
        self.remove(key, &[])
    }

    // =========================================================================
    // Read Path
    // =========================================================================

    /// Number of records in the collection `key`
    pub fn count(&self, key: &str) -> Result<usize> {
        self.with_session(|session| reader::count(session, key))
    }

    /// One page of the collection `key`
    ///
    /// `page_size == 0` returns everything. `condition` restricts the result
    /// to the given identities before paginating.
    pub fn list<T>(
        &self,
        key: &str,
        page_index: usize,
        page_size: usize,
        order: Order,
        condition: Option<&[&str]>,
    ) -> Result<Vec<Record<T>>>
    where
        T: DeserializeOwned,
    {
        self.with_session(|session| {
            reader::list(session, key, page_index, page_size, order, condition)
        })
    }

    /// A record by identity, or the most recent one when `identity` is `None`
    ///
    /// Without an identity, a key with no collection records resolves to the
    /// single value written by `store`.
    pub fn get<T>(&self, key: &str, identity: Option<&str>) -> Result<Option<Record<T>>>
    where
        T: DeserializeOwned,
    {
        self.with_session(|session| reader::get(session, key, identity))
    }

    /// The single value written by `store`
    pub fn load<T>(&self, key: &str) -> Result<Option<Record<T>>>
    where
        T: DeserializeOwned,
    {
        self.with_session(|session| reader::load(session, key))
    }

    /// Whether the collection `key` has a table (it may be empty)
    pub fn collection_exists(&self, key: &str) -> Result<bool> {
        self.with_session(|session| {
            Ok(session
                .schema
                .lookup_collection(session.backend, key)?
                .is_some())
        })
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Close the connection
    ///
    /// A later operation reopens it. Closing a manager that is not open is a
    /// no-op.
    pub fn close(&self) -> Result<()> {
        let mut state = self.state.lock();
        state.schema.reset();

        match state.backend.take() {
            Some(backend) => backend.close(),
            None => Ok(()),
        }
    }

    /// Whether the connection is currently open
    pub fn is_open(&self) -> bool {
        self.state.lock().backend.is_some()
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    // =========================================================================
    // Private Helpers
    // =========================================================================

    /// Run `f` with the lock held, opening the backend first if needed
    fn with_session<R>(&self, f: impl FnOnce(&mut Session<'_, C>) -> Result<R>) -> Result<R> {
        let mut state = self.state.lock();
        let State {
            backend,
            schema,
            clock,
        } = &mut *state;

        if backend.is_none() {
            let opened = Backend::open(&self.config)?;
            schema.init(&opened)?;
            debug!(path = ?opened.path(), "storage manager ready");
            *backend = Some(opened);
        }

        let backend = backend
            .as_ref()
            .ok_or_else(|| ShelfError::BackendUnavailable("connection not open".to_string()))?;

        let mut session = Session {
            backend,
            schema,
            clock,
            codec: &self.codec,
        };
        f(&mut session)
    }
}
