//! Tests for SchemaController and Backend
//!
//! These tests verify:
//! - Backend open/create behavior and failure reporting
//! - Default table creation and schema versioning
//! - Lazy, idempotent collection table creation
//! - Identifier quoting for arbitrary collection keys

#[path = "../common/mod.rs"]
mod common;

use shelfdb::backend::Backend;
use shelfdb::schema::{quote_identifier, SchemaController, ORDER_INDEX_SUFFIX, SCHEMA_VERSION};
use shelfdb::{Config, ShelfError};
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

fn setup_backend() -> (TempDir, Config, Backend) {
    common::init_tracing();
    let temp_dir = TempDir::new().unwrap();
    let config = Config::builder()
        .db_path(temp_dir.path().join("schema.sqlite"))
        .build();
    let backend = Backend::open(&config).unwrap();
    (temp_dir, config, backend)
}

fn table_exists(backend: &Backend, name: &str) -> bool {
    backend
        .query_row(
            "SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1",
            [name],
            |_| Ok(()),
        )
        .unwrap()
        .is_some()
}

// =============================================================================
// Backend Tests
// =============================================================================

#[test]
fn test_open_creates_parent_directories() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("nested").join("dir").join("db.sqlite");

    let config = Config::builder().db_path(&path).build();
    let _backend = Backend::open(&config).unwrap();

    assert!(path.exists());
}

#[test]
fn test_open_without_parent_directory_fails() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("missing").join("db.sqlite");

    let config = Config::builder()
        .db_path(&path)
        .create_parent_dirs(false)
        .build();

    let result = Backend::open(&config);
    assert!(matches!(result, Err(ShelfError::BackendUnavailable(_))));
}

#[test]
fn test_open_in_memory() {
    let config = Config::builder().in_memory().build();
    let backend = Backend::open(&config).unwrap();

    assert!(backend.path().is_none());
    backend.close().unwrap();
}

#[test]
fn test_statement_failure_is_backend_error() {
    let (_temp, _config, backend) = setup_backend();

    let result = backend.execute("INSERT INTO no_such_table VALUES (1)", []);
    assert!(matches!(result, Err(ShelfError::Backend(_))));
}

// =============================================================================
// Init Tests
// =============================================================================

#[test]
fn test_init_creates_default_and_version_tables() {
    let (_temp, config, backend) = setup_backend();
    let mut schema = SchemaController::new(&config);

    schema.init(&backend).unwrap();

    assert!(table_exists(&backend, &config.default_table));
    assert!(table_exists(&backend, &format!("{}_version", config.default_table)));
}

#[test]
fn test_init_is_idempotent() {
    let (_temp, config, backend) = setup_backend();
    let mut schema = SchemaController::new(&config);

    schema.init(&backend).unwrap();
    schema.init(&backend).unwrap();

    let versions: Vec<String> = backend
        .query(
            &format!(
                "SELECT version FROM {}",
                quote_identifier(&format!("{}_version", config.default_table))
            ),
            [],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(versions, vec![SCHEMA_VERSION.to_string()]);
}

// =============================================================================
// Collection Tests
// =============================================================================

#[test]
fn test_ensure_collection_creates_table() {
    let (_temp, config, backend) = setup_backend();
    let mut schema = SchemaController::new(&config);
    schema.init(&backend).unwrap();

    let handle = schema.ensure_collection(&backend, "orders").unwrap();

    assert_eq!(handle.key(), "orders");
    assert_eq!(schema.table_name("orders"), "shelf_list_6f7264657273");
    assert_eq!(handle.table(), quote_identifier("shelf_list_6f7264657273"));
    assert!(table_exists(&backend, "shelf_list_6f7264657273"));
}

#[test]
fn test_ensure_collection_is_idempotent() {
    let (_temp, config, backend) = setup_backend();
    let mut schema = SchemaController::new(&config);
    schema.init(&backend).unwrap();

    let first = schema.ensure_collection(&backend, "orders").unwrap();
    let second = schema.ensure_collection(&backend, "orders").unwrap();

    assert_eq!(first, second);
    assert_eq!(schema.known_count(), 1);
}

#[test]
fn test_ensure_collection_survives_fresh_controller() {
    let (_temp, config, backend) = setup_backend();

    let mut schema = SchemaController::new(&config);
    schema.init(&backend).unwrap();
    schema.ensure_collection(&backend, "orders").unwrap();

    // A new controller has an empty cache; CREATE IF NOT EXISTS must still pass
    let mut fresh = SchemaController::new(&config);
    fresh.ensure_collection(&backend, "orders").unwrap();
    assert!(table_exists(&backend, &fresh.table_name("orders")));
}

#[test]
fn test_lookup_collection_does_not_create() {
    let (_temp, config, backend) = setup_backend();
    let mut schema = SchemaController::new(&config);
    schema.init(&backend).unwrap();

    assert!(schema.lookup_collection(&backend, "ghost").unwrap().is_none());
    assert!(!table_exists(&backend, &schema.table_name("ghost")));
}

#[test]
fn test_lookup_collection_finds_existing_table() {
    let (_temp, config, backend) = setup_backend();

    let mut writer = SchemaController::new(&config);
    writer.ensure_collection(&backend, "orders").unwrap();

    let mut reader = SchemaController::new(&config);
    let handle = reader.lookup_collection(&backend, "orders").unwrap();

    assert!(handle.is_some());
    assert_eq!(reader.known_count(), 1);
}

#[test]
fn test_reset_forgets_known_collections() {
    let (_temp, config, backend) = setup_backend();
    let mut schema = SchemaController::new(&config);
    schema.ensure_collection(&backend, "a").unwrap();
    schema.ensure_collection(&backend, "b").unwrap();

    schema.reset();

    assert_eq!(schema.known_count(), 0);
}

#[test]
fn test_collection_key_with_quotes_and_spaces() {
    let (_temp, config, backend) = setup_backend();
    let mut schema = SchemaController::new(&config);

    let key = "my \"odd\" list; DROP TABLE x";
    let handle = schema.ensure_collection(&backend, key).unwrap();

    assert!(table_exists(&backend, &schema.table_name(key)));
    backend
        .execute(
            &format!(
                "INSERT INTO {} (identity, value, created_time) VALUES ('a', '1', 0)",
                handle.table()
            ),
            [],
        )
        .unwrap();
}

#[test]
fn test_keys_differing_in_case_get_separate_tables() {
    let (_temp, config, backend) = setup_backend();
    let mut schema = SchemaController::new(&config);
    schema.init(&backend).unwrap();

    let upper = schema.ensure_collection(&backend, "Orders").unwrap();
    let lower = schema.ensure_collection(&backend, "orders").unwrap();
    assert_ne!(upper.table(), lower.table());

    for (handle, identity) in [(&upper, "a"), (&lower, "b")] {
        backend
            .execute(
                &format!(
                    "INSERT INTO {} (identity, value, created_time) VALUES (?1, '1', 0)",
                    handle.table()
                ),
                [identity],
            )
            .unwrap();
    }

    for handle in [&upper, &lower] {
        let count: Option<i64> = backend
            .query_row(
                &format!("SELECT COUNT(*) FROM {}", handle.table()),
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(count, Some(1));
    }
}

#[test]
fn test_collection_table_does_not_clash_with_other_index() {
    let (_temp, config, backend) = setup_backend();
    let mut schema = SchemaController::new(&config);
    schema.init(&backend).unwrap();

    // "x" gets an index named after its table; "x_order_idx" must not
    // land on that index name
    schema.ensure_collection(&backend, "x").unwrap();
    schema.ensure_collection(&backend, "x_order_idx").unwrap();
    schema.ensure_collection(&backend, "version").unwrap();

    assert_eq!(schema.known_count(), 3);
    assert!(table_exists(&backend, &schema.table_name("x_order_idx")));
}

#[test]
fn test_collection_ddl_failure_is_backend_error() {
    let (_temp, config, backend) = setup_backend();
    let mut schema = SchemaController::new(&config);
    schema.init(&backend).unwrap();

    // occupy the index name the collection needs
    let squatter = format!("{}{ORDER_INDEX_SUFFIX}", schema.table_name("x"));
    backend
        .execute_batch(&format!("CREATE TABLE {} (v)", quote_identifier(&squatter)))
        .unwrap();

    let result = schema.ensure_collection(&backend, "x");

    assert!(matches!(result, Err(ShelfError::Backend(_))));
    assert_eq!(schema.known_count(), 0);
}

#[test]
fn test_quote_identifier() {
    assert_eq!(quote_identifier("plain"), "\"plain\"");
    assert_eq!(quote_identifier("a\"b"), "\"a\"\"b\"");
}

// =============================================================================
// Config Tests
// =============================================================================

#[test]
fn test_config_rejects_empty_names() {
    let config = Config::builder().default_table("").build();
    assert!(matches!(config.validate(), Err(ShelfError::Config(_))));

    let config = Config::builder().collection_prefix("").build();
    assert!(matches!(config.validate(), Err(ShelfError::Config(_))));
}

#[test]
fn test_config_rejects_default_table_under_prefix() {
    let config = Config::builder()
        .collection_prefix("t_")
        .default_table("t_default")
        .build();

    assert!(matches!(config.validate(), Err(ShelfError::Config(_))));
}

#[test]
fn test_config_rejects_version_table_under_prefix() {
    let config = Config::builder()
        .default_table("a")
        .collection_prefix("a_")
        .build();
    assert!(matches!(config.validate(), Err(ShelfError::Config(_))));

    // prefix longer than the default table but covering its index name
    let config = Config::builder()
        .default_table("kv")
        .collection_prefix("kv_order")
        .build();
    assert!(matches!(config.validate(), Err(ShelfError::Config(_))));
}

#[test]
fn test_config_prefix_check_ignores_case() {
    let config = Config::builder()
        .default_table("T_default")
        .collection_prefix("t_")
        .build();
    assert!(matches!(config.validate(), Err(ShelfError::Config(_))));

    let config = Config::builder().collection_prefix("SQLite_list_").build();
    assert!(matches!(config.validate(), Err(ShelfError::Config(_))));
}

#[test]
fn test_config_accepts_disjoint_names() {
    let config = Config::builder()
        .default_table("kv")
        .collection_prefix("list__")
        .build();

    assert!(config.validate().is_ok());
}
