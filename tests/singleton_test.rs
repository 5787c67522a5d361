//! Process-wide instances.
//!
//! Kept in its own test binary so no other test initializes the global
//! connection manager first.

use tarmac::{ConnectionConfig, ConnectionManager, DbError, MetadataRegistry};
use tempfile::NamedTempFile;

#[tokio::test]
async fn test_get_instance_lifecycle() {
    // Nothing constructed yet and nothing to construct it from
    let err = ConnectionManager::get_instance(None).unwrap_err();
    assert!(matches!(err, DbError::Configuration { .. }));

    let temp_file = NamedTempFile::new().expect("Failed to create temp file");
    let path = temp_file.path().to_str().unwrap().to_string();
    let first = ConnectionManager::get_instance(Some(ConnectionConfig::sqlite(&path))).unwrap();

    let second = ConnectionManager::get_instance(None).unwrap();
    assert!(ConnectionManager::ptr_eq(&first, &second));

    // A later configuration is ignored
    let third =
        ConnectionManager::get_instance(Some(ConnectionConfig::sqlite(":memory:"))).unwrap();
    assert!(ConnectionManager::ptr_eq(&first, &third));
    assert_eq!(third.config().database, path);

    let result = third.query("SELECT 1 AS one", &[]).await.unwrap();
    assert_eq!(result.rows[0]["one"], 1);
}

#[test]
fn test_global_registry_is_shared() {
    struct Gate;

    let a = MetadataRegistry::global();
    let b = MetadataRegistry::global();
    a.register_table::<Gate>("gates").unwrap();
    assert_eq!(b.get_table_name::<Gate>().as_deref(), Some("gates"));
}
