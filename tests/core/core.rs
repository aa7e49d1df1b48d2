use shopkeep::core::broker::DbBroker;
use shopkeep::core::config::{CONFIG_FILE, ShopkeepConfig};
use shopkeep::core::db;
use shopkeep::core::error::ShopkeepError;
use shopkeep::core::store::{self, STORE_DIR, Store};
use shopkeep::plugins::access::{BASE_PERMISSIONS, BASE_ROLES};
use std::fs;
use tempfile::tempdir;

#[test]
fn test_initialize_creates_store_schema_and_base_records() {
    let tmp = tempdir().unwrap();
    let (store, report) = shopkeep::initialize(tmp.path(), true).unwrap();

    assert!(tmp.path().join(STORE_DIR).join(CONFIG_FILE).is_file());
    assert!(store.db_path().is_file());
    assert_eq!(report.guard, "staff");
    assert_eq!(report.roles_created.len(), BASE_ROLES.len());
    assert_eq!(report.permissions_created.len(), BASE_PERMISSIONS.len());

    let conn = db::db_connect(&store.db_path().to_string_lossy()).unwrap();
    for table in ["products", "product_variants", "prices", "media", "urls", "roles", "permissions"] {
        assert!(db::table_exists(&conn, table).unwrap(), "missing {}", table);
    }
}

#[test]
fn test_reinitialize_is_a_noop() {
    let tmp = tempdir().unwrap();
    shopkeep::initialize(tmp.path(), true).unwrap();
    let config_path = tmp.path().join(STORE_DIR).join(CONFIG_FILE);
    fs::write(&config_path, "[duplicate]\nname_suffix = \" v2\"\n").unwrap();

    let (store, report) = shopkeep::initialize(tmp.path(), true).unwrap();
    assert!(report.is_noop());
    assert_eq!(store.config.duplicate.name_suffix, " v2");
    assert_eq!(
        fs::read_to_string(&config_path).unwrap(),
        "[duplicate]\nname_suffix = \" v2\"\n"
    );
}

#[test]
fn test_initialize_without_access_tables_skips_seeding() {
    let tmp = tempdir().unwrap();
    let (store, report) = shopkeep::initialize(tmp.path(), false).unwrap();
    assert!(report.roles_skipped);
    assert!(report.permissions_skipped);
    assert!(report.is_noop());

    let conn = db::db_connect(&store.db_path().to_string_lossy()).unwrap();
    assert!(db::table_exists(&conn, "products").unwrap());
    assert!(!db::table_exists(&conn, "roles").unwrap());
}

#[test]
fn test_malformed_config_fails_open() {
    let tmp = tempdir().unwrap();
    let store_dir = tmp.path().join(STORE_DIR);
    fs::create_dir_all(&store_dir).unwrap();
    fs::write(store_dir.join(CONFIG_FILE), "[panel\n").unwrap();

    let err = Store::open(tmp.path()).unwrap_err();
    assert!(matches!(err, ShopkeepError::ConfigError(_)));
}

#[test]
fn test_open_without_config_uses_defaults() {
    let tmp = tempdir().unwrap();
    let store = Store::open(tmp.path()).unwrap();
    assert_eq!(store.config, ShopkeepConfig::default());
    assert_eq!(store.root, tmp.path().join(STORE_DIR).join("data"));
    assert_eq!(store.db_path(), store.root.join("shop.db"));
    assert!(store.root.is_dir());
}

#[test]
fn test_find_project_root_walks_up() {
    let tmp = tempdir().unwrap();
    shopkeep::initialize(tmp.path(), false).unwrap();
    let nested = tmp.path().join("a").join("b");
    fs::create_dir_all(&nested).unwrap();

    assert_eq!(store::find_project_root(&nested).unwrap(), tmp.path());

    let elsewhere = tempdir().unwrap();
    let err = store::find_project_root(elsewhere.path()).unwrap_err();
    assert!(matches!(err, ShopkeepError::PathError(_)));
}

#[test]
fn test_broker_audits_every_operation() {
    let tmp = tempdir().unwrap();
    let (store, _) = shopkeep::initialize(tmp.path(), true).unwrap();

    let events = DbBroker::new(&store.root).read_events().unwrap();
    let ops: Vec<&str> = events.iter().map(|e| e.op.as_str()).collect();
    assert_eq!(ops, vec!["catalog.init", "access.init", "access.seed"]);
    assert!(events.iter().all(|e| e.status == "success" && e.db_id == "shop.db"));

    let broker = DbBroker::new(&store.root);
    let result: Result<(), ShopkeepError> = broker.with_conn(
        &store.db_path(),
        "tester",
        Some("intent-1"),
        "custom.fail",
        |_| Err(ShopkeepError::ValidationError("nope".to_string())),
    );
    assert!(result.is_err());

    let events = broker.read_events().unwrap();
    let last = events.last().unwrap();
    assert_eq!(last.op, "custom.fail");
    assert_eq!(last.actor, "tester");
    assert_eq!(last.status, "error");
    assert_eq!(last.intent_ref.as_deref(), Some("intent-1"));
}
