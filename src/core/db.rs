use crate::core::broker::DbBroker;
use crate::core::config::TableNames;
use crate::core::error::ShopkeepError;
use crate::core::schemas;
use crate::core::store::Store;
use regex::Regex;
use rusqlite::{Connection, OptionalExtension, params};
use std::sync::LazyLock;
use std::time::Duration;

static IDENTIFIER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z_][A-Za-z0-9_]{0,62}$").expect("identifier pattern is valid")
});

pub fn db_connect(db_path: &str) -> Result<Connection, ShopkeepError> {
    let conn = Connection::open(db_path)?;
    conn.busy_timeout(Duration::from_secs(5))?;
    conn.query_row("PRAGMA journal_mode=WAL;", [], |_| Ok(()))?;
    conn.execute("PRAGMA foreign_keys=ON;", [])?;
    Ok(conn)
}

/// Reject table names that cannot be spliced into DDL/DML verbatim.
pub fn checked_identifier(name: &str) -> Result<&str, ShopkeepError> {
    if IDENTIFIER.is_match(name) {
        Ok(name)
    } else {
        Err(ShopkeepError::ValidationError(format!(
            "invalid table name '{}'",
            name
        )))
    }
}

pub fn table_exists(conn: &Connection, table: &str) -> Result<bool, rusqlite::Error> {
    let found: Option<i64> = conn
        .query_row(
            "SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1",
            params![table],
            |row| row.get(0),
        )
        .optional()?;
    Ok(found.is_some())
}

pub fn create_catalog_tables(conn: &Connection) -> Result<(), rusqlite::Error> {
    conn.execute(schemas::CATALOG_DB_SCHEMA_PRODUCTS, [])?;
    conn.execute(schemas::CATALOG_DB_SCHEMA_VARIANTS, [])?;
    conn.execute(schemas::CATALOG_DB_SCHEMA_PRICES, [])?;
    conn.execute(schemas::CATALOG_DB_SCHEMA_MEDIA, [])?;
    conn.execute(schemas::CATALOG_DB_SCHEMA_URLS, [])?;
    conn.execute_batch(schemas::CATALOG_DB_SCHEMA_INDEXES)?;
    Ok(())
}

pub fn create_access_tables(conn: &Connection, tables: &TableNames) -> Result<(), ShopkeepError> {
    let roles = checked_identifier(&tables.roles)?;
    let permissions = checked_identifier(&tables.permissions)?;
    conn.execute(&schemas::access_roles_schema(roles), [])?;
    conn.execute(&schemas::access_permissions_schema(permissions), [])?;
    Ok(())
}

pub fn initialize_catalog_db(store: &Store) -> Result<(), ShopkeepError> {
    let broker = DbBroker::new(&store.root);
    broker.with_conn(&store.db_path(), "shopkeep", None, "catalog.init", |conn| {
        create_catalog_tables(conn)?;
        Ok(())
    })
}

pub fn initialize_access_db(store: &Store) -> Result<(), ShopkeepError> {
    let broker = DbBroker::new(&store.root);
    let tables = store.config.permission.table_names.clone();
    broker.with_conn(&store.db_path(), "shopkeep", None, "access.init", |conn| {
        create_access_tables(conn, &tables)
    })
}
