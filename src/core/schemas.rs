//! Centralized database schema definitions.
//!
//! shopkeep keeps all state in one SQLite database (`shop.db`):
//! 1. Catalog tables: products, product_variants, prices, media, urls.
//! 2. Access tables: roles and permissions. Their names are configurable, so
//!    their DDL is built from the configured names.

pub const SHOP_DB_NAME: &str = "shop.db";
pub const BROKER_EVENTS_NAME: &str = "broker.events.jsonl";
pub const NOTIFICATIONS_NAME: &str = "notifications.jsonl";

// --- 1. Catalog ---

pub const CATALOG_DB_SCHEMA_PRODUCTS: &str = "
    CREATE TABLE IF NOT EXISTS products (
        id TEXT PRIMARY KEY,
        product_type TEXT,
        brand TEXT,
        status TEXT NOT NULL DEFAULT 'draft',
        attribute_data TEXT NOT NULL, -- JSON object: key -> {type, value}
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    )
";

pub const CATALOG_DB_SCHEMA_VARIANTS: &str = "
    CREATE TABLE IF NOT EXISTS product_variants (
        id TEXT PRIMARY KEY,
        product_id TEXT NOT NULL,
        sku TEXT,
        gtin TEXT,
        stock INTEGER NOT NULL DEFAULT 0,
        backorder INTEGER NOT NULL DEFAULT 0,
        purchasable TEXT NOT NULL DEFAULT 'always',
        shippable INTEGER NOT NULL DEFAULT 1,
        unit_quantity INTEGER NOT NULL DEFAULT 1,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL,
        FOREIGN KEY(product_id) REFERENCES products(id) ON DELETE CASCADE
    )
";

pub const CATALOG_DB_SCHEMA_PRICES: &str = "
    CREATE TABLE IF NOT EXISTS prices (
        id TEXT PRIMARY KEY,
        priceable_type TEXT NOT NULL,
        priceable_id TEXT NOT NULL,
        currency TEXT NOT NULL,
        customer_group TEXT,
        price INTEGER NOT NULL, -- minor units
        compare_price INTEGER,
        min_quantity INTEGER NOT NULL DEFAULT 1
    )
";

pub const CATALOG_DB_SCHEMA_MEDIA: &str = "
    CREATE TABLE IF NOT EXISTS media (
        id TEXT PRIMARY KEY,
        model_type TEXT NOT NULL,
        model_id TEXT NOT NULL,
        collection_name TEXT NOT NULL DEFAULT 'images',
        name TEXT NOT NULL,
        file_name TEXT NOT NULL,
        mime_type TEXT,
        disk TEXT NOT NULL DEFAULT 'public',
        size INTEGER NOT NULL DEFAULT 0,
        order_column INTEGER
    )
";

pub const CATALOG_DB_SCHEMA_URLS: &str = "
    CREATE TABLE IF NOT EXISTS urls (
        id TEXT PRIMARY KEY,
        element_type TEXT NOT NULL,
        element_id TEXT NOT NULL,
        language TEXT NOT NULL DEFAULT 'en',
        slug TEXT NOT NULL,
        is_default INTEGER NOT NULL DEFAULT 0,
        UNIQUE(language, slug)
    )
";

pub const CATALOG_DB_SCHEMA_INDEXES: &str = "
    CREATE INDEX IF NOT EXISTS idx_variants_product ON product_variants(product_id);
    CREATE INDEX IF NOT EXISTS idx_prices_priceable ON prices(priceable_type, priceable_id);
    CREATE INDEX IF NOT EXISTS idx_media_model ON media(model_type, model_id);
    CREATE INDEX IF NOT EXISTS idx_urls_element ON urls(element_type, element_id);
";

// --- 2. Access ---

/// DDL for a roles table named `table` (already validated as an identifier).
pub fn access_roles_schema(table: &str) -> String {
    format!(
        "CREATE TABLE IF NOT EXISTS {table} (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            guard_name TEXT NOT NULL,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            UNIQUE(name, guard_name)
        )"
    )
}

/// DDL for a permissions table named `table` (already validated as an identifier).
pub fn access_permissions_schema(table: &str) -> String {
    format!(
        "CREATE TABLE IF NOT EXISTS {table} (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            guard_name TEXT NOT NULL,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            UNIQUE(name, guard_name)
        )"
    )
}
