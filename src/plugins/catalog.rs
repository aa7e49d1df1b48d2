//! Product catalog: the product graph and its persistence.
//!
//! A product owns an attribute bag, variants (each owning prices), media
//! references and URLs. Children point at their parent through
//! `(type, id)` pairs so prices, media and URLs stay polymorphic.

use crate::core::broker::DbBroker;
use crate::core::error::ShopkeepError;
use crate::core::output::{self, OutputFormat};
use crate::core::store::Store;
use crate::core::time;
use crate::plugins::{duplicate, slug};
use clap::{Parser, Subcommand};
use colored::Colorize;
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSqlOutput, Type, ValueRef};
use rusqlite::{Connection, OptionalExtension, Row, ToSql, params};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::PathBuf;
use std::str::FromStr;

/// Morph name of products in polymorphic `*_type` columns.
pub const PRODUCT_MORPH: &str = "product";
/// Morph name of variants in polymorphic `*_type` columns.
pub const VARIANT_MORPH: &str = "product_variant";
/// The one attribute every product must carry.
pub const NAME_ATTRIBUTE: &str = "name";

/// Value of one attribute in a product's attribute bag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum AttributeValue {
    Text(String),
    TranslatedText(BTreeMap<String, String>),
    Number(f64),
    Toggle(bool),
    Dropdown(String),
    List(Vec<String>),
}

impl AttributeValue {
    /// A new value of the same kind holding `text`.
    ///
    /// Translated text keeps its locales, each set to `text`; kinds that cannot
    /// hold free text become plain text.
    pub fn with_text(&self, text: &str) -> AttributeValue {
        match self {
            AttributeValue::TranslatedText(locales) if !locales.is_empty() => {
                AttributeValue::TranslatedText(
                    locales
                        .keys()
                        .map(|locale| (locale.clone(), text.to_string()))
                        .collect(),
                )
            }
            AttributeValue::Dropdown(_) => AttributeValue::Dropdown(text.to_string()),
            _ => AttributeValue::Text(text.to_string()),
        }
    }

    /// Display form; translated text prefers `en`, then the first locale.
    pub fn display(&self) -> String {
        match self {
            AttributeValue::Text(s) | AttributeValue::Dropdown(s) => s.clone(),
            AttributeValue::TranslatedText(locales) => locales
                .get("en")
                .or_else(|| locales.values().next())
                .cloned()
                .unwrap_or_default(),
            AttributeValue::Number(n) => n.to_string(),
            AttributeValue::Toggle(b) => (if *b { "Yes" } else { "No" }).to_string(),
            AttributeValue::List(items) => items.join(", "),
        }
    }
}

/// Ordered attribute-key to value mapping.
pub type AttributeData = BTreeMap<String, AttributeValue>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ProductStatus {
    #[default]
    Draft,
    Published,
}

impl ProductStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProductStatus::Draft => "draft",
            ProductStatus::Published => "published",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ProductStatus::Draft => "Draft",
            ProductStatus::Published => "Published",
        }
    }
}

impl fmt::Display for ProductStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProductStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "draft" => Ok(ProductStatus::Draft),
            "published" => Ok(ProductStatus::Published),
            other => Err(format!(
                "unknown product status '{}' (expected draft|published)",
                other
            )),
        }
    }
}

impl ToSql for ProductStatus {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for ProductStatus {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|e: String| FromSqlError::Other(e.into()))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: String,
    pub product_type: Option<String>,
    pub brand: Option<String>,
    pub status: ProductStatus,
    pub attribute_data: AttributeData,
    pub created_at: String,
    pub updated_at: String,
}

impl Product {
    pub fn new(
        product_type: Option<String>,
        brand: Option<String>,
        status: ProductStatus,
        attribute_data: AttributeData,
    ) -> Self {
        let now = time::now_epoch_z();
        Self {
            id: time::new_record_id(),
            product_type,
            brand,
            status,
            attribute_data,
            created_at: now.clone(),
            updated_at: now,
        }
    }

    /// Display name from the `name` attribute, if present.
    pub fn name(&self) -> Option<String> {
        self.attribute_data.get(NAME_ATTRIBUTE).map(|v| v.display())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Variant {
    pub id: String,
    pub product_id: String,
    pub sku: Option<String>,
    pub gtin: Option<String>,
    pub stock: i64,
    pub backorder: i64,
    pub purchasable: String,
    pub shippable: bool,
    pub unit_quantity: i64,
    pub created_at: String,
    pub updated_at: String,
}

impl Variant {
    /// Unpersisted copy owned by `product_id`, with a fresh identity.
    pub fn copy_for(&self, product_id: &str) -> Variant {
        let now = time::now_epoch_z();
        Variant {
            id: time::new_record_id(),
            product_id: product_id.to_string(),
            sku: self.sku.clone(),
            gtin: self.gtin.clone(),
            stock: self.stock,
            backorder: self.backorder,
            purchasable: self.purchasable.clone(),
            shippable: self.shippable,
            unit_quantity: self.unit_quantity,
            created_at: now.clone(),
            updated_at: now,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Price {
    pub id: String,
    pub priceable_type: String,
    pub priceable_id: String,
    pub currency: String,
    pub customer_group: Option<String>,
    /// Amount in minor units.
    pub price: i64,
    pub compare_price: Option<i64>,
    pub min_quantity: i64,
}

impl Price {
    /// Unpersisted copy owned by `priceable_id` (same priceable type).
    pub fn copy_for(&self, priceable_id: &str) -> Price {
        Price {
            id: time::new_record_id(),
            priceable_type: self.priceable_type.clone(),
            priceable_id: priceable_id.to_string(),
            currency: self.currency.clone(),
            customer_group: self.customer_group.clone(),
            price: self.price,
            compare_price: self.compare_price,
            min_quantity: self.min_quantity,
        }
    }
}

/// Reference to a stored binary asset, identified by `(disk, file_name)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Media {
    pub id: String,
    pub model_type: String,
    pub model_id: String,
    pub collection_name: String,
    pub name: String,
    pub file_name: String,
    pub mime_type: Option<String>,
    pub disk: String,
    pub size: i64,
    pub order_column: Option<i64>,
}

impl Media {
    /// Unpersisted copy attached to `model_id`. The asset itself is shared.
    pub fn copy_for(&self, model_id: &str) -> Media {
        Media {
            id: time::new_record_id(),
            model_type: self.model_type.clone(),
            model_id: model_id.to_string(),
            collection_name: self.collection_name.clone(),
            name: self.name.clone(),
            file_name: self.file_name.clone(),
            mime_type: self.mime_type.clone(),
            disk: self.disk.clone(),
            size: self.size,
            order_column: self.order_column,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Url {
    pub id: String,
    pub element_type: String,
    pub element_id: String,
    pub language: String,
    pub slug: String,
    pub is_default: bool,
}

impl Url {
    /// Unpersisted copy attached to `element_id` under a new slug.
    pub fn copy_for(&self, element_id: &str, slug: String) -> Url {
        Url {
            id: time::new_record_id(),
            element_type: self.element_type.clone(),
            element_id: element_id.to_string(),
            language: self.language.clone(),
            slug,
            is_default: self.is_default,
        }
    }
}

/// A variant together with its prices.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VariantGraph {
    #[serde(flatten)]
    pub variant: Variant,
    pub prices: Vec<Price>,
}

/// A product with every owned child, as shown by `product show`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductGraph {
    pub product: Product,
    pub variants: Vec<VariantGraph>,
    pub media: Vec<Media>,
    pub urls: Vec<Url>,
}

fn encode_attributes(data: &AttributeData) -> rusqlite::Result<String> {
    serde_json::to_string(data).map_err(|e| rusqlite::Error::ToSqlConversionFailure(Box::new(e)))
}

fn decode_attributes(idx: usize, raw: &str) -> rusqlite::Result<AttributeData> {
    serde_json::from_str(raw)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

const PRODUCT_COLUMNS: &str =
    "id, product_type, brand, status, attribute_data, created_at, updated_at";

fn product_from_row(row: &Row<'_>) -> rusqlite::Result<Product> {
    let raw: String = row.get(4)?;
    Ok(Product {
        id: row.get(0)?,
        product_type: row.get(1)?,
        brand: row.get(2)?,
        status: row.get(3)?,
        attribute_data: decode_attributes(4, &raw)?,
        created_at: row.get(5)?,
        updated_at: row.get(6)?,
    })
}

pub fn insert_product(conn: &Connection, product: &Product) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT INTO products(id, product_type, brand, status, attribute_data, created_at, updated_at)
         VALUES(?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            product.id,
            product.product_type,
            product.brand,
            product.status,
            encode_attributes(&product.attribute_data)?,
            product.created_at,
            product.updated_at
        ],
    )?;
    Ok(())
}

pub fn get_product(conn: &Connection, id: &str) -> rusqlite::Result<Option<Product>> {
    conn.query_row(
        &format!("SELECT {} FROM products WHERE id = ?1", PRODUCT_COLUMNS),
        params![id],
        product_from_row,
    )
    .optional()
}

pub fn list_products(conn: &Connection) -> rusqlite::Result<Vec<Product>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM products ORDER BY created_at, id",
        PRODUCT_COLUMNS
    ))?;
    let rows = stmt.query_map([], product_from_row)?;
    rows.collect()
}

pub fn insert_variant(conn: &Connection, variant: &Variant) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT INTO product_variants(id, product_id, sku, gtin, stock, backorder, purchasable,
             shippable, unit_quantity, created_at, updated_at)
         VALUES(?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
        params![
            variant.id,
            variant.product_id,
            variant.sku,
            variant.gtin,
            variant.stock,
            variant.backorder,
            variant.purchasable,
            variant.shippable,
            variant.unit_quantity,
            variant.created_at,
            variant.updated_at
        ],
    )?;
    Ok(())
}

pub fn variants_for(conn: &Connection, product_id: &str) -> rusqlite::Result<Vec<Variant>> {
    let mut stmt = conn.prepare(
        "SELECT id, product_id, sku, gtin, stock, backorder, purchasable, shippable,
                unit_quantity, created_at, updated_at
         FROM product_variants WHERE product_id = ?1 ORDER BY created_at, id",
    )?;
    let rows = stmt.query_map(params![product_id], |row| {
        Ok(Variant {
            id: row.get(0)?,
            product_id: row.get(1)?,
            sku: row.get(2)?,
            gtin: row.get(3)?,
            stock: row.get(4)?,
            backorder: row.get(5)?,
            purchasable: row.get(6)?,
            shippable: row.get(7)?,
            unit_quantity: row.get(8)?,
            created_at: row.get(9)?,
            updated_at: row.get(10)?,
        })
    })?;
    rows.collect()
}

pub fn insert_price(conn: &Connection, price: &Price) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT INTO prices(id, priceable_type, priceable_id, currency, customer_group, price,
             compare_price, min_quantity)
         VALUES(?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            price.id,
            price.priceable_type,
            price.priceable_id,
            price.currency,
            price.customer_group,
            price.price,
            price.compare_price,
            price.min_quantity
        ],
    )?;
    Ok(())
}

pub fn prices_for(
    conn: &Connection,
    priceable_type: &str,
    priceable_id: &str,
) -> rusqlite::Result<Vec<Price>> {
    let mut stmt = conn.prepare(
        "SELECT id, priceable_type, priceable_id, currency, customer_group, price,
                compare_price, min_quantity
         FROM prices WHERE priceable_type = ?1 AND priceable_id = ?2
         ORDER BY min_quantity, id",
    )?;
    let rows = stmt.query_map(params![priceable_type, priceable_id], |row| {
        Ok(Price {
            id: row.get(0)?,
            priceable_type: row.get(1)?,
            priceable_id: row.get(2)?,
            currency: row.get(3)?,
            customer_group: row.get(4)?,
            price: row.get(5)?,
            compare_price: row.get(6)?,
            min_quantity: row.get(7)?,
        })
    })?;
    rows.collect()
}

pub fn insert_media(conn: &Connection, media: &Media) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT INTO media(id, model_type, model_id, collection_name, name, file_name,
             mime_type, disk, size, order_column)
         VALUES(?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
        params![
            media.id,
            media.model_type,
            media.model_id,
            media.collection_name,
            media.name,
            media.file_name,
            media.mime_type,
            media.disk,
            media.size,
            media.order_column
        ],
    )?;
    Ok(())
}

pub fn media_for(conn: &Connection, model_type: &str, model_id: &str) -> rusqlite::Result<Vec<Media>> {
    let mut stmt = conn.prepare(
        "SELECT id, model_type, model_id, collection_name, name, file_name, mime_type, disk,
                size, order_column
         FROM media WHERE model_type = ?1 AND model_id = ?2
         ORDER BY order_column IS NULL, order_column, id",
    )?;
    let rows = stmt.query_map(params![model_type, model_id], |row| {
        Ok(Media {
            id: row.get(0)?,
            model_type: row.get(1)?,
            model_id: row.get(2)?,
            collection_name: row.get(3)?,
            name: row.get(4)?,
            file_name: row.get(5)?,
            mime_type: row.get(6)?,
            disk: row.get(7)?,
            size: row.get(8)?,
            order_column: row.get(9)?,
        })
    })?;
    rows.collect()
}

pub fn insert_url(conn: &Connection, url: &Url) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT INTO urls(id, element_type, element_id, language, slug, is_default)
         VALUES(?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            url.id,
            url.element_type,
            url.element_id,
            url.language,
            url.slug,
            url.is_default
        ],
    )?;
    Ok(())
}

pub fn urls_for(conn: &Connection, element_type: &str, element_id: &str) -> rusqlite::Result<Vec<Url>> {
    let mut stmt = conn.prepare(
        "SELECT id, element_type, element_id, language, slug, is_default
         FROM urls WHERE element_type = ?1 AND element_id = ?2
         ORDER BY is_default DESC, language, slug",
    )?;
    let rows = stmt.query_map(params![element_type, element_id], |row| {
        Ok(Url {
            id: row.get(0)?,
            element_type: row.get(1)?,
            element_id: row.get(2)?,
            language: row.get(3)?,
            slug: row.get(4)?,
            is_default: row.get(5)?,
        })
    })?;
    rows.collect()
}

/// Load a product with all of its children.
pub fn load_graph(conn: &Connection, id: &str) -> rusqlite::Result<Option<ProductGraph>> {
    let Some(product) = get_product(conn, id)? else {
        return Ok(None);
    };
    let mut variants = Vec::new();
    for variant in variants_for(conn, &product.id)? {
        let prices = prices_for(conn, VARIANT_MORPH, &variant.id)?;
        variants.push(VariantGraph { variant, prices });
    }
    let media = media_for(conn, PRODUCT_MORPH, &product.id)?;
    let urls = urls_for(conn, PRODUCT_MORPH, &product.id)?;
    Ok(Some(ProductGraph {
        product,
        variants,
        media,
        urls,
    }))
}

// --- Import documents ---

/// A product graph as written in an import document.
#[derive(Debug, Clone, Deserialize)]
pub struct ProductDraft {
    #[serde(default)]
    pub product_type: Option<String>,
    #[serde(default)]
    pub brand: Option<String>,
    #[serde(default)]
    pub status: ProductStatus,
    pub attributes: AttributeData,
    #[serde(default)]
    pub variants: Vec<VariantDraft>,
    #[serde(default)]
    pub media: Vec<MediaDraft>,
    #[serde(default)]
    pub urls: Vec<UrlDraft>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VariantDraft {
    #[serde(default)]
    pub sku: Option<String>,
    #[serde(default)]
    pub gtin: Option<String>,
    #[serde(default)]
    pub stock: i64,
    #[serde(default)]
    pub backorder: i64,
    #[serde(default = "default_purchasable")]
    pub purchasable: String,
    #[serde(default = "default_true")]
    pub shippable: bool,
    #[serde(default = "default_one")]
    pub unit_quantity: i64,
    #[serde(default)]
    pub prices: Vec<PriceDraft>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PriceDraft {
    pub currency: String,
    #[serde(default)]
    pub customer_group: Option<String>,
    pub price: i64,
    #[serde(default)]
    pub compare_price: Option<i64>,
    #[serde(default = "default_one")]
    pub min_quantity: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MediaDraft {
    #[serde(default = "default_collection")]
    pub collection_name: String,
    pub name: String,
    pub file_name: String,
    #[serde(default)]
    pub mime_type: Option<String>,
    #[serde(default = "default_disk")]
    pub disk: String,
    #[serde(default)]
    pub size: i64,
    #[serde(default)]
    pub order_column: Option<i64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UrlDraft {
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default = "default_language")]
    pub language: String,
    #[serde(default)]
    pub default: bool,
}

fn default_purchasable() -> String {
    "always".to_string()
}

fn default_true() -> bool {
    true
}

fn default_one() -> i64 {
    1
}

fn default_collection() -> String {
    "images".to_string()
}

fn default_disk() -> String {
    "public".to_string()
}

fn default_language() -> String {
    "en".to_string()
}

/// Persist a whole draft graph in one transaction.
///
/// URL slugs are slugified (from the product name when omitted) and made
/// unique per language.
pub fn import_product(conn: &Connection, draft: &ProductDraft) -> Result<ProductGraph, ShopkeepError> {
    if !draft.attributes.contains_key(NAME_ATTRIBUTE) {
        return Err(ShopkeepError::ValidationError(
            "product attributes must include 'name'".to_string(),
        ));
    }
    let tx = conn.unchecked_transaction()?;

    let product = Product::new(
        draft.product_type.clone(),
        draft.brand.clone(),
        draft.status,
        draft.attributes.clone(),
    );
    insert_product(&tx, &product)?;

    let mut variants = Vec::new();
    for v in &draft.variants {
        let now = time::now_epoch_z();
        let variant = Variant {
            id: time::new_record_id(),
            product_id: product.id.clone(),
            sku: v.sku.clone(),
            gtin: v.gtin.clone(),
            stock: v.stock,
            backorder: v.backorder,
            purchasable: v.purchasable.clone(),
            shippable: v.shippable,
            unit_quantity: v.unit_quantity,
            created_at: now.clone(),
            updated_at: now,
        };
        insert_variant(&tx, &variant)?;
        let mut prices = Vec::new();
        for p in &v.prices {
            let price = Price {
                id: time::new_record_id(),
                priceable_type: VARIANT_MORPH.to_string(),
                priceable_id: variant.id.clone(),
                currency: p.currency.clone(),
                customer_group: p.customer_group.clone(),
                price: p.price,
                compare_price: p.compare_price,
                min_quantity: p.min_quantity,
            };
            insert_price(&tx, &price)?;
            prices.push(price);
        }
        variants.push(VariantGraph { variant, prices });
    }

    let mut media = Vec::new();
    for m in &draft.media {
        let item = Media {
            id: time::new_record_id(),
            model_type: PRODUCT_MORPH.to_string(),
            model_id: product.id.clone(),
            collection_name: m.collection_name.clone(),
            name: m.name.clone(),
            file_name: m.file_name.clone(),
            mime_type: m.mime_type.clone(),
            disk: m.disk.clone(),
            size: m.size,
            order_column: m.order_column,
        };
        insert_media(&tx, &item)?;
        media.push(item);
    }

    let mut urls = Vec::new();
    let fallback = product.name().unwrap_or_default();
    for u in &draft.urls {
        let base = slug::slugify(u.slug.as_deref().unwrap_or(&fallback));
        let url = Url {
            id: time::new_record_id(),
            element_type: PRODUCT_MORPH.to_string(),
            element_id: product.id.clone(),
            language: u.language.clone(),
            slug: slug::unique_slug(&tx, &base, &u.language)?,
            is_default: u.default,
        };
        insert_url(&tx, &url)?;
        urls.push(url);
    }

    tx.commit()?;
    Ok(ProductGraph {
        product,
        variants,
        media,
        urls,
    })
}

// --- Store-level operations ---

pub fn add_product_from_json(store: &Store, json: &str) -> Result<ProductGraph, ShopkeepError> {
    let draft: ProductDraft = serde_json::from_str(json)?;
    let broker = DbBroker::new(&store.root);
    broker.with_conn(&store.db_path(), "shopkeep", None, "product.add", |conn| {
        import_product(conn, &draft)
    })
}

pub fn show_product(store: &Store, id: &str) -> Result<ProductGraph, ShopkeepError> {
    let broker = DbBroker::new(&store.root);
    broker.with_conn(&store.db_path(), "shopkeep", Some(id), "product.show", |conn| {
        load_graph(conn, id)?.ok_or_else(|| ShopkeepError::NotFound(format!("product {}", id)))
    })
}

pub fn list_all_products(store: &Store) -> Result<Vec<Product>, ShopkeepError> {
    let broker = DbBroker::new(&store.root);
    broker.with_conn(&store.db_path(), "shopkeep", None, "product.list", |conn| {
        Ok(list_products(conn)?)
    })
}

#[derive(Parser, Debug)]
#[clap(name = "product", about = "Manage catalog products")]
pub struct ProductCli {
    #[clap(subcommand)]
    pub command: ProductCommand,
    /// Output format.
    #[clap(long, value_enum, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Subcommand, Debug)]
pub enum ProductCommand {
    /// Import a product graph from a JSON document.
    Add {
        #[clap(long)]
        json: PathBuf,
    },
    /// List products.
    List,
    /// Show a product with its variants, prices, media and URLs.
    Show { id: String },
    /// Duplicate a product.
    Duplicate(duplicate::DuplicateArgs),
}

pub fn run_product_cli(store: &Store, cli: ProductCli) -> Result<(), ShopkeepError> {
    match cli.command {
        ProductCommand::Add { json } => {
            let body = fs::read_to_string(&json)?;
            let graph = add_product_from_json(store, &body)?;
            match cli.format {
                OutputFormat::Json => output::print_envelope("product.add", "ok", "product", &graph)?,
                OutputFormat::Text => println!(
                    "{} Product added: {}",
                    "✓".bright_green(),
                    graph.product.id.bright_white()
                ),
            }
        }
        ProductCommand::List => {
            let products = list_all_products(store)?;
            match cli.format {
                OutputFormat::Json => {
                    output::print_envelope("product.list", "ok", "products", &products)?
                }
                OutputFormat::Text => {
                    if products.is_empty() {
                        println!("No products found.");
                    }
                    for p in &products {
                        println!(
                            "{}  {:<9} {}",
                            p.id,
                            p.status.as_str(),
                            output::compact_line(&p.name().unwrap_or_default(), 60)
                        );
                    }
                }
            }
        }
        ProductCommand::Show { id } => {
            let graph = show_product(store, &id)?;
            match cli.format {
                OutputFormat::Json => output::print_envelope("product.show", "ok", "product", &graph)?,
                OutputFormat::Text => print_graph(&graph),
            }
        }
        ProductCommand::Duplicate(args) => duplicate::run_duplicate_cli(store, args, cli.format)?,
    }
    Ok(())
}

fn print_graph(graph: &ProductGraph) {
    let p = &graph.product;
    println!(
        "{} {} [{}]",
        "Product".bold(),
        p.id.bright_white(),
        p.status.label()
    );
    for (key, value) in &p.attribute_data {
        println!("  {:<16} {}", key, output::compact_line(&value.display(), 80));
    }
    println!("{} ({})", "Variants".bold(), graph.variants.len());
    for v in &graph.variants {
        println!(
            "  {} sku={} stock={}",
            v.variant.id,
            v.variant.sku.as_deref().unwrap_or("-"),
            v.variant.stock
        );
        for price in &v.prices {
            println!(
                "    {} {} (min qty {})",
                price.price, price.currency, price.min_quantity
            );
        }
    }
    println!("{} ({})", "Media".bold(), graph.media.len());
    for m in &graph.media {
        println!("  {} {}:{}", m.id, m.disk, m.file_name);
    }
    println!("{} ({})", "URLs".bold(), graph.urls.len());
    for u in &graph.urls {
        let marker = if u.is_default { " (default)" } else { "" };
        println!("  [{}] {}{}", u.language, u.slug, marker);
    }
}
