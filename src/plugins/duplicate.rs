//! Product duplication.
//!
//! `duplicate_product` copies a product and the sub-graphs selected in
//! [`DuplicationOptions`] inside a single transaction. Either the whole clone
//! is committed or nothing is: the transaction is rolled back when dropped on
//! any error path.
//!
//! `run_duplication` is the request-handler entry point: it resolves the
//! source, runs the clone through the broker and records the success or
//! failure notification.

use crate::core::broker::DbBroker;
use crate::core::config::DuplicateDefaults;
use crate::core::error::{CloneError, ShopkeepError};
use crate::core::output::{self, OutputFormat};
use crate::core::store::Store;
use crate::core::time;
use crate::plugins::catalog::{
    self, AttributeData, NAME_ATTRIBUTE, PRODUCT_MORPH, Product, ProductStatus, VARIANT_MORPH,
};
use crate::plugins::notify::{self, Notification};
use crate::plugins::slug;
use colored::Colorize;
use rusqlite::{Connection, Transaction, TransactionBehavior};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

pub const MAX_NAME_CHARS: usize = 255;

pub const DUPLICATED_TITLE: &str = "Product duplicated successfully";
pub const DUPLICATE_FAILED_TITLE: &str = "Error duplicating product";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DuplicationOptions {
    pub new_name: String,
    pub new_status: ProductStatus,
    pub include_variants: bool,
    /// Only honoured together with `include_variants`.
    pub include_prices: bool,
    pub include_media: bool,
    pub include_urls: bool,
    pub copy_attributes: bool,
    pub selected_attribute_keys: BTreeSet<String>,
}

/// Human-readable summary of what a duplication will do.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DuplicationReview {
    pub name: String,
    pub status: String,
    pub components: String,
    pub attributes: String,
}

impl DuplicationOptions {
    /// The wizard's initial state for `source`.
    pub fn for_source(
        source: &Product,
        defaults: &DuplicateDefaults,
    ) -> Result<Self, ShopkeepError> {
        let new_status = defaults
            .default_status
            .parse::<ProductStatus>()
            .map_err(ShopkeepError::ValidationError)?;
        Ok(Self {
            new_name: format!(
                "{}{}",
                source.name().unwrap_or_default(),
                defaults.name_suffix
            ),
            new_status,
            include_variants: defaults.include_variants,
            include_prices: defaults.include_prices,
            include_media: defaults.include_media,
            include_urls: defaults.include_urls,
            copy_attributes: defaults.copy_attributes,
            selected_attribute_keys: source.attribute_data.keys().cloned().collect(),
        })
    }

    pub fn validate(&self) -> Result<(), CloneError> {
        if self.new_name.trim().is_empty() {
            return Err(CloneError::InvalidOptions(
                "new product name is required".to_string(),
            ));
        }
        if self.new_name.chars().count() > MAX_NAME_CHARS {
            return Err(CloneError::InvalidOptions(format!(
                "new product name exceeds {} characters",
                MAX_NAME_CHARS
            )));
        }
        Ok(())
    }

    pub fn review(&self) -> DuplicationReview {
        let mut components = Vec::new();
        if self.include_variants {
            components.push("Variants");
        }
        if self.include_media {
            components.push("Media");
        }
        if self.include_prices && self.include_variants {
            components.push("Prices");
        }
        if self.include_urls {
            components.push("URLs");
        }
        let attributes = if !self.copy_attributes || self.selected_attribute_keys.is_empty() {
            "None".to_string()
        } else {
            self.selected_attribute_keys
                .iter()
                .map(|k| capitalize(k))
                .collect::<Vec<_>>()
                .join(", ")
        };
        DuplicationReview {
            name: self.new_name.clone(),
            status: self.new_status.label().to_string(),
            components: if components.is_empty() {
                "None".to_string()
            } else {
                components.join(", ")
            },
            attributes,
        }
    }
}

fn capitalize(key: &str) -> String {
    let mut chars = key.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Attribute keys offered for copying, with display labels.
pub fn selectable_attributes(source: &Product) -> Vec<(String, String)> {
    source
        .attribute_data
        .keys()
        .map(|k| (k.clone(), capitalize(k)))
        .collect()
}

/// The clone's attribute bag: the selected subset (when copying), with
/// `name` always replaced by a fresh value holding `new_name`.
pub fn cloned_attributes(
    source: &Product,
    options: &DuplicationOptions,
) -> Result<AttributeData, CloneError> {
    let name = source
        .attribute_data
        .get(NAME_ATTRIBUTE)
        .ok_or_else(|| CloneError::MissingName {
            product_id: source.id.clone(),
        })?;

    let mut data: AttributeData = if options.copy_attributes {
        source
            .attribute_data
            .iter()
            .filter(|(key, _)| options.selected_attribute_keys.contains(*key))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect()
    } else {
        AttributeData::new()
    };
    data.insert(NAME_ATTRIBUTE.to_string(), name.with_text(&options.new_name));
    Ok(data)
}

/// Duplicate `source` according to `options`. Returns the new product.
pub fn duplicate_product(
    conn: &Connection,
    source: &Product,
    options: &DuplicationOptions,
) -> Result<Product, CloneError> {
    options.validate()?;
    // Take the write lock before the first read; a deferred transaction whose
    // snapshot goes stale fails with SQLITE_BUSY instead of waiting.
    let tx = Transaction::new_unchecked(conn, TransactionBehavior::Immediate)?;
    let clone = copy_graph(&tx, source, options)?;
    tx.commit()?;
    Ok(clone)
}

fn copy_graph(
    conn: &Connection,
    source: &Product,
    options: &DuplicationOptions,
) -> Result<Product, CloneError> {
    // Children are read inside the transaction, so they match what we copy.
    if catalog::get_product(conn, &source.id)?.is_none() {
        return Err(CloneError::SourceNotFound(source.id.clone()));
    }

    let now = time::now_epoch_z();
    let product = Product {
        id: time::new_record_id(),
        product_type: source.product_type.clone(),
        brand: source.brand.clone(),
        status: options.new_status,
        attribute_data: cloned_attributes(source, options)?,
        created_at: now.clone(),
        updated_at: now,
    };
    catalog::insert_product(conn, &product)?;

    if options.include_variants {
        for variant in catalog::variants_for(conn, &source.id)? {
            let copy = variant.copy_for(&product.id);
            catalog::insert_variant(conn, &copy)?;

            if options.include_prices {
                for price in catalog::prices_for(conn, VARIANT_MORPH, &variant.id)? {
                    catalog::insert_price(conn, &price.copy_for(&copy.id))?;
                }
            }
        }
    }

    if options.include_media {
        for media in catalog::media_for(conn, PRODUCT_MORPH, &source.id)? {
            catalog::insert_media(conn, &media.copy_for(&product.id))?;
        }
    }

    if options.include_urls {
        let base = slug::slugify(&options.new_name);
        for url in catalog::urls_for(conn, PRODUCT_MORPH, &source.id)? {
            let slug = slug::unique_slug(conn, &base, &url.language)?;
            catalog::insert_url(conn, &url.copy_for(&product.id, slug))?;
        }
    }

    Ok(product)
}

/// Route of the edit view for a product.
pub fn edit_route(product_id: &str) -> String {
    format!("products/{}/edit", product_id)
}

fn duplicate_by_id(
    conn: &Connection,
    source_id: &str,
    options: &DuplicationOptions,
) -> Result<Product, CloneError> {
    let source = catalog::get_product(conn, source_id)?
        .ok_or_else(|| CloneError::SourceNotFound(source_id.to_string()))?;
    duplicate_product(conn, &source, options)
}

/// A committed duplication.
#[derive(Debug)]
pub struct Duplicated {
    pub product: Product,
    /// Set when the success notification could not be recorded. The clone is
    /// committed regardless.
    pub notification_error: Option<ShopkeepError>,
}

/// Duplicate the stored product `source_id` and record the outcome as a
/// notification. The caller renders the returned result; nothing is retried.
///
/// Once the clone has committed the result is `Ok`, even if the ledger write
/// fails. On a failed clone the clone error wins over a ledger error.
pub fn run_duplication(
    store: &Store,
    source_id: &str,
    options: &DuplicationOptions,
) -> Result<Duplicated, ShopkeepError> {
    let broker = DbBroker::new(&store.root);
    let result = broker.with_conn(
        &store.db_path(),
        "shopkeep",
        Some(source_id),
        "product.duplicate",
        |conn| duplicate_by_id(conn, source_id, options).map_err(ShopkeepError::from),
    );

    match result {
        Ok(product) => {
            let notification = Notification::success(DUPLICATED_TITLE)
                .subject(product.id.clone())
                .redirect(edit_route(&product.id));
            Ok(Duplicated {
                notification_error: notify::record(&store.root, &notification).err(),
                product,
            })
        }
        Err(err) => {
            let notification = Notification::danger(DUPLICATE_FAILED_TITLE)
                .subject(source_id)
                .body(err.to_string());
            let _ = notify::record(&store.root, &notification);
            Err(err)
        }
    }
}

#[derive(clap::Args, Debug)]
pub struct DuplicateArgs {
    /// Id of the product to duplicate.
    pub id: String,
    /// Name of the new product (defaults to the source name plus the configured suffix).
    #[clap(long)]
    pub name: Option<String>,
    /// Status of the new product: draft or published.
    #[clap(long)]
    pub status: Option<ProductStatus>,
    /// Do not copy variants (and therefore no prices).
    #[clap(long)]
    pub no_variants: bool,
    /// Do not copy variant prices.
    #[clap(long)]
    pub no_prices: bool,
    /// Do not copy media references.
    #[clap(long)]
    pub no_media: bool,
    /// Copy URLs under slugs derived from the new name.
    #[clap(long, conflicts_with = "no_urls")]
    pub urls: bool,
    /// Do not copy URLs.
    #[clap(long)]
    pub no_urls: bool,
    /// Copy no attributes besides the name.
    #[clap(long, conflicts_with_all = ["attribute", "name_only"])]
    pub no_attributes: bool,
    /// Keep attribute copying on with an empty selection (only the name).
    #[clap(long, conflicts_with = "attribute")]
    pub name_only: bool,
    /// Attribute key to copy; repeatable. Defaults to every attribute.
    #[clap(long)]
    pub attribute: Vec<String>,
    /// Print the review summary without duplicating.
    #[clap(long)]
    pub dry_run: bool,
}

impl DuplicateArgs {
    /// Apply command-line overrides on top of the wizard defaults.
    pub fn apply(&self, source: &Product, options: &mut DuplicationOptions) -> Result<(), ShopkeepError> {
        if let Some(name) = &self.name {
            options.new_name = name.clone();
        }
        if let Some(status) = self.status {
            options.new_status = status;
        }
        if self.no_variants {
            options.include_variants = false;
        }
        if self.no_prices {
            options.include_prices = false;
        }
        if self.no_media {
            options.include_media = false;
        }
        if self.urls {
            options.include_urls = true;
        }
        if self.no_urls {
            options.include_urls = false;
        }
        if self.no_attributes {
            options.copy_attributes = false;
        }
        if self.name_only {
            options.copy_attributes = true;
            options.selected_attribute_keys.clear();
        }
        if !self.attribute.is_empty() {
            if let Some(unknown) = self
                .attribute
                .iter()
                .find(|k| !source.attribute_data.contains_key(k.as_str()))
            {
                return Err(ShopkeepError::ValidationError(format!(
                    "product {} has no attribute '{}'",
                    source.id, unknown
                )));
            }
            options.copy_attributes = true;
            options.selected_attribute_keys = self.attribute.iter().cloned().collect();
        }
        Ok(())
    }
}

pub fn run_duplicate_cli(
    store: &Store,
    args: DuplicateArgs,
    format: OutputFormat,
) -> Result<(), ShopkeepError> {
    let source = catalog::show_product(store, &args.id)?.product;
    let mut options = DuplicationOptions::for_source(&source, &store.config.duplicate)?;
    args.apply(&source, &mut options)?;
    let review = options.review();

    if args.dry_run {
        return match format {
            OutputFormat::Json => output::print_envelope("product.duplicate", "dry_run", "review", &review),
            OutputFormat::Text => {
                print_review(&review);
                Ok(())
            }
        };
    }

    match run_duplication(store, &source.id, &options) {
        Ok(Duplicated {
            product,
            notification_error,
        }) => {
            if let Some(err) = &notification_error {
                eprintln!(
                    "{} notification not recorded: {}",
                    "warning:".bright_yellow().bold(),
                    err
                );
            }
            match format {
                OutputFormat::Json => output::print_envelope(
                    "product.duplicate",
                    "ok",
                    "product",
                    &serde_json::json!({ "id": product.id, "redirect": edit_route(&product.id) }),
                ),
                OutputFormat::Text => {
                    print_review(&review);
                    println!("{} {}", "✓".bright_green(), DUPLICATED_TITLE.bright_white());
                    println!("  new product: {}", product.id.bright_cyan());
                    println!("  edit: {}", edit_route(&product.id));
                    Ok(())
                }
            }
        }
        Err(err) => {
            if format == OutputFormat::Text {
                println!("{} {}", "✗".bright_red(), DUPLICATE_FAILED_TITLE.bright_white());
            }
            Err(err)
        }
    }
}

fn print_review(review: &DuplicationReview) {
    println!("{:<22} {}", "New Product Name", review.name);
    println!("{:<22} {}", "Status", review.status);
    println!("{:<22} {}", "Components to Copy", review.components);
    println!("{:<22} {}", "Attributes to Copy", review.attributes);
}
