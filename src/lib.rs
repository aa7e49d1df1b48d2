//! shopkeep: catalog duplication and access seeding for a storefront admin.
//!
//! Two operations carry the weight of this crate:
//!
//! - **Access seeding** ([`plugins::access`]): idempotently ensures the base
//!   roles and permissions exist for a guard, renaming legacy permission
//!   identifiers in place first.
//! - **Product duplication** ([`plugins::duplicate`]): copies a product and
//!   a chosen subset of its graph (variants, prices, media, URLs, attributes)
//!   in one transaction, deriving collision-free URL slugs from the new name.
//!
//! # Architecture
//!
//! State lives in `<project>/.shopkeep/`: `shopkeep.toml` for configuration
//! and `data/shop.db` (SQLite) for records. All database access goes through
//! [`core::broker::DbBroker`], which serializes access and appends an audit
//! event per operation to `data/broker.events.jsonl`.
//!
//! # Examples
//!
//! ```bash
//! shopkeep init
//! shopkeep product add --json shirt.json
//! shopkeep product duplicate <id> --name "Shirt v2" --urls
//! shopkeep seed --guard staff
//! ```
//!
//! # Crate Structure
//!
//! - [`core`]: store, config, database, broker, errors
//! - [`plugins`]: access seeding, catalog, duplication, slugs, notifications

pub mod core;
pub mod plugins;

use crate::core::broker::DbBroker;
use crate::core::config::ShopkeepConfig;
use crate::core::output::{self, OutputFormat};
use crate::core::store::{self, STORE_DIR, Store};
use crate::core::{db, error};
use plugins::{access, catalog, notify};

use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[clap(
    name = "shopkeep",
    version = env!("CARGO_PKG_VERSION"),
    about = "Catalog duplication and access seeding for a storefront admin"
)]
struct Cli {
    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create the workspace, its schemas and the base access records
    #[clap(name = "init", visible_alias = "i")]
    Init {
        /// Directory to initialize (defaults to current working directory).
        #[clap(short, long)]
        dir: Option<PathBuf>,
        /// Do not create the roles/permissions tables (seeding then skips them).
        #[clap(long)]
        skip_access: bool,
    },

    /// Ensure base roles and permissions exist
    #[clap(name = "seed")]
    Seed {
        /// Guard scope (defaults to `panel.auth_guard`).
        #[clap(long)]
        guard: Option<String>,
        #[clap(long, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Inspect roles and permissions
    #[clap(name = "access", visible_alias = "a")]
    Access(access::AccessCli),

    /// Manage and duplicate products
    #[clap(name = "product", visible_alias = "p")]
    Product(catalog::ProductCli),

    /// Read recorded notifications
    #[clap(name = "notify")]
    Notify(notify::NotifyCli),

    /// Audit log access
    #[clap(name = "broker")]
    Broker(BrokerCli),

    /// Show version information
    #[clap(name = "version")]
    Version,
}

#[derive(clap::Args, Debug)]
struct BrokerCli {
    #[clap(subcommand)]
    command: BrokerCommand,
}

#[derive(Subcommand, Debug)]
enum BrokerCommand {
    /// Show the audit log of brokered operations.
    Audit {
        /// Only the last N events.
        #[clap(long, default_value = "50")]
        limit: usize,
    },
}

/// Create `<project_dir>/.shopkeep`, write the default config if absent,
/// create the schemas and seed base access records.
pub fn initialize(
    project_dir: &Path,
    with_access_tables: bool,
) -> Result<(Store, access::SeedReport), error::ShopkeepError> {
    ShopkeepConfig::write_default(&project_dir.join(STORE_DIR))?;
    let store = Store::open(project_dir)?;
    db::initialize_catalog_db(&store)?;
    if with_access_tables {
        db::initialize_access_db(&store)?;
    }
    let report = access::seed(&store, None)?;
    Ok((store, report))
}

fn open_store(current_dir: &Path) -> Result<Store, error::ShopkeepError> {
    let project_root = store::find_project_root(current_dir)?;
    Store::open(&project_root)
}

pub fn run() -> Result<(), error::ShopkeepError> {
    let cli = Cli::parse();
    let current_dir = std::env::current_dir()?;

    match cli.command {
        Command::Version => {
            println!("v{}", env!("CARGO_PKG_VERSION"));
        }
        Command::Init { dir, skip_access } => {
            let target_dir = dir.unwrap_or_else(|| current_dir.clone());
            std::fs::create_dir_all(&target_dir)?;
            let target_dir = std::fs::canonicalize(&target_dir)?;
            let (store, report) = initialize(&target_dir, !skip_access)?;
            println!(
                "{} shopkeep initialized at {}",
                "✓".bright_green(),
                store.root.display().to_string().bright_white()
            );
            access::print_seed_report(&report, OutputFormat::Text)?;
        }
        Command::Seed { guard, format } => {
            let store = open_store(&current_dir)?;
            let report = access::seed(&store, guard.as_deref())?;
            access::print_seed_report(&report, format)?;
        }
        Command::Access(access_cli) => {
            let store = open_store(&current_dir)?;
            access::run_access_cli(&store, access_cli)?;
        }
        Command::Product(product_cli) => {
            let store = open_store(&current_dir)?;
            catalog::run_product_cli(&store, product_cli)?;
        }
        Command::Notify(notify_cli) => {
            let store = open_store(&current_dir)?;
            notify::run_notify_cli(&store, notify_cli)?;
        }
        Command::Broker(broker_cli) => {
            let store = open_store(&current_dir)?;
            match broker_cli.command {
                BrokerCommand::Audit { limit } => {
                    let events = DbBroker::new(&store.root).read_events()?;
                    let skip = events.len().saturating_sub(limit);
                    for ev in &events[skip..] {
                        let status = if ev.status == "success" {
                            ev.status.bright_green()
                        } else {
                            ev.status.bright_red()
                        };
                        println!(
                            "{} {:<20} {:<10} {} {}",
                            ev.ts,
                            ev.op,
                            ev.actor,
                            status,
                            output::compact_line(ev.intent_ref.as_deref().unwrap_or(""), 40)
                        );
                    }
                }
            }
        }
    }

    Ok(())
}
