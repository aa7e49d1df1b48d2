//! Base roles and permissions.
//!
//! `ensure_base_roles_and_permissions` is run by `init` and `seed` on every
//! deploy. It only ever creates missing records and renames legacy permission
//! names, so re-running it converges on the same state.

use crate::core::broker::DbBroker;
use crate::core::config::TableNames;
use crate::core::db;
use crate::core::error::{SeedError, ShopkeepError};
use crate::core::output::{self, OutputFormat};
use crate::core::store::Store;
use crate::core::time;
use clap::{Parser, Subcommand};
use colored::Colorize;
use rusqlite::{Connection, params};
use serde::{Deserialize, Serialize};

pub const BASE_ROLES: &[&str] = &["admin", "staff"];

pub const BASE_PERMISSIONS: &[&str] = &[
    "settings",
    "settings:core",
    "settings:manage-staff",
    "settings:manage-attributes",
    "catalog:manage-products",
    "catalog:manage-collections",
    "sales:manage-orders",
    "sales:manage-customers",
    "sales:manage-discounts",
];

/// One legacy permission name and its replacement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenameRule {
    pub from: &'static str,
    pub to: &'static str,
}

/// Applied on every run, before base permissions are ensured.
pub const PERMISSION_RENAMES: &[RenameRule] = &[
    RenameRule {
        from: "tenancy:catalogue:manage-products",
        to: "tenancy:catalog:manage-products",
    },
    RenameRule {
        from: "tenancy:catalogue:manage-collections",
        to: "tenancy:catalog:manage-collections",
    },
    RenameRule {
        from: "tenancy:catalogue:manage-orders",
        to: "tenancy:sales:manage-orders",
    },
    RenameRule {
        from: "tenancy:catalogue:manage-customers",
        to: "tenancy:sales:manage-customers",
    },
    RenameRule {
        from: "tenancy:catalogue:manage-discounts",
        to: "tenancy:sales:manage-discounts",
    },
];

/// A role or permission row; both tables share this shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessRecord {
    pub id: String,
    pub name: String,
    pub guard_name: String,
    pub created_at: String,
    pub updated_at: String,
}

pub type RoleRecord = AccessRecord;
pub type PermissionRecord = AccessRecord;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenamedPermission {
    pub from: String,
    pub to: String,
    pub rows: usize,
}

/// What a seeding run changed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeedReport {
    pub guard: String,
    pub roles_created: Vec<String>,
    pub permissions_renamed: Vec<RenamedPermission>,
    pub permissions_created: Vec<String>,
    /// The roles table did not exist.
    pub roles_skipped: bool,
    /// The permissions table did not exist.
    pub permissions_skipped: bool,
}

impl SeedReport {
    pub fn is_noop(&self) -> bool {
        self.roles_created.is_empty()
            && self.permissions_renamed.is_empty()
            && self.permissions_created.is_empty()
    }
}

fn checked_table(name: &str) -> Result<&str, SeedError> {
    db::checked_identifier(name).map_err(|_| SeedError::InvalidTable(name.to_string()))
}

fn probe(conn: &Connection, table: &str) -> Result<bool, SeedError> {
    db::table_exists(conn, table).map_err(|source| SeedError::TableProbe {
        table: table.to_string(),
        source,
    })
}

/// Insert `(name, guard)` unless present. Returns whether a row was created.
fn ensure_record(
    conn: &Connection,
    table: &str,
    name: &str,
    guard: &str,
) -> Result<bool, rusqlite::Error> {
    let now = time::now_epoch_z();
    let created = conn.execute(
        &format!(
            "INSERT OR IGNORE INTO {table}(id, name, guard_name, created_at, updated_at)
             SELECT ?1, ?2, ?3, ?4, ?4
             WHERE NOT EXISTS (SELECT 1 FROM {table} WHERE name = ?2 AND guard_name = ?3)"
        ),
        params![time::new_record_id(), name, guard, now],
    )?;
    Ok(created > 0)
}

/// Rename `rule.from` to `rule.to` in every guard, except where the new name
/// already exists for that guard.
fn apply_rename(conn: &Connection, table: &str, rule: &RenameRule) -> Result<usize, rusqlite::Error> {
    conn.execute(
        &format!(
            "UPDATE {table} SET name = ?2, updated_at = ?3
             WHERE name = ?1
               AND NOT EXISTS (
                   SELECT 1 FROM {table} AS existing
                   WHERE existing.name = ?2 AND existing.guard_name = {table}.guard_name
               )"
        ),
        params![rule.from, rule.to, time::now_epoch_z()],
    )
}

/// Ensure base roles and permissions exist for `guard`.
///
/// Each write commits on its own; a failure leaves earlier writes in place
/// and returns the first error.
pub fn ensure_base_roles_and_permissions(
    conn: &Connection,
    guard: &str,
    tables: &TableNames,
) -> Result<SeedReport, SeedError> {
    let roles_table = checked_table(&tables.roles)?;
    let permissions_table = checked_table(&tables.permissions)?;
    let mut report = SeedReport {
        guard: guard.to_string(),
        ..SeedReport::default()
    };

    if probe(conn, roles_table)? {
        for role in BASE_ROLES {
            let created =
                ensure_record(conn, roles_table, role, guard).map_err(|source| SeedError::Role {
                    name: role.to_string(),
                    source,
                })?;
            if created {
                report.roles_created.push(role.to_string());
            }
        }
    } else {
        report.roles_skipped = true;
    }

    if probe(conn, permissions_table)? {
        for rule in PERMISSION_RENAMES {
            let rows = apply_rename(conn, permissions_table, rule).map_err(|source| {
                SeedError::Rename {
                    from: rule.from.to_string(),
                    to: rule.to.to_string(),
                    source,
                }
            })?;
            if rows > 0 {
                report.permissions_renamed.push(RenamedPermission {
                    from: rule.from.to_string(),
                    to: rule.to.to_string(),
                    rows,
                });
            }
        }

        for permission in BASE_PERMISSIONS {
            let created = ensure_record(conn, permissions_table, permission, guard).map_err(
                |source| SeedError::Permission {
                    name: permission.to_string(),
                    source,
                },
            )?;
            if created {
                report.permissions_created.push(permission.to_string());
            }
        }
    } else {
        report.permissions_skipped = true;
    }

    Ok(report)
}

/// Read back every record of `table`, optionally limited to one guard.
pub fn list_records(
    conn: &Connection,
    table: &str,
    guard: Option<&str>,
) -> Result<Vec<AccessRecord>, ShopkeepError> {
    let table = db::checked_identifier(table)?;
    if !db::table_exists(conn, table)? {
        return Ok(Vec::new());
    }
    let mut stmt = conn.prepare(&format!(
        "SELECT id, name, guard_name, created_at, updated_at FROM {table}
         WHERE ?1 IS NULL OR guard_name = ?1
         ORDER BY guard_name, name"
    ))?;
    let rows = stmt.query_map(params![guard], |row| {
        Ok(AccessRecord {
            id: row.get(0)?,
            name: row.get(1)?,
            guard_name: row.get(2)?,
            created_at: row.get(3)?,
            updated_at: row.get(4)?,
        })
    })?;
    let mut out = Vec::new();
    for r in rows {
        out.push(r?);
    }
    Ok(out)
}

// --- Store-level operations ---

/// Seed the store's database. `guard` defaults to `panel.auth_guard`.
pub fn seed(store: &Store, guard: Option<&str>) -> Result<SeedReport, ShopkeepError> {
    let guard = guard.unwrap_or(&store.config.panel.auth_guard).to_string();
    let tables = store.config.permission.table_names.clone();
    let broker = DbBroker::new(&store.root);
    broker.with_conn(&store.db_path(), "shopkeep", None, "access.seed", |conn| {
        Ok(ensure_base_roles_and_permissions(conn, &guard, &tables)?)
    })
}

pub fn list_roles(store: &Store, guard: Option<&str>) -> Result<Vec<RoleRecord>, ShopkeepError> {
    let table = store.config.permission.table_names.roles.clone();
    let broker = DbBroker::new(&store.root);
    broker.with_conn(&store.db_path(), "shopkeep", None, "access.roles", |conn| {
        list_records(conn, &table, guard)
    })
}

pub fn list_permissions(
    store: &Store,
    guard: Option<&str>,
) -> Result<Vec<PermissionRecord>, ShopkeepError> {
    let table = store.config.permission.table_names.permissions.clone();
    let broker = DbBroker::new(&store.root);
    broker.with_conn(&store.db_path(), "shopkeep", None, "access.permissions", |conn| {
        list_records(conn, &table, guard)
    })
}

#[derive(Parser, Debug)]
#[clap(name = "access", about = "Inspect roles and permissions")]
pub struct AccessCli {
    #[clap(subcommand)]
    pub command: AccessCommand,
    /// Output format.
    #[clap(long, value_enum, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Subcommand, Debug)]
pub enum AccessCommand {
    /// List roles.
    Roles {
        /// Only records of this guard.
        #[clap(long)]
        guard: Option<String>,
    },
    /// List permissions.
    Permissions {
        /// Only records of this guard.
        #[clap(long)]
        guard: Option<String>,
    },
}

pub fn run_access_cli(store: &Store, cli: AccessCli) -> Result<(), ShopkeepError> {
    let (kind, records) = match cli.command {
        AccessCommand::Roles { guard } => ("roles", list_roles(store, guard.as_deref())?),
        AccessCommand::Permissions { guard } => {
            ("permissions", list_permissions(store, guard.as_deref())?)
        }
    };
    match cli.format {
        OutputFormat::Json => output::print_envelope(&format!("access.{}", kind), "ok", kind, &records)?,
        OutputFormat::Text => {
            if records.is_empty() {
                println!("No {} found.", kind);
            }
            for r in &records {
                println!("{:<40} {}", r.name, r.guard_name.dimmed());
            }
        }
    }
    Ok(())
}

pub fn print_seed_report(report: &SeedReport, format: OutputFormat) -> Result<(), ShopkeepError> {
    if format == OutputFormat::Json {
        return output::print_envelope("seed", "ok", "report", report);
    }
    println!("Seeding access records for guard '{}'", report.guard.bright_cyan());
    if report.roles_skipped {
        println!("  {} roles table missing, skipped", "-".yellow());
    }
    if report.permissions_skipped {
        println!("  {} permissions table missing, skipped", "-".yellow());
    }
    for role in &report.roles_created {
        println!("  {} role {}", "+".bright_green(), role);
    }
    for renamed in &report.permissions_renamed {
        println!(
            "  {} permission {} -> {} ({} row(s))",
            "~".bright_yellow(),
            renamed.from,
            renamed.to,
            renamed.rows
        );
    }
    for permission in &report.permissions_created {
        println!("  {} permission {}", "+".bright_green(), permission);
    }
    if report.is_noop() {
        println!("  {} already up to date", "✓".bright_green());
    }
    Ok(())
}
