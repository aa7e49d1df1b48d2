//! Append-only notification ledger.
//!
//! Operations that end in a user-facing outcome (a duplication, for now)
//! record a notification here; the CLI renders them with `notify list`.

use crate::core::error::ShopkeepError;
use crate::core::output::{self, OutputFormat};
use crate::core::schemas;
use crate::core::store::Store;
use crate::core::time;
use clap::{Parser, Subcommand};
use colored::Colorize;
use serde::{Deserialize, Serialize};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationLevel {
    Success,
    Danger,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub id: String,
    pub ts: String,
    pub level: NotificationLevel,
    pub title: String,
    pub body: Option<String>,
    /// Record the notification is about.
    pub subject_id: Option<String>,
    /// Route the caller should navigate to next.
    pub redirect: Option<String>,
}

impl Notification {
    fn new(level: NotificationLevel, title: &str) -> Self {
        Self {
            id: time::new_event_id(),
            ts: time::now_epoch_z(),
            level,
            title: title.to_string(),
            body: None,
            subject_id: None,
            redirect: None,
        }
    }

    pub fn success(title: &str) -> Self {
        Self::new(NotificationLevel::Success, title)
    }

    pub fn danger(title: &str) -> Self {
        Self::new(NotificationLevel::Danger, title)
    }

    pub fn body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    pub fn subject(mut self, id: impl Into<String>) -> Self {
        self.subject_id = Some(id.into());
        self
    }

    pub fn redirect(mut self, route: impl Into<String>) -> Self {
        self.redirect = Some(route.into());
        self
    }
}

pub fn notifications_path(root: &Path) -> PathBuf {
    root.join(schemas::NOTIFICATIONS_NAME)
}

pub fn record(root: &Path, notification: &Notification) -> Result<(), ShopkeepError> {
    let mut f = OpenOptions::new()
        .create(true)
        .append(true)
        .open(notifications_path(root))?;
    writeln!(f, "{}", serde_json::to_string(notification)?)?;
    Ok(())
}

/// Most recent first, at most `limit`.
pub fn recent(root: &Path, limit: usize) -> Result<Vec<Notification>, ShopkeepError> {
    let path = notifications_path(root);
    if !path.exists() {
        return Ok(Vec::new());
    }
    let content = fs::read_to_string(&path)?;
    let mut out = Vec::new();
    for line in content.lines().rev().filter(|l| !l.trim().is_empty()) {
        if out.len() == limit {
            break;
        }
        out.push(serde_json::from_str(line)?);
    }
    Ok(out)
}

#[derive(Parser, Debug)]
#[clap(name = "notify", about = "Read recorded notifications")]
pub struct NotifyCli {
    #[clap(subcommand)]
    pub command: NotifyCommand,
    /// Output format.
    #[clap(long, value_enum, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Subcommand, Debug)]
pub enum NotifyCommand {
    /// Show the most recent notifications.
    List {
        #[clap(long, default_value = "20")]
        limit: usize,
    },
}

pub fn run_notify_cli(store: &Store, cli: NotifyCli) -> Result<(), ShopkeepError> {
    match cli.command {
        NotifyCommand::List { limit } => {
            let items = recent(&store.root, limit)?;
            match cli.format {
                OutputFormat::Json => output::print_envelope("notify.list", "ok", "notifications", &items)?,
                OutputFormat::Text => {
                    if items.is_empty() {
                        println!("No notifications.");
                    }
                    for n in &items {
                        let badge = match n.level {
                            NotificationLevel::Success => "success".bright_green(),
                            NotificationLevel::Danger => "danger".bright_red(),
                        };
                        println!("{} [{}] {}", n.ts, badge, n.title);
                        if let Some(body) = &n.body {
                            println!("    {}", output::compact_line(body, 100));
                        }
                        if let Some(route) = &n.redirect {
                            println!("    -> {}", route);
                        }
                    }
                }
            }
        }
    }
    Ok(())
}
