//! `shopkeep.toml` configuration.
//!
//! A missing file means defaults; a malformed file is an error.

use crate::core::error::ShopkeepError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

pub const CONFIG_FILE: &str = "shopkeep.toml";

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct ShopkeepConfig {
    #[serde(default)]
    pub panel: PanelConfig,
    #[serde(default)]
    pub permission: PermissionConfig,
    #[serde(default)]
    pub duplicate: DuplicateDefaults,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct PanelConfig {
    /// Guard scope used when seeding roles and permissions.
    #[serde(default = "default_guard")]
    pub auth_guard: String,
}

impl Default for PanelConfig {
    fn default() -> Self {
        Self {
            auth_guard: default_guard(),
        }
    }
}

fn default_guard() -> String {
    "staff".to_string()
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct PermissionConfig {
    #[serde(default)]
    pub table_names: TableNames,
}

/// Table names of the RBAC store; seeding skips a section whose table is absent.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct TableNames {
    #[serde(default = "default_roles_table")]
    pub roles: String,
    #[serde(default = "default_permissions_table")]
    pub permissions: String,
}

impl Default for TableNames {
    fn default() -> Self {
        Self {
            roles: default_roles_table(),
            permissions: default_permissions_table(),
        }
    }
}

fn default_roles_table() -> String {
    "roles".to_string()
}

fn default_permissions_table() -> String {
    "permissions".to_string()
}

/// Initial values of the duplication wizard.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct DuplicateDefaults {
    #[serde(default = "default_status")]
    pub default_status: String,
    #[serde(default = "default_name_suffix")]
    pub name_suffix: String,
    #[serde(default = "yes")]
    pub include_variants: bool,
    #[serde(default = "yes")]
    pub include_media: bool,
    #[serde(default = "yes")]
    pub include_prices: bool,
    #[serde(default)]
    pub include_urls: bool,
    #[serde(default = "yes")]
    pub copy_attributes: bool,
}

impl Default for DuplicateDefaults {
    fn default() -> Self {
        Self {
            default_status: default_status(),
            name_suffix: default_name_suffix(),
            include_variants: true,
            include_media: true,
            include_prices: true,
            include_urls: false,
            copy_attributes: true,
        }
    }
}

fn default_status() -> String {
    "draft".to_string()
}

fn default_name_suffix() -> String {
    " (Copy)".to_string()
}

fn yes() -> bool {
    true
}

impl ShopkeepConfig {
    /// Load `<store_dir>/shopkeep.toml`, falling back to defaults when absent.
    pub fn load(store_dir: &Path) -> Result<Self, ShopkeepError> {
        let path = store_dir.join(CONFIG_FILE);
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(&path)?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self, ShopkeepError> {
        toml::from_str(content)
            .map_err(|e| ShopkeepError::ConfigError(format!("{}: {}", CONFIG_FILE, e)))
    }

    /// Write the config unless a file already exists. Returns whether it wrote.
    pub fn write_default(store_dir: &Path) -> Result<bool, ShopkeepError> {
        let path = store_dir.join(CONFIG_FILE);
        if path.exists() {
            return Ok(false);
        }
        let body = toml::to_string_pretty(&Self::default())
            .map_err(|e| ShopkeepError::ConfigError(e.to_string()))?;
        fs::create_dir_all(store_dir)?;
        fs::write(&path, body)?;
        Ok(true)
    }
}
