use rusqlite;
use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ShopkeepError {
    #[error("SQLite error: {0}")]
    RusqliteError(#[from] rusqlite::Error),
    #[error("I/O error: {0}")]
    IoError(#[from] io::Error),
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
    #[error("Config error: {0}")]
    ConfigError(String),
    #[error("Path error: {0}")]
    PathError(String),
    #[error("Validation error: {0}")]
    ValidationError(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error(transparent)]
    Seed(#[from] SeedError),
    #[error(transparent)]
    Clone(#[from] CloneError),
}

/// Failure while ensuring base roles/permissions. A missing table is a skip, never one of these.
#[derive(Error, Debug)]
pub enum SeedError {
    #[error("invalid table name '{0}'")]
    InvalidTable(String),
    #[error("failed to probe table '{table}': {source}")]
    TableProbe {
        table: String,
        #[source]
        source: rusqlite::Error,
    },
    #[error("failed to ensure role '{name}': {source}")]
    Role {
        name: String,
        #[source]
        source: rusqlite::Error,
    },
    #[error("failed to rename permission '{from}' to '{to}': {source}")]
    Rename {
        from: String,
        to: String,
        #[source]
        source: rusqlite::Error,
    },
    #[error("failed to ensure permission '{name}': {source}")]
    Permission {
        name: String,
        #[source]
        source: rusqlite::Error,
    },
}

/// Failure of a product duplication. The whole clone graph has been rolled back.
#[derive(Error, Debug)]
pub enum CloneError {
    #[error("invalid duplication options: {0}")]
    InvalidOptions(String),
    #[error("product {product_id} has no 'name' attribute")]
    MissingName { product_id: String },
    #[error("source product not found: {0}")]
    SourceNotFound(String),
    #[error("persistence failure: {0}")]
    Persistence(#[from] rusqlite::Error),
    #[error("attribute encoding failure: {0}")]
    AttributeEncoding(#[from] serde_json::Error),
}
