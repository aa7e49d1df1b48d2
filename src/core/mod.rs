//! Shared primitives: the on-disk store, configuration, database access
//! through the broker, schemas, errors and output helpers.

pub mod broker;
pub mod config;
pub mod db;
pub mod error;
pub mod output;
pub mod schemas;
pub mod store;
pub mod time;
