//! Subsystems built on the core store.
//!
//! - `access`: base roles/permissions seeding
//! - `catalog`: product graph model and persistence
//! - `duplicate`: transactional product duplication
//! - `slug`: URL slug derivation and uniqueness
//! - `notify`: notification ledger

pub mod access;
pub mod catalog;
pub mod duplicate;
pub mod notify;
pub mod slug;
