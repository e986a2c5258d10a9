//! # Reload Core
//!
//! Core library for Reload - an inventory ledger for ammunition reloading.
//!
//! Tracks component stock, ammunition batches produced from it (or bought),
//! shooting sessions that fire those batches, and firearm round counts. The
//! four live in separate tables written by separate calls; this crate keeps
//! them consistent without a multi-table transaction.
//!
//! ## Architecture
//!
//! - **units**: grain/pound/gram conversion and unit costs
//! - **storage**: the `InventoryStore` trait and its SQLite implementation
//! - **ledger**: per-owner entry point and policy
//! - **production**: batch production and costing
//! - **reversal**: batch deletion and editing
//! - **firing**: shooting sessions and their reversal
//! - **quota**: tier ceilings
//! - **maintenance**: maintenance due status
//! - **audit**: dangling reference and low stock scan

pub mod audit;
pub mod error;
pub mod firing;
pub mod fs;
pub mod ledger;
pub mod maintenance;
pub mod outcome;
pub mod production;
pub mod quota;
pub mod reversal;
pub mod storage;
pub mod units;

pub use error::{ReloadError, Result};
pub use firing::{NewSessionRequest, SessionRecord};
pub use ledger::{Ledger, Policy, ShortagePolicy};
pub use outcome::{ActionOutcome, Step, Warning};
pub use production::NewBatchRequest;
pub use reversal::BatchEdit;
pub use storage::{InventoryStore, SqliteStore};

/// Core version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
