//! Storage layer for the reloading inventory.
//!
//! This module provides the `InventoryStore` trait, the row types it moves,
//! and the SQLite implementation.

pub mod sqlite;
pub mod traits;
pub mod types;

pub use sqlite::{SqliteStore, StoreMetadata};
pub use traits::InventoryStore;
pub use types::{
    Adjustment, AmmunitionBatch, AmmunitionType, BatchFilter, BatchUpdate, Component,
    ComponentFilter, ComponentKind, ComponentPatch, ComponentRefs, Conditions, Counter, Firearm,
    MaintenanceTask, NewBatch, NewComponent, NewFirearm, NewMaintenanceTask, NewSession, NewShot,
    OwnerId, PressureSigns, SessionFilter, ShootingSession, ShotRecord,
};
