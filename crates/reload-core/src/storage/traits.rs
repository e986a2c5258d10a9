//! Inventory store trait definition.
//!
//! The `InventoryStore` trait is the per-table contract the ledger engines
//! run against. Each method is one independent call: there is no way to
//! group calls into a transaction. The only atomic read-modify-write
//! primitives are the stock and counter adjustment procedures at the end.

use uuid::Uuid;

use super::types::{
    Adjustment, AmmunitionBatch, BatchFilter, BatchUpdate, Component, ComponentFilter,
    ComponentPatch, Counter, Firearm, MaintenanceTask, NewBatch, NewComponent, NewFirearm,
    NewMaintenanceTask, NewSession, NewShot, SessionFilter, ShootingSession, ShotRecord,
};
use crate::error::Result;
use crate::quota::LimitKind;

/// Storage interface for the reloading inventory.
///
/// All implementations must ensure:
/// - Reads and writes are scoped to the given owner; rows of another owner
///   behave as missing
/// - Deleting a session deletes its shot records
/// - Deleting a component leaves batch references to it in place
/// - Adjustment procedures are atomic per call
pub trait InventoryStore: Send + Sync {
    // --- Components ---

    /// Insert a component lot.
    ///
    /// # Errors
    ///
    /// Returns `ReloadError::QuotaExceeded` if `ceiling` is set and the owner
    /// already holds that many components.
    fn insert_component(&self, component: &NewComponent, ceiling: Option<u32>)
        -> Result<Component>;

    /// Get a component by ID. Returns `Ok(None)` if missing.
    fn get_component(&self, owner: &str, id: &Uuid) -> Result<Option<Component>>;

    fn list_components(&self, owner: &str, filter: &ComponentFilter) -> Result<Vec<Component>>;

    /// Update descriptive fields of a component.
    ///
    /// # Errors
    ///
    /// Returns `ReloadError::NotFound` if the component does not exist.
    fn update_component(&self, owner: &str, id: &Uuid, patch: &ComponentPatch)
        -> Result<Component>;

    /// Delete a component. Returns `false` if nothing was deleted.
    fn delete_component(&self, owner: &str, id: &Uuid) -> Result<bool>;

    // --- Firearms ---

    fn insert_firearm(&self, firearm: &NewFirearm, ceiling: Option<u32>) -> Result<Firearm>;

    fn get_firearm(&self, owner: &str, id: &Uuid) -> Result<Option<Firearm>>;

    fn list_firearms(&self, owner: &str) -> Result<Vec<Firearm>>;

    /// Delete a firearm and its maintenance tasks.
    fn delete_firearm(&self, owner: &str, id: &Uuid) -> Result<bool>;

    // --- Batches ---

    /// Insert a batch with `quantity_remaining = quantity`.
    fn insert_batch(&self, batch: &NewBatch, ceiling: Option<u32>) -> Result<AmmunitionBatch>;

    fn get_batch(&self, owner: &str, id: &Uuid) -> Result<Option<AmmunitionBatch>>;

    fn list_batches(&self, owner: &str, filter: &BatchFilter) -> Result<Vec<AmmunitionBatch>>;

    /// Apply a row update to a batch.
    ///
    /// A quantity change moves `quantity_remaining` by the same delta in the
    /// same statement, so rounds reserved concurrently are never written back.
    ///
    /// # Errors
    ///
    /// Returns `ReloadError::NotFound` if the batch does not exist.
    fn update_batch(&self, owner: &str, id: &Uuid, update: &BatchUpdate)
        -> Result<AmmunitionBatch>;

    fn delete_batch(&self, owner: &str, id: &Uuid) -> Result<bool>;

    // --- Sessions ---

    fn insert_session(
        &self,
        session: &NewSession,
        ceiling: Option<u32>,
    ) -> Result<ShootingSession>;

    fn get_session(&self, owner: &str, id: &Uuid) -> Result<Option<ShootingSession>>;

    /// List sessions, newest first.
    fn list_sessions(&self, owner: &str, filter: &SessionFilter) -> Result<Vec<ShootingSession>>;

    /// Delete a session and its shot records.
    fn delete_session(&self, owner: &str, id: &Uuid) -> Result<bool>;

    // --- Shot records ---

    fn insert_shot(&self, owner: &str, session_id: &Uuid, shot: &NewShot) -> Result<ShotRecord>;

    /// Shots of a session ordered by shot number.
    fn list_shots(&self, owner: &str, session_id: &Uuid) -> Result<Vec<ShotRecord>>;

    // --- Maintenance ---

    fn insert_maintenance_task(
        &self,
        owner: &str,
        task: &NewMaintenanceTask,
    ) -> Result<MaintenanceTask>;

    fn list_maintenance_tasks(&self, owner: &str, firearm_id: &Uuid)
        -> Result<Vec<MaintenanceTask>>;

    /// Record that a task was performed at the firearm's current round count.
    fn mark_maintenance_performed(&self, owner: &str, task_id: &Uuid) -> Result<MaintenanceTask>;

    // --- Counting ---

    /// Rows of the given kind held by the owner.
    fn count(&self, owner: &str, kind: LimitKind) -> Result<u32>;

    // --- Atomic procedures ---

    /// Subtract from a component's quantity, clamping at zero.
    ///
    /// # Errors
    ///
    /// Returns `ReloadError::NotFound` if the component does not exist.
    fn decrement_stock_with_floor(
        &self,
        owner: &str,
        component_id: &Uuid,
        amount: f64,
    ) -> Result<Adjustment<f64>>;

    /// Add to a component's quantity.
    fn increment_stock(
        &self,
        owner: &str,
        component_id: &Uuid,
        amount: f64,
    ) -> Result<Adjustment<f64>>;

    /// Subtract from a counter, clamping at zero.
    fn decrement_counter_with_floor(
        &self,
        owner: &str,
        counter: Counter,
        amount: u64,
    ) -> Result<Adjustment<u64>>;

    /// Add to a counter. Batch remaining counts stop at the batch quantity.
    fn increment_counter(&self, owner: &str, counter: Counter, amount: u64)
        -> Result<Adjustment<u64>>;

    /// Subtract from a counter only if it holds at least `amount`.
    ///
    /// Returns `Ok(None)` without writing when the counter is short.
    fn decrement_counter_if_available(
        &self,
        owner: &str,
        counter: Counter,
        amount: u64,
    ) -> Result<Option<Adjustment<u64>>>;
}
