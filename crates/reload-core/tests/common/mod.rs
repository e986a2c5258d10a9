#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::Mutex;

use reload_core::quota::LimitKind;
use reload_core::storage::{
    Adjustment, AmmunitionBatch, BatchFilter, BatchUpdate, Component, ComponentFilter,
    ComponentKind, ComponentPatch, Counter, Firearm, MaintenanceTask, NewBatch, NewComponent,
    NewFirearm, NewMaintenanceTask, NewSession, NewShot, SessionFilter, ShootingSession,
    ShotRecord,
};
use reload_core::units::WeightUnit;
use reload_core::{InventoryStore, Ledger, Policy, ReloadError, Result, SqliteStore};
use uuid::Uuid;

pub const OWNER: &str = "range-day";

/// Store calls that can be made to fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Fault {
    InsertBatch,
    InsertSession,
    InsertShot,
    DeleteBatch,
    IncrementStock,
    DecrementStock,
    IncrementCounter,
    DecrementCounter,
}

/// SQLite store that fails selected calls on demand.
pub struct FaultyStore {
    inner: SqliteStore,
    faults: Mutex<HashSet<Fault>>,
}

impl FaultyStore {
    pub fn new() -> Self {
        Self {
            inner: SqliteStore::open_in_memory().unwrap(),
            faults: Mutex::new(HashSet::new()),
        }
    }

    pub fn fail(&self, fault: Fault) {
        self.faults.lock().unwrap().insert(fault);
    }

    pub fn heal(&self) {
        self.faults.lock().unwrap().clear();
    }

    fn check(&self, fault: Fault) -> Result<()> {
        if self.faults.lock().unwrap().contains(&fault) {
            return Err(ReloadError::Storage(format!("injected failure: {:?}", fault)));
        }
        Ok(())
    }
}

impl InventoryStore for FaultyStore {
    fn insert_component(&self, component: &NewComponent, ceiling: Option<u32>) -> Result<Component> {
        self.inner.insert_component(component, ceiling)
    }

    fn get_component(&self, owner: &str, id: &Uuid) -> Result<Option<Component>> {
        self.inner.get_component(owner, id)
    }

    fn list_components(&self, owner: &str, filter: &ComponentFilter) -> Result<Vec<Component>> {
        self.inner.list_components(owner, filter)
    }

    fn update_component(&self, owner: &str, id: &Uuid, patch: &ComponentPatch) -> Result<Component> {
        self.inner.update_component(owner, id, patch)
    }

    fn delete_component(&self, owner: &str, id: &Uuid) -> Result<bool> {
        self.inner.delete_component(owner, id)
    }

    fn insert_firearm(&self, firearm: &NewFirearm, ceiling: Option<u32>) -> Result<Firearm> {
        self.inner.insert_firearm(firearm, ceiling)
    }

    fn get_firearm(&self, owner: &str, id: &Uuid) -> Result<Option<Firearm>> {
        self.inner.get_firearm(owner, id)
    }

    fn list_firearms(&self, owner: &str) -> Result<Vec<Firearm>> {
        self.inner.list_firearms(owner)
    }

    fn delete_firearm(&self, owner: &str, id: &Uuid) -> Result<bool> {
        self.inner.delete_firearm(owner, id)
    }

    fn insert_batch(&self, batch: &NewBatch, ceiling: Option<u32>) -> Result<AmmunitionBatch> {
        self.check(Fault::InsertBatch)?;
        self.inner.insert_batch(batch, ceiling)
    }

    fn get_batch(&self, owner: &str, id: &Uuid) -> Result<Option<AmmunitionBatch>> {
        self.inner.get_batch(owner, id)
    }

    fn list_batches(&self, owner: &str, filter: &BatchFilter) -> Result<Vec<AmmunitionBatch>> {
        self.inner.list_batches(owner, filter)
    }

    fn update_batch(&self, owner: &str, id: &Uuid, update: &BatchUpdate) -> Result<AmmunitionBatch> {
        self.inner.update_batch(owner, id, update)
    }

    fn delete_batch(&self, owner: &str, id: &Uuid) -> Result<bool> {
        self.check(Fault::DeleteBatch)?;
        self.inner.delete_batch(owner, id)
    }

    fn insert_session(&self, session: &NewSession, ceiling: Option<u32>) -> Result<ShootingSession> {
        self.check(Fault::InsertSession)?;
        self.inner.insert_session(session, ceiling)
    }

    fn get_session(&self, owner: &str, id: &Uuid) -> Result<Option<ShootingSession>> {
        self.inner.get_session(owner, id)
    }

    fn list_sessions(&self, owner: &str, filter: &SessionFilter) -> Result<Vec<ShootingSession>> {
        self.inner.list_sessions(owner, filter)
    }

    fn delete_session(&self, owner: &str, id: &Uuid) -> Result<bool> {
        self.inner.delete_session(owner, id)
    }

    fn insert_shot(&self, owner: &str, session_id: &Uuid, shot: &NewShot) -> Result<ShotRecord> {
        self.check(Fault::InsertShot)?;
        self.inner.insert_shot(owner, session_id, shot)
    }

    fn list_shots(&self, owner: &str, session_id: &Uuid) -> Result<Vec<ShotRecord>> {
        self.inner.list_shots(owner, session_id)
    }

    fn insert_maintenance_task(&self, owner: &str, task: &NewMaintenanceTask) -> Result<MaintenanceTask> {
        self.inner.insert_maintenance_task(owner, task)
    }

    fn list_maintenance_tasks(&self, owner: &str, firearm_id: &Uuid) -> Result<Vec<MaintenanceTask>> {
        self.inner.list_maintenance_tasks(owner, firearm_id)
    }

    fn mark_maintenance_performed(&self, owner: &str, task_id: &Uuid) -> Result<MaintenanceTask> {
        self.inner.mark_maintenance_performed(owner, task_id)
    }

    fn count(&self, owner: &str, kind: LimitKind) -> Result<u32> {
        self.inner.count(owner, kind)
    }

    fn decrement_stock_with_floor(&self, owner: &str, component_id: &Uuid, amount: f64) -> Result<Adjustment<f64>> {
        self.check(Fault::DecrementStock)?;
        self.inner.decrement_stock_with_floor(owner, component_id, amount)
    }

    fn increment_stock(&self, owner: &str, component_id: &Uuid, amount: f64) -> Result<Adjustment<f64>> {
        self.check(Fault::IncrementStock)?;
        self.inner.increment_stock(owner, component_id, amount)
    }

    fn decrement_counter_with_floor(&self, owner: &str, counter: Counter, amount: u64) -> Result<Adjustment<u64>> {
        self.check(Fault::DecrementCounter)?;
        self.inner.decrement_counter_with_floor(owner, counter, amount)
    }

    fn increment_counter(&self, owner: &str, counter: Counter, amount: u64) -> Result<Adjustment<u64>> {
        self.check(Fault::IncrementCounter)?;
        self.inner.increment_counter(owner, counter, amount)
    }

    fn decrement_counter_if_available(
        &self,
        owner: &str,
        counter: Counter,
        amount: u64,
    ) -> Result<Option<Adjustment<u64>>> {
        self.check(Fault::DecrementCounter)?;
        self.inner.decrement_counter_if_available(owner, counter, amount)
    }
}

pub fn sqlite_ledger(policy: Policy) -> Ledger<SqliteStore> {
    Ledger::new(SqliteStore::open_in_memory().unwrap(), OWNER, policy)
}

pub fn faulty_ledger() -> Ledger<FaultyStore> {
    Ledger::new(FaultyStore::new(), OWNER, Policy::default())
}

/// Primer, 1 lb powder at $20, bullet and brass lots.
pub struct Bench {
    pub primer: Component,
    pub powder: Component,
    pub bullet: Component,
    pub brass: Component,
}

pub fn stock_bench<S: InventoryStore>(ledger: &Ledger<S>) -> Bench {
    let primer = ledger
        .add_component(
            NewComponent::new(OWNER, ComponentKind::Primer, "CCI", "BR-2", 500.0)
                .with_purchase_price(50.0),
        )
        .unwrap();
    let powder = ledger
        .add_component(
            NewComponent::new(OWNER, ComponentKind::Powder, "Hodgdon", "Varget", 1.0)
                .with_weight_unit(WeightUnit::Lb)
                .with_purchase_price(20.0),
        )
        .unwrap();
    let bullet = ledger
        .add_component(
            NewComponent::new(OWNER, ComponentKind::Bullet, "Sierra", "MatchKing 168", 200.0)
                .with_purchase_price(80.0),
        )
        .unwrap();
    let brass = ledger
        .add_component(
            NewComponent::new(OWNER, ComponentKind::Brass, "Lapua", ".308 Win", 100.0)
                .with_caliber(".308 Win"),
        )
        .unwrap();
    Bench {
        primer,
        powder,
        bullet,
        brass,
    }
}

pub fn quantity<S: InventoryStore>(ledger: &Ledger<S>, id: &Uuid) -> f64 {
    ledger.store().get_component(OWNER, id).unwrap().unwrap().quantity
}

pub fn remaining<S: InventoryStore>(ledger: &Ledger<S>, id: &Uuid) -> u32 {
    ledger.store().get_batch(OWNER, id).unwrap().unwrap().quantity_remaining
}

pub fn round_count<S: InventoryStore>(ledger: &Ledger<S>, id: &Uuid) -> u64 {
    ledger.store().get_firearm(OWNER, id).unwrap().unwrap().round_count
}

pub fn assert_close(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < 1e-9,
        "expected {expected}, got {actual}"
    );
}
