//! Raw row types for database queries.
//!
//! Each `*Row` mirrors the column list constant next to it and is read with
//! `from_row`, then parsed into the domain type with `TryFrom`.

use chrono::{DateTime, Utc};
use rusqlite::Row;
use uuid::Uuid;

use crate::error::{ReloadError, Result};
use crate::storage::types::{
    AmmunitionBatch, Component, ComponentRefs, Conditions, Firearm, MaintenanceTask,
    PressureSigns, ShootingSession, ShotRecord,
};

pub const COMPONENT_COLUMNS: &str = "id, owner, kind, manufacturer, model, quantity, weight_unit, \
     cost_per_unit, caliber, low_stock_threshold, created_at";

pub const FIREARM_COLUMNS: &str = "id, owner, name, caliber, round_count, created_at";

pub const BATCH_COLUMNS: &str = "id, owner, batch_number, ammunition_type, quantity, \
     quantity_remaining, primer_id, powder_id, bullet_id, brass_id, charge_weight_grains, \
     powder_weight_unit, caliber, coal, notes, total_cost, cost_per_round, created_at";

pub const SESSION_COLUMNS: &str = "id, owner, firearm_id, ammunition_batch_id, rounds_fired, \
     date, location, temperature_f, humidity_pct, notes, created_at";

pub const SHOT_COLUMNS: &str = "id, session_id, shot_number, velocity_fps, flattened_primer, \
     cratered_primer, ejector_mark, sticky_bolt";

pub const MAINTENANCE_COLUMNS: &str = "id, firearm_id, name, interval_rounds, interval_days, \
     last_round_count, last_performed";

pub(crate) fn parse_uuid(value: &str, what: &str) -> Result<Uuid> {
    Uuid::parse_str(value)
        .map_err(|e| ReloadError::Storage(format!("Invalid {} UUID: {}", what, e)))
}

fn parse_optional_uuid(value: Option<String>, what: &str) -> Result<Option<Uuid>> {
    value.as_deref().map(|v| parse_uuid(v, what)).transpose()
}

pub(crate) fn parse_timestamp(value: &str) -> Result<DateTime<Utc>> {
    Ok(DateTime::parse_from_rfc3339(value)
        .map_err(|e| ReloadError::Storage(format!("Invalid timestamp: {}", e)))?
        .with_timezone(&Utc))
}

fn parse_stored<T>(value: &str, what: &str) -> Result<T>
where
    T: std::str::FromStr<Err = ReloadError>,
{
    value
        .parse()
        .map_err(|e| ReloadError::Storage(format!("Invalid stored {}: {}", what, e)))
}

fn count_from_sql(value: i64, what: &str) -> Result<u64> {
    u64::try_from(value)
        .map_err(|_| ReloadError::Storage(format!("Negative {} in storage: {}", what, value)))
}

fn small_count_from_sql(value: i64, what: &str) -> Result<u32> {
    u32::try_from(value)
        .map_err(|_| ReloadError::Storage(format!("Out of range {} in storage: {}", what, value)))
}

#[derive(Debug)]
pub struct ComponentRow {
    pub id: String,
    pub owner: String,
    pub kind: String,
    pub manufacturer: String,
    pub model: String,
    pub quantity: f64,
    pub weight_unit: Option<String>,
    pub cost_per_unit: Option<f64>,
    pub caliber: Option<String>,
    pub low_stock_threshold: Option<f64>,
    pub created_at: String,
}

impl ComponentRow {
    pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            owner: row.get(1)?,
            kind: row.get(2)?,
            manufacturer: row.get(3)?,
            model: row.get(4)?,
            quantity: row.get(5)?,
            weight_unit: row.get(6)?,
            cost_per_unit: row.get(7)?,
            caliber: row.get(8)?,
            low_stock_threshold: row.get(9)?,
            created_at: row.get(10)?,
        })
    }
}

impl TryFrom<ComponentRow> for Component {
    type Error = ReloadError;

    fn try_from(row: ComponentRow) -> Result<Self> {
        Ok(Component {
            id: parse_uuid(&row.id, "component")?,
            owner: row.owner,
            kind: parse_stored(&row.kind, "component kind")?,
            manufacturer: row.manufacturer,
            model: row.model,
            quantity: row.quantity,
            weight_unit: row
                .weight_unit
                .as_deref()
                .map(|unit| parse_stored(unit, "weight unit"))
                .transpose()?,
            cost_per_unit: row.cost_per_unit,
            caliber: row.caliber,
            low_stock_threshold: row.low_stock_threshold,
            created_at: parse_timestamp(&row.created_at)?,
        })
    }
}

#[derive(Debug)]
pub struct FirearmRow {
    pub id: String,
    pub owner: String,
    pub name: String,
    pub caliber: Option<String>,
    pub round_count: i64,
    pub created_at: String,
}

impl FirearmRow {
    pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            owner: row.get(1)?,
            name: row.get(2)?,
            caliber: row.get(3)?,
            round_count: row.get(4)?,
            created_at: row.get(5)?,
        })
    }
}

impl TryFrom<FirearmRow> for Firearm {
    type Error = ReloadError;

    fn try_from(row: FirearmRow) -> Result<Self> {
        Ok(Firearm {
            id: parse_uuid(&row.id, "firearm")?,
            owner: row.owner,
            name: row.name,
            caliber: row.caliber,
            round_count: count_from_sql(row.round_count, "round count")?,
            created_at: parse_timestamp(&row.created_at)?,
        })
    }
}

#[derive(Debug)]
pub struct BatchRow {
    pub id: String,
    pub owner: String,
    pub batch_number: String,
    pub ammunition_type: String,
    pub quantity: i64,
    pub quantity_remaining: i64,
    pub primer_id: Option<String>,
    pub powder_id: Option<String>,
    pub bullet_id: Option<String>,
    pub brass_id: Option<String>,
    pub charge_weight_grains: Option<f64>,
    pub powder_weight_unit: Option<String>,
    pub caliber: Option<String>,
    pub coal: Option<f64>,
    pub notes: Option<String>,
    pub total_cost: Option<f64>,
    pub cost_per_round: Option<f64>,
    pub created_at: String,
}

impl BatchRow {
    pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            owner: row.get(1)?,
            batch_number: row.get(2)?,
            ammunition_type: row.get(3)?,
            quantity: row.get(4)?,
            quantity_remaining: row.get(5)?,
            primer_id: row.get(6)?,
            powder_id: row.get(7)?,
            bullet_id: row.get(8)?,
            brass_id: row.get(9)?,
            charge_weight_grains: row.get(10)?,
            powder_weight_unit: row.get(11)?,
            caliber: row.get(12)?,
            coal: row.get(13)?,
            notes: row.get(14)?,
            total_cost: row.get(15)?,
            cost_per_round: row.get(16)?,
            created_at: row.get(17)?,
        })
    }
}

impl TryFrom<BatchRow> for AmmunitionBatch {
    type Error = ReloadError;

    fn try_from(row: BatchRow) -> Result<Self> {
        Ok(AmmunitionBatch {
            id: parse_uuid(&row.id, "batch")?,
            owner: row.owner,
            batch_number: row.batch_number,
            ammunition_type: parse_stored(&row.ammunition_type, "ammunition type")?,
            quantity: small_count_from_sql(row.quantity, "batch quantity")?,
            quantity_remaining: small_count_from_sql(row.quantity_remaining, "remaining count")?,
            components: ComponentRefs {
                primer: parse_optional_uuid(row.primer_id, "primer")?,
                powder: parse_optional_uuid(row.powder_id, "powder")?,
                bullet: parse_optional_uuid(row.bullet_id, "bullet")?,
                brass: parse_optional_uuid(row.brass_id, "brass")?,
            },
            charge_weight_grains: row.charge_weight_grains,
            powder_weight_unit: row
                .powder_weight_unit
                .as_deref()
                .map(|unit| parse_stored(unit, "weight unit"))
                .transpose()?,
            caliber: row.caliber,
            coal: row.coal,
            notes: row.notes,
            total_cost: row.total_cost,
            cost_per_round: row.cost_per_round,
            created_at: parse_timestamp(&row.created_at)?,
        })
    }
}

#[derive(Debug)]
pub struct SessionRow {
    pub id: String,
    pub owner: String,
    pub firearm_id: String,
    pub ammunition_batch_id: Option<String>,
    pub rounds_fired: i64,
    pub date: String,
    pub location: Option<String>,
    pub temperature_f: Option<f64>,
    pub humidity_pct: Option<f64>,
    pub notes: Option<String>,
    pub created_at: String,
}

impl SessionRow {
    pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            owner: row.get(1)?,
            firearm_id: row.get(2)?,
            ammunition_batch_id: row.get(3)?,
            rounds_fired: row.get(4)?,
            date: row.get(5)?,
            location: row.get(6)?,
            temperature_f: row.get(7)?,
            humidity_pct: row.get(8)?,
            notes: row.get(9)?,
            created_at: row.get(10)?,
        })
    }
}

impl TryFrom<SessionRow> for ShootingSession {
    type Error = ReloadError;

    fn try_from(row: SessionRow) -> Result<Self> {
        Ok(ShootingSession {
            id: parse_uuid(&row.id, "session")?,
            owner: row.owner,
            firearm_id: parse_uuid(&row.firearm_id, "firearm")?,
            ammunition_batch_id: parse_optional_uuid(row.ammunition_batch_id, "batch")?,
            rounds_fired: small_count_from_sql(row.rounds_fired, "rounds fired")?,
            date: parse_timestamp(&row.date)?,
            conditions: Conditions {
                location: row.location,
                temperature_f: row.temperature_f,
                humidity_pct: row.humidity_pct,
                notes: row.notes,
            },
            created_at: parse_timestamp(&row.created_at)?,
        })
    }
}

#[derive(Debug)]
pub struct ShotRow {
    pub id: String,
    pub session_id: String,
    pub shot_number: i64,
    pub velocity_fps: Option<f64>,
    pub flattened_primer: bool,
    pub cratered_primer: bool,
    pub ejector_mark: bool,
    pub sticky_bolt: bool,
}

impl ShotRow {
    pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            session_id: row.get(1)?,
            shot_number: row.get(2)?,
            velocity_fps: row.get(3)?,
            flattened_primer: row.get(4)?,
            cratered_primer: row.get(5)?,
            ejector_mark: row.get(6)?,
            sticky_bolt: row.get(7)?,
        })
    }
}

impl TryFrom<ShotRow> for ShotRecord {
    type Error = ReloadError;

    fn try_from(row: ShotRow) -> Result<Self> {
        Ok(ShotRecord {
            id: parse_uuid(&row.id, "shot")?,
            session_id: parse_uuid(&row.session_id, "session")?,
            shot_number: small_count_from_sql(row.shot_number, "shot number")?,
            velocity_fps: row.velocity_fps,
            pressure: PressureSigns {
                flattened_primer: row.flattened_primer,
                cratered_primer: row.cratered_primer,
                ejector_mark: row.ejector_mark,
                sticky_bolt: row.sticky_bolt,
            },
        })
    }
}

#[derive(Debug)]
pub struct MaintenanceRow {
    pub id: String,
    pub firearm_id: String,
    pub name: String,
    pub interval_rounds: Option<i64>,
    pub interval_days: Option<i64>,
    pub last_round_count: i64,
    pub last_performed: String,
}

impl MaintenanceRow {
    pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            firearm_id: row.get(1)?,
            name: row.get(2)?,
            interval_rounds: row.get(3)?,
            interval_days: row.get(4)?,
            last_round_count: row.get(5)?,
            last_performed: row.get(6)?,
        })
    }
}

impl TryFrom<MaintenanceRow> for MaintenanceTask {
    type Error = ReloadError;

    fn try_from(row: MaintenanceRow) -> Result<Self> {
        Ok(MaintenanceTask {
            id: parse_uuid(&row.id, "maintenance task")?,
            firearm_id: parse_uuid(&row.firearm_id, "firearm")?,
            name: row.name,
            interval_rounds: row
                .interval_rounds
                .map(|v| count_from_sql(v, "interval"))
                .transpose()?,
            interval_days: row
                .interval_days
                .map(|v| small_count_from_sql(v, "interval days"))
                .transpose()?,
            last_round_count: count_from_sql(row.last_round_count, "round count")?,
            last_performed: parse_timestamp(&row.last_performed)?,
        })
    }
}
