//! SQLite storage backend.
//!
//! One connection behind a mutex. Every trait method locks, runs, and
//! releases, so two trait calls never share a transaction. The adjustment
//! procedures each run inside their own short transaction, which is what
//! makes them atomic.

mod row;

use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use chrono::{DateTime, SecondsFormat, SubsecRound, Utc};
use rusqlite::{Connection, OptionalExtension, Row, ToSql};
use serde::Serialize;
use uuid::Uuid;

use crate::error::{ReloadError, Result};
use crate::quota::LimitKind;
use crate::storage::traits::InventoryStore;
use crate::storage::types::{
    Adjustment, AmmunitionBatch, BatchFilter, BatchUpdate, Component, ComponentFilter,
    ComponentPatch, Counter, Firearm, MaintenanceTask, NewBatch, NewComponent, NewFirearm,
    NewMaintenanceTask, NewSession, NewShot, SessionFilter, ShootingSession, ShotRecord,
};

use row::{
    parse_timestamp, BatchRow, ComponentRow, FirearmRow, MaintenanceRow, SessionRow, ShotRow,
    BATCH_COLUMNS, COMPONENT_COLUMNS, FIREARM_COLUMNS, MAINTENANCE_COLUMNS, SESSION_COLUMNS,
    SHOT_COLUMNS,
};

/// On-disk schema version written to `meta`.
pub const FORMAT_VERSION: &str = "1";

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS meta (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS components (
    id TEXT PRIMARY KEY,
    owner TEXT NOT NULL,
    kind TEXT NOT NULL,
    manufacturer TEXT NOT NULL,
    model TEXT NOT NULL,
    quantity REAL NOT NULL CHECK (quantity >= 0),
    weight_unit TEXT,
    cost_per_unit REAL,
    caliber TEXT,
    low_stock_threshold REAL,
    created_at TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS components_owner ON components (owner);

CREATE TABLE IF NOT EXISTS firearms (
    id TEXT PRIMARY KEY,
    owner TEXT NOT NULL,
    name TEXT NOT NULL,
    caliber TEXT,
    round_count INTEGER NOT NULL CHECK (round_count >= 0),
    created_at TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS firearms_owner ON firearms (owner);

-- Component references are historical back-references: no foreign keys.
CREATE TABLE IF NOT EXISTS batches (
    id TEXT PRIMARY KEY,
    owner TEXT NOT NULL,
    batch_number TEXT NOT NULL,
    ammunition_type TEXT NOT NULL,
    quantity INTEGER NOT NULL CHECK (quantity >= 0),
    quantity_remaining INTEGER NOT NULL
        CHECK (quantity_remaining >= 0 AND quantity_remaining <= quantity),
    primer_id TEXT,
    powder_id TEXT,
    bullet_id TEXT,
    brass_id TEXT,
    charge_weight_grains REAL,
    powder_weight_unit TEXT,
    caliber TEXT,
    coal REAL,
    notes TEXT,
    total_cost REAL,
    cost_per_round REAL,
    created_at TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS batches_owner ON batches (owner);

CREATE TABLE IF NOT EXISTS sessions (
    id TEXT PRIMARY KEY,
    owner TEXT NOT NULL,
    firearm_id TEXT NOT NULL,
    ammunition_batch_id TEXT,
    rounds_fired INTEGER NOT NULL CHECK (rounds_fired >= 0),
    date TEXT NOT NULL,
    location TEXT,
    temperature_f REAL,
    humidity_pct REAL,
    notes TEXT,
    created_at TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS sessions_owner_date ON sessions (owner, date);

CREATE TABLE IF NOT EXISTS shots (
    id TEXT PRIMARY KEY,
    session_id TEXT NOT NULL,
    shot_number INTEGER NOT NULL,
    velocity_fps REAL,
    flattened_primer INTEGER NOT NULL DEFAULT 0,
    cratered_primer INTEGER NOT NULL DEFAULT 0,
    ejector_mark INTEGER NOT NULL DEFAULT 0,
    sticky_bolt INTEGER NOT NULL DEFAULT 0,

    UNIQUE (session_id, shot_number),
    FOREIGN KEY (session_id) REFERENCES sessions(id) ON DELETE CASCADE
);

CREATE TABLE IF NOT EXISTS maintenance_tasks (
    id TEXT PRIMARY KEY,
    firearm_id TEXT NOT NULL,
    name TEXT NOT NULL,
    interval_rounds INTEGER,
    interval_days INTEGER,
    last_round_count INTEGER NOT NULL,
    last_performed TEXT NOT NULL,

    FOREIGN KEY (firearm_id) REFERENCES firearms(id) ON DELETE CASCADE
);
"#;

/// Store-level metadata.
#[derive(Debug, Clone, Serialize)]
pub struct StoreMetadata {
    pub format_version: String,
    pub created_at: DateTime<Utc>,
    pub path: Option<PathBuf>,
}

/// SQLite-backed inventory store.
pub struct SqliteStore {
    path: Option<PathBuf>,
    conn: Mutex<Connection>,
}

/// Timestamps are stored at microsecond precision so they sort as text.
fn stamp(value: DateTime<Utc>) -> (DateTime<Utc>, String) {
    let truncated = value.trunc_subsecs(6);
    let text = truncated.to_rfc3339_opts(SecondsFormat::Micros, true);
    (truncated, text)
}

fn to_sql_count(value: u64, what: &str) -> Result<i64> {
    i64::try_from(value)
        .map_err(|_| ReloadError::Validation(format!("{} is too large: {}", what, value)))
}

fn check_amount(amount: f64) -> Result<()> {
    if !amount.is_finite() || amount < 0.0 {
        return Err(ReloadError::Validation(format!(
            "Adjustment amount must be a non-negative number, got {}",
            amount
        )));
    }
    Ok(())
}

fn query_optional<R, T, P>(
    conn: &Connection,
    sql: &str,
    params: P,
    read: fn(&Row<'_>) -> rusqlite::Result<R>,
) -> Result<Option<T>>
where
    P: rusqlite::Params,
    T: TryFrom<R, Error = ReloadError>,
{
    conn.query_row(sql, params, read)
        .optional()?
        .map(T::try_from)
        .transpose()
}

fn query_all<R, T, P>(
    conn: &Connection,
    sql: &str,
    params: P,
    read: fn(&Row<'_>) -> rusqlite::Result<R>,
) -> Result<Vec<T>>
where
    P: rusqlite::Params,
    T: TryFrom<R, Error = ReloadError>,
{
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt.query_map(params, read)?;
    let mut items = Vec::new();
    for row in rows {
        items.push(T::try_from(row?)?);
    }
    Ok(items)
}

/// Insert a row, refusing when the owner already holds `ceiling` rows of `kind`.
///
/// The count and the insert are one statement, so concurrent writers cannot
/// both slip under the ceiling.
fn insert_guarded(
    conn: &Connection,
    kind: LimitKind,
    columns: &str,
    mut values: Vec<Box<dyn ToSql>>,
    owner: &str,
    ceiling: Option<u32>,
) -> Result<()> {
    let table = kind.as_str();
    let placeholders = vec!["?"; values.len()].join(", ");
    let sql = match ceiling {
        Some(limit) => {
            values.push(Box::new(owner.to_string()));
            values.push(Box::new(i64::from(limit)));
            format!(
                "INSERT INTO {table} ({columns}) SELECT {placeholders} \
                 WHERE (SELECT COUNT(*) FROM {table} WHERE owner = ?) < ?"
            )
        }
        None => format!("INSERT INTO {table} ({columns}) VALUES ({placeholders})"),
    };

    let changed = conn.execute(&sql, rusqlite::params_from_iter(values.iter()))?;
    if changed == 0 {
        return Err(match ceiling {
            Some(ceiling) => ReloadError::QuotaExceeded { kind, ceiling },
            None => ReloadError::Storage(format!("Insert into {} wrote no rows", table)),
        });
    }
    Ok(())
}

/// Table, counter column and optional ceiling column for a counter.
fn counter_columns(counter: Counter) -> (&'static str, &'static str, Option<&'static str>) {
    match counter {
        Counter::BatchRemaining(_) => ("batches", "quantity_remaining", Some("quantity")),
        Counter::FirearmRoundCount(_) => ("firearms", "round_count", None),
    }
}

fn counter_not_found(counter: Counter) -> ReloadError {
    match counter {
        Counter::BatchRemaining(id) => ReloadError::NotFound(format!("batch {}", id)),
        Counter::FirearmRoundCount(id) => ReloadError::NotFound(format!("firearm {}", id)),
    }
}

impl SqliteStore {
    /// Open (creating if needed) a store file.
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;
        Self::init(conn, Some(path.to_path_buf()))
    }

    /// Open a private in-memory store.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::init(conn, None)
    }

    fn init(conn: Connection, path: Option<PathBuf>) -> Result<Self> {
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        conn.busy_timeout(Duration::from_secs(5))?;
        conn.execute_batch(SCHEMA)?;

        let (_, created_at) = stamp(Utc::now());
        conn.execute(
            "INSERT OR IGNORE INTO meta (key, value) VALUES ('format_version', ?)",
            [FORMAT_VERSION],
        )?;
        conn.execute(
            "INSERT OR IGNORE INTO meta (key, value) VALUES ('created_at', ?)",
            [created_at],
        )?;

        let version: String = conn.query_row(
            "SELECT value FROM meta WHERE key = 'format_version'",
            [],
            |row| row.get(0),
        )?;
        if version != FORMAT_VERSION {
            return Err(ReloadError::Storage(format!(
                "Unsupported store format version {} (expected {})",
                version, FORMAT_VERSION
            )));
        }

        Ok(Self {
            path,
            conn: Mutex::new(conn),
        })
    }

    /// Lock the database connection, returning an error if the mutex is poisoned.
    fn lock_conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| ReloadError::Storage("SQLite connection poisoned".to_string()))
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn metadata(&self) -> Result<StoreMetadata> {
        let conn = self.lock_conn()?;
        let format_version: String = conn.query_row(
            "SELECT value FROM meta WHERE key = 'format_version'",
            [],
            |row| row.get(0),
        )?;
        let created_at: String = conn.query_row(
            "SELECT value FROM meta WHERE key = 'created_at'",
            [],
            |row| row.get(0),
        )?;
        Ok(StoreMetadata {
            format_version,
            created_at: parse_timestamp(&created_at)?,
            path: self.path.clone(),
        })
    }

    /// Write a consistent copy of the store to `destination`.
    ///
    /// The copy is written next to the destination first and renamed into
    /// place, so an interrupted backup never leaves a truncated file.
    pub fn backup_to(&self, destination: &Path) -> Result<()> {
        let parent = destination
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        let filename = destination
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| ReloadError::Storage("Invalid backup filename".to_string()))?;
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_err(|e| ReloadError::Storage(format!("System time error: {}", e)))?
            .as_nanos();
        let temp_path = parent.join(format!("{}.{}.tmp", filename, nanos));
        let temp_str = temp_path
            .to_str()
            .ok_or_else(|| ReloadError::Storage("Backup path is not valid UTF-8".to_string()))?;

        {
            let conn = self.lock_conn()?;
            conn.execute("VACUUM INTO ?", [temp_str])?;
        }

        crate::fs::replace_file(&temp_path, destination)
    }

    fn counter_value(
        conn: &Connection,
        owner: &str,
        counter: Counter,
    ) -> Result<(u64, Option<u64>)> {
        let (table, column, ceiling_column) = counter_columns(counter);
        let sql = format!(
            "SELECT {column}, {ceiling} FROM {table} WHERE id = ? AND owner = ?",
            ceiling = ceiling_column.unwrap_or("NULL")
        );
        let values: Option<(i64, Option<i64>)> = conn
            .query_row(&sql, (counter.target().to_string(), owner), |row| {
                Ok((row.get(0)?, row.get(1)?))
            })
            .optional()?;
        let (value, ceiling) = values.ok_or_else(|| counter_not_found(counter))?;
        let value = u64::try_from(value)
            .map_err(|_| ReloadError::Storage(format!("Negative counter for {}", counter)))?;
        let ceiling = ceiling.map(|c| u64::try_from(c).unwrap_or(0));
        Ok((value, ceiling))
    }

    fn write_counter(conn: &Connection, owner: &str, counter: Counter, value: u64) -> Result<()> {
        let (table, column, _) = counter_columns(counter);
        let sql = format!("UPDATE {table} SET {column} = ? WHERE id = ? AND owner = ?");
        conn.execute(
            &sql,
            (
                to_sql_count(value, column)?,
                counter.target().to_string(),
                owner,
            ),
        )?;
        Ok(())
    }

    fn adjust_stock(
        &self,
        owner: &str,
        component_id: &Uuid,
        apply: impl FnOnce(f64) -> f64,
    ) -> Result<Adjustment<f64>> {
        let mut conn = self.lock_conn()?;
        let tx = conn.transaction()?;

        let previous: f64 = tx
            .query_row(
                "SELECT quantity FROM components WHERE id = ? AND owner = ?",
                (component_id.to_string(), owner),
                |row| row.get(0),
            )
            .optional()?
            .ok_or_else(|| ReloadError::NotFound(format!("component {}", component_id)))?;
        let current = apply(previous);

        tx.execute(
            "UPDATE components SET quantity = ? WHERE id = ? AND owner = ?",
            (current, component_id.to_string(), owner),
        )?;
        tx.commit()?;

        Ok(Adjustment { previous, current })
    }
}

impl InventoryStore for SqliteStore {
    fn insert_component(
        &self,
        component: &NewComponent,
        ceiling: Option<u32>,
    ) -> Result<Component> {
        component.validate()?;
        let conn = self.lock_conn()?;

        let id = Uuid::new_v4();
        let (created_at, created_at_str) = stamp(Utc::now());
        let values: Vec<Box<dyn ToSql>> = vec![
            Box::new(id.to_string()),
            Box::new(component.owner.clone()),
            Box::new(component.kind.as_str()),
            Box::new(component.manufacturer.clone()),
            Box::new(component.model.clone()),
            Box::new(component.quantity),
            Box::new(component.weight_unit.map(|unit| unit.as_str())),
            Box::new(component.cost_per_unit),
            Box::new(component.caliber.clone()),
            Box::new(component.low_stock_threshold),
            Box::new(created_at_str),
        ];
        insert_guarded(
            &conn,
            LimitKind::Components,
            COMPONENT_COLUMNS,
            values,
            &component.owner,
            ceiling,
        )?;

        Ok(Component {
            id,
            owner: component.owner.clone(),
            kind: component.kind,
            manufacturer: component.manufacturer.clone(),
            model: component.model.clone(),
            quantity: component.quantity,
            weight_unit: component.weight_unit,
            cost_per_unit: component.cost_per_unit,
            caliber: component.caliber.clone(),
            low_stock_threshold: component.low_stock_threshold,
            created_at,
        })
    }

    fn get_component(&self, owner: &str, id: &Uuid) -> Result<Option<Component>> {
        let conn = self.lock_conn()?;
        query_optional(
            &conn,
            &format!("SELECT {COMPONENT_COLUMNS} FROM components WHERE id = ? AND owner = ?"),
            (id.to_string(), owner),
            ComponentRow::from_row,
        )
    }

    fn list_components(&self, owner: &str, filter: &ComponentFilter) -> Result<Vec<Component>> {
        let conn = self.lock_conn()?;

        let mut conditions = vec!["owner = ?".to_string()];
        let mut params: Vec<Box<dyn ToSql>> = vec![Box::new(owner.to_string())];

        if let Some(kind) = filter.kind {
            conditions.push("kind = ?".to_string());
            params.push(Box::new(kind.as_str()));
        }
        if filter.low_stock_only {
            conditions.push(
                "low_stock_threshold IS NOT NULL AND quantity <= low_stock_threshold".to_string(),
            );
        }

        let query = format!(
            "SELECT {COMPONENT_COLUMNS} FROM components WHERE {} \
             ORDER BY kind, manufacturer, model",
            conditions.join(" AND ")
        );
        query_all(
            &conn,
            &query,
            rusqlite::params_from_iter(params.iter()),
            ComponentRow::from_row,
        )
    }

    fn update_component(
        &self,
        owner: &str,
        id: &Uuid,
        patch: &ComponentPatch,
    ) -> Result<Component> {
        let conn = self.lock_conn()?;

        let mut sets: Vec<&str> = Vec::new();
        let mut params: Vec<Box<dyn ToSql>> = Vec::new();
        if let Some(ref manufacturer) = patch.manufacturer {
            sets.push("manufacturer = ?");
            params.push(Box::new(manufacturer.clone()));
        }
        if let Some(ref model) = patch.model {
            sets.push("model = ?");
            params.push(Box::new(model.clone()));
        }
        if let Some(ref caliber) = patch.caliber {
            sets.push("caliber = ?");
            params.push(Box::new(caliber.clone()));
        }
        if let Some(threshold) = patch.low_stock_threshold {
            sets.push("low_stock_threshold = ?");
            params.push(Box::new(threshold));
        }

        if !sets.is_empty() {
            params.push(Box::new(id.to_string()));
            params.push(Box::new(owner.to_string()));
            let sql = format!(
                "UPDATE components SET {} WHERE id = ? AND owner = ?",
                sets.join(", ")
            );
            conn.execute(&sql, rusqlite::params_from_iter(params.iter()))?;
        }

        query_optional(
            &conn,
            &format!("SELECT {COMPONENT_COLUMNS} FROM components WHERE id = ? AND owner = ?"),
            (id.to_string(), owner),
            ComponentRow::from_row,
        )?
        .ok_or_else(|| ReloadError::NotFound(format!("component {}", id)))
    }

    fn delete_component(&self, owner: &str, id: &Uuid) -> Result<bool> {
        let conn = self.lock_conn()?;
        let changed = conn.execute(
            "DELETE FROM components WHERE id = ? AND owner = ?",
            (id.to_string(), owner),
        )?;
        Ok(changed > 0)
    }

    fn insert_firearm(&self, firearm: &NewFirearm, ceiling: Option<u32>) -> Result<Firearm> {
        if firearm.name.trim().is_empty() {
            return Err(ReloadError::Validation(
                "Firearm name cannot be empty".to_string(),
            ));
        }
        let conn = self.lock_conn()?;

        let id = Uuid::new_v4();
        let (created_at, created_at_str) = stamp(Utc::now());
        let values: Vec<Box<dyn ToSql>> = vec![
            Box::new(id.to_string()),
            Box::new(firearm.owner.clone()),
            Box::new(firearm.name.clone()),
            Box::new(firearm.caliber.clone()),
            Box::new(to_sql_count(firearm.round_count, "round count")?),
            Box::new(created_at_str),
        ];
        insert_guarded(
            &conn,
            LimitKind::Firearms,
            FIREARM_COLUMNS,
            values,
            &firearm.owner,
            ceiling,
        )?;

        Ok(Firearm {
            id,
            owner: firearm.owner.clone(),
            name: firearm.name.clone(),
            caliber: firearm.caliber.clone(),
            round_count: firearm.round_count,
            created_at,
        })
    }

    fn get_firearm(&self, owner: &str, id: &Uuid) -> Result<Option<Firearm>> {
        let conn = self.lock_conn()?;
        query_optional(
            &conn,
            &format!("SELECT {FIREARM_COLUMNS} FROM firearms WHERE id = ? AND owner = ?"),
            (id.to_string(), owner),
            FirearmRow::from_row,
        )
    }

    fn list_firearms(&self, owner: &str) -> Result<Vec<Firearm>> {
        let conn = self.lock_conn()?;
        query_all(
            &conn,
            &format!("SELECT {FIREARM_COLUMNS} FROM firearms WHERE owner = ? ORDER BY name"),
            [owner],
            FirearmRow::from_row,
        )
    }

    fn delete_firearm(&self, owner: &str, id: &Uuid) -> Result<bool> {
        let conn = self.lock_conn()?;
        let changed = conn.execute(
            "DELETE FROM firearms WHERE id = ? AND owner = ?",
            (id.to_string(), owner),
        )?;
        Ok(changed > 0)
    }

    fn insert_batch(&self, batch: &NewBatch, ceiling: Option<u32>) -> Result<AmmunitionBatch> {
        let conn = self.lock_conn()?;

        let id = Uuid::new_v4();
        let (created_at, created_at_str) = stamp(Utc::now());
        let refs = batch.components;
        let values: Vec<Box<dyn ToSql>> = vec![
            Box::new(id.to_string()),
            Box::new(batch.owner.clone()),
            Box::new(batch.batch_number.clone()),
            Box::new(batch.ammunition_type.as_str()),
            Box::new(i64::from(batch.quantity)),
            Box::new(i64::from(batch.quantity)),
            Box::new(refs.primer.map(|id| id.to_string())),
            Box::new(refs.powder.map(|id| id.to_string())),
            Box::new(refs.bullet.map(|id| id.to_string())),
            Box::new(refs.brass.map(|id| id.to_string())),
            Box::new(batch.charge_weight_grains),
            Box::new(batch.powder_weight_unit.map(|unit| unit.as_str())),
            Box::new(batch.caliber.clone()),
            Box::new(batch.coal),
            Box::new(batch.notes.clone()),
            Box::new(batch.total_cost),
            Box::new(batch.cost_per_round),
            Box::new(created_at_str),
        ];
        insert_guarded(
            &conn,
            LimitKind::Batches,
            BATCH_COLUMNS,
            values,
            &batch.owner,
            ceiling,
        )?;

        Ok(AmmunitionBatch {
            id,
            owner: batch.owner.clone(),
            batch_number: batch.batch_number.clone(),
            ammunition_type: batch.ammunition_type,
            quantity: batch.quantity,
            quantity_remaining: batch.quantity,
            components: refs,
            charge_weight_grains: batch.charge_weight_grains,
            powder_weight_unit: batch.powder_weight_unit,
            caliber: batch.caliber.clone(),
            coal: batch.coal,
            notes: batch.notes.clone(),
            total_cost: batch.total_cost,
            cost_per_round: batch.cost_per_round,
            created_at,
        })
    }

    fn get_batch(&self, owner: &str, id: &Uuid) -> Result<Option<AmmunitionBatch>> {
        let conn = self.lock_conn()?;
        query_optional(
            &conn,
            &format!("SELECT {BATCH_COLUMNS} FROM batches WHERE id = ? AND owner = ?"),
            (id.to_string(), owner),
            BatchRow::from_row,
        )
    }

    fn list_batches(&self, owner: &str, filter: &BatchFilter) -> Result<Vec<AmmunitionBatch>> {
        let conn = self.lock_conn()?;

        let mut conditions = vec!["owner = ?".to_string()];
        let mut params: Vec<Box<dyn ToSql>> = vec![Box::new(owner.to_string())];

        if let Some(ammunition_type) = filter.ammunition_type {
            conditions.push("ammunition_type = ?".to_string());
            params.push(Box::new(ammunition_type.as_str()));
        }
        if let Some(ref caliber) = filter.caliber {
            conditions.push("caliber = ?".to_string());
            params.push(Box::new(caliber.clone()));
        }
        if filter.available_only {
            conditions.push("quantity_remaining > 0".to_string());
        }

        let mut query = format!(
            "SELECT {BATCH_COLUMNS} FROM batches WHERE {} ORDER BY created_at DESC",
            conditions.join(" AND ")
        );
        if let Some(limit) = filter.limit {
            query.push_str(" LIMIT ?");
            params.push(Box::new(limit as i64));
        }

        query_all(
            &conn,
            &query,
            rusqlite::params_from_iter(params.iter()),
            BatchRow::from_row,
        )
    }

    fn update_batch(
        &self,
        owner: &str,
        id: &Uuid,
        update: &BatchUpdate,
    ) -> Result<AmmunitionBatch> {
        let mut conn = self.lock_conn()?;
        let tx = conn.transaction()?;

        let mut sets: Vec<&str> = Vec::new();
        let mut params: Vec<Box<dyn ToSql>> = Vec::new();
        if let Some(ref batch_number) = update.batch_number {
            sets.push("batch_number = ?");
            params.push(Box::new(batch_number.clone()));
        }
        if let Some(ref caliber) = update.caliber {
            sets.push("caliber = ?");
            params.push(Box::new(caliber.clone()));
        }
        if let Some(coal) = update.coal {
            sets.push("coal = ?");
            params.push(Box::new(coal));
        }
        if let Some(ref notes) = update.notes {
            sets.push("notes = ?");
            params.push(Box::new(notes.clone()));
        }
        if let Some(quantity) = update.quantity {
            // Right-hand sides see the old row, so `? - quantity` is the delta.
            sets.push("quantity_remaining = MIN(MAX(quantity_remaining + (? - quantity), 0), ?)");
            params.push(Box::new(i64::from(quantity)));
            params.push(Box::new(i64::from(quantity)));
            sets.push("quantity = ?");
            params.push(Box::new(i64::from(quantity)));
        }
        if let Some(total_cost) = update.total_cost {
            sets.push("total_cost = ?");
            params.push(Box::new(total_cost));
        }
        if let Some(cost_per_round) = update.cost_per_round {
            sets.push("cost_per_round = ?");
            params.push(Box::new(cost_per_round));
        }

        if !sets.is_empty() {
            params.push(Box::new(id.to_string()));
            params.push(Box::new(owner.to_string()));
            let sql = format!(
                "UPDATE batches SET {} WHERE id = ? AND owner = ?",
                sets.join(", ")
            );
            let changed = tx.execute(&sql, rusqlite::params_from_iter(params.iter()))?;
            if changed == 0 {
                return Err(ReloadError::NotFound(format!("batch {}", id)));
            }
        }

        let batch = query_optional(
            &tx,
            &format!("SELECT {BATCH_COLUMNS} FROM batches WHERE id = ? AND owner = ?"),
            (id.to_string(), owner),
            BatchRow::from_row,
        )?
        .ok_or_else(|| ReloadError::NotFound(format!("batch {}", id)))?;
        tx.commit()?;

        Ok(batch)
    }

    fn delete_batch(&self, owner: &str, id: &Uuid) -> Result<bool> {
        let conn = self.lock_conn()?;
        let changed = conn.execute(
            "DELETE FROM batches WHERE id = ? AND owner = ?",
            (id.to_string(), owner),
        )?;
        Ok(changed > 0)
    }

    fn insert_session(
        &self,
        session: &NewSession,
        ceiling: Option<u32>,
    ) -> Result<ShootingSession> {
        let conn = self.lock_conn()?;

        let id = Uuid::new_v4();
        let (date, date_str) = stamp(session.date);
        let (created_at, created_at_str) = stamp(Utc::now());
        let conditions = &session.conditions;
        let values: Vec<Box<dyn ToSql>> = vec![
            Box::new(id.to_string()),
            Box::new(session.owner.clone()),
            Box::new(session.firearm_id.to_string()),
            Box::new(session.ammunition_batch_id.map(|id| id.to_string())),
            Box::new(i64::from(session.rounds_fired)),
            Box::new(date_str),
            Box::new(conditions.location.clone()),
            Box::new(conditions.temperature_f),
            Box::new(conditions.humidity_pct),
            Box::new(conditions.notes.clone()),
            Box::new(created_at_str),
        ];
        insert_guarded(
            &conn,
            LimitKind::Sessions,
            SESSION_COLUMNS,
            values,
            &session.owner,
            ceiling,
        )?;

        Ok(ShootingSession {
            id,
            owner: session.owner.clone(),
            firearm_id: session.firearm_id,
            ammunition_batch_id: session.ammunition_batch_id,
            rounds_fired: session.rounds_fired,
            date,
            conditions: session.conditions.clone(),
            created_at,
        })
    }

    fn get_session(&self, owner: &str, id: &Uuid) -> Result<Option<ShootingSession>> {
        let conn = self.lock_conn()?;
        query_optional(
            &conn,
            &format!("SELECT {SESSION_COLUMNS} FROM sessions WHERE id = ? AND owner = ?"),
            (id.to_string(), owner),
            SessionRow::from_row,
        )
    }

    fn list_sessions(&self, owner: &str, filter: &SessionFilter) -> Result<Vec<ShootingSession>> {
        let conn = self.lock_conn()?;

        let mut conditions = vec!["owner = ?".to_string()];
        let mut params: Vec<Box<dyn ToSql>> = vec![Box::new(owner.to_string())];

        if let Some(firearm_id) = filter.firearm_id {
            conditions.push("firearm_id = ?".to_string());
            params.push(Box::new(firearm_id.to_string()));
        }
        if let Some(batch_id) = filter.batch_id {
            conditions.push("ammunition_batch_id = ?".to_string());
            params.push(Box::new(batch_id.to_string()));
        }
        if let Some(since) = filter.since {
            conditions.push("date >= ?".to_string());
            params.push(Box::new(stamp(since).1));
        }
        if let Some(until) = filter.until {
            conditions.push("date <= ?".to_string());
            params.push(Box::new(stamp(until).1));
        }

        let mut query = format!(
            "SELECT {SESSION_COLUMNS} FROM sessions WHERE {} ORDER BY date DESC, created_at DESC",
            conditions.join(" AND ")
        );
        if let Some(limit) = filter.limit {
            query.push_str(" LIMIT ?");
            params.push(Box::new(limit as i64));
        }

        query_all(
            &conn,
            &query,
            rusqlite::params_from_iter(params.iter()),
            SessionRow::from_row,
        )
    }

    fn delete_session(&self, owner: &str, id: &Uuid) -> Result<bool> {
        let conn = self.lock_conn()?;
        let changed = conn.execute(
            "DELETE FROM sessions WHERE id = ? AND owner = ?",
            (id.to_string(), owner),
        )?;
        Ok(changed > 0)
    }

    fn insert_shot(&self, owner: &str, session_id: &Uuid, shot: &NewShot) -> Result<ShotRecord> {
        let conn = self.lock_conn()?;

        let id = Uuid::new_v4();
        let pressure = shot.pressure;
        let changed = conn.execute(
            &format!(
                "INSERT INTO shots ({SHOT_COLUMNS}) \
                 SELECT ?, ?, ?, ?, ?, ?, ?, ? \
                 WHERE EXISTS (SELECT 1 FROM sessions WHERE id = ? AND owner = ?)"
            ),
            rusqlite::params![
                id.to_string(),
                session_id.to_string(),
                i64::from(shot.shot_number),
                shot.velocity_fps,
                pressure.flattened_primer,
                pressure.cratered_primer,
                pressure.ejector_mark,
                pressure.sticky_bolt,
                session_id.to_string(),
                owner,
            ],
        )?;
        if changed == 0 {
            return Err(ReloadError::NotFound(format!("session {}", session_id)));
        }

        Ok(ShotRecord {
            id,
            session_id: *session_id,
            shot_number: shot.shot_number,
            velocity_fps: shot.velocity_fps,
            pressure,
        })
    }

    fn list_shots(&self, owner: &str, session_id: &Uuid) -> Result<Vec<ShotRecord>> {
        let conn = self.lock_conn()?;
        let columns = SHOT_COLUMNS
            .split(", ")
            .map(|column| format!("s.{}", column.trim()))
            .collect::<Vec<_>>()
            .join(", ");
        query_all(
            &conn,
            &format!(
                "SELECT {columns} FROM shots s JOIN sessions ss ON ss.id = s.session_id \
                 WHERE s.session_id = ? AND ss.owner = ? ORDER BY s.shot_number"
            ),
            (session_id.to_string(), owner),
            ShotRow::from_row,
        )
    }

    fn insert_maintenance_task(
        &self,
        owner: &str,
        task: &NewMaintenanceTask,
    ) -> Result<MaintenanceTask> {
        if task.name.trim().is_empty() {
            return Err(ReloadError::Validation(
                "Maintenance task name cannot be empty".to_string(),
            ));
        }
        if task.interval_rounds.is_none() && task.interval_days.is_none() {
            return Err(ReloadError::Validation(
                "Maintenance task needs a round or day interval".to_string(),
            ));
        }

        let mut conn = self.lock_conn()?;
        let tx = conn.transaction()?;

        let round_count: i64 = tx
            .query_row(
                "SELECT round_count FROM firearms WHERE id = ? AND owner = ?",
                (task.firearm_id.to_string(), owner),
                |row| row.get(0),
            )
            .optional()?
            .ok_or_else(|| ReloadError::NotFound(format!("firearm {}", task.firearm_id)))?;

        let id = Uuid::new_v4();
        let (performed, performed_str) = stamp(Utc::now());
        tx.execute(
            &format!("INSERT INTO maintenance_tasks ({MAINTENANCE_COLUMNS}) VALUES (?, ?, ?, ?, ?, ?, ?)"),
            rusqlite::params![
                id.to_string(),
                task.firearm_id.to_string(),
                task.name,
                task.interval_rounds
                    .map(|v| to_sql_count(v, "interval"))
                    .transpose()?,
                task.interval_days.map(i64::from),
                round_count,
                performed_str,
            ],
        )?;
        tx.commit()?;

        Ok(MaintenanceTask {
            id,
            firearm_id: task.firearm_id,
            name: task.name.clone(),
            interval_rounds: task.interval_rounds,
            interval_days: task.interval_days,
            last_round_count: u64::try_from(round_count).unwrap_or(0),
            last_performed: performed,
        })
    }

    fn list_maintenance_tasks(
        &self,
        owner: &str,
        firearm_id: &Uuid,
    ) -> Result<Vec<MaintenanceTask>> {
        let conn = self.lock_conn()?;
        let columns = MAINTENANCE_COLUMNS
            .split(", ")
            .map(|column| format!("m.{}", column.trim()))
            .collect::<Vec<_>>()
            .join(", ");
        query_all(
            &conn,
            &format!(
                "SELECT {columns} FROM maintenance_tasks m JOIN firearms f ON f.id = m.firearm_id \
                 WHERE m.firearm_id = ? AND f.owner = ? ORDER BY m.name"
            ),
            (firearm_id.to_string(), owner),
            MaintenanceRow::from_row,
        )
    }

    fn mark_maintenance_performed(&self, owner: &str, task_id: &Uuid) -> Result<MaintenanceTask> {
        let mut conn = self.lock_conn()?;
        let tx = conn.transaction()?;

        let round_count: i64 = tx
            .query_row(
                "SELECT f.round_count FROM maintenance_tasks m \
                 JOIN firearms f ON f.id = m.firearm_id \
                 WHERE m.id = ? AND f.owner = ?",
                (task_id.to_string(), owner),
                |row| row.get(0),
            )
            .optional()?
            .ok_or_else(|| ReloadError::NotFound(format!("maintenance task {}", task_id)))?;

        let (_, performed_str) = stamp(Utc::now());
        tx.execute(
            "UPDATE maintenance_tasks SET last_round_count = ?, last_performed = ? WHERE id = ?",
            (round_count, performed_str, task_id.to_string()),
        )?;
        let task = query_optional(
            &tx,
            &format!("SELECT {MAINTENANCE_COLUMNS} FROM maintenance_tasks WHERE id = ?"),
            [task_id.to_string()],
            MaintenanceRow::from_row,
        )?
        .ok_or_else(|| ReloadError::NotFound(format!("maintenance task {}", task_id)))?;
        tx.commit()?;

        Ok(task)
    }

    fn count(&self, owner: &str, kind: LimitKind) -> Result<u32> {
        let conn = self.lock_conn()?;
        let count: i64 = conn.query_row(
            &format!("SELECT COUNT(*) FROM {} WHERE owner = ?", kind.as_str()),
            [owner],
            |row| row.get(0),
        )?;
        Ok(u32::try_from(count).unwrap_or(u32::MAX))
    }

    fn decrement_stock_with_floor(
        &self,
        owner: &str,
        component_id: &Uuid,
        amount: f64,
    ) -> Result<Adjustment<f64>> {
        check_amount(amount)?;
        self.adjust_stock(owner, component_id, |previous| (previous - amount).max(0.0))
    }

    fn increment_stock(
        &self,
        owner: &str,
        component_id: &Uuid,
        amount: f64,
    ) -> Result<Adjustment<f64>> {
        check_amount(amount)?;
        self.adjust_stock(owner, component_id, |previous| previous + amount)
    }

    fn decrement_counter_with_floor(
        &self,
        owner: &str,
        counter: Counter,
        amount: u64,
    ) -> Result<Adjustment<u64>> {
        let mut conn = self.lock_conn()?;
        let tx = conn.transaction()?;

        let (previous, _) = Self::counter_value(&tx, owner, counter)?;
        let current = previous.saturating_sub(amount);
        Self::write_counter(&tx, owner, counter, current)?;
        tx.commit()?;

        Ok(Adjustment { previous, current })
    }

    fn increment_counter(
        &self,
        owner: &str,
        counter: Counter,
        amount: u64,
    ) -> Result<Adjustment<u64>> {
        let mut conn = self.lock_conn()?;
        let tx = conn.transaction()?;

        let (previous, ceiling) = Self::counter_value(&tx, owner, counter)?;
        let raised = previous.saturating_add(amount);
        let current = match ceiling {
            Some(ceiling) => raised.min(ceiling.max(previous)),
            None => raised,
        };
        Self::write_counter(&tx, owner, counter, current)?;
        tx.commit()?;

        Ok(Adjustment { previous, current })
    }

    fn decrement_counter_if_available(
        &self,
        owner: &str,
        counter: Counter,
        amount: u64,
    ) -> Result<Option<Adjustment<u64>>> {
        let mut conn = self.lock_conn()?;
        let tx = conn.transaction()?;

        let (previous, _) = Self::counter_value(&tx, owner, counter)?;
        if previous < amount {
            return Ok(None);
        }
        let current = previous - amount;
        Self::write_counter(&tx, owner, counter, current)?;
        tx.commit()?;

        Ok(Some(Adjustment { previous, current }))
    }
}
