//! Core data types for the inventory store.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ReloadError;
use crate::units::{unit_cost, WeightUnit};

/// Stable identifier for the user owning a row.
pub type OwnerId = String;

/// Kind of reloading component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComponentKind {
    Primer,
    Powder,
    Bullet,
    Brass,
}

impl ComponentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ComponentKind::Primer => "primer",
            ComponentKind::Powder => "powder",
            ComponentKind::Bullet => "bullet",
            ComponentKind::Brass => "brass",
        }
    }

    /// Counted by piece rather than weighed.
    pub fn is_counted(&self) -> bool {
        !matches!(self, ComponentKind::Powder)
    }
}

impl fmt::Display for ComponentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ComponentKind {
    type Err = ReloadError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "primer" | "primers" => Ok(ComponentKind::Primer),
            "powder" => Ok(ComponentKind::Powder),
            "bullet" | "bullets" => Ok(ComponentKind::Bullet),
            "brass" | "case" | "cases" => Ok(ComponentKind::Brass),
            other => Err(ReloadError::Validation(format!(
                "Unknown component kind: {}",
                other
            ))),
        }
    }
}

/// A stocked component lot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Component {
    pub id: Uuid,
    pub owner: OwnerId,
    pub kind: ComponentKind,
    pub manufacturer: String,
    pub model: String,

    /// Pieces for counted kinds, stored-unit mass for powder
    pub quantity: f64,

    /// Present for powder only
    pub weight_unit: Option<WeightUnit>,

    /// Price per piece or per stored unit, frozen at purchase
    pub cost_per_unit: Option<f64>,

    pub caliber: Option<String>,
    pub low_stock_threshold: Option<f64>,
    pub created_at: DateTime<Utc>,
}

impl Component {
    pub fn is_low_stock(&self) -> bool {
        self.low_stock_threshold
            .map(|threshold| self.quantity <= threshold)
            .unwrap_or(false)
    }

    pub fn display_name(&self) -> String {
        format!("{} {}", self.manufacturer, self.model)
    }
}

/// Builder for creating new components.
#[derive(Debug, Clone)]
pub struct NewComponent {
    pub owner: OwnerId,
    pub kind: ComponentKind,
    pub manufacturer: String,
    pub model: String,
    pub quantity: f64,
    pub weight_unit: Option<WeightUnit>,
    pub cost_per_unit: Option<f64>,
    pub caliber: Option<String>,
    pub low_stock_threshold: Option<f64>,
}

impl NewComponent {
    pub fn new(
        owner: impl Into<OwnerId>,
        kind: ComponentKind,
        manufacturer: impl Into<String>,
        model: impl Into<String>,
        quantity: f64,
    ) -> Self {
        Self {
            owner: owner.into(),
            kind,
            manufacturer: manufacturer.into(),
            model: model.into(),
            quantity,
            weight_unit: None,
            cost_per_unit: None,
            caliber: None,
            low_stock_threshold: None,
        }
    }

    pub fn with_weight_unit(mut self, unit: WeightUnit) -> Self {
        self.weight_unit = Some(unit);
        self
    }

    /// Derive the per-unit cost from what was paid for the whole lot.
    pub fn with_purchase_price(mut self, total_price: f64) -> Self {
        self.cost_per_unit = unit_cost(total_price, self.quantity);
        self
    }

    pub fn with_caliber(mut self, caliber: impl Into<String>) -> Self {
        self.caliber = Some(caliber.into());
        self
    }

    pub fn with_low_stock_threshold(mut self, threshold: f64) -> Self {
        self.low_stock_threshold = Some(threshold);
        self
    }

    pub fn validate(&self) -> crate::Result<()> {
        if self.manufacturer.trim().is_empty() && self.model.trim().is_empty() {
            return Err(ReloadError::Validation(
                "Component needs a manufacturer or model".to_string(),
            ));
        }
        if !self.quantity.is_finite() || self.quantity < 0.0 {
            return Err(ReloadError::Validation(
                "Component quantity must be zero or more".to_string(),
            ));
        }
        match (self.kind, self.weight_unit) {
            (ComponentKind::Powder, None) => Err(ReloadError::Validation(
                "Powder requires a weight unit (lb or g)".to_string(),
            )),
            (kind, Some(_)) if kind.is_counted() => Err(ReloadError::Validation(format!(
                "A {} is counted, not weighed",
                kind
            ))),
            _ => Ok(()),
        }
    }
}

/// Descriptive fields an owner may edit. Quantity and cost are not editable.
#[derive(Debug, Clone, Default)]
pub struct ComponentPatch {
    pub manufacturer: Option<String>,
    pub model: Option<String>,
    pub caliber: Option<Option<String>>,
    pub low_stock_threshold: Option<Option<f64>>,
}

/// Filter for listing components.
#[derive(Debug, Clone, Default)]
pub struct ComponentFilter {
    pub kind: Option<ComponentKind>,
    pub low_stock_only: bool,
}

impl ComponentFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn kind(mut self, kind: ComponentKind) -> Self {
        self.kind = Some(kind);
        self
    }

    pub fn low_stock_only(mut self) -> Self {
        self.low_stock_only = true;
        self
    }
}

/// Whether a batch was assembled from tracked stock or bought.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AmmunitionType {
    Handload,
    Factory,
}

impl AmmunitionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AmmunitionType::Handload => "handload",
            AmmunitionType::Factory => "factory",
        }
    }
}

impl fmt::Display for AmmunitionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AmmunitionType {
    type Err = ReloadError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "handload" | "reload" => Ok(AmmunitionType::Handload),
            "factory" => Ok(AmmunitionType::Factory),
            other => Err(ReloadError::Validation(format!(
                "Unknown ammunition type: {}",
                other
            ))),
        }
    }
}

/// Back-references from a handload batch to the lots it consumed.
///
/// These may dangle once the owner deletes a component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ComponentRefs {
    pub primer: Option<Uuid>,
    pub powder: Option<Uuid>,
    pub bullet: Option<Uuid>,
    pub brass: Option<Uuid>,
}

impl ComponentRefs {
    pub fn is_empty(&self) -> bool {
        self.iter().next().is_none()
    }

    /// Referenced components paired with the slot kind they occupy.
    pub fn iter(&self) -> impl Iterator<Item = (ComponentKind, Uuid)> {
        [
            (ComponentKind::Primer, self.primer),
            (ComponentKind::Powder, self.powder),
            (ComponentKind::Bullet, self.bullet),
            (ComponentKind::Brass, self.brass),
        ]
        .into_iter()
        .filter_map(|(kind, id)| id.map(|id| (kind, id)))
    }
}

/// A produced or purchased lot of ammunition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AmmunitionBatch {
    pub id: Uuid,
    pub owner: OwnerId,
    pub batch_number: String,
    pub ammunition_type: AmmunitionType,

    /// Rounds produced or purchased
    pub quantity: u32,

    /// Rounds still available to fire
    pub quantity_remaining: u32,

    pub components: ComponentRefs,
    pub charge_weight_grains: Option<f64>,

    /// Unit the powder was consumed in, read back on reversal
    pub powder_weight_unit: Option<WeightUnit>,

    pub caliber: Option<String>,
    pub coal: Option<f64>,
    pub notes: Option<String>,
    pub total_cost: Option<f64>,
    pub cost_per_round: Option<f64>,
    pub created_at: DateTime<Utc>,
}

/// Row-level insert for a batch. Built by the production engine.
#[derive(Debug, Clone)]
pub struct NewBatch {
    pub owner: OwnerId,
    pub batch_number: String,
    pub ammunition_type: AmmunitionType,
    pub quantity: u32,
    pub components: ComponentRefs,
    pub charge_weight_grains: Option<f64>,
    pub powder_weight_unit: Option<WeightUnit>,
    pub caliber: Option<String>,
    pub coal: Option<f64>,
    pub notes: Option<String>,
    pub total_cost: Option<f64>,
    pub cost_per_round: Option<f64>,
}

/// Row-level update for a batch. `None` leaves the column untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchUpdate {
    pub batch_number: Option<String>,
    pub caliber: Option<Option<String>>,
    pub coal: Option<Option<f64>>,
    pub notes: Option<Option<String>>,
    /// A new quantity also shifts `quantity_remaining` by the same delta,
    /// clamped into `0..=quantity`, against the row's value at write time.
    pub quantity: Option<u32>,
    pub total_cost: Option<Option<f64>>,
    pub cost_per_round: Option<Option<f64>>,
}

impl BatchUpdate {
    pub fn is_empty(&self) -> bool {
        *self == BatchUpdate::default()
    }
}

/// Filter for listing batches.
#[derive(Debug, Clone, Default)]
pub struct BatchFilter {
    pub ammunition_type: Option<AmmunitionType>,
    pub caliber: Option<String>,
    pub available_only: bool,
    pub limit: Option<usize>,
}

impl BatchFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ammunition_type(mut self, ammunition_type: AmmunitionType) -> Self {
        self.ammunition_type = Some(ammunition_type);
        self
    }

    pub fn caliber(mut self, caliber: impl Into<String>) -> Self {
        self.caliber = Some(caliber.into());
        self
    }

    pub fn available_only(mut self) -> Self {
        self.available_only = true;
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// A firearm and its lifetime round count.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Firearm {
    pub id: Uuid,
    pub owner: OwnerId,
    pub name: String,
    pub caliber: Option<String>,
    pub round_count: u64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewFirearm {
    pub owner: OwnerId,
    pub name: String,
    pub caliber: Option<String>,
    pub round_count: u64,
}

impl NewFirearm {
    pub fn new(owner: impl Into<OwnerId>, name: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            name: name.into(),
            caliber: None,
            round_count: 0,
        }
    }

    pub fn with_caliber(mut self, caliber: impl Into<String>) -> Self {
        self.caliber = Some(caliber.into());
        self
    }

    /// Rounds fired before the firearm was tracked.
    pub fn with_round_count(mut self, round_count: u64) -> Self {
        self.round_count = round_count;
        self
    }
}

/// Range conditions recorded with a session.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Conditions {
    pub location: Option<String>,
    pub temperature_f: Option<f64>,
    pub humidity_pct: Option<f64>,
    pub notes: Option<String>,
}

/// A logged shooting session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShootingSession {
    pub id: Uuid,
    pub owner: OwnerId,
    pub firearm_id: Uuid,
    pub ammunition_batch_id: Option<Uuid>,
    pub rounds_fired: u32,
    pub date: DateTime<Utc>,
    pub conditions: Conditions,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewSession {
    pub owner: OwnerId,
    pub firearm_id: Uuid,
    pub ammunition_batch_id: Option<Uuid>,
    pub rounds_fired: u32,
    pub date: DateTime<Utc>,
    pub conditions: Conditions,
}

/// Filter for listing sessions.
#[derive(Debug, Clone, Default)]
pub struct SessionFilter {
    pub firearm_id: Option<Uuid>,
    pub batch_id: Option<Uuid>,
    pub since: Option<DateTime<Utc>>,
    pub until: Option<DateTime<Utc>>,
    pub limit: Option<usize>,
}

impl SessionFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn firearm(mut self, id: Uuid) -> Self {
        self.firearm_id = Some(id);
        self
    }

    pub fn batch(mut self, id: Uuid) -> Self {
        self.batch_id = Some(id);
        self
    }

    pub fn since(mut self, date: DateTime<Utc>) -> Self {
        self.since = Some(date);
        self
    }

    pub fn until(mut self, date: DateTime<Utc>) -> Self {
        self.until = Some(date);
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// Qualitative overpressure indicators observed on a shot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PressureSigns {
    pub flattened_primer: bool,
    pub cratered_primer: bool,
    pub ejector_mark: bool,
    pub sticky_bolt: bool,
}

impl PressureSigns {
    pub fn any(&self) -> bool {
        self.flattened_primer || self.cratered_primer || self.ejector_mark || self.sticky_bolt
    }
}

/// Per-shot telemetry stored under a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShotRecord {
    pub id: Uuid,
    pub session_id: Uuid,
    pub shot_number: u32,
    pub velocity_fps: Option<f64>,
    pub pressure: PressureSigns,
}

/// Shot telemetry as captured at the range. Only shots with a velocity are kept.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NewShot {
    pub shot_number: u32,
    pub velocity_fps: Option<f64>,
    pub pressure: PressureSigns,
}

impl NewShot {
    pub fn new(shot_number: u32, velocity_fps: Option<f64>) -> Self {
        Self {
            shot_number,
            velocity_fps,
            pressure: PressureSigns::default(),
        }
    }

    pub fn with_pressure(mut self, pressure: PressureSigns) -> Self {
        self.pressure = pressure;
        self
    }
}

/// A recurring maintenance item on a firearm.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaintenanceTask {
    pub id: Uuid,
    pub firearm_id: Uuid,
    pub name: String,
    pub interval_rounds: Option<u64>,
    pub interval_days: Option<u32>,

    /// Firearm round count when the task was last done
    pub last_round_count: u64,
    pub last_performed: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewMaintenanceTask {
    pub firearm_id: Uuid,
    pub name: String,
    pub interval_rounds: Option<u64>,
    pub interval_days: Option<u32>,
}

/// Integer counters the store adjusts atomically.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Counter {
    /// `quantity_remaining` of a batch; increments never exceed `quantity`
    BatchRemaining(Uuid),
    /// Lifetime `round_count` of a firearm
    FirearmRoundCount(Uuid),
}

impl Counter {
    pub fn target(&self) -> Uuid {
        match self {
            Counter::BatchRemaining(id) | Counter::FirearmRoundCount(id) => *id,
        }
    }
}

impl fmt::Display for Counter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Counter::BatchRemaining(id) => write!(f, "batch {} remaining", id),
            Counter::FirearmRoundCount(id) => write!(f, "firearm {} round count", id),
        }
    }
}

/// Value of a field before and after an atomic adjustment.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Adjustment<T> {
    pub previous: T,
    pub current: T,
}

impl Adjustment<f64> {
    /// Magnitude actually applied, which is less than requested when clamped.
    pub fn applied(&self) -> f64 {
        (self.previous - self.current).abs()
    }
}

impl Adjustment<u64> {
    pub fn applied(&self) -> u64 {
        self.previous.abs_diff(self.current)
    }
}
