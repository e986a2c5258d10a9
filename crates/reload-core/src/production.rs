//! Batch production.
//!
//! A handload run reads the referenced component lots, prices the batch from
//! their frozen unit costs, takes the stock, and then writes the batch row.
//! The stock writes and the batch insert are separate store calls. When the
//! insert fails the stock already taken is put back by compensating
//! increments; only a failed compensation leaves consumption without a batch.

use uuid::Uuid;

use crate::error::{ReloadError, Result};
use crate::ledger::{Ledger, ShortagePolicy};
use crate::outcome::ActionOutcome;
use crate::quota::LimitKind;
use crate::storage::{
    Adjustment, AmmunitionBatch, AmmunitionType, Component, ComponentKind, ComponentRefs,
    InventoryStore, NewBatch,
};
use crate::units::{consume_mass, cost_per_grain, WeightUnit};

/// Slack for floating point when comparing stock against a requirement.
pub(crate) const STOCK_EPSILON: f64 = 1e-9;

/// What the caller wants produced.
#[derive(Debug, Clone)]
pub struct NewBatchRequest {
    pub batch_number: String,
    pub ammunition_type: AmmunitionType,
    pub quantity: u32,
    pub components: ComponentRefs,
    pub charge_weight_grains: Option<f64>,
    pub caliber: Option<String>,
    pub coal: Option<f64>,
    pub notes: Option<String>,

    /// Purchase price for factory ammunition. Ignored for handloads.
    pub total_cost: Option<f64>,
}

impl NewBatchRequest {
    pub fn handload(batch_number: impl Into<String>, quantity: u32) -> Self {
        Self {
            batch_number: batch_number.into(),
            ammunition_type: AmmunitionType::Handload,
            quantity,
            components: ComponentRefs::default(),
            charge_weight_grains: None,
            caliber: None,
            coal: None,
            notes: None,
            total_cost: None,
        }
    }

    pub fn factory(batch_number: impl Into<String>, quantity: u32, total_cost: Option<f64>) -> Self {
        Self {
            ammunition_type: AmmunitionType::Factory,
            total_cost,
            ..Self::handload(batch_number, quantity)
        }
    }

    pub fn with_primer(mut self, id: Uuid) -> Self {
        self.components.primer = Some(id);
        self
    }

    pub fn with_powder(mut self, id: Uuid, charge_weight_grains: f64) -> Self {
        self.components.powder = Some(id);
        self.charge_weight_grains = Some(charge_weight_grains);
        self
    }

    pub fn with_bullet(mut self, id: Uuid) -> Self {
        self.components.bullet = Some(id);
        self
    }

    pub fn with_brass(mut self, id: Uuid) -> Self {
        self.components.brass = Some(id);
        self
    }

    pub fn with_caliber(mut self, caliber: impl Into<String>) -> Self {
        self.caliber = Some(caliber.into());
        self
    }

    pub fn with_coal(mut self, coal: f64) -> Self {
        self.coal = Some(coal);
        self
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    fn validate(&self) -> Result<()> {
        if self.batch_number.trim().is_empty() {
            return Err(ReloadError::Validation(
                "Batch number cannot be empty".to_string(),
            ));
        }
        if self.quantity == 0 {
            return Err(ReloadError::Validation(
                "Batch quantity must be at least 1".to_string(),
            ));
        }
        match self.ammunition_type {
            AmmunitionType::Factory => {
                if !self.components.is_empty() {
                    return Err(ReloadError::Validation(
                        "Factory ammunition cannot reference components".to_string(),
                    ));
                }
                if let Some(cost) = self.total_cost {
                    if !cost.is_finite() || cost < 0.0 {
                        return Err(ReloadError::Validation(
                            "Total cost must be zero or more".to_string(),
                        ));
                    }
                }
            }
            AmmunitionType::Handload => {
                if let Some(charge) = self.charge_weight_grains {
                    if !charge.is_finite() || charge < 0.0 {
                        return Err(ReloadError::Validation(
                            "Charge weight must be zero or more grains".to_string(),
                        ));
                    }
                }
            }
        }
        Ok(())
    }
}

/// Stored-unit amount of a component consumed by `rounds` rounds.
///
/// Counted kinds use one piece per round. Powder converts the total charge
/// from grains into `powder_unit`; reversal calls this with the unit the
/// batch recorded so both directions agree. `None` means no measurable
/// powder use: the charge or the unit is missing.
pub fn component_amount(
    kind: ComponentKind,
    rounds: u32,
    charge_weight_grains: Option<f64>,
    powder_unit: Option<WeightUnit>,
) -> Option<f64> {
    if kind.is_counted() {
        return Some(f64::from(rounds));
    }
    match (charge_weight_grains, powder_unit) {
        (Some(charge), Some(unit)) => Some(consume_mass(charge, rounds, unit)),
        _ => None,
    }
}

/// Cost contributed by one component to a batch. Missing prices add nothing.
pub fn component_cost(component: &Component, rounds: u32, charge_weight_grains: Option<f64>) -> f64 {
    let Some(cost_per_unit) = component.cost_per_unit else {
        return 0.0;
    };
    if component.kind.is_counted() {
        return cost_per_unit * f64::from(rounds);
    }
    match (component.weight_unit, charge_weight_grains) {
        (Some(unit), Some(charge)) => cost_per_grain(cost_per_unit, unit) * charge * f64::from(rounds),
        _ => 0.0,
    }
}

/// `total_cost / quantity`, or `None` when either side is unusable.
pub fn cost_per_round(total_cost: Option<f64>, quantity: u32) -> Option<f64> {
    match total_cost {
        Some(total) if quantity > 0 => Some(total / f64::from(quantity)),
        _ => None,
    }
}

/// A component lot and the amount a run takes from it.
#[derive(Debug, Clone)]
pub(crate) struct StockDraw {
    pub component: Component,
    pub amount: f64,
}

impl<S: InventoryStore> Ledger<S> {
    /// Produce a batch, consuming component stock for handloads.
    ///
    /// # Errors
    ///
    /// - `ReloadError::Validation` / `NotFound` for a bad request, before any write
    /// - `ReloadError::InsufficientStock` under `ShortagePolicy::Reject`
    /// - `ReloadError::QuotaExceeded` when the batch ceiling is reached
    /// - the insert error, after compensating any stock already taken
    /// - `ReloadError::PartialFailure` if compensation itself failed
    pub fn produce_batch(&self, request: NewBatchRequest) -> Result<ActionOutcome<AmmunitionBatch>> {
        request.validate()?;

        let draws = self.plan_draws(&request.components, request.quantity, request.charge_weight_grains)?;
        if self.policy.shortage == ShortagePolicy::Reject {
            check_stock(&draws)?;
        }
        self.ensure_capacity(LimitKind::Batches)?;

        let total_cost = match request.ammunition_type {
            AmmunitionType::Factory => request.total_cost,
            AmmunitionType::Handload => Some(
                draws
                    .iter()
                    .map(|draw| component_cost(&draw.component, request.quantity, request.charge_weight_grains))
                    .sum(),
            ),
        };
        let powder_weight_unit = draws
            .iter()
            .find(|draw| draw.component.kind == ComponentKind::Powder)
            .and_then(|draw| draw.component.weight_unit);

        let taken = self.take_stock(&draws)?;

        let new_batch = NewBatch {
            owner: self.owner.clone(),
            batch_number: request.batch_number.trim().to_string(),
            ammunition_type: request.ammunition_type,
            quantity: request.quantity,
            components: request.components,
            charge_weight_grains: request.charge_weight_grains,
            powder_weight_unit,
            caliber: request.caliber,
            coal: request.coal,
            notes: request.notes,
            total_cost,
            cost_per_round: cost_per_round(total_cost, request.quantity),
        };

        match self
            .store
            .insert_batch(&new_batch, self.policy.ceiling(LimitKind::Batches))
        {
            Ok(batch) => {
                tracing::info!(
                    id = %batch.id,
                    batch_number = %batch.batch_number,
                    quantity = batch.quantity,
                    "batch produced"
                );
                Ok(ActionOutcome::new(batch))
            }
            Err(err) => {
                tracing::error!(error = %err, "batch insert failed, returning consumed stock");
                Err(self.restore_stock(&taken, err))
            }
        }
    }

    /// Resolve referenced components and the stock each one gives up.
    pub(crate) fn plan_draws(
        &self,
        refs: &ComponentRefs,
        rounds: u32,
        charge_weight_grains: Option<f64>,
    ) -> Result<Vec<StockDraw>> {
        let mut draws = Vec::new();
        for (slot, id) in refs.iter() {
            let component = self.require_component(&id)?;
            if component.kind != slot {
                return Err(ReloadError::Validation(format!(
                    "Component {} is a {}, not a {}",
                    id, component.kind, slot
                )));
            }
            let Some(amount) = component_amount(slot, rounds, charge_weight_grains, component.weight_unit)
            else {
                tracing::debug!(component = %id, "no charge weight or unit recorded, powder stock untouched");
                continue;
            };
            draws.push(StockDraw { component, amount });
        }
        Ok(draws)
    }

    /// Decrement each draw. Stops at the first failure and puts back what was taken.
    pub(crate) fn take_stock(&self, draws: &[StockDraw]) -> Result<Vec<(Uuid, Adjustment<f64>)>> {
        let mut taken = Vec::with_capacity(draws.len());
        for draw in draws {
            let id = draw.component.id;
            match self
                .store
                .decrement_stock_with_floor(&self.owner, &id, draw.amount)
            {
                Ok(adjustment) => {
                    if adjustment.applied() + STOCK_EPSILON < draw.amount {
                        tracing::warn!(
                            component = %id,
                            needed = draw.amount,
                            available = adjustment.previous,
                            "stock shortfall absorbed, quantity clamped at zero"
                        );
                    }
                    taken.push((id, adjustment));
                }
                Err(err) => {
                    tracing::error!(component = %id, error = %err, "stock decrement failed");
                    return Err(self.restore_stock(&taken, err));
                }
            }
        }
        Ok(taken)
    }

    /// Put back stock taken earlier in a failed action and return the error to report.
    fn restore_stock(&self, taken: &[(Uuid, Adjustment<f64>)], cause: ReloadError) -> ReloadError {
        let mut stranded = Vec::new();
        for (id, adjustment) in taken {
            if let Err(err) = self
                .store
                .increment_stock(&self.owner, id, adjustment.applied())
            {
                tracing::error!(component = %id, error = %err, "compensating increment failed");
                stranded.push(*id);
            }
        }
        if stranded.is_empty() {
            cause
        } else {
            ReloadError::PartialFailure {
                message: cause.to_string(),
                stranded,
            }
        }
    }
}

/// Reject draws the current stock cannot cover.
pub(crate) fn check_stock(draws: &[StockDraw]) -> Result<()> {
    for draw in draws {
        if draw.component.quantity + STOCK_EPSILON < draw.amount {
            return Err(ReloadError::InsufficientStock {
                component: draw.component.id,
                needed: draw.amount,
                available: draw.component.quantity,
            });
        }
    }
    Ok(())
}
