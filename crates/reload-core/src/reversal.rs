//! Batch deletion and editing.
//!
//! Deleting a handload batch can hand its components back to stock. The
//! return is computed from the batch's production `quantity`, not from what
//! is left unfired, so a batch that was partly shot returns more than
//! physically remains. Deletion treats the batch as if it never existed.

use uuid::Uuid;

use crate::error::{ReloadError, Result};
use crate::ledger::{Ledger, ShortagePolicy};
use crate::outcome::{ActionOutcome, Step, WarningLog};
use crate::production::{check_stock, component_amount, cost_per_round};
use crate::storage::{AmmunitionBatch, AmmunitionType, BatchUpdate, InventoryStore};

/// Owner edits to a batch. `None` leaves a field unchanged.
#[derive(Debug, Clone, Default)]
pub struct BatchEdit {
    pub batch_number: Option<String>,
    pub caliber: Option<String>,
    pub coal: Option<f64>,
    pub notes: Option<String>,
    pub quantity: Option<u32>,
    pub total_cost: Option<f64>,
}

impl<S: InventoryStore> Ledger<S> {
    fn require_batch(&self, id: &Uuid) -> Result<AmmunitionBatch> {
        self.store
            .get_batch(&self.owner, id)?
            .ok_or_else(|| ReloadError::NotFound(format!("batch {}", id)))
    }

    /// Delete a batch, optionally returning its components to stock.
    ///
    /// Components deleted since production are skipped with a warning. If
    /// the batch row cannot be deleted, any stock already returned is taken
    /// back before the error is reported.
    pub fn delete_batch(
        &self,
        id: &Uuid,
        return_components: bool,
    ) -> Result<ActionOutcome<AmmunitionBatch>> {
        let batch = self.require_batch(id)?;
        let mut warnings = WarningLog::default();
        let mut returned = Vec::new();

        if return_components && batch.ammunition_type == AmmunitionType::Handload {
            for (kind, component_id) in batch.components.iter() {
                let Some(amount) = component_amount(
                    kind,
                    batch.quantity,
                    batch.charge_weight_grains,
                    batch.powder_weight_unit,
                ) else {
                    if batch.charge_weight_grains.is_some() {
                        warnings.push(
                            Step::ReturnComponent,
                            format!("powder {} has no recorded unit, skipped", component_id),
                        );
                    }
                    continue;
                };
                match self.store.increment_stock(&self.owner, &component_id, amount) {
                    Ok(adjustment) => returned.push((component_id, adjustment)),
                    Err(ReloadError::NotFound(_)) => warnings.push(
                        Step::ReturnComponent,
                        format!("{} {} no longer exists, skipped", kind, component_id),
                    ),
                    Err(err) => warnings.push(
                        Step::ReturnComponent,
                        format!("{} {}: {}", kind, component_id, err),
                    ),
                }
            }
        }

        let deleted = self.store.delete_batch(&self.owner, id);
        let failure = match deleted {
            Ok(true) => None,
            Ok(false) => Some(ReloadError::NotFound(format!("batch {}", id))),
            Err(err) => Some(err),
        };
        if let Some(cause) = failure {
            let mut stranded = Vec::new();
            for (component_id, adjustment) in &returned {
                if let Err(err) = self.store.decrement_stock_with_floor(
                    &self.owner,
                    component_id,
                    adjustment.applied(),
                ) {
                    tracing::error!(component = %component_id, error = %err, "could not take back returned stock");
                    stranded.push(*component_id);
                }
            }
            return Err(if stranded.is_empty() {
                cause
            } else {
                ReloadError::PartialFailure {
                    message: cause.to_string(),
                    stranded,
                }
            });
        }

        tracing::info!(
            %id,
            returned = returned.len(),
            "batch deleted"
        );
        Ok(warnings.finish(batch))
    }

    /// Edit a batch.
    ///
    /// Cost per round is recomputed only when `quantity` or `total_cost` is
    /// edited. A quantity change shifts `quantity_remaining` by the same
    /// amount, kept within `0..=quantity`; the store applies the shift to the
    /// current row, so rounds reserved by a concurrent firing stay taken. Stock is touched only when
    /// `adjust_stock` is set on a handload batch: a smaller batch returns the
    /// difference, a larger one consumes it.
    pub fn edit_batch(
        &self,
        id: &Uuid,
        edit: BatchEdit,
        adjust_stock: bool,
    ) -> Result<ActionOutcome<AmmunitionBatch>> {
        let batch = self.require_batch(id)?;

        let mut update = BatchUpdate::default();
        if let Some(batch_number) = edit.batch_number {
            if batch_number.trim().is_empty() {
                return Err(ReloadError::Validation(
                    "Batch number cannot be empty".to_string(),
                ));
            }
            update.batch_number = Some(batch_number.trim().to_string());
        }
        if let Some(caliber) = edit.caliber {
            update.caliber = Some(Some(caliber));
        }
        if let Some(coal) = edit.coal {
            update.coal = Some(Some(coal));
        }
        if let Some(notes) = edit.notes {
            update.notes = Some(Some(notes));
        }
        if let Some(total_cost) = edit.total_cost {
            if !total_cost.is_finite() || total_cost < 0.0 {
                return Err(ReloadError::Validation(
                    "Total cost must be zero or more".to_string(),
                ));
            }
            update.total_cost = Some(Some(total_cost));
        }

        let quantity = edit.quantity.unwrap_or(batch.quantity);
        if quantity == 0 {
            return Err(ReloadError::Validation(
                "Batch quantity must be at least 1".to_string(),
            ));
        }
        let delta = i64::from(quantity) - i64::from(batch.quantity);
        if delta != 0 {
            update.quantity = Some(quantity);
        }
        if edit.quantity.is_some() || edit.total_cost.is_some() {
            let total = edit.total_cost.or(batch.total_cost);
            update.cost_per_round = Some(cost_per_round(total, quantity));
        }

        let restock = adjust_stock && delta != 0 && batch.ammunition_type == AmmunitionType::Handload;
        let rounds = u32::try_from(delta.unsigned_abs()).unwrap_or(u32::MAX);
        if restock && delta > 0 && self.policy.shortage == ShortagePolicy::Reject {
            let draws = self.plan_draws(&batch.components, rounds, batch.charge_weight_grains)?;
            check_stock(&draws)?;
        }

        let updated = if update.is_empty() {
            batch.clone()
        } else {
            self.store.update_batch(&self.owner, id, &update)?
        };

        let mut warnings = WarningLog::default();
        if restock {
            for (kind, component_id) in batch.components.iter() {
                let Some(amount) = component_amount(
                    kind,
                    rounds,
                    batch.charge_weight_grains,
                    batch.powder_weight_unit,
                ) else {
                    continue;
                };
                let (step, result) = if delta < 0 {
                    (
                        Step::ReturnComponent,
                        self.store.increment_stock(&self.owner, &component_id, amount),
                    )
                } else {
                    (
                        Step::ConsumeComponent,
                        self.store
                            .decrement_stock_with_floor(&self.owner, &component_id, amount),
                    )
                };
                if let Err(err) = result {
                    warnings.push(step, format!("{} {}: {}", kind, component_id, err));
                }
            }
        }

        tracing::info!(%id, quantity = updated.quantity, "batch edited");
        Ok(warnings.finish(updated))
    }
}
