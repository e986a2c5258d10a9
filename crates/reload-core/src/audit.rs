//! Cross-table consistency scan.
//!
//! Nothing here repairs data. The scan reports references left dangling by
//! deletions and components at or under their low-stock threshold.

use serde::Serialize;
use uuid::Uuid;

use crate::error::Result;
use crate::ledger::Ledger;
use crate::storage::{BatchFilter, ComponentFilter, InventoryStore, SessionFilter};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FindingKind {
    /// Batch refers to a component that was deleted
    DanglingComponent,
    /// Session refers to a firearm that was deleted
    DanglingFirearm,
    /// Session refers to a batch that was deleted
    DanglingBatch,
    LowStock,
}

impl FindingKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FindingKind::DanglingComponent => "dangling component",
            FindingKind::DanglingFirearm => "dangling firearm",
            FindingKind::DanglingBatch => "dangling batch",
            FindingKind::LowStock => "low stock",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Finding {
    pub kind: FindingKind,
    pub subject: Uuid,
    pub detail: String,
}

impl<S: InventoryStore> Ledger<S> {
    pub fn audit(&self) -> Result<Vec<Finding>> {
        let mut findings = Vec::new();

        let components = self.store.list_components(&self.owner, &ComponentFilter::new())?;
        for component in components.iter().filter(|c| c.is_low_stock()) {
            findings.push(Finding {
                kind: FindingKind::LowStock,
                subject: component.id,
                detail: format!(
                    "{} {} at {} (threshold {})",
                    component.kind,
                    component.display_name(),
                    component.quantity,
                    component.low_stock_threshold.unwrap_or_default()
                ),
            });
        }

        let batches = self.store.list_batches(&self.owner, &BatchFilter::new())?;
        for batch in &batches {
            for (kind, id) in batch.components.iter() {
                if !components.iter().any(|c| c.id == id) {
                    findings.push(Finding {
                        kind: FindingKind::DanglingComponent,
                        subject: batch.id,
                        detail: format!("batch {} references deleted {} {}", batch.batch_number, kind, id),
                    });
                }
            }
        }

        let firearms = self.store.list_firearms(&self.owner)?;
        for session in self.store.list_sessions(&self.owner, &SessionFilter::new())? {
            if !firearms.iter().any(|f| f.id == session.firearm_id) {
                findings.push(Finding {
                    kind: FindingKind::DanglingFirearm,
                    subject: session.id,
                    detail: format!("session references deleted firearm {}", session.firearm_id),
                });
            }
            if let Some(batch_id) = session.ammunition_batch_id {
                if !batches.iter().any(|b| b.id == batch_id) {
                    findings.push(Finding {
                        kind: FindingKind::DanglingBatch,
                        subject: session.id,
                        detail: format!("session references deleted batch {}", batch_id),
                    });
                }
            }
        }

        Ok(findings)
    }
}
