//! The ledger: one owner's view of an inventory store.
//!
//! Batch production, reversal and firing are implemented as methods on
//! [`Ledger`] in their own modules. This module holds the shared policy and
//! the plain create/delete operations for components and firearms.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{ReloadError, Result};
use crate::quota::{LimitKind, QuotaTable, Tier};
use crate::storage::{Component, Firearm, InventoryStore, NewComponent, NewFirearm, OwnerId};

/// What to do when component stock cannot cover a production run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ShortagePolicy {
    /// Consume what is there and let stock bottom out at zero
    #[default]
    Clamp,
    /// Refuse the run before writing anything
    Reject,
}

impl FromStr for ShortagePolicy {
    type Err = ReloadError;

    fn from_str(value: &str) -> std::result::Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "clamp" => Ok(ShortagePolicy::Clamp),
            "reject" => Ok(ShortagePolicy::Reject),
            other => Err(ReloadError::Config(format!(
                "Unknown shortage policy: {} (use clamp or reject)",
                other
            ))),
        }
    }
}

/// Account settings applied to every action.
#[derive(Debug, Clone, Default)]
pub struct Policy {
    pub tier: Tier,
    pub quotas: QuotaTable,
    pub shortage: ShortagePolicy,
}

impl Policy {
    pub fn ceiling(&self, kind: LimitKind) -> Option<u32> {
        self.quotas.ceiling(self.tier, kind)
    }
}

/// Ledger operations for a single owner.
pub struct Ledger<S> {
    pub(crate) store: S,
    pub(crate) owner: OwnerId,
    pub(crate) policy: Policy,
}

impl<S: InventoryStore> Ledger<S> {
    pub fn new(store: S, owner: impl Into<OwnerId>, policy: Policy) -> Self {
        Self {
            store,
            owner: owner.into(),
            policy,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn policy(&self) -> &Policy {
        &self.policy
    }

    /// Advisory quota check against the current count.
    pub fn can_add(&self, kind: LimitKind) -> Result<bool> {
        let current = self.store.count(&self.owner, kind)?;
        Ok(self.policy.quotas.can_add(current, self.policy.tier, kind))
    }

    /// Fail with `QuotaExceeded` before any write if the owner is at the ceiling.
    pub(crate) fn ensure_capacity(&self, kind: LimitKind) -> Result<()> {
        if let Some(ceiling) = self.policy.ceiling(kind) {
            if !self.can_add(kind)? {
                return Err(ReloadError::QuotaExceeded { kind, ceiling });
            }
        }
        Ok(())
    }

    /// Add a component lot to inventory.
    pub fn add_component(&self, mut component: NewComponent) -> Result<Component> {
        component.owner = self.owner.clone();
        component.validate()?;
        self.ensure_capacity(LimitKind::Components)?;
        let created = self
            .store
            .insert_component(&component, self.policy.ceiling(LimitKind::Components))?;
        tracing::info!(id = %created.id, kind = %created.kind, "component added");
        Ok(created)
    }

    /// Delete a component. Batches that consumed it keep their reference.
    pub fn delete_component(&self, id: &Uuid) -> Result<()> {
        if !self.store.delete_component(&self.owner, id)? {
            return Err(ReloadError::NotFound(format!("component {}", id)));
        }
        tracing::info!(%id, "component deleted");
        Ok(())
    }

    pub fn add_firearm(&self, mut firearm: NewFirearm) -> Result<Firearm> {
        firearm.owner = self.owner.clone();
        self.ensure_capacity(LimitKind::Firearms)?;
        let created = self
            .store
            .insert_firearm(&firearm, self.policy.ceiling(LimitKind::Firearms))?;
        tracing::info!(id = %created.id, name = %created.name, "firearm added");
        Ok(created)
    }

    pub fn delete_firearm(&self, id: &Uuid) -> Result<()> {
        if !self.store.delete_firearm(&self.owner, id)? {
            return Err(ReloadError::NotFound(format!("firearm {}", id)));
        }
        tracing::info!(%id, "firearm deleted");
        Ok(())
    }

    pub(crate) fn require_component(&self, id: &Uuid) -> Result<Component> {
        self.store
            .get_component(&self.owner, id)?
            .ok_or_else(|| ReloadError::NotFound(format!("component {}", id)))
    }

    pub(crate) fn require_firearm(&self, id: &Uuid) -> Result<Firearm> {
        self.store
            .get_firearm(&self.owner, id)?
            .ok_or_else(|| ReloadError::NotFound(format!("firearm {}", id)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quota::TierLimits;
    use crate::storage::{ComponentKind, SqliteStore};

    fn ledger_with_firearm_limit(limit: u32) -> Ledger<SqliteStore> {
        let policy = Policy {
            quotas: QuotaTable {
                free: TierLimits {
                    firearms: Some(limit),
                    ..TierLimits::default()
                },
                ..QuotaTable::default()
            },
            ..Policy::default()
        };
        Ledger::new(SqliteStore::open_in_memory().unwrap(), "shooter", policy)
    }

    #[test]
    fn test_add_firearm_respects_quota() {
        let ledger = ledger_with_firearm_limit(1);
        ledger.add_firearm(NewFirearm::new("ignored", "Rifle")).unwrap();
        let err = ledger.add_firearm(NewFirearm::new("ignored", "Pistol")).unwrap_err();
        assert!(matches!(err, ReloadError::QuotaExceeded { ceiling: 1, .. }));
        assert!(!ledger.can_add(LimitKind::Firearms).unwrap());
    }

    #[test]
    fn test_add_component_forces_ledger_owner() {
        let ledger = ledger_with_firearm_limit(1);
        let component = ledger
            .add_component(NewComponent::new(
                "someone-else",
                ComponentKind::Bullet,
                "Sierra",
                "MatchKing 168",
                100.0,
            ))
            .unwrap();
        assert_eq!(component.owner, "shooter");
    }

    #[test]
    fn test_delete_missing_component_is_not_found() {
        let ledger = ledger_with_firearm_limit(1);
        assert!(matches!(
            ledger.delete_component(&Uuid::new_v4()),
            Err(ReloadError::NotFound(_))
        ));
    }

    #[test]
    fn test_pro_tier_ignores_free_ceiling() {
        let mut ledger = ledger_with_firearm_limit(0);
        ledger.policy.tier = Tier::Pro;
        ledger.add_firearm(NewFirearm::new("x", "Rifle")).unwrap();
    }

    #[test]
    fn test_shortage_policy_parse() {
        assert_eq!("Reject".parse::<ShortagePolicy>().unwrap(), ShortagePolicy::Reject);
        assert!("ignore".parse::<ShortagePolicy>().is_err());
    }
}
