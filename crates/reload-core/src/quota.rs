//! Subscription tier ceilings.
//!
//! [`can_add`] is the advisory check callers run before prompting for input.
//! The store repeats the same comparison inside its guarded inserts, so a
//! stale count here can at worst produce a late `QuotaExceeded`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ReloadError;

/// Subscription tier supplied by the account collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    #[default]
    Free,
    Pro,
}

impl FromStr for Tier {
    type Err = ReloadError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "free" => Ok(Tier::Free),
            "pro" => Ok(Tier::Pro),
            other => Err(ReloadError::Config(format!("Unknown tier: {}", other))),
        }
    }
}

/// Entity kinds a tier can cap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LimitKind {
    Firearms,
    Components,
    Batches,
    Sessions,
}

impl LimitKind {
    /// Also the name of the store table holding rows of this kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            LimitKind::Firearms => "firearms",
            LimitKind::Components => "components",
            LimitKind::Batches => "batches",
            LimitKind::Sessions => "sessions",
        }
    }
}

impl fmt::Display for LimitKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-kind ceilings for the constrained tier. `None` means unbounded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TierLimits {
    pub firearms: Option<u32>,
    pub components: Option<u32>,
    pub batches: Option<u32>,
    pub sessions: Option<u32>,
}

impl Default for TierLimits {
    fn default() -> Self {
        Self {
            firearms: Some(3),
            components: Some(25),
            batches: Some(50),
            sessions: Some(100),
        }
    }
}

impl TierLimits {
    pub fn unbounded() -> Self {
        Self {
            firearms: None,
            components: None,
            batches: None,
            sessions: None,
        }
    }

    pub fn get(&self, kind: LimitKind) -> Option<u32> {
        match kind {
            LimitKind::Firearms => self.firearms,
            LimitKind::Components => self.components,
            LimitKind::Batches => self.batches,
            LimitKind::Sessions => self.sessions,
        }
    }
}

/// Ceiling lookup across tiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuotaTable {
    #[serde(default)]
    pub free: TierLimits,
    #[serde(default = "TierLimits::unbounded")]
    pub pro: TierLimits,
}

impl Default for QuotaTable {
    fn default() -> Self {
        Self {
            free: TierLimits::default(),
            pro: TierLimits::unbounded(),
        }
    }
}

impl QuotaTable {
    pub fn ceiling(&self, tier: Tier, kind: LimitKind) -> Option<u32> {
        match tier {
            Tier::Free => self.free.get(kind),
            Tier::Pro => self.pro.get(kind),
        }
    }

    pub fn can_add(&self, current: u32, tier: Tier, kind: LimitKind) -> bool {
        can_add(current, self.ceiling(tier, kind))
    }
}

/// `current < ceiling`, always true when unbounded.
pub fn can_add(current: u32, ceiling: Option<u32>) -> bool {
    match ceiling {
        Some(limit) => current < limit,
        None => true,
    }
}
