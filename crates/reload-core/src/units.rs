//! Powder mass and cost conversions.
//!
//! Powder stock is stored in the unit it was bought in (pounds or grams)
//! while charge weights are always grains. Consumption and return must go
//! through the same unit or stock drifts, so batches snapshot the unit they
//! consumed with and reversal reads it back from there.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ReloadError;

/// Grains in one avoirdupois pound.
pub const GRAINS_PER_POUND: f64 = 7000.0;

/// Grains in one gram.
pub const GRAINS_PER_GRAM: f64 = 15.432;

/// Unit a powder lot is stocked in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeightUnit {
    Lb,
    G,
}

impl WeightUnit {
    pub fn as_str(&self) -> &'static str {
        match self {
            WeightUnit::Lb => "lb",
            WeightUnit::G => "g",
        }
    }

    /// Grains contained in one stored unit.
    pub fn grains_per_unit(&self) -> f64 {
        match self {
            WeightUnit::Lb => GRAINS_PER_POUND,
            WeightUnit::G => GRAINS_PER_GRAM,
        }
    }
}

impl fmt::Display for WeightUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WeightUnit {
    type Err = ReloadError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "lb" | "lbs" | "pound" | "pounds" => Ok(WeightUnit::Lb),
            "g" | "gram" | "grams" => Ok(WeightUnit::G),
            other => Err(ReloadError::Validation(format!(
                "Unknown weight unit: {} (use lb or g)",
                other
            ))),
        }
    }
}

/// Convert a mass in grains to the stored unit.
pub fn grains_to_stored_mass(grains: f64, unit: WeightUnit) -> f64 {
    grains / unit.grains_per_unit()
}

/// Convert a stored mass back to grains.
pub fn stored_mass_to_grains(mass: f64, unit: WeightUnit) -> f64 {
    mass * unit.grains_per_unit()
}

/// Stored-unit mass consumed by loading `rounds` at `charge_grains` each.
pub fn consume_mass(charge_grains: f64, rounds: u32, unit: WeightUnit) -> f64 {
    grains_to_stored_mass(charge_grains * f64::from(rounds), unit)
}

/// Grains represented by a stored-unit mass being returned to stock.
pub fn return_mass(mass: f64, unit: WeightUnit) -> f64 {
    stored_mass_to_grains(mass, unit)
}

/// Price of a single stored unit, or `None` for degenerate input.
pub fn unit_cost(total_price: f64, quantity: f64) -> Option<f64> {
    if !total_price.is_finite() || !quantity.is_finite() || quantity <= 0.0 {
        return None;
    }
    Some(total_price / quantity)
}

/// Cost of one grain of powder priced per stored unit.
pub fn cost_per_grain(cost_per_unit: f64, unit: WeightUnit) -> f64 {
    cost_per_unit / unit.grains_per_unit()
}
