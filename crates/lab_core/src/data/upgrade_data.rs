//! Upgrade cost and effect curves.

use serde::{Deserialize, Serialize};

/// Cost/effect curve for one resource's permanent upgrade.
///
/// Cost grows geometrically, effect grows linearly:
///
/// - `cost(level) = floor(base_cost * cost_multiplier^level)`
/// - `effect(level) = level * effect_per_level`
///
/// # Example RON
///
/// ```ron
/// UpgradeData(
///     base_cost: 1000.0,
///     cost_multiplier: 1.35,
///     effect_per_level: 0.05,
///     max_level: 20,
/// )
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct UpgradeData {
    /// Cost of the first level.
    pub base_cost: f64,
    /// Geometric growth per level. Must be greater than 1.
    pub cost_multiplier: f64,
    /// Additive effect granted by each level.
    pub effect_per_level: f64,
    /// Highest purchasable level.
    pub max_level: u32,
}

impl UpgradeData {
    /// Create a new upgrade curve.
    #[must_use]
    pub const fn new(
        base_cost: f64,
        cost_multiplier: f64,
        effect_per_level: f64,
        max_level: u32,
    ) -> Self {
        Self {
            base_cost,
            cost_multiplier,
            effect_per_level,
            max_level,
        }
    }

    /// Price of buying the level after `level`.
    #[must_use]
    pub fn cost(&self, level: u32) -> f64 {
        let exponent = i32::try_from(level).unwrap_or(i32::MAX);
        (self.base_cost * self.cost_multiplier.powi(exponent)).floor()
    }

    /// Total effect at `level`.
    #[must_use]
    pub fn effect(&self, level: u32) -> f64 {
        f64::from(level) * self.effect_per_level
    }

    /// Whether `level` is already the cap.
    #[must_use]
    pub const fn is_maxed(&self, level: u32) -> bool {
        level >= self.max_level
    }

    /// Sum of costs to go from `from` to `to` (exclusive of `to`).
    #[must_use]
    pub fn cumulative_cost(&self, from: u32, to: u32) -> f64 {
        (from..to.min(self.max_level)).map(|level| self.cost(level)).sum()
    }

    /// Check the curve for values that would break the economy.
    ///
    /// Requiring `base_cost * (cost_multiplier - 1) >= 1` makes consecutive
    /// unfloored costs differ by at least one unit, so floored costs are
    /// strictly increasing.
    #[must_use]
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if !self.base_cost.is_finite() || self.base_cost <= 0.0 {
            errors.push(format!("base_cost must be positive, got {}", self.base_cost));
        }
        if !self.cost_multiplier.is_finite() || self.cost_multiplier <= 1.0 {
            errors.push(format!(
                "cost_multiplier must be greater than 1, got {}",
                self.cost_multiplier
            ));
        } else if self.base_cost * (self.cost_multiplier - 1.0) < 1.0 {
            errors.push(format!(
                "base_cost {} with cost_multiplier {} does not grow by a full unit per level",
                self.base_cost, self.cost_multiplier
            ));
        }
        if !self.effect_per_level.is_finite() || self.effect_per_level < 0.0 {
            errors.push(format!(
                "effect_per_level must be non-negative, got {}",
                self.effect_per_level
            ));
        }

        errors
    }
}

impl Default for UpgradeData {
    fn default() -> Self {
        Self::new(1000.0, 1.35, 0.05, 20)
    }
}
