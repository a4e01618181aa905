//! Upgrade economy: spend resources on permanent per-resource levels.
//!
//! Purchases are all-or-nothing. A failed purchase leaves the ledger
//! untouched and reports why.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::data::LabCatalog;
use crate::ledger::Ledger;
use crate::resource::ResourceKind;

/// Why an upgrade purchase was refused.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum UpgradeError {
    /// The resource is already at its highest level.
    #[error("{resource} is already at max level {level}")]
    MaxLevel {
        /// Resource whose upgrade was requested.
        resource: ResourceKind,
        /// Current (maximum) level.
        level: u32,
    },

    /// The balance does not cover the price.
    #[error("{resource} upgrade costs {required} but only {available} is banked")]
    InsufficientFunds {
        /// Resource whose upgrade was requested.
        resource: ResourceKind,
        /// Price of the next level.
        required: f64,
        /// Current balance.
        available: f64,
    },
}

/// A completed purchase.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct UpgradeReceipt {
    /// Resource upgraded.
    pub resource: ResourceKind,
    /// Amount debited.
    pub cost: f64,
    /// Level after the purchase.
    pub new_level: u32,
}

/// Price of the next level of `resource` at the ledger's current level.
///
/// Still returns the formula price when the level is maxed; use
/// [`can_upgrade`] to check purchasability.
#[must_use]
pub fn next_cost(ledger: &Ledger, catalog: &LabCatalog, resource: ResourceKind) -> f64 {
    catalog.upgrade(resource).cost(ledger.level(resource))
}

/// Check a purchase without performing it.
pub fn can_upgrade(
    ledger: &Ledger,
    catalog: &LabCatalog,
    resource: ResourceKind,
) -> Result<f64, UpgradeError> {
    let curve = catalog.upgrade(resource);
    let level = ledger.level(resource);
    if curve.is_maxed(level) {
        return Err(UpgradeError::MaxLevel { resource, level });
    }

    let cost = curve.cost(level);
    let available = ledger.balance(resource);
    // NaN or infinite prices are never affordable
    if !cost.is_finite() || available < cost {
        return Err(UpgradeError::InsufficientFunds {
            resource,
            required: cost,
            available,
        });
    }

    Ok(cost)
}

/// Buy one level of `resource`: debit the cost and bump the level.
pub fn purchase_upgrade(
    ledger: &mut Ledger,
    catalog: &LabCatalog,
    resource: ResourceKind,
) -> Result<UpgradeReceipt, UpgradeError> {
    let cost = can_upgrade(ledger, catalog, resource)?;
    let new_level = ledger.level(resource) + 1;

    ledger.debit(resource, cost);
    ledger.set_level(resource, new_level);

    tracing::info!(%resource, cost, new_level, "Purchased upgrade");

    Ok(UpgradeReceipt {
        resource,
        cost,
        new_level,
    })
}
