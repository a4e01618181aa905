//! Upgrade pacing estimates.
//!
//! Answers "how long does it take to reach level N" for a catalog, so
//! tuning changes can be checked against target pacing in tests. Estimates
//! assume uninterrupted work with no bonuses (no walking, no breaks).

use lab_core::data::{LabCatalog, UpgradeData};
use lab_core::resource::ResourceKind;

/// One row of a pacing table.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PacingRow {
    /// Level being bought (the level reached after paying).
    pub level: u32,
    /// Price of this level.
    pub cost: f64,
    /// Total spent to reach this level from zero.
    pub cumulative_cost: f64,
    /// Seconds of production needed to afford everything up to this level.
    pub seconds_to_reach: f64,
}

/// Base output per second of `workers` unbonused workers on every station
/// producing `kind`.
#[must_use]
pub fn base_rate(catalog: &LabCatalog, kind: ResourceKind, workers: u32) -> f64 {
    catalog
        .stations_for(kind)
        .map(|s| s.base_rate() * f64::from(workers))
        .sum()
}

/// Pacing for one curve at a steady `rate` per second.
///
/// With a zero rate every `seconds_to_reach` is infinite.
#[must_use]
pub fn upgrade_pacing(curve: &UpgradeData, rate: f64) -> Vec<PacingRow> {
    let mut cumulative_cost = 0.0;
    (0..curve.max_level)
        .map(|level| {
            let cost = curve.cost(level);
            cumulative_cost += cost;
            PacingRow {
                level: level + 1,
                cost,
                cumulative_cost,
                seconds_to_reach: if rate > 0.0 { cumulative_cost / rate } else { f64::INFINITY },
            }
        })
        .collect()
}

/// Pacing for every resource with `workers_per_station` on each station.
#[must_use]
pub fn pacing_table(catalog: &LabCatalog, workers_per_station: u32) -> Vec<(ResourceKind, Vec<PacingRow>)> {
    ResourceKind::ALL
        .into_iter()
        .map(|kind| {
            let rate = base_rate(catalog, kind, workers_per_station);
            (kind, upgrade_pacing(catalog.upgrade(kind), rate))
        })
        .collect()
}

/// Seconds until the final level of `kind`, or infinity when unreachable.
#[must_use]
pub fn seconds_to_max(catalog: &LabCatalog, kind: ResourceKind, workers_per_station: u32) -> f64 {
    let rate = base_rate(catalog, kind, workers_per_station);
    upgrade_pacing(catalog.upgrade(kind), rate)
        .last()
        .map_or(0.0, |row| row.seconds_to_reach)
}
