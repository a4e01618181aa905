//! The ledger: everything about a lab that changes and gets saved.
//!
//! Balances and levels have crate-private mutators so only production,
//! offline catch-up and the upgrade economy can move them. The roster is
//! reached through the lab facade.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::data::LabCatalog;
use crate::resource::{ResourceKind, ResourceMap};
use crate::worker::{WorkerRoster, WorkerState};

/// Persistent lab state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ledger {
    balances: ResourceMap<f64>,
    levels: ResourceMap<u32>,
    roster: WorkerRoster,
    last_sync_at: DateTime<Utc>,
}

impl Ledger {
    /// A fresh ledger with the catalog's starting roster.
    #[must_use]
    pub fn new(catalog: &LabCatalog, now: DateTime<Utc>) -> Self {
        Self {
            roster: WorkerRoster::starting(catalog),
            ..Self::empty(now)
        }
    }

    /// A ledger with nothing in it.
    #[must_use]
    pub fn empty(now: DateTime<Utc>) -> Self {
        Self {
            balances: ResourceMap::splat(0.0),
            levels: ResourceMap::splat(0),
            roster: WorkerRoster::new(),
            last_sync_at: now,
        }
    }

    /// All balances.
    #[must_use]
    pub const fn balances(&self) -> &ResourceMap<f64> {
        &self.balances
    }

    /// Balance of one resource.
    #[must_use]
    pub fn balance(&self, kind: ResourceKind) -> f64 {
        self.balances[kind]
    }

    /// All upgrade levels.
    #[must_use]
    pub const fn levels(&self) -> &ResourceMap<u32> {
        &self.levels
    }

    /// Upgrade level of one resource.
    #[must_use]
    pub fn level(&self, kind: ResourceKind) -> u32 {
        self.levels[kind]
    }

    /// The workers.
    #[must_use]
    pub const fn roster(&self) -> &WorkerRoster {
        &self.roster
    }

    pub(crate) fn roster_mut(&mut self) -> &mut WorkerRoster {
        &mut self.roster
    }

    /// Split borrow for the per-tick systems.
    pub(crate) fn production_parts(&mut self) -> (&mut WorkerRoster, &mut ResourceMap<f64>) {
        (&mut self.roster, &mut self.balances)
    }

    /// When the ledger was last reconciled with the wall clock.
    #[must_use]
    pub const fn last_sync_at(&self) -> DateTime<Utc> {
        self.last_sync_at
    }

    pub(crate) fn set_last_sync_at(&mut self, at: DateTime<Utc>) {
        self.last_sync_at = at;
    }

    /// Add to a balance. Non-finite or negative amounts are ignored.
    pub(crate) fn credit(&mut self, kind: ResourceKind, amount: f64) {
        if amount.is_finite() && amount > 0.0 {
            self.balances[kind] += amount;
        }
    }

    /// Subtract from a balance, flooring at zero.
    pub(crate) fn debit(&mut self, kind: ResourceKind, amount: f64) {
        if amount.is_finite() && amount > 0.0 {
            self.balances[kind] = (self.balances[kind] - amount).max(0.0);
        }
    }

    pub(crate) fn set_level(&mut self, kind: ResourceKind, level: u32) {
        self.levels[kind] = level;
    }

    /// Deterministic digest of the ledger, for replay and determinism checks.
    #[must_use]
    pub fn state_hash(&self) -> u64 {
        let mut hasher = DefaultHasher::new();

        for (kind, balance) in self.balances.iter() {
            kind.hash(&mut hasher);
            balance.to_bits().hash(&mut hasher);
        }
        for (_, level) in self.levels.iter() {
            level.hash(&mut hasher);
        }

        self.roster.len().hash(&mut hasher);
        self.roster.next_id().hash(&mut hasher);
        for worker in self.roster.iter() {
            worker.id.hash(&mut hasher);
            worker.shape.hash(&mut hasher);
            worker.assigned_station.hash(&mut hasher);
            worker.state.hash(&mut hasher);
            worker.work_progress.to_bits().hash(&mut hasher);
            worker.position.x.to_bits().hash(&mut hasher);
            worker.position.y.to_bits().hash(&mut hasher);
            worker.cycles_until_break.hash(&mut hasher);
            worker.break_remaining.to_bits().hash(&mut hasher);
        }

        self.last_sync_at.hash(&mut hasher);

        hasher.finish()
    }

    /// Repair a ledger loaded from storage against `catalog`.
    ///
    /// Negative or non-finite balances become 0, levels are clamped to each
    /// curve's cap, assignments to unknown stations are dropped, broken
    /// progress and positions are reset and the id counter is moved past
    /// every existing id. Returns whether anything changed.
    pub fn sanitize(&mut self, catalog: &LabCatalog) -> bool {
        let mut changed = false;

        for kind in ResourceKind::ALL {
            let balance = self.balances[kind];
            if !balance.is_finite() || balance < 0.0 {
                tracing::warn!(%kind, balance, "Resetting invalid balance");
                self.balances[kind] = 0.0;
                changed = true;
            }
            let max = catalog.upgrade(kind).max_level;
            if self.levels[kind] > max {
                tracing::warn!(%kind, level = self.levels[kind], max, "Clamping upgrade level");
                self.levels[kind] = max;
                changed = true;
            }
        }

        for worker in self.roster.iter_mut() {
            let resolves = worker
                .assigned_station
                .as_ref()
                .is_some_and(|id| catalog.station(id).is_some());
            if worker.assigned_station.is_some() && !resolves {
                tracing::warn!(worker = %worker.id, "Dropping assignment to unknown station");
                worker.reassign(None);
                changed = true;
            }
            if worker.assigned_station.is_none() && worker.state != WorkerState::Idle {
                worker.state = WorkerState::Idle;
                changed = true;
            }
            if !worker.work_progress.is_finite() || !(0.0..1.0).contains(&worker.work_progress) {
                worker.work_progress = 0.0;
                changed = true;
            }
            if !worker.break_remaining.is_finite() || worker.break_remaining < 0.0 {
                worker.break_remaining = 0.0;
                changed = true;
            }
            if !worker.next_wander_in.is_finite() || worker.next_wander_in < 0.0 {
                worker.next_wander_in = 0.0;
                changed = true;
            }
            if !worker.position.is_finite() {
                worker.position = catalog.rest_area;
                changed = true;
            }
            if !worker.rest_position.is_finite() {
                worker.rest_position = catalog.rest_area;
                changed = true;
            }
            if worker.wander_target.is_some_and(|t| !t.is_finite()) {
                worker.wander_target = None;
                changed = true;
            }
        }

        if self.roster.repair_id_counter() {
            tracing::warn!(next_id = self.roster.next_id(), "Repaired worker id counter");
            changed = true;
        }

        changed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::StationId;
    use crate::worker::WorkerId;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 5, 4, 9, 30, 0).single().expect("valid date")
    }

    #[test]
    fn test_new_ledger_is_zeroed_with_starting_roster() {
        let catalog = LabCatalog::standard();
        let ledger = Ledger::new(&catalog, now());

        assert!(ledger.balances().total().abs() < f64::EPSILON);
        assert!(ledger.levels().iter().all(|(_, level)| level == 0));
        assert_eq!(ledger.roster().len(), catalog.starting_roster.len());
        assert_eq!(ledger.last_sync_at(), now());
    }

    #[test]
    fn test_credit_and_debit_guard_values() {
        let mut ledger = Ledger::empty(now());
        ledger.credit(ResourceKind::Gravity, 100.0);
        ledger.credit(ResourceKind::Gravity, -50.0);
        ledger.credit(ResourceKind::Gravity, f64::NAN);
        assert!((ledger.balance(ResourceKind::Gravity) - 100.0).abs() < f64::EPSILON);

        ledger.debit(ResourceKind::Gravity, 250.0);
        assert!(ledger.balance(ResourceKind::Gravity).abs() < f64::EPSILON);
    }

    #[test]
    fn test_state_hash_tracks_changes() {
        let catalog = LabCatalog::standard();
        let a = Ledger::new(&catalog, now());
        let mut b = a.clone();
        assert_eq!(a.state_hash(), b.state_hash());

        b.credit(ResourceKind::Momentum, 1.0);
        assert_ne!(a.state_hash(), b.state_hash());
    }

    #[test]
    fn test_sanitize_repairs_corrupt_state() {
        let catalog = LabCatalog::standard();
        let mut ledger = Ledger::new(&catalog, now());
        ledger.balances[ResourceKind::Gravity] = -10.0;
        ledger.balances[ResourceKind::Momentum] = f64::INFINITY;
        ledger.levels[ResourceKind::Thermodynamics] = 99;
        {
            let worker = ledger.roster.get_mut(WorkerId(1)).expect("worker exists");
            worker.assigned_station = Some(StationId::new("demolished-lab"));
            worker.state = WorkerState::Working;
            worker.work_progress = 7.5;
        }

        assert!(ledger.sanitize(&catalog));

        assert!(ledger.balance(ResourceKind::Gravity).abs() < f64::EPSILON);
        assert!(ledger.balance(ResourceKind::Momentum).abs() < f64::EPSILON);
        assert_eq!(ledger.level(ResourceKind::Thermodynamics), 15);
        let worker = ledger.roster().get(WorkerId(1)).expect("worker exists");
        assert_eq!(worker.assigned_station, None);
        assert_eq!(worker.state, WorkerState::Idle);
        assert!(worker.work_progress.abs() < f64::EPSILON);

        // Second pass has nothing left to fix
        assert!(!ledger.sanitize(&catalog));
    }
}
