//! The research lab facade.
//!
//! [`ResearchLab`] owns the catalog, the ledger, the store and the random
//! source, and is the only thing hosts talk to. Every mutation takes
//! `&mut self`, so there is exactly one writer; a threaded host wraps the
//! whole lab in a single `Mutex`.
//!
//! # Lifecycle
//!
//! ```text
//! open ──▶ activate(now) ──▶ tick(dt)* ──▶ suspend(now) ──▶ activate(now) ...
//! ```
//!
//! `activate` runs offline catch-up for the time since the last sync.
//! While active, each tick advances the sync point by its `dt`, and
//! `suspend` stamps it with the wall clock. Ticks while suspended are
//! ignored so time is never credited twice.

use chrono::{DateTime, Utc};
use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro256PlusPlus;

use crate::behavior::{behavior_system, BehaviorEvent};
use crate::data::LabCatalog;
use crate::error::Result;
use crate::ledger::Ledger;
use crate::offline::{offline_catch_up, OfflineReport};
use crate::persistence::{load_or_default, LedgerStore};
use crate::production::{production_rates, production_system, ProductionEvent};
use crate::resource::{ResourceKind, ResourceMap};
use crate::stats::{project_stats, AppliedStats};
use crate::upgrades::{can_upgrade, next_cost, purchase_upgrade, UpgradeError, UpgradeReceipt};
use crate::worker::{WorkerId, WorkerShape};

/// Default random source for worker behavior.
pub type LabRng = Xoshiro256PlusPlus;

/// Seconds of ticking between autosaves.
pub const DEFAULT_AUTOSAVE_INTERVAL_SECS: f64 = 30.0;

/// Build the default generator from a seed.
#[must_use]
pub fn seeded_rng(seed: u64) -> LabRng {
    LabRng::seed_from_u64(seed)
}

/// Events generated during a single tick.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickEvents {
    /// Worker state transitions.
    pub behavior: Vec<BehaviorEvent>,
    /// Completed production cycles.
    pub production: Vec<ProductionEvent>,
}

impl TickEvents {
    /// Whether nothing happened.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.behavior.is_empty() && self.production.is_empty()
    }

    /// Total produced this tick for one resource.
    #[must_use]
    pub fn produced(&self, kind: ResourceKind) -> f64 {
        self.production
            .iter()
            .filter(|e| e.resource == kind)
            .map(|e| e.amount)
            .sum()
    }
}

/// A running research lab.
pub struct ResearchLab<S: LedgerStore, R: Rng = LabRng> {
    catalog: LabCatalog,
    ledger: Ledger,
    store: S,
    rng: R,
    active: bool,
    tick: u64,
    autosave_interval: f64,
    since_save: f64,
}

impl<S: LedgerStore> ResearchLab<S> {
    /// Open a lab from `store`, seeding the default generator.
    ///
    /// The lab starts suspended; call [`Self::activate`] before ticking.
    pub fn open(catalog: LabCatalog, store: S, now: DateTime<Utc>, seed: u64) -> Self {
        Self::open_with_rng(catalog, store, now, seeded_rng(seed))
    }
}

impl<S: LedgerStore, R: Rng> ResearchLab<S, R> {
    /// Open a lab from `store` with a caller-supplied generator.
    ///
    /// Missing, corrupt or incompatible saves fall back to a fresh ledger.
    pub fn open_with_rng(catalog: LabCatalog, store: S, now: DateTime<Utc>, rng: R) -> Self {
        let ledger = load_or_default(&store, &catalog, now);
        Self::from_parts(catalog, ledger, store, rng)
    }

    /// Assemble a lab around an existing ledger.
    ///
    /// The ledger is sanitized against `catalog` first.
    pub fn from_parts(catalog: LabCatalog, mut ledger: Ledger, store: S, rng: R) -> Self {
        ledger.sanitize(&catalog);
        Self {
            catalog,
            ledger,
            store,
            rng,
            active: false,
            tick: 0,
            autosave_interval: DEFAULT_AUTOSAVE_INTERVAL_SECS,
            since_save: 0.0,
        }
    }

    /// The static configuration.
    #[must_use]
    pub const fn catalog(&self) -> &LabCatalog {
        &self.catalog
    }

    /// Current persistent state.
    #[must_use]
    pub const fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    /// The backing store.
    #[must_use]
    pub const fn store(&self) -> &S {
        &self.store
    }

    /// Whether the lab is between `activate` and `suspend`.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.active
    }

    /// Ticks processed since the lab was opened.
    #[must_use]
    pub const fn tick_count(&self) -> u64 {
        self.tick
    }

    /// Change how many ticked seconds pass between autosaves.
    ///
    /// Non-positive values save after every tick.
    pub fn set_autosave_interval(&mut self, secs: f64) {
        self.autosave_interval = if secs.is_finite() { secs.max(0.0) } else { f64::INFINITY };
    }

    // === Roster ===

    /// Add an idle worker at the rest area.
    pub fn add_worker(&mut self, shape: WorkerShape) -> WorkerId {
        let rest_area = self.catalog.rest_area;
        let id = self.ledger.roster_mut().add(shape, rest_area);
        tracing::info!(worker = %id, ?shape, "Added worker");
        self.persist();
        id
    }

    /// Remove a worker. Unknown ids do nothing and return `false`.
    pub fn remove_worker(&mut self, id: WorkerId) -> bool {
        if self.ledger.roster_mut().remove(id).is_none() {
            tracing::debug!(worker = %id, "Ignoring removal of unknown worker");
            return false;
        }
        tracing::info!(worker = %id, "Removed worker");
        self.persist();
        true
    }

    /// Assign a worker to a station, or unassign with `None`.
    ///
    /// Station ids missing from the catalog unassign the worker. Unknown
    /// workers are ignored. Returns whether the assignment changed.
    pub fn assign_worker(&mut self, id: WorkerId, station: Option<&str>) -> bool {
        if let Some(requested) = station {
            if self.catalog.station_by_str(requested).is_none() {
                tracing::debug!(worker = %id, station = requested, "Unknown station, unassigning");
            }
        }

        match self.ledger.roster_mut().assign(id, station, &self.catalog) {
            Some(true) => {
                tracing::info!(worker = %id, station = ?station, "Reassigned worker");
                self.persist();
                true
            }
            Some(false) => false,
            None => {
                tracing::debug!(worker = %id, "Ignoring assignment of unknown worker");
                false
            }
        }
    }

    // === Economy ===

    /// Buy the next level of `resource`. Returns whether it succeeded.
    pub fn upgrade(&mut self, resource: ResourceKind) -> bool {
        self.try_upgrade(resource).is_ok()
    }

    /// Buy the next level of `resource`, reporting why it failed.
    pub fn try_upgrade(&mut self, resource: ResourceKind) -> std::result::Result<UpgradeReceipt, UpgradeError> {
        let receipt = purchase_upgrade(&mut self.ledger, &self.catalog, resource)?;
        self.persist();
        Ok(receipt)
    }

    /// Price of the next level of `resource`.
    ///
    /// At the level cap this is still the formula price; [`Self::can_upgrade`]
    /// says whether it can be bought.
    #[must_use]
    pub fn cost_of(&self, resource: ResourceKind) -> f64 {
        next_cost(&self.ledger, &self.catalog, resource)
    }

    /// Whether the next level of `resource` is affordable and below the cap.
    #[must_use]
    pub fn can_upgrade(&self, resource: ResourceKind) -> bool {
        can_upgrade(&self.ledger, &self.catalog, resource).is_ok()
    }

    /// Snapshot of the upgrade multipliers.
    #[must_use]
    pub fn applied_stats(&self) -> AppliedStats {
        project_stats(self.ledger.levels(), &self.catalog)
    }

    /// Current output in units per second.
    #[must_use]
    pub fn production_rates(&self) -> ResourceMap<f64> {
        production_rates(self.ledger.roster(), &self.catalog)
    }

    // === Time ===

    /// Advance the lab by `dt` seconds.
    ///
    /// Runs the behavior scheduler and then production, so a worker that
    /// arrives this tick starts accruing progress on the same tick. Does
    /// nothing while suspended or for non-finite/non-positive `dt`.
    pub fn tick(&mut self, dt: f64) -> TickEvents {
        let mut events = TickEvents::default();
        if !self.active {
            tracing::trace!(dt, "Lab suspended, ignoring tick");
            return events;
        }
        if !dt.is_finite() || dt <= 0.0 {
            return events;
        }

        let (roster, balances) = self.ledger.production_parts();
        events.behavior = behavior_system(roster, &self.catalog, dt, &mut self.rng);
        events.production = production_system(roster, &self.catalog, dt, balances);

        self.advance_sync(dt);
        self.tick += 1;

        #[cfg(debug_assertions)]
        {
            let hash = self.ledger.state_hash();
            tracing::debug!(tick = self.tick, state_hash = hash, "Lab state hash");
        }

        self.since_save += dt;
        if self.since_save >= self.autosave_interval {
            self.persist();
        }

        events
    }

    /// Resume after time away: credit offline production and start ticking.
    pub fn activate(&mut self, now: DateTime<Utc>) -> OfflineReport {
        let report = offline_catch_up(&mut self.ledger, &self.catalog, now);
        self.active = true;
        self.persist();
        report
    }

    /// Stop ticking and stamp the sync point with the wall clock.
    pub fn suspend(&mut self, now: DateTime<Utc>) {
        self.ledger.set_last_sync_at(now);
        self.active = false;
        tracing::info!(%now, "Lab suspended");
        self.persist();
    }

    /// Save now, returning any storage error.
    pub fn flush(&mut self) -> Result<()> {
        self.store.save(&self.ledger)?;
        self.since_save = 0.0;
        Ok(())
    }

    /// Save, logging rather than returning failures.
    ///
    /// The autosave clock restarts either way, so a broken store is retried
    /// once per interval instead of every tick.
    fn persist(&mut self) {
        if let Err(e) = self.flush() {
            self.since_save = 0.0;
            tracing::warn!(error = %e, "Failed to save ledger");
        }
    }

    fn advance_sync(&mut self, dt: f64) {
        // dt is finite and positive here; absurd values saturate and the
        // checked add below rejects them
        #[allow(clippy::cast_possible_truncation)]
        let micros = (dt * 1_000_000.0).round() as i64;
        let advanced = self
            .ledger
            .last_sync_at()
            .checked_add_signed(chrono::Duration::microseconds(micros));
        if let Some(at) = advanced {
            self.ledger.set_last_sync_at(at);
        }
    }
}

impl<S: LedgerStore + std::fmt::Debug, R: Rng> std::fmt::Debug for ResearchLab<S, R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResearchLab")
            .field("ledger", &self.ledger)
            .field("store", &self.store)
            .field("active", &self.active)
            .field("tick", &self.tick)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LabError;
    use crate::persistence::MemoryStore;
    use crate::worker::WorkerState;
    use chrono::{Duration, TimeZone};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 2, 10, 8, 0, 0).single().expect("valid date")
    }

    fn open_lab() -> ResearchLab<MemoryStore> {
        let mut lab = ResearchLab::open(LabCatalog::standard(), MemoryStore::new(), t0(), 7);
        lab.activate(t0());
        lab
    }

    /// Store whose writes always fail.
    #[derive(Debug, Default)]
    struct ReadOnlyStore;

    impl LedgerStore for ReadOnlyStore {
        fn load(&self) -> Result<Option<Ledger>> {
            Ok(None)
        }

        fn save(&mut self, _ledger: &Ledger) -> Result<()> {
            Err(LabError::Io {
                path: "read-only".to_string(),
                source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only"),
            })
        }
    }

    #[derive(Default)]
    struct BrokenStore {
        attempts: u32,
    }

    impl LedgerStore for BrokenStore {
        fn load(&self) -> Result<Option<Ledger>> {
            Ok(None)
        }

        fn save(&mut self, ledger: &Ledger) -> Result<()> {
            self.attempts += 1;
            ReadOnlyStore.save(ledger)
        }
    }

    #[test]
    fn test_failed_autosave_waits_for_next_interval() {
        let mut lab = ResearchLab::open(LabCatalog::standard(), BrokenStore::default(), t0(), 4);
        lab.set_autosave_interval(1.0);
        lab.activate(t0());
        assert_eq!(lab.store().attempts, 1);

        // Three seconds of ticks, one retry per second
        for _ in 0..12 {
            lab.tick(0.25);
        }
        assert_eq!(lab.store().attempts, 4);
    }

    #[test]
    fn test_open_starts_fresh_and_suspended() {
        let lab = ResearchLab::open(LabCatalog::standard(), MemoryStore::new(), t0(), 1);
        assert!(!lab.is_active());
        assert_eq!(lab.ledger().roster().len(), 3);
        assert!(lab.ledger().balances().total().abs() < f64::EPSILON);
    }

    #[test]
    fn test_tick_while_suspended_does_nothing() {
        let mut lab = ResearchLab::open(LabCatalog::standard(), MemoryStore::new(), t0(), 1);
        let before = lab.ledger().clone();

        assert!(lab.tick(1.0).is_empty());
        assert_eq!(lab.ledger(), &before);
        assert_eq!(lab.tick_count(), 0);
    }

    #[test]
    fn test_assigned_worker_walks_then_produces() {
        let mut lab = open_lab();
        let id = lab.add_worker(WorkerShape::Circle);
        assert!(lab.assign_worker(id, Some("gravity-lab")));

        // Walk (about 7.2 units at 3 u/s) then work long enough for cycles
        let mut produced = 0.0;
        for _ in 0..200 {
            produced += lab.tick(0.1).produced(ResourceKind::Gravity);
        }

        assert!(produced > 0.0);
        assert!((lab.ledger().balance(ResourceKind::Gravity) - produced).abs() < 1e-9);
        // Every cycle pays 150 * 2.0
        assert!((produced % 300.0).abs() < 1e-6);
    }

    #[test]
    fn test_tick_advances_sync_point() {
        let mut lab = open_lab();
        lab.tick(0.5);
        lab.tick(0.25);
        assert_eq!(lab.ledger().last_sync_at(), t0() + Duration::milliseconds(750));
    }

    #[test]
    fn test_assign_unknown_station_unassigns() {
        let mut lab = open_lab();
        let id = lab.add_worker(WorkerShape::Square);
        lab.assign_worker(id, Some("momentum-lab"));

        assert!(lab.assign_worker(id, Some("kitchen")));
        let worker = lab.ledger().roster().get(id).expect("worker exists");
        assert_eq!(worker.assigned_station, None);
        assert_eq!(worker.state, WorkerState::Idle);
    }

    #[test]
    fn test_unknown_worker_operations_are_noops() {
        let mut lab = open_lab();
        let before = lab.ledger().clone();

        assert!(!lab.assign_worker(WorkerId(999), Some("gravity-lab")));
        assert!(!lab.remove_worker(WorkerId(999)));
        assert_eq!(lab.ledger(), &before);
    }

    #[test]
    fn test_upgrade_flow() {
        let mut lab = open_lab();
        assert!((lab.cost_of(ResourceKind::Gravity) - 1000.0).abs() < f64::EPSILON);
        assert!(!lab.can_upgrade(ResourceKind::Gravity));
        assert!(!lab.upgrade(ResourceKind::Gravity));

        lab.ledger.credit(ResourceKind::Gravity, 1000.0);
        assert!(lab.upgrade(ResourceKind::Gravity));
        assert!((lab.cost_of(ResourceKind::Gravity) - 1350.0).abs() < f64::EPSILON);
        assert!((lab.applied_stats().multiplier(ResourceKind::Gravity) - 1.05).abs() < 1e-12);
    }

    #[test]
    fn test_mutations_are_persisted() {
        let mut lab = open_lab();
        let saves = lab.store().save_count();

        let id = lab.add_worker(WorkerShape::Star);
        lab.assign_worker(id, Some("thermodynamics-lab"));
        assert_eq!(lab.store().save_count(), saves + 2);

        let stored = lab.store().load().expect("decodes").expect("saved");
        assert_eq!(&stored, lab.ledger());
    }

    #[test]
    fn test_autosave_interval() {
        let mut lab = open_lab();
        lab.set_autosave_interval(1.0);
        let saves = lab.store().save_count();

        for _ in 0..9 {
            lab.tick(0.1);
        }
        assert_eq!(lab.store().save_count(), saves);
        lab.tick(0.2);
        assert_eq!(lab.store().save_count(), saves + 1);
    }

    #[test]
    fn test_save_failures_are_not_fatal() {
        let mut lab = ResearchLab::open(LabCatalog::standard(), ReadOnlyStore, t0(), 3);
        lab.activate(t0());
        let id = lab.add_worker(WorkerShape::Hexagon);
        assert!(lab.assign_worker(id, Some("thermodynamics-lab")));
        assert!(lab.flush().is_err());
    }

    #[test]
    fn test_suspend_then_activate_grants_offline_time() {
        let mut lab = open_lab();
        let id = lab.add_worker(WorkerShape::Circle);
        lab.assign_worker(id, Some("gravity-lab"));

        lab.suspend(t0());
        let report = lab.activate(t0() + Duration::seconds(30));

        // Ten cycles of 300 for the circle; starting workers are unassigned
        assert!((report.granted(ResourceKind::Gravity) - 3000.0).abs() < 1e-9);
        assert!(lab.is_active());

        // Activating again at the same instant grants nothing more
        let again = lab.activate(t0() + Duration::seconds(30));
        assert!(again.is_empty());
    }

    #[test]
    fn test_reopen_restores_ledger() {
        let mut lab = open_lab();
        let id = lab.add_worker(WorkerShape::Triangle);
        lab.assign_worker(id, Some("elasticity-lab"));
        lab.suspend(t0());
        let saved = lab.ledger().clone();

        let store = lab.store().clone();
        let reopened = ResearchLab::open(LabCatalog::standard(), store, t0() + Duration::days(1), 9);
        assert_eq!(reopened.ledger(), &saved);
    }

    #[test]
    fn test_same_seed_same_state() {
        let run = |seed| {
            let mut lab = ResearchLab::open(LabCatalog::standard(), MemoryStore::new(), t0(), seed);
            lab.activate(t0());
            let ids: Vec<_> = lab.ledger().roster().iter().map(|w| w.id).collect();
            for (id, station) in ids.into_iter().zip(["gravity-lab", "momentum-lab", "elasticity-lab"]) {
                lab.assign_worker(id, Some(station));
            }
            for _ in 0..500 {
                lab.tick(1.0 / 30.0);
            }
            lab.ledger().state_hash()
        };

        assert_eq!(run(42), run(42));
    }
}
