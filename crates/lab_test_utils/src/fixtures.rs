//! Test fixtures and helpers.
//!
//! Pre-built catalogs and labs for consistent testing. The scenario
//! catalogs put every station on the rest area and push breaks far out,
//! so an assigned worker starts working on its first tick and production
//! numbers come out exact.

use chrono::{DateTime, TimeZone, Utc};
use lab_core::data::{BonusTable, LabCatalog, SimulationVariant, SpanU32, StationData, UpgradeData};
use lab_core::lab::ResearchLab;
use lab_core::math::Vec2;
use lab_core::persistence::MemoryStore;
use lab_core::resource::{ResourceKind, ResourceMap};
use lab_core::worker::{WorkerId, WorkerShape, WorkerState};

/// Seed used by fixture labs.
pub const FIXTURE_SEED: u64 = 0x5EED_1AB;

/// Fixed wall-clock origin for tests.
#[must_use]
pub fn epoch() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0)
        .single()
        .unwrap_or_default()
}

/// `epoch()` plus `secs` seconds.
#[must_use]
pub fn at_secs(secs: i64) -> DateTime<Utc> {
    epoch() + chrono::Duration::seconds(secs)
}

/// One `gravity-lab` station (3 s, 150 units) with a 2.0 circle bonus.
///
/// The station sits on the rest area, no worker ever takes a break and
/// the starting roster is empty.
#[must_use]
pub fn gravity_lab_catalog() -> LabCatalog {
    let stations = vec![StationData::new(
        "gravity-lab",
        ResourceKind::Gravity,
        3.0,
        150.0,
        SimulationVariant::Pendulum,
    )];
    let bonuses = BonusTable::new().with(WorkerShape::Circle, ResourceKind::Gravity, 2.0);
    let mut catalog = LabCatalog::new(stations, bonuses, ResourceMap::splat(UpgradeData::new(1000.0, 1.35, 0.05, 20)));
    catalog.behavior.cycles_before_break = SpanU32::new(u32::MAX, u32::MAX);
    catalog
}

/// The standard stations moved onto the rest area, breaks disabled.
#[must_use]
pub fn instant_standard_catalog() -> LabCatalog {
    let mut catalog = LabCatalog::standard();
    for station in &mut catalog.stations {
        station.position = Vec2::ZERO;
    }
    catalog.rest_area = Vec2::ZERO;
    catalog.starting_roster.clear();
    catalog.behavior.cycles_before_break = SpanU32::new(u32::MAX, u32::MAX);
    catalog
}

/// An active lab over `catalog`, backed by memory, synced at [`epoch`].
#[must_use]
pub fn active_lab(catalog: LabCatalog) -> ResearchLab<MemoryStore> {
    let mut lab = ResearchLab::open(catalog, MemoryStore::new(), epoch(), FIXTURE_SEED);
    lab.activate(epoch());
    lab
}

/// Add a worker and assign it to `station`.
pub fn hire(lab: &mut ResearchLab<MemoryStore>, shape: WorkerShape, station: &str) -> WorkerId {
    let id = lab.add_worker(shape);
    lab.assign_worker(id, Some(station));
    id
}

/// Active gravity-lab scenario with one circle worker assigned.
#[must_use]
pub fn gravity_lab_with_circle() -> (ResearchLab<MemoryStore>, WorkerId) {
    let mut lab = active_lab(gravity_lab_catalog());
    let id = hire(&mut lab, WorkerShape::Circle, "gravity-lab");
    (lab, id)
}

/// Tick until `worker` is working, up to `max_ticks` ticks of `dt`.
///
/// Returns the number of ticks taken, or `None` if it never got there.
pub fn tick_until_working(
    lab: &mut ResearchLab<MemoryStore>,
    worker: WorkerId,
    dt: f64,
    max_ticks: u32,
) -> Option<u32> {
    for n in 0..max_ticks {
        let working = lab
            .ledger()
            .roster()
            .get(worker)
            .is_some_and(|w| w.state == WorkerState::Working);
        if working {
            return Some(n);
        }
        lab.tick(dt);
    }
    None
}

/// Give the lab `amount` of `kind` by running offline time at a station.
///
/// Uses only public operations: hires a temporary star worker at the first
/// station producing `kind`, suspends, and reactivates far enough in the
/// future. The temporary worker is removed afterwards. Grants at least
/// `amount`, rounded up to whole cycles.
pub fn fund(lab: &mut ResearchLab<MemoryStore>, kind: ResourceKind, amount: f64) {
    let Some(station) = lab.catalog().stations_for(kind).next().cloned() else {
        return;
    };
    let per_cycle = station.production_amount * lab.catalog().bonus(WorkerShape::Star, kind);
    if per_cycle <= 0.0 || amount <= 0.0 {
        return;
    }

    #[allow(clippy::cast_possible_truncation)]
    let cycles = (amount / per_cycle).ceil() as i64;
    #[allow(clippy::cast_possible_truncation)]
    let millis = (station.production_time * 1000.0).ceil() as i64 * cycles;

    tracing::debug!(%kind, cycles, station = %station.id, "Funding lab through offline time");
    let helper = hire(lab, WorkerShape::Star, station.id.as_str());
    let from = lab.ledger().last_sync_at();
    lab.suspend(from);
    lab.activate(from + chrono::Duration::milliseconds(millis));
    lab.remove_worker(helper);
}
