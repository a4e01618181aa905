//! Production engine: turns working worker-time into resources.
//!
//! Each working worker advances its `work_progress` by
//! `dt / production_time`. Every time progress crosses 1 the station's
//! amount, scaled by the worker's shape bonus, is credited. Large `dt`
//! values (frame hitches) can complete several cycles in one call, but
//! never more than the worker has left before its break.
//!
//! Upgrade levels never feed back into production. Earning and spending
//! are kept separate; levels only reach gameplay through
//! [`crate::stats`].

use serde::{Deserialize, Serialize};

use crate::data::{LabCatalog, StationId};
use crate::resource::{ResourceKind, ResourceMap};
use crate::worker::{WorkerId, WorkerRoster, WorkerState};

/// Tolerance for cycle completion.
///
/// Ticks that add up to exactly one cycle in real arithmetic can land a hair
/// under 1.0 in floating point; this absorbs that drift. A cycle may
/// therefore complete up to `CYCLE_EPSILON * production_time` seconds early.
pub const CYCLE_EPSILON: f64 = 1e-9;

/// One completed production cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductionEvent {
    /// The worker that completed the cycle.
    pub worker: WorkerId,
    /// The station it was working at.
    pub station: StationId,
    /// Resource credited.
    pub resource: ResourceKind,
    /// Amount credited (bonus applied).
    pub amount: f64,
}

/// Output of one completed cycle for a shape at a station.
///
/// Clamped to a finite, non-negative value.
#[must_use]
pub fn cycle_yield(production_amount: f64, bonus: f64) -> f64 {
    let amount = production_amount * bonus;
    if amount.is_finite() && amount > 0.0 {
        amount
    } else {
        0.0
    }
}

/// Advance production for every working worker by `dt` seconds.
///
/// Credits completed cycles into `balances` and returns one event per
/// cycle. Workers that are not [`WorkerState::Working`] or whose station
/// does not resolve are skipped. Each completed cycle counts down the
/// worker's `cycles_until_break`; once it reaches 0 the worker stops for
/// this tick and any leftover progress is dropped, since the break that
/// follows resets it.
pub fn production_system(
    roster: &mut WorkerRoster,
    catalog: &LabCatalog,
    dt: f64,
    balances: &mut ResourceMap<f64>,
) -> Vec<ProductionEvent> {
    let mut events = Vec::new();
    if !dt.is_finite() || dt <= 0.0 {
        return events;
    }

    for worker in roster.iter_mut() {
        if worker.state != WorkerState::Working {
            continue;
        }
        let Some(station) = worker
            .assigned_station
            .as_ref()
            .and_then(|id| catalog.station(id))
        else {
            continue;
        };
        if !station.production_time.is_finite() || station.production_time <= 0.0 {
            continue;
        }

        let amount = cycle_yield(
            station.production_amount,
            catalog.bonus(worker.shape, station.resource),
        );

        worker.work_progress += dt / station.production_time;
        while worker.work_progress >= 1.0 - CYCLE_EPSILON {
            worker.work_progress = (worker.work_progress - 1.0).max(0.0);
            if worker.work_progress < CYCLE_EPSILON {
                worker.work_progress = 0.0;
            }
            worker.cycles_until_break = worker.cycles_until_break.saturating_sub(1);

            balances[station.resource] += amount;
            events.push(ProductionEvent {
                worker: worker.id,
                station: station.id.clone(),
                resource: station.resource,
                amount,
            });

            if worker.cycles_until_break == 0 {
                worker.work_progress = 0.0;
                break;
            }
        }
    }

    events
}

/// Current output in units per second, per resource.
///
/// Counts only workers that are working right now, so the figure dips
/// while workers walk or rest.
#[must_use]
pub fn production_rates(roster: &WorkerRoster, catalog: &LabCatalog) -> ResourceMap<f64> {
    let mut rates = ResourceMap::splat(0.0);
    for worker in roster.iter().filter(|w| w.is_working()) {
        let Some(station) = worker
            .assigned_station
            .as_ref()
            .and_then(|id| catalog.station(id))
        else {
            continue;
        };
        let per_cycle = cycle_yield(
            station.production_amount,
            catalog.bonus(worker.shape, station.resource),
        );
        if station.production_time > 0.0 {
            rates[station.resource] += per_cycle / station.production_time;
        }
    }
    rates
}
