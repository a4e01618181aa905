//! Worker behavior scheduler.
//!
//! Advances each worker's state machine and movement once per tick:
//!
//! ```text
//!            assign               arrive
//!   Idle ───────────▶ Walking ───────────▶ Working
//!    ▲                   │                  │   ▲
//!    │     unassign      │     N cycles     │   │ break over
//!    └───────────────────┘                  ▼   │
//!                                        TakingBreak
//! ```
//!
//! Reassignment is applied immediately by [`Worker::reassign`]; this system
//! only handles transitions driven by time and position. Work progress is
//! accrued separately by [`crate::production`].
//!
//! All randomness comes from the caller's generator so runs are
//! reproducible from a seed.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::data::{BehaviorTuning, LabCatalog, StationData, StationId};
use crate::math::Vec2;
use crate::worker::{Worker, WorkerId, WorkerRoster, WorkerState};

/// State transitions worth surfacing to the host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum BehaviorEvent {
    /// A walking worker reached its station and started working.
    Arrived {
        /// The worker.
        worker: WorkerId,
        /// The station it reached.
        station: StationId,
    },
    /// A worker finished its cycle quota and went on break.
    BreakStarted {
        /// The worker.
        worker: WorkerId,
        /// Drawn break length in seconds.
        duration: f64,
    },
    /// A worker came back from break to its station.
    BreakEnded {
        /// The worker.
        worker: WorkerId,
    },
    /// A worker's station no longer exists; it went idle.
    Stranded {
        /// The worker.
        worker: WorkerId,
    },
}

/// Advance every worker's state machine by `dt` seconds, in roster order.
///
/// Non-finite or non-positive `dt` does nothing.
pub fn behavior_system<R: Rng + ?Sized>(
    roster: &mut WorkerRoster,
    catalog: &LabCatalog,
    dt: f64,
    rng: &mut R,
) -> Vec<BehaviorEvent> {
    let mut events = Vec::new();
    if !dt.is_finite() || dt <= 0.0 {
        return events;
    }

    for worker in roster.iter_mut() {
        step_worker(worker, catalog, dt, rng, &mut events);
    }

    events
}

/// Advance a single worker.
pub fn step_worker<R: Rng + ?Sized>(
    worker: &mut Worker,
    catalog: &LabCatalog,
    dt: f64,
    rng: &mut R,
    events: &mut Vec<BehaviorEvent>,
) {
    let tuning = &catalog.behavior;
    let station = worker
        .assigned_station
        .as_ref()
        .and_then(|id| catalog.station(id));

    match worker.state {
        WorkerState::Idle => {
            if let Some(station) = station {
                worker.state = WorkerState::Walking;
                worker.wander_target = None;
                walk(worker, station, tuning, dt, rng, events);
            } else {
                let anchor = worker.rest_position;
                wander(worker, anchor, tuning.idle_wander_radius, tuning, dt, rng);
            }
        }

        WorkerState::Walking => match station {
            Some(station) => walk(worker, station, tuning, dt, rng, events),
            None => strand(worker, events),
        },

        WorkerState::Working => match station {
            Some(_) if worker.cycles_until_break == 0 => {
                let duration = tuning.break_duration.sample(rng);
                worker.state = WorkerState::TakingBreak;
                worker.work_progress = 0.0;
                worker.break_remaining = duration;
                worker.next_wander_in = 0.0;
                events.push(BehaviorEvent::BreakStarted {
                    worker: worker.id,
                    duration,
                });
            }
            Some(_) => {}
            None => strand(worker, events),
        },

        WorkerState::TakingBreak => match station {
            Some(station) => {
                worker.break_remaining -= dt;
                if worker.break_remaining <= 0.0 {
                    worker.break_remaining = 0.0;
                    start_working(worker, tuning, rng);
                    events.push(BehaviorEvent::BreakEnded { worker: worker.id });
                } else {
                    wander(
                        worker,
                        station.position,
                        tuning.break_wander_radius,
                        tuning,
                        dt,
                        rng,
                    );
                }
            }
            None => strand(worker, events),
        },
    }
}

/// Move toward the station and start working on arrival.
fn walk<R: Rng + ?Sized>(
    worker: &mut Worker,
    station: &StationData,
    tuning: &BehaviorTuning,
    dt: f64,
    rng: &mut R,
    events: &mut Vec<BehaviorEvent>,
) {
    worker.position = worker
        .position
        .move_towards(station.position, tuning.walk_speed * dt);

    if worker.position.distance(station.position) < tuning.arrival_threshold {
        start_working(worker, tuning, rng);
        events.push(BehaviorEvent::Arrived {
            worker: worker.id,
            station: station.id.clone(),
        });
    }
}

/// Enter `Working` with a fresh cycle quota.
fn start_working<R: Rng + ?Sized>(worker: &mut Worker, tuning: &BehaviorTuning, rng: &mut R) {
    worker.state = WorkerState::Working;
    worker.work_progress = 0.0;
    worker.wander_target = None;
    worker.cycles_until_break = tuning.cycles_before_break.sample(rng).max(1);
}

/// Drift around `anchor`, occasionally pausing instead of moving.
fn wander<R: Rng + ?Sized>(
    worker: &mut Worker,
    anchor: Vec2,
    radius: f64,
    tuning: &BehaviorTuning,
    dt: f64,
    rng: &mut R,
) {
    worker.next_wander_in -= dt;
    if worker.next_wander_in <= 0.0 {
        worker.next_wander_in = tuning.wander_interval.sample(rng);
        worker.wander_target = if rng.random::<f64>() < tuning.pause_chance {
            None
        } else {
            Some(anchor.random_within(radius, rng))
        };
    }

    if let Some(target) = worker.wander_target {
        worker.position = worker
            .position
            .move_towards(target, tuning.wander_speed * dt);
        if worker.position == target {
            worker.wander_target = None;
        }
    }
}

/// The assigned station vanished from the catalog.
fn strand(worker: &mut Worker, events: &mut Vec<BehaviorEvent>) {
    tracing::debug!(worker = %worker.id, station = ?worker.assigned_station, "Worker stranded");
    worker.reassign(None);
    // reassign is a no-op if the worker was already unassigned
    worker.state = WorkerState::Idle;
    events.push(BehaviorEvent::Stranded { worker: worker.id });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::SpanU32;
    use crate::worker::WorkerShape;
    use rand::SeedableRng;
    use rand_xoshiro::Xoshiro256PlusPlus;

    fn rng() -> Xoshiro256PlusPlus {
        Xoshiro256PlusPlus::seed_from_u64(0xB0B)
    }

    fn gravity_position(catalog: &LabCatalog) -> Vec2 {
        catalog
            .station_by_str("gravity-lab")
            .expect("gravity-lab exists")
            .position
    }

    #[test]
    fn test_idle_worker_stays_near_rest_position() {
        let catalog = LabCatalog::standard();
        let mut roster = WorkerRoster::new();
        let id = roster.add(WorkerShape::Circle, Vec2::ZERO);
        let mut rng = rng();

        for _ in 0..2000 {
            behavior_system(&mut roster, &catalog, 0.05, &mut rng);
            let worker = roster.get(id).expect("worker exists");
            assert_eq!(worker.state, WorkerState::Idle);
            assert!(worker.position.distance(Vec2::ZERO) <= catalog.behavior.idle_wander_radius + 1e-9);
        }
    }

    #[test]
    fn test_assigned_worker_walks_then_works() {
        let catalog = LabCatalog::standard();
        let mut roster = WorkerRoster::new();
        let id = roster.add(WorkerShape::Circle, Vec2::ZERO);
        roster.assign(id, Some("gravity-lab"), &catalog);
        let mut rng = rng();

        let target = gravity_position(&catalog);
        let distance = Vec2::ZERO.distance(target);
        let mut arrived = false;
        let mut elapsed = 0.0;
        while elapsed < 10.0 {
            let events = behavior_system(&mut roster, &catalog, 0.1, &mut rng);
            elapsed += 0.1;
            if events.iter().any(|e| matches!(e, BehaviorEvent::Arrived { worker, .. } if *worker == id)) {
                arrived = true;
                break;
            }
            assert_eq!(roster.get(id).expect("worker exists").state, WorkerState::Walking);
        }

        assert!(arrived, "worker never arrived");
        // Arrival time matches distance / speed, within one tick
        let expected = distance / catalog.behavior.walk_speed;
        assert!((elapsed - expected).abs() <= 0.1 + 1e-9);

        let worker = roster.get(id).expect("worker exists");
        assert_eq!(worker.state, WorkerState::Working);
        assert!(worker.cycles_until_break >= catalog.behavior.cycles_before_break.min);
    }

    #[test]
    fn test_worker_at_station_starts_working_on_first_tick() {
        let catalog = LabCatalog::standard();
        let mut roster = WorkerRoster::new();
        let id = roster.add(WorkerShape::Circle, gravity_position(&catalog));
        roster.assign(id, Some("gravity-lab"), &catalog);

        let events = behavior_system(&mut roster, &catalog, 0.016, &mut rng());
        assert_eq!(events.len(), 1);
        assert_eq!(roster.get(id).expect("worker exists").state, WorkerState::Working);
    }

    #[test]
    fn test_unassign_mid_walk_returns_to_idle() {
        let catalog = LabCatalog::standard();
        let mut roster = WorkerRoster::new();
        let id = roster.add(WorkerShape::Square, Vec2::ZERO);
        roster.assign(id, Some("momentum-lab"), &catalog);
        let mut rng = rng();

        behavior_system(&mut roster, &catalog, 0.1, &mut rng);
        assert_eq!(roster.get(id).expect("worker exists").state, WorkerState::Walking);

        roster.assign(id, None, &catalog);
        behavior_system(&mut roster, &catalog, 0.1, &mut rng);
        assert_eq!(roster.get(id).expect("worker exists").state, WorkerState::Idle);
    }

    #[test]
    fn test_break_after_quota_then_resume() {
        let mut catalog = LabCatalog::standard();
        catalog.behavior.cycles_before_break = SpanU32::new(1, 1);
        let mut roster = WorkerRoster::new();
        let id = roster.add(WorkerShape::Circle, gravity_position(&catalog));
        roster.assign(id, Some("gravity-lab"), &catalog);
        let mut rng = rng();

        behavior_system(&mut roster, &catalog, 0.1, &mut rng);
        // Production would decrement this on a completed cycle
        roster.get_mut(id).expect("worker exists").cycles_until_break = 0;

        let events = behavior_system(&mut roster, &catalog, 0.1, &mut rng);
        let Some(BehaviorEvent::BreakStarted { duration, .. }) = events.first() else {
            panic!("expected a break, got {events:?}");
        };
        let duration = *duration;
        assert!(catalog.behavior.break_duration.min <= duration && duration <= catalog.behavior.break_duration.max);
        assert_eq!(roster.get(id).expect("worker exists").state, WorkerState::TakingBreak);

        let mut resumed = false;
        for _ in 0..200 {
            let events = behavior_system(&mut roster, &catalog, 0.1, &mut rng);
            let worker = roster.get(id).expect("worker exists");
            if events.contains(&BehaviorEvent::BreakEnded { worker: id }) {
                assert_eq!(worker.state, WorkerState::Working);
                assert_eq!(worker.cycles_until_break, 1);
                resumed = true;
                break;
            }
            let station = gravity_position(&catalog);
            assert!(worker.position.distance(station) <= catalog.behavior.break_wander_radius + catalog.behavior.arrival_threshold + 1e-9);
        }
        assert!(resumed, "break never ended");
    }

    #[test]
    fn test_unassign_during_break_goes_idle() {
        let catalog = LabCatalog::standard();
        let mut roster = WorkerRoster::new();
        let id = roster.add(WorkerShape::Circle, gravity_position(&catalog));
        roster.assign(id, Some("gravity-lab"), &catalog);
        {
            let worker = roster.get_mut(id).expect("worker exists");
            worker.state = WorkerState::TakingBreak;
            worker.break_remaining = 5.0;
        }

        roster.assign(id, None, &catalog);
        behavior_system(&mut roster, &catalog, 0.1, &mut rng());
        assert_eq!(roster.get(id).expect("worker exists").state, WorkerState::Idle);
    }

    #[test]
    fn test_missing_station_strands_worker() {
        let catalog = LabCatalog::standard();
        let mut roster = WorkerRoster::new();
        let id = roster.add(WorkerShape::Circle, Vec2::ZERO);
        {
            let worker = roster.get_mut(id).expect("worker exists");
            worker.assigned_station = Some(StationId::new("demolished-lab"));
            worker.state = WorkerState::Working;
        }

        let events = behavior_system(&mut roster, &catalog, 0.1, &mut rng());
        assert_eq!(events, vec![BehaviorEvent::Stranded { worker: id }]);
        let worker = roster.get(id).expect("worker exists");
        assert_eq!(worker.state, WorkerState::Idle);
        assert_eq!(worker.assigned_station, None);
    }

    #[test]
    fn test_invalid_dt_is_ignored() {
        let catalog = LabCatalog::standard();
        let mut roster = WorkerRoster::new();
        let id = roster.add(WorkerShape::Circle, Vec2::ZERO);
        roster.assign(id, Some("gravity-lab"), &catalog);
        let before = roster.clone();

        for dt in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            assert!(behavior_system(&mut roster, &catalog, dt, &mut rng()).is_empty());
        }
        assert_eq!(roster, before);
    }

    #[test]
    fn test_same_seed_same_trajectory() {
        let catalog = LabCatalog::standard();
        let run = |seed: u64| {
            let mut roster = WorkerRoster::starting(&catalog);
            let mut rng = Xoshiro256PlusPlus::seed_from_u64(seed);
            for _ in 0..500 {
                behavior_system(&mut roster, &catalog, 0.05, &mut rng);
            }
            roster
        };
        assert_eq!(run(11), run(11));
    }
}
