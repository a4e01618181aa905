//! Offline catch-up: converts time away from the lab into a lump grant.
//!
//! Runs once when the lab becomes active again, before ticking resumes.
//! Offline time is treated as fully productive for every assigned worker,
//! whatever state it was saved in. Walking and break time are ignored on
//! purpose: the simpler rule is what sets the expected idle-reward pacing.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::data::LabCatalog;
use crate::ledger::Ledger;
use crate::production::{cycle_yield, CYCLE_EPSILON};
use crate::resource::{ResourceKind, ResourceMap};

/// Seconds in one day, the default cap.
pub const DEFAULT_MAX_ELAPSED_SECS: f64 = 24.0 * 60.0 * 60.0;

/// Bounds on how much offline time is honored.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OfflinePolicy {
    /// Longest absence credited, in seconds.
    pub max_elapsed_secs: f64,
}

impl OfflinePolicy {
    /// Check the policy for unusable values.
    #[must_use]
    pub fn validate(&self) -> Vec<String> {
        if self.max_elapsed_secs.is_finite() && self.max_elapsed_secs > 0.0 {
            Vec::new()
        } else {
            vec![format!(
                "offline max_elapsed_secs must be positive, got {}",
                self.max_elapsed_secs
            )]
        }
    }

    /// Clamp raw elapsed seconds into `[0, max_elapsed_secs]`.
    ///
    /// Returns the usable seconds and whether the cap was hit.
    #[must_use]
    pub fn clamp(&self, raw_secs: f64) -> (f64, bool) {
        if !raw_secs.is_finite() {
            // NaN is skew, +inf is a stale timestamp
            return if raw_secs == f64::INFINITY {
                (self.max_elapsed_secs, true)
            } else {
                (0.0, false)
            };
        }
        if raw_secs <= 0.0 {
            (0.0, false)
        } else if raw_secs > self.max_elapsed_secs {
            (self.max_elapsed_secs, true)
        } else {
            (raw_secs, false)
        }
    }
}

impl Default for OfflinePolicy {
    fn default() -> Self {
        Self {
            max_elapsed_secs: DEFAULT_MAX_ELAPSED_SECS,
        }
    }
}

/// What a catch-up run granted.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OfflineReport {
    /// Raw seconds between `last_sync_at` and `now` (may be negative).
    pub raw_elapsed_secs: f64,
    /// Seconds actually credited after clamping.
    pub applied_secs: f64,
    /// Whether the cap cut the absence short.
    pub capped: bool,
    /// Amount granted per resource.
    pub grants: ResourceMap<f64>,
    /// Workers that contributed.
    pub contributing_workers: usize,
}

impl OfflineReport {
    /// Whether anything was granted.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.grants.total() <= 0.0
    }

    /// Grant for one resource.
    #[must_use]
    pub fn granted(&self, kind: ResourceKind) -> f64 {
        self.grants[kind]
    }
}

/// Seconds from `since` to `now`, negative if the clock went backwards.
#[must_use]
pub fn elapsed_secs(since: DateTime<Utc>, now: DateTime<Utc>) -> f64 {
    let delta = now.signed_duration_since(since);
    match delta.num_microseconds() {
        Some(us) => us as f64 / 1_000_000.0,
        // Out of microsecond range: hundreds of thousands of years
        None => delta.num_milliseconds() as f64 / 1000.0,
    }
}

/// Compute what an absence of `applied_secs` is worth, without mutating.
#[must_use]
pub fn offline_grants(ledger: &Ledger, catalog: &LabCatalog, applied_secs: f64) -> (ResourceMap<f64>, usize) {
    let mut grants = ResourceMap::splat(0.0);
    let mut contributing = 0;
    if applied_secs <= 0.0 {
        return (grants, contributing);
    }

    for worker in ledger.roster().iter() {
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

        let cycles = (applied_secs / station.production_time + CYCLE_EPSILON).floor();
        if cycles < 1.0 {
            continue;
        }
        let per_cycle = cycle_yield(
            station.production_amount,
            catalog.bonus(worker.shape, station.resource),
        );
        grants[station.resource] += cycles * per_cycle;
        contributing += 1;
    }

    (grants, contributing)
}

/// Reconcile the time since `last_sync_at` into the ledger.
///
/// Always leaves `last_sync_at == now`, so calling twice with the same
/// `now` grants nothing the second time. Partial cycles are discarded and
/// worker progress is left untouched.
pub fn offline_catch_up(ledger: &mut Ledger, catalog: &LabCatalog, now: DateTime<Utc>) -> OfflineReport {
    let raw_elapsed_secs = elapsed_secs(ledger.last_sync_at(), now);
    let (applied_secs, capped) = catalog.offline.clamp(raw_elapsed_secs);

    let (grants, contributing_workers) = offline_grants(ledger, catalog, applied_secs);
    for (kind, amount) in grants.iter() {
        ledger.credit(kind, amount);
    }
    ledger.set_last_sync_at(now);

    let report = OfflineReport {
        raw_elapsed_secs,
        applied_secs,
        capped,
        grants,
        contributing_workers,
    };

    if raw_elapsed_secs < 0.0 {
        tracing::warn!(raw_elapsed_secs, "Clock moved backwards since last sync, granting nothing");
    }
    if !report.is_empty() {
        tracing::info!(
            applied_secs,
            capped,
            workers = contributing_workers,
            total = grants.total(),
            "Offline catch-up granted resources"
        );
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::Vec2;
    use crate::worker::WorkerShape;
    use chrono::{Duration, TimeZone};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).single().expect("valid date")
    }

    fn ledger_with_worker(catalog: &LabCatalog, shape: WorkerShape, station: Option<&str>) -> Ledger {
        let mut ledger = Ledger::empty(t0());
        let id = ledger.roster_mut().add(shape, Vec2::ZERO);
        ledger.roster_mut().assign(id, station, catalog);
        ledger
    }

    #[test]
    fn test_zero_elapsed_grants_nothing_and_is_idempotent() {
        let catalog = LabCatalog::standard();
        let mut ledger = ledger_with_worker(&catalog, WorkerShape::Square, Some("gravity-lab"));

        let first = offline_catch_up(&mut ledger, &catalog, t0());
        let second = offline_catch_up(&mut ledger, &catalog, t0());

        assert!(first.is_empty());
        assert!(second.is_empty());
        assert!(ledger.balances().total().abs() < f64::EPSILON);
        assert_eq!(ledger.last_sync_at(), t0());
    }

    #[test]
    fn test_exactly_one_cycle_grants_one_amount() {
        let catalog = LabCatalog::standard();
        // Square has no gravity bonus
        let mut ledger = ledger_with_worker(&catalog, WorkerShape::Square, Some("gravity-lab"));

        let report = offline_catch_up(&mut ledger, &catalog, t0() + Duration::seconds(3));

        assert!((report.granted(ResourceKind::Gravity) - 150.0).abs() < f64::EPSILON);
        assert!((ledger.balance(ResourceKind::Gravity) - 150.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_partial_cycle_is_discarded() {
        let catalog = LabCatalog::standard();
        let mut ledger = ledger_with_worker(&catalog, WorkerShape::Circle, Some("gravity-lab"));

        let report = offline_catch_up(&mut ledger, &catalog, t0() + Duration::milliseconds(8_999));

        // Two full cycles at 150 * 2.0
        assert!((report.granted(ResourceKind::Gravity) - 600.0).abs() < f64::EPSILON);
        assert!(ledger.roster().iter().all(|w| w.work_progress.abs() < f64::EPSILON));
    }

    #[test]
    fn test_behavioral_state_is_ignored_offline() {
        let catalog = LabCatalog::standard();
        let mut ledger = ledger_with_worker(&catalog, WorkerShape::Square, Some("momentum-lab"));
        // Still walking when the app was closed
        let report = offline_catch_up(&mut ledger, &catalog, t0() + Duration::seconds(40));
        // 10 cycles of 180 with the square's 1.5 momentum bonus
        assert!((report.granted(ResourceKind::Momentum) - 2700.0).abs() < 1e-9);
        assert_eq!(report.contributing_workers, 1);
    }

    #[test]
    fn test_unassigned_workers_grant_nothing() {
        let catalog = LabCatalog::standard();
        let mut ledger = ledger_with_worker(&catalog, WorkerShape::Circle, None);

        let later = t0() + Duration::hours(2);
        let report = offline_catch_up(&mut ledger, &catalog, later);

        assert!(report.is_empty());
        assert_eq!(ledger.last_sync_at(), later);
    }

    #[test]
    fn test_negative_elapsed_is_clamped() {
        let catalog = LabCatalog::standard();
        let mut ledger = ledger_with_worker(&catalog, WorkerShape::Circle, Some("gravity-lab"));

        let earlier = t0() - Duration::hours(5);
        let report = offline_catch_up(&mut ledger, &catalog, earlier);

        assert!(report.is_empty());
        assert!(report.applied_secs.abs() < f64::EPSILON);
        assert_eq!(ledger.last_sync_at(), earlier);
    }

    #[test]
    fn test_long_absence_is_capped() {
        let catalog = LabCatalog::standard();
        let mut ledger = ledger_with_worker(&catalog, WorkerShape::Square, Some("gravity-lab"));

        let report = offline_catch_up(&mut ledger, &catalog, t0() + Duration::days(30));

        assert!(report.capped);
        assert!((report.applied_secs - DEFAULT_MAX_ELAPSED_SECS).abs() < f64::EPSILON);
        // 86400 / 3 = 28800 cycles of 150
        assert!((report.granted(ResourceKind::Gravity) - 4_320_000.0).abs() < 1e-6);
    }

    #[test]
    fn test_policy_clamp() {
        let policy = OfflinePolicy::default();
        assert_eq!(policy.clamp(-3.0), (0.0, false));
        assert_eq!(policy.clamp(f64::NAN), (0.0, false));
        assert_eq!(policy.clamp(f64::INFINITY), (DEFAULT_MAX_ELAPSED_SECS, true));
        assert_eq!(policy.clamp(60.0), (60.0, false));
    }
}
