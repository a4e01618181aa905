//! Headless lab simulation.
//!
//! Runs a lab at a fixed frame rate with no host attached, for tuning and
//! smoke-testing catalogs. The starting roster is assigned round-robin
//! across the stations in catalog order.

use chrono::{DateTime, Utc};
use lab_core::data::LabCatalog;
use lab_core::lab::ResearchLab;
use lab_core::persistence::{FileStore, LedgerStore, MemoryStore, SaveFormat};
use lab_core::resource::{ResourceKind, ResourceMap};
use serde::Serialize;

use crate::{Result, ToolError};

/// How to run a simulation.
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationConfig {
    /// Simulated seconds.
    pub seconds: f64,
    /// Seconds per tick.
    pub dt: f64,
    /// Behavior seed.
    pub seed: u64,
    /// Buy upgrades as soon as they are affordable.
    pub auto_upgrade: bool,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            seconds: 600.0,
            dt: 1.0 / 60.0,
            seed: 0,
            auto_upgrade: false,
        }
    }
}

impl SimulationConfig {
    fn tick_count(&self) -> Result<u64> {
        if !self.dt.is_finite() || self.dt <= 0.0 {
            return Err(ToolError::InvalidArgument(format!("dt must be positive, got {}", self.dt)));
        }
        if !self.seconds.is_finite() || self.seconds < 0.0 {
            return Err(ToolError::InvalidArgument(format!(
                "seconds must be non-negative, got {}",
                self.seconds
            )));
        }
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let ticks = (self.seconds / self.dt).round() as u64;
        Ok(ticks)
    }
}

/// What a simulation run ended with.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimulationSummary {
    /// Ticks run.
    pub ticks: u64,
    /// Simulated seconds.
    pub seconds: f64,
    /// Final balances.
    pub balances: ResourceMap<f64>,
    /// Final upgrade levels.
    pub levels: ResourceMap<u32>,
    /// Final stat multipliers.
    pub multipliers: ResourceMap<f64>,
    /// Output per second at the end of the run.
    pub rates: ResourceMap<f64>,
    /// Production cycles completed.
    pub cycles: u64,
    /// Upgrades bought (with `auto_upgrade`).
    pub upgrades_bought: u32,
    /// Final ledger hash.
    pub state_hash: u64,
}

/// Run a simulation against `store`, starting at `start`.
///
/// The lab is suspended at `start + seconds` when the run ends, which
/// saves it to the store.
///
/// # Errors
///
/// Returns an error for a non-positive `dt` or negative duration.
pub fn run_simulation<S: LedgerStore>(
    catalog: LabCatalog,
    store: S,
    config: &SimulationConfig,
    start: DateTime<Utc>,
) -> Result<(SimulationSummary, ResearchLab<S>)> {
    let ticks = config.tick_count()?;

    let mut lab = ResearchLab::open(catalog, store, start, config.seed);
    lab.activate(start);

    let station_ids: Vec<String> = lab
        .catalog()
        .stations
        .iter()
        .map(|s| s.id.as_str().to_string())
        .collect();
    let idle: Vec<_> = lab
        .ledger()
        .roster()
        .iter()
        .filter(|w| w.assigned_station.is_none())
        .map(|w| w.id)
        .collect();
    if !station_ids.is_empty() {
        for (id, station) in idle.into_iter().zip(station_ids.iter().cycle()) {
            lab.assign_worker(id, Some(station.as_str()));
        }
    }

    let mut cycles = 0u64;
    let mut upgrades_bought = 0u32;
    for tick in 0..ticks {
        let events = lab.tick(config.dt);
        cycles += events.production.len() as u64;

        if config.auto_upgrade {
            for kind in ResourceKind::ALL {
                while lab.upgrade(kind) {
                    upgrades_bought += 1;
                }
            }
        }

        if tick > 0 && tick % 3_600 == 0 {
            tracing::debug!(tick, total = lab.ledger().balances().total(), "Simulation progress");
        }
    }

    #[allow(clippy::cast_precision_loss)]
    let seconds = ticks as f64 * config.dt;
    #[allow(clippy::cast_possible_truncation)]
    let end = start + chrono::Duration::milliseconds((seconds * 1000.0).round() as i64);
    lab.suspend(end);

    let summary = SimulationSummary {
        ticks,
        seconds,
        balances: *lab.ledger().balances(),
        levels: *lab.ledger().levels(),
        multipliers: lab.applied_stats().multipliers,
        rates: lab.production_rates(),
        cycles,
        upgrades_bought,
        state_hash: lab.ledger().state_hash(),
    };
    tracing::info!(ticks, cycles, upgrades_bought, "Simulation finished");

    Ok((summary, lab))
}

/// Run in memory, or against a save file when `save` is given.
///
/// # Errors
///
/// See [`run_simulation`]. Save failures are logged by the lab, not returned;
/// a final flush reports them.
pub fn run_headless(
    catalog: LabCatalog,
    config: &SimulationConfig,
    save: Option<(&std::path::Path, SaveFormat)>,
    start: DateTime<Utc>,
) -> Result<SimulationSummary> {
    match save {
        Some((path, format)) => {
            let (summary, mut lab) = run_simulation(catalog, FileStore::new(path, format), config, start)?;
            lab.flush()?;
            Ok(summary)
        }
        None => Ok(run_simulation(catalog, MemoryStore::new(), config, start)?.0),
    }
}
