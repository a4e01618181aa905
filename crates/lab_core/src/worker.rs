//! Worker entities ("Wobbles") and the roster that owns them.
//!
//! A worker is plain data: its state machine is advanced by
//! [`crate::behavior`] and its work progress by [`crate::production`].
//! The roster keeps workers in insertion order, which is the order every
//! per-tick system visits them.

use serde::{Deserialize, Serialize};

use crate::data::{LabCatalog, StationId};
use crate::math::Vec2;

/// Unique worker identifier. Never reused within a ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WorkerId(pub u64);

impl std::fmt::Display for WorkerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "wobble#{}", self.0)
    }
}

/// Worker body shape. Only used to look up production bonuses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum WorkerShape {
    /// Round wobble.
    Circle,
    /// Boxy wobble.
    Square,
    /// Pointy wobble.
    Triangle,
    /// Six-sided wobble.
    Hexagon,
    /// Rare all-rounder.
    Star,
}

impl WorkerShape {
    /// Every shape.
    pub const ALL: [Self; 5] = [
        Self::Circle,
        Self::Square,
        Self::Triangle,
        Self::Hexagon,
        Self::Star,
    ];

    /// Lowercase key used in CLI arguments.
    #[must_use]
    pub const fn key(&self) -> &'static str {
        match self {
            Self::Circle => "circle",
            Self::Square => "square",
            Self::Triangle => "triangle",
            Self::Hexagon => "hexagon",
            Self::Star => "star",
        }
    }

    /// Parse a lowercase key.
    #[must_use]
    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|shape| shape.key() == key)
    }
}

/// Behavioral state of a worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum WorkerState {
    /// Unassigned, wandering near the rest area.
    #[default]
    Idle,
    /// Heading to the assigned station.
    Walking,
    /// At the station, accruing work progress.
    Working,
    /// Resting near the station.
    TakingBreak,
}

/// A single worker and its state-machine data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Worker {
    /// Unique identifier.
    pub id: WorkerId,
    /// Body shape.
    pub shape: WorkerShape,
    /// Station this worker is assigned to, if any.
    pub assigned_station: Option<StationId>,
    /// Current behavioral state.
    pub state: WorkerState,
    /// Fraction of the current production cycle done, in `[0, 1)`.
    /// Only meaningful while [`WorkerState::Working`].
    pub work_progress: f64,
    /// Current position on the lab floor.
    pub position: Vec2,
    /// Anchor for idle wandering.
    pub rest_position: Vec2,
    /// Point the worker is strolling toward while idle or on break.
    pub wander_target: Option<Vec2>,
    /// Cycles left before the next break.
    pub cycles_until_break: u32,
    /// Seconds of break remaining.
    pub break_remaining: f64,
    /// Seconds until the next wander decision.
    pub next_wander_in: f64,
}

impl Worker {
    /// Create an idle, unassigned worker standing at `position`.
    #[must_use]
    pub const fn new(id: WorkerId, shape: WorkerShape, position: Vec2) -> Self {
        Self {
            id,
            shape,
            assigned_station: None,
            state: WorkerState::Idle,
            work_progress: 0.0,
            position,
            rest_position: position,
            wander_target: None,
            cycles_until_break: 0,
            break_remaining: 0.0,
            next_wander_in: 0.0,
        }
    }

    /// Whether the worker is currently producing.
    #[must_use]
    pub const fn is_working(&self) -> bool {
        matches!(self.state, WorkerState::Working)
    }

    /// Point the worker at a new station (or none).
    ///
    /// Any change forces `Walking` (or `Idle` for `None`) and drops the
    /// partial cycle. Re-assigning the current station changes nothing.
    /// Returns whether the assignment changed.
    pub fn reassign(&mut self, station: Option<StationId>) -> bool {
        if self.assigned_station == station {
            return false;
        }
        self.state = if station.is_some() {
            WorkerState::Walking
        } else {
            WorkerState::Idle
        };
        self.assigned_station = station;
        self.work_progress = 0.0;
        self.wander_target = None;
        self.cycles_until_break = 0;
        self.break_remaining = 0.0;
        self.next_wander_in = 0.0;
        true
    }
}

/// Ordered collection of workers with id generation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkerRoster {
    /// Workers in roster order.
    workers: Vec<Worker>,
    /// Next worker ID to assign.
    next_id: u64,
}

impl WorkerRoster {
    /// Create an empty roster.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            workers: Vec::new(),
            next_id: 1,
        }
    }

    /// Roster seeded with the catalog's starting shapes, all idle at the rest area.
    #[must_use]
    pub fn starting(catalog: &LabCatalog) -> Self {
        let mut roster = Self::new();
        for &shape in &catalog.starting_roster {
            roster.add(shape, catalog.rest_area);
        }
        roster
    }

    /// Add a new idle worker and return its ID.
    pub fn add(&mut self, shape: WorkerShape, position: Vec2) -> WorkerId {
        let id = WorkerId(self.next_id);
        self.next_id += 1;
        self.workers.push(Worker::new(id, shape, position));
        id
    }

    /// Remove a worker by ID. Unknown IDs return `None`.
    pub fn remove(&mut self, id: WorkerId) -> Option<Worker> {
        let index = self.workers.iter().position(|w| w.id == id)?;
        Some(self.workers.remove(index))
    }

    /// Get a worker by ID.
    #[must_use]
    pub fn get(&self, id: WorkerId) -> Option<&Worker> {
        self.workers.iter().find(|w| w.id == id)
    }

    /// Get a mutable reference to a worker by ID.
    pub fn get_mut(&mut self, id: WorkerId) -> Option<&mut Worker> {
        self.workers.iter_mut().find(|w| w.id == id)
    }

    /// Assign a worker to a station by raw id.
    ///
    /// Station ids missing from the catalog are treated as `None`.
    /// Returns `None` when the worker does not exist, otherwise whether the
    /// assignment changed.
    pub fn assign(&mut self, id: WorkerId, station: Option<&str>, catalog: &LabCatalog) -> Option<bool> {
        let resolved = station
            .and_then(|s| catalog.station_by_str(s))
            .map(|s| s.id.clone());
        let worker = self.get_mut(id)?;
        Some(worker.reassign(resolved))
    }

    /// Iterate over workers in roster order.
    pub fn iter(&self) -> impl Iterator<Item = &Worker> {
        self.workers.iter()
    }

    /// Iterate mutably over workers in roster order.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Worker> {
        self.workers.iter_mut()
    }

    /// Get the number of workers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.workers.len()
    }

    /// Check if the roster is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.workers.is_empty()
    }

    /// The ID the next added worker will get.
    #[must_use]
    pub const fn next_id(&self) -> u64 {
        self.next_id
    }

    /// Make sure `next_id` is past every existing ID.
    ///
    /// Returns whether anything had to change.
    pub(crate) fn repair_id_counter(&mut self) -> bool {
        let floor = self.workers.iter().map(|w| w.id.0 + 1).max().unwrap_or(1);
        if self.next_id < floor {
            self.next_id = floor;
            true
        } else {
            false
        }
    }
}

impl Default for WorkerRoster {
    fn default() -> Self {
        Self::new()
    }
}
