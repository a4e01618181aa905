//! Research station definitions.

use serde::{Deserialize, Serialize};

use crate::math::Vec2;
use crate::resource::ResourceKind;

/// Unique string identifier for a station (e.g. `"gravity-lab"`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StationId(pub String);

impl StationId {
    /// Create a new station ID.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the raw identifier.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for StationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Which mini-simulation the client renders for a station.
///
/// The core never interprets this; it only carries it through lookups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SimulationVariant {
    /// Swinging pendulum.
    Pendulum,
    /// Colliding carts.
    Collision,
    /// Oscillating spring.
    Spring,
    /// Heat diffusing across a plate.
    HeatFlow,
}

/// Data-driven definition of a research station.
///
/// # Example RON
///
/// ```ron
/// StationData(
///     id: "gravity-lab",
///     resource: Gravity,
///     production_time: 3.0,
///     production_amount: 150.0,
///     variant: Pendulum,
///     position: (x: -6.0, y: 4.0),
/// )
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StationData {
    /// Unique identifier.
    pub id: StationId,
    /// Resource this station produces.
    pub resource: ResourceKind,
    /// Seconds per production cycle.
    pub production_time: f64,
    /// Units granted per completed cycle, before shape bonus.
    pub production_amount: f64,
    /// Client-side visual variant.
    pub variant: SimulationVariant,
    /// Where workers walk to.
    #[serde(default)]
    pub position: Vec2,
}

impl StationData {
    /// Create a station at the origin.
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        resource: ResourceKind,
        production_time: f64,
        production_amount: f64,
        variant: SimulationVariant,
    ) -> Self {
        Self {
            id: StationId::new(id),
            resource,
            production_time,
            production_amount,
            variant,
            position: Vec2::ZERO,
        }
    }

    /// Place the station on the lab floor.
    #[must_use]
    pub fn at(mut self, position: Vec2) -> Self {
        self.position = position;
        self
    }

    /// Steady-state output in units per second for one unbonused worker.
    #[must_use]
    pub fn base_rate(&self) -> f64 {
        if self.production_time > 0.0 {
            self.production_amount / self.production_time
        } else {
            0.0
        }
    }
}
