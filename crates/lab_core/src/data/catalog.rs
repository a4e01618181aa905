//! The complete static configuration of a lab.

use serde::{Deserialize, Serialize};

use crate::data::{
    BehaviorTuning, BonusTable, SimulationVariant, StationData, StationId, UpgradeData,
};
use crate::error::{LabError, Result};
use crate::math::Vec2;
use crate::offline::OfflinePolicy;
use crate::resource::{ResourceKind, ResourceMap};
use crate::worker::WorkerShape;

/// Immutable lab configuration: stations, bonuses, upgrade curves and tuning.
///
/// Every system takes the catalog by shared reference. Nothing mutates it
/// after load.
///
/// # Example RON
///
/// ```ron
/// LabCatalog(
///     stations: [
///         StationData(
///             id: "gravity-lab",
///             resource: Gravity,
///             production_time: 3.0,
///             production_amount: 150.0,
///             variant: Pendulum,
///         ),
///     ],
///     bonuses: [(shape: Circle, resource: Gravity, multiplier: 2.0)],
///     upgrades: (
///         gravity: (base_cost: 1000.0, cost_multiplier: 1.35, effect_per_level: 0.05, max_level: 20),
///         momentum: (base_cost: 1000.0, cost_multiplier: 1.35, effect_per_level: 0.05, max_level: 20),
///         elasticity: (base_cost: 1000.0, cost_multiplier: 1.35, effect_per_level: 0.05, max_level: 20),
///         thermodynamics: (base_cost: 1000.0, cost_multiplier: 1.35, effect_per_level: 0.05, max_level: 20),
///     ),
///     starting_roster: [Circle, Square],
/// )
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabCatalog {
    /// All research stations.
    pub stations: Vec<StationData>,
    /// Shape/resource production bonuses.
    #[serde(default)]
    pub bonuses: BonusTable,
    /// Upgrade curve per resource.
    pub upgrades: ResourceMap<UpgradeData>,
    /// Worker movement and break tuning.
    #[serde(default)]
    pub behavior: BehaviorTuning,
    /// Offline catch-up policy.
    #[serde(default)]
    pub offline: OfflinePolicy,
    /// Shapes of the workers a fresh ledger starts with.
    #[serde(default)]
    pub starting_roster: Vec<WorkerShape>,
    /// Where idle workers hang around.
    #[serde(default)]
    pub rest_area: Vec2,
}

impl LabCatalog {
    /// Build a catalog with default tuning and no starting roster.
    #[must_use]
    pub fn new(stations: Vec<StationData>, bonuses: BonusTable, upgrades: ResourceMap<UpgradeData>) -> Self {
        Self {
            stations,
            bonuses,
            upgrades,
            behavior: BehaviorTuning::default(),
            offline: OfflinePolicy::default(),
            starting_roster: Vec::new(),
            rest_area: Vec2::ZERO,
        }
    }

    /// The built-in lab shipped with the game.
    #[must_use]
    pub fn standard() -> Self {
        let stations = vec![
            StationData::new("gravity-lab", ResourceKind::Gravity, 3.0, 150.0, SimulationVariant::Pendulum)
                .at(Vec2::new(-6.0, 4.0)),
            StationData::new("momentum-lab", ResourceKind::Momentum, 4.0, 180.0, SimulationVariant::Collision)
                .at(Vec2::new(6.0, 4.0)),
            StationData::new("elasticity-lab", ResourceKind::Elasticity, 5.0, 200.0, SimulationVariant::Spring)
                .at(Vec2::new(-6.0, -4.0)),
            StationData::new(
                "thermodynamics-lab",
                ResourceKind::Thermodynamics,
                6.0,
                240.0,
                SimulationVariant::HeatFlow,
            )
            .at(Vec2::new(6.0, -4.0)),
        ];

        let bonuses = BonusTable::new()
            .with(WorkerShape::Circle, ResourceKind::Gravity, 2.0)
            .with(WorkerShape::Square, ResourceKind::Momentum, 1.5)
            .with(WorkerShape::Triangle, ResourceKind::Elasticity, 1.5)
            .with(WorkerShape::Hexagon, ResourceKind::Thermodynamics, 1.5)
            .with(WorkerShape::Star, ResourceKind::Gravity, 1.25)
            .with(WorkerShape::Star, ResourceKind::Momentum, 1.25)
            .with(WorkerShape::Star, ResourceKind::Elasticity, 1.25)
            .with(WorkerShape::Star, ResourceKind::Thermodynamics, 1.25);

        let upgrades = ResourceMap {
            gravity: UpgradeData::new(1000.0, 1.35, 0.05, 20),
            momentum: UpgradeData::new(1000.0, 1.35, 0.05, 20),
            elasticity: UpgradeData::new(1200.0, 1.4, 0.04, 25),
            thermodynamics: UpgradeData::new(1500.0, 1.45, 0.06, 15),
        };

        Self {
            starting_roster: vec![WorkerShape::Circle, WorkerShape::Square, WorkerShape::Triangle],
            ..Self::new(stations, bonuses, upgrades)
        }
    }

    /// Parse a catalog from RON without validating it.
    pub fn from_ron_str(source: &str) -> Result<Self> {
        Ok(ron::from_str(source)?)
    }

    /// Parse and validate in one step.
    pub fn load_validated(source: &str) -> Result<Self> {
        let catalog = Self::from_ron_str(source)?;
        let errors = catalog.validate();
        if errors.is_empty() {
            Ok(catalog)
        } else {
            Err(LabError::InvalidCatalog(errors))
        }
    }

    /// Serialize to pretty RON.
    pub fn to_ron_string(&self) -> Result<String> {
        ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default()).map_err(|e| {
            LabError::Encode {
                what: "catalog",
                message: e.to_string(),
            }
        })
    }

    /// Look up a station by id.
    #[must_use]
    pub fn station(&self, id: &StationId) -> Option<&StationData> {
        self.stations.iter().find(|s| &s.id == id)
    }

    /// Look up a station by raw string id.
    #[must_use]
    pub fn station_by_str(&self, id: &str) -> Option<&StationData> {
        self.stations.iter().find(|s| s.id.as_str() == id)
    }

    /// Stations producing `resource`.
    pub fn stations_for(&self, resource: ResourceKind) -> impl Iterator<Item = &StationData> {
        self.stations.iter().filter(move |s| s.resource == resource)
    }

    /// Bonus multiplier for a shape on a resource.
    #[must_use]
    pub fn bonus(&self, shape: WorkerShape, resource: ResourceKind) -> f64 {
        self.bonuses.bonus(shape, resource)
    }

    /// Upgrade curve for a resource.
    #[must_use]
    pub fn upgrade(&self, resource: ResourceKind) -> &UpgradeData {
        &self.upgrades[resource]
    }

    /// Validate cross-references and value ranges.
    ///
    /// Returns a list of human-readable problems; empty means valid.
    #[must_use]
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        for (i, station) in self.stations.iter().enumerate() {
            if self.stations[..i].iter().any(|s| s.id == station.id) {
                errors.push(format!("Duplicate station id '{}'", station.id));
            }
            if !station.production_time.is_finite() || station.production_time <= 0.0 {
                errors.push(format!(
                    "Station '{}' has non-positive production_time {}",
                    station.id, station.production_time
                ));
            }
            if !station.production_amount.is_finite() || station.production_amount < 0.0 {
                errors.push(format!(
                    "Station '{}' has invalid production_amount {}",
                    station.id, station.production_amount
                ));
            }
            if !station.position.is_finite() {
                errors.push(format!("Station '{}' has a non-finite position", station.id));
            }
        }

        errors.extend(self.bonuses.validate());

        for (kind, curve) in self.upgrades.iter() {
            errors.extend(
                curve
                    .validate()
                    .into_iter()
                    .map(|e| format!("Upgrade '{}': {e}", kind.key())),
            );
        }

        errors.extend(self.behavior.validate());
        errors.extend(self.offline.validate());

        if !self.rest_area.is_finite() {
            errors.push("rest_area must be finite".to_string());
        }

        errors
    }
}

impl Default for LabCatalog {
    fn default() -> Self {
        Self::standard()
    }
}
