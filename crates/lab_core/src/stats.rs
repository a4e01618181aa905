//! Stat projection: upgrade levels as gameplay multipliers.
//!
//! Consumers (the ball-rolling runs) pull a snapshot once when a run starts
//! and keep it. Nothing is pushed; buying an upgrade mid-run does not
//! change a snapshot already handed out.

use serde::{Deserialize, Serialize};

use crate::data::LabCatalog;
use crate::resource::{ResourceKind, ResourceMap};

/// Immutable per-resource multipliers derived from upgrade levels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AppliedStats {
    /// `1 + effect(level)` per resource.
    pub multipliers: ResourceMap<f64>,
}

impl AppliedStats {
    /// Stats with every multiplier at 1.0.
    #[must_use]
    pub const fn neutral() -> Self {
        Self {
            multipliers: ResourceMap::splat(1.0),
        }
    }

    /// Multiplier for one resource.
    #[must_use]
    pub fn multiplier(&self, kind: ResourceKind) -> f64 {
        self.multipliers[kind]
    }
}

impl Default for AppliedStats {
    fn default() -> Self {
        Self::neutral()
    }
}

/// Project upgrade levels into multipliers.
#[must_use]
pub fn project_stats(levels: &ResourceMap<u32>, catalog: &LabCatalog) -> AppliedStats {
    AppliedStats {
        multipliers: ResourceMap::from_fn(|kind| 1.0 + catalog.upgrade(kind).effect(levels[kind])),
    }
}
