//! Per-shape production bonuses.

use serde::{Deserialize, Serialize};

use crate::resource::ResourceKind;
use crate::worker::WorkerShape;

/// One `(shape, resource) -> multiplier` entry.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ShapeBonus {
    /// Worker shape the bonus applies to.
    pub shape: WorkerShape,
    /// Resource the bonus applies to.
    pub resource: ResourceKind,
    /// Output multiplier.
    pub multiplier: f64,
}

/// Sparse bonus table. Missing pairs mean `1.0`.
///
/// Serializes as a plain list of [`ShapeBonus`] entries.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BonusTable {
    entries: Vec<ShapeBonus>,
}

impl BonusTable {
    /// Multiplier used when no entry exists.
    pub const DEFAULT_MULTIPLIER: f64 = 1.0;

    /// Create an empty table.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Add or replace the entry for `(shape, resource)`.
    pub fn insert(&mut self, shape: WorkerShape, resource: ResourceKind, multiplier: f64) {
        if let Some(existing) = self
            .entries
            .iter_mut()
            .find(|e| e.shape == shape && e.resource == resource)
        {
            existing.multiplier = multiplier;
        } else {
            self.entries.push(ShapeBonus {
                shape,
                resource,
                multiplier,
            });
        }
    }

    /// Builder form of [`Self::insert`].
    #[must_use]
    pub fn with(mut self, shape: WorkerShape, resource: ResourceKind, multiplier: f64) -> Self {
        self.insert(shape, resource, multiplier);
        self
    }

    /// Multiplier for `(shape, resource)`, `1.0` when absent.
    #[must_use]
    pub fn bonus(&self, shape: WorkerShape, resource: ResourceKind) -> f64 {
        self.entries
            .iter()
            .find(|e| e.shape == shape && e.resource == resource)
            .map_or(Self::DEFAULT_MULTIPLIER, |e| e.multiplier)
    }

    /// All explicit entries.
    #[must_use]
    pub fn entries(&self) -> &[ShapeBonus] {
        &self.entries
    }

    /// Number of explicit entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the table has no explicit entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Report duplicate pairs and negative or non-finite multipliers.
    ///
    /// Duplicates can only come from hand-written data files since
    /// [`Self::insert`] replaces.
    #[must_use]
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        for (i, entry) in self.entries.iter().enumerate() {
            if !entry.multiplier.is_finite() || entry.multiplier < 0.0 {
                errors.push(format!(
                    "Bonus for {:?}/{} has invalid multiplier {}",
                    entry.shape, entry.resource, entry.multiplier
                ));
            }
            let duplicate = self.entries[..i]
                .iter()
                .any(|e| e.shape == entry.shape && e.resource == entry.resource);
            if duplicate {
                errors.push(format!(
                    "Duplicate bonus entry for {:?}/{}",
                    entry.shape, entry.resource
                ));
            }
        }
        errors
    }
}
