//! Resource kinds and per-kind storage.

use serde::{Deserialize, Serialize};

/// The four physics properties the lab researches.
///
/// Used as the key for balances, upgrade levels, stations and bonuses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ResourceKind {
    /// Gravity research.
    Gravity,
    /// Momentum research.
    Momentum,
    /// Elasticity research.
    Elasticity,
    /// Thermodynamics research.
    Thermodynamics,
}

impl ResourceKind {
    /// Every resource kind, in canonical order.
    pub const ALL: [Self; 4] = [
        Self::Gravity,
        Self::Momentum,
        Self::Elasticity,
        Self::Thermodynamics,
    ];

    /// Position of this kind in [`Self::ALL`].
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::Gravity => 0,
            Self::Momentum => 1,
            Self::Elasticity => 2,
            Self::Thermodynamics => 3,
        }
    }

    /// Get the display name for this resource.
    #[must_use]
    pub const fn display_name(&self) -> &'static str {
        match self {
            Self::Gravity => "Gravity",
            Self::Momentum => "Momentum",
            Self::Elasticity => "Elasticity",
            Self::Thermodynamics => "Thermodynamics",
        }
    }

    /// Lowercase key used in CLI arguments and logs.
    #[must_use]
    pub const fn key(&self) -> &'static str {
        match self {
            Self::Gravity => "gravity",
            Self::Momentum => "momentum",
            Self::Elasticity => "elasticity",
            Self::Thermodynamics => "thermodynamics",
        }
    }

    /// Parse a lowercase key.
    #[must_use]
    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.key() == key)
    }
}

impl std::fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.display_name())
    }
}

/// One value per [`ResourceKind`].
///
/// Serializes with one named field per kind so save files and catalogs
/// stay readable.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ResourceMap<T> {
    /// Gravity value.
    pub gravity: T,
    /// Momentum value.
    pub momentum: T,
    /// Elasticity value.
    pub elasticity: T,
    /// Thermodynamics value.
    pub thermodynamics: T,
}

impl<T: Copy> ResourceMap<T> {
    /// Map with the same value for every kind.
    #[must_use]
    pub const fn splat(value: T) -> Self {
        Self {
            gravity: value,
            momentum: value,
            elasticity: value,
            thermodynamics: value,
        }
    }

    /// Build a map by evaluating `f` for each kind.
    pub fn from_fn(mut f: impl FnMut(ResourceKind) -> T) -> Self {
        Self {
            gravity: f(ResourceKind::Gravity),
            momentum: f(ResourceKind::Momentum),
            elasticity: f(ResourceKind::Elasticity),
            thermodynamics: f(ResourceKind::Thermodynamics),
        }
    }

    /// Value for `kind`.
    #[must_use]
    pub fn get(&self, kind: ResourceKind) -> T {
        self[kind]
    }

    /// Overwrite the value for `kind`.
    pub fn set(&mut self, kind: ResourceKind, value: T) {
        self[kind] = value;
    }

    /// Iterate `(kind, value)` pairs in canonical order.
    pub fn iter(&self) -> impl Iterator<Item = (ResourceKind, T)> + '_ {
        ResourceKind::ALL.into_iter().map(move |kind| (kind, self[kind]))
    }
}

impl<T> std::ops::Index<ResourceKind> for ResourceMap<T> {
    type Output = T;

    fn index(&self, kind: ResourceKind) -> &Self::Output {
        match kind {
            ResourceKind::Gravity => &self.gravity,
            ResourceKind::Momentum => &self.momentum,
            ResourceKind::Elasticity => &self.elasticity,
            ResourceKind::Thermodynamics => &self.thermodynamics,
        }
    }
}

impl<T> std::ops::IndexMut<ResourceKind> for ResourceMap<T> {
    fn index_mut(&mut self, kind: ResourceKind) -> &mut Self::Output {
        match kind {
            ResourceKind::Gravity => &mut self.gravity,
            ResourceKind::Momentum => &mut self.momentum,
            ResourceKind::Elasticity => &mut self.elasticity,
            ResourceKind::Thermodynamics => &mut self.thermodynamics,
        }
    }
}

impl ResourceMap<f64> {
    /// Sum over all kinds.
    #[must_use]
    pub fn total(&self) -> f64 {
        self.gravity + self.momentum + self.elasticity + self.thermodynamics
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_matches_all_order() {
        for (i, kind) in ResourceKind::ALL.iter().enumerate() {
            assert_eq!(kind.index(), i);
        }
    }

    #[test]
    fn test_key_roundtrip() {
        for kind in ResourceKind::ALL {
            assert_eq!(ResourceKind::from_key(kind.key()), Some(kind));
        }
        assert_eq!(ResourceKind::from_key("magnetism"), None);
    }

    #[test]
    fn test_resource_map_index_and_total() {
        let mut map = ResourceMap::splat(0.0_f64);
        map[ResourceKind::Gravity] += 300.0;
        map.set(ResourceKind::Momentum, 20.0);

        assert!((map.get(ResourceKind::Gravity) - 300.0).abs() < f64::EPSILON);
        assert!((map.total() - 320.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_resource_map_from_fn() {
        let map = ResourceMap::from_fn(|kind| kind.index() as u32 * 10);
        let collected: Vec<_> = map.iter().collect();
        assert_eq!(collected[3], (ResourceKind::Thermodynamics, 30));
    }
}
