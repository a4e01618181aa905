//! 2D vector math for worker movement.
//!
//! Positions only drive walking and arrival checks. Nothing in the
//! economy depends on them, so plain `f64` is enough here.

use rand::Rng;
use serde::{Deserialize, Serialize};

/// 2D vector in lab-floor space.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vec2 {
    /// X coordinate.
    pub x: f64,
    /// Y coordinate.
    pub y: f64,
}

impl Vec2 {
    /// Create a new vector.
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Zero vector.
    pub const ZERO: Self = Self { x: 0.0, y: 0.0 };

    /// Calculate squared distance (avoids sqrt for comparisons).
    #[must_use]
    pub fn distance_squared(self, other: Self) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx * dx + dy * dy
    }

    /// Euclidean distance.
    #[must_use]
    pub fn distance(self, other: Self) -> f64 {
        self.distance_squared(other).sqrt()
    }

    /// Vector length.
    #[must_use]
    pub fn length(self) -> f64 {
        self.x.hypot(self.y)
    }

    /// Step toward `target` by at most `max_step`.
    ///
    /// Lands exactly on `target` when it is within reach.
    #[must_use]
    pub fn move_towards(self, target: Self, max_step: f64) -> Self {
        let delta = target - self;
        let dist = delta.length();
        if dist <= max_step || dist <= f64::EPSILON {
            return target;
        }
        let scale = max_step / dist;
        Self::new(self.x + delta.x * scale, self.y + delta.y * scale)
    }

    /// Uniform random point inside the disc of `radius` around `self`.
    pub fn random_within<R: Rng + ?Sized>(self, radius: f64, rng: &mut R) -> Self {
        if radius <= 0.0 {
            return self;
        }
        let angle = rng.random::<f64>() * std::f64::consts::TAU;
        // sqrt keeps the distribution uniform over the area
        let r = radius * rng.random::<f64>().sqrt();
        Self::new(self.x + r * angle.cos(), self.y + r * angle.sin())
    }

    /// Whether both components are finite.
    #[must_use]
    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl std::ops::Add for Vec2 {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self {
            x: self.x + rhs.x,
            y: self.y + rhs.y,
        }
    }
}

impl std::ops::Sub for Vec2 {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Self {
            x: self.x - rhs.x,
            y: self.y - rhs.y,
        }
    }
}
