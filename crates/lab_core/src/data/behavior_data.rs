//! Tuning for worker movement and break scheduling.

use rand::Rng;
use serde::{Deserialize, Serialize};

/// Inclusive `[min, max]` range sampled uniformly.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpanF64 {
    /// Lower bound.
    pub min: f64,
    /// Upper bound.
    pub max: f64,
}

impl SpanF64 {
    /// Create a new span.
    #[must_use]
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// Draw a value. Degenerate or inverted spans return `min`.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        if self.max > self.min {
            rng.random_range(self.min..=self.max)
        } else {
            self.min
        }
    }

    fn is_valid(&self) -> bool {
        self.min.is_finite() && self.max.is_finite() && self.min >= 0.0 && self.min <= self.max
    }
}

/// Inclusive `[min, max]` integer range sampled uniformly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpanU32 {
    /// Lower bound.
    pub min: u32,
    /// Upper bound.
    pub max: u32,
}

impl SpanU32 {
    /// Create a new span.
    #[must_use]
    pub const fn new(min: u32, max: u32) -> Self {
        Self { min, max }
    }

    /// Draw a value. Inverted spans return `min`.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> u32 {
        if self.max > self.min {
            rng.random_range(self.min..=self.max)
        } else {
            self.min
        }
    }
}

/// How workers move and when they rest.
///
/// All distances are lab-floor units, all durations seconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BehaviorTuning {
    /// Speed while walking to a station.
    pub walk_speed: f64,
    /// Speed while idling or on break.
    pub wander_speed: f64,
    /// A walker closer than this to its station starts working.
    pub arrival_threshold: f64,
    /// Idle wander radius around the rest position.
    pub idle_wander_radius: f64,
    /// Break wander radius around the station.
    pub break_wander_radius: f64,
    /// Seconds between wander decisions.
    pub wander_interval: SpanF64,
    /// Chance that a wander decision is to stand still instead.
    pub pause_chance: f64,
    /// Cycles worked between breaks.
    pub cycles_before_break: SpanU32,
    /// Break length.
    pub break_duration: SpanF64,
}

impl Default for BehaviorTuning {
    fn default() -> Self {
        Self {
            walk_speed: 3.0,
            wander_speed: 1.0,
            arrival_threshold: 0.25,
            idle_wander_radius: 2.0,
            break_wander_radius: 0.75,
            wander_interval: SpanF64::new(1.5, 4.0),
            pause_chance: 0.3,
            cycles_before_break: SpanU32::new(3, 6),
            break_duration: SpanF64::new(4.0, 8.0),
        }
    }
}

impl BehaviorTuning {
    /// Check for values the scheduler cannot work with.
    #[must_use]
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        let positive = [
            ("walk_speed", self.walk_speed),
            ("wander_speed", self.wander_speed),
            ("arrival_threshold", self.arrival_threshold),
        ];
        for (name, value) in positive {
            if !value.is_finite() || value <= 0.0 {
                errors.push(format!("{name} must be positive, got {value}"));
            }
        }

        let radii = [
            ("idle_wander_radius", self.idle_wander_radius),
            ("break_wander_radius", self.break_wander_radius),
        ];
        for (name, value) in radii {
            if !value.is_finite() || value < 0.0 {
                errors.push(format!("{name} must be non-negative, got {value}"));
            }
        }

        if !self.wander_interval.is_valid() || self.wander_interval.max <= 0.0 {
            errors.push(format!("wander_interval is invalid: {:?}", self.wander_interval));
        }
        if !self.break_duration.is_valid() {
            errors.push(format!("break_duration is invalid: {:?}", self.break_duration));
        }
        if !(0.0..=1.0).contains(&self.pause_chance) {
            errors.push(format!(
                "pause_chance must be within [0, 1], got {}",
                self.pause_chance
            ));
        }
        if self.cycles_before_break.min == 0 || self.cycles_before_break.min > self.cycles_before_break.max {
            errors.push(format!(
                "cycles_before_break must satisfy 1 <= min <= max, got {:?}",
                self.cycles_before_break
            ));
        }

        errors
    }
}
