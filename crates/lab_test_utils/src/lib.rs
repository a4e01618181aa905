//! # Lab Test Utilities
//!
//! Shared testing utilities for all crates:
//! - Fixture catalogs and pre-arranged labs
//! - Determinism test harness
//! - Upgrade pacing helpers
//! - Property-based testing strategies

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod determinism;
pub mod fixtures;
pub mod pacing;

/// Re-export proptest for convenience.
pub use proptest;
