//! # Lab Core
//!
//! Idle-economy core for the Wobble research lab.
//!
//! Workers ("Wobbles") are assigned to research stations, walk there,
//! work production cycles and take breaks. Completed cycles earn one of
//! four physics resources, which are spent on permanent upgrades that the
//! ball-rolling game reads as stat multipliers. Time spent away is
//! credited on return through offline catch-up.
//!
//! This crate contains no rendering, no audio and no global state:
//! - All randomness comes from an injected seedable generator
//! - All wall-clock time is passed in by the host
//! - Storage goes through the [`persistence::LedgerStore`] trait
//!
//! ## Crate Structure
//!
//! - [`data`] - Static catalog (stations, bonuses, upgrade curves, tuning)
//! - [`worker`] - Workers and the roster
//! - [`behavior`] - Worker state machine and movement
//! - [`production`] - Cycle accrual and resource crediting
//! - [`offline`] - Offline catch-up
//! - [`upgrades`] - Upgrade purchases
//! - [`stats`] - Upgrade levels as gameplay multipliers
//! - [`ledger`] - Persistent state
//! - [`persistence`] - Save format and stores
//! - [`lab`] - The [`lab::ResearchLab`] facade hosts talk to

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod behavior;
pub mod data;
pub mod error;
pub mod lab;
pub mod ledger;
pub mod math;
pub mod offline;
pub mod persistence;
pub mod production;
pub mod resource;
pub mod stats;
pub mod upgrades;
pub mod worker;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::behavior::BehaviorEvent;
    pub use crate::data::{LabCatalog, SimulationVariant, StationData, StationId, UpgradeData};
    pub use crate::error::{LabError, Result};
    pub use crate::lab::{seeded_rng, LabRng, ResearchLab, TickEvents};
    pub use crate::ledger::Ledger;
    pub use crate::math::Vec2;
    pub use crate::offline::OfflineReport;
    pub use crate::persistence::{FileStore, LedgerStore, MemoryStore, SaveFormat};
    pub use crate::production::ProductionEvent;
    pub use crate::resource::{ResourceKind, ResourceMap};
    pub use crate::stats::AppliedStats;
    pub use crate::upgrades::{UpgradeError, UpgradeReceipt};
    pub use crate::worker::{Worker, WorkerId, WorkerShape, WorkerState};
}
