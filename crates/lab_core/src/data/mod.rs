//! Static lab configuration.
//!
//! This module contains pure data structures: stations, shape bonuses,
//! upgrade curves and behavior tuning. All structs deserialize from RON.
//!
//! **Note:** This module contains no file IO - it only defines data types
//! and parses strings. Reading catalog files is left to the host.

mod behavior_data;
mod bonus_data;
mod catalog;
mod station_data;
mod upgrade_data;

pub use behavior_data::{BehaviorTuning, SpanF64, SpanU32};
pub use bonus_data::{BonusTable, ShapeBonus};
pub use catalog::LabCatalog;
pub use station_data::{SimulationVariant, StationData, StationId};
pub use upgrade_data::UpgradeData;
