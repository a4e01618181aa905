//! # Lab Development Tools
//!
//! Command-line tools for development:
//! - Catalog validation
//! - Headless lab simulation
//! - Save inspection and offline catch-up replay

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod inspect;
pub mod simulate;
pub mod validate;

use thiserror::Error;

/// Result type alias using [`ToolError`].
pub type Result<T> = std::result::Result<T, ToolError>;

/// Errors surfaced by the tools.
#[derive(Debug, Error)]
pub enum ToolError {
    /// Error from the lab core (IO, parsing, save decoding).
    #[error(transparent)]
    Lab(#[from] lab_core::error::LabError),

    /// Failed to render JSON output.
    #[error("Failed to write JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// A save file was expected but not found.
    #[error("No save found at '{0}'")]
    MissingSave(String),

    /// A command-line value was out of range.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}
