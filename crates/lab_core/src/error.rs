//! Error types for the research lab.

use thiserror::Error;

/// Result type alias using [`LabError`].
pub type Result<T> = std::result::Result<T, LabError>;

/// Top-level error type for the lab core.
///
/// Nothing on the tick path returns these. They surface from catalog loading
/// and persistence, where the lab facade logs them and falls back to defaults.
#[derive(Debug, Error)]
pub enum LabError {
    /// Failed to read or write a file.
    #[error("I/O error on '{path}': {source}")]
    Io {
        /// Path involved in the failed operation.
        path: String,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to parse a RON document.
    #[error("Failed to parse RON: {0}")]
    RonParse(#[from] ron::error::SpannedError),

    /// Failed to encode state.
    #[error("Failed to encode {what}: {message}")]
    Encode {
        /// What was being encoded.
        what: &'static str,
        /// Encoder message.
        message: String,
    },

    /// Failed to decode state.
    #[error("Failed to decode {what}: {message}")]
    Decode {
        /// What was being decoded.
        what: &'static str,
        /// Decoder message.
        message: String,
    },

    /// Catalog failed validation.
    #[error("Catalog validation failed: {0:?}")]
    InvalidCatalog(Vec<String>),

    /// Save file was written by an incompatible format version.
    #[error("Save version mismatch: expected {expected}, found {found}")]
    SaveVersionMismatch {
        /// Version this build reads.
        expected: u32,
        /// Version found in the save.
        found: u32,
    },
}
