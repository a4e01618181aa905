//! Catalog validation.

use std::path::{Path, PathBuf};

use lab_core::data::LabCatalog;
use lab_core::error::LabError;

use crate::Result;

/// File name looked up when a directory is given.
pub const CATALOG_FILE_NAME: &str = "lab_catalog.ron";

/// Resolve a path argument to a catalog file.
///
/// Directories resolve to their `lab_catalog.ron`.
#[must_use]
pub fn resolve_catalog_path(path: &Path) -> PathBuf {
    if path.is_dir() {
        path.join(CATALOG_FILE_NAME)
    } else {
        path.to_path_buf()
    }
}

/// Read, parse and validate a catalog file.
///
/// # Errors
///
/// Returns an error if the file cannot be read, is not valid RON, or fails
/// validation. Validation errors carry every problem found.
pub fn validate_catalog_file(path: &Path) -> Result<LabCatalog> {
    let path = resolve_catalog_path(path);
    let source = std::fs::read_to_string(&path).map_err(|source| LabError::Io {
        path: path.display().to_string(),
        source,
    })?;

    let catalog = LabCatalog::load_validated(&source)?;
    tracing::info!(
        path = %path.display(),
        stations = catalog.stations.len(),
        bonuses = catalog.bonuses.len(),
        "Catalog is valid"
    );
    Ok(catalog)
}

/// Load the catalog at `path`, or the built-in one when `path` is `None`.
///
/// # Errors
///
/// See [`validate_catalog_file`].
pub fn load_catalog(path: Option<&Path>) -> Result<LabCatalog> {
    match path {
        Some(path) => validate_catalog_file(path),
        None => Ok(LabCatalog::standard()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ToolError;

    #[test]
    fn test_standard_catalog_file_validates() {
        let dir = tempfile::tempdir().expect("temp dir");
        let text = LabCatalog::standard().to_ron_string().expect("serialize");
        std::fs::write(dir.path().join(CATALOG_FILE_NAME), text).expect("write");

        // Directory form resolves to the catalog file
        let catalog = validate_catalog_file(dir.path()).expect("valid");
        assert_eq!(catalog, LabCatalog::standard());
    }

    #[test]
    fn test_invalid_catalog_reports_problems() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("broken.ron");
        let mut catalog = LabCatalog::standard();
        catalog.stations[0].production_time = 0.0;
        catalog.upgrades.momentum.cost_multiplier = 1.0;
        std::fs::write(&path, catalog.to_ron_string().expect("serialize")).expect("write");

        match validate_catalog_file(&path) {
            Err(ToolError::Lab(LabError::InvalidCatalog(problems))) => assert_eq!(problems.len(), 2, "{problems:?}"),
            other => panic!("expected validation failure, got {other:?}"),
        }
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let dir = tempfile::tempdir().expect("temp dir");
        assert!(matches!(
            validate_catalog_file(&dir.path().join("nope.ron")),
            Err(ToolError::Lab(LabError::Io { .. }))
        ));
    }

    #[test]
    fn test_no_path_uses_builtin() {
        assert_eq!(load_catalog(None).expect("builtin"), LabCatalog::standard());
    }
}
