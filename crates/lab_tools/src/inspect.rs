//! Save file inspection and offline catch-up replay.

use std::path::Path;

use chrono::{DateTime, Utc};
use lab_core::data::LabCatalog;
use lab_core::ledger::Ledger;
use lab_core::offline::{offline_catch_up, OfflineReport};
use lab_core::persistence::{FileStore, LedgerStore, SaveData};

use crate::{Result, ToolError};

/// Load the ledger in a save file, format chosen by extension.
///
/// # Errors
///
/// Returns [`ToolError::MissingSave`] if the file does not exist, or the
/// decode error if it cannot be read.
pub fn load_save(path: &Path) -> Result<Ledger> {
    FileStore::at(path)
        .load()?
        .ok_or_else(|| ToolError::MissingSave(path.display().to_string()))
}

/// Render a save file as pretty JSON.
///
/// # Errors
///
/// See [`load_save`].
pub fn save_to_json(path: &Path) -> Result<String> {
    let save = SaveData::new(load_save(path)?);
    Ok(serde_json::to_string_pretty(&save)?)
}

/// Replay offline catch-up against a save as if `hours` had passed since
/// its last sync.
///
/// With `write` the updated ledger is saved back in place.
///
/// # Errors
///
/// See [`load_save`]. Also fails for non-finite `hours` or a failed write.
pub fn catch_up_save(path: &Path, catalog: &LabCatalog, hours: f64, write: bool) -> Result<OfflineReport> {
    if !hours.is_finite() {
        return Err(ToolError::InvalidArgument(format!("hours must be finite, got {hours}")));
    }

    let mut store = FileStore::at(path);
    let mut ledger = store
        .load()?
        .ok_or_else(|| ToolError::MissingSave(path.display().to_string()))?;
    ledger.sanitize(catalog);

    let now = shifted(ledger.last_sync_at(), hours);
    let report = offline_catch_up(&mut ledger, catalog, now);

    if write {
        store.save(&ledger)?;
        tracing::info!(path = %path.display(), "Wrote caught-up save");
    }

    Ok(report)
}

fn shifted(from: DateTime<Utc>, hours: f64) -> DateTime<Utc> {
    #[allow(clippy::cast_possible_truncation)]
    let millis = (hours * 3_600_000.0).round() as i64;
    from.checked_add_signed(chrono::Duration::milliseconds(millis))
        .unwrap_or(from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use lab_core::lab::ResearchLab;
    use lab_core::resource::ResourceKind;
    use lab_core::worker::WorkerShape;
    use lab_test_utils::fixtures::{epoch, gravity_lab_catalog, FIXTURE_SEED};

    fn write_save(path: &Path) {
        let mut lab = ResearchLab::open(gravity_lab_catalog(), FileStore::at(path), epoch(), FIXTURE_SEED);
        lab.activate(epoch());
        let id = lab.add_worker(WorkerShape::Circle);
        lab.assign_worker(id, Some("gravity-lab"));
        lab.suspend(epoch());
    }

    #[test]
    fn test_save_renders_as_json() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("lab.bin");
        write_save(&path);

        let json = save_to_json(&path).expect("renders");
        let value: serde_json::Value = serde_json::from_str(&json).expect("valid json");
        assert_eq!(value["version"], lab_core::persistence::SAVE_VERSION);
        assert!(json.contains("gravity-lab"));
    }

    #[test]
    fn test_missing_save() {
        let dir = tempfile::tempdir().expect("temp dir");
        assert!(matches!(
            save_to_json(&dir.path().join("none.bin")),
            Err(ToolError::MissingSave(_))
        ));
    }

    #[test]
    fn test_catch_up_one_hour() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("lab.ron");
        write_save(&path);
        let catalog = gravity_lab_catalog();

        let report = catch_up_save(&path, &catalog, 1.0, true).expect("catches up");
        // 1200 cycles at 300
        assert!((report.granted(ResourceKind::Gravity) - 360_000.0).abs() < 1e-6);

        let saved = load_save(&path).expect("reloads");
        assert!((saved.balance(ResourceKind::Gravity) - 360_000.0).abs() < 1e-6);

        // Written back, so the same replay from the new sync point starts over
        let dry = catch_up_save(&path, &catalog, 0.0, false).expect("catches up");
        assert!(dry.is_empty());
    }
}
