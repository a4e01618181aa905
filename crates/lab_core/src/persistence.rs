//! Saving and loading the ledger.
//!
//! The lab talks to storage only through [`LedgerStore`]. A save is one
//! [`SaveData`] record tagged with [`SAVE_VERSION`]; anything that fails to
//! decode or carries another version is rejected and the lab starts fresh.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::data::LabCatalog;
use crate::error::{LabError, Result};
use crate::ledger::Ledger;

/// Save file format version (increment when the ledger layout changes).
pub const SAVE_VERSION: u32 = 1;

/// Encoding used for a save.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SaveFormat {
    /// Compact `bincode`.
    #[default]
    Binary,
    /// Human-readable RON.
    Ron,
}

impl SaveFormat {
    /// Guess the format from a file extension (`.ron` means RON).
    #[must_use]
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("ron") => Self::Ron,
            _ => Self::Binary,
        }
    }
}

/// The persisted record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaveData {
    /// Save format version.
    pub version: u32,
    /// The ledger itself.
    pub ledger: Ledger,
}

impl SaveData {
    /// Wrap a ledger at the current version.
    #[must_use]
    pub fn new(ledger: Ledger) -> Self {
        Self {
            version: SAVE_VERSION,
            ledger,
        }
    }

    /// Encode in `format`.
    pub fn encode(&self, format: SaveFormat) -> Result<Vec<u8>> {
        match format {
            SaveFormat::Binary => bincode::serialize(self).map_err(|e| LabError::Encode {
                what: "save",
                message: e.to_string(),
            }),
            SaveFormat::Ron => ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
                .map(String::into_bytes)
                .map_err(|e| LabError::Encode {
                    what: "save",
                    message: e.to_string(),
                }),
        }
    }

    /// Decode from `format` and check the version.
    pub fn decode(bytes: &[u8], format: SaveFormat) -> Result<Self> {
        let save: Self = match format {
            SaveFormat::Binary => bincode::deserialize(bytes).map_err(|e| LabError::Decode {
                what: "save",
                message: e.to_string(),
            })?,
            SaveFormat::Ron => {
                let text = std::str::from_utf8(bytes).map_err(|e| LabError::Decode {
                    what: "save",
                    message: e.to_string(),
                })?;
                ron::from_str(text)?
            }
        };

        if save.version != SAVE_VERSION {
            return Err(LabError::SaveVersionMismatch {
                expected: SAVE_VERSION,
                found: save.version,
            });
        }

        Ok(save)
    }
}

/// Somewhere a ledger can be kept between sessions.
pub trait LedgerStore {
    /// Load the stored ledger. `Ok(None)` means nothing has been saved yet.
    fn load(&self) -> Result<Option<Ledger>>;

    /// Replace the stored ledger.
    fn save(&mut self, ledger: &Ledger) -> Result<()>;
}

/// Ledger store backed by a single file.
///
/// Writes go to a sibling `.tmp` file which is then renamed over the
/// target, so a crash mid-write leaves the previous save intact.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
    format: SaveFormat,
}

impl FileStore {
    /// Store at `path` using `format`.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>, format: SaveFormat) -> Self {
        Self {
            path: path.into(),
            format,
        }
    }

    /// Store at `path`, format picked from the extension.
    #[must_use]
    pub fn at(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let format = SaveFormat::from_path(&path);
        Self { path, format }
    }

    /// Target file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Encoding in use.
    #[must_use]
    pub const fn format(&self) -> SaveFormat {
        self.format
    }

    fn io_error(&self, source: std::io::Error) -> LabError {
        LabError::Io {
            path: self.path.display().to_string(),
            source,
        }
    }
}

impl LedgerStore for FileStore {
    fn load(&self) -> Result<Option<Ledger>> {
        let bytes = match std::fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(self.io_error(e)),
        };
        let save = SaveData::decode(&bytes, self.format)?;
        Ok(Some(save.ledger))
    }

    fn save(&mut self, ledger: &Ledger) -> Result<()> {
        let bytes = SaveData::new(ledger.clone()).encode(self.format)?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| self.io_error(e))?;
        }

        let mut temp_name = self.path.as_os_str().to_owned();
        temp_name.push(".tmp");
        let temp_path = PathBuf::from(temp_name);
        std::fs::write(&temp_path, &bytes).map_err(|e| self.io_error(e))?;
        std::fs::rename(&temp_path, &self.path).map_err(|e| self.io_error(e))?;

        tracing::debug!(path = %self.path.display(), bytes = bytes.len(), "Saved ledger");
        Ok(())
    }
}

/// In-memory ledger store.
///
/// Keeps the encoded bytes so a round trip goes through the same codec as a
/// file would.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    bytes: Option<Vec<u8>>,
    saves: u64,
}

impl MemoryStore {
    /// An empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A store that already holds `ledger`.
    pub fn with_ledger(ledger: &Ledger) -> Result<Self> {
        let mut store = Self::new();
        store.save(ledger)?;
        store.saves = 0;
        Ok(store)
    }

    /// A store holding raw bytes, for feeding in corrupt saves.
    #[must_use]
    pub fn with_bytes(bytes: Vec<u8>) -> Self {
        Self {
            bytes: Some(bytes),
            saves: 0,
        }
    }

    /// How many times [`LedgerStore::save`] has succeeded.
    #[must_use]
    pub const fn save_count(&self) -> u64 {
        self.saves
    }
}

impl LedgerStore for MemoryStore {
    fn load(&self) -> Result<Option<Ledger>> {
        self.bytes
            .as_deref()
            .map(|bytes| SaveData::decode(bytes, SaveFormat::Binary).map(|save| save.ledger))
            .transpose()
    }

    fn save(&mut self, ledger: &Ledger) -> Result<()> {
        self.bytes = Some(SaveData::new(ledger.clone()).encode(SaveFormat::Binary)?);
        self.saves += 1;
        Ok(())
    }
}

/// Load the stored ledger, or a fresh one if there is none or it is unusable.
///
/// Loaded ledgers are sanitized against `catalog`. Failures are logged and
/// never returned.
pub fn load_or_default<S: LedgerStore + ?Sized>(store: &S, catalog: &LabCatalog, now: DateTime<Utc>) -> Ledger {
    match store.load() {
        Ok(Some(mut ledger)) => {
            if ledger.sanitize(catalog) {
                tracing::warn!("Loaded ledger needed repairs");
            }
            tracing::info!(
                workers = ledger.roster().len(),
                last_sync_at = %ledger.last_sync_at(),
                "Loaded ledger"
            );
            ledger
        }
        Ok(None) => {
            tracing::info!("No saved ledger, starting fresh");
            Ledger::new(catalog, now)
        }
        Err(e) => {
            tracing::warn!(error = %e, "Failed to load ledger, starting fresh");
            Ledger::new(catalog, now)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::ResourceKind;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 7, 14, 18, 0, 0).single().expect("valid date")
    }

    fn sample_ledger(catalog: &LabCatalog) -> Ledger {
        let mut ledger = Ledger::new(catalog, now());
        ledger.credit(ResourceKind::Elasticity, 1234.5);
        ledger.set_level(ResourceKind::Gravity, 3);
        let id = ledger.roster().iter().next().expect("starting worker").id;
        ledger.roster_mut().assign(id, Some("elasticity-lab"), catalog);
        ledger
    }

    #[test]
    fn test_memory_store_round_trip() {
        let catalog = LabCatalog::standard();
        let ledger = sample_ledger(&catalog);
        let mut store = MemoryStore::new();

        assert!(store.load().expect("empty load").is_none());
        store.save(&ledger).expect("save");
        assert_eq!(store.load().expect("load"), Some(ledger));
        assert_eq!(store.save_count(), 1);
    }

    #[test]
    fn test_file_store_round_trip_both_formats() {
        let catalog = LabCatalog::standard();
        let ledger = sample_ledger(&catalog);
        let dir = tempfile::tempdir().expect("temp dir");

        for (name, format) in [("lab.bin", SaveFormat::Binary), ("lab.ron", SaveFormat::Ron)] {
            let mut store = FileStore::at(dir.path().join(name));
            assert_eq!(store.format(), format);
            store.save(&ledger).expect("save");
            assert_eq!(store.load().expect("load").as_ref(), Some(&ledger));
        }
    }

    #[test]
    fn test_missing_file_is_none() {
        let dir = tempfile::tempdir().expect("temp dir");
        let store = FileStore::at(dir.path().join("nothing-here.bin"));
        assert!(store.load().expect("missing is fine").is_none());
    }

    #[test]
    fn test_version_mismatch_is_rejected() {
        let catalog = LabCatalog::standard();
        let mut save = SaveData::new(sample_ledger(&catalog));
        save.version = SAVE_VERSION + 1;
        let bytes = save.encode(SaveFormat::Binary).expect("encode");

        assert!(matches!(
            SaveData::decode(&bytes, SaveFormat::Binary),
            Err(LabError::SaveVersionMismatch { found, .. }) if found == SAVE_VERSION + 1
        ));
    }

    #[test]
    fn test_load_or_default_falls_back_on_corruption() {
        let catalog = LabCatalog::standard();
        let store = MemoryStore::with_bytes(vec![0xde, 0xad, 0xbe, 0xef]);

        let ledger = load_or_default(&store, &catalog, now());
        assert_eq!(ledger, Ledger::new(&catalog, now()));
    }

    #[test]
    fn test_load_or_default_uses_saved_ledger() {
        let catalog = LabCatalog::standard();
        let saved = sample_ledger(&catalog);
        let store = MemoryStore::with_ledger(&saved).expect("seed store");

        let later = now() + chrono::Duration::hours(1);
        let ledger = load_or_default(&store, &catalog, later);
        assert_eq!(ledger, saved);
        assert_eq!(ledger.last_sync_at(), now());
    }
}
