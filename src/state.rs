//! Records of successful installs, used to skip artifacts that are already in place.

use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use crate::artifact::ArtifactKind;
use crate::error::{InstallerError, Result};

/// Persistence for install records, keyed by version, install location and artifact kind.
pub trait InstallStateStore {
    /// Whether `kind` of `version` was installed at `location`, or at any location when
    /// `location` is `None`.
    fn is_installed(&self, kind: ArtifactKind, version: &str, location: Option<&Path>) -> Result<bool>;

    /// Records that `kind` of `version` was installed successfully.
    fn record_success(&mut self, kind: ArtifactKind, version: &str, location: Option<&Path>) -> Result<()>;
}

fn record_key(kind: ArtifactKind, location: Option<&Path>) -> String {
    match location {
        Some(location) => format!("{}_{}", location.display(), kind.state_key()),
        None => kind.state_key().to_string(),
    }
}

fn matches_kind(key: &str, kind: ArtifactKind) -> bool {
    key == kind.state_key() || key.ends_with(&format!("_{}", kind.state_key()))
}

/// On-disk layout: version -> record key -> installed.
#[derive(Serialize, Deserialize, Debug, Default, PartialEq)]
#[serde(transparent)]
struct StateFile {
    versions: BTreeMap<String, BTreeMap<String, bool>>,
}

impl StateFile {
    fn is_installed(&self, kind: ArtifactKind, version: &str, location: Option<&Path>) -> bool {
        let Some(records) = self.versions.get(version) else {
            return false;
        };
        match location {
            Some(_) => records.get(&record_key(kind, location)).copied().unwrap_or(false),
            None => records.iter().any(|(key, installed)| *installed && matches_kind(key, kind)),
        }
    }

    fn record(&mut self, kind: ArtifactKind, version: &str, location: Option<&Path>) {
        self.versions
            .entry(version.to_string())
            .or_default()
            .insert(record_key(kind, location), true);
    }
}

/// Install records kept in a JSON file.
///
/// The file is read once on open and rewritten after every recorded install.
#[derive(Debug)]
pub struct JsonStateStore {
    path: PathBuf,
    state: StateFile,
}

impl JsonStateStore {
    /// Opens the store at `path`. A missing file is an empty store.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let state = if path.exists() {
            let content = fs::read_to_string(&path)?;
            serde_json::from_str(&content).map_err(|e| {
                InstallerError::StateStore(format!("Could not read {}: {}", path.display(), e))
            })?
        } else {
            StateFile::default()
        };
        Ok(Self { path, state })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Writes the records to a temporary file next to the store and renames it over the old
    /// file, so an interrupted save leaves the previous records intact.
    fn save(&self) -> Result<()> {
        let content = serde_json::to_string_pretty(&self.state)
            .map_err(|e| InstallerError::StateStore(e.to_string()))?;
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        fs::create_dir_all(dir)?;

        let mut tmp = NamedTempFile::new_in(dir)?;
        tmp.write_all(content.as_bytes())?;
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path).map_err(|e| {
            InstallerError::StateStore(format!("Could not write {}: {}", self.path.display(), e.error))
        })?;
        Ok(())
    }
}

impl InstallStateStore for JsonStateStore {
    fn is_installed(&self, kind: ArtifactKind, version: &str, location: Option<&Path>) -> Result<bool> {
        Ok(self.state.is_installed(kind, version, location))
    }

    fn record_success(&mut self, kind: ArtifactKind, version: &str, location: Option<&Path>) -> Result<()> {
        self.state.record(kind, version, location);
        self.save()
    }
}

/// Install records that live only as long as the process.
#[derive(Debug, Default)]
pub struct MemoryStateStore {
    state: StateFile,
}

impl MemoryStateStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl InstallStateStore for MemoryStateStore {
    fn is_installed(&self, kind: ArtifactKind, version: &str, location: Option<&Path>) -> Result<bool> {
        Ok(self.state.is_installed(kind, version, location))
    }

    fn record_success(&mut self, kind: ArtifactKind, version: &str, location: Option<&Path>) -> Result<()> {
        self.state.record(kind, version, location);
        Ok(())
    }
}
