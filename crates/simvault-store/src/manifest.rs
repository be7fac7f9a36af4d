use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use simvault_core::{ErrorDetail, VaultError};

/// Secondary index entry: what `list_runs` needs without opening the run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ManifestEntry {
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// Single-document index of every saved run, kept at the store root.
///
/// A derived cache: when absent or stale, consumers fall back to scanning
/// per-run metadata. Persistence is whole-document read-modify-write; only
/// the run store mutates it, after a successful save.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Manifest {
    #[serde(default)]
    pub runs: BTreeMap<String, ManifestEntry>,
}

impl Manifest {
    /// Loads the index, treating an absent file as an empty manifest.
    pub fn load(path: &Path) -> Result<Self, VaultError> {
        let text = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Ok(Self::default());
            }
            Err(err) => return Err(VaultError::io("manifest-read", &err, path.display())),
        };
        serde_json::from_str(&text).map_err(|err| {
            VaultError::Serde(
                ErrorDetail::new("manifest-parse", err.to_string())
                    .with_context("path", path.display().to_string()),
            )
        })
    }

    /// Persists the whole index as pretty-printed sorted JSON.
    pub fn store(&self, path: &Path) -> Result<(), VaultError> {
        let bytes = serde_json::to_vec_pretty(self)
            .map_err(|err| VaultError::Serde(ErrorDetail::new("manifest-encode", err.to_string())))?;
        fs::write(path, bytes).map_err(|err| VaultError::io("manifest-write", &err, path.display()))
    }

    /// Inserts or replaces the single entry for `run_id`.
    pub fn upsert(&mut self, run_id: &str, entry: ManifestEntry) {
        self.runs.insert(run_id.to_string(), entry);
    }
}
