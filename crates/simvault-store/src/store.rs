use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde_json::Value;
use simvault_core::{derive_run_id, ErrorDetail, RunSpec, VaultError, DEFAULT_ID_LEN};
use walkdir::WalkDir;

use crate::codec::CodecRegistry;
use crate::manifest::{Manifest, ManifestEntry};
use crate::metadata::RunMetadata;

/// A loaded run: its arrays together with the metadata describing them.
#[derive(Debug, Clone, PartialEq)]
pub struct RunRecord {
    pub arrays: crate::ArtifactSet,
    pub metadata: RunMetadata,
}

/// Listing entry for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub run_id: String,
    pub timestamp: Option<String>,
    pub tags: Vec<String>,
}

/// Filesystem store owning one root directory of cached runs.
///
/// Layout: `root/manifest.json`, `root/runs/<run_id>/metadata.json`,
/// `root/runs/<run_id>/arrays.<ext>`. The store assumes a single writer
/// process per root; concurrent saves race on the manifest.
#[derive(Debug)]
pub struct RunStore {
    root: PathBuf,
    runs_dir: PathBuf,
    manifest_path: PathBuf,
    codecs: CodecRegistry,
    id_len: usize,
}

impl RunStore {
    /// Opens a store at `root` with the default identifier length, creating
    /// the directory layout on first use.
    pub fn open(root: impl AsRef<Path>) -> Result<Self, VaultError> {
        Self::open_with_id_len(root, DEFAULT_ID_LEN)
    }

    /// Opens a store deriving identifiers of `id_len` hex characters.
    pub fn open_with_id_len(root: impl AsRef<Path>, id_len: usize) -> Result<Self, VaultError> {
        if id_len == 0 || id_len > simvault_core::MAX_ID_LEN {
            return Err(VaultError::Config(
                ErrorDetail::new("id-length", "run id length must be between 1 and 64")
                    .with_context("requested", id_len.to_string()),
            ));
        }
        let root = root.as_ref().to_path_buf();
        let runs_dir = root.join("runs");
        fs::create_dir_all(&runs_dir)
            .map_err(|err| VaultError::io("store-init", &err, runs_dir.display()))?;
        let manifest_path = root.join("manifest.json");
        Ok(Self {
            root,
            runs_dir,
            manifest_path,
            codecs: CodecRegistry::with_available(),
            id_len,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn id_len(&self) -> usize {
        self.id_len
    }

    /// Directory a run occupies (whether or not it exists).
    pub fn run_dir(&self, run_id: &str) -> PathBuf {
        self.runs_dir.join(run_id)
    }

    /// Derives the run identifier for a specification assembled from the
    /// caller's view. The same path backs both id computation and existence
    /// checks.
    pub fn compute_run_id(
        &self,
        params: &BTreeMap<String, Value>,
        seed: u64,
        code_version: Option<&str>,
        env: &BTreeMap<String, Value>,
    ) -> Result<String, VaultError> {
        let spec = RunSpec::new(params, seed, code_version, env);
        derive_run_id(&spec, self.id_len)
    }

    /// Whether a run directory exists. Presence only, no content validation.
    pub fn exists(&self, run_id: &str) -> bool {
        self.run_dir(run_id).exists()
    }

    /// Persists a run: artifacts first, then metadata, then the manifest, so
    /// a reader never observes metadata pointing at unwritten arrays.
    ///
    /// Idempotent over an existing run directory; guarding against unwanted
    /// overwrites is the caller's skip-if-exists (or force) policy.
    pub fn save(
        &self,
        run_id: &str,
        arrays: &crate::ArtifactSet,
        metadata: RunMetadata,
        format: &str,
    ) -> Result<PathBuf, VaultError> {
        let codec = self.codecs.get(format)?;
        let run_dir = self.run_dir(run_id);
        fs::create_dir_all(&run_dir)
            .map_err(|err| VaultError::io("store-mkdir", &err, run_dir.display()))?;

        let arrays_path = codec.write(arrays, &run_dir)?;
        let written_name = arrays_path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| codec.file_name().to_string());
        let mut metadata = metadata;
        metadata.run_id = Some(run_id.to_string());
        metadata.arrays_format = Some(codec.format_name().to_string());
        metadata.arrays_path = Some(written_name);
        write_json_sorted(&run_dir.join("metadata.json"), &metadata)?;

        let mut manifest = Manifest::load(&self.manifest_path)?;
        manifest.upsert(
            run_id,
            ManifestEntry {
                timestamp: Some(metadata.timestamp.clone()),
                tags: metadata.tags.clone(),
            },
        );
        manifest.store(&self.manifest_path)?;
        Ok(run_dir)
    }

    /// Reads a run's metadata only.
    pub fn info(&self, run_id: &str) -> Result<RunMetadata, VaultError> {
        let path = self.run_dir(run_id).join("metadata.json");
        let text = match fs::read_to_string(&path) {
            Ok(text) => text,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Err(VaultError::NotFound(
                    ErrorDetail::new("run-missing", "run id is not present in the store")
                        .with_context("run_id", run_id),
                ));
            }
            Err(err) => return Err(VaultError::io("metadata-read", &err, path.display())),
        };
        serde_json::from_str(&text).map_err(|err| {
            VaultError::Serde(
                ErrorDetail::new("metadata-parse", err.to_string())
                    .with_context("path", path.display().to_string()),
            )
        })
    }

    /// Loads a run's arrays and metadata.
    pub fn load(&self, run_id: &str) -> Result<RunRecord, VaultError> {
        let metadata = self.info(run_id)?;
        let format = metadata.arrays_format.as_deref().ok_or_else(|| {
            VaultError::Config(
                ErrorDetail::new("metadata-format", "metadata records no arrays format")
                    .with_context("run_id", run_id),
            )
        })?;
        let file_name = metadata.arrays_path.as_deref().ok_or_else(|| {
            VaultError::Config(
                ErrorDetail::new("metadata-path", "metadata records no arrays path")
                    .with_context("run_id", run_id),
            )
        })?;
        let codec = self.codecs.get(format)?;
        let arrays_path = self.run_dir(run_id).join(file_name);
        if !arrays_path.exists() {
            return Err(VaultError::NotFound(
                ErrorDetail::new("arrays-missing", "recorded artifact location is absent")
                    .with_context("run_id", run_id)
                    .with_context("path", arrays_path.display().to_string()),
            ));
        }
        let arrays = codec.read(&arrays_path)?;
        Ok(RunRecord { arrays, metadata })
    }

    /// Lists every known run, sorted by timestamp ascending (missing
    /// timestamps first).
    ///
    /// Prefers the manifest; when it is empty, falls back to scanning run
    /// directories. During the scan, a run whose metadata is missing or
    /// unparsable is still listed as a placeholder with no timestamp and no
    /// tags; any other I/O failure propagates.
    pub fn list_runs(&self) -> Result<Vec<RunSummary>, VaultError> {
        let manifest = Manifest::load(&self.manifest_path)?;
        let mut runs: Vec<RunSummary> = manifest
            .runs
            .into_iter()
            .map(|(run_id, entry)| RunSummary {
                run_id,
                timestamp: entry.timestamp,
                tags: entry.tags,
            })
            .collect();
        if runs.is_empty() {
            runs = self.scan_run_dirs()?;
        }
        runs.sort_by(|a, b| a.timestamp.cmp(&b.timestamp));
        Ok(runs)
    }

    fn scan_run_dirs(&self) -> Result<Vec<RunSummary>, VaultError> {
        let mut runs = Vec::new();
        let entries = fs::read_dir(&self.runs_dir)
            .map_err(|err| VaultError::io("store-scan", &err, self.runs_dir.display()))?;
        let mut dirs: Vec<PathBuf> = Vec::new();
        for entry in entries {
            let entry = entry
                .map_err(|err| VaultError::io("store-scan", &err, self.runs_dir.display()))?;
            if entry.path().is_dir() {
                dirs.push(entry.path());
            }
        }
        dirs.sort();
        for dir in dirs {
            let run_id = dir
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_default();
            match self.info(&run_id) {
                Ok(metadata) => runs.push(RunSummary {
                    run_id,
                    timestamp: Some(metadata.timestamp),
                    tags: metadata.tags,
                }),
                // Tolerated corruption: absent or garbled metadata degrades
                // to a placeholder entry instead of failing the listing.
                Err(VaultError::NotFound(_)) | Err(VaultError::Serde(_)) => {
                    runs.push(RunSummary {
                        run_id,
                        timestamp: None,
                        tags: Vec::new(),
                    })
                }
                Err(err) => return Err(err),
            }
        }
        Ok(runs)
    }

    /// Loads the most recent run carrying `tag`, or `None` when no run does.
    ///
    /// "Most recent" is the lexicographically greatest timestamp; ties go to
    /// the later encounter in listing order.
    pub fn load_latest(&self, tag: &str) -> Result<Option<RunRecord>, VaultError> {
        let mut best: Option<RunSummary> = None;
        for run in self.list_runs()? {
            if !run.tags.iter().any(|candidate| candidate == tag) {
                continue;
            }
            let newer = match &best {
                Some(current) => {
                    run.timestamp.as_deref().unwrap_or("")
                        >= current.timestamp.as_deref().unwrap_or("")
                }
                None => true,
            };
            if newer {
                best = Some(run);
            }
        }
        match best {
            Some(run) => self.load(&run.run_id).map(Some),
            None => Ok(None),
        }
    }

    /// Copies a run's artifact location to `dest`, replacing whatever is
    /// there. Destructive only to the destination, never to the source.
    pub fn export(&self, run_id: &str, dest: impl Into<PathBuf>) -> Result<PathBuf, VaultError> {
        let metadata = self.info(run_id)?;
        let file_name = metadata.arrays_path.as_deref().ok_or_else(|| {
            VaultError::Config(
                ErrorDetail::new("metadata-path", "metadata records no arrays path")
                    .with_context("run_id", run_id),
            )
        })?;
        let source = self.run_dir(run_id).join(file_name);
        let dest = dest.into();
        if source.is_dir() {
            if dest.exists() {
                fs::remove_dir_all(&dest)
                    .map_err(|err| VaultError::io("export-clean", &err, dest.display()))?;
            }
            copy_dir(&source, &dest)?;
        } else {
            if !source.exists() {
                return Err(VaultError::NotFound(
                    ErrorDetail::new("arrays-missing", "recorded artifact location is absent")
                        .with_context("run_id", run_id),
                ));
            }
            if let Some(parent) = dest.parent() {
                fs::create_dir_all(parent)
                    .map_err(|err| VaultError::io("export-mkdir", &err, parent.display()))?;
            }
            fs::copy(&source, &dest)
                .map_err(|err| VaultError::io("export-copy", &err, dest.display()))?;
        }
        Ok(dest)
    }
}

fn copy_dir(source: &Path, dest: &Path) -> Result<(), VaultError> {
    for entry in WalkDir::new(source) {
        let entry = entry.map_err(|err| {
            VaultError::Io(
                ErrorDetail::new("export-walk", err.to_string())
                    .with_context("path", source.display().to_string()),
            )
        })?;
        let relative = entry
            .path()
            .strip_prefix(source)
            .unwrap_or_else(|_| Path::new(""));
        let target = dest.join(relative);
        if entry.file_type().is_dir() {
            fs::create_dir_all(&target)
                .map_err(|err| VaultError::io("export-mkdir", &err, target.display()))?;
        } else {
            fs::copy(entry.path(), &target)
                .map_err(|err| VaultError::io("export-copy", &err, target.display()))?;
        }
    }
    Ok(())
}

/// Writes any serializable value as pretty-printed, key-sorted JSON.
fn write_json_sorted<T: serde::Serialize>(path: &Path, value: &T) -> Result<(), VaultError> {
    let tree = serde_json::to_value(value)
        .map_err(|err| VaultError::Serde(ErrorDetail::new("json-encode", err.to_string())))?;
    let bytes = serde_json::to_vec_pretty(&tree)
        .map_err(|err| VaultError::Serde(ErrorDetail::new("json-write", err.to_string())))?;
    fs::write(path, bytes).map_err(|err| VaultError::io("json-io", &err, path.display()))
}
