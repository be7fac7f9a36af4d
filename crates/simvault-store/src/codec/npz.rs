//! Compressed bundle codec: a zip archive of `.npy` entries.

use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use simvault_core::{ErrorDetail, VaultError};
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use crate::array::ArtifactSet;
use crate::codec::{npy, ArtifactCodec};

#[derive(Debug)]
pub struct NpzCodec;

fn npz_error(code: &str, err: impl ToString, path: &Path) -> VaultError {
    VaultError::Serde(
        ErrorDetail::new(code, err.to_string()).with_context("path", path.display().to_string()),
    )
}

impl ArtifactCodec for NpzCodec {
    fn format_name(&self) -> &'static str {
        "npz"
    }

    fn file_name(&self) -> &'static str {
        "arrays.npz"
    }

    fn write(&self, arrays: &ArtifactSet, run_dir: &Path) -> Result<PathBuf, VaultError> {
        let target = run_dir.join(self.file_name());
        let staging = run_dir.join("arrays.npz.tmp");
        let file = File::create(&staging)
            .map_err(|err| VaultError::io("npz-create", &err, staging.display()))?;
        let mut zip = ZipWriter::new(file);
        let options = FileOptions::default().compression_method(CompressionMethod::Deflated);
        for (name, array) in arrays {
            zip.start_file(format!("{name}.npy"), options)
                .map_err(|err| npz_error("npz-entry", err, &staging))?;
            zip.write_all(&npy::encode(array))
                .map_err(|err| VaultError::io("npz-write", &err, staging.display()))?;
        }
        zip.finish()
            .map_err(|err| npz_error("npz-finish", err, &staging))?;
        fs::rename(&staging, &target)
            .map_err(|err| VaultError::io("npz-rename", &err, target.display()))?;
        Ok(target)
    }

    fn read(&self, arrays_path: &Path) -> Result<ArtifactSet, VaultError> {
        let file = File::open(arrays_path)
            .map_err(|err| VaultError::io("npz-open", &err, arrays_path.display()))?;
        let mut archive =
            ZipArchive::new(file).map_err(|err| npz_error("npz-parse", err, arrays_path))?;
        let mut arrays = ArtifactSet::new();
        for index in 0..archive.len() {
            let mut entry = archive
                .by_index(index)
                .map_err(|err| npz_error("npz-entry", err, arrays_path))?;
            let name = match entry.name().strip_suffix(".npy") {
                Some(stem) => stem.to_string(),
                None => continue,
            };
            let mut bytes = Vec::new();
            entry
                .read_to_end(&mut bytes)
                .map_err(|err| VaultError::io("npz-read", &err, arrays_path.display()))?;
            arrays.insert(name, npy::decode(&bytes)?);
        }
        Ok(arrays)
    }
}
