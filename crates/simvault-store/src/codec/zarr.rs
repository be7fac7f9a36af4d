//! Chunked hierarchical store codec: a zarr-v2-shaped directory.
//!
//! Each array lives in its own subdirectory with a `.zarray` descriptor and
//! a single whole-array chunk of raw little-endian bytes (no compressor,
//! C order). Zero-element arrays write no chunk file.

use std::fs::{self, File};
use std::io::Read;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use simvault_core::{ErrorDetail, VaultError};

use crate::array::{ArtifactArray, ArtifactSet, DType};
use crate::codec::ArtifactCodec;

#[derive(Debug)]
pub struct ZarrCodec;

#[derive(Debug, Serialize, Deserialize)]
struct ZarrayDoc {
    zarr_format: u8,
    shape: Vec<usize>,
    chunks: Vec<usize>,
    dtype: String,
    compressor: Option<serde_json::Value>,
    fill_value: Option<serde_json::Value>,
    filters: Option<serde_json::Value>,
    order: String,
}

fn zarr_error(code: &str, err: impl ToString, path: &Path) -> VaultError {
    VaultError::Serde(
        ErrorDetail::new(code, err.to_string()).with_context("path", path.display().to_string()),
    )
}

fn chunk_name(shape: &[usize]) -> String {
    if shape.is_empty() {
        "0".to_string()
    } else {
        vec!["0"; shape.len()].join(".")
    }
}

fn write_array_dir(dir: &Path, array: &ArtifactArray) -> Result<(), VaultError> {
    fs::create_dir_all(dir).map_err(|err| VaultError::io("zarr-mkdir", &err, dir.display()))?;
    let doc = ZarrayDoc {
        zarr_format: 2,
        shape: array.shape().to_vec(),
        // Chunk dims must stay positive even for empty arrays.
        chunks: array.shape().iter().map(|dim| (*dim).max(1)).collect(),
        dtype: array.dtype().descr().to_string(),
        compressor: None,
        fill_value: None,
        filters: None,
        order: "C".to_string(),
    };
    let doc_path = dir.join(".zarray");
    let bytes = serde_json::to_vec_pretty(&doc)
        .map_err(|err| zarr_error("zarr-descriptor", err, &doc_path))?;
    fs::write(&doc_path, bytes)
        .map_err(|err| VaultError::io("zarr-write", &err, doc_path.display()))?;
    if array.element_count() > 0 {
        let chunk_path = dir.join(chunk_name(array.shape()));
        fs::write(&chunk_path, array.to_le_bytes())
            .map_err(|err| VaultError::io("zarr-write", &err, chunk_path.display()))?;
    }
    Ok(())
}

fn read_array_dir(dir: &Path) -> Result<ArtifactArray, VaultError> {
    let doc_path = dir.join(".zarray");
    let mut text = String::new();
    File::open(&doc_path)
        .and_then(|mut file| file.read_to_string(&mut text).map(|_| ()))
        .map_err(|err| VaultError::io("zarr-open", &err, doc_path.display()))?;
    let doc: ZarrayDoc =
        serde_json::from_str(&text).map_err(|err| zarr_error("zarr-descriptor", err, &doc_path))?;
    let dtype = DType::from_descr(&doc.dtype)?;
    let count: usize = doc.shape.iter().product();
    if count == 0 {
        return ArtifactArray::from_le_bytes(dtype, doc.shape, &[]);
    }
    let chunk_path = dir.join(chunk_name(&doc.shape));
    let bytes = fs::read(&chunk_path)
        .map_err(|err| VaultError::io("zarr-open", &err, chunk_path.display()))?;
    ArtifactArray::from_le_bytes(dtype, doc.shape, &bytes)
}

impl ArtifactCodec for ZarrCodec {
    fn format_name(&self) -> &'static str {
        "zarr"
    }

    fn file_name(&self) -> &'static str {
        "arrays.zarr"
    }

    fn write(&self, arrays: &ArtifactSet, run_dir: &Path) -> Result<PathBuf, VaultError> {
        let target = run_dir.join(self.file_name());
        let staging = run_dir.join("arrays.zarr.tmp");
        if staging.exists() {
            fs::remove_dir_all(&staging)
                .map_err(|err| VaultError::io("zarr-clean", &err, staging.display()))?;
        }
        fs::create_dir_all(&staging)
            .map_err(|err| VaultError::io("zarr-mkdir", &err, staging.display()))?;
        fs::write(staging.join(".zgroup"), b"{\"zarr_format\":2}")
            .map_err(|err| VaultError::io("zarr-write", &err, staging.display()))?;
        for (name, array) in arrays {
            write_array_dir(&staging.join(name), array)?;
        }
        // The existing target disappears only once the replacement is fully
        // staged; a crash between the two leaves the run re-writable.
        if target.exists() {
            fs::remove_dir_all(&target)
                .map_err(|err| VaultError::io("zarr-clean", &err, target.display()))?;
        }
        fs::rename(&staging, &target)
            .map_err(|err| VaultError::io("zarr-rename", &err, target.display()))?;
        Ok(target)
    }

    fn read(&self, arrays_path: &Path) -> Result<ArtifactSet, VaultError> {
        let entries = fs::read_dir(arrays_path)
            .map_err(|err| VaultError::io("zarr-open", &err, arrays_path.display()))?;
        let mut arrays = ArtifactSet::new();
        for entry in entries {
            let entry =
                entry.map_err(|err| VaultError::io("zarr-open", &err, arrays_path.display()))?;
            let path = entry.path();
            if !path.is_dir() || !path.join(".zarray").exists() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().into_owned();
            arrays.insert(name, read_array_dir(&path)?);
        }
        Ok(arrays)
    }
}
