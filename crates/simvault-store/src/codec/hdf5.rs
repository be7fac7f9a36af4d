//! Single-file hierarchical codec backed by the `hdf5` crate.
//!
//! Compiled only when the `hdf5` cargo feature is enabled; without it the
//! registry reports the format as unavailable instead of failing at link
//! time.

use std::fs;
use std::path::{Path, PathBuf};

use hdf5::types::{FloatSize, IntSize, TypeDescriptor};
use simvault_core::{ErrorDetail, VaultError};

use crate::array::{ArrayData, ArtifactArray, ArtifactSet};
use crate::codec::ArtifactCodec;

#[derive(Debug)]
pub struct Hdf5Codec;

fn h5_error(code: &str, err: impl ToString, path: &Path) -> VaultError {
    VaultError::Serde(
        ErrorDetail::new(code, err.to_string()).with_context("path", path.display().to_string()),
    )
}

fn write_dataset(
    file: &hdf5::File,
    name: &str,
    array: &ArtifactArray,
    path: &Path,
) -> Result<(), VaultError> {
    let shape = array.shape().to_vec();
    let result = match array.data() {
        ArrayData::F64(values) => file
            .new_dataset::<f64>()
            .shape(shape)
            .create(name)
            .and_then(|ds| ds.write_raw(values)),
        ArrayData::F32(values) => file
            .new_dataset::<f32>()
            .shape(shape)
            .create(name)
            .and_then(|ds| ds.write_raw(values)),
        ArrayData::I64(values) => file
            .new_dataset::<i64>()
            .shape(shape)
            .create(name)
            .and_then(|ds| ds.write_raw(values)),
        ArrayData::I32(values) => file
            .new_dataset::<i32>()
            .shape(shape)
            .create(name)
            .and_then(|ds| ds.write_raw(values)),
        ArrayData::U8(values) => file
            .new_dataset::<u8>()
            .shape(shape)
            .create(name)
            .and_then(|ds| ds.write_raw(values)),
        ArrayData::Bool(values) => file
            .new_dataset::<bool>()
            .shape(shape)
            .create(name)
            .and_then(|ds| ds.write_raw(values)),
    };
    result.map_err(|err| h5_error("h5-write", err, path))
}

fn read_dataset(dataset: &hdf5::Dataset, path: &Path) -> Result<ArtifactArray, VaultError> {
    let shape = dataset.shape();
    let descriptor = dataset
        .dtype()
        .and_then(|dtype| dtype.to_descriptor())
        .map_err(|err| h5_error("h5-dtype", err, path))?;
    let data = match descriptor {
        TypeDescriptor::Float(FloatSize::U8) => ArrayData::F64(
            dataset
                .read_raw::<f64>()
                .map_err(|err| h5_error("h5-read", err, path))?,
        ),
        TypeDescriptor::Float(FloatSize::U4) => ArrayData::F32(
            dataset
                .read_raw::<f32>()
                .map_err(|err| h5_error("h5-read", err, path))?,
        ),
        TypeDescriptor::Integer(IntSize::U8) => ArrayData::I64(
            dataset
                .read_raw::<i64>()
                .map_err(|err| h5_error("h5-read", err, path))?,
        ),
        TypeDescriptor::Integer(IntSize::U4) => ArrayData::I32(
            dataset
                .read_raw::<i32>()
                .map_err(|err| h5_error("h5-read", err, path))?,
        ),
        TypeDescriptor::Unsigned(IntSize::U1) => ArrayData::U8(
            dataset
                .read_raw::<u8>()
                .map_err(|err| h5_error("h5-read", err, path))?,
        ),
        TypeDescriptor::Boolean => ArrayData::Bool(
            dataset
                .read_raw::<bool>()
                .map_err(|err| h5_error("h5-read", err, path))?,
        ),
        other => {
            return Err(VaultError::Serde(
                ErrorDetail::new("h5-dtype", "unsupported dataset element type")
                    .with_context("descriptor", other.to_string()),
            ))
        }
    };
    ArtifactArray::new(shape, data)
}

impl ArtifactCodec for Hdf5Codec {
    fn format_name(&self) -> &'static str {
        "hdf5"
    }

    fn file_name(&self) -> &'static str {
        "arrays.h5"
    }

    fn write(&self, arrays: &ArtifactSet, run_dir: &Path) -> Result<PathBuf, VaultError> {
        let target = run_dir.join(self.file_name());
        let staging = run_dir.join("arrays.h5.tmp");
        let file =
            hdf5::File::create(&staging).map_err(|err| h5_error("h5-create", err, &staging))?;
        for (name, array) in arrays {
            write_dataset(&file, name, array, &staging)?;
        }
        drop(file);
        fs::rename(&staging, &target)
            .map_err(|err| VaultError::io("h5-rename", &err, target.display()))?;
        Ok(target)
    }

    fn read(&self, arrays_path: &Path) -> Result<ArtifactSet, VaultError> {
        let file =
            hdf5::File::open(arrays_path).map_err(|err| h5_error("h5-open", err, arrays_path))?;
        let mut arrays = ArtifactSet::new();
        for name in file
            .member_names()
            .map_err(|err| h5_error("h5-open", err, arrays_path))?
        {
            let dataset = file
                .dataset(&name)
                .map_err(|err| h5_error("h5-read", err, arrays_path))?;
            arrays.insert(name, read_dataset(&dataset, arrays_path)?);
        }
        Ok(arrays)
    }
}
