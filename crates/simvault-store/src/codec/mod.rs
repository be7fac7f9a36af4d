//! Pluggable on-disk encodings for artifact sets.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use simvault_core::{ErrorDetail, VaultError};

use crate::array::ArtifactSet;

#[cfg(feature = "hdf5")]
mod hdf5;
mod npy;
mod npz;
mod zarr;

#[cfg(feature = "hdf5")]
pub use self::hdf5::Hdf5Codec;
pub use npz::NpzCodec;
pub use zarr::ZarrCodec;

/// Every format name the store recognizes, compiled in or not.
pub const KNOWN_FORMATS: [&str; 3] = ["npz", "zarr", "hdf5"];

/// Uniform contract over artifact encodings.
///
/// `write` must be atomic from the caller's point of view: either the full
/// set lands at the returned path or the target is left absent/unchanged.
/// `read` must reproduce values, shapes, and element types exactly.
pub trait ArtifactCodec: std::fmt::Debug {
    /// Format name recorded verbatim in run metadata.
    fn format_name(&self) -> &'static str;

    /// File or directory name of the artifact inside a run directory.
    fn file_name(&self) -> &'static str;

    /// Writes the full artifact set into `run_dir`, returning the path
    /// written.
    fn write(&self, arrays: &ArtifactSet, run_dir: &Path) -> Result<PathBuf, VaultError>;

    /// Reads an artifact set back from the recorded location.
    fn read(&self, arrays_path: &Path) -> Result<ArtifactSet, VaultError>;
}

/// Capability registry mapping format names to compiled-in codecs.
///
/// Requesting a recognized format whose backing library was not compiled in
/// yields [`VaultError::Unavailable`]; an unrecognized name is a plain
/// configuration error. Neither case is a deferred import failure.
pub struct CodecRegistry {
    codecs: BTreeMap<&'static str, Box<dyn ArtifactCodec + Send + Sync>>,
}

impl CodecRegistry {
    /// Populates the registry with every codec available in this build.
    pub fn with_available() -> Self {
        let mut codecs: BTreeMap<&'static str, Box<dyn ArtifactCodec + Send + Sync>> =
            BTreeMap::new();
        codecs.insert("npz", Box::new(NpzCodec));
        codecs.insert("zarr", Box::new(ZarrCodec));
        #[cfg(feature = "hdf5")]
        codecs.insert("hdf5", Box::new(Hdf5Codec));
        Self { codecs }
    }

    /// Resolves a format name to its codec.
    pub fn get(&self, format: &str) -> Result<&(dyn ArtifactCodec + Send + Sync), VaultError> {
        if let Some(codec) = self.codecs.get(format) {
            return Ok(codec.as_ref());
        }
        if KNOWN_FORMATS.contains(&format) {
            return Err(VaultError::Unavailable(
                ErrorDetail::new(
                    "codec-unavailable",
                    "format is recognized but its codec is not compiled into this build",
                )
                .with_context("format", format),
            ));
        }
        Err(VaultError::Config(
            ErrorDetail::new("codec-unknown", "unsupported arrays format")
                .with_context("format", format)
                .with_context("known", KNOWN_FORMATS.join(",")),
        ))
    }

    /// Format names usable in this build, in sorted order.
    pub fn formats(&self) -> Vec<&'static str> {
        self.codecs.keys().copied().collect()
    }
}

impl std::fmt::Debug for CodecRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CodecRegistry")
            .field("formats", &self.formats())
            .finish()
    }
}
