//! Filesystem run store for cached simulation outputs.
//!
//! A store owns one root directory: `manifest.json` at the top plus one
//! subdirectory per run under `runs/`, each holding a key-sorted
//! `metadata.json` and the run's arrays in one of the registered codec
//! formats. Run identifiers come from [`simvault_core`]'s canonical hashing,
//! so the store never recomputes what it has already seen.

mod array;
mod codec;
mod manifest;
mod metadata;
mod runner;
pub mod shared;
mod store;
mod sweep;

pub use array::{ArrayData, ArtifactArray, ArtifactSet, DType};
pub use codec::{ArtifactCodec, CodecRegistry, KNOWN_FORMATS};
pub use manifest::{Manifest, ManifestEntry};
pub use metadata::RunMetadata;
pub use runner::{run_cached, run_sweep, RunOptions, RunOutcome, SimOutput, SweepOutcome};
pub use store::{RunRecord, RunStore, RunSummary};
pub use sweep::{SweepGrid, SweepIter};
