//! Canonical hashing of simulation run specifications.
//!
//! A run is identified by the SHA-256 digest of a canonical JSON encoding of
//! its parameters, seed, code version, and environment descriptor, truncated
//! to a short hex prefix. Two semantically equal specifications encode to
//! byte-identical payloads regardless of key order or container type, so the
//! derived identifier is stable across processes and machines.

mod canon;
mod errors;
mod spec;
mod value;

pub use canon::to_canonical_json_bytes;
pub use errors::{ErrorDetail, VaultError};
pub use spec::{derive_run_id, RunSpec, DEFAULT_ID_LEN, MAX_ID_LEN};
pub use value::CanonValue;
