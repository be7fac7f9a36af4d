use std::collections::BTreeMap;

use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::canon::to_canonical_json_bytes;
use crate::errors::{ErrorDetail, VaultError};
use crate::value::CanonValue;

/// Default identifier prefix length in hex characters.
///
/// Twelve characters bound uniqueness to roughly 2^48 identifiers before
/// collisions become likely; short readable ids are preferred over full
/// collision resistance, and the length stays configurable for deployments
/// that weigh the trade-off differently.
pub const DEFAULT_ID_LEN: usize = 12;

/// Upper bound on the identifier length: a full SHA-256 hex digest.
pub const MAX_ID_LEN: usize = 64;

/// The complete hashing input identifying one simulation run.
///
/// Field names are part of the canonical encoding and must not change: the
/// digest covers the JSON object `{code_version, env, params, seed}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunSpec {
    pub code_version: Option<String>,
    pub env: BTreeMap<String, CanonValue>,
    pub params: BTreeMap<String, CanonValue>,
    pub seed: u64,
}

impl RunSpec {
    /// Assembles a specification from JSON-valued parameter and environment
    /// mappings, normalizing every value into the canonical model.
    pub fn new(
        params: &BTreeMap<String, serde_json::Value>,
        seed: u64,
        code_version: Option<&str>,
        env: &BTreeMap<String, serde_json::Value>,
    ) -> Self {
        Self {
            code_version: code_version.map(str::to_string),
            env: CanonValue::map_from_json(env),
            params: CanonValue::map_from_json(params),
            seed,
        }
    }
}

/// Derives the run identifier: SHA-256 over the canonical encoding of the
/// specification, lowercase hex, truncated to `id_len` characters.
///
/// This is the single code path used both when computing an id for a new run
/// and when checking whether a run already exists; any asymmetry between the
/// two would silently break cache hits.
pub fn derive_run_id(spec: &RunSpec, id_len: usize) -> Result<String, VaultError> {
    if id_len == 0 || id_len > MAX_ID_LEN {
        return Err(VaultError::Config(
            ErrorDetail::new("id-length", "run id length must be between 1 and 64")
                .with_context("requested", id_len.to_string()),
        ));
    }
    let bytes = to_canonical_json_bytes(spec)?;
    let digest = hex::encode(Sha256::digest(bytes));
    Ok(digest[..id_len].to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn spec_with_steps(steps: i64) -> RunSpec {
        let mut params = BTreeMap::new();
        params.insert("steps".to_string(), json!(steps));
        RunSpec::new(&params, 3, Some("abc123"), &BTreeMap::new())
    }

    #[test]
    fn default_length_is_twelve() {
        let id = derive_run_id(&spec_with_steps(5), DEFAULT_ID_LEN).unwrap();
        assert_eq!(id.len(), 12);
        assert!(id.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn zero_length_is_rejected() {
        let err = derive_run_id(&spec_with_steps(5), 0).unwrap_err();
        assert!(matches!(err, VaultError::Config(_)));
    }

    #[test]
    fn longer_prefixes_extend_shorter_ones() {
        let short = derive_run_id(&spec_with_steps(5), 12).unwrap();
        let long = derive_run_id(&spec_with_steps(5), 64).unwrap();
        assert!(long.starts_with(&short));
    }
}
