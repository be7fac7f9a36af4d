use serde::Serialize;

use crate::errors::{ErrorDetail, VaultError};

/// Encodes a serializable value as canonical JSON bytes.
///
/// The value is first lifted into a [`serde_json::Value`] tree, whose object
/// representation sorts keys, then written compactly with no insignificant
/// whitespace. Semantically equal inputs therefore encode byte-for-byte
/// identically regardless of field or insertion order.
pub fn to_canonical_json_bytes<T: Serialize>(value: &T) -> Result<Vec<u8>, VaultError> {
    let tree = serde_json::to_value(value)
        .map_err(|err| VaultError::Serde(ErrorDetail::new("canonical-encode", err.to_string())))?;
    serde_json::to_vec(&tree)
        .map_err(|err| VaultError::Serde(ErrorDetail::new("canonical-write", err.to_string())))
}
