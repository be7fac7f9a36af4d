//! Parameter and grid file loading (JSON or YAML, by extension).

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde_json::Value;
use simvault_core::{ErrorDetail, VaultError};

fn read_text(path: &Path) -> Result<String, VaultError> {
    fs::read_to_string(path).map_err(|err| VaultError::io("params-read", &err, path.display()))
}

/// Deserializes a JSON or YAML document into `T`.
pub fn load_document<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, VaultError> {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();
    let text = read_text(path)?;
    match extension.as_str() {
        "json" => serde_json::from_str(&text).map_err(|err| {
            VaultError::Config(
                ErrorDetail::new("params-json", err.to_string())
                    .with_context("path", path.display().to_string()),
            )
        }),
        "yml" | "yaml" => serde_yaml::from_str(&text).map_err(|err| {
            VaultError::Config(
                ErrorDetail::new("params-yaml", err.to_string())
                    .with_context("path", path.display().to_string()),
            )
        }),
        other => Err(VaultError::Config(
            ErrorDetail::new("params-extension", "unsupported parameter file type")
                .with_context("extension", other)
                .with_context("path", path.display().to_string()),
        )),
    }
}

/// Loads a parameter mapping; an absent path means no parameters.
pub fn load_mapping(path: Option<&Path>) -> Result<BTreeMap<String, Value>, VaultError> {
    match path {
        Some(path) => load_document(path),
        None => Ok(BTreeMap::new()),
    }
}
