//! Structured error types shared across the simvault crates.

use std::collections::BTreeMap;
use std::fmt::{self, Display};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Structured payload attached to every [`VaultError`] variant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorDetail {
    /// Stable machine readable error code.
    pub code: String,
    /// Human readable diagnostic message.
    pub message: String,
    /// Contextual key value pairs (paths, identifiers, format names).
    #[serde(default)]
    pub context: BTreeMap<String, String>,
}

impl ErrorDetail {
    /// Creates a new error payload with the provided code and message.
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            context: BTreeMap::new(),
        }
    }

    /// Adds a context entry to the payload.
    pub fn with_context(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.context.insert(key.into(), value.into());
        self
    }
}

impl Display for ErrorDetail {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}]", self.message, self.code)?;
        for (key, value) in &self.context {
            write!(f, " {key}={value}")?;
        }
        Ok(())
    }
}

/// Canonical error type for the simvault cache.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
#[serde(tag = "family", content = "detail")]
pub enum VaultError {
    /// Invalid configuration: unknown format name, malformed grid, bad id length.
    #[error("config error: {0}")]
    Config(ErrorDetail),
    /// A run identifier was not present in the store.
    #[error("not found: {0}")]
    NotFound(ErrorDetail),
    /// A simulation result violated the artifacts/metadata contract.
    #[error("validation error: {0}")]
    Validation(ErrorDetail),
    /// A recognized codec whose backing library is not compiled in.
    #[error("codec unavailable: {0}")]
    Unavailable(ErrorDetail),
    /// Filesystem failures, propagated without retry.
    #[error("io error: {0}")]
    Io(ErrorDetail),
    /// JSON or canonical encoding failures.
    #[error("serde error: {0}")]
    Serde(ErrorDetail),
}

impl VaultError {
    /// Returns a reference to the payload describing the error.
    pub fn detail(&self) -> &ErrorDetail {
        match self {
            VaultError::Config(detail)
            | VaultError::NotFound(detail)
            | VaultError::Validation(detail)
            | VaultError::Unavailable(detail)
            | VaultError::Io(detail)
            | VaultError::Serde(detail) => detail,
        }
    }

    /// Builds an [`VaultError::Io`] from a filesystem error and path.
    pub fn io(code: impl Into<String>, err: &std::io::Error, path: impl Display) -> Self {
        VaultError::Io(
            ErrorDetail::new(code, err.to_string()).with_context("path", path.to_string()),
        )
    }
}
