//! Environment and code-version fingerprinting.
//!
//! Both outputs are opaque to the store: the environment is a string map
//! folded into the run specification, and the code version is a short git
//! hash or `None` when the lookup degrades (no git binary, not a repo).

use std::collections::BTreeMap;
use std::path::Path;
use std::process::Command;

use serde_json::{json, Value};

/// Short git commit hash for the repository containing `path`, or `None`.
pub fn git_commit(path: &Path) -> Option<String> {
    let dir = if path.is_file() {
        path.parent().unwrap_or(Path::new("."))
    } else {
        path
    };
    let output = Command::new("git")
        .args(["-C"])
        .arg(dir)
        .args(["rev-parse", "--short", "HEAD"])
        .output()
        .ok()?;
    if !output.status.success() {
        return None;
    }
    let commit = String::from_utf8_lossy(&output.stdout).trim().to_string();
    if commit.is_empty() {
        None
    } else {
        Some(commit)
    }
}

/// Opaque descriptor of the executing environment.
pub fn collect_env() -> BTreeMap<String, Value> {
    let mut env = BTreeMap::new();
    env.insert(
        "package_version".to_string(),
        json!(env!("CARGO_PKG_VERSION")),
    );
    env.insert(
        "platform".to_string(),
        json!(format!(
            "{}-{}",
            std::env::consts::OS,
            std::env::consts::ARCH
        )),
    );
    env
}
