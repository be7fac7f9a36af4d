//! Convenience handles: one lazily-constructed store per distinct root.
//!
//! An explicit [`RunStore`] threaded through calls is the primary API; this
//! module only spares callers that open the same root repeatedly. Handles
//! are keyed by the root path as given and never shared across differing
//! roots.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, OnceLock};

use simvault_core::VaultError;

use crate::store::{RunRecord, RunStore};

static STORES: OnceLock<Mutex<BTreeMap<PathBuf, Arc<RunStore>>>> = OnceLock::new();

/// Returns the shared handle for `root`, opening the store on first use.
pub fn store_for(root: impl AsRef<Path>) -> Result<Arc<RunStore>, VaultError> {
    let root = root.as_ref().to_path_buf();
    let stores = STORES.get_or_init(|| Mutex::new(BTreeMap::new()));
    let mut guard = match stores.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    };
    if let Some(store) = guard.get(&root) {
        return Ok(Arc::clone(store));
    }
    let store = Arc::new(RunStore::open(&root)?);
    guard.insert(root, Arc::clone(&store));
    Ok(store)
}

/// Loads one run from the shared store at `root`.
pub fn load(root: impl AsRef<Path>, run_id: &str) -> Result<RunRecord, VaultError> {
    store_for(root)?.load(run_id)
}

/// Loads the most recent run carrying `tag` from the shared store at `root`.
pub fn load_latest(root: impl AsRef<Path>, tag: &str) -> Result<Option<RunRecord>, VaultError> {
    store_for(root)?.load_latest(tag)
}
