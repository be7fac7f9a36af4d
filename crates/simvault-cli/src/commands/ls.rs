use std::error::Error;
use std::path::Path;

use simvault_store::RunStore;

pub fn run(store_root: &Path) -> Result<(), Box<dyn Error>> {
    let store = RunStore::open(store_root)?;
    for run in store.list_runs()? {
        let timestamp = run.timestamp.as_deref().unwrap_or("-");
        if run.tags.is_empty() {
            println!("{} {}", run.run_id, timestamp);
        } else {
            println!("{} {} [{}]", run.run_id, timestamp, run.tags.join(","));
        }
    }
    Ok(())
}
