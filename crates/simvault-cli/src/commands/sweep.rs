use std::error::Error;
use std::path::{Path, PathBuf};

use clap::Args;
use simvault_store::{RunStore, SweepGrid};

use crate::fingerprint;
use crate::params;

#[derive(Args, Debug)]
pub struct SweepArgs {
    /// Path to a JSON or YAML sweep grid.
    pub grid: PathBuf,
}

/// Enumerates the grid and prints one line per job: run id, cache status,
/// seed, and parameters. Execution of pending jobs belongs to an external
/// orchestrator driving `run_sweep` with its simulation function.
pub fn run(store_root: &Path, no_git: bool, args: &SweepArgs) -> Result<(), Box<dyn Error>> {
    let store = RunStore::open(store_root)?;
    let grid: SweepGrid = params::load_document(&args.grid)?;
    let code_version = if no_git {
        None
    } else {
        fingerprint::git_commit(Path::new("."))
    };
    let env = fingerprint::collect_env();

    let mut cached = 0usize;
    let mut pending = 0usize;
    for (job_params, seed) in grid.iter() {
        let run_id = store.compute_run_id(&job_params, seed, code_version.as_deref(), &env)?;
        let status = if store.exists(&run_id) {
            cached += 1;
            "cached"
        } else {
            pending += 1;
            "pending"
        };
        let rendered = serde_json::to_string(&job_params)?;
        println!("{run_id} {status} seed={seed} {rendered}");
    }
    println!("cached={cached} pending={pending}");
    Ok(())
}
