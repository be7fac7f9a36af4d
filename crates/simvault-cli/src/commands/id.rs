use std::error::Error;
use std::path::{Path, PathBuf};

use clap::Args;
use simvault_store::RunStore;

use crate::fingerprint;
use crate::params;

#[derive(Args, Debug)]
pub struct IdArgs {
    /// Path to a JSON or YAML parameter file.
    #[arg(long)]
    pub params: Option<PathBuf>,
    #[arg(long, default_value_t = 0)]
    pub seed: u64,
}

pub fn run(store_root: &Path, no_git: bool, args: &IdArgs) -> Result<(), Box<dyn Error>> {
    let store = RunStore::open(store_root)?;
    let params = params::load_mapping(args.params.as_deref())?;
    let code_version = if no_git {
        None
    } else {
        fingerprint::git_commit(Path::new("."))
    };
    let env = fingerprint::collect_env();
    let run_id = store.compute_run_id(&params, args.seed, code_version.as_deref(), &env)?;
    println!("{run_id}");
    Ok(())
}
