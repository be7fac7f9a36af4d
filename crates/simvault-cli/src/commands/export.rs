use std::error::Error;
use std::path::{Path, PathBuf};

use clap::Args;
use simvault_store::RunStore;

#[derive(Args, Debug)]
pub struct ExportArgs {
    pub run_id: String,
    /// Destination file or directory; replaced if it exists.
    #[arg(long)]
    pub to: PathBuf,
}

pub fn run(store_root: &Path, args: &ExportArgs) -> Result<(), Box<dyn Error>> {
    let store = RunStore::open(store_root)?;
    let dest = store.export(&args.run_id, &args.to)?;
    println!("{}", dest.display());
    Ok(())
}
