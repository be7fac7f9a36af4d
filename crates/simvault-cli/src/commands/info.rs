use std::error::Error;
use std::path::Path;

use clap::Args;
use simvault_store::RunStore;

#[derive(Args, Debug)]
pub struct InfoArgs {
    pub run_id: String,
}

pub fn run(store_root: &Path, args: &InfoArgs) -> Result<(), Box<dyn Error>> {
    let store = RunStore::open(store_root)?;
    let metadata = store.info(&args.run_id)?;
    let tree = serde_json::to_value(&metadata)?;
    println!("{}", serde_json::to_string_pretty(&tree)?);
    Ok(())
}
