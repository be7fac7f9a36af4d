use std::path::PathBuf;

use clap::{Parser, Subcommand};
use commands::{export, id, info, ls, sweep};

mod commands;
mod fingerprint;
mod params;

#[derive(Parser, Debug)]
#[command(name = "simvault", about = "Content-addressed cache for simulation runs")]
struct Cli {
    /// Path to the store root.
    #[arg(long, global = true, default_value = ".simvault")]
    store: PathBuf,
    /// Ignore the git commit when deriving run ids.
    #[arg(long, global = true)]
    no_git: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Compute the run id for a parameter file and seed.
    Id(id::IdArgs),
    /// List cached runs.
    Ls,
    /// Show one run's metadata.
    Info(info::InfoArgs),
    /// Export a run's arrays to an external destination.
    Export(export::ExportArgs),
    /// Enumerate a sweep grid and report each job's cache status.
    Sweep(sweep::SweepArgs),
}

fn main() {
    let cli = Cli::parse();
    let result = match &cli.command {
        Command::Id(args) => id::run(&cli.store, cli.no_git, args),
        Command::Ls => ls::run(&cli.store),
        Command::Info(args) => info::run(&cli.store, args),
        Command::Export(args) => export::run(&cli.store, args),
        Command::Sweep(args) => sweep::run(&cli.store, cli.no_git, args),
    };
    if let Err(err) = result {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}
