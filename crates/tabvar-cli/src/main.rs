use std::error::Error;
use std::fs;
use std::path::Path;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use commands::{
    init::{self, InitArgs},
    merge::{self, MergeArgs},
    run::{self, RunArgs},
    scan::{self, ScanArgs},
    stats::{self, StatsArgs},
    strip::{self, StripArgs},
};

mod commands;

#[derive(Parser, Debug)]
#[command(name = "tabvar", version, about = "Tabular anomaly variant builder")]
struct Cli {
    /// Log at debug level.
    #[arg(short, long, global = true)]
    verbose: bool,
    /// Log errors only.
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Write a starter run plan.
    Init(InitArgs),
    /// Execute a run plan over a corpus.
    Run(RunArgs),
    /// Print phase-one corpus statistics for a plan.
    Stats(StatsArgs),
    /// List the perturbed cells of one table.
    Scan(ScanArgs),
    /// Merge reconciled tables of one file and emit labels.
    Merge(MergeArgs),
    /// Remove sentinel markers from a table or a directory of tables.
    Strip(StripArgs),
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    setup_logging(cli.verbose, cli.quiet);
    match cli.command {
        Command::Init(args) => init::run(&args),
        Command::Run(args) => run::run(&args),
        Command::Stats(args) => stats::run(&args),
        Command::Scan(args) => scan::run(&args),
        Command::Merge(args) => merge::run(&args),
        Command::Strip(args) => strip::run(&args),
    }
}

fn setup_logging(verbose: bool, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .init();
}

pub(crate) fn write_json<P: AsRef<Path>, T: serde::Serialize>(
    path: P,
    value: &T,
) -> Result<(), Box<dyn Error>> {
    if let Some(parent) = path.as_ref().parent() {
        fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(value)?;
    fs::write(path, json)?;
    Ok(())
}
