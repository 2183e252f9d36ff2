use std::error::Error;
use std::path::PathBuf;

use clap::Args;
use tabvar_pipe::{load_plan, run_plan, RunOpts};

#[derive(Args, Debug)]
pub struct RunArgs {
    /// YAML run plan.
    #[arg(long)]
    pub plan: PathBuf,
    /// Output directory for reconciled, merged and label artefacts.
    #[arg(long)]
    pub out: PathBuf,
    /// Only process these file ids.
    #[arg(long = "file", value_name = "FILE_ID")]
    pub files: Vec<String>,
    /// Process at most this many files.
    #[arg(long)]
    pub limit: Option<usize>,
}

pub fn run(args: &RunArgs) -> Result<(), Box<dyn Error>> {
    let plan = load_plan(&args.plan)?;
    let opts = RunOpts {
        only: args.files.clone(),
        limit: args.limit,
    };
    let report = run_plan(&plan, &args.out, &opts)?;
    let totals = &report.totals;
    println!(
        "{} files: {} complete, {} skipped, {} failed; kept {} of {} perturbed cells ({} positional fallbacks)",
        totals.files,
        totals.complete,
        totals.skipped,
        totals.failed,
        totals.kept,
        totals.perturbed,
        totals.fallbacks
    );
    println!("report written to {}", args.out.join("run_report.json").display());
    Ok(())
}
