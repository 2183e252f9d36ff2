use std::error::Error;
use std::path::PathBuf;

use clap::Args;
use tabvar_core::{Sentinel, DEFAULT_SENTINEL};
use tabvar_pipe::read_table;
use tabvar_select::scan;

#[derive(Args, Debug)]
pub struct ScanArgs {
    /// JSON table to scan.
    #[arg(long)]
    pub table: PathBuf,
    /// Marker token.
    #[arg(long, default_value = DEFAULT_SENTINEL)]
    pub sentinel: String,
}

pub fn run(args: &ScanArgs) -> Result<(), Box<dyn Error>> {
    let table = read_table(&args.table)?;
    let cells = scan(&table, &Sentinel::new(args.sentinel.clone()));
    println!("{}", serde_json::to_string(&cells)?);
    Ok(())
}
