use std::error::Error;
use std::path::{Path, PathBuf};

use clap::Args;
use tabvar_core::{Sentinel, DEFAULT_SENTINEL};
use tabvar_pipe::read_table;
use tabvar_reconcile::strip_markers;
use tracing::debug;
use walkdir::WalkDir;

use crate::write_json;

#[derive(Args, Debug)]
pub struct StripArgs {
    /// JSON table, or a directory of JSON tables.
    #[arg(long)]
    pub input: PathBuf,
    /// Output file, or output directory when the input is a directory.
    #[arg(long)]
    pub out: PathBuf,
    /// Marker token.
    #[arg(long, default_value = DEFAULT_SENTINEL)]
    pub sentinel: String,
}

pub fn run(args: &StripArgs) -> Result<(), Box<dyn Error>> {
    let sentinel = Sentinel::new(args.sentinel.clone());
    if !args.input.is_dir() {
        strip_file(&args.input, &args.out, &sentinel)?;
        return Ok(());
    }
    let mut count = 0;
    for entry in WalkDir::new(&args.input)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
    {
        let entry = entry?;
        let path = entry.path();
        if !entry.file_type().is_file() || path.extension().and_then(|e| e.to_str()) != Some("json")
        {
            continue;
        }
        strip_file(path, &args.out.join(entry.file_name()), &sentinel)?;
        count += 1;
    }
    println!("stripped {count} tables into {}", args.out.display());
    Ok(())
}

fn strip_file(input: &Path, out: &Path, sentinel: &Sentinel) -> Result<(), Box<dyn Error>> {
    let table = read_table(input)?;
    let stripped = strip_markers(&table, sentinel)?;
    debug!(input = %input.display(), rows = stripped.len(), "stripped table");
    write_json(out, &stripped.to_json())
}
