use std::collections::BTreeMap;
use std::error::Error;
use std::path::PathBuf;

use clap::Args;
use tabvar_core::{Category, Sentinel, DEFAULT_SENTINEL};
use tabvar_pipe::read_table;
use tabvar_reconcile::merge;

use crate::write_json;

#[derive(Args, Debug)]
pub struct MergeArgs {
    /// Reconciled table of one category, as CATEGORY=PATH. Repeatable.
    #[arg(long = "input", value_name = "CATEGORY=PATH", required = true)]
    pub inputs: Vec<String>,
    /// File id used for the output names.
    #[arg(long)]
    pub file_id: String,
    /// Output directory; receives `Merged/` and `labels/`.
    #[arg(long)]
    pub out: PathBuf,
    /// Marker token.
    #[arg(long, default_value = DEFAULT_SENTINEL)]
    pub sentinel: String,
}

pub fn run(args: &MergeArgs) -> Result<(), Box<dyn Error>> {
    let mut tables = BTreeMap::new();
    for input in &args.inputs {
        let (category, path) = input
            .split_once('=')
            .ok_or_else(|| format!("expected CATEGORY=PATH, got `{input}`"))?;
        tables.insert(Category::new(category), read_table(&PathBuf::from(path))?);
    }
    let merged = merge(&args.file_id, &tables, &Sentinel::new(args.sentinel.clone()))?;

    write_json(
        args.out.join("Merged").join(format!("{}.json", args.file_id)),
        &merged.table.to_json(),
    )?;
    write_json(
        args.out
            .join("labels")
            .join(format!("{}_labels.json", args.file_id)),
        &merged.labels,
    )?;
    println!(
        "{} unique rows, {} anomalous",
        merged.table.len(),
        merged.anomalous_rows()
    );
    Ok(())
}
