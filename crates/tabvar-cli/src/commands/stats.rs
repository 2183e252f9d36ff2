use std::error::Error;
use std::path::PathBuf;

use clap::Args;
use serde_json::json;
use tabvar_pipe::{collect_corpus_stats, load_plan, CorpusLayout};

use crate::write_json;

#[derive(Args, Debug)]
pub struct StatsArgs {
    /// YAML run plan describing the corpus.
    #[arg(long)]
    pub plan: PathBuf,
    /// Write the statistics here instead of printing them.
    #[arg(long)]
    pub out: Option<PathBuf>,
}

pub fn run(args: &StatsArgs) -> Result<(), Box<dyn Error>> {
    let plan = load_plan(&args.plan)?;
    let layout = CorpusLayout::discover(&plan.corpus, &plan.corpus_root())?;
    let file_ids = layout.file_ids()?;
    let stats = collect_corpus_stats(&layout, &file_ids, &plan.sentinel());

    let mut payload = json!({ "corpus": stats });
    if plan.policy.needs_corpus_stats() {
        let built = plan.policy.build(Some(&stats))?;
        payload["groups"] = serde_json::to_value(&built.groups)?;
        payload["group_weights"] = serde_json::to_value(built.weights)?;
    }
    match &args.out {
        Some(path) => write_json(path, &payload)?,
        None => println!("{}", serde_json::to_string_pretty(&payload)?),
    }
    Ok(())
}
