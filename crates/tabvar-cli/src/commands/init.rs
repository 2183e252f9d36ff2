use std::error::Error;
use std::path::PathBuf;

use clap::{Args, ValueEnum};
use tabvar_pipe::plan::{save_plan, CorpusSpec, OutputSpec, Plan, PolicySpec};
use tabvar_select::{RetentionTarget, DEFAULT_COLUMN_BUDGET};

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum StarterPolicy {
    /// Uniform two-step draw.
    Uniform,
    /// One cell per row, bounded per column.
    Structural,
    /// Proportional keep by count rank.
    Rank,
}

#[derive(Args, Debug)]
pub struct InitArgs {
    /// Destination path for the plan YAML.
    #[arg(long)]
    pub out: PathBuf,
    /// Corpus root written into the plan.
    #[arg(long, default_value = "corpus")]
    pub corpus: PathBuf,
    /// Master seed.
    #[arg(long, default_value_t = 0)]
    pub seed: u64,
    /// Selection policy of the starter plan.
    #[arg(long, value_enum, default_value_t = StarterPolicy::Uniform)]
    pub policy: StarterPolicy,
    /// Suffix stripped from category directory names.
    #[arg(long)]
    pub category_suffix: Option<String>,
}

pub fn run(args: &InitArgs) -> Result<(), Box<dyn Error>> {
    let policy = match args.policy {
        StarterPolicy::Uniform => PolicySpec::UniformTwoStep,
        StarterPolicy::Structural => PolicySpec::StructuralExclusivity {
            column_budget: DEFAULT_COLUMN_BUDGET,
        },
        StarterPolicy::Rank => PolicySpec::RankWeighted,
    };
    let plan = Plan {
        corpus: CorpusSpec {
            root: args.corpus.clone(),
            baseline_dir: "Ground_truth".to_string(),
            variant_suffix: "_updated".to_string(),
            category_suffix: args.category_suffix.clone(),
            categories: Vec::new(),
        },
        seed: args.seed,
        sentinel: tabvar_core::DEFAULT_SENTINEL.to_string(),
        target: RetentionTarget::default(),
        policy,
        outputs: OutputSpec::default(),
        base_dir: PathBuf::new(),
    };
    if let Some(parent) = args.out.parent() {
        std::fs::create_dir_all(parent)?;
    }
    save_plan(&plan, &args.out)?;
    println!("plan written to {}", args.out.display());
    Ok(())
}
