use std::fs;

use tabvar_core::Category;
use tabvar_pipe::plan::{load_plan, GroupingSpec, PolicySpec};
use tabvar_select::{RetentionTarget, ScoreMapping};

const WEIGHTED_PLAN: &str = r#"
corpus:
  root: corpus
  category_suffix: _WikiTQ
seed: 2025
target:
  kind: fraction-of-rows
  value: 0.3
policy:
  kind: group-weighted-stratified
  grouping:
    mode: explicit
    under: [Security]
    mid: [Temporal]
    over: [Calculation]
  scores:
    Security: 0.2
    Temporal: 0.5
    Calculation: 0.9
  mapping: inverted
outputs:
  strip: true
"#;

#[test]
fn plan_defaults_and_paths_resolve() {
    let dir = tempfile::tempdir().expect("tmp dir");
    let path = dir.path().join("plan.yaml");
    fs::write(&path, WEIGHTED_PLAN).expect("write plan");
    let plan = load_plan(&path).expect("plan loads");

    assert_eq!(plan.seed, 2025);
    assert_eq!(plan.sentinel, "@@@_");
    assert_eq!(plan.corpus.baseline_dir, "Ground_truth");
    assert_eq!(plan.corpus.variant_suffix, "_updated");
    assert_eq!(plan.corpus.category_suffix.as_deref(), Some("_WikiTQ"));
    assert_eq!(plan.corpus_root(), dir.path().join("corpus"));
    assert_eq!(plan.target, RetentionTarget::FractionOfRows(0.3));
    assert!(plan.outputs.strip);
    assert!(plan.outputs.reconciled);
    assert!(plan.policy.needs_corpus_stats());
    match &plan.policy {
        PolicySpec::GroupWeightedStratified {
            grouping,
            mapping,
            epsilon,
            ..
        } => {
            assert!(matches!(grouping, GroupingSpec::Explicit(_)));
            assert_eq!(*mapping, ScoreMapping::Inverted);
            assert_eq!(*epsilon, 1e-6);
        }
        other => panic!("unexpected policy {other:?}"),
    }
}

#[test]
fn plan_yaml_roundtrip_keeps_hash() {
    let dir = tempfile::tempdir().expect("tmp dir");
    let path = dir.path().join("plan.yaml");
    fs::write(&path, WEIGHTED_PLAN).expect("write plan");
    let plan = load_plan(&path).expect("plan loads");

    let serialized = plan.to_yaml_string().expect("serialize");
    let copy = dir.path().join("copy.yaml");
    fs::write(&copy, &serialized).expect("write copy");
    let reloaded = load_plan(&copy).expect("reload");

    assert_eq!(plan, reloaded);
    assert_eq!(plan.plan_hash().unwrap(), reloaded.plan_hash().unwrap());
    assert_eq!(plan.plan_hash().unwrap().len(), 64);
}

#[test]
fn plan_hash_tracks_content() {
    let dir = tempfile::tempdir().expect("tmp dir");
    let path = dir.path().join("plan.yaml");
    fs::write(&path, WEIGHTED_PLAN).expect("write plan");
    let plan = load_plan(&path).expect("plan loads");
    let mut reseeded = plan.clone();
    reseeded.seed += 1;
    assert_ne!(plan.plan_hash().unwrap(), reseeded.plan_hash().unwrap());
}

#[test]
fn invalid_plans_are_rejected() {
    let dir = tempfile::tempdir().expect("tmp dir");
    let path = dir.path().join("plan.yaml");

    fs::write(
        &path,
        "corpus: {root: c}\nseed: 1\ntarget: {kind: fraction-of-rows, value: 2.0}\npolicy: {kind: uniform-two-step}\n",
    )
    .expect("write");
    let err = load_plan(&path).expect_err("fraction out of range");
    assert_eq!(err.info().code, "target_fraction");

    fs::write(&path, "corpus: {root: c}\nseed: 1\npolicy: {kind: coin-flip}\n").expect("write");
    let err = load_plan(&path).expect_err("unknown policy");
    assert_eq!(err.info().code, "yaml_deserialize");

    let err = load_plan(dir.path().join("missing.yaml")).expect_err("missing file");
    assert_eq!(err.info().code, "plan_read");
}

#[test]
fn structural_policy_rejects_zero_budget_at_build() {
    let policy = PolicySpec::StructuralExclusivity { column_budget: 0 };
    let err = policy.build(None).err().expect("zero budget");
    assert_eq!(err.info().code, "column_budget");
}

#[test]
fn percentile_grouping_uses_scores() {
    let grouping = GroupingSpec::Percentile {
        high: 90.0,
        low: 40.0,
    };
    let scores = [("a", 0.1), ("b", 0.5), ("c", 0.9)]
        .into_iter()
        .map(|(label, score)| (Category::new(label), score))
        .collect();
    let groups = grouping.resolve(&scores).expect("groups");
    assert!(groups.over.contains(&Category::new("c")));
    assert!(groups.mid.contains(&Category::new("b")));
    assert!(groups.under.contains(&Category::new("a")));
}
