use std::collections::{BTreeMap, BTreeSet};

use tabvar_core::{Category, CellCoord, PerturbedCellSet, RngHandle};
use tabvar_select::{
    rank_weights, GroupFraction, GroupFractions, GroupStratifiedTwoStep, GroupWeightedStratified,
    GroupWeights, PassThrough, PerformanceGroups, RankWeighted, SelectionPolicy,
};

fn cat(label: &str) -> Category {
    Category::new(label)
}

fn column(col: usize, rows: usize) -> PerturbedCellSet {
    (1..=rows).map(|row| CellCoord::new(row, col).unwrap()).collect()
}

fn kept_count(decision: &tabvar_select::SelectionDecision, label: &str) -> usize {
    decision.kept(&cat(label)).map(BTreeSet::len).unwrap_or_default()
}

fn grouping() -> PerformanceGroups {
    PerformanceGroups {
        under: BTreeSet::from([cat("a"), cat("b")]),
        mid: BTreeSet::from([cat("c")]),
        over: BTreeSet::new(),
    }
}

#[test]
fn rank_table_matches_dense_ranks() {
    let counts = BTreeMap::from([(cat("a"), 1), (cat("b"), 5), (cat("c"), 5), (cat("d"), 9)]);
    let weights = rank_weights(&counts);
    assert_eq!(weights[&cat("a")], 10);
    assert_eq!(weights[&cat("b")], 6);
    assert_eq!(weights[&cat("c")], 6);
    assert_eq!(weights[&cat("d")], 1);

    let single = rank_weights(&BTreeMap::from([(cat("solo"), 7)]));
    assert_eq!(single[&cat("solo")], 10);
    let tied = rank_weights(&BTreeMap::from([(cat("x"), 3), (cat("y"), 3)]));
    assert!(tied.values().all(|weight| *weight == 10));
}

#[test]
fn rank_weighted_keeps_row_major_prefix() {
    let cells = BTreeMap::from([
        (cat("a"), column(1, 1)),
        (cat("b"), column(2, 5)),
        (cat("d"), column(3, 9)),
    ]);
    let decision = RankWeighted
        .select(&cells, 0, &mut RngHandle::from_seed(0))
        .expect("select");
    assert_eq!(kept_count(&decision, "a"), 1);
    // weight 6 of 10 over five cells keeps three
    let kept_b: Vec<_> = decision.kept(&cat("b")).unwrap().iter().copied().collect();
    assert_eq!(kept_b, column(2, 3).as_slice());
    assert_eq!(kept_count(&decision, "d"), 1);
}

#[test]
fn rank_weights_skip_categories_without_cells() {
    let counts = BTreeMap::from([(cat("a"), 0), (cat("b"), 5), (cat("c"), 10)]);
    let weights = rank_weights(&counts);
    assert_eq!(weights[&cat("a")], 0);
    assert_eq!(weights[&cat("b")], 10);
    assert_eq!(weights[&cat("c")], 1);

    let with_empty = BTreeMap::from([
        (cat("a"), PerturbedCellSet::new()),
        (cat("b"), column(2, 5)),
        (cat("c"), column(3, 10)),
    ]);
    let without_empty = BTreeMap::from([(cat("b"), column(2, 5)), (cat("c"), column(3, 10))]);
    let mut rng = RngHandle::from_seed(0);
    let decision = RankWeighted.select(&with_empty, 0, &mut rng).expect("select");
    let baseline = RankWeighted.select(&without_empty, 0, &mut rng).expect("select");
    assert_eq!(kept_count(&decision, "b"), 5);
    assert_eq!(kept_count(&decision, "b"), kept_count(&baseline, "b"));
    assert_eq!(kept_count(&decision, "a"), 0);
    assert!(decision.participates(&cat("a")));
}

#[test]
fn group_fraction_rounds_up_per_category() {
    let groups = PerformanceGroups {
        under: BTreeSet::from([cat("u")]),
        mid: BTreeSet::from([cat("m")]),
        over: BTreeSet::from([cat("o")]),
    };
    let policy = GroupFraction::new(groups, GroupFractions::default()).expect("policy");
    let cells = BTreeMap::from([
        (cat("u"), column(1, 5)),
        (cat("m"), column(2, 5)),
        (cat("o"), column(3, 5)),
        (cat("z"), column(4, 5)),
    ]);
    let decision = policy
        .select(&cells, 0, &mut RngHandle::from_seed(0))
        .expect("select");
    assert_eq!(kept_count(&decision, "u"), 3);
    assert_eq!(kept_count(&decision, "m"), 2);
    assert_eq!(kept_count(&decision, "o"), 1);
    assert!(decision.participates(&cat("z")));
    assert_eq!(kept_count(&decision, "z"), 0);
}

#[test]
fn group_fraction_rejects_out_of_range_fraction() {
    let fractions = GroupFractions {
        under: 1.5,
        ..GroupFractions::default()
    };
    let err = GroupFraction::new(grouping(), fractions).expect_err("fraction");
    assert_eq!(err.info().code, "group_fraction");
}

#[test]
fn pass_through_excludes_unlisted_categories() {
    let cells = BTreeMap::from([(cat("keep"), column(1, 3)), (cat("drop"), column(2, 2))]);
    let decision = PassThrough::new([cat("keep")])
        .select(&cells, 0, &mut RngHandle::from_seed(0))
        .expect("select");
    assert_eq!(kept_count(&decision, "keep"), 3);
    assert!(!decision.participates(&cat("drop")));
}

#[test]
fn group_stratified_draws_each_group_on_its_own() {
    let cells = BTreeMap::from([
        (cat("a"), column(1, 3)),
        (cat("b"), column(2, 1)),
        (cat("c"), column(3, 2)),
        (cat("d"), column(4, 4)),
    ]);
    let policy = GroupStratifiedTwoStep::new(grouping());
    for seed in 0..16 {
        let decision = policy
            .select(&cells, 0, &mut RngHandle::from_seed(seed))
            .expect("select");
        assert_eq!(kept_count(&decision, "a") + kept_count(&decision, "b"), 3);
        assert_eq!(kept_count(&decision, "c"), 2);
        assert_eq!(kept_count(&decision, "d"), 0);
    }
}

#[test]
fn group_stratified_keeps_everything_when_target_covers_the_file() {
    let cells = BTreeMap::from([(cat("a"), column(1, 3)), (cat("b"), column(2, 3))]);
    let policy = GroupStratifiedTwoStep::new(grouping());
    assert!(policy.uses_target());
    let decision = policy
        .select(&cells, 100, &mut RngHandle::from_seed(4))
        .expect("select");
    assert_eq!(decision.total_kept(), 6);

    let partial = policy
        .select(&cells, 5, &mut RngHandle::from_seed(4))
        .expect("select");
    assert_eq!(partial.total_kept(), 3);
}

#[test]
fn group_weighted_draws_from_the_heavy_group_first() {
    let weights = GroupWeights {
        under: 1.0,
        mid: 0.0,
        over: 0.0,
    };
    let policy = GroupWeightedStratified::new(grouping(), weights);
    let cells = BTreeMap::from([
        (cat("a"), column(1, 1)),
        (cat("b"), column(2, 1)),
        (cat("c"), column(3, 5)),
    ]);
    let decision = policy
        .select(&cells, 2, &mut RngHandle::from_seed(5))
        .expect("select");
    assert_eq!(kept_count(&decision, "a"), 1);
    assert_eq!(kept_count(&decision, "b"), 1);
    assert_eq!(kept_count(&decision, "c"), 0);

    let spill = policy
        .select(&cells, 4, &mut RngHandle::from_seed(5))
        .expect("select");
    assert_eq!(kept_count(&spill, "c"), 2);
}

#[test]
fn group_weighted_keeps_grouped_cells_when_target_covers_them() {
    let policy = GroupWeightedStratified::new(grouping(), GroupWeights::uniform());
    let cells = BTreeMap::from([
        (cat("a"), column(1, 2)),
        (cat("c"), column(2, 2)),
        (cat("loose"), column(3, 3)),
    ]);
    let decision = policy
        .select(&cells, 4, &mut RngHandle::from_seed(9))
        .expect("select");
    assert_eq!(kept_count(&decision, "a"), 2);
    assert_eq!(kept_count(&decision, "c"), 2);
    assert!(decision.participates(&cat("loose")));
    assert_eq!(kept_count(&decision, "loose"), 0);
}
