use std::collections::{BTreeMap, BTreeSet};

use serde_json::json;
use tabvar_core::{Category, Sentinel, Table};
use tabvar_pipe::{process_file, FileInputs, FileState};
use tabvar_select::{
    GroupFraction, GroupFractions, PerformanceGroups, RetentionTarget, UniformTwoStep,
};

fn table(value: serde_json::Value) -> Table {
    Table::from_json(value).expect("table")
}

fn scenario_inputs() -> FileInputs {
    FileInputs {
        file_id: "10037".to_string(),
        baseline: table(json!([{"A": 1, "B": "x"}, {"A": 2, "B": "y"}])),
        variants: BTreeMap::from([
            (
                Category::new("c1"),
                table(json!([{"A": 1, "B": "@@@_z"}, {"A": 2, "B": "y"}])),
            ),
            (
                Category::new("c2"),
                table(json!([{"A": 1, "B": "x"}, {"A": "@@@_99", "B": "y"}])),
            ),
        ]),
        skipped: Vec::new(),
    }
}

#[test]
fn kept_marker_survives_and_unkept_reverts() {
    // c1 keeps its single cell, c2 keeps none
    let groups = PerformanceGroups {
        under: BTreeSet::from([Category::new("c1")]),
        mid: BTreeSet::new(),
        over: BTreeSet::from([Category::new("c2")]),
    };
    let fractions = GroupFractions {
        under: 1.0,
        mid: 0.5,
        over: 0.0,
    };
    let policy = GroupFraction::new(groups, fractions).expect("policy");
    let artifacts = process_file(
        scenario_inputs(),
        &policy,
        &RetentionTarget::Absolute(1),
        &Sentinel::default(),
        1,
    )
    .expect("process");

    let merged = artifacts.merged.expect("merged");
    assert_eq!(
        merged.table.to_json(),
        json!([{"A": 1, "B": "@@@_z"}, {"A": 2, "B": "y"}])
    );
    assert_eq!(
        serde_json::to_value(&merged.labels).unwrap(),
        json!([{"index": 0, "categories": ["c1"]}, {"index": 1, "categories": []}])
    );
    assert_eq!(
        artifacts.reconciled[&Category::new("c2")].to_json()[1],
        json!({"A": 2, "B": "y"})
    );
    let summary = artifacts.summary;
    assert_eq!(summary.status, FileState::Complete);
    assert_eq!(summary.target, None);
    assert_eq!(summary.kept(), 1);
    assert_eq!(
        summary.categories[&Category::new("c1")].kept_cells[0].to_string(),
        "R1C2"
    );
}

#[test]
fn uniform_draw_with_target_one_keeps_exactly_one_marker() {
    for seed in 0..8 {
        let artifacts = process_file(
            scenario_inputs(),
            &UniformTwoStep,
            &RetentionTarget::Absolute(1),
            &Sentinel::default(),
            seed,
        )
        .expect("process");
        let merged = artifacts.merged.expect("merged");
        assert_eq!(merged.anomalous_rows(), 1);
        assert_eq!(artifacts.summary.kept(), 1);
        assert_eq!(artifacts.summary.target, Some(1));
    }
}

#[test]
fn files_without_markers_are_skipped() {
    let mut inputs = scenario_inputs();
    inputs.variants = BTreeMap::from([(
        Category::new("c1"),
        table(json!([{"A": 1, "B": "x"}, {"A": 2, "B": "y"}])),
    )]);
    let artifacts = process_file(
        inputs,
        &UniformTwoStep,
        &RetentionTarget::MaxCategory,
        &Sentinel::default(),
        0,
    )
    .expect("process");
    assert_eq!(artifacts.summary.status, FileState::Skipped);
    assert_eq!(
        artifacts.summary.reason.as_deref(),
        Some("no perturbed cells in any category")
    );
    assert!(artifacts.summary.error.is_none());
    assert!(artifacts.merged.is_none());
}
