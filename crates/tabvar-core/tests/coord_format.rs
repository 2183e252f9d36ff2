use std::collections::BTreeSet;

use proptest::prelude::*;
use tabvar_core::{CellCoord, PerturbedCellSet};

#[test]
fn coordinates_render_and_parse() {
    let coord: CellCoord = "R12C3".parse().expect("parse");
    assert_eq!(coord.row(), 12);
    assert_eq!(coord.col(), 3);
    assert_eq!(coord.to_string(), "R12C3");
    assert!("R0C1".parse::<CellCoord>().is_err());
    assert!("12C3".parse::<CellCoord>().is_err());
    assert!("R1Cx".parse::<CellCoord>().is_err());
}

#[test]
fn coordinates_serialize_as_strings() {
    let coord = CellCoord::new(2, 5).expect("coord");
    let json = serde_json::to_string(&coord).expect("serialize");
    assert_eq!(json, "\"R2C5\"");
    let back: CellCoord = serde_json::from_str(&json).expect("deserialize");
    assert_eq!(back, coord);
}

#[test]
fn coordinates_order_row_major() {
    let a = CellCoord::new(1, 9).expect("a");
    let b = CellCoord::new(2, 1).expect("b");
    assert!(a < b);
}

proptest! {
    #[test]
    fn perturbed_sets_are_sorted_and_unique(raw in proptest::collection::vec((1usize..20, 1usize..6), 0..40)) {
        let coords: Vec<CellCoord> = raw
            .iter()
            .map(|(row, col)| CellCoord::new(*row, *col).unwrap())
            .collect();
        let set: PerturbedCellSet = coords.iter().copied().collect();
        let expected: BTreeSet<CellCoord> = coords.into_iter().collect();
        prop_assert_eq!(set.len(), expected.len());
        prop_assert!(set.as_slice().windows(2).all(|pair| pair[0] < pair[1]));
        for coord in &expected {
            prop_assert!(set.contains(coord));
        }
    }
}
