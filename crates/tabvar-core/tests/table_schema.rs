use serde_json::json;
use tabvar_core::{CellCoord, Table, VariantError};

#[test]
fn records_keep_their_column_order() {
    let table = Table::from_json(json!([
        {"zeta": 1, "alpha": "x"},
        {"zeta": 2, "alpha": "y"}
    ]))
    .expect("load table");
    assert_eq!(table.columns(), &["zeta".to_string(), "alpha".to_string()]);
    assert_eq!(table.len(), 2);
    let coord = CellCoord::new(2, 2).expect("coord");
    assert_eq!(table.cell(coord), Some(&json!("y")));
    assert_eq!(
        table.to_json(),
        json!([{"zeta": 1, "alpha": "x"}, {"zeta": 2, "alpha": "y"}])
    );
}

#[test]
fn reordered_keys_raise_schema_mismatch() {
    let err = Table::from_json(json!([
        {"A": 1, "B": "x"},
        {"B": "y", "A": 2}
    ]))
    .expect_err("column order differs");
    assert!(matches!(err, VariantError::SchemaMismatch(_)));
    assert_eq!(err.info().context.get("row").map(String::as_str), Some("2"));
}

#[test]
fn missing_keys_raise_schema_mismatch() {
    let err = Table::from_json(json!([{"A": 1, "B": "x"}, {"A": 2}])).expect_err("missing key");
    assert!(matches!(err, VariantError::SchemaMismatch(_)));
}

#[test]
fn single_object_is_a_one_row_table() {
    let table = Table::from_json(json!({"A": 1})).expect("load object");
    assert_eq!(table.len(), 1);
}

#[test]
fn scalar_documents_are_rejected() {
    let err = Table::from_json(json!(3)).expect_err("scalar");
    assert!(matches!(err, VariantError::Serde(_)));
    let err = Table::from_json(json!([1, 2])).expect_err("scalar rows");
    assert_eq!(err.info().code, "table_row_shape");
}

#[test]
fn set_cell_rejects_out_of_range_coordinates() {
    let mut table = Table::from_json(json!([{"A": 1}])).expect("load");
    let previous = table
        .set_cell(CellCoord::new(1, 1).expect("coord"), json!(5))
        .expect("in range");
    assert_eq!(previous, json!(1));
    let err = table
        .set_cell(CellCoord::new(2, 1).expect("coord"), json!(6))
        .expect_err("row out of range");
    assert!(matches!(err, VariantError::Reconcile(_)));
}

#[test]
fn column_lists_must_agree() {
    let left = Table::from_json(json!([{"A": 1, "B": 2}])).expect("left");
    let right = Table::from_json(json!([{"B": 2, "A": 1}])).expect("right");
    assert!(left.ensure_same_columns(&left).is_ok());
    assert!(matches!(
        left.ensure_same_columns(&right),
        Err(VariantError::SchemaMismatch(_))
    ));
    assert!(left.ensure_same_columns(&Table::default()).is_ok());
}

#[test]
fn push_row_checks_width() {
    let mut table = Table::new(vec!["A".into(), "B".into()]);
    assert!(table.push_row(vec![json!(1), json!(2)]).is_ok());
    assert!(matches!(
        table.push_row(vec![json!(1)]),
        Err(VariantError::SchemaMismatch(_))
    ));
}
