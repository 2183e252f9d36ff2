use tabvar_core::errors::{ErrorInfo, VariantError};
use tabvar_core::Sentinel;

fn sample_info(code: &str, message: &str) -> ErrorInfo {
    ErrorInfo::new(code, message)
        .with_context("file", "137")
        .with_context("category", "Temporal")
}

#[test]
fn schema_errors_are_structural() {
    let err = VariantError::SchemaMismatch(sample_info("S001", "column order"));
    assert_eq!(err.info().code, "S001");
    assert!(err.is_structural());
    assert!(VariantError::RowCount(sample_info("R001", "rows")).is_structural());
    assert!(!VariantError::Io(sample_info("I001", "missing")).is_structural());
}

#[test]
fn display_includes_context_and_hint() {
    let err = VariantError::Config(sample_info("C001", "bad plan").with_hint("check seed"));
    let text = err.to_string();
    assert!(text.starts_with("config error: bad plan (code: C001)"));
    assert!(text.contains("category=Temporal"));
    assert!(text.ends_with("| hint: check seed"));
}

#[test]
fn errors_serialize_with_family_tag() {
    let err = VariantError::Selection(sample_info("SEL1", "bad target"));
    let json = serde_json::to_value(&err).expect("serialize");
    assert_eq!(json["family"], "Selection");
    let back: VariantError = serde_json::from_value(json).expect("deserialize");
    assert_eq!(back, err);
}

#[test]
fn sentinel_marks_prefix_and_detects_nested_occurrences() {
    let sentinel = Sentinel::default();
    assert!(sentinel.marks(&serde_json::json!("@@@_99")));
    assert!(!sentinel.marks(&serde_json::json!("x@@@_99")));
    assert!(!sentinel.marks(&serde_json::json!(99)));
    assert!(sentinel.occurs_in(&serde_json::json!({"a": ["x@@@_99"]})));
    assert_eq!(sentinel.strip(&serde_json::json!("@@@_z")), Some("z"));
}
