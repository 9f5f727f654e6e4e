//! Integration tests for Error types
//!
//! Tests error construction, display, and context merging.

use modelgen_foundation::{Error, ErrorContext, ErrorKind};

// =============================================================================
// Error Construction
// =============================================================================

#[test]
fn error_cyclic_dependency_shows_path() {
    let err = Error::cyclic_dependency(vec!["X".into(), "Y".into(), "X".into()]);
    assert!(matches!(err.kind, ErrorKind::CyclicDependency { .. }));
    assert!(format!("{err}").contains("X -> Y -> X"));
}

#[test]
fn error_duplicate_instance() {
    let err = Error::duplicate_instance("UpgradeMaterialData", "iron");
    match &err.kind {
        ErrorKind::DuplicateInstanceId { entity, id } => {
            assert_eq!(entity, "UpgradeMaterialData");
            assert_eq!(id, "iron");
        }
        other => panic!("unexpected kind {other:?}"),
    }
}

#[test]
fn error_missing_field() {
    let err = Error::missing_field("HeroData", "name");
    assert_eq!(format!("{err}"), "missing field name on HeroData");
}

// =============================================================================
// Error Context
// =============================================================================

#[test]
fn context_is_displayed_after_kind() {
    let err = Error::value_mismatch("int", "string").with_context(
        ErrorContext::new()
            .with_entity("HeroData")
            .with_instance("knight")
            .with_field("ladder")
            .with_source("heroes.json"),
    );
    let msg = format!("{err}");
    assert!(msg.starts_with("value mismatch: expected int, found string ("));
    assert!(msg.contains("entity HeroData"));
    assert!(msg.contains("instance \"knight\""));
    assert!(msg.contains("field ladder"));
    assert!(msg.contains("in heroes.json"));
}

#[test]
fn deepest_context_wins() {
    let err = Error::invalid_schema("bad")
        .with_context(ErrorContext::new().with_field("levels"))
        .with_context(ErrorContext::new().with_field("outer").with_source("a.json"));
    let context = err.context.unwrap();
    assert_eq!(context.field.as_deref(), Some("levels"));
    assert_eq!(context.source.as_deref(), Some("a.json"));
}
