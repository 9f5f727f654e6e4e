//! Integration tests for values and field types
//!
//! Tests reference parsing, record construction, and type descriptors.

use modelgen_foundation::{
    EntityTypeId, ErrorKind, FieldType, LtVec, RawReference, Record, Scalar, Value,
};

// =============================================================================
// Raw References
// =============================================================================

#[test]
fn reference_parses_tag_and_id() {
    let r = RawReference::parse("hero_ladder_data/default").unwrap();
    assert_eq!(r.type_tag(), "hero_ladder_data");
    assert_eq!(r.id(), "default");
}

#[test]
fn reference_rejects_malformed_payloads() {
    for payload in ["", "hero_data", "hero_data/", "/knight", "a/b/c"] {
        let err = RawReference::parse(payload).unwrap_err();
        assert!(
            matches!(err.kind, ErrorKind::MalformedReference { .. }),
            "{payload:?} parsed"
        );
    }
}

// =============================================================================
// Records
// =============================================================================

#[test]
fn record_with_is_persistent() {
    let ty = EntityTypeId::new(3);
    let empty = Record::new(ty);
    let named = empty.with("name", Value::from("Knight"));
    assert!(empty.is_empty());
    assert_eq!(named.len(), 1);
    assert_eq!(named.get("name").and_then(Value::as_str), Some("Knight"));
    assert_eq!(named.ty(), ty);
}

#[test]
fn value_accessors() {
    let list: LtVec<Value> = [Value::Int(1), Value::Int(2)].into_iter().collect();
    let value = Value::List(list);
    assert_eq!(value.as_list().map(LtVec::len), Some(2));
    assert_eq!(value.kind_name(), "list");
    assert!(Value::Nil.is_nil());
    assert_eq!(Value::from(7_i64).as_int(), Some(7));
}

// =============================================================================
// Field Types
// =============================================================================

#[test]
fn field_type_helpers() {
    let target = EntityTypeId::new(1);
    let refs = FieldType::list(FieldType::reference(target));
    assert_eq!(refs.list_element(), Some(&FieldType::Reference(target)));
    assert_eq!(FieldType::int(), FieldType::Scalar(Scalar::Int));
    assert!(FieldType::optional(FieldType::string()).is_nullable());
    assert!(!FieldType::embedded(target).is_scalar());
}
