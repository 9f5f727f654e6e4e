//! Integration tests for the model registry
//!
//! Tests declaration, inheritance, kinds, and validation.

use modelgen_foundation::{ErrorKind, FieldType};
use modelgen_schema::{EntityKind, EntitySchema, FieldSchema, ModelRegistry, RootKind};

// =============================================================================
// Declaration
// =============================================================================

#[test]
fn inherited_fields_come_first() {
    let mut schema = ModelRegistry::new();
    let base = schema
        .declare(
            EntitySchema::new("BaseData")
                .as_abstract()
                .with_root(RootKind::DataCatalog)
                .with_field(FieldSchema::required("id", FieldType::string())),
        )
        .unwrap();
    let hero = schema
        .declare(
            EntitySchema::new("HeroData")
                .with_parent(base)
                .with_field(FieldSchema::required("name", FieldType::string())),
        )
        .unwrap();

    let entity = schema.get(hero).unwrap();
    let names: Vec<_> = entity.fields().iter().map(|f| f.name.as_ref()).collect();
    assert_eq!(names, vec!["id", "name"]);
    assert_eq!(entity.kind(), EntityKind::Data);
    assert_eq!(entity.tag(), "hero_data");
    assert_eq!(schema.by_tag("hero_data"), Some(hero));
    assert!(entity.descends_from(base));
}

#[test]
fn duplicate_type_is_rejected() {
    let mut schema = ModelRegistry::new();
    schema.declare(EntitySchema::new("HeroData")).unwrap();
    let err = schema.declare(EntitySchema::new("HeroData")).unwrap_err();
    assert!(matches!(err.kind, ErrorKind::DuplicateEntityType(_)));
}

#[test]
fn second_catalog_is_rejected() {
    let mut schema = ModelRegistry::new();
    schema
        .declare(EntitySchema::new("GameData").with_root(RootKind::Catalog))
        .unwrap();
    let err = schema
        .declare(EntitySchema::new("OtherData").with_root(RootKind::Catalog))
        .unwrap_err();
    assert!(matches!(err.kind, ErrorKind::InvalidSchema(_)));
}

// =============================================================================
// Forward Declarations
// =============================================================================

#[test]
fn reserved_types_resolve_once_declared() {
    let mut schema = ModelRegistry::new();
    let y = schema.reserve("Y").unwrap();
    let x = schema
        .declare(EntitySchema::new("X").with_field(FieldSchema::required("y", FieldType::embedded(y))))
        .unwrap();
    assert!(schema.validate().is_err());

    let declared = schema
        .declare(EntitySchema::new("Y").with_field(FieldSchema::required("x", FieldType::embedded(x))))
        .unwrap();
    assert_eq!(declared, y);
    schema.validate().unwrap();
}

#[test]
fn unknown_name_lookup() {
    let schema = ModelRegistry::new();
    let err = schema.lookup("Missing").unwrap_err();
    assert!(matches!(err.kind, ErrorKind::UnknownEntityType(_)));
}
