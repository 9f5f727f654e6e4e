//! Integration tests for the instance registry
//!
//! Tests ordinals, duplicate ids, token ids, and sealing.

use modelgen_foundation::{EntityTypeId, ErrorKind, FieldType, Ordinal, Record, Value};
use modelgen_schema::{EntitySchema, FieldSchema, InstanceRegistry, ModelRegistry, RootKind};

fn material_schema() -> (ModelRegistry, EntityTypeId) {
    let mut schema = ModelRegistry::new();
    let base = schema
        .declare(
            EntitySchema::new("BaseData")
                .as_abstract()
                .with_root(RootKind::DataCatalog)
                .with_field(FieldSchema::required("id", FieldType::string())),
        )
        .unwrap();
    let material = schema
        .declare(
            EntitySchema::new("UpgradeMaterialData")
                .with_parent(base)
                .tokenized()
                .with_field(FieldSchema::required("name", FieldType::string())),
        )
        .unwrap();
    (schema, material)
}

fn material(ty: EntityTypeId, id: &str) -> Record {
    Record::new(ty)
        .with("id", Value::from(id))
        .with("name", Value::from(id))
}

#[test]
fn ordinals_follow_registration_order() {
    let (schema, ty) = material_schema();
    let mut instances = InstanceRegistry::new();
    for id in ["iron", "gold", "mythril"] {
        instances.register(&schema, id, material(ty, id)).unwrap();
    }
    instances.seal();

    assert_eq!(instances.ordinal_of(ty, "iron"), Some(Ordinal::new(0)));
    assert_eq!(instances.ordinal_of(ty, "gold"), Some(Ordinal::new(1)));
    assert_eq!(instances.ordinal_of(ty, "mythril"), Some(Ordinal::new(2)));
    let token_ids: Vec<_> = instances
        .fungible()
        .iter()
        .map(|&key| instances.token_id(key).unwrap())
        .collect();
    assert_eq!(token_ids, vec![0, 1, 2]);
}

#[test]
fn duplicate_id_is_rejected() {
    let (schema, ty) = material_schema();
    let mut instances = InstanceRegistry::new();
    instances.register(&schema, "iron", material(ty, "iron")).unwrap();
    let err = instances
        .register(&schema, "iron", material(ty, "iron"))
        .unwrap_err();
    assert!(matches!(err.kind, ErrorKind::DuplicateInstanceId { .. }));
    assert_eq!(instances.len(), 1);
}

#[test]
fn abstract_types_cannot_hold_instances() {
    let (schema, _) = material_schema();
    let base = schema.by_name("BaseData").unwrap();
    let mut instances = InstanceRegistry::new();
    let err = instances
        .register(&schema, "x", Record::new(base))
        .unwrap_err();
    assert!(matches!(err.kind, ErrorKind::InvalidSchema(_)));
}

#[test]
fn sealed_registry_refuses_registration() {
    let (schema, ty) = material_schema();
    let mut instances = InstanceRegistry::new();
    instances.seal();
    assert!(instances.is_sealed());
    assert!(instances.register(&schema, "iron", material(ty, "iron")).is_err());
}

#[test]
fn lookup_by_tag() {
    let (schema, ty) = material_schema();
    let mut instances = InstanceRegistry::new();
    instances.register(&schema, "iron", material(ty, "iron")).unwrap();
    assert_eq!(
        instances.lookup(&schema, "upgrade_material_data", "iron").unwrap(),
        Ordinal::new(0)
    );
    let err = instances
        .lookup(&schema, "upgrade_material_data", "tin")
        .unwrap_err();
    assert!(matches!(err.kind, ErrorKind::UnknownInstance { .. }));
}
