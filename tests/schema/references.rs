//! Integration tests for reference resolution
//!
//! Tests pending registries, typed resolution, and instance validation.

use modelgen_foundation::{EntityTypeId, ErrorKind, FieldType, RawReference, Record, Value};
use modelgen_schema::{
    EntitySchema, FieldSchema, InstanceRegistry, ModelRegistry, ReferenceResolver, RootKind,
};

struct Fixture {
    schema: ModelRegistry,
    instances: InstanceRegistry,
    ladder: EntityTypeId,
    hero: EntityTypeId,
}

fn fixture(seal: bool) -> Fixture {
    let mut schema = ModelRegistry::new();
    let base = schema
        .declare(
            EntitySchema::new("BaseData")
                .as_abstract()
                .with_root(RootKind::DataCatalog)
                .with_field(FieldSchema::required("id", FieldType::string())),
        )
        .unwrap();
    let ladder = schema
        .declare(EntitySchema::new("HeroLadderData").with_parent(base))
        .unwrap();
    let hero = schema
        .declare(
            EntitySchema::new("HeroData")
                .with_parent(base)
                .with_field(FieldSchema::required("ladder", FieldType::reference(ladder))),
        )
        .unwrap();

    let mut instances = InstanceRegistry::new();
    for id in ["slow", "fast"] {
        instances
            .register(&schema, id, Record::new(ladder).with("id", Value::from(id)))
            .unwrap();
    }
    let knight = Record::new(hero)
        .with("id", Value::from("knight"))
        .with("ladder", Value::Ref(RawReference::new("hero_ladder_data", "fast")));
    instances.register(&schema, "knight", knight).unwrap();
    if seal {
        instances.seal();
    }
    Fixture {
        schema,
        instances,
        ladder,
        hero,
    }
}

#[test]
fn resolution_waits_for_sealing() {
    let f = fixture(false);
    let resolver = ReferenceResolver::new(&f.schema, &f.instances);
    let err = resolver
        .resolve(&RawReference::new("hero_ladder_data", "fast"))
        .unwrap_err();
    assert!(matches!(
        err.kind,
        ErrorKind::UnresolvedReference { pending: true, .. }
    ));
}

#[test]
fn resolution_is_idempotent() {
    let f = fixture(true);
    let resolver = ReferenceResolver::new(&f.schema, &f.instances);
    let raw = RawReference::parse("hero_ladder_data/fast").unwrap();
    let first = resolver.resolve(&raw).unwrap();
    let second = resolver.resolve(&raw).unwrap();
    assert_eq!(first, second);
    assert_eq!(first.ty, f.ladder);
    assert_eq!(first.ordinal.get(), 1);
}

#[test]
fn typed_resolution_checks_target() {
    let f = fixture(true);
    let resolver = ReferenceResolver::new(&f.schema, &f.instances);
    let err = resolver
        .resolve_typed(&RawReference::new("hero_data", "knight"), f.ladder)
        .unwrap_err();
    assert!(matches!(err.kind, ErrorKind::ReferenceTargetMismatch { .. }));
}

#[test]
fn validate_instance_reports_unknown_target() {
    let mut f = fixture(false);
    let broken = Record::new(f.hero)
        .with("id", Value::from("rogue"))
        .with("ladder", Value::Ref(RawReference::new("hero_ladder_data", "missing")));
    f.instances.register(&f.schema, "rogue", broken).unwrap();
    f.instances.seal();

    let resolver = ReferenceResolver::new(&f.schema, &f.instances);
    let rogue = &f.instances.instances_of(f.hero)[1];
    let err = resolver.validate_instance(rogue).unwrap_err();
    assert!(matches!(
        err.kind,
        ErrorKind::UnresolvedReference { pending: false, .. }
    ));
    let context = err.context.unwrap();
    assert_eq!(context.instance.as_deref(), Some("rogue"));
    assert_eq!(context.field.as_deref(), Some("ladder"));

    let knight = &f.instances.instances_of(f.hero)[0];
    assert_eq!(resolver.validate_instance(knight).unwrap().len(), 1);
}
