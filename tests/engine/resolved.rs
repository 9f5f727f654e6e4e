//! Integration tests for the resolved model
//!
//! Tests the dry validation pass, cached queries, and determinism.

use modelgen_engine::{Category, ResolvedModel};
use modelgen_foundation::{ErrorKind, FieldType, LtVec, RawReference, Record, Value};
use modelgen_schema::{EntitySchema, FieldSchema, InstanceRegistry, ModelRegistry, RootKind};

fn schema() -> ModelRegistry {
    let mut schema = ModelRegistry::new();
    let data = schema
        .declare(
            EntitySchema::new("BaseData")
                .as_abstract()
                .with_root(RootKind::DataCatalog)
                .with_field(FieldSchema::required("id", FieldType::string())),
        )
        .unwrap();
    let level = schema
        .declare(
            EntitySchema::new("HeroLevelLadderData")
                .with_field(FieldSchema::required("experience", FieldType::int())),
        )
        .unwrap();
    let ladder = schema
        .declare(
            EntitySchema::new("HeroLadderData")
                .with_parent(data)
                .ladder()
                .with_field(FieldSchema::required(
                    "levels",
                    FieldType::list(FieldType::embedded(level)),
                )),
        )
        .unwrap();
    let hero = schema
        .declare(
            EntitySchema::new("HeroData")
                .with_parent(data)
                .with_field(FieldSchema::required("ladder", FieldType::reference(ladder))),
        )
        .unwrap();
    let model = schema
        .declare(EntitySchema::new("DataModel").as_abstract().with_root(RootKind::Model))
        .unwrap();
    schema
        .declare(
            EntitySchema::new("HeroModel")
                .with_parent(model)
                .nft()
                .with_field(FieldSchema::required("data", FieldType::reference(hero))),
        )
        .unwrap();
    schema
}

fn instances(schema: &ModelRegistry, ladder_ref: &str) -> InstanceRegistry {
    let level_ty = schema.by_name("HeroLevelLadderData").unwrap();
    let ladder_ty = schema.by_name("HeroLadderData").unwrap();
    let hero_ty = schema.by_name("HeroData").unwrap();

    let levels: LtVec<Value> = [100, 300]
        .into_iter()
        .map(|exp| Value::Record(Record::new(level_ty).with("experience", Value::Int(exp))))
        .collect();
    let mut instances = InstanceRegistry::new();
    instances
        .register(
            schema,
            "default",
            Record::new(ladder_ty)
                .with("id", Value::from("default"))
                .with("levels", Value::List(levels)),
        )
        .unwrap();
    instances
        .register(
            schema,
            "knight",
            Record::new(hero_ty)
                .with("id", Value::from("knight"))
                .with("ladder", Value::Ref(RawReference::parse(ladder_ref).unwrap())),
        )
        .unwrap();
    instances.seal();
    instances
}

#[test]
fn build_caches_every_answer() {
    let schema = schema();
    let instances = instances(&schema, "hero_ladder_data/default");
    let model = ResolvedModel::build(schema, instances).unwrap();

    let hero_model = model.schema().by_name("HeroModel").unwrap();
    let hero_data = model.schema().by_name("HeroData").unwrap();
    let ladder = model.schema().by_name("HeroLadderData").unwrap();

    assert_eq!(model.classify(hero_model), Some(Category::Model));
    assert_eq!(model.classify(ladder), Some(Category::LadderData));
    assert_eq!(model.canonical_name(hero_model).unwrap(), "Hero");
    assert_eq!(model.names(hero_data).unwrap().canonical_plural, "Heros");
    assert_eq!(model.identifier_name(ladder).unwrap(), "hero_ladder_data");
    assert_eq!(model.data_type_of(hero_model), Some(hero_data));
    assert_eq!(model.ladder_type_of(hero_data), Some(ladder));

    let knight = model.instances_of(hero_data)[0].key();
    let refs = model.references_of(knight);
    assert_eq!(refs.len(), 1);
    assert_eq!(refs[0].path, "ladder");
    assert_eq!(refs[0].ordinal.get(), 0);

    let table = model.ladder_table(model.instances_of(ladder)[0].key()).unwrap();
    assert_eq!(table.thresholds(), &[100, 300]);
}

#[test]
fn unresolved_reference_fails_the_dry_pass() {
    let schema = schema();
    let instances = instances(&schema, "hero_ladder_data/missing");
    let err = ResolvedModel::build(schema, instances).unwrap_err();
    assert!(matches!(err.kind, ErrorKind::UnresolvedReference { .. }));
    assert_eq!(err.context.unwrap().instance.as_deref(), Some("knight"));
}

#[test]
fn unsealed_registry_is_rejected() {
    let schema = schema();
    let err = ResolvedModel::build(schema, InstanceRegistry::new()).unwrap_err();
    assert!(matches!(err.kind, ErrorKind::Internal(_)));
}

#[test]
fn model_without_data_reference_is_rejected() {
    let mut schema = schema();
    let model = schema.by_name("DataModel").unwrap();
    schema
        .declare(EntitySchema::new("OrphanModel").with_parent(model).nft())
        .unwrap();
    let mut instances = InstanceRegistry::new();
    instances.seal();
    let err = ResolvedModel::build(schema, instances).unwrap_err();
    assert!(matches!(err.kind, ErrorKind::MissingField { .. }));
}

#[test]
fn resolution_is_deterministic() {
    let build = || {
        let schema = schema();
        let instances = instances(&schema, "hero_ladder_data/default");
        ResolvedModel::build(schema, instances).unwrap()
    };
    let (a, b) = (build(), build());
    let a_types: Vec<_> = a.classification().iter().collect();
    let b_types: Vec<_> = b.classification().iter().collect();
    assert_eq!(a_types, b_types);
    for (ty, _) in a_types {
        assert_eq!(a.dependencies_of(ty).unwrap(), b.dependencies_of(ty).unwrap());
        assert_eq!(a.names(ty).unwrap(), b.names(ty).unwrap());
    }
}
