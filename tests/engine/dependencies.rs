//! Integration tests for dependency resolution
//!
//! Tests direct, transitive, and structural sets, cycles, and the worked
//! hero scenario.

use std::collections::BTreeSet;

use modelgen_engine::{Category, Classification, DependencyGraph, PolymorphicGroups};
use modelgen_foundation::{EntityTypeId, ErrorKind, FieldType};
use modelgen_schema::{EntitySchema, FieldSchema, ModelRegistry, RootKind};

fn set(ids: &[EntityTypeId]) -> BTreeSet<EntityTypeId> {
    ids.iter().copied().collect()
}

fn roots(schema: &mut ModelRegistry) -> (EntityTypeId, EntityTypeId) {
    let data = schema
        .declare(
            EntitySchema::new("BaseData")
                .as_abstract()
                .with_root(RootKind::DataCatalog)
                .with_field(FieldSchema::required("id", FieldType::string())),
        )
        .unwrap();
    let model = schema
        .declare(EntitySchema::new("DataModel").as_abstract().with_root(RootKind::Model))
        .unwrap();
    (data, model)
}

// =============================================================================
// Worked Scenario
// =============================================================================

#[test]
fn hero_model_references_but_does_not_embed_its_data() {
    let mut schema = ModelRegistry::new();
    let (data, model) = roots(&mut schema);
    let hero_data = schema
        .declare(
            EntitySchema::new("HeroData")
                .with_parent(data)
                .with_field(FieldSchema::required("name", FieldType::string())),
        )
        .unwrap();
    let hero = schema
        .declare(
            EntitySchema::new("HeroModel")
                .with_parent(model)
                .nft()
                .with_field(FieldSchema::required("data", FieldType::reference(hero_data)))
                .with_field(FieldSchema::required("level", FieldType::int())),
        )
        .unwrap();

    let mut graph = DependencyGraph::new();
    let deps = graph.resolve(&schema, hero).unwrap().clone();
    assert_eq!(deps.direct, set(&[hero_data]));
    assert!(deps.transitive.is_empty());
    assert!(deps.reachable.is_empty());

    let classification = Classification::compute(&schema).unwrap();
    assert_eq!(classification.category(hero), Some(Category::Model));
    assert_eq!(classification.category(hero_data), Some(Category::StaticData));
}

#[test]
fn transitive_set_follows_embedded_models_only() {
    let mut schema = ModelRegistry::new();
    let (data, model) = roots(&mut schema);
    let skill_data = schema
        .declare(EntitySchema::new("SkillData").with_parent(data))
        .unwrap();
    let stats = schema.declare(EntitySchema::new("Stats")).unwrap();
    let skill = schema
        .declare(
            EntitySchema::new("SkillModel")
                .with_parent(model)
                .with_field(FieldSchema::required("data", FieldType::reference(skill_data)))
                .with_field(FieldSchema::required("stats", FieldType::embedded(stats))),
        )
        .unwrap();
    let hero = schema
        .declare(
            EntitySchema::new("HeroModel")
                .with_parent(model)
                .with_field(FieldSchema::required(
                    "skills",
                    FieldType::list(FieldType::embedded(skill)),
                )),
        )
        .unwrap();

    let mut graph = DependencyGraph::new();
    let deps = graph.resolve(&schema, hero).unwrap().clone();
    assert!(deps.direct.is_empty());
    assert_eq!(deps.transitive, set(&[skill]));
    assert_eq!(deps.reachable, set(&[stats, skill]));
    assert_eq!(deps.layout_order, vec![stats, skill]);
    assert!(!deps.reachable.contains(&skill_data));
}

#[test]
fn referenced_model_is_not_inlined_even_when_embedded_elsewhere() {
    let mut schema = ModelRegistry::new();
    let (_, model) = roots(&mut schema);
    let skill = schema
        .declare(
            EntitySchema::new("SkillModel")
                .with_parent(model)
                .with_field(FieldSchema::required("level", FieldType::int())),
        )
        .unwrap();
    let hero = schema
        .declare(
            EntitySchema::new("HeroModel")
                .with_parent(model)
                .with_field(FieldSchema::required("skill", FieldType::reference(skill))),
        )
        .unwrap();
    let loadout = schema
        .declare(
            EntitySchema::new("LoadoutModel")
                .with_parent(model)
                .with_field(FieldSchema::required("skill", FieldType::embedded(skill))),
        )
        .unwrap();

    let check = |graph: &DependencyGraph| {
        let hero_deps = graph.get(hero).unwrap();
        assert_eq!(hero_deps.direct, set(&[skill]));
        assert!(!hero_deps.transitive.contains(&skill));
        assert!(!hero_deps.reachable.contains(&skill));

        let loadout_deps = graph.get(loadout).unwrap();
        assert!(loadout_deps.direct.is_empty());
        assert_eq!(loadout_deps.transitive, set(&[skill]));
        assert_eq!(loadout_deps.reachable, set(&[skill]));
    };

    let mut hero_first = DependencyGraph::new();
    hero_first.resolve(&schema, hero).unwrap();
    hero_first.resolve(&schema, loadout).unwrap();
    check(&hero_first);

    let mut loadout_first = DependencyGraph::new();
    loadout_first.resolve(&schema, loadout).unwrap();
    loadout_first.resolve(&schema, hero).unwrap();
    check(&loadout_first);

    let mut all = DependencyGraph::new();
    all.resolve_all(&schema).unwrap();
    check(&all);
}

// =============================================================================
// Cycles
// =============================================================================

#[test]
fn mutual_embedding_is_a_cycle() {
    let mut schema = ModelRegistry::new();
    let y = schema.reserve("Y").unwrap();
    let x = schema
        .declare(EntitySchema::new("X").with_field(FieldSchema::required("y", FieldType::embedded(y))))
        .unwrap();
    schema
        .declare(EntitySchema::new("Y").with_field(FieldSchema::required("x", FieldType::embedded(x))))
        .unwrap();

    let mut graph = DependencyGraph::new();
    let err = graph.resolve(&schema, x).unwrap_err();
    match err.kind {
        ErrorKind::CyclicDependency { path } => assert_eq!(path, vec!["X", "Y", "X"]),
        other => panic!("unexpected kind {other:?}"),
    }
}

#[test]
fn mutual_references_are_not_a_cycle() {
    let mut schema = ModelRegistry::new();
    let y = schema.reserve("Y").unwrap();
    let x = schema
        .declare(EntitySchema::new("X").with_field(FieldSchema::required("y", FieldType::reference(y))))
        .unwrap();
    schema
        .declare(EntitySchema::new("Y").with_field(FieldSchema::required("x", FieldType::reference(x))))
        .unwrap();

    let mut graph = DependencyGraph::new();
    graph.resolve_all(&schema).unwrap();
    assert_eq!(graph.get(x).unwrap().direct, set(&[y]));
}

// =============================================================================
// Polymorphic Groups
// =============================================================================

#[test]
fn variants_are_tagged_in_declaration_order() {
    let mut schema = ModelRegistry::new();
    let base = schema
        .declare(EntitySchema::new("RewardBase").polymorphic_base())
        .unwrap();
    let mid = schema
        .declare(EntitySchema::new("RewardItem").with_parent(base).as_abstract())
        .unwrap();
    let gold = schema
        .declare(EntitySchema::new("RewardGold").with_parent(base))
        .unwrap();
    let sword = schema
        .declare(EntitySchema::new("RewardSword").with_parent(mid))
        .unwrap();
    let shield = schema
        .declare(EntitySchema::new("RewardShield").with_parent(mid))
        .unwrap();

    let groups = PolymorphicGroups::discover(&schema).unwrap();
    assert_eq!(groups.group(base), Some(&[gold, sword, shield][..]));
    assert_eq!(groups.variant_tag(base, shield), Some(2));
    assert_eq!(groups.variant_tag(base, mid), None);
    assert!(groups.is_variant(sword));
}
