//! Dependency graph builder.
//!
//! Computes, per entity type, three distinct sets:
//! - direct references (`Reference(t)` and `List(Reference(t))` fields)
//! - the transitive value closure over embedded model-kind types
//! - full structural reachability over every embedded type
//!
//! References never extend a walk: a referenced type is looked up at runtime,
//! not laid out inside the referencing value. Embedding cycles are fatal.

use std::collections::{BTreeSet, HashMap};

use modelgen_foundation::{EntityTypeId, Error, FieldType, Result};
use modelgen_schema::{EntityKind, EntityType, ModelRegistry};
use tracing::debug;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

// =============================================================================
// Dependency Set
// =============================================================================

/// Dependency sets of one entity type. The type itself is never a member.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DependencySet {
    /// Targets of direct reference fields.
    pub direct: BTreeSet<EntityTypeId>,
    /// Model-kind types embedded by value, transitively.
    pub transitive: BTreeSet<EntityTypeId>,
    /// Every type embedded by value, transitively.
    pub reachable: BTreeSet<EntityTypeId>,
    /// `reachable` in dependencies-first order.
    pub layout_order: Vec<EntityTypeId>,
}

/// Which embedded fields a walk follows.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Walk {
    /// Model-kind targets through `List` and `Optional`.
    ModelValues,
    /// Any target through `List`, `Optional`, and map values.
    Structural,
}

impl Walk {
    fn follows(self, target: &EntityType) -> bool {
        match self {
            Self::ModelValues => target.kind() == EntityKind::Model,
            Self::Structural => true,
        }
    }

    fn collect(self, ty: &FieldType, out: &mut Vec<EntityTypeId>) {
        match ty {
            FieldType::Embedded(target) => out.push(*target),
            FieldType::Optional(inner) | FieldType::List(inner) => self.collect(inner, out),
            FieldType::Map(_, value) if self == Self::Structural => self.collect(value, out),
            _ => {}
        }
    }
}

/// Depth-first walk state. `path` is the current chain, `done` holds fully
/// visited types, and `order` receives them in post-order.
struct Visitor<'a> {
    schema: &'a ModelRegistry,
    walk: Walk,
    path: Vec<EntityTypeId>,
    done: BTreeSet<EntityTypeId>,
    order: Vec<EntityTypeId>,
}

impl<'a> Visitor<'a> {
    fn new(schema: &'a ModelRegistry, walk: Walk) -> Self {
        Self {
            schema,
            walk,
            path: Vec::new(),
            done: BTreeSet::new(),
            order: Vec::new(),
        }
    }

    fn visit(&mut self, ty: EntityTypeId) -> Result<()> {
        let schema = self.schema;
        let entity = schema.get(ty)?;
        self.path.push(ty);

        let mut targets = Vec::new();
        for field in entity.fields() {
            self.walk.collect(&field.ty, &mut targets);
        }

        for target in targets {
            if let Some(start) = self.path.iter().position(|&t| t == target) {
                let mut cycle: Vec<String> = self.path[start..]
                    .iter()
                    .map(|&t| schema.name_of(t).to_string())
                    .collect();
                cycle.push(schema.name_of(target).to_string());
                return Err(Error::cyclic_dependency(cycle));
            }
            if self.done.contains(&target) || !self.walk.follows(schema.get(target)?) {
                continue;
            }
            self.visit(target)?;
        }

        self.path.pop();
        self.done.insert(ty);
        self.order.push(ty);
        Ok(())
    }

    /// Visited types and their post-order, both without the root.
    fn finish(mut self, root: EntityTypeId) -> (BTreeSet<EntityTypeId>, Vec<EntityTypeId>) {
        self.done.remove(&root);
        self.order.retain(|&t| t != root);
        (self.done, self.order)
    }
}

// =============================================================================
// Dependency Graph
// =============================================================================

/// Memoized dependency sets for every entity type of a schema.
///
/// Each set is computed at most once. Asking again returns the cached set.
#[derive(Clone, Debug, Default)]
pub struct DependencyGraph {
    cache: HashMap<EntityTypeId, DependencySet>,
}

impl DependencyGraph {
    /// Creates an empty graph.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the dependency set of `ty`, computing it on first request.
    ///
    /// # Errors
    ///
    /// Returns `CyclicDependency` if `ty` embeds itself through any chain of
    /// embedded fields, or `UnknownEntityType` for undeclared types.
    pub fn resolve(&mut self, schema: &ModelRegistry, ty: EntityTypeId) -> Result<&DependencySet> {
        if !self.cache.contains_key(&ty) {
            let set = Self::compute(schema, ty)?;
            debug!(
                entity = schema.name_of(ty),
                direct = set.direct.len(),
                transitive = set.transitive.len(),
                reachable = set.reachable.len(),
                "resolved dependencies"
            );
            self.cache.insert(ty, set);
        }
        self.cache
            .get(&ty)
            .ok_or_else(|| Error::internal("dependency cache lost an entry"))
    }

    /// Resolves every declared type in declaration order.
    ///
    /// # Errors
    ///
    /// Returns the first error [`resolve`](Self::resolve) reports.
    pub fn resolve_all(&mut self, schema: &ModelRegistry) -> Result<()> {
        for entity in schema.iter() {
            self.resolve(schema, entity.id())?;
        }
        Ok(())
    }

    /// Returns a previously resolved set.
    #[must_use]
    pub fn get(&self, ty: EntityTypeId) -> Option<&DependencySet> {
        self.cache.get(&ty)
    }

    /// Returns the number of resolved types.
    #[must_use]
    pub fn len(&self) -> usize {
        self.cache.len()
    }

    /// Returns true if nothing was resolved yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }

    fn compute(schema: &ModelRegistry, ty: EntityTypeId) -> Result<DependencySet> {
        let entity = schema.get(ty)?;

        let direct = entity
            .fields()
            .iter()
            .filter_map(|f| f.ty.direct_reference())
            .collect();

        // Structural first: every model-kind cycle is also a structural one.
        let mut structural = Visitor::new(schema, Walk::Structural);
        structural.visit(ty)?;
        let (reachable, layout_order) = structural.finish(ty);

        let mut values = Visitor::new(schema, Walk::ModelValues);
        values.visit(ty)?;
        let (transitive, _) = values.finish(ty);

        Ok(DependencySet {
            direct,
            transitive,
            reachable,
            layout_order,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use modelgen_foundation::ErrorKind;
    use modelgen_schema::{EntitySchema, FieldSchema, RootKind};

    fn set(ids: &[EntityTypeId]) -> BTreeSet<EntityTypeId> {
        ids.iter().copied().collect()
    }

    #[test]
    fn direct_references_do_not_recurse() {
        let mut schema = ModelRegistry::new();
        let quality = schema.declare(EntitySchema::new("QualityData")).unwrap();
        let skill = schema
            .declare(
                EntitySchema::new("SkillData")
                    .with_field(FieldSchema::required("quality", FieldType::reference(quality))),
            )
            .unwrap();
        let hero = schema
            .declare(EntitySchema::new("HeroData").with_field(FieldSchema::required(
                "skills",
                FieldType::list(FieldType::reference(skill)),
            )))
            .unwrap();

        let mut graph = DependencyGraph::new();
        let deps = graph.resolve(&schema, hero).unwrap();
        assert_eq!(deps.direct, set(&[skill]));
        assert!(deps.reachable.is_empty());
        assert!(deps.transitive.is_empty());
    }

    #[test]
    fn transitive_closure_only_follows_models() {
        let mut schema = ModelRegistry::new();
        let root = schema
            .declare(EntitySchema::new("DataModel").as_abstract().with_root(RootKind::Model))
            .unwrap();
        let level = schema
            .declare(EntitySchema::new("LevelData").with_field(FieldSchema::required("experience", FieldType::int())))
            .unwrap();
        let skill = schema
            .declare(
                EntitySchema::new("SkillModel")
                    .with_parent(root)
                    .with_field(FieldSchema::required("level", FieldType::embedded(level))),
            )
            .unwrap();
        let hero = schema
            .declare(
                EntitySchema::new("HeroModel")
                    .with_parent(root)
                    .with_field(FieldSchema::required(
                        "skills",
                        FieldType::optional(FieldType::list(FieldType::embedded(skill))),
                    )),
            )
            .unwrap();

        let mut graph = DependencyGraph::new();
        let deps = graph.resolve(&schema, hero).unwrap().clone();
        assert_eq!(deps.transitive, set(&[skill]));
        assert_eq!(deps.reachable, set(&[level, skill]));
        assert_eq!(deps.layout_order, vec![level, skill]);
    }

    #[test]
    fn map_values_are_reachable_but_not_transitive() {
        let mut schema = ModelRegistry::new();
        let root = schema
            .declare(EntitySchema::new("DataModel").as_abstract().with_root(RootKind::Model))
            .unwrap();
        let item = schema.declare(EntitySchema::new("ItemModel").with_parent(root)).unwrap();
        let bag = schema
            .declare(EntitySchema::new("BagModel").with_parent(root).with_field(
                FieldSchema::required("items", FieldType::map(FieldType::string(), FieldType::embedded(item))),
            ))
            .unwrap();

        let mut graph = DependencyGraph::new();
        let deps = graph.resolve(&schema, bag).unwrap();
        assert_eq!(deps.reachable, set(&[item]));
        assert!(deps.transitive.is_empty());
    }

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
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(graph.get(x).is_none());
    }

    #[test]
    fn reference_back_edges_are_not_cycles() {
        let mut schema = ModelRegistry::new();
        let y = schema.reserve("Y").unwrap();
        let x = schema
            .declare(EntitySchema::new("X").with_field(FieldSchema::required("y", FieldType::embedded(y))))
            .unwrap();
        schema
            .declare(EntitySchema::new("Y").with_field(FieldSchema::required("x", FieldType::reference(x))))
            .unwrap();

        let mut graph = DependencyGraph::new();
        let deps = graph.resolve(&schema, x).unwrap();
        assert_eq!(deps.reachable, set(&[y]));
    }

    #[test]
    fn second_request_returns_cached_set() {
        let mut schema = ModelRegistry::new();
        let a = schema.declare(EntitySchema::new("A")).unwrap();
        let b = schema
            .declare(EntitySchema::new("B").with_field(FieldSchema::required("a", FieldType::embedded(a))))
            .unwrap();

        let mut graph = DependencyGraph::new();
        let first = graph.resolve(&schema, b).unwrap().clone();
        let second = graph.resolve(&schema, b).unwrap().clone();
        assert_eq!(first, second);
        assert_eq!(graph.len(), 1);
    }

    #[test]
    fn diamond_is_laid_out_once() {
        let mut schema = ModelRegistry::new();
        let leaf = schema.declare(EntitySchema::new("Leaf")).unwrap();
        let left = schema
            .declare(EntitySchema::new("Left").with_field(FieldSchema::required("leaf", FieldType::embedded(leaf))))
            .unwrap();
        let right = schema
            .declare(EntitySchema::new("Right").with_field(FieldSchema::required("leaf", FieldType::embedded(leaf))))
            .unwrap();
        let top = schema
            .declare(
                EntitySchema::new("Top")
                    .with_field(FieldSchema::required("left", FieldType::embedded(left)))
                    .with_field(FieldSchema::required("right", FieldType::embedded(right))),
            )
            .unwrap();

        let mut graph = DependencyGraph::new();
        let deps = graph.resolve(&schema, top).unwrap();
        assert_eq!(deps.layout_order, vec![leaf, left, right]);
    }
}
