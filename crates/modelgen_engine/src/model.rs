//! The resolved model: the read-only surface emitters work against.
//!
//! [`ResolvedModel::build`] is the dry validation pass. It classifies every
//! type, resolves every dependency set, name, reference, and ladder table up
//! front, so that emitters only ever read cached answers and no output is
//! produced for an inconsistent model.

use std::collections::HashMap;

use modelgen_foundation::{
    EntityTypeId, Error, ErrorContext, InstanceKey, RawReference, Result,
};
use modelgen_schema::{
    EntityType, Instance, InstanceRegistry, ModelRegistry, ReferenceResolver, ResolvedReference,
};
use tracing::{debug, info};

use crate::classify::{self, Category, Classification};
use crate::deps::{DependencyGraph, DependencySet};
use crate::ladder::LadderTable;
use crate::naming::{NameTable, Names};
use crate::polymorphic::PolymorphicGroups;

/// Schema, instances, and every derived answer of one generation run.
#[derive(Clone, Debug)]
pub struct ResolvedModel {
    schema: ModelRegistry,
    instances: InstanceRegistry,
    classification: Classification,
    dependencies: DependencyGraph,
    names: NameTable,
    groups: PolymorphicGroups,
    references: HashMap<InstanceKey, Vec<ResolvedReference>>,
    ladders: HashMap<InstanceKey, LadderTable>,
}

impl ResolvedModel {
    /// Resolves everything emitters may ask for.
    ///
    /// # Errors
    ///
    /// Fails on the first inconsistency: an invalid schema, an unsealed
    /// registry, an embedding cycle, an unresolvable reference, a malformed
    /// ladder, or a model without a data reference.
    pub fn build(schema: ModelRegistry, instances: InstanceRegistry) -> Result<Self> {
        schema.validate()?;
        if !instances.is_sealed() {
            return Err(Error::internal(
                "instance registry must be sealed before resolving the model",
            ));
        }

        let classification = Classification::compute(&schema)?;
        let groups = PolymorphicGroups::discover(&schema)?;

        let mut dependencies = DependencyGraph::new();
        dependencies.resolve_all(&schema)?;

        let mut names = NameTable::new();
        for entity in schema.iter() {
            names.names(&schema, entity.id())?;
        }

        for model in classification.of(Category::Model) {
            let entity = schema.get(model)?;
            if classify::data_type_of(entity).is_none() {
                return Err(Error::missing_field(entity.name(), classify::DATA_FIELD));
            }
        }

        let resolver = ReferenceResolver::new(&schema, &instances);
        let mut references = HashMap::new();
        let mut ladders = HashMap::new();
        for entity in schema.iter() {
            for instance in instances.instances_of(entity.id()) {
                references.insert(instance.key(), resolver.validate_instance(instance)?);
            }
            if classification.category(entity.id()) == Some(Category::LadderData) {
                for instance in instances.instances_of(entity.id()) {
                    ladders.insert(instance.key(), LadderTable::from_instance(entity.name(), instance)?);
                }
            }
            debug!(
                entity = entity.name(),
                instances = instances.instances_of(entity.id()).len(),
                "validated instances"
            );
        }

        info!(
            types = schema.len(),
            classified = classification.len(),
            instances = instances.len(),
            polymorphic_groups = groups.len(),
            "model resolved"
        );

        Ok(Self {
            schema,
            instances,
            classification,
            dependencies,
            names,
            groups,
            references,
            ladders,
        })
    }

    /// The schema.
    #[must_use]
    pub const fn schema(&self) -> &ModelRegistry {
        &self.schema
    }

    /// The sealed instance registry.
    #[must_use]
    pub const fn instances(&self) -> &InstanceRegistry {
        &self.instances
    }

    /// Gets a declared entity type.
    ///
    /// # Errors
    ///
    /// Returns `UnknownEntityType` for undeclared ids.
    pub fn entity(&self, ty: EntityTypeId) -> Result<&EntityType> {
        self.schema.get(ty)
    }

    /// The category of `ty`, or `None` for abstract and catalog types.
    #[must_use]
    pub fn classify(&self, ty: EntityTypeId) -> Option<Category> {
        self.classification.category(ty)
    }

    /// Every classified type.
    #[must_use]
    pub const fn classification(&self) -> &Classification {
        &self.classification
    }

    /// The dependency sets of `ty`.
    ///
    /// # Errors
    ///
    /// Returns `UnknownEntityType` for undeclared ids.
    pub fn dependencies_of(&self, ty: EntityTypeId) -> Result<&DependencySet> {
        self.dependencies
            .get(ty)
            .ok_or_else(|| Error::unknown_entity_type(ty.to_string()))
    }

    /// Concrete variants of a polymorphic base, in discovery order.
    #[must_use]
    pub fn polymorphic_group(&self, base: EntityTypeId) -> Option<&[EntityTypeId]> {
        self.groups.group(base)
    }

    /// All polymorphic groups.
    #[must_use]
    pub const fn polymorphic_groups(&self) -> &PolymorphicGroups {
        &self.groups
    }

    /// The tag of `variant` within the group of `base`.
    #[must_use]
    pub fn variant_tag(&self, base: EntityTypeId, variant: EntityTypeId) -> Option<u32> {
        self.groups.variant_tag(base, variant)
    }

    /// Instances of `ty` in registration order.
    #[must_use]
    pub fn instances_of(&self, ty: EntityTypeId) -> &[Instance] {
        self.instances.instances_of(ty)
    }

    /// Gets an instance by key.
    #[must_use]
    pub fn instance(&self, key: InstanceKey) -> Option<&Instance> {
        self.instances.instance(key)
    }

    /// Derived names of `ty`.
    ///
    /// # Errors
    ///
    /// Returns `UnknownEntityType` for undeclared ids.
    pub fn names(&self, ty: EntityTypeId) -> Result<&Names> {
        self.names
            .get(ty)
            .ok_or_else(|| Error::unknown_entity_type(ty.to_string()))
    }

    /// Canonical name of `ty`, e.g. `Hero` for `HeroData`.
    ///
    /// # Errors
    ///
    /// Returns `UnknownEntityType` for undeclared ids.
    pub fn canonical_name(&self, ty: EntityTypeId) -> Result<&str> {
        self.names(ty).map(|n| n.canonical.as_str())
    }

    /// Identifier name of `ty`, e.g. `hero_data`.
    ///
    /// # Errors
    ///
    /// Returns `UnknownEntityType` for undeclared ids.
    pub fn identifier_name(&self, ty: EntityTypeId) -> Result<&str> {
        self.names(ty).map(|n| n.identifier.as_str())
    }

    /// Resolves a reference against the sealed registry.
    ///
    /// # Errors
    ///
    /// Returns `UnresolvedReference` if the target does not exist.
    pub fn resolve(&self, reference: &RawReference) -> Result<InstanceKey> {
        ReferenceResolver::new(&self.schema, &self.instances).resolve(reference)
    }

    /// References found in an instance, resolved, in field order.
    #[must_use]
    pub fn references_of(&self, key: InstanceKey) -> &[ResolvedReference] {
        self.references.get(&key).map_or(&[], Vec::as_slice)
    }

    /// The fungible token id of an instance.
    #[must_use]
    pub fn token_id(&self, key: InstanceKey) -> Option<u32> {
        self.instances.token_id(key)
    }

    /// Fungible instances in token id order.
    #[must_use]
    pub fn fungible_instances(&self) -> &[InstanceKey] {
        self.instances.fungible()
    }

    /// Unique instances in registration order.
    #[must_use]
    pub fn unique_instances(&self) -> &[InstanceKey] {
        self.instances.unique()
    }

    /// The data type behind a model.
    #[must_use]
    pub fn data_type_of(&self, model: EntityTypeId) -> Option<EntityTypeId> {
        self.schema.get(model).ok().and_then(classify::data_type_of)
    }

    /// The ladder type behind a data type.
    #[must_use]
    pub fn ladder_type_of(&self, data: EntityTypeId) -> Option<EntityTypeId> {
        self.schema.get(data).ok().and_then(classify::ladder_type_of)
    }

    /// The level element type of a ladder.
    #[must_use]
    pub fn ladder_level_type(&self, ladder: EntityTypeId) -> Option<EntityTypeId> {
        self.schema.get(ladder).ok().and_then(classify::ladder_level_type)
    }

    /// The upgrade material whose target is the canonical name of `model`.
    #[must_use]
    pub fn upgrade_material_for(&self, model: EntityTypeId) -> Option<EntityTypeId> {
        let canonical = self.canonical_name(model).ok()?;
        classify::upgrade_material_for(&self.schema, canonical)
    }

    /// The threshold table of a ladder instance.
    #[must_use]
    pub fn ladder_table(&self, key: InstanceKey) -> Option<&LadderTable> {
        self.ladders.get(&key)
    }

    /// Attaches the entity and instance of `key` to an error raised while
    /// processing it.
    #[must_use]
    pub fn context_for(&self, key: InstanceKey) -> ErrorContext {
        let context = ErrorContext::new().with_entity(self.schema.name_of(key.ty));
        match self.instance(key) {
            Some(instance) => context.with_instance(instance.id()),
            None => context,
        }
    }
}
