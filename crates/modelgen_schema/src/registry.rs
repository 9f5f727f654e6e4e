//! The model registry: one explicit schema context per generation run.
//!
//! Entity types are declared once and never mutated afterwards. The registry
//! flattens inheritance at declaration time (effective field list, ancestor
//! chain, kind) so later phases never walk parent links to answer a question.

use std::collections::HashMap;

use heck::ToSnakeCase;
use modelgen_foundation::{EntityTypeId, Error, ErrorKind, FieldType, Result};
use tracing::debug;

use crate::schema::{Annotations, EntityKind, EntitySchema, FieldSchema, RootKind};

/// A declared entity type with its inheritance flattened.
#[derive(Clone, Debug, PartialEq)]
pub struct EntityType {
    id: EntityTypeId,
    name: String,
    tag: String,
    parent: Option<EntityTypeId>,
    declared: Vec<FieldSchema>,
    fields: Vec<FieldSchema>,
    annotations: Annotations,
    root: Option<RootKind>,
    kind: EntityKind,
    ancestors: Vec<EntityTypeId>,
}

impl EntityType {
    /// The type's id.
    #[must_use]
    pub const fn id(&self) -> EntityTypeId {
        self.id
    }

    /// The declared type name, e.g. `HeroData`.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The reference type tag: snake_case of the name, e.g. `hero_data`.
    #[must_use]
    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// The direct parent type.
    #[must_use]
    pub const fn parent(&self) -> Option<EntityTypeId> {
        self.parent
    }

    /// Effective fields: inherited fields first, then this type's own.
    #[must_use]
    pub fn fields(&self) -> &[FieldSchema] {
        &self.fields
    }

    /// Fields declared directly on this type.
    #[must_use]
    pub fn declared_fields(&self) -> &[FieldSchema] {
        &self.declared
    }

    /// Returns an effective field by name.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&FieldSchema> {
        self.fields.iter().find(|f| f.name.as_ref() == name)
    }

    /// Annotation flags.
    #[must_use]
    pub const fn annotations(&self) -> &Annotations {
        &self.annotations
    }

    /// Root marker set on this very type.
    #[must_use]
    pub const fn root(&self) -> Option<RootKind> {
        self.root
    }

    /// Kind inherited from the nearest root marker.
    #[must_use]
    pub const fn kind(&self) -> EntityKind {
        self.kind
    }

    /// Ancestor chain, most-derived first, excluding this type.
    #[must_use]
    pub fn ancestors(&self) -> &[EntityTypeId] {
        &self.ancestors
    }

    /// Returns true if this type is abstract.
    #[must_use]
    pub const fn is_abstract(&self) -> bool {
        self.annotations.is_abstract
    }

    /// Returns true if this type is concrete.
    #[must_use]
    pub const fn is_concrete(&self) -> bool {
        !self.annotations.is_abstract
    }

    /// Returns true if this is the top-level aggregate catalog type.
    #[must_use]
    pub fn is_catalog(&self) -> bool {
        self.kind == EntityKind::Catalog
    }

    /// Returns true if instances belong to the fungible token id space.
    #[must_use]
    pub const fn is_fungible(&self) -> bool {
        self.annotations.tokenized || self.annotations.upgrade_material
    }

    /// Returns true if instances are unique tokenized records.
    #[must_use]
    pub const fn is_unique(&self) -> bool {
        self.annotations.nft
    }

    /// Returns true if `ancestor` appears in this type's chain.
    #[must_use]
    pub fn descends_from(&self, ancestor: EntityTypeId) -> bool {
        self.ancestors.contains(&ancestor)
    }
}

#[derive(Clone, Debug)]
enum Slot {
    Reserved(String),
    Declared(Box<EntityType>),
}

impl Slot {
    fn name(&self) -> &str {
        match self {
            Self::Reserved(name) => name,
            Self::Declared(entity) => entity.name(),
        }
    }
}

/// Registry of all declared entity types.
#[derive(Clone, Debug, Default)]
pub struct ModelRegistry {
    slots: Vec<Slot>,
    by_name: HashMap<String, EntityTypeId>,
    by_tag: HashMap<String, EntityTypeId>,
    catalog: Option<EntityTypeId>,
}

impl ModelRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserves an id for a type that will be declared later.
    ///
    /// Lets fields refer to types declared further down. Reserving a name
    /// that is already known returns its existing id.
    ///
    /// # Errors
    ///
    /// Returns an error if the registry is full.
    pub fn reserve(&mut self, name: &str) -> Result<EntityTypeId> {
        if let Some(&id) = self.by_name.get(name) {
            return Ok(id);
        }
        let id = self.next_id()?;
        self.slots.push(Slot::Reserved(name.to_string()));
        self.by_name.insert(name.to_string(), id);
        Ok(id)
    }

    /// Declares an entity type.
    ///
    /// # Errors
    ///
    /// Returns an error if the name is already declared, the parent is not
    /// declared yet, a field type names an unknown type or uses a non-scalar
    /// map key, or a second catalog root is declared.
    pub fn declare(&mut self, schema: EntitySchema) -> Result<EntityTypeId> {
        let id = match self.by_name.get(&schema.name) {
            Some(&id) => match &self.slots[id.index() as usize] {
                Slot::Reserved(_) => id,
                Slot::Declared(_) => {
                    return Err(Error::new(ErrorKind::DuplicateEntityType(schema.name)));
                }
            },
            None => self.next_id()?,
        };

        let parent = match schema.parent {
            Some(parent_id) => Some(self.declared_parent(&schema.name, parent_id)?),
            None => None,
        };

        let mut fields: Vec<FieldSchema> = parent.map(|p| p.fields.clone()).unwrap_or_default();
        for (i, field) in schema.fields.iter().enumerate() {
            if schema.fields[..i].iter().any(|f| f.name == field.name) {
                return Err(Error::invalid_schema(format!(
                    "field {} declared twice on {}",
                    field.name, schema.name
                )));
            }
            self.check_field_type(&schema.name, field, &field.ty)?;
            match fields.iter_mut().find(|f| f.name == field.name) {
                Some(inherited) => *inherited = field.clone(),
                None => fields.push(field.clone()),
            }
        }

        let kind = schema
            .root
            .map(EntityKind::from)
            .or_else(|| parent.map(EntityType::kind))
            .unwrap_or(EntityKind::Struct);

        let ancestors = match parent {
            Some(p) => std::iter::once(p.id).chain(p.ancestors.iter().copied()).collect(),
            None => Vec::new(),
        };

        let tag = schema.name.to_snake_case();
        if let Some(&other) = self.by_tag.get(&tag) {
            return Err(Error::invalid_schema(format!(
                "{} and {} share the reference tag {tag}",
                self.name_of(other),
                schema.name
            )));
        }

        if schema.root == Some(RootKind::Catalog) {
            if let Some(existing) = self.catalog {
                return Err(Error::invalid_schema(format!(
                    "second catalog root {} (already {})",
                    schema.name,
                    self.name_of(existing)
                )));
            }
            self.catalog = Some(id);
        }

        debug!(entity = %schema.name, %id, fields = fields.len(), ?kind, "declared entity type");

        let entity = EntityType {
            id,
            name: schema.name.clone(),
            tag: tag.clone(),
            parent: schema.parent,
            declared: schema.fields,
            fields,
            annotations: schema.annotations,
            root: schema.root,
            kind,
            ancestors,
        };

        let slot = Slot::Declared(Box::new(entity));
        if (id.index() as usize) < self.slots.len() {
            self.slots[id.index() as usize] = slot;
        } else {
            self.slots.push(slot);
        }
        self.by_name.insert(schema.name, id);
        self.by_tag.insert(tag, id);
        Ok(id)
    }

    /// Checks that every reserved type was declared and every field type
    /// points at a declared type.
    ///
    /// # Errors
    ///
    /// Returns `InvalidSchema` naming the first offending type.
    pub fn validate(&self) -> Result<()> {
        for slot in &self.slots {
            if let Slot::Reserved(name) = slot {
                return Err(Error::invalid_schema(format!(
                    "{name} is referenced but never declared"
                )));
            }
        }
        for entity in self.iter() {
            for field in entity.fields() {
                self.check_declared_targets(entity, field, &field.ty)?;
            }
        }
        Ok(())
    }

    /// Gets a declared entity type.
    ///
    /// # Errors
    ///
    /// Returns `UnknownEntityType` for unknown or merely reserved ids.
    pub fn get(&self, id: EntityTypeId) -> Result<&EntityType> {
        match self.slots.get(id.index() as usize) {
            Some(Slot::Declared(entity)) => Ok(entity),
            Some(Slot::Reserved(name)) => Err(Error::unknown_entity_type(name.clone())),
            None => Err(Error::unknown_entity_type(id.to_string())),
        }
    }

    /// Looks up a declared entity type by name.
    ///
    /// # Errors
    ///
    /// Returns `UnknownEntityType` if no such type is declared.
    pub fn lookup(&self, name: &str) -> Result<&EntityType> {
        let id = self
            .by_name
            .get(name)
            .ok_or_else(|| Error::unknown_entity_type(name))?;
        self.get(*id)
    }

    /// Returns the id registered for a type name.
    #[must_use]
    pub fn by_name(&self, name: &str) -> Option<EntityTypeId> {
        self.by_name.get(name).copied()
    }

    /// Returns the id registered for a reference type tag.
    #[must_use]
    pub fn by_tag(&self, tag: &str) -> Option<EntityTypeId> {
        self.by_tag.get(tag).copied()
    }

    /// Returns the type name for any known id, reserved or declared.
    #[must_use]
    pub fn name_of(&self, id: EntityTypeId) -> &str {
        self.slots.get(id.index() as usize).map_or("<unknown>", Slot::name)
    }

    /// Renders a field type with entity names.
    #[must_use]
    pub fn describe(&self, ty: &FieldType) -> String {
        ty.describe(&|id| self.name_of(id).to_string())
    }

    /// Iterates over declared entity types in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = &EntityType> {
        self.slots.iter().filter_map(|slot| match slot {
            Slot::Declared(entity) => Some(entity.as_ref()),
            Slot::Reserved(_) => None,
        })
    }

    /// Returns the number of known types, reserved or declared.
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Returns true if nothing was declared.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// The top-level aggregate catalog type, if declared.
    #[must_use]
    pub const fn catalog(&self) -> Option<EntityTypeId> {
        self.catalog
    }

    /// Concrete types that descend from `ancestor`, in declaration order.
    #[must_use]
    pub fn concrete_descendants(&self, ancestor: EntityTypeId) -> Vec<EntityTypeId> {
        self.iter()
            .filter(|e| e.is_concrete() && e.descends_from(ancestor))
            .map(EntityType::id)
            .collect()
    }

    fn next_id(&self) -> Result<EntityTypeId> {
        u32::try_from(self.slots.len())
            .map(EntityTypeId::new)
            .map_err(|_| Error::internal("too many entity types"))
    }

    fn declared_parent(&self, child: &str, parent: EntityTypeId) -> Result<&EntityType> {
        match self.slots.get(parent.index() as usize) {
            Some(Slot::Declared(entity)) => Ok(entity),
            _ => Err(Error::invalid_schema(format!(
                "parent {} of {child} must be declared before it",
                self.name_of(parent)
            ))),
        }
    }

    fn check_field_type(&self, owner: &str, field: &FieldSchema, ty: &FieldType) -> Result<()> {
        match ty {
            FieldType::Scalar(_) => Ok(()),
            FieldType::Optional(inner) | FieldType::List(inner) => {
                self.check_field_type(owner, field, inner)
            }
            FieldType::Map(key, value) => {
                if !key.is_scalar() {
                    return Err(Error::invalid_schema(format!(
                        "map key of {owner}.{} must be a scalar, got {}",
                        field.name,
                        self.describe(key)
                    )));
                }
                self.check_field_type(owner, field, value)
            }
            FieldType::Reference(target) | FieldType::Embedded(target) => {
                if (target.index() as usize) < self.slots.len() {
                    Ok(())
                } else {
                    Err(Error::unknown_entity_type(target.to_string()))
                }
            }
        }
    }

    fn check_declared_targets(
        &self,
        owner: &EntityType,
        field: &FieldSchema,
        ty: &FieldType,
    ) -> Result<()> {
        match ty {
            FieldType::Scalar(_) => Ok(()),
            FieldType::Optional(inner) | FieldType::List(inner) => {
                self.check_declared_targets(owner, field, inner)
            }
            FieldType::Map(_, value) => self.check_declared_targets(owner, field, value),
            FieldType::Reference(target) | FieldType::Embedded(target) => {
                let target = self.get(*target)?;
                if matches!(ty, FieldType::Reference(_)) && target.is_abstract() {
                    return Err(Error::invalid_schema(format!(
                        "{}.{} references abstract type {}",
                        owner.name(),
                        field.name,
                        target.name()
                    )));
                }
                Ok(())
            }
        }
    }
}
