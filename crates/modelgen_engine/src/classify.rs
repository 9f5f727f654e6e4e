//! Entity classification.
//!
//! Every concrete, non-catalog entity type gets exactly one generation
//! category, computed once and stored. Emitters switch on the category and
//! never walk the ancestor chain themselves.

use std::collections::BTreeMap;
use std::fmt;

use modelgen_foundation::{EntityTypeId, FieldType, Result};
use modelgen_schema::{EntityKind, EntityType, ModelRegistry};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Reference field linking a model to its data type.
pub const DATA_FIELD: &str = "data";

/// Reference field linking a data type to its ladder.
pub const LADDER_FIELD: &str = "ladder";

/// Generation category of a concrete entity type.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Category {
    /// Unique tokenized record (nft).
    Model,
    /// Experience threshold table.
    LadderData,
    /// Read-only catalog data.
    StaticData,
    /// Concrete variant of a polymorphic base.
    PolymorphicVariant,
    /// Anything else.
    PlainStruct,
}

impl Category {
    /// Returns the category's display name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Model => "model",
            Self::LadderData => "ladder-data",
            Self::StaticData => "static-data",
            Self::PolymorphicVariant => "polymorphic-variant",
            Self::PlainStruct => "plain-struct",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classifies one entity type. Abstract and catalog types get `None`.
///
/// First match wins: nft, ladder, data kind, polymorphic ancestor, plain.
///
/// # Errors
///
/// Returns an error if an ancestor id is not declared.
pub fn classify_entity(schema: &ModelRegistry, entity: &EntityType) -> Result<Option<Category>> {
    if entity.is_abstract() || entity.is_catalog() {
        return Ok(None);
    }
    let flags = entity.annotations();
    if flags.nft {
        return Ok(Some(Category::Model));
    }
    if flags.ladder {
        return Ok(Some(Category::LadderData));
    }
    if entity.kind() == EntityKind::Data {
        return Ok(Some(Category::StaticData));
    }
    for &ancestor in entity.ancestors() {
        if schema.get(ancestor)?.annotations().polymorphic_base {
            return Ok(Some(Category::PolymorphicVariant));
        }
    }
    Ok(Some(Category::PlainStruct))
}

/// Categories of every classified type of a schema.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Classification {
    categories: BTreeMap<EntityTypeId, Category>,
}

impl Classification {
    /// Classifies every declared type.
    ///
    /// # Errors
    ///
    /// Returns the first error [`classify_entity`] reports.
    pub fn compute(schema: &ModelRegistry) -> Result<Self> {
        let mut categories = BTreeMap::new();
        for entity in schema.iter() {
            if let Some(category) = classify_entity(schema, entity)? {
                categories.insert(entity.id(), category);
            }
        }
        Ok(Self { categories })
    }

    /// The category of `ty`, or `None` for skipped types.
    #[must_use]
    pub fn category(&self, ty: EntityTypeId) -> Option<Category> {
        self.categories.get(&ty).copied()
    }

    /// Types of `category` in declaration order.
    pub fn of(&self, category: Category) -> impl Iterator<Item = EntityTypeId> + '_ {
        self.categories
            .iter()
            .filter(move |(_, c)| **c == category)
            .map(|(ty, _)| *ty)
    }

    /// Every classified type with its category, in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (EntityTypeId, Category)> + '_ {
        self.categories.iter().map(|(ty, c)| (*ty, *c))
    }

    /// Returns the number of classified types.
    #[must_use]
    pub fn len(&self) -> usize {
        self.categories.len()
    }

    /// Returns true if nothing was classified.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }
}

// =============================================================================
// Relationship queries
// =============================================================================

fn reference_target(entity: &EntityType, field: &str) -> Option<EntityTypeId> {
    match entity.field(field)?.ty {
        FieldType::Reference(target) => Some(target),
        _ => None,
    }
}

/// The data type a model points at through its `data` reference.
#[must_use]
pub fn data_type_of(model: &EntityType) -> Option<EntityTypeId> {
    reference_target(model, DATA_FIELD)
}

/// The ladder type a data type points at through its `ladder` reference.
#[must_use]
pub fn ladder_type_of(data: &EntityType) -> Option<EntityTypeId> {
    reference_target(data, LADDER_FIELD)
}

/// The element type of a ladder's `levels` list.
#[must_use]
pub fn ladder_level_type(ladder: &EntityType) -> Option<EntityTypeId> {
    match ladder.field(crate::ladder::LEVELS_FIELD)?.ty.list_element()? {
        FieldType::Embedded(level) => Some(*level),
        _ => None,
    }
}

/// The first declared upgrade material whose target is `canonical`.
#[must_use]
pub fn upgrade_material_for(schema: &ModelRegistry, canonical: &str) -> Option<EntityTypeId> {
    schema
        .iter()
        .find(|e| {
            e.is_concrete()
                && e.annotations().upgrade_material
                && e.annotations().upgrade_target.as_deref() == Some(canonical)
        })
        .map(EntityType::id)
}
