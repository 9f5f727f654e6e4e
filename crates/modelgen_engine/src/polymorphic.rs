//! Polymorphic struct hierarchies.
//!
//! A type flagged as a polymorphic base groups every concrete type that has
//! it as an ancestor. Variants are numbered by discovery order, which is the
//! declaration order of the concrete types.

// Allow usize to u32 casts for variant tags - bounded by the schema size
#![allow(clippy::cast_possible_truncation)]

use std::collections::HashMap;

use modelgen_foundation::{EntityTypeId, Result};
use modelgen_schema::ModelRegistry;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A polymorphic base and its concrete variants.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PolymorphicGroup {
    /// The polymorphic base type.
    pub base: EntityTypeId,
    /// Concrete variants in discovery order. A variant's tag is its index.
    pub variants: Vec<EntityTypeId>,
}

/// All polymorphic groups of a schema.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PolymorphicGroups {
    groups: Vec<PolymorphicGroup>,
    index: HashMap<EntityTypeId, usize>,
}

impl PolymorphicGroups {
    /// Discovers the groups of `schema`.
    ///
    /// Every concrete type walks its ancestor chain from most to least
    /// derived; each ancestor flagged as a polymorphic base gets the type
    /// appended to its group.
    ///
    /// # Errors
    ///
    /// Returns an error if an ancestor id is not declared.
    pub fn discover(schema: &ModelRegistry) -> Result<Self> {
        let mut groups = Self::default();
        for entity in schema.iter().filter(|e| e.is_concrete()) {
            for &ancestor in entity.ancestors() {
                if schema.get(ancestor)?.annotations().polymorphic_base {
                    groups.push(ancestor, entity.id());
                }
            }
        }
        Ok(groups)
    }

    fn push(&mut self, base: EntityTypeId, variant: EntityTypeId) {
        let slot = *self.index.entry(base).or_insert_with(|| {
            self.groups.push(PolymorphicGroup {
                base,
                variants: Vec::new(),
            });
            self.groups.len() - 1
        });
        self.groups[slot].variants.push(variant);
    }

    /// Variants of `base`, or `None` if it has no concrete descendants.
    #[must_use]
    pub fn group(&self, base: EntityTypeId) -> Option<&[EntityTypeId]> {
        self.index
            .get(&base)
            .map(|&slot| self.groups[slot].variants.as_slice())
    }

    /// The tag of `variant` within the group of `base`.
    #[must_use]
    pub fn variant_tag(&self, base: EntityTypeId, variant: EntityTypeId) -> Option<u32> {
        self.group(base)?
            .iter()
            .position(|&v| v == variant)
            .map(|p| p as u32)
    }

    /// Returns true if `ty` is a variant of any group.
    #[must_use]
    pub fn is_variant(&self, ty: EntityTypeId) -> bool {
        self.groups.iter().any(|g| g.variants.contains(&ty))
    }

    /// Groups in discovery order.
    pub fn iter(&self) -> impl Iterator<Item = &PolymorphicGroup> {
        self.groups.iter()
    }

    /// Returns the number of groups.
    #[must_use]
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    /// Returns true if the schema has no polymorphic groups.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}
