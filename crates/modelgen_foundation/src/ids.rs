//! Identifiers for entity types and instances.
//!
//! Entity type ids are dense indices in declaration order, so ordering by id
//! is ordering by declaration. Instance ordinals are dense positions within
//! one entity type's registration order and are only meaningful for a single
//! generation run.

use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Identity of a declared entity type.
///
/// Two entity types with identical field shapes are still distinct: set
/// membership and equality always go through this id.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct EntityTypeId(u32);

impl EntityTypeId {
    /// Creates an id from its declaration index.
    #[must_use]
    pub const fn new(index: u32) -> Self {
        Self(index)
    }

    /// Returns the declaration index of this entity type.
    #[must_use]
    pub const fn index(self) -> u32 {
        self.0
    }
}

impl fmt::Debug for EntityTypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EntityTypeId({})", self.0)
    }
}

impl fmt::Display for EntityTypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Dense zero-based position of an instance within its entity type.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Ordinal(u32);

impl Ordinal {
    /// Creates an ordinal from a registration position.
    #[must_use]
    pub const fn new(position: u32) -> Self {
        Self(position)
    }

    /// Returns the registration position.
    #[must_use]
    pub const fn get(self) -> u32 {
        self.0
    }

    /// Returns the position as a `usize` index.
    #[must_use]
    pub const fn as_index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Debug for Ordinal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Ordinal({})", self.0)
    }
}

impl fmt::Display for Ordinal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Globally unique key of a registered instance.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Ord, PartialOrd)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct InstanceKey {
    /// The instance's entity type.
    pub ty: EntityTypeId,
    /// The instance's ordinal within `ty`.
    pub ordinal: Ordinal,
}

impl InstanceKey {
    /// Creates a new instance key.
    #[must_use]
    pub const fn new(ty: EntityTypeId, ordinal: Ordinal) -> Self {
        Self { ty, ordinal }
    }
}
