//! Field type descriptors for schema declarations.

use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::ids::EntityTypeId;

/// Scalar field types.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Scalar {
    /// 64-bit signed integer.
    Int,
    /// UTF-8 string.
    String,
}

/// Recursive type descriptor for an entity field.
///
/// `Reference` and `Embedded` are distinct variants: a reference is a
/// lookup-only pointer resolved against the instance registry, while an
/// embedded entity is part of the containing value's layout.
#[derive(Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum FieldType {
    /// A scalar value.
    Scalar(Scalar),
    /// A value or nil.
    Optional(Box<FieldType>),
    /// Homogeneous list.
    List(Box<FieldType>),
    /// Map from scalar keys to values.
    Map(Box<FieldType>, Box<FieldType>),
    /// Typed reference to an instance of another entity type.
    Reference(EntityTypeId),
    /// Nested value of another entity type.
    Embedded(EntityTypeId),
}

impl FieldType {
    /// The integer scalar type.
    #[must_use]
    pub const fn int() -> Self {
        Self::Scalar(Scalar::Int)
    }

    /// The string scalar type.
    #[must_use]
    pub const fn string() -> Self {
        Self::Scalar(Scalar::String)
    }

    /// Creates an optional type.
    #[must_use]
    pub fn optional(inner: FieldType) -> Self {
        Self::Optional(Box::new(inner))
    }

    /// Creates a list type with the given element type.
    #[must_use]
    pub fn list(element: FieldType) -> Self {
        Self::List(Box::new(element))
    }

    /// Creates a map type with the given key and value types.
    #[must_use]
    pub fn map(key: FieldType, value: FieldType) -> Self {
        Self::Map(Box::new(key), Box::new(value))
    }

    /// Creates a reference to `target`.
    #[must_use]
    pub const fn reference(target: EntityTypeId) -> Self {
        Self::Reference(target)
    }

    /// Creates an embedded value of `target`.
    #[must_use]
    pub const fn embedded(target: EntityTypeId) -> Self {
        Self::Embedded(target)
    }

    /// Returns true for scalar types.
    #[must_use]
    pub const fn is_scalar(&self) -> bool {
        matches!(self, Self::Scalar(_))
    }

    /// Returns true if nil is an accepted value.
    #[must_use]
    pub const fn is_nullable(&self) -> bool {
        matches!(self, Self::Optional(_))
    }

    /// Returns the target of a direct reference.
    ///
    /// Matches `Reference(t)` and a reference nested one level inside a list,
    /// `List(Reference(t))`. Anything deeper is not a direct reference.
    #[must_use]
    pub fn direct_reference(&self) -> Option<EntityTypeId> {
        match self {
            Self::Reference(target) => Some(*target),
            Self::List(inner) => match inner.as_ref() {
                Self::Reference(target) => Some(*target),
                _ => None,
            },
            _ => None,
        }
    }

    /// Returns the element type of a list, if this is one.
    #[must_use]
    pub fn list_element(&self) -> Option<&FieldType> {
        match self {
            Self::List(inner) => Some(inner),
            _ => None,
        }
    }

    /// Renders this type, naming entity types through `name_of`.
    pub fn describe(&self, name_of: &dyn Fn(EntityTypeId) -> String) -> String {
        match self {
            Self::Scalar(Scalar::Int) => "int".to_string(),
            Self::Scalar(Scalar::String) => "string".to_string(),
            Self::Optional(inner) => format!("optional<{}>", inner.describe(name_of)),
            Self::List(inner) => format!("list<{}>", inner.describe(name_of)),
            Self::Map(k, v) => format!("map<{}, {}>", k.describe(name_of), v.describe(name_of)),
            Self::Reference(target) => format!("ref<{}>", name_of(*target)),
            Self::Embedded(target) => name_of(*target),
        }
    }
}

impl fmt::Debug for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self}")
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.describe(&|id| id.to_string()))
    }
}
