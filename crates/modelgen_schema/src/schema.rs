//! Schema definitions for entity types and their fields.
//!
//! Schemas are explicit descriptor tables built once at declaration time.
//! Nothing is discovered by reflection: every field, default, and annotation
//! flag is spelled out by the declaring code.

use std::sync::Arc;

use modelgen_foundation::{EntityTypeId, FieldType, Value};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Marks an entity type as the root of a kind of entities.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum RootKind {
    /// Base of read-only data catalog records.
    DataCatalog,
    /// Base of per-player model records.
    Model,
    /// The top-level aggregate catalog.
    Catalog,
}

/// Kind of an entity type, inherited from the nearest root marker.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum EntityKind {
    /// Descends from the data catalog root.
    Data,
    /// Descends from the model root.
    Model,
    /// The aggregate catalog (or a descendant of it).
    Catalog,
    /// Plain struct with no root marker in its chain.
    Struct,
}

impl From<RootKind> for EntityKind {
    fn from(root: RootKind) -> Self {
        match root {
            RootKind::DataCatalog => Self::Data,
            RootKind::Model => Self::Model,
            RootKind::Catalog => Self::Catalog,
        }
    }
}

/// Annotation flags of an entity type.
///
/// Flags are never inherited: each flag holds only for the type that sets it.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Annotations {
    /// No code is emitted for this type.
    pub is_abstract: bool,
    /// Instances share the flat fungible token id space.
    pub tokenized: bool,
    /// Instances are individually owned unique records.
    pub nft: bool,
    /// Instances are upgrade materials (fungible).
    pub upgrade_material: bool,
    /// Canonical name of the model this material upgrades.
    pub upgrade_target: Option<String>,
    /// Experience threshold table.
    pub ladder: bool,
    /// Root of a tagged-union hierarchy.
    pub polymorphic_base: bool,
}

/// Schema definition for an entity field.
#[derive(Clone, Debug, PartialEq)]
pub struct FieldSchema {
    /// Field name.
    pub name: Arc<str>,
    /// Field type.
    pub ty: FieldType,
    /// Default value if not provided.
    pub default: Option<Value>,
    /// Whether the field must be present in payloads.
    pub required: bool,
    /// Whether every instance must carry exactly the default value.
    pub constant: bool,
}

impl FieldSchema {
    /// Creates a required field with no default.
    #[must_use]
    pub fn required(name: impl Into<Arc<str>>, ty: FieldType) -> Self {
        Self {
            name: name.into(),
            ty,
            default: None,
            required: true,
            constant: false,
        }
    }

    /// Creates an optional field with a default value.
    #[must_use]
    pub fn optional(name: impl Into<Arc<str>>, ty: FieldType, default: Value) -> Self {
        Self {
            name: name.into(),
            ty,
            default: Some(default),
            required: false,
            constant: false,
        }
    }

    /// Creates an optional field with no default (will be nil).
    #[must_use]
    pub fn optional_nil(name: impl Into<Arc<str>>, ty: FieldType) -> Self {
        Self {
            name: name.into(),
            ty,
            default: None,
            required: false,
            constant: false,
        }
    }

    /// Creates a constant field: always equal to `value`.
    ///
    /// Constant string fields double as discriminators when a catalog list
    /// holds several concrete types.
    #[must_use]
    pub fn constant(name: impl Into<Arc<str>>, ty: FieldType, value: Value) -> Self {
        Self {
            name: name.into(),
            ty,
            default: Some(value),
            required: false,
            constant: true,
        }
    }
}

/// Declaration of an entity type.
#[derive(Clone, Debug, PartialEq)]
pub struct EntitySchema {
    /// Type name, e.g. `HeroData`.
    pub name: String,
    /// Parent entity type, if any.
    pub parent: Option<EntityTypeId>,
    /// Fields declared on this type (inherited fields come from `parent`).
    pub fields: Vec<FieldSchema>,
    /// Annotation flags.
    pub annotations: Annotations,
    /// Root marker, if this type starts a kind.
    pub root: Option<RootKind>,
}

impl EntitySchema {
    /// Creates a new concrete entity schema with no fields.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parent: None,
            fields: Vec::new(),
            annotations: Annotations::default(),
            root: None,
        }
    }

    /// Sets the parent type.
    #[must_use]
    pub fn with_parent(mut self, parent: EntityTypeId) -> Self {
        self.parent = Some(parent);
        self
    }

    /// Adds a field to the schema.
    #[must_use]
    pub fn with_field(mut self, field: FieldSchema) -> Self {
        self.fields.push(field);
        self
    }

    /// Marks this type as a kind root.
    #[must_use]
    pub fn with_root(mut self, root: RootKind) -> Self {
        self.root = Some(root);
        self
    }

    /// Marks this type abstract.
    #[must_use]
    pub fn as_abstract(mut self) -> Self {
        self.annotations.is_abstract = true;
        self
    }

    /// Marks this type tokenizable-fungible.
    #[must_use]
    pub fn tokenized(mut self) -> Self {
        self.annotations.tokenized = true;
        self
    }

    /// Marks this type tokenizable-unique.
    #[must_use]
    pub fn nft(mut self) -> Self {
        self.annotations.nft = true;
        self
    }

    /// Marks this type as an upgrade material for the model named `target`.
    #[must_use]
    pub fn upgrade_material(mut self, target: impl Into<String>) -> Self {
        self.annotations.upgrade_material = true;
        self.annotations.upgrade_target = Some(target.into());
        self
    }

    /// Marks this type as a ladder.
    #[must_use]
    pub fn ladder(mut self) -> Self {
        self.annotations.ladder = true;
        self
    }

    /// Marks this type as a polymorphic base.
    #[must_use]
    pub fn polymorphic_base(mut self) -> Self {
        self.annotations.polymorphic_base = true;
        self
    }

    /// Returns the declared field by name.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&FieldSchema> {
        self.fields.iter().find(|f| f.name.as_ref() == name)
    }
}
