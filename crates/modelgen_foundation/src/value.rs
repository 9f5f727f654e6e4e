//! Instance field values.
//!
//! Values are immutable and cheaply cloneable. References are stored in their
//! raw `type-tag/instance-id` form and resolved to ordinals only after the
//! instance registry is sealed.

use std::fmt;
use std::sync::Arc;

use crate::collections::{LtMap, LtVec};
use crate::error::{Error, Result};
use crate::ids::EntityTypeId;

/// A parsed but unresolved reference payload.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RawReference {
    type_tag: Arc<str>,
    id: Arc<str>,
}

impl RawReference {
    /// Separator between the type tag and the instance id.
    pub const SEPARATOR: char = '/';

    /// Creates a reference from its parts.
    #[must_use]
    pub fn new(type_tag: impl Into<Arc<str>>, id: impl Into<Arc<str>>) -> Self {
        Self {
            type_tag: type_tag.into(),
            id: id.into(),
        }
    }

    /// Parses a `"<type-tag>/<instance-id>"` payload.
    ///
    /// # Errors
    ///
    /// Returns `MalformedReference` unless the payload contains exactly one
    /// separator with a non-empty part on each side.
    pub fn parse(payload: &str) -> Result<Self> {
        let mut parts = payload.split(Self::SEPARATOR);
        match (parts.next(), parts.next(), parts.next()) {
            (Some(tag), Some(id), None) if !tag.is_empty() && !id.is_empty() => {
                Ok(Self::new(tag, id))
            }
            _ => Err(Error::malformed_reference(payload)),
        }
    }

    /// The type tag (identifier name of the target entity type).
    #[must_use]
    pub fn type_tag(&self) -> &str {
        &self.type_tag
    }

    /// The target instance's string id.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }
}

impl fmt::Display for RawReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.type_tag, Self::SEPARATOR, self.id)
    }
}

/// Field values of one entity instance (or of an embedded value).
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Record {
    ty: EntityTypeId,
    fields: LtMap<Arc<str>, Value>,
}

impl Record {
    /// Creates an empty record of the given entity type.
    #[must_use]
    pub fn new(ty: EntityTypeId) -> Self {
        Self {
            ty,
            fields: LtMap::new(),
        }
    }

    /// Returns a new record with `field` set to `value`.
    #[must_use]
    pub fn with(&self, field: impl Into<Arc<str>>, value: Value) -> Self {
        Self {
            ty: self.ty,
            fields: self.fields.insert(field.into(), value),
        }
    }

    /// The concrete entity type of this record.
    #[must_use]
    pub const fn ty(&self) -> EntityTypeId {
        self.ty
    }

    /// Gets a field value.
    #[must_use]
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(&Arc::from(field))
    }

    /// Iterates over fields in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(k, v)| (k.as_ref(), v))
    }

    /// Returns the number of set fields.
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Returns true if no field is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Value of an instance field.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Value {
    /// Absent optional value.
    Nil,
    /// Integer scalar.
    Int(i64),
    /// String scalar.
    String(Arc<str>),
    /// List of values.
    List(LtVec<Value>),
    /// Map of scalar keys to values.
    Map(LtMap<Value, Value>),
    /// Unresolved reference to another instance.
    Ref(RawReference),
    /// Embedded entity value.
    Record(Record),
}

impl Value {
    /// Creates a string value.
    #[must_use]
    pub fn string(s: impl Into<Arc<str>>) -> Self {
        Self::String(s.into())
    }

    /// Returns a short name of this value's shape, for diagnostics.
    #[must_use]
    pub const fn kind_name(&self) -> &'static str {
        match self {
            Self::Nil => "nil",
            Self::Int(_) => "int",
            Self::String(_) => "string",
            Self::List(_) => "list",
            Self::Map(_) => "map",
            Self::Ref(_) => "reference",
            Self::Record(_) => "record",
        }
    }

    /// Returns true if this value is nil.
    #[must_use]
    pub const fn is_nil(&self) -> bool {
        matches!(self, Self::Nil)
    }

    /// Attempts to extract an integer value.
    #[must_use]
    pub const fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(n) => Some(*n),
            _ => None,
        }
    }

    /// Attempts to extract a string slice.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Attempts to extract a list.
    #[must_use]
    pub const fn as_list(&self) -> Option<&LtVec<Value>> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }

    /// Attempts to extract a map.
    #[must_use]
    pub const fn as_map(&self) -> Option<&LtMap<Value, Value>> {
        match self {
            Self::Map(map) => Some(map),
            _ => None,
        }
    }

    /// Attempts to extract a reference.
    #[must_use]
    pub const fn as_reference(&self) -> Option<&RawReference> {
        match self {
            Self::Ref(r) => Some(r),
            _ => None,
        }
    }

    /// Attempts to extract an embedded record.
    #[must_use]
    pub const fn as_record(&self) -> Option<&Record> {
        match self {
            Self::Record(r) => Some(r),
            _ => None,
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Nil => write!(f, "nil"),
            Self::Int(n) => write!(f, "{n}"),
            Self::String(s) => write!(f, "{s:?}"),
            Self::List(items) => f.debug_list().entries(items.iter()).finish(),
            Self::Map(map) => f.debug_map().entries(map.iter()).finish(),
            Self::Ref(r) => write!(f, "@{r}"),
            Self::Record(r) => f.debug_map().entries(r.iter()).finish(),
        }
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Self::Int(n)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::String(s.into())
    }
}

impl From<RawReference> for Value {
    fn from(r: RawReference) -> Self {
        Self::Ref(r)
    }
}

impl From<Record> for Value {
    fn from(r: Record) -> Self {
        Self::Record(r)
    }
}
