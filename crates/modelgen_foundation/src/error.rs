//! Error types for the modelgen system.
//!
//! Uses `thiserror` for ergonomic error definition with rich context.
//! Every error is fatal for the current generation run.

use std::fmt;

use thiserror::Error;

/// Result type alias using modelgen's [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// The main error type for modelgen operations.
#[derive(Debug, Error)]
#[error("{kind}{}", .context.as_ref().map(|c| format!(" ({c})")).unwrap_or_default())]
pub struct Error {
    /// The kind of error that occurred.
    pub kind: ErrorKind,
    /// Optional context about where the error occurred.
    pub context: Option<ErrorContext>,
}

impl Error {
    /// Creates a new error with the given kind.
    #[must_use]
    pub fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            context: None,
        }
    }

    /// Adds context to this error.
    ///
    /// Context already attached by a deeper layer is kept; only missing
    /// pieces are filled in from `context`.
    #[must_use]
    pub fn with_context(mut self, context: ErrorContext) -> Self {
        self.context = Some(match self.context.take() {
            Some(existing) => existing.merge(context),
            None => context,
        });
        self
    }

    /// Creates a malformed reference error.
    #[must_use]
    pub fn malformed_reference(payload: impl Into<String>) -> Self {
        Self::new(ErrorKind::MalformedReference {
            payload: payload.into(),
        })
    }

    /// Creates an unresolved reference error.
    ///
    /// `pending` is true when resolution was attempted before the instance
    /// registry was sealed.
    #[must_use]
    pub fn unresolved_reference(
        type_tag: impl Into<String>,
        id: impl Into<String>,
        pending: bool,
    ) -> Self {
        Self::new(ErrorKind::UnresolvedReference {
            type_tag: type_tag.into(),
            id: id.into(),
            pending,
        })
    }

    /// Creates an unknown instance error.
    #[must_use]
    pub fn unknown_instance(type_tag: impl Into<String>, id: impl Into<String>) -> Self {
        Self::new(ErrorKind::UnknownInstance {
            type_tag: type_tag.into(),
            id: id.into(),
        })
    }

    /// Creates a cyclic dependency error from the full cycle path.
    #[must_use]
    pub fn cyclic_dependency(path: Vec<String>) -> Self {
        Self::new(ErrorKind::CyclicDependency { path })
    }

    /// Creates a duplicate instance id error.
    #[must_use]
    pub fn duplicate_instance(entity: impl Into<String>, id: impl Into<String>) -> Self {
        Self::new(ErrorKind::DuplicateInstanceId {
            entity: entity.into(),
            id: id.into(),
        })
    }

    /// Creates an unknown entity type error.
    #[must_use]
    pub fn unknown_entity_type(name: impl Into<String>) -> Self {
        Self::new(ErrorKind::UnknownEntityType(name.into()))
    }

    /// Creates an invalid schema error.
    #[must_use]
    pub fn invalid_schema(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidSchema(message.into()))
    }

    /// Creates a missing field error.
    #[must_use]
    pub fn missing_field(entity: impl Into<String>, field: impl Into<String>) -> Self {
        Self::new(ErrorKind::MissingField {
            entity: entity.into(),
            field: field.into(),
        })
    }

    /// Creates a value mismatch error.
    #[must_use]
    pub fn value_mismatch(expected: impl Into<String>, found: impl Into<String>) -> Self {
        Self::new(ErrorKind::ValueMismatch {
            expected: expected.into(),
            found: found.into(),
        })
    }

    /// Creates an invalid configuration error.
    #[must_use]
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidConfig(message.into()))
    }

    /// Creates an internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Internal(message.into()))
    }
}

/// Categorized error kinds for pattern matching.
#[derive(Debug, Error)]
pub enum ErrorKind {
    /// A reference payload does not parse as `type-tag/instance-id`.
    #[error("malformed reference: {payload:?} (expected \"<type>/<id>\")")]
    MalformedReference {
        /// The raw payload.
        payload: String,
    },

    /// A reference names an instance that was never registered.
    #[error("unresolved reference: {type_tag}/{id}{}", if *.pending { " (instance registry not sealed)" } else { "" })]
    UnresolvedReference {
        /// The referenced type tag.
        type_tag: String,
        /// The referenced instance id.
        id: String,
        /// True if resolution happened before the registry was sealed.
        pending: bool,
    },

    /// A direct registry lookup missed.
    #[error("unknown instance: {type_tag}/{id}")]
    UnknownInstance {
        /// The type tag that was queried.
        type_tag: String,
        /// The instance id that was queried.
        id: String,
    },

    /// A value-embedding walk revisited a type already on the current path.
    #[error("cyclic dependency: {}", .path.join(" -> "))]
    CyclicDependency {
        /// The full cycle, first and last element equal.
        path: Vec<String>,
    },

    /// Two instances of one entity type share a string id.
    #[error("duplicate instance id {id:?} for entity type {entity}")]
    DuplicateInstanceId {
        /// The entity type name.
        entity: String,
        /// The repeated id.
        id: String,
    },

    /// An entity type name, tag, or id is not declared.
    #[error("unknown entity type: {0}")]
    UnknownEntityType(String),

    /// An entity type was declared twice.
    #[error("duplicate entity type: {0}")]
    DuplicateEntityType(String),

    /// The schema declarations are inconsistent.
    #[error("invalid schema: {0}")]
    InvalidSchema(String),

    /// A required field is absent from an instance payload.
    #[error("missing field {field} on {entity}")]
    MissingField {
        /// The entity type name.
        entity: String,
        /// The field name.
        field: String,
    },

    /// A payload value does not match its declared field type.
    #[error("value mismatch: expected {expected}, found {found}")]
    ValueMismatch {
        /// Description of the expected value.
        expected: String,
        /// Description of the value encountered.
        found: String,
    },

    /// A reference points at a different type than its field declares.
    #[error("reference target mismatch: field expects {expected}, reference names {found}")]
    ReferenceTargetMismatch {
        /// Type tag the field declares.
        expected: String,
        /// Type tag the reference carries.
        found: String,
    },

    /// File system failure.
    #[error("I/O error: {0}")]
    Io(String),

    /// Data file could not be parsed.
    #[error("parse error: {0}")]
    Parse(String),

    /// Snapshot encoding or decoding failed.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Run configuration is unusable.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Internal error (should not happen).
    #[error("internal error: {0}")]
    Internal(String),
}

/// Context about where an error occurred.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ErrorContext {
    /// Entity type being processed.
    pub entity: Option<String>,
    /// Instance id being processed.
    pub instance: Option<String>,
    /// Field path within the instance.
    pub field: Option<String>,
    /// Source file the data came from.
    pub source: Option<String>,
}

impl ErrorContext {
    /// Creates a new empty context.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the entity type name.
    #[must_use]
    pub fn with_entity(mut self, entity: impl Into<String>) -> Self {
        self.entity = Some(entity.into());
        self
    }

    /// Sets the instance id.
    #[must_use]
    pub fn with_instance(mut self, instance: impl Into<String>) -> Self {
        self.instance = Some(instance.into());
        self
    }

    /// Sets the field path.
    #[must_use]
    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        self.field = Some(field.into());
        self
    }

    /// Sets the source file.
    #[must_use]
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Fills unset pieces of `self` from `outer`.
    #[must_use]
    pub fn merge(self, outer: Self) -> Self {
        Self {
            entity: self.entity.or(outer.entity),
            instance: self.instance.or(outer.instance),
            field: self.field.or(outer.field),
            source: self.source.or(outer.source),
        }
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = Vec::new();
        if let Some(entity) = &self.entity {
            parts.push(format!("entity {entity}"));
        }
        if let Some(instance) = &self.instance {
            parts.push(format!("instance {instance:?}"));
        }
        if let Some(field) = &self.field {
            parts.push(format!("field {field}"));
        }
        if let Some(source) = &self.source {
            parts.push(format!("in {source}"));
        }
        write!(f, "{}", parts.join(", "))
    }
}
