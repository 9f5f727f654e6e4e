//! Deferred resolution of references to instance ordinals.
//!
//! References are parsed when data is loaded but only resolved once the
//! [`InstanceRegistry`] is sealed, so that forward references across data
//! files work and a missing target is always reported by name.

use std::sync::Arc;

use modelgen_foundation::{
    EntityTypeId, Error, ErrorContext, ErrorKind, FieldType, InstanceKey, Ordinal, RawReference,
    Record, Result, Scalar, Value,
};

use crate::instance::{Instance, InstanceRegistry};
use crate::registry::ModelRegistry;

/// One reference found inside an instance, resolved to its target.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResolvedReference {
    /// Field path within the instance, e.g. `slots[1]` or `levels[0].skill`.
    pub path: String,
    /// The target entity type.
    pub target: EntityTypeId,
    /// The target instance id.
    pub id: Arc<str>,
    /// The target instance's ordinal.
    pub ordinal: Ordinal,
}

/// Resolves raw references against a sealed instance registry.
#[derive(Clone, Copy, Debug)]
pub struct ReferenceResolver<'a> {
    schema: &'a ModelRegistry,
    instances: &'a InstanceRegistry,
}

impl<'a> ReferenceResolver<'a> {
    /// Creates a resolver over `schema` and `instances`.
    #[must_use]
    pub const fn new(schema: &'a ModelRegistry, instances: &'a InstanceRegistry) -> Self {
        Self { schema, instances }
    }

    /// Resolves a reference to the key of its target instance.
    ///
    /// Resolution is a pure lookup: resolving the same reference twice
    /// yields the same key.
    ///
    /// # Errors
    ///
    /// Returns `UnresolvedReference` if the registry is not sealed yet, the
    /// tag names no entity type, or the target instance does not exist.
    pub fn resolve(&self, raw: &RawReference) -> Result<InstanceKey> {
        if !self.instances.is_sealed() {
            return Err(Error::unresolved_reference(raw.type_tag(), raw.id(), true));
        }
        let ty = self
            .schema
            .by_tag(raw.type_tag())
            .ok_or_else(|| Error::unresolved_reference(raw.type_tag(), raw.id(), false))?;
        let ordinal = self
            .instances
            .ordinal_of(ty, raw.id())
            .ok_or_else(|| Error::unresolved_reference(raw.type_tag(), raw.id(), false))?;
        Ok(InstanceKey::new(ty, ordinal))
    }

    /// Resolves a reference whose field declares `expected` as its target.
    ///
    /// # Errors
    ///
    /// Returns `ReferenceTargetMismatch` if the tag names another type, and
    /// everything [`resolve`](Self::resolve) returns.
    pub fn resolve_typed(&self, raw: &RawReference, expected: EntityTypeId) -> Result<Ordinal> {
        let expected = self.schema.get(expected)?;
        if raw.type_tag() != expected.tag() {
            return Err(Error::new(ErrorKind::ReferenceTargetMismatch {
                expected: expected.tag().to_string(),
                found: raw.type_tag().to_string(),
            }));
        }
        self.resolve(raw).map(|key| key.ordinal)
    }

    /// Resolves every reference inside `instance`, checking value shapes
    /// against the declared field types on the way.
    ///
    /// References are returned in field declaration order, depth first.
    ///
    /// # Errors
    ///
    /// Returns the first resolution or shape error, with the entity, instance
    /// and field path attached as context.
    pub fn validate_instance(&self, instance: &Instance) -> Result<Vec<ResolvedReference>> {
        let entity = self.schema.get(instance.ty())?;
        let mut found = Vec::new();
        self.walk_record(instance.record(), "", &mut found)
            .map_err(|e| {
                e.with_context(
                    ErrorContext::new()
                        .with_entity(entity.name())
                        .with_instance(instance.id()),
                )
            })?;
        Ok(found)
    }

    fn walk_record(
        &self,
        record: &Record,
        prefix: &str,
        found: &mut Vec<ResolvedReference>,
    ) -> Result<()> {
        let entity = self.schema.get(record.ty())?;
        for field in entity.fields() {
            let path = if prefix.is_empty() {
                field.name.to_string()
            } else {
                format!("{prefix}.{}", field.name)
            };
            let value = record.get(&field.name).unwrap_or(&Value::Nil);
            self.walk(&field.ty, value, &path, found)?;
        }
        Ok(())
    }

    fn walk(
        &self,
        ty: &FieldType,
        value: &Value,
        path: &str,
        found: &mut Vec<ResolvedReference>,
    ) -> Result<()> {
        match (ty, value) {
            (_, Value::Nil)
            | (FieldType::Scalar(Scalar::Int), Value::Int(_))
            | (FieldType::Scalar(Scalar::String), Value::String(_)) => Ok(()),
            (FieldType::Optional(inner), _) => self.walk(inner, value, path, found),
            (FieldType::List(inner), Value::List(items)) => {
                for (i, item) in items.iter().enumerate() {
                    self.walk(inner, item, &format!("{path}[{i}]"), found)?;
                }
                Ok(())
            }
            (FieldType::Map(_, inner), Value::Map(entries)) => {
                for (key, item) in entries.iter() {
                    self.walk(inner, item, &format!("{path}[{key:?}]"), found)?;
                }
                Ok(())
            }
            (FieldType::Reference(target), Value::Ref(raw)) => {
                let ordinal = self
                    .resolve_typed(raw, *target)
                    .map_err(|e| e.with_context(ErrorContext::new().with_field(path)))?;
                found.push(ResolvedReference {
                    path: path.to_string(),
                    target: *target,
                    id: Arc::from(raw.id()),
                    ordinal,
                });
                Ok(())
            }
            (FieldType::Embedded(target), Value::Record(record)) => {
                let declared = self.schema.get(*target)?;
                let actual = self.schema.get(record.ty())?;
                if actual.id() != declared.id() && !actual.descends_from(declared.id()) {
                    return Err(Error::value_mismatch(declared.name(), actual.name())
                        .with_context(ErrorContext::new().with_field(path)));
                }
                self.walk_record(record, path, found)
            }
            _ => Err(Error::value_mismatch(self.schema.describe(ty), value.kind_name())
                .with_context(ErrorContext::new().with_field(path))),
        }
    }
}
