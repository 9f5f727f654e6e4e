//! The instance registry: every concrete data record of a generation run.
//!
//! Instances are appended during loading and never mutated. Each gets a dense
//! ordinal within its entity type, and fungible instances additionally get a
//! position in one flat token id space shared by all fungible types.

// Allow usize to u32 casts for bucket positions - bounded by registration
#![allow(clippy::cast_possible_truncation)]

use std::collections::HashMap;
use std::sync::Arc;

use modelgen_foundation::{EntityTypeId, Error, InstanceKey, Ordinal, Record, Result};
use tracing::{debug, info};

use crate::registry::ModelRegistry;

/// A registered instance.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Instance {
    id: Arc<str>,
    ordinal: Ordinal,
    record: Record,
}

impl Instance {
    /// The instance's string id, unique within its entity type.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// The instance's position within its entity type.
    #[must_use]
    pub const fn ordinal(&self) -> Ordinal {
        self.ordinal
    }

    /// The instance's entity type.
    #[must_use]
    pub const fn ty(&self) -> EntityTypeId {
        self.record.ty()
    }

    /// The instance's key.
    #[must_use]
    pub const fn key(&self) -> InstanceKey {
        InstanceKey::new(self.record.ty(), self.ordinal)
    }

    /// The instance's field values.
    #[must_use]
    pub const fn record(&self) -> &Record {
        &self.record
    }
}

/// Registry of all instances, populated once and then sealed.
#[derive(Clone, Debug, Default)]
pub struct InstanceRegistry {
    per_type: HashMap<EntityTypeId, Vec<Instance>>,
    by_id: HashMap<(EntityTypeId, Arc<str>), Ordinal>,
    fungible: Vec<InstanceKey>,
    token_ids: HashMap<InstanceKey, u32>,
    unique: Vec<InstanceKey>,
    sealed: bool,
}

impl InstanceRegistry {
    /// Creates an empty, unsealed registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an instance of `record.ty()` under `id`.
    ///
    /// The new instance's ordinal is the number of instances of its type
    /// registered before it.
    ///
    /// # Errors
    ///
    /// Returns `DuplicateInstanceId` if the type already has an instance with
    /// this id, `InvalidSchema` for abstract or catalog types,
    /// `UnknownEntityType` for undeclared types, and an internal error once
    /// the registry is sealed.
    pub fn register(
        &mut self,
        schema: &ModelRegistry,
        id: impl Into<Arc<str>>,
        record: Record,
    ) -> Result<InstanceKey> {
        if self.sealed {
            return Err(Error::internal("instance registry is sealed"));
        }

        let id = id.into();
        let ty = record.ty();
        let entity = schema.get(ty)?;
        if entity.is_abstract() || entity.is_catalog() {
            return Err(Error::invalid_schema(format!(
                "cannot register instance {id:?} of {} type {}",
                if entity.is_abstract() { "abstract" } else { "catalog" },
                entity.name()
            )));
        }
        if self.by_id.contains_key(&(ty, id.clone())) {
            return Err(Error::duplicate_instance(entity.name(), id.as_ref()));
        }

        let bucket = self.per_type.entry(ty).or_default();
        let ordinal = u32::try_from(bucket.len())
            .map(Ordinal::new)
            .map_err(|_| Error::internal(format!("too many instances of {}", entity.name())))?;
        let key = InstanceKey::new(ty, ordinal);

        bucket.push(Instance {
            id: id.clone(),
            ordinal,
            record,
        });
        self.by_id.insert((ty, id.clone()), ordinal);

        if entity.is_fungible() {
            self.token_ids.insert(key, self.fungible.len() as u32);
            self.fungible.push(key);
        }
        if entity.is_unique() {
            self.unique.push(key);
        }

        debug!(entity = entity.name(), id = %id, %ordinal, "registered instance");
        Ok(key)
    }

    /// Ends the registration phase. References can be resolved afterwards.
    pub fn seal(&mut self) {
        if !self.sealed {
            info!(
                instances = self.by_id.len(),
                fungible = self.fungible.len(),
                unique = self.unique.len(),
                "instance registry sealed"
            );
        }
        self.sealed = true;
    }

    /// Returns true once [`seal`](Self::seal) was called.
    #[must_use]
    pub const fn is_sealed(&self) -> bool {
        self.sealed
    }

    /// Looks up the ordinal of `(tag, id)`.
    ///
    /// # Errors
    ///
    /// Returns `UnknownInstance` if no such instance is registered.
    pub fn lookup(&self, schema: &ModelRegistry, tag: &str, id: &str) -> Result<Ordinal> {
        schema
            .by_tag(tag)
            .and_then(|ty| self.ordinal_of(ty, id))
            .ok_or_else(|| Error::unknown_instance(tag, id))
    }

    /// Returns the ordinal of the instance `id` of type `ty`.
    #[must_use]
    pub fn ordinal_of(&self, ty: EntityTypeId, id: &str) -> Option<Ordinal> {
        self.by_id.get(&(ty, Arc::from(id))).copied()
    }

    /// Instances of `ty` in registration order.
    #[must_use]
    pub fn instances_of(&self, ty: EntityTypeId) -> &[Instance] {
        self.per_type.get(&ty).map_or(&[], Vec::as_slice)
    }

    /// Gets an instance by key.
    #[must_use]
    pub fn instance(&self, key: InstanceKey) -> Option<&Instance> {
        self.per_type
            .get(&key.ty)
            .and_then(|bucket| bucket.get(key.ordinal.as_index()))
    }

    /// Fungible instances in global registration order.
    #[must_use]
    pub fn fungible(&self) -> &[InstanceKey] {
        &self.fungible
    }

    /// Unique (nft) instances in global registration order.
    #[must_use]
    pub fn unique(&self) -> &[InstanceKey] {
        &self.unique
    }

    /// Returns the flat fungible token id of `key`.
    #[must_use]
    pub fn token_id(&self, key: InstanceKey) -> Option<u32> {
        self.token_ids.get(&key).copied()
    }

    /// Returns the total number of registered instances.
    #[must_use]
    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    /// Returns true if nothing was registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }
}
