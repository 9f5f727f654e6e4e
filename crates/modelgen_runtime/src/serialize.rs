//! Model snapshots using `MessagePack`.
//!
//! A [`ModelSnapshot`] captures everything a generation run derived from the
//! schema and data: categories, names, dependency sets, polymorphic groups,
//! and token ids. Two snapshots of the same inputs are byte-identical, so
//! downstream tooling can diff runs without re-running the generator.

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use modelgen_engine::{Category, DependencySet, Names, PolymorphicGroup, ResolvedModel};
use modelgen_foundation::{EntityTypeId, Error, ErrorContext, ErrorKind, Result};
use serde::{Deserialize, Serialize};

/// Derived facts of one classified entity type.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeSnapshot {
    /// Registry id.
    pub id: EntityTypeId,
    /// Declared type name.
    pub name: String,
    /// Generation category.
    pub category: Category,
    /// Derived names.
    pub names: Names,
    /// Dependency sets.
    pub dependencies: DependencySet,
}

/// One fungible token assignment.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenSnapshot {
    /// Declared type name of the instance.
    pub entity: String,
    /// Instance id.
    pub id: String,
    /// Assigned token id.
    pub token_id: u32,
}

/// Serializable summary of a [`ResolvedModel`].
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelSnapshot {
    /// Classified types in id order.
    pub types: Vec<TypeSnapshot>,
    /// Polymorphic groups in discovery order.
    pub groups: Vec<PolymorphicGroup>,
    /// Fungible tokens in token id order.
    pub tokens: Vec<TokenSnapshot>,
}

impl ModelSnapshot {
    /// Captures a resolved model.
    ///
    /// # Errors
    ///
    /// Returns an internal error if the model is missing a derived answer.
    pub fn capture(model: &ResolvedModel) -> Result<Self> {
        let mut types = Vec::with_capacity(model.classification().len());
        for (ty, category) in model.classification().iter() {
            types.push(TypeSnapshot {
                id: ty,
                name: model.entity(ty)?.name().to_string(),
                category,
                names: model.names(ty)?.clone(),
                dependencies: model.dependencies_of(ty)?.clone(),
            });
        }

        let mut tokens = Vec::with_capacity(model.fungible_instances().len());
        for &key in model.fungible_instances() {
            let (Some(instance), Some(token_id)) = (model.instance(key), model.token_id(key)) else {
                return Err(Error::internal("fungible instance without a token id")
                    .with_context(model.context_for(key)));
            };
            tokens.push(TokenSnapshot {
                entity: model.schema().name_of(key.ty).to_string(),
                id: instance.id().to_string(),
                token_id,
            });
        }

        Ok(Self {
            types,
            groups: model.polymorphic_groups().iter().cloned().collect(),
            tokens,
        })
    }

    /// Finds a type by its declared name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&TypeSnapshot> {
        self.types.iter().find(|t| t.name == name)
    }
}

fn serialization_error(e: impl std::fmt::Display) -> Error {
    Error::new(ErrorKind::Serialization(e.to_string()))
}

fn io_error(action: &str, path: &Path, e: &std::io::Error) -> Error {
    Error::new(ErrorKind::Io(format!("failed to {action}: {e}")))
        .with_context(ErrorContext::new().with_source(path.display().to_string()))
}

/// Serializes a snapshot to bytes using `MessagePack` format.
///
/// Uses named serialization to preserve struct field names.
///
/// # Errors
///
/// Returns an error if serialization fails.
pub fn to_bytes(snapshot: &ModelSnapshot) -> Result<Vec<u8>> {
    rmp_serde::to_vec_named(snapshot).map_err(serialization_error)
}

/// Deserializes a snapshot from `MessagePack` bytes.
///
/// # Errors
///
/// Returns an error if deserialization fails.
pub fn from_bytes(bytes: &[u8]) -> Result<ModelSnapshot> {
    rmp_serde::from_slice(bytes).map_err(serialization_error)
}

/// Saves a snapshot to a file, overwriting it if it exists.
///
/// # Errors
///
/// Returns an error if the file cannot be written or serialization fails.
pub fn save_to_file<P: AsRef<Path>>(snapshot: &ModelSnapshot, path: P) -> Result<()> {
    let path = path.as_ref();
    let bytes = to_bytes(snapshot)?;
    let file = File::create(path).map_err(|e| io_error("create file", path, &e))?;
    let mut writer = BufWriter::new(file);
    writer
        .write_all(&bytes)
        .map_err(|e| io_error("write file", path, &e))?;
    writer.flush().map_err(|e| io_error("flush file", path, &e))?;
    tracing::info!(path = %path.display(), bytes = bytes.len(), "wrote model snapshot");
    Ok(())
}

/// Loads a snapshot from a file.
///
/// # Errors
///
/// Returns an error if the file cannot be read or deserialization fails.
pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<ModelSnapshot> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| io_error("open file", path, &e))?;
    let mut reader = BufReader::new(file);
    let mut bytes = Vec::new();
    reader
        .read_to_end(&mut bytes)
        .map_err(|e| io_error("read file", path, &e))?;
    from_bytes(&bytes)
}
