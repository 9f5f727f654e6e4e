//! Loading data files into the instance registry.
//!
//! Every `*.json` file under the data directory is an object whose keys are
//! list fields of the catalog type. Files are merged per field in sorted path
//! order, then converted to [`Value`]s by walking the declared field types,
//! registered field by field in catalog declaration order, and sealed.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use modelgen_foundation::{
    EntityTypeId, Error, ErrorContext, ErrorKind, FieldType, LtMap, LtVec, RawReference, Record,
    Result, Scalar, Value,
};
use modelgen_schema::{EntityType, FieldSchema, InstanceRegistry, ModelRegistry};
use serde_json::{Map, Value as Json};
use tracing::{debug, info};
use walkdir::WalkDir;

/// Field every catalog instance is keyed by.
pub const ID_FIELD: &str = "id";

/// Field selecting the concrete type of an abstract list element.
pub const DISCRIMINATOR_FIELD: &str = "type";

/// One catalog field's entries, with the file each came from.
type Entries = Vec<(Arc<str>, Json)>;

/// Loads catalog data files against a schema.
#[derive(Clone, Copy, Debug)]
pub struct DataLoader<'a> {
    schema: &'a ModelRegistry,
    catalog: &'a EntityType,
}

impl<'a> DataLoader<'a> {
    /// Creates a loader for the catalog type of `schema`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidSchema` if the schema declares no catalog.
    pub fn new(schema: &'a ModelRegistry) -> Result<Self> {
        let id = schema
            .catalog()
            .ok_or_else(|| Error::invalid_schema("schema declares no catalog type"))?;
        Ok(Self {
            schema,
            catalog: schema.get(id)?,
        })
    }

    /// Loads every `*.json` file below `dir` and seals the registry.
    ///
    /// # Errors
    ///
    /// Returns `Io` if the directory cannot be walked, and everything
    /// [`load_files`](Self::load_files) returns.
    pub fn load_dir(&self, dir: &Path) -> Result<InstanceRegistry> {
        let files = data_files(dir)?;
        info!(dir = %dir.display(), files = files.len(), "loading data directory");
        self.load_files(&files)
    }

    /// Loads the given files in order and seals the registry.
    ///
    /// # Errors
    ///
    /// Returns `Io` or `Parse` for unreadable files, and everything
    /// [`load_documents`](Self::load_documents) returns.
    pub fn load_files(&self, files: &[PathBuf]) -> Result<InstanceRegistry> {
        let mut documents = Vec::with_capacity(files.len());
        for path in files {
            let source = path.display().to_string();
            let text = fs::read_to_string(path).map_err(|e| {
                Error::new(ErrorKind::Io(e.to_string()))
                    .with_context(ErrorContext::new().with_source(&source))
            })?;
            let json: Json = serde_json::from_str(&text).map_err(|e| {
                Error::new(ErrorKind::Parse(e.to_string()))
                    .with_context(ErrorContext::new().with_source(&source))
            })?;
            documents.push((source, json));
        }
        self.load_documents(documents)
    }

    /// Merges parsed documents, registers their instances, and seals.
    ///
    /// Each document is labeled with its source for error context.
    ///
    /// # Errors
    ///
    /// Returns `Parse` for non-object documents or unknown catalog keys,
    /// conversion errors for malformed entries, and `DuplicateInstanceId`
    /// for repeated ids.
    pub fn load_documents<S>(&self, documents: impl IntoIterator<Item = (S, Json)>) -> Result<InstanceRegistry>
    where
        S: Into<Arc<str>>,
    {
        let fields = self.catalog.fields();
        let mut merged: Vec<Entries> = vec![Vec::new(); fields.len()];

        for (source, json) in documents {
            let source: Arc<str> = source.into();
            let context = || ErrorContext::new().with_source(&*source);
            let object = match json {
                Json::Object(object) => object,
                other => {
                    return Err(Error::new(ErrorKind::Parse(format!(
                        "expected an object of catalog lists, found {}",
                        json_kind(&other)
                    )))
                    .with_context(context()));
                }
            };
            for (key, entries) in object {
                let index = fields.iter().position(|f| f.name.as_ref() == key).ok_or_else(|| {
                    Error::new(ErrorKind::Parse(format!(
                        "unknown key {key:?} for {}",
                        self.catalog.name()
                    )))
                    .with_context(context())
                })?;
                let entries = match entries {
                    Json::Array(entries) => entries,
                    other => {
                        return Err(Error::value_mismatch("list", json_kind(&other))
                            .with_context(context().with_field(key)));
                    }
                };
                debug!(source = %source, field = %key, entries = entries.len(), "merged catalog entries");
                merged[index].extend(entries.into_iter().map(|e| (source.clone(), e)));
            }
        }

        let mut instances = InstanceRegistry::new();
        for (field, entries) in fields.iter().zip(merged) {
            let element = catalog_element(self.schema, self.catalog, field)?;
            for (source, entry) in entries {
                self.register_entry(&mut instances, element, &entry).map_err(|e| {
                    e.with_context(ErrorContext::new().with_source(&*source))
                })?;
            }
        }
        instances.seal();
        Ok(instances)
    }

    fn register_entry(
        &self,
        instances: &mut InstanceRegistry,
        element: EntityTypeId,
        entry: &Json,
    ) -> Result<()> {
        let record = self.convert_embedded(element, entry)?;
        let entity = self.schema.get(record.ty())?;
        let id = record
            .get(ID_FIELD)
            .and_then(Value::as_str)
            .map(Arc::<str>::from)
            .ok_or_else(|| Error::missing_field(entity.name(), ID_FIELD))?;
        instances
            .register(self.schema, id.clone(), record)
            .map_err(|e| {
                e.with_context(
                    ErrorContext::new()
                        .with_entity(entity.name())
                        .with_instance(id.as_ref()),
                )
            })?;
        Ok(())
    }

    /// Converts a JSON object to a record of `ty`.
    ///
    /// Absent or null fields take their default; required fields without
    /// one are an error. Keys the entity does not declare are rejected.
    ///
    /// # Errors
    ///
    /// Returns `MissingField`, `ValueMismatch`, or `MalformedReference` with
    /// the entity and field attached.
    pub fn convert_record(&self, ty: EntityTypeId, object: &Map<String, Json>) -> Result<Record> {
        let entity = self.schema.get(ty)?;
        let context = |field: &str| ErrorContext::new().with_entity(entity.name()).with_field(field);

        if let Some(unknown) = object.keys().find(|k| entity.field(k).is_none()) {
            return Err(Error::value_mismatch(
                format!("a field of {}", entity.name()),
                format!("key {unknown:?}"),
            )
            .with_context(context(unknown)));
        }

        let mut record = Record::new(ty);
        for field in entity.fields() {
            let value = match object.get(field.name.as_ref()) {
                None | Some(Json::Null) => absent_value(entity, field)?,
                Some(json) => {
                    let value = self
                        .convert(&field.ty, json)
                        .map_err(|e| e.with_context(context(&field.name)))?;
                    check_constant(field, &value).map_err(|e| e.with_context(context(&field.name)))?;
                    value
                }
            };
            record = record.with(field.name.clone(), value);
        }
        Ok(record)
    }

    /// Converts a JSON value to a [`Value`] of the declared type.
    ///
    /// References are parsed but not resolved.
    ///
    /// # Errors
    ///
    /// Returns `ValueMismatch` if the JSON shape does not fit `ty`.
    pub fn convert(&self, ty: &FieldType, json: &Json) -> Result<Value> {
        let mismatch = || Error::value_mismatch(self.schema.describe(ty), json_kind(json));
        match ty {
            FieldType::Optional(_) if json.is_null() => Ok(Value::Nil),
            FieldType::Optional(inner) => self.convert(inner, json),
            FieldType::Scalar(Scalar::Int) => json.as_i64().map(Value::Int).ok_or_else(mismatch),
            FieldType::Scalar(Scalar::String) => json.as_str().map(Value::string).ok_or_else(mismatch),
            FieldType::List(element) => {
                let items = json.as_array().ok_or_else(mismatch)?;
                items
                    .iter()
                    .map(|item| self.convert(element, item))
                    .collect::<Result<LtVec<_>>>()
                    .map(Value::List)
            }
            FieldType::Map(key, value) => {
                let object = json.as_object().ok_or_else(mismatch)?;
                object
                    .iter()
                    .map(|(k, v)| Ok((map_key(key, k)?, self.convert(value, v)?)))
                    .collect::<Result<LtMap<_, _>>>()
                    .map(Value::Map)
            }
            FieldType::Reference(_) => {
                let payload = json.as_str().ok_or_else(mismatch)?;
                RawReference::parse(payload).map(Value::Ref)
            }
            FieldType::Embedded(target) => self.convert_embedded(*target, json).map(Value::Record),
        }
    }

    fn convert_embedded(&self, declared: EntityTypeId, json: &Json) -> Result<Record> {
        let object = json.as_object().ok_or_else(|| {
            Error::value_mismatch(self.schema.name_of(declared), json_kind(json))
        })?;
        let concrete = self.select_concrete(declared, object)?;
        self.convert_record(concrete, object)
    }

    /// Picks the concrete type of an element declared as `declared`.
    ///
    /// Abstract types are resolved through the `type` discriminator, which
    /// must match the constant `type` field of exactly one descendant.
    fn select_concrete(&self, declared: EntityTypeId, object: &Map<String, Json>) -> Result<EntityTypeId> {
        let entity = self.schema.get(declared)?;
        if entity.is_concrete() {
            return Ok(declared);
        }
        let context = ErrorContext::new()
            .with_entity(entity.name())
            .with_field(DISCRIMINATOR_FIELD);
        let tag = object
            .get(DISCRIMINATOR_FIELD)
            .and_then(Json::as_str)
            .ok_or_else(|| {
                Error::missing_field(entity.name(), DISCRIMINATOR_FIELD).with_context(context.clone())
            })?;
        self.schema
            .concrete_descendants(declared)
            .into_iter()
            .find(|&candidate| {
                self.schema
                    .get(candidate)
                    .ok()
                    .and_then(|c| c.field(DISCRIMINATOR_FIELD))
                    .is_some_and(|f| f.constant && f.default.as_ref().and_then(Value::as_str) == Some(tag))
            })
            .ok_or_else(|| {
                Error::value_mismatch(format!("a variant of {}", entity.name()), format!("type {tag:?}"))
                    .with_context(context)
            })
    }
}

/// Lists `*.json` files below `dir` in sorted path order.
///
/// # Errors
///
/// Returns `Io` if the directory cannot be walked.
pub fn data_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in WalkDir::new(dir).sort_by_file_name() {
        let entry = entry.map_err(|e| {
            Error::new(ErrorKind::Io(e.to_string()))
                .with_context(ErrorContext::new().with_source(dir.display().to_string()))
        })?;
        let path = entry.path();
        if entry.file_type().is_file() && path.extension().is_some_and(|ext| ext == "json") {
            files.push(path.to_path_buf());
        }
    }
    files.sort();
    Ok(files)
}

fn catalog_element(schema: &ModelRegistry, catalog: &EntityType, field: &FieldSchema) -> Result<EntityTypeId> {
    let ty = match &field.ty {
        FieldType::Optional(inner) => inner.as_ref(),
        other => other,
    };
    match ty.list_element() {
        Some(FieldType::Embedded(element)) => Ok(*element),
        _ => Err(Error::invalid_schema(format!(
            "catalog field {}.{} must be a list of entities, not {}",
            catalog.name(),
            field.name,
            schema.describe(&field.ty)
        ))),
    }
}

fn absent_value(entity: &EntityType, field: &FieldSchema) -> Result<Value> {
    match (&field.default, field.required) {
        (Some(default), _) => Ok(default.clone()),
        (None, false) => Ok(Value::Nil),
        (None, true) => Err(Error::missing_field(entity.name(), field.name.as_ref())),
    }
}

fn check_constant(field: &FieldSchema, value: &Value) -> Result<()> {
    match &field.default {
        Some(expected) if field.constant && expected != value => {
            Err(Error::value_mismatch(format!("{expected:?}"), format!("{value:?}")))
        }
        _ => Ok(()),
    }
}

fn map_key(ty: &FieldType, key: &str) -> Result<Value> {
    match ty {
        FieldType::Scalar(Scalar::String) => Ok(Value::string(key)),
        FieldType::Scalar(Scalar::Int) => key
            .parse()
            .map(Value::Int)
            .map_err(|_| Error::value_mismatch("int key", format!("{key:?}"))),
        _ => Err(Error::invalid_schema("map keys must be scalar")),
    }
}

fn json_kind(json: &Json) -> &'static str {
    match json {
        Json::Null => "null",
        Json::Bool(_) => "bool",
        Json::Number(_) => "number",
        Json::String(_) => "string",
        Json::Array(_) => "list",
        Json::Object(_) => "object",
    }
}
