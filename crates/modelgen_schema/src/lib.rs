//! Entity declarations, instance registry, and reference resolution for modelgen.
//!
//! This crate provides:
//! - [`EntitySchema`] / [`FieldSchema`] - Declarative entity type definitions
//! - [`ModelRegistry`] - The explicit schema context passed to every component
//! - [`InstanceRegistry`] - Concrete data instances with stable ordinals
//! - [`ReferenceResolver`] - Deferred resolution of references to ordinals

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod instance;
pub mod reference;
pub mod registry;
pub mod schema;

pub use instance::{Instance, InstanceRegistry};
pub use reference::{ReferenceResolver, ResolvedReference};
pub use registry::{EntityType, ModelRegistry};
pub use schema::{Annotations, EntityKind, EntitySchema, FieldSchema, RootKind};
