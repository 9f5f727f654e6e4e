//! Core ids, field types, values, and errors for modelgen.
//!
//! This crate provides:
//! - [`EntityTypeId`] and [`Ordinal`] - Stable identities for schema nodes and instances
//! - [`FieldType`] - Recursive field type descriptors
//! - [`Value`] - Immutable instance field values, including lazy [`RawReference`]s
//! - [`Error`] - Rich error types with context
//! - Persistent collections ([`LtVec`], [`LtMap`])

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod collections;
pub mod error;
pub mod ids;
pub mod types;
pub mod value;

pub use collections::{LtMap, LtVec};
pub use error::{Error, ErrorContext, ErrorKind, Result};
pub use ids::{EntityTypeId, InstanceKey, Ordinal};
pub use types::{FieldType, Scalar};
pub use value::{RawReference, Record, Value};
