//! Modelgen - Schema-driven code generator
//!
//! This crate re-exports all layers of the modelgen system for convenient access.
//! For detailed documentation, see the individual layer crates.
//!
//! # Architecture
//!
//! ```text
//! Layer 3: modelgen_runtime    — Data loading, emitters, snapshots, CLI
//! Layer 2: modelgen_engine     — Dependencies, classification, naming, ladders
//! Layer 1: modelgen_schema     — Model and instance registries, references
//! Layer 0: modelgen_foundation — Core types (Value, FieldType, ids, Error)
//! ```

pub use modelgen_engine as engine;
pub use modelgen_foundation as foundation;
pub use modelgen_runtime as runtime;
pub use modelgen_schema as schema;
