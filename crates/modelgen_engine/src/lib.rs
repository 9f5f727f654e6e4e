//! Dependency resolution, classification, and naming for modelgen.
//!
//! This crate provides:
//! - [`DependencyGraph`] - Direct, transitive, and structural dependency sets
//! - [`PolymorphicGroups`] - Polymorphic bases and their ordered variants
//! - [`Classification`] - One generation [`Category`] per concrete type
//! - [`NameTable`] - Canonical and identifier names with plural forms
//! - [`LadderTable`] - Clamped experience ladder lookups
//! - [`ResolvedModel`] - The read-only query surface for emitters

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod classify;
pub mod deps;
pub mod ladder;
pub mod model;
pub mod naming;
pub mod polymorphic;

pub use classify::{Category, Classification, classify_entity};
pub use deps::{DependencyGraph, DependencySet};
pub use ladder::LadderTable;
pub use model::ResolvedModel;
pub use naming::{NameTable, Names, canonical_name, identifier_name, pluralize};
pub use polymorphic::{PolymorphicGroup, PolymorphicGroups};
