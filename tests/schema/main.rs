//! Integration tests for Layer 1: Schema
//!
//! Tests for the model registry, the instance registry, and reference
//! resolution.

mod instances;
mod references;
mod registry;
