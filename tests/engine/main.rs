//! Integration tests for Layer 2: Engine
//!
//! Tests for dependency sets, classification, polymorphic groups, naming,
//! ladders, and the resolved model.

mod dependencies;
mod resolved;
