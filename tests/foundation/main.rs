//! Integration tests for Layer 0: Foundation
//!
//! Tests for core types: references, values, field types, and errors.

mod errors;
mod values;
