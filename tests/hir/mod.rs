//! HIR layer tests
//!
//! Tests for the resolved semantic model:
//! - Name, alias and cross-model resolution
//! - Cycle detection (structural and inheritance)
//! - Placeholder behaviour
//! - Annotations, bindings and out-of-line targets
//! - Validation reports

pub mod tests_annotations;
pub mod tests_cycles;
pub mod tests_placeholders;
pub mod tests_resolution;
pub mod tests_validation;
