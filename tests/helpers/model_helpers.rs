//! Model builders and diagnostic assertions.

use edm::hir::{EdmError, EdmErrorCode, Model, ModelOptions, ValidationReport, validate};
use edm::syntax::SchemaDecl;

/// Options without the shared Core vocabulary, so error counts only
/// reflect the schemas under test.
pub fn isolated() -> ModelOptions {
    ModelOptions {
        include_core_vocabulary: false,
        ..ModelOptions::default()
    }
}

/// Builds a model from one schema, without the Core vocabulary.
pub fn model_from(schema: SchemaDecl) -> Model {
    models_from(vec![schema])
}

pub fn models_from(schemas: Vec<SchemaDecl>) -> Model {
    Model::builder().with_options(isolated()).with_schemas(schemas).build()
}

/// Validates and returns the report.
pub fn report_for(schema: SchemaDecl) -> ValidationReport {
    validate(&model_from(schema))
}

pub fn codes(errors: &[EdmError]) -> Vec<EdmErrorCode> {
    errors.iter().map(|e| e.code).collect()
}

pub fn has_error_containing(errors: &[EdmError], substring: &str) -> bool {
    errors.iter().any(|e| e.message.contains(substring))
}
