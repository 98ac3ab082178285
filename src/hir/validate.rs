//! Validation walk.
//!
//! Visits every element of a model once and gathers its diagnostics into a
//! [`ValidationReport`]. This is the only place failures become visible to
//! users: queries themselves never fail.

use rayon::prelude::*;

use super::capabilities::Checkable;
use super::diagnostics::{EdmError, EdmErrorCode, Severity};
use super::model::Model;

/// Diagnostics gathered by [`validate`], in model order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ValidationReport {
    errors: Vec<EdmError>,
}

impl ValidationReport {
    pub fn errors(&self) -> &[EdmError] {
        &self.errors
    }

    /// No error-severity diagnostics.
    pub fn is_valid(&self) -> bool {
        !self.errors.iter().any(|e| e.severity == Severity::Error)
    }

    pub fn error_count(&self) -> usize {
        self.errors.len()
    }

    pub fn errors_with_code(&self, code: EdmErrorCode) -> Vec<&EdmError> {
        self.errors.iter().filter(|e| e.code == code).collect()
    }

    pub fn into_errors(self) -> Vec<EdmError> {
        self.errors
    }
}

/// Check every element; errors from independent elements are reported
/// independently.
pub fn validate(model: &Model) -> ValidationReport {
    let parallel = model.options().parallel_validation;
    if parallel {
        // Cells are written on first touch; warm them before fanning out.
        model.resolve_all();
    }

    let mut errors = model.errors().to_vec();
    errors.extend(walk(model.schemas().collect(), parallel));
    errors.extend(walk(model.schema_types().collect(), parallel));
    errors.extend(walk(model.all_properties().collect(), parallel));
    errors.extend(walk(model.all_navigation_properties().collect(), parallel));
    errors.extend(walk(model.associations().collect(), parallel));
    errors.extend(walk(model.terms().collect(), parallel));
    errors.extend(walk(model.containers().collect(), parallel));
    errors.extend(walk(model.all_entity_sets().collect(), parallel));
    errors.extend(walk(model.all_association_sets().collect(), parallel));
    errors.extend(walk(model.all_annotations().collect(), parallel));

    tracing::debug!(
        "[VALIDATE] {} diagnostic(s){}",
        errors.len(),
        if parallel { " (parallel)" } else { "" }
    );
    ValidationReport { errors }
}

fn walk<V: Checkable + Sync>(views: Vec<V>, parallel: bool) -> Vec<EdmError> {
    if parallel {
        views.par_iter().flat_map_iter(|v| v.errors()).collect()
    } else {
        views.iter().flat_map(|v| v.errors()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hir::ModelOptions;
    use crate::syntax::{PropertyDecl, SchemaDecl, StructuredTypeDecl};

    fn schema() -> SchemaDecl {
        SchemaDecl::new("NS")
            .with_complex_type(
                StructuredTypeDecl::new("Point")
                    .with_property(PropertyDecl::new("X", "Edm.Int32"))
                    .with_property(PropertyDecl::new("Y", "Edm.Int32").with_default_value("high")),
            )
            .with_complex_type(
                StructuredTypeDecl::new("Line").with_property(PropertyDecl::new("From", "NS.Missing")),
            )
    }

    fn build(parallel: bool) -> Model {
        Model::builder()
            .with_options(ModelOptions {
                include_core_vocabulary: false,
                parallel_validation: parallel,
                ..ModelOptions::default()
            })
            .with_schema(schema())
            .build()
    }

    #[test]
    fn test_report_collects_independent_errors() {
        let report = validate(&build(false));
        assert!(!report.is_valid());
        assert_eq!(report.error_count(), 2);
        assert_eq!(report.errors_with_code(EdmErrorCode::InvalidDefaultValue).len(), 1);
        assert_eq!(report.errors_with_code(EdmErrorCode::BadUnresolvedType).len(), 1);
    }

    #[test]
    fn test_parallel_walk_matches_sequential() {
        let sequential = validate(&build(false));
        let parallel = validate(&build(true));
        assert_eq!(sequential, parallel);
    }
}
