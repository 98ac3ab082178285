//! Validation walk tests.

use crate::helpers::model_helpers::*;
use edm::hir::{EdmErrorCode, Model, ModelOptions, Severity, validate};
use edm::syntax::{
    ContainerDecl, EnumTypeDecl, PropertyDecl, SchemaDecl, StructuredTypeDecl, TermDecl,
};

fn messy() -> SchemaDecl {
    SchemaDecl::new("NS")
        .with_enum_type(
            EnumTypeDecl::new("Size")
                .with_underlying_type("Edm.Byte")
                .with_member("Small", None)
                .with_member("Huge", Some("300")),
        )
        .with_complex_type(
            StructuredTypeDecl::new("Box")
                .with_property(PropertyDecl::new("Size", "NS.Size").with_default_value("Small"))
                .with_property(PropertyDecl::new("Weight", "Edm.Double").with_default_value("heavy"))
                .with_property(PropertyDecl::new("Label", "NS.Missing")),
        )
        .with_term(TermDecl::new("1Bad", "Edm.String"))
        .with_container(ContainerDecl::new("Store").with_entity_set("Boxes", "NS.Box"))
}

#[test]
fn test_report_lists_each_independent_error() {
    let report = report_for(messy());
    let mut found = codes(report.errors());
    found.sort_by_key(|c| c.as_str());
    let mut expected = vec![
        EdmErrorCode::InvalidConstant,
        EdmErrorCode::InvalidDefaultValue,
        EdmErrorCode::BadUnresolvedType,
        EdmErrorCode::InvalidName,
        EdmErrorCode::BadTypeReference,
    ];
    expected.sort_by_key(|c| c.as_str());
    assert_eq!(found, expected, "{:?}", report.errors());
    assert!(report.errors().iter().all(|e| e.severity == Severity::Error));
}

#[test]
fn test_messages_name_the_offending_element() {
    let report = report_for(messy());
    assert!(has_error_containing(report.errors(), "NS.Missing"));
    assert!(has_error_containing(report.errors(), "1Bad"));
    assert!(has_error_containing(report.errors(), "heavy"));
}

#[test]
fn test_parallel_validation_matches_sequential() {
    let sequential = report_for(messy());
    let model = Model::builder()
        .with_options(ModelOptions {
            parallel_validation: true,
            ..isolated()
        })
        .with_schema(messy())
        .build();
    assert_eq!(validate(&model), sequential);
}

#[test]
fn test_valid_model_has_empty_report() {
    let report = report_for(
        SchemaDecl::new("NS").with_complex_type(
            StructuredTypeDecl::new("Point")
                .with_property(PropertyDecl::new("X", "Edm.Int32").with_default_value("0")),
        ),
    );
    assert!(report.is_valid());
    assert_eq!(report.error_count(), 0);
}
