//! Structural and inheritance cycle tests.

use crate::helpers::model_helpers::*;
use edm::hir::{EdmErrorCode, PlaceholderKind, PropertyLike, StructuredTypeLike, validate};
use edm::syntax::{PropertyDecl, SchemaDecl, StructuredTypeDecl};

#[test]
fn test_self_containing_complex_type_reports_once() {
    let model = model_from(
        SchemaDecl::new("NS").with_complex_type(
            StructuredTypeDecl::new("A").with_property(PropertyDecl::new("Self", "NS.A")),
        ),
    );
    let report = validate(&model);
    let cyclic = report.errors_with_code(EdmErrorCode::BadCyclicComplex);
    assert_eq!(cyclic.len(), 1, "{:?}", report.errors());
    assert!(cyclic[0].message.contains("'NS.A'"));

    let property = model.find_type("NS.A").find_property("Self").unwrap();
    let placeholder = property.type_ref().placeholder_def().cloned().unwrap();
    assert_eq!(placeholder.kind, PlaceholderKind::CyclicComplex);
}

#[test]
fn test_mutual_containment_is_cyclic_on_both_sides() {
    let model = model_from(
        SchemaDecl::new("NS")
            .with_complex_type(StructuredTypeDecl::new("A").with_property(PropertyDecl::new("B", "NS.B")))
            .with_complex_type(StructuredTypeDecl::new("B").with_property(PropertyDecl::new("A", "NS.A"))),
    );
    let report = validate(&model);
    assert_eq!(report.errors_with_code(EdmErrorCode::BadCyclicComplex).len(), 2);
}

#[test]
fn test_collections_break_containment() {
    let model = model_from(
        SchemaDecl::new("NS").with_complex_type(
            StructuredTypeDecl::new("Node").with_property(PropertyDecl::new("Children", "Collection(NS.Node)")),
        ),
    );
    assert!(validate(&model).is_valid());
}

#[test]
fn test_containing_a_derived_type_is_cyclic() {
    let model = model_from(
        SchemaDecl::new("NS")
            .with_complex_type(
                StructuredTypeDecl::new("Base").with_property(PropertyDecl::new("Extra", "NS.Derived")),
            )
            .with_complex_type(StructuredTypeDecl::new("Derived").with_base_type("NS.Base")),
    );
    let report = validate(&model);
    assert_eq!(report.errors_with_code(EdmErrorCode::BadCyclicComplex).len(), 1);
}

#[test]
fn test_base_type_cycle_terminates() {
    let model = model_from(
        SchemaDecl::new("NS")
            .with_entity_type(
                StructuredTypeDecl::new("A")
                    .with_base_type("NS.B")
                    .with_property(PropertyDecl::new("X", "Edm.Int32")),
            )
            .with_entity_type(StructuredTypeDecl::new("B").with_base_type("NS.A")),
    );
    let a = model.find_type("NS.A");
    let b = model.find_type("NS.B");
    for ty in [&a, &b] {
        let base = ty.base_type().unwrap();
        assert_eq!(base.placeholder().unwrap().kind, PlaceholderKind::CyclicEntity);
    }
    assert_eq!(a.properties().len(), 1);

    let report = validate(&model);
    assert_eq!(report.errors_with_code(EdmErrorCode::BadCyclicEntity).len(), 2);
}

#[test]
fn test_entity_holding_itself_by_value_is_cyclic() {
    let model = model_from(
        SchemaDecl::new("NS").with_entity_type(
            StructuredTypeDecl::new("E")
                .with_key("Id")
                .with_property(PropertyDecl::new("Id", "Edm.Int32").with_nullable(false))
                .with_property(PropertyDecl::new("Self", "NS.E")),
        ),
    );
    let property = model.find_type("NS.E").find_property("Self").unwrap();
    let placeholder = property.type_ref().placeholder_def().cloned().unwrap();
    assert_eq!(placeholder.kind, PlaceholderKind::CyclicEntity);
    assert!(placeholder.errors[0].message.contains("entity type 'NS.E'"));

    let report = validate(&model);
    assert_eq!(report.errors_with_code(EdmErrorCode::BadCyclicEntity).len(), 1, "{:?}", report.errors());
}

#[test]
fn test_entity_reached_through_complex_field_is_cyclic() {
    let model = model_from(
        SchemaDecl::new("NS")
            .with_entity_type(
                StructuredTypeDecl::new("Order")
                    .with_key("Id")
                    .with_property(PropertyDecl::new("Id", "Edm.Int32").with_nullable(false))
                    .with_property(PropertyDecl::new("Details", "NS.Details")),
            )
            .with_complex_type(
                StructuredTypeDecl::new("Details").with_property(PropertyDecl::new("Owner", "NS.Order")),
            ),
    );
    let report = validate(&model);
    assert_eq!(report.errors_with_code(EdmErrorCode::BadCyclicComplex).len(), 1, "{:?}", report.errors());
    assert_eq!(report.errors_with_code(EdmErrorCode::BadCyclicEntity).len(), 1);
}
