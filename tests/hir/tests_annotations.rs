//! Annotation, binding and out-of-line target tests.

use std::sync::Arc;

use crate::helpers::model_helpers::*;
use edm::Location;
use edm::hir::{
    AnnotatedElement, Annotatable, AnnotationTerm, Checkable, EdmErrorCode, Expr, ExprKind,
    Named, StructuredTypeLike, validate,
};
use edm::syntax::{
    AnnotationDecl, AnnotationsDecl, ExprDecl, PropertyDecl, PropertyValueDecl, SchemaDecl,
    StructuredTypeDecl, TermDecl,
};

fn catalog() -> SchemaDecl {
    SchemaDecl::new("NS")
        .with_alias("n")
        .with_term(TermDecl::new("Label", "Edm.String"))
        .with_complex_type(StructuredTypeDecl::new("T").with_property(PropertyDecl::new("Bar", "Edm.String")))
        .with_entity_type(
            StructuredTypeDecl::new("Customer")
                .with_key("Id")
                .with_property(PropertyDecl::new("Id", "Edm.Int32").with_nullable(false))
                .with_property(PropertyDecl::new("Name", "Edm.String")),
        )
}

#[test]
fn test_unbound_property_value_names_property_and_type() {
    let schema = catalog().with_annotations(
        AnnotationsDecl::new("NS.Customer").with_annotation(AnnotationDecl::type_annotation(
            "NS.T",
            vec![
                PropertyValueDecl::new("Foo", ExprDecl::string("x")),
                PropertyValueDecl::new("Bar", ExprDecl::string("y")),
            ],
        )),
    );
    let model = model_from(schema);
    let customer = model.find_type("NS.Customer");
    let annotation = customer.annotations()[0];
    assert!(matches!(annotation.term(), AnnotationTerm::Type(_)));

    let bindings = annotation.property_values();
    let foo = bindings[0].bound_property();
    let message = &foo.placeholder().unwrap().errors[0].message;
    assert!(message.contains("Foo"), "{message}");
    assert!(message.contains("NS.T"), "{message}");
    assert!(!bindings[1].bound_property().is_placeholder());

    let errors = annotation.errors();
    assert_eq!(codes(&errors), vec![EdmErrorCode::BadUnresolvedProperty]);
}

#[test]
fn test_out_of_line_annotation_attaches_to_property() {
    let schema = catalog().with_annotations(
        AnnotationsDecl::new("n.Customer/Name")
            .with_annotation(AnnotationDecl::value("n.Label", ExprDecl::string("Full name"))),
    );
    let model = model_from(schema);
    let name = model.find_type("NS.Customer").find_property("Name").unwrap();

    let annotations = name.annotations_for("NS.Label");
    assert_eq!(annotations.len(), 1);
    let annotation = annotations[0];
    assert!(annotation.is_out_of_line());
    assert_eq!(annotation.target(), Some(AnnotatedElement::Property(name)));
    assert_eq!(annotation.binding_context().unwrap().qualified_name(), "NS.Customer");
    assert!(validate(&model).is_valid());
}

#[test]
fn test_inline_annotations_come_before_attached_ones() {
    let schema = SchemaDecl::new("NS")
        .with_term(TermDecl::new("Label", "Edm.String"))
        .with_entity_type(
            StructuredTypeDecl::new("Customer")
                .with_annotation(AnnotationDecl::value("NS.Label", ExprDecl::string("inline"))),
        )
        .with_annotations(
            AnnotationsDecl::new("NS.Customer").with_annotation(
                AnnotationDecl::value("NS.Label", ExprDecl::string("attached")).with_qualifier("Print"),
            ),
        );
    let model = model_from(schema);
    let annotations = model.find_type("NS.Customer").annotations();
    let qualifiers: Vec<_> = annotations.iter().map(|a| a.qualifier()).collect();
    assert_eq!(qualifiers, vec![None, Some("Print")]);
    assert!(!annotations[0].is_out_of_line());
    assert!(annotations[1].is_out_of_line());
}

#[test]
fn test_unresolved_target_is_reported_once() {
    let schema = catalog().with_annotations(
        AnnotationsDecl::new("NS.Nowhere")
            .with_annotation(AnnotationDecl::value("NS.Label", ExprDecl::string("lost"))),
    );
    let model = model_from(schema);
    let report = validate(&model);
    let targets = report.errors_with_code(EdmErrorCode::BadUnresolvedTarget);
    assert_eq!(targets.len(), 1);
    assert!(targets[0].message.contains("NS.Nowhere"));
    assert_eq!(report.error_count(), 1);
}

#[test]
fn test_unresolved_term_leaves_value_intact() {
    let schema = catalog().with_annotations(
        AnnotationsDecl::new("NS.Customer")
            .with_annotation(AnnotationDecl::value("NS.Unknown", ExprDecl::path("Name"))),
    );
    let model = model_from(schema);
    let annotation = model.find_type("NS.Customer").annotations()[0];
    let AnnotationTerm::Value(term) = annotation.term() else {
        panic!("expected a value term");
    };
    assert!(term.is_placeholder());
    assert_eq!(term.qualified_name(), "NS.Unknown");

    let value = annotation.value().unwrap();
    let ExprKind::Path(path) = value.kind() else {
        panic!("expected a path");
    };
    assert!(!path.referenced_property().is_placeholder());
    assert_eq!(codes(&annotation.errors()), vec![EdmErrorCode::BadUnresolvedTerm]);
}

fn customer_value(model: &edm::hir::Model) -> Expr<'_> {
    model.find_type("NS.Customer").annotations()[0].value().unwrap()
}

fn with_customer_value(expr: ExprDecl) -> SchemaDecl {
    catalog().with_annotations(
        AnnotationsDecl::new("NS.Customer").with_annotation(AnnotationDecl::value("NS.Label", expr)),
    )
}

#[test]
fn test_expression_references_resolve_once() {
    let model = model_from(with_customer_value(ExprDecl::collection(vec![
        ExprDecl::path("Foo"),
        ExprDecl::cast("NS.Nope", ExprDecl::string("x")),
    ])));
    let value = customer_value(&model);
    let elements = || match value.kind() {
        ExprKind::Collection { elements, .. } => elements,
        other => panic!("expected a collection, got {other:?}"),
    };
    let (first, second) = (elements(), elements());

    let (ExprKind::Path(a), ExprKind::Path(b)) = (first[0].kind(), second[0].kind()) else {
        panic!("expected paths");
    };
    let (pa, pb) = (a.referenced_property(), b.referenced_property());
    assert!(Arc::ptr_eq(pa.placeholder().unwrap(), pb.placeholder().unwrap()));
    assert!(Arc::ptr_eq(
        pa.placeholder().unwrap(),
        a.referenced_property().placeholder().unwrap()
    ));

    let (ExprKind::Cast { type_ref: ta, .. }, ExprKind::Cast { type_ref: tb, .. }) =
        (first[1].kind(), second[1].kind())
    else {
        panic!("expected casts");
    };
    assert!(Arc::ptr_eq(ta.placeholder_def().unwrap(), tb.placeholder_def().unwrap()));
}

#[test]
fn test_path_through_primitive_property() {
    let model = model_from(with_customer_value(ExprDecl::path("Name/First")));
    let ExprKind::Path(path) = customer_value(&model).kind() else {
        panic!("expected a path");
    };
    let property = path.referenced_property();
    let message = &property.placeholder().unwrap().errors[0].message;
    assert!(message.contains("'Name'"), "{message}");
    assert!(message.contains("has no properties"), "{message}");
}

#[test]
fn test_record_field_error_points_at_field() {
    let at = Location::at("shop.csdl", 12, 7);
    let model = model_from(with_customer_value(ExprDecl::record(
        Some("NS.T"),
        vec![PropertyValueDecl::new("Foo", ExprDecl::string("x")).at(at.clone())],
    )));
    let ExprKind::Record(record) = customer_value(&model).kind() else {
        panic!("expected a record");
    };
    let foo = record.field_property("Foo").unwrap();
    let error = &foo.placeholder().unwrap().errors[0];
    assert_eq!(error.code, EdmErrorCode::BadUnresolvedProperty);
    assert_eq!(error.location, at);
    assert!(error.message.contains("NS.T"), "{}", error.message);
}
