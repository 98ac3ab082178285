//! Core vocabulary tests.

use std::sync::Arc;

use crate::helpers::model_helpers::*;
use edm::hir::{
    Annotatable, Model, ModelOptions, Named, PropertyLike, StructuredTypeLike, validate,
};
use edm::syntax::{AnnotationDecl, ExprDecl, PropertyDecl, SchemaDecl, StructuredTypeDecl};
use edm::vocab::{self, core};

fn annotated_product() -> SchemaDecl {
    SchemaDecl::new("Shop")
        .with_using(vocab::CORE_NAMESPACE, "Core")
        .with_entity_type(
            StructuredTypeDecl::new("Product")
                .with_key("Id")
                .with_property(
                    PropertyDecl::new("Id", "Edm.Int32")
                        .with_nullable(false)
                        .with_annotation(AnnotationDecl::value("Core.Computed", ExprDecl::bool(true))),
                )
                .with_annotation(AnnotationDecl::value(
                    "Core.Description",
                    ExprDecl::string("Something for sale"),
                )),
        )
}

#[test]
fn test_every_core_term_is_declared() {
    let vocabulary = vocab::core_vocabulary();
    for term in core::ALL_TERMS {
        let found = vocabulary.find_term(term);
        assert!(!found.is_placeholder(), "missing {term}");
        assert_eq!(found.qualified_name(), term);
    }
    assert!(!vocabulary.find_type(core::OPTIMISTIC_CONCURRENCY_CONTROL_TYPE).is_placeholder());
}

#[test]
fn test_models_reference_core_by_default() {
    let model = Model::new([annotated_product()]);
    assert!(Arc::ptr_eq(&model.references()[0], &vocab::core_vocabulary()));

    let product = model.find_type("Shop.Product");
    let description = product.annotations_for(core::DESCRIPTION);
    assert_eq!(description.len(), 1);
    assert!(validate(&model).is_valid(), "{:?}", validate(&model).errors());
}

#[test]
fn test_core_terms_unresolved_without_vocabulary() {
    let report = validate(&model_from(annotated_product()));
    assert_eq!(report.error_count(), 2);
}

#[test]
fn test_opting_out_keeps_references_empty() {
    let model = Model::builder()
        .with_options(ModelOptions {
            include_core_vocabulary: false,
            ..ModelOptions::default()
        })
        .with_schema(annotated_product())
        .build();
    assert!(model.references().is_empty());
}

#[test]
fn test_concurrency_control_type_shape() {
    let vocabulary = vocab::core_vocabulary();
    let control = vocabulary.find_type(core::OPTIMISTIC_CONCURRENCY_CONTROL_TYPE);
    let depends_on = control.find_property("ETagDependsOn").unwrap();
    assert!(depends_on.type_ref().is_collection());
}
