//! Name resolution tests.

use std::sync::Arc;

use crate::helpers::model_helpers::*;
use edm::hir::{
    EdmErrorCode, Model, Named, PropertyLike, StructuredTypeLike, TypeDef, validate,
};
use edm::syntax::{
    AssociationDecl, AssociationEndDecl, ContainerDecl, Multiplicity, NavigationPropertyDecl,
    PropertyDecl, SchemaDecl, StructuredTypeDecl,
};

fn geometry() -> SchemaDecl {
    SchemaDecl::new("NS")
        .with_complex_type(
            StructuredTypeDecl::new("Point")
                .with_property(PropertyDecl::new("X", "Edm.Int32"))
                .with_property(PropertyDecl::new("Y", "Edm.Int32")),
        )
        .with_complex_type(
            StructuredTypeDecl::new("Line")
                .with_property(PropertyDecl::new("Start", "NS.Point"))
                .with_property(PropertyDecl::new("End", "NS.Point")),
        )
}

// =============================================================================
// IDENTITY AND MEMOIZATION
// =============================================================================

#[test]
fn test_properties_share_the_resolved_type() {
    let model = model_from(geometry());
    let line = model.find_type("NS.Line");
    let start = line.find_property("Start").unwrap();
    let end = line.find_property("End").unwrap();

    let start_type = start.type_element().unwrap();
    let end_type = end.type_element().unwrap();
    assert_eq!(start_type, end_type);
    assert_eq!(start_type, model.find_type("NS.Point"));
}

#[test]
fn test_resolution_is_idempotent() {
    let model = model_from(
        SchemaDecl::new("NS").with_complex_type(
            StructuredTypeDecl::new("Shape").with_property(PropertyDecl::new("Origin", "NS.Missing")),
        ),
    );
    let origin = model.find_type("NS.Shape").find_property("Origin").unwrap();

    let first = origin.type_ref();
    let second = origin.type_ref();
    assert_eq!(first, second);
    let (Some(a), Some(b)) = (first.placeholder_def(), second.placeholder_def()) else {
        panic!("expected an unresolved type");
    };
    assert!(Arc::ptr_eq(a, b));
}

// =============================================================================
// ALIASES AND REFERENCES
// =============================================================================

#[test]
fn test_alias_and_namespace_resolve_to_the_same_type() {
    let model = model_from(
        SchemaDecl::new("Org.Example.Geometry")
            .with_alias("geo")
            .with_complex_type(StructuredTypeDecl::new("Point"))
            .with_complex_type(
                StructuredTypeDecl::new("Pair")
                    .with_property(PropertyDecl::new("A", "geo.Point"))
                    .with_property(PropertyDecl::new("B", "Org.Example.Geometry.Point")),
            ),
    );
    let pair = model.find_type("Org.Example.Geometry.Pair");
    let a = pair.find_property("A").unwrap().type_element().unwrap();
    let b = pair.find_property("B").unwrap().type_element().unwrap();
    assert_eq!(a, b);
    assert_eq!(a.qualified_name(), "Org.Example.Geometry.Point");
}

#[test]
fn test_referenced_model_answers_queries() {
    let shared = Arc::new(model_from(geometry()));
    let model = Model::builder()
        .with_options(isolated())
        .with_reference(shared.clone())
        .with_schema(
            SchemaDecl::new("App").with_complex_type(
                StructuredTypeDecl::new("Route").with_property(PropertyDecl::new("Leg", "NS.Line")),
            ),
        )
        .build();

    let leg = model.find_type("App.Route").find_property("Leg").unwrap();
    let line = leg.type_element().unwrap();
    assert_eq!(line.qualified_name(), "NS.Line");
    assert_eq!(line, shared.find_type("NS.Line"));
    assert!(validate(&model).is_valid());
}

#[test]
fn test_collection_and_primitive_references() {
    let model = model_from(
        SchemaDecl::new("NS")
            .with_complex_type(StructuredTypeDecl::new("Tag"))
            .with_complex_type(
                StructuredTypeDecl::new("Post")
                    .with_property(PropertyDecl::new("Tags", "Collection(NS.Tag)"))
                    .with_property(PropertyDecl::new("Title", "Edm.String").with_nullable(false)),
            ),
    );
    let post = model.find_type("NS.Post");
    let tags = post.find_property("Tags").unwrap().type_ref();
    assert!(tags.is_collection());
    assert!(matches!(tags.element_type().definition, TypeDef::Declared(_)));

    let title = post.find_property("Title").unwrap().type_ref();
    assert!(title.as_primitive().is_some());
    assert!(!title.nullable);
}

// =============================================================================
// DUPLICATES
// =============================================================================

#[test]
fn test_duplicate_type_reports_once_and_first_wins() {
    let schema = SchemaDecl::new("NS")
        .with_complex_type(StructuredTypeDecl::new("Widget").with_property(PropertyDecl::new("A", "Edm.Int32")))
        .with_complex_type(StructuredTypeDecl::new("Widget").with_property(PropertyDecl::new("B", "Edm.Int32")));
    let model = model_from(schema);
    let report = validate(&model);

    assert_eq!(report.errors_with_code(EdmErrorCode::DuplicateDeclaration).len(), 1);
    let widget = model.find_type("NS.Widget");
    assert!(widget.find_property("A").is_some());
    assert!(widget.find_property("B").is_none());
}

// =============================================================================
// INHERITANCE, KEYS, NAVIGATION
// =============================================================================

#[test]
fn test_inherited_properties_and_key() {
    let model = model_from(
        SchemaDecl::new("NS")
            .with_entity_type(
                StructuredTypeDecl::new("Person")
                    .with_key("Id")
                    .with_property(PropertyDecl::new("Id", "Edm.Int32").with_nullable(false)),
            )
            .with_entity_type(
                StructuredTypeDecl::new("Employee")
                    .with_base_type("NS.Person")
                    .with_property(PropertyDecl::new("Salary", "Edm.Decimal")),
            ),
    );
    let employee = model.find_type("NS.Employee").into_declared().unwrap();
    let names: Vec<_> = employee.properties().iter().map(|p| p.name().clone()).collect();
    assert_eq!(names, vec!["Id", "Salary"]);
    assert!(employee.key().is_empty());
    assert_eq!(employee.effective_key().len(), 1);
    assert!(employee.is_or_derives_from(&model.find_type("NS.Person").into_declared().unwrap()));
}

#[test]
fn test_navigation_resolves_through_association() {
    let model = model_from(
        SchemaDecl::new("NS")
            .with_entity_type(
                StructuredTypeDecl::new("Order")
                    .with_key("Id")
                    .with_property(PropertyDecl::new("Id", "Edm.Int32").with_nullable(false))
                    .with_navigation_property(NavigationPropertyDecl::new(
                        "Customer",
                        "NS.OrderCustomer",
                        "Order",
                        "Customer",
                    )),
            )
            .with_entity_type(
                StructuredTypeDecl::new("Customer")
                    .with_key("Id")
                    .with_property(PropertyDecl::new("Id", "Edm.Int32").with_nullable(false)),
            )
            .with_association(AssociationDecl::new(
                "OrderCustomer",
                AssociationEndDecl::new("Order", "NS.Order", Multiplicity::Many),
                AssociationEndDecl::new("Customer", "NS.Customer", Multiplicity::ZeroOrOne),
            ))
            .with_container(
                ContainerDecl::new("Store")
                    .with_entity_set("Orders", "NS.Order")
                    .with_entity_set("Customers", "NS.Customer"),
            ),
    );
    let order = model.find_type("NS.Order").into_declared().unwrap();
    let customer = order.find_navigation_property("Customer").unwrap();
    assert_eq!(customer.target_type(), model.find_type("NS.Customer"));
    assert!(customer.type_ref().nullable);
    assert!(!customer.type_ref().is_collection());

    let store = model.find_container("NS.Store").into_declared().unwrap();
    let orders = store.find_entity_set("Orders").unwrap();
    assert_eq!(orders.qualified_name(), "NS.Store/Orders");
    assert_eq!(orders.entity_type(), model.find_type("NS.Order"));
    assert!(validate(&model).is_valid());
}

#[test]
fn test_navigation_with_unknown_role() {
    let model = model_from(
        SchemaDecl::new("NS")
            .with_entity_type(
                StructuredTypeDecl::new("Order").with_navigation_property(NavigationPropertyDecl::new(
                    "Customer",
                    "NS.OrderCustomer",
                    "Order",
                    "Buyer",
                )),
            )
            .with_entity_type(StructuredTypeDecl::new("Customer"))
            .with_association(AssociationDecl::new(
                "OrderCustomer",
                AssociationEndDecl::new("Order", "NS.Order", Multiplicity::Many),
                AssociationEndDecl::new("Customer", "NS.Customer", Multiplicity::One),
            )),
    );
    let report = validate(&model);
    let roles = report.errors_with_code(EdmErrorCode::BadUnresolvedNavigationRole);
    assert_eq!(roles.len(), 1);
    assert!(roles[0].message.contains("Buyer"));
}
