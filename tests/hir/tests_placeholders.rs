//! Placeholder conformance: every kind answers every capability neutrally.

use rstest::rstest;

use edm::hir::{
    Annotatable, Checkable, Element, Named, Placeholder, PlaceholderKind, PropertyElement,
    PropertyLike, StructuredTypeLike, TypeElement, TermElement,
};
use edm::Location;

fn placeholder(kind: PlaceholderKind) -> std::sync::Arc<Placeholder> {
    Placeholder::unresolved(kind, "NS.Missing", Location::at("test.csdl", 4, 2))
}

#[rstest]
fn test_placeholder_conformance(
    #[values(
        PlaceholderKind::Bad,
        PlaceholderKind::UnresolvedType,
        PlaceholderKind::UnresolvedProperty,
        PlaceholderKind::UnresolvedTerm,
        PlaceholderKind::UnresolvedContainer,
        PlaceholderKind::UnresolvedEntitySet,
        PlaceholderKind::UnresolvedAssociation,
        PlaceholderKind::UnresolvedRole,
        PlaceholderKind::UnresolvedEnumMember,
        PlaceholderKind::UnresolvedLabeledElement,
        PlaceholderKind::CyclicComplex,
        PlaceholderKind::CyclicEntity
    )]
    kind: PlaceholderKind,
) {
    let p = placeholder(kind);
    assert_eq!(p.errors.len(), 1);
    assert_eq!(p.errors[0].code, kind.error_code());
    assert!(p.errors[0].message.contains("NS.Missing"));

    let ty: TypeElement<'_> = Element::Placeholder(p.clone());
    assert_eq!(ty.qualified_name(), "NS.Missing");
    assert_eq!(ty.name(), "Missing");
    assert_eq!(ty.namespace(), "NS");
    assert!(ty.annotations().is_empty());
    assert!(ty.base_type().is_none());
    assert!(ty.properties().is_empty());
    assert!(ty.find_property("Anything").is_none());
    assert!(!ty.is_abstract() && !ty.is_open());
    assert_eq!(ty.errors(), p.errors);
    assert!(!ty.is_valid());

    let property: PropertyElement<'_> = Element::Placeholder(p.clone());
    assert!(property.declaring_type().is_none());
    assert!(property.default_value().is_none());
    assert_eq!(property.type_ref().placeholder_def(), Some(&p));

    let term: TermElement<'_> = Element::Placeholder(p.clone());
    assert!(term.annotations_for("NS.Anything").is_empty());
}

#[test]
fn test_conformance_table_covers_every_kind() {
    assert_eq!(PlaceholderKind::ALL.len(), 12);
    for kind in PlaceholderKind::ALL {
        assert_eq!(kind.is_cyclic(), !kind.is_unresolved() && kind != PlaceholderKind::Bad);
    }
}

#[rstest]
#[case("NS.Missing", "NS", "Missing")]
#[case("Org.Example.Deep.Name", "Org.Example.Deep", "Name")]
#[case("Bare", "", "Bare")]
fn test_placeholder_name_split(#[case] full: &str, #[case] namespace: &str, #[case] name: &str) {
    let ty: TypeElement<'_> = Element::Placeholder(Placeholder::unresolved(
        PlaceholderKind::UnresolvedType,
        full,
        Location::default(),
    ));
    assert_eq!(ty.namespace(), namespace);
    assert_eq!(ty.name(), name);
    assert_eq!(ty.qualified_name(), full);
}
