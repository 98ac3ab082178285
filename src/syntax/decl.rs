//! Declaration nodes for schemas and their members.

use crate::base::{Location, Name};

use super::expr::{ExprDecl, PropertyValueDecl};
use std::sync::Arc;

// ============================================================================
// SCHEMA
// ============================================================================

/// One schema document: a namespace plus its declarations.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "interchange", derive(serde::Serialize, serde::Deserialize))]
pub struct SchemaDecl {
    pub namespace: Name,
    /// Alias usable in place of `namespace` by references inside this schema.
    pub alias: Option<Name>,
    pub usings: Vec<UsingDecl>,
    pub items: Vec<SchemaItemDecl>,
    /// Out-of-line annotation blocks (`<Annotations Target="...">`).
    pub annotations: Vec<AnnotationsDecl>,
    pub location: Location,
}

/// `Using` declaration: an alias for another namespace, visible in one schema.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "interchange", derive(serde::Serialize, serde::Deserialize))]
pub struct UsingDecl {
    pub namespace: Name,
    pub alias: Name,
    pub location: Location,
}

/// A top-level schema member.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "interchange", derive(serde::Serialize, serde::Deserialize))]
pub enum SchemaItemDecl {
    ComplexType(StructuredTypeDecl),
    EntityType(StructuredTypeDecl),
    EnumType(EnumTypeDecl),
    Association(AssociationDecl),
    Term(TermDecl),
    EntityContainer(ContainerDecl),
}

impl SchemaItemDecl {
    /// The declared (unqualified) name of the item.
    pub fn name(&self) -> &str {
        match self {
            SchemaItemDecl::ComplexType(t) | SchemaItemDecl::EntityType(t) => &t.name,
            SchemaItemDecl::EnumType(e) => &e.name,
            SchemaItemDecl::Association(a) => &a.name,
            SchemaItemDecl::Term(t) => &t.name,
            SchemaItemDecl::EntityContainer(c) => &c.name,
        }
    }

    pub fn location(&self) -> &Location {
        match self {
            SchemaItemDecl::ComplexType(t) | SchemaItemDecl::EntityType(t) => &t.location,
            SchemaItemDecl::EnumType(e) => &e.location,
            SchemaItemDecl::Association(a) => &a.location,
            SchemaItemDecl::Term(t) => &t.location,
            SchemaItemDecl::EntityContainer(c) => &c.location,
        }
    }
}

impl SchemaDecl {
    pub fn new(namespace: impl Into<Name>) -> Self {
        Self {
            namespace: namespace.into(),
            ..Self::default()
        }
    }

    pub fn with_alias(mut self, alias: impl Into<Name>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    pub fn with_using(mut self, namespace: impl Into<Name>, alias: impl Into<Name>) -> Self {
        self.usings.push(UsingDecl {
            namespace: namespace.into(),
            alias: alias.into(),
            location: self.location.clone(),
        });
        self
    }

    pub fn with_item(mut self, item: SchemaItemDecl) -> Self {
        self.items.push(item);
        self
    }

    pub fn with_complex_type(self, decl: StructuredTypeDecl) -> Self {
        self.with_item(SchemaItemDecl::ComplexType(decl))
    }

    pub fn with_entity_type(self, decl: StructuredTypeDecl) -> Self {
        self.with_item(SchemaItemDecl::EntityType(decl))
    }

    pub fn with_enum_type(self, decl: EnumTypeDecl) -> Self {
        self.with_item(SchemaItemDecl::EnumType(decl))
    }

    pub fn with_association(self, decl: AssociationDecl) -> Self {
        self.with_item(SchemaItemDecl::Association(decl))
    }

    pub fn with_term(self, decl: TermDecl) -> Self {
        self.with_item(SchemaItemDecl::Term(decl))
    }

    pub fn with_container(self, decl: ContainerDecl) -> Self {
        self.with_item(SchemaItemDecl::EntityContainer(decl))
    }

    pub fn with_annotations(mut self, block: AnnotationsDecl) -> Self {
        self.annotations.push(block);
        self
    }

    pub fn at(mut self, location: Location) -> Self {
        self.location = location;
        self
    }
}

// ============================================================================
// STRUCTURED TYPES
// ============================================================================

/// A complex or entity type declaration. Which one is decided by the
/// [`SchemaItemDecl`] variant wrapping it.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "interchange", derive(serde::Serialize, serde::Deserialize))]
pub struct StructuredTypeDecl {
    pub name: Name,
    /// Raw qualified name of the base type.
    pub base_type: Option<Name>,
    pub is_abstract: bool,
    pub is_open: bool,
    /// Names of key properties (entity types only).
    pub key: Vec<Name>,
    pub properties: Vec<PropertyDecl>,
    pub navigation_properties: Vec<NavigationPropertyDecl>,
    pub annotations: Vec<AnnotationDecl>,
    pub location: Location,
}

impl StructuredTypeDecl {
    pub fn new(name: impl Into<Name>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_base_type(mut self, base: impl Into<Name>) -> Self {
        self.base_type = Some(base.into());
        self
    }

    pub fn with_abstract(mut self, is_abstract: bool) -> Self {
        self.is_abstract = is_abstract;
        self
    }

    pub fn with_open(mut self, is_open: bool) -> Self {
        self.is_open = is_open;
        self
    }

    pub fn with_key(mut self, property: impl Into<Name>) -> Self {
        self.key.push(property.into());
        self
    }

    pub fn with_property(mut self, property: PropertyDecl) -> Self {
        self.properties.push(property);
        self
    }

    pub fn with_navigation_property(mut self, property: NavigationPropertyDecl) -> Self {
        self.navigation_properties.push(property);
        self
    }

    pub fn with_annotation(mut self, annotation: AnnotationDecl) -> Self {
        self.annotations.push(annotation);
        self
    }

    pub fn at(mut self, location: Location) -> Self {
        self.location = location;
        self
    }
}

/// A structural property.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "interchange", derive(serde::Serialize, serde::Deserialize))]
pub struct PropertyDecl {
    pub name: Name,
    /// Raw type reference (`Edm.Int32`, `NS.Point`, `Collection(NS.Point)`).
    pub type_ref: Name,
    pub nullable: bool,
    pub default_value: Option<String>,
    pub fixed_concurrency: bool,
    pub annotations: Vec<AnnotationDecl>,
    pub location: Location,
}

impl PropertyDecl {
    pub fn new(name: impl Into<Name>, type_ref: impl Into<Name>) -> Self {
        Self {
            name: name.into(),
            type_ref: type_ref.into(),
            nullable: true,
            default_value: None,
            fixed_concurrency: false,
            annotations: Vec::new(),
            location: Location::default(),
        }
    }

    pub fn with_nullable(mut self, nullable: bool) -> Self {
        self.nullable = nullable;
        self
    }

    pub fn with_default_value(mut self, value: impl Into<String>) -> Self {
        self.default_value = Some(value.into());
        self
    }

    pub fn with_fixed_concurrency(mut self, fixed: bool) -> Self {
        self.fixed_concurrency = fixed;
        self
    }

    pub fn with_annotation(mut self, annotation: AnnotationDecl) -> Self {
        self.annotations.push(annotation);
        self
    }

    pub fn at(mut self, location: Location) -> Self {
        self.location = location;
        self
    }
}

/// A navigation property over an association.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "interchange", derive(serde::Serialize, serde::Deserialize))]
pub struct NavigationPropertyDecl {
    pub name: Name,
    /// Raw qualified name of the association.
    pub relationship: Name,
    pub from_role: Name,
    pub to_role: Name,
    pub annotations: Vec<AnnotationDecl>,
    pub location: Location,
}

impl NavigationPropertyDecl {
    pub fn new(
        name: impl Into<Name>,
        relationship: impl Into<Name>,
        from_role: impl Into<Name>,
        to_role: impl Into<Name>,
    ) -> Self {
        Self {
            name: name.into(),
            relationship: relationship.into(),
            from_role: from_role.into(),
            to_role: to_role.into(),
            annotations: Vec::new(),
            location: Location::default(),
        }
    }

    pub fn at(mut self, location: Location) -> Self {
        self.location = location;
        self
    }
}

// ============================================================================
// ENUMS
// ============================================================================

#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "interchange", derive(serde::Serialize, serde::Deserialize))]
pub struct EnumTypeDecl {
    pub name: Name,
    /// Raw underlying integral type; `Edm.Int32` when absent.
    pub underlying_type: Option<Name>,
    pub is_flags: bool,
    pub members: Vec<EnumMemberDecl>,
    pub annotations: Vec<AnnotationDecl>,
    pub location: Location,
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "interchange", derive(serde::Serialize, serde::Deserialize))]
pub struct EnumMemberDecl {
    pub name: Name,
    /// Raw value literal; implicit members count up from the previous one.
    pub value: Option<String>,
    pub location: Location,
}

impl EnumTypeDecl {
    pub fn new(name: impl Into<Name>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_underlying_type(mut self, type_ref: impl Into<Name>) -> Self {
        self.underlying_type = Some(type_ref.into());
        self
    }

    pub fn with_flags(mut self, is_flags: bool) -> Self {
        self.is_flags = is_flags;
        self
    }

    pub fn with_member(mut self, name: impl Into<Name>, value: Option<&str>) -> Self {
        self.members.push(EnumMemberDecl {
            name: name.into(),
            value: value.map(str::to_string),
            location: self.location.clone(),
        });
        self
    }

    pub fn at(mut self, location: Location) -> Self {
        self.location = location;
        self
    }
}

// ============================================================================
// ASSOCIATIONS
// ============================================================================

/// Cardinality of an association end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "interchange", derive(serde::Serialize, serde::Deserialize))]
pub enum Multiplicity {
    ZeroOrOne,
    One,
    Many,
}

impl Multiplicity {
    /// CSDL spelling (`0..1`, `1`, `*`).
    pub fn as_str(&self) -> &'static str {
        match self {
            Multiplicity::ZeroOrOne => "0..1",
            Multiplicity::One => "1",
            Multiplicity::Many => "*",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "interchange", derive(serde::Serialize, serde::Deserialize))]
pub struct AssociationDecl {
    pub name: Name,
    pub end1: AssociationEndDecl,
    pub end2: AssociationEndDecl,
    pub annotations: Vec<AnnotationDecl>,
    pub location: Location,
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "interchange", derive(serde::Serialize, serde::Deserialize))]
pub struct AssociationEndDecl {
    pub role: Name,
    /// Raw qualified name of the entity type at this end.
    pub type_ref: Name,
    pub multiplicity: Multiplicity,
    pub location: Location,
}

impl AssociationEndDecl {
    pub fn new(role: impl Into<Name>, type_ref: impl Into<Name>, multiplicity: Multiplicity) -> Self {
        Self {
            role: role.into(),
            type_ref: type_ref.into(),
            multiplicity,
            location: Location::default(),
        }
    }
}

impl AssociationDecl {
    pub fn new(name: impl Into<Name>, end1: AssociationEndDecl, end2: AssociationEndDecl) -> Self {
        Self {
            name: name.into(),
            end1,
            end2,
            annotations: Vec::new(),
            location: Location::default(),
        }
    }

    pub fn at(mut self, location: Location) -> Self {
        self.location = location;
        self
    }
}

// ============================================================================
// TERMS
// ============================================================================

/// A value term: a named, typed slot annotations can supply values for.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "interchange", derive(serde::Serialize, serde::Deserialize))]
pub struct TermDecl {
    pub name: Name,
    pub type_ref: Name,
    pub nullable: bool,
    pub default_value: Option<String>,
    /// Space separated element kinds, kept verbatim (`"Property Term"`).
    pub applies_to: Option<String>,
    pub annotations: Vec<AnnotationDecl>,
    pub location: Location,
}

impl TermDecl {
    pub fn new(name: impl Into<Name>, type_ref: impl Into<Name>) -> Self {
        Self {
            name: name.into(),
            type_ref: type_ref.into(),
            nullable: true,
            default_value: None,
            applies_to: None,
            annotations: Vec::new(),
            location: Location::default(),
        }
    }

    pub fn with_default_value(mut self, value: impl Into<String>) -> Self {
        self.default_value = Some(value.into());
        self
    }

    pub fn with_applies_to(mut self, applies_to: impl Into<String>) -> Self {
        self.applies_to = Some(applies_to.into());
        self
    }

    pub fn with_annotation(mut self, annotation: AnnotationDecl) -> Self {
        self.annotations.push(annotation);
        self
    }

    pub fn at(mut self, location: Location) -> Self {
        self.location = location;
        self
    }
}

// ============================================================================
// CONTAINERS
// ============================================================================

#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "interchange", derive(serde::Serialize, serde::Deserialize))]
pub struct ContainerDecl {
    pub name: Name,
    /// Raw qualified name of the container this one extends.
    pub extends: Option<Name>,
    pub entity_sets: Vec<EntitySetDecl>,
    pub association_sets: Vec<AssociationSetDecl>,
    pub annotations: Vec<AnnotationDecl>,
    pub location: Location,
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "interchange", derive(serde::Serialize, serde::Deserialize))]
pub struct EntitySetDecl {
    pub name: Name,
    pub entity_type: Name,
    pub annotations: Vec<AnnotationDecl>,
    pub location: Location,
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "interchange", derive(serde::Serialize, serde::Deserialize))]
pub struct AssociationSetDecl {
    pub name: Name,
    pub association: Name,
    pub end1: Option<AssociationSetEndDecl>,
    pub end2: Option<AssociationSetEndDecl>,
    pub location: Location,
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "interchange", derive(serde::Serialize, serde::Deserialize))]
pub struct AssociationSetEndDecl {
    pub role: Name,
    pub entity_set: Name,
    pub location: Location,
}

impl ContainerDecl {
    pub fn new(name: impl Into<Name>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_extends(mut self, container: impl Into<Name>) -> Self {
        self.extends = Some(container.into());
        self
    }

    pub fn with_entity_set(mut self, name: impl Into<Name>, entity_type: impl Into<Name>) -> Self {
        self.entity_sets.push(EntitySetDecl {
            name: name.into(),
            entity_type: entity_type.into(),
            annotations: Vec::new(),
            location: self.location.clone(),
        });
        self
    }

    pub fn with_association_set(
        mut self,
        name: impl Into<Name>,
        association: impl Into<Name>,
        ends: [(&str, &str); 2],
    ) -> Self {
        let end = |(role, set): (&str, &str)| AssociationSetEndDecl {
            role: role.into(),
            entity_set: set.into(),
            location: self.location.clone(),
        };
        let set = AssociationSetDecl {
            name: name.into(),
            association: association.into(),
            end1: Some(end(ends[0])),
            end2: Some(end(ends[1])),
            location: self.location.clone(),
        };
        self.association_sets.push(set);
        self
    }

    pub fn with_annotation(mut self, annotation: AnnotationDecl) -> Self {
        self.annotations.push(annotation);
        self
    }

    pub fn at(mut self, location: Location) -> Self {
        self.location = location;
        self
    }
}

// ============================================================================
// ANNOTATIONS
// ============================================================================

/// An annotation applied to an element.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "interchange", derive(serde::Serialize, serde::Deserialize))]
pub enum AnnotationDecl {
    /// `<ValueAnnotation Term="..." />`: a single expression for a value term.
    Value {
        term: Name,
        qualifier: Option<Name>,
        expr: Arc<ExprDecl>,
        location: Location,
    },
    /// `<TypeAnnotation Term="..." />`: property values for a type term.
    Type {
        term: Name,
        qualifier: Option<Name>,
        property_values: Vec<PropertyValueDecl>,
        location: Location,
    },
}

impl AnnotationDecl {
    pub fn value(term: impl Into<Name>, expr: ExprDecl) -> Self {
        AnnotationDecl::Value {
            term: term.into(),
            qualifier: None,
            expr: Arc::new(expr),
            location: Location::default(),
        }
    }

    pub fn type_annotation(term: impl Into<Name>, property_values: Vec<PropertyValueDecl>) -> Self {
        AnnotationDecl::Type {
            term: term.into(),
            qualifier: None,
            property_values,
            location: Location::default(),
        }
    }

    pub fn term(&self) -> &str {
        match self {
            AnnotationDecl::Value { term, .. } | AnnotationDecl::Type { term, .. } => term,
        }
    }

    pub fn qualifier(&self) -> Option<&str> {
        match self {
            AnnotationDecl::Value { qualifier, .. } | AnnotationDecl::Type { qualifier, .. } => {
                qualifier.as_deref()
            }
        }
    }

    pub fn location(&self) -> &Location {
        match self {
            AnnotationDecl::Value { location, .. } | AnnotationDecl::Type { location, .. } => {
                location
            }
        }
    }

    pub fn with_qualifier(mut self, value: impl Into<Name>) -> Self {
        match &mut self {
            AnnotationDecl::Value { qualifier, .. } | AnnotationDecl::Type { qualifier, .. } => {
                *qualifier = Some(value.into())
            }
        }
        self
    }

    pub fn at(mut self, at: Location) -> Self {
        match &mut self {
            AnnotationDecl::Value { location, .. } | AnnotationDecl::Type { location, .. } => {
                *location = at
            }
        }
        self
    }
}

/// An out-of-line annotation block targeting an element by path.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "interchange", derive(serde::Serialize, serde::Deserialize))]
pub struct AnnotationsDecl {
    /// `NS.Type`, `NS.Type/Property`, `NS.Term`, `NS.Container/EntitySet`.
    pub target: Name,
    pub qualifier: Option<Name>,
    pub annotations: Vec<AnnotationDecl>,
    pub location: Location,
}

impl AnnotationsDecl {
    pub fn new(target: impl Into<Name>) -> Self {
        Self {
            target: target.into(),
            qualifier: None,
            annotations: Vec::new(),
            location: Location::default(),
        }
    }

    pub fn with_annotation(mut self, annotation: AnnotationDecl) -> Self {
        self.annotations.push(annotation);
        self
    }

    pub fn at(mut self, location: Location) -> Self {
        self.location = location;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_builder_preserves_document_order() {
        let schema = SchemaDecl::new("NS")
            .with_complex_type(StructuredTypeDecl::new("B"))
            .with_entity_type(StructuredTypeDecl::new("A"))
            .with_term(TermDecl::new("T", "Edm.String"));

        let names: Vec<_> = schema.items.iter().map(|i| i.name()).collect();
        assert_eq!(names, vec!["B", "A", "T"]);
    }

    #[test]
    fn test_annotation_accessors() {
        let annotation = AnnotationDecl::value("Core.Description", ExprDecl::string("hi"))
            .with_qualifier("Short")
            .at(Location::at("doc", 3, 1));
        assert_eq!(annotation.term(), "Core.Description");
        assert_eq!(annotation.qualifier(), Some("Short"));
        assert_eq!(annotation.location().span.start.line, 3);
    }

    #[test]
    fn test_property_defaults() {
        let property = PropertyDecl::new("X", "Edm.Int32");
        assert!(property.nullable);
        assert!(property.default_value.is_none());
        assert!(!property.fixed_concurrency);
    }
}
