//! Resolved type references.
//!
//! A raw type-reference string from a declaration (`Edm.Int32`,
//! `Collection(NS.Point)`, `Ref(NS.Customer)`) becomes a [`TypeReference`].
//! Declared types are referred to by [`Handle`]; anything that failed to
//! resolve is a placeholder, so a `TypeReference` always exists.

use std::sync::Arc;

use super::diagnostics::EdmError;
use super::ids::{Handle, TypeId};
use super::placeholder::Placeholder;
use super::primitives::PrimitiveKind;

/// What a type reference points at.
#[derive(Clone, Debug, PartialEq)]
pub enum TypeDef {
    Primitive(PrimitiveKind),
    /// A complex, entity or enum type.
    Declared(Handle<TypeId>),
    Collection(Box<TypeReference>),
    /// `Ref(<entity type>)`: a reference to an entity, not the entity itself.
    EntityReference(Box<TypeReference>),
    Placeholder(Arc<Placeholder>),
}

/// A type plus its facets.
#[derive(Clone, Debug, PartialEq)]
pub struct TypeReference {
    pub definition: TypeDef,
    pub nullable: bool,
}

impl TypeReference {
    pub fn new(definition: TypeDef, nullable: bool) -> Self {
        Self {
            definition,
            nullable,
        }
    }

    pub fn primitive(kind: PrimitiveKind, nullable: bool) -> Self {
        Self::new(TypeDef::Primitive(kind), nullable)
    }

    pub fn placeholder(placeholder: Arc<Placeholder>, nullable: bool) -> Self {
        Self::new(TypeDef::Placeholder(placeholder), nullable)
    }

    pub fn is_collection(&self) -> bool {
        matches!(self.definition, TypeDef::Collection(_))
    }

    pub fn is_entity_reference(&self) -> bool {
        matches!(self.definition, TypeDef::EntityReference(_))
    }

    /// The primitive kind, when this is a (non-collection) primitive.
    pub fn as_primitive(&self) -> Option<PrimitiveKind> {
        match self.definition {
            TypeDef::Primitive(kind) => Some(kind),
            _ => None,
        }
    }

    /// The innermost reference, looking through collections and `Ref`.
    pub fn element_type(&self) -> &TypeReference {
        match &self.definition {
            TypeDef::Collection(inner) | TypeDef::EntityReference(inner) => inner.element_type(),
            _ => self,
        }
    }

    /// The placeholder this reference (or its element type) degraded to.
    pub fn placeholder_def(&self) -> Option<&Arc<Placeholder>> {
        match &self.element_type().definition {
            TypeDef::Placeholder(p) => Some(p),
            _ => None,
        }
    }

    /// Diagnostics carried by this reference.
    pub fn errors(&self) -> Vec<EdmError> {
        self.placeholder_def()
            .map(|p| p.errors.clone())
            .unwrap_or_default()
    }
}

// ============================================================================
// TYPE-REFERENCE SYNTAX
// ============================================================================

/// Shape of a raw type-reference string, before name lookup.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum TypeRefSyntax<'a> {
    Named(&'a str),
    Collection(Box<TypeRefSyntax<'a>>),
    Ref(Box<TypeRefSyntax<'a>>),
}

impl<'a> TypeRefSyntax<'a> {
    /// Split `Collection(...)` / `Ref(...)` wrappers. `None` when malformed.
    pub(crate) fn parse(raw: &'a str) -> Option<Self> {
        let raw = raw.trim();
        if let Some(inner) = wrapped(raw, "Collection") {
            return Some(TypeRefSyntax::Collection(Box::new(Self::parse(inner)?)));
        }
        if let Some(inner) = wrapped(raw, "Ref") {
            return Some(TypeRefSyntax::Ref(Box::new(Self::parse(inner)?)));
        }
        let valid = !raw.is_empty()
            && !raw.contains(['(', ')', ' '])
            && raw.split('.').all(|segment| !segment.is_empty());
        valid.then_some(TypeRefSyntax::Named(raw))
    }
}

fn wrapped<'a>(raw: &'a str, keyword: &str) -> Option<&'a str> {
    raw.strip_prefix(keyword)?
        .strip_prefix('(')?
        .strip_suffix(')')
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::base::Location;
    use crate::hir::placeholder::PlaceholderKind;

    #[test]
    fn test_parse_type_ref_syntax() {
        assert_eq!(
            TypeRefSyntax::parse("Collection(NS.Point)"),
            Some(TypeRefSyntax::Collection(Box::new(TypeRefSyntax::Named("NS.Point"))))
        );
        assert_eq!(
            TypeRefSyntax::parse("Collection(Ref(NS.Customer))"),
            Some(TypeRefSyntax::Collection(Box::new(TypeRefSyntax::Ref(Box::new(
                TypeRefSyntax::Named("NS.Customer")
            )))))
        );
        assert_eq!(TypeRefSyntax::parse("Collection(NS.Point"), None);
        assert_eq!(TypeRefSyntax::parse("NS..Point"), None);
        assert_eq!(TypeRefSyntax::parse(""), None);
    }

    #[test]
    fn test_element_type_looks_through_wrappers() {
        let placeholder =
            Placeholder::unresolved(PlaceholderKind::UnresolvedType, "NS.Gone", Location::default());
        let inner = TypeReference::placeholder(placeholder, true);
        let collection = TypeReference::new(TypeDef::Collection(Box::new(inner.clone())), false);

        assert!(collection.is_collection());
        assert_eq!(collection.element_type(), &inner);
        assert_eq!(collection.errors().len(), 1);
        assert!(TypeReference::primitive(PrimitiveKind::Int32, false).errors().is_empty());
    }
}
