//! Placeholder elements.
//!
//! When a reference cannot be resolved, resolution substitutes a
//! [`Placeholder`] in place of the missing element. A placeholder is tagged
//! with its [`PlaceholderKind`], carries the name that failed and a
//! non-empty list of diagnostics. The element enums in
//! [`elements`](super::elements) wrap it so callers see the same capability
//! surface as for a declared element, with neutral answers.

use std::sync::Arc;

use crate::base::{Location, Name};

use super::diagnostics::{EdmError, EdmErrorCode};

/// Variant family of placeholder elements.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PlaceholderKind {
    /// Declared but unusable (wrong kind, malformed).
    Bad,
    UnresolvedType,
    UnresolvedProperty,
    UnresolvedTerm,
    UnresolvedContainer,
    UnresolvedEntitySet,
    UnresolvedAssociation,
    UnresolvedRole,
    UnresolvedEnumMember,
    UnresolvedLabeledElement,
    /// Complex type that contains itself by value or inherits from itself.
    CyclicComplex,
    /// Entity type that inherits from itself.
    CyclicEntity,
}

impl PlaceholderKind {
    pub const ALL: [PlaceholderKind; 12] = [
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
        PlaceholderKind::CyclicEntity,
    ];

    pub fn is_cyclic(&self) -> bool {
        matches!(self, PlaceholderKind::CyclicComplex | PlaceholderKind::CyclicEntity)
    }

    pub fn is_unresolved(&self) -> bool {
        !matches!(
            self,
            PlaceholderKind::Bad | PlaceholderKind::CyclicComplex | PlaceholderKind::CyclicEntity
        )
    }

    /// Diagnostic code used when a placeholder of this kind is created by name.
    pub fn error_code(&self) -> EdmErrorCode {
        match self {
            PlaceholderKind::Bad => EdmErrorCode::BadTypeReference,
            PlaceholderKind::UnresolvedType => EdmErrorCode::BadUnresolvedType,
            PlaceholderKind::UnresolvedProperty => EdmErrorCode::BadUnresolvedProperty,
            PlaceholderKind::UnresolvedTerm => EdmErrorCode::BadUnresolvedTerm,
            PlaceholderKind::UnresolvedContainer => EdmErrorCode::BadUnresolvedEntityContainer,
            PlaceholderKind::UnresolvedEntitySet => EdmErrorCode::BadUnresolvedEntitySet,
            PlaceholderKind::UnresolvedAssociation => EdmErrorCode::BadUnresolvedAssociation,
            PlaceholderKind::UnresolvedRole => EdmErrorCode::BadUnresolvedNavigationRole,
            PlaceholderKind::UnresolvedEnumMember => EdmErrorCode::BadUnresolvedEnumMember,
            PlaceholderKind::UnresolvedLabeledElement => EdmErrorCode::BadUnresolvedLabeledElement,
            PlaceholderKind::CyclicComplex => EdmErrorCode::BadCyclicComplex,
            PlaceholderKind::CyclicEntity => EdmErrorCode::BadCyclicEntity,
        }
    }

    fn noun(&self) -> &'static str {
        match self {
            PlaceholderKind::Bad => "element",
            PlaceholderKind::UnresolvedType => "type",
            PlaceholderKind::UnresolvedProperty => "property",
            PlaceholderKind::UnresolvedTerm => "term",
            PlaceholderKind::UnresolvedContainer => "entity container",
            PlaceholderKind::UnresolvedEntitySet => "entity set",
            PlaceholderKind::UnresolvedAssociation => "association",
            PlaceholderKind::UnresolvedRole => "association role",
            PlaceholderKind::UnresolvedEnumMember => "enum member",
            PlaceholderKind::UnresolvedLabeledElement => "labeled element",
            PlaceholderKind::CyclicComplex => "complex type",
            PlaceholderKind::CyclicEntity => "entity type",
        }
    }
}

/// An element substituted for one that failed to resolve.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Placeholder {
    pub kind: PlaceholderKind,
    /// The (usually qualified) name that failed to resolve.
    pub name: Name,
    pub errors: Vec<EdmError>,
}

impl Placeholder {
    pub fn new(kind: PlaceholderKind, name: impl Into<Name>, errors: Vec<EdmError>) -> Arc<Self> {
        Arc::new(Self {
            kind,
            name: name.into(),
            errors,
        })
    }

    /// Placeholder with a single diagnostic using the kind's code.
    pub fn with_message(
        kind: PlaceholderKind,
        name: impl Into<Name>,
        location: Location,
        message: impl Into<String>,
    ) -> Arc<Self> {
        let error = EdmError::new(kind.error_code(), location, message);
        Self::new(kind, name, vec![error])
    }

    /// "not found" placeholder for a reference of the given kind.
    pub fn unresolved(kind: PlaceholderKind, name: impl Into<Name>, location: Location) -> Arc<Self> {
        let name = name.into();
        let message = format!("{} '{}' could not be found", kind.noun(), name);
        Self::with_message(kind, name, location, message)
    }

    /// Structural or inheritance cycle through `name`.
    pub fn cyclic(kind: PlaceholderKind, name: impl Into<Name>, location: Location) -> Arc<Self> {
        let name = name.into();
        let message = format!("{} '{}' is part of a cycle", kind.noun(), name);
        Self::with_message(kind, name, location, message)
    }

    pub fn bad(name: impl Into<Name>, error: EdmError) -> Arc<Self> {
        Self::new(PlaceholderKind::Bad, name, vec![error])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unresolved_message_names_target() {
        let placeholder =
            Placeholder::unresolved(PlaceholderKind::UnresolvedType, "NS.Missing", Location::default());
        assert_eq!(placeholder.errors.len(), 1);
        assert_eq!(placeholder.errors[0].code, EdmErrorCode::BadUnresolvedType);
        assert_eq!(placeholder.errors[0].message, "type 'NS.Missing' could not be found");
    }

    #[test]
    fn test_kind_classification() {
        assert!(PlaceholderKind::CyclicEntity.is_cyclic());
        assert!(!PlaceholderKind::Bad.is_unresolved());
        assert!(PlaceholderKind::UnresolvedTerm.is_unresolved());
        assert_eq!(PlaceholderKind::ALL.len(), 12);
    }
}
