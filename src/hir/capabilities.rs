//! Capability traits shared by declared elements and placeholders.
//!
//! Every semantic element answers the same questions whether it was declared
//! or substituted. Placeholders give neutral answers: no annotations, no
//! properties, no base type, and their own diagnostics as errors.

use crate::base::{Name, qualify, split_qualified};

use super::diagnostics::EdmError;
use super::elements::{Annotation, ConcurrencyMode, Element, Property, TypeElement};
use super::types::TypeReference;

/// Elements with a name in a namespace.
pub trait Named {
    fn name(&self) -> Name;

    /// Namespace (or owning element) the name lives in.
    fn namespace(&self) -> Name;

    fn qualified_name(&self) -> Name {
        qualify(&self.namespace(), &self.name())
    }
}

/// Elements that can carry vocabulary annotations.
pub trait Annotatable<'m> {
    /// Inline annotations followed by out-of-line ones, in document order.
    fn annotations(&self) -> Vec<Annotation<'m>>;

    /// Annotations applying the given (fully qualified) term.
    fn annotations_for(&self, term: &str) -> Vec<Annotation<'m>> {
        self.annotations()
            .into_iter()
            .filter(|a| a.schema().resolver().normalize(a.term_name()) == term)
            .collect()
    }
}

/// Elements that can report their own diagnostics.
pub trait Checkable {
    fn errors(&self) -> Vec<EdmError>;

    fn is_valid(&self) -> bool {
        self.errors().is_empty()
    }
}

/// Complex and entity types.
pub trait StructuredTypeLike<'m> {
    fn base_type(&self) -> Option<TypeElement<'m>>;
    fn is_abstract(&self) -> bool;
    fn is_open(&self) -> bool;
    fn declared_properties(&self) -> Vec<Property<'m>>;
    /// Inherited properties first.
    fn properties(&self) -> Vec<Property<'m>>;
    fn find_property(&self, name: &str) -> Option<Property<'m>>;
}

/// Structural and navigation properties.
pub trait PropertyLike<'m> {
    fn declaring_type(&self) -> Option<TypeElement<'m>>;
    fn type_ref(&self) -> TypeReference;
    fn default_value(&self) -> Option<&'m str>;
    fn concurrency_mode(&self) -> ConcurrencyMode;
}

// ============================================================================
// PLACEHOLDER ANSWERS
// ============================================================================

impl<T: Named> Named for Element<T> {
    fn name(&self) -> Name {
        match self {
            Element::Declared(view) => view.name(),
            Element::Placeholder(p) => match split_qualified(&p.name) {
                Some((_, name)) => Name::new(name),
                None => p.name.clone(),
            },
        }
    }

    fn namespace(&self) -> Name {
        match self {
            Element::Declared(view) => view.namespace(),
            Element::Placeholder(p) => split_qualified(&p.name)
                .map(|(namespace, _)| Name::new(namespace))
                .unwrap_or_default(),
        }
    }

    fn qualified_name(&self) -> Name {
        match self {
            Element::Declared(view) => view.qualified_name(),
            Element::Placeholder(p) => p.name.clone(),
        }
    }
}

impl<'m, T: Annotatable<'m>> Annotatable<'m> for Element<T> {
    fn annotations(&self) -> Vec<Annotation<'m>> {
        match self {
            Element::Declared(view) => view.annotations(),
            Element::Placeholder(_) => Vec::new(),
        }
    }
}

impl<T: Checkable> Checkable for Element<T> {
    fn errors(&self) -> Vec<EdmError> {
        match self {
            Element::Declared(view) => view.errors(),
            Element::Placeholder(p) => p.errors.clone(),
        }
    }
}

impl<'m, T: StructuredTypeLike<'m>> StructuredTypeLike<'m> for Element<T> {
    fn base_type(&self) -> Option<TypeElement<'m>> {
        self.declared().and_then(|view| view.base_type())
    }

    fn is_abstract(&self) -> bool {
        self.declared().is_some_and(|view| view.is_abstract())
    }

    fn is_open(&self) -> bool {
        self.declared().is_some_and(|view| view.is_open())
    }

    fn declared_properties(&self) -> Vec<Property<'m>> {
        self.declared()
            .map(|view| view.declared_properties())
            .unwrap_or_default()
    }

    fn properties(&self) -> Vec<Property<'m>> {
        self.declared().map(|view| view.properties()).unwrap_or_default()
    }

    fn find_property(&self, name: &str) -> Option<Property<'m>> {
        self.declared().and_then(|view| view.find_property(name))
    }
}

impl<'m, T: PropertyLike<'m>> PropertyLike<'m> for Element<T> {
    fn declaring_type(&self) -> Option<TypeElement<'m>> {
        self.declared().and_then(|view| view.declaring_type())
    }

    /// A placeholder property has a type of the same placeholder.
    fn type_ref(&self) -> TypeReference {
        match self {
            Element::Declared(view) => view.type_ref(),
            Element::Placeholder(p) => TypeReference::placeholder(p.clone(), true),
        }
    }

    fn default_value(&self) -> Option<&'m str> {
        self.declared().and_then(|view| view.default_value())
    }

    fn concurrency_mode(&self) -> ConcurrencyMode {
        self.declared()
            .map(|view| view.concurrency_mode())
            .unwrap_or(ConcurrencyMode::None)
    }
}
