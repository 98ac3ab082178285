//! Arena identifiers.
//!
//! The [`Model`](super::Model) owns every element in flat vectors; elements
//! refer to each other by index. An index is only meaningful together with
//! the model it came from, which is what [`Handle`] records for references
//! that may cross into a referenced model.

macro_rules! arena_id {
    ($($(#[$doc:meta])* $name:ident),* $(,)?) => {
        $(
            $(#[$doc])*
            #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
            pub struct $name(u32);

            impl $name {
                pub(crate) fn new(index: usize) -> Self {
                    Self(index as u32)
                }

                pub fn index(self) -> usize {
                    self.0 as usize
                }
            }
        )*
    };
}

arena_id! {
    /// A schema document.
    SchemaId,
    /// A complex, entity or enum type.
    TypeId,
    PropertyId,
    NavigationPropertyId,
    AssociationId,
    TermId,
    ContainerId,
    EntitySetId,
    AssociationSetId,
    /// An inline or out-of-line annotation.
    AnnotationId,
}

/// Which model an id belongs to, relative to the model holding the reference.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Origin {
    Local,
    /// Index into the holder's referenced models.
    Referenced(u16),
}

/// An id plus the model it lives in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Handle<I> {
    pub origin: Origin,
    pub id: I,
}

impl<I> Handle<I> {
    pub fn local(id: I) -> Self {
        Self {
            origin: Origin::Local,
            id,
        }
    }

    pub(crate) fn referenced(index: usize, id: I) -> Self {
        Self {
            origin: Origin::Referenced(index as u16),
            id,
        }
    }
}

/// Anything an annotation can be attached to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ElementKey {
    Type(TypeId),
    Property(PropertyId),
    NavigationProperty(NavigationPropertyId),
    Association(AssociationId),
    Term(TermId),
    Container(ContainerId),
    EntitySet(EntitySetId),
}
