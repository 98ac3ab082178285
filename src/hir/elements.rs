//! Semantic elements: borrowed views over the model arenas.
//!
//! A view is a `(&Model, id)` pair. It is `Copy`, compares by identity
//! (same model, same id) and exposes resolved accessors, each backed by a
//! [`ResolutionCell`](super::cell::ResolutionCell) in the arena entry.
//!
//! References that may fail come back as [`Element`]: either the declared
//! view or the [`Placeholder`] that stands in for it. Both sides implement the
//! capability traits in [`capabilities`](super::capabilities), so callers
//! never have to branch on failure.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use rustc_hash::FxHashSet;

use crate::base::{Location, Name, is_valid_identifier};
use crate::syntax::{AnnotationDecl, ContainerDecl, Multiplicity, StructuredTypeDecl};

use super::capabilities::{Annotatable, Checkable, Named, PropertyLike, StructuredTypeLike};
use super::diagnostics::{EdmError, EdmErrorCode};
use super::expr::{Expr, ExprKind};
use super::ids::{
    AnnotationId, AssociationId, AssociationSetId, ContainerId, ElementKey, EntitySetId, Handle,
    NavigationPropertyId, Origin, PropertyId, SchemaId, TermId, TypeId,
};
use super::model::{
    AnnotationData, AssociationData, AssociationSetData, ContainerData, EntitySetData, Model,
    NavigationPropertyData, PropertyData, SchemaData, Target, TermData, TermTarget, TypeData,
    TypeDecl, TypeKind,
};
use super::placeholder::{Placeholder, PlaceholderKind};
use super::primitives::PrimitiveKind;
use super::resolve::{Resolver, contains_by_value};
use super::types::{TypeDef, TypeReference};

// ============================================================================
// ELEMENT
// ============================================================================

/// A declared element, or the placeholder substituted for it.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Element<T> {
    Declared(T),
    Placeholder(Arc<Placeholder>),
}

impl<T> Element<T> {
    pub fn declared(&self) -> Option<&T> {
        match self {
            Element::Declared(view) => Some(view),
            Element::Placeholder(_) => None,
        }
    }

    pub fn into_declared(self) -> Option<T> {
        match self {
            Element::Declared(view) => Some(view),
            Element::Placeholder(_) => None,
        }
    }

    pub fn placeholder(&self) -> Option<&Arc<Placeholder>> {
        match self {
            Element::Placeholder(p) => Some(p),
            Element::Declared(_) => None,
        }
    }

    pub fn is_placeholder(&self) -> bool {
        self.placeholder().is_some()
    }
}

pub type TypeElement<'m> = Element<SchemaType<'m>>;
pub type PropertyElement<'m> = Element<Property<'m>>;
pub type TermElement<'m> = Element<Term<'m>>;
pub type ContainerElement<'m> = Element<EntityContainer<'m>>;
pub type EntitySetElement<'m> = Element<EntitySet<'m>>;
pub type AssociationElement<'m> = Element<Association<'m>>;
pub type AssociationEndElement<'m> = Element<AssociationEnd<'m>>;
pub type EnumMemberElement<'m> = Element<EnumMember<'m>>;

/// Turn a cached target (relative to `model`) into an element.
pub(crate) fn element<'m, I: Copy, T>(
    model: &'m Model,
    target: Target<Handle<I>>,
    view: impl FnOnce(&'m Model, I) -> T,
) -> Element<T> {
    match target {
        Target::Declared(handle) => Element::Declared(view(model.locate(handle.origin), handle.id)),
        Target::Placeholder(p) => Element::Placeholder(p),
    }
}

// ============================================================================
// VIEWS
// ============================================================================

macro_rules! view {
    ($(#[$doc:meta])* $name:ident, $id:ty, $data:ty, $arena:ident) => {
        $(#[$doc])*
        #[derive(Clone, Copy)]
        pub struct $name<'m> {
            model: &'m Model,
            id: $id,
        }

        impl<'m> $name<'m> {
            pub(crate) fn new(model: &'m Model, id: $id) -> Self {
                Self { model, id }
            }

            pub fn id(&self) -> $id {
                self.id
            }

            /// The model this element belongs to.
            pub fn model(&self) -> &'m Model {
                self.model
            }

            #[allow(dead_code)]
            pub(crate) fn data(&self) -> &'m $data {
                &self.model.$arena[self.id.index()]
            }
        }

        impl PartialEq for $name<'_> {
            fn eq(&self, other: &Self) -> bool {
                std::ptr::eq(self.model, other.model) && self.id == other.id
            }
        }

        impl Eq for $name<'_> {}

        impl Hash for $name<'_> {
            fn hash<H: Hasher>(&self, state: &mut H) {
                std::ptr::hash(self.model, state);
                self.id.hash(state);
            }
        }

        impl fmt::Debug for $name<'_> {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.debug_tuple(stringify!($name)).field(&self.id.index()).finish()
            }
        }
    };
}

view!(
    /// A schema document.
    Schema, SchemaId, SchemaData, schemas
);
view!(
    /// A complex, entity or enum type.
    SchemaType, TypeId, TypeData, types
);
view!(Property, PropertyId, PropertyData, properties);
view!(NavigationProperty, NavigationPropertyId, NavigationPropertyData, navigation_properties);
view!(Association, AssociationId, AssociationData, associations);
view!(
    /// A value term.
    Term, TermId, TermData, terms
);
view!(EntityContainer, ContainerId, ContainerData, containers);
view!(EntitySet, EntitySetId, EntitySetData, entity_sets);
view!(AssociationSet, AssociationSetId, AssociationSetData, association_sets);
view!(
    /// An inline or out-of-line annotation.
    Annotation, AnnotationId, AnnotationData, annotations
);

/// Concurrency mode of a property.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ConcurrencyMode {
    None,
    Fixed,
}

fn name_errors(model: &Model, name: &str, location: &Location) -> Vec<EdmError> {
    if !model.options.validate_names || is_valid_identifier(name) {
        return Vec::new();
    }
    vec![EdmError::new(
        EdmErrorCode::InvalidName,
        location.clone(),
        format!("'{name}' is not a valid identifier"),
    )]
}

/// Check a default-value literal against the resolved type.
fn default_value_errors(
    model: &Model,
    type_ref: &TypeReference,
    default: Option<&str>,
    location: &Location,
) -> Vec<EdmError> {
    let Some(text) = default else {
        return Vec::new();
    };
    if !model.options.validate_default_values {
        return Vec::new();
    }
    let invalid = |message: String| {
        vec![EdmError::new(
            EdmErrorCode::InvalidDefaultValue,
            location.clone(),
            message,
        )]
    };
    match &type_ref.definition {
        TypeDef::Primitive(kind) => match kind.parse_literal(text) {
            Ok(_) => Vec::new(),
            Err(message) => invalid(message),
        },
        TypeDef::Declared(handle) => {
            let ty = SchemaType::new(model.locate(handle.origin), handle.id);
            if ty.kind() != TypeKind::Enum {
                return invalid(format!(
                    "default values are not supported for {} '{}'",
                    ty.kind().display(),
                    ty.qualified_name()
                ));
            }
            let known = text
                .split([',', ' '])
                .filter(|s| !s.is_empty())
                .all(|member| ty.find_member(member).is_some() || member.parse::<i64>().is_ok());
            if known {
                Vec::new()
            } else {
                invalid(format!(
                    "'{}' is not a member of enum type '{}'",
                    text,
                    ty.qualified_name()
                ))
            }
        }
        TypeDef::Placeholder(_) => Vec::new(),
        TypeDef::Collection(_) | TypeDef::EntityReference(_) => {
            invalid("default values are not supported for collection or reference types".into())
        }
    }
}

// ============================================================================
// SCHEMA
// ============================================================================

impl<'m> Schema<'m> {
    pub fn namespace(&self) -> &'m Name {
        &self.data().namespace
    }

    pub fn alias(&self) -> Option<&'m Name> {
        self.data().alias.as_ref()
    }

    pub fn location(&self) -> &'m Location {
        &self.data().location
    }

    pub fn resolver(&self) -> Resolver<'m> {
        Resolver::new(self.model, self.id)
    }

    /// Types declared in this schema, in document order.
    pub fn types(&self) -> Vec<SchemaType<'m>> {
        self.data()
            .items
            .iter()
            .filter_map(|key| match key {
                ElementKey::Type(id) => Some(SchemaType::new(self.model, *id)),
                _ => None,
            })
            .collect()
    }

    pub fn terms(&self) -> Vec<Term<'m>> {
        self.data()
            .items
            .iter()
            .filter_map(|key| match key {
                ElementKey::Term(id) => Some(Term::new(self.model, *id)),
                _ => None,
            })
            .collect()
    }

    pub fn associations(&self) -> Vec<Association<'m>> {
        self.data()
            .items
            .iter()
            .filter_map(|key| match key {
                ElementKey::Association(id) => Some(Association::new(self.model, *id)),
                _ => None,
            })
            .collect()
    }

    pub fn containers(&self) -> Vec<EntityContainer<'m>> {
        self.data()
            .items
            .iter()
            .filter_map(|key| match key {
                ElementKey::Container(id) => Some(EntityContainer::new(self.model, *id)),
                _ => None,
            })
            .collect()
    }

    /// Out-of-line annotations declared in this schema.
    pub fn out_of_line_annotations(&self) -> Vec<Annotation<'m>> {
        self.data()
            .blocks
            .iter()
            .flat_map(|block| block.annotations.iter())
            .map(|id| Annotation::new(self.model, *id))
            .collect()
    }
}

impl Checkable for Schema<'_> {
    /// Unresolved out-of-line annotation targets.
    fn errors(&self) -> Vec<EdmError> {
        self.data()
            .blocks
            .iter()
            .flat_map(|block| block.errors.iter().cloned())
            .collect()
    }
}

// ============================================================================
// SCHEMA TYPE
// ============================================================================

impl<'m> SchemaType<'m> {
    pub fn kind(&self) -> TypeKind {
        self.data().kind
    }

    pub fn is_entity(&self) -> bool {
        self.kind() == TypeKind::Entity
    }

    pub fn is_complex(&self) -> bool {
        self.kind() == TypeKind::Complex
    }

    pub fn schema(&self) -> Schema<'m> {
        Schema::new(self.model, self.data().schema)
    }

    pub fn resolver(&self) -> Resolver<'m> {
        Resolver::new(self.model, self.data().schema)
    }

    fn structured_decl(&self) -> Option<&'m StructuredTypeDecl> {
        match &self.data().decl {
            TypeDecl::Structured(decl) => Some(decl),
            TypeDecl::Enum(_) => None,
        }
    }

    pub fn location(&self) -> &'m Location {
        match &self.data().decl {
            TypeDecl::Structured(decl) => &decl.location,
            TypeDecl::Enum(decl) => &decl.location,
        }
    }

    fn declared_name(&self) -> &'m Name {
        match &self.data().decl {
            TypeDecl::Structured(decl) => &decl.name,
            TypeDecl::Enum(decl) => &decl.name,
        }
    }

    fn cyclic_placeholder(&self, name: Name) -> Arc<Placeholder> {
        let kind = match self.kind() {
            TypeKind::Entity => PlaceholderKind::CyclicEntity,
            _ => PlaceholderKind::CyclicComplex,
        };
        Placeholder::cyclic(kind, name, self.location().clone())
    }

    fn base_target(&self) -> Option<Target<Handle<TypeId>>> {
        self.data().base.get_or_compute(
            || self.compute_base(),
            || {
                tracing::trace!("[RESOLVE] base type cycle through '{}'", self.qualified_name());
                Some(Target::Placeholder(self.cyclic_placeholder(self.qualified_name())))
            },
        )
    }

    /// Resolve the declared base and take one inductive step: a base whose
    /// own base is cyclic makes this base cyclic too.
    fn compute_base(&self) -> Option<Target<Handle<TypeId>>> {
        let decl = self.structured_decl()?;
        let raw = decl.base_type.as_ref()?;
        let resolver = self.resolver();
        let name = resolver.normalize(raw);
        let Some(handle) = resolver.type_handle(raw) else {
            return Some(Target::Placeholder(Placeholder::unresolved(
                PlaceholderKind::UnresolvedType,
                name,
                decl.location.clone(),
            )));
        };

        let base = SchemaType::new(self.model.locate(handle.origin), handle.id);
        if base.kind() != self.kind() {
            let error = EdmError::new(
                EdmErrorCode::BadBaseType,
                decl.location.clone(),
                format!(
                    "{} '{}' cannot derive from {} '{}'",
                    self.kind().display(),
                    self.qualified_name(),
                    base.kind().display(),
                    name
                ),
            );
            return Some(Target::Placeholder(Placeholder::bad(name, error)));
        }

        match base.base_target() {
            Some(Target::Placeholder(p)) if p.kind.is_cyclic() => {
                Some(Target::Placeholder(self.cyclic_placeholder(name)))
            }
            _ => Some(Target::Declared(handle)),
        }
    }

    /// This type followed by its declared ancestors.
    pub fn ancestry(&self) -> Vec<SchemaType<'m>> {
        let mut chain = vec![*self];
        let mut seen = FxHashSet::default();
        seen.insert(*self);
        let mut current = *self;
        while let Some(Element::Declared(base)) = current.base_type() {
            if !seen.insert(base) {
                break;
            }
            chain.push(base);
            current = base;
        }
        chain
    }

    pub fn is_or_derives_from(&self, other: &SchemaType<'_>) -> bool {
        self.ancestry().iter().any(|t| {
            std::ptr::eq(t.model, other.model) && t.id == other.id
        })
    }

    /// Key properties (entity types). Inherited from the nearest keyed base
    /// when the type declares none.
    pub fn key(&self) -> Vec<PropertyElement<'m>> {
        let targets = self
            .data()
            .key
            .get_or_compute(|| self.compute_key(), || Arc::from(Vec::new()));
        targets
            .iter()
            .cloned()
            .map(|t| element(self.model, t, Property::new))
            .collect()
    }

    fn compute_key(&self) -> Arc<[Target<Handle<PropertyId>>]> {
        let Some(decl) = self.structured_decl() else {
            return Arc::from(Vec::new());
        };
        if decl.key.is_empty() {
            return Arc::from(Vec::new());
        }
        decl.key
            .iter()
            .map(|name| match self.find_property(name) {
                Some(property) => self
                    .model
                    .handle_for(property.model, property.id)
                    .map(Target::Declared)
                    .unwrap_or_else(|| Target::Placeholder(self.missing_property(name))),
                None => Target::Placeholder(self.missing_property(name)),
            })
            .collect()
    }

    fn missing_property(&self, name: &str) -> Arc<Placeholder> {
        Placeholder::with_message(
            PlaceholderKind::UnresolvedProperty,
            name,
            self.location().clone(),
            format!(
                "property '{}' could not be found on type '{}'",
                name,
                self.qualified_name()
            ),
        )
    }

    /// The effective key: declared here or inherited.
    pub fn effective_key(&self) -> Vec<PropertyElement<'m>> {
        self.ancestry()
            .into_iter()
            .map(|t| t.key())
            .find(|key| !key.is_empty())
            .unwrap_or_default()
    }

    pub fn declared_navigation_properties(&self) -> Vec<NavigationProperty<'m>> {
        self.data()
            .navigation_properties
            .iter()
            .map(|id| NavigationProperty::new(self.model, *id))
            .collect()
    }

    /// Navigation properties including inherited ones, base first.
    pub fn navigation_properties(&self) -> Vec<NavigationProperty<'m>> {
        self.ancestry()
            .into_iter()
            .rev()
            .flat_map(|t| t.declared_navigation_properties())
            .collect()
    }

    pub fn find_navigation_property(&self, name: &str) -> Option<NavigationProperty<'m>> {
        self.ancestry().into_iter().find_map(|t| {
            t.declared_navigation_properties()
                .into_iter()
                .find(|n| n.name() == name)
        })
    }

    // ------------------------------------------------------------------------
    // Enum types
    // ------------------------------------------------------------------------

    pub fn is_flags(&self) -> bool {
        matches!(&self.data().decl, TypeDecl::Enum(decl) if decl.is_flags)
    }

    /// Underlying integral type of an enum; `Edm.Int32` when not declared.
    pub fn underlying_type(&self) -> Option<TypeReference> {
        let TypeDecl::Enum(decl) = &self.data().decl else {
            return None;
        };
        let Some(raw) = &decl.underlying_type else {
            return Some(TypeReference::primitive(PrimitiveKind::Int32, false));
        };
        match PrimitiveKind::from_qualified_name(raw) {
            Some(kind) if kind.is_integral() => Some(TypeReference::primitive(kind, false)),
            _ => Some(TypeReference::placeholder(
                Placeholder::bad(
                    raw.clone(),
                    EdmError::new(
                        EdmErrorCode::BadTypeReference,
                        decl.location.clone(),
                        format!("'{raw}' is not an integral type and cannot underlie an enum"),
                    ),
                ),
                false,
            )),
        }
    }

    pub fn members(&self) -> Vec<EnumMember<'m>> {
        match &self.data().decl {
            TypeDecl::Enum(decl) => (0..decl.members.len())
                .map(|index| EnumMember { ty: *self, index })
                .collect(),
            TypeDecl::Structured(_) => Vec::new(),
        }
    }

    pub fn find_member(&self, name: &str) -> Option<EnumMember<'m>> {
        self.members().into_iter().find(|m| m.name() == name)
    }

    /// Member values in declaration order; implicit values count up from the
    /// previous member.
    fn member_values(&self) -> Vec<Result<i64, EdmError>> {
        let TypeDecl::Enum(decl) = &self.data().decl else {
            return Vec::new();
        };
        let range = self
            .underlying_type()
            .and_then(|t| t.as_primitive())
            .and_then(|k| k.integral_range())
            .unwrap_or((i64::MIN, i64::MAX));

        let mut next = 0i64;
        decl.members
            .iter()
            .map(|member| {
                let value = match &member.value {
                    Some(text) => text.parse::<i64>().map_err(|_| {
                        EdmError::new(
                            EdmErrorCode::InvalidConstant,
                            member.location.clone(),
                            format!("'{}' is not a valid value for enum member '{}'", text, member.name),
                        )
                    })?,
                    None => next,
                };
                if value < range.0 || value > range.1 {
                    return Err(EdmError::new(
                        EdmErrorCode::InvalidConstant,
                        member.location.clone(),
                        format!("value {} of enum member '{}' is out of range", value, member.name),
                    ));
                }
                next = value.saturating_add(1);
                Ok(value)
            })
            .collect()
    }
}

impl Named for SchemaType<'_> {
    fn name(&self) -> Name {
        self.declared_name().clone()
    }

    fn namespace(&self) -> Name {
        self.schema().namespace().clone()
    }

    fn qualified_name(&self) -> Name {
        self.data().qualified_name.clone()
    }
}

impl<'m> StructuredTypeLike<'m> for SchemaType<'m> {
    fn base_type(&self) -> Option<TypeElement<'m>> {
        self.base_target()
            .map(|target| element(self.model, target, SchemaType::new))
    }

    fn is_abstract(&self) -> bool {
        self.structured_decl().is_some_and(|d| d.is_abstract)
    }

    fn is_open(&self) -> bool {
        self.structured_decl().is_some_and(|d| d.is_open)
    }

    fn declared_properties(&self) -> Vec<Property<'m>> {
        self.data()
            .properties
            .iter()
            .map(|id| Property::new(self.model, *id))
            .collect()
    }

    fn properties(&self) -> Vec<Property<'m>> {
        self.ancestry()
            .into_iter()
            .rev()
            .flat_map(|t| t.declared_properties())
            .collect()
    }

    fn find_property(&self, name: &str) -> Option<Property<'m>> {
        self.ancestry()
            .into_iter()
            .find_map(|t| t.declared_properties().into_iter().find(|p| p.name() == name))
    }
}

impl<'m> Annotatable<'m> for SchemaType<'m> {
    fn annotations(&self) -> Vec<Annotation<'m>> {
        annotations_of(self.model, &self.data().annotations, ElementKey::Type(self.id))
    }
}

impl Checkable for SchemaType<'_> {
    fn errors(&self) -> Vec<EdmError> {
        let data = self.data();
        let mut errors = name_errors(self.model, self.declared_name(), self.location());
        errors.extend(data.member_errors.iter().cloned());
        if let Some(Element::Placeholder(p)) = self.base_type() {
            errors.extend(p.errors.iter().cloned());
        }
        for key in self.key() {
            if let Element::Placeholder(p) = key {
                errors.extend(p.errors.iter().cloned());
            }
        }
        if let Some(underlying) = self.underlying_type() {
            errors.extend(underlying.errors());
        }
        if let TypeDecl::Enum(decl) = &data.decl {
            for member in &decl.members {
                errors.extend(name_errors(self.model, &member.name, &member.location));
            }
        }
        errors.extend(self.member_values().into_iter().filter_map(Result::err));
        errors
    }
}

/// Inline annotations, then out-of-line ones attached to `key`.
fn annotations_of<'m>(model: &'m Model, inline: &[AnnotationId], key: ElementKey) -> Vec<Annotation<'m>> {
    inline
        .iter()
        .chain(model.attached_annotations(key))
        .map(|id| Annotation::new(model, *id))
        .collect()
}

// ============================================================================
// ENUM MEMBER
// ============================================================================

/// One member of an enum type.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct EnumMember<'m> {
    ty: SchemaType<'m>,
    index: usize,
}

impl<'m> EnumMember<'m> {
    pub(crate) fn at(ty: SchemaType<'m>, index: usize) -> Self {
        Self { ty, index }
    }

    pub fn enum_type(&self) -> SchemaType<'m> {
        self.ty
    }

    fn decl(&self) -> &'m crate::syntax::EnumMemberDecl {
        match &self.ty.data().decl {
            TypeDecl::Enum(decl) => &decl.members[self.index],
            TypeDecl::Structured(_) => unreachable!("enum members only exist on enum types"),
        }
    }

    pub fn name(&self) -> &'m Name {
        &self.decl().name
    }

    pub fn location(&self) -> &'m Location {
        &self.decl().location
    }

    /// Qualified `Type/Member` form.
    pub fn path(&self) -> String {
        format!("{}/{}", self.ty.qualified_name(), self.name())
    }

    /// Numeric value; `None` when the declared literal is invalid.
    pub fn value(&self) -> Option<i64> {
        self.ty
            .member_values()
            .into_iter()
            .nth(self.index)
            .and_then(Result::ok)
    }
}

// ============================================================================
// PROPERTY
// ============================================================================

impl<'m> Property<'m> {
    pub fn name(&self) -> &'m Name {
        &self.data().decl.name
    }

    pub fn location(&self) -> &'m Location {
        &self.data().decl.location
    }

    pub fn declaring(&self) -> SchemaType<'m> {
        SchemaType::new(self.model, self.data().declaring)
    }

    pub fn nullable(&self) -> bool {
        self.data().decl.nullable
    }

    /// The declared, complex, entity or enum type behind [`PropertyLike::type_ref`],
    /// looking through collections. `None` for primitives.
    pub fn type_element(&self) -> Option<TypeElement<'m>> {
        type_element_of(self.model, &self.type_ref())
    }

    fn compute_type(&self) -> TypeReference {
        let data = self.data();
        let decl = &data.decl;
        let reference =
            self.declaring()
                .resolver()
                .resolve_type_reference(&decl.type_ref, decl.nullable, &decl.location);

        let TypeDef::Declared(handle) = &reference.definition else {
            return reference;
        };
        if handle.origin != Origin::Local {
            return reference;
        }
        let kind = match self.model.type_data(handle.id).kind {
            TypeKind::Complex => PlaceholderKind::CyclicComplex,
            TypeKind::Entity => PlaceholderKind::CyclicEntity,
            TypeKind::Enum => return reference,
        };
        if !contains_by_value(self.model, handle.id, data.declaring) {
            return reference;
        }

        let target = self.model.type_data(handle.id);
        let declaring = &self.model.type_data(data.declaring).qualified_name;
        let placeholder = Placeholder::with_message(
            kind,
            target.qualified_name.clone(),
            decl.location.clone(),
            format!(
                "{} '{}' is cyclic: holding it by value in '{declaring}' makes '{declaring}' contain itself",
                target.kind.display(),
                target.qualified_name
            ),
        );
        TypeReference::placeholder(placeholder, reference.nullable)
    }
}

/// Element behind a type reference, relative to `model`.
pub fn type_element_of<'m>(model: &'m Model, reference: &TypeReference) -> Option<TypeElement<'m>> {
    match &reference.element_type().definition {
        TypeDef::Declared(handle) => Some(Element::Declared(SchemaType::new(
            model.locate(handle.origin),
            handle.id,
        ))),
        TypeDef::Placeholder(p) => Some(Element::Placeholder(p.clone())),
        _ => None,
    }
}

impl Named for Property<'_> {
    fn name(&self) -> Name {
        self.data().decl.name.clone()
    }

    fn namespace(&self) -> Name {
        self.declaring().qualified_name()
    }
}

impl<'m> PropertyLike<'m> for Property<'m> {
    fn declaring_type(&self) -> Option<TypeElement<'m>> {
        Some(Element::Declared(self.declaring()))
    }

    fn type_ref(&self) -> TypeReference {
        self.data().type_ref.get_or_compute(
            || self.compute_type(),
            || {
                TypeReference::placeholder(
                    Placeholder::cyclic(
                        PlaceholderKind::CyclicComplex,
                        self.data().decl.type_ref.clone(),
                        self.location().clone(),
                    ),
                    self.nullable(),
                )
            },
        )
    }

    fn default_value(&self) -> Option<&'m str> {
        self.data().decl.default_value.as_deref()
    }

    fn concurrency_mode(&self) -> ConcurrencyMode {
        if self.data().decl.fixed_concurrency {
            ConcurrencyMode::Fixed
        } else {
            ConcurrencyMode::None
        }
    }
}

impl<'m> Annotatable<'m> for Property<'m> {
    fn annotations(&self) -> Vec<Annotation<'m>> {
        annotations_of(self.model, &self.data().annotations, ElementKey::Property(self.id))
    }
}

impl Checkable for Property<'_> {
    fn errors(&self) -> Vec<EdmError> {
        let type_ref = self.type_ref();
        let mut errors = name_errors(self.model, self.name(), self.location());
        errors.extend(type_ref.errors());
        errors.extend(default_value_errors(
            self.model,
            &type_ref,
            self.default_value(),
            self.location(),
        ));
        errors
    }
}

// ============================================================================
// NAVIGATION PROPERTY
// ============================================================================

impl<'m> NavigationProperty<'m> {
    pub fn name(&self) -> &'m Name {
        &self.data().decl.name
    }

    pub fn location(&self) -> &'m Location {
        &self.data().decl.location
    }

    pub fn declaring(&self) -> SchemaType<'m> {
        SchemaType::new(self.model, self.data().declaring)
    }

    fn association_target(&self) -> Target<Handle<AssociationId>> {
        self.data().association.get_or_compute(
            || {
                let decl = &self.data().decl;
                self.declaring()
                    .resolver()
                    .resolve_association(&decl.relationship, &decl.location)
            },
            || Target::Placeholder(self.missing_role(&self.data().decl.relationship)),
        )
    }

    pub fn association(&self) -> AssociationElement<'m> {
        element(self.model, self.association_target(), Association::new)
    }

    fn missing_role(&self, role: &str) -> Arc<Placeholder> {
        Placeholder::with_message(
            PlaceholderKind::UnresolvedRole,
            role,
            self.location().clone(),
            format!(
                "role '{}' of navigation property '{}' does not match an end of '{}'",
                role,
                self.name(),
                self.data().decl.relationship
            ),
        )
    }

    fn end_indices(&self) -> (Target<u8>, Target<u8>) {
        self.data().ends.get_or_compute(
            || {
                let decl = &self.data().decl;
                let association = self.association();
                let find = |role: &Name| match association.declared().and_then(|a| a.find_end(role)) {
                    Some(end) => Target::Declared(end.index),
                    None => Target::Placeholder(self.missing_role(role)),
                };
                (find(&decl.from_role), find(&decl.to_role))
            },
            || {
                let decl = &self.data().decl;
                (
                    Target::Placeholder(self.missing_role(&decl.from_role)),
                    Target::Placeholder(self.missing_role(&decl.to_role)),
                )
            },
        )
    }

    fn end(&self, index: Target<u8>) -> AssociationEndElement<'m> {
        match (index, self.association()) {
            (Target::Declared(index), Element::Declared(association)) => {
                Element::Declared(AssociationEnd { association, index })
            }
            (Target::Placeholder(p), _) | (_, Element::Placeholder(p)) => Element::Placeholder(p),
        }
    }

    pub fn from_end(&self) -> AssociationEndElement<'m> {
        self.end(self.end_indices().0)
    }

    pub fn to_end(&self) -> AssociationEndElement<'m> {
        self.end(self.end_indices().1)
    }

    /// Entity type at the far end of the navigation.
    pub fn target_type(&self) -> TypeElement<'m> {
        match self.to_end() {
            Element::Declared(end) => end.entity_type(),
            Element::Placeholder(p) => Element::Placeholder(p),
        }
    }
}

impl Named for NavigationProperty<'_> {
    fn name(&self) -> Name {
        self.data().decl.name.clone()
    }

    fn namespace(&self) -> Name {
        self.declaring().qualified_name()
    }
}

impl<'m> PropertyLike<'m> for NavigationProperty<'m> {
    fn declaring_type(&self) -> Option<TypeElement<'m>> {
        Some(Element::Declared(self.declaring()))
    }

    /// `Collection(Target)` for a `*` end, otherwise the target type.
    fn type_ref(&self) -> TypeReference {
        let end = match self.to_end() {
            Element::Declared(end) => end,
            Element::Placeholder(p) => return TypeReference::placeholder(p, true),
        };
        let entity = match end.entity_type() {
            Element::Declared(ty) => match self.model.handle_for(ty.model, ty.id) {
                Some(handle) => TypeReference::new(TypeDef::Declared(handle), false),
                None => return TypeReference::placeholder(self.missing_role(end.role()), true),
            },
            Element::Placeholder(p) => TypeReference::placeholder(p, false),
        };
        match end.multiplicity() {
            Multiplicity::Many => TypeReference::new(TypeDef::Collection(Box::new(entity)), false),
            Multiplicity::ZeroOrOne => TypeReference::new(entity.definition, true),
            Multiplicity::One => entity,
        }
    }

    fn default_value(&self) -> Option<&'m str> {
        None
    }

    fn concurrency_mode(&self) -> ConcurrencyMode {
        ConcurrencyMode::None
    }
}

impl<'m> Annotatable<'m> for NavigationProperty<'m> {
    fn annotations(&self) -> Vec<Annotation<'m>> {
        annotations_of(
            self.model,
            &self.data().annotations,
            ElementKey::NavigationProperty(self.id),
        )
    }
}

impl Checkable for NavigationProperty<'_> {
    fn errors(&self) -> Vec<EdmError> {
        let mut errors = name_errors(self.model, self.name(), self.location());
        let association = self.association_target();
        errors.extend(association.errors());
        if association.placeholder().is_none() {
            let (from, to) = self.end_indices();
            errors.extend(from.errors());
            errors.extend(to.errors());
        }
        errors
    }
}

// ============================================================================
// ASSOCIATION
// ============================================================================

impl<'m> Association<'m> {
    pub fn location(&self) -> &'m Location {
        &self.data().decl.location
    }

    pub fn schema(&self) -> Schema<'m> {
        Schema::new(self.model, self.data().schema)
    }

    pub fn ends(&self) -> [AssociationEnd<'m>; 2] {
        [
            AssociationEnd {
                association: *self,
                index: 0,
            },
            AssociationEnd {
                association: *self,
                index: 1,
            },
        ]
    }

    pub fn find_end(&self, role: &str) -> Option<AssociationEnd<'m>> {
        self.ends().into_iter().find(|end| end.role() == role)
    }
}

impl Named for Association<'_> {
    fn name(&self) -> Name {
        self.data().decl.name.clone()
    }

    fn namespace(&self) -> Name {
        self.schema().namespace().clone()
    }

    fn qualified_name(&self) -> Name {
        self.data().qualified_name.clone()
    }
}

impl<'m> Annotatable<'m> for Association<'m> {
    fn annotations(&self) -> Vec<Annotation<'m>> {
        annotations_of(self.model, &self.data().annotations, ElementKey::Association(self.id))
    }
}

impl Checkable for Association<'_> {
    fn errors(&self) -> Vec<EdmError> {
        let decl = &self.data().decl;
        let mut errors = name_errors(self.model, &decl.name, &decl.location);
        let [first, second] = self.ends();
        if first.role() == second.role() {
            errors.push(EdmError::new(
                EdmErrorCode::DuplicateMember,
                decl.end2.location.clone(),
                format!("duplicate role '{}' in '{}'", second.role(), self.qualified_name()),
            ));
        }
        for end in [first, second] {
            if let Element::Placeholder(p) = end.entity_type() {
                errors.extend(p.errors.iter().cloned());
            }
        }
        errors
    }
}

/// One end of an association.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct AssociationEnd<'m> {
    association: Association<'m>,
    index: u8,
}

impl<'m> AssociationEnd<'m> {
    pub fn association(&self) -> Association<'m> {
        self.association
    }

    fn decl(&self) -> &'m crate::syntax::AssociationEndDecl {
        let decl = &self.association.data().decl;
        if self.index == 0 { &decl.end1 } else { &decl.end2 }
    }

    pub fn role(&self) -> &'m Name {
        &self.decl().role
    }

    pub fn multiplicity(&self) -> Multiplicity {
        self.decl().multiplicity
    }

    pub fn entity_type(&self) -> TypeElement<'m> {
        let association = self.association;
        let cell = &association.data().end_types[usize::from(self.index)];
        let target = cell.get_or_compute(
            || {
                let decl = self.decl();
                association.schema().resolver().resolve_declared_type(
                    &decl.type_ref,
                    &[TypeKind::Entity],
                    &decl.location,
                )
            },
            || {
                Target::Placeholder(Placeholder::unresolved(
                    PlaceholderKind::UnresolvedType,
                    self.decl().type_ref.clone(),
                    self.decl().location.clone(),
                ))
            },
        );
        element(association.model, target, SchemaType::new)
    }
}

// ============================================================================
// TERM
// ============================================================================

impl<'m> Term<'m> {
    pub fn location(&self) -> &'m Location {
        &self.data().decl.location
    }

    pub fn schema(&self) -> Schema<'m> {
        Schema::new(self.model, self.data().schema)
    }

    pub fn type_ref(&self) -> TypeReference {
        self.data().type_ref.get_or_compute(
            || {
                let decl = &self.data().decl;
                self.schema()
                    .resolver()
                    .resolve_type_reference(&decl.type_ref, decl.nullable, &decl.location)
            },
            || {
                TypeReference::placeholder(
                    Placeholder::unresolved(
                        PlaceholderKind::UnresolvedType,
                        self.data().decl.type_ref.clone(),
                        self.location().clone(),
                    ),
                    true,
                )
            },
        )
    }

    pub fn type_element(&self) -> Option<TypeElement<'m>> {
        type_element_of(self.model, &self.type_ref())
    }

    pub fn default_value(&self) -> Option<&'m str> {
        self.data().decl.default_value.as_deref()
    }

    /// Element kinds the term may be applied to, as declared.
    pub fn applies_to(&self) -> Vec<&'m str> {
        self.data()
            .decl
            .applies_to
            .as_deref()
            .map(|s| s.split_whitespace().collect())
            .unwrap_or_default()
    }
}

impl Named for Term<'_> {
    fn name(&self) -> Name {
        self.data().decl.name.clone()
    }

    fn namespace(&self) -> Name {
        self.schema().namespace().clone()
    }

    fn qualified_name(&self) -> Name {
        self.data().qualified_name.clone()
    }
}

impl<'m> Annotatable<'m> for Term<'m> {
    fn annotations(&self) -> Vec<Annotation<'m>> {
        annotations_of(self.model, &self.data().annotations, ElementKey::Term(self.id))
    }
}

impl Checkable for Term<'_> {
    fn errors(&self) -> Vec<EdmError> {
        let decl = &self.data().decl;
        let type_ref = self.type_ref();
        let mut errors = name_errors(self.model, &decl.name, &decl.location);
        errors.extend(type_ref.errors());
        errors.extend(default_value_errors(
            self.model,
            &type_ref,
            self.default_value(),
            &decl.location,
        ));
        errors
    }
}

// ============================================================================
// ENTITY CONTAINER
// ============================================================================

impl<'m> EntityContainer<'m> {
    fn decl(&self) -> &'m ContainerDecl {
        &self.data().decl
    }

    pub fn location(&self) -> &'m Location {
        &self.decl().location
    }

    pub fn schema(&self) -> Schema<'m> {
        Schema::new(self.model, self.data().schema)
    }

    pub fn extends(&self) -> Option<ContainerElement<'m>> {
        let target = self.data().extends.get_or_compute(
            || {
                let decl = self.decl();
                let raw = decl.extends.as_ref()?;
                Some(self.schema().resolver().resolve_container(raw, &decl.location))
            },
            || None,
        )?;
        Some(element(self.model, target, EntityContainer::new))
    }

    pub fn entity_sets(&self) -> Vec<EntitySet<'m>> {
        self.data()
            .entity_sets
            .iter()
            .map(|id| EntitySet::new(self.model, *id))
            .collect()
    }

    pub fn association_sets(&self) -> Vec<AssociationSet<'m>> {
        self.data()
            .association_sets
            .iter()
            .map(|id| AssociationSet::new(self.model, *id))
            .collect()
    }

    /// Find an entity set here or in an extended container.
    pub fn find_entity_set(&self, name: &str) -> Option<EntitySet<'m>> {
        let mut seen = FxHashSet::default();
        let mut current = Some(*self);
        while let Some(container) = current {
            if !seen.insert(container) {
                break;
            }
            if let Some(set) = container.entity_sets().into_iter().find(|s| s.name() == name) {
                return Some(set);
            }
            current = container.extends().and_then(Element::into_declared);
        }
        None
    }
}

impl Named for EntityContainer<'_> {
    fn name(&self) -> Name {
        self.decl().name.clone()
    }

    fn namespace(&self) -> Name {
        self.schema().namespace().clone()
    }

    fn qualified_name(&self) -> Name {
        self.data().qualified_name.clone()
    }
}

impl<'m> Annotatable<'m> for EntityContainer<'m> {
    fn annotations(&self) -> Vec<Annotation<'m>> {
        annotations_of(self.model, &self.data().annotations, ElementKey::Container(self.id))
    }
}

impl Checkable for EntityContainer<'_> {
    fn errors(&self) -> Vec<EdmError> {
        let mut errors = name_errors(self.model, &self.decl().name, self.location());
        errors.extend(self.data().member_errors.iter().cloned());
        if let Some(Element::Placeholder(p)) = self.extends() {
            errors.extend(p.errors.iter().cloned());
        }
        errors
    }
}

// ============================================================================
// ENTITY SET
// ============================================================================

impl<'m> EntitySet<'m> {
    pub fn name(&self) -> &'m Name {
        &self.data().decl.name
    }

    pub fn location(&self) -> &'m Location {
        &self.data().decl.location
    }

    pub fn container(&self) -> EntityContainer<'m> {
        EntityContainer::new(self.model, self.data().container)
    }

    pub fn entity_type(&self) -> TypeElement<'m> {
        let target = self.data().entity_type.get_or_compute(
            || {
                let decl = &self.data().decl;
                self.container().schema().resolver().resolve_declared_type(
                    &decl.entity_type,
                    &[TypeKind::Entity],
                    &decl.location,
                )
            },
            || {
                Target::Placeholder(Placeholder::unresolved(
                    PlaceholderKind::UnresolvedType,
                    self.data().decl.entity_type.clone(),
                    self.location().clone(),
                ))
            },
        );
        element(self.model, target, SchemaType::new)
    }
}

impl Named for EntitySet<'_> {
    fn name(&self) -> Name {
        self.data().decl.name.clone()
    }

    fn namespace(&self) -> Name {
        self.container().namespace()
    }

    /// `Namespace.Container/Set`
    fn qualified_name(&self) -> Name {
        smol_str::format_smolstr!("{}/{}", self.container().qualified_name(), self.name())
    }
}

impl<'m> Annotatable<'m> for EntitySet<'m> {
    fn annotations(&self) -> Vec<Annotation<'m>> {
        annotations_of(self.model, &self.data().annotations, ElementKey::EntitySet(self.id))
    }
}

impl Checkable for EntitySet<'_> {
    fn errors(&self) -> Vec<EdmError> {
        let mut errors = name_errors(self.model, self.name(), self.location());
        if let Element::Placeholder(p) = self.entity_type() {
            errors.extend(p.errors.iter().cloned());
        }
        errors
    }
}

// ============================================================================
// ASSOCIATION SET
// ============================================================================

impl<'m> AssociationSet<'m> {
    pub fn name(&self) -> &'m Name {
        &self.data().decl.name
    }

    pub fn location(&self) -> &'m Location {
        &self.data().decl.location
    }

    pub fn container(&self) -> EntityContainer<'m> {
        EntityContainer::new(self.model, self.data().container)
    }

    fn association_target(&self) -> Target<Handle<AssociationId>> {
        self.data().association.get_or_compute(
            || {
                let decl = &self.data().decl;
                self.container()
                    .schema()
                    .resolver()
                    .resolve_association(&decl.association, &decl.location)
            },
            || {
                Target::Placeholder(Placeholder::unresolved(
                    PlaceholderKind::UnresolvedAssociation,
                    self.data().decl.association.clone(),
                    self.location().clone(),
                ))
            },
        )
    }

    pub fn association(&self) -> AssociationElement<'m> {
        element(self.model, self.association_target(), Association::new)
    }

    /// `(role, entity set)` for each declared end.
    pub fn ends(&self) -> Vec<(&'m Name, EntitySetElement<'m>)> {
        let decl = &self.data().decl;
        let sets = self.data().end_sets.get_or_compute(
            || {
                let container = self.container();
                [&decl.end1, &decl.end2].map(|end| {
                    let end = end.as_ref()?;
                    Some(match container.find_entity_set(&end.entity_set) {
                        Some(set) => self
                            .model
                            .handle_for(set.model, set.id)
                            .map(Target::Declared)
                            .unwrap_or_else(|| Target::Placeholder(missing_set(&end.entity_set, &end.location))),
                        None => Target::Placeholder(missing_set(&end.entity_set, &end.location)),
                    })
                })
            },
            || [None, None],
        );
        [&decl.end1, &decl.end2]
            .into_iter()
            .zip(sets)
            .filter_map(|(end, set)| {
                let end = end.as_ref()?;
                Some((&end.role, element(self.model, set?, EntitySet::new)))
            })
            .collect()
    }
}

fn missing_set(name: &str, location: &Location) -> Arc<Placeholder> {
    Placeholder::unresolved(PlaceholderKind::UnresolvedEntitySet, name, location.clone())
}

impl Checkable for AssociationSet<'_> {
    fn errors(&self) -> Vec<EdmError> {
        let decl = &self.data().decl;
        let mut errors = name_errors(self.model, &decl.name, &decl.location);
        let association = self.association();
        if let Element::Placeholder(p) = &association {
            errors.extend(p.errors.iter().cloned());
        }
        for (role, set) in self.ends() {
            if let Element::Placeholder(p) = set {
                errors.extend(p.errors.iter().cloned());
            }
            let Element::Declared(association) = &association else {
                continue;
            };
            if association.find_end(role).is_none() {
                errors.push(EdmError::new(
                    EdmErrorCode::BadUnresolvedNavigationRole,
                    decl.location.clone(),
                    format!(
                        "role '{}' does not match an end of '{}'",
                        role,
                        association.qualified_name()
                    ),
                ));
            }
        }
        errors
    }
}

// ============================================================================
// ANNOTATION
// ============================================================================

/// The term an annotation applies.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AnnotationTerm<'m> {
    /// Value annotation: a declared term.
    Value(TermElement<'m>),
    /// Type annotation: a structured type used as a term.
    Type(TypeElement<'m>),
}

/// An element an annotation may be attached to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AnnotatedElement<'m> {
    Type(SchemaType<'m>),
    Property(Property<'m>),
    NavigationProperty(NavigationProperty<'m>),
    Association(Association<'m>),
    Term(Term<'m>),
    Container(EntityContainer<'m>),
    EntitySet(EntitySet<'m>),
}

impl<'m> AnnotatedElement<'m> {
    pub(crate) fn from_key(model: &'m Model, key: ElementKey) -> Self {
        match key {
            ElementKey::Type(id) => AnnotatedElement::Type(SchemaType::new(model, id)),
            ElementKey::Property(id) => AnnotatedElement::Property(Property::new(model, id)),
            ElementKey::NavigationProperty(id) => {
                AnnotatedElement::NavigationProperty(NavigationProperty::new(model, id))
            }
            ElementKey::Association(id) => {
                AnnotatedElement::Association(Association::new(model, id))
            }
            ElementKey::Term(id) => AnnotatedElement::Term(Term::new(model, id)),
            ElementKey::Container(id) => AnnotatedElement::Container(EntityContainer::new(model, id)),
            ElementKey::EntitySet(id) => AnnotatedElement::EntitySet(EntitySet::new(model, id)),
        }
    }

    pub fn qualified_name(&self) -> Name {
        match self {
            AnnotatedElement::Type(e) => e.qualified_name(),
            AnnotatedElement::Property(e) => e.qualified_name(),
            AnnotatedElement::NavigationProperty(e) => e.qualified_name(),
            AnnotatedElement::Association(e) => e.qualified_name(),
            AnnotatedElement::Term(e) => e.qualified_name(),
            AnnotatedElement::Container(e) => e.qualified_name(),
            AnnotatedElement::EntitySet(e) => e.qualified_name(),
        }
    }
}

impl<'m> Annotation<'m> {
    fn decl(&self) -> &'m AnnotationDecl {
        &self.data().decl
    }

    pub fn term_name(&self) -> &'m str {
        self.decl().term()
    }

    pub fn qualifier(&self) -> Option<&'m str> {
        self.decl().qualifier()
    }

    pub fn location(&self) -> &'m Location {
        self.decl().location()
    }

    pub fn schema(&self) -> Schema<'m> {
        Schema::new(self.model, self.data().schema)
    }

    /// True for annotations declared in an `Annotations` block.
    pub fn is_out_of_line(&self) -> bool {
        self.data().block.is_some()
    }

    pub fn target(&self) -> Option<AnnotatedElement<'m>> {
        self.data()
            .target
            .map(|key| AnnotatedElement::from_key(self.model, key))
    }

    /// Structured type that paths in this annotation resolve against.
    pub fn binding_context(&self) -> Option<SchemaType<'m>> {
        self.data().context.map(|id| SchemaType::new(self.model, id))
    }

    fn term_target(&self) -> TermTarget {
        self.data().term.get_or_compute(
            || {
                let resolver = self.schema().resolver();
                match self.decl() {
                    AnnotationDecl::Value { term, location, .. } => {
                        TermTarget::Value(resolver.resolve_term(term, location))
                    }
                    AnnotationDecl::Type { term, location, .. } => TermTarget::Type(
                        resolver.resolve_declared_type(
                            term,
                            &[TypeKind::Complex, TypeKind::Entity],
                            location,
                        ),
                    ),
                }
            },
            || {
                TermTarget::Value(Target::Placeholder(Placeholder::unresolved(
                    PlaceholderKind::UnresolvedTerm,
                    self.term_name(),
                    self.location().clone(),
                )))
            },
        )
    }

    pub fn term(&self) -> AnnotationTerm<'m> {
        match self.term_target() {
            TermTarget::Value(target) => AnnotationTerm::Value(element(self.model, target, Term::new)),
            TermTarget::Type(target) => {
                AnnotationTerm::Type(element(self.model, target, SchemaType::new))
            }
        }
    }

    /// The value expression of a value annotation.
    pub fn value(&self) -> Option<Expr<'m>> {
        match self.decl() {
            AnnotationDecl::Value { .. } => {
                let root = *self.data().roots.first()?;
                Some(Expr::new(self.model, self.id, root))
            }
            AnnotationDecl::Type { .. } => None,
        }
    }

    /// Property bindings of a type annotation.
    pub fn property_values(&self) -> Vec<PropertyValueBinding<'m>> {
        match self.decl() {
            AnnotationDecl::Type {
                property_values, ..
            } => (0..property_values.len())
                .map(|index| PropertyValueBinding {
                    annotation: *self,
                    index,
                })
                .collect(),
            AnnotationDecl::Value { .. } => Vec::new(),
        }
    }

    fn bindings(&self) -> Arc<[Target<Handle<PropertyId>>]> {
        self.data()
            .bindings
            .get_or_compute(|| self.compute_bindings(), || Arc::from(Vec::new()))
    }

    fn compute_bindings(&self) -> Arc<[Target<Handle<PropertyId>>]> {
        let AnnotationDecl::Type {
            term,
            property_values,
            ..
        } = self.decl()
        else {
            return Arc::from(Vec::new());
        };
        let term_type = match self.term() {
            AnnotationTerm::Type(Element::Declared(ty)) => Some(ty),
            _ => None,
        };
        let term_name = term_type
            .map(|ty| ty.qualified_name())
            .unwrap_or_else(|| self.schema().resolver().normalize(term));

        property_values
            .iter()
            .map(|binding| {
                let found = term_type
                    .and_then(|ty| ty.find_property(&binding.property))
                    .and_then(|p| self.model.handle_for(p.model, p.id));
                match found {
                    Some(handle) => Target::Declared(handle),
                    None => Target::Placeholder(Placeholder::with_message(
                        PlaceholderKind::UnresolvedProperty,
                        binding.property.clone(),
                        binding.location.clone(),
                        format!(
                            "property '{}' could not be found on type '{}'",
                            binding.property, term_name
                        ),
                    )),
                }
            })
            .collect()
    }
}

impl<'m> Checkable for Annotation<'m> {
    /// Term and binding diagnostics plus structural expression errors.
    /// Path expressions are only checked when evaluated.
    fn errors(&self) -> Vec<EdmError> {
        let mut errors = match self.term_target() {
            TermTarget::Value(t) => t.errors(),
            TermTarget::Type(t) => t.errors(),
        };
        for binding in self.bindings().iter() {
            errors.extend(binding.errors());
        }
        if let Some(value) = self.value() {
            errors.extend(value.errors());
        }
        for binding in self.property_values() {
            errors.extend(binding.value().errors());
        }
        errors
    }
}

/// `Property = value` inside a type annotation.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct PropertyValueBinding<'m> {
    annotation: Annotation<'m>,
    index: usize,
}

impl<'m> PropertyValueBinding<'m> {
    fn decl(&self) -> &'m crate::syntax::PropertyValueDecl {
        match self.annotation.decl() {
            AnnotationDecl::Type {
                property_values, ..
            } => &property_values[self.index],
            AnnotationDecl::Value { .. } => {
                unreachable!("property value bindings only exist on type annotations")
            }
        }
    }

    pub fn annotation(&self) -> Annotation<'m> {
        self.annotation
    }

    pub fn property_name(&self) -> &'m Name {
        &self.decl().property
    }

    pub fn location(&self) -> &'m Location {
        &self.decl().location
    }

    /// The term-type property this binding assigns.
    pub fn bound_property(&self) -> PropertyElement<'m> {
        let target = self
            .annotation
            .bindings()
            .get(self.index)
            .cloned()
            .unwrap_or_else(|| {
                Target::Placeholder(Placeholder::unresolved(
                    PlaceholderKind::UnresolvedProperty,
                    self.property_name().clone(),
                    self.location().clone(),
                ))
            });
        element(self.annotation.model, target, Property::new)
    }

    pub fn value(&self) -> Expr<'m> {
        let root = self.annotation.data().roots[self.index];
        Expr::new(self.annotation.model, self.annotation.id, root)
    }
}

// ============================================================================
// MODEL QUERIES
// ============================================================================

impl Model {
    pub fn schemas(&self) -> impl Iterator<Item = Schema<'_>> {
        (0..self.schemas.len()).map(|i| Schema::new(self, SchemaId::new(i)))
    }

    pub fn schema_types(&self) -> impl Iterator<Item = SchemaType<'_>> {
        (0..self.types.len()).map(|i| SchemaType::new(self, TypeId::new(i)))
    }

    pub fn terms(&self) -> impl Iterator<Item = Term<'_>> {
        (0..self.terms.len()).map(|i| Term::new(self, TermId::new(i)))
    }

    pub fn associations(&self) -> impl Iterator<Item = Association<'_>> {
        (0..self.associations.len()).map(|i| Association::new(self, AssociationId::new(i)))
    }

    pub fn containers(&self) -> impl Iterator<Item = EntityContainer<'_>> {
        (0..self.containers.len()).map(|i| EntityContainer::new(self, ContainerId::new(i)))
    }

    pub fn all_properties(&self) -> impl Iterator<Item = Property<'_>> {
        (0..self.properties.len()).map(|i| Property::new(self, PropertyId::new(i)))
    }

    pub fn all_navigation_properties(&self) -> impl Iterator<Item = NavigationProperty<'_>> {
        (0..self.navigation_properties.len())
            .map(|i| NavigationProperty::new(self, NavigationPropertyId::new(i)))
    }

    pub fn all_entity_sets(&self) -> impl Iterator<Item = EntitySet<'_>> {
        (0..self.entity_sets.len()).map(|i| EntitySet::new(self, EntitySetId::new(i)))
    }

    pub fn all_association_sets(&self) -> impl Iterator<Item = AssociationSet<'_>> {
        (0..self.association_sets.len())
            .map(|i| AssociationSet::new(self, AssociationSetId::new(i)))
    }

    pub fn all_annotations(&self) -> impl Iterator<Item = Annotation<'_>> {
        (0..self.annotations.len()).map(|i| Annotation::new(self, AnnotationId::new(i)))
    }

    fn find<'a, I: Copy, T>(
        &'a self,
        qualified: &str,
        kind: PlaceholderKind,
        lookup: impl Fn(&Model, &str) -> Option<I>,
        view: impl Fn(&'a Model, I) -> T,
    ) -> Element<T> {
        if let Some(id) = lookup(self, qualified) {
            return Element::Declared(view(self, id));
        }
        for model in self.references.iter().map(Arc::as_ref) {
            if let Some(id) = lookup(model, qualified) {
                return Element::Declared(view(model, id));
            }
        }
        Element::Placeholder(Placeholder::unresolved(kind, qualified, Location::default()))
    }

    /// Look up a type by qualified name, here or in a referenced model.
    pub fn find_type(&self, qualified: &str) -> TypeElement<'_> {
        self.find(
            qualified,
            PlaceholderKind::UnresolvedType,
            |m, name| m.index.lookup_type(name).first(),
            SchemaType::new,
        )
    }

    pub fn find_term(&self, qualified: &str) -> TermElement<'_> {
        self.find(
            qualified,
            PlaceholderKind::UnresolvedTerm,
            |m, name| m.index.lookup_term(name).first(),
            Term::new,
        )
    }

    pub fn find_container(&self, qualified: &str) -> ContainerElement<'_> {
        self.find(
            qualified,
            PlaceholderKind::UnresolvedContainer,
            |m, name| m.index.lookup_container(name).first(),
            EntityContainer::new,
        )
    }

    pub fn find_association(&self, qualified: &str) -> AssociationElement<'_> {
        self.find(
            qualified,
            PlaceholderKind::UnresolvedAssociation,
            |m, name| m.index.lookup_association(name).first(),
            Association::new,
        )
    }

    /// Force every resolution cell of this model.
    ///
    /// After this returns no accessor writes to a cell again, so the model
    /// can be shared across threads and queried concurrently.
    pub fn resolve_all(&self) {
        for ty in self.schema_types() {
            let _ = ty.base_type();
            let _ = ty.key();
        }
        for property in self.all_properties() {
            let _ = property.type_ref();
        }
        for navigation in self.all_navigation_properties() {
            let _ = navigation.to_end();
        }
        for association in self.associations() {
            for end in association.ends() {
                let _ = end.entity_type();
            }
        }
        for term in self.terms() {
            let _ = term.type_ref();
        }
        for container in self.containers() {
            let _ = container.extends();
        }
        for set in self.all_entity_sets() {
            let _ = set.entity_type();
        }
        for set in self.all_association_sets() {
            let _ = set.association();
            let _ = set.ends();
        }
        for annotation in self.all_annotations() {
            let _ = annotation.bindings();
            for node in 0..annotation.data().exprs.len() {
                if let ExprKind::Path(path) = Expr::new(self, annotation.id, node).kind() {
                    let _ = path.referenced_property();
                }
            }
        }
        tracing::debug!("[MODEL] all resolution cells warmed");
    }
}
