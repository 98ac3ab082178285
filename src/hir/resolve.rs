//! Name resolution: turning raw references into handles or placeholders.
//!
//! A [`Resolver`] is scoped to one schema of one model, because aliases are
//! per schema. Lookups go to the model's own [`SymbolIndex`](super::SymbolIndex)
//! first and then to its referenced models, in order. The first declaration
//! of a name wins.
//!
//! Nothing here fails: a miss becomes a placeholder carrying a "not found"
//! diagnostic keyed to the reference's location.
//!
//! The module also hosts the structural cycle check used when a property's
//! type is resolved.

use rustc_hash::FxHashSet;

use crate::base::{Location, Name};

use super::diagnostics::{EdmError, EdmErrorCode};
use super::ids::{AssociationId, ContainerId, Handle, Origin, SchemaId, TermId, TypeId};
use super::index::{ResolveResult, SymbolIndex};
use super::model::{Model, Target, TypeDecl, TypeKind};
use super::placeholder::{Placeholder, PlaceholderKind};
use super::primitives::PrimitiveKind;
use super::types::{TypeDef, TypeRefSyntax, TypeReference};

// ============================================================================
// RESOLVER
// ============================================================================

/// Resolves references made from one schema.
#[derive(Clone, Copy)]
pub struct Resolver<'m> {
    model: &'m Model,
    schema: SchemaId,
}

impl<'m> Resolver<'m> {
    pub fn new(model: &'m Model, schema: SchemaId) -> Self {
        Self { model, schema }
    }

    /// Expand a leading schema alias or `Using` alias.
    pub fn normalize(&self, qualified: &str) -> Name {
        self.model.index.expand_alias(self.schema, qualified)
    }

    /// Local table first, then referenced models in order.
    fn lookup<I: Copy>(
        &self,
        qualified: &str,
        kind: &str,
        table: impl Fn(&SymbolIndex, &str) -> ResolveResult<I>,
    ) -> Option<Handle<I>> {
        let name = self.normalize(qualified);
        if let Some(id) = table(&self.model.index, &name).first() {
            tracing::trace!("[RESOLVE] {} '{}' found locally", kind, name);
            return Some(Handle::local(id));
        }
        let found = self
            .model
            .references
            .iter()
            .enumerate()
            .find_map(|(i, r)| table(&r.index, &name).first().map(|id| Handle::referenced(i, id)));
        if found.is_some() {
            tracing::trace!("[RESOLVE] {} '{}' found in referenced model", kind, name);
        } else {
            tracing::trace!("[RESOLVE] {} '{}' not found", kind, name);
        }
        found
    }

    pub fn type_handle(&self, qualified: &str) -> Option<Handle<TypeId>> {
        self.lookup(qualified, "type", SymbolIndex::lookup_type)
    }

    pub fn term_handle(&self, qualified: &str) -> Option<Handle<TermId>> {
        self.lookup(qualified, "term", SymbolIndex::lookup_term)
    }

    pub fn container_handle(&self, qualified: &str) -> Option<Handle<ContainerId>> {
        self.lookup(qualified, "container", SymbolIndex::lookup_container)
    }

    pub fn association_handle(&self, qualified: &str) -> Option<Handle<AssociationId>> {
        self.lookup(qualified, "association", SymbolIndex::lookup_association)
    }

    pub(crate) fn resolve_term(&self, qualified: &str, location: &Location) -> Target<Handle<TermId>> {
        match self.term_handle(qualified) {
            Some(handle) => Target::Declared(handle),
            None => Target::Placeholder(Placeholder::unresolved(
                PlaceholderKind::UnresolvedTerm,
                self.normalize(qualified),
                location.clone(),
            )),
        }
    }

    pub(crate) fn resolve_container(
        &self,
        qualified: &str,
        location: &Location,
    ) -> Target<Handle<ContainerId>> {
        match self.container_handle(qualified) {
            Some(handle) => Target::Declared(handle),
            None => Target::Placeholder(Placeholder::unresolved(
                PlaceholderKind::UnresolvedContainer,
                self.normalize(qualified),
                location.clone(),
            )),
        }
    }

    pub(crate) fn resolve_association(
        &self,
        qualified: &str,
        location: &Location,
    ) -> Target<Handle<AssociationId>> {
        match self.association_handle(qualified) {
            Some(handle) => Target::Declared(handle),
            None => Target::Placeholder(Placeholder::unresolved(
                PlaceholderKind::UnresolvedAssociation,
                self.normalize(qualified),
                location.clone(),
            )),
        }
    }

    /// Resolve a type name that must be of one of the `allowed` kinds.
    pub(crate) fn resolve_declared_type(
        &self,
        qualified: &str,
        allowed: &[TypeKind],
        location: &Location,
    ) -> Target<Handle<TypeId>> {
        let name = self.normalize(qualified);
        let Some(handle) = self.type_handle(qualified) else {
            return Target::Placeholder(Placeholder::unresolved(
                PlaceholderKind::UnresolvedType,
                name,
                location.clone(),
            ));
        };
        let kind = self.model.locate(handle.origin).type_data(handle.id).kind;
        if allowed.contains(&kind) {
            return Target::Declared(handle);
        }
        let expected: Vec<_> = allowed.iter().map(TypeKind::display).collect();
        Target::Placeholder(Placeholder::bad(
            name.clone(),
            EdmError::new(
                EdmErrorCode::BadTypeReference,
                location.clone(),
                format!(
                    "'{}' is a {}, expected {}",
                    name,
                    kind.display(),
                    expected.join(" or ")
                ),
            ),
        ))
    }

    /// Resolve a raw type-reference string.
    pub fn resolve_type_reference(
        &self,
        raw: &str,
        nullable: bool,
        location: &Location,
    ) -> TypeReference {
        match TypeRefSyntax::parse(raw) {
            Some(syntax) => self.resolve_syntax(&syntax, nullable, location),
            None => TypeReference::placeholder(
                Placeholder::bad(
                    raw,
                    EdmError::new(
                        EdmErrorCode::BadTypeReference,
                        location.clone(),
                        format!("malformed type reference '{raw}'"),
                    ),
                ),
                nullable,
            ),
        }
    }

    fn resolve_syntax(
        &self,
        syntax: &TypeRefSyntax<'_>,
        nullable: bool,
        location: &Location,
    ) -> TypeReference {
        match syntax {
            TypeRefSyntax::Named(name) => {
                if let Some(kind) = PrimitiveKind::from_qualified_name(name) {
                    return TypeReference::primitive(kind, nullable);
                }
                let definition = match self.type_handle(name) {
                    Some(handle) => TypeDef::Declared(handle),
                    None => TypeDef::Placeholder(Placeholder::unresolved(
                        PlaceholderKind::UnresolvedType,
                        self.normalize(name),
                        location.clone(),
                    )),
                };
                TypeReference::new(definition, nullable)
            }
            TypeRefSyntax::Collection(inner) => {
                let element = self.resolve_syntax(inner, nullable, location);
                TypeReference::new(TypeDef::Collection(Box::new(element)), false)
            }
            TypeRefSyntax::Ref(inner) => {
                let TypeRefSyntax::Named(name) = inner.as_ref() else {
                    return self.bad_reference(
                        name_of(syntax),
                        "Ref() must name an entity type",
                        nullable,
                        location,
                    );
                };
                match self.resolve_declared_type(name, &[TypeKind::Entity], location) {
                    Target::Declared(handle) => TypeReference::new(
                        TypeDef::EntityReference(Box::new(TypeReference::new(
                            TypeDef::Declared(handle),
                            false,
                        ))),
                        nullable,
                    ),
                    Target::Placeholder(p) => TypeReference::new(
                        TypeDef::EntityReference(Box::new(TypeReference::placeholder(p, false))),
                        nullable,
                    ),
                }
            }
        }
    }

    fn bad_reference(
        &self,
        name: String,
        message: &str,
        nullable: bool,
        location: &Location,
    ) -> TypeReference {
        let error = EdmError::new(EdmErrorCode::BadTypeReference, location.clone(), message);
        TypeReference::placeholder(Placeholder::bad(name, error), nullable)
    }
}

fn name_of(syntax: &TypeRefSyntax<'_>) -> String {
    match syntax {
        TypeRefSyntax::Named(name) => name.to_string(),
        TypeRefSyntax::Collection(inner) => format!("Collection({})", name_of(inner)),
        TypeRefSyntax::Ref(inner) => format!("Ref({})", name_of(inner)),
    }
}

// ============================================================================
// STRUCTURAL CYCLES
// ============================================================================

/// True when `target` is `declaring` or derives from it, through local types.
fn is_or_derives_from(model: &Model, target: TypeId, declaring: TypeId) -> bool {
    let mut current = target;
    let mut seen = FxHashSet::default();
    loop {
        if current == declaring {
            return true;
        }
        if !seen.insert(current) {
            return false;
        }
        match local_base(model, current) {
            Some(base) => current = base,
            None => return false,
        }
    }
}

/// Declared base of a local structured type, by raw lookup.
fn local_base(model: &Model, id: TypeId) -> Option<TypeId> {
    let data = model.type_data(id);
    let TypeDecl::Structured(decl) = &data.decl else {
        return None;
    };
    let raw = decl.base_type.as_ref()?;
    let handle = Resolver::new(model, data.schema).type_handle(raw)?;
    (handle.origin == Origin::Local).then_some(handle.id)
}

/// Local structured types held by value in `id`, including inherited members.
fn by_value_fields(model: &Model, id: TypeId) -> Vec<TypeId> {
    let mut fields = Vec::new();
    let mut current = Some(id);
    let mut seen = FxHashSet::default();
    while let Some(type_id) = current {
        if !seen.insert(type_id) {
            break;
        }
        let data = model.type_data(type_id);
        let resolver = Resolver::new(model, data.schema);
        for property in &data.properties {
            let raw = &model.property_data(*property).decl.type_ref;
            let Some(TypeRefSyntax::Named(name)) = TypeRefSyntax::parse(raw) else {
                continue;
            };
            let Some(handle) = resolver.type_handle(name) else {
                continue;
            };
            if handle.origin == Origin::Local && model.type_data(handle.id).kind != TypeKind::Enum {
                fields.push(handle.id);
            }
        }
        current = local_base(model, type_id);
    }
    fields
}

/// Would holding a `target` by value inside `declaring` make `declaring`
/// contain itself?
///
/// Walks the by-value complex and entity fields reachable from `target` with a visiting
/// set. Types from referenced models cannot refer back into this one, so the
/// walk stays local.
pub(crate) fn contains_by_value(model: &Model, target: TypeId, declaring: TypeId) -> bool {
    let mut visiting = FxHashSet::default();
    let mut stack = vec![target];
    while let Some(current) = stack.pop() {
        if is_or_derives_from(model, current, declaring) {
            tracing::trace!(
                "[RESOLVE] structural cycle: '{}' reaches '{}'",
                model.type_data(target).qualified_name,
                model.type_data(declaring).qualified_name
            );
            return true;
        }
        if !visiting.insert(current) {
            continue;
        }
        stack.extend(
            by_value_fields(model, current)
                .into_iter()
                .filter(|field| !visiting.contains(field)),
        );
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hir::model::ModelOptions;
    use crate::syntax::{PropertyDecl, SchemaDecl, StructuredTypeDecl};

    fn build(schemas: Vec<SchemaDecl>) -> Model {
        Model::builder()
            .with_options(ModelOptions {
                include_core_vocabulary: false,
                ..ModelOptions::default()
            })
            .with_schemas(schemas)
            .build()
    }

    #[test]
    fn test_alias_and_using_resolution() {
        let model = build(vec![
            SchemaDecl::new("Long.Namespace")
                .with_alias("LN")
                .with_complex_type(StructuredTypeDecl::new("Point")),
            SchemaDecl::new("Other").with_using("Long.Namespace", "L"),
        ]);
        let first = Resolver::new(&model, SchemaId::new(0));
        let second = Resolver::new(&model, SchemaId::new(1));

        assert!(first.type_handle("LN.Point").is_some());
        assert!(second.type_handle("L.Point").is_some());
        assert!(second.type_handle("LN.Point").is_none());
        assert!(second.type_handle("Long.Namespace.Point").is_some());
    }

    #[test]
    fn test_type_reference_shapes() {
        let model = build(vec![
            SchemaDecl::new("NS")
                .with_complex_type(StructuredTypeDecl::new("Point"))
                .with_entity_type(StructuredTypeDecl::new("Customer")),
        ]);
        let resolver = Resolver::new(&model, SchemaId::new(0));
        let at = Location::default();

        let primitive = resolver.resolve_type_reference("Edm.String", true, &at);
        assert_eq!(primitive.as_primitive(), Some(PrimitiveKind::String));

        let collection = resolver.resolve_type_reference("Collection(NS.Point)", true, &at);
        assert!(collection.is_collection());
        assert!(collection.errors().is_empty());

        let reference = resolver.resolve_type_reference("Ref(NS.Customer)", false, &at);
        assert!(reference.is_entity_reference());
        assert!(reference.errors().is_empty());

        let bad_ref = resolver.resolve_type_reference("Ref(NS.Point)", false, &at);
        assert_eq!(bad_ref.errors()[0].code, EdmErrorCode::BadTypeReference);

        let missing = resolver.resolve_type_reference("NS.Nope", true, &at);
        assert_eq!(missing.errors()[0].code, EdmErrorCode::BadUnresolvedType);

        let malformed = resolver.resolve_type_reference("Collection(NS.Point", true, &at);
        assert_eq!(malformed.errors()[0].code, EdmErrorCode::BadTypeReference);
    }

    #[test]
    fn test_contains_by_value() {
        let model = build(vec![
            SchemaDecl::new("NS")
                .with_complex_type(
                    StructuredTypeDecl::new("A").with_property(PropertyDecl::new("b", "NS.B")),
                )
                .with_complex_type(
                    StructuredTypeDecl::new("B").with_property(PropertyDecl::new("a", "NS.A")),
                )
                .with_complex_type(
                    StructuredTypeDecl::new("C")
                        .with_property(PropertyDecl::new("many", "Collection(NS.C)")),
                ),
        ]);
        let a = TypeId::new(0);
        let b = TypeId::new(1);
        let c = TypeId::new(2);

        assert!(contains_by_value(&model, b, a));
        assert!(contains_by_value(&model, a, b));
        assert!(!contains_by_value(&model, b, c));
        // collections are an indirection
        assert!(!by_value_fields(&model, c).contains(&c));
    }
}
