//! Symbol index: qualified-name tables for one model.
//!
//! Declarations live in separate kind-spaces (types, terms, containers and
//! associations), so `NS.Name` may be a type and a term at the same time.
//! Within a kind-space every qualified name maps to the declarations that
//! claim it, in document order. The first one is the lookup answer; the rest
//! are reported once as duplicates when the model is built.

use indexmap::IndexMap;
use rustc_hash::FxHashMap;
use smol_str::format_smolstr;

use crate::base::{Name, split_qualified};

use super::ids::{AssociationId, ContainerId, SchemaId, TermId, TypeId};

/// Which table a lookup goes to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SymbolKind {
    Type,
    Term,
    Container,
    Association,
}

impl SymbolKind {
    pub fn display(&self) -> &'static str {
        match self {
            SymbolKind::Type => "type",
            SymbolKind::Term => "term",
            SymbolKind::Container => "entity container",
            SymbolKind::Association => "association",
        }
    }
}

/// Result of a qualified-name lookup.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ResolveResult<T> {
    /// Exactly one declaration claims the name.
    Found(T),
    /// Several declarations claim the name, in document order.
    Ambiguous(Vec<T>),
    /// Could not resolve the reference.
    NotFound,
}

impl<T: Copy> ResolveResult<T> {
    /// The deterministic answer: the only candidate, or the first declared.
    pub fn first(&self) -> Option<T> {
        match self {
            ResolveResult::Found(id) => Some(*id),
            ResolveResult::Ambiguous(ids) => ids.first().copied(),
            ResolveResult::NotFound => None,
        }
    }

    /// Check if resolution was successful.
    pub fn is_found(&self) -> bool {
        !matches!(self, ResolveResult::NotFound)
    }

    /// Check if the reference was ambiguous.
    pub fn is_ambiguous(&self) -> bool {
        matches!(self, ResolveResult::Ambiguous(_))
    }
}

fn lookup<T: Copy>(table: &IndexMap<Name, Vec<T>>, name: &str) -> ResolveResult<T> {
    match table.get(name).map(Vec::as_slice) {
        None | Some([]) => ResolveResult::NotFound,
        Some([id]) => ResolveResult::Found(*id),
        Some(ids) => ResolveResult::Ambiguous(ids.to_vec()),
    }
}

/// Push `id` under `name`; returns the first declaration when `id` is a duplicate.
fn insert<T: Copy>(table: &mut IndexMap<Name, Vec<T>>, name: Name, id: T) -> Option<T> {
    let entry = table.entry(name).or_default();
    let first = entry.first().copied();
    entry.push(id);
    first
}

/// Qualified-name tables plus per-schema aliases.
#[derive(Clone, Debug, Default)]
pub struct SymbolIndex {
    types: IndexMap<Name, Vec<TypeId>>,
    terms: IndexMap<Name, Vec<TermId>>,
    containers: IndexMap<Name, Vec<ContainerId>>,
    associations: IndexMap<Name, Vec<AssociationId>>,
    /// (schema, alias) → namespace
    aliases: FxHashMap<(SchemaId, Name), Name>,
}

impl SymbolIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn insert_type(&mut self, name: Name, id: TypeId) -> Option<TypeId> {
        insert(&mut self.types, name, id)
    }

    pub(crate) fn insert_term(&mut self, name: Name, id: TermId) -> Option<TermId> {
        insert(&mut self.terms, name, id)
    }

    pub(crate) fn insert_container(&mut self, name: Name, id: ContainerId) -> Option<ContainerId> {
        insert(&mut self.containers, name, id)
    }

    pub(crate) fn insert_association(
        &mut self,
        name: Name,
        id: AssociationId,
    ) -> Option<AssociationId> {
        insert(&mut self.associations, name, id)
    }

    /// Make `alias` stand for `namespace` in references from `schema`.
    pub(crate) fn add_alias(&mut self, schema: SchemaId, alias: Name, namespace: Name) {
        self.aliases.entry((schema, alias)).or_insert(namespace);
    }

    pub fn lookup_type(&self, qualified: &str) -> ResolveResult<TypeId> {
        lookup(&self.types, qualified)
    }

    pub fn lookup_term(&self, qualified: &str) -> ResolveResult<TermId> {
        lookup(&self.terms, qualified)
    }

    pub fn lookup_container(&self, qualified: &str) -> ResolveResult<ContainerId> {
        lookup(&self.containers, qualified)
    }

    pub fn lookup_association(&self, qualified: &str) -> ResolveResult<AssociationId> {
        lookup(&self.associations, qualified)
    }

    /// Rewrite `Alias.Name` into `Namespace.Name` for references from `schema`.
    pub fn expand_alias(&self, schema: SchemaId, qualified: &str) -> Name {
        let Some((prefix, name)) = split_qualified(qualified) else {
            return Name::new(qualified);
        };
        match self.aliases.get(&(schema, Name::new(prefix))) {
            Some(namespace) => format_smolstr!("{namespace}.{name}"),
            None => Name::new(qualified),
        }
    }

    /// Qualified type names in document order (duplicates listed once).
    pub fn type_names(&self) -> impl Iterator<Item = &Name> {
        self.types.keys()
    }

    /// Names claimed by more than one declaration, per kind-space.
    pub fn duplicates(&self) -> Vec<(SymbolKind, &Name)> {
        fn dups<T>(
            kind: SymbolKind,
            table: &IndexMap<Name, Vec<T>>,
        ) -> impl Iterator<Item = (SymbolKind, &Name)> {
            table
                .iter()
                .filter(|(_, ids)| ids.len() > 1)
                .map(move |(name, _)| (kind, name))
        }
        dups(SymbolKind::Type, &self.types)
            .chain(dups(SymbolKind::Term, &self.terms))
            .chain(dups(SymbolKind::Container, &self.containers))
            .chain(dups(SymbolKind::Association, &self.associations))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_declaration_wins() {
        let mut index = SymbolIndex::new();
        assert_eq!(index.insert_type("NS.Widget".into(), TypeId::new(0)), None);
        assert_eq!(
            index.insert_type("NS.Widget".into(), TypeId::new(3)),
            Some(TypeId::new(0))
        );

        let result = index.lookup_type("NS.Widget");
        assert!(result.is_ambiguous());
        assert_eq!(result.first(), Some(TypeId::new(0)));
        assert_eq!(index.duplicates(), vec![(SymbolKind::Type, &Name::new("NS.Widget"))]);
    }

    #[test]
    fn test_kind_spaces_are_separate() {
        let mut index = SymbolIndex::new();
        index.insert_type("NS.Thing".into(), TypeId::new(0));
        index.insert_term("NS.Thing".into(), TermId::new(0));

        assert_eq!(index.lookup_type("NS.Thing"), ResolveResult::Found(TypeId::new(0)));
        assert_eq!(index.lookup_term("NS.Thing"), ResolveResult::Found(TermId::new(0)));
        assert_eq!(index.lookup_container("NS.Thing"), ResolveResult::NotFound);
        assert!(index.duplicates().is_empty());
    }

    #[test]
    fn test_alias_expansion_is_per_schema() {
        let mut index = SymbolIndex::new();
        let first = SchemaId::new(0);
        let second = SchemaId::new(1);
        index.add_alias(first, "Core".into(), "Org.OData.Core.V1".into());

        assert_eq!(index.expand_alias(first, "Core.Description"), "Org.OData.Core.V1.Description");
        assert_eq!(index.expand_alias(second, "Core.Description"), "Core.Description");
        assert_eq!(index.expand_alias(first, "Unqualified"), "Unqualified");
    }
}
