//! The Model: arena of resolved elements plus the symbol table.
//!
//! A [`Model`] is built once from a forest of [`SchemaDecl`]s and never
//! mutated afterwards. It owns every element in flat vectors indexed by the
//! ids in [`ids`](super::ids); elements point at each other through those
//! ids, never through owning pointers. Each entry keeps its declaration node
//! (with the child lists moved out into their own arenas) and one
//! [`ResolutionCell`] per resolved accessor.
//!
//! ## Construction
//!
//! ```text
//! ModelBuilder::build
//!     │
//!     ├── pass 1: every schema item → arena entry + SymbolIndex
//!     │           (duplicates reported here, once per redundant declaration)
//!     ├── pass 2: out-of-line annotation blocks → resolved targets
//!     └── pass 3: labeled elements indexed per schema
//! ```
//!
//! Nothing is resolved during construction except annotation targets;
//! everything else happens on first query through the element views in
//! [`elements`](super::elements).

use std::sync::Arc;

use indexmap::IndexMap;
use rustc_hash::{FxHashMap, FxHashSet};

use crate::base::{Location, Name, qualify, split_qualified};
use crate::syntax::{
    AnnotationDecl, AnnotationsDecl, AssociationDecl, AssociationSetDecl, ContainerDecl,
    EntitySetDecl, EnumTypeDecl, ExprDecl, ExprDeclKind, NavigationPropertyDecl, PropertyDecl,
    SchemaDecl, SchemaItemDecl, StructuredTypeDecl, TermDecl, UsingDecl,
};

use super::cell::ResolutionCell;
use super::diagnostics::{DiagnosticCollector, EdmError, EdmErrorCode};
use super::ids::{
    AnnotationId, AssociationId, AssociationSetId, ContainerId, ElementKey, EntitySetId, Handle,
    NavigationPropertyId, Origin, PropertyId, SchemaId, TermId, TypeId,
};
use super::index::SymbolIndex;
use super::placeholder::Placeholder;
use super::types::TypeReference;

// ============================================================================
// OPTIONS
// ============================================================================

/// Options controlling model construction and validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelOptions {
    /// Reference the shared Core vocabulary (`Org.OData.Core.V1`).
    pub include_core_vocabulary: bool,
    /// Check property and term default values against their types.
    pub validate_default_values: bool,
    /// Check declared names against identifier rules.
    pub validate_names: bool,
    /// Walk the arenas with rayon during validation.
    pub parallel_validation: bool,
}

impl Default for ModelOptions {
    fn default() -> Self {
        Self {
            include_core_vocabulary: true,
            validate_default_values: true,
            validate_names: true,
            parallel_validation: false,
        }
    }
}

// ============================================================================
// ARENA ENTRIES
// ============================================================================

/// Outcome of resolving a reference: a declared element or a placeholder.
#[derive(Clone, Debug, PartialEq)]
pub(crate) enum Target<K> {
    Declared(K),
    Placeholder(Arc<Placeholder>),
}

impl<K> Target<K> {
    pub(crate) fn placeholder(&self) -> Option<&Arc<Placeholder>> {
        match self {
            Target::Placeholder(p) => Some(p),
            Target::Declared(_) => None,
        }
    }

    pub(crate) fn errors(&self) -> Vec<EdmError> {
        self.placeholder()
            .map(|p| p.errors.clone())
            .unwrap_or_default()
    }
}

/// Kind of a declared type.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TypeKind {
    Complex,
    Entity,
    Enum,
}

impl TypeKind {
    pub fn display(&self) -> &'static str {
        match self {
            TypeKind::Complex => "complex type",
            TypeKind::Entity => "entity type",
            TypeKind::Enum => "enum type",
        }
    }
}

#[derive(Debug)]
pub(crate) enum TypeDecl {
    Structured(StructuredTypeDecl),
    Enum(EnumTypeDecl),
}

#[derive(Debug)]
pub(crate) struct SchemaData {
    pub namespace: Name,
    pub alias: Option<Name>,
    pub usings: Vec<UsingDecl>,
    pub location: Location,
    /// Top-level items in document order.
    pub items: Vec<ElementKey>,
    pub blocks: Vec<AnnotationBlock>,
    /// First labeled element per name, in document order.
    pub labels: IndexMap<Name, LabelEntry>,
}

/// An out-of-line `Annotations` block.
#[derive(Debug)]
pub(crate) struct AnnotationBlock {
    /// Declaration with its annotation list moved out.
    pub decl: AnnotationsDecl,
    pub annotations: Vec<AnnotationId>,
    /// Unresolved-target diagnostic, when the target was not found.
    pub errors: Vec<EdmError>,
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct LabelEntry {
    pub annotation: AnnotationId,
    /// Node index into the annotation's expression arena.
    pub node: usize,
}

#[derive(Debug)]
pub(crate) struct TypeData {
    pub schema: SchemaId,
    pub kind: TypeKind,
    pub qualified_name: Name,
    pub decl: TypeDecl,
    pub properties: Vec<PropertyId>,
    pub navigation_properties: Vec<NavigationPropertyId>,
    pub annotations: Vec<AnnotationId>,
    pub member_errors: Vec<EdmError>,
    pub base: ResolutionCell<Option<Target<Handle<TypeId>>>>,
    pub key: ResolutionCell<Arc<[Target<Handle<PropertyId>>]>>,
}

#[derive(Debug)]
pub(crate) struct PropertyData {
    pub declaring: TypeId,
    pub decl: PropertyDecl,
    pub annotations: Vec<AnnotationId>,
    pub type_ref: ResolutionCell<TypeReference>,
}

#[derive(Debug)]
pub(crate) struct NavigationPropertyData {
    pub declaring: TypeId,
    pub decl: NavigationPropertyDecl,
    pub annotations: Vec<AnnotationId>,
    pub association: ResolutionCell<Target<Handle<AssociationId>>>,
    /// (from, to) end indices into the resolved association.
    pub ends: ResolutionCell<(Target<u8>, Target<u8>)>,
}

#[derive(Debug)]
pub(crate) struct AssociationData {
    pub schema: SchemaId,
    pub qualified_name: Name,
    pub decl: AssociationDecl,
    pub annotations: Vec<AnnotationId>,
    pub end_types: [ResolutionCell<Target<Handle<TypeId>>>; 2],
}

#[derive(Debug)]
pub(crate) struct TermData {
    pub schema: SchemaId,
    pub qualified_name: Name,
    pub decl: TermDecl,
    pub annotations: Vec<AnnotationId>,
    pub type_ref: ResolutionCell<TypeReference>,
}

#[derive(Debug)]
pub(crate) struct ContainerData {
    pub schema: SchemaId,
    pub qualified_name: Name,
    pub decl: ContainerDecl,
    pub entity_sets: Vec<EntitySetId>,
    pub association_sets: Vec<AssociationSetId>,
    pub annotations: Vec<AnnotationId>,
    pub member_errors: Vec<EdmError>,
    pub extends: ResolutionCell<Option<Target<Handle<ContainerId>>>>,
}

#[derive(Debug)]
pub(crate) struct EntitySetData {
    pub container: ContainerId,
    pub decl: EntitySetDecl,
    pub annotations: Vec<AnnotationId>,
    pub entity_type: ResolutionCell<Target<Handle<TypeId>>>,
}

#[derive(Debug)]
pub(crate) struct AssociationSetData {
    pub container: ContainerId,
    pub decl: AssociationSetDecl,
    pub association: ResolutionCell<Target<Handle<AssociationId>>>,
    pub end_sets: ResolutionCell<[Option<Target<Handle<EntitySetId>>>; 2]>,
}

/// What an annotation's term resolved to.
#[derive(Clone, Debug, PartialEq)]
pub(crate) enum TermTarget {
    /// Value annotation: a term in the term kind-space.
    Value(Target<Handle<TermId>>),
    /// Type annotation: a structured type used as a term.
    Type(Target<Handle<TypeId>>),
}

#[derive(Debug)]
pub(crate) struct AnnotationData {
    pub schema: SchemaId,
    pub decl: AnnotationDecl,
    pub target: Option<ElementKey>,
    /// Structured type that paths inside the annotation resolve against.
    pub context: Option<TypeId>,
    /// Index of the out-of-line block, when not declared inline.
    pub block: Option<usize>,
    pub term: ResolutionCell<TermTarget>,
    pub bindings: ResolutionCell<Arc<[Target<Handle<PropertyId>>]>>,
    /// Expression nodes in pre-order.
    pub exprs: Vec<ExprNode>,
    /// Root node of the value expression, or of each property value.
    pub roots: Vec<usize>,
}

/// One node of an annotation's expression trees.
#[derive(Debug)]
pub(crate) struct ExprNode {
    pub decl: Arc<ExprDecl>,
    pub children: Vec<usize>,
    pub refs: ResolutionCell<NodeRefs>,
    pub path: ResolutionCell<Target<Handle<PropertyId>>>,
}

/// Names a node refers to, resolved on the first `Expr::kind`.
#[derive(Clone, Debug)]
pub(crate) enum NodeRefs {
    None,
    /// Wrong operand count.
    Malformed(Arc<Placeholder>),
    /// `Cast` / `IsType` target type.
    Type(TypeReference),
    Collection(Option<TypeReference>),
    /// Record type and the property each field assigns.
    Record {
        type_ref: Option<TypeReference>,
        fields: Arc<[Target<Handle<PropertyId>>]>,
    },
    EnumMembers(Arc<[Target<(Handle<TypeId>, usize)>]>),
    Label(Target<LabelEntry>),
}

impl ExprNode {
    fn push(expr: &Arc<ExprDecl>, nodes: &mut Vec<ExprNode>) -> usize {
        let index = nodes.len();
        nodes.push(ExprNode {
            decl: expr.clone(),
            children: Vec::new(),
            refs: ResolutionCell::new(),
            path: ResolutionCell::new(),
        });
        let children = expr
            .children()
            .into_iter()
            .map(|child| Self::push(child, nodes))
            .collect();
        nodes[index].children = children;
        index
    }

    /// Pre-order arena over every expression of `decl`.
    fn arena(decl: &AnnotationDecl) -> (Vec<ExprNode>, Vec<usize>) {
        let mut nodes = Vec::new();
        let roots = match decl {
            AnnotationDecl::Value { expr, .. } => vec![Self::push(expr, &mut nodes)],
            AnnotationDecl::Type {
                property_values, ..
            } => property_values
                .iter()
                .map(|value| Self::push(&value.expr, &mut nodes))
                .collect(),
        };
        (nodes, roots)
    }
}

// ============================================================================
// MODEL
// ============================================================================

/// A resolved, queryable semantic model.
#[derive(Debug)]
pub struct Model {
    pub(crate) options: ModelOptions,
    /// Referenced models: direct references in order, then theirs.
    pub(crate) references: Vec<Arc<Model>>,
    pub(crate) index: SymbolIndex,
    pub(crate) schemas: Vec<SchemaData>,
    pub(crate) types: Vec<TypeData>,
    pub(crate) properties: Vec<PropertyData>,
    pub(crate) navigation_properties: Vec<NavigationPropertyData>,
    pub(crate) associations: Vec<AssociationData>,
    pub(crate) terms: Vec<TermData>,
    pub(crate) containers: Vec<ContainerData>,
    pub(crate) entity_sets: Vec<EntitySetData>,
    pub(crate) association_sets: Vec<AssociationSetData>,
    pub(crate) annotations: Vec<AnnotationData>,
    /// Out-of-line annotations by resolved target.
    pub(crate) attached: FxHashMap<ElementKey, Vec<AnnotationId>>,
    pub(crate) errors: Vec<EdmError>,
}

impl Model {
    /// Build a model from schemas with default options.
    pub fn new(schemas: impl IntoIterator<Item = SchemaDecl>) -> Self {
        ModelBuilder::new().with_schemas(schemas).build()
    }

    pub fn builder() -> ModelBuilder {
        ModelBuilder::new()
    }

    pub fn options(&self) -> &ModelOptions {
        &self.options
    }

    /// Referenced models, direct references first.
    pub fn references(&self) -> &[Arc<Model>] {
        &self.references
    }

    pub fn symbol_index(&self) -> &SymbolIndex {
        &self.index
    }

    /// Model-level diagnostics (duplicate declarations).
    pub fn errors(&self) -> &[EdmError] {
        &self.errors
    }

    /// True when a schema of this model declares `namespace`.
    pub fn declares_namespace(&self, namespace: &str) -> bool {
        self.schemas.iter().any(|s| s.namespace == namespace)
    }

    /// The model an origin refers to, relative to this one.
    pub(crate) fn locate(&self, origin: Origin) -> &Model {
        match origin {
            Origin::Local => self,
            Origin::Referenced(i) => &self.references[usize::from(i)],
        }
    }

    /// Express an id living in `owner` as a handle relative to this model.
    pub(crate) fn handle_for<I>(&self, owner: &Model, id: I) -> Option<Handle<I>> {
        if std::ptr::eq(self, owner) {
            return Some(Handle::local(id));
        }
        self.references
            .iter()
            .position(|r| std::ptr::eq(Arc::as_ptr(r), owner))
            .map(|i| Handle::referenced(i, id))
    }

    pub(crate) fn type_data(&self, id: TypeId) -> &TypeData {
        &self.types[id.index()]
    }

    pub(crate) fn property_data(&self, id: PropertyId) -> &PropertyData {
        &self.properties[id.index()]
    }

    pub(crate) fn navigation_data(&self, id: NavigationPropertyId) -> &NavigationPropertyData {
        &self.navigation_properties[id.index()]
    }

    pub(crate) fn association_data(&self, id: AssociationId) -> &AssociationData {
        &self.associations[id.index()]
    }

    pub(crate) fn term_data(&self, id: TermId) -> &TermData {
        &self.terms[id.index()]
    }

    pub(crate) fn container_data(&self, id: ContainerId) -> &ContainerData {
        &self.containers[id.index()]
    }

    pub(crate) fn entity_set_data(&self, id: EntitySetId) -> &EntitySetData {
        &self.entity_sets[id.index()]
    }

    pub(crate) fn association_set_data(&self, id: AssociationSetId) -> &AssociationSetData {
        &self.association_sets[id.index()]
    }

    pub(crate) fn annotation_data(&self, id: AnnotationId) -> &AnnotationData {
        &self.annotations[id.index()]
    }

    pub(crate) fn schema_data(&self, id: SchemaId) -> &SchemaData {
        &self.schemas[id.index()]
    }

    /// Out-of-line annotations attached to `key`.
    pub(crate) fn attached_annotations(&self, key: ElementKey) -> &[AnnotationId] {
        self.attached.get(&key).map(Vec::as_slice).unwrap_or_default()
    }
}

// ============================================================================
// BUILDER
// ============================================================================

/// Collects schemas, referenced models and options, then builds a [`Model`].
#[derive(Debug, Default)]
pub struct ModelBuilder {
    schemas: Vec<SchemaDecl>,
    references: Vec<Arc<Model>>,
    options: ModelOptions,
}

impl ModelBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(mut self, options: ModelOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_schema(mut self, schema: SchemaDecl) -> Self {
        self.schemas.push(schema);
        self
    }

    pub fn with_schemas(mut self, schemas: impl IntoIterator<Item = SchemaDecl>) -> Self {
        self.schemas.extend(schemas);
        self
    }

    pub fn add_schema(&mut self, schema: SchemaDecl) {
        self.schemas.push(schema);
    }

    /// Reference another model; its types and terms become visible.
    pub fn with_reference(mut self, model: Arc<Model>) -> Self {
        self.references.push(model);
        self
    }

    pub fn build(self) -> Model {
        let ModelBuilder {
            schemas,
            references,
            options,
        } = self;

        let mut direct = references;
        let core = crate::vocab::CORE_NAMESPACE;
        if options.include_core_vocabulary
            && !schemas.iter().any(|s| s.namespace == core)
            && !direct.iter().any(|m| m.declares_namespace(core))
        {
            direct.push(crate::vocab::core_vocabulary());
        }

        let mut model = Model {
            options,
            references: collect_references(direct),
            index: SymbolIndex::new(),
            schemas: Vec::new(),
            types: Vec::new(),
            properties: Vec::new(),
            navigation_properties: Vec::new(),
            associations: Vec::new(),
            terms: Vec::new(),
            containers: Vec::new(),
            entity_sets: Vec::new(),
            association_sets: Vec::new(),
            annotations: Vec::new(),
            attached: FxHashMap::default(),
            errors: Vec::new(),
        };

        let mut diagnostics = DiagnosticCollector::new();
        let mut pending_blocks = Vec::new();
        for schema in schemas {
            let (id, blocks) = model.add_schema(schema, &mut diagnostics);
            pending_blocks.extend(blocks.into_iter().map(|block| (id, block)));
        }
        for (schema, block) in pending_blocks {
            model.add_annotation_block(schema, block);
        }
        model.index_labels();
        model.errors = diagnostics.finish();

        tracing::debug!(
            "[MODEL] built {} schemas: {} types, {} properties, {} terms, {} containers, {} annotations, {} errors",
            model.schemas.len(),
            model.types.len(),
            model.properties.len(),
            model.terms.len(),
            model.containers.len(),
            model.annotations.len(),
            model.errors.len()
        );
        model
    }
}

/// Direct references, then their references, without repeats.
fn collect_references(direct: Vec<Arc<Model>>) -> Vec<Arc<Model>> {
    let mut all: Vec<Arc<Model>> = Vec::new();
    let transitive: Vec<Arc<Model>> = direct
        .iter()
        .flat_map(|m| m.references.iter().cloned())
        .collect();
    for model in direct.into_iter().chain(transitive) {
        if !all.iter().any(|m| Arc::ptr_eq(m, &model)) {
            all.push(model);
        }
    }
    all
}

impl Model {
    fn add_schema(
        &mut self,
        mut decl: SchemaDecl,
        diagnostics: &mut DiagnosticCollector,
    ) -> (SchemaId, Vec<AnnotationsDecl>) {
        let id = SchemaId::new(self.schemas.len());
        let namespace = decl.namespace.clone();
        tracing::trace!("[MODEL] adding schema {}", namespace);

        if let Some(alias) = &decl.alias {
            self.index.add_alias(id, alias.clone(), namespace.clone());
        }
        for using in &decl.usings {
            self.index
                .add_alias(id, using.alias.clone(), using.namespace.clone());
        }

        self.schemas.push(SchemaData {
            namespace: namespace.clone(),
            alias: decl.alias.take(),
            usings: std::mem::take(&mut decl.usings),
            location: decl.location.clone(),
            items: Vec::new(),
            blocks: Vec::new(),
            labels: IndexMap::new(),
        });

        let mut items = Vec::with_capacity(decl.items.len());
        for item in std::mem::take(&mut decl.items) {
            let key = match item {
                SchemaItemDecl::ComplexType(t) => ElementKey::Type(self.add_structured_type(
                    id,
                    TypeKind::Complex,
                    t,
                    diagnostics,
                )),
                SchemaItemDecl::EntityType(t) => ElementKey::Type(self.add_structured_type(
                    id,
                    TypeKind::Entity,
                    t,
                    diagnostics,
                )),
                SchemaItemDecl::EnumType(e) => {
                    ElementKey::Type(self.add_enum_type(id, e, diagnostics))
                }
                SchemaItemDecl::Association(a) => {
                    ElementKey::Association(self.add_association(id, a, diagnostics))
                }
                SchemaItemDecl::Term(t) => ElementKey::Term(self.add_term(id, t, diagnostics)),
                SchemaItemDecl::EntityContainer(c) => {
                    ElementKey::Container(self.add_container(id, c, diagnostics))
                }
            };
            items.push(key);
        }
        self.schemas[id.index()].items = items;

        (id, std::mem::take(&mut decl.annotations))
    }

    fn report_duplicate(
        &self,
        kind: &str,
        qualified_name: &Name,
        location: &Location,
        diagnostics: &mut DiagnosticCollector,
    ) {
        tracing::debug!("[MODEL] duplicate {} declaration: {}", kind, qualified_name);
        diagnostics.duplicate_declaration(kind, qualified_name, location.clone());
    }

    fn add_structured_type(
        &mut self,
        schema: SchemaId,
        kind: TypeKind,
        mut decl: StructuredTypeDecl,
        diagnostics: &mut DiagnosticCollector,
    ) -> TypeId {
        let id = TypeId::new(self.types.len());
        let qualified_name = qualify(&self.schemas[schema.index()].namespace, &decl.name);
        if self.index.insert_type(qualified_name.clone(), id).is_some() {
            self.report_duplicate("type", &qualified_name, &decl.location, diagnostics);
        }

        let properties = std::mem::take(&mut decl.properties);
        let navigation_properties = std::mem::take(&mut decl.navigation_properties);
        let annotations = std::mem::take(&mut decl.annotations);

        let mut members = DiagnosticCollector::new();
        let mut seen = FxHashSet::default();
        let mut property_ids = Vec::with_capacity(properties.len());
        for mut property in properties {
            if !seen.insert(property.name.clone()) {
                members.duplicate_member(
                    "property",
                    &property.name,
                    &qualified_name,
                    property.location.clone(),
                );
            }
            let pid = PropertyId::new(self.properties.len());
            let inline = std::mem::take(&mut property.annotations);
            self.properties.push(PropertyData {
                declaring: id,
                decl: property,
                annotations: Vec::new(),
                type_ref: ResolutionCell::new(),
            });
            let annotations = self.add_annotations(
                schema,
                inline,
                Some(ElementKey::Property(pid)),
                Some(id),
                None,
            );
            self.properties[pid.index()].annotations = annotations;
            property_ids.push(pid);
        }

        let mut navigation_ids = Vec::with_capacity(navigation_properties.len());
        for mut navigation in navigation_properties {
            if !seen.insert(navigation.name.clone()) {
                members.duplicate_member(
                    "navigation property",
                    &navigation.name,
                    &qualified_name,
                    navigation.location.clone(),
                );
            }
            let nid = NavigationPropertyId::new(self.navigation_properties.len());
            let inline = std::mem::take(&mut navigation.annotations);
            self.navigation_properties.push(NavigationPropertyData {
                declaring: id,
                decl: navigation,
                annotations: Vec::new(),
                association: ResolutionCell::new(),
                ends: ResolutionCell::new(),
            });
            let annotations = self.add_annotations(
                schema,
                inline,
                Some(ElementKey::NavigationProperty(nid)),
                Some(id),
                None,
            );
            self.navigation_properties[nid.index()].annotations = annotations;
            navigation_ids.push(nid);
        }

        self.types.push(TypeData {
            schema,
            kind,
            qualified_name,
            decl: TypeDecl::Structured(decl),
            properties: property_ids,
            navigation_properties: navigation_ids,
            annotations: Vec::new(),
            member_errors: members.finish(),
            base: ResolutionCell::new(),
            key: ResolutionCell::new(),
        });
        let annotations = self.add_annotations(
            schema,
            annotations,
            Some(ElementKey::Type(id)),
            Some(id),
            None,
        );
        self.types[id.index()].annotations = annotations;
        id
    }

    fn add_enum_type(
        &mut self,
        schema: SchemaId,
        mut decl: EnumTypeDecl,
        diagnostics: &mut DiagnosticCollector,
    ) -> TypeId {
        let id = TypeId::new(self.types.len());
        let qualified_name = qualify(&self.schemas[schema.index()].namespace, &decl.name);
        if self.index.insert_type(qualified_name.clone(), id).is_some() {
            self.report_duplicate("type", &qualified_name, &decl.location, diagnostics);
        }

        let mut members = DiagnosticCollector::new();
        let mut seen = FxHashSet::default();
        for member in &decl.members {
            if !seen.insert(member.name.clone()) {
                members.duplicate_member(
                    "enum member",
                    &member.name,
                    &qualified_name,
                    member.location.clone(),
                );
            }
        }

        let annotations = std::mem::take(&mut decl.annotations);
        self.types.push(TypeData {
            schema,
            kind: TypeKind::Enum,
            qualified_name,
            decl: TypeDecl::Enum(decl),
            properties: Vec::new(),
            navigation_properties: Vec::new(),
            annotations: Vec::new(),
            member_errors: members.finish(),
            base: ResolutionCell::new(),
            key: ResolutionCell::new(),
        });
        let annotations = self.add_annotations(
            schema,
            annotations,
            Some(ElementKey::Type(id)),
            None,
            None,
        );
        self.types[id.index()].annotations = annotations;
        id
    }

    fn add_association(
        &mut self,
        schema: SchemaId,
        mut decl: AssociationDecl,
        diagnostics: &mut DiagnosticCollector,
    ) -> AssociationId {
        let id = AssociationId::new(self.associations.len());
        let qualified_name = qualify(&self.schemas[schema.index()].namespace, &decl.name);
        if self.index.insert_association(qualified_name.clone(), id).is_some() {
            self.report_duplicate("association", &qualified_name, &decl.location, diagnostics);
        }
        let annotations = std::mem::take(&mut decl.annotations);
        self.associations.push(AssociationData {
            schema,
            qualified_name,
            decl,
            annotations: Vec::new(),
            end_types: [ResolutionCell::new(), ResolutionCell::new()],
        });
        let annotations = self.add_annotations(
            schema,
            annotations,
            Some(ElementKey::Association(id)),
            None,
            None,
        );
        self.associations[id.index()].annotations = annotations;
        id
    }

    fn add_term(
        &mut self,
        schema: SchemaId,
        mut decl: TermDecl,
        diagnostics: &mut DiagnosticCollector,
    ) -> TermId {
        let id = TermId::new(self.terms.len());
        let qualified_name = qualify(&self.schemas[schema.index()].namespace, &decl.name);
        if self.index.insert_term(qualified_name.clone(), id).is_some() {
            self.report_duplicate("term", &qualified_name, &decl.location, diagnostics);
        }
        let annotations = std::mem::take(&mut decl.annotations);
        self.terms.push(TermData {
            schema,
            qualified_name,
            decl,
            annotations: Vec::new(),
            type_ref: ResolutionCell::new(),
        });
        let annotations = self.add_annotations(
            schema,
            annotations,
            Some(ElementKey::Term(id)),
            None,
            None,
        );
        self.terms[id.index()].annotations = annotations;
        id
    }

    fn add_container(
        &mut self,
        schema: SchemaId,
        mut decl: ContainerDecl,
        diagnostics: &mut DiagnosticCollector,
    ) -> ContainerId {
        let id = ContainerId::new(self.containers.len());
        let qualified_name = qualify(&self.schemas[schema.index()].namespace, &decl.name);
        if self.index.insert_container(qualified_name.clone(), id).is_some() {
            self.report_duplicate("entity container", &qualified_name, &decl.location, diagnostics);
        }

        let mut members = DiagnosticCollector::new();
        let mut seen = FxHashSet::default();
        let mut entity_set_ids = Vec::with_capacity(decl.entity_sets.len());
        for mut set in std::mem::take(&mut decl.entity_sets) {
            if !seen.insert(set.name.clone()) {
                members.duplicate_member(
                    "entity set",
                    &set.name,
                    &qualified_name,
                    set.location.clone(),
                );
            }
            let sid = EntitySetId::new(self.entity_sets.len());
            let inline = std::mem::take(&mut set.annotations);
            self.entity_sets.push(EntitySetData {
                container: id,
                decl: set,
                annotations: Vec::new(),
                entity_type: ResolutionCell::new(),
            });
            let annotations = self.add_annotations(
                schema,
                inline,
                Some(ElementKey::EntitySet(sid)),
                None,
                None,
            );
            self.entity_sets[sid.index()].annotations = annotations;
            entity_set_ids.push(sid);
        }

        let mut association_set_ids = Vec::with_capacity(decl.association_sets.len());
        for set in std::mem::take(&mut decl.association_sets) {
            if !seen.insert(set.name.clone()) {
                members.duplicate_member(
                    "association set",
                    &set.name,
                    &qualified_name,
                    set.location.clone(),
                );
            }
            association_set_ids.push(AssociationSetId::new(self.association_sets.len()));
            self.association_sets.push(AssociationSetData {
                container: id,
                decl: set,
                association: ResolutionCell::new(),
                end_sets: ResolutionCell::new(),
            });
        }

        let annotations = std::mem::take(&mut decl.annotations);
        self.containers.push(ContainerData {
            schema,
            qualified_name,
            decl,
            entity_sets: entity_set_ids,
            association_sets: association_set_ids,
            annotations: Vec::new(),
            member_errors: members.finish(),
            extends: ResolutionCell::new(),
        });
        let annotations = self.add_annotations(
            schema,
            annotations,
            Some(ElementKey::Container(id)),
            None,
            None,
        );
        self.containers[id.index()].annotations = annotations;
        id
    }

    fn add_annotations(
        &mut self,
        schema: SchemaId,
        decls: Vec<AnnotationDecl>,
        target: Option<ElementKey>,
        context: Option<TypeId>,
        block: Option<usize>,
    ) -> Vec<AnnotationId> {
        decls
            .into_iter()
            .map(|decl| {
                let id = AnnotationId::new(self.annotations.len());
                let (exprs, roots) = ExprNode::arena(&decl);
                self.annotations.push(AnnotationData {
                    schema,
                    decl,
                    target,
                    context,
                    block,
                    term: ResolutionCell::new(),
                    bindings: ResolutionCell::new(),
                    exprs,
                    roots,
                });
                id
            })
            .collect()
    }

    fn add_annotation_block(&mut self, schema: SchemaId, mut decl: AnnotationsDecl) {
        let annotations = std::mem::take(&mut decl.annotations);
        let target = self.resolve_target(schema, &decl.target);
        let mut errors = Vec::new();
        if target.is_none() {
            tracing::warn!(
                "[MODEL] annotation target '{}' could not be resolved; {} annotation(s) left unattached",
                decl.target,
                annotations.len()
            );
            errors.push(EdmError::new(
                EdmErrorCode::BadUnresolvedTarget,
                decl.location.clone(),
                format!("annotation target '{}' could not be found", decl.target),
            ));
        }

        let context = target.and_then(|key| match key {
            ElementKey::Type(id) if self.types[id.index()].kind != TypeKind::Enum => Some(id),
            ElementKey::Property(id) => Some(self.properties[id.index()].declaring),
            ElementKey::NavigationProperty(id) => {
                Some(self.navigation_properties[id.index()].declaring)
            }
            _ => None,
        });

        let block_index = self.schemas[schema.index()].blocks.len();
        let ids = self.add_annotations(schema, annotations, target, context, Some(block_index));
        if let Some(key) = target {
            self.attached.entry(key).or_default().extend(ids.iter().copied());
        }
        self.schemas[schema.index()].blocks.push(AnnotationBlock {
            decl,
            annotations: ids,
            errors,
        });
    }

    /// Resolve `NS.Item` or `NS.Item/Member` against local declarations.
    fn resolve_target(&self, schema: SchemaId, target: &str) -> Option<ElementKey> {
        let (head, member) = match target.split_once('/') {
            Some((head, member)) => (head, Some(member)),
            None => (target, None),
        };
        let qualified = self.index.expand_alias(schema, head);
        split_qualified(&qualified)?;

        if let Some(id) = self.index.lookup_type(&qualified).first() {
            let data = &self.types[id.index()];
            let Some(member) = member else {
                return Some(ElementKey::Type(id));
            };
            let property = data
                .properties
                .iter()
                .find(|p| self.properties[p.index()].decl.name == member)
                .map(|p| ElementKey::Property(*p));
            return property.or_else(|| {
                data.navigation_properties
                    .iter()
                    .find(|n| self.navigation_properties[n.index()].decl.name == member)
                    .map(|n| ElementKey::NavigationProperty(*n))
            });
        }
        if let Some(id) = self.index.lookup_container(&qualified).first() {
            let Some(member) = member else {
                return Some(ElementKey::Container(id));
            };
            return self.containers[id.index()]
                .entity_sets
                .iter()
                .find(|s| self.entity_sets[s.index()].decl.name == member)
                .map(|s| ElementKey::EntitySet(*s));
        }
        if member.is_some() {
            return None;
        }
        if let Some(id) = self.index.lookup_term(&qualified).first() {
            return Some(ElementKey::Term(id));
        }
        self.index
            .lookup_association(&qualified)
            .first()
            .map(ElementKey::Association)
    }

    /// Record the first labeled element of each name, per schema.
    fn index_labels(&mut self) {
        for (index, annotation) in self.annotations.iter().enumerate() {
            let labels = &mut self.schemas[annotation.schema.index()].labels;
            for (node, expr) in annotation.exprs.iter().enumerate() {
                if let ExprDeclKind::LabeledElement { name, .. } = &expr.decl.kind {
                    labels.entry(name.clone()).or_insert(LabelEntry {
                        annotation: AnnotationId::new(index),
                        node,
                    });
                }
            }
        }
    }
}
