//! Semantic expressions.
//!
//! An [`Expr`] is a view of one node in an annotation's expression arena.
//! Paths bind against the annotation's structural type. Nothing is resolved
//! up front: the first [`Expr::kind`] resolves the names the node mentions
//! into the node's cell, and children are again unresolved `Expr`s. A broken
//! child never affects its siblings.
//!
//! Path expressions are not checked by [`Expr::errors`]; their failures only
//! surface through [`PathExpr::referenced_property`] or evaluation. Path
//! targets have their own cell, filled on the first such call.

use std::fmt;
use std::sync::Arc;

use crate::base::{Location, Name};
use crate::syntax::{ConstantKind, ExprDecl, ExprDeclKind};

use super::capabilities::{Named, PropertyLike, StructuredTypeLike};
use super::diagnostics::{EdmError, EdmErrorCode};
use super::elements::{
    Element, EnumMember, EnumMemberElement, Property, PropertyElement, SchemaType, TypeElement,
    element, type_element_of,
};
use super::ids::{AnnotationId, Handle, PropertyId, SchemaId, TypeId};
use super::model::{AnnotationData, ExprNode, LabelEntry, Model, NodeRefs, Target, TypeKind};
use super::placeholder::{Placeholder, PlaceholderKind};
use super::primitives::{PrimitiveKind, PrimitiveValue};
use super::resolve::Resolver;
use super::types::TypeReference;

/// A lazily resolved expression node.
#[derive(Clone, Copy)]
pub struct Expr<'m> {
    model: &'m Model,
    annotation: AnnotationId,
    node: usize,
}

/// Typed view of one expression node.
#[derive(Clone, Debug)]
pub enum ExprKind<'m> {
    Constant(ConstantExpr),
    Null,
    Path(PathExpr<'m>),
    /// One member, or several for a flags combination.
    EnumMember(Vec<EnumMemberElement<'m>>),
    If {
        test: Expr<'m>,
        if_true: Expr<'m>,
        if_false: Expr<'m>,
    },
    Cast {
        type_ref: TypeReference,
        operand: Expr<'m>,
    },
    IsType {
        type_ref: TypeReference,
        operand: Expr<'m>,
    },
    Record(RecordExpr<'m>),
    Collection {
        type_ref: Option<TypeReference>,
        elements: Vec<Expr<'m>>,
    },
    Apply {
        function: Name,
        arguments: Vec<Expr<'m>>,
    },
    LabeledElement {
        name: Name,
        operand: Expr<'m>,
    },
    /// The labeled element the reference points at.
    LabeledElementReference(Element<Expr<'m>>),
    /// Wrong operand count for the node's form.
    Bad(Arc<Placeholder>),
}

impl<'m> Expr<'m> {
    pub(crate) fn new(model: &'m Model, annotation: AnnotationId, node: usize) -> Self {
        Self {
            model,
            annotation,
            node,
        }
    }

    fn owner(&self) -> &'m AnnotationData {
        self.model.annotation_data(self.annotation)
    }

    fn data(&self) -> &'m ExprNode {
        &self.owner().exprs[self.node]
    }

    fn children(&self) -> impl Iterator<Item = Expr<'m>> + '_ {
        self.data()
            .children
            .iter()
            .map(|node| Self::new(self.model, self.annotation, *node))
    }

    pub fn model(&self) -> &'m Model {
        self.model
    }

    pub fn decl(&self) -> &'m ExprDecl {
        &self.data().decl
    }

    pub fn location(&self) -> &'m Location {
        &self.decl().location
    }

    /// The structural type paths resolve against.
    pub fn context(&self) -> Option<SchemaType<'m>> {
        self.owner().context.map(|id| SchemaType::new(self.model, id))
    }

    fn schema(&self) -> SchemaId {
        self.owner().schema
    }

    fn resolver(&self) -> Resolver<'m> {
        Resolver::new(self.model, self.schema())
    }

    /// Exactly `N` operands, or `None` when the count is wrong.
    fn operands<const N: usize>(&self) -> Option<[Expr<'m>; N]> {
        let children = &self.data().children;
        if children.len() != N {
            return None;
        }
        Some(std::array::from_fn(|i| {
            Self::new(self.model, self.annotation, children[i])
        }))
    }

    fn refs(&self) -> NodeRefs {
        self.data()
            .refs
            .get_or_compute(|| self.compute_refs(), || NodeRefs::None)
    }

    fn compute_refs(&self) -> NodeRefs {
        let decl = self.decl();
        let arity = match &decl.kind {
            ExprDeclKind::If(_) => Some(("If", 3)),
            ExprDeclKind::Cast { .. } => Some(("Cast", 1)),
            ExprDeclKind::IsType { .. } => Some(("IsType", 1)),
            ExprDeclKind::LabeledElement { .. } => Some(("LabeledElement", 1)),
            _ => None,
        };
        if let Some((form, expected)) = arity {
            let found = self.data().children.len();
            if found != expected {
                let error = EdmError::new(
                    EdmErrorCode::MalformedExpression,
                    self.location().clone(),
                    format!("{form} expression expects {expected} operand(s), found {found}"),
                );
                return NodeRefs::Malformed(Placeholder::bad(form, error));
            }
        }

        match &decl.kind {
            ExprDeclKind::Cast { type_ref, .. } | ExprDeclKind::IsType { type_ref, .. } => {
                NodeRefs::Type(self.type_reference(type_ref))
            }
            ExprDeclKind::Collection { type_ref, .. } => {
                NodeRefs::Collection(type_ref.as_ref().map(|t| self.type_reference(t)))
            }
            ExprDeclKind::Record {
                type_ref,
                properties,
            } => {
                let type_ref = type_ref.as_ref().map(|t| self.type_reference(t));
                let declared = type_ref
                    .as_ref()
                    .and_then(|t| type_element_of(self.model, t));
                let fields = properties
                    .iter()
                    .map(|field| {
                        let found = declared
                            .as_ref()
                            .and_then(|ty| ty.find_property(&field.property))
                            .and_then(|p| self.model.handle_for(p.model(), p.id()));
                        match found {
                            Some(handle) => Target::Declared(handle),
                            None => Target::Placeholder(Placeholder::with_message(
                                PlaceholderKind::UnresolvedProperty,
                                field.property.clone(),
                                field.location.clone(),
                                match &declared {
                                    Some(ty) => format!(
                                        "property '{}' could not be found on type '{}'",
                                        field.property,
                                        ty.qualified_name()
                                    ),
                                    None => format!(
                                        "property '{}' could not be found: the record has no declared type",
                                        field.property
                                    ),
                                },
                            )),
                        }
                    })
                    .collect();
                NodeRefs::Record { type_ref, fields }
            }
            ExprDeclKind::EnumMember(path) => NodeRefs::EnumMembers(
                path.split_whitespace()
                    .map(|member| self.resolve_enum_member(member))
                    .collect(),
            ),
            ExprDeclKind::LabeledElementReference(name) => NodeRefs::Label(self.resolve_label(name)),
            _ => NodeRefs::None,
        }
    }

    pub fn kind(&self) -> ExprKind<'m> {
        match (&self.decl().kind, self.refs()) {
            (_, NodeRefs::Malformed(placeholder)) => ExprKind::Bad(placeholder),
            (ExprDeclKind::Constant { kind, text }, _) => {
                ExprKind::Constant(ConstantExpr::new(*kind, text, self.location()))
            }
            (ExprDeclKind::Null, _) => ExprKind::Null,
            (ExprDeclKind::Path(segments), _) => ExprKind::Path(PathExpr {
                expr: *self,
                segments: segments.clone(),
            }),
            (ExprDeclKind::EnumMember(_), NodeRefs::EnumMembers(members)) => ExprKind::EnumMember(
                members
                    .iter()
                    .map(|target| match target {
                        Target::Declared((handle, index)) => Element::Declared(EnumMember::at(
                            SchemaType::new(self.model.locate(handle.origin), handle.id),
                            *index,
                        )),
                        Target::Placeholder(p) => Element::Placeholder(p.clone()),
                    })
                    .collect(),
            ),
            (ExprDeclKind::If(_), _) => match self.operands::<3>() {
                Some([test, if_true, if_false]) => ExprKind::If {
                    test,
                    if_true,
                    if_false,
                },
                None => self.unresolvable(),
            },
            (ExprDeclKind::Cast { .. }, NodeRefs::Type(type_ref)) => match self.operands::<1>() {
                Some([operand]) => ExprKind::Cast { type_ref, operand },
                None => self.unresolvable(),
            },
            (ExprDeclKind::IsType { .. }, NodeRefs::Type(type_ref)) => {
                match self.operands::<1>() {
                    Some([operand]) => ExprKind::IsType { type_ref, operand },
                    None => self.unresolvable(),
                }
            }
            (ExprDeclKind::Record { properties, .. }, NodeRefs::Record { type_ref, fields }) => {
                ExprKind::Record(RecordExpr {
                    type_ref,
                    fields: properties
                        .iter()
                        .map(|p| p.property.clone())
                        .zip(self.children())
                        .collect(),
                    targets: fields,
                    model: self.model,
                })
            }
            (ExprDeclKind::Collection { .. }, NodeRefs::Collection(type_ref)) => {
                ExprKind::Collection {
                    type_ref,
                    elements: self.children().collect(),
                }
            }
            (ExprDeclKind::Apply { function, .. }, _) => ExprKind::Apply {
                function: self.resolver().normalize(function),
                arguments: self.children().collect(),
            },
            (ExprDeclKind::LabeledElement { name, .. }, _) => match self.operands::<1>() {
                Some([operand]) => ExprKind::LabeledElement {
                    name: name.clone(),
                    operand,
                },
                None => self.unresolvable(),
            },
            (ExprDeclKind::LabeledElementReference(_), NodeRefs::Label(target)) => {
                ExprKind::LabeledElementReference(match target {
                    Target::Declared(entry) => {
                        Element::Declared(Self::new(self.model, entry.annotation, entry.node))
                    }
                    Target::Placeholder(p) => Element::Placeholder(p),
                })
            }
            (_, _) => self.unresolvable(),
        }
    }

    /// The node's cell was read while it was still being computed.
    fn unresolvable(&self) -> ExprKind<'m> {
        let error = EdmError::new(
            EdmErrorCode::MalformedExpression,
            self.location().clone(),
            "expression could not be resolved",
        );
        ExprKind::Bad(Placeholder::bad("expression", error))
    }

    fn type_reference(&self, raw: &str) -> TypeReference {
        self.resolver()
            .resolve_type_reference(raw, true, self.location())
    }

    /// `NS.Enum/Member`
    fn resolve_enum_member(&self, path: &str) -> Target<(Handle<TypeId>, usize)> {
        let unresolved = || {
            Target::Placeholder(Placeholder::unresolved(
                PlaceholderKind::UnresolvedEnumMember,
                path,
                self.location().clone(),
            ))
        };
        let Some((type_name, member)) = path.split_once('/') else {
            return unresolved();
        };
        let Some(handle) = self.resolver().type_handle(type_name) else {
            return unresolved();
        };
        let ty = SchemaType::new(self.model.locate(handle.origin), handle.id);
        if ty.kind() != TypeKind::Enum {
            return unresolved();
        }
        match ty.members().iter().position(|m| m.name() == member) {
            Some(index) => Target::Declared((handle, index)),
            None => unresolved(),
        }
    }

    /// First labeled element of that name in this schema.
    fn resolve_label(&self, name: &Name) -> Target<LabelEntry> {
        match self.model.schema_data(self.schema()).labels.get(name) {
            Some(entry) => Target::Declared(*entry),
            None => Target::Placeholder(Placeholder::unresolved(
                PlaceholderKind::UnresolvedLabeledElement,
                name.clone(),
                self.location().clone(),
            )),
        }
    }

    /// Structural diagnostics of this node and its children. Paths are
    /// only checked when evaluated.
    pub fn errors(&self) -> Vec<EdmError> {
        let mut errors = Vec::new();
        self.collect_errors(&mut errors);
        errors
    }

    fn collect_errors(&self, errors: &mut Vec<EdmError>) {
        match self.kind() {
            ExprKind::Constant(constant) => {
                if let Err(error) = constant.value {
                    errors.push(error);
                }
            }
            ExprKind::Null | ExprKind::Path(_) => {}
            ExprKind::EnumMember(members) => {
                for member in members {
                    if let Element::Placeholder(p) = member {
                        errors.extend(p.errors.iter().cloned());
                    }
                }
            }
            ExprKind::If {
                test,
                if_true,
                if_false,
            } => {
                test.collect_errors(errors);
                if_true.collect_errors(errors);
                if_false.collect_errors(errors);
            }
            ExprKind::Cast { type_ref, operand } | ExprKind::IsType { type_ref, operand } => {
                errors.extend(type_ref.errors());
                operand.collect_errors(errors);
            }
            ExprKind::Record(record) => {
                if let Some(type_ref) = &record.type_ref {
                    errors.extend(type_ref.errors());
                }
                for (_, value) in &record.fields {
                    value.collect_errors(errors);
                }
            }
            ExprKind::Collection { type_ref, elements } => {
                if let Some(type_ref) = type_ref {
                    errors.extend(type_ref.errors());
                }
                for element in &elements {
                    element.collect_errors(errors);
                }
            }
            ExprKind::Apply { arguments, .. } => {
                for argument in &arguments {
                    argument.collect_errors(errors);
                }
            }
            ExprKind::LabeledElement { operand, .. } => operand.collect_errors(errors),
            ExprKind::LabeledElementReference(target) => {
                if let Element::Placeholder(p) = target {
                    errors.extend(p.errors.iter().cloned());
                }
            }
            ExprKind::Bad(p) => errors.extend(p.errors.iter().cloned()),
        }
    }
}

impl PartialEq for Expr<'_> {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.model, other.model)
            && self.annotation == other.annotation
            && self.node == other.node
    }
}

impl fmt::Debug for Expr<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Expr")
            .field("annotation", &self.annotation.index())
            .field("node", &self.node)
            .field("decl", &self.decl().kind)
            .finish()
    }
}

// ============================================================================
// NODE VIEWS
// ============================================================================

/// A constant literal with its parsed value.
#[derive(Clone, Debug, PartialEq)]
pub struct ConstantExpr {
    pub kind: ConstantKind,
    pub text: String,
    pub value: Result<PrimitiveValue, EdmError>,
}

impl ConstantExpr {
    fn new(kind: ConstantKind, text: &str, location: &Location) -> Self {
        let value = PrimitiveKind::for_constant(kind)
            .parse_literal(text)
            .map_err(|message| {
                EdmError::new(EdmErrorCode::InvalidConstant, location.clone(), message)
            });
        Self {
            kind,
            text: text.to_string(),
            value,
        }
    }
}

/// A property path, resolved on request against the binding context.
#[derive(Clone, Debug)]
pub struct PathExpr<'m> {
    expr: Expr<'m>,
    segments: Vec<Name>,
}

impl<'m> PathExpr<'m> {
    pub fn segments(&self) -> &[Name] {
        &self.segments
    }

    /// The property the last segment names. Intermediate segments may be
    /// complex-typed or navigation properties.
    pub fn referenced_property(&self) -> PropertyElement<'m> {
        let target = self.expr.data().path.get_or_compute(
            || self.resolve(),
            || {
                Target::Placeholder(Placeholder::unresolved(
                    PlaceholderKind::UnresolvedProperty,
                    self.segments.join("/"),
                    self.expr.location().clone(),
                ))
            },
        );
        element(self.expr.model, target, Property::new)
    }

    fn resolve(&self) -> Target<Handle<PropertyId>> {
        let model = self.expr.model;
        let location = self.expr.location();
        let path = self.segments.join("/");
        let unresolved = |message: String| {
            Target::Placeholder(Placeholder::with_message(
                PlaceholderKind::UnresolvedProperty,
                path.as_str(),
                location.clone(),
                message,
            ))
        };

        let Some((last, intermediate)) = self.segments.split_last() else {
            return unresolved("empty property path".to_string());
        };
        let Some(mut current) = self.expr.context() else {
            return unresolved(format!(
                "property '{last}' could not be found: the expression has no binding context"
            ));
        };

        for segment in intermediate {
            let next = match current.find_property(segment) {
                Some(property) => Some(property.type_element().ok_or(())),
                None => current
                    .find_navigation_property(segment)
                    .map(|navigation| Ok(navigation.target_type())),
            };
            current = match next {
                Some(Ok(Element::Declared(ty))) => ty,
                Some(Ok(Element::Placeholder(p))) => return Target::Placeholder(p),
                Some(Err(_)) => {
                    return unresolved(format!(
                        "property '{}' of type '{}' is primitive and has no properties",
                        segment,
                        current.qualified_name()
                    ));
                }
                None => {
                    return unresolved(format!(
                        "property '{}' could not be found on type '{}'",
                        segment,
                        current.qualified_name()
                    ));
                }
            };
        }

        let found = current
            .find_property(last)
            .and_then(|property| model.handle_for(property.model(), property.id()));
        match found {
            Some(handle) => Target::Declared(handle),
            None => unresolved(format!(
                "property '{}' could not be found on type '{}'",
                last,
                current.qualified_name()
            )),
        }
    }

    /// Type of the referenced property.
    pub fn type_ref(&self) -> TypeReference {
        self.referenced_property().type_ref()
    }
}

/// A record constructor.
#[derive(Clone, Debug)]
pub struct RecordExpr<'m> {
    pub type_ref: Option<TypeReference>,
    pub fields: Vec<(Name, Expr<'m>)>,
    /// Property each field assigns, aligned with `fields`.
    targets: Arc<[Target<Handle<PropertyId>>]>,
    model: &'m Model,
}

impl<'m> RecordExpr<'m> {
    /// The declared record type, when one is given.
    pub fn declared_type(&self) -> Option<TypeElement<'m>> {
        self.type_ref
            .as_ref()
            .and_then(|t| type_element_of(self.model, t))
    }

    pub fn field(&self, name: &str) -> Option<&Expr<'m>> {
        self.fields
            .iter()
            .find(|(field, _)| field == name)
            .map(|(_, value)| value)
    }

    /// The declared-type property a field assigns; `None` when the record
    /// has no such field.
    pub fn field_property(&self, name: &str) -> Option<PropertyElement<'m>> {
        let index = self.fields.iter().position(|(field, _)| field == name)?;
        let target = self.targets.get(index)?.clone();
        Some(element(self.model, target, Property::new))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hir::{Annotatable, ModelOptions};
    use crate::syntax::{
        AnnotationDecl, EnumTypeDecl, PropertyDecl, PropertyValueDecl, SchemaDecl,
        StructuredTypeDecl,
    };

    fn options() -> ModelOptions {
        ModelOptions {
            include_core_vocabulary: false,
            ..ModelOptions::default()
        }
    }

    fn model_with(annotation: AnnotationDecl) -> Model {
        let schema = SchemaDecl::new("NS")
            .with_enum_type(
                EnumTypeDecl::new("Color")
                    .with_member("Red", None)
                    .with_member("Green", None),
            )
            .with_complex_type(
                StructuredTypeDecl::new("Address").with_property(PropertyDecl::new("City", "Edm.String")),
            )
            .with_entity_type(
                StructuredTypeDecl::new("Customer")
                    .with_key("Id")
                    .with_property(PropertyDecl::new("Id", "Edm.Int32").with_nullable(false))
                    .with_property(PropertyDecl::new("Home", "NS.Address"))
                    .with_annotation(annotation),
            );
        Model::builder().with_options(options()).with_schema(schema).build()
    }

    fn value_of(model: &Model) -> Expr<'_> {
        let customer = model.find_type("NS.Customer").into_declared().unwrap();
        let annotation = customer
            .annotations()
            .into_iter()
            .next()
            .unwrap();
        annotation.value().unwrap()
    }

    #[test]
    fn test_if_requires_three_operands() {
        let decl = ExprDecl::new(ExprDeclKind::If(vec![Arc::new(ExprDecl::bool(true))]));
        let model = model_with(AnnotationDecl::value("NS.Tag", decl));
        let expr = value_of(&model);

        let ExprKind::Bad(placeholder) = expr.kind() else {
            panic!("expected a malformed expression");
        };
        assert_eq!(placeholder.errors[0].code, EdmErrorCode::MalformedExpression);
        assert_eq!(expr.errors().len(), 1);
    }

    #[test]
    fn test_path_resolves_through_complex_property() {
        let model = model_with(AnnotationDecl::value("NS.Tag", ExprDecl::path("Home/City")));
        let ExprKind::Path(path) = value_of(&model).kind() else {
            panic!("expected a path");
        };
        let property = path.referenced_property().into_declared().unwrap();
        assert_eq!(property.name(), "City");
        assert_eq!(property.declaring().qualified_name(), "NS.Address");
    }

    #[test]
    fn test_unresolved_path_is_not_a_structural_error() {
        let model = model_with(AnnotationDecl::value("NS.Tag", ExprDecl::path("Missing")));
        let expr = value_of(&model);
        assert!(expr.errors().is_empty());

        let ExprKind::Path(path) = expr.kind() else {
            panic!("expected a path");
        };
        let placeholder = path.referenced_property();
        let message = &placeholder.placeholder().unwrap().errors[0].message;
        assert!(message.contains("Missing"));
        assert!(message.contains("NS.Customer"));
    }

    #[test]
    fn test_resolve_all_warms_expression_cells() {
        let model = model_with(AnnotationDecl::value("NS.Tag", ExprDecl::path("Home/City")));
        let node = &model.annotation_data(AnnotationId::new(0)).exprs[0];
        assert!(!node.path.is_resolved());

        model.resolve_all();
        assert!(node.refs.is_resolved());
        assert!(node.path.is_resolved());
    }

    #[test]
    fn test_enum_member_and_bad_constant() {
        let decl = ExprDecl::collection(vec![
            ExprDecl::enum_member("NS.Color/Green"),
            ExprDecl::enum_member("NS.Color/Blue"),
            ExprDecl::constant(ConstantKind::Int, "twelve"),
        ]);
        let model = model_with(AnnotationDecl::value("NS.Tag", decl));
        let errors = value_of(&model).errors();

        let codes: Vec<_> = errors.iter().map(|e| e.code).collect();
        assert_eq!(
            codes,
            vec![EdmErrorCode::BadUnresolvedEnumMember, EdmErrorCode::InvalidConstant]
        );
    }

    #[test]
    fn test_record_fields_resolve_independently() {
        let decl = ExprDecl::record(
            Some("NS.Address"),
            vec![
                PropertyValueDecl::new("City", ExprDecl::string("Oslo")),
                PropertyValueDecl::new("Zip", ExprDecl::string("0150")),
            ],
        );
        let model = model_with(AnnotationDecl::value("NS.Tag", decl));
        let ExprKind::Record(record) = value_of(&model).kind() else {
            panic!("expected a record");
        };
        assert!(!record.field_property("City").unwrap().is_placeholder());
        let zip = record.field_property("Zip").unwrap();
        let message = &zip.placeholder().unwrap().errors[0].message;
        assert!(message.contains("NS.Address"), "{message}");
        assert!(record.field("Zip").is_some());
        assert!(record.field_property("Street").is_none());
    }
}
