//! Syntax: the Declaration Tree.
//!
//! These are the raw, immutable nodes produced by a schema parser. They
//! carry only syntactic data: declared names, raw type-reference strings,
//! nested declaration lists and source locations. Nothing here is resolved;
//! turning declarations into a queryable graph is the job of [`crate::hir`].
//!
//! ```text
//! SchemaDecl
//! ├── items: SchemaItemDecl*      (types, associations, terms, containers)
//! │     └── annotations: AnnotationDecl*   (inline)
//! └── annotations: AnnotationsDecl*        (out-of-line, by target path)
//!           └── AnnotationDecl → ExprDecl tree
//! ```
//!
//! Every node has a small builder surface (`new` + `with_*`) so parsers and
//! tests can assemble trees without spelling out every field.

mod decl;
mod expr;

pub use decl::{
    AnnotationDecl, AnnotationsDecl, AssociationDecl, AssociationEndDecl, AssociationSetDecl,
    AssociationSetEndDecl, ContainerDecl, EntitySetDecl, EnumMemberDecl, EnumTypeDecl,
    Multiplicity, NavigationPropertyDecl, PropertyDecl, SchemaDecl, SchemaItemDecl,
    StructuredTypeDecl, TermDecl, UsingDecl,
};
pub use expr::{ConstantKind, ExprDecl, ExprDeclKind, PropertyValueDecl};

pub use crate::base::{Location, Position, Span};
