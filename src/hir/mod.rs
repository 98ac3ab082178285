//! High-level IR (HIR): the resolved semantic model.
//!
//! This module turns declaration trees into a [`Model`] and answers every
//! semantic question about it lazily. Each resolved accessor is backed by a
//! [`ResolutionCell`]: computed on first use, memoized afterwards, and
//! guarded against re-entrant access, which is how cycles are detected.
//!
//! ## Key Types
//!
//! - [`Model`] / [`ModelBuilder`]: Arenas of declarations plus the symbol index
//! - [`SchemaType`], [`Property`], [`Term`], ...: Borrowed semantic views
//! - [`Element`]: A declared view or the [`Placeholder`] standing in for it
//! - [`Resolver`]: Qualified-name and alias resolution from one schema
//! - [`Expr`]: Context-bound semantic expressions
//! - [`ExpressionEvaluator`]: The external evaluation step
//! - [`validate`]: Walks the model and reports every diagnostic
//!
//! ## Resolution Layers
//!
//! ```text
//! SchemaDecl forest          ← INPUT: declaration trees
//!     │
//!     ▼
//! ModelBuilder::build        ← Arenas, symbol index, duplicates, annotation targets
//!     │
//!     ▼
//! element accessors          ← ResolutionCell per (element, accessor)
//!     │
//!     ▼
//! Resolver                   ← Local index, then referenced models
//!     │
//!     ▼
//! validate(model)            ← ValidationReport
//! ```

mod capabilities;
mod cell;
mod diagnostics;
mod elements;
mod emit;
mod eval;
mod expr;
mod ids;
mod index;
mod model;
mod placeholder;
mod primitives;
mod resolve;
mod types;
mod validate;

pub use capabilities::{Annotatable, Checkable, Named, PropertyLike, StructuredTypeLike};
pub use cell::{CellState, ResolutionCell};
pub use diagnostics::{DiagnosticCollector, EdmError, EdmErrorCode, Severity};
pub use elements::{
    AnnotatedElement, Annotation, AnnotationTerm, Association, AssociationElement, AssociationEnd,
    AssociationEndElement, AssociationSet, ConcurrencyMode, ContainerElement, Element,
    EntityContainer, EntitySet, EntitySetElement, EnumMember, EnumMemberElement,
    NavigationProperty, Property, PropertyElement, PropertyValueBinding, Schema, SchemaType,
    Term, TermElement, TypeElement, type_element_of,
};
pub use eval::{EvalError, EvalFunction, ExpressionEvaluator, StructuredValue, Value};
pub use expr::{ConstantExpr, Expr, ExprKind, PathExpr, RecordExpr};
pub use ids::{
    AnnotationId, AssociationId, AssociationSetId, ContainerId, EntitySetId, Handle,
    NavigationPropertyId, Origin, PropertyId, SchemaId, TermId, TypeId,
};
pub use index::{ResolveResult, SymbolIndex, SymbolKind};
pub use model::{Model, ModelBuilder, ModelOptions, TypeKind};
pub use placeholder::{Placeholder, PlaceholderKind};
pub use primitives::{EDM_NAMESPACE, PrimitiveKind, PrimitiveValue};
pub use resolve::Resolver;
pub use types::{TypeDef, TypeReference};
pub use validate::{ValidationReport, validate};
