//! # edm-base
//!
//! Core library for resolving EDM/CSDL schema declarations into a lazily
//! resolved, queryable semantic model.
//!
//! ## Module Structure (dependency order)
//!
//! ```text
//! interchange → JSON load/save, CSDL XML writer (feature "interchange")
//!   ↓
//! vocab       → Shared built-in vocabularies (Core)
//!   ↓
//! hir         → Semantic model: resolution cells, views, expressions, validation
//!   ↓
//! syntax      → Declaration trees and their builders
//!   ↓
//! base        → Primitives (Location, Span, Name, qualified-name helpers)
//! ```
//!
//! ## Example
//!
//! ```ignore
//! use edm::hir::{Model, Named, StructuredTypeLike, validate};
//! use edm::syntax::{PropertyDecl, SchemaDecl, StructuredTypeDecl};
//!
//! let model = Model::new([SchemaDecl::new("NS").with_complex_type(
//!     StructuredTypeDecl::new("Point").with_property(PropertyDecl::new("X", "Edm.Int32")),
//! )]);
//! let point = model.find_type("NS.Point");
//! assert_eq!(point.properties().len(), 1);
//! assert!(validate(&model).is_valid());
//! ```

// ============================================================================
// MODULES (dependency order: base → syntax → hir → vocab → interchange)
// ============================================================================

/// Foundation types: Location, Span, Name
pub mod base;

/// Declaration trees handed over by a schema parser
pub mod syntax;

/// High-level IR: the resolved semantic model
pub mod hir;

/// Built-in vocabularies
pub mod vocab;

/// Interchange formats: JSON, CSDL XML
#[cfg(feature = "interchange")]
pub mod interchange;

// Re-export foundation types
pub use base::{Location, Name, Position, Span};

// Re-export the entry points
pub use hir::{EdmError, EdmErrorCode, Model, ModelBuilder, ModelOptions, ValidationReport, validate};
pub use syntax::SchemaDecl;
