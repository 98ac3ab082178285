//! Interchange formats for declaration trees.
//!
//! - **JSON**: lossless load/save of a [`SchemaDecl`] forest, so models can
//!   be rebuilt without a schema parser.
//! - **CSDL**: an XML writer producing EDMX documents.
//!
//! ```text
//! ┌──────────────┐   from_json / read_file   ┌──────────────────┐
//! │  JSON file   │ ────────────────────────▶ │  Vec<SchemaDecl> │ ──▶ Model::new
//! └──────────────┘ ◀──────────────────────── └──────────────────┘
//!                     to_json / write_file            │
//!                                                     ▼ CsdlWriter::write
//!                                              ┌──────────────┐
//!                                              │  EDMX / XML  │
//!                                              └──────────────┘
//! ```
//!
//! ## Usage
//!
//! ```ignore
//! use edm::interchange::{self, CsdlWriter};
//! use edm::hir::Model;
//!
//! let schemas = interchange::read_file("orders.json")?;
//! let xml = CsdlWriter::new().write(&schemas)?;
//! let model = Model::new(schemas);
//! ```
//!
//! [`SchemaDecl`]: crate::syntax::SchemaDecl

pub mod csdl;
mod error;
pub mod json;

pub use csdl::CsdlWriter;
pub use error::InterchangeError;
pub use json::{from_json, read_file, to_json, write_file};
