//! Foundation types for the EDM toolchain.
//!
//! This module provides fundamental types used throughout the crate:
//! - [`Position`], [`Span`] - Line/column positions for declaration nodes
//! - [`Location`] - A span inside a named schema document
//! - [`Name`] - Cheap-to-clone element names
//! - Qualified-name helpers and identifier validation
//!
//! This module has NO dependencies on other edm modules.

mod location;
mod name;
mod position;

pub use location::Location;
pub use name::{Name, is_valid_identifier, qualify, split_qualified};
pub use position::{Position, Span};
