//! JSON load/save of declaration forests.
//!
//! The document is a small envelope around the serde form of
//! [`SchemaDecl`]:
//!
//! ```json
//! { "format_version": 1, "schemas": [ { "namespace": "NS", ... } ] }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use super::InterchangeError;
use crate::syntax::SchemaDecl;

/// Envelope version written by [`to_json`].
pub const FORMAT_VERSION: u32 = 1;

#[derive(Serialize)]
struct DocumentRef<'a> {
    format_version: u32,
    schemas: &'a [SchemaDecl],
}

#[derive(Deserialize)]
struct Document {
    format_version: u32,
    schemas: Vec<SchemaDecl>,
}

/// Serialize schemas as pretty-printed JSON.
pub fn to_json(schemas: &[SchemaDecl]) -> Result<String, InterchangeError> {
    let document = DocumentRef {
        format_version: FORMAT_VERSION,
        schemas,
    };
    serde_json::to_string_pretty(&document)
        .map_err(|e| InterchangeError::json(format!("Serialization error: {e}")))
}

/// Parse schemas written by [`to_json`].
pub fn from_json(input: &str) -> Result<Vec<SchemaDecl>, InterchangeError> {
    let document: Document = serde_json::from_str(input)
        .map_err(|e| InterchangeError::json(format!("Parse error: {e}")))?;
    if document.format_version != FORMAT_VERSION {
        return Err(InterchangeError::invalid_document(format!(
            "unsupported format version {} (expected {FORMAT_VERSION})",
            document.format_version
        )));
    }
    Ok(document.schemas)
}

pub fn write_file(path: impl AsRef<Path>, schemas: &[SchemaDecl]) -> Result<(), InterchangeError> {
    let path = path.as_ref();
    std::fs::write(path, to_json(schemas)?)?;
    tracing::debug!("[INTERCHANGE] wrote {} schema(s) to {}", schemas.len(), path.display());
    Ok(())
}

pub fn read_file(path: impl AsRef<Path>) -> Result<Vec<SchemaDecl>, InterchangeError> {
    let path = path.as_ref();
    let schemas = from_json(&std::fs::read_to_string(path)?)?;
    tracing::debug!("[INTERCHANGE] read {} schema(s) from {}", schemas.len(), path.display());
    Ok(schemas)
}
