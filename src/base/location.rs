//! Source locations attached to declarations and diagnostics.

use std::fmt;

use smol_str::SmolStr;

use super::position::Span;

/// Where a declaration lives: the schema document it came from plus a span.
///
/// Elements synthesized during resolution (placeholders for missing
/// references, for instance) borrow the location of the reference that
/// produced them. [`Location::default`] is used when nothing better exists.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "interchange", derive(serde::Serialize, serde::Deserialize))]
pub struct Location {
    /// Document name as handed over by the parser (usually a file path).
    pub document: SmolStr,
    pub span: Span,
}

impl Location {
    pub fn new(document: impl Into<SmolStr>, span: Span) -> Self {
        Self {
            document: document.into(),
            span,
        }
    }

    /// Location at a single line/column of a document.
    pub fn at(document: impl Into<SmolStr>, line: usize, column: usize) -> Self {
        Self::new(document, Span::point(line, column))
    }

    /// True for locations that carry no document information.
    pub fn is_unknown(&self) -> bool {
        self.document.is_empty() && self.span == Span::default()
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_unknown() {
            return f.write_str("<unknown>");
        }
        write!(f, "{}:{}", self.document, self.span.start)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_location_display() {
        let loc = Location::at("schema.csdl", 4, 2);
        assert_eq!(loc.to_string(), "schema.csdl:5:3");
        assert_eq!(Location::default().to_string(), "<unknown>");
    }
}
