//! Diagnostics: semantic error reporting.
//!
//! Resolution never fails outright. Every problem becomes an [`EdmError`]
//! attached to the placeholder or element it concerns, and the validation
//! walk gathers them into one report.

use std::fmt;

use crate::base::Location;

// ============================================================================
// SEVERITY
// ============================================================================

/// Severity level of a diagnostic.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Severity {
    Error,
    Warning,
}

// ============================================================================
// ERROR CODES
// ============================================================================

/// Error codes for semantic diagnostics.
///
/// Codes follow the pattern E{category}{number}:
/// - E10xx: reference errors (a name does not resolve)
/// - E11xx: declaration errors (duplicates, cycles, bad shapes)
/// - E12xx: expression and literal errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EdmErrorCode {
    // =========================================================================
    // E10xx: Reference errors
    // =========================================================================
    /// Type name does not resolve
    BadUnresolvedType,
    /// Term name does not resolve
    BadUnresolvedTerm,
    /// Property name does not resolve against its structural scope
    BadUnresolvedProperty,
    /// Entity container name does not resolve
    BadUnresolvedEntityContainer,
    /// Entity set name does not resolve within its container
    BadUnresolvedEntitySet,
    /// Association name does not resolve
    BadUnresolvedAssociation,
    /// Navigation or association-set role does not match an association end
    BadUnresolvedNavigationRole,
    /// `Type/Member` does not name an enum member
    BadUnresolvedEnumMember,
    /// Labeled element reference has no matching label
    BadUnresolvedLabeledElement,
    /// Out-of-line annotation target does not resolve
    BadUnresolvedTarget,

    // =========================================================================
    // E11xx: Declaration errors
    // =========================================================================
    /// Qualified name declared more than once in the same kind-space
    DuplicateDeclaration,
    /// Member name declared more than once within one element
    DuplicateMember,
    /// Declared name is not a valid identifier
    InvalidName,
    /// Complex type contains itself by value, or has a cyclic base
    BadCyclicComplex,
    /// Entity type has a cyclic base
    BadCyclicEntity,
    /// Base type is of the wrong kind
    BadBaseType,
    /// Type reference is malformed or names the wrong kind of type
    BadTypeReference,

    // =========================================================================
    // E12xx: Expression errors
    // =========================================================================
    /// Wrong operand arity or shape for an expression
    MalformedExpression,
    /// Constant literal does not parse as its kind
    InvalidConstant,
    /// Default value does not parse as the declared type
    InvalidDefaultValue,
}

impl EdmErrorCode {
    /// Get the string representation of the error code (e.g., "E1104")
    pub fn as_str(&self) -> &'static str {
        match self {
            // Reference
            Self::BadUnresolvedType => "E1001",
            Self::BadUnresolvedTerm => "E1002",
            Self::BadUnresolvedProperty => "E1003",
            Self::BadUnresolvedEntityContainer => "E1004",
            Self::BadUnresolvedEntitySet => "E1005",
            Self::BadUnresolvedAssociation => "E1006",
            Self::BadUnresolvedNavigationRole => "E1007",
            Self::BadUnresolvedEnumMember => "E1008",
            Self::BadUnresolvedLabeledElement => "E1009",
            Self::BadUnresolvedTarget => "E1010",
            // Declaration
            Self::DuplicateDeclaration => "E1101",
            Self::DuplicateMember => "E1102",
            Self::InvalidName => "E1103",
            Self::BadCyclicComplex => "E1104",
            Self::BadCyclicEntity => "E1105",
            Self::BadBaseType => "E1106",
            Self::BadTypeReference => "E1107",
            // Expression
            Self::MalformedExpression => "E1201",
            Self::InvalidConstant => "E1202",
            Self::InvalidDefaultValue => "E1203",
        }
    }

    /// Get a short description of the error category
    pub fn category_description(&self) -> &'static str {
        match self {
            Self::BadUnresolvedType
            | Self::BadUnresolvedTerm
            | Self::BadUnresolvedProperty
            | Self::BadUnresolvedEntityContainer
            | Self::BadUnresolvedEntitySet
            | Self::BadUnresolvedAssociation
            | Self::BadUnresolvedNavigationRole
            | Self::BadUnresolvedEnumMember
            | Self::BadUnresolvedLabeledElement
            | Self::BadUnresolvedTarget => "reference error",
            Self::DuplicateDeclaration
            | Self::DuplicateMember
            | Self::InvalidName
            | Self::BadCyclicComplex
            | Self::BadCyclicEntity
            | Self::BadBaseType
            | Self::BadTypeReference => "declaration error",
            Self::MalformedExpression | Self::InvalidConstant | Self::InvalidDefaultValue => {
                "expression error"
            }
        }
    }

    /// Get the default message template for this error code
    pub fn default_message(&self) -> &'static str {
        match self {
            Self::BadUnresolvedType => "type not found",
            Self::BadUnresolvedTerm => "term not found",
            Self::BadUnresolvedProperty => "property not found",
            Self::BadUnresolvedEntityContainer => "entity container not found",
            Self::BadUnresolvedEntitySet => "entity set not found",
            Self::BadUnresolvedAssociation => "association not found",
            Self::BadUnresolvedNavigationRole => "association role not found",
            Self::BadUnresolvedEnumMember => "enum member not found",
            Self::BadUnresolvedLabeledElement => "labeled element not found",
            Self::BadUnresolvedTarget => "annotation target not found",
            Self::DuplicateDeclaration => "duplicate declaration",
            Self::DuplicateMember => "duplicate member",
            Self::InvalidName => "invalid name",
            Self::BadCyclicComplex => "cyclic complex type",
            Self::BadCyclicEntity => "cyclic entity type",
            Self::BadBaseType => "invalid base type",
            Self::BadTypeReference => "invalid type reference",
            Self::MalformedExpression => "malformed expression",
            Self::InvalidConstant => "invalid constant",
            Self::InvalidDefaultValue => "invalid default value",
        }
    }
}

impl fmt::Display for EdmErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// EDM ERROR
// ============================================================================

/// A diagnostic record attached to a failed resolution.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct EdmError {
    pub location: Location,
    pub code: EdmErrorCode,
    pub message: String,
    pub severity: Severity,
}

impl EdmError {
    /// Create a new error diagnostic.
    pub fn new(code: EdmErrorCode, location: Location, message: impl Into<String>) -> Self {
        Self {
            location,
            code,
            message: message.into(),
            severity: Severity::Error,
        }
    }

    /// Create an error using the code's default message.
    pub fn from_code(code: EdmErrorCode, location: Location) -> Self {
        Self::new(code, location, code.default_message())
    }

    /// Downgrade to a warning.
    pub fn as_warning(mut self) -> Self {
        self.severity = Severity::Warning;
        self
    }
}

impl fmt::Display for EdmError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: [{}] {}", self.location, self.code, self.message)
    }
}

// ============================================================================
// DIAGNOSTIC COLLECTOR
// ============================================================================

/// Collects diagnostics during model construction and validation.
#[derive(Clone, Debug, Default)]
pub struct DiagnosticCollector {
    errors: Vec<EdmError>,
}

impl DiagnosticCollector {
    /// Create a new empty collector.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a diagnostic.
    pub fn add(&mut self, error: EdmError) {
        self.errors.push(error);
    }

    /// Add every diagnostic from an iterator.
    pub fn extend(&mut self, errors: impl IntoIterator<Item = EdmError>) {
        self.errors.extend(errors);
    }

    /// Add a duplicate declaration error.
    pub fn duplicate_declaration(&mut self, kind: &str, qualified_name: &str, location: Location) {
        self.add(EdmError::new(
            EdmErrorCode::DuplicateDeclaration,
            location,
            format!("duplicate {kind} declaration: '{qualified_name}' is already defined"),
        ));
    }

    /// Add a duplicate member error.
    pub fn duplicate_member(&mut self, kind: &str, name: &str, owner: &str, location: Location) {
        self.add(EdmError::new(
            EdmErrorCode::DuplicateMember,
            location,
            format!("duplicate {kind} '{name}' in '{owner}'"),
        ));
    }

    /// Get all diagnostics.
    pub fn errors(&self) -> &[EdmError] {
        &self.errors
    }

    /// Get the number of errors.
    pub fn error_count(&self) -> usize {
        self.errors
            .iter()
            .filter(|e| e.severity == Severity::Error)
            .count()
    }

    /// Check if there are any errors.
    pub fn has_errors(&self) -> bool {
        self.error_count() > 0
    }

    /// Take ownership of the collected diagnostics.
    pub fn finish(self) -> Vec<EdmError> {
        self.errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_table() {
        assert_eq!(EdmErrorCode::BadCyclicComplex.as_str(), "E1104");
        assert_eq!(
            EdmErrorCode::BadUnresolvedProperty.category_description(),
            "reference error"
        );
        assert_eq!(
            EdmErrorCode::InvalidDefaultValue.category_description(),
            "expression error"
        );
    }

    #[test]
    fn test_error_display() {
        let error = EdmError::from_code(EdmErrorCode::InvalidName, Location::at("a.csdl", 0, 4));
        assert_eq!(error.to_string(), "a.csdl:1:5: [E1103] invalid name");
    }

    #[test]
    fn test_collector_counts_errors_only() {
        let mut collector = DiagnosticCollector::new();
        collector.duplicate_declaration("type", "NS.Widget", Location::default());
        collector.add(EdmError::from_code(EdmErrorCode::InvalidName, Location::default()).as_warning());

        assert_eq!(collector.error_count(), 1);
        assert!(collector.has_errors());
        assert!(collector.errors()[0].message.contains("NS.Widget"));
        assert_eq!(collector.finish().len(), 2);
    }
}
