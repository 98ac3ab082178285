//! Raw expression declarations.
//!
//! Operand lists are kept as plain lists even for fixed-arity forms (`If`,
//! `Cast`, ...) so that a malformed document survives parsing and the
//! arity problem can be reported during resolution.

use std::sync::Arc;

use crate::base::{Location, Name};

/// Literal kind of a constant expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "interchange", derive(serde::Serialize, serde::Deserialize))]
pub enum ConstantKind {
    Binary,
    Boolean,
    DateTime,
    DateTimeOffset,
    Decimal,
    Float,
    Guid,
    Int,
    String,
    Time,
}

impl ConstantKind {
    /// Element name used by the CSDL writer (`<Int>`, `<String>`, ...).
    pub fn as_str(&self) -> &'static str {
        match self {
            ConstantKind::Binary => "Binary",
            ConstantKind::Boolean => "Bool",
            ConstantKind::DateTime => "DateTime",
            ConstantKind::DateTimeOffset => "DateTimeOffset",
            ConstantKind::Decimal => "Decimal",
            ConstantKind::Float => "Float",
            ConstantKind::Guid => "Guid",
            ConstantKind::Int => "Int",
            ConstantKind::String => "String",
            ConstantKind::Time => "Time",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "interchange", derive(serde::Serialize, serde::Deserialize))]
pub struct ExprDecl {
    pub kind: ExprDeclKind,
    pub location: Location,
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "interchange", derive(serde::Serialize, serde::Deserialize))]
pub enum ExprDeclKind {
    Constant {
        kind: ConstantKind,
        text: String,
    },
    Null,
    /// `A/B/C`, one entry per segment.
    Path(Vec<Name>),
    /// `NS.Enum/Member`.
    EnumMember(Name),
    If(Vec<Arc<ExprDecl>>),
    Cast {
        type_ref: Name,
        operands: Vec<Arc<ExprDecl>>,
    },
    IsType {
        type_ref: Name,
        operands: Vec<Arc<ExprDecl>>,
    },
    Record {
        type_ref: Option<Name>,
        properties: Vec<PropertyValueDecl>,
    },
    Collection {
        type_ref: Option<Name>,
        elements: Vec<Arc<ExprDecl>>,
    },
    Apply {
        function: Name,
        arguments: Vec<Arc<ExprDecl>>,
    },
    LabeledElement {
        name: Name,
        operands: Vec<Arc<ExprDecl>>,
    },
    LabeledElementReference(Name),
}

/// `property = expr` inside a record or type annotation.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "interchange", derive(serde::Serialize, serde::Deserialize))]
pub struct PropertyValueDecl {
    pub property: Name,
    pub expr: Arc<ExprDecl>,
    pub location: Location,
}

impl PropertyValueDecl {
    pub fn new(property: impl Into<Name>, expr: ExprDecl) -> Self {
        Self {
            property: property.into(),
            expr: Arc::new(expr),
            location: Location::default(),
        }
    }

    pub fn at(mut self, location: Location) -> Self {
        self.location = location;
        self
    }
}

fn shared(operands: Vec<ExprDecl>) -> Vec<Arc<ExprDecl>> {
    operands.into_iter().map(Arc::new).collect()
}

impl ExprDecl {
    pub fn new(kind: ExprDeclKind) -> Self {
        Self {
            kind,
            location: Location::default(),
        }
    }

    pub fn constant(kind: ConstantKind, text: impl Into<String>) -> Self {
        Self::new(ExprDeclKind::Constant {
            kind,
            text: text.into(),
        })
    }

    pub fn int(value: i64) -> Self {
        Self::constant(ConstantKind::Int, value.to_string())
    }

    pub fn string(value: impl Into<String>) -> Self {
        Self::constant(ConstantKind::String, value)
    }

    pub fn bool(value: bool) -> Self {
        Self::constant(ConstantKind::Boolean, value.to_string())
    }

    pub fn null() -> Self {
        Self::new(ExprDeclKind::Null)
    }

    /// Path from a `/`-separated string.
    pub fn path(path: &str) -> Self {
        Self::new(ExprDeclKind::Path(
            path.split('/').filter(|s| !s.is_empty()).map(Name::from).collect(),
        ))
    }

    pub fn enum_member(path: impl Into<Name>) -> Self {
        Self::new(ExprDeclKind::EnumMember(path.into()))
    }

    pub fn if_(test: ExprDecl, if_true: ExprDecl, if_false: ExprDecl) -> Self {
        Self::new(ExprDeclKind::If(shared(vec![test, if_true, if_false])))
    }

    pub fn cast(type_ref: impl Into<Name>, operand: ExprDecl) -> Self {
        Self::new(ExprDeclKind::Cast {
            type_ref: type_ref.into(),
            operands: shared(vec![operand]),
        })
    }

    pub fn is_type(type_ref: impl Into<Name>, operand: ExprDecl) -> Self {
        Self::new(ExprDeclKind::IsType {
            type_ref: type_ref.into(),
            operands: shared(vec![operand]),
        })
    }

    pub fn record(type_ref: Option<&str>, properties: Vec<PropertyValueDecl>) -> Self {
        Self::new(ExprDeclKind::Record {
            type_ref: type_ref.map(Name::from),
            properties,
        })
    }

    pub fn collection(elements: Vec<ExprDecl>) -> Self {
        Self::new(ExprDeclKind::Collection {
            type_ref: None,
            elements: shared(elements),
        })
    }

    pub fn apply(function: impl Into<Name>, arguments: Vec<ExprDecl>) -> Self {
        Self::new(ExprDeclKind::Apply {
            function: function.into(),
            arguments: shared(arguments),
        })
    }

    pub fn labeled(name: impl Into<Name>, operand: ExprDecl) -> Self {
        Self::new(ExprDeclKind::LabeledElement {
            name: name.into(),
            operands: shared(vec![operand]),
        })
    }

    pub fn label_ref(name: impl Into<Name>) -> Self {
        Self::new(ExprDeclKind::LabeledElementReference(name.into()))
    }

    pub fn at(mut self, location: Location) -> Self {
        self.location = location;
        self
    }

    /// Direct child expressions in declaration order.
    pub fn children(&self) -> Vec<&Arc<ExprDecl>> {
        match &self.kind {
            ExprDeclKind::If(ops)
            | ExprDeclKind::Cast { operands: ops, .. }
            | ExprDeclKind::IsType { operands: ops, .. }
            | ExprDeclKind::LabeledElement { operands: ops, .. }
            | ExprDeclKind::Collection { elements: ops, .. }
            | ExprDeclKind::Apply { arguments: ops, .. } => ops.iter().collect(),
            ExprDeclKind::Record { properties, .. } => {
                properties.iter().map(|p| &p.expr).collect()
            }
            _ => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_path_splits_segments() {
        let expr = ExprDecl::path("Address/City");
        assert_eq!(
            expr.kind,
            ExprDeclKind::Path(vec![Name::from("Address"), Name::from("City")])
        );
    }

    #[test]
    fn test_children_in_order() {
        let expr = ExprDecl::if_(ExprDecl::bool(true), ExprDecl::int(1), ExprDecl::int(2));
        let children = expr.children();
        assert_eq!(children.len(), 3);
        assert_eq!(*children[2].as_ref(), ExprDecl::int(2));
    }
}
