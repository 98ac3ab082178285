//! Expression evaluation.
//!
//! The external evaluation step: runs a semantic [`Expr`] against a context
//! [`Value`] (usually the structured value of the annotated instance).
//! Resolution failures inside the expression become [`EvalError`]s here and
//! nowhere earlier.

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use rustc_hash::FxHashMap;
use thiserror::Error;

use crate::base::Name;

use super::capabilities::Named;
use super::diagnostics::{EdmError, EdmErrorCode};
use super::elements::{Element, EnumMember, type_element_of};
use super::expr::{Expr, ExprKind, PathExpr};
use super::model::Model;
use super::primitives::{PrimitiveKind, PrimitiveValue};
use super::types::{TypeDef, TypeReference};

// ============================================================================
// VALUES
// ============================================================================

/// A runtime value.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Null,
    Primitive(PrimitiveValue),
    Enum {
        type_name: Name,
        /// Member name, or space-separated names for a flags combination.
        member: Name,
        value: i64,
    },
    Structured(StructuredValue),
    Collection(Vec<Value>),
}

impl Value {
    pub fn boolean(value: bool) -> Self {
        Value::Primitive(PrimitiveValue::Boolean(value))
    }

    pub fn integer(value: i64) -> Self {
        Value::Primitive(PrimitiveValue::Integer(value))
    }

    pub fn string(value: impl Into<String>) -> Self {
        Value::Primitive(PrimitiveValue::String(value.into()))
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Primitive(PrimitiveValue::Boolean(b)) => Some(*b),
            _ => None,
        }
    }

    fn describe(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Primitive(_) => "primitive",
            Value::Enum { .. } => "enum",
            Value::Structured(_) => "structured",
            Value::Collection(_) => "collection",
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("null"),
            Value::Primitive(value) => write!(f, "{value}"),
            Value::Enum {
                type_name, member, ..
            } => write!(f, "{type_name}/{member}"),
            Value::Structured(value) => {
                f.write_str("{")?;
                for (i, (name, value)) in value.properties.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{name}: {value}")?;
                }
                f.write_str("}")
            }
            Value::Collection(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
        }
    }
}

/// A structured value: ordered property values of one instance.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct StructuredValue {
    /// Qualified name of the instance type, when known.
    pub type_name: Option<Name>,
    pub properties: IndexMap<Name, Value>,
}

impl StructuredValue {
    pub fn new(type_name: Option<&str>) -> Self {
        Self {
            type_name: type_name.map(Name::from),
            properties: IndexMap::new(),
        }
    }

    pub fn with(mut self, property: impl Into<Name>, value: Value) -> Self {
        self.properties.insert(property.into(), value);
        self
    }

    pub fn get(&self, property: &str) -> Option<&Value> {
        self.properties.get(property)
    }
}

impl From<StructuredValue> for Value {
    fn from(value: StructuredValue) -> Self {
        Value::Structured(value)
    }
}

// ============================================================================
// ERRORS
// ============================================================================

/// Errors that can occur while evaluating an expression.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvalError {
    /// The expression contains an unresolved or malformed element.
    #[error("{0}")]
    Diagnostic(EdmError),

    /// A path step was applied to a value that has no properties.
    #[error("cannot read '{segment}' from a {found} value")]
    NotStructured { segment: Name, found: &'static str },

    /// The test of an `If` did not produce a Boolean.
    #[error("if test must evaluate to a Boolean, found {0}")]
    NonBooleanTest(String),

    /// A `Cast` could not convert its operand.
    #[error("cannot cast {value} to {target}")]
    InvalidCast { value: String, target: String },

    /// No function registered under the name used by an `Apply`.
    #[error("function '{0}' is not registered")]
    UnknownFunction(Name),

    /// A registered function rejected its arguments.
    #[error("function '{function}' failed: {message}")]
    Function { function: Name, message: String },

    /// A labeled element refers back to itself.
    #[error("labeled element '{0}' refers to itself")]
    CyclicLabel(Name),
}

impl EvalError {
    /// Create a function failure error.
    pub fn function(function: impl Into<Name>, message: impl Into<String>) -> Self {
        Self::Function {
            function: function.into(),
            message: message.into(),
        }
    }

    fn invalid_cast(value: &Value, target: &TypeReference) -> Self {
        Self::InvalidCast {
            value: value.to_string(),
            target: describe_type(target),
        }
    }
}

fn describe_type(type_ref: &TypeReference) -> String {
    match &type_ref.definition {
        TypeDef::Primitive(kind) => kind.to_string(),
        TypeDef::Collection(inner) => format!("Collection({})", describe_type(inner)),
        TypeDef::EntityReference(inner) => format!("Ref({})", describe_type(inner)),
        TypeDef::Declared(_) => "declared type".to_string(),
        TypeDef::Placeholder(p) => p.name.to_string(),
    }
}

/// First diagnostic of a placeholder as an evaluation error.
fn diagnostic(errors: &[EdmError]) -> EvalError {
    match errors.first() {
        Some(error) => EvalError::Diagnostic(error.clone()),
        None => EvalError::Diagnostic(EdmError::from_code(
            EdmErrorCode::MalformedExpression,
            Default::default(),
        )),
    }
}

// ============================================================================
// EVALUATOR
// ============================================================================

/// A function callable from `Apply` expressions.
pub type EvalFunction = Arc<dyn Fn(&[Value]) -> Result<Value, EvalError> + Send + Sync>;

/// Evaluates expressions; holds the functions `Apply` may call.
#[derive(Clone, Default)]
pub struct ExpressionEvaluator {
    functions: FxHashMap<Name, EvalFunction>,
}

impl fmt::Debug for ExpressionEvaluator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExpressionEvaluator")
            .field("functions", &self.functions.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl ExpressionEvaluator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Evaluator with the canonical `odata.concat` and `odata.uriEncode`.
    pub fn with_builtins() -> Self {
        let mut evaluator = Self::new();
        evaluator.register(
            "odata.concat",
            Arc::new(|args: &[Value]| {
                let mut out = String::new();
                for arg in args {
                    match arg {
                        Value::Primitive(PrimitiveValue::String(s)) => out.push_str(s),
                        Value::Primitive(p) => out.push_str(&p.to_string()),
                        Value::Null => {}
                        other => {
                            return Err(EvalError::function(
                                "odata.concat",
                                format!("cannot concatenate a {} value", other.describe()),
                            ));
                        }
                    }
                }
                Ok(Value::string(out))
            }),
        );
        evaluator.register(
            "odata.uriEncode",
            Arc::new(|args: &[Value]| match args {
                [Value::Primitive(value)] => Ok(Value::string(uri_encode(&value.to_string()))),
                _ => Err(EvalError::function(
                    "odata.uriEncode",
                    "expects exactly one primitive argument",
                )),
            }),
        );
        evaluator
    }

    /// Register (or replace) a function under its qualified name.
    pub fn register(&mut self, name: impl Into<Name>, function: EvalFunction) {
        self.functions.insert(name.into(), function);
    }

    pub fn evaluate(&self, expr: &Expr<'_>, context: &Value) -> Result<Value, EvalError> {
        let mut labels = Vec::new();
        self.eval(expr, context, &mut labels)
    }

    fn eval(
        &self,
        expr: &Expr<'_>,
        context: &Value,
        labels: &mut Vec<Name>,
    ) -> Result<Value, EvalError> {
        match expr.kind() {
            ExprKind::Constant(constant) => constant
                .value
                .map(Value::Primitive)
                .map_err(EvalError::Diagnostic),
            ExprKind::Null => Ok(Value::Null),
            ExprKind::Path(path) => eval_path(&path, context),
            ExprKind::EnumMember(members) => eval_enum(members),
            ExprKind::If {
                test,
                if_true,
                if_false,
            } => {
                let outcome = self.eval(&test, context, labels)?;
                match outcome.as_bool() {
                    Some(true) => self.eval(&if_true, context, labels),
                    Some(false) => self.eval(&if_false, context, labels),
                    None => Err(EvalError::NonBooleanTest(outcome.to_string())),
                }
            }
            ExprKind::Cast { type_ref, operand } => {
                let value = self.eval(&operand, context, labels)?;
                cast(expr.model(), value, &type_ref)
            }
            ExprKind::IsType { type_ref, operand } => {
                let value = self.eval(&operand, context, labels)?;
                is_type(expr.model(), &value, &type_ref).map(Value::boolean)
            }
            ExprKind::Record(record) => {
                let type_name = record
                    .declared_type()
                    .and_then(|t| t.into_declared())
                    .map(|t| t.qualified_name());
                let mut value = StructuredValue {
                    type_name,
                    properties: IndexMap::new(),
                };
                for (name, field) in &record.fields {
                    let field_value = self.eval(field, context, labels)?;
                    value.properties.insert(name.clone(), field_value);
                }
                Ok(Value::Structured(value))
            }
            ExprKind::Collection { elements, .. } => elements
                .iter()
                .map(|element| self.eval(element, context, labels))
                .collect::<Result<Vec<_>, _>>()
                .map(Value::Collection),
            ExprKind::Apply {
                function,
                arguments,
            } => {
                let callee = self
                    .functions
                    .get(&function)
                    .ok_or_else(|| EvalError::UnknownFunction(function.clone()))?;
                let args = arguments
                    .iter()
                    .map(|argument| self.eval(argument, context, labels))
                    .collect::<Result<Vec<_>, _>>()?;
                callee(&args)
            }
            ExprKind::LabeledElement { name, operand } => {
                if labels.contains(&name) {
                    return Err(EvalError::CyclicLabel(name));
                }
                labels.push(name);
                let result = self.eval(&operand, context, labels);
                labels.pop();
                result
            }
            ExprKind::LabeledElementReference(target) => match target {
                Element::Declared(labeled) => self.eval(&labeled, context, labels),
                Element::Placeholder(p) => Err(diagnostic(&p.errors)),
            },
            ExprKind::Bad(p) => Err(diagnostic(&p.errors)),
        }
    }
}

/// Resolve the path against the binding context, then read it from `context`.
fn eval_path(path: &PathExpr<'_>, context: &Value) -> Result<Value, EvalError> {
    if let Element::Placeholder(p) = path.referenced_property() {
        return Err(diagnostic(&p.errors));
    }
    let mut current = context;
    for segment in path.segments() {
        current = match current {
            Value::Structured(value) => match value.get(segment) {
                Some(next) => next,
                None => return Ok(Value::Null),
            },
            Value::Null => return Ok(Value::Null),
            other => {
                return Err(EvalError::NotStructured {
                    segment: segment.clone(),
                    found: other.describe(),
                });
            }
        };
    }
    Ok(current.clone())
}

fn eval_enum(members: Vec<Element<EnumMember<'_>>>) -> Result<Value, EvalError> {
    let mut type_name = Name::default();
    let mut names = Vec::new();
    let mut combined = 0i64;
    for member in members {
        let member = match member {
            Element::Declared(member) => member,
            Element::Placeholder(p) => return Err(diagnostic(&p.errors)),
        };
        type_name = member.enum_type().qualified_name();
        names.push(member.name().as_str());
        combined |= member.value().unwrap_or_default();
    }
    Ok(Value::Enum {
        type_name,
        member: Name::from(names.join(" ")),
        value: combined,
    })
}

fn primitive_matches(kind: PrimitiveKind, value: &PrimitiveValue) -> bool {
    match (kind, value) {
        (_, PrimitiveValue::Integer(i)) if kind.is_integral() => kind
            .integral_range()
            .is_some_and(|(min, max)| *i >= min && *i <= max),
        (PrimitiveKind::Double | PrimitiveKind::Single, PrimitiveValue::Float(_))
        | (PrimitiveKind::Double | PrimitiveKind::Single, PrimitiveValue::Integer(_))
        | (PrimitiveKind::Decimal, PrimitiveValue::Decimal(_))
        | (PrimitiveKind::Decimal, PrimitiveValue::Integer(_)) => true,
        _ => value.kind() == kind,
    }
}

fn is_type(model: &Model, value: &Value, type_ref: &TypeReference) -> Result<bool, EvalError> {
    if let Some(p) = type_ref.placeholder_def() {
        return Err(diagnostic(&p.errors));
    }
    Ok(match (value, &type_ref.definition) {
        (Value::Null, _) => type_ref.nullable,
        (Value::Primitive(value), TypeDef::Primitive(kind)) => primitive_matches(*kind, value),
        (Value::Collection(items), TypeDef::Collection(inner)) => items
            .iter()
            .map(|item| is_type(model, item, inner))
            .collect::<Result<Vec<_>, _>>()?
            .into_iter()
            .all(|matched| matched),
        (Value::Structured(value), TypeDef::Declared(_)) => {
            declared_matches(model, value.type_name.as_deref(), type_ref)
        }
        (Value::Enum { type_name, .. }, TypeDef::Declared(_)) => {
            declared_matches(model, Some(type_name.as_str()), type_ref)
        }
        _ => false,
    })
}

/// The instance type (by qualified name) is the declared type or derives
/// from it.
fn declared_matches(model: &Model, instance: Option<&str>, type_ref: &TypeReference) -> bool {
    let Some(instance) = instance else {
        return false;
    };
    let Some(Element::Declared(target)) = type_element_of(model, type_ref) else {
        return false;
    };
    match model.find_type(instance) {
        Element::Declared(ty) => ty.is_or_derives_from(&target),
        Element::Placeholder(_) => instance == target.qualified_name().as_str(),
    }
}

fn cast(model: &Model, value: Value, type_ref: &TypeReference) -> Result<Value, EvalError> {
    if let Some(p) = type_ref.placeholder_def() {
        return Err(diagnostic(&p.errors));
    }
    if value.is_null() {
        return Ok(Value::Null);
    }
    let TypeDef::Primitive(kind) = type_ref.definition else {
        return if is_type(model, &value, type_ref)? {
            Ok(value)
        } else {
            Err(EvalError::invalid_cast(&value, type_ref))
        };
    };
    let Value::Primitive(primitive) = &value else {
        return Err(EvalError::invalid_cast(&value, type_ref));
    };
    let converted = match primitive {
        _ if kind == PrimitiveKind::String => Some(PrimitiveValue::String(primitive.to_string())),
        PrimitiveValue::String(text) => kind.parse_literal(text).ok(),
        PrimitiveValue::Integer(i) if matches!(kind, PrimitiveKind::Double | PrimitiveKind::Single) => {
            Some(PrimitiveValue::Float(*i as f64))
        }
        PrimitiveValue::Integer(i) if kind == PrimitiveKind::Decimal => {
            Some(PrimitiveValue::Decimal(i.to_string()))
        }
        other if primitive_matches(kind, other) => Some(other.clone()),
        _ => None,
    };
    converted
        .map(Value::Primitive)
        .ok_or_else(|| EvalError::invalid_cast(&value, type_ref))
}

fn uri_encode(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for byte in text.bytes() {
        if byte.is_ascii_alphanumeric() || matches!(byte, b'-' | b'.' | b'_' | b'~') {
            out.push(char::from(byte));
        } else {
            out.push_str(&format!("%{byte:02X}"));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hir::{Annotatable, ModelOptions};
    use crate::syntax::{
        AnnotationDecl, ExprDecl, PropertyDecl, SchemaDecl, StructuredTypeDecl, TermDecl,
    };

    fn model_with(value: ExprDecl) -> Model {
        let schema = SchemaDecl::new("NS")
            .with_term(TermDecl::new("Label", "Edm.String"))
            .with_complex_type(
                StructuredTypeDecl::new("Address").with_property(PropertyDecl::new("City", "Edm.String")),
            )
            .with_entity_type(
                StructuredTypeDecl::new("Customer")
                    .with_key("Id")
                    .with_property(PropertyDecl::new("Id", "Edm.Int32").with_nullable(false))
                    .with_property(PropertyDecl::new("Active", "Edm.Boolean"))
                    .with_property(PropertyDecl::new("Home", "NS.Address"))
                    .with_annotation(AnnotationDecl::value("NS.Label", value)),
            );
        Model::builder()
            .with_options(ModelOptions {
                include_core_vocabulary: false,
                ..ModelOptions::default()
            })
            .with_schema(schema)
            .build()
    }

    fn value_of(model: &Model) -> Expr<'_> {
        let customer = model.find_type("NS.Customer").into_declared().unwrap();
        customer.annotations()[0].value().unwrap()
    }

    fn customer(active: bool) -> Value {
        StructuredValue::new(Some("NS.Customer"))
            .with("Id", Value::integer(7))
            .with("Active", Value::boolean(active))
            .with(
                "Home",
                StructuredValue::new(Some("NS.Address"))
                    .with("City", Value::string("Oslo"))
                    .into(),
            )
            .into()
    }

    fn evaluate(value: ExprDecl, context: &Value) -> Result<Value, EvalError> {
        let model = model_with(value);
        ExpressionEvaluator::with_builtins().evaluate(&value_of(&model), context)
    }

    #[test]
    fn test_if_selects_branch_from_path_test() {
        let decl = ExprDecl::if_(ExprDecl::path("Active"), ExprDecl::path("Home/City"), ExprDecl::null());
        assert_eq!(evaluate(decl.clone(), &customer(true)), Ok(Value::string("Oslo")));
        assert_eq!(evaluate(decl, &customer(false)), Ok(Value::Null));
    }

    #[test]
    fn test_unresolved_test_fails_only_when_evaluated() {
        let model = model_with(ExprDecl::if_(
            ExprDecl::path("Missing"),
            ExprDecl::int(1),
            ExprDecl::int(2),
        ));
        let expr = value_of(&model);
        assert!(expr.errors().is_empty());

        let err = ExpressionEvaluator::new().evaluate(&expr, &customer(true)).unwrap_err();
        let EvalError::Diagnostic(error) = err else {
            panic!("expected a diagnostic, got {err:?}");
        };
        assert_eq!(error.code, EdmErrorCode::BadUnresolvedProperty);
        assert!(error.message.contains("Missing"));
    }

    #[test]
    fn test_non_boolean_test_is_rejected() {
        let decl = ExprDecl::if_(ExprDecl::path("Id"), ExprDecl::int(1), ExprDecl::int(2));
        assert!(matches!(
            evaluate(decl, &customer(true)),
            Err(EvalError::NonBooleanTest(_))
        ));
    }

    #[test]
    fn test_apply_calls_registered_functions() {
        let decl = ExprDecl::apply(
            "odata.concat",
            vec![ExprDecl::path("Home/City"), ExprDecl::string("/"), ExprDecl::path("Id")],
        );
        assert_eq!(evaluate(decl, &customer(true)), Ok(Value::string("Oslo/7")));

        let decl = ExprDecl::apply("odata.uriEncode", vec![ExprDecl::string("a b/c")]);
        assert_eq!(evaluate(decl, &Value::Null), Ok(Value::string("a%20b%2Fc")));

        let decl = ExprDecl::apply("NS.Unknown", vec![]);
        assert_eq!(
            evaluate(decl, &Value::Null),
            Err(EvalError::UnknownFunction(Name::from("NS.Unknown")))
        );
    }

    #[test]
    fn test_cast_and_is_type() {
        let decl = ExprDecl::cast("Edm.String", ExprDecl::path("Id"));
        assert_eq!(evaluate(decl, &customer(true)), Ok(Value::string("7")));

        let decl = ExprDecl::is_type("NS.Address", ExprDecl::path("Home"));
        assert_eq!(evaluate(decl, &customer(true)), Ok(Value::boolean(true)));

        let decl = ExprDecl::cast("Edm.Int32", ExprDecl::string("seven"));
        assert!(matches!(
            evaluate(decl, &Value::Null),
            Err(EvalError::InvalidCast { .. })
        ));
    }

    #[test]
    fn test_self_referencing_label_is_a_cycle() {
        let decl = ExprDecl::labeled("Loop", ExprDecl::label_ref("Loop"));
        assert_eq!(
            evaluate(decl, &Value::Null),
            Err(EvalError::CyclicLabel(Name::from("Loop")))
        );
    }

    #[test]
    fn test_label_reference_reuses_labeled_value() {
        let decl = ExprDecl::collection(vec![
            ExprDecl::labeled("City", ExprDecl::path("Home/City")),
            ExprDecl::label_ref("City"),
        ]);
        assert_eq!(
            evaluate(decl, &customer(true)),
            Ok(Value::Collection(vec![Value::string("Oslo"), Value::string("Oslo")]))
        );
    }
}
