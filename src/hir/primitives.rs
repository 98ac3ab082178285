//! Primitive types (`Edm.*`) and their literal forms.
//!
//! Primitive type references resolve without consulting the symbol table.
//! Literal parsing is shared by default-value validation and constant
//! expressions.

use std::fmt;

use crate::syntax::ConstantKind;

/// The built-in `Edm` namespace.
pub const EDM_NAMESPACE: &str = "Edm";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PrimitiveKind {
    Binary,
    Boolean,
    Byte,
    DateTime,
    DateTimeOffset,
    Decimal,
    Double,
    Guid,
    Int16,
    Int32,
    Int64,
    SByte,
    Single,
    String,
    Time,
    Stream,
}

impl PrimitiveKind {
    pub const ALL: [PrimitiveKind; 16] = [
        PrimitiveKind::Binary,
        PrimitiveKind::Boolean,
        PrimitiveKind::Byte,
        PrimitiveKind::DateTime,
        PrimitiveKind::DateTimeOffset,
        PrimitiveKind::Decimal,
        PrimitiveKind::Double,
        PrimitiveKind::Guid,
        PrimitiveKind::Int16,
        PrimitiveKind::Int32,
        PrimitiveKind::Int64,
        PrimitiveKind::SByte,
        PrimitiveKind::Single,
        PrimitiveKind::String,
        PrimitiveKind::Time,
        PrimitiveKind::Stream,
    ];

    /// Simple name without the `Edm.` prefix.
    pub fn name(&self) -> &'static str {
        match self {
            PrimitiveKind::Binary => "Binary",
            PrimitiveKind::Boolean => "Boolean",
            PrimitiveKind::Byte => "Byte",
            PrimitiveKind::DateTime => "DateTime",
            PrimitiveKind::DateTimeOffset => "DateTimeOffset",
            PrimitiveKind::Decimal => "Decimal",
            PrimitiveKind::Double => "Double",
            PrimitiveKind::Guid => "Guid",
            PrimitiveKind::Int16 => "Int16",
            PrimitiveKind::Int32 => "Int32",
            PrimitiveKind::Int64 => "Int64",
            PrimitiveKind::SByte => "SByte",
            PrimitiveKind::Single => "Single",
            PrimitiveKind::String => "String",
            PrimitiveKind::Time => "Time",
            PrimitiveKind::Stream => "Stream",
        }
    }

    /// Look up `Edm.<Name>`. Returns `None` for anything outside the table.
    pub fn from_qualified_name(qualified: &str) -> Option<Self> {
        let simple = qualified.strip_prefix("Edm.")?;
        Self::ALL.into_iter().find(|kind| kind.name() == simple)
    }

    /// The primitive type a constant expression of `kind` produces.
    pub fn for_constant(kind: ConstantKind) -> Self {
        match kind {
            ConstantKind::Binary => PrimitiveKind::Binary,
            ConstantKind::Boolean => PrimitiveKind::Boolean,
            ConstantKind::DateTime => PrimitiveKind::DateTime,
            ConstantKind::DateTimeOffset => PrimitiveKind::DateTimeOffset,
            ConstantKind::Decimal => PrimitiveKind::Decimal,
            ConstantKind::Float => PrimitiveKind::Double,
            ConstantKind::Guid => PrimitiveKind::Guid,
            ConstantKind::Int => PrimitiveKind::Int64,
            ConstantKind::String => PrimitiveKind::String,
            ConstantKind::Time => PrimitiveKind::Time,
        }
    }

    pub fn is_integral(&self) -> bool {
        matches!(
            self,
            PrimitiveKind::Byte
                | PrimitiveKind::SByte
                | PrimitiveKind::Int16
                | PrimitiveKind::Int32
                | PrimitiveKind::Int64
        )
    }

    pub fn is_numeric(&self) -> bool {
        self.is_integral()
            || matches!(
                self,
                PrimitiveKind::Decimal | PrimitiveKind::Double | PrimitiveKind::Single
            )
    }

    /// Inclusive range of an integral kind.
    pub fn integral_range(&self) -> Option<(i64, i64)> {
        match self {
            PrimitiveKind::Byte => Some((u8::MIN.into(), u8::MAX.into())),
            PrimitiveKind::SByte => Some((i8::MIN.into(), i8::MAX.into())),
            PrimitiveKind::Int16 => Some((i16::MIN.into(), i16::MAX.into())),
            PrimitiveKind::Int32 => Some((i32::MIN.into(), i32::MAX.into())),
            PrimitiveKind::Int64 => Some((i64::MIN, i64::MAX)),
            _ => None,
        }
    }

    /// Parse `text` as a literal of this kind.
    pub fn parse_literal(&self, text: &str) -> Result<PrimitiveValue, String> {
        let invalid = || format!("'{}' is not a valid {} literal", text, self);
        match self {
            PrimitiveKind::Binary => parse_hex(text).map(PrimitiveValue::Binary).ok_or_else(invalid),
            PrimitiveKind::Boolean => match text.to_ascii_lowercase().as_str() {
                "true" | "1" => Ok(PrimitiveValue::Boolean(true)),
                "false" | "0" => Ok(PrimitiveValue::Boolean(false)),
                _ => Err(invalid()),
            },
            PrimitiveKind::Byte
            | PrimitiveKind::SByte
            | PrimitiveKind::Int16
            | PrimitiveKind::Int32
            | PrimitiveKind::Int64 => {
                let value: i64 = text.parse().map_err(|_| invalid())?;
                match self.integral_range() {
                    Some((min, max)) if value < min || value > max => Err(format!(
                        "{} is out of range for {} ({}..={})",
                        value, self, min, max
                    )),
                    _ => Ok(PrimitiveValue::Integer(value)),
                }
            }
            PrimitiveKind::Double | PrimitiveKind::Single => {
                let value = match text {
                    "INF" => f64::INFINITY,
                    "-INF" => f64::NEG_INFINITY,
                    "NaN" => f64::NAN,
                    _ => text.parse::<f64>().map_err(|_| invalid())?,
                };
                if *self == PrimitiveKind::Single
                    && value.is_finite()
                    && value.abs() > f64::from(f32::MAX)
                {
                    return Err(format!("{} is out of range for {}", text, self));
                }
                Ok(PrimitiveValue::Float(value))
            }
            PrimitiveKind::Decimal => is_decimal(text)
                .then(|| PrimitiveValue::Decimal(text.to_string()))
                .ok_or_else(invalid),
            PrimitiveKind::Guid => is_guid(text)
                .then(|| PrimitiveValue::Guid(text.to_ascii_lowercase()))
                .ok_or_else(invalid),
            PrimitiveKind::DateTime => is_date_time(text)
                .then(|| PrimitiveValue::DateTime(text.to_string()))
                .ok_or_else(invalid),
            PrimitiveKind::DateTimeOffset => is_date_time_offset(text)
                .then(|| PrimitiveValue::DateTimeOffset(text.to_string()))
                .ok_or_else(invalid),
            PrimitiveKind::Time => is_time_of_day(text)
                .then(|| PrimitiveValue::Time(text.to_string()))
                .ok_or_else(invalid),
            PrimitiveKind::String => Ok(PrimitiveValue::String(text.to_string())),
            PrimitiveKind::Stream => Err(format!("{} has no literal form", self)),
        }
    }
}

impl fmt::Display for PrimitiveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", EDM_NAMESPACE, self.name())
    }
}

// ============================================================================
// VALUES
// ============================================================================

/// A parsed primitive literal.
///
/// Temporal values and decimals keep their validated text; nothing in the
/// model does arithmetic on them.
#[derive(Clone, Debug, PartialEq)]
pub enum PrimitiveValue {
    Binary(Vec<u8>),
    Boolean(bool),
    Integer(i64),
    Float(f64),
    Decimal(String),
    String(String),
    Guid(String),
    DateTime(String),
    DateTimeOffset(String),
    Time(String),
}

impl PrimitiveValue {
    /// The narrowest primitive kind this value was parsed as.
    pub fn kind(&self) -> PrimitiveKind {
        match self {
            PrimitiveValue::Binary(_) => PrimitiveKind::Binary,
            PrimitiveValue::Boolean(_) => PrimitiveKind::Boolean,
            PrimitiveValue::Integer(_) => PrimitiveKind::Int64,
            PrimitiveValue::Float(_) => PrimitiveKind::Double,
            PrimitiveValue::Decimal(_) => PrimitiveKind::Decimal,
            PrimitiveValue::String(_) => PrimitiveKind::String,
            PrimitiveValue::Guid(_) => PrimitiveKind::Guid,
            PrimitiveValue::DateTime(_) => PrimitiveKind::DateTime,
            PrimitiveValue::DateTimeOffset(_) => PrimitiveKind::DateTimeOffset,
            PrimitiveValue::Time(_) => PrimitiveKind::Time,
        }
    }
}

impl fmt::Display for PrimitiveValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PrimitiveValue::Binary(bytes) => {
                for byte in bytes {
                    write!(f, "{byte:02X}")?;
                }
                Ok(())
            }
            PrimitiveValue::Boolean(b) => write!(f, "{b}"),
            PrimitiveValue::Integer(i) => write!(f, "{i}"),
            PrimitiveValue::Float(v) => write!(f, "{v}"),
            PrimitiveValue::Decimal(s)
            | PrimitiveValue::String(s)
            | PrimitiveValue::Guid(s)
            | PrimitiveValue::DateTime(s)
            | PrimitiveValue::DateTimeOffset(s)
            | PrimitiveValue::Time(s) => f.write_str(s),
        }
    }
}

// ============================================================================
// LEXICAL CHECKS
// ============================================================================

fn parse_hex(text: &str) -> Option<Vec<u8>> {
    let digits = text
        .strip_prefix("0x")
        .or_else(|| text.strip_prefix("0X"))
        .unwrap_or(text);
    if digits.len() % 2 != 0 || !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    (0..digits.len())
        .step_by(2)
        .map(|i| u8::from_str_radix(&digits[i..i + 2], 16).ok())
        .collect()
}

fn is_digits(text: &str, len: usize) -> bool {
    text.len() == len && text.bytes().all(|b| b.is_ascii_digit())
}

fn is_decimal(text: &str) -> bool {
    let unsigned = text.strip_prefix(&['-', '+'][..]).unwrap_or(text);
    let (whole, fraction) = unsigned.split_once('.').unwrap_or((unsigned, ""));
    let all_digits = |s: &str| s.bytes().all(|b| b.is_ascii_digit());
    !(whole.is_empty() && fraction.is_empty()) && all_digits(whole) && all_digits(fraction)
}

fn is_guid(text: &str) -> bool {
    let groups: Vec<&str> = text.split('-').collect();
    groups.len() == 5
        && groups
            .iter()
            .zip([8, 4, 4, 4, 12])
            .all(|(group, len)| group.len() == len && group.bytes().all(|b| b.is_ascii_hexdigit()))
}

/// `yyyy-mm-dd`
fn is_date(text: &str) -> bool {
    let parts: Vec<&str> = text.split('-').collect();
    let [year, month, day] = parts.as_slice() else {
        return false;
    };
    if !is_digits(year, 4) || !is_digits(month, 2) || !is_digits(day, 2) {
        return false;
    }
    let month: u32 = month.parse().unwrap_or(0);
    let day: u32 = day.parse().unwrap_or(0);
    (1..=12).contains(&month) && (1..=31).contains(&day)
}

/// `hh:mm[:ss[.fffffff]]`
fn is_time_of_day(text: &str) -> bool {
    let (clock, fraction) = text.split_once('.').unwrap_or((text, ""));
    if text.contains('.') && (fraction.is_empty() || !fraction.bytes().all(|b| b.is_ascii_digit())) {
        return false;
    }
    let parts: Vec<&str> = clock.split(':').collect();
    let limits = [23u32, 59, 59];
    if !(2..=3).contains(&parts.len()) || (parts.len() == 2 && !fraction.is_empty()) {
        return false;
    }
    parts
        .iter()
        .zip(limits)
        .all(|(part, max)| is_digits(part, 2) && part.parse::<u32>().is_ok_and(|v| v <= max))
}

fn is_date_time(text: &str) -> bool {
    text.split_once('T')
        .is_some_and(|(date, time)| is_date(date) && is_time_of_day(time))
}

fn is_date_time_offset(text: &str) -> bool {
    if let Some(local) = text.strip_suffix('Z') {
        return is_date_time(local);
    }
    if text.len() < 6 || !text.is_char_boundary(text.len() - 6) {
        return false;
    }
    let (local, offset) = text.split_at(text.len() - 6);
    let bytes = offset.as_bytes();
    matches!(bytes[0], b'+' | b'-') && is_time_of_day(&offset[1..]) && is_date_time(local)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("Edm.Int32", Some(PrimitiveKind::Int32))]
    #[case("Edm.DateTimeOffset", Some(PrimitiveKind::DateTimeOffset))]
    #[case("Edm.Stream", Some(PrimitiveKind::Stream))]
    #[case("Edm.Widget", None)]
    #[case("NS.Int32", None)]
    #[case("Int32", None)]
    fn test_from_qualified_name(#[case] name: &str, #[case] expected: Option<PrimitiveKind>) {
        assert_eq!(PrimitiveKind::from_qualified_name(name), expected);
    }

    #[rstest]
    #[case(PrimitiveKind::Int32, "42", true)]
    #[case(PrimitiveKind::Int32, "2147483648", false)]
    #[case(PrimitiveKind::Byte, "-1", false)]
    #[case(PrimitiveKind::SByte, "-128", true)]
    #[case(PrimitiveKind::Boolean, "TRUE", true)]
    #[case(PrimitiveKind::Boolean, "yes", false)]
    #[case(PrimitiveKind::Double, "1.5e3", true)]
    #[case(PrimitiveKind::Double, "INF", true)]
    #[case(PrimitiveKind::Single, "1e300", false)]
    #[case(PrimitiveKind::Decimal, "-12.50", true)]
    #[case(PrimitiveKind::Decimal, ".", false)]
    #[case(PrimitiveKind::Guid, "21EC2020-3AEA-1069-A2DD-08002B30309D", true)]
    #[case(PrimitiveKind::Guid, "21EC2020-3AEA-1069-A2DD", false)]
    #[case(PrimitiveKind::DateTime, "2000-12-12T12:00", true)]
    #[case(PrimitiveKind::DateTime, "2000-13-12T12:00", false)]
    #[case(PrimitiveKind::DateTimeOffset, "2000-12-12T12:00:00Z", true)]
    #[case(PrimitiveKind::DateTimeOffset, "2000-12-12T12:00:00.5-08:00", true)]
    #[case(PrimitiveKind::DateTimeOffset, "2000-12-12T12:00:00", false)]
    #[case(PrimitiveKind::Time, "23:59:59.999", true)]
    #[case(PrimitiveKind::Time, "24:00", false)]
    #[case(PrimitiveKind::Binary, "0xDEADBEEF", true)]
    #[case(PrimitiveKind::Binary, "ABC", false)]
    #[case(PrimitiveKind::String, "anything at all", true)]
    #[case(PrimitiveKind::Stream, "", false)]
    fn test_parse_literal(#[case] kind: PrimitiveKind, #[case] text: &str, #[case] ok: bool) {
        assert_eq!(kind.parse_literal(text).is_ok(), ok, "{kind} <- {text:?}");
    }

    #[test]
    fn test_binary_value_display() {
        let value = PrimitiveKind::Binary.parse_literal("0a0B").unwrap();
        assert_eq!(value, PrimitiveValue::Binary(vec![0x0A, 0x0B]));
        assert_eq!(value.to_string(), "0A0B");
    }

    #[test]
    fn test_display_is_qualified() {
        assert_eq!(PrimitiveKind::Int16.to_string(), "Edm.Int16");
    }
}
