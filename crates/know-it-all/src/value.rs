//! Typed attribute values
//!
//! Values arrive on the command line as text and are converted according to
//! a separate type token. The conversions mirror the tool's historical
//! behaviour, including its quirks:
//!
//! - `int` parses the leading numeral and ignores whatever follows it
//! - `float` parses the leading floating literal the same way
//! - `bool` is true only when the text starts with a lowercase `t`
//! - `null` ignores the text entirely

use anyhow::{bail, Result};
use serde_json::{Number, Value};
use std::fmt;

use crate::error::KiaError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueType {
    String,
    Integer,
    Float,
    Boolean,
    Null,
}

impl ValueType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Integer => "int/integer",
            Self::Float => "float/decimal",
            Self::Boolean => "boolean/bool",
            Self::Null => "null",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "string" => Some(Self::String),
            "int" | "integer" => Some(Self::Integer),
            "float" | "decimal" => Some(Self::Float),
            "boolean" | "bool" => Some(Self::Boolean),
            "null" => Some(Self::Null),
            _ => None,
        }
    }

    /// Parse a type token, failing with a usage error for unknown names
    pub fn parse(s: &str) -> Result<Self> {
        match Self::from_str(s) {
            Some(ty) => Ok(ty),
            None => bail!(KiaError::InvalidType(s.to_string())),
        }
    }

    /// Convert command-line text into a JSON value of this type
    pub fn convert(&self, raw: &str) -> Result<Value> {
        let converted = match self {
            Self::Null => Some(Value::Null),
            Self::String => Some(Value::String(raw.to_string())),
            Self::Integer => leading_integer(raw).map(|n| Value::Number(n.into())),
            Self::Float => leading_float(raw)
                .and_then(Number::from_f64)
                .map(Value::Number),
            Self::Boolean => Some(Value::Bool(raw.starts_with('t'))),
        };

        match converted {
            Some(value) => Ok(value),
            None => bail!(KiaError::Conversion {
                value: raw.to_string(),
                ty: self.as_str(),
            }),
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Leading whitespace, an optional sign, then at least one digit.
fn leading_integer(raw: &str) -> Option<i64> {
    let text = raw.trim_start();
    let bytes = text.as_bytes();

    let mut end = 0;
    if matches!(bytes.first(), Some(b'+') | Some(b'-')) {
        end = 1;
    }
    let digits_start = end;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    if end == digits_start {
        return None;
    }

    text[..end].parse().ok()
}

/// Longest prefix that reads as a finite floating literal.
fn leading_float(raw: &str) -> Option<f64> {
    let text = raw.trim_start();
    let candidate_len = text
        .char_indices()
        .find(|&(_, c)| !(c.is_ascii_digit() || matches!(c, '+' | '-' | '.' | 'e' | 'E')))
        .map(|(i, _)| i)
        .unwrap_or(text.len());

    (1..=candidate_len)
        .rev()
        .filter_map(|end| text[..end].parse::<f64>().ok())
        .find(|v| v.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn conversion_failed(result: Result<Value>) -> bool {
        matches!(
            result.unwrap_err().downcast_ref::<KiaError>(),
            Some(KiaError::Conversion { .. })
        )
    }

    #[test]
    fn test_type_aliases() {
        assert_eq!(ValueType::from_str("int"), Some(ValueType::Integer));
        assert_eq!(ValueType::from_str("integer"), Some(ValueType::Integer));
        assert_eq!(ValueType::from_str("decimal"), Some(ValueType::Float));
        assert_eq!(ValueType::from_str("bool"), Some(ValueType::Boolean));
        assert_eq!(ValueType::from_str("null"), Some(ValueType::Null));
        assert_eq!(ValueType::from_str("String"), None);

        let err = ValueType::parse("list").unwrap_err();
        assert_eq!(
            err.downcast_ref::<KiaError>(),
            Some(&KiaError::InvalidType("list".to_string()))
        );
    }

    #[test]
    fn test_integer() {
        assert_eq!(ValueType::Integer.convert("12").unwrap(), json!(12));
        assert_eq!(ValueType::Integer.convert("  -7").unwrap(), json!(-7));
        assert_eq!(ValueType::Integer.convert("42abc").unwrap(), json!(42));
        assert!(conversion_failed(ValueType::Integer.convert("abc")));
        assert!(conversion_failed(ValueType::Integer.convert("-")));
        assert!(conversion_failed(ValueType::Integer.convert("")));
        assert!(conversion_failed(
            ValueType::Integer.convert("99999999999999999999")
        ));
    }

    #[test]
    fn test_float() {
        assert_eq!(ValueType::Float.convert("2.5").unwrap(), json!(2.5));
        assert_eq!(ValueType::Float.convert("1e3").unwrap(), json!(1000.0));
        assert_eq!(ValueType::Float.convert("3.25kg").unwrap(), json!(3.25));
        assert_eq!(ValueType::Float.convert("7e").unwrap(), json!(7.0));
        assert!(conversion_failed(ValueType::Float.convert("pi")));
        assert!(conversion_failed(ValueType::Float.convert("inf")));
    }

    #[test]
    fn test_boolean_only_looks_at_first_letter() {
        assert_eq!(ValueType::Boolean.convert("true").unwrap(), json!(true));
        assert_eq!(ValueType::Boolean.convert("tomato").unwrap(), json!(true));
        assert_eq!(ValueType::Boolean.convert("True").unwrap(), json!(false));
        assert_eq!(ValueType::Boolean.convert("yes").unwrap(), json!(false));
        assert_eq!(ValueType::Boolean.convert("").unwrap(), json!(false));
    }

    #[test]
    fn test_null_and_string() {
        assert_eq!(ValueType::Null.convert("anything").unwrap(), Value::Null);
        assert_eq!(ValueType::String.convert("12").unwrap(), json!("12"));
    }
}
