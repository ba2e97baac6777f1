//! Parameter Value Helpers
//!
//! Values held in the parameter store are plain JSON: a string for
//! single-select parameters, an array of strings for multi-select ones.

use serde_json::Value;

/// Java value types treated as numeric.
const NUMBER_TYPES: &[&str] = &[
    "java.lang.Number",
    "java.lang.Byte",
    "java.lang.Short",
    "java.lang.Integer",
    "java.lang.Long",
    "java.lang.Float",
    "java.lang.Double",
    "java.math.BigDecimal",
    "java.math.BigInteger",
];

/// Whether a parameter type tag denotes a number
pub fn is_number_type(param_type: &str) -> bool {
    NUMBER_TYPES.contains(&param_type)
}

/// Error returned by a [`NumberParser`].
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("cannot parse '{text}' as a number for locale '{locale}'")]
pub struct ParseNumberError {
    pub text: String,
    pub locale: String,
}

/// Locale-aware number parsing, provided by the embedding application.
pub trait NumberParser {
    fn parse(&self, text: &str, locale: &str) -> Result<f64, ParseNumberError>;
}

/// Parser for transport-format numbers (`.` decimal separator, no grouping).
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainNumberParser;

impl NumberParser for PlainNumberParser {
    fn parse(&self, text: &str, locale: &str) -> Result<f64, ParseNumberError> {
        text.trim()
            .parse::<f64>()
            .ok()
            .filter(|n| n.is_finite())
            .ok_or_else(|| ParseNumberError {
                text: text.to_string(),
                locale: locale.to_string(),
            })
    }
}

/// Flatten a stored value into its list of raw strings.
///
/// `null` and `""` both mean "no value".
pub fn value_strings(value: Option<&Value>) -> Vec<String> {
    match value {
        None | Some(Value::Null) => vec![],
        Some(Value::String(s)) if s.is_empty() => vec![],
        Some(Value::String(s)) => vec![s.clone()],
        Some(Value::Array(items)) => items.iter().flat_map(|v| value_strings(Some(v))).collect(),
        Some(other) => vec![other.to_string()],
    }
}

/// Whether a stored value counts as empty (`null`, `""`, `"null"` or `[]`)
pub fn is_empty_value(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty() || s == "null",
        Value::Array(items) => items.is_empty(),
        _ => false,
    }
}

/// Compare the value held in the store with a parameter's selection.
///
/// Numeric types compare by value so that `"1"` and `"1.0"` are equal.
pub fn values_differ(held: Option<&Value>, selected: &[String], param_type: &str) -> bool {
    let held = value_strings(held);
    if held.len() != selected.len() {
        return true;
    }

    let numeric = is_number_type(param_type);
    held.iter().zip(selected).any(|(a, b)| {
        if numeric {
            if let (Ok(x), Ok(y)) = (a.trim().parse::<f64>(), b.trim().parse::<f64>()) {
                return x != y;
            }
        }
        a != b
    })
}
