//! Syntax tree node model.
//!
//! Nodes are open records: an insertion-ordered attribute map whose `type` entry names the
//! node kind. Nothing here knows which kinds or fields exist; the parser decides that and
//! the rest of the crate discovers it by looking at shapes.

use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Name of the discriminant field every node carries.
pub const KIND_FIELD: &str = "type";

/// The attributes of one node, in the order they were attached.
pub type Fields = IndexMap<String, Value>;

/// Any attribute value found in a tree.
///
/// Serialises as plain JSON, so ESTree/Babel JSON dumps load without conversion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Bool(bool),
    Number(f64),
    String(String),
    List(Vec<Value>),
    Object(Fields),
}

impl Value {
    /// Returns the attribute map when this value is a tree node (an object with a `type`).
    pub fn as_node(&self) -> Option<&Fields> {
        match self {
            Value::Object(fields) if fields.contains_key(KIND_FIELD) => Some(fields),
            _ => None,
        }
    }

    pub fn as_node_mut(&mut self) -> Option<&mut Fields> {
        match self {
            Value::Object(fields) if fields.contains_key(KIND_FIELD) => Some(fields),
            _ => None,
        }
    }

    pub fn is_node(&self) -> bool {
        self.as_node().is_some()
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    /// Short name of the value's shape, used in error messages.
    pub fn shape(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "boolean",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::List(_) => "list",
            Value::Object(fields) if fields.contains_key(KIND_FIELD) => "node",
            Value::Object(_) => "object",
        }
    }
}

/// Stringifies the way a JavaScript `String(value)` call would.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("null"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Number(n) => f.write_str(&format_number(*n)),
            Value::String(s) => f.write_str(s),
            Value::List(items) => {
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    if !matches!(item, Value::Null) {
                        write!(f, "{item}")?;
                    }
                }
                Ok(())
            }
            Value::Object(_) => f.write_str("[object Object]"),
        }
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Number(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<Fields> for Value {
    fn from(value: Fields) -> Self {
        Value::Object(value)
    }
}

impl From<Vec<Value>> for Value {
    fn from(value: Vec<Value>) -> Self {
        Value::List(value)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Value::Null, Into::into)
    }
}

/// Creates an empty node of the given kind.
pub fn new_node(kind: &str) -> Fields {
    let mut fields = Fields::new();
    fields.insert(KIND_FIELD.to_string(), Value::from(kind));
    fields
}

/// The node's kind, or the empty string when the discriminant is missing or not a string.
pub fn node_kind(node: &Fields) -> &str {
    node.get(KIND_FIELD).and_then(Value::as_str).unwrap_or("")
}

/// Formats a number like JavaScript's `Number.prototype.toString`.
pub fn format_number(n: f64) -> String {
    if n.is_nan() {
        "NaN".to_string()
    } else if n.is_infinite() {
        let sign = if n < 0.0 { "-" } else { "" };
        format!("{sign}Infinity")
    } else if n == 0.0 {
        "0".to_string()
    } else if n.abs() >= 1e21 || n.abs() < 1e-6 {
        let exp = format!("{n:e}");
        match exp.split_once('e') {
            Some((mantissa, power)) if !power.starts_with('-') => format!("{mantissa}e+{power}"),
            _ => exp,
        }
    } else if n.fract() == 0.0 {
        format!("{n:.0}")
    } else {
        n.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_check_requires_type() {
        let node = Value::Object(new_node("Identifier"));
        assert!(node.is_node());

        let mut loc = Fields::new();
        loc.insert("line".to_string(), Value::Number(1.0));
        assert!(!Value::Object(loc).is_node());
        assert!(!Value::Null.is_node());
        assert!(!Value::from("Identifier").is_node());
    }

    #[test]
    fn test_display_matches_js_string() {
        assert_eq!(Value::Number(10.0).to_string(), "10");
        assert_eq!(Value::Number(-0.0).to_string(), "0");
        assert_eq!(Value::Number(2.5).to_string(), "2.5");
        assert_eq!(Value::Bool(false).to_string(), "false");
        assert_eq!(Value::Null.to_string(), "null");
        assert_eq!(Value::from("let").to_string(), "let");
        assert_eq!(
            Value::List(vec![Value::Number(1.0), Value::Null, Value::from("x")]).to_string(),
            "1,,x"
        );
        assert_eq!(Value::Object(new_node("File")).to_string(), "[object Object]");
    }

    #[test]
    fn test_format_number_special_values() {
        assert_eq!(format_number(f64::NAN), "NaN");
        assert_eq!(format_number(f64::INFINITY), "Infinity");
        assert_eq!(format_number(f64::NEG_INFINITY), "-Infinity");
        assert_eq!(format_number(1e20), "100000000000000000000");
    }

    #[test]
    fn test_format_number_exponent_window() {
        assert_eq!(format_number(0.000001), "0.000001");
        assert_eq!(format_number(1e-7), "1e-7");
        assert_eq!(format_number(-2.5e-8), "-2.5e-8");
        assert_eq!(format_number(1e21), "1e+21");
        assert_eq!(format_number(1.5e21), "1.5e+21");
        assert_eq!(Value::Number(1.5e21).to_string(), "1.5e+21");
    }

    #[test]
    fn test_node_kind_defaults_to_empty() {
        assert_eq!(node_kind(&new_node("Program")), "Program");
        assert_eq!(node_kind(&Fields::new()), "");
    }

    #[test]
    fn test_json_round_trip_keeps_field_order() {
        let json = r#"{"type":"Identifier","start":0,"name":"a","loc":null}"#;
        let value: Value = serde_json::from_str(json).unwrap();
        let node = value.as_node().unwrap();
        let keys: Vec<&str> = node.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["type", "start", "name", "loc"]);
        assert_eq!(node.get("name"), Some(&Value::from("a")));
        assert_eq!(node.get("loc"), Some(&Value::Null));
    }
}
