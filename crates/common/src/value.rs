//! Runtime value representation for the IPPcode23 VM.
//!
//! Values are what live in frame slots and on the data stack during
//! execution. They are immutable; every opcode produces fresh values.

use std::fmt;

/// Runtime value representation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    /// Signed 64-bit integer.
    Int(i64),
    /// Boolean value.
    Bool(bool),
    /// Sequence of Unicode code points.
    Str(String),
    /// The language's explicit null. Not the same thing as an
    /// uninitialized variable.
    Nil,
}

impl Value {
    /// Name of this value's run-time type, as reported by TYPE.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Int(_) => "int",
            Value::Bool(_) => "bool",
            Value::Str(_) => "string",
            Value::Nil => "nil",
        }
    }

    /// Returns true for [`Value::Nil`].
    pub fn is_nil(&self) -> bool {
        matches!(self, Value::Nil)
    }
}

/// The WRITE form: `true`/`false`, empty for nil, decimal for ints,
/// raw text for strings.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(n) => write!(f, "{n}"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Str(s) => f.write_str(s),
            Value::Nil => Ok(()),
        }
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn type_names() {
        assert_eq!(Value::Int(42).type_name(), "int");
        assert_eq!(Value::Bool(true).type_name(), "bool");
        assert_eq!(Value::from("x").type_name(), "string");
        assert_eq!(Value::Nil.type_name(), "nil");
    }

    #[test]
    fn write_form() {
        assert_eq!(Value::Int(-7).to_string(), "-7");
        assert_eq!(Value::Bool(true).to_string(), "true");
        assert_eq!(Value::Bool(false).to_string(), "false");
        assert_eq!(Value::from("a b").to_string(), "a b");
        assert_eq!(Value::Nil.to_string(), "");
    }

    #[test]
    fn equality_different_types() {
        assert_ne!(Value::Int(1), Value::Bool(true));
        assert_ne!(Value::from("1"), Value::Int(1));
        assert_ne!(Value::from(""), Value::Nil);
    }

    #[test]
    fn nil_is_only_nil() {
        assert!(Value::Nil.is_nil());
        assert!(!Value::Int(0).is_nil());
        assert!(!Value::from("").is_nil());
    }
}
