//! Instruction operands and the literal rules used to build them.
//!
//! Operands are constructed once, at load time, from the textual type
//! attribute and text supplied by a front end. Their tag never changes
//! afterwards.

use std::fmt;
use std::str::FromStr;

use crate::error::OperandError;
use crate::value::Value;

/// Which frame a variable lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FrameTag {
    /// `GF`: lives for the whole run.
    Global,
    /// `LF`: top of the local-frame stack.
    Local,
    /// `TF`: the temporary frame slot.
    Temporary,
}

impl FrameTag {
    /// Two-letter prefix used in variable references.
    pub fn prefix(&self) -> &'static str {
        match self {
            FrameTag::Global => "GF",
            FrameTag::Local => "LF",
            FrameTag::Temporary => "TF",
        }
    }
}

/// A variable reference such as `GF@counter`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Variable {
    pub frame: FrameTag,
    pub name: String,
}

impl Variable {
    pub fn new(frame: FrameTag, name: impl Into<String>) -> Self {
        Self {
            frame,
            name: name.into(),
        }
    }

    /// Parse `GF@name`, `LF@name` or `TF@name`.
    pub fn parse(text: &str) -> Result<Self, OperandError> {
        let invalid = || OperandError::InvalidVariable(text.to_string());
        let (prefix, name) = text.split_once('@').ok_or_else(invalid)?;
        let frame = match prefix {
            "GF" => FrameTag::Global,
            "LF" => FrameTag::Local,
            "TF" => FrameTag::Temporary,
            _ => return Err(invalid()),
        };
        if !is_identifier(name) {
            return Err(invalid());
        }
        Ok(Self::new(frame, name))
    }
}

impl fmt::Display for Variable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.frame.prefix(), self.name)
    }
}

/// Type names accepted by READ.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeName {
    Int,
    String,
    Bool,
}

impl TypeName {
    pub fn name(&self) -> &'static str {
        match self {
            TypeName::Int => "int",
            TypeName::String => "string",
            TypeName::Bool => "bool",
        }
    }
}

impl FromStr for TypeName {
    type Err = OperandError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "int" => Ok(TypeName::Int),
            "string" => Ok(TypeName::String),
            "bool" => Ok(TypeName::Bool),
            _ => Err(OperandError::InvalidTypeName(s.to_string())),
        }
    }
}

/// One instruction argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operand {
    /// A variable reference.
    Var(Variable),
    /// A literal constant.
    Const(Value),
    /// A label name (target of CALL / JUMP* or declared by LABEL).
    Label(String),
    /// A type name (READ).
    Type(TypeName),
}

/// The kind of operand an opcode expects in a given position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperandKind {
    /// Must be a variable.
    Var,
    /// Variable or literal.
    Symb,
    Label,
    Type,
}

impl OperandKind {
    /// Human-readable description used in error messages.
    pub fn describe(&self) -> &'static str {
        match self {
            OperandKind::Var => "variable",
            OperandKind::Symb => "variable or constant",
            OperandKind::Label => "label",
            OperandKind::Type => "type",
        }
    }

    /// Whether `operand` may appear where this kind is expected.
    pub fn accepts(&self, operand: &Operand) -> bool {
        matches!(
            (self, operand),
            (OperandKind::Var, Operand::Var(_))
                | (OperandKind::Symb, Operand::Var(_) | Operand::Const(_))
                | (OperandKind::Label, Operand::Label(_))
                | (OperandKind::Type, Operand::Type(_))
        )
    }
}

impl Operand {
    /// Build an operand from a front end's type attribute and text.
    ///
    /// `kind` is one of `var`, `int`, `bool`, `string`, `nil`, `label`,
    /// `type`. Literal conversion happens here and nowhere else.
    pub fn parse(kind: &str, text: &str) -> Result<Self, OperandError> {
        match kind {
            "var" => Variable::parse(text).map(Operand::Var),
            "int" => parse_int(text)
                .map(|n| Operand::Const(Value::Int(n)))
                .ok_or_else(|| OperandError::InvalidInt(text.to_string())),
            "bool" => match text {
                "true" => Ok(Operand::Const(Value::Bool(true))),
                "false" => Ok(Operand::Const(Value::Bool(false))),
                _ => Err(OperandError::InvalidBool(text.to_string())),
            },
            "string" => decode_string(text).map(|s| Operand::Const(Value::Str(s))),
            "nil" => match text {
                "nil" => Ok(Operand::Const(Value::Nil)),
                _ => Err(OperandError::InvalidNil(text.to_string())),
            },
            "label" => {
                if is_identifier(text) {
                    Ok(Operand::Label(text.to_string()))
                } else {
                    Err(OperandError::InvalidLabel(text.to_string()))
                }
            }
            "type" => text.parse().map(Operand::Type),
            other => Err(OperandError::UnknownOperandType(other.to_string())),
        }
    }
}

/// Identifier rule shared by variable and label names.
pub fn is_identifier(name: &str) -> bool {
    const SPECIAL: &str = "_-$&%*!?";
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || SPECIAL.contains(c) => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || SPECIAL.contains(c))
}

/// Parse an integer literal.
///
/// Accepts an optional sign followed by plain decimal digits or a
/// `0x` / `0o` / `0b` prefixed body (prefix letter in either case).
/// Values outside the 64-bit signed range are rejected.
pub fn parse_int(text: &str) -> Option<i64> {
    let (negative, digits) = match text.as_bytes().first() {
        Some(b'-') => (true, &text[1..]),
        Some(b'+') => (false, &text[1..]),
        _ => (false, text),
    };

    let (radix, body) = match digits.get(..2) {
        Some("0x" | "0X") => (16, &digits[2..]),
        Some("0o" | "0O") => (8, &digits[2..]),
        Some("0b" | "0B") => (2, &digits[2..]),
        _ => (10, digits),
    };

    // from_str_radix tolerates its own sign; we already consumed ours.
    if body.is_empty() || !body.chars().all(|c| c.is_digit(radix)) {
        return None;
    }

    let magnitude = u64::from_str_radix(body, radix).ok()?;
    if negative {
        if magnitude > i64::MAX as u64 + 1 {
            return None;
        }
        Some((magnitude as i64).wrapping_neg())
    } else {
        i64::try_from(magnitude).ok()
    }
}

/// Decode `\DDD` escapes (three decimal digits) into their code points.
pub fn decode_string(text: &str) -> Result<String, OperandError> {
    let invalid = || OperandError::InvalidEscape(text.to_string());
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars();

    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        let mut code = 0u32;
        for _ in 0..3 {
            let digit = chars.next().and_then(|d| d.to_digit(10)).ok_or_else(invalid)?;
            code = code * 10 + digit;
        }
        out.push(char::from_u32(code).ok_or_else(invalid)?);
    }

    Ok(out)
}
