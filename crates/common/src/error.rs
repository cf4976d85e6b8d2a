//! Errors raised while turning loader-supplied text into instruction parts.

use thiserror::Error;

/// Errors that occur while parsing opcode names and operand text.
///
/// These are structural errors: a program containing one of them never
/// reaches the engine.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OperandError {
    /// Opcode name not part of the instruction set.
    #[error("unknown opcode '{0}'")]
    UnknownOpcode(String),

    /// Operand type attribute not recognized.
    #[error("unknown operand type '{0}'")]
    UnknownOperandType(String),

    /// Integer literal could not be parsed.
    #[error("invalid int literal '{0}'")]
    InvalidInt(String),

    /// Boolean literal other than `true` / `false`.
    #[error("invalid bool literal '{0}'")]
    InvalidBool(String),

    /// Nil literal other than `nil`.
    #[error("invalid nil literal '{0}'")]
    InvalidNil(String),

    /// Backslash not followed by exactly three decimal digits, or an escape
    /// naming a value that is not a Unicode scalar.
    #[error("invalid escape sequence in string literal '{0}'")]
    InvalidEscape(String),

    /// Variable reference not of the form `GF@name`, `LF@name`, `TF@name`.
    #[error("invalid variable '{0}'")]
    InvalidVariable(String),

    /// Label name violating the identifier rules.
    #[error("invalid label '{0}'")]
    InvalidLabel(String),

    /// Type name other than `int`, `string`, `bool`.
    #[error("invalid type name '{0}'")]
    InvalidTypeName(String),
}

/// Operand list does not match the opcode's fixed signature.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SignatureError {
    /// Wrong number of operands.
    #[error("{opcode} expects {expected} operand(s), found {found}")]
    Count {
        opcode: &'static str,
        expected: usize,
        found: usize,
    },

    /// Operand at `position` (1-based) has the wrong kind.
    #[error("{opcode} operand {position} must be {expected}")]
    Kind {
        opcode: &'static str,
        position: usize,
        expected: &'static str,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_unknown_opcode() {
        assert_eq!(
            OperandError::UnknownOpcode("FOO".to_string()).to_string(),
            "unknown opcode 'FOO'"
        );
    }

    #[test]
    fn display_invalid_escape() {
        assert_eq!(
            OperandError::InvalidEscape("a\\1".to_string()).to_string(),
            "invalid escape sequence in string literal 'a\\1'"
        );
    }

    #[test]
    fn display_signature_count() {
        let e = SignatureError::Count {
            opcode: "MOVE",
            expected: 2,
            found: 1,
        };
        assert_eq!(e.to_string(), "MOVE expects 2 operand(s), found 1");
    }

    #[test]
    fn display_signature_kind() {
        let e = SignatureError::Kind {
            opcode: "JUMP",
            position: 1,
            expected: "label",
        };
        assert_eq!(e.to_string(), "JUMP operand 1 must be label");
    }
}
