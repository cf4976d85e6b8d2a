//! Runtime errors for the IPPcode23 VM.
//!
//! Every error is terminal: the engine stops at the failing instruction and
//! hands the error to its caller, which maps it to a process exit code via
//! [`RuntimeError::exit_code`]. Variants include the instruction index
//! (`at`) for debugging.

use ippcode_common::SignatureError;
use thiserror::Error;

/// Errors that occur during program execution.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RuntimeError {
    /// Operand count or kind does not match the opcode's signature.
    #[error("malformed instruction at {at}: {source}")]
    Structure { at: usize, source: SignatureError },

    /// Two LABEL instructions declare the same name.
    #[error("label '{label}' redefined at instruction {at}")]
    DuplicateLabel { at: usize, label: String },

    /// CALL or jump to a label that no LABEL declares.
    #[error("undefined label '{label}' at instruction {at}")]
    UndefinedLabel { at: usize, label: String },

    /// DEFVAR of a name already declared in the target frame.
    #[error("variable {variable} redefined at instruction {at}")]
    VariableRedefinition { at: usize, variable: String },

    /// Operand's run-time type is unsuited to the opcode.
    #[error("operand type mismatch in {opcode} at instruction {at}")]
    TypeMismatch { at: usize, opcode: &'static str },

    /// Access to a name never declared in its frame.
    #[error("undefined variable {variable} at instruction {at}")]
    UndefinedVariable { at: usize, variable: String },

    /// LF with an empty local-frame stack, or TF with no temporary frame.
    #[error("frame {frame} does not exist at instruction {at}")]
    MissingFrame { at: usize, frame: &'static str },

    /// Read of a declared but never assigned variable.
    #[error("variable {variable} is uninitialized at instruction {at}")]
    MissingValue { at: usize, variable: String },

    /// POPS with an empty data stack.
    #[error("data stack is empty at instruction {at}")]
    EmptyDataStack { at: usize },

    /// RETURN with an empty call stack.
    #[error("call stack is empty at instruction {at}")]
    EmptyCallStack { at: usize },

    /// IDIV by zero.
    #[error("division by zero at instruction {at}")]
    DivisionByZero { at: usize },

    /// EXIT code outside `[0, 49]`.
    #[error("exit code {code} out of range 0-49 at instruction {at}")]
    InvalidExitCode { at: usize, code: i64 },

    /// INT2CHAR with a value that is not a Unicode scalar.
    #[error("invalid code point {code} at instruction {at}")]
    InvalidCodePoint { at: usize, code: i64 },

    /// String index outside `[0, length - 1]`.
    #[error("string index {index} out of range (length {length}) at instruction {at}")]
    IndexOutOfRange { at: usize, index: i64, length: usize },

    /// SETCHAR with an empty replacement string.
    #[error("empty replacement string at instruction {at}")]
    EmptyReplacement { at: usize },

    /// Reading input or writing output failed.
    #[error("i/o failure at instruction {at}: {message}")]
    Io { at: usize, message: String },
}

impl RuntimeError {
    /// The process exit code associated with this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            RuntimeError::Structure { .. } => 32,
            RuntimeError::DuplicateLabel { .. }
            | RuntimeError::UndefinedLabel { .. }
            | RuntimeError::VariableRedefinition { .. } => 52,
            RuntimeError::TypeMismatch { .. } => 53,
            RuntimeError::UndefinedVariable { .. } => 54,
            RuntimeError::MissingFrame { .. } => 55,
            RuntimeError::MissingValue { .. }
            | RuntimeError::EmptyDataStack { .. }
            | RuntimeError::EmptyCallStack { .. } => 56,
            RuntimeError::DivisionByZero { .. } | RuntimeError::InvalidExitCode { .. } => 57,
            RuntimeError::InvalidCodePoint { .. }
            | RuntimeError::IndexOutOfRange { .. }
            | RuntimeError::EmptyReplacement { .. } => 58,
            RuntimeError::Io { .. } => 99,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_formats() {
        assert_eq!(
            RuntimeError::DivisionByZero { at: 5 }.to_string(),
            "division by zero at instruction 5"
        );
        assert_eq!(
            RuntimeError::MissingFrame { at: 0, frame: "TF" }.to_string(),
            "frame TF does not exist at instruction 0"
        );
        assert_eq!(
            RuntimeError::IndexOutOfRange {
                at: 3,
                index: -1,
                length: 4
            }
            .to_string(),
            "string index -1 out of range (length 4) at instruction 3"
        );
        assert_eq!(
            RuntimeError::Structure {
                at: 2,
                source: SignatureError::Count {
                    opcode: "WRITE",
                    expected: 1,
                    found: 0
                }
            }
            .to_string(),
            "malformed instruction at 2: WRITE expects 1 operand(s), found 0"
        );
    }

    #[test]
    fn exit_codes() {
        let cases = [
            (RuntimeError::EmptyCallStack { at: 0 }, 56),
            (
                RuntimeError::UndefinedLabel {
                    at: 0,
                    label: "x".to_string(),
                },
                52,
            ),
            (RuntimeError::TypeMismatch { at: 0, opcode: "ADD" }, 53),
            (
                RuntimeError::UndefinedVariable {
                    at: 0,
                    variable: "GF@x".to_string(),
                },
                54,
            ),
            (RuntimeError::MissingFrame { at: 0, frame: "LF" }, 55),
            (RuntimeError::InvalidExitCode { at: 0, code: 50 }, 57),
            (RuntimeError::EmptyReplacement { at: 0 }, 58),
            (
                RuntimeError::Io {
                    at: 0,
                    message: "broken pipe".to_string(),
                },
                99,
            ),
        ];
        for (error, code) in cases {
            assert_eq!(error.exit_code(), code, "{error}");
        }
    }
}
