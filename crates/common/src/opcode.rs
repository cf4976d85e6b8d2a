//! Opcode definitions for the IPPcode23 instruction set.

use std::str::FromStr;

use crate::error::OperandError;
use crate::operand::OperandKind;
use crate::operand::OperandKind::{Label as L, Symb as S, Type as T, Var as V};

/// Identifies the operation to perform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Opcode {
    // Frames & variables
    /// Copy a value into a variable.
    Move,
    /// Replace the temporary frame with a fresh, empty one.
    CreateFrame,
    /// Move the temporary frame onto the local-frame stack.
    PushFrame,
    /// Move the top local frame back into the temporary slot.
    PopFrame,
    /// Declare an uninitialized variable.
    DefVar,

    // Calls
    /// Push the return address and jump to a label.
    Call,
    /// Pop a return address and jump to it.
    Return,

    // Data stack
    /// Push a value onto the data stack.
    PushS,
    /// Pop the data stack into a variable.
    PopS,

    // Arithmetic
    Add,
    Sub,
    Mul,
    /// Truncating integer division.
    IDiv,

    // Relational & logical
    Lt,
    Gt,
    Eq,
    And,
    Or,
    Not,

    // Conversions
    /// Code point to one-character string.
    Int2Char,
    /// Code point of the character at an index.
    Stri2Int,

    // I/O
    /// Read one input line as the given type.
    Read,
    /// Print a value's textual form.
    Write,

    // Strings
    Concat,
    Strlen,
    GetChar,
    SetChar,

    // Types
    /// Store the name of an operand's run-time type.
    Type,

    // Control flow
    /// Jump target marker.
    Label,
    Jump,
    JumpIfEq,
    JumpIfNeq,
    /// Halt with a program-chosen exit code in `[0, 49]`.
    Exit,

    // Debugging
    /// Print a value to the diagnostics channel.
    DPrint,
    /// Dump interpreter state to the diagnostics channel.
    Break,
}

/// All valid opcodes, in definition order. Useful for exhaustive testing.
pub const ALL_OPCODES: [Opcode; 35] = [
    Opcode::Move,
    Opcode::CreateFrame,
    Opcode::PushFrame,
    Opcode::PopFrame,
    Opcode::DefVar,
    Opcode::Call,
    Opcode::Return,
    Opcode::PushS,
    Opcode::PopS,
    Opcode::Add,
    Opcode::Sub,
    Opcode::Mul,
    Opcode::IDiv,
    Opcode::Lt,
    Opcode::Gt,
    Opcode::Eq,
    Opcode::And,
    Opcode::Or,
    Opcode::Not,
    Opcode::Int2Char,
    Opcode::Stri2Int,
    Opcode::Read,
    Opcode::Write,
    Opcode::Concat,
    Opcode::Strlen,
    Opcode::GetChar,
    Opcode::SetChar,
    Opcode::Type,
    Opcode::Label,
    Opcode::Jump,
    Opcode::JumpIfEq,
    Opcode::JumpIfNeq,
    Opcode::Exit,
    Opcode::DPrint,
    Opcode::Break,
];

impl Opcode {
    /// Returns the canonical (uppercase) mnemonic for this opcode.
    pub fn mnemonic(&self) -> &'static str {
        match self {
            Opcode::Move => "MOVE",
            Opcode::CreateFrame => "CREATEFRAME",
            Opcode::PushFrame => "PUSHFRAME",
            Opcode::PopFrame => "POPFRAME",
            Opcode::DefVar => "DEFVAR",
            Opcode::Call => "CALL",
            Opcode::Return => "RETURN",
            Opcode::PushS => "PUSHS",
            Opcode::PopS => "POPS",
            Opcode::Add => "ADD",
            Opcode::Sub => "SUB",
            Opcode::Mul => "MUL",
            Opcode::IDiv => "IDIV",
            Opcode::Lt => "LT",
            Opcode::Gt => "GT",
            Opcode::Eq => "EQ",
            Opcode::And => "AND",
            Opcode::Or => "OR",
            Opcode::Not => "NOT",
            Opcode::Int2Char => "INT2CHAR",
            Opcode::Stri2Int => "STRI2INT",
            Opcode::Read => "READ",
            Opcode::Write => "WRITE",
            Opcode::Concat => "CONCAT",
            Opcode::Strlen => "STRLEN",
            Opcode::GetChar => "GETCHAR",
            Opcode::SetChar => "SETCHAR",
            Opcode::Type => "TYPE",
            Opcode::Label => "LABEL",
            Opcode::Jump => "JUMP",
            Opcode::JumpIfEq => "JUMPIFEQ",
            Opcode::JumpIfNeq => "JUMPIFNEQ",
            Opcode::Exit => "EXIT",
            Opcode::DPrint => "DPRINT",
            Opcode::Break => "BREAK",
        }
    }

    /// The fixed operand signature of this opcode.
    pub fn signature(&self) -> &'static [OperandKind] {
        match self {
            Opcode::CreateFrame
            | Opcode::PushFrame
            | Opcode::PopFrame
            | Opcode::Return
            | Opcode::Break => &[],

            Opcode::DefVar | Opcode::PopS => &[V],

            Opcode::Call | Opcode::Label | Opcode::Jump => &[L],

            Opcode::PushS | Opcode::Write | Opcode::Exit | Opcode::DPrint => &[S],

            Opcode::Move
            | Opcode::Not
            | Opcode::Int2Char
            | Opcode::Strlen
            | Opcode::Type => &[V, S],

            Opcode::Read => &[V, T],

            Opcode::Add
            | Opcode::Sub
            | Opcode::Mul
            | Opcode::IDiv
            | Opcode::Lt
            | Opcode::Gt
            | Opcode::Eq
            | Opcode::And
            | Opcode::Or
            | Opcode::Stri2Int
            | Opcode::Concat
            | Opcode::GetChar
            | Opcode::SetChar => &[V, S, S],

            Opcode::JumpIfEq | Opcode::JumpIfNeq => &[L, S, S],
        }
    }
}

/// Opcode names are matched case-insensitively.
impl FromStr for Opcode {
    type Err = OperandError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ALL_OPCODES
            .iter()
            .find(|op| op.mnemonic().eq_ignore_ascii_case(s))
            .copied()
            .ok_or_else(|| OperandError::UnknownOpcode(s.to_string()))
    }
}
