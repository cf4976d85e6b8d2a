//! Parser for IPPcode23 tokens → instructions.
//!
//! The opcode's signature decides how each operand token is read: bare
//! words are labels or type names, prefixed tokens are variables or
//! literals.

use std::str::FromStr;

use ippcode_common::{Instruction, Opcode, Operand, OperandError, OperandKind, SignatureError};

use crate::error::StructureError;
use crate::lexer::Token;

/// Whether a line's tokens are exactly the `.IPPcode23` header.
pub(crate) fn is_header(tokens: &[Token<'_>]) -> bool {
    matches!(tokens, [Token::Directive(d)] if d.eq_ignore_ascii_case(".IPPcode23"))
}

/// Parse the tokens of one non-empty line into an instruction.
pub(crate) fn parse_line(tokens: &[Token<'_>]) -> Result<Instruction, StructureError> {
    let (first, args) = match tokens.split_first() {
        Some((first, args)) => (first, args),
        None => {
            return Err(StructureError::UnexpectedToken {
                token: String::new(),
            })
        }
    };

    let mnemonic = match first {
        Token::Word(w) => *w,
        Token::Directive(text) | Token::Prefixed { text, .. } => {
            return Err(StructureError::UnexpectedToken {
                token: text.to_string(),
            })
        }
    };

    let opcode = Opcode::from_str(mnemonic)?;
    let signature = opcode.signature();
    if args.len() != signature.len() {
        return Err(SignatureError::Count {
            opcode: opcode.mnemonic(),
            expected: signature.len(),
            found: args.len(),
        }
        .into());
    }

    let operands = args
        .iter()
        .zip(signature)
        .map(|(token, kind)| parse_operand(token, *kind))
        .collect::<Result<Vec<_>, _>>()?;

    let instr = Instruction::new(opcode, operands);
    instr.check_signature()?;
    Ok(instr)
}

fn parse_operand(token: &Token<'_>, kind: OperandKind) -> Result<Operand, OperandError> {
    match (token, kind) {
        (Token::Word(w), OperandKind::Label) => Operand::parse("label", w),
        (Token::Word(w), OperandKind::Type) => Operand::parse("type", w),
        (Token::Prefixed { text, prefix, .. }, _) if matches!(*prefix, "GF" | "LF" | "TF") => {
            Operand::parse("var", text)
        }
        (Token::Prefixed { prefix, body, .. }, _) => Operand::parse(prefix, body),
        (Token::Word(text) | Token::Directive(text), OperandKind::Var | OperandKind::Symb) => {
            Err(OperandError::InvalidVariable(text.to_string()))
        }
        (Token::Directive(text), OperandKind::Label) => {
            Err(OperandError::InvalidLabel(text.to_string()))
        }
        (Token::Directive(text), OperandKind::Type) => {
            Err(OperandError::InvalidTypeName(text.to_string()))
        }
    }
}
