//! A single IPPcode23 instruction: an opcode plus its typed operands.

use crate::error::SignatureError;
use crate::opcode::Opcode;
use crate::operand::Operand;

/// One instruction of a program.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instruction {
    /// The operation to perform.
    pub opcode: Opcode,
    /// Operands in positional order (`arg1`, `arg2`, `arg3`).
    pub operands: Vec<Operand>,
}

impl Instruction {
    /// Create a new instruction.
    pub fn new(opcode: Opcode, operands: Vec<Operand>) -> Self {
        Self { opcode, operands }
    }

    /// Check operand count and kinds against the opcode's signature.
    pub fn check_signature(&self) -> Result<(), SignatureError> {
        let signature = self.opcode.signature();
        if signature.len() != self.operands.len() {
            return Err(SignatureError::Count {
                opcode: self.opcode.mnemonic(),
                expected: signature.len(),
                found: self.operands.len(),
            });
        }

        for (i, (kind, operand)) in signature.iter().zip(&self.operands).enumerate() {
            if !kind.accepts(operand) {
                return Err(SignatureError::Kind {
                    opcode: self.opcode.mnemonic(),
                    position: i + 1,
                    expected: kind.describe(),
                });
            }
        }

        Ok(())
    }

    /// The label name declared by a LABEL instruction, if this is one.
    pub fn declared_label(&self) -> Option<&str> {
        match (self.opcode, self.operands.first()) {
            (Opcode::Label, Some(Operand::Label(name))) => Some(name.as_str()),
            _ => None,
        }
    }
}
