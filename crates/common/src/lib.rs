//! IPPcode23 common types.
//!
//! This crate provides the data structures shared by the front ends and
//! the execution engine:
//!
//! - [`Value`]: runtime value (int, bool, string, nil)
//! - [`Operand`]: a typed instruction argument, built once at load time
//! - [`Opcode`]: the 35 opcodes and their operand signatures
//! - [`Instruction`]: opcode plus operands
//! - [`Program`]: the ordered instruction sequence
//! - [`OperandError`] / [`SignatureError`]: structural errors
//!
//! # Dependencies
//!
//! This crate uses `thiserror` (compile-time proc-macro, zero runtime cost)
//! and has no other dependencies.

pub mod error;
pub mod instruction;
pub mod opcode;
pub mod operand;
pub mod program;
pub mod value;

// Re-export commonly used types at the crate root.
pub use error::{OperandError, SignatureError};
pub use instruction::Instruction;
pub use opcode::Opcode;
pub use operand::{FrameTag, Operand, OperandKind, TypeName, Variable};
pub use program::Program;
pub use value::Value;

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    /// Strategy that generates a random valid Opcode.
    fn arb_opcode() -> impl Strategy<Value = Opcode> {
        prop::sample::select(&opcode::ALL_OPCODES[..])
    }

    proptest! {
        /// Every i64 written in decimal parses back to itself.
        #[test]
        fn int_decimal_roundtrip(n in any::<i64>()) {
            prop_assert_eq!(operand::parse_int(&n.to_string()), Some(n));
        }

        /// Every non-negative i64 written in hex parses back to itself.
        #[test]
        fn int_hex_roundtrip(n in 0..=i64::MAX) {
            prop_assert_eq!(operand::parse_int(&format!("0x{n:x}")), Some(n));
            prop_assert_eq!(operand::parse_int(&format!("-0x{n:X}")), Some(-n));
        }

        /// Escaping every character as \DDD decodes back to the original,
        /// for code points that fit in three digits.
        #[test]
        fn string_escape_roundtrip(s in "[ -~\u{a0}-\u{3e7}]{0,24}") {
            let escaped: String = s.chars().map(|c| format!("\\{:03}", c as u32)).collect();
            prop_assert_eq!(operand::decode_string(&escaped).unwrap(), s);
        }

        /// Strings without a backslash decode to themselves.
        #[test]
        fn plain_string_is_identity(s in "[^\\\\]{0,32}") {
            prop_assert_eq!(operand::decode_string(&s).unwrap(), s);
        }

        /// Mnemonics parse back to their opcode in any letter case.
        #[test]
        fn mnemonic_parse_any_case(op in arb_opcode(), upper in any::<bool>()) {
            let text = if upper {
                op.mnemonic().to_string()
            } else {
                op.mnemonic().to_lowercase()
            };
            prop_assert_eq!(text.parse::<Opcode>().unwrap(), op);
        }
    }
}
