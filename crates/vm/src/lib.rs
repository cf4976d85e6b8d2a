//! IPPcode23 virtual machine: executes a loaded instruction sequence.
//!
//! The machine has:
//! - A global frame, a stack of local frames and an optional temporary frame
//! - A data stack for PUSHS / POPS
//! - A call stack of return addresses
//! - Pluggable input, output and diagnostics channels
//!
//! # Usage
//!
//! ```
//! use ippcode_common::{FrameTag, Instruction, Opcode, Operand, Program, Value, Variable};
//! use ippcode_vm::{run, Halt, LineQueue};
//!
//! let x = Operand::Var(Variable::new(FrameTag::Global, "x"));
//! let program = Program::new(vec![
//!     Instruction::new(Opcode::DefVar, vec![x.clone()]),
//!     Instruction::new(
//!         Opcode::Sub,
//!         vec![x.clone(), Operand::Const(Value::Int(5)), Operand::Const(Value::Int(3))],
//!     ),
//!     Instruction::new(Opcode::Write, vec![x]),
//! ]);
//!
//! let mut out = Vec::new();
//! let halt = run(&program, LineQueue::default(), &mut out).unwrap();
//! assert_eq!(halt, Halt::EndOfProgram);
//! assert_eq!(out, b"2");
//! ```

pub mod error;
pub mod execute;
pub mod frame;
pub mod input;
pub mod machine;

pub use error::RuntimeError;
pub use frame::{Frame, Slot};
pub use input::{InputSource, Interactive, LineQueue};
pub use machine::{Halt, VM};

use std::io::Write;

use ippcode_common::Program;

/// Execute a program with the given input and output.
///
/// DPRINT and BREAK output is discarded; build a [`VM`] directly to
/// capture it.
///
/// # Errors
///
/// Returns [`RuntimeError`] for the first failing instruction. Output
/// written before the failure has already reached `output`.
pub fn run<'a>(
    program: &'a Program,
    input: impl InputSource + 'a,
    output: impl Write + 'a,
) -> Result<Halt, RuntimeError> {
    let mut vm = VM::new(program).with_input(input).with_output(output);
    vm.execute()
}
