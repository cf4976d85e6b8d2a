//! VM state management: frames, stacks, label table, operand resolution.

use std::collections::HashMap;
use std::io::{self, Write};

use ippcode_common::{
    FrameTag, Instruction, Operand, OperandKind, Program, SignatureError, Value, Variable,
};
use tracing::debug;

use crate::error::RuntimeError;
use crate::frame::{Frame, Slot};
use crate::input::{InputSource, LineQueue};

/// How a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Halt {
    /// The instruction pointer ran off the end of the program.
    EndOfProgram,
    /// EXIT with a program-chosen code in `[0, 49]`.
    Exit(u8),
}

impl Halt {
    /// Process exit code for this halt.
    pub fn code(&self) -> i32 {
        match self {
            Halt::EndOfProgram => 0,
            Halt::Exit(code) => *code as i32,
        }
    }
}

/// The IPPcode23 virtual machine.
///
/// Owns every mutable runtime resource for exactly one run of one program.
pub struct VM<'a> {
    /// The program being executed.
    pub(crate) program: &'a Program,
    /// Label name to instruction index, filled by the pre-pass.
    pub(crate) labels: HashMap<&'a str, usize>,
    /// GF: lives for the whole run.
    pub(crate) global: Frame,
    /// LF stack; the last element is the current local frame.
    pub(crate) locals: Vec<Frame>,
    /// TF slot.
    pub(crate) temporary: Option<Frame>,
    /// Operand stack for PUSHS / POPS.
    pub(crate) data_stack: Vec<Value>,
    /// Return addresses for CALL / RETURN.
    pub(crate) call_stack: Vec<usize>,
    /// Index of the next instruction to fetch.
    pub(crate) pc: usize,
    /// Index of the instruction currently executing.
    pub(crate) at: usize,
    /// Instructions executed so far (reported by BREAK).
    pub(crate) executed: u64,
    pub(crate) input: Box<dyn InputSource + 'a>,
    pub(crate) output: Box<dyn Write + 'a>,
    /// Side channel for DPRINT and BREAK.
    pub(crate) diagnostics: Box<dyn Write + 'a>,
}

impl<'a> VM<'a> {
    /// Create a new VM for the given program.
    ///
    /// Input starts out empty and both output channels discard what they
    /// receive; use the `with_*` builders to connect real ones.
    pub fn new(program: &'a Program) -> Self {
        Self {
            program,
            labels: HashMap::new(),
            global: Frame::new(),
            locals: Vec::new(),
            temporary: None,
            data_stack: Vec::new(),
            call_stack: Vec::new(),
            pc: 0,
            at: 0,
            executed: 0,
            input: Box::new(LineQueue::default()),
            output: Box::new(io::sink()),
            diagnostics: Box::new(io::sink()),
        }
    }

    /// Source of lines for READ.
    pub fn with_input(mut self, input: impl InputSource + 'a) -> Self {
        self.input = Box::new(input);
        self
    }

    /// Sink for WRITE.
    pub fn with_output(mut self, output: impl Write + 'a) -> Self {
        self.output = Box::new(output);
        self
    }

    /// Sink for DPRINT and BREAK.
    pub fn with_diagnostics(mut self, diagnostics: impl Write + 'a) -> Self {
        self.diagnostics = Box::new(diagnostics);
        self
    }

    /// Record every LABEL's index. Duplicate names fail immediately,
    /// before any instruction runs.
    pub(crate) fn scan_labels(&mut self) -> Result<(), RuntimeError> {
        self.labels.clear();
        let program: &'a Program = self.program;
        for (index, instr) in program.instructions.iter().enumerate() {
            if let Some(name) = instr.declared_label() {
                if self.labels.insert(name, index).is_some() {
                    return Err(RuntimeError::DuplicateLabel {
                        at: index,
                        label: name.to_string(),
                    });
                }
            }
        }
        debug!(labels = self.labels.len(), "labels resolved");
        Ok(())
    }

    /// Fetch the instruction at the current pc.
    pub(crate) fn fetch(&self) -> Option<&'a Instruction> {
        let program: &'a Program = self.program;
        program.instructions.get(self.pc)
    }

    // ---- Frames ----

    fn frame(&self, tag: FrameTag) -> Result<&Frame, RuntimeError> {
        match tag {
            FrameTag::Global => Ok(&self.global),
            FrameTag::Local => self.locals.last().ok_or(RuntimeError::MissingFrame {
                at: self.at,
                frame: "LF",
            }),
            FrameTag::Temporary => self.temporary.as_ref().ok_or(RuntimeError::MissingFrame {
                at: self.at,
                frame: "TF",
            }),
        }
    }

    pub(crate) fn frame_mut(&mut self, tag: FrameTag) -> Result<&mut Frame, RuntimeError> {
        let at = self.at;
        match tag {
            FrameTag::Global => Ok(&mut self.global),
            FrameTag::Local => self
                .locals
                .last_mut()
                .ok_or(RuntimeError::MissingFrame { at, frame: "LF" }),
            FrameTag::Temporary => self
                .temporary
                .as_mut()
                .ok_or(RuntimeError::MissingFrame { at, frame: "TF" }),
        }
    }

    /// Look a variable up: frame must exist, name must be declared.
    /// The slot may still be uninitialized.
    pub(crate) fn slot(&self, var: &Variable) -> Result<Option<&Value>, RuntimeError> {
        match self.frame(var.frame)?.lookup(&var.name) {
            Slot::Undeclared => Err(RuntimeError::UndefinedVariable {
                at: self.at,
                variable: var.to_string(),
            }),
            Slot::Uninitialized => Ok(None),
            Slot::Initialized(value) => Ok(Some(value)),
        }
    }

    /// Read an initialized variable.
    pub(crate) fn read_var(&self, var: &Variable) -> Result<Value, RuntimeError> {
        self.slot(var)?.cloned().ok_or_else(|| RuntimeError::MissingValue {
            at: self.at,
            variable: var.to_string(),
        })
    }

    /// Overwrite a declared variable.
    pub(crate) fn write_var(&mut self, var: &Variable, value: Value) -> Result<(), RuntimeError> {
        let at = self.at;
        if self.frame_mut(var.frame)?.assign(&var.name, value) {
            Ok(())
        } else {
            Err(RuntimeError::UndefinedVariable {
                at,
                variable: var.to_string(),
            })
        }
    }

    // ---- Operands ----

    pub(crate) fn wrong_kind(
        &self,
        instr: &Instruction,
        idx: usize,
        kind: OperandKind,
    ) -> RuntimeError {
        RuntimeError::Structure {
            at: self.at,
            source: SignatureError::Kind {
                opcode: instr.opcode.mnemonic(),
                position: idx + 1,
                expected: kind.describe(),
            },
        }
    }

    fn operand<'i>(
        &self,
        instr: &'i Instruction,
        idx: usize,
    ) -> Result<&'i Operand, RuntimeError> {
        instr.operands.get(idx).ok_or_else(|| RuntimeError::Structure {
            at: self.at,
            source: SignatureError::Count {
                opcode: instr.opcode.mnemonic(),
                expected: instr.opcode.signature().len(),
                found: instr.operands.len(),
            },
        })
    }

    /// Operand `idx` as a variable reference.
    pub(crate) fn var_operand<'i>(
        &self,
        instr: &'i Instruction,
        idx: usize,
    ) -> Result<&'i Variable, RuntimeError> {
        match self.operand(instr, idx)? {
            Operand::Var(var) => Ok(var),
            _ => Err(self.wrong_kind(instr, idx, OperandKind::Var)),
        }
    }

    /// Operand `idx` resolved to an initialized value.
    pub(crate) fn symb(&self, instr: &Instruction, idx: usize) -> Result<Value, RuntimeError> {
        match self.operand(instr, idx)? {
            Operand::Const(value) => Ok(value.clone()),
            Operand::Var(var) => self.read_var(var),
            _ => Err(self.wrong_kind(instr, idx, OperandKind::Symb)),
        }
    }

    /// Operand `idx` as a label, resolved to its instruction index.
    pub(crate) fn label_target(
        &self,
        instr: &Instruction,
        idx: usize,
    ) -> Result<usize, RuntimeError> {
        match self.operand(instr, idx)? {
            Operand::Label(name) => self.labels.get(name.as_str()).copied().ok_or_else(|| {
                RuntimeError::UndefinedLabel {
                    at: self.at,
                    label: name.clone(),
                }
            }),
            _ => Err(self.wrong_kind(instr, idx, OperandKind::Label)),
        }
    }

    /// Store `value` into the variable named by operand `idx`.
    pub(crate) fn store(
        &mut self,
        instr: &Instruction,
        idx: usize,
        value: Value,
    ) -> Result<(), RuntimeError> {
        let var = self.var_operand(instr, idx)?;
        self.write_var(var, value)
    }

    // ---- Stacks ----

    pub(crate) fn push(&mut self, value: Value) {
        self.data_stack.push(value);
    }

    pub(crate) fn pop(&mut self) -> Result<Value, RuntimeError> {
        self.data_stack
            .pop()
            .ok_or(RuntimeError::EmptyDataStack { at: self.at })
    }

    pub(crate) fn io_error(&self, error: io::Error) -> RuntimeError {
        RuntimeError::Io {
            at: self.at,
            message: error.to_string(),
        }
    }

    /// Read-only view of a frame, for inspection after a run.
    pub fn global_frame(&self) -> &Frame {
        &self.global
    }

    /// Current local frame, if any.
    pub fn local_frame(&self) -> Option<&Frame> {
        self.locals.last()
    }

    pub fn temporary_frame(&self) -> Option<&Frame> {
        self.temporary.as_ref()
    }

    pub fn data_stack(&self) -> &[Value] {
        &self.data_stack
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ippcode_common::Opcode;

    fn label(name: &str) -> Instruction {
        Instruction::new(Opcode::Label, vec![Operand::Label(name.to_string())])
    }

    #[test]
    fn scan_labels_records_indices() {
        let program = Program::new(vec![
            Instruction::new(Opcode::CreateFrame, vec![]),
            label("a"),
            label("b"),
        ]);
        let mut vm = VM::new(&program);
        vm.scan_labels().unwrap();
        assert_eq!(vm.labels.get("a"), Some(&1));
        assert_eq!(vm.labels.get("b"), Some(&2));
    }

    #[test]
    fn scan_labels_rejects_duplicates() {
        let program = Program::new(vec![label("a"), label("b"), label("a")]);
        let mut vm = VM::new(&program);
        assert_eq!(
            vm.scan_labels(),
            Err(RuntimeError::DuplicateLabel {
                at: 2,
                label: "a".to_string()
            })
        );
    }

    #[test]
    fn scan_labels_can_run_again() {
        let program = Program::new(vec![label("a"), label("b")]);
        let mut vm = VM::new(&program);
        vm.scan_labels().unwrap();
        vm.scan_labels().unwrap();
        assert_eq!(vm.labels.len(), 2);
        assert_eq!(vm.labels.get("b"), Some(&1));
    }

    #[test]
    fn missing_frames_are_distinct_from_undefined_variables() {
        let program = Program::default();
        let mut vm = VM::new(&program);

        let lf = Variable::new(FrameTag::Local, "x");
        assert_eq!(
            vm.read_var(&lf),
            Err(RuntimeError::MissingFrame { at: 0, frame: "LF" })
        );

        let tf = Variable::new(FrameTag::Temporary, "x");
        assert_eq!(
            vm.write_var(&tf, Value::Int(1)),
            Err(RuntimeError::MissingFrame { at: 0, frame: "TF" })
        );

        let gf = Variable::new(FrameTag::Global, "x");
        assert_eq!(
            vm.read_var(&gf),
            Err(RuntimeError::UndefinedVariable {
                at: 0,
                variable: "GF@x".to_string()
            })
        );
    }

    #[test]
    fn uninitialized_read_is_missing_value() {
        let program = Program::default();
        let mut vm = VM::new(&program);
        vm.global.declare("x");
        let gf = Variable::new(FrameTag::Global, "x");
        assert_eq!(vm.slot(&gf), Ok(None));
        assert_eq!(
            vm.read_var(&gf),
            Err(RuntimeError::MissingValue {
                at: 0,
                variable: "GF@x".to_string()
            })
        );
        vm.write_var(&gf, Value::Nil).unwrap();
        assert_eq!(vm.read_var(&gf), Ok(Value::Nil));
    }

    #[test]
    fn halt_codes() {
        assert_eq!(Halt::EndOfProgram.code(), 0);
        assert_eq!(Halt::Exit(49).code(), 49);
    }
}
