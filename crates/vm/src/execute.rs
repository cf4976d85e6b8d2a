//! Main execution loop and opcode dispatch for the IPPcode23 VM.

use std::cmp::Ordering;
use std::io::Write;

use ippcode_common::operand::parse_int;
use ippcode_common::{Instruction, Opcode, Operand, OperandKind, TypeName, Value};
use tracing::{debug, trace};

use crate::error::RuntimeError;
use crate::frame::Frame;
use crate::machine::{Halt, VM};

/// Outcome of comparing two values for EQ / JUMPIFEQ / JUMPIFNEQ.
///
/// Nil equals only nil and compares against anything without a type error.
/// Otherwise both sides must share a type. `None` means a type mismatch.
fn values_equal(a: &Value, b: &Value) -> Option<bool> {
    match (a, b) {
        (Value::Nil, other) | (other, Value::Nil) => Some(other.is_nil()),
        (Value::Int(x), Value::Int(y)) => Some(x == y),
        (Value::Bool(x), Value::Bool(y)) => Some(x == y),
        (Value::Str(x), Value::Str(y)) => Some(x == y),
        _ => None,
    }
}

/// Natural ordering for LT / GT. Nil and mixed types have none.
fn values_ordering(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Int(x), Value::Int(y)) => Some(x.cmp(y)),
        (Value::Bool(x), Value::Bool(y)) => Some(x.cmp(y)),
        (Value::Str(x), Value::Str(y)) => Some(x.chars().cmp(y.chars())),
        _ => None,
    }
}

/// `type@value` rendering used in state dumps.
fn describe(value: &Value) -> String {
    format!("{}@{}", value.type_name(), value)
}

fn describe_frame(frame: &Frame) -> String {
    let vars: Vec<String> = frame
        .iter()
        .map(|(name, value)| match value {
            Some(v) => format!("{name}={}", describe(v)),
            None => format!("{name}=<uninitialized>"),
        })
        .collect();
    format!("{{{}}}", vars.join(", "))
}

impl<'a> VM<'a> {
    /// Execute the program until it runs off the end, hits EXIT, or fails.
    pub fn execute(&mut self) -> Result<Halt, RuntimeError> {
        self.scan_labels()?;
        self.pc = 0;

        while let Some(instr) = self.fetch() {
            self.at = self.pc;
            self.pc += 1;
            self.executed += 1;

            instr
                .check_signature()
                .map_err(|source| RuntimeError::Structure {
                    at: self.at,
                    source,
                })?;

            trace!(at = self.at, opcode = instr.opcode.mnemonic(), "execute");

            match instr.opcode {
                // Frames & variables
                Opcode::Move => self.exec_move(instr)?,
                Opcode::CreateFrame => self.temporary = Some(Frame::new()),
                Opcode::PushFrame => self.exec_push_frame()?,
                Opcode::PopFrame => self.exec_pop_frame()?,
                Opcode::DefVar => self.exec_defvar(instr)?,

                // Calls
                Opcode::Call => self.exec_call(instr)?,
                Opcode::Return => self.exec_return()?,

                // Data stack
                Opcode::PushS => self.exec_pushs(instr)?,
                Opcode::PopS => self.exec_pops(instr)?,

                // Arithmetic
                Opcode::Add => self.exec_arith(instr, i64::wrapping_add)?,
                Opcode::Sub => self.exec_arith(instr, i64::wrapping_sub)?,
                Opcode::Mul => self.exec_arith(instr, i64::wrapping_mul)?,
                Opcode::IDiv => self.exec_idiv(instr)?,

                // Relational & logical
                Opcode::Lt => self.exec_relational(instr, Ordering::Less)?,
                Opcode::Gt => self.exec_relational(instr, Ordering::Greater)?,
                Opcode::Eq => self.exec_eq(instr)?,
                Opcode::And => self.exec_logic(instr, |a, b| a && b)?,
                Opcode::Or => self.exec_logic(instr, |a, b| a || b)?,
                Opcode::Not => self.exec_not(instr)?,

                // Conversions
                Opcode::Int2Char => self.exec_int2char(instr)?,
                Opcode::Stri2Int => self.exec_stri2int(instr)?,

                // I/O
                Opcode::Read => self.exec_read(instr)?,
                Opcode::Write => self.exec_write(instr)?,

                // Strings
                Opcode::Concat => self.exec_concat(instr)?,
                Opcode::Strlen => self.exec_strlen(instr)?,
                Opcode::GetChar => self.exec_getchar(instr)?,
                Opcode::SetChar => self.exec_setchar(instr)?,

                // Types
                Opcode::Type => self.exec_type(instr)?,

                // Control flow
                Opcode::Label => {} // Resolved by the pre-pass
                Opcode::Jump => self.pc = self.label_target(instr, 0)?,
                Opcode::JumpIfEq => self.exec_conditional_jump(instr, true)?,
                Opcode::JumpIfNeq => self.exec_conditional_jump(instr, false)?,
                Opcode::Exit => return self.exec_exit(instr),

                // Debugging
                Opcode::DPrint => self.exec_dprint(instr)?,
                Opcode::Break => self.exec_break()?,
            }
        }

        debug!(executed = self.executed, "end of program");
        self.output.flush().map_err(|e| self.io_error(e))?;
        Ok(Halt::EndOfProgram)
    }

    fn type_mismatch(&self, opcode: Opcode) -> RuntimeError {
        RuntimeError::TypeMismatch {
            at: self.at,
            opcode: opcode.mnemonic(),
        }
    }

    /// String index check shared by STRI2INT, GETCHAR, SETCHAR.
    fn char_index(&self, s: &str, index: i64) -> Result<usize, RuntimeError> {
        let length = s.chars().count();
        match usize::try_from(index) {
            Ok(i) if i < length => Ok(i),
            _ => Err(RuntimeError::IndexOutOfRange {
                at: self.at,
                index,
                length,
            }),
        }
    }

    // ---- Frames & variables ----

    fn exec_move(&mut self, instr: &Instruction) -> Result<(), RuntimeError> {
        let value = self.symb(instr, 1)?;
        self.store(instr, 0, value)
    }

    fn exec_push_frame(&mut self) -> Result<(), RuntimeError> {
        let frame = self.temporary.take().ok_or(RuntimeError::MissingFrame {
            at: self.at,
            frame: "TF",
        })?;
        self.locals.push(frame);
        Ok(())
    }

    fn exec_pop_frame(&mut self) -> Result<(), RuntimeError> {
        let frame = self.locals.pop().ok_or(RuntimeError::MissingFrame {
            at: self.at,
            frame: "LF",
        })?;
        self.temporary = Some(frame);
        Ok(())
    }

    fn exec_defvar(&mut self, instr: &Instruction) -> Result<(), RuntimeError> {
        let var = self.var_operand(instr, 0)?;
        let at = self.at;
        if self.frame_mut(var.frame)?.declare(&var.name) {
            Ok(())
        } else {
            Err(RuntimeError::VariableRedefinition {
                at,
                variable: var.to_string(),
            })
        }
    }

    // ---- Calls ----

    fn exec_call(&mut self, instr: &Instruction) -> Result<(), RuntimeError> {
        let target = self.label_target(instr, 0)?;
        // pc already points past the CALL.
        self.call_stack.push(self.pc);
        self.pc = target;
        Ok(())
    }

    fn exec_return(&mut self) -> Result<(), RuntimeError> {
        self.pc = self
            .call_stack
            .pop()
            .ok_or(RuntimeError::EmptyCallStack { at: self.at })?;
        Ok(())
    }

    // ---- Data stack ----

    fn exec_pushs(&mut self, instr: &Instruction) -> Result<(), RuntimeError> {
        let value = self.symb(instr, 0)?;
        self.push(value);
        Ok(())
    }

    fn exec_pops(&mut self, instr: &Instruction) -> Result<(), RuntimeError> {
        // Destination is checked before popping so a failed POPS leaves
        // the stack intact.
        let var = self.var_operand(instr, 0)?;
        self.slot(var)?;
        let value = self.pop()?;
        self.write_var(var, value)
    }

    // ---- Arithmetic ----

    /// Binary arithmetic: two Int operands, result stored in operand 0.
    fn exec_arith(
        &mut self,
        instr: &Instruction,
        op: fn(i64, i64) -> i64,
    ) -> Result<(), RuntimeError> {
        let a = self.symb(instr, 1)?;
        let b = self.symb(instr, 2)?;

        let result = match (a, b) {
            (Value::Int(x), Value::Int(y)) => Value::Int(op(x, y)),
            _ => return Err(self.type_mismatch(instr.opcode)),
        };

        self.store(instr, 0, result)
    }

    fn exec_idiv(&mut self, instr: &Instruction) -> Result<(), RuntimeError> {
        let a = self.symb(instr, 1)?;
        let b = self.symb(instr, 2)?;

        let result = match (a, b) {
            (Value::Int(_), Value::Int(0)) => {
                return Err(RuntimeError::DivisionByZero { at: self.at });
            }
            (Value::Int(x), Value::Int(y)) => Value::Int(x.wrapping_div(y)),
            _ => return Err(self.type_mismatch(instr.opcode)),
        };

        self.store(instr, 0, result)
    }

    // ---- Relational & logical ----

    fn exec_relational(
        &mut self,
        instr: &Instruction,
        wanted: Ordering,
    ) -> Result<(), RuntimeError> {
        let a = self.symb(instr, 1)?;
        let b = self.symb(instr, 2)?;

        let ordering =
            values_ordering(&a, &b).ok_or_else(|| self.type_mismatch(instr.opcode))?;
        self.store(instr, 0, Value::Bool(ordering == wanted))
    }

    fn exec_eq(&mut self, instr: &Instruction) -> Result<(), RuntimeError> {
        let a = self.symb(instr, 1)?;
        let b = self.symb(instr, 2)?;

        let equal =
            values_equal(&a, &b).ok_or_else(|| self.type_mismatch(instr.opcode))?;
        self.store(instr, 0, Value::Bool(equal))
    }

    fn exec_logic(
        &mut self,
        instr: &Instruction,
        op: fn(bool, bool) -> bool,
    ) -> Result<(), RuntimeError> {
        let a = self.symb(instr, 1)?;
        let b = self.symb(instr, 2)?;

        let result = match (a, b) {
            (Value::Bool(x), Value::Bool(y)) => Value::Bool(op(x, y)),
            _ => return Err(self.type_mismatch(instr.opcode)),
        };

        self.store(instr, 0, result)
    }

    fn exec_not(&mut self, instr: &Instruction) -> Result<(), RuntimeError> {
        let result = match self.symb(instr, 1)? {
            Value::Bool(x) => Value::Bool(!x),
            _ => return Err(self.type_mismatch(instr.opcode)),
        };

        self.store(instr, 0, result)
    }

    // ---- Conversions ----

    fn exec_int2char(&mut self, instr: &Instruction) -> Result<(), RuntimeError> {
        let code = match self.symb(instr, 1)? {
            Value::Int(n) => n,
            _ => return Err(self.type_mismatch(instr.opcode)),
        };

        let c = u32::try_from(code)
            .ok()
            .and_then(char::from_u32)
            .ok_or(RuntimeError::InvalidCodePoint { at: self.at, code })?;

        self.store(instr, 0, Value::Str(c.to_string()))
    }

    fn exec_stri2int(&mut self, instr: &Instruction) -> Result<(), RuntimeError> {
        let (s, index) = match (self.symb(instr, 1)?, self.symb(instr, 2)?) {
            (Value::Str(s), Value::Int(i)) => (s, i),
            _ => return Err(self.type_mismatch(instr.opcode)),
        };

        let i = self.char_index(&s, index)?;
        let code = s.chars().nth(i).map(|c| c as i64).unwrap_or_default();
        self.store(instr, 0, Value::Int(code))
    }

    // ---- I/O ----

    fn exec_read(&mut self, instr: &Instruction) -> Result<(), RuntimeError> {
        let ty = match instr.operands.get(1) {
            Some(Operand::Type(ty)) => *ty,
            _ => return Err(self.wrong_kind(instr, 1, OperandKind::Type)),
        };

        let line = self.input.read_line().map_err(|e| self.io_error(e))?;
        let value = match line {
            None => Value::Nil,
            Some(line) => match ty {
                TypeName::Int => parse_int(line.trim()).map_or(Value::Nil, Value::Int),
                TypeName::Bool => match line.trim() {
                    t if t.eq_ignore_ascii_case("true") => Value::Bool(true),
                    t if t.eq_ignore_ascii_case("false") => Value::Bool(false),
                    _ => Value::Nil,
                },
                TypeName::String => Value::Str(line),
            },
        };

        self.store(instr, 0, value)
    }

    fn exec_write(&mut self, instr: &Instruction) -> Result<(), RuntimeError> {
        let value = self.symb(instr, 0)?;
        write!(self.output, "{value}").map_err(|e| self.io_error(e))
    }

    // ---- Strings ----

    fn exec_concat(&mut self, instr: &Instruction) -> Result<(), RuntimeError> {
        let result = match (self.symb(instr, 1)?, self.symb(instr, 2)?) {
            (Value::Str(mut a), Value::Str(b)) => {
                a.push_str(&b);
                Value::Str(a)
            }
            _ => return Err(self.type_mismatch(instr.opcode)),
        };

        self.store(instr, 0, result)
    }

    fn exec_strlen(&mut self, instr: &Instruction) -> Result<(), RuntimeError> {
        let length = match self.symb(instr, 1)? {
            Value::Str(s) => s.chars().count() as i64,
            _ => return Err(self.type_mismatch(instr.opcode)),
        };

        self.store(instr, 0, Value::Int(length))
    }

    fn exec_getchar(&mut self, instr: &Instruction) -> Result<(), RuntimeError> {
        let (s, index) = match (self.symb(instr, 1)?, self.symb(instr, 2)?) {
            (Value::Str(s), Value::Int(i)) => (s, i),
            _ => return Err(self.type_mismatch(instr.opcode)),
        };

        let i = self.char_index(&s, index)?;
        let c: String = s.chars().skip(i).take(1).collect();
        self.store(instr, 0, Value::Str(c))
    }

    /// SETCHAR ⟨var⟩ ⟨index⟩ ⟨replacement⟩: the destination's own string is
    /// the one being modified.
    fn exec_setchar(&mut self, instr: &Instruction) -> Result<(), RuntimeError> {
        let var = self.var_operand(instr, 0)?;
        let target = self.read_var(var)?;
        let index = self.symb(instr, 1)?;
        let replacement = self.symb(instr, 2)?;

        let (s, index, replacement) = match (target, index, replacement) {
            (Value::Str(s), Value::Int(i), Value::Str(r)) => (s, i, r),
            _ => return Err(self.type_mismatch(instr.opcode)),
        };

        let i = self.char_index(&s, index)?;
        let new_char = replacement
            .chars()
            .next()
            .ok_or(RuntimeError::EmptyReplacement { at: self.at })?;

        let updated: String = s
            .chars()
            .enumerate()
            .map(|(pos, c)| if pos == i { new_char } else { c })
            .collect();
        self.write_var(var, Value::Str(updated))
    }

    // ---- Types ----

    /// TYPE is the one read that tolerates an uninitialized variable:
    /// it yields the empty string.
    fn exec_type(&mut self, instr: &Instruction) -> Result<(), RuntimeError> {
        let name = match instr.operands.get(1) {
            Some(Operand::Var(var)) => self.slot(var)?.map_or("", Value::type_name),
            _ => self.symb(instr, 1)?.type_name(),
        };

        self.store(instr, 0, Value::Str(name.to_string()))
    }

    // ---- Control flow ----

    fn exec_conditional_jump(
        &mut self,
        instr: &Instruction,
        when_equal: bool,
    ) -> Result<(), RuntimeError> {
        // The label must exist whether or not the jump is taken.
        let target = self.label_target(instr, 0)?;
        let a = self.symb(instr, 1)?;
        let b = self.symb(instr, 2)?;

        let equal =
            values_equal(&a, &b).ok_or_else(|| self.type_mismatch(instr.opcode))?;
        if equal == when_equal {
            self.pc = target;
        }
        Ok(())
    }

    fn exec_exit(&mut self, instr: &Instruction) -> Result<Halt, RuntimeError> {
        let code = match self.symb(instr, 0)? {
            Value::Int(n) => n,
            _ => return Err(self.type_mismatch(instr.opcode)),
        };

        let code = u8::try_from(code)
            .ok()
            .filter(|c| *c <= 49)
            .ok_or(RuntimeError::InvalidExitCode { at: self.at, code })?;

        debug!(code, executed = self.executed, "exit");
        self.output.flush().map_err(|e| self.io_error(e))?;
        Ok(Halt::Exit(code))
    }

    // ---- Debugging ----

    fn exec_dprint(&mut self, instr: &Instruction) -> Result<(), RuntimeError> {
        let value = self.symb(instr, 0)?;
        writeln!(self.diagnostics, "{value}").map_err(|e| self.io_error(e))
    }

    fn exec_break(&mut self) -> Result<(), RuntimeError> {
        let mut lines = vec![
            format!("BREAK at instruction {} ({} executed)", self.at, self.executed),
            format!("GF: {}", describe_frame(&self.global)),
        ];
        for (depth, frame) in self.locals.iter().rev().enumerate() {
            lines.push(format!("LF[{depth}]: {}", describe_frame(frame)));
        }
        lines.push(match &self.temporary {
            Some(frame) => format!("TF: {}", describe_frame(frame)),
            None => "TF: <undefined>".to_string(),
        });
        let stack: Vec<String> = self.data_stack.iter().map(describe).collect();
        lines.push(format!("data stack: [{}]", stack.join(", ")));
        lines.push(format!("call stack: {:?}", self.call_stack));

        writeln!(self.diagnostics, "{}", lines.join("\n")).map_err(|e| self.io_error(e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::Slot;
    use ippcode_common::{FrameTag, Program, Variable};

    #[test]
    fn nil_equality_rules() {
        assert_eq!(values_equal(&Value::Nil, &Value::Nil), Some(true));
        assert_eq!(values_equal(&Value::Nil, &Value::Int(0)), Some(false));
        assert_eq!(values_equal(&Value::from(""), &Value::Nil), Some(false));
        assert_eq!(values_equal(&Value::Int(1), &Value::from("1")), None);
        assert_eq!(values_equal(&Value::Bool(true), &Value::Bool(true)), Some(true));
    }

    #[test]
    fn ordering_rules() {
        assert_eq!(
            values_ordering(&Value::Bool(false), &Value::Bool(true)),
            Some(Ordering::Less)
        );
        assert_eq!(
            values_ordering(&Value::from("abc"), &Value::from("abd")),
            Some(Ordering::Less)
        );
        assert_eq!(
            values_ordering(&Value::from("b"), &Value::from("a")),
            Some(Ordering::Greater)
        );
        assert_eq!(values_ordering(&Value::Nil, &Value::Nil), None);
        assert_eq!(values_ordering(&Value::Int(1), &Value::Bool(true)), None);
    }

    #[test]
    fn frame_description() {
        let mut frame = Frame::new();
        frame.declare("x");
        frame.declare("s");
        frame.assign("s", Value::from("hi"));
        assert_eq!(describe_frame(&frame), "{s=string@hi, x=<uninitialized>}");
    }

    #[test]
    fn nil_is_initialized_not_uninitialized() {
        // TYPE relies on Slot distinguishing uninitialized from nil.
        let mut frame = Frame::new();
        frame.declare("n");
        assert_eq!(frame.lookup("n"), Slot::Uninitialized);
        frame.assign("n", Value::Nil);
        assert_eq!(frame.lookup("n"), Slot::Initialized(&Value::Nil));
    }

    #[test]
    fn read_with_a_non_type_operand_is_a_structure_error() {
        let program = Program::default();
        let mut vm = VM::new(&program);
        vm.global.declare("x");
        let instr = Instruction::new(
            Opcode::Read,
            vec![
                Operand::Var(Variable::new(FrameTag::Global, "x")),
                Operand::Const(Value::Int(1)),
            ],
        );
        let err = vm.exec_read(&instr).unwrap_err();
        assert!(matches!(err, RuntimeError::Structure { at: 0, .. }));
        assert_eq!(err.exit_code(), 32);
    }
}
