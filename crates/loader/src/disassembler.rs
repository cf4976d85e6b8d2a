//! Disassembler: program → canonical IPPcode23 text.
//!
//! Output starts with the `.IPPcode23` header, then one instruction per
//! line with single spaces between tokens. No indentation, no comments.

use std::fmt::Write;

use ippcode_common::{Operand, Program, Value};

/// Disassemble a program into canonical source text.
///
/// For every program whose instructions satisfy their signatures,
/// `assemble(&disassemble(program)) == Ok(program)`.
pub fn disassemble(program: &Program) -> String {
    let mut out = String::from(".IPPcode23\n");

    for instr in &program.instructions {
        out.push_str(instr.opcode.mnemonic());
        for operand in &instr.operands {
            out.push(' ');
            render_operand(&mut out, operand);
        }
        out.push('\n');
    }

    out
}

fn render_operand(out: &mut String, operand: &Operand) {
    // Writing into a String cannot fail.
    let _ = match operand {
        Operand::Var(var) => write!(out, "{var}"),
        Operand::Const(Value::Int(n)) => write!(out, "int@{n}"),
        Operand::Const(Value::Bool(b)) => write!(out, "bool@{b}"),
        Operand::Const(Value::Nil) => write!(out, "nil@nil"),
        Operand::Const(Value::Str(s)) => {
            out.push_str("string@");
            escape_into(out, s);
            Ok(())
        }
        Operand::Label(name) => write!(out, "{name}"),
        Operand::Type(ty) => write!(out, "{}", ty.name()),
    };
}

/// Escape characters the tokenizer would split on or treat as syntax.
fn escape_into(out: &mut String, s: &str) {
    for c in s.chars() {
        if c.is_ascii_whitespace() || c.is_ascii_control() || c == '#' || c == '\\' {
            let _ = write!(out, "\\{:03}", c as u32);
        } else {
            out.push(c);
        }
    }
}
