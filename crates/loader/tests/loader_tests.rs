//! Integration tests for the IPPcode23 loaders.
//!
//! Tests cover:
//! - Whole programs in both representations, loaded and executed
//! - Agreement between the XML and text front ends
//! - Roundtrip properties (disassemble → assemble)

use ippcode_common::{FrameTag, Instruction, Opcode, Operand, Program, TypeName, Value, Variable};
use ippcode_loader::{assemble, disassemble, load_xml, LoadError, Location, StructureError};
use ippcode_vm::{run, Halt, LineQueue};
use proptest::prelude::*;

// ---- Test helpers ----

fn execute(program: &Program, input: &[&str]) -> (Halt, String) {
    let mut out = Vec::new();
    let halt = run(program, LineQueue::new(input.iter().copied()), &mut out).unwrap();
    (halt, String::from_utf8(out).unwrap())
}

const FACTORIAL_TEXT: &str = r"
.IPPcode23
# Iterative factorial of a number read from input.
DEFVAR GF@n
DEFVAR GF@acc
DEFVAR GF@done
READ GF@n int
MOVE GF@acc int@1
LABEL loop
  LT GF@done GF@n int@2
  JUMPIFEQ end GF@done bool@true
  MUL GF@acc GF@acc GF@n
  SUB GF@n GF@n int@1
  JUMP loop
LABEL end
WRITE string@result:\032
WRITE GF@acc
";

const FACTORIAL_XML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<program language="IPPcode23">
  <instruction order="1" opcode="DEFVAR"><arg1 type="var">GF@n</arg1></instruction>
  <instruction order="2" opcode="DEFVAR"><arg1 type="var">GF@acc</arg1></instruction>
  <instruction order="3" opcode="DEFVAR"><arg1 type="var">GF@done</arg1></instruction>
  <instruction order="4" opcode="READ"><arg1 type="var">GF@n</arg1><arg2 type="type">int</arg2></instruction>
  <instruction order="5" opcode="MOVE"><arg1 type="var">GF@acc</arg1><arg2 type="int">1</arg2></instruction>
  <instruction order="6" opcode="LABEL"><arg1 type="label">loop</arg1></instruction>
  <instruction order="7" opcode="LT"><arg1 type="var">GF@done</arg1><arg2 type="var">GF@n</arg2><arg3 type="int">2</arg3></instruction>
  <instruction order="8" opcode="JUMPIFEQ"><arg1 type="label">end</arg1><arg2 type="var">GF@done</arg2><arg3 type="bool">true</arg3></instruction>
  <instruction order="9" opcode="MUL"><arg1 type="var">GF@acc</arg1><arg2 type="var">GF@acc</arg2><arg3 type="var">GF@n</arg3></instruction>
  <instruction order="10" opcode="SUB"><arg1 type="var">GF@n</arg1><arg2 type="var">GF@n</arg2><arg3 type="int">1</arg3></instruction>
  <instruction order="11" opcode="JUMP"><arg1 type="label">loop</arg1></instruction>
  <instruction order="12" opcode="LABEL"><arg1 type="label">end</arg1></instruction>
  <instruction order="13" opcode="WRITE"><arg1 type="string">result:\032</arg1></instruction>
  <instruction order="14" opcode="WRITE"><arg1 type="var">GF@acc</arg1></instruction>
</program>
"#;

// ---- Whole programs ----

#[test]
fn factorial_text() {
    let program = assemble(FACTORIAL_TEXT).unwrap();
    assert_eq!(program.len(), 14);
    assert_eq!(execute(&program, &["5"]), (Halt::EndOfProgram, "result: 120".to_string()));
}

#[test]
fn factorial_xml() {
    let program = load_xml(FACTORIAL_XML).unwrap();
    assert_eq!(execute(&program, &["6"]), (Halt::EndOfProgram, "result: 720".to_string()));
}

#[test]
fn both_front_ends_agree() {
    assert_eq!(assemble(FACTORIAL_TEXT).unwrap(), load_xml(FACTORIAL_XML).unwrap());
}

#[test]
fn xml_disassembles_to_loadable_text() {
    let program = load_xml(FACTORIAL_XML).unwrap();
    let text = disassemble(&program);
    assert!(text.starts_with(".IPPcode23\nDEFVAR GF@n\n"));
    assert!(text.contains("WRITE string@result:\\032\n"));
    assert_eq!(assemble(&text).unwrap(), program);
}

#[test]
fn functions_with_local_frames() {
    let text = r"
.IPPcode23
JUMP main
LABEL double
  DEFVAR LF@r
  ADD LF@r LF@arg LF@arg
  PUSHS LF@r
  RETURN
LABEL main
CREATEFRAME
DEFVAR TF@arg
MOVE TF@arg int@21
PUSHFRAME
CALL double
POPFRAME
DEFVAR GF@out
POPS GF@out
WRITE GF@out
EXIT int@3
WRITE string@unreachable
";
    let program = assemble(text).unwrap();
    assert_eq!(execute(&program, &[]), (Halt::Exit(3), "42".to_string()));
}

#[test]
fn string_operations() {
    let text = r"
.IPPcode23
DEFVAR GF@s
DEFVAR GF@c
DEFVAR GF@n
MOVE GF@s string@k\367\328
STRLEN GF@n GF@s
WRITE GF@n
GETCHAR GF@c GF@s int@1
WRITE GF@c
SETCHAR GF@s int@0 string@Ah
CONCAT GF@s GF@s string@!
WRITE GF@s
STRI2INT GF@n GF@s int@2
INT2CHAR GF@c GF@n
WRITE GF@c
";
    let program = assemble(text).unwrap();
    assert_eq!(
        execute(&program, &[]),
        (Halt::EndOfProgram, "3ůAůň!ň".to_string())
    );
}

// ---- Error surfaces ----

#[test]
fn text_errors_carry_line_numbers() {
    let err = assemble(".IPPcode23\nDEFVAR GF@x\nMOVE GF@x\n").unwrap_err();
    assert!(matches!(
        err,
        LoadError::Structure {
            at: Location::Line(3),
            source: StructureError::Signature(_)
        }
    ));
    assert!(err.to_string().starts_with("line 3: MOVE expects 2 operand(s)"));
}

#[test]
fn xml_errors_carry_order() {
    let xml = r#"<program language="IPPcode23">
        <instruction order="4" opcode="DEFVAR"><arg1 type="var">XF@x</arg1></instruction>
    </program>"#;
    let err = load_xml(xml).unwrap_err();
    assert!(matches!(
        err,
        LoadError::Structure {
            at: Location::Instruction(4),
            ..
        }
    ));
    assert_eq!(err.exit_code(), 32);
}

// ---- Roundtrip properties ----

fn arb_identifier() -> impl Strategy<Value = String> {
    "[a-zA-Z_$&%*!?-][a-zA-Z0-9_$&%*!?-]{0,8}"
}

fn arb_variable() -> impl Strategy<Value = Operand> {
    (
        prop_oneof![
            Just(FrameTag::Global),
            Just(FrameTag::Local),
            Just(FrameTag::Temporary)
        ],
        arb_identifier(),
    )
        .prop_map(|(frame, name)| Operand::Var(Variable::new(frame, name)))
}

fn arb_symb() -> impl Strategy<Value = Operand> {
    prop_oneof![
        arb_variable(),
        any::<i64>().prop_map(|n| Operand::Const(Value::Int(n))),
        any::<bool>().prop_map(|b| Operand::Const(Value::Bool(b))),
        any::<String>().prop_map(|s| Operand::Const(Value::Str(s))),
        Just(Operand::Const(Value::Nil)),
    ]
}

fn arb_instruction() -> impl Strategy<Value = Instruction> {
    prop_oneof![
        (arb_variable(), arb_symb()).prop_map(|(v, s)| Instruction::new(Opcode::Move, vec![v, s])),
        arb_symb().prop_map(|s| Instruction::new(Opcode::Write, vec![s])),
        arb_identifier().prop_map(|l| Instruction::new(Opcode::Label, vec![Operand::Label(l)])),
        (arb_identifier(), arb_symb(), arb_symb()).prop_map(|(l, a, b)| {
            Instruction::new(Opcode::JumpIfNeq, vec![Operand::Label(l), a, b])
        }),
        (
            arb_variable(),
            prop_oneof![
                Just(TypeName::Int),
                Just(TypeName::String),
                Just(TypeName::Bool)
            ]
        )
            .prop_map(|(v, t)| Instruction::new(Opcode::Read, vec![v, Operand::Type(t)])),
        Just(Instruction::new(Opcode::PushFrame, vec![])),
    ]
}

proptest! {
    #[test]
    fn disassemble_then_assemble_is_identity(
        instructions in prop::collection::vec(arb_instruction(), 0..12)
    ) {
        let program = Program::new(instructions);
        let text = disassemble(&program);
        prop_assert_eq!(assemble(&text), Ok(program));
    }
}
