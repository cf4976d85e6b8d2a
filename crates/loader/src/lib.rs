//! IPPcode23 loaders: XML and text front ends, and a disassembler.
//!
//! Both front ends produce the same [`Program`]; every literal is converted
//! once, here, and every instruction is checked against its opcode's
//! signature before the engine sees it.
//!
//! # Usage
//!
//! ```
//! use ippcode_loader::{assemble, disassemble};
//!
//! let text = ".IPPcode23\nDEFVAR GF@x\nMOVE GF@x string@hi\\032there\nWRITE GF@x\n";
//! let program = assemble(text).unwrap();
//! assert_eq!(program.len(), 3);
//! assert_eq!(disassemble(&program), text);
//! ```
//!
//! # Roundtrip Guarantee
//!
//! `assemble(disassemble(program)) == program` holds for all valid programs.
//! The disassembler outputs canonical text; the assembler also accepts
//! comments, blank lines, any opcode case and non-decimal integers.

pub mod error;
pub mod xml;

mod disassembler;
mod lexer;
mod parser;

pub use disassembler::disassemble;
pub use error::{LoadError, Location, StructureError};
pub use xml::load_xml;

use ippcode_common::Program;
use lexer::tokenize_line;
use parser::{is_header, parse_line};
use tracing::debug;

/// Representation of a program's source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SourceFormat {
    #[default]
    Xml,
    Text,
}

/// Load a program in the given representation.
pub fn load(source: &str, format: SourceFormat) -> Result<Program, LoadError> {
    match format {
        SourceFormat::Xml => load_xml(source),
        SourceFormat::Text => assemble(source),
    }
}

/// Assemble IPPcode23 source text into a program.
///
/// The first non-blank line must be the `.IPPcode23` header. Returns the
/// first error encountered.
pub fn assemble(text: &str) -> Result<Program, LoadError> {
    let mut instructions = Vec::new();
    let mut seen_header = false;

    for (idx, line) in text.lines().enumerate() {
        let line_num = idx + 1;
        let tokens = tokenize_line(line);
        if tokens.is_empty() {
            continue;
        }

        if !seen_header {
            if !is_header(&tokens) {
                return Err(LoadError::structure(
                    Location::Line(line_num),
                    StructureError::MissingHeader,
                ));
            }
            seen_header = true;
            continue;
        }

        let instr =
            parse_line(&tokens).map_err(|e| LoadError::structure(Location::Line(line_num), e))?;
        instructions.push(instr);
    }

    if !seen_header {
        return Err(LoadError::structure(
            Location::Line(1),
            StructureError::MissingHeader,
        ));
    }

    debug!(instructions = instructions.len(), "assembled text program");
    Ok(Program::new(instructions))
}
