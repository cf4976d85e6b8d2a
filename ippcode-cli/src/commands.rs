//! CLI command implementations.
//!
//! Each command returns `Err(code)` with the process exit code after
//! reporting the problem on stderr.

use std::fs;
use std::io::{self, BufWriter, Read, Write};
use std::path::Path;

use ippcode_common::Program;
use ippcode_vm::{Halt, InputSource, Interactive, LineQueue, VM};
use tracing::debug;

use crate::Args;

/// Load the program and execute it.
///
/// A non-zero `EXIT` code is returned as `Err` so it reaches the process
/// exit status unchanged.
pub fn interpret(args: &Args) -> Result<(), i32> {
    let program = load_program(args)?;
    let input = open_input(args.input.as_deref())?;

    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    let result = VM::new(&program)
        .with_input(input)
        .with_output(&mut out)
        .with_diagnostics(io::stderr())
        .execute();

    // Output produced before a runtime error is still delivered.
    if let Err(e) = out.flush() {
        eprintln!("error: cannot write output: {e}");
        return Err(99);
    }

    match result {
        Ok(Halt::EndOfProgram) | Ok(Halt::Exit(0)) => Ok(()),
        Ok(halt) => {
            debug!(code = halt.code(), "program exited");
            Err(halt.code())
        }
        Err(e) => {
            eprintln!("error: {e}");
            Err(e.exit_code())
        }
    }
}

/// Load the program and print it as canonical IPPcode23 text.
pub fn disassemble(args: &Args) -> Result<(), i32> {
    let program = load_program(args)?;
    print!("{}", ippcode_loader::disassemble(&program));
    io::stdout().flush().map_err(|e| {
        eprintln!("error: cannot write output: {e}");
        99
    })
}

fn load_program(args: &Args) -> Result<Program, i32> {
    let text = read_source(args.source.as_deref())?;
    let program = ippcode_loader::load(&text, args.format.into()).map_err(|e| {
        eprintln!("error: {e}");
        e.exit_code()
    })?;
    debug!(instructions = program.len(), "program loaded");
    Ok(program)
}

fn read_source(path: Option<&Path>) -> Result<String, i32> {
    match path {
        Some(path) => fs::read_to_string(path).map_err(|e| {
            eprintln!("error: cannot read '{}': {e}", path.display());
            11
        }),
        None => {
            let mut text = String::new();
            io::stdin().read_to_string(&mut text).map_err(|e| {
                eprintln!("error: cannot read source from stdin: {e}");
                11
            })?;
            Ok(text)
        }
    }
}

fn open_input(path: Option<&Path>) -> Result<Box<dyn InputSource>, i32> {
    match path {
        Some(path) => {
            let text = fs::read_to_string(path).map_err(|e| {
                eprintln!("error: cannot read '{}': {e}", path.display());
                12
            })?;
            Ok(Box::new(LineQueue::from_text(&text)))
        }
        None => Ok(Box::new(Interactive::new(io::stdin().lock()))),
    }
}
