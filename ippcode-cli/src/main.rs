//! IPPcode23 interpreter CLI.
//!
//! Exit codes:
//! - 0: Success, or `EXIT int@0`
//! - 1-49: The program's own `EXIT` code
//! - 10: Bad invocation
//! - 11: Source file cannot be read
//! - 12: Input file cannot be read
//! - 31: Source is not well-formed XML
//! - 32: Source is not a valid program
//! - 52-58: Runtime errors (see `ippcode_vm::RuntimeError::exit_code`)
//! - 99: Internal or output failure

mod commands;

use std::path::PathBuf;
use std::process;

use clap::error::ErrorKind;
use clap::{CommandFactory, Parser, ValueEnum};
use ippcode_loader::SourceFormat;
use tracing_subscriber::{fmt, EnvFilter};

/// Source representation accepted by `--format`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Format {
    Xml,
    Text,
}

impl From<Format> for SourceFormat {
    fn from(format: Format) -> Self {
        match format {
            Format::Xml => SourceFormat::Xml,
            Format::Text => SourceFormat::Text,
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "ippcode", version)]
#[command(about = "Interpret IPPcode23 programs")]
#[command(disable_help_flag = true)]
pub struct Args {
    /// Program source file (read from standard input when omitted)
    #[arg(long, value_name = "FILE")]
    pub source: Option<PathBuf>,

    /// Lines consumed by READ (read from standard input when omitted)
    #[arg(long, value_name = "FILE")]
    pub input: Option<PathBuf>,

    /// Representation of the program source
    #[arg(long, value_enum, default_value_t = Format::Xml)]
    pub format: Format,

    /// Print the loaded program as IPPcode23 text instead of running it
    #[arg(long)]
    pub disassemble: bool,

    /// Print help (not allowed together with --source or --input)
    #[arg(short, long)]
    pub help: bool,
}

impl Args {
    /// Rules on top of clap's: `--help` excludes both file flags, and
    /// otherwise at least one of them is required.
    fn validate(self) -> Result<Self, clap::Error> {
        let names_a_file = self.source.is_some() || self.input.is_some();
        if self.help && names_a_file {
            return Err(Args::command().error(
                ErrorKind::ArgumentConflict,
                "--help cannot be combined with --source or --input",
            ));
        }
        if !self.help && !names_a_file {
            return Err(Args::command().error(
                ErrorKind::MissingRequiredArgument,
                "at least one of --source or --input is required",
            ));
        }
        Ok(self)
    }
}

/// Install a stderr subscriber. `RUST_LOG` overrides the default `warn`.
fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    init_logging();

    let args = match Args::try_parse().and_then(Args::validate) {
        Ok(args) => args,
        Err(e) => {
            let _ = e.print();
            match e.kind() {
                ErrorKind::DisplayVersion => process::exit(0),
                _ => process::exit(10),
            }
        }
    };

    if args.help {
        let _ = Args::command().print_help();
        process::exit(0);
    }

    let result = if args.disassemble {
        commands::disassemble(&args)
    } else {
        commands::interpret(&args)
    };

    if let Err(code) = result {
        process::exit(code);
    }
}
