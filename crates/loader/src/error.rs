//! Error types for the IPPcode23 loaders.

use std::fmt;

use ippcode_common::{OperandError, SignatureError};
use thiserror::Error;

/// Where in the source a structural problem was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Location {
    /// The document as a whole (root element, header).
    Document,
    /// An XML `instruction` element, by its `order` attribute.
    Instruction(u64),
    /// A 1-based line of textual source.
    Line(usize),
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Location::Document => write!(f, "document"),
            Location::Instruction(order) => write!(f, "instruction {order}"),
            Location::Line(line) => write!(f, "line {line}"),
        }
    }
}

/// Why a well-formed source is not a valid program.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StructureError {
    #[error("root element must be 'program', found '{found}'")]
    InvalidRoot { found: String },

    #[error("unsupported language '{found}', expected IPPcode23")]
    InvalidLanguage { found: String },

    #[error("unexpected element '{found}'")]
    UnexpectedElement { found: String },

    #[error("<{element}> is missing attribute '{attribute}'")]
    MissingAttribute {
        element: &'static str,
        attribute: &'static str,
    },

    /// `order` is not a positive integer.
    #[error("invalid instruction order '{order}'")]
    InvalidOrder { order: String },

    #[error("duplicate instruction order")]
    DuplicateOrder,

    /// Argument elements are not exactly `arg1..argN`.
    #[error("arguments must be numbered arg1..argN without gaps")]
    ArgumentSequence,

    #[error("missing .IPPcode23 header")]
    MissingHeader,

    /// A token appeared where an opcode was expected.
    #[error("unexpected token '{token}'")]
    UnexpectedToken { token: String },

    #[error(transparent)]
    Operand(#[from] OperandError),

    #[error(transparent)]
    Signature(#[from] SignatureError),
}

/// Errors produced while loading a program.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LoadError {
    /// The source is not well-formed XML.
    #[error("malformed XML: {0}")]
    Xml(String),

    /// The source parsed but does not describe a valid program.
    #[error("{at}: {source}")]
    Structure {
        at: Location,
        source: StructureError,
    },
}

impl LoadError {
    pub(crate) fn structure(at: Location, source: impl Into<StructureError>) -> Self {
        LoadError::Structure {
            at,
            source: source.into(),
        }
    }

    /// The process exit code associated with this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            LoadError::Xml(_) => 31,
            LoadError::Structure { .. } => 32,
        }
    }
}
