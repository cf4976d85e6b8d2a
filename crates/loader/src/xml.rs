//! XML front end.
//!
//! ```xml
//! <program language="IPPcode23">
//!   <instruction order="1" opcode="WRITE">
//!     <arg1 type="string">hello</arg1>
//!   </instruction>
//! </program>
//! ```

use std::collections::HashSet;
use std::str::FromStr;

use ippcode_common::{Instruction, Opcode, Operand, Program};
use roxmltree::{Document, Node};
use tracing::debug;

use crate::error::{LoadError, Location, StructureError};

const ARG_NAMES: [&str; 3] = ["arg1", "arg2", "arg3"];

/// Load a program from its XML representation.
pub fn load_xml(source: &str) -> Result<Program, LoadError> {
    let doc = Document::parse(source).map_err(|e| LoadError::Xml(e.to_string()))?;
    let root = doc.root_element();

    let tag = root.tag_name().name();
    if tag != "program" {
        return Err(LoadError::structure(
            Location::Document,
            StructureError::InvalidRoot {
                found: tag.to_string(),
            },
        ));
    }

    let language = root.attribute("language").ok_or_else(|| {
        LoadError::structure(
            Location::Document,
            StructureError::MissingAttribute {
                element: "program",
                attribute: "language",
            },
        )
    })?;
    if !language.eq_ignore_ascii_case("IPPcode23") {
        return Err(LoadError::structure(
            Location::Document,
            StructureError::InvalidLanguage {
                found: language.to_string(),
            },
        ));
    }

    let mut numbered = Vec::new();
    let mut seen = HashSet::new();

    for node in root.children().filter(Node::is_element) {
        let (order, instr) = load_instruction(node)?;
        if !seen.insert(order) {
            return Err(LoadError::structure(
                Location::Instruction(order),
                StructureError::DuplicateOrder,
            ));
        }
        numbered.push((order, instr));
    }

    numbered.sort_by_key(|(order, _)| *order);
    let program = Program::new(numbered.into_iter().map(|(_, instr)| instr).collect());
    debug!(instructions = program.len(), "loaded XML program");
    Ok(program)
}

fn load_instruction(node: Node<'_, '_>) -> Result<(u64, Instruction), LoadError> {
    let tag = node.tag_name().name();
    if tag != "instruction" {
        return Err(LoadError::structure(
            Location::Document,
            StructureError::UnexpectedElement {
                found: tag.to_string(),
            },
        ));
    }

    let missing = |attribute| {
        LoadError::structure(
            Location::Document,
            StructureError::MissingAttribute {
                element: "instruction",
                attribute,
            },
        )
    };

    let order_text = node.attribute("order").ok_or_else(|| missing("order"))?;
    let order = order_text
        .trim()
        .parse::<u64>()
        .ok()
        .filter(|n| *n > 0)
        .ok_or_else(|| {
            LoadError::structure(
                Location::Document,
                StructureError::InvalidOrder {
                    order: order_text.to_string(),
                },
            )
        })?;
    let at = Location::Instruction(order);

    let opcode_text = node.attribute("opcode").ok_or_else(|| missing("opcode"))?;
    let opcode =
        Opcode::from_str(opcode_text.trim()).map_err(|e| LoadError::structure(at, e))?;

    let mut args: Vec<Node<'_, '_>> = node.children().filter(Node::is_element).collect();
    for arg in &args {
        let name = arg.tag_name().name();
        if !ARG_NAMES.contains(&name) {
            return Err(LoadError::structure(
                at,
                StructureError::UnexpectedElement {
                    found: name.to_string(),
                },
            ));
        }
        if let Some(child) = arg.children().find(Node::is_element) {
            return Err(LoadError::structure(
                at,
                StructureError::UnexpectedElement {
                    found: child.tag_name().name().to_string(),
                },
            ));
        }
    }
    args.sort_by(|a, b| a.tag_name().name().cmp(b.tag_name().name()));
    let in_sequence = args
        .iter()
        .zip(ARG_NAMES)
        .all(|(arg, expected)| arg.tag_name().name() == expected);
    if !in_sequence || args.len() > ARG_NAMES.len() {
        return Err(LoadError::structure(at, StructureError::ArgumentSequence));
    }

    let operands = args
        .iter()
        .map(|arg| {
            let kind = arg.attribute("type").ok_or_else(|| {
                LoadError::structure(
                    at,
                    StructureError::MissingAttribute {
                        element: "arg",
                        attribute: "type",
                    },
                )
            })?;
            // Comments split the text into several nodes.
            let text: String = arg
                .children()
                .filter(Node::is_text)
                .filter_map(|n| n.text())
                .collect();
            Operand::parse(kind, text.trim()).map_err(|e| LoadError::structure(at, e))
        })
        .collect::<Result<Vec<_>, _>>()?;

    let instr = Instruction::new(opcode, operands);
    instr
        .check_signature()
        .map_err(|e| LoadError::structure(at, e))?;
    Ok((order, instr))
}
