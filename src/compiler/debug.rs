//! Debug utilities for Duckling compilation
//!
//! Human-readable listings of compiled programs.

use super::ir::{Address, Literal, ObjectFile, Opcode, Quadruple, Segment, UNUSED};
use std::collections::HashMap;
use std::fmt::Write;

/// Render memory descriptors, constants and an annotated quadruple listing
pub fn format_program(object: &ObjectFile) -> String {
    let literals: HashMap<Address, &Literal> = object
        .constants
        .iter()
        .map(|c| (c.address, &c.literal))
        .collect();

    let mut out = String::new();
    let rule = "═".repeat(59);
    let _ = writeln!(out, "{}", rule);
    let _ = writeln!(out, "{:^59}", "QUADRUPLES");
    let _ = writeln!(out, "{}", rule);

    for size in object.memory.segments.iter().filter(|s| s.cells > 0) {
        let _ = writeln!(out, "{:<14} {} cells", size.segment.to_string(), size.cells);
    }
    for frame in &object.memory.functions {
        let _ = writeln!(
            out,
            "function {:<5} {} int, {} float locals",
            frame.function, frame.ints, frame.floats
        );
    }
    let _ = writeln!(out, "{}", "─".repeat(59));

    for (i, quad) in object.quadruples.iter().enumerate() {
        let _ = writeln!(out, "{:04}: {}", i, format_quadruple(quad, &literals));
    }
    let _ = write!(out, "{}", rule);
    out
}

/// Format a single quadruple, showing constants by value
pub fn format_quadruple(quad: &Quadruple, literals: &HashMap<Address, &Literal>) -> String {
    let operand = |address: Address| format_operand(address, literals);
    match quad.op {
        Opcode::Goto => format!("GOTO {}", quad.result),
        Opcode::GotoFalse => format!("GOTOF {} -> {}", operand(quad.left), quad.result),
        Opcode::GotoTrue => format!("GOTOT {} -> {}", operand(quad.left), quad.result),
        Opcode::Call => format!("GOSUB fn{} -> {}", quad.left, quad.result),
        Opcode::AllocateFrame => format!("ERA fn{}", quad.left),
        Opcode::Return => "ENDFUNC".to_string(),
        Opcode::Param => format!("PARAM {} -> #{}", operand(quad.left), quad.result),
        Opcode::Print => format!("PRINT {}", operand(quad.left)),
        Opcode::Assign => format!("{} = {}", operand(quad.result), operand(quad.left)),
        op => format!(
            "{} = {} {} {}",
            operand(quad.result),
            operand(quad.left),
            op.mnemonic(),
            operand(quad.right)
        ),
    }
}

fn format_operand(address: Address, literals: &HashMap<Address, &Literal>) -> String {
    if address == UNUSED {
        return "_".to_string();
    }
    if let Some(literal) = literals.get(&address) {
        return literal.to_string();
    }
    match (Segment::of(address), Segment::offset_of(address)) {
        (Some(segment), Some(offset)) => format!("{}[{}]", segment, offset),
        _ => format!("?{}", address),
    }
}
