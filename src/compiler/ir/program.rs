//! Quadruple program and its persisted text form

use super::instruction::{Opcode, Quadruple, UNUSED};
use super::memory_model::{Address, Literal, Scope, Segment, ValueType};
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Section terminator of the persisted text
pub const SECTION_END: &str = "%%";

/// Append-only quadruple list with one-time backpatching
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QuadrupleList {
    quads: Vec<Quadruple>,
}

impl QuadrupleList {
    /// Create an empty list
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a quadruple and return its index
    pub fn push(&mut self, quad: Quadruple) -> usize {
        tracing::trace!(index = self.quads.len(), "emit {}", quad);
        self.quads.push(quad);
        self.quads.len() - 1
    }

    /// Index the next pushed quadruple will receive
    pub fn next_index(&self) -> usize {
        self.quads.len()
    }

    /// Fill the target of a pending jump
    ///
    /// A jump can be patched exactly once; patching a resolved jump, a
    /// non-jump or an index past the end is a compiler error.
    pub fn backpatch(&mut self, index: usize, target: usize) -> Result<()> {
        let quad = self
            .quads
            .get_mut(index)
            .ok_or_else(|| Error::compiler(format!("backpatch of missing quadruple {}", index)))?;
        if !quad.op.is_jump() {
            return Err(Error::compiler(format!(
                "backpatch of non-jump quadruple {} ({})",
                index,
                quad.op.mnemonic()
            )));
        }
        if quad.result != UNUSED {
            return Err(Error::compiler(format!(
                "quadruple {} already jumps to {}",
                index, quad.result
            )));
        }
        quad.result = target as Address;
        tracing::debug!(index, target, "backpatch");
        Ok(())
    }

    /// Number of emitted quadruples
    pub fn len(&self) -> usize {
        self.quads.len()
    }

    /// True when nothing has been emitted
    pub fn is_empty(&self) -> bool {
        self.quads.is_empty()
    }

    /// Indices of jumps that still have no target
    pub fn unresolved(&self) -> Vec<usize> {
        self.quads
            .iter()
            .enumerate()
            .filter(|(_, q)| q.op.is_jump() && q.result == UNUSED)
            .map(|(i, _)| i)
            .collect()
    }

    /// Emitted quadruples in order
    pub fn as_slice(&self) -> &[Quadruple] {
        &self.quads
    }

    /// Consume the list
    pub fn into_vec(self) -> Vec<Quadruple> {
        self.quads
    }
}

/// Used cell count of one program-lifetime segment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SegmentSize {
    /// Segment
    pub segment: Segment,
    /// Cells handed out by the planner
    pub cells: usize,
}

/// Local cell counts of one function's frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameSize {
    /// Function id (a global.void address)
    pub function: Address,
    /// local.int cells
    pub ints: usize,
    /// local.float cells
    pub floats: usize,
}

/// Sizing contract between the planner and the runtime memory builder
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MemoryMap {
    /// Non-local segments, in layout order
    pub segments: Vec<SegmentSize>,
    /// One entry per declared function
    pub functions: Vec<FrameSize>,
}

impl MemoryMap {
    /// Cells used in `segment`; zero when absent
    pub fn cells(&self, segment: Segment) -> usize {
        self.segments
            .iter()
            .find(|s| s.segment == segment)
            .map(|s| s.cells)
            .unwrap_or(0)
    }

    /// Frame descriptor for a function id
    pub fn frame(&self, function: Address) -> Option<&FrameSize> {
        self.functions.iter().find(|f| f.function == function)
    }
}

/// One entry of the constant table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Constant {
    /// Address in a constant segment
    pub address: Address,
    /// Literal stored there
    pub literal: Literal,
}

/// A compiled program: memory descriptors, constants and quadruples
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ObjectFile {
    /// Segment and frame sizes
    pub memory: MemoryMap,
    /// Constant table in allocation order
    pub constants: Vec<Constant>,
    /// The quadruple program
    pub quadruples: Vec<Quadruple>,
}

impl ObjectFile {
    /// Render the three-section text form
    pub fn to_text(&self) -> String {
        let mut out = String::new();

        for size in &self.memory.segments {
            out.push_str(&format!("{} {}\n", size.segment, size.cells));
        }
        for frame in &self.memory.functions {
            out.push_str(&format!(
                "function {} {} {}\n",
                frame.function, frame.ints, frame.floats
            ));
        }
        out.push_str(SECTION_END);
        out.push('\n');

        for constant in &self.constants {
            let text = match &constant.literal {
                // JSON quoting keeps embedded quotes and newlines on one line
                Literal::Str(s) => {
                    serde_json::to_string(s).unwrap_or_else(|_| format!("{:?}", s))
                }
                other => other.key(),
            };
            out.push_str(&format!("{}, {}\n", constant.address, text));
        }
        out.push_str(SECTION_END);
        out.push('\n');

        for quad in &self.quadruples {
            out.push_str(&format!("{}\n", quad));
        }
        out.push_str(SECTION_END);
        out.push('\n');

        out
    }

    /// Parse the text produced by [`ObjectFile::to_text`]
    pub fn from_text(text: &str) -> Result<Self> {
        let mut object = ObjectFile::default();
        let mut section = 0;

        for (index, raw) in text.lines().enumerate() {
            let line_no = index + 1;
            let line = raw.trim();
            if line.is_empty() {
                continue;
            }
            if line == SECTION_END {
                section += 1;
                continue;
            }
            match section {
                0 => parse_memory_line(&mut object.memory, line, line_no)?,
                1 => object.constants.push(parse_constant_line(line, line_no)?),
                2 => object.quadruples.push(parse_quadruple_line(line, line_no)?),
                _ => return Err(malformed(line_no, "content after final section")),
            }
        }

        if section < 3 {
            return Err(malformed(
                text.lines().count(),
                format!("expected 3 sections, found {}", section),
            ));
        }
        Ok(object)
    }

    /// Pretty JSON rendering
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| Error::runtime(format!("JSON encoding failed: {}", e)))
    }
}

impl fmt::Display for ObjectFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_text())
    }
}

impl FromStr for ObjectFile {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        ObjectFile::from_text(s)
    }
}

fn malformed(line: usize, message: impl Into<String>) -> Error {
    Error::FormatError {
        line,
        message: message.into(),
    }
}

fn parse_field<T: FromStr>(field: &str, line: usize, what: &str) -> Result<T> {
    field
        .parse()
        .map_err(|_| malformed(line, format!("invalid {} '{}'", what, field)))
}

fn parse_memory_line(memory: &mut MemoryMap, line: &str, line_no: usize) -> Result<()> {
    let fields: Vec<&str> = line.split_whitespace().collect();
    match fields.as_slice() {
        ["function", id, ints, floats] => {
            memory.functions.push(FrameSize {
                function: parse_field(id, line_no, "function id")?,
                ints: parse_field(ints, line_no, "cell count")?,
                floats: parse_field(floats, line_no, "cell count")?,
            });
            Ok(())
        }
        [name, cells] => {
            let segment = Segment::parse(name)
                .filter(|s| !s.is_local())
                .ok_or_else(|| malformed(line_no, format!("unknown segment '{}'", name)))?;
            memory.segments.push(SegmentSize {
                segment,
                cells: parse_field(cells, line_no, "cell count")?,
            });
            Ok(())
        }
        _ => Err(malformed(line_no, "expected '<segment> <count>' or 'function <id> <ints> <floats>'")),
    }
}

fn parse_constant_line(line: &str, line_no: usize) -> Result<Constant> {
    let (address, text) = line
        .split_once(',')
        .ok_or_else(|| malformed(line_no, "expected '<address>, <literal>'"))?;
    let address: Address = parse_field(address.trim(), line_no, "address")?;
    let text = text.trim();

    let segment = Segment::of(address)
        .filter(|s| s.scope == Scope::Constant)
        .ok_or_else(|| malformed(line_no, format!("{} is not a constant address", address)))?;

    let literal = match segment.ty {
        ValueType::Int => Literal::Int(parse_field(text, line_no, "int literal")?),
        ValueType::Float => Literal::Float(parse_field(text, line_no, "float literal")?),
        ValueType::String => Literal::Str(
            serde_json::from_str(text)
                .map_err(|e| malformed(line_no, format!("invalid string literal: {}", e)))?,
        ),
        other => {
            return Err(malformed(
                line_no,
                format!("no {} constants", other),
            ))
        }
    };
    Ok(Constant { address, literal })
}

fn parse_quadruple_line(line: &str, line_no: usize) -> Result<Quadruple> {
    let fields: Vec<&str> = line.split_whitespace().collect();
    let [op, left, right, result] = fields.as_slice() else {
        return Err(malformed(line_no, "expected 4 fields"));
    };
    let code: i64 = parse_field(op, line_no, "opcode")?;
    let op = Opcode::from_code(code)
        .ok_or_else(|| malformed(line_no, format!("unknown opcode {}", code)))?;
    Ok(Quadruple::new(
        op,
        parse_field(left, line_no, "operand")?,
        parse_field(right, line_no, "operand")?,
        parse_field(result, line_no, "result")?,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ObjectFile {
        ObjectFile {
            memory: MemoryMap {
                segments: vec![
                    SegmentSize {
                        segment: Segment::global(ValueType::Int),
                        cells: 1,
                    },
                    SegmentSize {
                        segment: Segment::constant(ValueType::String),
                        cells: 1,
                    },
                ],
                functions: vec![FrameSize {
                    function: 1000,
                    ints: 2,
                    floats: 0,
                }],
            },
            constants: vec![
                Constant {
                    address: 7000,
                    literal: Literal::Int(2),
                },
                Constant {
                    address: 8000,
                    literal: Literal::Float(3.0),
                },
                Constant {
                    address: 9000,
                    literal: Literal::Str("say \"hi\"\nbye".to_string()),
                },
            ],
            quadruples: vec![
                Quadruple::new(Opcode::Goto, UNUSED, UNUSED, 1),
                Quadruple::new(Opcode::Assign, 7000, UNUSED, 2000),
                Quadruple::new(Opcode::Print, 9000, UNUSED, UNUSED),
            ],
        }
    }

    #[test]
    fn test_text_layout() {
        let text = sample().to_text();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "global.int 1");
        assert_eq!(lines[2], "function 1000 2 0");
        assert_eq!(lines[3], "%%");
        assert_eq!(lines[4], "7000, 2");
        assert_eq!(lines[5], "8000, 3.0");
        assert_eq!(lines[6], r#"9000, "say \"hi\"\nbye""#);
        assert_eq!(lines[8], "13 -1 -1 1");
        assert_eq!(lines.last(), Some(&"%%"));
    }

    #[test]
    fn test_text_is_read_back() {
        let object = sample();
        let parsed: ObjectFile = object.to_text().parse().unwrap();
        assert_eq!(parsed, object);
    }

    #[test]
    fn test_missing_section_is_rejected() {
        let err = ObjectFile::from_text("global.int 1\n%%\n").unwrap_err();
        assert!(matches!(err, Error::FormatError { .. }));
    }

    #[test]
    fn test_bad_opcode_reports_line() {
        let err = ObjectFile::from_text("%%\n%%\n99 1 2 3\n%%\n").unwrap_err();
        assert_eq!(
            err,
            Error::FormatError {
                line: 3,
                message: "unknown opcode 99".to_string()
            }
        );
    }

    #[test]
    fn test_constant_outside_constant_segment() {
        let err = ObjectFile::from_text("%%\n2000, 5\n%%\n%%\n").unwrap_err();
        assert!(matches!(err, Error::FormatError { line: 2, .. }));
    }

    #[test]
    fn test_backpatch_once() {
        let mut quads = QuadrupleList::new();
        let jump = quads.push(Quadruple::pending_jump(Opcode::Goto, UNUSED));
        quads.push(Quadruple::new(Opcode::Print, 7000, UNUSED, UNUSED));

        assert_eq!(quads.unresolved(), vec![jump]);
        quads.backpatch(jump, 2).unwrap();
        assert!(quads.unresolved().is_empty());
        assert_eq!(quads.as_slice()[jump].result, 2);

        assert!(quads.backpatch(jump, 1).is_err());
        assert!(quads.backpatch(1, 0).is_err());
        assert!(quads.backpatch(7, 0).is_err());
    }

    #[test]
    fn test_memory_map_lookup() {
        let object = sample();
        assert_eq!(object.memory.cells(Segment::global(ValueType::Int)), 1);
        assert_eq!(object.memory.cells(Segment::global(ValueType::Float)), 0);
        assert_eq!(object.memory.frame(1000).map(|f| f.ints), Some(2));
        assert!(object.memory.frame(1001).is_none());
    }
}
