//! Compile-time address allocation
//!
//! The planner hands out addresses segment by segment. Program-lifetime
//! segments share one counter each; local segments get a fresh pair of
//! counters per function so every frame starts at the segment base.

use super::ir::{
    Address, Constant, FrameSize, Literal, MemoryMap, Scope, Segment, SegmentSize, ValueType,
    SEGMENT_SIZE,
};
use crate::error::{Error, Result};
use std::collections::HashMap;

/// Local counters of one function
#[derive(Debug, Clone)]
struct FrameCounters {
    function: Address,
    next_int: Address,
    next_float: Address,
}

/// Address allocator shared by all translation actions
#[derive(Debug, Clone, Default)]
pub struct MemoryPlanner {
    /// Next free address of each program-lifetime segment
    counters: HashMap<Segment, Address>,
    /// Frames in declaration order
    frames: Vec<FrameCounters>,
    /// Function whose locals are being allocated
    current: Option<usize>,
    /// (segment, literal key) -> interned address
    interned: HashMap<(Segment, String), Address>,
    /// Constant table in allocation order
    constants: Vec<Constant>,
}

impl MemoryPlanner {
    /// Create a planner with every counter at its segment base
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate an address in `segment`
    ///
    /// Constant segments need the literal and return the interned address
    /// when the same literal was seen before. Every other segment ignores
    /// the literal and returns a fresh address.
    pub fn assign(&mut self, segment: Segment, literal: Option<&Literal>) -> Result<Address> {
        let base = segment
            .base()
            .ok_or_else(|| Error::compiler(format!("no segment {} in the layout", segment)))?;

        match segment.scope {
            Scope::Constant => {
                let literal = literal.ok_or_else(|| {
                    Error::compiler(format!("constant segment {} needs a literal", segment))
                })?;
                if literal.value_type() != segment.ty {
                    return Err(Error::compiler(format!(
                        "{} literal in segment {}",
                        literal.value_type(),
                        segment
                    )));
                }
                let key = (segment, literal.key());
                if let Some(address) = self.interned.get(&key) {
                    return Ok(*address);
                }
                let address = bump(self.counters.entry(segment).or_insert(base), base, segment)?;
                self.interned.insert(key, address);
                self.constants.push(Constant {
                    address,
                    literal: literal.clone(),
                });
                Ok(address)
            }
            Scope::Local => {
                let index = self.current.ok_or_else(|| {
                    Error::compiler(format!("{} address requested outside a function", segment))
                })?;
                let frame = &mut self.frames[index];
                let counter = match segment.ty {
                    ValueType::Int => &mut frame.next_int,
                    ValueType::Float => &mut frame.next_float,
                    _ => return Err(Error::compiler(format!("no segment {}", segment))),
                };
                if *counter == 0 {
                    *counter = base;
                }
                bump(counter, base, segment)
            }
            Scope::Global | Scope::Temporary => {
                bump(self.counters.entry(segment).or_insert(base), base, segment)
            }
        }
    }

    /// Intern a literal in the constant segment of its type
    pub fn constant(&mut self, literal: &Literal) -> Result<Address> {
        self.assign(Segment::constant(literal.value_type()), Some(literal))
    }

    /// Route local allocations to `function`'s frame
    pub fn enter_function(&mut self, function: Address) {
        let index = match self.frames.iter().position(|f| f.function == function) {
            Some(index) => index,
            None => {
                self.frames.push(FrameCounters {
                    function,
                    next_int: 0,
                    next_float: 0,
                });
                self.frames.len() - 1
            }
        };
        self.current = Some(index);
    }

    /// Stop routing local allocations
    pub fn leave_function(&mut self) {
        self.current = None;
    }

    /// Used cell counts per segment and per function frame
    pub fn memory_map(&self) -> MemoryMap {
        let segments = Segment::all()
            .filter(|segment| !segment.is_local())
            .map(|segment| {
                let used = match (self.counters.get(&segment), segment.base()) {
                    (Some(next), Some(base)) => (next - base) as usize,
                    _ => 0,
                };
                SegmentSize {
                    segment,
                    cells: used,
                }
            })
            .collect();

        let functions = self
            .frames
            .iter()
            .map(|frame| FrameSize {
                function: frame.function,
                ints: used_locals(frame.next_int, ValueType::Int),
                floats: used_locals(frame.next_float, ValueType::Float),
            })
            .collect();

        MemoryMap {
            segments,
            functions,
        }
    }

    /// Interned literals in allocation order
    pub fn constants(&self) -> &[Constant] {
        &self.constants
    }
}

/// Return the counter value and advance it, failing once the segment is full
fn bump(counter: &mut Address, base: Address, segment: Segment) -> Result<Address> {
    if *counter >= base + SEGMENT_SIZE {
        return Err(Error::compiler(format!(
            "segment {} exhausted ({} cells)",
            segment, SEGMENT_SIZE
        )));
    }
    let address = *counter;
    *counter += 1;
    Ok(address)
}

fn used_locals(next: Address, ty: ValueType) -> usize {
    match Segment::local(ty).base() {
        Some(base) if next >= base => (next - base) as usize,
        _ => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fresh_addresses_are_sequential() {
        let mut planner = MemoryPlanner::new();
        let seg = Segment::global(ValueType::Int);
        assert_eq!(planner.assign(seg, None).unwrap(), 2000);
        assert_eq!(planner.assign(seg, None).unwrap(), 2001);
        assert_eq!(
            planner.assign(Segment::temporary(ValueType::Bool), None).unwrap(),
            6000
        );
    }

    #[test]
    fn test_literals_are_interned() {
        let mut planner = MemoryPlanner::new();
        let a = planner.constant(&Literal::Int(2)).unwrap();
        let b = planner.constant(&Literal::Float(2.0)).unwrap();
        let c = planner.constant(&Literal::Int(2)).unwrap();
        assert_eq!(a, 7000);
        assert_eq!(b, 8000);
        assert_eq!(a, c);
        assert_eq!(planner.constants().len(), 2);
    }

    #[test]
    fn test_each_function_starts_at_local_base() {
        let mut planner = MemoryPlanner::new();
        planner.enter_function(1000);
        assert_eq!(planner.assign(Segment::local(ValueType::Int), None).unwrap(), 10000);
        assert_eq!(planner.assign(Segment::local(ValueType::Int), None).unwrap(), 10001);
        planner.leave_function();

        planner.enter_function(1001);
        assert_eq!(planner.assign(Segment::local(ValueType::Int), None).unwrap(), 10000);
        assert_eq!(
            planner.assign(Segment::local(ValueType::Float), None).unwrap(),
            11000
        );
        planner.leave_function();

        let map = planner.memory_map();
        assert_eq!(map.frame(1000).map(|f| (f.ints, f.floats)), Some((2, 0)));
        assert_eq!(map.frame(1001).map(|f| (f.ints, f.floats)), Some((1, 1)));
    }

    #[test]
    fn test_local_outside_function_is_rejected() {
        let mut planner = MemoryPlanner::new();
        assert!(planner.assign(Segment::local(ValueType::Int), None).is_err());
    }

    #[test]
    fn test_exhausted_segment() {
        let mut planner = MemoryPlanner::new();
        let seg = Segment::temporary(ValueType::Int);
        for _ in 0..SEGMENT_SIZE {
            planner.assign(seg, None).unwrap();
        }
        assert!(matches!(
            planner.assign(seg, None),
            Err(Error::CompilerError(_))
        ));
    }

    #[test]
    fn test_memory_map_counts_used_cells() {
        let mut planner = MemoryPlanner::new();
        planner.assign(Segment::global(ValueType::Float), None).unwrap();
        planner.constant(&Literal::Str("hi".into())).unwrap();
        let map = planner.memory_map();
        assert_eq!(map.cells(Segment::global(ValueType::Float)), 1);
        assert_eq!(map.cells(Segment::constant(ValueType::String)), 1);
        assert_eq!(map.cells(Segment::global(ValueType::Int)), 0);
        assert_eq!(map.segments.len(), 9);
    }
}
