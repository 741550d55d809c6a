//! Runtime memory image
//!
//! Mirrors the compile-time layout: one program-lifetime cell array per
//! global, temporary and constant segment, plus a stack of local frames.
//! An address is decoded purely by range membership.

use super::value::Value;
use crate::compiler::ir::{Address, Constant, FrameSize, MemoryMap, Segment, ValueType};
use crate::error::{Error, Result};
use std::collections::HashMap;

/// Fixed-size typed cell array
#[derive(Debug, Clone)]
pub struct MemorySegment {
    ty: ValueType,
    cells: Vec<Option<Value>>,
}

impl MemorySegment {
    /// Segment of `size` unwritten cells of type `ty`
    pub fn new(ty: ValueType, size: usize) -> Self {
        Self {
            ty,
            cells: vec![None; size],
        }
    }

    /// Element type
    pub fn value_type(&self) -> ValueType {
        self.ty
    }

    /// Number of cells
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// True when the segment has no cells
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Cell content, `None` when never written or out of range
    pub fn get(&self, offset: usize) -> Option<&Value> {
        self.cells.get(offset).and_then(Option::as_ref)
    }

    /// Store a value converted to the segment type
    pub fn set(&mut self, offset: usize, value: Value) -> Result<()> {
        let value = value.coerce(self.ty)?;
        let size = self.cells.len();
        let cell = self.cells.get_mut(offset).ok_or_else(|| {
            Error::runtime(format!("offset {} outside a {}-cell segment", offset, size))
        })?;
        *cell = Some(value);
        Ok(())
    }
}

/// Local storage of one active call
#[derive(Debug, Clone)]
pub struct Frame {
    /// Function id
    pub function: Address,
    ints: MemorySegment,
    floats: MemorySegment,
    next_int: usize,
    next_float: usize,
    /// Allocated but not yet entered; argument reads still belong to the caller
    pending: bool,
}

impl Frame {
    fn new(size: &FrameSize) -> Self {
        Self {
            function: size.function,
            ints: MemorySegment::new(ValueType::Int, size.ints),
            floats: MemorySegment::new(ValueType::Float, size.floats),
            next_int: 0,
            next_float: 0,
            pending: true,
        }
    }

    fn segment(&self, ty: ValueType) -> Option<&MemorySegment> {
        match ty {
            ValueType::Int => Some(&self.ints),
            ValueType::Float => Some(&self.floats),
            _ => None,
        }
    }

    fn segment_mut(&mut self, ty: ValueType) -> Option<&mut MemorySegment> {
        match ty {
            ValueType::Int => Some(&mut self.ints),
            ValueType::Float => Some(&mut self.floats),
            _ => None,
        }
    }
}

/// Global image plus the local frame stack
#[derive(Debug, Clone)]
pub struct RuntimeMemory {
    globals: HashMap<Segment, MemorySegment>,
    frames: Vec<Frame>,
    frame_sizes: HashMap<Address, FrameSize>,
}

impl RuntimeMemory {
    /// Build the image from the memory map and load the constant table
    pub fn new(map: &MemoryMap, constants: &[Constant]) -> Result<Self> {
        let globals = Segment::all()
            .filter(|segment| !segment.is_local())
            .map(|segment| (segment, MemorySegment::new(segment.ty, map.cells(segment))))
            .collect();
        let frame_sizes = map.functions.iter().map(|f| (f.function, *f)).collect();

        let mut memory = Self {
            globals,
            frames: Vec::new(),
            frame_sizes,
        };
        for constant in constants {
            let value = match &constant.literal {
                crate::compiler::ir::Literal::Int(n) => Value::Int(*n),
                crate::compiler::ir::Literal::Float(x) => Value::Float(*x),
                crate::compiler::ir::Literal::Str(s) => Value::Str(s.clone()),
            };
            memory.write(constant.address, value)?;
        }
        Ok(memory)
    }

    /// Number of frames, pending ones included
    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    /// Read a cell
    ///
    /// Local addresses resolve against the active frame, falling back to the
    /// frame beneath it when the active frame has no value there yet.
    pub fn read(&self, address: Address) -> Result<Value> {
        let (segment, offset) = decode(address)?;

        let value = if segment.is_local() {
            let active = self.active_index()?;
            let top = self.frames[active]
                .segment(segment.ty)
                .and_then(|s| s.get(offset));
            top.or_else(|| {
                active
                    .checked_sub(1)
                    .and_then(|below| self.frames[below].segment(segment.ty))
                    .and_then(|s| s.get(offset))
            })
        } else {
            self.globals.get(&segment).and_then(|s| s.get(offset))
        };

        value
            .cloned()
            .ok_or(Error::UninitializedRead { address })
    }

    /// Write a cell, converting to the cell type
    pub fn write(&mut self, address: Address, value: Value) -> Result<()> {
        let (segment, offset) = decode(address)?;

        let target = if segment.is_local() {
            let active = self.active_index()?;
            self.frames[active].segment_mut(segment.ty)
        } else {
            self.globals.get_mut(&segment)
        };
        target
            .ok_or_else(|| Error::runtime(format!("no storage for {}", segment)))?
            .set(offset, value)
    }

    /// Push a pending frame for `function`
    pub fn allocate(&mut self, function: Address) -> Result<()> {
        let size = self
            .frame_sizes
            .get(&function)
            .ok_or_else(|| Error::runtime(format!("no frame descriptor for function {}", function)))?;
        self.frames.push(Frame::new(size));
        tracing::debug!(function, depth = self.frames.len(), "frame allocated");
        Ok(())
    }

    /// Copy an argument into the next free slot of the pending frame
    pub fn param(&mut self, value: Value, position: usize) -> Result<()> {
        let frame = self
            .frames
            .last_mut()
            .filter(|f| f.pending)
            .ok_or_else(|| Error::runtime("parameter without an allocated frame"))?;

        let (segment, slot) = match value {
            Value::Int(_) | Value::Bool(_) => (&mut frame.ints, &mut frame.next_int),
            Value::Float(_) => (&mut frame.floats, &mut frame.next_float),
            Value::Str(_) => {
                return Err(Error::TypeError {
                    expected: "int or float".to_string(),
                    got: value.type_name(),
                })
            }
        };
        segment.set(*slot, value)?;
        tracing::trace!(position, slot = *slot, "parameter copied");
        *slot += 1;
        Ok(())
    }

    /// Make the pending frame the active one
    pub fn enter(&mut self) -> Result<()> {
        let frame = self
            .frames
            .last_mut()
            .filter(|f| f.pending)
            .ok_or_else(|| Error::runtime("call without an allocated frame"))?;
        frame.pending = false;
        Ok(())
    }

    /// Pop the active frame
    pub fn release(&mut self) -> Result<()> {
        let frame = self
            .frames
            .pop()
            .ok_or_else(|| Error::runtime("return without an active frame"))?;
        tracing::debug!(function = frame.function, depth = self.frames.len(), "frame released");
        Ok(())
    }

    /// Index of the topmost entered frame
    fn active_index(&self) -> Result<usize> {
        self.frames
            .iter()
            .rposition(|f| !f.pending)
            .ok_or_else(|| Error::runtime("local address used outside a function"))
    }
}

fn decode(address: Address) -> Result<(Segment, usize)> {
    match (Segment::of(address), Segment::offset_of(address)) {
        (Some(segment), Some(offset)) => Ok((segment, offset)),
        _ => Err(Error::runtime(format!(
            "address {} is outside the address space",
            address
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::ir::{Literal, SegmentSize};

    fn memory() -> RuntimeMemory {
        let map = MemoryMap {
            segments: vec![
                SegmentSize {
                    segment: Segment::global(ValueType::Int),
                    cells: 2,
                },
                SegmentSize {
                    segment: Segment::constant(ValueType::Float),
                    cells: 1,
                },
            ],
            functions: vec![FrameSize {
                function: 1000,
                ints: 2,
                floats: 1,
            }],
        };
        let constants = vec![Constant {
            address: 8000,
            literal: Literal::Float(2.5),
        }];
        RuntimeMemory::new(&map, &constants).unwrap()
    }

    #[test]
    fn test_constants_are_loaded() {
        assert_eq!(memory().read(8000).unwrap(), Value::Float(2.5));
    }

    #[test]
    fn test_write_coerces_to_cell_type() {
        let mut mem = memory();
        mem.write(2000, Value::Float(2.9)).unwrap();
        assert_eq!(mem.read(2000).unwrap(), Value::Int(2));
    }

    #[test]
    fn test_uninitialized_and_out_of_range() {
        let mut mem = memory();
        assert_eq!(mem.read(2001), Err(Error::UninitializedRead { address: 2001 }));
        assert!(mem.write(2005, Value::Int(1)).is_err());
        assert!(mem.read(99).is_err());
    }

    #[test]
    fn test_params_fill_slots_in_order() {
        let mut mem = memory();
        mem.allocate(1000).unwrap();
        mem.param(Value::Int(7), 0).unwrap();
        mem.param(Value::Float(1.5), 1).unwrap();
        mem.param(Value::Int(9), 2).unwrap();
        mem.enter().unwrap();

        assert_eq!(mem.read(10000).unwrap(), Value::Int(7));
        assert_eq!(mem.read(10001).unwrap(), Value::Int(9));
        assert_eq!(mem.read(11000).unwrap(), Value::Float(1.5));
    }

    #[test]
    fn test_pending_frame_is_invisible_to_reads() {
        let mut mem = memory();
        mem.allocate(1000).unwrap();
        mem.param(Value::Int(1), 0).unwrap();
        mem.param(Value::Int(2), 1).unwrap();
        mem.enter().unwrap();

        // Caller frame is active; a callee frame is being prepared
        mem.allocate(1000).unwrap();
        let b = mem.read(10001).unwrap();
        mem.param(b, 0).unwrap();
        let a = mem.read(10000).unwrap();
        mem.param(a, 1).unwrap();
        mem.enter().unwrap();

        assert_eq!(mem.read(10000).unwrap(), Value::Int(2));
        assert_eq!(mem.read(10001).unwrap(), Value::Int(1));

        mem.release().unwrap();
        assert_eq!(mem.read(10000).unwrap(), Value::Int(1));
    }

    #[test]
    fn test_read_falls_back_to_frame_beneath() {
        let mut mem = memory();
        mem.allocate(1000).unwrap();
        mem.enter().unwrap();
        mem.write(11000, Value::Float(4.0)).unwrap();

        mem.allocate(1000).unwrap();
        mem.enter().unwrap();
        assert_eq!(mem.read(11000).unwrap(), Value::Float(4.0));
        assert_eq!(mem.depth(), 2);
    }

    #[test]
    fn test_local_access_outside_function() {
        let mem = memory();
        assert!(matches!(mem.read(10000), Err(Error::RuntimeError(_))));
    }
}
