//! # Quadruple Intermediate Representation
//!
//! The translator lowers Duckling source to a flat list of quadruples that
//! address a typed memory layout shared with the virtual machine.
//!
//! ## Module Structure
//!
//! ```text
//! ir/
//! ├── mod.rs          # This file - module definition and re-exports
//! ├── memory_model.rs # Address space layout: segments, value types, literals
//! ├── instruction.rs  # Opcode, Operator, Quadruple
//! └── program.rs      # QuadrupleList, MemoryMap, ObjectFile (persisted form)
//! ```
//!
//! ## Key Types
//!
//! - [`Segment`] - A (scope, type) pair owning one fixed address range
//! - [`Quadruple`] - `op left right result`, `-1` marking unused fields
//! - [`ObjectFile`] - Memory descriptors, constant table and quadruples,
//!   the unit handed from the compiler to the virtual machine

mod instruction;
pub mod memory_model;
mod program;

pub use instruction::{Opcode, Operator, Quadruple, UNUSED};
pub use memory_model::{
    Address, Literal, Scope, Segment, ValueType, ADDRESS_SPACE_END, ADDRESS_SPACE_START, LAYOUT,
    SEGMENT_SIZE,
};
pub use program::{
    Constant, FrameSize, MemoryMap, ObjectFile, QuadrupleList, SegmentSize, SECTION_END,
};
