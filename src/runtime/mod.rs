//! Runtime execution of compiled Duckling programs

pub mod memory;
mod value;
mod vm;

pub use memory::{Frame, MemorySegment, RuntimeMemory};
pub use value::Value;
pub use vm::{RunOptions, VirtualMachine};
