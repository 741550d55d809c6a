//! # Typed Address Space
//!
//! Every address the compiler hands out belongs to exactly one segment: a
//! contiguous range reserved for one (scope, type) pair. The range alone
//! determines where a value lives and what type it has, both while
//! translating and inside the virtual machine.
//!
//! ```text
//!  1000 ┌──────────────┐ global.void   function ids
//!  2000 │              │ global.int
//!  3000 │              │ global.float
//!  4000 │              │ temp.int
//!  5000 │              │ temp.float
//!  6000 │              │ temp.bool
//!  7000 │              │ const.int
//!  8000 │              │ const.float
//!  9000 │              │ const.string
//! 10000 │              │ local.int     resolved against the active frame
//! 11000 │              │ local.float
//! 12000 └──────────────┘
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

/// A cell address; also used for jump targets and parameter positions
pub type Address = i64;

/// Number of cells reserved for each segment
pub const SEGMENT_SIZE: Address = 1000;

/// First address of the typed address space
pub const ADDRESS_SPACE_START: Address = 1000;

/// One past the last address of the typed address space
pub const ADDRESS_SPACE_END: Address = 12000;

/// Value types known to the compiler and the virtual machine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ValueType {
    /// No value; only used for function ids
    Void,
    /// 64-bit signed integer
    Int,
    /// 64-bit float
    Float,
    /// Boolean, produced by relational operators
    Bool,
    /// String literal, only printable
    String,
}

impl ValueType {
    /// Lowercase source-level name
    pub fn name(self) -> &'static str {
        match self {
            ValueType::Void => "void",
            ValueType::Int => "int",
            ValueType::Float => "float",
            ValueType::Bool => "bool",
            ValueType::String => "string",
        }
    }

    /// Parses a lowercase type name
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "void" => Some(ValueType::Void),
            "int" => Some(ValueType::Int),
            "float" => Some(ValueType::Float),
            "bool" => Some(ValueType::Bool),
            "string" => Some(ValueType::String),
            _ => None,
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Lifetime class of an address
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Scope {
    /// Program-lifetime variables and function ids
    Global,
    /// Expression temporaries, program lifetime
    Temporary,
    /// Interned literals
    Constant,
    /// Parameters and locals, one copy per active call
    Local,
}

impl Scope {
    /// Short name used in segment names
    pub fn name(self) -> &'static str {
        match self {
            Scope::Global => "global",
            Scope::Temporary => "temp",
            Scope::Constant => "const",
            Scope::Local => "local",
        }
    }
}

/// A (scope, type) pair owning one address range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Segment {
    /// Lifetime class
    pub scope: Scope,
    /// Element type of every cell in the range
    pub ty: ValueType,
}

/// Segment bases, in address order
pub const LAYOUT: [(Segment, Address); 11] = [
    (Segment::new(Scope::Global, ValueType::Void), 1000),
    (Segment::new(Scope::Global, ValueType::Int), 2000),
    (Segment::new(Scope::Global, ValueType::Float), 3000),
    (Segment::new(Scope::Temporary, ValueType::Int), 4000),
    (Segment::new(Scope::Temporary, ValueType::Float), 5000),
    (Segment::new(Scope::Temporary, ValueType::Bool), 6000),
    (Segment::new(Scope::Constant, ValueType::Int), 7000),
    (Segment::new(Scope::Constant, ValueType::Float), 8000),
    (Segment::new(Scope::Constant, ValueType::String), 9000),
    (Segment::new(Scope::Local, ValueType::Int), 10000),
    (Segment::new(Scope::Local, ValueType::Float), 11000),
];

// Segments must be ordered, disjoint and inside the address space.
const _: () = {
    assert!(LAYOUT[0].1 >= ADDRESS_SPACE_START);
    let mut i = 1;
    while i < LAYOUT.len() {
        assert!(LAYOUT[i - 1].1 + SEGMENT_SIZE <= LAYOUT[i].1);
        i += 1;
    }
    assert!(LAYOUT[LAYOUT.len() - 1].1 + SEGMENT_SIZE <= ADDRESS_SPACE_END);
};

impl Segment {
    /// Creates a segment key
    pub const fn new(scope: Scope, ty: ValueType) -> Self {
        Segment { scope, ty }
    }

    /// Global variable segment for `ty`
    pub const fn global(ty: ValueType) -> Self {
        Segment::new(Scope::Global, ty)
    }

    /// Temporary segment for `ty`
    pub const fn temporary(ty: ValueType) -> Self {
        Segment::new(Scope::Temporary, ty)
    }

    /// Constant segment for `ty`
    pub const fn constant(ty: ValueType) -> Self {
        Segment::new(Scope::Constant, ty)
    }

    /// Local segment for `ty`
    pub const fn local(ty: ValueType) -> Self {
        Segment::new(Scope::Local, ty)
    }

    /// All segments of the layout, in address order
    pub fn all() -> impl Iterator<Item = Segment> {
        LAYOUT.iter().map(|(segment, _)| *segment)
    }

    /// First address of the segment, if the layout reserves one
    pub fn base(self) -> Option<Address> {
        LAYOUT
            .iter()
            .find(|(segment, _)| *segment == self)
            .map(|(_, base)| *base)
    }

    /// Classifies an address purely by range membership
    pub fn of(address: Address) -> Option<Segment> {
        LAYOUT
            .iter()
            .find(|(_, base)| (*base..*base + SEGMENT_SIZE).contains(&address))
            .map(|(segment, _)| *segment)
    }

    /// Offset of `address` within its segment
    pub fn offset_of(address: Address) -> Option<usize> {
        let segment = Segment::of(address)?;
        let base = segment.base()?;
        Some((address - base) as usize)
    }

    /// Name such as `global.int`
    pub fn name(self) -> String {
        format!("{}.{}", self.scope.name(), self.ty.name())
    }

    /// Parses a name produced by [`Segment::name`]
    pub fn parse(name: &str) -> Option<Segment> {
        Segment::all().find(|segment| segment.name() == name)
    }

    /// True for per-call segments
    pub fn is_local(self) -> bool {
        self.scope == Scope::Local
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.scope.name(), self.ty.name())
    }
}

/// A literal stored in the constant table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Literal {
    /// Integer literal
    Int(i64),
    /// Float literal
    Float(f64),
    /// String literal (print-only)
    Str(String),
}

impl Literal {
    /// Type of the literal
    pub fn value_type(&self) -> ValueType {
        match self {
            Literal::Int(_) => ValueType::Int,
            Literal::Float(_) => ValueType::Float,
            Literal::Str(_) => ValueType::String,
        }
    }

    /// Canonical text used for interning and persistence
    pub fn key(&self) -> String {
        match self {
            Literal::Int(n) => n.to_string(),
            Literal::Float(f) => format!("{:?}", f),
            Literal::Str(s) => s.clone(),
        }
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::Int(n) => write!(f, "{}", n),
            Literal::Float(x) => write!(f, "{:?}", x),
            Literal::Str(s) => write!(f, "{:?}", s),
        }
    }
}
