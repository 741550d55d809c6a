//! Quadruple definitions

use super::memory_model::Address;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Marker for an operand or result field that is not used
pub const UNUSED: Address = -1;

/// Quadruple operator, numbered as in the persisted program
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Opcode {
    /// result = left - right
    Sub = 1,
    /// result = left + right
    Add = 2,
    /// result = left * right
    Mul = 3,
    /// result = left / right (always float)
    Div = 4,
    /// result = left < right
    Lt = 5,
    /// result = left > right
    Gt = 6,
    /// result = left <= right
    LtEq = 7,
    /// result = left >= right
    GtEq = 8,
    /// result = left == right
    Eq = 9,
    /// result = left != right
    NotEq = 10,
    /// result = left
    Assign = 11,
    /// Write left to the output
    Print = 12,
    /// Jump to result
    Goto = 13,
    /// Jump to result when left is false
    GotoFalse = 14,
    /// Jump to result when left is true
    GotoTrue = 15,
    /// Push return address, jump to result (left = function id)
    Call = 16,
    /// Push a fresh local frame for function id left
    AllocateFrame = 17,
    /// Pop the local frame and return to the caller
    Return = 18,
    /// Copy left into parameter slot result of the new frame
    Param = 19,
}

impl Opcode {
    /// Numeric code used in the persisted program
    pub fn code(self) -> i64 {
        self as u8 as i64
    }

    /// Decodes a numeric code
    pub fn from_code(code: i64) -> Option<Self> {
        let op = match code {
            1 => Opcode::Sub,
            2 => Opcode::Add,
            3 => Opcode::Mul,
            4 => Opcode::Div,
            5 => Opcode::Lt,
            6 => Opcode::Gt,
            7 => Opcode::LtEq,
            8 => Opcode::GtEq,
            9 => Opcode::Eq,
            10 => Opcode::NotEq,
            11 => Opcode::Assign,
            12 => Opcode::Print,
            13 => Opcode::Goto,
            14 => Opcode::GotoFalse,
            15 => Opcode::GotoTrue,
            16 => Opcode::Call,
            17 => Opcode::AllocateFrame,
            18 => Opcode::Return,
            19 => Opcode::Param,
            _ => return None,
        };
        Some(op)
    }

    /// Mnemonic used in listings
    pub fn mnemonic(self) -> &'static str {
        match self {
            Opcode::Sub => "-",
            Opcode::Add => "+",
            Opcode::Mul => "*",
            Opcode::Div => "/",
            Opcode::Lt => "<",
            Opcode::Gt => ">",
            Opcode::LtEq => "<=",
            Opcode::GtEq => ">=",
            Opcode::Eq => "==",
            Opcode::NotEq => "!=",
            Opcode::Assign => "=",
            Opcode::Print => "PRINT",
            Opcode::Goto => "GOTO",
            Opcode::GotoFalse => "GOTOF",
            Opcode::GotoTrue => "GOTOT",
            Opcode::Call => "GOSUB",
            Opcode::AllocateFrame => "ERA",
            Opcode::Return => "ENDFUNC",
            Opcode::Param => "PARAM",
        }
    }

    /// True for opcodes whose result field is a quadruple index
    pub fn is_jump(self) -> bool {
        matches!(
            self,
            Opcode::Goto | Opcode::GotoFalse | Opcode::GotoTrue | Opcode::Call
        )
    }
}

/// Source-level binary operator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    /// `+`
    Add,
    /// `-`
    Sub,
    /// `*`
    Mul,
    /// `/`
    Div,
    /// `<`
    Lt,
    /// `>`
    Gt,
    /// `<=`
    LtEq,
    /// `>=`
    GtEq,
    /// `==`
    Eq,
    /// `!=`
    NotEq,
    /// `=`
    Assign,
}

impl Operator {
    /// Every operator, in a stable order
    pub const ALL: [Operator; 11] = [
        Operator::Add,
        Operator::Sub,
        Operator::Mul,
        Operator::Div,
        Operator::Lt,
        Operator::Gt,
        Operator::LtEq,
        Operator::GtEq,
        Operator::Eq,
        Operator::NotEq,
        Operator::Assign,
    ];

    /// Opcode emitted for this operator
    pub fn opcode(self) -> Opcode {
        match self {
            Operator::Add => Opcode::Add,
            Operator::Sub => Opcode::Sub,
            Operator::Mul => Opcode::Mul,
            Operator::Div => Opcode::Div,
            Operator::Lt => Opcode::Lt,
            Operator::Gt => Opcode::Gt,
            Operator::LtEq => Opcode::LtEq,
            Operator::GtEq => Opcode::GtEq,
            Operator::Eq => Opcode::Eq,
            Operator::NotEq => Opcode::NotEq,
            Operator::Assign => Opcode::Assign,
        }
    }

    /// Source symbol
    pub fn symbol(self) -> &'static str {
        self.opcode().mnemonic()
    }

    /// `+` or `-`
    pub fn is_additive(self) -> bool {
        matches!(self, Operator::Add | Operator::Sub)
    }

    /// `*` or `/`
    pub fn is_multiplicative(self) -> bool {
        matches!(self, Operator::Mul | Operator::Div)
    }

    /// Comparison operators
    pub fn is_relational(self) -> bool {
        matches!(
            self,
            Operator::Lt
                | Operator::Gt
                | Operator::LtEq
                | Operator::GtEq
                | Operator::Eq
                | Operator::NotEq
        )
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// One IR instruction: operator, two operands and a result/target field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quadruple {
    /// Operator
    pub op: Opcode,
    /// Left operand address or [`UNUSED`]
    pub left: Address,
    /// Right operand address or [`UNUSED`]
    pub right: Address,
    /// Result address, jump target, parameter position or [`UNUSED`]
    pub result: Address,
}

impl Quadruple {
    /// Creates a quadruple
    pub fn new(op: Opcode, left: Address, right: Address, result: Address) -> Self {
        Self {
            op,
            left,
            right,
            result,
        }
    }

    /// Jump whose target is filled in later
    pub fn pending_jump(op: Opcode, condition: Address) -> Self {
        Self::new(op, condition, UNUSED, UNUSED)
    }
}

impl fmt::Display for Quadruple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} {}",
            self.op.code(),
            self.left,
            self.right,
            self.result
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_round_trip() {
        for code in 1..=19 {
            let op = Opcode::from_code(code).unwrap();
            assert_eq!(op.code(), code);
        }
        assert_eq!(Opcode::from_code(0), None);
        assert_eq!(Opcode::from_code(20), None);
    }

    #[test]
    fn test_operator_classes_are_disjoint() {
        for op in Operator::ALL {
            let classes = [op.is_additive(), op.is_multiplicative(), op.is_relational()];
            assert!(classes.iter().filter(|c| **c).count() <= 1);
        }
    }

    #[test]
    fn test_display_is_persisted_form() {
        let quad = Quadruple::new(Opcode::GotoFalse, 6000, UNUSED, 12);
        assert_eq!(quad.to_string(), "14 6000 -1 12");
    }
}
