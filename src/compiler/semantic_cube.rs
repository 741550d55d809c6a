//! Result types of binary operators
//!
//! The cube maps `(left, right, operator)` to a result type, or to `None`
//! when the combination is an error. Every triple over `{int, float, bool}`
//! has an entry; anything else (strings, void) is missing and is rejected
//! the same way as an explicit error entry.

use super::ir::{Operator, ValueType};
use crate::error::{Error, Result};
use std::collections::HashMap;

const OPERAND_TYPES: [ValueType; 3] = [ValueType::Int, ValueType::Float, ValueType::Bool];

lazy_static::lazy_static! {
    /// Static `(left, right, operator) -> result` table
    static ref CUBE: HashMap<(ValueType, ValueType, Operator), Option<ValueType>> = {
        let mut cube = HashMap::new();
        for left in OPERAND_TYPES {
            for right in OPERAND_TYPES {
                for op in Operator::ALL {
                    cube.insert((left, right, op), result_type(left, right, op));
                }
            }
        }
        cube
    };
}

fn result_type(left: ValueType, right: ValueType, op: Operator) -> Option<ValueType> {
    use ValueType::{Bool, Float, Int};

    match op {
        _ if op.is_relational() => Some(Bool),
        Operator::Div => Some(Float),
        Operator::Add | Operator::Sub | Operator::Mul => {
            if left == Float || right == Float {
                Some(Float)
            } else {
                Some(Int)
            }
        }
        // Bool and numeric cells never exchange values
        Operator::Assign => {
            if (left == Bool) != (right == Bool) {
                None
            } else {
                Some(left)
            }
        }
        _ => None,
    }
}

/// Raw table entry: `None` when the triple is missing or an error
pub fn lookup(left: ValueType, right: ValueType, op: Operator) -> Option<ValueType> {
    CUBE.get(&(left, right, op)).copied().flatten()
}

/// Result type of `left op right`, or `InvalidOperation`
///
/// For `=`, `left` is the destination.
pub fn check(left: ValueType, right: ValueType, op: Operator) -> Result<ValueType> {
    lookup(left, right, op).ok_or_else(|| Error::InvalidOperation {
        op: op.symbol().to_string(),
        left_type: left.to_string(),
        right_type: right.to_string(),
    })
}
