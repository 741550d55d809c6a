use std::fmt;

use crate::compiler::ir::{Opcode, ValueType};
use crate::error::{Error, Result};

/// Runtime value representation
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// 64-bit integer value
    Int(i64),
    /// 64-bit floating-point value
    Float(f64),
    /// Boolean value
    Bool(bool),
    /// String constant
    Str(String),
}

impl Value {
    /// Returns the type name as a string
    pub fn type_name(&self) -> String {
        self.value_type().name().to_string()
    }

    /// Static type this value belongs to
    pub fn value_type(&self) -> ValueType {
        match self {
            Value::Int(_) => ValueType::Int,
            Value::Float(_) => ValueType::Float,
            Value::Bool(_) => ValueType::Bool,
            Value::Str(_) => ValueType::String,
        }
    }

    /// Returns true if the value is truthy in a boolean context
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Int(n) => *n != 0,
            Value::Float(f) => *f != 0.0,
            Value::Bool(b) => *b,
            Value::Str(s) => !s.is_empty(),
        }
    }

    /// Converts value to a 64-bit integer, truncating floats toward zero
    pub fn as_int(&self) -> Result<i64> {
        match self {
            Value::Int(n) => Ok(*n),
            Value::Float(f) => Ok(*f as i64),
            Value::Bool(b) => Ok(i64::from(*b)),
            Value::Str(_) => Err(self.type_error("int")),
        }
    }

    /// Converts value to a 64-bit floating-point number
    pub fn as_float(&self) -> Result<f64> {
        match self {
            Value::Int(n) => Ok(*n as f64),
            Value::Float(f) => Ok(*f),
            Value::Bool(b) => Ok(if *b { 1.0 } else { 0.0 }),
            Value::Str(_) => Err(self.type_error("float")),
        }
    }

    /// Converts the value to the element type of a destination cell
    pub fn coerce(self, ty: ValueType) -> Result<Value> {
        match (ty, self) {
            (ValueType::Int, v) => Ok(Value::Int(v.as_int()?)),
            (ValueType::Float, v) => Ok(Value::Float(v.as_float()?)),
            (ValueType::Bool, v) => Ok(Value::Bool(v.is_truthy())),
            (ValueType::String, Value::Str(s)) => Ok(Value::Str(s)),
            (expected, v) => Err(v.type_error(expected.name())),
        }
    }

    /// Evaluates an arithmetic or relational opcode
    pub fn binary(op: Opcode, left: &Value, right: &Value) -> Result<Value> {
        let ints = match (left, right) {
            (Value::Int(_) | Value::Bool(_), Value::Int(_) | Value::Bool(_)) => {
                Some((left.as_int()?, right.as_int()?))
            }
            _ => None,
        };

        match op {
            Opcode::Add | Opcode::Sub | Opcode::Mul => match ints {
                Some((a, b)) => {
                    let result = match op {
                        Opcode::Add => a.checked_add(b),
                        Opcode::Sub => a.checked_sub(b),
                        _ => a.checked_mul(b),
                    };
                    result.map(Value::Int).ok_or_else(|| {
                        Error::runtime(format!("integer overflow in {} {} {}", a, op.mnemonic(), b))
                    })
                }
                None => {
                    let (a, b) = (left.as_float()?, right.as_float()?);
                    Ok(Value::Float(match op {
                        Opcode::Add => a + b,
                        Opcode::Sub => a - b,
                        _ => a * b,
                    }))
                }
            },
            Opcode::Div => {
                let (a, b) = (left.as_float()?, right.as_float()?);
                if b == 0.0 {
                    return Err(Error::DivisionByZero);
                }
                Ok(Value::Float(a / b))
            }
            Opcode::Lt | Opcode::Gt | Opcode::LtEq | Opcode::GtEq | Opcode::Eq | Opcode::NotEq => {
                let ordering = match ints {
                    Some((a, b)) => a.partial_cmp(&b),
                    None => left.as_float()?.partial_cmp(&right.as_float()?),
                };
                let result = match ordering {
                    Some(ordering) => match op {
                        Opcode::Lt => ordering.is_lt(),
                        Opcode::Gt => ordering.is_gt(),
                        Opcode::LtEq => ordering.is_le(),
                        Opcode::GtEq => ordering.is_ge(),
                        Opcode::Eq => ordering.is_eq(),
                        _ => ordering.is_ne(),
                    },
                    // NaN compares unequal to everything
                    None => op == Opcode::NotEq,
                };
                Ok(Value::Bool(result))
            }
            other => Err(Error::runtime(format!(
                "{} is not a binary operator",
                other.mnemonic()
            ))),
        }
    }

    fn type_error(&self, expected: &str) -> Error {
        Error::TypeError {
            expected: expected.to_string(),
            got: self.type_name(),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Value::Int(n) => write!(f, "{}", n),
            Value::Float(fl) => write!(f, "{:?}", fl),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Str(s) => write!(f, "{}", s),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(Value::Int(2).to_string(), "2");
        assert_eq!(Value::Float(3.5).to_string(), "3.5");
        assert_eq!(Value::Float(3.0).to_string(), "3.0");
        assert_eq!(Value::Float(-2.5).to_string(), "-2.5");
        assert_eq!(Value::Bool(true).to_string(), "true");
        assert_eq!(Value::Str("hi".into()).to_string(), "hi");
    }

    #[test]
    fn test_int_arithmetic_stays_int() {
        let v = Value::binary(Opcode::Add, &Value::Int(2), &Value::Int(3)).unwrap();
        assert_eq!(v, Value::Int(5));
        let v = Value::binary(Opcode::Mul, &Value::Bool(true), &Value::Int(-1)).unwrap();
        assert_eq!(v, Value::Int(-1));
    }

    #[test]
    fn test_mixed_arithmetic_is_float() {
        let v = Value::binary(Opcode::Mul, &Value::Int(1), &Value::Float(-2.5)).unwrap();
        assert_eq!(v, Value::Float(-2.5));
    }

    #[test]
    fn test_division() {
        let v = Value::binary(Opcode::Div, &Value::Int(7), &Value::Int(2)).unwrap();
        assert_eq!(v, Value::Float(3.5));
        assert_eq!(
            Value::binary(Opcode::Div, &Value::Int(1), &Value::Int(0)),
            Err(Error::DivisionByZero)
        );
    }

    #[test]
    fn test_comparisons() {
        let lt = Value::binary(Opcode::Lt, &Value::Int(1), &Value::Float(1.5)).unwrap();
        assert_eq!(lt, Value::Bool(true));
        let ne = Value::binary(Opcode::NotEq, &Value::Int(2), &Value::Int(2)).unwrap();
        assert_eq!(ne, Value::Bool(false));
    }

    #[test]
    fn test_overflow_is_an_error() {
        assert!(matches!(
            Value::binary(Opcode::Add, &Value::Int(i64::MAX), &Value::Int(1)),
            Err(Error::RuntimeError(_))
        ));
    }

    #[test]
    fn test_coercion_on_write() {
        assert_eq!(Value::Float(3.9).coerce(ValueType::Int).unwrap(), Value::Int(3));
        assert_eq!(Value::Float(-3.9).coerce(ValueType::Int).unwrap(), Value::Int(-3));
        assert_eq!(Value::Int(2).coerce(ValueType::Float).unwrap(), Value::Float(2.0));
        assert_eq!(Value::Int(0).coerce(ValueType::Bool).unwrap(), Value::Bool(false));
        assert!(matches!(
            Value::Str("x".into()).coerce(ValueType::Int),
            Err(Error::TypeError { .. })
        ));
    }
}
