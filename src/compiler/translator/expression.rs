//! Expressions, assignment and print

use super::context::{Operand, PendingOperator, TranslationContext};
use crate::compiler::ir::{Literal, Opcode, Operator, ValueType, UNUSED};
use crate::compiler::semantic_cube;
use crate::error::{Error, Result};

impl TranslationContext {
    /// Push the value of a declared variable or parameter
    pub(crate) fn identifier(&mut self, name: &str) -> Result<()> {
        let operand = self.variable(name)?;
        self.operands.push(operand);
        Ok(())
    }

    fn variable(&self, name: &str) -> Result<Operand> {
        let symbol = self.directory.resolve(&self.scopes, name)?;
        match (symbol.kind.value_type(), symbol.address) {
            (Some(ty), Some(address)) => Ok(Operand { address, ty }),
            _ => Err(Error::invalid_type(format!(
                "{} is a {}, not a variable",
                name, symbol.kind
            ))),
        }
    }

    /// Push the interned address of a constant
    pub(crate) fn literal(&mut self, literal: Literal) -> Result<()> {
        let ty = literal.value_type();
        let address = self.planner.constant(&literal)?;
        self.operands.push(Operand { address, ty });
        Ok(())
    }

    pub(crate) fn binary_operator(&mut self, op: Operator) -> Result<()> {
        if op == Operator::Assign {
            return Err(Error::compiler("'=' is not an expression operator"));
        }
        self.operators.push(PendingOperator::Binary(op));
        Ok(())
    }

    /// Apply the top operator when it belongs to the level that just ended
    pub(crate) fn apply_if(&mut self, level: impl Fn(Operator) -> bool) -> Result<()> {
        match self.operators.last().copied() {
            Some(PendingOperator::Binary(op)) if level(op) => {
                self.operators.pop();
                self.apply_binary(op)
            }
            _ => Ok(()),
        }
    }

    fn apply_binary(&mut self, op: Operator) -> Result<()> {
        let right = self.pop_operand()?;
        let left = self.pop_operand()?;
        let ty = semantic_cube::check(left.ty, right.ty, op)?;
        let result = self.temporary(ty)?;
        self.emit(op.opcode(), left.address, right.address, result);
        self.operands.push(Operand {
            address: result,
            ty,
        });
        Ok(())
    }

    pub(crate) fn close_paren(&mut self) -> Result<()> {
        match self.pop_operator()? {
            PendingOperator::Paren => Ok(()),
            other => Err(Error::compiler(format!(
                "')' closes {:?} instead of a parenthesis",
                other
            ))),
        }
    }

    /// `-x` is `x * -1`, `+x` is `x * 1`
    pub(crate) fn unary_end(&mut self) -> Result<()> {
        let PendingOperator::Unary(negative) = self.pop_operator()? else {
            return Err(Error::compiler("sign end without a sign"));
        };
        let operand = self.pop_operand()?;
        let sign = self.planner.constant(&Literal::Int(if negative { -1 } else { 1 }))?;
        let ty = semantic_cube::check(operand.ty, ValueType::Int, Operator::Mul)?;
        let result = self.temporary(ty)?;
        self.emit(Opcode::Mul, operand.address, sign, result);
        self.operands.push(Operand {
            address: result,
            ty,
        });
        Ok(())
    }

    pub(crate) fn assign_target(&mut self, name: &str) -> Result<()> {
        self.identifier(name)
    }

    pub(crate) fn assign_value(&mut self) -> Result<()> {
        let value = self.pop_operand()?;
        if self.pop_operator()? != PendingOperator::Assign {
            return Err(Error::compiler("assignment value without '='"));
        }
        let target = self.pop_operand()?;
        semantic_cube::check(target.ty, value.ty, Operator::Assign)?;
        self.emit(Opcode::Assign, value.address, UNUSED, target.address);
        Ok(())
    }

    pub(crate) fn print_item(&mut self) -> Result<()> {
        let item = self.pop_operand()?;
        self.emit(Opcode::Print, item.address, UNUSED, UNUSED);
        Ok(())
    }
}
