use crate::compiler::ir::{
    Address, Opcode, Operator, Quadruple, QuadrupleList, Segment, ValueType,
};
use crate::compiler::memory::MemoryPlanner;
use crate::compiler::symbols::{FunctionDirectory, ScopeRef};
use crate::error::{Error, Result};

/// A translated value waiting on the operand stack
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Operand {
    /// Where the value lives
    pub address: Address,
    /// Its static type
    pub ty: ValueType,
}

/// Entry of the operator stack
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PendingOperator {
    /// Binary operator waiting for its right operand
    Binary(Operator),
    /// `=` of an assignment in progress
    Assign,
    /// Parenthesis barrier
    Paren,
    /// Sign of a factor; true for `-`
    Unary(bool),
}

/// A call whose arguments are being translated
#[derive(Debug, Clone, PartialEq)]
pub struct PendingCall {
    /// Callee name
    pub name: String,
    /// Callee id
    pub function: Address,
    /// Declared parameter types
    pub parameters: Vec<ValueType>,
    /// Types of the arguments seen so far
    pub arguments: Vec<ValueType>,
}

/// All mutable translation state
#[derive(Debug, Default)]
pub struct TranslationContext {
    pub(crate) directory: FunctionDirectory,
    pub(crate) planner: MemoryPlanner,
    pub(crate) quadruples: QuadrupleList,
    /// Live scopes, global at the bottom
    pub(crate) scopes: Vec<ScopeRef>,
    /// Names of a declaration list awaiting their type
    pub(crate) pending_names: Vec<String>,
    /// Quadruple indices of open jumps and loop heads
    pub(crate) jumps: Vec<usize>,
    pub(crate) operators: Vec<PendingOperator>,
    pub(crate) operands: Vec<Operand>,
    pub(crate) calls: Vec<PendingCall>,
    pub(crate) ended: bool,
}

impl TranslationContext {
    /// Symbol tables built so far
    pub fn directory(&self) -> &FunctionDirectory {
        &self.directory
    }

    /// Quadruples emitted so far
    pub fn quadruples(&self) -> &QuadrupleList {
        &self.quadruples
    }

    /// Operands currently on the stack
    pub fn operands(&self) -> &[Operand] {
        &self.operands
    }

    /// Pending jump indices
    pub fn jumps(&self) -> &[usize] {
        &self.jumps
    }

    pub(crate) fn emit(&mut self, op: Opcode, left: Address, right: Address, result: Address) -> usize {
        self.quadruples.push(Quadruple::new(op, left, right, result))
    }

    pub(crate) fn current_scope(&self) -> Result<&ScopeRef> {
        self.scopes
            .last()
            .ok_or_else(|| Error::compiler("no open scope"))
    }

    pub(crate) fn temporary(&mut self, ty: ValueType) -> Result<Address> {
        self.planner.assign(Segment::temporary(ty), None)
    }

    pub(crate) fn pop_operand(&mut self) -> Result<Operand> {
        self.operands
            .pop()
            .ok_or_else(|| Error::compiler("operand stack underflow"))
    }

    pub(crate) fn pop_operator(&mut self) -> Result<PendingOperator> {
        self.operators
            .pop()
            .ok_or_else(|| Error::compiler("operator stack underflow"))
    }

    pub(crate) fn pop_jump(&mut self) -> Result<usize> {
        self.jumps
            .pop()
            .ok_or_else(|| Error::compiler("jump stack underflow"))
    }

    /// Pop a guard operand and require it to be bool
    pub(crate) fn pop_condition(&mut self, construct: &str) -> Result<Operand> {
        let condition = self.pop_operand()?;
        if condition.ty != ValueType::Bool {
            return Err(Error::invalid_type(format!(
                "{} guard must be bool, found {}",
                construct, condition.ty
            )));
        }
        Ok(condition)
    }

    /// Fail if any stack still holds state
    pub(crate) fn ensure_balanced(&self) -> Result<()> {
        let leftovers = [
            ("operand", self.operands.len()),
            ("operator", self.operators.len()),
            ("jump", self.jumps.len()),
            ("call", self.calls.len()),
            ("declaration", self.pending_names.len()),
        ];
        for (stack, depth) in leftovers {
            if depth > 0 {
                return Err(Error::compiler(format!(
                    "{} stack holds {} entries at program end",
                    stack, depth
                )));
            }
        }
        if self.scopes.len() > 1 {
            return Err(Error::compiler("function scope left open"));
        }
        Ok(())
    }
}
