//! Quadruple interpreter

use super::memory::RuntimeMemory;
use super::value::Value;
use crate::compiler::ir::{Address, ObjectFile, Opcode, Quadruple};
use crate::error::{Error, Result};
use std::io::Write;

/// Execution options
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Stop with `ExecutionLimitExceeded` after this many instructions
    pub step_limit: Option<usize>,
}

/// Virtual machine executing one compiled program
pub struct VirtualMachine {
    program: Vec<Quadruple>,
    memory: RuntimeMemory,
    returns: Vec<usize>,
    ip: usize,
    steps: usize,
    options: RunOptions,
}

impl VirtualMachine {
    /// Load a program with default options
    pub fn new(object: &ObjectFile) -> Result<Self> {
        Self::with_options(object, RunOptions::default())
    }

    /// Load a program
    pub fn with_options(object: &ObjectFile, options: RunOptions) -> Result<Self> {
        Ok(Self {
            program: object.quadruples.clone(),
            memory: RuntimeMemory::new(&object.memory, &object.constants)?,
            returns: Vec::new(),
            ip: 0,
            steps: 0,
            options,
        })
    }

    /// Instructions executed so far
    pub fn steps(&self) -> usize {
        self.steps
    }

    /// Current memory image
    pub fn memory(&self) -> &RuntimeMemory {
        &self.memory
    }

    /// Read a cell of the current memory image
    pub fn read(&self, address: Address) -> Result<Value> {
        self.memory.read(address)
    }

    /// Run until the instruction pointer passes the last quadruple
    pub fn run<W: Write>(&mut self, out: &mut W) -> Result<()> {
        while self.ip < self.program.len() {
            if let Some(limit) = self.options.step_limit {
                if self.steps >= limit {
                    return Err(Error::ExecutionLimitExceeded { limit });
                }
            }
            self.step(out)?;
            self.steps += 1;
        }
        tracing::debug!(steps = self.steps, "halted");
        Ok(())
    }

    fn step<W: Write>(&mut self, out: &mut W) -> Result<()> {
        let quad = self.program[self.ip];
        tracing::trace!(ip = self.ip, "{}", quad);
        let mut next = self.ip + 1;

        match quad.op {
            Opcode::Add
            | Opcode::Sub
            | Opcode::Mul
            | Opcode::Div
            | Opcode::Lt
            | Opcode::Gt
            | Opcode::LtEq
            | Opcode::GtEq
            | Opcode::Eq
            | Opcode::NotEq => {
                let left = self.memory.read(quad.left)?;
                let right = self.memory.read(quad.right)?;
                let value = Value::binary(quad.op, &left, &right)?;
                self.memory.write(quad.result, value)?;
            }
            Opcode::Assign => {
                let value = self.memory.read(quad.left)?;
                self.memory.write(quad.result, value)?;
            }
            Opcode::Print => {
                let value = self.memory.read(quad.left)?;
                writeln!(out, "{}", value)?;
            }
            Opcode::Goto => next = target(&quad)?,
            Opcode::GotoFalse => {
                if !self.memory.read(quad.left)?.is_truthy() {
                    next = target(&quad)?;
                }
            }
            Opcode::GotoTrue => {
                if self.memory.read(quad.left)?.is_truthy() {
                    next = target(&quad)?;
                }
            }
            Opcode::Call => {
                self.memory.enter()?;
                self.returns.push(self.ip + 1);
                next = target(&quad)?;
            }
            Opcode::AllocateFrame => self.memory.allocate(quad.left)?,
            Opcode::Return => {
                next = self
                    .returns
                    .pop()
                    .ok_or_else(|| Error::runtime("return with an empty call stack"))?;
                self.memory.release()?;
            }
            Opcode::Param => {
                let value = self.memory.read(quad.left)?;
                let position = usize::try_from(quad.result)
                    .map_err(|_| Error::runtime(format!("bad parameter position {}", quad.result)))?;
                self.memory.param(value, position)?;
            }
        }

        self.ip = next;
        Ok(())
    }
}

fn target(quad: &Quadruple) -> Result<usize> {
    usize::try_from(quad.result)
        .map_err(|_| Error::runtime(format!("jump to invalid target {}", quad.result)))
}
