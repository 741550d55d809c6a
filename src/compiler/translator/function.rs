//! Declarations, scopes and the call protocol

use super::context::{PendingCall, TranslationContext};
use crate::compiler::ir::{Opcode, Segment, ValueType, UNUSED};
use crate::compiler::symbols::{FunctionDirectory, ScopeRef, Symbol, SymbolKind};
use crate::error::{Error, Result};

fn require_storable(ty: ValueType, name: &str) -> Result<()> {
    match ty {
        ValueType::Int | ValueType::Float => Ok(()),
        other => Err(Error::invalid_type(format!(
            "{} cannot be declared as {}",
            name, other
        ))),
    }
}

impl TranslationContext {
    pub(crate) fn program_start(&mut self, name: &str) -> Result<()> {
        if self.directory.program.is_some() {
            return Err(Error::compiler("program started twice"));
        }
        self.directory = FunctionDirectory::new(name);
        self.scopes = vec![ScopeRef::Global];

        // Quadruple 0 skips the function bodies; patched at `main`
        let jump = self.emit(Opcode::Goto, UNUSED, UNUSED, UNUSED);
        self.jumps.push(jump);
        tracing::debug!(program = name, "enter global scope");
        Ok(())
    }

    pub(crate) fn var_name(&mut self, name: String) -> Result<()> {
        self.pending_names.push(name);
        Ok(())
    }

    pub(crate) fn var_type(&mut self, ty: ValueType) -> Result<()> {
        let scope = self.current_scope()?.clone();
        let segment = match scope {
            ScopeRef::Global => Segment::global(ty),
            ScopeRef::Function(_) => Segment::local(ty),
        };

        for name in std::mem::take(&mut self.pending_names) {
            require_storable(ty, &name)?;
            let table = self.directory.table_mut(&scope)?;
            if table.contains(&name) {
                return Err(Error::AlreadyDeclared { name });
            }
            let address = self.planner.assign(segment, None)?;
            self.directory
                .table_mut(&scope)?
                .declare(Symbol::new(name, SymbolKind::Var(ty), address))?;
        }
        Ok(())
    }

    pub(crate) fn function_start(&mut self, name: &str) -> Result<()> {
        if self.scopes.len() != 1 {
            return Err(Error::compiler(format!(
                "function {} declared inside another function",
                name
            )));
        }
        if self.directory.globals().contains(name) {
            return Err(Error::AlreadyDeclared {
                name: name.to_string(),
            });
        }

        let id = self.planner.assign(Segment::global(ValueType::Void), None)?;
        self.directory
            .table_mut(&ScopeRef::Global)?
            .declare(Symbol::function(name, id))?;
        self.planner.enter_function(id);
        self.scopes.push(ScopeRef::Function(name.to_string()));
        tracing::debug!(function = name, id, "enter function scope");
        Ok(())
    }

    pub(crate) fn param(&mut self, name: String, ty: ValueType) -> Result<()> {
        let scope = self.current_scope()?.clone();
        if scope == ScopeRef::Global {
            return Err(Error::compiler(format!("parameter {} outside a function", name)));
        }
        require_storable(ty, &name)?;
        if self.directory.table_mut(&scope)?.contains(&name) {
            return Err(Error::AlreadyDeclared { name });
        }

        let address = self.planner.assign(Segment::local(ty), None)?;
        self.directory
            .table_mut(&scope)?
            .declare(Symbol::new(name, SymbolKind::Param(ty), address))
    }

    pub(crate) fn function_body_start(&mut self) -> Result<()> {
        let ScopeRef::Function(name) = self.current_scope()?.clone() else {
            return Err(Error::compiler("function body outside a function"));
        };
        let start = self.quadruples.next_index();
        self.directory.function_mut(&name)?.start = Some(start);
        Ok(())
    }

    pub(crate) fn function_end(&mut self) -> Result<()> {
        let Some(ScopeRef::Function(name)) = self.scopes.pop() else {
            return Err(Error::compiler("function end outside a function"));
        };
        self.emit(Opcode::Return, UNUSED, UNUSED, UNUSED);
        self.planner.leave_function();
        tracing::debug!(function = %name, "leave function scope");
        Ok(())
    }

    pub(crate) fn main_start(&mut self) -> Result<()> {
        if self.scopes.len() != 1 {
            return Err(Error::compiler("main inside a function"));
        }
        let jump = self.pop_jump()?;
        if jump != 0 || !self.jumps.is_empty() {
            return Err(Error::compiler("open jumps before main"));
        }
        let target = self.quadruples.next_index();
        self.quadruples.backpatch(jump, target)
    }

    pub(crate) fn program_end(&mut self) -> Result<()> {
        self.ended = true;
        tracing::debug!(
            quadruples = self.quadruples.len(),
            functions = self
                .directory
                .globals()
                .iter()
                .filter(|s| s.kind == SymbolKind::LocalTable)
                .count(),
            "leave global scope"
        );
        Ok(())
    }

    pub(crate) fn call_start(&mut self, name: &str) -> Result<()> {
        let function = self.directory.function(name)?;
        let id = function
            .address
            .ok_or_else(|| Error::compiler(format!("function {} has no id", name)))?;
        let parameters = self.directory.parameters(name)?;
        self.calls.push(PendingCall {
            name: name.to_string(),
            function: id,
            parameters,
            arguments: Vec::new(),
        });
        Ok(())
    }

    pub(crate) fn call_open(&mut self) -> Result<()> {
        let function = self
            .calls
            .last()
            .map(|call| call.function)
            .ok_or_else(|| Error::compiler("call opened without a callee"))?;
        self.emit(Opcode::AllocateFrame, function, UNUSED, UNUSED);
        Ok(())
    }

    pub(crate) fn argument(&mut self) -> Result<()> {
        let arg = self.pop_operand()?;
        let call = self
            .calls
            .last_mut()
            .ok_or_else(|| Error::compiler("argument outside a call"))?;
        let position = call.arguments.len();
        call.arguments.push(arg.ty);
        self.emit(Opcode::Param, arg.address, UNUSED, position as i64);
        Ok(())
    }

    pub(crate) fn call_end(&mut self) -> Result<()> {
        let call = self
            .calls
            .pop()
            .ok_or_else(|| Error::compiler("call closed without a callee"))?;

        if call.arguments.len() != call.parameters.len() {
            return Err(Error::invalid_type(format!(
                "{} expects {} arguments, got {}",
                call.name,
                call.parameters.len(),
                call.arguments.len()
            )));
        }
        for (position, (expected, found)) in
            call.parameters.iter().zip(&call.arguments).enumerate()
        {
            if expected != found {
                return Err(Error::invalid_type(format!(
                    "argument {} of {} must be {}, found {}",
                    position + 1,
                    call.name,
                    expected,
                    found
                )));
            }
        }

        let start = self
            .directory
            .function(&call.name)?
            .start
            .ok_or_else(|| Error::compiler(format!("{} called before its body", call.name)))?;
        self.emit(Opcode::Call, call.function, UNUSED, start as i64);
        Ok(())
    }
}
