//! Backpatching for `if`/`else` and `do`/`while`

use super::context::TranslationContext;
use crate::compiler::ir::{Opcode, UNUSED};
use crate::error::Result;

impl TranslationContext {
    pub(crate) fn if_guard_end(&mut self) -> Result<()> {
        let condition = self.pop_condition("if")?;
        let jump = self.emit(Opcode::GotoFalse, condition.address, UNUSED, UNUSED);
        self.jumps.push(jump);
        Ok(())
    }

    /// Close the then-branch: jump over the else-branch and land the false
    /// jump just past that new jump.
    pub(crate) fn else_branch(&mut self) -> Result<()> {
        let exit = self.emit(Opcode::Goto, UNUSED, UNUSED, UNUSED);
        let false_jump = self.pop_jump()?;
        let target = self.quadruples.next_index();
        self.quadruples.backpatch(false_jump, target)?;
        self.jumps.push(exit);
        Ok(())
    }

    pub(crate) fn if_end(&mut self) -> Result<()> {
        let jump = self.pop_jump()?;
        let target = self.quadruples.next_index();
        self.quadruples.backpatch(jump, target)
    }

    pub(crate) fn loop_start(&mut self) -> Result<()> {
        let head = self.quadruples.next_index();
        self.jumps.push(head);
        Ok(())
    }

    pub(crate) fn loop_guard_end(&mut self) -> Result<()> {
        let condition = self.pop_condition("while")?;
        let head = self.pop_jump()?;
        self.emit(Opcode::GotoTrue, condition.address, UNUSED, head as i64);
        Ok(())
    }
}
