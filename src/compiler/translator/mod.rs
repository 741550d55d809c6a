//! # Event-Driven Translation
//!
//! The parser recognizes the grammar and reports what it sees as a stream
//! of [`Event`]s. The [`Translator`] consumes them one at a time and owns
//! every piece of translation state in a single [`TranslationContext`]:
//! the symbol tables, the memory planner, the emitted quadruples and the
//! operator, operand, jump and call stacks.
//!
//! Because the protocol is explicit, the translator can be driven directly
//! with synthetic event sequences, without source text or a parser.
//!
//! ## Expression events
//!
//! Precedence is encoded by where the parser fires the level-end events:
//!
//! | Event           | Applies the pending operator if it is |
//! |-----------------|----------------------------------------|
//! | `FactorEnd`     | `*` or `/`                             |
//! | `TermEnd`       | `+` or `-`                             |
//! | `RelationalEnd` | a comparison                           |
//!
//! `OpenParen` pushes a barrier that stops all three until `CloseParen`.

mod context;
mod control_flow;
mod expression;
mod function;

pub use context::{Operand, PendingCall, PendingOperator, TranslationContext};

use super::ir::{ObjectFile, Operator, ValueType};
use crate::error::{Error, Result};

/// One translation action fired by the grammar-matching process
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    // Declarations
    /// `program <name> ;`
    ProgramStart {
        /// Program name
        name: String,
    },
    /// A name in a variable declaration list
    VarName {
        /// Variable name
        name: String,
    },
    /// The `: type` ending a declaration list
    VarType {
        /// Declared type
        ty: ValueType,
    },
    /// Function header up to its name
    FunctionStart {
        /// Function name
        name: String,
    },
    /// One `name : type` parameter
    Param {
        /// Parameter name
        name: String,
        /// Parameter type
        ty: ValueType,
    },
    /// Opening brace of a function body, after its locals
    FunctionBodyStart,
    /// End of a function declaration
    FunctionEnd,
    /// The `main` keyword
    MainStart,
    /// The final `end` keyword
    ProgramEnd,

    // Assignment
    /// Identifier on the left of `=`
    AssignTarget {
        /// Variable name
        name: String,
    },
    /// The `=` of an assignment
    AssignOperator,
    /// End of the assigned expression
    AssignValue,

    // Expressions
    /// Variable used as an operand
    Identifier {
        /// Variable name
        name: String,
    },
    /// Integer constant
    IntLiteral(i64),
    /// Float constant
    FloatLiteral(f64),
    /// String constant (print only)
    StringLiteral(String),
    /// Binary operator between two operands
    Operator(Operator),
    /// End of a factor
    FactorEnd,
    /// End of a term
    TermEnd,
    /// End of a full expression
    RelationalEnd,
    /// `(` inside an expression
    OpenParen,
    /// `)` inside an expression
    CloseParen,
    /// Leading `+` or `-` of a factor
    UnarySign {
        /// True for `-`
        negative: bool,
    },
    /// End of the factor a sign applies to
    UnaryEnd,

    // Control flow
    /// `)` closing an `if` guard
    IfGuardEnd,
    /// The `else` keyword
    Else,
    /// End of an `if` statement
    IfEnd,
    /// The `do` keyword
    LoopStart,
    /// `)` closing a `while` guard
    LoopGuardEnd,

    // Calls and output
    /// Called function name
    CallStart {
        /// Function name
        name: String,
    },
    /// `(` of a call
    CallOpen,
    /// End of one call argument
    Argument,
    /// `)` of a call
    CallEnd,
    /// End of one print item
    PrintItem,
}

/// Consumer of translation events
pub trait EventSink {
    /// Handle one event
    fn handle(&mut self, event: Event) -> Result<()>;
}

/// Records events instead of translating them
impl EventSink for Vec<Event> {
    fn handle(&mut self, event: Event) -> Result<()> {
        self.push(event);
        Ok(())
    }
}

/// Single-pass translator from events to a quadruple program
#[derive(Debug, Default)]
pub struct Translator {
    ctx: TranslationContext,
}

impl Translator {
    /// Create a translator with empty state
    pub fn new() -> Self {
        Self::default()
    }

    /// Translation state, for inspection
    pub fn context(&self) -> &TranslationContext {
        &self.ctx
    }

    /// Drive a complete event sequence and return the program
    pub fn translate(events: impl IntoIterator<Item = Event>) -> Result<ObjectFile> {
        let mut translator = Translator::new();
        for event in events {
            translator.handle(event)?;
        }
        translator.finish()
    }

    /// Check that every construct was closed and return the program
    pub fn finish(self) -> Result<ObjectFile> {
        let ctx = self.ctx;
        if !ctx.ended {
            return Err(Error::compiler("program was not ended"));
        }
        ctx.ensure_balanced()?;

        let unresolved = ctx.quadruples.unresolved();
        if !unresolved.is_empty() {
            return Err(Error::compiler(format!(
                "unresolved jumps at {:?}",
                unresolved
            )));
        }

        Ok(ObjectFile {
            memory: ctx.planner.memory_map(),
            constants: ctx.planner.constants().to_vec(),
            quadruples: ctx.quadruples.into_vec(),
        })
    }
}

impl EventSink for Translator {
    fn handle(&mut self, event: Event) -> Result<()> {
        let ctx = &mut self.ctx;
        if ctx.ended {
            return Err(Error::compiler(format!("{:?} after program end", event)));
        }
        if ctx.directory.program.is_none() && !matches!(event, Event::ProgramStart { .. }) {
            return Err(Error::compiler(format!("{:?} before program start", event)));
        }

        match event {
            Event::ProgramStart { name } => ctx.program_start(&name),
            Event::VarName { name } => ctx.var_name(name),
            Event::VarType { ty } => ctx.var_type(ty),
            Event::FunctionStart { name } => ctx.function_start(&name),
            Event::Param { name, ty } => ctx.param(name, ty),
            Event::FunctionBodyStart => ctx.function_body_start(),
            Event::FunctionEnd => ctx.function_end(),
            Event::MainStart => ctx.main_start(),
            Event::ProgramEnd => ctx.program_end(),

            Event::AssignTarget { name } => ctx.assign_target(&name),
            Event::AssignOperator => {
                ctx.operators.push(PendingOperator::Assign);
                Ok(())
            }
            Event::AssignValue => ctx.assign_value(),

            Event::Identifier { name } => ctx.identifier(&name),
            Event::IntLiteral(n) => ctx.literal(super::ir::Literal::Int(n)),
            Event::FloatLiteral(x) => ctx.literal(super::ir::Literal::Float(x)),
            Event::StringLiteral(s) => ctx.literal(super::ir::Literal::Str(s)),
            Event::Operator(op) => ctx.binary_operator(op),
            Event::FactorEnd => ctx.apply_if(Operator::is_multiplicative),
            Event::TermEnd => ctx.apply_if(Operator::is_additive),
            Event::RelationalEnd => ctx.apply_if(Operator::is_relational),
            Event::OpenParen => {
                ctx.operators.push(PendingOperator::Paren);
                Ok(())
            }
            Event::CloseParen => ctx.close_paren(),
            Event::UnarySign { negative } => {
                ctx.operators.push(PendingOperator::Unary(negative));
                Ok(())
            }
            Event::UnaryEnd => ctx.unary_end(),

            Event::IfGuardEnd => ctx.if_guard_end(),
            Event::Else => ctx.else_branch(),
            Event::IfEnd => ctx.if_end(),
            Event::LoopStart => ctx.loop_start(),
            Event::LoopGuardEnd => ctx.loop_guard_end(),

            Event::CallStart { name } => ctx.call_start(&name),
            Event::CallOpen => ctx.call_open(),
            Event::Argument => ctx.argument(),
            Event::CallEnd => ctx.call_end(),
            Event::PrintItem => ctx.print_item(),
        }
    }
}
