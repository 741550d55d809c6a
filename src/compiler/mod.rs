//! # Duckling Compiler - Source to Quadruples
//!
//! Compiles Duckling programs to a quadruple program that the
//! [`VirtualMachine`](crate::runtime::VirtualMachine) executes.
//!
//! ## Architecture
//!
//! ```text
//! Source → Tokens → Parser ──events──▶ Translator → ObjectFile (.dk)
//!                                        │
//!                     symbols, semantic cube, memory planner
//! ```
//!
//! Translation is a single pass: the parser fires events while it
//! recognizes the grammar and the translator emits quadruples immediately,
//! backpatching forward jumps once their targets are known.
//!
//! ## Usage
//!
//! ```
//! use duckling::compiler::{Compiler, CompileOptions};
//!
//! let source = "program p; var x : int; main { x = 2; print(x); } end";
//! let compiler = Compiler::new(CompileOptions::default());
//! let result = compiler.compile(source).unwrap();
//! assert!(result.quadruple_count > 0);
//! ```

pub mod debug;
pub mod ir;
pub mod memory;
pub mod semantic_cube;
pub mod symbols;
pub mod translator;

pub use debug::{format_program, format_quadruple};
pub use ir::{ObjectFile, Opcode, Quadruple};
pub use memory::MemoryPlanner;
pub use symbols::{FunctionDirectory, Symbol, SymbolKind, SymbolTable};
pub use translator::{Event, EventSink, Translator};

use crate::{Parser, Result, Scanner};

/// Compilation options
#[derive(Debug, Clone, Default)]
pub struct CompileOptions {
    /// Abort on the first illegal character instead of skipping it
    pub strict_lexing: bool,
}

/// Compilation result with metadata
#[derive(Debug)]
pub struct CompileResult {
    /// The compiled program
    pub object: ObjectFile,
    /// Diagnostics that did not stop compilation
    pub warnings: Vec<String>,
    /// Number of emitted quadruples
    pub quadruple_count: usize,
}

/// Duckling to quadruple compiler
pub struct Compiler {
    options: CompileOptions,
}

impl Compiler {
    /// Create a new compiler with options
    pub fn new(options: CompileOptions) -> Self {
        Self { options }
    }

    /// Compile source text to a quadruple program
    pub fn compile(&self, source: &str) -> Result<CompileResult> {
        // Phase 1: Scan
        let mut scanner = Scanner::new(source).strict(self.options.strict_lexing);
        let tokens = scanner.scan_tokens()?;
        let warnings: Vec<String> = scanner.diagnostics().iter().map(|e| e.to_string()).collect();

        // Phase 2: Parse, translating as the grammar is recognized
        let mut translator = Translator::new();
        let mut parser = Parser::new(tokens);
        parser.parse(&mut translator)?;

        // Phase 3: Check that every construct closed
        let object = translator.finish()?;

        tracing::debug!(
            quadruples = object.quadruples.len(),
            constants = object.constants.len(),
            functions = object.memory.functions.len(),
            warnings = warnings.len(),
            "compiled"
        );

        Ok(CompileResult {
            quadruple_count: object.quadruples.len(),
            object,
            warnings,
        })
    }
}
