#![warn(missing_docs)]
//! # Duckling - A Quadruple Compiler and Virtual Machine
//!
//! Duckling is a small imperative language with typed variables, arithmetic
//! and relational expressions, `if`/`else`, `do`/`while` loops, void
//! functions with value parameters, and `print`.
//!
//! Programs are compiled in a single pass into quadruples
//! (`op left right result`) that address a typed memory layout, then run on
//! a virtual machine that shares that layout.
//!
//! ## Quick Start
//!
//! ```rust
//! # fn main() -> duckling::Result<()> {
//! let source = r#"
//!     program demo;
//!     var x : int;
//!         y : float;
//!     main {
//!         x = 2;
//!         y = 3.5;
//!         print(x);
//!         print(y);
//!     }
//!     end
//! "#;
//!
//! let object = duckling::compile(source)?;
//! let mut out: Vec<u8> = Vec::new();
//! duckling::run(&object, &mut out)?;
//! assert_eq!(String::from_utf8(out).unwrap(), "2\n3.5\n");
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! Source Code → Scanner → Tokens → Parser → Events → Translator → ObjectFile → VirtualMachine
//! ```
//!
//! ### Main Components
//!
//! - [`Scanner`] - Tokenizes source code
//! - [`Parser`] - Recognizes the grammar and fires translation [`Event`]s
//! - [`Translator`] - Builds symbol tables, plans memory and emits quadruples
//! - [`ObjectFile`] - The compiled program and its persisted text form
//! - [`VirtualMachine`] - Executes an [`ObjectFile`]
//!
//! ## Error Handling
//!
//! All fallible operations return [`Result<T>`](Result). Translation errors
//! (`AlreadyDeclared`, `Undeclared`, `InvalidType`, `InvalidOperation`)
//! abort compilation; nothing is emitted for a program that fails them.

/// Version of the Duckling toolchain
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod compiler;
pub mod error;
pub mod lexer;
pub mod parser;
pub mod runtime;

// Re-export main types
pub use compiler::ir::ObjectFile;
pub use compiler::translator::{Event, EventSink, Translator};
pub use compiler::{CompileOptions, CompileResult, Compiler};
pub use error::{Error, Result};
pub use lexer::{Scanner, Token, TokenKind};
pub use parser::Parser;
pub use runtime::{RunOptions, Value, VirtualMachine};

/// Compile source text with default options
pub fn compile(source: &str) -> Result<ObjectFile> {
    Compiler::new(CompileOptions::default())
        .compile(source)
        .map(|result| result.object)
}

/// Run a compiled program, writing printed values to `out`
pub fn run<W: std::io::Write>(object: &ObjectFile, out: &mut W) -> Result<()> {
    VirtualMachine::new(object)?.run(out)
}
