//! Lexical analysis for Duckling
//!
//! Converts source text into a stream of tokens. Illegal characters are
//! reported and skipped so that scanning continues best-effort.

mod scanner;
mod token;

pub use scanner::Scanner;
pub use token::{Token, TokenKind};
