//! Duckling Parser Module
//!
//! Recognizes the Duckling grammar and reports translation events.

mod descent_parser;

pub use descent_parser::Parser;
