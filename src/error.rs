//! Error types for the Duckling compiler and virtual machine

use thiserror::Error;

/// Compiler and virtual machine errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    // Lexing and parsing
    /// Syntax error encountered during parsing
    ///
    /// **Triggered by:** Tokens that do not follow the grammar
    /// **Example:** `x = ;` (missing expression)
    #[error("Syntax error at line {line}, column {col}: {message}")]
    SyntaxError {
        /// Line number where error occurred
        line: usize,
        /// Column number where error occurred
        col: usize,
        /// Error description
        message: String,
    },

    /// Character the scanner does not recognize
    ///
    /// Reported and skipped unless strict lexing is enabled.
    #[error("Illegal character '{character}' at line {line}, column {col}")]
    LexicalError {
        /// Line number of the character
        line: usize,
        /// Column number of the character
        col: usize,
        /// The offending character
        character: char,
    },

    /// Unexpected end of file during parsing
    #[error("Unexpected end of file")]
    UnexpectedEof,

    // Translation
    /// Name declared twice in one symbol table
    ///
    /// **Triggered by:** `var x : int; x : float;`
    #[error("Symbol {name} is already declared")]
    AlreadyDeclared {
        /// Symbol name
        name: String,
    },

    /// Reference to an unknown identifier or function
    ///
    /// **Triggered by:** Using a variable or calling a function that was never declared
    #[error("Symbol {name} is undeclared")]
    Undeclared {
        /// Symbol name
        name: String,
    },

    /// Type rule violation
    ///
    /// **Triggered by:** A non-bool guard in `if`/`do-while`, or a call whose
    /// argument count or argument types differ from the declared parameters
    #[error("Invalid type: {message}")]
    InvalidType {
        /// What was expected and what was found
        message: String,
    },

    /// Operator not defined for the given operand types
    ///
    /// **Triggered by:** A semantic cube miss, e.g. assigning a bool into an int
    #[error("Invalid operation: {op} on types {left_type} and {right_type}")]
    InvalidOperation {
        /// Operator symbol
        op: String,
        /// Left operand type
        left_type: String,
        /// Right operand type
        right_type: String,
    },

    // Persisted program
    /// Persisted program text could not be read
    #[error("Malformed program at line {line}: {message}")]
    FormatError {
        /// 1-indexed line of the persisted text
        line: usize,
        /// Error description
        message: String,
    },

    // Runtime errors
    /// Value of the wrong kind for an operation
    ///
    /// **Triggered by:** Arithmetic on a string constant in a hand-built program
    #[error("Type error: expected {expected}, got {got}")]
    TypeError {
        /// Expected type name
        expected: String,
        /// Actual type name
        got: String,
    },

    /// Division by zero error
    #[error("Division by zero")]
    DivisionByZero,

    /// Read of a memory cell that was never written
    #[error("Read of uninitialized address {address}")]
    UninitializedRead {
        /// Address that was read
        address: i64,
    },

    /// Execution limit exceeded
    #[error("Execution limit exceeded (max: {limit} instructions)")]
    ExecutionLimitExceeded {
        /// Maximum allowed instructions
        limit: usize,
    },

    /// General runtime error
    #[error("Runtime error: {0}")]
    RuntimeError(String),

    /// Translator driven with an event sequence it cannot honor
    #[error("Compiler error: {0}")]
    CompilerError(String),

    /// I/O failure while reading or writing program output
    #[error("I/O error: {0}")]
    Io(String),
}

impl Error {
    /// Create a runtime error with a message
    pub fn runtime(msg: impl Into<String>) -> Self {
        Error::RuntimeError(msg.into())
    }

    /// Create a compiler error with a message
    pub fn compiler(msg: impl Into<String>) -> Self {
        Error::CompilerError(msg.into())
    }

    /// Create a type error with a message
    pub fn invalid_type(msg: impl Into<String>) -> Self {
        Error::InvalidType {
            message: msg.into(),
        }
    }

    /// True for the four semantic errors raised while translating
    pub fn is_translation_error(&self) -> bool {
        matches!(
            self,
            Error::AlreadyDeclared { .. }
                | Error::Undeclared { .. }
                | Error::InvalidType { .. }
                | Error::InvalidOperation { .. }
        )
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err.to_string())
    }
}

/// Result type for Duckling operations
pub type Result<T> = std::result::Result<T, Error>;
