use serde::{Deserialize, Serialize};

/// A single token from the source code
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Token {
    /// The type of token
    pub kind: TokenKind,
    /// Original text of the token
    pub lexeme: String,
    /// Line number where token appears (1-indexed)
    pub line: usize,
    /// Column number where token starts (1-indexed)
    pub column: usize,
}

impl Token {
    /// Creates a new token with the given properties
    pub fn new(kind: TokenKind, lexeme: String, line: usize, column: usize) -> Self {
        Token {
            kind,
            lexeme,
            line,
            column,
        }
    }
}

/// All possible token types in Duckling
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TokenKind {
    // Literals
    /// Integer literal
    Integer(i64),
    /// Floating-point literal
    Float(f64),
    /// String literal (quotes stripped)
    String(String),

    // Identifiers
    /// Identifier
    Identifier(String),

    // Keywords
    /// PROGRAM keyword
    Program,
    /// END keyword
    End,
    /// MAIN keyword
    Main,
    /// VAR keyword
    Var,
    /// DO keyword
    Do,
    /// WHILE keyword
    While,
    /// IF keyword
    If,
    /// ELSE keyword
    Else,
    /// PRINT keyword
    Print,
    /// INT type keyword
    IntType,
    /// FLOAT type keyword
    FloatType,
    /// VOID keyword
    Void,
    /// FUNC keyword (optional prefix of a function header)
    Func,

    // Operators
    /// Plus operator (+)
    Plus,
    /// Minus operator (-)
    Minus,
    /// Star operator (*)
    Star,
    /// Slash operator (/)
    Slash,
    /// Equality operator (==)
    Eq,
    /// Inequality operator (!=)
    NotEq,
    /// Less than operator (<)
    Lt,
    /// Greater than operator (>)
    Gt,
    /// Less than or equal operator (<=)
    LtEq,
    /// Greater than or equal operator (>=)
    GtEq,
    /// Assignment operator (=)
    Assign,

    // Delimiters
    /// Left parenthesis (
    LeftParen,
    /// Right parenthesis )
    RightParen,
    /// Left brace {
    LeftBrace,
    /// Right brace }
    RightBrace,
    /// Left bracket [
    LeftBracket,
    /// Right bracket ]
    RightBracket,
    /// Comma delimiter
    Comma,
    /// Colon delimiter
    Colon,
    /// Semicolon delimiter
    Semicolon,

    // Special
    /// End of file marker
    Eof,
}

impl TokenKind {
    /// Check if token is a keyword
    pub fn is_keyword(&self) -> bool {
        matches!(
            self,
            TokenKind::Program
                | TokenKind::End
                | TokenKind::Main
                | TokenKind::Var
                | TokenKind::Do
                | TokenKind::While
                | TokenKind::If
                | TokenKind::Else
                | TokenKind::Print
                | TokenKind::IntType
                | TokenKind::FloatType
                | TokenKind::Void
                | TokenKind::Func
        )
    }

    /// Get keyword from string
    pub fn keyword(s: &str) -> Option<TokenKind> {
        match s {
            "program" => Some(TokenKind::Program),
            "end" => Some(TokenKind::End),
            "main" => Some(TokenKind::Main),
            "var" => Some(TokenKind::Var),
            "do" => Some(TokenKind::Do),
            "while" => Some(TokenKind::While),
            "if" => Some(TokenKind::If),
            "else" => Some(TokenKind::Else),
            "print" => Some(TokenKind::Print),
            "int" => Some(TokenKind::IntType),
            "float" => Some(TokenKind::FloatType),
            "void" => Some(TokenKind::Void),
            "func" => Some(TokenKind::Func),
            _ => None,
        }
    }
}

impl std::fmt::Display for TokenKind {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            TokenKind::Integer(n) => write!(f, "{}", n),
            TokenKind::Float(fl) => write!(f, "{:?}", fl),
            TokenKind::String(s) => write!(f, "\"{}\"", s),
            TokenKind::Identifier(id) => write!(f, "{}", id),
            TokenKind::Program => write!(f, "program"),
            TokenKind::End => write!(f, "end"),
            TokenKind::Main => write!(f, "main"),
            TokenKind::Var => write!(f, "var"),
            TokenKind::Do => write!(f, "do"),
            TokenKind::While => write!(f, "while"),
            TokenKind::If => write!(f, "if"),
            TokenKind::Else => write!(f, "else"),
            TokenKind::Print => write!(f, "print"),
            TokenKind::IntType => write!(f, "int"),
            TokenKind::FloatType => write!(f, "float"),
            TokenKind::Void => write!(f, "void"),
            TokenKind::Func => write!(f, "func"),
            TokenKind::Plus => write!(f, "+"),
            TokenKind::Minus => write!(f, "-"),
            TokenKind::Star => write!(f, "*"),
            TokenKind::Slash => write!(f, "/"),
            TokenKind::Eq => write!(f, "=="),
            TokenKind::NotEq => write!(f, "!="),
            TokenKind::Lt => write!(f, "<"),
            TokenKind::Gt => write!(f, ">"),
            TokenKind::LtEq => write!(f, "<="),
            TokenKind::GtEq => write!(f, ">="),
            TokenKind::Assign => write!(f, "="),
            TokenKind::LeftParen => write!(f, "("),
            TokenKind::RightParen => write!(f, ")"),
            TokenKind::LeftBrace => write!(f, "{{"),
            TokenKind::RightBrace => write!(f, "}}"),
            TokenKind::LeftBracket => write!(f, "["),
            TokenKind::RightBracket => write!(f, "]"),
            TokenKind::Comma => write!(f, ","),
            TokenKind::Colon => write!(f, ":"),
            TokenKind::Semicolon => write!(f, ";"),
            TokenKind::Eof => write!(f, "end of file"),
        }
    }
}
