use super::token::{Token, TokenKind};
use crate::error::{Error, Result};

/// Scanner for Duckling source text
pub struct Scanner {
    /// Source code as character vector
    source: Vec<char>,
    /// Accumulated tokens
    tokens: Vec<Token>,
    /// Skipped characters, reported but not fatal
    diagnostics: Vec<Error>,
    /// Abort on the first illegal character instead of skipping it
    strict: bool,
    /// Start position of current token
    start: usize,
    /// Column where the current token starts
    start_column: usize,
    /// Current position in source
    current: usize,
    /// Current line number (1-indexed)
    line: usize,
    /// Current column number (1-indexed)
    column: usize,
}

impl Scanner {
    /// Creates a new scanner from source code
    pub fn new(source: &str) -> Self {
        Scanner {
            source: source.chars().collect(),
            tokens: Vec::new(),
            diagnostics: Vec::new(),
            strict: false,
            start: 0,
            start_column: 1,
            current: 0,
            line: 1,
            column: 1,
        }
    }

    /// Makes the first illegal character a hard error
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Illegal characters skipped during the last scan
    pub fn diagnostics(&self) -> &[Error] {
        &self.diagnostics
    }

    /// Scans all tokens from source code and returns them as a vector
    pub fn scan_tokens(&mut self) -> Result<Vec<Token>> {
        while !self.is_at_end() {
            self.start = self.current;
            self.start_column = self.column;
            self.scan_token()?;
        }

        self.tokens.push(Token::new(
            TokenKind::Eof,
            String::new(),
            self.line,
            self.column,
        ));

        Ok(std::mem::take(&mut self.tokens))
    }

    fn scan_token(&mut self) -> Result<()> {
        let c = self.advance();

        match c {
            ' ' | '\r' | '\t' => {}
            '\n' => {
                self.line += 1;
                self.column = 1;
            }

            '#' => self.skip_line_comment(),

            '(' => self.add_token(TokenKind::LeftParen),
            ')' => self.add_token(TokenKind::RightParen),
            '{' => self.add_token(TokenKind::LeftBrace),
            '}' => self.add_token(TokenKind::RightBrace),
            '[' => self.add_token(TokenKind::LeftBracket),
            ']' => self.add_token(TokenKind::RightBracket),
            ',' => self.add_token(TokenKind::Comma),
            ':' => self.add_token(TokenKind::Colon),
            ';' => self.add_token(TokenKind::Semicolon),

            '+' => self.add_token(TokenKind::Plus),
            '-' => self.add_token(TokenKind::Minus),
            '*' => self.add_token(TokenKind::Star),
            '/' => self.add_token(TokenKind::Slash),

            '=' => {
                if self.match_char('=') {
                    self.add_token(TokenKind::Eq);
                } else {
                    self.add_token(TokenKind::Assign);
                }
            }
            '!' => {
                if self.match_char('=') {
                    self.add_token(TokenKind::NotEq);
                } else {
                    self.illegal('!')?;
                }
            }
            '<' => {
                if self.match_char('=') {
                    self.add_token(TokenKind::LtEq);
                } else {
                    self.add_token(TokenKind::Lt);
                }
            }
            '>' => {
                if self.match_char('=') {
                    self.add_token(TokenKind::GtEq);
                } else {
                    self.add_token(TokenKind::Gt);
                }
            }

            '"' | '\'' => self.scan_string(c)?,

            '.' if self.peek().is_ascii_digit() => self.scan_number()?,
            c if c.is_ascii_digit() => self.scan_number()?,

            c if c.is_ascii_alphabetic() || c == '_' => self.scan_identifier_or_keyword(),

            other => self.illegal(other)?,
        }

        Ok(())
    }

    fn illegal(&mut self, character: char) -> Result<()> {
        let err = Error::LexicalError {
            line: self.line,
            col: self.start_column,
            character,
        };
        if self.strict {
            return Err(err);
        }
        tracing::warn!("{}, skipping", err);
        self.diagnostics.push(err);
        Ok(())
    }

    fn skip_line_comment(&mut self) {
        while !self.is_at_end() && self.peek() != '\n' {
            self.advance();
        }
    }

    fn scan_string(&mut self, quote: char) -> Result<()> {
        let mut value = String::new();

        while !self.is_at_end() && self.peek() != quote {
            if self.peek() == '\n' {
                self.line += 1;
                self.column = 0;
            }
            value.push(self.advance());
        }

        if self.is_at_end() {
            return Err(Error::SyntaxError {
                line: self.line,
                col: self.start_column,
                message: "Unterminated string".to_string(),
            });
        }

        self.advance(); // Closing quote

        self.add_token(TokenKind::String(value));
        Ok(())
    }

    fn scan_number(&mut self) -> Result<()> {
        while self.peek().is_ascii_digit() {
            self.advance();
        }

        let mut is_float = self.source[self.start] == '.';
        if self.peek() == '.' && self.peek_next().is_ascii_digit() {
            is_float = true;
            self.advance(); // consume .
        }
        if is_float {
            while self.peek().is_ascii_digit() {
                self.advance();
            }
            self.scan_exponent();
        }

        let text: String = self.source[self.start..self.current].iter().collect();

        if is_float {
            let value: f64 = text.parse().map_err(|_| Error::SyntaxError {
                line: self.line,
                col: self.start_column,
                message: format!("Invalid float: {}", text),
            })?;
            self.add_token(TokenKind::Float(value));
        } else {
            let value: i64 = text.parse().map_err(|_| Error::SyntaxError {
                line: self.line,
                col: self.start_column,
                message: format!("Invalid integer: {}", text),
            })?;
            self.add_token(TokenKind::Integer(value));
        }

        Ok(())
    }

    /// Optional `e[+-]digits` suffix of a float literal
    fn scan_exponent(&mut self) {
        if !matches!(self.peek(), 'e' | 'E') {
            return;
        }
        let sign = matches!(self.peek_next(), '+' | '-');
        let first_digit = if sign {
            self.source.get(self.current + 2).copied()
        } else {
            self.source.get(self.current + 1).copied()
        };
        if !first_digit.is_some_and(|c| c.is_ascii_digit()) {
            return;
        }
        self.advance();
        if sign {
            self.advance();
        }
        while self.peek().is_ascii_digit() {
            self.advance();
        }
    }

    fn scan_identifier_or_keyword(&mut self) {
        while self.peek().is_ascii_alphanumeric() || self.peek() == '_' {
            self.advance();
        }

        let text: String = self.source[self.start..self.current].iter().collect();
        let kind = TokenKind::keyword(&text).unwrap_or(TokenKind::Identifier(text));
        self.add_token(kind);
    }

    fn is_at_end(&self) -> bool {
        self.current >= self.source.len()
    }

    fn advance(&mut self) -> char {
        let c = self.source[self.current];
        self.current += 1;
        self.column += 1;
        c
    }

    fn peek(&self) -> char {
        if self.is_at_end() {
            '\0'
        } else {
            self.source[self.current]
        }
    }

    fn peek_next(&self) -> char {
        if self.current + 1 >= self.source.len() {
            '\0'
        } else {
            self.source[self.current + 1]
        }
    }

    fn match_char(&mut self, expected: char) -> bool {
        if self.is_at_end() || self.source[self.current] != expected {
            false
        } else {
            self.current += 1;
            self.column += 1;
            true
        }
    }

    fn add_token(&mut self, kind: TokenKind) {
        let lexeme: String = self.source[self.start..self.current].iter().collect();
        self.tokens
            .push(Token::new(kind, lexeme, self.line, self.start_column));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        let mut scanner = Scanner::new(source);
        scanner
            .scan_tokens()
            .unwrap()
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    #[test]
    fn test_program_header() {
        let tokens = kinds("program demo;");
        assert_eq!(
            tokens,
            vec![
                TokenKind::Program,
                TokenKind::Identifier("demo".to_string()),
                TokenKind::Semicolon,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_numbers() {
        assert_eq!(
            kinds("42 3.5 .25 1.5e3"),
            vec![
                TokenKind::Integer(42),
                TokenKind::Float(3.5),
                TokenKind::Float(0.25),
                TokenKind::Float(1500.0),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_minus_is_never_folded_into_literal() {
        assert_eq!(
            kinds("-2.5"),
            vec![TokenKind::Minus, TokenKind::Float(2.5), TokenKind::Eof]
        );
    }

    #[test]
    fn test_relational_operators() {
        assert_eq!(
            kinds("< <= > >= == != ="),
            vec![
                TokenKind::Lt,
                TokenKind::LtEq,
                TokenKind::Gt,
                TokenKind::GtEq,
                TokenKind::Eq,
                TokenKind::NotEq,
                TokenKind::Assign,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_strings_in_either_quote() {
        assert_eq!(
            kinds(r#""hello world" 'x'"#),
            vec![
                TokenKind::String("hello world".to_string()),
                TokenKind::String("x".to_string()),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_comment() {
        let tokens = kinds("# a comment\nmain");
        assert_eq!(tokens, vec![TokenKind::Main, TokenKind::Eof]);
    }

    #[test]
    fn test_illegal_character_is_skipped() {
        let mut scanner = Scanner::new("x $ y");
        let tokens = scanner.scan_tokens().unwrap();

        assert_eq!(tokens.len(), 3); // x y EOF
        assert_eq!(scanner.diagnostics().len(), 1);
        assert!(matches!(
            scanner.diagnostics()[0],
            Error::LexicalError { character: '$', line: 1, col: 3 }
        ));
    }

    #[test]
    fn test_strict_mode_rejects_illegal_character() {
        let mut scanner = Scanner::new("x $ y").strict(true);
        assert!(matches!(
            scanner.scan_tokens(),
            Err(Error::LexicalError { character: '$', .. })
        ));
    }

    #[test]
    fn test_positions() {
        let mut scanner = Scanner::new("var\n  x");
        let tokens = scanner.scan_tokens().unwrap();
        assert_eq!((tokens[1].line, tokens[1].column), (2, 3));
    }
}
