use crate::compiler::ir::{Operator, ValueType};
use crate::compiler::translator::{Event, EventSink};
use crate::error::{Error, Result};
use crate::lexer::{Token, TokenKind};

/// Recursive-descent parser for Duckling
///
/// The parser keeps no semantic state. It reports what it recognizes to an
/// [`EventSink`], which is usually a
/// [`Translator`](crate::compiler::translator::Translator).
///
/// ```text
/// program   := 'program' ID ';' decls? funcs* 'main' body 'end'
/// decls     := 'var' (ID (',' ID)* ':' type ';')+
/// funcs     := 'func'? 'void' ID '(' params? ')' '[' decls? body ']' ';'
/// body      := '{' statement* '}'
/// statement := assignment | condition | cycle | call | print
/// expression:= exp (relop exp)?
/// exp       := term (('+'|'-') term)*
/// term      := factor (('*'|'/') factor)*
/// factor    := '(' expression ')' | ('+'|'-') factor | CONSTANT | ID
/// ```
pub struct Parser {
    tokens: Vec<Token>,
    current: usize,
}

impl Parser {
    /// Creates a parser over a token stream ending in `Eof`
    pub fn new(tokens: Vec<Token>) -> Self {
        Parser { tokens, current: 0 }
    }

    /// Parses a whole program, firing events into `sink`
    pub fn parse<S: EventSink + ?Sized>(&mut self, sink: &mut S) -> Result<()> {
        self.consume(TokenKind::Program)?;
        let name = self.expect_identifier()?;
        sink.handle(Event::ProgramStart { name })?;
        self.consume(TokenKind::Semicolon)?;

        if self.check(&TokenKind::Var) {
            self.parse_declarations(sink)?;
        }
        while self.check(&TokenKind::Func) || self.check(&TokenKind::Void) {
            self.parse_function(sink)?;
        }

        self.consume(TokenKind::Main)?;
        sink.handle(Event::MainStart)?;
        self.parse_body(sink)?;
        self.consume(TokenKind::End)?;
        sink.handle(Event::ProgramEnd)?;

        if !self.is_at_end() {
            return Err(self.expected_error("end of file"));
        }
        Ok(())
    }

    /// Parses a program and returns the events instead of translating them
    pub fn events(&mut self) -> Result<Vec<Event>> {
        let mut events = Vec::new();
        self.parse(&mut events)?;
        Ok(events)
    }

    fn parse_declarations<S: EventSink + ?Sized>(&mut self, sink: &mut S) -> Result<()> {
        self.consume(TokenKind::Var)?;
        loop {
            let name = self.expect_identifier()?;
            sink.handle(Event::VarName { name })?;
            while self.match_token(&TokenKind::Comma) {
                let name = self.expect_identifier()?;
                sink.handle(Event::VarName { name })?;
            }
            self.consume(TokenKind::Colon)?;
            let ty = self.parse_type()?;
            sink.handle(Event::VarType { ty })?;
            self.consume(TokenKind::Semicolon)?;

            if !matches!(self.peek().kind, TokenKind::Identifier(_)) {
                return Ok(());
            }
        }
    }

    fn parse_type(&mut self) -> Result<ValueType> {
        if self.match_token(&TokenKind::IntType) {
            Ok(ValueType::Int)
        } else if self.match_token(&TokenKind::FloatType) {
            Ok(ValueType::Float)
        } else {
            Err(self.expected_error("type `int` or `float`"))
        }
    }

    fn parse_function<S: EventSink + ?Sized>(&mut self, sink: &mut S) -> Result<()> {
        self.match_token(&TokenKind::Func);
        self.consume(TokenKind::Void)?;
        let name = self.expect_identifier()?;
        sink.handle(Event::FunctionStart { name })?;

        self.consume(TokenKind::LeftParen)?;
        if !self.check(&TokenKind::RightParen) {
            loop {
                let name = self.expect_identifier()?;
                self.consume(TokenKind::Colon)?;
                let ty = self.parse_type()?;
                sink.handle(Event::Param { name, ty })?;
                if !self.match_token(&TokenKind::Comma) {
                    break;
                }
            }
        }
        self.consume(TokenKind::RightParen)?;

        self.consume(TokenKind::LeftBracket)?;
        if self.check(&TokenKind::Var) {
            self.parse_declarations(sink)?;
        }
        sink.handle(Event::FunctionBodyStart)?;
        self.parse_body(sink)?;
        self.consume(TokenKind::RightBracket)?;
        self.consume(TokenKind::Semicolon)?;
        sink.handle(Event::FunctionEnd)
    }

    fn parse_body<S: EventSink + ?Sized>(&mut self, sink: &mut S) -> Result<()> {
        self.consume(TokenKind::LeftBrace)?;
        while !self.check(&TokenKind::RightBrace) {
            if self.is_at_end() {
                return Err(Error::UnexpectedEof);
            }
            self.parse_statement(sink)?;
        }
        self.consume(TokenKind::RightBrace)?;
        Ok(())
    }

    fn parse_statement<S: EventSink + ?Sized>(&mut self, sink: &mut S) -> Result<()> {
        match &self.peek().kind {
            TokenKind::If => self.parse_condition(sink),
            TokenKind::Do => self.parse_cycle(sink),
            TokenKind::Print => self.parse_print(sink),
            TokenKind::Identifier(_) => match self.peek_next().map(|t| &t.kind) {
                Some(TokenKind::Assign) => self.parse_assignment(sink),
                Some(TokenKind::LeftParen) => self.parse_call(sink),
                _ => {
                    self.advance();
                    Err(self.expected_error("`=` or `(`"))
                }
            },
            _ => Err(self.expected_error("statement")),
        }
    }

    fn parse_assignment<S: EventSink + ?Sized>(&mut self, sink: &mut S) -> Result<()> {
        let name = self.expect_identifier()?;
        sink.handle(Event::AssignTarget { name })?;
        self.consume(TokenKind::Assign)?;
        sink.handle(Event::AssignOperator)?;
        self.parse_expression(sink)?;
        sink.handle(Event::AssignValue)?;
        self.consume(TokenKind::Semicolon)?;
        Ok(())
    }

    fn parse_condition<S: EventSink + ?Sized>(&mut self, sink: &mut S) -> Result<()> {
        self.consume(TokenKind::If)?;
        self.consume(TokenKind::LeftParen)?;
        self.parse_expression(sink)?;
        self.consume(TokenKind::RightParen)?;
        sink.handle(Event::IfGuardEnd)?;
        self.parse_body(sink)?;
        if self.match_token(&TokenKind::Else) {
            sink.handle(Event::Else)?;
            self.parse_body(sink)?;
        }
        sink.handle(Event::IfEnd)?;
        self.consume(TokenKind::Semicolon)?;
        Ok(())
    }

    fn parse_cycle<S: EventSink + ?Sized>(&mut self, sink: &mut S) -> Result<()> {
        self.consume(TokenKind::Do)?;
        sink.handle(Event::LoopStart)?;
        self.parse_body(sink)?;
        self.consume(TokenKind::While)?;
        self.consume(TokenKind::LeftParen)?;
        self.parse_expression(sink)?;
        self.consume(TokenKind::RightParen)?;
        sink.handle(Event::LoopGuardEnd)?;
        self.consume(TokenKind::Semicolon)?;
        Ok(())
    }

    fn parse_call<S: EventSink + ?Sized>(&mut self, sink: &mut S) -> Result<()> {
        let name = self.expect_identifier()?;
        sink.handle(Event::CallStart { name })?;
        self.consume(TokenKind::LeftParen)?;
        sink.handle(Event::CallOpen)?;
        if !self.check(&TokenKind::RightParen) {
            loop {
                self.parse_expression(sink)?;
                sink.handle(Event::Argument)?;
                if !self.match_token(&TokenKind::Comma) {
                    break;
                }
            }
        }
        self.consume(TokenKind::RightParen)?;
        sink.handle(Event::CallEnd)?;
        self.consume(TokenKind::Semicolon)?;
        Ok(())
    }

    fn parse_print<S: EventSink + ?Sized>(&mut self, sink: &mut S) -> Result<()> {
        self.consume(TokenKind::Print)?;
        self.consume(TokenKind::LeftParen)?;
        loop {
            if let TokenKind::String(text) = &self.peek().kind {
                let text = text.clone();
                self.advance();
                sink.handle(Event::StringLiteral(text))?;
            } else {
                self.parse_expression(sink)?;
            }
            sink.handle(Event::PrintItem)?;
            if !self.match_token(&TokenKind::Comma) {
                break;
            }
        }
        self.consume(TokenKind::RightParen)?;
        self.consume(TokenKind::Semicolon)?;
        Ok(())
    }

    fn parse_expression<S: EventSink + ?Sized>(&mut self, sink: &mut S) -> Result<()> {
        self.parse_exp(sink)?;
        if let Some(op) = self.relational_operator() {
            self.advance();
            sink.handle(Event::Operator(op))?;
            self.parse_exp(sink)?;
        }
        sink.handle(Event::RelationalEnd)
    }

    fn parse_exp<S: EventSink + ?Sized>(&mut self, sink: &mut S) -> Result<()> {
        self.parse_term(sink)?;
        sink.handle(Event::TermEnd)?;
        loop {
            let op = match self.peek().kind {
                TokenKind::Plus => Operator::Add,
                TokenKind::Minus => Operator::Sub,
                _ => return Ok(()),
            };
            self.advance();
            sink.handle(Event::Operator(op))?;
            self.parse_term(sink)?;
            sink.handle(Event::TermEnd)?;
        }
    }

    fn parse_term<S: EventSink + ?Sized>(&mut self, sink: &mut S) -> Result<()> {
        self.parse_factor(sink)?;
        sink.handle(Event::FactorEnd)?;
        loop {
            let op = match self.peek().kind {
                TokenKind::Star => Operator::Mul,
                TokenKind::Slash => Operator::Div,
                _ => return Ok(()),
            };
            self.advance();
            sink.handle(Event::Operator(op))?;
            self.parse_factor(sink)?;
            sink.handle(Event::FactorEnd)?;
        }
    }

    fn parse_factor<S: EventSink + ?Sized>(&mut self, sink: &mut S) -> Result<()> {
        let token = self.peek().clone();
        match &token.kind {
            TokenKind::LeftParen => {
                self.advance();
                sink.handle(Event::OpenParen)?;
                self.parse_expression(sink)?;
                self.consume(TokenKind::RightParen)?;
                sink.handle(Event::CloseParen)
            }
            TokenKind::Plus | TokenKind::Minus => {
                self.advance();
                sink.handle(Event::UnarySign {
                    negative: matches!(token.kind, TokenKind::Minus),
                })?;
                self.parse_factor(sink)?;
                sink.handle(Event::UnaryEnd)
            }
            TokenKind::Integer(n) => {
                self.advance();
                sink.handle(Event::IntLiteral(*n))
            }
            TokenKind::Float(x) => {
                self.advance();
                sink.handle(Event::FloatLiteral(*x))
            }
            TokenKind::Identifier(name) => {
                self.advance();
                sink.handle(Event::Identifier { name: name.clone() })
            }
            TokenKind::Eof => Err(Error::UnexpectedEof),
            _ => Err(self.expected_error("expression")),
        }
    }

    fn relational_operator(&self) -> Option<Operator> {
        match self.peek().kind {
            TokenKind::Lt => Some(Operator::Lt),
            TokenKind::Gt => Some(Operator::Gt),
            TokenKind::LtEq => Some(Operator::LtEq),
            TokenKind::GtEq => Some(Operator::GtEq),
            TokenKind::Eq => Some(Operator::Eq),
            TokenKind::NotEq => Some(Operator::NotEq),
            _ => None,
        }
    }

    // Helper methods

    fn is_at_end(&self) -> bool {
        matches!(self.peek().kind, TokenKind::Eof)
    }

    fn peek(&self) -> &Token {
        let last = self.tokens.len().saturating_sub(1);
        &self.tokens[self.current.min(last)]
    }

    fn peek_next(&self) -> Option<&Token> {
        self.tokens.get(self.current + 1)
    }

    fn advance(&mut self) -> Token {
        let token = self.peek().clone();
        if !self.is_at_end() {
            self.current += 1;
        }
        token
    }

    fn check(&self, kind: &TokenKind) -> bool {
        if self.is_at_end() {
            return false;
        }
        std::mem::discriminant(&self.peek().kind) == std::mem::discriminant(kind)
    }

    fn match_token(&mut self, kind: &TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn consume(&mut self, kind: TokenKind) -> Result<Token> {
        if self.check(&kind) {
            Ok(self.advance())
        } else if self.is_at_end() {
            Err(Error::UnexpectedEof)
        } else {
            Err(self.expected_error(&Self::token_kind_name(&kind)))
        }
    }

    fn expect_identifier(&mut self) -> Result<String> {
        match &self.peek().kind {
            TokenKind::Identifier(name) => {
                let name = name.clone();
                self.advance();
                Ok(name)
            }
            TokenKind::Eof => Err(Error::UnexpectedEof),
            _ => Err(self.expected_error("identifier")),
        }
    }

    fn token_kind_name(kind: &TokenKind) -> String {
        match kind {
            TokenKind::Integer(_) => "integer".to_string(),
            TokenKind::Float(_) => "float".to_string(),
            TokenKind::String(_) => "string".to_string(),
            TokenKind::Identifier(name) if name.is_empty() => "identifier".to_string(),
            TokenKind::Identifier(name) => format!("identifier `{}`", name),
            TokenKind::Eof => "end of file".to_string(),
            other => format!("`{}`", other),
        }
    }

    /// Helper to create a syntax error with expected/found pattern
    fn expected_error(&self, expected: &str) -> Error {
        let token = self.peek();
        Error::SyntaxError {
            line: token.line,
            col: token.column,
            message: format!(
                "Expected {}, found {}",
                expected,
                Self::token_kind_name(&token.kind)
            ),
        }
    }
}
