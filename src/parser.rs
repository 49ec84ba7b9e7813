//! Recursive-descent parser with panic-mode recovery.
//!
//! Constructs that share a leading token are told apart by parsing ahead on
//! a [`Snapshot`] and rolling back when the guess was wrong. The snapshot
//! clones the whole lexer, so the indentation stack, pending block-ends and
//! bracket depth come back together with the token pair.

pub mod error;
mod expression;
mod statement;

#[cfg(test)]
mod tests;

use crate::ast::{Expression, Program, Statement};
use crate::diagnostic::Diagnostic;
use crate::lexer::Lexer;
use crate::token::{Span, Token, TokenKind};

use error::{ParseError, ParseErrorKind, ParseErrors};

type ParseResult<T> = Result<T, ParseError>;

/// Deepest nesting of expressions and statements the parser will follow.
pub const MAX_NESTING: usize = 1000;

pub struct Parser<'a> {
    lexer: Lexer<'a>,
    current: Token<'a>,
    previous: Token<'a>,
    errors: Vec<ParseError>,
    panic_mode: bool,
    loop_depth: usize,
    function_depth: usize,
    nesting: usize,
}

struct Snapshot<'a> {
    lexer: Lexer<'a>,
    current: Token<'a>,
    previous: Token<'a>,
    error_count: usize,
    panic_mode: bool,
}

impl<'a> Parser<'a> {
    pub fn new(input: &'a str) -> Self {
        let start = Token::new(TokenKind::Newline, Span::default());
        let mut parser = Self {
            lexer: Lexer::new(input),
            current: start.clone(),
            previous: start,
            errors: Vec::new(),
            panic_mode: false,
            loop_depth: 0,
            function_depth: 0,
            nesting: 0,
        };
        parser.advance();
        parser
    }

    /// Parses declarations until end of input. Diagnostics are collected
    /// rather than returned; check [`Parser::had_error`] afterwards.
    pub fn parse_program(&mut self) -> Program {
        let mut statements = Vec::new();
        while !self.check(&TokenKind::EOF) {
            if self.check(&TokenKind::Dedent) || self.check(&TokenKind::Newline) {
                self.advance();
                continue;
            }
            if let Some(statement) = self.parse_statement() {
                statements.push(statement);
            }
        }
        Program { statements }
    }

    /// Parses one declaration or statement, recovering on error.
    pub fn parse_statement(&mut self) -> Option<Statement> {
        match self.declaration() {
            Ok(statement) => Some(statement),
            Err(error) => {
                self.record(error);
                self.synchronize();
                None
            }
        }
    }

    pub fn parse_expression(&mut self) -> Option<Expression> {
        match self.expression() {
            Ok(expression) => Some(expression),
            Err(error) => {
                self.record(error);
                None
            }
        }
    }

    pub fn had_error(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Every collected diagnostic, one per line.
    pub fn error_message(&self) -> Option<String> {
        if self.errors.is_empty() {
            return None;
        }
        Some(
            self.errors
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join("\n"),
        )
    }

    pub fn clear_error(&mut self) {
        self.errors.clear();
        self.panic_mode = false;
    }

    pub fn errors(&self) -> &[ParseError] {
        &self.errors
    }

    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        self.errors.iter().map(ParseError::diagnostic).collect()
    }

    pub(crate) fn into_errors(self) -> Vec<ParseError> {
        self.errors
    }

    // ---- token plumbing ----

    fn advance(&mut self) {
        loop {
            let token = self.lexer.next_token();
            if let TokenKind::Error(error) = token.kind {
                // Lexer failures always surface, even while recovering.
                self.errors
                    .push(ParseError::new(token.span.line, ParseErrorKind::Lex(error)));
                continue;
            }
            self.previous = std::mem::replace(&mut self.current, token);
            return;
        }
    }

    fn check(&self, kind: &TokenKind<'_>) -> bool {
        std::mem::discriminant(&self.current.kind) == std::mem::discriminant(kind)
    }

    fn eat(&mut self, kind: &TokenKind<'_>) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn consume(&mut self, kind: &TokenKind<'_>, expected: &str) -> ParseResult<()> {
        if self.eat(kind) {
            Ok(())
        } else {
            Err(self.unexpected(expected))
        }
    }

    fn consume_identifier(&mut self, expected: &str) -> ParseResult<String> {
        if let TokenKind::Identifier(name) = self.current.kind {
            self.advance();
            Ok(name.to_string())
        } else {
            Err(self.unexpected(expected))
        }
    }

    fn line(&self) -> usize {
        self.current.line()
    }

    fn unexpected(&self, expected: &str) -> ParseError {
        self.error(ParseErrorKind::UnexpectedToken {
            expected: expected.to_string(),
            found: self.current.kind.to_string(),
        })
    }

    fn error(&self, kind: ParseErrorKind) -> ParseError {
        ParseError::new(self.line(), kind)
    }

    // ---- speculation ----

    fn snapshot(&self) -> Snapshot<'a> {
        Snapshot {
            lexer: self.lexer.clone(),
            current: self.current.clone(),
            previous: self.previous.clone(),
            error_count: self.errors.len(),
            panic_mode: self.panic_mode,
        }
    }

    fn restore(&mut self, snapshot: Snapshot<'a>) {
        self.lexer = snapshot.lexer;
        self.current = snapshot.current;
        self.previous = snapshot.previous;
        self.errors.truncate(snapshot.error_count);
        self.panic_mode = snapshot.panic_mode;
    }

    // ---- recovery ----

    fn record(&mut self, error: ParseError) {
        if !self.panic_mode {
            tracing::trace!(line = error.line, "parse error: {}", error.kind);
            self.errors.push(error);
        }
        self.panic_mode = true;
    }

    /// Skips to the end of the broken line, or to a keyword on it that can
    /// only begin a statement. An indented block hanging off the line belongs
    /// to the broken construct and is skipped with it.
    fn synchronize(&mut self) {
        if self.check(&TokenKind::Indent) {
            self.skip_indented_block();
        }
        let mut skipped = false;
        loop {
            match self.current.kind {
                TokenKind::EOF | TokenKind::Dedent => break,
                // `関数` mid-line is a function literal.
                ref kind if skipped && kind.starts_statement() && *kind != TokenKind::Function => {
                    break;
                }
                TokenKind::Newline => {
                    self.advance();
                    if self.check(&TokenKind::Indent) {
                        self.skip_indented_block();
                    }
                    break;
                }
                _ => {
                    self.advance();
                    skipped = true;
                }
            }
        }
        self.panic_mode = false;
    }

    fn skip_indented_block(&mut self) {
        let mut depth = 0usize;
        loop {
            match self.current.kind {
                TokenKind::Indent => depth += 1,
                TokenKind::Dedent => {
                    depth -= 1;
                    if depth == 0 {
                        self.advance();
                        return;
                    }
                }
                TokenKind::EOF => return,
                _ => {}
            }
            self.advance();
        }
    }

    /// A statement ends at a newline, or without consuming anything where
    /// an enclosing construct takes over: end of input, end of a block, a
    /// closing bracket, a separator, or a keyword that continues an inline
    /// block (`でなければ`, `捕捉`, ...). A statement whose last part was a
    /// block (an anonymous function body) has already consumed its line.
    fn end_statement(&mut self) -> ParseResult<()> {
        match self.current.kind {
            TokenKind::Newline => {
                self.advance();
                Ok(())
            }
            TokenKind::EOF
            | TokenKind::Dedent
            | TokenKind::RParen
            | TokenKind::RBracket
            | TokenKind::RBrace
            | TokenKind::Comma => Ok(()),
            ref kind if kind.is_block_terminator() => Ok(()),
            _ if matches!(self.previous.kind, TokenKind::Dedent | TokenKind::Newline) => Ok(()),
            _ => Err(self.unexpected("改行")),
        }
    }

    fn in_function<T>(
        &mut self,
        parse: impl FnOnce(&mut Self) -> ParseResult<T>,
    ) -> ParseResult<T> {
        let saved_loops = std::mem::replace(&mut self.loop_depth, 0);
        self.function_depth += 1;
        let result = parse(self);
        self.function_depth -= 1;
        self.loop_depth = saved_loops;
        result
    }

    /// Runs a recursive rule one level deeper, growing the host stack as
    /// needed. Input nested past [`MAX_NESTING`] is a syntax error.
    fn nested<T>(&mut self, parse: impl FnOnce(&mut Self) -> ParseResult<T>) -> ParseResult<T> {
        if self.nesting >= MAX_NESTING {
            return Err(self.error(ParseErrorKind::NestingTooDeep { limit: MAX_NESTING }));
        }
        self.nesting += 1;
        let result = crate::stack::ensure_sufficient_stack(|| parse(self));
        self.nesting -= 1;
        result
    }

    fn in_loop<T>(&mut self, parse: impl FnOnce(&mut Self) -> ParseResult<T>) -> ParseResult<T> {
        self.loop_depth += 1;
        let result = parse(self);
        self.loop_depth -= 1;
        result
    }
}

pub fn parse(input: &str) -> Result<Program, ParseErrors> {
    let mut parser = Parser::new(input);
    let program = parser.parse_program();
    if parser.had_error() {
        Err(ParseErrors(parser.into_errors()))
    } else {
        Ok(program)
    }
}

/// Parses a single expression followed by optional newlines.
pub fn parse_expression(input: &str) -> Result<Expression, ParseErrors> {
    let mut parser = Parser::new(input);
    let expression = parser.parse_expression();
    while parser.eat(&TokenKind::Newline) {}
    if expression.is_some() && !parser.check(&TokenKind::EOF) {
        let error = parser.unexpected("入力の終わり");
        parser.record(error);
    }
    match expression {
        Some(expression) if !parser.had_error() => Ok(expression),
        _ => Err(ParseErrors(parser.into_errors())),
    }
}
