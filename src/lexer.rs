//! Indentation-aware tokenizer.
//!
//! Tokens are produced lazily, one per [`Lexer::next_token`] call. The lexer
//! is `Clone` so the parser can snapshot every piece of mutable state
//! (position, indentation stack, pending block-ends, bracket depth) before a
//! speculative parse and roll back afterwards.

pub mod error;

use crate::token::{Span, Token, TokenKind, keyword};

use error::LexError;

const TAB_WIDTH: usize = 4;
const IDEOGRAPHIC_SPACE: char = '\u{3000}';

#[derive(Debug, Clone)]
pub struct Lexer<'a> {
    input: &'a str,
    position: usize,
    line: usize,
    column: usize,
    indent_stack: Vec<usize>,
    pending_dedents: usize,
    at_line_start: bool,
    bracket_depth: usize,
    emitted_eof: bool,
    had_error: bool,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Self {
            input,
            position: 0,
            line: 1,
            column: 0,
            indent_stack: vec![0],
            pending_dedents: 0,
            at_line_start: true,
            bracket_depth: 0,
            emitted_eof: false,
            had_error: false,
        }
    }

    /// Sticky flag set once any error token has been produced.
    pub fn had_error(&self) -> bool {
        self.had_error
    }

    /// Currently open indentation levels, bottom first. Always starts with 0.
    pub fn indent_levels(&self) -> &[usize] {
        &self.indent_stack
    }

    pub fn next_token(&mut self) -> Token<'a> {
        if self.pending_dedents > 0 {
            self.pending_dedents -= 1;
            return self.structural(TokenKind::Dedent);
        }

        if self.at_line_start && self.bracket_depth == 0 {
            self.at_line_start = false;
            if let Some(level) = self.measure_indentation() {
                if let Some(token) = self.apply_indentation(level) {
                    return token;
                }
            }
        }

        self.skip_inline_whitespace();

        let Some(ch) = self.peek_char() else {
            return self.finish();
        };

        let start = self.position;
        let line = self.line;
        let column = self.column;
        let span = |end: usize| Span {
            start,
            end,
            line,
            column,
        };

        if ch == '\n' {
            self.advance_char();
            self.at_line_start = true;
            return Token::new(TokenKind::Newline, span(self.position));
        }
        if ch == '"' || ch == '\'' {
            return self.read_string(ch, start, line, column);
        }
        let fraction = ch == '.' && self.peek_nth(1).is_some_and(|c| c.is_ascii_digit());
        if ch.is_ascii_digit() || fraction {
            return self.read_number(start, line, column);
        }
        if is_identifier_start(ch) {
            return self.read_identifier(start, line, column);
        }

        self.advance_char();
        let kind = match ch {
            '+' => self.choose('=', TokenKind::PlusEqual, TokenKind::Plus),
            '-' => {
                if self.eat('>') {
                    TokenKind::Arrow
                } else {
                    self.choose('=', TokenKind::MinusEqual, TokenKind::Minus)
                }
            }
            '*' => {
                if self.eat('*') {
                    TokenKind::StarStar
                } else {
                    self.choose('=', TokenKind::StarEqual, TokenKind::Star)
                }
            }
            '/' => self.choose('=', TokenKind::SlashEqual, TokenKind::Slash),
            '%' => self.choose('=', TokenKind::PercentEqual, TokenKind::Percent),
            '=' => self.choose('=', TokenKind::EqualEqual, TokenKind::Equal),
            '!' => self.choose('=', TokenKind::BangEqual, TokenKind::Not),
            '<' => self.choose('=', TokenKind::LessEqual, TokenKind::Less),
            '>' => self.choose('=', TokenKind::GreaterEqual, TokenKind::Greater),
            '&' if self.eat('&') => TokenKind::And,
            '|' if self.eat('|') => TokenKind::Or,
            '@' => TokenKind::At,
            ':' => TokenKind::Colon,
            ',' => TokenKind::Comma,
            '.' => TokenKind::Dot,
            '(' => self.open_bracket(TokenKind::LParen),
            ')' => self.close_bracket(TokenKind::RParen),
            '[' => self.open_bracket(TokenKind::LBracket),
            ']' => self.close_bracket(TokenKind::RBracket),
            '{' => self.open_bracket(TokenKind::LBrace),
            '}' => self.close_bracket(TokenKind::RBrace),
            character => self.error_kind(LexError::UnexpectedCharacter { character }),
        };
        Token::new(kind, span(self.position))
    }

    /// Skips blank and comment-only lines, then returns the indentation width
    /// of the first line with content. `None` means end of input.
    fn measure_indentation(&mut self) -> Option<usize> {
        loop {
            let mut width = 0;
            while let Some(ch) = self.peek_char() {
                match ch {
                    ' ' | IDEOGRAPHIC_SPACE => width += 1,
                    '\t' => width = (width / TAB_WIDTH + 1) * TAB_WIDTH,
                    '\r' => {}
                    _ => break,
                }
                self.advance_char();
            }

            match self.peek_char() {
                None => return None,
                Some('\n') => {
                    self.advance_char();
                }
                Some('#') => self.skip_comment(),
                Some('/') if self.peek_nth(1) == Some('/') => self.skip_comment(),
                Some(_) => return Some(width),
            }
        }
    }

    fn apply_indentation(&mut self, level: usize) -> Option<Token<'a>> {
        let top = self.current_indent();
        if level > top {
            self.indent_stack.push(level);
            return Some(self.structural(TokenKind::Indent));
        }
        if level == top {
            return None;
        }

        while self.current_indent() > level {
            self.indent_stack.pop();
            self.pending_dedents += 1;
        }
        if self.current_indent() != level {
            let kind = self.error_kind(LexError::InconsistentDedent {
                indent_level: level,
            });
            return Some(self.structural(kind));
        }
        self.pending_dedents -= 1;
        Some(self.structural(TokenKind::Dedent))
    }

    fn current_indent(&self) -> usize {
        self.indent_stack.last().copied().unwrap_or(0)
    }

    /// End of input: close every open block, one block-end per call, then
    /// report `EOF` forever.
    fn finish(&mut self) -> Token<'a> {
        if self.indent_stack.len() > 1 {
            self.indent_stack.pop();
            return self.structural(TokenKind::Dedent);
        }
        self.emitted_eof = true;
        self.structural(TokenKind::EOF)
    }

    fn skip_inline_whitespace(&mut self) {
        while let Some(ch) = self.peek_char() {
            match ch {
                ' ' | '\t' | '\r' | IDEOGRAPHIC_SPACE => {
                    self.advance_char();
                }
                '\n' if self.bracket_depth > 0 => {
                    self.advance_char();
                }
                '#' => self.skip_comment(),
                '/' if self.peek_nth(1) == Some('/') => self.skip_comment(),
                _ => break,
            }
        }
    }

    fn skip_comment(&mut self) {
        while let Some(ch) = self.peek_char() {
            if ch == '\n' {
                break;
            }
            self.advance_char();
        }
    }

    fn read_identifier(&mut self, start: usize, line: usize, column: usize) -> Token<'a> {
        while let Some(ch) = self.peek_char() {
            if is_identifier_continue(ch) {
                self.advance_char();
            } else {
                break;
            }
        }
        let ident = &self.input[start..self.position];
        let kind = keyword(ident).unwrap_or(TokenKind::Identifier(ident));
        Token::new(
            kind,
            Span {
                start,
                end: self.position,
                line,
                column,
            },
        )
    }

    fn read_number(&mut self, start: usize, line: usize, column: usize) -> Token<'a> {
        self.eat_digits();
        if self.peek_char() == Some('.') && self.peek_nth(1).is_some_and(|c| c.is_ascii_digit()) {
            self.advance_char();
            self.eat_digits();
        }
        if matches!(self.peek_char(), Some('e' | 'E')) {
            let signed = matches!(self.peek_nth(1), Some('+' | '-'));
            let digit_at = if signed { 2 } else { 1 };
            if self.peek_nth(digit_at).is_some_and(|c| c.is_ascii_digit()) {
                for _ in 0..digit_at {
                    self.advance_char();
                }
                self.eat_digits();
            }
        }

        let literal = &self.input[start..self.position];
        let kind = match literal.parse::<f64>() {
            Ok(value) => TokenKind::Number(value),
            Err(_) => self.error_kind(LexError::InvalidNumberLiteral {
                literal: literal.to_string(),
            }),
        };
        Token::new(
            kind,
            Span {
                start,
                end: self.position,
                line,
                column,
            },
        )
    }

    fn eat_digits(&mut self) {
        while self.peek_char().is_some_and(|c| c.is_ascii_digit()) {
            self.advance_char();
        }
    }

    fn read_string(&mut self, quote: char, start: usize, line: usize, column: usize) -> Token<'a> {
        let triple = quote == '"' && self.input[self.position..].starts_with("\"\"\"");
        let delimiter_len = if triple { 3 } else { 1 };
        for _ in 0..delimiter_len {
            self.advance_char();
        }

        let mut value = String::new();
        let mut failure: Option<LexError> = None;
        let terminated = loop {
            let Some(ch) = self.peek_char() else {
                break false;
            };
            if triple && self.input[self.position..].starts_with("\"\"\"") {
                for _ in 0..3 {
                    self.advance_char();
                }
                break true;
            }
            if !triple && ch == quote {
                self.advance_char();
                break true;
            }
            if !triple && ch == '\n' {
                break false;
            }
            self.advance_char();
            if ch != '\\' {
                value.push(ch);
                continue;
            }
            match self.read_escape() {
                Ok(decoded) => value.push(decoded),
                Err(error) => {
                    failure.get_or_insert(error);
                }
            }
        };

        let kind = if !terminated {
            self.error_kind(LexError::UnterminatedString)
        } else if let Some(error) = failure {
            self.error_kind(error)
        } else {
            TokenKind::String(value)
        };
        Token::new(
            kind,
            Span {
                start,
                end: self.position,
                line,
                column,
            },
        )
    }

    fn read_escape(&mut self) -> Result<char, LexError> {
        let Some(escape) = self.advance_char() else {
            return Err(LexError::UnterminatedString);
        };
        match escape {
            'n' => Ok('\n'),
            't' => Ok('\t'),
            'r' => Ok('\r'),
            '\\' => Ok('\\'),
            '"' => Ok('"'),
            '\'' => Ok('\''),
            '0' => Ok('\0'),
            'u' => {
                let mut digits = String::with_capacity(4);
                while digits.len() < 4 {
                    match self.peek_char() {
                        Some(c) if c.is_ascii_hexdigit() => {
                            digits.push(c);
                            self.advance_char();
                        }
                        _ => break,
                    }
                }
                u32::from_str_radix(&digits, 16)
                    .ok()
                    .filter(|_| digits.len() == 4)
                    .and_then(char::from_u32)
                    .ok_or(LexError::InvalidUnicodeEscape { digits })
            }
            other => Err(LexError::InvalidEscape { escape: other }),
        }
    }

    fn open_bracket(&mut self, kind: TokenKind<'a>) -> TokenKind<'a> {
        self.bracket_depth += 1;
        kind
    }

    fn close_bracket(&mut self, kind: TokenKind<'a>) -> TokenKind<'a> {
        self.bracket_depth = self.bracket_depth.saturating_sub(1);
        kind
    }

    fn choose(
        &mut self,
        next: char,
        matched: TokenKind<'a>,
        otherwise: TokenKind<'a>,
    ) -> TokenKind<'a> {
        if self.eat(next) { matched } else { otherwise }
    }

    fn eat(&mut self, expected: char) -> bool {
        if self.peek_char() == Some(expected) {
            self.advance_char();
            true
        } else {
            false
        }
    }

    fn error_kind(&mut self, error: LexError) -> TokenKind<'a> {
        tracing::trace!(line = self.line, "lexer error: {error}");
        self.had_error = true;
        TokenKind::Error(error)
    }

    fn structural(&self, kind: TokenKind<'a>) -> Token<'a> {
        Token::new(
            kind,
            Span {
                start: self.position,
                end: self.position,
                line: self.line,
                column: self.column,
            },
        )
    }

    fn peek_char(&self) -> Option<char> {
        self.input[self.position..].chars().next()
    }

    fn peek_nth(&self, n: usize) -> Option<char> {
        self.input[self.position..].chars().nth(n)
    }

    fn advance_char(&mut self) -> Option<char> {
        let ch = self.peek_char()?;
        self.position += ch.len_utf8();
        if ch == '\n' {
            self.line += 1;
            self.column = 0;
        } else {
            self.column += 1;
        }
        Some(ch)
    }
}

impl<'a> Iterator for Lexer<'a> {
    type Item = Token<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.emitted_eof {
            None
        } else {
            Some(self.next_token())
        }
    }
}

fn is_identifier_start(ch: char) -> bool {
    ch.is_ascii_alphabetic() || ch == '_' || (!ch.is_ascii() && ch != IDEOGRAPHIC_SPACE)
}

fn is_identifier_continue(ch: char) -> bool {
    is_identifier_start(ch) || ch.is_ascii_digit()
}

/// Tokenizes the whole input, stopping at the first malformed token.
pub fn tokenize(input: &str) -> Result<Vec<Token<'_>>, LexError> {
    let mut tokens = Vec::new();
    for token in Lexer::new(input) {
        if let TokenKind::Error(error) = token.kind {
            return Err(error);
        }
        tokens.push(token);
    }
    Ok(tokens)
}
