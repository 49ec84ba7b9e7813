//! Single-line diagnostics shared by the parser and the interpreter.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Syntax,
    Runtime,
    Exception,
}

impl Phase {
    pub fn label(self) -> &'static str {
        match self {
            Phase::Syntax => "構文エラー",
            Phase::Runtime => "実行時エラー",
            Phase::Exception => "例外",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Renders as `[<line>行目] <phase>: <message>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub line: usize,
    pub phase: Phase,
    pub message: String,
}

impl Diagnostic {
    pub fn new(line: usize, phase: Phase, message: impl Into<String>) -> Self {
        Self {
            line,
            phase,
            message: message.into(),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}行目] {}: {}", self.line, self.phase, self.message)
    }
}

impl std::error::Error for Diagnostic {}
