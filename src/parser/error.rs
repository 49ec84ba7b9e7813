use std::fmt;

use thiserror::Error;

use crate::diagnostic::{Diagnostic, Phase};
use crate::lexer::error::LexError;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseErrorKind {
    #[error("{0}")]
    Lex(#[from] LexError),
    #[error("{expected} が必要ですが {found} が見つかりました")]
    UnexpectedToken { expected: String, found: String },
    #[error("式が必要ですが {found} が見つかりました")]
    ExpectedExpression { found: String },
    #[error("インデントされたブロックが必要です")]
    ExpectedBlock,
    #[error("代入先が不正です")]
    InvalidAssignmentTarget,
    #[error("'{keyword}' はループの中でのみ使えます")]
    LoopControlOutsideLoop { keyword: &'static str },
    #[error("'戻る' は関数の中でのみ使えます")]
    ReturnOutsideFunction,
    #[error("定数 '{name}' には初期値が必要です")]
    ConstWithoutValue { name: String },
    #[error("'試す' には '捕捉' か '最終' が必要です")]
    TryWithoutHandler,
    #[error("ワイルドカード '_' の場合が重複しています")]
    DuplicateWildcard,
    #[error("'照合' には少なくとも一つの '場合' が必要です")]
    EmptyMatch,
    #[error("デコレータの後には関数宣言が必要です")]
    DecoratorWithoutFunction,
    #[error("クラス '{class}' の初期化メソッドが重複しています")]
    DuplicateInitializer { class: String },
    #[error("クラス本体には関数と変数の宣言のみ書けますが {found} が見つかりました")]
    InvalidClassMember { found: String },
    #[error("入れ子が深すぎます (上限 {limit})")]
    NestingTooDeep { limit: usize },
    #[error("予期しない {found}")]
    UnexpectedBlock { found: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    pub line: usize,
    pub kind: ParseErrorKind,
}

impl ParseError {
    pub fn new(line: usize, kind: ParseErrorKind) -> Self {
        Self { line, kind }
    }

    pub fn diagnostic(&self) -> Diagnostic {
        Diagnostic::new(self.line, Phase::Syntax, self.kind.to_string())
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.diagnostic().fmt(f)
    }
}

impl std::error::Error for ParseError {}

/// Every diagnostic collected while parsing one source text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{}", render(.0))]
pub struct ParseErrors(pub Vec<ParseError>);

fn render(errors: &[ParseError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("\n")
}

impl ParseErrors {
    pub fn first(&self) -> Option<&ParseError> {
        self.0.first()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
