use std::fmt;

use crate::lexer::error::LexError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Span {
    pub start: usize,
    pub end: usize,
    pub line: usize,
    pub column: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind<'a> {
    Identifier(&'a str),
    Number(f64),
    String(String),
    True,
    False,
    Null,

    // Declarations
    Var,
    Const,
    Function,
    Class,
    Extends,
    New,
    SelfRef,
    Super,
    Import,

    // Control flow
    If,
    Else,
    While,
    Each,
    Wo,
    Kara,
    Made,
    Return,
    Break,
    Continue,
    Try,
    Catch,
    Finally,
    Throw,
    Match,
    Case,

    // Logical keywords (`&&`, `||` and `!` map onto these as well)
    And,
    Or,
    Not,

    // Type names used by advisory annotations
    NumberType,
    StringType,
    BooleanType,
    ArrayType,
    MapType,
    AnyType,

    // Operators
    Plus,         // +
    Minus,        // -
    Star,         // *
    Slash,        // /
    Percent,      // %
    StarStar,     // **
    Equal,        // =
    EqualEqual,   // ==
    BangEqual,    // !=
    Less,         // <
    LessEqual,    // <=
    Greater,      // >
    GreaterEqual, // >=
    PlusEqual,    // +=
    MinusEqual,   // -=
    StarEqual,    // *=
    SlashEqual,   // /=
    PercentEqual, // %=
    Arrow,        // ->
    At,           // @

    // Delimiters
    Colon,    // :
    Comma,    // ,
    Dot,      // .
    LParen,   // (
    RParen,   // )
    LBracket, // [
    RBracket, // ]
    LBrace,   // {
    RBrace,   // }

    // Structural
    Newline,
    Indent,
    Dedent,
    EOF,

    /// Malformed input. The lexer keeps going after producing one of these.
    Error(LexError),
}

/// Fixed keyword lexicon. Identifier-class runs are matched against this
/// table verbatim.
pub const KEYWORDS: &[(&str, TokenKind<'static>)] = &[
    ("変数", TokenKind::Var),
    ("定数", TokenKind::Const),
    ("関数", TokenKind::Function),
    ("クラス", TokenKind::Class),
    ("継承", TokenKind::Extends),
    ("新規", TokenKind::New),
    ("自分", TokenKind::SelfRef),
    ("親", TokenKind::Super),
    ("取り込む", TokenKind::Import),
    ("もし", TokenKind::If),
    ("でなければ", TokenKind::Else),
    ("繰り返し", TokenKind::While),
    ("各", TokenKind::Each),
    ("を", TokenKind::Wo),
    ("から", TokenKind::Kara),
    ("まで", TokenKind::Made),
    ("戻る", TokenKind::Return),
    ("中断", TokenKind::Break),
    ("次へ", TokenKind::Continue),
    ("試す", TokenKind::Try),
    ("捕捉", TokenKind::Catch),
    ("最終", TokenKind::Finally),
    ("投げる", TokenKind::Throw),
    ("照合", TokenKind::Match),
    ("場合", TokenKind::Case),
    ("かつ", TokenKind::And),
    ("または", TokenKind::Or),
    ("非", TokenKind::Not),
    ("真", TokenKind::True),
    ("偽", TokenKind::False),
    ("無", TokenKind::Null),
    ("数値", TokenKind::NumberType),
    ("文字列", TokenKind::StringType),
    ("真偽", TokenKind::BooleanType),
    ("配列", TokenKind::ArrayType),
    ("辞書", TokenKind::MapType),
    ("任意", TokenKind::AnyType),
];

pub fn keyword(ident: &str) -> Option<TokenKind<'static>> {
    KEYWORDS
        .iter()
        .find(|(name, _)| *name == ident)
        .map(|(_, kind)| kind.clone())
}

fn keyword_text(kind: &TokenKind<'_>) -> Option<&'static str> {
    KEYWORDS
        .iter()
        .find_map(|(name, candidate)| same_kind(candidate, kind).then_some(*name))
}

fn same_kind<'a>(left: &TokenKind<'a>, right: &TokenKind<'a>) -> bool {
    left == right
}

impl TokenKind<'_> {
    /// Keywords that close an inline block early, before a newline.
    pub fn is_block_terminator(&self) -> bool {
        matches!(
            self,
            TokenKind::Else | TokenKind::Catch | TokenKind::Finally | TokenKind::Case
        )
    }

    /// Keywords that begin a declaration or statement. Panic-mode recovery
    /// resumes at one of these when it meets it on a broken line.
    pub fn starts_statement(&self) -> bool {
        matches!(
            self,
            TokenKind::Var
                | TokenKind::Const
                | TokenKind::Function
                | TokenKind::Class
                | TokenKind::If
                | TokenKind::While
                | TokenKind::Each
                | TokenKind::Return
                | TokenKind::Break
                | TokenKind::Continue
                | TokenKind::Try
                | TokenKind::Throw
                | TokenKind::Match
                | TokenKind::Import
                | TokenKind::At
        )
    }
}

impl fmt::Display for TokenKind<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(name) = keyword_text(self) {
            return write!(f, "'{name}'");
        }
        let text = match self {
            TokenKind::Identifier(name) => return write!(f, "識別子 '{name}'"),
            TokenKind::Number(value) => return write!(f, "数値 {value}"),
            TokenKind::String(value) => return write!(f, "文字列 {value:?}"),
            TokenKind::Error(error) => return write!(f, "{error}"),
            TokenKind::Plus => "+",
            TokenKind::Minus => "-",
            TokenKind::Star => "*",
            TokenKind::Slash => "/",
            TokenKind::Percent => "%",
            TokenKind::StarStar => "**",
            TokenKind::Equal => "=",
            TokenKind::EqualEqual => "==",
            TokenKind::BangEqual => "!=",
            TokenKind::Less => "<",
            TokenKind::LessEqual => "<=",
            TokenKind::Greater => ">",
            TokenKind::GreaterEqual => ">=",
            TokenKind::PlusEqual => "+=",
            TokenKind::MinusEqual => "-=",
            TokenKind::StarEqual => "*=",
            TokenKind::SlashEqual => "/=",
            TokenKind::PercentEqual => "%=",
            TokenKind::Arrow => "->",
            TokenKind::At => "@",
            TokenKind::Colon => ":",
            TokenKind::Comma => ",",
            TokenKind::Dot => ".",
            TokenKind::LParen => "(",
            TokenKind::RParen => ")",
            TokenKind::LBracket => "[",
            TokenKind::RBracket => "]",
            TokenKind::LBrace => "{",
            TokenKind::RBrace => "}",
            TokenKind::Newline => "改行",
            TokenKind::Indent => "ブロック開始",
            TokenKind::Dedent => "ブロック終了",
            TokenKind::EOF => "入力の終わり",
            _ => "?",
        };
        if text.chars().all(|c| c.is_ascii_punctuation()) {
            write!(f, "'{text}'")
        } else {
            f.write_str(text)
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token<'a> {
    pub kind: TokenKind<'a>,
    pub span: Span,
}

impl<'a> Token<'a> {
    pub fn new(kind: TokenKind<'a>, span: Span) -> Self {
        Self { kind, span }
    }

    pub fn kind(&self) -> &TokenKind<'a> {
        &self.kind
    }

    pub fn span(&self) -> Span {
        self.span
    }

    pub fn line(&self) -> usize {
        self.span.line
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keyword_lookup_matches_whole_runs_only() {
        assert_eq!(keyword("もし"), Some(TokenKind::If));
        assert_eq!(keyword("でなければ"), Some(TokenKind::Else));
        assert_eq!(keyword("もしも"), None);
        assert_eq!(keyword("x"), None);
    }

    #[test]
    fn displays_keywords_by_their_source_text() {
        assert_eq!(TokenKind::While.to_string(), "'繰り返し'");
        assert_eq!(TokenKind::RParen.to_string(), "')'");
        assert_eq!(TokenKind::Newline.to_string(), "改行");
    }
}
