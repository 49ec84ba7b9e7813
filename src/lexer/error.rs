use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LexError {
    #[error("インデントが一致しません: {indent_level} 桁へのデデントに対応するブロックがありません")]
    InconsistentDedent { indent_level: usize },
    #[error("予期しない文字 '{character}'")]
    UnexpectedCharacter { character: char },
    #[error("不正な数値リテラル '{literal}'")]
    InvalidNumberLiteral { literal: String },
    #[error("文字列リテラルが閉じられていません")]
    UnterminatedString,
    #[error("不正なエスケープシーケンス '\\{escape}'")]
    InvalidEscape { escape: char },
    #[error("不正な \\u エスケープ '{digits}'")]
    InvalidUnicodeEscape { digits: String },
}
