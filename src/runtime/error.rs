use thiserror::Error;

/// Failures raised while evaluating. These abort the running program and are
/// never visible to `試す`/`捕捉`, which only see values thrown with `投げる`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RuntimeError {
    #[error("未定義の変数 '{name}'")]
    UndefinedVariable { name: String },
    #[error("定数 '{name}' には再代入できません")]
    ConstantReassignment { name: String },
    #[error("0 で割ることはできません")]
    DivisionByZero,
    #[error("0 で剰余を求めることはできません")]
    ModuloByZero,
    #[error("演算子 '{op}' は {left} と {right} には使えません")]
    UnsupportedOperands {
        op: &'static str,
        left: &'static str,
        right: &'static str,
    },
    #[error("演算子 '{op}' は {operand} には使えません")]
    UnsupportedOperand {
        op: &'static str,
        operand: &'static str,
    },
    #[error("複合代入 '{op}=' には数値が必要ですが {left} と {right} が与えられました")]
    CompoundAssignmentType {
        op: &'static str,
        left: &'static str,
        right: &'static str,
    },
    #[error("関数 '{name}' の引数は {expected} 個ですが {found} 個渡されました")]
    ArityMismatch {
        name: String,
        expected: usize,
        found: usize,
    },
    #[error("組み込み関数 '{name}' の引数は {expected} ですが {found} 個渡されました")]
    BuiltinArityMismatch {
        name: String,
        expected: String,
        found: usize,
    },
    #[error("{type_name} は呼び出せません")]
    NotCallable { type_name: &'static str },
    #[error("{type_name} は添字で参照できません")]
    NotIndexable { type_name: &'static str },
    #[error("添字には整数が必要ですが {index} が与えられました")]
    InvalidIndex { index: String },
    #[error("添字 {index} は範囲外です (長さ {len})")]
    IndexOutOfRange { index: i64, len: usize },
    #[error("辞書のキーには文字列が必要ですが {type_name} が与えられました")]
    InvalidMapKey { type_name: &'static str },
    #[error("{type_name} は反復できません")]
    NotIterable { type_name: &'static str },
    #[error("{type_name} にメンバー '{name}' はありません")]
    UndefinedMember {
        name: String,
        type_name: &'static str,
    },
    #[error("{type_name} はクラスではありません")]
    NotAClass { type_name: &'static str },
    #[error("'自分' はメソッドの中でのみ使えます")]
    SelfOutsideMethod,
    #[error("'親' はメソッドの中でのみ使えます")]
    SuperOutsideMethod,
    #[error("クラス '{class}' に親クラスはありません")]
    NoParentClass { class: String },
    #[error("親クラスにメソッド '{method}' はありません")]
    UndefinedSuperMethod { method: String },
    #[error("'自分' には代入できません")]
    SelfAssignment,
    #[error("代入先が不正です")]
    InvalidTarget,
    #[error("範囲の端には数値が必要ですが {found} が与えられました")]
    RangeBound { found: &'static str },
    #[error("呼び出しが深すぎます (上限 {limit})")]
    StackOverflow { limit: usize },
    #[error("{function}: {expected} が必要ですが {found} が与えられました")]
    ArgumentType {
        function: &'static str,
        expected: &'static str,
        found: &'static str,
    },
    #[error("{function}: {message}")]
    InvalidArgument {
        function: &'static str,
        message: String,
    },
    #[error("'{text}' を数値に変換できません")]
    NumberConversion { text: String },
    #[error("ファイル '{path}' を取り込めません: {reason}")]
    ImportFailed { path: String, reason: String },
    #[error("ファイル '{path}' に構文エラーがあります:\n{diagnostics}")]
    ImportSyntax { path: String, diagnostics: String },
}
