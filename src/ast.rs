//! Syntax tree built by the parser and walked by the interpreter.
//!
//! Every node owns its children. Function bodies sit behind an `Rc` so a
//! closure value can keep its declaration alive after the surrounding tree
//! (for instance an imported module) would otherwise be dropped; the tree
//! itself never shares a node between two parents.

use std::rc::Rc;

#[derive(Debug, PartialEq, Clone)]
pub enum Expression {
    Number(f64),
    String(String),
    Boolean(bool),
    Null,
    Identifier(String),
    SelfRef,
    Super {
        method: String,
    },
    Array(Vec<Expression>),
    Map(Vec<(Expression, Expression)>),
    Comprehension {
        element: Box<Expression>,
        variable: String,
        iterable: Box<Expression>,
        condition: Option<Box<Expression>>,
    },
    UnaryOp {
        op: UnaryOperator,
        operand: Box<Expression>,
    },
    BinaryOp {
        left: Box<Expression>,
        op: BinaryOperator,
        right: Box<Expression>,
    },
    Logical {
        left: Box<Expression>,
        op: LogicalOperator,
        right: Box<Expression>,
    },
    Call {
        callee: Box<Expression>,
        args: Vec<Expression>,
    },
    Index {
        object: Box<Expression>,
        index: Box<Expression>,
    },
    Member {
        object: Box<Expression>,
        name: String,
    },
    New {
        class: Box<Expression>,
        args: Vec<Expression>,
    },
    Function(Rc<FunctionDecl>),
}

impl Expression {
    /// Whether this expression can appear on the left of an assignment.
    pub fn is_place(&self) -> bool {
        match self {
            Expression::Identifier(_) | Expression::SelfRef => true,
            Expression::Index { object, .. } | Expression::Member { object, .. } => {
                object.is_place()
            }
            _ => false,
        }
    }
}

#[derive(Debug, PartialEq, Clone, Copy)]
pub enum UnaryOperator {
    Negate,
    Plus,
    Not,
}

#[derive(Debug, PartialEq, Clone, Copy)]
pub enum BinaryOperator {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Pow,
    Equal,
    NotEqual,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,
}

impl BinaryOperator {
    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOperator::Add => "+",
            BinaryOperator::Sub => "-",
            BinaryOperator::Mul => "*",
            BinaryOperator::Div => "/",
            BinaryOperator::Mod => "%",
            BinaryOperator::Pow => "**",
            BinaryOperator::Equal => "==",
            BinaryOperator::NotEqual => "!=",
            BinaryOperator::Less => "<",
            BinaryOperator::LessEqual => "<=",
            BinaryOperator::Greater => ">",
            BinaryOperator::GreaterEqual => ">=",
        }
    }
}

#[derive(Debug, PartialEq, Clone, Copy)]
pub enum LogicalOperator {
    And,
    Or,
}

/// `=` or one of the compound forms, which carry the arithmetic operator
/// applied to the current value.
#[derive(Debug, PartialEq, Clone, Copy)]
pub enum AssignOperator {
    Assign,
    Compound(BinaryOperator),
}

/// Advisory annotation; parsed and kept, never enforced.
#[derive(Debug, PartialEq, Clone)]
pub enum TypeName {
    Number,
    String,
    Boolean,
    Array,
    Map,
    Any,
    Named(String),
}

#[derive(Debug, PartialEq, Clone)]
pub struct Parameter {
    pub name: String,
    pub annotation: Option<TypeName>,
}

#[derive(Debug, PartialEq, Clone)]
pub struct FunctionDecl {
    /// `None` for anonymous function literals.
    pub name: Option<String>,
    pub params: Vec<Parameter>,
    pub return_type: Option<TypeName>,
    pub body: Vec<Statement>,
    pub line: usize,
}

impl FunctionDecl {
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or("<無名>")
    }
}

#[derive(Debug, PartialEq, Clone)]
pub struct FieldDecl {
    pub name: String,
    pub value: Option<Expression>,
}

#[derive(Debug, PartialEq, Clone)]
pub struct ClassDecl {
    pub name: String,
    pub parent: Option<String>,
    pub fields: Vec<FieldDecl>,
    pub methods: Vec<Rc<FunctionDecl>>,
    pub initializer: Option<Rc<FunctionDecl>>,
}

#[derive(Debug, PartialEq, Clone)]
pub struct CatchClause {
    pub binding: Option<String>,
    pub body: Vec<Statement>,
}

/// One `場合` clause. All comma-separated patterns of the clause share the
/// single body owned here.
#[derive(Debug, PartialEq, Clone)]
pub struct MatchCase {
    pub patterns: Vec<Expression>,
    pub body: Vec<Statement>,
}

#[derive(Debug, PartialEq, Clone)]
pub struct Statement {
    pub kind: StatementKind,
    pub line: usize,
}

impl Statement {
    pub fn new(kind: StatementKind, line: usize) -> Self {
        Self { kind, line }
    }
}

#[derive(Debug, PartialEq, Clone)]
pub enum StatementKind {
    VarDecl {
        name: String,
        constant: bool,
        annotation: Option<TypeName>,
        value: Option<Expression>,
    },
    FunctionDecl(Rc<FunctionDecl>),
    ClassDecl(ClassDecl),
    Assign {
        target: Expression,
        op: AssignOperator,
        value: Expression,
    },
    If {
        condition: Expression,
        then_body: Vec<Statement>,
        else_body: Option<Vec<Statement>>,
    },
    While {
        condition: Expression,
        body: Vec<Statement>,
    },
    /// `i を start から end まで:`
    Range {
        variable: String,
        start: Expression,
        end: Expression,
        body: Vec<Statement>,
    },
    ForEach {
        variable: String,
        iterable: Expression,
        body: Vec<Statement>,
    },
    Return(Option<Expression>),
    Break,
    Continue,
    Try {
        body: Vec<Statement>,
        catch: Option<CatchClause>,
        finally_body: Option<Vec<Statement>>,
    },
    Throw(Expression),
    Match {
        subject: Expression,
        cases: Vec<MatchCase>,
        default: Option<Vec<Statement>>,
    },
    Import(String),
    /// Statements run in the current scope; produced by decorator sugar.
    Block(Vec<Statement>),
    Expr(Expression),
}

#[derive(Debug, PartialEq, Clone, Default)]
pub struct Program {
    pub statements: Vec<Statement>,
}
