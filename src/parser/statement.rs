use std::rc::Rc;

use crate::ast::{
    AssignOperator, BinaryOperator, CatchClause, ClassDecl, Expression, FieldDecl, FunctionDecl,
    MatchCase, Parameter, Statement, StatementKind, TypeName,
};
use crate::token::TokenKind;

use super::error::{ParseError, ParseErrorKind};
use super::{ParseResult, Parser};

const INITIALIZER: &str = "初期化";
const WILDCARD: &str = "_";

impl<'a> Parser<'a> {
    pub(super) fn declaration(&mut self) -> ParseResult<Statement> {
        self.nested(Self::declaration_inner)
    }

    fn declaration_inner(&mut self) -> ParseResult<Statement> {
        let line = self.line();
        match self.current.kind {
            TokenKind::At => self.decorated_function(),
            TokenKind::Class => self.class_declaration(),
            TokenKind::Var | TokenKind::Const => {
                let (name, constant, annotation, value) = self.variable_declaration()?;
                Ok(Statement::new(
                    StatementKind::VarDecl {
                        name,
                        constant,
                        annotation,
                        value,
                    },
                    line,
                ))
            }
            TokenKind::Function => {
                // `関数 name(` declares; `関数(` starts a function literal.
                let snapshot = self.snapshot();
                self.advance();
                if matches!(self.current.kind, TokenKind::Identifier(_)) {
                    self.restore(snapshot);
                    let decl = self.function_declaration()?;
                    Ok(Statement::new(StatementKind::FunctionDecl(decl), line))
                } else {
                    self.restore(snapshot);
                    self.statement()
                }
            }
            TokenKind::Indent => {
                Err(self.error(ParseErrorKind::UnexpectedBlock {
                    found: self.current.kind.to_string(),
                }))
            }
            _ => self.statement(),
        }
    }

    fn statement(&mut self) -> ParseResult<Statement> {
        let line = self.line();
        let kind = match self.current.kind {
            TokenKind::If => self.if_statement()?,
            TokenKind::While => self.while_statement()?,
            TokenKind::Each => self.for_each_statement()?,
            TokenKind::Return => self.return_statement()?,
            TokenKind::Break | TokenKind::Continue => self.loop_control()?,
            TokenKind::Try => self.try_statement()?,
            TokenKind::Throw => {
                self.advance();
                let value = self.expression()?;
                self.end_statement()?;
                StatementKind::Throw(value)
            }
            TokenKind::Match => self.match_statement()?,
            TokenKind::Import => {
                self.advance();
                let TokenKind::String(path) = &self.current.kind else {
                    return Err(self.unexpected("ファイル名の文字列"));
                };
                let path = path.clone();
                self.advance();
                self.end_statement()?;
                StatementKind::Import(path)
            }
            TokenKind::Identifier(_) => match self.bounded_loop()? {
                Some(kind) => kind,
                None => self.expression_statement()?,
            },
            _ => self.expression_statement()?,
        };
        Ok(Statement::new(kind, line))
    }

    /// `:` followed by either one inline statement or an indented block.
    pub(super) fn block(&mut self) -> ParseResult<Vec<Statement>> {
        self.consume(&TokenKind::Colon, "':'")?;
        if !self.check(&TokenKind::Newline) {
            return Ok(vec![self.declaration()?]);
        }
        self.advance();
        if !self.check(&TokenKind::Indent) {
            return Err(self.error(ParseErrorKind::ExpectedBlock));
        }
        self.advance();
        let mut body = Vec::new();
        while !self.check(&TokenKind::Dedent) && !self.check(&TokenKind::EOF) {
            if self.eat(&TokenKind::Newline) {
                continue;
            }
            if let Some(statement) = self.parse_statement() {
                body.push(statement);
            }
        }
        self.eat(&TokenKind::Dedent);
        Ok(body)
    }

    fn variable_declaration(
        &mut self,
    ) -> ParseResult<(String, bool, Option<TypeName>, Option<Expression>)> {
        let constant = self.check(&TokenKind::Const);
        self.advance();
        let name = self.consume_identifier("変数名")?;
        let annotation = if self.eat(&TokenKind::Colon) {
            Some(self.type_name()?)
        } else {
            None
        };
        let value = if self.eat(&TokenKind::Equal) {
            Some(self.expression()?)
        } else {
            None
        };
        if constant && value.is_none() {
            return Err(self.error(ParseErrorKind::ConstWithoutValue { name }));
        }
        self.end_statement()?;
        Ok((name, constant, annotation, value))
    }

    pub(super) fn type_name(&mut self) -> ParseResult<TypeName> {
        let ty = match self.current.kind {
            TokenKind::NumberType => TypeName::Number,
            TokenKind::StringType => TypeName::String,
            TokenKind::BooleanType => TypeName::Boolean,
            TokenKind::ArrayType => TypeName::Array,
            TokenKind::MapType => TypeName::Map,
            TokenKind::AnyType => TypeName::Any,
            TokenKind::Identifier(name) => TypeName::Named(name.to_string()),
            _ => return Err(self.unexpected("型名")),
        };
        self.advance();
        Ok(ty)
    }

    fn function_declaration(&mut self) -> ParseResult<Rc<FunctionDecl>> {
        let line = self.line();
        self.consume(&TokenKind::Function, "'関数'")?;
        let name = self.consume_identifier("関数名")?;
        self.function_rest(Some(name), line)
    }

    /// Parameter list, optional return annotation and body.
    pub(super) fn function_rest(
        &mut self,
        name: Option<String>,
        line: usize,
    ) -> ParseResult<Rc<FunctionDecl>> {
        self.consume(&TokenKind::LParen, "'('")?;
        let mut params = Vec::new();
        if !self.check(&TokenKind::RParen) {
            loop {
                let name = self.consume_identifier("引数名")?;
                let annotation = if self.eat(&TokenKind::Colon) {
                    Some(self.type_name()?)
                } else {
                    None
                };
                params.push(Parameter { name, annotation });
                if !self.eat(&TokenKind::Comma) || self.check(&TokenKind::RParen) {
                    break;
                }
            }
        }
        self.consume(&TokenKind::RParen, "')'")?;
        let return_type = if self.eat(&TokenKind::Arrow) {
            Some(self.type_name()?)
        } else {
            None
        };
        let body = self.in_function(Self::block)?;
        Ok(Rc::new(FunctionDecl {
            name,
            params,
            return_type,
            body,
            line,
        }))
    }

    /// `@deco` lines before a function become the declaration followed by
    /// `name = deco(name)`. The decorator closest to the function applies
    /// first.
    fn decorated_function(&mut self) -> ParseResult<Statement> {
        let line = self.line();
        let mut decorators = Vec::new();
        while self.eat(&TokenKind::At) {
            decorators.push(self.expression()?);
            self.consume(&TokenKind::Newline, "改行")?;
        }
        if !self.check(&TokenKind::Function) {
            return Err(self.error(ParseErrorKind::DecoratorWithoutFunction));
        }
        let decl = self.function_declaration()?;
        let name = decl.display_name().to_string();
        let decl_line = decl.line;

        let mut value = Expression::Identifier(name.clone());
        for decorator in decorators.into_iter().rev() {
            value = Expression::Call {
                callee: Box::new(decorator),
                args: vec![value],
            };
        }
        Ok(Statement::new(
            StatementKind::Block(vec![
                Statement::new(StatementKind::FunctionDecl(decl), decl_line),
                Statement::new(
                    StatementKind::Assign {
                        target: Expression::Identifier(name),
                        op: AssignOperator::Assign,
                        value,
                    },
                    line,
                ),
            ]),
            line,
        ))
    }

    fn class_declaration(&mut self) -> ParseResult<Statement> {
        let line = self.line();
        self.advance();
        let name = self.consume_identifier("クラス名")?;
        let parent = if self.eat(&TokenKind::Extends) {
            Some(self.consume_identifier("親クラス名")?)
        } else {
            None
        };
        self.consume(&TokenKind::Colon, "':'")?;
        self.consume(&TokenKind::Newline, "改行")?;
        if !self.check(&TokenKind::Indent) {
            return Err(self.error(ParseErrorKind::ExpectedBlock));
        }
        self.advance();

        let mut class = ClassDecl {
            name,
            parent,
            fields: Vec::new(),
            methods: Vec::new(),
            initializer: None,
        };
        while !self.check(&TokenKind::Dedent) && !self.check(&TokenKind::EOF) {
            if self.eat(&TokenKind::Newline) {
                continue;
            }
            if let Err(error) = self.class_member(&mut class) {
                self.record(error);
                self.synchronize();
            }
        }
        self.eat(&TokenKind::Dedent);
        tracing::trace!(class = %class.name, "parsed class declaration");
        Ok(Statement::new(StatementKind::ClassDecl(class), line))
    }

    fn class_member(&mut self, class: &mut ClassDecl) -> ParseResult<()> {
        match self.current.kind {
            TokenKind::Function => {
                let method = self.function_declaration()?;
                if method.name.as_deref() == Some(INITIALIZER) {
                    if class.initializer.is_some() {
                        return Err(ParseError::duplicate_initializer(
                            method.line,
                            &class.name,
                        ));
                    }
                    class.initializer = Some(method);
                } else {
                    class.methods.push(method);
                }
                Ok(())
            }
            TokenKind::Var | TokenKind::Const => {
                let (name, _, _, value) = self.variable_declaration()?;
                class.fields.push(FieldDecl { name, value });
                Ok(())
            }
            _ => Err(self.error(ParseErrorKind::InvalidClassMember {
                found: self.current.kind.to_string(),
            })),
        }
    }

    fn if_statement(&mut self) -> ParseResult<StatementKind> {
        self.advance();
        let condition = self.expression()?;
        let then_body = self.block()?;
        let else_body = if self.eat(&TokenKind::Else) {
            if self.check(&TokenKind::If) {
                let line = self.line();
                let nested = self.if_statement()?;
                Some(vec![Statement::new(nested, line)])
            } else {
                Some(self.block()?)
            }
        } else {
            None
        };
        Ok(StatementKind::If {
            condition,
            then_body,
            else_body,
        })
    }

    fn while_statement(&mut self) -> ParseResult<StatementKind> {
        self.advance();
        let condition = self.expression()?;
        let body = self.in_loop(Self::block)?;
        Ok(StatementKind::While { condition, body })
    }

    fn for_each_statement(&mut self) -> ParseResult<StatementKind> {
        self.advance();
        let variable = self.consume_identifier("ループ変数名")?;
        self.consume(&TokenKind::Kara, "'から'")?;
        let iterable = self.expression()?;
        let body = self.in_loop(Self::block)?;
        Ok(StatementKind::ForEach {
            variable,
            iterable,
            body,
        })
    }

    /// `i を a から b まで:`. Returns `None`, with the parser rolled back,
    /// when the identifier is not followed by `を`.
    fn bounded_loop(&mut self) -> ParseResult<Option<StatementKind>> {
        let snapshot = self.snapshot();
        let TokenKind::Identifier(name) = self.current.kind else {
            return Ok(None);
        };
        self.advance();
        if !self.eat(&TokenKind::Wo) {
            self.restore(snapshot);
            return Ok(None);
        }
        let start = self.expression()?;
        self.consume(&TokenKind::Kara, "'から'")?;
        let end = self.expression()?;
        self.consume(&TokenKind::Made, "'まで'")?;
        let body = self.in_loop(Self::block)?;
        Ok(Some(StatementKind::Range {
            variable: name.to_string(),
            start,
            end,
            body,
        }))
    }

    fn return_statement(&mut self) -> ParseResult<StatementKind> {
        if self.function_depth == 0 {
            return Err(self.error(ParseErrorKind::ReturnOutsideFunction));
        }
        self.advance();
        let value = if self.at_statement_end() {
            None
        } else {
            Some(self.expression()?)
        };
        self.end_statement()?;
        Ok(StatementKind::Return(value))
    }

    fn loop_control(&mut self) -> ParseResult<StatementKind> {
        let (kind, keyword) = if self.check(&TokenKind::Break) {
            (StatementKind::Break, "中断")
        } else {
            (StatementKind::Continue, "次へ")
        };
        if self.loop_depth == 0 {
            return Err(self.error(ParseErrorKind::LoopControlOutsideLoop { keyword }));
        }
        self.advance();
        self.end_statement()?;
        Ok(kind)
    }

    fn try_statement(&mut self) -> ParseResult<StatementKind> {
        self.advance();
        let body = self.block()?;
        let catch = if self.eat(&TokenKind::Catch) {
            let binding = match self.current.kind {
                TokenKind::Identifier(name) => {
                    self.advance();
                    Some(name.to_string())
                }
                _ => None,
            };
            Some(CatchClause {
                binding,
                body: self.block()?,
            })
        } else {
            None
        };
        let finally_body = if self.eat(&TokenKind::Finally) {
            Some(self.block()?)
        } else {
            None
        };
        if catch.is_none() && finally_body.is_none() {
            return Err(self.error(ParseErrorKind::TryWithoutHandler));
        }
        Ok(StatementKind::Try {
            body,
            catch,
            finally_body,
        })
    }

    /// Each `場合` group owns one body. A group naming `_` supplies the
    /// default body; its other patterns still form an ordinary case so
    /// source order is preserved for them.
    fn match_statement(&mut self) -> ParseResult<StatementKind> {
        self.advance();
        let subject = self.expression()?;
        self.consume(&TokenKind::Colon, "':'")?;
        self.consume(&TokenKind::Newline, "改行")?;
        if !self.check(&TokenKind::Indent) {
            return Err(self.error(ParseErrorKind::ExpectedBlock));
        }
        self.advance();

        let mut cases = Vec::new();
        let mut default = None;
        while self.check(&TokenKind::Case) {
            let line = self.line();
            self.advance();
            let mut patterns = Vec::new();
            let mut wildcard = false;
            loop {
                if matches!(self.current.kind, TokenKind::Identifier(WILDCARD)) {
                    self.advance();
                    wildcard = true;
                } else {
                    patterns.push(self.expression()?);
                }
                if !self.eat(&TokenKind::Comma) {
                    break;
                }
            }
            let body = self.block()?;
            if wildcard {
                if default.is_some() {
                    return Err(ParseError::new(line, ParseErrorKind::DuplicateWildcard));
                }
                if !patterns.is_empty() {
                    cases.push(MatchCase {
                        patterns,
                        body: body.clone(),
                    });
                }
                default = Some(body);
            } else {
                cases.push(MatchCase { patterns, body });
            }
        }
        if cases.is_empty() && default.is_none() {
            return Err(self.error(ParseErrorKind::EmptyMatch));
        }
        if !self.eat(&TokenKind::Dedent) && !self.check(&TokenKind::EOF) {
            return Err(self.unexpected("'場合'"));
        }
        Ok(StatementKind::Match {
            subject,
            cases,
            default,
        })
    }

    fn expression_statement(&mut self) -> ParseResult<StatementKind> {
        let target = self.expression()?;
        let op = match self.current.kind {
            TokenKind::Equal => Some(AssignOperator::Assign),
            TokenKind::PlusEqual => Some(AssignOperator::Compound(BinaryOperator::Add)),
            TokenKind::MinusEqual => Some(AssignOperator::Compound(BinaryOperator::Sub)),
            TokenKind::StarEqual => Some(AssignOperator::Compound(BinaryOperator::Mul)),
            TokenKind::SlashEqual => Some(AssignOperator::Compound(BinaryOperator::Div)),
            TokenKind::PercentEqual => Some(AssignOperator::Compound(BinaryOperator::Mod)),
            _ => None,
        };
        let Some(op) = op else {
            self.end_statement()?;
            return Ok(StatementKind::Expr(target));
        };
        if !target.is_place() {
            return Err(self.error(ParseErrorKind::InvalidAssignmentTarget));
        }
        self.advance();
        let value = self.expression()?;
        self.end_statement()?;
        Ok(StatementKind::Assign { target, op, value })
    }

    fn at_statement_end(&self) -> bool {
        matches!(
            self.current.kind,
            TokenKind::Newline
                | TokenKind::EOF
                | TokenKind::Dedent
                | TokenKind::RParen
                | TokenKind::RBracket
                | TokenKind::RBrace
                | TokenKind::Comma
        ) || self.current.kind.is_block_terminator()
    }
}

impl ParseError {
    fn duplicate_initializer(line: usize, class: &str) -> Self {
        ParseError::new(
            line,
            ParseErrorKind::DuplicateInitializer {
                class: class.to_string(),
            },
        )
    }
}
