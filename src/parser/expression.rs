use crate::ast::{BinaryOperator, Expression, LogicalOperator, UnaryOperator};
use crate::token::TokenKind;

use super::error::ParseErrorKind;
use super::{ParseResult, Parser};

impl<'a> Parser<'a> {
    pub(super) fn expression(&mut self) -> ParseResult<Expression> {
        self.nested(Self::or_expression)
    }

    fn or_expression(&mut self) -> ParseResult<Expression> {
        let mut expr = self.and_expression()?;
        while self.eat(&TokenKind::Or) {
            let right = self.and_expression()?;
            expr = Expression::Logical {
                left: Box::new(expr),
                op: LogicalOperator::Or,
                right: Box::new(right),
            };
        }
        Ok(expr)
    }

    fn and_expression(&mut self) -> ParseResult<Expression> {
        let mut expr = self.not_expression()?;
        while self.eat(&TokenKind::And) {
            let right = self.not_expression()?;
            expr = Expression::Logical {
                left: Box::new(expr),
                op: LogicalOperator::And,
                right: Box::new(right),
            };
        }
        Ok(expr)
    }

    fn not_expression(&mut self) -> ParseResult<Expression> {
        if self.eat(&TokenKind::Not) {
            let operand = self.nested(Self::not_expression)?;
            return Ok(Expression::UnaryOp {
                op: UnaryOperator::Not,
                operand: Box::new(operand),
            });
        }
        self.comparison()
    }

    fn comparison(&mut self) -> ParseResult<Expression> {
        let mut expr = self.additive()?;
        loop {
            let op = match self.current.kind {
                TokenKind::EqualEqual => BinaryOperator::Equal,
                TokenKind::BangEqual => BinaryOperator::NotEqual,
                TokenKind::Less => BinaryOperator::Less,
                TokenKind::LessEqual => BinaryOperator::LessEqual,
                TokenKind::Greater => BinaryOperator::Greater,
                TokenKind::GreaterEqual => BinaryOperator::GreaterEqual,
                _ => break,
            };
            self.advance();
            let right = self.additive()?;
            expr = binary(expr, op, right);
        }
        Ok(expr)
    }

    fn additive(&mut self) -> ParseResult<Expression> {
        let mut expr = self.multiplicative()?;
        loop {
            let op = match self.current.kind {
                TokenKind::Plus => BinaryOperator::Add,
                TokenKind::Minus => BinaryOperator::Sub,
                _ => break,
            };
            self.advance();
            let right = self.multiplicative()?;
            expr = binary(expr, op, right);
        }
        Ok(expr)
    }

    fn multiplicative(&mut self) -> ParseResult<Expression> {
        let mut expr = self.power()?;
        loop {
            let op = match self.current.kind {
                TokenKind::Star => BinaryOperator::Mul,
                TokenKind::Slash => BinaryOperator::Div,
                TokenKind::Percent => BinaryOperator::Mod,
                _ => break,
            };
            self.advance();
            let right = self.power()?;
            expr = binary(expr, op, right);
        }
        Ok(expr)
    }

    /// Right-associative: `2 ** 3 ** 2` is `2 ** (3 ** 2)`.
    fn power(&mut self) -> ParseResult<Expression> {
        let base = self.unary()?;
        if self.eat(&TokenKind::StarStar) {
            let exponent = self.nested(Self::power)?;
            return Ok(binary(base, BinaryOperator::Pow, exponent));
        }
        Ok(base)
    }

    fn unary(&mut self) -> ParseResult<Expression> {
        let op = match self.current.kind {
            TokenKind::Minus => UnaryOperator::Negate,
            TokenKind::Plus => UnaryOperator::Plus,
            _ => return self.postfix(),
        };
        self.advance();
        let operand = self.nested(Self::unary)?;
        Ok(Expression::UnaryOp {
            op,
            operand: Box::new(operand),
        })
    }

    fn postfix(&mut self) -> ParseResult<Expression> {
        let mut expr = self.primary()?;
        loop {
            match self.current.kind {
                TokenKind::LParen => {
                    let args = self.arguments()?;
                    expr = Expression::Call {
                        callee: Box::new(expr),
                        args,
                    };
                }
                TokenKind::LBracket => {
                    self.advance();
                    let index = self.expression()?;
                    self.consume(&TokenKind::RBracket, "']'")?;
                    expr = Expression::Index {
                        object: Box::new(expr),
                        index: Box::new(index),
                    };
                }
                TokenKind::Dot => {
                    self.advance();
                    let name = self.consume_identifier("メンバー名")?;
                    expr = Expression::Member {
                        object: Box::new(expr),
                        name,
                    };
                }
                _ => return Ok(expr),
            }
        }
    }

    fn arguments(&mut self) -> ParseResult<Vec<Expression>> {
        self.consume(&TokenKind::LParen, "'('")?;
        let args = self.comma_separated(&TokenKind::RParen, Self::expression)?;
        self.consume(&TokenKind::RParen, "')'")?;
        Ok(args)
    }

    /// Items up to (not including) `close`; a trailing comma is allowed.
    fn comma_separated<T>(
        &mut self,
        close: &TokenKind<'_>,
        mut item: impl FnMut(&mut Self) -> ParseResult<T>,
    ) -> ParseResult<Vec<T>> {
        let mut items = Vec::new();
        while !self.check(close) {
            items.push(item(self)?);
            if !self.eat(&TokenKind::Comma) {
                break;
            }
        }
        Ok(items)
    }

    fn primary(&mut self) -> ParseResult<Expression> {
        let line = self.line();
        let expr = match &self.current.kind {
            TokenKind::Number(value) => Expression::Number(*value),
            TokenKind::String(value) => Expression::String(value.clone()),
            TokenKind::True => Expression::Boolean(true),
            TokenKind::False => Expression::Boolean(false),
            TokenKind::Null => Expression::Null,
            TokenKind::Identifier(name) => Expression::Identifier(name.to_string()),
            TokenKind::SelfRef => Expression::SelfRef,
            TokenKind::Super => {
                self.advance();
                self.consume(&TokenKind::Dot, "'.'")?;
                let method = self.consume_identifier("メソッド名")?;
                return Ok(Expression::Super { method });
            }
            TokenKind::LParen => {
                self.advance();
                let expr = self.expression()?;
                self.consume(&TokenKind::RParen, "')'")?;
                return Ok(expr);
            }
            TokenKind::LBracket => return self.array_or_comprehension(),
            TokenKind::LBrace => return self.map_literal(),
            TokenKind::New => return self.instantiation(),
            TokenKind::Function => {
                self.advance();
                let decl = self.function_rest(None, line)?;
                return Ok(Expression::Function(decl));
            }
            _ => {
                return Err(self.error(ParseErrorKind::ExpectedExpression {
                    found: self.current.kind.to_string(),
                }));
            }
        };
        self.advance();
        Ok(expr)
    }

    /// `[a, b]` or `[expr 各 x から items もし cond]`.
    fn array_or_comprehension(&mut self) -> ParseResult<Expression> {
        self.consume(&TokenKind::LBracket, "'['")?;
        if self.eat(&TokenKind::RBracket) {
            return Ok(Expression::Array(Vec::new()));
        }
        let first = self.expression()?;
        if self.eat(&TokenKind::Each) {
            let variable = self.consume_identifier("ループ変数名")?;
            self.consume(&TokenKind::Kara, "'から'")?;
            let iterable = self.expression()?;
            let condition = if self.eat(&TokenKind::If) {
                Some(Box::new(self.expression()?))
            } else {
                None
            };
            self.consume(&TokenKind::RBracket, "']'")?;
            return Ok(Expression::Comprehension {
                element: Box::new(first),
                variable,
                iterable: Box::new(iterable),
                condition,
            });
        }
        let mut elements = vec![first];
        if self.eat(&TokenKind::Comma) {
            elements.extend(self.comma_separated(&TokenKind::RBracket, Self::expression)?);
        }
        self.consume(&TokenKind::RBracket, "']'")?;
        Ok(Expression::Array(elements))
    }

    fn map_literal(&mut self) -> ParseResult<Expression> {
        self.consume(&TokenKind::LBrace, "'{'")?;
        let entries = self.comma_separated(&TokenKind::RBrace, Self::map_entry)?;
        self.consume(&TokenKind::RBrace, "'}'")?;
        Ok(Expression::Map(entries))
    }

    /// A bare identifier before `:` is a string key, as in `{名前: "太郎"}`.
    fn map_entry(&mut self) -> ParseResult<(Expression, Expression)> {
        let key = match self.current.kind {
            TokenKind::Identifier(name) => {
                let snapshot = self.snapshot();
                self.advance();
                if self.check(&TokenKind::Colon) {
                    Expression::String(name.to_string())
                } else {
                    self.restore(snapshot);
                    self.expression()?
                }
            }
            _ => self.expression()?,
        };
        self.consume(&TokenKind::Colon, "':'")?;
        let value = self.expression()?;
        Ok((key, value))
    }

    /// `新規 Name(args)`; the class may be reached through member access.
    fn instantiation(&mut self) -> ParseResult<Expression> {
        self.consume(&TokenKind::New, "'新規'")?;
        let mut class = Expression::Identifier(self.consume_identifier("クラス名")?);
        while self.eat(&TokenKind::Dot) {
            let name = self.consume_identifier("メンバー名")?;
            class = Expression::Member {
                object: Box::new(class),
                name,
            };
        }
        let args = if self.check(&TokenKind::LParen) {
            self.arguments()?
        } else {
            Vec::new()
        };
        Ok(Expression::New {
            class: Box::new(class),
            args,
        })
    }
}

fn binary(left: Expression, op: BinaryOperator, right: Expression) -> Expression {
    Expression::BinaryOp {
        left: Box::new(left),
        op,
        right: Box::new(right),
    }
}
