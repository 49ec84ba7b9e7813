use std::rc::Rc;

use rustc_hash::FxHashMap;

use crate::ast::{CatchClause, ClassDecl, Expression, MatchCase, Statement, StatementKind};
use crate::runtime::class::INITIALIZER;
use crate::runtime::{Class, Dict, Environment, Function, RuntimeError, Sequence, Value};

use super::Interpreter;
use super::signal::Signal;

impl Interpreter {
    /// Runs statements in the current scope until one latches a signal.
    pub(crate) fn execute_block(&mut self, statements: &[Statement]) -> Result<(), RuntimeError> {
        for statement in statements {
            self.execute(statement)?;
            if self.signal.is_latched() {
                break;
            }
        }
        Ok(())
    }

    pub(crate) fn execute(&mut self, statement: &Statement) -> Result<(), RuntimeError> {
        self.guarded(|interpreter| {
            interpreter.line = statement.line;
            interpreter.execute_kind(&statement.kind)
        })
    }

    fn execute_kind(&mut self, kind: &StatementKind) -> Result<(), RuntimeError> {
        match kind {
            StatementKind::VarDecl {
                name,
                constant,
                value,
                ..
            } => {
                let value = match value {
                    Some(value) => eval_checked!(self, value),
                    None => Value::Null,
                };
                self.env.declare(name, value, *constant)
            }
            StatementKind::FunctionDecl(decl) => {
                let function = Function::new(Rc::clone(decl), Rc::clone(&self.env));
                self.env
                    .declare(decl.display_name(), Value::Function(function), false)
            }
            StatementKind::ClassDecl(decl) => self.declare_class(decl),
            StatementKind::Assign { target, op, value } => self.execute_assign(target, *op, value),
            StatementKind::If {
                condition,
                then_body,
                else_body,
            } => {
                let condition = eval_checked!(self, condition);
                if condition.is_truthy() {
                    self.execute_block(then_body)
                } else if let Some(else_body) = else_body {
                    self.execute_block(else_body)
                } else {
                    Ok(())
                }
            }
            StatementKind::While { condition, body } => {
                loop {
                    let condition = eval_checked!(self, condition);
                    if !condition.is_truthy() {
                        break;
                    }
                    self.execute_block(body)?;
                    if self.finish_iteration() {
                        break;
                    }
                }
                Ok(())
            }
            StatementKind::Range {
                variable,
                start,
                end,
                body,
            } => self.execute_range(variable, start, end, body),
            StatementKind::ForEach {
                variable,
                iterable,
                body,
            } => self.execute_for_each(variable, iterable, body),
            StatementKind::Return(value) => {
                let value = match value {
                    Some(value) => eval_checked!(self, value),
                    None => Value::Null,
                };
                self.signal = Signal::Return(value);
                Ok(())
            }
            StatementKind::Break => {
                self.signal = Signal::Break;
                Ok(())
            }
            StatementKind::Continue => {
                self.signal = Signal::Continue;
                Ok(())
            }
            StatementKind::Try {
                body,
                catch,
                finally_body,
            } => self.execute_try(body, catch.as_ref(), finally_body.as_deref()),
            StatementKind::Throw(value) => {
                let value = eval_checked!(self, value);
                tracing::trace!(line = self.line, "throw {value}");
                self.signal = Signal::Throw {
                    value,
                    line: self.line,
                };
                Ok(())
            }
            StatementKind::Match {
                subject,
                cases,
                default,
            } => self.execute_match(subject, cases, default.as_deref()),
            StatementKind::Import(path) => self.import(path),
            StatementKind::Block(statements) => self.execute_block(statements),
            StatementKind::Expr(expression) => {
                self.evaluate(expression)?;
                Ok(())
            }
        }
    }

    /// Consumes break/continue after a loop body. Returns `true` when the
    /// loop must stop: on break, or when a return or throw is unwinding.
    fn finish_iteration(&mut self) -> bool {
        match self.signal {
            Signal::None => false,
            Signal::Continue => {
                self.signal = Signal::None;
                false
            }
            Signal::Break => {
                self.signal = Signal::None;
                true
            }
            Signal::Return(_) | Signal::Throw { .. } => true,
        }
    }

    /// Inclusive of `end`. The direction is fixed before the first pass and
    /// the variable lives in the enclosing scope, so closures created in the
    /// body all see the same binding.
    fn execute_range(
        &mut self,
        variable: &str,
        start: &Expression,
        end: &Expression,
        body: &[Statement],
    ) -> Result<(), RuntimeError> {
        let start = range_bound(eval_checked!(self, start))?;
        let end = range_bound(eval_checked!(self, end))?;
        let step = if start <= end { 1.0 } else { -1.0 };

        let mut current = start;
        while (step > 0.0 && current <= end) || (step < 0.0 && current >= end) {
            self.env.declare(variable, Value::Number(current), false)?;
            self.execute_block(body)?;
            if self.finish_iteration() {
                break;
            }
            current += step;
        }
        Ok(())
    }

    fn execute_for_each(
        &mut self,
        variable: &str,
        iterable: &Expression,
        body: &[Statement],
    ) -> Result<(), RuntimeError> {
        let sequence = Sequence::from_value(eval_checked!(self, iterable))?;
        let scope = Environment::child(&self.env);
        self.in_scope(scope, |interpreter| {
            for item in sequence {
                interpreter.env.declare(variable, item, false)?;
                interpreter.execute_block(body)?;
                if interpreter.finish_iteration() {
                    break;
                }
            }
            Ok(())
        })
    }

    /// `finally` runs with no signal latched. Whatever was pending before it
    /// comes back afterwards unless the block latched its own.
    fn execute_try(
        &mut self,
        body: &[Statement],
        catch: Option<&CatchClause>,
        finally_body: Option<&[Statement]>,
    ) -> Result<(), RuntimeError> {
        self.execute_block(body)?;

        if let Some(catch) = catch {
            match self.signal.take() {
                Signal::Throw { value, .. } => {
                    let scope = Environment::child(&self.env);
                    if let Some(binding) = &catch.binding {
                        scope.declare(binding, value, false)?;
                    }
                    self.in_scope(scope, |interpreter| interpreter.execute_block(&catch.body))?;
                }
                other => self.signal = other,
            }
        }

        if let Some(finally_body) = finally_body {
            let pending = self.signal.take();
            self.execute_block(finally_body)?;
            if !self.signal.is_latched() {
                self.signal = pending;
            }
        }
        Ok(())
    }

    /// Cases are tried in source order; the default only runs when none
    /// matched, wherever it was written.
    fn execute_match(
        &mut self,
        subject: &Expression,
        cases: &[MatchCase],
        default: Option<&[Statement]>,
    ) -> Result<(), RuntimeError> {
        let subject = eval_checked!(self, subject);
        for case in cases {
            for pattern in &case.patterns {
                let candidate = eval_checked!(self, pattern);
                if candidate == subject {
                    return self.execute_block(&case.body);
                }
            }
        }
        match default {
            Some(body) => self.execute_block(body),
            None => Ok(()),
        }
    }

    /// Field defaults are evaluated once, here, after the parent's.
    fn declare_class(&mut self, decl: &ClassDecl) -> Result<(), RuntimeError> {
        let parent = match &decl.parent {
            Some(name) => match self.lookup(name)? {
                Value::Class(class) => Some(class),
                other => {
                    return Err(RuntimeError::NotAClass {
                        type_name: other.type_name(),
                    });
                }
            },
            None => None,
        };

        let mut fields = parent
            .as_ref()
            .map(|parent| parent.fields.clone())
            .unwrap_or_else(Dict::new);
        for field in &decl.fields {
            let value = match &field.value {
                Some(value) => eval_checked!(self, value),
                None => Value::Null,
            };
            fields.insert(field.name.clone(), value);
        }

        let mut methods: FxHashMap<_, _> = decl
            .methods
            .iter()
            .map(|method| (method.display_name().to_string(), Rc::clone(method)))
            .collect();
        if let Some(initializer) = &decl.initializer {
            methods.insert(INITIALIZER.to_string(), Rc::clone(initializer));
        }

        tracing::debug!(
            class = %decl.name,
            parent = ?decl.parent,
            methods = methods.len(),
            "declaring class"
        );
        let class = Class {
            name: decl.name.clone(),
            parent,
            methods,
            fields,
            closure: Rc::clone(&self.env),
        };
        self.env
            .declare(&decl.name, Value::Class(Rc::new(class)), false)
    }
}

fn range_bound(value: Value) -> Result<f64, RuntimeError> {
    match value {
        Value::Number(number) => Ok(number),
        other => Err(RuntimeError::RangeBound {
            found: other.type_name(),
        }),
    }
}
