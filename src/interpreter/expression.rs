use std::rc::Rc;

use crate::ast::{BinaryOperator, Expression, LogicalOperator, UnaryOperator};
use crate::runtime::{Dict, Environment, Function, RuntimeError, Sequence, Value};

use super::{Interpreter, SELF};

impl Interpreter {
    pub(crate) fn evaluate(&mut self, expression: &Expression) -> Result<Value, RuntimeError> {
        self.guarded(|interpreter| interpreter.evaluate_kind(expression))
    }

    fn evaluate_kind(&mut self, expression: &Expression) -> Result<Value, RuntimeError> {
        match expression {
            Expression::Number(value) => Ok(Value::Number(*value)),
            Expression::String(value) => Ok(Value::String(value.clone())),
            Expression::Boolean(value) => Ok(Value::Boolean(*value)),
            Expression::Null => Ok(Value::Null),
            Expression::Identifier(name) => self.lookup(name),
            Expression::SelfRef => self.lookup(SELF),
            Expression::Super { method } => self.super_method(method),
            Expression::Array(items) => {
                let mut values = Vec::with_capacity(items.len());
                for item in items {
                    values.push(eval_checked!(self, item));
                }
                Ok(Value::Array(values))
            }
            Expression::Map(entries) => {
                let mut map = Dict::new();
                for (key, value) in entries {
                    let key = eval_checked!(self, key);
                    let key = key.as_key()?.to_string();
                    let value = eval_checked!(self, value);
                    map.insert(key, value);
                }
                Ok(Value::Map(map))
            }
            Expression::Comprehension {
                element,
                variable,
                iterable,
                condition,
            } => self.evaluate_comprehension(element, variable, iterable, condition.as_deref()),
            Expression::UnaryOp { op, operand } => {
                let operand = eval_checked!(self, operand);
                unary(*op, operand)
            }
            Expression::BinaryOp { left, op, right } => {
                let left = eval_checked!(self, left);
                let right = eval_checked!(self, right);
                binary(*op, left, right)
            }
            Expression::Logical { left, op, right } => {
                let left = eval_checked!(self, left);
                let decided = match op {
                    LogicalOperator::And => !left.is_truthy(),
                    LogicalOperator::Or => left.is_truthy(),
                };
                if decided { Ok(left) } else { self.evaluate(right) }
            }
            Expression::Call { callee, args } => self.evaluate_call(callee, args),
            Expression::Index { object, index } => {
                if expression.is_place() {
                    return self.read_at(expression);
                }
                let object = eval_checked!(self, object);
                let index = eval_checked!(self, index);
                index_of(&object, &index)
            }
            Expression::Member { object, name } => {
                if expression.is_place() {
                    return self.read_at(expression);
                }
                let object = eval_checked!(self, object);
                member_of(&object, name)
            }
            Expression::New { class, args } => {
                let class = match eval_checked!(self, class) {
                    Value::Class(class) => class,
                    other => {
                        return Err(RuntimeError::NotAClass {
                            type_name: other.type_name(),
                        });
                    }
                };
                let args = self.evaluate_args(args)?;
                if self.signal.is_latched() {
                    return Ok(Value::Null);
                }
                self.instantiate(class, args)
            }
            Expression::Function(decl) => Ok(Value::Function(Function::new(
                Rc::clone(decl),
                Rc::clone(&self.env),
            ))),
        }
    }

    fn read_at(&mut self, target: &Expression) -> Result<Value, RuntimeError> {
        let place = self.resolve_place(target)?;
        if self.signal.is_latched() {
            return Ok(Value::Null);
        }
        self.read_place(&place)
    }

    pub(super) fn evaluate_args(
        &mut self,
        args: &[Expression],
    ) -> Result<Vec<Value>, RuntimeError> {
        let mut values = Vec::with_capacity(args.len());
        for arg in args {
            values.push(eval_checked!(self, arg));
        }
        Ok(values)
    }

    fn evaluate_comprehension(
        &mut self,
        element: &Expression,
        variable: &str,
        iterable: &Expression,
        condition: Option<&Expression>,
    ) -> Result<Value, RuntimeError> {
        let sequence = Sequence::from_value(eval_checked!(self, iterable))?;
        let scope = Environment::child(&self.env);
        self.in_scope(scope, |interpreter| {
            let mut values = Vec::new();
            for item in sequence {
                interpreter.env.declare(variable, item, false)?;
                if let Some(condition) = condition {
                    if !eval_checked!(interpreter, condition).is_truthy() {
                        continue;
                    }
                }
                values.push(eval_checked!(interpreter, element));
            }
            Ok(Value::Array(values))
        })
    }
}

fn unary(op: UnaryOperator, operand: Value) -> Result<Value, RuntimeError> {
    match (op, operand) {
        (UnaryOperator::Not, operand) => Ok(Value::Boolean(!operand.is_truthy())),
        (UnaryOperator::Negate, Value::Number(value)) => Ok(Value::Number(-value)),
        (UnaryOperator::Plus, Value::Number(value)) => Ok(Value::Number(value)),
        (op, operand) => Err(RuntimeError::UnsupportedOperand {
            op: if op == UnaryOperator::Negate { "-" } else { "+" },
            operand: operand.type_name(),
        }),
    }
}

fn binary(op: BinaryOperator, left: Value, right: Value) -> Result<Value, RuntimeError> {
    use BinaryOperator::*;

    match (op, &left, &right) {
        (Equal, _, _) => Ok(Value::Boolean(left == right)),
        (NotEqual, _, _) => Ok(Value::Boolean(left != right)),
        (_, Value::Number(l), Value::Number(r)) => match op {
            Less => Ok(Value::Boolean(l < r)),
            LessEqual => Ok(Value::Boolean(l <= r)),
            Greater => Ok(Value::Boolean(l > r)),
            GreaterEqual => Ok(Value::Boolean(l >= r)),
            _ => arithmetic(op, *l, *r),
        },
        (Add, Value::String(l), _) => Ok(Value::String(format!("{l}{right}"))),
        (Add, _, Value::String(r)) => Ok(Value::String(format!("{left}{r}"))),
        (Less | LessEqual | Greater | GreaterEqual, _, _) => match left.compare(&right) {
            Some(ordering) => Ok(Value::Boolean(match op {
                Less => ordering.is_lt(),
                LessEqual => ordering.is_le(),
                Greater => ordering.is_gt(),
                _ => ordering.is_ge(),
            })),
            None => Err(unsupported(op, &left, &right)),
        },
        _ => Err(unsupported(op, &left, &right)),
    }
}

fn unsupported(op: BinaryOperator, left: &Value, right: &Value) -> RuntimeError {
    RuntimeError::UnsupportedOperands {
        op: op.symbol(),
        left: left.type_name(),
        right: right.type_name(),
    }
}

/// Numeric operators shared by binary expressions and compound assignment.
pub(super) fn arithmetic(op: BinaryOperator, left: f64, right: f64) -> Result<Value, RuntimeError> {
    let value = match op {
        BinaryOperator::Add => left + right,
        BinaryOperator::Sub => left - right,
        BinaryOperator::Mul => left * right,
        BinaryOperator::Div => {
            if right == 0.0 {
                return Err(RuntimeError::DivisionByZero);
            }
            left / right
        }
        BinaryOperator::Mod => {
            if right == 0.0 {
                return Err(RuntimeError::ModuloByZero);
            }
            left % right
        }
        BinaryOperator::Pow => left.powf(right),
        _ => {
            return Err(RuntimeError::UnsupportedOperands {
                op: op.symbol(),
                left: "数値",
                right: "数値",
            });
        }
    };
    Ok(Value::Number(value))
}

/// `value[index]`: array element, string character or map entry (`無` when
/// the key is missing).
pub(super) fn index_of(value: &Value, index: &Value) -> Result<Value, RuntimeError> {
    match value {
        Value::Array(items) => Ok(items[index.as_index(items.len())?].clone()),
        Value::String(text) => {
            let len = text.chars().count();
            let position = index.as_index(len)?;
            Ok(text
                .chars()
                .nth(position)
                .map(|ch| Value::String(ch.to_string()))
                .unwrap_or_default())
        }
        Value::Map(entries) => Ok(entries.get(index.as_key()?).cloned().unwrap_or_default()),
        other => Err(RuntimeError::NotIndexable {
            type_name: other.type_name(),
        }),
    }
}

/// `value.name`. Instance fields win over methods; a method found on the
/// class chain comes back bound to a copy of the instance.
pub(super) fn member_of(value: &Value, name: &str) -> Result<Value, RuntimeError> {
    match value {
        Value::Instance(instance) => {
            if let Some(field) = instance.fields.get(name) {
                return Ok(field.clone());
            }
            if let Some((decl, home)) = instance.class.find_method(name) {
                return Ok(Value::Function(Function::method(
                    decl,
                    home,
                    Some(value.clone()),
                )));
            }
        }
        Value::Map(entries) => return Ok(entries.get(name).cloned().unwrap_or_default()),
        Value::Class(class) => {
            if let Some((decl, home)) = class.find_method(name) {
                return Ok(Value::Function(Function::method(decl, home, None)));
            }
        }
        _ => {}
    }
    Err(RuntimeError::UndefinedMember {
        name: name.to_string(),
        type_name: value.type_name(),
    })
}
