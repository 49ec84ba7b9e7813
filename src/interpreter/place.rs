//! Assignable locations: a variable followed by index and member steps.
//!
//! Reads walk the path by reference so `xs[i]` does not copy `xs`; writes
//! mutate the root binding in place.

use crate::ast::{AssignOperator, Expression};
use crate::runtime::{RuntimeError, Value};

use super::expression::{arithmetic, index_of, member_of};
use super::{Interpreter, SELF, unbound};

#[derive(Debug, Default)]
pub(super) struct Place {
    pub(super) root: String,
    pub(super) steps: Vec<Step>,
}

#[derive(Debug)]
pub(super) enum Step {
    Index(Value),
    Member(String),
}

impl Interpreter {
    /// Evaluates the index expressions along `target`. Callers check the
    /// signal afterwards: a throw inside an index leaves the place partial.
    pub(super) fn resolve_place(&mut self, target: &Expression) -> Result<Place, RuntimeError> {
        match target {
            Expression::Identifier(name) => Ok(Place {
                root: name.clone(),
                steps: Vec::new(),
            }),
            Expression::SelfRef => Ok(Place {
                root: SELF.to_string(),
                steps: Vec::new(),
            }),
            Expression::Index { object, index } => {
                let mut place = self.resolve_place(object)?;
                let index = self.evaluate(index)?;
                place.steps.push(Step::Index(index));
                Ok(place)
            }
            Expression::Member { object, name } => {
                let mut place = self.resolve_place(object)?;
                place.steps.push(Step::Member(name.clone()));
                Ok(place)
            }
            _ => Err(RuntimeError::InvalidTarget),
        }
    }

    pub(super) fn read_place(&self, place: &Place) -> Result<Value, RuntimeError> {
        self.env
            .with_value(&place.root, |root| read_path(root, &place.steps))
            .ok_or_else(|| unbound(&place.root))?
    }

    /// Plain assignment. A bare unbound name is declared in the current scope.
    pub(super) fn assign_place(&mut self, place: &Place, value: Value) -> Result<(), RuntimeError> {
        if !place.steps.is_empty() {
            return self.store_place(place, value);
        }
        if place.root == SELF {
            return Err(RuntimeError::SelfAssignment);
        }
        if self.env.contains(&place.root) {
            self.env.assign(&place.root, value)?;
            Ok(())
        } else {
            self.env.declare(&place.root, value, false)
        }
    }

    /// Writes `value` at the end of an existing path. Missing map keys and
    /// instance fields are created; the root must already be bound.
    pub(super) fn store_place(&mut self, place: &Place, value: Value) -> Result<(), RuntimeError> {
        self.env
            .with_value_mut(&place.root, |root| write_path(root, &place.steps, value))?
            .ok_or_else(|| unbound(&place.root))?
    }

    pub(super) fn execute_assign(
        &mut self,
        target: &Expression,
        op: AssignOperator,
        value: &Expression,
    ) -> Result<(), RuntimeError> {
        let place = self.resolve_place(target)?;
        if self.signal.is_latched() {
            return Ok(());
        }
        let value = match op {
            AssignOperator::Assign => eval_checked!(self, value),
            AssignOperator::Compound(op) => {
                let current = self.read_place(&place)?;
                let operand = eval_checked!(self, value);
                match (&current, &operand) {
                    (Value::Number(left), Value::Number(right)) => arithmetic(op, *left, *right)?,
                    _ => {
                        return Err(RuntimeError::CompoundAssignmentType {
                            op: op.symbol(),
                            left: current.type_name(),
                            right: operand.type_name(),
                        });
                    }
                }
            }
        };
        self.assign_place(&place, value)
    }
}

fn read_path(value: &Value, steps: &[Step]) -> Result<Value, RuntimeError> {
    let Some((step, rest)) = steps.split_first() else {
        return Ok(value.clone());
    };
    match (step, value) {
        (Step::Index(index), Value::Array(items)) => {
            read_path(&items[index.as_index(items.len())?], rest)
        }
        (Step::Index(index), Value::Map(entries)) => {
            read_path(entries.get(index.as_key()?).unwrap_or(&Value::Null), rest)
        }
        (Step::Member(name), Value::Map(entries)) => {
            read_path(entries.get(name).unwrap_or(&Value::Null), rest)
        }
        (Step::Member(name), Value::Instance(instance)) => match instance.fields.get(name) {
            Some(field) => read_path(field, rest),
            None => read_path(&member_of(value, name)?, rest),
        },
        (Step::Index(index), other) => read_path(&index_of(other, index)?, rest),
        (Step::Member(name), other) => read_path(&member_of(other, name)?, rest),
    }
}

fn write_path(target: &mut Value, steps: &[Step], value: Value) -> Result<(), RuntimeError> {
    let Some((step, rest)) = steps.split_first() else {
        *target = value;
        return Ok(());
    };
    let slot = match (step, target) {
        (Step::Index(index), Value::Array(items)) => {
            let position = index.as_index(items.len())?;
            &mut items[position]
        }
        (Step::Index(index), Value::Map(entries)) => entries.entry(index.as_key()?.to_string()),
        (Step::Member(name), Value::Map(entries)) => entries.entry(name.clone()),
        (Step::Member(name), Value::Instance(instance)) => instance.fields.entry(name.clone()),
        (Step::Index(_), other) => {
            return Err(RuntimeError::NotIndexable {
                type_name: other.type_name(),
            });
        }
        (Step::Member(name), other) => {
            return Err(RuntimeError::UndefinedMember {
                name: name.clone(),
                type_name: other.type_name(),
            });
        }
    };
    write_path(slot, rest, value)
}
