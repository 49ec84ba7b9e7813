//! Lazy sequences produced by `範囲` and `反復子`.
//!
//! A generator lives behind `Rc<RefCell<_>>` inside [`Value`], so every copy
//! advances the same cursor.

use std::cell::RefCell;
use std::rc::Rc;

use crate::runtime::error::RuntimeError;
use crate::runtime::value::Value;

#[derive(Debug, Clone, PartialEq)]
pub enum Generator {
    Range { next: f64, end: f64, step: f64 },
    Items { items: Vec<Value>, position: usize },
}

impl Generator {
    /// Counts from `start` towards `end`, excluding `end`. `step` must be
    /// non-zero.
    pub fn range(start: f64, end: f64, step: f64) -> Self {
        Generator::Range {
            next: start,
            end,
            step,
        }
    }

    pub fn items(items: Vec<Value>) -> Self {
        Generator::Items { items, position: 0 }
    }

    pub fn next_value(&mut self) -> Option<Value> {
        match self {
            Generator::Range { next, end, step } => {
                let done = if *step > 0.0 { *next >= *end } else { *next <= *end };
                if done {
                    return None;
                }
                let value = *next;
                *next += *step;
                Some(Value::Number(value))
            }
            Generator::Items { items, position } => {
                let value = items.get(*position)?.clone();
                *position += 1;
                Some(value)
            }
        }
    }
}

/// What a for-each loop or comprehension walks over: a snapshot of an
/// aggregate's elements, or a shared generator pulled one value at a time.
pub enum Sequence {
    Values(std::vec::IntoIter<Value>),
    Shared(Rc<RefCell<Generator>>),
}

impl Sequence {
    /// Arrays yield elements, strings yield characters, maps yield keys.
    pub fn from_value(value: Value) -> Result<Self, RuntimeError> {
        let values = match value {
            Value::Array(items) => items,
            Value::String(text) => text
                .chars()
                .map(|ch| Value::String(ch.to_string()))
                .collect(),
            Value::Map(entries) => entries
                .keys()
                .map(|key| Value::String(key.to_string()))
                .collect(),
            Value::Generator(generator) => return Ok(Sequence::Shared(generator)),
            other => {
                return Err(RuntimeError::NotIterable {
                    type_name: other.type_name(),
                });
            }
        };
        Ok(Sequence::Values(values.into_iter()))
    }
}

impl Iterator for Sequence {
    type Item = Value;

    fn next(&mut self) -> Option<Value> {
        match self {
            Sequence::Values(values) => values.next(),
            Sequence::Shared(generator) => generator.borrow_mut().next_value(),
        }
    }
}
