//! Dynamically typed runtime values.
//!
//! `Clone` is the language's copy operation. Strings, arrays, maps and
//! instances own their data, so cloning copies them deeply. Functions share
//! their closure environment, classes and builtins are shared descriptors,
//! and generators share one cursor between every copy.

use std::cell::RefCell;
use std::cmp::Ordering;
use std::fmt;
use std::rc::Rc;

use crate::runtime::callable::{Builtin, Function};
use crate::runtime::class::{Class, Instance};
use crate::runtime::dict::Dict;
use crate::runtime::error::RuntimeError;
use crate::runtime::generator::Generator;

#[derive(Debug, Clone, Default)]
pub enum Value {
    #[default]
    Null,
    Number(f64),
    Boolean(bool),
    String(String),
    Array(Vec<Value>),
    Map(Dict),
    Function(Function),
    Builtin(Rc<Builtin>),
    Class(Rc<Class>),
    Instance(Instance),
    Generator(Rc<RefCell<Generator>>),
}

impl Value {
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "無",
            Value::Number(_) => "数値",
            Value::Boolean(_) => "真偽",
            Value::String(_) => "文字列",
            Value::Array(_) => "配列",
            Value::Map(_) => "辞書",
            Value::Function(_) | Value::Builtin(_) => "関数",
            Value::Class(_) => "クラス",
            Value::Instance(_) => "インスタンス",
            Value::Generator(_) => "ジェネレータ",
        }
    }

    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Null => false,
            Value::Boolean(value) => *value,
            Value::Number(value) => *value != 0.0 && !value.is_nan(),
            Value::String(value) => !value.is_empty(),
            Value::Array(items) => !items.is_empty(),
            Value::Map(entries) => !entries.is_empty(),
            _ => true,
        }
    }

    /// Numeric conversion used by `数値化`.
    pub fn to_number(&self) -> Result<f64, RuntimeError> {
        match self {
            Value::Number(value) => Ok(*value),
            Value::Boolean(value) => Ok(if *value { 1.0 } else { 0.0 }),
            Value::Null => Ok(0.0),
            Value::String(text) => parse_number(text).ok_or_else(|| {
                RuntimeError::NumberConversion {
                    text: text.clone(),
                }
            }),
            other => Err(RuntimeError::NumberConversion {
                text: other.to_string(),
            }),
        }
    }

    /// Ordering for numbers and strings. Everything else is unordered.
    pub fn compare(&self, other: &Value) -> Option<Ordering> {
        match (self, other) {
            (Value::Number(left), Value::Number(right)) => left.partial_cmp(right),
            (Value::String(left), Value::String(right)) => Some(left.cmp(right)),
            _ => None,
        }
    }

    /// Rendering used inside containers: strings are quoted.
    pub fn repr(&self) -> String {
        match self {
            Value::String(text) => quote(text),
            other => other.to_string(),
        }
    }

    /// Integral index into a collection of `len` elements.
    pub fn as_index(&self, len: usize) -> Result<usize, RuntimeError> {
        let Value::Number(number) = self else {
            return Err(RuntimeError::InvalidIndex {
                index: self.repr(),
            });
        };
        if number.fract() != 0.0 || !number.is_finite() {
            return Err(RuntimeError::InvalidIndex {
                index: format_number(*number),
            });
        }
        let index = *number as i64;
        if index < 0 || index as usize >= len {
            return Err(RuntimeError::IndexOutOfRange { index, len });
        }
        Ok(index as usize)
    }

    pub fn as_key(&self) -> Result<&str, RuntimeError> {
        match self {
            Value::String(key) => Ok(key),
            other => Err(RuntimeError::InvalidMapKey {
                type_name: other.type_name(),
            }),
        }
    }
}

/// Structural equality. Values of different types are never equal.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Number(left), Value::Number(right)) => left == right,
            (Value::Boolean(left), Value::Boolean(right)) => left == right,
            (Value::String(left), Value::String(right)) => left == right,
            (Value::Array(left), Value::Array(right)) => left == right,
            (Value::Map(left), Value::Map(right)) => left == right,
            (Value::Function(left), Value::Function(right)) => left.same_function(right),
            (Value::Builtin(left), Value::Builtin(right)) => Rc::ptr_eq(left, right),
            (Value::Class(left), Value::Class(right)) => Rc::ptr_eq(left, right),
            (Value::Instance(left), Value::Instance(right)) => {
                Rc::ptr_eq(&left.class, &right.class) && left.fields == right.fields
            }
            (Value::Generator(left), Value::Generator(right)) => Rc::ptr_eq(left, right),
            _ => false,
        }
    }
}

/// Top-level rendering used by `表示`: strings print raw.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("無"),
            Value::Number(value) => f.write_str(&format_number(*value)),
            Value::Boolean(true) => f.write_str("真"),
            Value::Boolean(false) => f.write_str("偽"),
            Value::String(text) => f.write_str(text),
            Value::Array(items) => {
                f.write_str("[")?;
                for (position, item) in items.iter().enumerate() {
                    if position > 0 {
                        f.write_str(", ")?;
                    }
                    f.write_str(&item.repr())?;
                }
                f.write_str("]")
            }
            Value::Map(entries) => {
                f.write_str("{")?;
                for (position, (key, value)) in entries.iter().enumerate() {
                    if position > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}: {}", quote(key), value.repr())?;
                }
                f.write_str("}")
            }
            Value::Function(function) => write!(f, "<関数 {}>", function.decl.display_name()),
            Value::Builtin(builtin) => write!(f, "<組み込み関数 {}>", builtin.name),
            Value::Class(class) => write!(f, "<クラス {}>", class.name),
            Value::Instance(instance) => write!(f, "<{} のインスタンス>", instance.class.name),
            Value::Generator(_) => f.write_str("<ジェネレータ>"),
        }
    }
}

pub fn format_number(value: f64) -> String {
    if value.is_nan() {
        "NaN".to_string()
    } else if value.is_infinite() {
        if value > 0.0 { "Infinity" } else { "-Infinity" }.to_string()
    } else if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{value}")
    }
}

fn quote(text: &str) -> String {
    let mut quoted = String::with_capacity(text.len() + 2);
    quoted.push('"');
    for ch in text.chars() {
        match ch {
            '"' => quoted.push_str("\\\""),
            '\\' => quoted.push_str("\\\\"),
            '\n' => quoted.push_str("\\n"),
            '\t' => quoted.push_str("\\t"),
            '\r' => quoted.push_str("\\r"),
            other => quoted.push(other),
        }
    }
    quoted.push('"');
    quoted
}

fn parse_number(text: &str) -> Option<f64> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }
    match trimmed {
        "NaN" => Some(f64::NAN),
        "Infinity" => Some(f64::INFINITY),
        "-Infinity" => Some(f64::NEG_INFINITY),
        _ if trimmed.chars().any(|c| c.is_ascii_alphabetic() && c != 'e' && c != 'E') => None,
        _ => trimmed.parse().ok(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn array(items: Vec<Value>) -> Value {
        Value::Array(items)
    }

    #[test]
    fn truthiness() {
        assert!(!Value::Null.is_truthy());
        assert!(!Value::Boolean(false).is_truthy());
        assert!(!Value::Number(0.0).is_truthy());
        assert!(!Value::Number(f64::NAN).is_truthy());
        assert!(!Value::String(String::new()).is_truthy());
        assert!(!array(vec![]).is_truthy());
        assert!(!Value::Map(Dict::new()).is_truthy());
        assert!(Value::Number(-1.0).is_truthy());
        assert!(Value::String("0".to_string()).is_truthy());
        assert!(array(vec![Value::Null]).is_truthy());
    }

    #[test]
    fn formats_numbers() {
        assert_eq!(format_number(1024.0), "1024");
        assert_eq!(format_number(-3.0), "-3");
        assert_eq!(format_number(0.5), "0.5");
        assert_eq!(format_number(0.1 + 0.2), "0.30000000000000004");
        assert_eq!(format_number(f64::NAN), "NaN");
        assert_eq!(format_number(f64::INFINITY), "Infinity");
        assert_eq!(format_number(f64::NEG_INFINITY), "-Infinity");
    }

    #[test]
    fn renders_nested_containers() {
        let mut map = Dict::new();
        map.insert("k".to_string(), Value::Number(1.0));
        map.insert(
            "list".to_string(),
            array(vec![Value::String("a".to_string()), Value::Boolean(true)]),
        );
        let value = array(vec![
            Value::Number(1.0),
            Value::String("a\"b".to_string()),
            Value::Map(map),
        ]);
        assert_eq!(
            value.to_string(),
            r#"[1, "a\"b", {"k": 1, "list": ["a", 真]}]"#
        );
        assert_eq!(Value::String("raw".to_string()).to_string(), "raw");
        assert_eq!(Value::Null.to_string(), "無");
    }

    #[test]
    fn equality_is_structural_and_type_strict() {
        assert_eq!(
            array(vec![Value::Number(1.0), Value::String("x".to_string())]),
            array(vec![Value::Number(1.0), Value::String("x".to_string())])
        );
        assert_ne!(
            array(vec![Value::Number(1.0), Value::Number(2.0)]),
            array(vec![Value::Number(2.0), Value::Number(1.0)])
        );
        assert_ne!(Value::Number(1.0), Value::String("1".to_string()));
        assert_ne!(Value::Number(0.0), Value::Boolean(false));
        assert_ne!(Value::Null, Value::Boolean(false));
    }

    #[test]
    fn clone_is_a_deep_copy_for_aggregates() {
        let original = array(vec![array(vec![Value::Number(1.0)])]);
        let mut copy = original.clone();
        if let Value::Array(outer) = &mut copy
            && let Value::Array(inner) = &mut outer[0]
        {
            inner[0] = Value::Number(2.0);
        }
        assert_eq!(original, array(vec![array(vec![Value::Number(1.0)])]));
        assert_ne!(original, copy);
    }

    #[test]
    fn generators_are_shared_between_copies() {
        let generator = Value::Generator(Rc::new(RefCell::new(Generator::range(0.0, 3.0, 1.0))));
        let copy = generator.clone();
        let (Value::Generator(first), Value::Generator(second)) = (&generator, &copy) else {
            panic!("expected generators");
        };
        assert_eq!(first.borrow_mut().next_value(), Some(Value::Number(0.0)));
        assert_eq!(second.borrow_mut().next_value(), Some(Value::Number(1.0)));
        assert_eq!(generator, copy);
    }

    #[test]
    fn converts_to_number() {
        assert_eq!(Value::String(" 42 ".to_string()).to_number(), Ok(42.0));
        assert_eq!(Value::String("1e3".to_string()).to_number(), Ok(1000.0));
        assert_eq!(Value::Boolean(true).to_number(), Ok(1.0));
        assert!(Value::String("abc".to_string()).to_number().is_err());
        assert!(Value::String("inf".to_string()).to_number().is_err());
        assert!(array(vec![]).to_number().is_err());
    }

    #[test]
    fn index_must_be_integral_and_in_range() {
        assert_eq!(Value::Number(1.0).as_index(3), Ok(1));
        assert!(matches!(
            Value::Number(1.5).as_index(3),
            Err(RuntimeError::InvalidIndex { .. })
        ));
        assert_eq!(
            Value::Number(3.0).as_index(3),
            Err(RuntimeError::IndexOutOfRange { index: 3, len: 3 })
        );
        assert_eq!(
            Value::Number(-1.0).as_index(3),
            Err(RuntimeError::IndexOutOfRange { index: -1, len: 3 })
        );
    }

    #[test]
    fn compares_numbers_and_strings_only() {
        assert_eq!(Value::Number(1.0).compare(&Value::Number(2.0)), Some(Ordering::Less));
        assert_eq!(
            Value::String("b".to_string()).compare(&Value::String("a".to_string())),
            Some(Ordering::Greater)
        );
        assert_eq!(Value::Number(1.0).compare(&Value::String("a".to_string())), None);
    }
}
