//! Native functions installed into every interpreter's global scope.

use std::cell::RefCell;
use std::rc::Rc;

use crate::interpreter::Interpreter;
use crate::runtime::{Builtin, Generator, RuntimeError, Sequence, Value};

pub const BUILTINS: &[Builtin] = &[
    builtin("表示", 0, None, print),
    builtin("長さ", 1, Some(1), length),
    builtin("型", 1, Some(1), type_of),
    builtin("文字列化", 1, Some(1), stringify),
    builtin("数値化", 1, Some(1), to_number),
    builtin("追加", 2, None, append),
    builtin("削除", 2, Some(2), remove),
    builtin("キー", 1, Some(1), keys),
    builtin("含む", 2, Some(2), contains),
    builtin("結合", 1, Some(2), join),
    builtin("分割", 2, Some(2), split),
    builtin("絶対値", 1, Some(1), abs),
    builtin("切り捨て", 1, Some(1), floor),
    builtin("平方根", 1, Some(1), sqrt),
    builtin("最大", 1, None, max),
    builtin("最小", 1, None, min),
    builtin("範囲", 1, Some(3), range),
    builtin("反復子", 1, Some(1), iterator),
    builtin("次", 1, Some(1), next),
];

pub fn register(interpreter: &mut Interpreter) {
    for builtin in BUILTINS {
        interpreter.register_builtin(builtin.clone());
    }
}

const fn builtin(
    name: &'static str,
    min_args: usize,
    max_args: Option<usize>,
    function: crate::runtime::NativeFunction,
) -> Builtin {
    Builtin {
        name,
        min_args,
        max_args,
        function,
    }
}

type BuiltinResult = Result<Value, RuntimeError>;

fn print(interpreter: &mut Interpreter, args: Vec<Value>) -> BuiltinResult {
    let line = args
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(" ");
    interpreter.emit(line);
    Ok(Value::Null)
}

fn length(_: &mut Interpreter, args: Vec<Value>) -> BuiltinResult {
    let len = match &args[0] {
        Value::String(text) => text.chars().count(),
        Value::Array(items) => items.len(),
        Value::Map(entries) => entries.len(),
        other => return Err(wrong_type("長さ", "文字列・配列・辞書", other)),
    };
    Ok(Value::Number(len as f64))
}

fn type_of(_: &mut Interpreter, args: Vec<Value>) -> BuiltinResult {
    Ok(Value::String(args[0].type_name().to_string()))
}

fn stringify(_: &mut Interpreter, args: Vec<Value>) -> BuiltinResult {
    Ok(Value::String(args[0].to_string()))
}

fn to_number(_: &mut Interpreter, args: Vec<Value>) -> BuiltinResult {
    args[0].to_number().map(Value::Number)
}

fn append(_: &mut Interpreter, args: Vec<Value>) -> BuiltinResult {
    let mut args = args.into_iter();
    match args.next() {
        Some(Value::Array(mut items)) => {
            items.extend(args);
            Ok(Value::Array(items))
        }
        Some(other) => Err(wrong_type("追加", "配列", &other)),
        None => Ok(Value::Null),
    }
}

fn remove(_: &mut Interpreter, args: Vec<Value>) -> BuiltinResult {
    let [target, key] = take_args("削除", args)?;
    match target {
        Value::Array(mut items) => {
            let position = key.as_index(items.len())?;
            items.remove(position);
            Ok(Value::Array(items))
        }
        Value::Map(mut entries) => {
            entries.remove(key.as_key()?);
            Ok(Value::Map(entries))
        }
        other => Err(wrong_type("削除", "配列・辞書", &other)),
    }
}

fn keys(_: &mut Interpreter, args: Vec<Value>) -> BuiltinResult {
    match &args[0] {
        Value::Map(entries) => Ok(Value::Array(
            entries
                .keys()
                .map(|key| Value::String(key.to_string()))
                .collect(),
        )),
        other => Err(wrong_type("キー", "辞書", other)),
    }
}

fn contains(_: &mut Interpreter, args: Vec<Value>) -> BuiltinResult {
    let found = match (&args[0], &args[1]) {
        (Value::Array(items), needle) => items.contains(needle),
        (Value::Map(entries), key) => entries.contains_key(key.as_key()?),
        (Value::String(text), Value::String(needle)) => text.contains(needle.as_str()),
        (Value::String(_), other) => return Err(wrong_type("含む", "文字列", other)),
        (other, _) => return Err(wrong_type("含む", "配列・辞書・文字列", other)),
    };
    Ok(Value::Boolean(found))
}

fn join(_: &mut Interpreter, args: Vec<Value>) -> BuiltinResult {
    let separator = match args.get(1) {
        Some(Value::String(separator)) => separator.as_str(),
        Some(other) => return Err(wrong_type("結合", "文字列", other)),
        None => "",
    };
    match &args[0] {
        Value::Array(items) => Ok(Value::String(
            items
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(separator),
        )),
        other => Err(wrong_type("結合", "配列", other)),
    }
}

/// An empty separator splits into characters.
fn split(_: &mut Interpreter, args: Vec<Value>) -> BuiltinResult {
    let (Value::String(text), Value::String(separator)) = (&args[0], &args[1]) else {
        let offender = if matches!(args[0], Value::String(_)) {
            &args[1]
        } else {
            &args[0]
        };
        return Err(wrong_type("分割", "文字列", offender));
    };
    let parts: Vec<Value> = if separator.is_empty() {
        text.chars().map(|ch| Value::String(ch.to_string())).collect()
    } else {
        text.split(separator.as_str())
            .map(|part| Value::String(part.to_string()))
            .collect()
    };
    Ok(Value::Array(parts))
}

fn abs(_: &mut Interpreter, args: Vec<Value>) -> BuiltinResult {
    Ok(Value::Number(number("絶対値", &args[0])?.abs()))
}

fn floor(_: &mut Interpreter, args: Vec<Value>) -> BuiltinResult {
    Ok(Value::Number(number("切り捨て", &args[0])?.floor()))
}

fn sqrt(_: &mut Interpreter, args: Vec<Value>) -> BuiltinResult {
    let value = number("平方根", &args[0])?;
    if value < 0.0 {
        return Err(RuntimeError::InvalidArgument {
            function: "平方根",
            message: "負の数の平方根は求められません".to_string(),
        });
    }
    Ok(Value::Number(value.sqrt()))
}

fn max(_: &mut Interpreter, args: Vec<Value>) -> BuiltinResult {
    extremum("最大", args, f64::max)
}

fn min(_: &mut Interpreter, args: Vec<Value>) -> BuiltinResult {
    extremum("最小", args, f64::min)
}

/// A single array argument is searched element-wise.
fn extremum(function: &'static str, args: Vec<Value>, pick: fn(f64, f64) -> f64) -> BuiltinResult {
    let candidates = match <[Value; 1]>::try_from(args) {
        Ok([Value::Array(items)]) => items,
        Ok([single]) => vec![single],
        Err(args) => args,
    };
    let mut best: Option<f64> = None;
    for candidate in &candidates {
        let value = number(function, candidate)?;
        best = Some(best.map_or(value, |best| pick(best, value)));
    }
    best.map(Value::Number)
        .ok_or_else(|| RuntimeError::InvalidArgument {
            function,
            message: "空の配列には使えません".to_string(),
        })
}

/// `範囲(end)`, `範囲(start, end)` or `範囲(start, end, step)`.
fn range(_: &mut Interpreter, args: Vec<Value>) -> BuiltinResult {
    let bounds = args
        .iter()
        .map(|arg| number("範囲", arg))
        .collect::<Result<Vec<_>, _>>()?;
    let (start, end, step) = match bounds[..] {
        [end] => (0.0, end, 1.0),
        [start, end] => (start, end, 1.0),
        [start, end, step] => (start, end, step),
        _ => return Err(arity_mismatch("範囲", "1 〜 3 個", bounds.len())),
    };
    if step == 0.0 {
        return Err(RuntimeError::InvalidArgument {
            function: "範囲",
            message: "増分に 0 は使えません".to_string(),
        });
    }
    Ok(shared(Generator::range(start, end, step)))
}

fn iterator(_: &mut Interpreter, args: Vec<Value>) -> BuiltinResult {
    let [source] = take_args("反復子", args)?;
    match source {
        generator @ Value::Generator(_) => Ok(generator),
        other => {
            let items = Sequence::from_value(other)?.collect();
            Ok(shared(Generator::items(items)))
        }
    }
}

fn next(_: &mut Interpreter, args: Vec<Value>) -> BuiltinResult {
    match &args[0] {
        Value::Generator(generator) => Ok(generator.borrow_mut().next_value().unwrap_or_default()),
        other => Err(wrong_type("次", "ジェネレータ", other)),
    }
}

fn shared(generator: Generator) -> Value {
    Value::Generator(Rc::new(RefCell::new(generator)))
}

fn number(function: &'static str, value: &Value) -> Result<f64, RuntimeError> {
    match value {
        Value::Number(number) => Ok(*number),
        other => Err(wrong_type(function, "数値", other)),
    }
}

fn wrong_type(function: &'static str, expected: &'static str, found: &Value) -> RuntimeError {
    RuntimeError::ArgumentType {
        function,
        expected,
        found: found.type_name(),
    }
}

/// Arity is validated before dispatch; this only moves the arguments out.
fn take_args<const N: usize>(
    function: &'static str,
    args: Vec<Value>,
) -> Result<[Value; N], RuntimeError> {
    let found = args.len();
    args.try_into()
        .map_err(|_| arity_mismatch(function, &format!("{N} 個"), found))
}

fn arity_mismatch(function: &'static str, expected: &str, found: usize) -> RuntimeError {
    RuntimeError::BuiltinArityMismatch {
        name: function.to_string(),
        expected: expected.to_string(),
        found,
    }
}
