//! Callable values: user functions (closures and bound methods) and
//! natively implemented builtins.

use std::fmt;
use std::rc::Rc;

use crate::ast::FunctionDecl;
use crate::interpreter::Interpreter;
use crate::runtime::class::Class;
use crate::runtime::environment::Env;
use crate::runtime::error::RuntimeError;
use crate::runtime::value::Value;

/// A function body paired with the scope it was defined in.
///
/// Methods read from an instance carry that instance as `receiver` (bound
/// to `自分` during the call) and the class that defines them as `home`,
/// which is where `親` starts its lookup.
#[derive(Clone)]
pub struct Function {
    pub decl: Rc<FunctionDecl>,
    pub closure: Env,
    pub receiver: Option<Box<Value>>,
    pub home: Option<Rc<Class>>,
}

impl Function {
    pub fn new(decl: Rc<FunctionDecl>, closure: Env) -> Self {
        Self {
            decl,
            closure,
            receiver: None,
            home: None,
        }
    }

    pub fn method(decl: Rc<FunctionDecl>, home: Rc<Class>, receiver: Option<Value>) -> Self {
        Self {
            decl,
            closure: Rc::clone(&home.closure),
            receiver: receiver.map(Box::new),
            home: Some(home),
        }
    }

    pub fn name(&self) -> &str {
        self.decl.display_name()
    }

    pub fn arity(&self) -> usize {
        self.decl.params.len()
    }

    /// Same declaration closed over the same scope.
    pub(crate) fn same_function(&self, other: &Function) -> bool {
        Rc::ptr_eq(&self.decl, &other.decl) && Rc::ptr_eq(&self.closure, &other.closure)
    }
}

impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Function")
            .field("name", &self.name())
            .field("arity", &self.arity())
            .field("bound", &self.receiver.is_some())
            .finish()
    }
}

pub type NativeFunction = fn(&mut Interpreter, Vec<Value>) -> Result<Value, RuntimeError>;

/// Native function registered into the global scope. `max_args` of `None`
/// accepts any number of arguments from `min_args` up.
#[derive(Clone)]
pub struct Builtin {
    pub name: &'static str,
    pub min_args: usize,
    pub max_args: Option<usize>,
    pub function: NativeFunction,
}

impl Builtin {
    pub fn check_arity(&self, found: usize) -> Result<(), RuntimeError> {
        let within = found >= self.min_args && self.max_args.is_none_or(|max| found <= max);
        if within {
            return Ok(());
        }
        let expected = match self.max_args {
            Some(max) if max == self.min_args => format!("{max} 個"),
            Some(max) => format!("{} 〜 {max} 個", self.min_args),
            None => format!("{} 個以上", self.min_args),
        };
        Err(RuntimeError::BuiltinArityMismatch {
            name: self.name.to_string(),
            expected,
            found,
        })
    }
}

impl fmt::Debug for Builtin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Builtin")
            .field("name", &self.name)
            .field("min_args", &self.min_args)
            .field("max_args", &self.max_args)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noop(_: &mut Interpreter, _: Vec<Value>) -> Result<Value, RuntimeError> {
        Ok(Value::Null)
    }

    fn builtin(min_args: usize, max_args: Option<usize>) -> Builtin {
        Builtin {
            name: "テスト",
            min_args,
            max_args,
            function: noop,
        }
    }

    #[test]
    fn unbounded_builtins_accept_any_count_above_minimum() {
        let variadic = builtin(1, None);
        for count in 1..50 {
            assert!(variadic.check_arity(count).is_ok());
        }
        assert!(variadic.check_arity(0).is_err());
    }

    #[test]
    fn bounded_builtins_report_their_range() {
        let ranged = builtin(1, Some(3));
        assert!(ranged.check_arity(3).is_ok());
        assert_eq!(
            ranged.check_arity(4).unwrap_err().to_string(),
            "組み込み関数 'テスト' の引数は 1 〜 3 個ですが 4 個渡されました"
        );
        assert_eq!(
            builtin(2, Some(2)).check_arity(1).unwrap_err().to_string(),
            "組み込み関数 'テスト' の引数は 2 個ですが 1 個渡されました"
        );
    }
}
