//! Lexical scope chain.
//!
//! Environments are shared (`Rc`) because closures keep their defining scope
//! alive after the call that created it returns. Declarations only touch the
//! innermost scope; lookups and assignments walk outwards.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use rustc_hash::FxHashMap;

use crate::runtime::error::RuntimeError;
use crate::runtime::value::Value;

pub type Env = Rc<Environment>;

#[derive(Debug, Clone)]
struct Binding {
    value: Value,
    constant: bool,
}

pub struct Environment {
    bindings: RefCell<FxHashMap<String, Binding>>,
    parent: Option<Env>,
    depth: usize,
}

impl Environment {
    pub fn global() -> Env {
        Rc::new(Self {
            bindings: RefCell::new(FxHashMap::default()),
            parent: None,
            depth: 0,
        })
    }

    pub fn child(parent: &Env) -> Env {
        Rc::new(Self {
            bindings: RefCell::new(FxHashMap::default()),
            parent: Some(Rc::clone(parent)),
            depth: parent.depth + 1,
        })
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn parent(&self) -> Option<&Env> {
        self.parent.as_ref()
    }

    /// Binds `name` in this scope. Shadowing an outer binding is fine;
    /// replacing a constant declared in this same scope is not.
    pub fn declare(&self, name: &str, value: Value, constant: bool) -> Result<(), RuntimeError> {
        let mut bindings = self.bindings.borrow_mut();
        if bindings.get(name).is_some_and(|binding| binding.constant) {
            return Err(RuntimeError::ConstantReassignment {
                name: name.to_string(),
            });
        }
        bindings.insert(name.to_string(), Binding { value, constant });
        Ok(())
    }

    /// Binds `name` in this scope as a variable, replacing whatever was bound
    /// there before, constants included.
    pub fn define(&self, name: &str, value: Value) {
        let binding = Binding {
            value,
            constant: false,
        };
        self.bindings.borrow_mut().insert(name.to_string(), binding);
    }

    pub fn get(&self, name: &str) -> Option<Value> {
        self.with_value(name, Value::clone)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.with_value(name, |_| ()).is_some()
    }

    /// Runs `read` against the binding without copying the value out.
    pub fn with_value<R>(&self, name: &str, read: impl FnOnce(&Value) -> R) -> Option<R> {
        if let Some(binding) = self.bindings.borrow().get(name) {
            return Some(read(&binding.value));
        }
        self.parent.as_ref()?.with_value(name, read)
    }

    /// Mutates the nearest binding of `name` in place. Constants refuse.
    /// `Ok(None)` means no scope binds the name.
    pub fn with_value_mut<R>(
        &self,
        name: &str,
        write: impl FnOnce(&mut Value) -> R,
    ) -> Result<Option<R>, RuntimeError> {
        if let Some(binding) = self.bindings.borrow_mut().get_mut(name) {
            if binding.constant {
                return Err(RuntimeError::ConstantReassignment {
                    name: name.to_string(),
                });
            }
            return Ok(Some(write(&mut binding.value)));
        }
        match &self.parent {
            Some(parent) => parent.with_value_mut(name, write),
            None => Ok(None),
        }
    }

    /// Replaces the nearest binding. Returns `false` when the name is unbound
    /// anywhere in the chain.
    pub fn assign(&self, name: &str, value: Value) -> Result<bool, RuntimeError> {
        Ok(self
            .with_value_mut(name, |slot| *slot = value)?
            .is_some())
    }

    /// Names bound directly in this scope, sorted.
    pub fn local_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.bindings.borrow().keys().cloned().collect();
        names.sort();
        names
    }
}

// Bindings may hold closures that point back at this environment, so Debug
// only lists names.
impl fmt::Debug for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Environment")
            .field("depth", &self.depth)
            .field("names", &self.local_names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn declaration_shadows_without_touching_outer_scope() {
        let global = Environment::global();
        global.declare("x", Value::Number(1.0), false).unwrap();
        let inner = Environment::child(&global);
        inner.declare("x", Value::Number(2.0), false).unwrap();

        assert_eq!(inner.get("x"), Some(Value::Number(2.0)));
        assert_eq!(global.get("x"), Some(Value::Number(1.0)));
        assert_eq!(inner.depth(), 1);
    }

    #[test]
    fn assignment_walks_outwards() {
        let global = Environment::global();
        global.declare("count", Value::Number(0.0), false).unwrap();
        let inner = Environment::child(&Environment::child(&global));

        assert!(inner.assign("count", Value::Number(5.0)).unwrap());
        assert_eq!(global.get("count"), Some(Value::Number(5.0)));
        assert!(!inner.assign("missing", Value::Null).unwrap());
    }

    #[test]
    fn constants_reject_assignment_and_redeclaration() {
        let global = Environment::global();
        global.declare("PI", Value::Number(2.5), true).unwrap();
        let inner = Environment::child(&global);

        assert_eq!(
            inner.assign("PI", Value::Number(3.0)),
            Err(RuntimeError::ConstantReassignment {
                name: "PI".to_string()
            })
        );
        assert!(global.declare("PI", Value::Null, false).is_err());
        // Shadowing in a nested scope is still a fresh declaration.
        assert!(inner.declare("PI", Value::Null, false).is_ok());
    }

    #[test]
    fn define_replaces_a_constant_with_a_variable() {
        let global = Environment::global();
        global.declare("limit", Value::Number(1.0), true).unwrap();
        global.define("limit", Value::Number(2.0));

        assert_eq!(global.get("limit"), Some(Value::Number(2.0)));
        assert!(global.assign("limit", Value::Number(3.0)).unwrap());
        assert_eq!(global.get("limit"), Some(Value::Number(3.0)));
    }

    #[test]
    fn reads_are_copies() {
        let global = Environment::global();
        global
            .declare("xs", Value::Array(vec![Value::Number(1.0)]), false)
            .unwrap();
        let Some(Value::Array(mut copy)) = global.get("xs") else {
            panic!("expected array");
        };
        copy[0] = Value::Number(9.0);
        assert_eq!(
            global.get("xs"),
            Some(Value::Array(vec![Value::Number(1.0)]))
        );
    }
}
