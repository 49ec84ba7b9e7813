use std::rc::Rc;

use crate::ast::Expression;
use crate::runtime::{Class, Environment, Function, Instance, RuntimeError, Value};

use super::expression::member_of;
use super::signal::Signal;
use super::{Interpreter, SELF};

impl Interpreter {
    /// Calls through a place write the receiver back afterwards, so mutator
    /// methods on `a.b.c` update `a`.
    pub(super) fn evaluate_call(
        &mut self,
        callee: &Expression,
        args: &[Expression],
    ) -> Result<Value, RuntimeError> {
        match callee {
            Expression::Member { object, name } if object.is_place() => {
                let place = self.resolve_place(object)?;
                if self.signal.is_latched() {
                    return Ok(Value::Null);
                }
                let receiver = self.read_place(&place)?;
                let function = member_of(&receiver, name)?;
                // A function stored in a field or map entry is bound to some
                // other object; only methods from the receiver's class write back.
                let own_method = matches!(
                    &receiver,
                    Value::Instance(instance) if !instance.fields.contains_key(name)
                );
                let args = self.evaluate_args(args)?;
                if self.signal.is_latched() {
                    return Ok(Value::Null);
                }
                let (value, updated) = self.call_value(function, args)?;
                // Unchanged receivers are left alone so constants stay callable.
                let updated = updated.filter(|updated| own_method && *updated != receiver);
                if let Some(updated) = updated {
                    if place.steps.is_empty() {
                        self.env.assign(&place.root, updated)?;
                    } else {
                        self.store_place(&place, updated)?;
                    }
                }
                Ok(value)
            }
            Expression::Super { method } => {
                let function = self.super_method(method)?;
                let args = self.evaluate_args(args)?;
                if self.signal.is_latched() {
                    return Ok(Value::Null);
                }
                let (value, updated) = self.call_value(function, args)?;
                if let Some(updated) = updated {
                    self.env.assign(SELF, updated)?;
                }
                Ok(value)
            }
            _ => {
                let function = eval_checked!(self, callee);
                let args = self.evaluate_args(args)?;
                if self.signal.is_latched() {
                    return Ok(Value::Null);
                }
                Ok(self.call_value(function, args)?.0)
            }
        }
    }

    /// Invokes any callable value. The second element is the receiver as the
    /// method left it, for bound methods only.
    pub(crate) fn call_value(
        &mut self,
        callee: Value,
        args: Vec<Value>,
    ) -> Result<(Value, Option<Value>), RuntimeError> {
        match callee {
            Value::Function(function) => self.call_function(function, args),
            Value::Builtin(builtin) => {
                builtin.check_arity(args.len())?;
                tracing::trace!(builtin = builtin.name, args = args.len(), "calling builtin");
                Ok(((builtin.function)(self, args)?, None))
            }
            Value::Class(class) => Ok((self.instantiate(class, args)?, None)),
            other => Err(RuntimeError::NotCallable {
                type_name: other.type_name(),
            }),
        }
    }

    #[tracing::instrument(level = "trace", skip_all, fields(function = function.name()))]
    fn call_function(
        &mut self,
        function: Function,
        args: Vec<Value>,
    ) -> Result<(Value, Option<Value>), RuntimeError> {
        if args.len() != function.arity() {
            return Err(RuntimeError::ArityMismatch {
                name: function.name().to_string(),
                expected: function.arity(),
                found: args.len(),
            });
        }

        let scope = Environment::child(&function.closure);
        for (param, arg) in function.decl.params.iter().zip(args) {
            scope.declare(&param.name, arg, false)?;
        }
        let bound = function.receiver.is_some();
        if let Some(receiver) = function.receiver {
            scope.declare(SELF, *receiver, false)?;
        }

        let saved_home = std::mem::replace(&mut self.home, function.home);
        let saved_line = self.line;
        let result = self.in_scope(Rc::clone(&scope), |interpreter| {
            interpreter.execute_block(&function.decl.body)
        });
        self.home = saved_home;
        result?;
        self.line = saved_line;

        let value = match self.signal.take() {
            Signal::Return(value) => value,
            thrown @ Signal::Throw { .. } => {
                self.signal = thrown;
                Value::Null
            }
            _ => Value::Null,
        };
        let updated = if bound { scope.get(SELF) } else { None };
        Ok((value, updated))
    }

    /// Allocates the instance and runs the nearest initializer on it.
    pub(super) fn instantiate(
        &mut self,
        class: Rc<Class>,
        args: Vec<Value>,
    ) -> Result<Value, RuntimeError> {
        let instance = Value::Instance(Instance::new(Rc::clone(&class)));
        let Some((decl, home)) = class.initializer() else {
            if !args.is_empty() {
                return Err(RuntimeError::ArityMismatch {
                    name: class.name.clone(),
                    expected: 0,
                    found: args.len(),
                });
            }
            return Ok(instance);
        };
        tracing::trace!(class = %class.name, "running initializer");
        let (_, updated) = self.call_function(Function::method(decl, home, Some(instance)), args)?;
        Ok(updated.unwrap_or_default())
    }

    /// `親.method`, bound to the current `自分`.
    pub(super) fn super_method(&self, method: &str) -> Result<Value, RuntimeError> {
        let home = self.home.as_ref().ok_or(RuntimeError::SuperOutsideMethod)?;
        let parent = home
            .parent
            .as_ref()
            .ok_or_else(|| RuntimeError::NoParentClass {
                class: home.name.clone(),
            })?;
        let (decl, defining) =
            parent
                .find_method(method)
                .ok_or_else(|| RuntimeError::UndefinedSuperMethod {
                    method: method.to_string(),
                })?;
        let receiver = self.lookup(SELF)?;
        Ok(Value::Function(Function::method(
            decl,
            defining,
            Some(receiver),
        )))
    }
}
