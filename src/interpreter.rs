//! Tree-walking evaluator.
//!
//! Execution pipeline:
//! run -> execute_block (top-level statements) -> execute -> evaluate
//! -> call_function -> execute_block (function body) -> ...
//!
//! Runtime errors travel as `Err(RuntimeError)` and are not catchable.
//! Return, break, continue and thrown values are latched in `signal`
//! instead; every statement sequence stops as soon as one is latched.

use std::path::PathBuf;
use std::rc::Rc;

use rustc_hash::FxHashSet;

use crate::ast::{Expression, Program};
use crate::config::Config;
use crate::diagnostic::{Diagnostic, Phase};
use crate::parser::Parser;
use crate::runtime::{Builtin, Class, Env, Environment, RuntimeError, Value};
use crate::stack::ensure_sufficient_stack;

/// Evaluates an expression and bails out of the enclosing function with a
/// default value when the evaluation latched a signal (a value was thrown
/// somewhere underneath), so no further side effects run.
macro_rules! eval_checked {
    ($interpreter:expr, $expression:expr) => {{
        let value = $interpreter.evaluate($expression)?;
        if $interpreter.signal.is_latched() {
            return Ok(Default::default());
        }
        value
    }};
}

mod call;
mod expression;
mod module;
mod place;
pub mod signal;
mod statement;

#[cfg(test)]
mod tests;

use signal::Signal;

/// Name under which the running method sees its receiver.
pub(crate) const SELF: &str = "自分";

pub struct Interpreter {
    globals: Env,
    env: Env,
    signal: Signal,
    depth: usize,
    config: Config,
    line: usize,
    /// Class defining the method currently running; `親` starts above it.
    home: Option<Rc<Class>>,
    errors: Vec<Diagnostic>,
    output: Vec<String>,
    imported: FxHashSet<PathBuf>,
}

impl Interpreter {
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    pub fn with_config(config: Config) -> Self {
        let globals = Environment::global();
        let mut interpreter = Self {
            env: Rc::clone(&globals),
            globals,
            signal: Signal::None,
            depth: 0,
            config,
            line: 0,
            home: None,
            errors: Vec::new(),
            output: Vec::new(),
            imported: FxHashSet::default(),
        };
        crate::builtins::register(&mut interpreter);
        interpreter
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Makes a native function callable from scripts under `builtin.name`.
    pub fn register_builtin(&mut self, builtin: Builtin) {
        let name = builtin.name;
        self.define_global(name, Value::Builtin(Rc::new(builtin)));
    }

    /// Binds a global variable. A script constant of the same name is
    /// replaced, so host globals are always assignable.
    pub fn define_global(&mut self, name: &str, value: Value) {
        self.globals.define(name, value);
    }

    pub fn global(&self, name: &str) -> Option<Value> {
        self.globals.get(name)
    }

    /// Runs the top-level statements, then the entry-point function when
    /// the program defines one. Returns the entry point's result, or `無`.
    /// Failures are recorded; see [`Interpreter::had_error`].
    pub fn run(&mut self, program: &Program) -> Value {
        match self.execute_program(program) {
            Ok(value) => value,
            Err(diagnostic) => {
                self.errors.push(diagnostic);
                Value::Null
            }
        }
    }

    /// Parses and runs `source`. Syntax errors are recorded and nothing runs.
    pub fn run_source(&mut self, source: &str) -> Value {
        let mut parser = Parser::new(source);
        let program = parser.parse_program();
        if parser.had_error() {
            self.errors.extend(parser.diagnostics());
            return Value::Null;
        }
        self.run(&program)
    }

    pub fn execute_program(&mut self, program: &Program) -> Result<Value, Diagnostic> {
        let result = self.execute_block(&program.statements);
        self.settle(result)?;

        let entry = self.globals.get(&self.config.entry_point);
        let Some(entry @ (Value::Function(_) | Value::Builtin(_))) = entry else {
            return Ok(Value::Null);
        };
        tracing::debug!(entry = %self.config.entry_point, "invoking entry point");
        let (value, result) = match self.call_value(entry, Vec::new()) {
            Ok((value, _)) => (value, Ok(())),
            Err(error) => (Value::Null, Err(error)),
        };
        self.settle(result)?;
        Ok(value)
    }

    /// Evaluates one expression in the current scope, for embedding and
    /// interactive use.
    pub fn eval_expression(&mut self, expression: &Expression) -> Value {
        let (value, result) = match self.evaluate(expression) {
            Ok(value) => (value, Ok(())),
            Err(error) => (Value::Null, Err(error)),
        };
        match self.settle(result) {
            Ok(()) => value,
            Err(diagnostic) => {
                self.errors.push(diagnostic);
                Value::Null
            }
        }
    }

    /// Turns a finished pass into a diagnostic: a runtime error, or a thrown
    /// value that nothing caught.
    fn settle(&mut self, result: Result<(), RuntimeError>) -> Result<(), Diagnostic> {
        if let Err(error) = result {
            self.reset_after_error();
            tracing::debug!(line = self.line, "runtime error: {error}");
            return Err(Diagnostic::new(self.line, Phase::Runtime, error.to_string()));
        }
        match self.signal.take() {
            Signal::Throw { value, line } => Err(Diagnostic::new(
                line,
                Phase::Exception,
                format!("捕捉されない例外: {value}"),
            )),
            _ => Ok(()),
        }
    }

    fn reset_after_error(&mut self) {
        self.signal = Signal::None;
        self.env = Rc::clone(&self.globals);
        self.home = None;
        self.depth = 0;
    }

    pub fn had_error(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Every recorded diagnostic, one per line.
    pub fn error_message(&self) -> Option<String> {
        if self.errors.is_empty() {
            return None;
        }
        Some(
            self.errors
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join("\n"),
        )
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.errors
    }

    pub fn clear_error(&mut self) {
        self.errors.clear();
    }

    /// Lines printed by `表示` so far (empty when streaming to stdout).
    pub fn output(&self) -> &[String] {
        &self.output
    }

    pub fn take_output(&mut self) -> Vec<String> {
        std::mem::take(&mut self.output)
    }

    pub(crate) fn emit(&mut self, line: String) {
        if self.config.stream_output {
            println!("{line}");
        } else {
            self.output.push(line);
        }
    }

    /// Depth-guarded recursion into the evaluator.
    fn guarded<T>(
        &mut self,
        run: impl FnOnce(&mut Self) -> Result<T, RuntimeError>,
    ) -> Result<T, RuntimeError> {
        if self.depth >= self.config.max_depth {
            return Err(RuntimeError::StackOverflow {
                limit: self.config.max_depth,
            });
        }
        self.depth += 1;
        let result = ensure_sufficient_stack(|| run(self));
        self.depth -= 1;
        result
    }

    /// Runs `run` with `scope` as the current environment, restoring the
    /// previous one afterwards whatever happens.
    fn in_scope<T>(
        &mut self,
        scope: Env,
        run: impl FnOnce(&mut Self) -> Result<T, RuntimeError>,
    ) -> Result<T, RuntimeError> {
        let saved = std::mem::replace(&mut self.env, scope);
        let result = run(self);
        self.env = saved;
        result
    }

    fn lookup(&self, name: &str) -> Result<Value, RuntimeError> {
        self.env.get(name).ok_or_else(|| unbound(name))
    }
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

fn unbound(name: &str) -> RuntimeError {
    if name == SELF {
        RuntimeError::SelfOutsideMethod
    } else {
        RuntimeError::UndefinedVariable {
            name: name.to_string(),
        }
    }
}
