//! kotoba: an indentation-based scripting language with Japanese keywords.
//!
//! Source flows through [`lexer`] (tokens, including block starts and ends
//! derived from indentation), [`parser`] (syntax tree in [`ast`]) and
//! [`interpreter`], which evaluates the tree against the [`runtime`] value
//! model.

pub mod ast;
pub mod builtins;
pub mod config;
pub mod diagnostic;
pub mod interpreter;
pub mod lexer;
pub mod logging;
pub mod parser;
pub mod runtime;
pub mod stack;
pub mod token;

pub use config::Config;
pub use diagnostic::{Diagnostic, Phase};
pub use interpreter::Interpreter;
pub use parser::{parse, parse_expression};
pub use runtime::Value;
