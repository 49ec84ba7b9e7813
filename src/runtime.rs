//! Runtime value model shared by the evaluator and the builtin library.
pub mod callable;
pub mod class;
pub mod dict;
pub mod environment;
pub mod error;
pub mod generator;
pub mod value;

pub use callable::{Builtin, Function, NativeFunction};
pub use class::{Class, Instance};
pub use dict::Dict;
pub use environment::{Env, Environment};
pub use error::RuntimeError;
pub use generator::{Generator, Sequence};
pub use value::Value;
