//! An embeddable interpreter for user-supplied formulas.
//!
//! Arithmetic with pluggable operators, functions and variables, boolean
//! conditions on top of it, and small line scripts with `if` chains and a
//! `print` statement.  See [`script`] for the interpreter itself.

pub mod cli;
pub mod config;
pub mod error;
pub mod script;

pub use config::Options;
pub use error::{ErrorKind, EvalError, ScriptError};
pub use script::{Evaluator, Interpreter};
