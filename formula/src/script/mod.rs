//! The formula interpreter stack.
//!
//! Three layers, each built on the one below:
//!
//! - [`Evaluator`]: tokenizer plus table-driven arithmetic reduction over a
//!   [`Registry`] of operators, functions and variables
//! - boolean conditions ([`Evaluator::evaluate_boolean`]): `&&`/`||`/`and`/`or`
//!   reduced on top of the evaluator
//! - [`Interpreter`]: line scripts with `if`/`else if`/`else`/`end if` chains
//!   and a `print` statement feeding a [`LogSink`]
//!
//! # Quick start
//!
//! ```rust
//! use formula::script::Interpreter;
//!
//! let mut interp = Interpreter::new();
//! let result = interp
//!     .run_multiline("let x = 6\nif x > 5\nx * 7\nelse\n0\nend if")
//!     .unwrap();
//! assert_eq!(result, 42.0);
//!
//! let ev = interp.evaluator();
//! assert_eq!(ev.evaluate("3(7+3)").unwrap(), 30.0);
//! ```

pub mod boolean;
pub mod builtins;
pub mod expr;
pub mod interp;
pub mod lexer;
pub mod log;
pub mod registry;
pub mod value;

// Re-exports for convenience.
pub use expr::Evaluator;
pub use interp::Interpreter;
pub use log::{LogSink, MultilineLog, NullLog};
pub use registry::{Function, Operator, OperatorTable, Registry, SymbolTable};
pub use value::{to_boolean, to_double, to_truthy};
