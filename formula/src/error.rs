//! Error taxonomy shared by every interpreter layer.
//!
//! Each layer reports failures to its immediate caller; only the script
//! executor adds context (the 1-based line number) by wrapping the original
//! error in a [`ScriptError`].

use std::fmt;

use thiserror::Error;

/// Result alias used throughout the crate.
pub type Result<T, E = EvalError> = std::result::Result<T, E>;

/// A failure raised while tokenizing or evaluating an expression.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EvalError {
    /// Unmatched bracket or otherwise malformed input.
    #[error("syntax error: {0}")]
    Syntax(String),
    /// A bare token is neither a number nor a registered variable.
    #[error("undefined variable '{0}'")]
    UndefinedVariable(String),
    /// A token in unary position is not a registered operator.
    #[error("undefined operator '{0}'")]
    UndefinedOperator(String),
    /// `(`, `)` and `,` are punctuation and can never be operators.
    #[error("'{0}' is reserved punctuation and cannot be registered as an operator")]
    ReservedSymbol(String),
}

impl EvalError {
    pub(crate) fn syntax(msg: impl Into<String>) -> Self {
        EvalError::Syntax(msg.into())
    }

    /// The kind of this error, without its payload.
    pub fn kind(&self) -> ErrorKind {
        match self {
            EvalError::Syntax(_) => ErrorKind::Syntax,
            EvalError::UndefinedVariable(_) => ErrorKind::UndefinedVariable,
            EvalError::UndefinedOperator(_) => ErrorKind::UndefinedOperator,
            EvalError::ReservedSymbol(_) => ErrorKind::ReservedSymbol,
        }
    }
}

/// Payload-free classification of an [`EvalError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Syntax,
    UndefinedVariable,
    UndefinedOperator,
    ReservedSymbol,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ErrorKind::Syntax => "SyntaxError",
            ErrorKind::UndefinedVariable => "UndefinedVariableError",
            ErrorKind::UndefinedOperator => "UndefinedOperatorError",
            ErrorKind::ReservedSymbol => "ReservedSymbolError",
        })
    }
}

/// An error raised while executing one line of a script.
///
/// Execution stops at the failing line; `source` is the original error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind} on line {line}: {source}", kind = .source.kind())]
pub struct ScriptError {
    /// 1-based line number of the failing line.
    pub line: usize,
    pub source: EvalError,
}

impl ScriptError {
    pub fn kind(&self) -> ErrorKind {
        self.source.kind()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
