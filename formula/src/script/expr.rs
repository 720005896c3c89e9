//! Expression evaluator.
//!
//! Evaluation works directly on the token list rather than on a tree:
//!
//! 1. every token naming a variable is replaced by its value (once);
//! 2. the innermost-rightmost `( … )` group is reduced and spliced back in
//!    as a single number, repeatedly, until no group remains.  A group
//!    directly after a registered function name becomes that function's
//!    comma-separated argument list;
//! 3. the remaining flat run is reduced by exhausting each operator, leftmost
//!    occurrence first, in operator-table order.
//!
//! Intermediate results stay as `f64` in the token list, so nothing is lost
//! to re-serialization between steps.

use std::borrow::Cow;
use std::sync::LazyLock;

use regex::Regex;
use tracing::{debug, trace};

use super::builtins;
use super::lexer;
use super::registry::{Function, Registry};
use super::value::{format_number, parse_number};
use crate::config::Options;
use crate::error::{EvalError, Result};

static BLOCK_COMMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)#\{.*?\}#").expect("static pattern"));
static LINE_COMMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)#.*$").expect("static pattern"));
static SQRT_TYPO: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(sqr|sqrt)\b").expect("static pattern"));
static ATAN2_TYPO: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(atan2|arctan2)\b").expect("static pattern"));
static BE_KEYWORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\bbe\b").expect("static pattern"));

// ── Slot ──────────────────────────────────────────────────────────────────────

/// One entry of the working token list.
#[derive(Debug, Clone, PartialEq)]
enum Slot {
    /// Operator, punctuation, or an identifier that is not a variable.
    Sym(String),
    Num(f64),
}

impl Slot {
    fn is(&self, sym: &str) -> bool {
        matches!(self, Slot::Sym(s) if s == sym)
    }
}

fn is_punctuation(sym: &str) -> bool {
    matches!(sym, "(" | ")" | ",")
}

// ── Evaluator ─────────────────────────────────────────────────────────────────

/// Arithmetic evaluator owning its symbol registry.
#[derive(Debug, Clone)]
pub struct Evaluator {
    registry: Registry,
    declarator: String,
}

impl Default for Evaluator {
    fn default() -> Self {
        Self::new()
    }
}

impl Evaluator {
    /// An evaluator with the reference operators, functions and constants.
    pub fn new() -> Self {
        Self::with_options(&Options::default())
    }

    /// An evaluator whose built-in sets and declarator follow `opts`.
    pub fn with_options(opts: &Options) -> Self {
        let mut registry = Registry::new();
        if opts.load_operators {
            builtins::install_operators(&mut registry.operators);
        }
        if opts.load_functions {
            builtins::install_functions(&mut registry);
        }
        if opts.load_constants {
            builtins::install_constants(&mut registry);
        }
        Evaluator {
            registry,
            declarator: opts.declarator.to_lowercase(),
        }
    }

    /// An evaluator over a caller-built registry.
    pub fn from_registry(registry: Registry) -> Self {
        Evaluator {
            registry,
            declarator: Options::default().declarator,
        }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut Registry {
        &mut self.registry
    }

    /// Keyword that introduces a variable declaration (`let` by default).
    pub fn declarator(&self) -> &str {
        &self.declarator
    }

    /// Change the declarator.  Stored lowercased, since script lines are.
    pub fn set_declarator(&mut self, keyword: impl Into<String>) {
        self.declarator = keyword.into().to_lowercase();
    }

    /// Tokenize `text` against the current operator table.
    ///
    /// The result may be cached and fed to [`evaluate_tokens`] later; doing
    /// so is equivalent to evaluating `text` against the same registry.
    ///
    /// [`evaluate_tokens`]: Evaluator::evaluate_tokens
    pub fn tokenize(&self, text: &str) -> Vec<String> {
        lexer::tokenize(text, &self.registry.operators)
    }

    /// Evaluate an arithmetic expression.
    pub fn evaluate(&self, text: &str) -> Result<f64> {
        self.evaluate_tokens(&self.tokenize(text))
    }

    /// Evaluate a previously tokenized expression.
    pub fn evaluate_tokens(&self, tokens: &[String]) -> Result<f64> {
        let mut slots: Vec<Slot> = tokens.iter().map(|t| self.substitute(t)).collect();

        while let Some(open) = slots.iter().rposition(|s| s.is("(")) {
            let close = slots[open + 1..]
                .iter()
                .position(|s| s.is(")"))
                .map(|i| open + 1 + i)
                .ok_or_else(|| EvalError::syntax("unmatched '('"))?;

            let inner = &slots[open + 1..close];
            let func = open.checked_sub(1).and_then(|i| self.function_at(&slots[i]));
            let (start, value) = match func {
                Some(f) => {
                    let args = self.arguments(inner)?;
                    trace!(?args, "function call");
                    (open - 1, f(&args))
                }
                None => (open, self.reduce(inner.to_vec())?),
            };
            slots.splice(start..=close, [Slot::Num(value)]);
        }

        if slots.iter().any(|s| s.is(")")) {
            return Err(EvalError::syntax("unmatched ')'"));
        }
        self.reduce(slots)
    }

    /// Evaluate `text`, honouring declarations and the optional rewrites.
    ///
    /// * `strip_comments` removes `#{ … }#` blocks and `# …` to end of line;
    /// * `correct` rewrites `sqr` to `sqrt` and `atan2` to `arctan2`;
    /// * `let NAME = EXPR`, `let NAME be EXPR` and `NAME := EXPR` store the
    ///   value of `EXPR` under `NAME` (inserting or overwriting) and return it.
    pub fn evaluate_with_declarations(
        &mut self,
        text: &str,
        correct: bool,
        strip_comments: bool,
    ) -> Result<f64> {
        let mut text = Cow::Borrowed(text);
        if strip_comments {
            text = Cow::Owned(self::strip_comments(&text).into_owned());
        }
        if correct {
            text = Cow::Owned(correct_typos(&text).into_owned());
        }

        match self.declaration(&text)? {
            Some((name, expr)) => {
                let value = self.evaluate(expr)?;
                debug!(%name, value, "declare");
                self.registry.variables.insert(name, value);
                Ok(value)
            }
            None => self.evaluate(&text),
        }
    }

    // ── Internals ─────────────────────────────────────────────────────────────

    fn substitute(&self, token: &str) -> Slot {
        if let Some(v) = self.registry.variable(token) {
            return Slot::Num(v);
        }
        match parse_number(token) {
            Some(n) => Slot::Num(n),
            None => Slot::Sym(token.to_string()),
        }
    }

    fn function_at(&self, slot: &Slot) -> Option<&Function> {
        match slot {
            Slot::Sym(name) => self.registry.functions.get(name),
            Slot::Num(_) => None,
        }
    }

    /// Reduce each comma-separated argument.  `f()` passes a single `0`; a
    /// trailing comma adds nothing.
    fn arguments(&self, inner: &[Slot]) -> Result<Vec<f64>> {
        let mut pieces: Vec<&[Slot]> = inner.split(|s| s.is(",")).collect();
        if pieces.len() > 1 && pieces.last().is_some_and(|p| p.is_empty()) {
            pieces.pop();
        }
        pieces
            .into_iter()
            .map(|arg| self.reduce(arg.to_vec()))
            .collect()
    }

    /// Reduce a parenthesis-free run of slots to one number.
    fn reduce(&self, mut slots: Vec<Slot>) -> Result<f64> {
        match slots.as_slice() {
            [] => return Ok(0.0),
            [only] => return literal(only),
            [Slot::Sym(op), val] if op == "+" || op == "-" => {
                let v = literal(val)?;
                return Ok(if op == "-" && !v.is_sign_negative() { -v } else { v });
            }
            [head, val] => {
                let op = slot_text(head);
                let f = self
                    .registry
                    .operators
                    .get(&op)
                    .ok_or(EvalError::UndefinedOperator(op))?;
                return Ok(f(0.0, literal(val)?));
            }
            _ => {}
        }

        for (sym, f) in self.registry.operators.iter() {
            while let Some(i) = slots.iter().position(|s| s.is(sym)) {
                let right = slots
                    .get(i + 1)
                    .ok_or_else(|| EvalError::syntax(format!("missing operand after '{sym}'")))
                    .and_then(|s| self.operand(s))?;
                if i == 0 {
                    slots.splice(0..=1, [Slot::Num(f(0.0, right))]);
                } else {
                    let left = self.operand(&slots[i - 1])?;
                    slots.splice(i - 1..=i + 1, [Slot::Num(f(left, right))]);
                }
            }
        }

        match slots.as_slice() {
            [] => Ok(0.0),
            [only] => self.operand(only),
            [first, extra, ..] => {
                self.operand(first)?;
                Err(EvalError::syntax(format!("unexpected '{}'", slot_text(extra))))
            }
        }
    }

    fn operand(&self, slot: &Slot) -> Result<f64> {
        match slot {
            Slot::Num(n) => Ok(*n),
            Slot::Sym(s) if is_punctuation(s) || self.registry.is_operator(s) => {
                Err(EvalError::syntax(format!("unexpected '{s}'")))
            }
            Slot::Sym(s) => Err(EvalError::UndefinedVariable(s.clone())),
        }
    }

    /// Split a declaration into its variable name and expression.
    fn declaration<'t>(&self, text: &'t str) -> Result<Option<(String, &'t str)>> {
        let text = text.trim();
        let keyword = self.declarator.as_str();

        if let Some(rest) = text
            .strip_prefix(keyword)
            .filter(|r| !keyword.is_empty() && r.starts_with(char::is_whitespace))
        {
            let candidates = [
                rest.find(":=").map(|i| (i, 2)),
                rest.find('=').map(|i| (i, 1)),
                BE_KEYWORD.find(rest).map(|m| (m.start(), 2)),
            ];
            let Some((at, len)) = candidates.into_iter().flatten().min() else {
                return Err(EvalError::syntax(format!(
                    "'{keyword}' declaration needs '=', ':=' or 'be'"
                )));
            };
            let name = checked_name(&rest[..at])?;
            return Ok(Some((name, &rest[at + len..])));
        }

        match text.split_once(":=") {
            Some((name, expr)) => Ok(Some((checked_name(name)?, expr))),
            None => Ok(None),
        }
    }
}

fn slot_text(slot: &Slot) -> String {
    match slot {
        Slot::Sym(s) => s.clone(),
        Slot::Num(n) => format_number(*n),
    }
}

/// The value of a lone token.
fn literal(slot: &Slot) -> Result<f64> {
    match slot {
        Slot::Num(n) => Ok(*n),
        Slot::Sym(s) => Err(EvalError::UndefinedVariable(s.clone())),
    }
}

fn checked_name(raw: &str) -> Result<String> {
    let name = raw.trim();
    let mut chars = name.chars();
    let valid = chars.next().is_some_and(char::is_alphabetic) && chars.all(char::is_alphanumeric);
    if valid {
        Ok(name.to_string())
    } else if name.is_empty() {
        Err(EvalError::syntax("declaration is missing a variable name"))
    } else {
        Err(EvalError::syntax(format!("'{name}' is not a valid variable name")))
    }
}

/// Remove `#{ … }#` blocks, then `# …` to end of line.
pub fn strip_comments(text: &str) -> Cow<'_, str> {
    match BLOCK_COMMENT.replace_all(text, "") {
        Cow::Borrowed(t) => LINE_COMMENT.replace_all(t, ""),
        Cow::Owned(t) => Cow::Owned(LINE_COMMENT.replace_all(&t, "").into_owned()),
    }
}

/// Normalize common function-name typos.
pub fn correct_typos(text: &str) -> Cow<'_, str> {
    match SQRT_TYPO.replace_all(text, "sqrt") {
        Cow::Borrowed(t) => ATAN2_TYPO.replace_all(t, "arctan2"),
        Cow::Owned(t) => Cow::Owned(ATAN2_TYPO.replace_all(&t, "arctan2").into_owned()),
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
