//! Boolean conditions on top of the arithmetic evaluator.
//!
//! A condition is rewritten into a canonical form (`&` for and, `|` for or,
//! `1`/`0` for the literals), bracketed sub-conditions are reduced
//! recursively, and the `&`/`|`-separated segments are evaluated as ordinary
//! expressions.  `&` binds tighter than `|`.

use std::borrow::Cow;
use std::sync::LazyLock;

use regex::Regex;
use tracing::trace;

use super::expr::{self, Evaluator};
use super::value::{self, to_boolean, to_double, to_literal, to_truthy};
use crate::error::{EvalError, Result};

static REWRITES: LazyLock<[(Regex, &'static str); 4]> = LazyLock::new(|| {
    [
        (r"(?i)\btrue\b", "1"),
        (r"(?i)\bfalse\b", "0"),
        (r"(?i)\band\b", "&"),
        (r"(?i)\bor\b", "|"),
    ]
    .map(|(pattern, with)| (Regex::new(pattern).expect("static pattern"), with))
});

#[derive(Debug, Clone, Copy, PartialEq)]
enum Logic {
    Num(f64),
    And,
    Or,
}

impl Evaluator {
    /// Evaluate a boolean condition to `1.0` or `0.0`.
    ///
    /// Comments are stripped and spelling fixes applied, as with
    /// [`evaluate_with_declarations`](Evaluator::evaluate_with_declarations).
    pub fn evaluate_boolean(&mut self, text: &str) -> Result<f64> {
        self.evaluate_boolean_with(text, true, true)
    }

    /// [`evaluate_boolean`](Evaluator::evaluate_boolean) with the comment and
    /// spelling rewrites chosen by the caller.  Both run once over the whole
    /// condition before it is split.
    pub fn evaluate_boolean_with(
        &mut self,
        text: &str,
        correct: bool,
        strip_comments: bool,
    ) -> Result<f64> {
        let mut text = Cow::Borrowed(text);
        if strip_comments {
            text = Cow::Owned(expr::strip_comments(&text).into_owned());
        }
        if correct {
            text = Cow::Owned(expr::correct_typos(&text).into_owned());
        }
        self.condition_value(&text).map(to_truthy)
    }

    /// The raw value of a condition.  A condition without `&`/`|` keeps its
    /// arithmetic value so that `(0.5 * 12) / 6` still means `1`.
    fn condition_value(&mut self, text: &str) -> Result<f64> {
        let text = canonical(text);
        let text = self.substitute_groups(&text)?;
        trace!(%text, "condition");

        let mut tokens = Vec::new();
        let mut start = 0;
        for (i, c) in text.char_indices() {
            let op = match c {
                '&' => Logic::And,
                '|' => Logic::Or,
                _ => continue,
            };
            tokens.push(Logic::Num(self.segment(&text[start..i])?));
            tokens.push(op);
            start = i + 1;
        }
        tokens.push(Logic::Num(self.segment(&text[start..])?));
        reduce(tokens)
    }

    fn segment(&mut self, text: &str) -> Result<f64> {
        self.evaluate_with_declarations(text.trim(), false, false)
    }

    /// Replace each top-level `( … )` with its value, left to right.
    ///
    /// A group right after a letter, digit, `)` or substituted value is a
    /// function call or an implicit multiplication and is left for the arithmetic evaluator.
    fn substitute_groups(&mut self, text: &str) -> Result<String> {
        let mut out = String::with_capacity(text.len());
        let mut rest = text;
        while let Some(open) = rest.find('(') {
            let close = matching_close(rest, open)?;
            out.push_str(&rest[..open]);
            let attached = out
                .chars()
                .next_back()
                .is_some_and(|c| c.is_alphanumeric() || c == ')' || value::is_mark(c));
            if attached {
                out.push_str(&rest[open..=close]);
            } else {
                let value = self.condition_value(&rest[open + 1..close])?;
                out.push_str(&to_literal(value));
            }
            rest = &rest[close + 1..];
        }
        out.push_str(rest);
        Ok(out)
    }
}

/// Rewrite logical spellings into `&`, `|`, `1` and `0`.
fn canonical(text: &str) -> String {
    let mut text = text.replace("&&", "&").replace("||", "|");
    for (re, with) in REWRITES.iter() {
        text = re.replace_all(&text, *with).into_owned();
    }
    text.trim().to_string()
}

/// Byte index of the `)` closing the `(` at `open`.
fn matching_close(text: &str, open: usize) -> Result<usize> {
    let mut depth = 0usize;
    for (i, c) in text[open..].char_indices() {
        match c {
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth == 0 {
                    return Ok(open + i);
                }
            }
            _ => {}
        }
    }
    Err(EvalError::syntax("brackets don't match"))
}

fn reduce(mut tokens: Vec<Logic>) -> Result<f64> {
    for op in [Logic::And, Logic::Or] {
        while let Some(i) = tokens.iter().position(|t| *t == op) {
            let left = i.checked_sub(1).and_then(|j| tokens.get(j));
            let (Some(&Logic::Num(a)), Some(&Logic::Num(b))) = (left, tokens.get(i + 1)) else {
                return Err(EvalError::syntax("logical operator is missing an operand"));
            };
            let v = match op {
                Logic::And => to_boolean(a) && to_boolean(b),
                _ => to_boolean(a) || to_boolean(b),
            };
            tokens.splice(i - 1..=i + 1, [Logic::Num(to_double(v))]);
        }
    }
    match tokens.as_slice() {
        [Logic::Num(v)] => Ok(*v),
        _ => Err(EvalError::syntax("malformed condition")),
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
