//! Numeric values: literal parsing, formatting and truthiness.
//!
//! Every value in the interpreter is an `f64`.  Intermediate results are
//! written back into expression text by the boolean layer, so that text must
//! round-trip exactly: `parse_number(&to_literal(x))` gives back `x` for every
//! `x`, infinities and NaN included.

/// Values closer to zero than this are falsy.
pub const EPSILON: f64 = 1e-8;

/// Parse a numeric literal token.
///
/// Accepts an optional leading sign followed by digits with at most the
/// decimal points Rust's float grammar allows (`"5"`, `"-2.5"`, `".5"`,
/// `"5."`).  Anything containing letters (`inf` and `nan` included) is
/// rejected so identifiers never masquerade as numbers.  The one-character
/// marks written by [`to_literal`] for non-finite values are accepted.
pub fn parse_number(token: &str) -> Option<f64> {
    let mut chars = token.chars();
    if let (Some(c), None) = (chars.next(), chars.next()) {
        if let Some(v) = mark_value(c) {
            return Some(v);
        }
    }
    let body = token.strip_prefix(['+', '-']).unwrap_or(token);
    if !body.bytes().any(|b| b.is_ascii_digit())
        || !body.bytes().all(|b| b.is_ascii_digit() || b == b'.')
    {
        return None;
    }
    token.parse().ok()
}

/// Format a value as literal text.
///
/// Uses the shortest representation that parses back to the same `f64`,
/// never exponent notation.
pub fn format_number(value: f64) -> String {
    value.to_string()
}

// Private-use stand-ins for the values `format_number` cannot spell as a
// literal.  The lexer emits each as a token of its own.
pub(crate) const INFINITY_MARK: char = '\u{E010}';
pub(crate) const NEG_INFINITY_MARK: char = '\u{E011}';
pub(crate) const NAN_MARK: char = '\u{E012}';

fn mark_value(c: char) -> Option<f64> {
    match c {
        INFINITY_MARK => Some(f64::INFINITY),
        NEG_INFINITY_MARK => Some(f64::NEG_INFINITY),
        NAN_MARK => Some(f64::NAN),
        _ => None,
    }
}

/// `true` for a non-finite value mark.
pub(crate) fn is_mark(c: char) -> bool {
    mark_value(c).is_some()
}

/// Write a value back into expression text.
///
/// Finite values use [`format_number`]; infinities and NaN use marks that
/// [`parse_number`] reads back.
pub(crate) fn to_literal(value: f64) -> String {
    if value.is_nan() {
        NAN_MARK.to_string()
    } else if value == f64::INFINITY {
        INFINITY_MARK.to_string()
    } else if value == f64::NEG_INFINITY {
        NEG_INFINITY_MARK.to_string()
    } else {
        format_number(value)
    }
}

/// `true` for any value farther than [`EPSILON`] from zero (NaN included).
pub fn to_boolean(value: f64) -> bool {
    !approx_eq(value, 0.0)
}

/// Encode a boolean as `1.0` / `0.0`.
pub fn to_double(value: bool) -> f64 {
    if value {
        1.0
    } else {
        0.0
    }
}

/// Collapse any value to `1.0` (truthy) or `0.0` (falsy).
pub fn to_truthy(value: f64) -> f64 {
    to_double(to_boolean(value))
}

/// Epsilon equality used by the relational operators and truthiness.
pub fn approx_eq(a: f64, b: f64) -> bool {
    (a - b).abs() < EPSILON
}

// ── Tests ─────────────────────────────────────────────────────────────────────
