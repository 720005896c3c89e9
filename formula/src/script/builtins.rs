//! The reference operator table, built-in functions and constants.
//!
//! Each set is installed independently so a host can start from an empty
//! registry and add only what it needs.  Functions receive their already
//! evaluated arguments as a slice; a missing argument reads as `0`.

use std::f64::consts;

use super::lexer::{EQ, GE, LE, NE};
use super::registry::{OperatorTable, Registry};
use super::value::{approx_eq, to_double};

// ── Operators ─────────────────────────────────────────────────────────────────

/// Install the reference operators.
///
/// Registration order is reduction order:
/// `^ % : / * - + > < >= <= != == =`.
pub fn install_operators(ops: &mut OperatorTable) {
    ops.insert_builtin("^", f64::powf);
    ops.insert_builtin("%", |a, b| a % b);
    ops.insert_builtin(":", divide);
    ops.insert_builtin("/", divide);
    ops.insert_builtin("*", |a, b| a * b);
    ops.insert_builtin("-", |a, b| a - b);
    ops.insert_builtin("+", |a, b| a + b);
    ops.insert_builtin(">", |a, b| to_double(a > b));
    ops.insert_builtin("<", |a, b| to_double(a < b));
    ops.insert_builtin(GE.to_string(), |a, b| to_double(a > b || approx_eq(a, b)));
    ops.insert_builtin(LE.to_string(), |a, b| to_double(a < b || approx_eq(a, b)));
    ops.insert_builtin(NE.to_string(), |a, b| to_double(!approx_eq(a, b)));
    ops.insert_builtin(EQ.to_string(), |a, b| to_double(approx_eq(a, b)));
    ops.insert_builtin("=", |a, b| to_double(approx_eq(a, b)));
}

/// Division with an exactly-zero denominator mapped by numerator sign.
fn divide(a: f64, b: f64) -> f64 {
    if b == 0.0 {
        if a > 0.0 {
            f64::INFINITY
        } else if a < 0.0 {
            f64::NEG_INFINITY
        } else {
            f64::NAN
        }
    } else {
        a / b
    }
}

// ── Functions ─────────────────────────────────────────────────────────────────

/// Install the built-in function set.
pub fn install_functions(reg: &mut Registry) {
    unary(reg, &["abs"], f64::abs);

    unary(reg, &["cos"], f64::cos);
    unary(reg, &["cosh"], f64::cosh);
    unary(reg, &["acos", "arccos"], f64::acos);

    unary(reg, &["sin"], f64::sin);
    unary(reg, &["sinh"], f64::sinh);
    unary(reg, &["asin", "arcsin"], f64::asin);

    unary(reg, &["tan"], f64::tan);
    unary(reg, &["tanh"], f64::tanh);
    unary(reg, &["atan", "arctan"], f64::atan);
    binary(reg, "arctan2", f64::atan2);

    unary(reg, &["sqrt"], f64::sqrt);
    binary(reg, "pow", f64::powf);
    binary(reg, "root", |x, n| x.powf(1.0 / n));
    binary(reg, "rem", ieee_remainder);

    unary(reg, &["exp"], f64::exp);
    reg.add_function("log", |args| match args {
        [x] => x.ln(),
        [x, base] => x.ln() / base.ln(),
        _ => 0.0,
    });
    unary(reg, &["ln"], f64::ln);
    unary(reg, &["log10"], f64::log10);

    unary(reg, &["round"], f64::round_ties_even);
    unary(reg, &["truncate"], f64::trunc);
    unary(reg, &["floor"], f64::floor);
    unary(reg, &["ceiling", "ceil"], f64::ceil);
    unary(reg, &["sign"], sign);

    binary(reg, "min", f64::min);
    binary(reg, "max", f64::max);
}

fn unary(reg: &mut Registry, names: &[&str], f: fn(f64) -> f64) {
    for name in names {
        reg.add_function(*name, move |args| f(arg(args, 0)));
    }
}

fn binary(reg: &mut Registry, name: &str, f: fn(f64, f64) -> f64) {
    reg.add_function(name, move |args| f(arg(args, 0), arg(args, 1)));
}

fn arg(args: &[f64], idx: usize) -> f64 {
    args.get(idx).copied().unwrap_or(0.0)
}

/// `x - y * round_half_even(x / y)`.
fn ieee_remainder(x: f64, y: f64) -> f64 {
    x - y * (x / y).round_ties_even()
}

fn sign(x: f64) -> f64 {
    if x > 0.0 {
        1.0
    } else if x < 0.0 {
        -1.0
    } else {
        0.0
    }
}

// ── Constants ─────────────────────────────────────────────────────────────────

/// Install the predefined constants as ordinary variables.
pub fn install_constants(reg: &mut Registry) {
    let phi = (1.0 + 5f64.sqrt()) / 2.0;
    for (name, value) in [
        ("pi", consts::PI),
        ("pi2", consts::TAU),
        ("pi05", consts::FRAC_PI_2),
        ("pi025", consts::FRAC_PI_4),
        ("pi0125", consts::FRAC_PI_8),
        ("pitograd", 180.0 / consts::PI),
        ("piofgrad", consts::PI / 180.0),
        ("e", consts::E),
        ("phi", phi),
        ("major", phi - 1.0),
        ("minor", 2.0 - phi),
    ] {
        reg.set_variable(name, value);
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
