//! Expression tokenizer.
//!
//! Turns source text into a flat list of lexemes: numeric literals,
//! identifiers, and single-character operators or punctuation.  Two-character
//! relational operators are folded into private-use sentinel characters first
//! so the scanner only ever deals in single characters.
//!
//! The scanner is context-sensitive in two ways:
//!
//! * juxtaposition is multiplication: an identifier or `(` directly after a
//!   digit or `)` gets an implicit `*` in front of it (`3x`, `2(1+1)`,
//!   `(2)(3)`);
//! * a `+`/`-` directly before a digit is folded into a signed literal when it
//!   sits in unary position (start of input, after `(`, or after a token that
//!   is a *registered* operator).  The last rule consults the operator table,
//!   so removing `-` from the table changes how `2*-3` lexes.

use super::registry::OperatorTable;
use super::value;

/// `>=`
pub const GE: char = '\u{E000}';
/// `<=`
pub const LE: char = '\u{E001}';
/// `!=`
pub const NE: char = '\u{E002}';
/// `==`
pub const EQ: char = '\u{E003}';

/// Fold sign runs and two-character relational operators.
///
/// Each rewrite is a single left-to-right pass, so `---1` becomes `+-1`
/// after the `--` pass and stays that way.
pub fn normalize(src: &str) -> String {
    let mut out = src.replace("+-", "-").replace("-+", "-").replace("--", "+");
    for (pair, sentinel) in [("==", EQ), (">=", GE), ("<=", LE), ("!=", NE)] {
        out = out.replace(pair, &sentinel.to_string());
    }
    out
}

/// Tokenize `src` against the given operator table.
pub fn tokenize(src: &str, operators: &OperatorTable) -> Vec<String> {
    let normalized = normalize(src);
    let mut lexer = Lexer::new(&normalized, operators);
    lexer.run();
    lexer.tokens
}

// ── Lexer ─────────────────────────────────────────────────────────────────────

struct Lexer<'a> {
    src: Vec<char>,
    pos: usize,
    operators: &'a OperatorTable,
    tokens: Vec<String>,
}

impl<'a> Lexer<'a> {
    fn new(src: &str, operators: &'a OperatorTable) -> Self {
        Lexer {
            src: src.chars().collect(),
            pos: 0,
            operators,
            tokens: Vec::new(),
        }
    }

    fn peek(&self) -> Option<char> {
        self.src.get(self.pos).copied()
    }

    fn peek2(&self) -> Option<char> {
        self.src.get(self.pos + 1).copied()
    }

    /// The raw character just before the cursor.
    fn prev(&self) -> Option<char> {
        self.pos.checked_sub(1).and_then(|i| self.src.get(i).copied())
    }

    fn advance(&mut self) -> Option<char> {
        let ch = self.peek();
        if ch.is_some() {
            self.pos += 1;
        }
        ch
    }

    fn run(&mut self) {
        while let Some(ch) = self.peek() {
            if ch.is_whitespace() {
                self.pos += 1;
            } else if ch.is_alphabetic() {
                self.implicit_mul();
                let ident = self.take_while(char::is_alphanumeric);
                self.tokens.push(ident);
            } else if ch.is_ascii_digit() || ch == '.' {
                let num = self.take_while(is_number_char);
                self.tokens.push(num);
            } else if (ch == '+' || ch == '-')
                && self.peek2().is_some_and(|c| c.is_ascii_digit())
                && self.unary_position()
            {
                self.pos += 1;
                let digits = self.take_while(is_number_char);
                self.tokens.push(format!("{ch}{digits}"));
            } else if ch == '(' {
                self.implicit_mul();
                self.pos += 1;
                self.tokens.push("(".into());
            } else {
                self.pos += 1;
                self.tokens.push(ch.to_string());
            }
        }
    }

    fn take_while(&mut self, pred: impl Fn(char) -> bool) -> String {
        let mut out = String::new();
        while let Some(c) = self.peek() {
            if !pred(c) {
                break;
            }
            out.push(c);
            self.advance();
        }
        out
    }

    fn implicit_mul(&mut self) {
        if self
            .prev()
            .is_some_and(|c| c.is_ascii_digit() || c == ')' || value::is_mark(c))
        {
            self.tokens.push("*".into());
        }
    }

    fn unary_position(&self) -> bool {
        match self.tokens.last() {
            None => true,
            Some(t) => t == "(" || self.operators.contains(t),
        }
    }
}

fn is_number_char(c: char) -> bool {
    c.is_ascii_digit() || c == '.'
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn ops() -> OperatorTable {
        let mut t = OperatorTable::new();
        for sym in ["^", "*", "/", "-", "+", "<"] {
            t.insert(sym, |a, _| a).unwrap();
        }
        t
    }

    fn lex(src: &str) -> Vec<String> {
        tokenize(src, &ops())
    }

    #[test]
    fn splits_numbers_identifiers_and_operators() {
        assert_eq!(lex("12 + x1*sin(.5)"), ["12", "+", "x1", "*", "sin", "(", ".5", ")"]);
    }

    #[test]
    fn juxtaposition_inserts_multiplication() {
        assert_eq!(lex("3x"), ["3", "*", "x"]);
        assert_eq!(lex("3(7)"), ["3", "*", "(", "7", ")"]);
        assert_eq!(lex("(2)(3)"), ["(", "2", ")", "*", "(", "3", ")"]);
        assert_eq!(lex("2pi"), ["2", "*", "pi"]);
    }

    #[test]
    fn non_finite_marks_act_like_numbers() {
        let inf = value::INFINITY_MARK.to_string();
        assert_eq!(lex(&format!("{inf}x")), [inf.as_str(), "*", "x"]);
        assert_eq!(lex(&format!("2-{inf}")), ["2", "-", inf.as_str()]);
    }

    #[test]
    fn implicit_multiplication_looks_at_raw_previous_char() {
        assert_eq!(lex("3 x"), ["3", "x"]);
    }

    #[test]
    fn signs_fold_in_unary_position() {
        assert_eq!(lex("-1+1"), ["-1", "+", "1"]);
        assert_eq!(lex("(-2)"), ["(", "-2", ")"]);
        assert_eq!(lex("10^-4"), ["10", "^", "-4"]);
        assert_eq!(lex("2-3"), ["2", "-", "3"]);
        assert_eq!(lex("x-3"), ["x", "-", "3"]);
        assert_eq!(lex("-x"), ["-", "x"]);
    }

    #[test]
    fn sign_detection_follows_operator_table() {
        let mut t = ops();
        t.remove("*");
        assert_eq!(tokenize("2*-3", &t), ["2", "*", "-", "3"]);
        assert_eq!(tokenize("2*-3", &ops()), ["2", "*", "-3"]);
    }

    #[test]
    fn sign_runs_are_normalized() {
        assert_eq!(lex("--1"), ["+1"]);
        assert_eq!(lex("2+-1"), ["2", "-", "1"]);
        assert_eq!(lex("2-+1"), ["2", "-", "1"]);
    }

    #[test]
    fn relational_pairs_become_sentinels() {
        let eq = EQ.to_string();
        let ge = GE.to_string();
        assert_eq!(lex("1==1"), ["1", eq.as_str(), "1"]);
        assert_eq!(lex("x>=4"), ["x", ge.as_str(), "4"]);
        assert_eq!(normalize("a<=b!=c"), format!("a{LE}b{NE}c"));
    }

    #[test]
    fn numbers_are_greedy() {
        assert_eq!(lex("1.2.3"), ["1.2.3"]);
        assert_eq!(lex("..5"), ["..5"]);
    }

    #[test]
    fn empty_and_blank_input() {
        assert!(lex("").is_empty());
        assert!(lex("  \t ").is_empty());
    }
}
