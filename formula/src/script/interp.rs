//! Line-oriented script executor.
//!
//! The [`Interpreter`] runs a script one line at a time against its
//! [`Evaluator`].  Each line is trimmed and lowercased, then classified:
//!
//! | Line | Action |
//! |------|--------|
//! | blank (or comment only) | skipped |
//! | `if <cond>` | open a conditional chain |
//! | `else if <cond>` / `elif <cond>` | next branch of the chain |
//! | `else` | last branch of the chain |
//! | `end if` / `endif` | close the chain |
//! | `print …` | render and send to the [`LogSink`] |
//! | anything else | evaluate (declarations allowed); becomes the result |
//!
//! Chains nest.  Every open `if` pushes one [`Chain`] state; a branch runs
//! only when the innermost state is `Executing`.

use tracing::{debug, trace};

use super::expr::{self, Evaluator};
use super::log::{LogSink, NullLog};
use super::value::format_number;
use crate::config::Options;
use crate::error::{EvalError, Result, ScriptError};

// ── Chain state ───────────────────────────────────────────────────────────────

/// State of one open conditional chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Chain {
    /// No branch has run yet; a later `else if`/`else` may.
    NotExecuted,
    /// The current branch is running.
    Executing,
    /// A branch already ran, or the whole chain is suppressed.
    Executed,
}

// ── Line classification ───────────────────────────────────────────────────────

#[derive(Debug, PartialEq)]
enum Line<'a> {
    Blank,
    If(&'a str),
    ElseIf(&'a str),
    Else,
    EndIf,
    Print(&'a str),
    Expr(&'a str),
}

/// Strip `word` from the front of `line` when it stands alone as a word.
fn keyword<'a>(line: &'a str, word: &str) -> Option<&'a str> {
    let rest = line.strip_prefix(word)?;
    match rest.chars().next() {
        Some(c) if c.is_alphanumeric() => None,
        _ => Some(rest.trim()),
    }
}

fn classify<'a>(line: &'a str, print_keyword: &str) -> Result<Line<'a>> {
    if line.is_empty() {
        return Ok(Line::Blank);
    }
    if let Some(cond) = keyword(line, "if") {
        return Ok(Line::If(cond));
    }
    if let Some(cond) = keyword(line, "elif") {
        return Ok(Line::ElseIf(cond));
    }
    if let Some(rest) = keyword(line, "else") {
        if rest.is_empty() {
            return Ok(Line::Else);
        }
        return match keyword(rest, "if") {
            Some(cond) => Ok(Line::ElseIf(cond)),
            None => Err(EvalError::syntax(format!("unexpected '{rest}' after 'else'"))),
        };
    }
    if line == "endif" || line.split_whitespace().eq(["end", "if"]) {
        return Ok(Line::EndIf);
    }
    if let Some(arg) = line.strip_prefix(print_keyword) {
        if !print_keyword.is_empty() && arg.starts_with([' ', '\t', '(', '"']) {
            return Ok(Line::Print(arg.trim()));
        }
    }
    Ok(Line::Expr(line))
}

// ── Interpreter ───────────────────────────────────────────────────────────────

/// The script executor.
pub struct Interpreter {
    evaluator: Evaluator,
    log: Box<dyn LogSink>,
    print_keyword: String,
    correct: bool,
    strip_comments: bool,
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

impl Interpreter {
    /// An interpreter with default options that discards `print` output.
    pub fn new() -> Self {
        Self::with_options(&Options::default(), NullLog)
    }

    /// An interpreter configured by `opts`, printing to `log`.
    pub fn with_options(opts: &Options, log: impl LogSink + 'static) -> Self {
        Interpreter {
            evaluator: Evaluator::with_options(opts),
            log: Box::new(log),
            print_keyword: opts.print_keyword.to_lowercase(),
            correct: opts.correct,
            strip_comments: opts.strip_comments,
        }
    }

    /// An interpreter with default options, printing to `log`.
    pub fn with_log(log: impl LogSink + 'static) -> Self {
        Self::with_options(&Options::default(), log)
    }

    pub fn evaluator(&self) -> &Evaluator {
        &self.evaluator
    }

    pub fn evaluator_mut(&mut self) -> &mut Evaluator {
        &mut self.evaluator
    }

    /// Replace the `print` sink, returning the old one.
    pub fn set_log(&mut self, log: impl LogSink + 'static) -> Box<dyn LogSink> {
        std::mem::replace(&mut self.log, Box::new(log))
    }

    pub fn print_keyword(&self) -> &str {
        &self.print_keyword
    }

    pub fn set_print_keyword(&mut self, keyword: impl Into<String>) {
        self.print_keyword = keyword.into().to_lowercase();
    }

    /// Run a script split on `\r\n`, `\r` or `\n`.
    pub fn run_multiline(&mut self, script: &str) -> Result<f64, ScriptError> {
        let normalized = script.replace("\r\n", "\n").replace('\r', "\n");
        self.run_lines(normalized.split('\n'))
    }

    /// Run a script given as separate lines.
    ///
    /// Returns the value of the last expression line that executed, or `0`
    /// when none did.  Execution stops at the first failing line.
    pub fn run_lines<I, S>(&mut self, lines: I) -> Result<f64, ScriptError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut last = 0.0;
        let mut chains: Vec<Chain> = Vec::new();

        for (idx, raw) in lines.into_iter().enumerate() {
            let line = raw.as_ref().trim().to_lowercase();
            self.step(&line, &mut chains, &mut last)
                .map_err(|source| ScriptError { line: idx + 1, source })?;
        }

        if !chains.is_empty() {
            debug!(open = chains.len(), "script ended inside an if chain");
        }
        Ok(last)
    }

    fn step(&mut self, line: &str, chains: &mut Vec<Chain>, last: &mut f64) -> Result<()> {
        let current = chains.last().copied().unwrap_or(Chain::Executing);

        match classify(line, &self.print_keyword)? {
            Line::Blank => {}
            Line::If(cond) => {
                let next = if current == Chain::Executing {
                    self.branch(cond)?
                } else {
                    Chain::Executed
                };
                trace!(?next, "if");
                chains.push(next);
            }
            Line::ElseIf(cond) => {
                let next = match pop(chains, "else if")? {
                    Chain::NotExecuted => self.branch(cond)?,
                    _ => Chain::Executed,
                };
                trace!(?next, "else if");
                chains.push(next);
            }
            Line::Else => {
                let next = match pop(chains, "else")? {
                    Chain::NotExecuted => Chain::Executing,
                    _ => Chain::Executed,
                };
                trace!(?next, "else");
                chains.push(next);
            }
            Line::EndIf => {
                pop(chains, "end if")?;
            }
            Line::Print(arg) if current == Chain::Executing => {
                let message = self.render(arg)?;
                self.log.log(&message);
            }
            Line::Expr(text) if current == Chain::Executing => {
                if self.strip_comments && expr::strip_comments(text).trim().is_empty() {
                    return Ok(());
                }
                *last = self
                    .evaluator
                    .evaluate_with_declarations(text, self.correct, self.strip_comments)?;
            }
            Line::Print(_) | Line::Expr(_) => {}
        }
        Ok(())
    }

    fn branch(&mut self, cond: &str) -> Result<Chain> {
        let taken = self
            .evaluator
            .evaluate_boolean_with(cond, self.correct, self.strip_comments)?
            != 0.0;
        Ok(if taken { Chain::Executing } else { Chain::NotExecuted })
    }

    /// Build a `print` message from its argument text.
    ///
    /// Text inside `"…"` is literal; everything else is evaluated.  `\`
    /// escapes the next character.  Segments that are only whitespace are
    /// dropped.
    fn render(&mut self, arg: &str) -> Result<String> {
        let arg = match arg.strip_prefix('(') {
            Some(inner) => {
                let close = inner
                    .rfind(')')
                    .ok_or_else(|| EvalError::syntax("print: no matching ')'"))?;
                &inner[..close]
            }
            None => arg,
        };

        let mut out = String::new();
        let mut token = String::new();
        let mut quoted = false;
        let mut escaped = false;
        for c in arg.chars() {
            match c {
                '"' if !escaped => {
                    self.flush(&mut out, &token, quoted)?;
                    token.clear();
                    quoted = !quoted;
                }
                '\\' if !escaped => escaped = true,
                _ => {
                    token.push(c);
                    escaped = false;
                }
            }
        }
        self.flush(&mut out, &token, quoted)?;
        Ok(out)
    }

    fn flush(&mut self, out: &mut String, token: &str, quoted: bool) -> Result<()> {
        if token.trim().is_empty() {
            return Ok(());
        }
        if quoted {
            out.push_str(token);
        } else {
            let value = self.evaluator.evaluate_with_declarations(
                token.trim(),
                self.correct,
                self.strip_comments,
            )?;
            out.push_str(&format_number(value));
        }
        Ok(())
    }
}

fn pop(chains: &mut Vec<Chain>, what: &str) -> Result<Chain> {
    chains
        .pop()
        .ok_or_else(|| EvalError::syntax(format!("'{what}' without a matching 'if'")))
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;
    use crate::error::ErrorKind;
    use crate::script::log::MultilineLog;

    fn run(lines: &[&str]) -> f64 {
        Interpreter::new().run_lines(lines).unwrap()
    }

    /// Runs `lines` and returns what `print` produced.
    fn printed(lines: &[&str]) -> String {
        let log = Rc::new(RefCell::new(MultilineLog::new()));
        let sink = Rc::clone(&log);
        let mut interp = Interpreter::with_log(move |m: &str| sink.borrow_mut().log(m));
        interp.run_lines(lines).unwrap();
        let out = log.borrow().output().to_string();
        out
    }

    // -- Classification -----------------------------------------------------------

    #[test]
    fn classify_keywords_on_word_boundaries() {
        assert_eq!(classify("if x", "print").unwrap(), Line::If("x"));
        assert_eq!(classify("if(x)", "print").unwrap(), Line::If("(x)"));
        assert_eq!(classify("iffy := 2", "print").unwrap(), Line::Expr("iffy := 2"));
        assert_eq!(classify("else if  x > 1", "print").unwrap(), Line::ElseIf("x > 1"));
        assert_eq!(classify("elif y", "print").unwrap(), Line::ElseIf("y"));
        assert_eq!(classify("else", "print").unwrap(), Line::Else);
        assert_eq!(classify("end if", "print").unwrap(), Line::EndIf);
        assert_eq!(classify("endif", "print").unwrap(), Line::EndIf);
        assert_eq!(classify("print \"a\"", "print").unwrap(), Line::Print("\"a\""));
        assert_eq!(classify("print(1)", "print").unwrap(), Line::Print("(1)"));
        assert_eq!(classify("printer := 1", "print").unwrap(), Line::Expr("printer := 1"));
        assert!(classify("else 5", "print").is_err());
    }

    // -- Control flow ---------------------------------------------------------------

    #[test]
    fn if_selects_branch() {
        assert_eq!(run(&["let x=5", "0", "if (x>=4)", "1", "end if"]), 1.0);
        assert_eq!(run(&["let x=5", "0", "if (x<4)", "1", "end if"]), 0.0);
    }

    #[test]
    fn else_if_chain() {
        let script = |x: i32| {
            vec![
                format!("let x = {x}"),
                "if x < 0".into(),
                "-1".into(),
                "else if x == 0".into(),
                "0".into(),
                "elif x < 10".into(),
                "1".into(),
                "else".into(),
                "2".into(),
                "end if".into(),
            ]
        };
        for (x, expected) in [(-5, -1.0), (0, 0.0), (5, 1.0), (50, 2.0)] {
            assert_eq!(Interpreter::new().run_lines(script(x)).unwrap(), expected, "x = {x}");
        }
    }

    #[test]
    fn nested_chains_pick_one_branch_each() {
        let lines = [
            "let a = 1",
            "let b = 0",
            "if a",
            "  if b",
            "    10",
            "  else",
            "    20",
            "  endif",
            "else",
            "  if 1",
            "    30",
            "  end if",
            "end if",
        ];
        assert_eq!(run(&lines), 20.0);
    }

    #[test]
    fn conditions_accept_infinite_groups() {
        assert_eq!(run(&["let big = 1/0", "if (big) > 0", "1", "end if"]), 1.0);
        assert_eq!(run(&["if (0/0) || 0", "2", "else", "3", "end if"]), 2.0);
    }

    #[test]
    fn conditions_follow_interpreter_rewrites() {
        let lines = ["if sqr(4) == 2", "1", "end if"];
        assert_eq!(run(&lines), 1.0);

        let opts = Options {
            correct: false,
            ..Options::default()
        };
        let err = Interpreter::with_options(&opts, NullLog).run_lines(lines).unwrap_err();
        assert_eq!(err.line, 1);
        assert_eq!(err.kind(), ErrorKind::UndefinedVariable);
    }

    #[test]
    fn suppressed_chain_ignores_inner_conditions() {
        let lines = ["0", "if 0", "  if 1", "    5", "  else", "    6", "  end if", "end if"];
        assert_eq!(run(&lines), 0.0);
    }

    #[test]
    fn branch_after_taken_branch_is_skipped() {
        let lines = ["if 1", "1", "else if 1", "2", "else", "3", "end if"];
        assert_eq!(run(&lines), 1.0);
    }

    #[test]
    fn keywords_are_case_insensitive() {
        assert_eq!(run(&["IF 1", "7", "END IF"]), 7.0);
        assert_eq!(run(&["LET Y = 2", "y * 3"]), 6.0);
    }

    #[test]
    fn declarations_persist_between_lines() {
        assert_eq!(run(&["let y = 5 * pi", "let y = floor(y)", "y"]), 15.0);
    }

    #[test]
    fn blank_and_comment_lines_do_not_reset_result() {
        assert_eq!(run(&["3", "   ", "# done"]), 3.0);
        assert_eq!(run(&[]), 0.0);
    }

    #[test]
    fn multiline_separators() {
        let mut interp = Interpreter::new();
        assert_eq!(interp.run_multiline("let a = 1\r\nlet b = 2\rlet c = 3\na + b + c").unwrap(), 6.0);
        assert_eq!(interp.run_multiline("let x = 5\nif x >= 4\n1\nend if\n  ").unwrap(), 1.0);
    }

    // -- Errors ---------------------------------------------------------------------

    #[test]
    fn errors_carry_line_number() {
        let err = Interpreter::new().run_lines(["1", "2", "foo", "4"]).unwrap_err();
        assert_eq!(err.line, 3);
        assert_eq!(err.kind(), ErrorKind::UndefinedVariable);
        let msg = err.to_string();
        assert!(msg.contains("foo"), "{msg}");
        assert!(msg.contains("line 3"), "{msg}");
    }

    #[test]
    fn unbalanced_end_if() {
        let err = Interpreter::new().run_lines(["1", "end if"]).unwrap_err();
        assert_eq!(err.line, 2);
        assert_eq!(err.kind(), ErrorKind::Syntax);
    }

    #[test]
    fn unclosed_if_is_tolerated() {
        assert_eq!(run(&["if 1", "4"]), 4.0);
    }

    // -- Print ----------------------------------------------------------------------

    #[test]
    fn print_interpolates() {
        assert_eq!(printed(&["let x = 4", "print \"x is \" x \", twice \" x * 2"]), "x is 4, twice 8");
        assert_eq!(printed(&["print(\"sum: \" 1 + 2)"]), "sum: 3");
        assert_eq!(printed(&["print 6 * 7"]), "42");
    }

    #[test]
    fn print_escapes_and_blank_segments() {
        assert_eq!(printed(&[r#"print "say \"hi\"""#]), "say \"hi\"");
        assert_eq!(printed(&[r#"print " " 1"#]), "1");
    }

    #[test]
    fn print_respects_branches() {
        assert_eq!(printed(&["if 0", "print \"no\"", "else", "print \"yes\"", "end if"]), "yes");
        assert_eq!(printed(&["print 1", "print 2"]), "1\n2");
    }

    #[test]
    fn print_does_not_change_result() {
        assert_eq!(run(&["5", "print 9"]), 5.0);
    }

    #[test]
    fn print_missing_close_paren() {
        let err = Interpreter::new().run_lines(["print(1"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Syntax);
    }

    #[test]
    fn custom_print_keyword() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&log);
        let mut interp = Interpreter::with_log(move |m: &str| sink.borrow_mut().push(m.to_string()));
        interp.set_print_keyword("Echo");
        interp.run_lines(["echo \"hi\"", "print \"x\""]).unwrap_err();
        assert_eq!(*log.borrow(), ["hi"]);
    }

    #[test]
    fn keywords_from_options_match_lowercased_lines() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&log);
        let opts = Options {
            print_keyword: "Echo".into(),
            declarator: "Var".into(),
            ..Options::default()
        };
        let mut interp =
            Interpreter::with_options(&opts, move |m: &str| sink.borrow_mut().push(m.to_string()));
        assert_eq!(interp.print_keyword(), "echo");
        interp.run_lines(["VAR k = 3", "Echo \"k=\" k"]).unwrap();
        assert_eq!(*log.borrow(), ["k=3"]);
    }
}
