//! Interpreter options and the `formularc` start-up file.
//!
//! The rc file is line oriented:
//!
//! | Line | Action |
//! |------|--------|
//! | blank, or starting with `#` or `;` | ignored |
//! | `<option> = <value>` | set an [`Options`] field |
//! | `let <name> = <expr>` (or `<name> := <expr>`) | prelude definition |
//!
//! Problems are collected as [`ConfigError`]s; the offending line is skipped
//! and loading carries on.

use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use thiserror::Error;
use tracing::{debug, warn};

use crate::script::Evaluator;

// ── Options ───────────────────────────────────────────────────────────────────

/// Construction-time settings for an evaluator or interpreter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Options {
    /// Install the built-in functions (`sin`, `log`, `max`, …).
    pub load_functions: bool,
    /// Install the reference operator table.
    pub load_operators: bool,
    /// Install the predefined constants (`pi`, `e`, `phi`, …).
    pub load_constants: bool,
    /// Keyword introducing a declaration.
    pub declarator: String,
    /// Keyword of the script `print` statement.
    pub print_keyword: String,
    /// Apply the `sqr`/`atan2` spelling fixes to script lines.
    pub correct: bool,
    /// Strip `#` comments from script lines.
    pub strip_comments: bool,
}

impl Default for Options {
    fn default() -> Self {
        Options {
            load_functions: true,
            load_operators: true,
            load_constants: true,
            declarator: "let".into(),
            print_keyword: "print".into(),
            correct: true,
            strip_comments: true,
        }
    }
}

impl Options {
    /// Set one option from its rc-file spelling.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), String> {
        match key {
            "load_functions" => self.load_functions = parse_bool(value)?,
            "load_operators" => self.load_operators = parse_bool(value)?,
            "load_constants" => self.load_constants = parse_bool(value)?,
            "correct" => self.correct = parse_bool(value)?,
            "strip_comments" => self.strip_comments = parse_bool(value)?,
            "declarator" => self.declarator = keyword(value)?,
            "print_keyword" => self.print_keyword = keyword(value)?,
            _ => return Err(format!("unknown option '{key}'")),
        }
        Ok(())
    }
}

fn parse_bool(value: &str) -> Result<bool, String> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "on" | "yes" => Ok(true),
        "0" | "false" | "off" | "no" => Ok(false),
        _ => Err(format!("expected a boolean, got '{value}'")),
    }
}

fn keyword(value: &str) -> Result<String, String> {
    if !value.is_empty() && value.chars().all(char::is_alphanumeric) {
        Ok(value.to_lowercase())
    } else {
        Err(format!("'{value}' is not a valid keyword"))
    }
}

// ── Config ────────────────────────────────────────────────────────────────────

/// A non-fatal error encountered while loading a config file.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("line {line}: {message}")]
pub struct ConfigError {
    pub line: usize,
    pub message: String,
}

/// One prelude definition, kept as source text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Definition {
    pub line: usize,
    pub source: String,
}

/// A parsed rc file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Config {
    pub options: Options,
    pub prelude: Vec<Definition>,
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse rc-file text.
    ///
    /// Returns the config and a list of any problems on individual lines.
    pub fn load_str(s: &str) -> (Self, Vec<ConfigError>) {
        let mut config = Config::new();
        let mut errors = Vec::new();

        for (i, raw) in s.lines().enumerate() {
            let lineno = i + 1;
            let line = raw.trim();

            if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
                continue;
            }

            if is_definition(line, &config.options.declarator) {
                config.prelude.push(Definition {
                    line: lineno,
                    source: line.to_owned(),
                });
                continue;
            }

            let result = match line.split_once('=') {
                Some((key, value)) => config.options.set(key.trim(), value.trim()),
                None => Err(format!("expected '<option> = <value>', got '{line}'")),
            };
            if let Err(message) = result {
                warn!(line = lineno, %message, "config");
                errors.push(ConfigError { line: lineno, message });
            }
        }

        (config, errors)
    }

    /// Read and parse an rc file from disk.
    pub fn load_file(path: &Path) -> std::io::Result<(Self, Vec<ConfigError>)> {
        let s = std::fs::read_to_string(path)?;
        debug!(path = %path.display(), "loading config");
        Ok(Self::load_str(&s))
    }

    /// Evaluate the prelude definitions, in file order.
    ///
    /// A failing definition is reported and skipped.
    pub fn apply_prelude(&self, evaluator: &mut Evaluator) -> Vec<ConfigError> {
        let mut errors = Vec::new();
        for def in &self.prelude {
            let opts = &self.options;
            if let Err(e) =
                evaluator.evaluate_with_declarations(&def.source, opts.correct, opts.strip_comments)
            {
                errors.push(ConfigError {
                    line: def.line,
                    message: e.to_string(),
                });
            }
        }
        errors
    }
}

fn is_definition(line: &str, declarator: &str) -> bool {
    let starts_with_keyword = line
        .strip_prefix(declarator)
        .is_some_and(|rest| rest.starts_with(char::is_whitespace));
    starts_with_keyword || line.contains(":=")
}

// ── Path helpers ──────────────────────────────────────────────────────────────

/// Candidate rc-file locations, in search order.
pub fn search_paths() -> Vec<PathBuf> {
    let mut paths = vec![PathBuf::from("./.formularc")];
    if let Some(dirs) = ProjectDirs::from("", "", "formula") {
        paths.push(dirs.config_dir().join("formularc"));
    }
    paths
}

/// The first existing rc file, if any.
pub fn find_user_config() -> Option<PathBuf> {
    search_paths().into_iter().find(|p| p.exists())
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let o = Options::default();
        assert!(o.load_functions && o.load_operators && o.load_constants);
        assert!(o.correct && o.strip_comments);
        assert_eq!(o.declarator, "let");
        assert_eq!(o.print_keyword, "print");
    }

    #[test]
    fn settings_and_comments() {
        let (c, errs) = Config::load_str(
            "# comment\n; also a comment\n\nload_constants = off\nprint_keyword = Echo\ncorrect=0\n",
        );
        assert!(errs.is_empty(), "{errs:?}");
        assert!(!c.options.load_constants);
        assert!(!c.options.correct);
        assert_eq!(c.options.print_keyword, "echo");
    }

    #[test]
    fn prelude_lines_are_kept_in_order() {
        let (c, errs) = Config::load_str("let a = 2\nb := a * 3\n");
        assert!(errs.is_empty());
        assert_eq!(
            c.prelude,
            [
                Definition { line: 1, source: "let a = 2".into() },
                Definition { line: 2, source: "b := a * 3".into() },
            ]
        );
    }

    #[test]
    fn declarator_setting_applies_to_later_lines() {
        let (c, errs) = Config::load_str("declarator = var\nvar k = 1\n");
        assert!(errs.is_empty(), "{errs:?}");
        assert_eq!(c.prelude.len(), 1);
        assert_eq!(c.prelude[0].line, 2);
    }

    #[test]
    fn bad_lines_are_reported_and_skipped() {
        let (c, errs) = Config::load_str("nonsense\ncolour = red\ncorrect = maybe\nstrip_comments = no\n");
        assert_eq!(errs.len(), 3);
        assert_eq!(errs[0].line, 1);
        assert!(errs[1].message.contains("colour"));
        assert_eq!(errs[2].to_string(), "line 3: expected a boolean, got 'maybe'");
        assert!(!c.options.strip_comments);
    }

    #[test]
    fn apply_prelude_defines_variables() {
        let (c, _) = Config::load_str("let a = 2\nb := a * 3\nlet c = nope\n");
        let mut ev = Evaluator::with_options(&c.options);
        let errs = c.apply_prelude(&mut ev);
        assert_eq!(ev.registry().variable("b"), Some(6.0));
        assert_eq!(errs.len(), 1);
        assert_eq!(errs[0].line, 3);
        assert!(errs[0].message.contains("nope"));
    }

    #[test]
    fn search_starts_in_working_directory() {
        assert_eq!(search_paths()[0], PathBuf::from("./.formularc"));
    }
}
