//! Command-line argument parsing.
//!
//! Usage:
//!   formula [-f[<file>]] [-d] [-D<name>=<expr>]… [-e<expr>|-b<cond>|-t<expr>]… [<script>|-]

use std::path::PathBuf;

// ── Public types ──────────────────────────────────────────────────────────────

/// Parsed command-line arguments.
#[derive(Debug, Default)]
pub struct CliArgs {
    /// Config-file specification.
    pub config: ConfigFile,
    /// Debug logging (`-d`).
    pub debug: bool,
    /// Variables defined before anything runs (`-D<name>=<expr>`).
    pub defines: Vec<(String, String)>,
    /// One-shot evaluations, in command-line order.
    pub actions: Vec<Action>,
    /// Script to execute after the actions.
    pub script: Option<ScriptSource>,
}

/// How to choose the rc file.
#[derive(Debug, Default)]
pub enum ConfigFile {
    /// Search `./.formularc`, then the user config directory (default).
    #[default]
    Search,
    /// `-f` with no file argument: skip the rc file.
    Skip,
    /// `-f<file>`: load this specific file.
    Explicit(PathBuf),
}

/// A one-shot evaluation requested on the command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// `-e<expr>`: evaluate with declarations and print the value.
    Eval(String),
    /// `-b<cond>`: evaluate a boolean condition and print `1` or `0`.
    Boolean(String),
    /// `-t<expr>`: print the tokens, one per line.
    Tokens(String),
}

/// Where the script comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptSource {
    Stdin,
    File(PathBuf),
}

// ── Parsing ───────────────────────────────────────────────────────────────────

/// Parse `std::env::args()` and return [`CliArgs`] or an error message.
pub fn parse_args() -> Result<CliArgs, String> {
    let raw: Vec<String> = std::env::args().collect();
    parse_argv(&raw[1..])
}

/// Parse a slice of argument strings (exposed for testing).
pub fn parse_argv(argv: &[String]) -> Result<CliArgs, String> {
    let mut args = CliArgs::default();
    let mut positional: Vec<String> = Vec::new();
    let mut i = 0;

    while i < argv.len() {
        let arg = argv[i].as_str();

        // `--` ends flag processing.
        if arg == "--" {
            i += 1;
            positional.extend(argv[i..].iter().cloned());
            break;
        }

        // Non-flag argument (`-` alone means stdin).
        if !arg.starts_with('-') || arg == "-" {
            positional.push(arg.to_owned());
            i += 1;
            continue;
        }

        let chars: Vec<char> = arg[1..].chars().collect();
        let mut j = 0;
        while j < chars.len() {
            match chars[j] {
                'd' => args.debug = true,

                // -f[<file>]
                'f' => {
                    if j + 1 < chars.len() {
                        let file: String = chars[j + 1..].iter().collect();
                        args.config = ConfigFile::Explicit(PathBuf::from(file));
                        j = chars.len();
                    } else {
                        args.config = ConfigFile::Skip;
                    }
                }

                // Options taking a value, attached or as the next argument.
                c @ ('e' | 'b' | 't' | 'D') => {
                    let value = if j + 1 < chars.len() {
                        let s: String = chars[j + 1..].iter().collect();
                        j = chars.len();
                        s
                    } else if i + 1 < argv.len() {
                        i += 1;
                        argv[i].clone()
                    } else {
                        return Err(format!("-{c} requires an argument"));
                    };
                    match c {
                        'e' => args.actions.push(Action::Eval(value)),
                        'b' => args.actions.push(Action::Boolean(value)),
                        't' => args.actions.push(Action::Tokens(value)),
                        _ => {
                            let (name, expr) = value
                                .split_once('=')
                                .ok_or_else(|| format!("-D expects <name>=<expr>, got '{value}'"))?;
                            args.defines.push((name.trim().to_owned(), expr.trim().to_owned()));
                        }
                    }
                }

                c => return Err(format!("unknown option: -{c}")),
            }
            j += 1;
        }
        i += 1;
    }

    match positional.len() {
        0 => {}
        1 => {
            let p = positional.remove(0);
            args.script = Some(if p == "-" {
                ScriptSource::Stdin
            } else {
                ScriptSource::File(PathBuf::from(p))
            });
        }
        n => return Err(format!("too many arguments ({n})")),
    }

    Ok(args)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
