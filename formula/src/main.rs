use std::io::Read;
use std::process::ExitCode;

use formula::cli::{self, Action, CliArgs, ConfigFile, ScriptSource};
use formula::config::{self, Config};
use formula::script::value::format_number;
use formula::script::Interpreter;
use tracing::level_filters::LevelFilter;
use tracing::{debug, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

fn main() -> ExitCode {
    let args = match cli::parse_args() {
        Ok(a) => a,
        Err(e) => {
            eprintln!("formula: {e}");
            eprintln!(
                "Usage: formula [-f[<file>]] [-d] [-D<name>=<expr>] [-e<expr>] [-b<cond>] [-t<expr>] [<script>|-]"
            );
            return ExitCode::from(2);
        }
    };

    // ── Diagnostics go to stderr; RUST_LOG overrides the default level ───────
    let default_level = if args.debug { LevelFilter::DEBUG } else { LevelFilter::WARN };
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(
            EnvFilter::builder()
                .with_default_directive(default_level.into())
                .from_env_lossy(),
        )
        .init();

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("formula: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: &CliArgs) -> Result<(), String> {
    let config = load_config(&args.config)?;

    let mut interp = Interpreter::with_options(&config.options, |m: &str| println!("{m}"));
    for e in config.apply_prelude(interp.evaluator_mut()) {
        warn!("rc prelude {e}");
    }

    for (name, expr) in &args.defines {
        let value = interp.evaluator().evaluate(expr).map_err(|e| format!("-D{name}: {e}"))?;
        interp.evaluator_mut().registry_mut().set_variable(name.as_str(), value);
        debug!(%name, value, "defined");
    }

    let opts = &config.options;
    for action in &args.actions {
        let ev = interp.evaluator_mut();
        match action {
            Action::Eval(text) => {
                let v = ev
                    .evaluate_with_declarations(text, opts.correct, opts.strip_comments)
                    .map_err(|e| e.to_string())?;
                println!("{}", format_number(v));
            }
            Action::Boolean(text) => {
                let v = ev
                    .evaluate_boolean_with(text, opts.correct, opts.strip_comments)
                    .map_err(|e| e.to_string())?;
                println!("{}", format_number(v));
            }
            Action::Tokens(text) => {
                for token in ev.tokenize(text) {
                    println!("{token}");
                }
            }
        }
    }

    if let Some(source) = &args.script {
        let script = match source {
            ScriptSource::Stdin => {
                let mut s = String::new();
                std::io::stdin()
                    .read_to_string(&mut s)
                    .map_err(|e| format!("stdin: {e}"))?;
                s
            }
            ScriptSource::File(path) => std::fs::read_to_string(path)
                .map_err(|e| format!("{}: {e}", path.display()))?,
        };
        let result = interp.run_multiline(&script).map_err(|e| e.to_string())?;
        println!("{}", format_number(result));
    }

    Ok(())
}

fn load_config(choice: &ConfigFile) -> Result<Config, String> {
    let path = match choice {
        ConfigFile::Skip => return Ok(Config::new()),
        ConfigFile::Explicit(p) => p.clone(),
        ConfigFile::Search => match config::find_user_config() {
            Some(p) => p,
            None => return Ok(Config::new()),
        },
    };
    let (config, errors) =
        Config::load_file(&path).map_err(|e| format!("{}: {e}", path.display()))?;
    for e in errors {
        warn!("{}: {e}", path.display());
    }
    Ok(config)
}
