use std::borrow::Cow;
use std::cell::RefCell;
use std::path::PathBuf;
use std::process::ExitCode;
use std::rc::Rc;

use clap::Parser;
use minilisp::{Environment, Error, TokenKind, eval_str, special_form_identifiers, tokenize};
use rustyline::error::ReadlineError;
use rustyline::highlight::{CmdKind, Highlighter};
use rustyline::validate::{ValidationContext, ValidationResult, Validator};
use rustyline::{Cmd, Completer, Context, Editor, EventHandler, KeyCode, KeyEvent, Modifiers};
use rustyline::{Helper, Highlighter, Hinter, Validator};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

/// Interactive evaluator for a tiny Lisp: numbers, `+ - * /`, comparisons,
/// `def` and `if`.
#[derive(Parser, Debug)]
#[command(name = "minilisp", version)]
struct Cli {
    /// Evaluate an expression and print its value instead of starting the REPL (repeatable)
    #[arg(short, long = "eval", value_name = "EXPR")]
    exprs: Vec<String>,

    /// File used to persist REPL history
    #[arg(long, default_value = ".minilisp_history")]
    history: PathBuf,

    /// Do not load or save REPL history
    #[arg(long)]
    no_history: bool,

    /// Use vi key bindings instead of emacs
    #[arg(long)]
    vi: bool,
}

struct MinilispCompleter {
    env: Rc<RefCell<Environment>>,
}

impl MinilispCompleter {
    fn new(env: Rc<RefCell<Environment>>) -> Self {
        MinilispCompleter { env }
    }
}

impl rustyline::completion::Completer for MinilispCompleter {
    type Candidate = String;
    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &Context<'_>,
    ) -> rustyline::Result<(usize, Vec<String>)> {
        Ok((pos, completions(&self.env.borrow(), line, pos)))
    }
}

/// Suffixes that would extend the symbol ending at `pos` into a known name.
fn completions(env: &Environment, line: &str, pos: usize) -> Vec<String> {
    match tokenize(&line[..pos]).last() {
        // Only complete a symbol the cursor is still touching
        Some(token) if token.span.end == pos => match &token.kind {
            TokenKind::Atom(prefix) => {
                let mut matches: Vec<String> = env
                    .identifiers()
                    .union(&special_form_identifiers())
                    .filter_map(|id| id.strip_prefix(prefix.as_str()).map(str::to_string))
                    .filter(|rest| !rest.is_empty())
                    .collect();
                matches.sort();
                matches
            }
            _ => vec![],
        },
        _ => vec![],
    }
}

#[derive(Completer, Helper, Highlighter, Hinter, Validator)]
struct InputHelper {
    #[rustyline(Validator)]
    validator: ParenValidator,
    #[rustyline(Highlighter)]
    highlighter: ParenHighlighter,
    #[rustyline(Completer)]
    completer: MinilispCompleter,
}

/// Keeps reading lines while a `(` is still open. Anything else, a stray `)`
/// included, goes to the reader so its error is reported.
struct ParenValidator;

impl Validator for ParenValidator {
    fn validate(&self, ctx: &mut ValidationContext) -> rustyline::Result<ValidationResult> {
        Ok(validate_parens(ctx.input()))
    }
}

fn validate_parens(input: &str) -> ValidationResult {
    let mut depth = 0usize;
    for c in input.chars() {
        match c {
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            _ => {}
        }
    }
    if depth > 0 {
        ValidationResult::Incomplete
    } else {
        ValidationResult::Valid(None)
    }
}

/// Colours the parenthesis pair around the cursor blue and unmatched `)` red.
struct ParenHighlighter;

impl Highlighter for ParenHighlighter {
    fn highlight<'l>(&self, line: &'l str, pos: usize) -> Cow<'l, str> {
        // Each open paren: (offset in `line`, offset in `highlighted`)
        let mut stack: Vec<(usize, usize)> = Vec::new();
        let mut highlighted = String::with_capacity(line.len());
        let mut matched_open: Option<usize> = None;

        for (i, c) in line.char_indices() {
            match c {
                '(' => {
                    stack.push((i, highlighted.len()));
                    highlighted.push(c);
                }
                ')' => match stack.pop() {
                    Some((open_in_line, open_in_output)) => {
                        let touches_cursor = i + 1 == pos || open_in_line + 1 == pos;
                        if touches_cursor && matched_open.is_none() {
                            matched_open = Some(open_in_output);
                            highlighted.push_str("\x1b[34m)\x1b[0m"); // Blue for matching brackets
                        } else {
                            highlighted.push(c);
                        }
                    }
                    // Red for unmatched closing brackets
                    None => highlighted.push_str("\x1b[31m)\x1b[0m"),
                },
                _ => highlighted.push(c),
            }
        }

        if let Some(open_at) = matched_open {
            highlighted.replace_range(open_at..open_at + 1, "\x1b[1;34m(\x1b[0m");
        }

        Cow::Owned(highlighted)
    }

    fn highlight_char(&self, _line: &str, _pos: usize, _kind: CmdKind) -> bool {
        true
    }
}

fn is_exit_command(line: &str) -> bool {
    line.eq_ignore_ascii_case("exit") || line.eq_ignore_ascii_case("quit")
}

/// Evaluates one line and reports the outcome. Returns false when it failed.
fn run_line(line: &str, env: &mut Environment) -> bool {
    match eval_str(line, env) {
        Ok(value) => {
            println!("{}", value);
            true
        }
        Err(err) => {
            debug!(error = ?err, "evaluation failed");
            report_error(&err, line);
            false
        }
    }
}

fn report_error(err: &Error, line: &str) {
    if err.pretty_print(line).is_err() {
        eprintln!("Error: {}", err);
    }
}

/// Evaluates each expression from the command line in order against one environment.
fn run_batch(exprs: &[String]) -> ExitCode {
    let mut env = Environment::standard();
    let mut ok = true;
    for expr in exprs {
        ok &= run_line(expr, &mut env);
    }
    if ok { ExitCode::SUCCESS } else { ExitCode::FAILURE }
}

fn run_repl(cli: &Cli) -> rustyline::Result<()> {
    println!("minilisp v{}", env!("CARGO_PKG_VERSION"));
    println!("Type 'exit' or 'quit' (or press Ctrl-D) to leave.");

    let global_env = Rc::new(RefCell::new(Environment::standard()));
    let helper = InputHelper {
        highlighter: ParenHighlighter,
        validator: ParenValidator,
        completer: MinilispCompleter::new(global_env.clone()),
    };
    let edit_mode = if cli.vi {
        rustyline::EditMode::Vi
    } else {
        rustyline::EditMode::Emacs
    };
    let config = rustyline::config::Config::builder()
        .edit_mode(edit_mode)
        .auto_add_history(false)
        .build();
    let mut rl = Editor::with_config(config)?;
    rl.set_helper(Some(helper));
    rl.bind_sequence(
        KeyEvent(KeyCode::Char('s'), Modifiers::CTRL),
        EventHandler::Simple(Cmd::Newline),
    );
    if !cli.no_history && rl.load_history(&cli.history).is_err() {
        info!(path = %cli.history.display(), "no previous history");
    }

    loop {
        match rl.readline("minilisp> ") {
            Ok(line) => {
                let trimmed_input = line.trim();
                if trimmed_input.is_empty() {
                    continue;
                }
                rl.add_history_entry(trimmed_input)?;
                if is_exit_command(trimmed_input) {
                    break;
                }
                // One mutable borrow for the whole evaluation
                run_line(trimmed_input, &mut global_env.borrow_mut());
            }
            Err(ReadlineError::Interrupted) => {
                // Ctrl-C
                println!("Interrupted. Type 'exit' or Ctrl-D to quit.");
            }
            Err(ReadlineError::Eof) => {
                // Ctrl-D
                println!("\nExiting.");
                break;
            }
            Err(err) => {
                eprintln!("Readline Error: {:?}", err);
                break;
            }
        }
    }

    if !cli.no_history {
        rl.save_history(&cli.history)?;
    }
    Ok(())
}

fn main() -> ExitCode {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("minilisp=warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if !cli.exprs.is_empty() {
        return run_batch(&cli.exprs);
    }

    match run_repl(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Readline Error: {}", err);
            ExitCode::FAILURE
        }
    }
}
