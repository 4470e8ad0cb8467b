use crate::{EnvError, Error, EvalError, ParseError, Span};
use ariadne::{Config, IndexType, Label, Report, ReportKind, Source};
use std::ops::Range;

const SOURCE_ID: &str = "REPL";

type ReplReport<'a> = Report<'a, (&'static str, Range<usize>)>;

// Spans are byte offsets, so ariadne must not index by char
fn report<'a>(span: Span, message: String, label: String) -> ReplReport<'a> {
    Report::build(ReportKind::Error, (SOURCE_ID, span.to_range()))
        .with_config(Config::default().with_index_type(IndexType::Byte))
        .with_message(message)
        .with_label(Label::new((SOURCE_ID, span.to_range())).with_message(label))
        .finish()
}

fn eprint(report: ReplReport<'_>, input: &str) -> std::io::Result<()> {
    report.eprint((SOURCE_ID, Source::from(input)))
}

impl ParseError {
    pub fn report(&self) -> ReplReport<'static> {
        let (message, label) = match self {
            ParseError::UnexpectedEof { .. } => {
                ("Unexpected EOF", "Expected an expression or ')' here")
            }
            ParseError::UnexpectedCloseParen { .. } => {
                ("Unexpected ')'", "This ')' does not close any list")
            }
        };
        report(self.span(), message.to_string(), label.to_string())
    }

    /// Prints an annotated report of this error against `input` to stderr.
    pub fn pretty_print(&self, input: &str) -> std::io::Result<()> {
        eprint(self.report(), input)
    }
}

impl EvalError {
    pub fn report(&self) -> ReplReport<'static> {
        let (message, label) = match self {
            EvalError::Env(EnvError::UnboundSymbol { name, .. }) => (
                format!("Unbound symbol `{}`", name),
                "This symbol has not been defined".to_string(),
            ),
            EvalError::ArityOrTypeMismatch { message, .. } => {
                ("Invalid arguments".to_string(), message.clone())
            }
            EvalError::MalformedCall { .. } => (
                "Malformed call".to_string(),
                "An empty list cannot be called".to_string(),
            ),
            EvalError::DivisionByZero { .. } => (
                "Division by zero".to_string(),
                "The divisor evaluated to zero".to_string(),
            ),
        };
        report(self.span(), message, label)
    }

    /// Prints an annotated report of this error against `input` to stderr.
    pub fn pretty_print(&self, input: &str) -> std::io::Result<()> {
        eprint(self.report(), input)
    }
}

impl Error {
    pub fn pretty_print(&self, input: &str) -> std::io::Result<()> {
        match self {
            Error::Parse(e) => e.pretty_print(input),
            Error::Eval(e) => e.pretty_print(input),
        }
    }
}
