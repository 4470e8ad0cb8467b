// Declare modules publicly so they are part of the library interface
pub mod atom;
pub mod environment;
pub mod evaluator;
pub mod lexer;
pub mod parser;
pub mod pretty_print;
pub mod primitives;
pub mod source;
pub mod types;

pub use atom::classify;
pub use environment::{EnvError, Environment};
pub use evaluator::{EvalError, EvalResult, evaluate, special_form_identifiers};
pub use lexer::{Token, TokenKind, tokenize};
pub use parser::{ParseError, Parser, parse_str, read};
pub use source::Span;
pub use types::{Node, Number, Procedure, Sexpr, Value};

use thiserror::Error;

/// Any failure of the text-to-value pipeline.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error(transparent)]
    Eval(#[from] EvalError),
}

/// Reads the first expression in `input` and evaluates it against `env`.
pub fn eval_str(input: &str, env: &mut Environment) -> Result<Value, Error> {
    let node = parse_str(input)?;
    Ok(evaluate(&node, env)?)
}
