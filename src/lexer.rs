use logos::Logos;
use std::fmt;

use crate::Span;

/// Token kinds. Parentheses always stand alone; everything else that is not
/// whitespace is kept verbatim as an atom and classified later by the reader.
#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"\s+")] // Skip whitespace
pub enum TokenKind {
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[regex(r"[^\s()]+", |lex| lex.slice().to_string())]
    Atom(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

impl Token {
    pub fn new(kind: TokenKind, span: Span) -> Self {
        Token { kind, span }
    }
}

// Implement Display for easy printing
impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::LParen => write!(f, "("),
            TokenKind::RParen => write!(f, ")"),
            TokenKind::Atom(s) => write!(f, "{}", s),
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.kind.fmt(f)
    }
}

/// Splits `input` into tokens.
///
/// Every character is either whitespace, a parenthesis, or part of an atom,
/// so this cannot fail. Should logos ever report a slice it did not match,
/// the slice is kept as an atom rather than dropped.
pub fn tokenize(input: &str) -> Vec<Token> {
    TokenKind::lexer(input)
        .spanned()
        .map(|(result, range)| {
            let span = Span::new(range.start, range.end);
            let kind = result.unwrap_or_else(|_| TokenKind::Atom(input[range].to_string()));
            Token { kind, span }
        })
        .collect()
}
