use crate::Span;
use crate::atom::classify;
use crate::lexer::{Token, TokenKind};
use crate::types::Node;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseError {
    #[error("Parse Error: Unexpected end of input")]
    UnexpectedEof { span: Span },
    #[error("Parse Error [at {span}]: Unexpected ')'")]
    UnexpectedCloseParen { span: Span },
}

impl ParseError {
    pub fn span(&self) -> Span {
        match self {
            ParseError::UnexpectedEof { span } | ParseError::UnexpectedCloseParen { span } => *span,
        }
    }
}

// Result type alias for convenience
pub type ParseResult<T> = Result<T, ParseError>;

/// Reads expressions from a borrowed token slice. The slice itself is never
/// modified; the parser only moves a cursor over it.
pub struct Parser<'t> {
    tokens: &'t [Token],
    pos: usize,
}

impl<'t> Parser<'t> {
    pub fn new(tokens: &'t [Token]) -> Self {
        Parser { tokens, pos: 0 }
    }

    // Peeks at the next token without consuming.
    fn peek_token(&self) -> Option<&'t Token> {
        self.tokens.get(self.pos)
    }

    // Consumes the next token if available.
    fn next_token(&mut self) -> Option<&'t Token> {
        let token = self.tokens.get(self.pos)?;
        self.pos += 1;
        Some(token)
    }

    // Where an end-of-input error points: just past the last token.
    fn eof_error(&self) -> ParseError {
        let end = self.tokens.last().map_or(0, |t| t.span.end);
        ParseError::UnexpectedEof {
            span: Span::point(end),
        }
    }

    /// Tokens not yet consumed.
    pub fn remaining(&self) -> &'t [Token] {
        &self.tokens[self.pos..]
    }

    /// Parses a single S-expression from the token stream.
    pub fn parse_expr(&mut self) -> ParseResult<Node> {
        let token = self.next_token().ok_or_else(|| self.eof_error())?;
        match &token.kind {
            TokenKind::LParen => self.parse_list(token.span),
            TokenKind::RParen => Err(ParseError::UnexpectedCloseParen { span: token.span }),
            TokenKind::Atom(text) => Ok(Node::new(classify(text), token.span)),
        }
    }

    /// Parses the rest of a list whose `(` has already been consumed.
    fn parse_list(&mut self, open_span: Span) -> ParseResult<Node> {
        let mut children = Vec::new();
        loop {
            // Check for ')' before reading each child, so `()` is an empty list
            match self.peek_token() {
                Some(Token {
                    kind: TokenKind::RParen,
                    span,
                }) => {
                    self.pos += 1;
                    return Ok(Node::new_list(children, open_span.merge(*span)));
                }
                Some(_) => children.push(self.parse_expr()?),
                None => return Err(self.eof_error()),
            }
        }
    }
}

/// Reads one expression and hands back whatever tokens were left over.
pub fn read(tokens: &[Token]) -> ParseResult<(Node, &[Token])> {
    let mut parser = Parser::new(tokens);
    let node = parser.parse_expr()?;
    Ok((node, parser.remaining()))
}

// Helper function to lex and parse a string directly (useful for tests and REPL).
// Only the first expression is returned; trailing tokens are ignored.
pub fn parse_str(input: &str) -> ParseResult<Node> {
    let tokens = crate::lexer::tokenize(input);
    let (node, rest) = read(&tokens)?;
    if !rest.is_empty() {
        debug!(ignored = rest.len(), "ignoring tokens after first expression");
    }
    Ok(node)
}
