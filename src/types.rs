use crate::{evaluator::EvalResult, source::Span};
use std::cmp::Ordering;
use std::fmt; // For custom display formatting

#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub kind: Sexpr, // The actual S-expression data
    pub span: Span,  // The source span it covers
}

impl Node {
    pub fn new(kind: Sexpr, span: Span) -> Self {
        Node { kind, span }
    }

    pub fn new_int(n: i64, span: Span) -> Self {
        Node::new(Sexpr::Number(Number::Int(n)), span)
    }

    pub fn new_float(n: f64, span: Span) -> Self {
        Node::new(Sexpr::Number(Number::Float(n)), span)
    }

    pub fn new_symbol(name: impl Into<String>, span: Span) -> Self {
        Node::new(Sexpr::Symbol(name.into()), span)
    }

    pub fn new_list(children: Vec<Node>, span: Span) -> Self {
        Node::new(Sexpr::List(children), span)
    }

    /// Compares two trees by shape and content only, ignoring where in the
    /// source each node came from.
    pub fn same_tree(&self, other: &Node) -> bool {
        match (&self.kind, &other.kind) {
            (Sexpr::List(left), Sexpr::List(right)) => {
                left.len() == right.len() && left.iter().zip(right).all(|(l, r)| l.same_tree(r))
            }
            (Sexpr::Number(left), Sexpr::Number(right)) => left.same_literal(*right),
            (left, right) => left == right,
        }
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Delegate to Sexpr's Display implementation
        write!(f, "{}", self.kind)
    }
}

/// A numeric literal. Integers are kept exact; anything with a fraction or
/// exponent is a float.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Number {
    Int(i64),
    Float(f64),
}

impl Number {
    pub fn as_f64(self) -> f64 {
        match self {
            Number::Int(i) => i as f64,
            Number::Float(x) => x,
        }
    }

    /// Orders two numbers, exactly when both are integers. `None` when a NaN is involved.
    pub fn compare(self, other: Number) -> Option<Ordering> {
        match (self, other) {
            (Number::Int(a), Number::Int(b)) => Some(a.cmp(&b)),
            (a, b) => a.as_f64().partial_cmp(&b.as_f64()),
        }
    }

    /// Literal identity: unlike `==`, a NaN is the same literal as another NaN.
    pub fn same_literal(self, other: Number) -> bool {
        match (self, other) {
            (Number::Float(a), Number::Float(b)) => {
                a.to_bits() == b.to_bits() || (a.is_nan() && b.is_nan())
            }
            (a, b) => a == b,
        }
    }

    pub fn is_zero(self) -> bool {
        match self {
            Number::Int(i) => i == 0,
            Number::Float(x) => x == 0.0,
        }
    }
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Number::Int(i) => write!(f, "{}", i),
            // Debug keeps the fractional part ("2.0"), so the text reads back as a float
            Number::Float(x) => write!(f, "{:?}", x),
        }
    }
}

/// A parsed S-expression. This is the program tree only; runtime results are
/// [`Value`]s.
#[derive(Debug, Clone, PartialEq)]
pub enum Sexpr {
    Number(Number),  // 42, -1.5
    Symbol(String),  // +, x, if
    List(Vec<Node>), // (+ 1 2), ()
}

impl Sexpr {
    pub fn type_name(&self) -> &'static str {
        match self {
            Sexpr::Number(_) => "number",
            Sexpr::Symbol(_) => "symbol",
            Sexpr::List(_) => "list",
        }
    }
}

// Canonical parenthesized form; reading it back yields the same tree
impl fmt::Display for Sexpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Sexpr::Number(n) => write!(f, "{}", n),
            Sexpr::Symbol(s) => write!(f, "{}", s),
            Sexpr::List(list) => {
                write!(f, "(")?;
                let mut first = true;
                for expr in list {
                    if !first {
                        write!(f, " ")?;
                    }
                    write!(f, "{}", expr)?;
                    first = false;
                }
                write!(f, ")")
            }
        }
    }
}

/// The result of evaluating a [`Node`].
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Number(Number),
    Boolean(bool),
    Procedure(Procedure),
}

impl Value {
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Number(_) => "number",
            Value::Boolean(_) => "boolean",
            Value::Procedure(_) => "procedure",
        }
    }

    /// `false` and numeric zero are falsy, everything else is truthy.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Boolean(b) => *b,
            Value::Number(n) => !n.is_zero(),
            Value::Procedure(_) => true,
        }
    }
}

impl From<Number> for Value {
    fn from(n: Number) -> Self {
        Value::Number(n)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Number(n) => write!(f, "{}", n),
            Value::Boolean(b) => write!(f, "{}", if *b { "#t" } else { "#f" }),
            Value::Procedure(procedure) => match procedure {
                Procedure::Primitive(_, name) => write!(f, "#<primitive:{}>", name),
            },
        }
    }
}

pub type PrimitiveFunc = fn(&[Value], Span) -> EvalResult;

#[derive(Clone)] // Need Clone for Value::Procedure
pub enum Procedure {
    Primitive(PrimitiveFunc, &'static str), // The function pointer and its name (for display/debug)
}

impl Procedure {
    pub fn name(&self) -> &'static str {
        match self {
            Procedure::Primitive(_, name) => name,
        }
    }

    pub fn call(&self, args: &[Value], span: Span) -> EvalResult {
        match self {
            Procedure::Primitive(func, _) => func(args, span),
        }
    }
}

impl fmt::Debug for Procedure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Procedure::Primitive(_, name) => write!(f, "Primitive({})", name),
        }
    }
}

// Function pointers make poor identities; primitives are compared by name.
impl PartialEq for Procedure {
    fn eq(&self, other: &Self) -> bool {
        self.name() == other.name()
    }
}
