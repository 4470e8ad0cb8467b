use crate::primitives;
use crate::source::Span;
use crate::types::{PrimitiveFunc, Procedure, Value};
use std::collections::{HashMap, HashSet};
use thiserror::Error;

// --- Environment Error ---
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EnvError {
    #[error("Unbound symbol: '{name}'")]
    UnboundSymbol { name: String, span: Span }, // Symbol name, span where lookup happened
}

// --- Environment Definition ---

/// The single flat binding table. There is no nesting: a name is either
/// bound here or unbound, and `bind` overwrites in place.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Environment {
    bindings: HashMap<String, Value>,
}

impl Environment {
    /// Creates an environment with no bindings at all.
    pub fn new() -> Self {
        Environment {
            bindings: HashMap::new(),
        }
    }

    /// Creates an environment holding the arithmetic and comparison primitives.
    pub fn standard() -> Self {
        let mut env = Environment::new();
        env.add_primitive("+", primitives::prim_add);
        env.add_primitive("-", primitives::prim_sub);
        env.add_primitive("*", primitives::prim_mul);
        env.add_primitive("/", primitives::prim_div);
        env.add_primitive(">", primitives::prim_greater_than);
        env.add_primitive("<", primitives::prim_less_than);
        env.add_primitive(">=", primitives::prim_greater_than_or_equals);
        env.add_primitive("<=", primitives::prim_less_than_or_equals);
        env.add_primitive("=", primitives::prim_equals);
        env
    }

    /// Binds `name` to `value`, replacing any previous binding.
    pub fn bind(&mut self, name: impl Into<String>, value: Value) {
        self.bindings.insert(name.into(), value);
    }

    /// Looks up a symbol's value.
    /// `lookup_span` is the location where the symbol was referenced, used for error reporting.
    pub fn lookup(&self, name: &str, lookup_span: Span) -> Result<Value, EnvError> {
        self.bindings
            .get(name)
            .cloned()
            .ok_or_else(|| EnvError::UnboundSymbol {
                name: name.to_string(),
                span: lookup_span,
            })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.bindings.contains_key(name)
    }

    /// Gets a list of all identifiers in the environment
    pub fn identifiers(&self) -> HashSet<String> {
        self.bindings.keys().cloned().collect()
    }

    /// Helper to add a primitive procedure to the environment.
    fn add_primitive(&mut self, name: &'static str, func: PrimitiveFunc) {
        self.bind(name, Value::Procedure(Procedure::Primitive(func, name)));
    }
}
