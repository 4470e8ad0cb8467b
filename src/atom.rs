use crate::types::{Number, Sexpr};

/// Classifies a single atom token.
///
/// The order matters: integer first, then float, then symbol. `2` is an
/// integer, `2.5` a float, and `x`, `+` or `if` are symbols. Integers too
/// large for `i64` fall through to the float parse. Never fails.
pub fn classify(token: &str) -> Sexpr {
    if let Ok(i) = token.parse::<i64>() {
        Sexpr::Number(Number::Int(i))
    } else if let Ok(x) = token.parse::<f64>() {
        Sexpr::Number(Number::Float(x))
    } else {
        Sexpr::Symbol(token.to_string())
    }
}
