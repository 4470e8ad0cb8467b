use crate::environment::{EnvError, Environment};
use crate::source::Span;
use crate::types::{Node, Sexpr, Value};
use std::collections::HashSet;
use thiserror::Error;
use tracing::{debug, trace};

// --- Evaluation Error ---
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvalError {
    #[error(transparent)]
    Env(#[from] EnvError), // Errors from environment lookup
    #[error("Evaluation Error: {message}")]
    ArityOrTypeMismatch { message: String, span: Span }, // Wrong element count or operand type
    #[error("Evaluation Error: Cannot call an empty list")]
    MalformedCall { span: Span },
    #[error("Evaluation Error: Division by zero")]
    DivisionByZero { span: Span },
}

impl EvalError {
    pub fn mismatch(message: impl Into<String>, span: Span) -> Self {
        EvalError::ArityOrTypeMismatch {
            message: message.into(),
            span,
        }
    }

    pub fn span(&self) -> Span {
        match self {
            EvalError::Env(EnvError::UnboundSymbol { span, .. })
            | EvalError::ArityOrTypeMismatch { span, .. }
            | EvalError::MalformedCall { span }
            | EvalError::DivisionByZero { span } => *span,
        }
    }
}

// Result type alias for convenience
pub type EvalResult<T = Value> = Result<T, EvalError>;

const IF: &str = "if";
const DEF: &str = "def";

/// Names handled by the evaluator itself rather than looked up.
pub fn special_form_identifiers() -> HashSet<String> {
    [IF, DEF].iter().map(|s| s.to_string()).collect()
}

// --- Evaluate Function ---

/// Evaluates a given AST Node within the specified environment.
pub fn evaluate(node: &Node, env: &mut Environment) -> EvalResult {
    match &node.kind {
        // 1. Symbols: Look up in the environment
        Sexpr::Symbol(name) => {
            trace!(symbol = %name, "lookup");
            Ok(env.lookup(name, node.span)?)
        }

        // 2. Self-evaluating atoms
        Sexpr::Number(n) => Ok(Value::Number(*n)),

        // 3. Lists: special forms or procedure calls
        Sexpr::List(elements) => match elements.as_slice() {
            [] => Err(EvalError::MalformedCall { span: node.span }),
            [first, rest @ ..] => match &first.kind {
                Sexpr::Symbol(sym_name) if sym_name == IF => evaluate_if(rest, env, node.span),
                Sexpr::Symbol(sym_name) if sym_name == DEF => evaluate_def(rest, env, node.span),
                _ => evaluate_procedure(first, rest, env, node.span),
            },
        },
    }
}

fn evaluate_procedure(
    operator: &Node,
    operands: &[Node],
    env: &mut Environment,
    span: Span,
) -> EvalResult {
    let procedure = match evaluate(operator, env)? {
        Value::Procedure(procedure) => procedure,
        other => {
            return Err(EvalError::mismatch(
                format!("Expected a procedure, but got {} '{}'", other.type_name(), other),
                operator.span,
            ));
        }
    };

    // Operands are evaluated left to right
    let args = operands
        .iter()
        .map(|operand| evaluate(operand, env))
        .collect::<EvalResult<Vec<Value>>>()?;

    trace!(procedure = procedure.name(), argc = args.len(), "apply");
    procedure.call(&args, span)
}

fn evaluate_if(operands: &[Node], env: &mut Environment, span: Span) -> EvalResult {
    let [test, consequent, alternate] = operands else {
        return Err(EvalError::mismatch(
            format!(
                "if expects a test, a consequent and an alternate, got {} operands",
                operands.len()
            ),
            span,
        ));
    };

    // Only the chosen branch is evaluated
    if evaluate(test, env)?.is_truthy() {
        evaluate(consequent, env)
    } else {
        evaluate(alternate, env)
    }
}

fn evaluate_def(operands: &[Node], env: &mut Environment, span: Span) -> EvalResult {
    let [target, value_expr] = operands else {
        return Err(EvalError::mismatch(
            format!(
                "def expects a name and a value expression, got {} operands",
                operands.len()
            ),
            span,
        ));
    };
    let Sexpr::Symbol(name) = &target.kind else {
        return Err(EvalError::mismatch(
            format!(
                "def expects a symbol to bind, got {} '{}'",
                target.kind.type_name(),
                target
            ),
            target.span,
        ));
    };

    // Bind only once the value is known, so a failure leaves any old binding intact
    let value = evaluate(value_expr, env)?;
    debug!(name = %name, value = %value, "def");
    env.bind(name.clone(), value.clone());
    Ok(value)
}

// --- Unit Tests ---
#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_str;
    use crate::types::Number;

    fn eval_in(input: &str, env: &mut Environment) -> EvalResult {
        let node = parse_str(input)
            .unwrap_or_else(|e| panic!("Parsing failed for input '{}': {}", input, e));
        evaluate(&node, env)
    }

    // Helper to evaluate input string in a fresh standard environment
    fn assert_eval(input: &str, expected: Value) {
        let mut env = Environment::standard();
        match eval_in(input, &mut env) {
            Ok(result) => assert_eq!(result, expected, "Input: '{}'", input),
            Err(e) => panic!("Evaluation failed for input '{}': {}", input, e),
        }
    }

    // Helper to assert evaluation errors by variant
    fn assert_eval_error(input: &str, expected_error_variant: &EvalError, env: &mut Environment) {
        match eval_in(input, env) {
            Ok(result) => panic!(
                "Expected evaluation to fail for input '{}', but got: {:?}",
                input, result
            ),
            Err(e) => assert_eq!(
                std::mem::discriminant(&e),
                std::mem::discriminant(expected_error_variant),
                "Input: '{}', Expected error variant like {:?}, got: {:?}",
                input,
                expected_error_variant,
                e
            ),
        }
    }

    fn int(n: i64) -> Value {
        Value::Number(Number::Int(n))
    }

    fn float(x: f64) -> Value {
        Value::Number(Number::Float(x))
    }

    fn mismatch() -> EvalError {
        EvalError::mismatch("", Span::default()) // Dummy for discriminant comparison
    }

    fn unbound() -> EvalError {
        EvalError::Env(EnvError::UnboundSymbol {
            name: String::new(),
            span: Span::default(),
        })
    }

    #[test]
    fn test_eval_self_evaluating() {
        assert_eval("123", int(123));
        assert_eval("-4.5", float(-4.5));
    }

    #[test]
    fn test_eval_symbol_lookup() {
        let mut env = Environment::new();
        env.bind("x", int(100));
        assert_eq!(eval_in("x", &mut env), Ok(int(100)));
    }

    #[test]
    fn test_eval_symbol_unbound() {
        let mut env = Environment::standard();
        let result = eval_in("y", &mut env);
        assert_eq!(
            result,
            Err(EvalError::Env(EnvError::UnboundSymbol {
                name: "y".to_string(),
                span: Span::new(0, 1),
            }))
        );
    }

    #[test]
    fn test_eval_primitive_as_value() {
        let mut env = Environment::standard();
        match eval_in("+", &mut env) {
            Ok(Value::Procedure(procedure)) => assert_eq!(procedure.name(), "+"),
            other => panic!("Expected the + primitive, got {:?}", other),
        }
    }

    #[test]
    fn test_eval_arithmetic() {
        assert_eval("(+ 1 2)", int(3));
        assert_eval("(- 10 3)", int(7));
        assert_eval("(* 2 3)", int(6));
        assert_eval("(+ 1 (* 2 3))", int(7));
        assert_eval("(- (+ 5 5) (* 2 3))", int(4));
        assert_eval("(+ 1 2.5)", float(3.5));
    }

    #[test]
    fn test_eval_true_division() {
        assert_eval("(/ 1 2)", float(0.5));
        assert_eval("(/ 10 2)", float(5.0));
    }

    #[test]
    fn test_eval_comparisons() {
        assert_eval("(> 3 2)", Value::Boolean(true));
        assert_eval("(< 3 2)", Value::Boolean(false));
        assert_eval("(>= 2 2)", Value::Boolean(true));
        assert_eval("(<= 3 2)", Value::Boolean(false));
        assert_eval("(= 2 2.0)", Value::Boolean(true));
    }

    #[test]
    fn test_eval_if() {
        assert_eval("(if (> 3 2) 1 2)", int(1));
        assert_eval("(if (< 3 2) 1 2)", int(2));
        assert_eval("(if 0 1 2)", int(2));
        assert_eval("(if 0.0 1 2)", int(2));
        assert_eval("(if 7 1 2)", int(1));
        assert_eval("(if + 1 2)", int(1));
        assert_eval("(if (> 3 2) (if (= 1 2) 10 20) 30)", int(20));
    }

    #[test]
    fn test_eval_if_does_not_evaluate_unused_branch() {
        let mut env = Environment::standard();
        assert_eq!(eval_in("(if (> 3 2) 1 unbound)", &mut env), Ok(int(1)));
        assert_eq!(eval_in("(if (< 3 2) unbound 2)", &mut env), Ok(int(2)));

        // A def in the untaken branch must not run
        assert_eq!(eval_in("(if (> 3 2) 1 (def x 5))", &mut env), Ok(int(1)));
        assert!(!env.contains("x"));
    }

    #[test]
    fn test_eval_if_error_arity() {
        let mut env = Environment::standard();
        assert_eval_error("(if)", &mismatch(), &mut env);
        assert_eval_error("(if 1)", &mismatch(), &mut env);
        assert_eval_error("(if 1 2)", &mismatch(), &mut env);
        assert_eval_error("(if 1 2 3 4)", &mismatch(), &mut env);
    }

    #[test]
    fn test_eval_if_error_in_test() {
        let mut env = Environment::standard();
        assert_eval_error("(if unbound 1 2)", &unbound(), &mut env);
    }

    #[test]
    fn test_eval_def_persists() {
        let mut env = Environment::standard();
        assert_eq!(eval_in("(def x 10)", &mut env), Ok(int(10)));
        assert_eq!(eval_in("x", &mut env), Ok(int(10)));
        assert_eq!(eval_in("(def y (+ x 1))", &mut env), Ok(int(11)));
        assert_eq!(eval_in("(* x y)", &mut env), Ok(int(110)));
    }

    #[test]
    fn test_eval_def_overwrites() {
        let mut env = Environment::standard();
        eval_in("(def x 1)", &mut env).unwrap();
        eval_in("(def x (> 2 1))", &mut env).unwrap();
        assert_eq!(eval_in("x", &mut env), Ok(Value::Boolean(true)));
    }

    #[test]
    fn test_eval_def_can_rebind_primitives() {
        let mut env = Environment::standard();
        eval_in("(def plus +)", &mut env).unwrap();
        assert_eq!(eval_in("(plus 2 3)", &mut env), Ok(int(5)));
        eval_in("(def + -)", &mut env).unwrap();
        assert_eq!(eval_in("(+ 2 3)", &mut env), Ok(int(-1)));
    }

    #[test]
    fn test_eval_failed_def_keeps_old_binding() {
        let mut env = Environment::standard();
        eval_in("(def x 10)", &mut env).unwrap();
        assert_eval_error("(def x (+ 1 nope))", &unbound(), &mut env);
        assert_eq!(eval_in("x", &mut env), Ok(int(10)));

        let division = EvalError::DivisionByZero {
            span: Span::default(),
        };
        assert_eval_error("(def fresh (/ 1 0))", &division, &mut env);
        assert!(!env.contains("fresh"));
    }

    #[test]
    fn test_eval_def_errors() {
        let mut env = Environment::standard();
        assert_eval_error("(def)", &mismatch(), &mut env);
        assert_eval_error("(def x)", &mismatch(), &mut env);
        assert_eval_error("(def x 1 2)", &mismatch(), &mut env);
        // Still the special form, but a number is not a bindable name
        assert_eval_error("(def 1 2)", &mismatch(), &mut env);
        assert_eval_error("(def (x) 2)", &mismatch(), &mut env);
    }

    #[test]
    fn test_special_forms_are_not_values() {
        let mut env = Environment::standard();
        assert_eval_error("if", &unbound(), &mut env);
        assert_eval_error("(+ def 1)", &unbound(), &mut env);
    }

    #[test]
    fn test_eval_empty_list_is_malformed() {
        let mut env = Environment::standard();
        assert_eq!(
            eval_in("()", &mut env),
            Err(EvalError::MalformedCall {
                span: Span::new(0, 2)
            })
        );
        let malformed = EvalError::MalformedCall {
            span: Span::default(),
        };
        assert_eval_error("(+ 1 ())", &malformed, &mut env);
    }

    #[test]
    fn test_eval_not_a_procedure() {
        let mut env = Environment::standard();
        assert_eval_error("(1 2 3)", &mismatch(), &mut env);
        assert_eval_error("((> 1 2) 3)", &mismatch(), &mut env);
    }

    #[test]
    fn test_eval_unbound_operator() {
        let mut env = Environment::standard();
        assert_eval_error("(frobnicate 1 2)", &unbound(), &mut env);
    }

    #[test]
    fn test_eval_arguments_left_to_right() {
        // The first failing operand is the one reported
        let mut env = Environment::standard();
        match eval_in("(+ first second)", &mut env) {
            Err(EvalError::Env(EnvError::UnboundSymbol { name, .. })) => assert_eq!(name, "first"),
            other => panic!("Expected unbound 'first', got {:?}", other),
        }
    }

    #[test]
    fn test_eval_primitive_errors() {
        let mut env = Environment::standard();
        assert_eval_error("(+ 1)", &mismatch(), &mut env);
        assert_eval_error("(+ 1 2 3)", &mismatch(), &mut env);
        assert_eval_error("(+ 1 (> 2 1))", &mismatch(), &mut env);
        assert_eval_error("(< + 1)", &mismatch(), &mut env);
    }

    #[test]
    fn test_special_form_identifiers() {
        let ids = special_form_identifiers();
        assert!(ids.contains("if"));
        assert!(ids.contains("def"));
        assert_eq!(ids.len(), 2);
    }
}
