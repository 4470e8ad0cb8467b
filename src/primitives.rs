use crate::evaluator::{EvalError, EvalResult};
use crate::source::Span;
use crate::types::{Number, Value};
use std::cmp::Ordering;

// Every primitive is binary.
fn expect_two<'a>(
    args: &'a [Value],
    span: Span,
    name: &str,
) -> EvalResult<(&'a Value, &'a Value)> {
    match args {
        [left, right] => Ok((left, right)),
        _ => Err(EvalError::mismatch(
            format!(
                "Primitive '{}' expects exactly 2 arguments, got {}",
                name,
                args.len()
            ),
            span,
        )),
    }
}

fn expect_number(value: &Value, span: Span, name: &str, arg_pos: usize) -> EvalResult<Number> {
    match value {
        Value::Number(n) => Ok(*n),
        other => Err(EvalError::mismatch(
            format!(
                "Primitive '{}' expects a number for argument {}, got {}",
                name,
                arg_pos,
                other.type_name()
            ),
            span,
        )),
    }
}

fn expect_numbers(args: &[Value], span: Span, name: &str) -> EvalResult<(Number, Number)> {
    let (left, right) = expect_two(args, span, name)?;
    Ok((
        expect_number(left, span, name, 1)?,
        expect_number(right, span, name, 2)?,
    ))
}

/// Applies an integer operation when both sides are integers and it does not
/// overflow; otherwise falls back to float arithmetic.
fn arithmetic(
    args: &[Value],
    span: Span,
    name: &str,
    int_op: fn(i64, i64) -> Option<i64>,
    float_op: fn(f64, f64) -> f64,
) -> EvalResult {
    let (left, right) = expect_numbers(args, span, name)?;
    let result = match (left, right) {
        (Number::Int(a), Number::Int(b)) => match int_op(a, b) {
            Some(n) => Number::Int(n),
            None => Number::Float(float_op(a as f64, b as f64)),
        },
        (a, b) => Number::Float(float_op(a.as_f64(), b.as_f64())),
    };
    Ok(Value::Number(result))
}

fn compare(args: &[Value], span: Span, name: &str, accept: fn(Ordering) -> bool) -> EvalResult {
    let (left, right) = expect_numbers(args, span, name)?;
    // Unordered (NaN) compares false under every operator
    let result = left.compare(right).is_some_and(accept);
    Ok(Value::Boolean(result))
}

pub fn prim_add(args: &[Value], span: Span) -> EvalResult {
    arithmetic(args, span, "+", i64::checked_add, |a, b| a + b)
}

pub fn prim_sub(args: &[Value], span: Span) -> EvalResult {
    arithmetic(args, span, "-", i64::checked_sub, |a, b| a - b)
}

pub fn prim_mul(args: &[Value], span: Span) -> EvalResult {
    arithmetic(args, span, "*", i64::checked_mul, |a, b| a * b)
}

/// True division: the quotient is always a float, `(/ 1 2)` is `0.5`.
pub fn prim_div(args: &[Value], span: Span) -> EvalResult {
    let (left, right) = expect_numbers(args, span, "/")?;
    if right.is_zero() {
        return Err(EvalError::DivisionByZero { span });
    }
    Ok(Value::Number(Number::Float(left.as_f64() / right.as_f64())))
}

pub fn prim_greater_than(args: &[Value], span: Span) -> EvalResult {
    compare(args, span, ">", Ordering::is_gt)
}

pub fn prim_less_than(args: &[Value], span: Span) -> EvalResult {
    compare(args, span, "<", Ordering::is_lt)
}

pub fn prim_greater_than_or_equals(args: &[Value], span: Span) -> EvalResult {
    compare(args, span, ">=", Ordering::is_ge)
}

pub fn prim_less_than_or_equals(args: &[Value], span: Span) -> EvalResult {
    compare(args, span, "<=", Ordering::is_le)
}

/// Numeric equality across ints and floats, or equality of two booleans.
pub fn prim_equals(args: &[Value], span: Span) -> EvalResult {
    let (left, right) = expect_two(args, span, "=")?;
    match (left, right) {
        (Value::Boolean(a), Value::Boolean(b)) => Ok(Value::Boolean(a == b)),
        _ => compare(args, span, "=", Ordering::is_eq),
    }
}
