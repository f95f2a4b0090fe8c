//! The `Int` class: arithmetic, comparisons, conversions.
//!
//! Arithmetic requires an Int right operand; comparisons coerce the right
//! operand through `__toInt`. All arithmetic is checked — overflow is a
//! value error, never a wrap or a panic.

use super::{ClassDef, expect_args, to_int};
use crate::{
    errors::{RunError, RunResult},
    value::Value,
};

pub(super) fn class() -> ClassDef {
    ClassDef::new(
        "Int",
        &[
            ("__add", int_add),
            ("__sub", int_sub),
            ("__mul", int_mul),
            ("__div", int_div),
            ("__mod", int_mod),
            ("__equal", int_equal),
            ("__identical", int_identical),
            ("__gt", int_gt),
            ("__lt", int_lt),
            ("__gte", int_gte),
            ("__lte", int_lte),
            ("__toString", int_to_string),
            ("__toInt", int_to_int),
            ("__toBoolean", int_to_boolean),
        ],
    )
}

fn receiver(this: &Value) -> i64 {
    match this {
        Value::Int(v) => *v,
        // dispatch always goes through class_of, so the receiver is an Int
        _ => unreachable!("Int method dispatched on {}", this.type_name()),
    }
}

/// Extracts the Int right operand of an arithmetic operator.
fn operand(method: &str, args: &[Value]) -> RunResult<i64> {
    let args = expect_args(method, args, 1)?;
    match &args[0] {
        Value::Int(v) => Ok(*v),
        other => Err(RunError::type_error(format!(
            "unsupported operand of class {} for {method}",
            other.type_name()
        ))),
    }
}

fn checked(result: Option<i64>) -> RunResult<Value> {
    result
        .map(Value::Int)
        .ok_or_else(|| RunError::value("integer overflow"))
}

fn int_add(this: &Value, args: &[Value]) -> RunResult<Value> {
    checked(receiver(this).checked_add(operand("__add", args)?))
}

fn int_sub(this: &Value, args: &[Value]) -> RunResult<Value> {
    checked(receiver(this).checked_sub(operand("__sub", args)?))
}

fn int_mul(this: &Value, args: &[Value]) -> RunResult<Value> {
    checked(receiver(this).checked_mul(operand("__mul", args)?))
}

fn int_div(this: &Value, args: &[Value]) -> RunResult<Value> {
    let divisor = operand("__div", args)?;
    if divisor == 0 {
        return Err(RunError::value("division by zero is forbidden"));
    }
    checked(receiver(this).checked_div(divisor))
}

/// Truncated modulus, matching the sign of the dividend.
fn int_mod(this: &Value, args: &[Value]) -> RunResult<Value> {
    let divisor = operand("__mod", args)?;
    if divisor == 0 {
        return Err(RunError::value("modulo by zero is forbidden"));
    }
    checked(receiver(this).checked_rem(divisor))
}

/// Comparisons coerce the argument through `__toInt` when it is not an Int.
fn compare_operand(method: &str, args: &[Value]) -> RunResult<i64> {
    let args = expect_args(method, args, 1)?;
    to_int(&args[0])
}

fn int_equal(this: &Value, args: &[Value]) -> RunResult<Value> {
    Ok(Value::Bool(receiver(this) == compare_operand("__equal", args)?))
}

/// `===` does not coerce: a non-Int argument is simply not identical.
fn int_identical(this: &Value, args: &[Value]) -> RunResult<Value> {
    let args = expect_args("__identical", args, 1)?;
    Ok(Value::Bool(match &args[0] {
        Value::Int(v) => receiver(this) == *v,
        _ => false,
    }))
}

fn int_gt(this: &Value, args: &[Value]) -> RunResult<Value> {
    Ok(Value::Bool(receiver(this) > compare_operand("__gt", args)?))
}

fn int_lt(this: &Value, args: &[Value]) -> RunResult<Value> {
    Ok(Value::Bool(receiver(this) < compare_operand("__lt", args)?))
}

fn int_gte(this: &Value, args: &[Value]) -> RunResult<Value> {
    Ok(Value::Bool(receiver(this) >= compare_operand("__gte", args)?))
}

fn int_lte(this: &Value, args: &[Value]) -> RunResult<Value> {
    Ok(Value::Bool(receiver(this) <= compare_operand("__lte", args)?))
}

fn int_to_string(this: &Value, args: &[Value]) -> RunResult<Value> {
    expect_args("__toString", args, 0)?;
    Ok(Value::string(receiver(this).to_string()))
}

fn int_to_int(this: &Value, args: &[Value]) -> RunResult<Value> {
    expect_args("__toInt", args, 0)?;
    Ok(this.clone())
}

fn int_to_boolean(this: &Value, args: &[Value]) -> RunResult<Value> {
    expect_args("__toBoolean", args, 0)?;
    Ok(Value::Bool(receiver(this) != 0))
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::errors::ErrorKind;

    fn call(method: &str, this: i64, args: &[Value]) -> RunResult<Value> {
        let this = Value::Int(this);
        let f = this.class().find_method(method).expect("method exists");
        f(&this, args)
    }

    #[test]
    fn arithmetic_dispatch() {
        assert_eq!(call("__add", 5, &[Value::Int(5)]).unwrap(), Value::Int(10));
        assert_eq!(call("__sub", 5, &[Value::Int(5)]).unwrap(), Value::Int(0));
        assert_eq!(call("__mul", 5, &[Value::Int(5)]).unwrap(), Value::Int(25));
        assert_eq!(call("__div", 5, &[Value::Int(5)]).unwrap(), Value::Int(1));
        assert_eq!(call("__mod", 7, &[Value::Int(4)]).unwrap(), Value::Int(3));
    }

    #[test]
    fn truncated_modulus_follows_the_dividend_sign() {
        assert_eq!(call("__mod", -7, &[Value::Int(4)]).unwrap(), Value::Int(-3));
        assert_eq!(call("__mod", 7, &[Value::Int(-4)]).unwrap(), Value::Int(3));
    }

    #[test]
    fn div_mod_identity_holds() {
        for (a, b) in [(17, 5), (-17, 5), (17, -5), (-17, -5)] {
            let q = call("__div", a, &[Value::Int(b)]).unwrap();
            let r = call("__mod", a, &[Value::Int(b)]).unwrap();
            let (Value::Int(q), Value::Int(r)) = (q, r) else {
                panic!("expected ints");
            };
            assert_eq!(q * b + r, a);
        }
    }

    #[test]
    fn division_by_zero_is_a_value_error() {
        let err = call("__div", 10, &[Value::Int(0)]).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Value);
        assert!(err.message.contains("division by zero"), "{}", err.message);
    }

    #[test]
    fn overflow_is_a_value_error_not_a_wrap() {
        let err = call("__add", i64::MAX, &[Value::Int(1)]).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Value);
    }

    #[test]
    fn comparisons_coerce_via_to_int() {
        assert_eq!(call("__equal", 5, &[Value::string("5")]).unwrap(), Value::Bool(true));
        assert_eq!(call("__gt", 5, &[Value::Int(3)]).unwrap(), Value::Bool(true));
        assert_eq!(call("__lte", 5, &[Value::Int(5)]).unwrap(), Value::Bool(true));
    }

    #[test]
    fn identical_does_not_coerce() {
        assert_eq!(call("__identical", 5, &[Value::Int(5)]).unwrap(), Value::Bool(true));
        assert_eq!(call("__identical", 5, &[Value::string("5")]).unwrap(), Value::Bool(false));
    }

    #[test]
    fn arithmetic_rejects_non_int_operands() {
        let err = call("__add", 1, &[Value::Bool(true)]).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Type);
    }

    #[test]
    fn wrong_arity_is_an_arity_error() {
        let err = call("__add", 1, &[]).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Arity);
        assert!(err.message.contains("exactly 1 argument"), "{}", err.message);
    }

    #[test]
    fn conversions() {
        assert_eq!(call("__toString", -42, &[]).unwrap(), Value::string("-42"));
        assert_eq!(call("__toBoolean", 0, &[]).unwrap(), Value::Bool(false));
        assert_eq!(call("__toBoolean", 3, &[]).unwrap(), Value::Bool(true));
    }
}
