//! The `String` class: concatenation, repetition, indexing, parsing.

use std::rc::Rc;

use super::{ClassDef, expect_args, to_int, to_string};
use crate::{
    errors::{RunError, RunResult},
    value::Value,
};

/// Upper bound on the character count `__mul` may produce.
const MAX_REPEAT_CHARS: u64 = 100_000_000;

pub(super) fn class() -> ClassDef {
    ClassDef::new(
        "String",
        &[
            ("__add", string_concat),
            ("__mul", string_repeat),
            ("__equal", string_equal),
            ("__identical", string_identical),
            ("__index", string_index),
            ("__toString", string_to_string),
            ("__toInt", string_to_int),
        ],
    )
}

fn receiver(this: &Value) -> &Rc<str> {
    match this {
        Value::Str(s) => s,
        _ => unreachable!("String method dispatched on {}", this.type_name()),
    }
}

/// `+` concatenates; the right operand is coerced through `__toString`.
fn string_concat(this: &Value, args: &[Value]) -> RunResult<Value> {
    let args = expect_args("__add", args, 1)?;
    let right = to_string(&args[0])?;
    let mut result = receiver(this).to_string();
    result.push_str(&right);
    Ok(Value::string(result))
}

/// `*` repeats; the right operand is coerced through `__toInt`. A count of
/// zero or less yields the empty string.
fn string_repeat(this: &Value, args: &[Value]) -> RunResult<Value> {
    let args = expect_args("__mul", args, 1)?;
    let count = to_int(&args[0])?;
    let s = receiver(this);
    if count <= 0 {
        return Ok(Value::string(""));
    }
    let chars = s.chars().count() as u64;
    if chars.saturating_mul(count.unsigned_abs()) > MAX_REPEAT_CHARS {
        return Err(RunError::value("string repeat result is too large"));
    }
    #[expect(clippy::cast_possible_truncation, reason = "bounded by MAX_REPEAT_CHARS")]
    let count = count as usize;
    Ok(Value::string(s.repeat(count)))
}

fn string_equal(this: &Value, args: &[Value]) -> RunResult<Value> {
    let args = expect_args("__equal", args, 1)?;
    Ok(Value::Bool(match &args[0] {
        Value::Str(other) => receiver(this) == other,
        _ => false,
    }))
}

fn string_identical(this: &Value, args: &[Value]) -> RunResult<Value> {
    string_equal(this, args)
}

/// 0-based character index; out of range is an error.
fn string_index(this: &Value, args: &[Value]) -> RunResult<Value> {
    let args = expect_args("__index", args, 1)?;
    let index = to_int(&args[0])?;
    let s = receiver(this);
    let length = s.chars().count();
    let position = usize::try_from(index).ok().filter(|&i| i < length);
    match position {
        Some(i) => {
            let c = s.chars().nth(i).expect("index checked against length");
            Ok(Value::string(c.to_string()))
        }
        None => Err(RunError::value(format!(
            "string index {index} out of range for length {length}"
        ))),
    }
}

fn string_to_string(this: &Value, args: &[Value]) -> RunResult<Value> {
    expect_args("__toString", args, 0)?;
    Ok(this.clone())
}

/// Base-10 parse; anything non-numeric is a conversion error.
fn string_to_int(this: &Value, args: &[Value]) -> RunResult<Value> {
    expect_args("__toInt", args, 0)?;
    let s = receiver(this);
    s.parse::<i64>()
        .map(Value::Int)
        .map_err(|_| RunError::type_error(format!("can not parse '{s}' as Int")))
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::errors::ErrorKind;

    fn call(method: &str, this: &str, args: &[Value]) -> RunResult<Value> {
        let this = Value::string(this);
        let f = this.class().find_method(method).expect("method exists");
        f(&this, args)
    }

    #[test]
    fn concat_coerces_right_operand() {
        assert_eq!(
            call("__add", "abc", &[Value::string("def")]).unwrap(),
            Value::string("abcdef")
        );
        assert_eq!(call("__add", "n = ", &[Value::Int(5)]).unwrap(), Value::string("n = 5"));
    }

    #[test]
    fn repeat_coerces_count_via_to_int() {
        assert_eq!(call("__mul", "abc", &[Value::Int(3)]).unwrap(), Value::string("abcabcabc"));
        assert_eq!(call("__mul", "ab", &[Value::string("2")]).unwrap(), Value::string("abab"));
        assert_eq!(call("__mul", "abc", &[Value::Int(0)]).unwrap(), Value::string(""));
        assert_eq!(call("__mul", "abc", &[Value::Int(-2)]).unwrap(), Value::string(""));
    }

    #[test]
    fn parse_round_trips_decimal_digits() {
        assert_eq!(call("__toInt", "123", &[]).unwrap(), Value::Int(123));
        let err = call("__toInt", "12x", &[]).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Type);
    }

    #[test]
    fn index_returns_single_character() {
        assert_eq!(call("__index", "abc", &[Value::Int(0)]).unwrap(), Value::string("a"));
        assert_eq!(call("__index", "abc", &[Value::Int(2)]).unwrap(), Value::string("c"));
    }

    #[test]
    fn index_at_length_is_an_error() {
        let err = call("__index", "abc", &[Value::Int(3)]).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Value);
    }

    #[test]
    fn index_on_empty_string_is_an_error() {
        let err = call("__index", "", &[Value::Int(0)]).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Value);
    }

    #[test]
    fn negative_index_is_an_error() {
        let err = call("__index", "abc", &[Value::Int(-1)]).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Value);
    }

    #[test]
    fn index_counts_characters_not_bytes() {
        assert_eq!(call("__index", "héllo", &[Value::Int(1)]).unwrap(), Value::string("é"));
    }
}
