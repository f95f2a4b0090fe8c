//! The `Boolean` class.
//!
//! Booleans define no operators — arithmetic or ordering on a Boolean left
//! operand fails dispatch. Only identity and the two conversions exist.

use super::{ClassDef, expect_args};
use crate::{errors::RunResult, value::Value};

pub(super) fn class() -> ClassDef {
    ClassDef::new(
        "Boolean",
        &[
            ("__identical", boolean_identical),
            ("__toString", boolean_to_string),
            ("__toBoolean", boolean_to_boolean),
        ],
    )
}

fn receiver(this: &Value) -> bool {
    match this {
        Value::Bool(b) => *b,
        _ => unreachable!("Boolean method dispatched on {}", this.type_name()),
    }
}

fn boolean_identical(this: &Value, args: &[Value]) -> RunResult<Value> {
    let args = expect_args("__identical", args, 1)?;
    Ok(Value::Bool(match &args[0] {
        Value::Bool(other) => receiver(this) == *other,
        _ => false,
    }))
}

fn boolean_to_string(this: &Value, args: &[Value]) -> RunResult<Value> {
    expect_args("__toString", args, 0)?;
    Ok(Value::string(if receiver(this) { "true" } else { "false" }))
}

fn boolean_to_boolean(this: &Value, args: &[Value]) -> RunResult<Value> {
    expect_args("__toBoolean", args, 0)?;
    Ok(this.clone())
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn booleans_define_no_comparison_operators() {
        let class = Value::Bool(true).class();
        assert!(class.find_method("__equal").is_none());
        assert!(class.find_method("__gt").is_none());
        assert!(class.find_method("__add").is_none());
    }

    #[test]
    fn renders_as_words() {
        let this = Value::Bool(true);
        let f = this.class().find_method("__toString").unwrap();
        assert_eq!(f(&this, &[]).unwrap(), Value::string("true"));
    }

    #[test]
    fn identical_requires_same_variant() {
        let this = Value::Bool(false);
        let f = this.class().find_method("__identical").unwrap();
        assert_eq!(f(&this, &[Value::Bool(false)]).unwrap(), Value::Bool(true));
        assert_eq!(f(&this, &[Value::Int(0)]).unwrap(), Value::Bool(false));
    }
}
