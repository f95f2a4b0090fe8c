//! The `Array` class: ordered, growable, indexable.
//!
//! `length` and `append` are ordinary methods reached through `->`; `__index`
//! and `__toString` back the `[ ]` operator and string conversion.

use std::{cell::RefCell, rc::Rc};

use super::{ClassDef, enter_render_depth, expect_args, to_int, to_string};
use crate::{
    errors::{RunError, RunResult},
    value::Value,
};

pub(super) fn class() -> ClassDef {
    ClassDef::new(
        "Array",
        &[
            ("__index", array_index),
            ("__identical", array_identical),
            ("__toString", array_to_string),
            ("length", array_length),
            ("append", array_append),
        ],
    )
}

fn receiver(this: &Value) -> &Rc<RefCell<Vec<Value>>> {
    match this {
        Value::Array(values) => values,
        _ => unreachable!("Array method dispatched on {}", this.type_name()),
    }
}

fn array_index(this: &Value, args: &[Value]) -> RunResult<Value> {
    let args = expect_args("__index", args, 1)?;
    let index = to_int(&args[0])?;
    let values = receiver(this).borrow();
    let position = usize::try_from(index).ok().filter(|&i| i < values.len());
    match position {
        Some(i) => Ok(values[i].clone()),
        None => Err(RunError::value(format!(
            "array index {index} out of range for length {}",
            values.len()
        ))),
    }
}

/// Arrays are mutable containers, so `===` compares identity, not contents.
fn array_identical(this: &Value, args: &[Value]) -> RunResult<Value> {
    let args = expect_args("__identical", args, 1)?;
    Ok(Value::Bool(match &args[0] {
        Value::Array(_) => this.id() == args[0].id(),
        _ => false,
    }))
}

/// `[e1, e2, …]`, each element through `__toString`. Bounded by the render
/// depth guard so self-referential arrays fail instead of recursing forever.
fn array_to_string(this: &Value, args: &[Value]) -> RunResult<Value> {
    expect_args("__toString", args, 0)?;
    let _guard = enter_render_depth()?;
    let values = receiver(this).borrow();
    let mut out = String::from("[");
    for (i, value) in values.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        out.push_str(&to_string(value)?);
    }
    out.push(']');
    Ok(Value::string(out))
}

fn array_length(this: &Value, args: &[Value]) -> RunResult<Value> {
    expect_args("length", args, 0)?;
    let length = receiver(this).borrow().len();
    Ok(Value::Int(i64::try_from(length).unwrap_or(i64::MAX)))
}

/// Appends every argument in order, growing the array in place.
fn array_append(this: &Value, args: &[Value]) -> RunResult<Value> {
    if args.is_empty() {
        return Err(RunError::arity("append takes at least one argument, 0 given"));
    }
    let mut values = receiver(this).borrow_mut();
    values.extend(args.iter().cloned());
    Ok(Value::Null)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::errors::ErrorKind;

    fn call(method: &str, this: &Value, args: &[Value]) -> RunResult<Value> {
        let f = this.class().find_method(method).expect("method exists");
        f(this, args)
    }

    #[test]
    fn preserves_insertion_order_in_rendering() {
        let array = Value::array(vec![Value::Int(1), Value::string("two"), Value::Null]);
        assert_eq!(call("__toString", &array, &[]).unwrap(), Value::string("[1, two, ]"));
    }

    #[test]
    fn index_is_zero_based_and_range_checked() {
        let array = Value::array(vec![Value::Int(10), Value::Int(20)]);
        assert_eq!(call("__index", &array, &[Value::Int(1)]).unwrap(), Value::Int(20));
        let err = call("__index", &array, &[Value::Int(2)]).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Value);
    }

    #[test]
    fn append_grows_in_place() {
        let array = Value::array(vec![Value::Int(1)]);
        call("append", &array, &[Value::Int(2), Value::Int(3)]).unwrap();
        assert_eq!(call("length", &array, &[]).unwrap(), Value::Int(3));
    }

    #[test]
    fn identical_compares_allocation_not_contents() {
        let a = Value::array(vec![Value::Int(1)]);
        let b = Value::array(vec![Value::Int(1)]);
        assert_eq!(call("__identical", &a, std::slice::from_ref(&a)).unwrap(), Value::Bool(true));
        assert_eq!(call("__identical", &a, std::slice::from_ref(&b)).unwrap(), Value::Bool(false));
        assert_eq!(call("__identical", &a, &[Value::Int(1)]).unwrap(), Value::Bool(false));
    }

    #[test]
    fn self_referential_array_fails_to_render() {
        let array = Value::array(vec![Value::Int(1)]);
        call("append", &array, std::slice::from_ref(&array)).unwrap();
        let err = call("__toString", &array, &[]).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Value);
    }
}
