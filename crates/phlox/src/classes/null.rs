//! The `Null` class. `__toString` yields the empty string; nothing else is
//! defined.

use super::{ClassDef, expect_args};
use crate::{errors::RunResult, value::Value};

pub(super) fn class() -> ClassDef {
    ClassDef::new("Null", &[("__toString", null_to_string)])
}

fn null_to_string(_this: &Value, args: &[Value]) -> RunResult<Value> {
    expect_args("__toString", args, 0)?;
    Ok(Value::string(""))
}
