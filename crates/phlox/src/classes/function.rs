//! The `Function` class. Functions render through `__toString`; calling goes
//! through the evaluator, not the method table.

use super::{ClassDef, expect_args};
use crate::{errors::RunResult, value::Value};

pub(super) fn class() -> ClassDef {
    ClassDef::new("Function", &[("__toString", function_to_string)])
}

fn function_to_string(this: &Value, args: &[Value]) -> RunResult<Value> {
    expect_args("__toString", args, 0)?;
    let function = match this {
        Value::Function(f) => f,
        _ => unreachable!("Function method dispatched on {}", this.type_name()),
    };
    Ok(Value::string(format!(
        "<object of type Function, {}>",
        function.signature()
    )))
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use pretty_assertions::assert_eq;

    use super::*;
    use crate::{
        builtins::Builtin,
        expressions::{ArgSpec, Block},
        value::{FunctionValue, UserFunction},
    };

    #[test]
    fn renders_user_function_signature() {
        let function = Value::Function(FunctionValue::User(Rc::new(UserFunction {
            name: "greet".to_owned(),
            args: vec![
                ArgSpec {
                    type_name: Some("String".to_owned()),
                    name: "who".to_owned(),
                    default: None,
                    variadic: false,
                    by_ref: false,
                },
                ArgSpec {
                    type_name: None,
                    name: "times".to_owned(),
                    default: None,
                    variadic: false,
                    by_ref: false,
                },
            ],
            captures: vec![],
            body: Block::default(),
            anonymous: false,
        })));
        let f = function.class().find_method("__toString").unwrap();
        assert_eq!(
            f(&function, &[]).unwrap(),
            Value::string("<object of type Function, greet(String $who, $times)>")
        );
    }

    #[test]
    fn renders_internal_function_signature() {
        let function = Value::Function(FunctionValue::Internal(Builtin::Println));
        let f = function.class().find_method("__toString").unwrap();
        assert_eq!(
            f(&function, &[]).unwrap(),
            Value::string("<object of type Function, println(...$args)>")
        );
    }
}
