//! The `os\args` built-in.

use crate::{errors::RunResult, value::Value};

/// The process arguments after the program name, as an Array of String.
pub(crate) fn builtin_os_args(argv: &[String]) -> RunResult<Value> {
    Ok(Value::array(argv.iter().map(|arg| Value::string(arg.as_str())).collect()))
}
