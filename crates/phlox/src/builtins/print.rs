//! The `print` and `println` built-ins.

use crate::{classes, errors::RunResult, io::PrintWriter, value::Value};

/// Converts each argument through `__toString` and writes it.
pub(crate) fn builtin_print(args: &[Value], writer: &mut impl PrintWriter) -> RunResult<Value> {
    for arg in args {
        let text = classes::to_string(arg)?;
        writer.stdout_write(&text)?;
    }
    Ok(Value::Null)
}

/// Like `print`, with a trailing newline.
pub(crate) fn builtin_println(args: &[Value], writer: &mut impl PrintWriter) -> RunResult<Value> {
    builtin_print(args, writer)?;
    writer.stdout_push('\n')?;
    Ok(Value::Null)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::io::CollectStringPrint;

    #[test]
    fn println_converts_each_argument_and_appends_newline() {
        let mut writer = CollectStringPrint::new();
        builtin_println(&[Value::Int(10), Value::string(" and "), Value::Null], &mut writer).unwrap();
        assert_eq!(writer.output(), "10 and \n");
    }

    #[test]
    fn print_appends_nothing() {
        let mut writer = CollectStringPrint::new();
        builtin_print(&[Value::Int(1)], &mut writer).unwrap();
        builtin_print(&[Value::Int(2)], &mut writer).unwrap();
        assert_eq!(writer.output(), "12");
    }

    #[test]
    fn print_of_value_without_to_string_fails() {
        let mut writer = CollectStringPrint::new();
        // Class values do not define __toString
        let class = Value::Class(crate::value::ClassValue::Builtin(crate::classes::int_class()));
        assert!(builtin_print(&[class], &mut writer).is_err());
    }
}
