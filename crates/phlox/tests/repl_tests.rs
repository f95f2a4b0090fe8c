//! Behavioral tests for `ReplSession`, the persistent interactive session.

use phlox::{CollectStringPrint, ErrorKind, NoPrint, Object, ReplSession};
use pretty_assertions::assert_eq;

#[test]
fn fresh_session_reports_its_script_name() {
    let session = ReplSession::new("<console>");
    assert_eq!(session.script_name(), "<console>");
}

#[test]
fn fresh_session_has_builtins_registered() {
    let session = ReplSession::new("<console>");
    let names = session.global_names();
    for expected in ["print", "println", "exit", "math\\random", "os\\args", "Int", "String", "Array"] {
        assert!(names.iter().any(|n| n == expected), "missing {expected}");
    }
}

#[test]
fn expression_value_is_returned() {
    let mut session = ReplSession::new("<console>");
    assert_eq!(session.execute("1 + 2", &mut NoPrint).unwrap(), Object::Int(3));
}

#[test]
fn assignment_value_is_the_assigned_value() {
    let mut session = ReplSession::new("<console>");
    assert_eq!(session.execute("$x = 42", &mut NoPrint).unwrap(), Object::Int(42));
}

#[test]
fn state_accumulates_across_lines() {
    let mut session = ReplSession::new("<console>");
    session.execute("$x = 40", &mut NoPrint).unwrap();
    session.execute("function bump($n) { return $n + 2 }", &mut NoPrint).unwrap();
    assert_eq!(session.execute("bump($x)", &mut NoPrint).unwrap(), Object::Int(42));
}

#[test]
fn arrays_stay_mutable_across_lines() {
    let mut session = ReplSession::new("<console>");
    session.execute("$xs = [1]", &mut NoPrint).unwrap();
    session.execute("$xs->append(2)", &mut NoPrint).unwrap();
    assert_eq!(
        session.execute("$xs", &mut NoPrint).unwrap(),
        Object::Array(vec![Object::Int(1), Object::Int(2)])
    );
}

#[test]
fn print_output_goes_through_the_writer() {
    let mut session = ReplSession::new("<console>");
    let mut writer = CollectStringPrint::new();
    session.execute("println('hello')", &mut writer).unwrap();
    assert_eq!(writer.output(), "hello\n");
}

#[test]
fn parse_error_leaves_state_untouched() {
    let mut session = ReplSession::new("<console>");
    session.execute("$x = 1", &mut NoPrint).unwrap();
    let err = session.execute("$x = ;", &mut NoPrint).unwrap_err();
    assert_eq!(err.kind, ErrorKind::Parse);
    assert_eq!(session.execute("$x", &mut NoPrint).unwrap(), Object::Int(1));
}

#[test]
fn runtime_error_reports_against_console_source() {
    let mut session = ReplSession::new("<console>");
    let err = session.execute("println(10 / 0)", &mut NoPrint).unwrap_err();
    assert_eq!(err.kind, ErrorKind::Value);
    let location = err.location.expect("has a location");
    assert_eq!(location.file, "<console>");
    assert_eq!(location.line, 1);
}

#[test]
fn evaluation_continues_after_an_error() {
    let mut session = ReplSession::new("<console>");
    assert!(session.execute("missing()", &mut NoPrint).is_err());
    assert_eq!(session.execute("2 + 2", &mut NoPrint).unwrap(), Object::Int(4));
}

#[test]
fn function_redeclaration_across_lines_fails() {
    let mut session = ReplSession::new("<console>");
    session.execute("function f() { return 1 }", &mut NoPrint).unwrap();
    let err = session.execute("function f() { return 2 }", &mut NoPrint).unwrap_err();
    assert_eq!(err.kind, ErrorKind::Name);
    // the original binding is still in place
    assert_eq!(session.execute("f()", &mut NoPrint).unwrap(), Object::Int(1));
}

#[test]
fn namespace_declared_on_one_line_applies_to_later_lines() {
    let mut session = ReplSession::new("<console>");
    session.execute("namespace M", &mut NoPrint).unwrap();
    session.execute("function g() { return 7 }", &mut NoPrint).unwrap();
    assert_eq!(session.execute("g()", &mut NoPrint).unwrap(), Object::Int(7));
    assert!(session.global_names().iter().any(|n| n == "M\\g"));
}

#[test]
fn use_imports_persist_across_lines() {
    let mut session = ReplSession::new("<console>");
    session.execute("namespace lib", &mut NoPrint).unwrap();
    session.execute("function square($x) { return $x * $x }", &mut NoPrint).unwrap();
    session.execute("namespace app", &mut NoPrint).unwrap();
    session.execute("use lib\\square", &mut NoPrint).unwrap();
    assert_eq!(session.execute("square(3)", &mut NoPrint).unwrap(), Object::Int(9));
}

#[test]
fn configured_args_are_visible() {
    let mut session = ReplSession::new("<console>").with_args(vec!["one".to_owned()]);
    assert_eq!(
        session.execute("os\\args()", &mut NoPrint).unwrap(),
        Object::Array(vec![Object::Str("one".to_owned())])
    );
}
