//! Public value type returned across the API boundary.
//!
//! The interpreter's internal values are reference-counted and mutable;
//! [`Object`] is the detached, host-friendly mirror handed back by
//! [`Runner::run`](crate::Runner::run) and
//! [`ReplSession::execute`](crate::ReplSession::execute).

use std::fmt;

use crate::value::Value;

/// A snapshot of a runtime value.
#[derive(Debug, Clone, PartialEq)]
pub enum Object {
    Null,
    Bool(bool),
    Int(i64),
    Str(String),
    Array(Vec<Object>),
    /// A function value, carrying its rendered signature.
    Function(String),
    /// A class value, carrying the class name.
    Class(String),
}

/// Nested arrays deeper than this snapshot as `Null` rather than recursing
/// forever through a self-referential array.
const MAX_SNAPSHOT_DEPTH: usize = 64;

pub(crate) fn from_value(value: &Value) -> Object {
    snapshot(value, 0)
}

fn snapshot(value: &Value, depth: usize) -> Object {
    match value {
        Value::Null => Object::Null,
        Value::Bool(b) => Object::Bool(*b),
        Value::Int(v) => Object::Int(*v),
        Value::Str(s) => Object::Str(s.to_string()),
        Value::Array(values) => {
            if depth >= MAX_SNAPSHOT_DEPTH {
                return Object::Null;
            }
            Object::Array(values.borrow().iter().map(|v| snapshot(v, depth + 1)).collect())
        }
        Value::Function(function) => Object::Function(function.signature()),
        Value::Class(class) => Object::Class(class.name().to_owned()),
        Value::Returned(inner) => snapshot(inner, depth),
    }
}

/// Renders like the language's `__toString` conversions: Null is empty,
/// booleans are words, arrays bracket their elements.
impl fmt::Display for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => Ok(()),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(v) => write!(f, "{v}"),
            Self::Str(s) => write!(f, "{s}"),
            Self::Array(values) => {
                write!(f, "[")?;
                for (i, value) in values.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{value}")?;
                }
                write!(f, "]")
            }
            Self::Function(signature) => write!(f, "<object of type Function, {signature}>"),
            Self::Class(name) => write!(f, "<class {name}>"),
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn snapshots_detach_from_the_runtime_value() {
        let value = Value::array(vec![Value::Int(1), Value::string("x"), Value::Null]);
        let object = from_value(&value);
        assert_eq!(
            object,
            Object::Array(vec![Object::Int(1), Object::Str("x".to_owned()), Object::Null])
        );
        assert_eq!(object.to_string(), "[1, x, ]");
    }

    #[test]
    fn self_referential_arrays_are_truncated() {
        let value = Value::array(vec![]);
        if let Value::Array(values) = &value {
            values.borrow_mut().push(value.clone());
        }
        // terminates and yields a finitely nested snapshot
        let object = from_value(&value);
        assert!(matches!(object, Object::Array(_)));
    }
}
