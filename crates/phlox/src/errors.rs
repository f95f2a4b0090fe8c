//! Runtime and front-end error values.
//!
//! Every fallible operation in the interpreter returns [`RunResult`]; errors
//! are plain values that short-circuit to the nearest caller and never unwind
//! the host. Rendering with source context (`file:line:col` plus caret) is
//! done by [`crate::diagnostics`] at the process boundary.

use std::fmt;

use strum::{Display, IntoStaticStr};

/// Result type alias for operations that can produce an interpreter error.
pub type RunResult<T> = Result<T, RunError>;

/// The closed set of error categories the interpreter can surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, IntoStaticStr)]
pub enum ErrorKind {
    /// Malformed numeric literal, unterminated string or block comment.
    #[strum(serialize = "LexError")]
    Lex,
    /// Unexpected token, illegal assignment target, malformed declaration.
    #[strum(serialize = "ParseError")]
    Parse,
    /// Undefined global or function, redefinition of a write-once name.
    #[strum(serialize = "NameError")]
    Name,
    /// Operator without a resolving magic method, bad conversion,
    /// method not found on a class.
    #[strum(serialize = "TypeError")]
    Type,
    /// Division by zero, out-of-range index.
    #[strum(serialize = "ValueError")]
    Value,
    /// Internal function called with the wrong number of arguments.
    #[strum(serialize = "ArityError")]
    Arity,
    /// A configured resource limit (recursion depth, steps, time) was hit.
    #[strum(serialize = "ResourceError")]
    Resource,
}

/// A single interpreter error: category, message, and the source offset it
/// originated from, when one is known.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunError {
    pub kind: ErrorKind,
    pub message: String,
    pub offset: Option<usize>,
}

impl RunError {
    pub(crate) fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            offset: None,
        }
    }

    pub(crate) fn at(kind: ErrorKind, message: impl Into<String>, offset: usize) -> Self {
        Self {
            kind,
            message: message.into(),
            offset: Some(offset),
        }
    }

    pub(crate) fn lex(message: impl Into<String>, offset: usize) -> Self {
        Self::at(ErrorKind::Lex, message, offset)
    }

    pub(crate) fn parse(message: impl Into<String>, offset: usize) -> Self {
        Self::at(ErrorKind::Parse, message, offset)
    }

    pub(crate) fn name(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Name, message)
    }

    pub(crate) fn type_error(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Type, message)
    }

    pub(crate) fn value(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Value, message)
    }

    pub(crate) fn arity(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Arity, message)
    }

    /// Attaches `offset` if the error does not already carry one.
    ///
    /// Evaluator helpers create errors without positions; the node-level
    /// dispatcher stamps the current node's offset exactly once, so the
    /// innermost location wins.
    #[must_use]
    pub(crate) fn ensure_offset(mut self, offset: usize) -> Self {
        if self.offset.is_none() {
            self.offset = Some(offset);
        }
        self
    }
}

impl fmt::Display for RunError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

impl std::error::Error for RunError {}
