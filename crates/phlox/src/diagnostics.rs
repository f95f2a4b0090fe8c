//! Rendering of [`RunError`]s against their source text.
//!
//! The formatter maps a character offset back to a 1-based line, a 0-based
//! column and the text of that line, and renders the standard diagnostic
//! shape:
//!
//! ```text
//! ParseError: expected ')', got '{' in demo.phx:3:12
//!
//! function f( {
//!             ^
//! ```

use std::fmt;

use crate::errors::{ErrorKind, RunError};

/// A resolved source position: 1-based line, 0-based column within the line,
/// and the full text of the line itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceLocation {
    pub file: String,
    pub line: usize,
    pub column: usize,
    pub line_text: String,
}

/// A fully rendered interpreter error, ready for display at the process
/// boundary (CLI or REPL).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub kind: ErrorKind,
    pub message: String,
    pub location: Option<SourceLocation>,
    /// Function names active when the error surfaced, innermost first.
    pub call_stack: Vec<String>,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.location {
            Some(loc) => {
                writeln!(
                    f,
                    "{}: {} in {}:{}:{}",
                    self.kind, self.message, loc.file, loc.line, loc.column
                )?;
                writeln!(f)?;
                writeln!(f, "{}", loc.line_text)?;
                write!(f, "{}^", " ".repeat(loc.column))?;
            }
            None => {
                write!(f, "{}: {}", self.kind, self.message)?;
            }
        }
        if !self.call_stack.is_empty() {
            write!(f, "\n\ncall stack:")?;
            for name in &self.call_stack {
                write!(f, "\n  {name}")?;
            }
        }
        Ok(())
    }
}

impl std::error::Error for Diagnostic {}

/// Maps offsets within a single source text back to line/column positions.
pub struct Formatter<'a> {
    filename: &'a str,
    source: &'a str,
}

impl<'a> Formatter<'a> {
    #[must_use]
    pub fn new(filename: &'a str, source: &'a str) -> Self {
        Self { filename, source }
    }

    /// Renders a [`RunError`] into a [`Diagnostic`], resolving its offset
    /// against the source when it carries one.
    #[must_use]
    pub fn render(&self, error: RunError, call_stack: Vec<String>) -> Diagnostic {
        let location = error.offset.map(|offset| self.locate(offset));
        Diagnostic {
            kind: error.kind,
            message: error.message,
            location,
            call_stack,
        }
    }

    /// Resolves a character offset to its line, column and line text.
    ///
    /// Offsets at or past the end of the source (the EOF token) resolve to
    /// the last line.
    fn locate(&self, offset: usize) -> SourceLocation {
        let mut line = 1;
        let mut line_start = 0;
        let offset = offset.min(self.source.chars().count());
        for (i, c) in self.source.chars().enumerate() {
            if i >= offset {
                break;
            }
            if c == '\n' {
                line += 1;
                line_start = i + 1;
            }
        }
        let line_text: String = self
            .source
            .chars()
            .skip(line_start)
            .take_while(|&c| c != '\n')
            .collect();
        SourceLocation {
            file: self.filename.to_owned(),
            line,
            column: offset - line_start,
            line_text,
        }
    }
}
