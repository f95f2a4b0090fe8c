//! phlox — a tree-walking interpreter for a small, dynamically-typed
//! scripting language with PHP-flavoured syntax.
//!
//! The pipeline is strictly top-down: source text is tokenized by a
//! hand-written scanner with automatic statement-terminator insertion,
//! parsed by a Pratt parser into a typed AST, and evaluated directly by
//! walking that tree against a mutable context of variable scopes and a
//! flat globals table. Operators, indexing and conversions dispatch through
//! magic methods (`__add`, `__index`, `__toString`, …) on built-in classes.
//!
//! Embedders start with [`Runner`] for one-shot execution or
//! [`ReplSession`] for persistent interactive state; output and resource
//! limits are pluggable through [`PrintWriter`] and [`ResourceTracker`].

mod builtins;
mod classes;
mod context;
mod diagnostics;
mod errors;
mod eval;
pub mod expressions;
mod io;
mod object;
mod parse;
mod printer;
mod repl;
mod resource;
mod run;
mod scanner;
pub mod token;
mod tracer;
mod value;

pub use crate::{
    diagnostics::{Diagnostic, Formatter, SourceLocation},
    errors::{ErrorKind, RunError, RunResult},
    expressions::Module,
    io::{CollectStringPrint, NoPrint, PrintWriter, StdPrint},
    object::Object,
    printer::print_module,
    repl::ReplSession,
    resource::{
        DEFAULT_MAX_RECURSION_DEPTH, LimitedTracker, NoLimitTracker, ResourceError, ResourceLimits, ResourceTracker,
    },
    run::Runner,
    tracer::{EvalTracer, NoopTracer, RecordingTracer, StderrTracer, TraceEvent},
};
