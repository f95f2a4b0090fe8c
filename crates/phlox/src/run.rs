//! Public interface for running phlox code.

use crate::{
    builtins,
    context::Context,
    diagnostics::{Diagnostic, Formatter},
    eval::{EvalState, Evaluator},
    expressions::Module,
    io::{PrintWriter, StdPrint},
    object::{self, Object},
    parse::parse,
    resource::{NoLimitTracker, ResourceTracker},
    tracer::{EvalTracer, NoopTracer},
};

/// Primary interface for running phlox code.
///
/// `Runner::new` scans and parses the source (stripping a leading `<?php`
/// open tag); the `run` family evaluates the module against a fresh context
/// seeded with the built-in globals.
///
/// # Example
/// ```
/// use phlox::{NoLimitTracker, NoPrint, Object, Runner};
///
/// let runner = Runner::new("1 + 2".to_owned(), "demo.phx").unwrap();
/// let result = runner.run(NoLimitTracker, &mut NoPrint).unwrap();
/// assert_eq!(result, Object::Int(3));
/// ```
#[derive(Debug, Clone)]
pub struct Runner {
    module: Module,
    source: String,
    script_name: String,
    argv: Vec<String>,
}

impl Runner {
    /// Parses the given code. No evaluation happens yet.
    ///
    /// # Errors
    /// Returns a rendered [`Diagnostic`] when the code fails to scan or
    /// parse.
    pub fn new(code: String, script_name: &str) -> Result<Self, Diagnostic> {
        let source = strip_open_tag(code);
        let module =
            parse(&source).map_err(|error| Formatter::new(script_name, &source).render(error, Vec::new()))?;
        Ok(Self {
            module,
            source,
            script_name: script_name.to_owned(),
            argv: Vec::new(),
        })
    }

    /// Sets the arguments exposed to the script through `os\args()`.
    #[must_use]
    pub fn with_args(mut self, argv: Vec<String>) -> Self {
        self.argv = argv;
        self
    }

    /// The source that was parsed, open tag stripped.
    #[must_use]
    pub fn code(&self) -> &str {
        &self.source
    }

    #[must_use]
    pub fn script_name(&self) -> &str {
        &self.script_name
    }

    /// The parsed module, e.g. for serialization or pretty-printing.
    #[must_use]
    pub fn module(&self) -> &Module {
        &self.module
    }

    /// Evaluates the module to completion.
    ///
    /// # Arguments
    /// * `tracker` - resource tracker enforcing recursion/step/time budgets
    /// * `print` - writer receiving `print`/`println` output
    pub fn run(&self, tracker: impl ResourceTracker, print: &mut impl PrintWriter) -> Result<Object, Diagnostic> {
        self.run_with(tracker, print, NoopTracer).map(|(object, _)| object)
    }

    /// Evaluates with no configured limits, printing to stdout.
    pub fn run_no_limits(&self) -> Result<Object, Diagnostic> {
        self.run(NoLimitTracker, &mut StdPrint)
    }

    /// Evaluates with an explicit tracer, returning it alongside the result
    /// for inspection.
    pub fn run_with<Tr: EvalTracer>(
        &self,
        tracker: impl ResourceTracker,
        print: &mut impl PrintWriter,
        tracer: Tr,
    ) -> Result<(Object, Tr), Diagnostic> {
        let formatter = Formatter::new(&self.script_name, &self.source);
        let ctx = Context::new();
        builtins::register_globals(&ctx).map_err(|error| formatter.render(error, Vec::new()))?;
        let mut ctx = ctx;

        let mut evaluator = Evaluator::new(tracker, print, tracer, EvalState::new(self.argv.clone()));
        match evaluator.eval_module(&self.module, &mut ctx) {
            Ok(value) => {
                let object = object::from_value(&value);
                let (_, tracer) = evaluator.into_parts();
                Ok((object, tracer))
            }
            Err(error) => {
                let call_stack = evaluator.state_mut().drain_call_stack();
                Err(formatter.render(error, call_stack))
            }
        }
    }
}

/// Drops the `<?php` open tag when the source starts with it.
fn strip_open_tag(code: String) -> String {
    match code.strip_prefix("<?php") {
        Some(rest) => rest.to_owned(),
        None => code,
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::io::NoPrint;

    #[test]
    fn strips_the_open_tag() {
        let runner = Runner::new("<?php $a = 1;".to_owned(), "t.phx").unwrap();
        assert_eq!(runner.code(), " $a = 1;");
    }

    #[test]
    fn source_without_tag_is_untouched() {
        let runner = Runner::new("$a = 1;".to_owned(), "t.phx").unwrap();
        assert_eq!(runner.code(), "$a = 1;");
    }

    #[test]
    fn parse_errors_render_with_location() {
        let err = Runner::new("$a = ;".to_owned(), "t.phx").unwrap_err();
        let rendered = err.to_string();
        assert!(rendered.starts_with("ParseError:"), "{rendered}");
        assert!(rendered.contains("t.phx:1:"), "{rendered}");
        assert!(rendered.contains('^'), "{rendered}");
    }

    #[test]
    fn module_value_is_the_last_statement() {
        let runner = Runner::new("$a = 2; $a * 21".to_owned(), "t.phx").unwrap();
        let result = runner.run(NoLimitTracker, &mut NoPrint).unwrap();
        assert_eq!(result, Object::Int(42));
    }
}
