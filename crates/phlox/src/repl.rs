//! Persistent REPL session support.
//!
//! `ReplSession` keeps interpreter state across `execute()` calls so
//! interactive snippets share variables, functions, namespaces and imports.

use crate::{
    builtins,
    context::Context,
    diagnostics::{Diagnostic, Formatter},
    eval::{EvalState, Evaluator},
    io::PrintWriter,
    object::{self, Object},
    parse::parse,
    resource::NoLimitTracker,
    tracer::NoopTracer,
};

/// A persistent session executing snippets against accumulated state.
///
/// Each `execute()` call parses and evaluates one snippet. Globals, the
/// top-level scope, the current namespace and `use` imports all survive
/// across calls; a snippet that fails to parse leaves the session untouched.
pub struct ReplSession {
    ctx: Context,
    state: EvalState,
    script_name: String,
}

impl ReplSession {
    /// Creates a session with the built-in globals registered.
    ///
    /// `script_name` labels diagnostics (conventionally `<console>`).
    #[must_use]
    pub fn new(script_name: &str) -> Self {
        let ctx = Context::new();
        builtins::register_globals(&ctx).expect("builtins register once into a fresh context");
        Self {
            ctx,
            state: EvalState::new(Vec::new()),
            script_name: script_name.to_owned(),
        }
    }

    /// Sets the arguments exposed through `os\args()`.
    #[must_use]
    pub fn with_args(mut self, argv: Vec<String>) -> Self {
        self.state.argv = argv;
        self
    }

    #[must_use]
    pub fn script_name(&self) -> &str {
        &self.script_name
    }

    /// Registered global names, in registration order.
    #[must_use]
    pub fn global_names(&self) -> Vec<String> {
        self.ctx.global_names()
    }

    /// Parses and evaluates one snippet against the session state.
    ///
    /// Returns the snippet's value (the last statement's value). Runtime
    /// errors are rendered against the snippet source; the session stays
    /// usable afterwards.
    pub fn execute(&mut self, code: &str, print: &mut impl PrintWriter) -> Result<Object, Diagnostic> {
        let formatter = Formatter::new(&self.script_name, code);
        let module = match parse(code) {
            Ok(module) => module,
            Err(error) => return Err(formatter.render(error, Vec::new())),
        };

        let state = std::mem::replace(&mut self.state, EvalState::new(Vec::new()));
        let mut evaluator = Evaluator::new(NoLimitTracker, print, NoopTracer, state);
        let result = evaluator.eval_module(&module, &mut self.ctx);
        let outcome = match result {
            Ok(value) => Ok(object::from_value(&value)),
            Err(error) => {
                let call_stack = evaluator.state_mut().drain_call_stack();
                Err(formatter.render(error, call_stack))
            }
        };
        let (state, _) = evaluator.into_parts();
        self.state = state;
        outcome
    }
}
