//! Execution tracing hooks.
//!
//! The evaluator carries a tracer as a type parameter, so [`NoopTracer`]
//! compiles away entirely — the same zero-cost pattern as
//! [`NoLimitTracker`](crate::resource::NoLimitTracker). [`StderrTracer`]
//! writes a human-readable execution log; [`RecordingTracer`] captures
//! events for assertions and post-mortem inspection.

/// A single traced execution event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TraceEvent {
    /// A user-function call pushed a stack frame.
    Call { name: String, depth: usize },
    /// A user-function call popped its frame.
    Return { name: String, depth: usize },
}

/// Trait for evaluator tracing. All hooks default to no-ops, so an
/// implementation only overrides what it cares about.
pub trait EvalTracer {
    /// Called at every statement boundary.
    ///
    /// # Arguments
    /// * `offset` - source offset of the statement
    /// * `depth` - current call-stack depth
    #[inline]
    fn on_statement(&mut self, offset: usize, depth: usize) {
        let _ = (offset, depth);
    }

    /// Called when a user-function frame is pushed.
    #[inline]
    fn on_call(&mut self, name: &str, depth: usize) {
        let _ = (name, depth);
    }

    /// Called when a user-function frame is popped.
    #[inline]
    fn on_return(&mut self, name: &str, depth: usize) {
        let _ = (name, depth);
    }
}

/// Zero-cost no-op tracer, the production default.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopTracer;

impl EvalTracer for NoopTracer {}

/// Logs calls and returns to stderr, indented by call depth.
#[derive(Debug, Default)]
pub struct StderrTracer;

impl EvalTracer for StderrTracer {
    fn on_call(&mut self, name: &str, depth: usize) {
        eprintln!("{:indent$}-> {name}", "", indent = depth * 2);
    }

    fn on_return(&mut self, name: &str, depth: usize) {
        eprintln!("{:indent$}<- {name}", "", indent = depth * 2);
    }
}

/// Records call/return events in order.
#[derive(Debug, Default)]
pub struct RecordingTracer {
    events: Vec<TraceEvent>,
}

impl RecordingTracer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn events(&self) -> &[TraceEvent] {
        &self.events
    }
}

impl EvalTracer for RecordingTracer {
    fn on_call(&mut self, name: &str, depth: usize) {
        self.events.push(TraceEvent::Call {
            name: name.to_owned(),
            depth,
        });
    }

    fn on_return(&mut self, name: &str, depth: usize) {
        self.events.push(TraceEvent::Return {
            name: name.to_owned(),
            depth,
        });
    }
}
