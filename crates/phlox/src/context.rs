//! Variable scopes and the globals table.
//!
//! A [`Scope`] is a chain of frames walked innermost-out: lookup returns the
//! nearest binding, assignment rebinds the nearest frame already holding the
//! name or creates the binding in the innermost frame. Globals are a single
//! flat, insertion-ordered, write-once table shared by reference between a
//! caller and its callees.

use std::{cell::RefCell, rc::Rc};

use ahash::AHashMap;
use indexmap::IndexMap;

use crate::{
    errors::{RunError, RunResult},
    value::Value,
};

type Frame = AHashMap<String, Value>;

/// A non-empty chain of variable frames, innermost last.
#[derive(Debug, Default)]
pub(crate) struct Scope {
    frames: Vec<Frame>,
}

impl Scope {
    pub fn new() -> Self {
        Self {
            frames: vec![Frame::default()],
        }
    }

    /// Walks the chain innermost-out and returns the nearest binding.
    pub fn get(&self, name: &str) -> Option<Value> {
        self.frames.iter().rev().find_map(|frame| frame.get(name).cloned())
    }

    /// Rebinds the nearest frame that already holds `name`; creates the
    /// binding in the innermost frame otherwise.
    pub fn set(&mut self, name: &str, value: Value) {
        for frame in self.frames.iter_mut().rev() {
            if let Some(slot) = frame.get_mut(name) {
                *slot = value;
                return;
            }
        }
        self.frames
            .last_mut()
            .expect("scope chain is never empty")
            .insert(name.to_owned(), value);
    }

    #[cfg(test)]
    pub fn push_frame(&mut self) {
        self.frames.push(Frame::default());
    }

    #[cfg(test)]
    pub fn pop_frame(&mut self) {
        assert!(self.frames.len() > 1, "scope chain is never empty");
        self.frames.pop();
    }
}

/// The flat global table: built-in functions and classes, user functions,
/// user classes and constants, keyed by fully-qualified name.
pub(crate) type Globals = IndexMap<String, Value>;

/// Execution context: the current scope chain plus the shared globals.
///
/// Calling a user function builds a fresh context whose scope is a single
/// empty frame — callees never see caller locals — while the globals table
/// is shared by reference.
#[derive(Debug)]
pub(crate) struct Context {
    scope: Scope,
    globals: Rc<RefCell<Globals>>,
}

impl Context {
    pub fn new() -> Self {
        Self {
            scope: Scope::new(),
            globals: Rc::new(RefCell::new(Globals::default())),
        }
    }

    /// A callee context: fresh scope, shared globals.
    pub fn for_call(&self) -> Self {
        Self {
            scope: Scope::new(),
            globals: Rc::clone(&self.globals),
        }
    }

    pub fn get_var(&self, name: &str) -> Option<Value> {
        self.scope.get(name)
    }

    pub fn set_var(&mut self, name: &str, value: Value) {
        self.scope.set(name, value);
    }

    pub fn get_global(&self, name: &str) -> Option<Value> {
        self.globals.borrow().get(name).cloned()
    }

    /// Globals are write-once; redefinition is a name error.
    pub fn set_global(&self, name: &str, value: Value) -> RunResult<()> {
        let mut globals = self.globals.borrow_mut();
        if globals.contains_key(name) {
            return Err(RunError::name(format!("can not redeclare name '{name}'")));
        }
        globals.insert(name.to_owned(), value);
        Ok(())
    }

    /// Registered global names in insertion order.
    pub fn global_names(&self) -> Vec<String> {
        self.globals.borrow().keys().cloned().collect()
    }
}
