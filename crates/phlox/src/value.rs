//! Runtime values.
//!
//! Small values (null, booleans, integers) are stored inline; strings,
//! arrays, functions and classes are reference-counted. The value graph is
//! acyclic at the language level, so plain `Rc` ownership suffices — there is
//! no garbage collector. Evaluation is single-threaded by design.

use std::{cell::RefCell, rc::Rc};

use crate::{
    builtins::Builtin,
    classes::{self, ClassDef},
    expressions::{ArgSpec, Block, Visibility},
};

/// Primary runtime value type.
///
/// `Returned` is the return-sentinel: it wraps a value produced by a
/// `return` statement while it bubbles out of nested blocks. Only the
/// function-call evaluator unwraps it; it is never visible to user code.
#[derive(Debug, Clone)]
pub(crate) enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Str(Rc<str>),
    Array(Rc<RefCell<Vec<Value>>>),
    Function(FunctionValue),
    Class(ClassValue),
    Returned(Box<Value>),
}

impl Value {
    pub fn string(s: impl Into<Rc<str>>) -> Self {
        Self::Str(s.into())
    }

    pub fn array(values: Vec<Self>) -> Self {
        Self::Array(Rc::new(RefCell::new(values)))
    }

    /// The class this value belongs to. Every value has one.
    pub fn class(&self) -> &'static ClassDef {
        classes::class_of(self)
    }

    pub fn type_name(&self) -> &'static str {
        self.class().name
    }

    pub fn is_returned(&self) -> bool {
        matches!(self, Self::Returned(_))
    }

    /// Strips one return-sentinel layer, if present.
    pub fn unwrap_returned(self) -> Self {
        match self {
            Self::Returned(inner) => *inner,
            other => other,
        }
    }

    /// A host-level identity for this value.
    ///
    /// Immediate values are identified by their content, reference values by
    /// their allocation address.
    #[expect(clippy::cast_sign_loss, reason = "identity only, value is opaque")]
    pub fn id(&self) -> u64 {
        match self {
            Self::Null => 0,
            Self::Bool(false) => 1,
            Self::Bool(true) => 2,
            Self::Int(v) => *v as u64,
            Self::Str(s) => Rc::as_ptr(s).cast::<u8>() as u64,
            Self::Array(a) => Rc::as_ptr(a) as u64,
            Self::Function(FunctionValue::Internal(b)) => *b as u64,
            Self::Function(FunctionValue::User(f)) => Rc::as_ptr(f) as u64,
            Self::Class(ClassValue::Builtin(c)) => std::ptr::from_ref::<ClassDef>(*c) as u64,
            Self::Class(ClassValue::User(c)) => Rc::as_ptr(c) as u64,
            Self::Returned(inner) => inner.id(),
        }
    }
}

/// Structural equality, used by tests and host-boundary conversions.
/// Operator `==` in the language goes through `__equal` dispatch instead.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Null, Self::Null) => true,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Int(a), Self::Int(b)) => a == b,
            (Self::Str(a), Self::Str(b)) => a == b,
            (Self::Array(a), Self::Array(b)) => Rc::ptr_eq(a, b) || *a.borrow() == *b.borrow(),
            (Self::Function(a), Self::Function(b)) => a.id_eq(b),
            (Self::Class(a), Self::Class(b)) => a.name() == b.name(),
            _ => false,
        }
    }
}

/// A callable value: an internal (host) function or a user-defined one.
#[derive(Debug, Clone)]
pub(crate) enum FunctionValue {
    Internal(Builtin),
    User(Rc<UserFunction>),
}

impl FunctionValue {
    pub fn name(&self) -> &str {
        match self {
            Self::Internal(builtin) => builtin.name(),
            Self::User(function) => &function.name,
        }
    }

    /// `name(arg-sigs…)` as rendered by `Function.__toString`.
    pub fn signature(&self) -> String {
        match self {
            Self::Internal(builtin) => format!("{}(...$args)", builtin.name()),
            Self::User(function) => {
                let args: Vec<String> = function
                    .args
                    .iter()
                    .map(|arg| match &arg.type_name {
                        Some(ty) => format!("{ty} ${}", arg.name),
                        None => format!("${}", arg.name),
                    })
                    .collect();
                format!("{}({})", function.name, args.join(", "))
            }
        }
    }

    fn id_eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Internal(a), Self::Internal(b)) => a == b,
            (Self::User(a), Self::User(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

/// A user function: named (registered in globals under its fully-qualified
/// name) or anonymous (carries a synthesized opaque name, never registered).
#[derive(Debug)]
pub(crate) struct UserFunction {
    pub name: String,
    pub args: Vec<ArgSpec>,
    /// Names from a `use (…)` capture clause. Parsed, not evaluated.
    pub captures: Vec<String>,
    pub body: Block,
    pub anonymous: bool,
}

/// A class value: one of the built-in classes or a user declaration.
#[derive(Debug, Clone)]
pub(crate) enum ClassValue {
    Builtin(&'static ClassDef),
    User(Rc<UserClass>),
}

impl ClassValue {
    pub fn name(&self) -> &str {
        match self {
            Self::Builtin(class) => class.name,
            Self::User(class) => &class.name,
        }
    }
}

/// A class produced by evaluating a `class` declaration. Methods are
/// registered with their access modifiers; instantiation is not supported
/// in this version.
#[derive(Debug)]
pub(crate) struct UserClass {
    pub name: String,
    pub methods: ahash::AHashMap<String, UserMethod>,
}

#[derive(Debug)]
pub(crate) struct UserMethod {
    pub visibility: Visibility,
    pub is_final: bool,
    pub is_abstract: bool,
    pub function: Rc<UserFunction>,
}
