//! Built-in classes and magic-method dispatch.
//!
//! Every runtime value belongs to a [`ClassDef`]; operators, indexing and
//! conversions resolve to magic methods (`__add`, `__index`, `__toString`, …)
//! looked up by name in the class's method table. The table is closed: the
//! full set of magic names is the one in [`operator_method`] plus the three
//! conversions.

mod array;
mod boolean;
mod function;
mod int;
mod null;
mod string;

use std::{cell::Cell, rc::Rc, sync::LazyLock};

use ahash::AHashMap;

use crate::{
    errors::{RunError, RunResult},
    expressions::BinaryOp,
    value::Value,
};

/// A built-in method: receiver plus evaluated arguments.
pub(crate) type BuiltinMethodFn = fn(&Value, &[Value]) -> RunResult<Value>;

/// A name-tagged class record: flags, optional superclass, and the method
/// set realizing its operator semantics.
pub(crate) struct ClassDef {
    pub name: &'static str,
    pub is_final: bool,
    pub is_abstract: bool,
    pub parent: Option<&'static ClassDef>,
    methods: AHashMap<&'static str, BuiltinMethodFn>,
}

impl ClassDef {
    fn new(name: &'static str, methods: &[(&'static str, BuiltinMethodFn)]) -> Self {
        Self {
            name,
            is_final: true,
            is_abstract: false,
            parent: None,
            methods: methods.iter().copied().collect(),
        }
    }

    /// Looks a method up by name, walking the superclass chain.
    pub fn find_method(&self, name: &str) -> Option<BuiltinMethodFn> {
        self.methods
            .get(name)
            .copied()
            .or_else(|| self.parent.and_then(|parent| parent.find_method(name)))
    }
}

impl std::fmt::Debug for ClassDef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClassDef").field("name", &self.name).finish()
    }
}

static INT_CLASS: LazyLock<ClassDef> = LazyLock::new(int::class);
static STRING_CLASS: LazyLock<ClassDef> = LazyLock::new(string::class);
static BOOLEAN_CLASS: LazyLock<ClassDef> = LazyLock::new(boolean::class);
static ARRAY_CLASS: LazyLock<ClassDef> = LazyLock::new(array::class);
static NULL_CLASS: LazyLock<ClassDef> = LazyLock::new(null::class);
static FUNCTION_CLASS: LazyLock<ClassDef> = LazyLock::new(function::class);
static CLASS_CLASS: LazyLock<ClassDef> = LazyLock::new(|| ClassDef::new("Class", &[]));

pub(crate) fn int_class() -> &'static ClassDef {
    &INT_CLASS
}

pub(crate) fn string_class() -> &'static ClassDef {
    &STRING_CLASS
}

pub(crate) fn array_class() -> &'static ClassDef {
    &ARRAY_CLASS
}

/// The class a value belongs to. Built-in values dispatch through these
/// static tables; user classes exist only as values of class `Class`.
pub(crate) fn class_of(value: &Value) -> &'static ClassDef {
    match value {
        Value::Null => &NULL_CLASS,
        Value::Bool(_) => &BOOLEAN_CLASS,
        Value::Int(_) => &INT_CLASS,
        Value::Str(_) => &STRING_CLASS,
        Value::Array(_) => &ARRAY_CLASS,
        Value::Function(_) => &FUNCTION_CLASS,
        Value::Class(_) => &CLASS_CLASS,
        Value::Returned(inner) => class_of(inner),
    }
}

/// Maps a binary operator to its magic method and whether the Bool result
/// must be negated (`!=` and `!==` reuse `__equal`/`__identical`).
pub(crate) fn operator_method(op: BinaryOp) -> (&'static str, bool) {
    match op {
        BinaryOp::Add => ("__add", false),
        BinaryOp::Sub => ("__sub", false),
        BinaryOp::Mul => ("__mul", false),
        BinaryOp::Div => ("__div", false),
        BinaryOp::Mod => ("__mod", false),
        BinaryOp::Equal => ("__equal", false),
        BinaryOp::NotEqual => ("__equal", true),
        BinaryOp::Identical => ("__identical", false),
        BinaryOp::NotIdentical => ("__identical", true),
        BinaryOp::Greater => ("__gt", false),
        BinaryOp::Smaller => ("__lt", false),
        BinaryOp::GreaterOrEqual => ("__gte", false),
        BinaryOp::SmallerOrEqual => ("__lte", false),
        BinaryOp::BitAnd => ("__and", false),
        BinaryOp::BitOr => ("__or", false),
    }
}

/// Converts a value to a string: identity for strings, `__toString`
/// dispatch otherwise. Absence of the method is a type error naming the
/// class.
pub(crate) fn to_string(value: &Value) -> RunResult<Rc<str>> {
    if let Value::Str(s) = value {
        return Ok(Rc::clone(s));
    }
    let method = class_of(value)
        .find_method("__toString")
        .ok_or_else(|| conversion_error(value, "String"))?;
    match method(value, &[])? {
        Value::Str(s) => Ok(s),
        _ => Err(conversion_error(value, "String")),
    }
}

/// Converts a value to an integer: identity for ints, `__toInt` otherwise.
pub(crate) fn to_int(value: &Value) -> RunResult<i64> {
    if let Value::Int(v) = value {
        return Ok(*v);
    }
    let method = class_of(value)
        .find_method("__toInt")
        .ok_or_else(|| conversion_error(value, "Int"))?;
    match method(value, &[])? {
        Value::Int(v) => Ok(v),
        _ => Err(conversion_error(value, "Int")),
    }
}

/// Converts a value to a boolean: identity for booleans, `__toBoolean`
/// otherwise. Classes without the method (String, Array, Null) are a type
/// error — truthiness is explicit in this dialect.
pub(crate) fn to_boolean(value: &Value) -> RunResult<bool> {
    if let Value::Bool(b) = value {
        return Ok(*b);
    }
    let method = class_of(value)
        .find_method("__toBoolean")
        .ok_or_else(|| conversion_error(value, "Boolean"))?;
    match method(value, &[])? {
        Value::Bool(b) => Ok(b),
        _ => Err(conversion_error(value, "Boolean")),
    }
}

fn conversion_error(value: &Value, target: &str) -> RunError {
    RunError::type_error(format!(
        "value of class {} can not be converted to {target}",
        value.type_name()
    ))
}

/// Asserts an exact magic-method argument count.
pub(crate) fn expect_args<'a>(method: &str, args: &'a [Value], count: usize) -> RunResult<&'a [Value]> {
    if args.len() == count {
        Ok(args)
    } else {
        Err(RunError::arity(format!(
            "{method} takes exactly {count} argument{}, {} given",
            if count == 1 { "" } else { "s" },
            args.len()
        )))
    }
}

thread_local! {
    /// Depth guard for rendering nested arrays. Self-referential arrays can
    /// be built through `append`, and rendering must not blow the stack.
    static RENDER_DEPTH: Cell<usize> = const { Cell::new(0) };
}

pub(crate) const MAX_RENDER_DEPTH: usize = 64;

pub(crate) fn enter_render_depth() -> RunResult<RenderDepthGuard> {
    let depth = RENDER_DEPTH.with(Cell::get);
    if depth >= MAX_RENDER_DEPTH {
        return Err(RunError::value("array is nested too deeply to render"));
    }
    RENDER_DEPTH.with(|cell| cell.set(depth + 1));
    Ok(RenderDepthGuard)
}

pub(crate) struct RenderDepthGuard;

impl Drop for RenderDepthGuard {
    fn drop(&mut self) {
        RENDER_DEPTH.with(|cell| cell.set(cell.get() - 1));
    }
}
