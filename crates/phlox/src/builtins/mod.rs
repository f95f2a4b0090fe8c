//! Built-in functions and the startup globals.
//!
//! Internal functions are a closed enum dispatched by the evaluator, which
//! owns the host state they need (the print writer, the PRNG, the process
//! arguments). Registration seeds the globals table with the functions and
//! the `Int`/`String`/`Array` class constants.

pub(crate) mod math;
pub(crate) mod os;
pub(crate) mod print;

use crate::{
    classes,
    context::Context,
    errors::{RunError, RunResult},
    value::{ClassValue, FunctionValue, Value},
};

/// The closed set of internal functions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum Builtin {
    Print,
    Println,
    Exit,
    MathRandom,
    OsArgs,
}

impl Builtin {
    /// The fully-qualified name the function is registered under.
    pub fn name(self) -> &'static str {
        match self {
            Self::Print => "print",
            Self::Println => "println",
            Self::Exit => "exit",
            Self::MathRandom => "math\\random",
            Self::OsArgs => "os\\args",
        }
    }

    pub fn all() -> [Self; 5] {
        [Self::Print, Self::Println, Self::Exit, Self::MathRandom, Self::OsArgs]
    }
}

/// Seeds a fresh context with the built-in functions and class constants.
pub(crate) fn register_globals(ctx: &Context) -> RunResult<()> {
    for builtin in Builtin::all() {
        ctx.set_global(builtin.name(), Value::Function(FunctionValue::Internal(builtin)))?;
    }
    ctx.set_global("Int", Value::Class(ClassValue::Builtin(classes::int_class())))?;
    ctx.set_global("String", Value::Class(ClassValue::Builtin(classes::string_class())))?;
    ctx.set_global("Array", Value::Class(ClassValue::Builtin(classes::array_class())))?;
    Ok(())
}

/// Internal helpers assert exact argument counts.
pub(crate) fn expect_no_args(name: &str, args: &[Value]) -> RunResult<()> {
    if args.is_empty() {
        Ok(())
    } else {
        Err(RunError::arity(format!(
            "{name}() takes no arguments, {} given",
            args.len()
        )))
    }
}
