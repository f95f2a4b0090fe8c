//! Canonical source rendering of AST nodes.
//!
//! Used to quote expressions in diagnostics and to check the
//! parse/print/parse round trip in tests. Binary expressions are printed
//! fully parenthesized so the rendering re-parses to the same tree.

use std::fmt::Write;

use crate::expressions::{ArgSpec, Block, Expr, ExprLoc, FunctionDecl, Module, Node, Stmt, UnaryOp, Visibility};

/// Renders a whole module, one statement per line.
#[must_use]
pub fn print_module(module: &Module) -> String {
    let mut out = String::new();
    for (i, node) in module.statements.iter().enumerate() {
        if i > 0 {
            out.push('\n');
        }
        write_stmt(&mut out, node);
    }
    out
}

/// Renders a single expression (no trailing terminator).
#[must_use]
pub fn expr_to_string(expr: &ExprLoc) -> String {
    let mut out = String::new();
    write_expr(&mut out, expr);
    out
}

fn write_stmt(out: &mut String, node: &Node) {
    match &node.stmt {
        Stmt::Expression(expr) => {
            write_expr(out, expr);
            out.push(';');
        }
        Stmt::Return(None) => out.push_str("return;"),
        Stmt::Return(Some(expr)) => {
            out.push_str("return ");
            write_expr(out, expr);
            out.push(';');
        }
        Stmt::Use { namespace, classes } => {
            for class in classes {
                let _ = write!(out, "use {namespace}\\{class};");
            }
        }
        Stmt::Namespace { path } => {
            let _ = write!(out, "namespace {path};");
        }
    }
}

fn write_block(out: &mut String, block: &Block) {
    out.push('{');
    for node in &block.statements {
        out.push(' ');
        write_stmt(out, node);
    }
    out.push_str(" }");
}

fn write_args(out: &mut String, args: &[ExprLoc]) {
    out.push('(');
    for (i, arg) in args.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        write_expr(out, arg);
    }
    out.push(')');
}

fn write_arg_spec(out: &mut String, arg: &ArgSpec) {
    if let Some(ty) = &arg.type_name {
        let _ = write!(out, "{ty} ");
    }
    if arg.by_ref {
        out.push('&');
    }
    if arg.variadic {
        out.push_str("...");
    }
    let _ = write!(out, "${}", arg.name);
    if let Some(default) = &arg.default {
        out.push_str(" = ");
        write_expr(out, default);
    }
}

fn write_function(out: &mut String, decl: &FunctionDecl) {
    out.push_str("function");
    if let Some(name) = &decl.name {
        let _ = write!(out, " {name}");
    }
    out.push('(');
    for (i, arg) in decl.args.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        write_arg_spec(out, arg);
    }
    out.push(')');
    if !decl.captures.is_empty() {
        out.push_str(" use (");
        for (i, name) in decl.captures.iter().enumerate() {
            if i > 0 {
                out.push_str(", ");
            }
            let _ = write!(out, "${name}");
        }
        out.push(')');
    }
    if let Some(ty) = &decl.return_type {
        let _ = write!(out, ": {ty}");
    }
    out.push(' ');
    write_block(out, &decl.body);
}

fn write_expr(out: &mut String, expr: &ExprLoc) {
    match &expr.expr {
        Expr::Null => out.push_str("null"),
        Expr::Bool(true) => out.push_str("true"),
        Expr::Bool(false) => out.push_str("false"),
        Expr::Int(value) => {
            let _ = write!(out, "{value}");
        }
        Expr::Str(value) => {
            let _ = write!(out, "'{value}'");
        }
        Expr::Array(elements) => {
            out.push('[');
            for (i, element) in elements.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                write_expr(out, element);
            }
            out.push(']');
        }
        Expr::Identifier(name) => out.push_str(name),
        Expr::Variable(name) => {
            let _ = write!(out, "${name}");
        }
        Expr::Constant(name) => {
            let _ = write!(out, "const {name}");
        }
        Expr::Index { left, index } => {
            write_expr(out, left);
            out.push('[');
            write_expr(out, index);
            out.push(']');
        }
        Expr::Unary { op, operand, prefix } => {
            if *prefix {
                match op {
                    // grouping keeps `-5` from re-lexing as one literal
                    UnaryOp::Minus | UnaryOp::Not => {
                        out.push_str(op.symbol());
                        out.push('(');
                        write_expr(out, operand);
                        out.push(')');
                    }
                    UnaryOp::Increment | UnaryOp::Decrement => {
                        out.push_str(op.symbol());
                        write_expr(out, operand);
                    }
                }
            } else {
                write_expr(out, operand);
                out.push_str(op.symbol());
            }
        }
        Expr::Binary { left, op, right } => {
            out.push('(');
            write_expr(out, left);
            let _ = write!(out, " {} ", op.symbol());
            write_expr(out, right);
            out.push(')');
        }
        Expr::Range { start, end } => {
            out.push('(');
            write_expr(out, start);
            out.push_str(" .. ");
            write_expr(out, end);
            out.push(')');
        }
        Expr::Assignment { target, value } => {
            write_expr(out, target);
            out.push_str(" = ");
            write_expr(out, value);
        }
        Expr::InstanceOf { object, class } => {
            out.push('(');
            write_expr(out, object);
            out.push_str(" instanceof ");
            write_expr(out, class);
            out.push(')');
        }
        Expr::If {
            condition,
            consequence,
            alternative,
        } => {
            out.push_str("if ");
            write_expr(out, condition);
            out.push(' ');
            write_block(out, consequence);
            if let Some(alternative) = alternative {
                out.push_str(" else ");
                write_block(out, alternative);
            }
        }
        Expr::While { condition, body } => {
            out.push_str("while ");
            write_expr(out, condition);
            out.push(' ');
            write_block(out, body);
        }
        Expr::ForEach {
            array,
            key_var,
            value_var,
            body,
        } => {
            out.push_str("foreach (");
            write_expr(out, array);
            out.push_str(" as ");
            if let Some(key) = key_var {
                let _ = write!(out, "${key} => ");
            }
            let _ = write!(out, "${value_var}");
            out.push_str(") ");
            write_block(out, body);
        }
        Expr::Call { target, args } => {
            write_expr(out, target);
            write_args(out, args);
        }
        Expr::PropertyRead { object, name } => {
            write_expr(out, object);
            let _ = write!(out, "->{name}");
        }
        Expr::MethodCall { object, name, args } => {
            write_expr(out, object);
            let _ = write!(out, "->{name}");
            write_args(out, args);
        }
        Expr::FunctionDecl(decl) => write_function(out, decl),
        Expr::MethodDecl {
            visibility,
            is_final,
            is_abstract,
            function,
        } => {
            out.push_str(match visibility {
                Visibility::Public => "public ",
                Visibility::Protected => "protected ",
                Visibility::Private => "private ",
            });
            if *is_final {
                out.push_str("final ");
            }
            if *is_abstract {
                out.push_str("abstract ");
            }
            write_function(out, function);
        }
        Expr::ClassDecl { name, body } => {
            let _ = write!(out, "class {name} ");
            write_block(out, body);
        }
        Expr::New { class_name, args } => {
            let _ = write!(out, "new {class_name}");
            write_args(out, args);
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::parse::parse;

    #[track_caller]
    fn assert_round_trip(source: &str) {
        let parsed = parse(source).unwrap_or_else(|e| panic!("parse failed for {source:?}: {e}"));
        let printed = print_module(&parsed);
        let reparsed = parse(&printed).unwrap_or_else(|e| panic!("reparse failed for {printed:?}: {e}"));
        let reprinted = print_module(&reparsed);
        assert_eq!(parsed, reparsed, "printed form: {printed}");
        assert_eq!(printed, reprinted);
    }

    #[test]
    fn prints_assignments_and_arithmetic() {
        let module = parse("$sum = $a + $b;").unwrap();
        assert_eq!(print_module(&module), "$sum = ($a + $b);");
    }

    #[test]
    fn round_trips_core_statement_forms() {
        assert_round_trip("$a = 5; $b = $a * 3 + 1;");
        assert_round_trip("use Symfony\\Component\\Response; namespace App\\Core;");
        assert_round_trip("function fib($n) { if $n < 2 { $n } else { fib($n - 1) + fib($n - 2) } }");
        assert_round_trip("foreach ($xs as $k => $v) { println($k); println($v); }");
        assert_round_trip("$r = 0..3; $s = 'abc' * 3;");
        assert_round_trip("while $i < 10 { $i += 1 }");
        assert_round_trip("$f = function ($x) use ($a) : Response { return $x; };");
        assert_round_trip("class C { public final function m($v = 7) { return $v } }");
        assert_round_trip("$neg = -$a; $not = !$ok; $post = $i++; $pre = --$j;");
        assert_round_trip("new Widget(1, 'two'); $w instanceof Widget;");
        assert_round_trip("$m = $xs[0]->length(); $p = $obj->name;");
        assert_round_trip("const LIMIT = 100; println(LIMIT);");
        assert_round_trip("return;");
    }
}
