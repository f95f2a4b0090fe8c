//! Recursive tree-walking evaluator.
//!
//! Dispatches on node kind and returns `RunResult<Value>`. `return` is a
//! datum, not a host exception: the evaluator wraps the returned value in
//! the `Returned` sentinel, block evaluation stops and propagates it, and
//! the function-call evaluator is the only place that unwraps it.

use ahash::AHashMap;
use rand::{SeedableRng, rngs::StdRng};
use smallvec::SmallVec;

use crate::{
    builtins::{self, Builtin},
    classes,
    context::Context,
    errors::{RunError, RunResult},
    expressions::{Block, Expr, ExprLoc, FunctionDecl, Module, Node, Stmt, UnaryOp},
    io::PrintWriter,
    resource::ResourceTracker,
    tracer::EvalTracer,
    value::{ClassValue, FunctionValue, UserClass, UserFunction, UserMethod, Value},
};

/// Short-circuits the surrounding evaluator when a sub-expression produced
/// the return sentinel: the sentinel is the expression's value and must
/// bubble out unchanged.
macro_rules! propagate {
    ($value:expr) => {{
        let value = $value;
        if value.is_returned() {
            return Ok(value);
        }
        value
    }};
}

/// Evaluator state that outlives a single run: the REPL threads it through
/// every `execute()` call so namespaces, imports and the PRNG stream
/// persist across lines.
#[derive(Debug)]
pub(crate) struct EvalState {
    /// Current namespace path, empty at top level.
    pub namespace: String,
    /// `use`-imported aliases: imported name → fully-qualified name.
    pub uses: AHashMap<String, String>,
    /// Active user-function names, outermost first. Drained into the
    /// diagnostic on error.
    pub call_stack: Vec<String>,
    /// Counter for synthesized anonymous function names.
    pub anon_counter: u32,
    pub rng: StdRng,
    /// Process arguments exposed through `os\args()`.
    pub argv: Vec<String>,
}

impl EvalState {
    pub fn new(argv: Vec<String>) -> Self {
        Self {
            namespace: String::new(),
            uses: AHashMap::new(),
            call_stack: Vec::new(),
            anon_counter: 0,
            rng: StdRng::from_entropy(),
            argv,
        }
    }

    /// Call stack rendered for a diagnostic: innermost frame first. Resets
    /// the stack.
    pub fn drain_call_stack(&mut self) -> Vec<String> {
        let mut stack = std::mem::take(&mut self.call_stack);
        stack.reverse();
        stack
    }
}

pub(crate) struct Evaluator<'w, T, W, Tr> {
    tracker: T,
    writer: &'w mut W,
    tracer: Tr,
    state: EvalState,
}

impl<'w, T, W, Tr> Evaluator<'w, T, W, Tr>
where
    T: ResourceTracker,
    W: PrintWriter,
    Tr: EvalTracer,
{
    pub fn new(tracker: T, writer: &'w mut W, tracer: Tr, state: EvalState) -> Self {
        Self {
            tracker,
            writer,
            tracer,
            state,
        }
    }

    pub fn state_mut(&mut self) -> &mut EvalState {
        &mut self.state
    }

    pub fn into_parts(self) -> (EvalState, Tr) {
        (self.state, self.tracer)
    }

    /// Evaluates a module's statements in order. The module's value is the
    /// last statement's value; a top-level `return` ends it early.
    pub fn eval_module(&mut self, module: &Module, ctx: &mut Context) -> RunResult<Value> {
        let mut value = Value::Null;
        for node in &module.statements {
            value = self.eval_node(node, ctx)?;
            if value.is_returned() {
                return Ok(value.unwrap_returned());
            }
        }
        Ok(value)
    }

    fn eval_node(&mut self, node: &Node, ctx: &mut Context) -> RunResult<Value> {
        self.tracker.on_statement().map_err(RunError::from)?;
        self.tracer.on_statement(node.offset, self.state.call_stack.len());
        let result = match &node.stmt {
            Stmt::Expression(expr) => self.eval_expr(expr, ctx),
            Stmt::Return(value) => self.eval_return(value.as_ref(), ctx),
            Stmt::Use { namespace, classes } => {
                for class in classes {
                    let qualified = format!("{namespace}\\{class}");
                    self.state.uses.insert(class.clone(), qualified);
                }
                Ok(Value::Null)
            }
            Stmt::Namespace { path } => {
                self.state.namespace.clone_from(path);
                Ok(Value::Null)
            }
        };
        result.map_err(|e| e.ensure_offset(node.offset))
    }

    fn eval_return(&mut self, value: Option<&ExprLoc>, ctx: &mut Context) -> RunResult<Value> {
        let value = match value {
            Some(expr) => propagate!(self.eval_expr(expr, ctx)?),
            None => Value::Null,
        };
        Ok(Value::Returned(Box::new(value)))
    }

    /// Evaluates statements in order. The block's value is the last
    /// statement's value, Null when empty; a return sentinel ends the block
    /// immediately.
    fn eval_block(&mut self, block: &Block, ctx: &mut Context) -> RunResult<Value> {
        let mut value = Value::Null;
        for node in &block.statements {
            value = self.eval_node(node, ctx)?;
            if value.is_returned() {
                return Ok(value);
            }
        }
        Ok(value)
    }

    fn eval_expr(&mut self, expr: &ExprLoc, ctx: &mut Context) -> RunResult<Value> {
        self.eval_expr_inner(expr, ctx).map_err(|e| e.ensure_offset(expr.offset))
    }

    fn eval_expr_inner(&mut self, expr: &ExprLoc, ctx: &mut Context) -> RunResult<Value> {
        match &expr.expr {
            Expr::Null => Ok(Value::Null),
            Expr::Bool(b) => Ok(Value::Bool(*b)),
            Expr::Int(v) => Ok(Value::Int(*v)),
            Expr::Str(s) => Ok(Value::string(s.as_str())),
            Expr::Array(elements) => self.eval_array_literal(elements, ctx),
            Expr::Identifier(name) => self.resolve_name(name, ctx),
            Expr::Variable(name) => Ok(ctx.get_var(name).unwrap_or(Value::Null)),
            Expr::Constant(name) => ctx
                .get_global(name)
                .ok_or_else(|| RunError::name(format!("name '{name}' is not defined"))),
            Expr::Index { left, index } => self.eval_index(left, index, ctx),
            Expr::Unary { op, operand, prefix } => self.eval_unary(*op, operand, *prefix, ctx),
            Expr::Binary { left, op, right } => self.eval_binary(left, *op, right, ctx),
            Expr::Range { start, end } => self.eval_range(start, end, ctx),
            Expr::Assignment { target, value } => self.eval_assignment(target, value, ctx),
            Expr::InstanceOf { object, class } => self.eval_instanceof(object, class, ctx),
            Expr::If {
                condition,
                consequence,
                alternative,
            } => self.eval_if(condition, consequence, alternative.as_ref(), ctx),
            Expr::While { condition, body } => self.eval_while(condition, body, ctx),
            Expr::ForEach {
                array,
                key_var,
                value_var,
                body,
            } => self.eval_foreach(array, key_var.as_deref(), value_var, body, ctx),
            Expr::Call { target, args } => self.eval_call(target, args, ctx),
            Expr::PropertyRead { object, name } => {
                let object = propagate!(self.eval_expr(object, ctx)?);
                Err(RunError::type_error(format!(
                    "class {} has no property '{name}'",
                    object.type_name()
                )))
            }
            Expr::MethodCall { object, name, args } => self.eval_method_call(object, name, args, ctx),
            Expr::FunctionDecl(decl) => self.eval_function_decl(decl, ctx),
            Expr::MethodDecl { .. } => Err(RunError::type_error("method declaration outside of a class body")),
            Expr::ClassDecl { name, body } => self.eval_class_decl(name, body, ctx),
            Expr::New { class_name, .. } => self.eval_new(class_name, ctx),
        }
    }

    fn eval_array_literal(&mut self, elements: &[ExprLoc], ctx: &mut Context) -> RunResult<Value> {
        self.tracker.on_allocate(elements.len()).map_err(RunError::from)?;
        let mut values = Vec::with_capacity(elements.len());
        for element in elements {
            values.push(propagate!(self.eval_expr(element, ctx)?));
        }
        Ok(Value::array(values))
    }

    /// Resolution order for bare names: exact global, current-namespace
    /// qualified, `use` alias.
    fn resolve_name(&self, name: &str, ctx: &Context) -> RunResult<Value> {
        if let Some(value) = ctx.get_global(name) {
            return Ok(value);
        }
        if !self.state.namespace.is_empty() {
            let qualified = format!("{}\\{name}", self.state.namespace);
            if let Some(value) = ctx.get_global(&qualified) {
                return Ok(value);
            }
        }
        if let Some(qualified) = self.state.uses.get(name)
            && let Some(value) = ctx.get_global(qualified)
        {
            return Ok(value);
        }
        Err(RunError::name(format!("name '{name}' is not defined")))
    }

    /// The fully-qualified registration name for a declaration.
    fn qualified_name(&self, name: &str) -> String {
        if self.state.namespace.is_empty() {
            name.to_owned()
        } else {
            format!("{}\\{name}", self.state.namespace)
        }
    }

    fn eval_index(&mut self, left: &ExprLoc, index: &ExprLoc, ctx: &mut Context) -> RunResult<Value> {
        let container = propagate!(self.eval_expr(left, ctx)?);
        let index = propagate!(self.eval_expr(index, ctx)?);
        let Some(method) = container.class().find_method("__index") else {
            return Err(RunError::type_error(format!(
                "can not index a value of class {}",
                container.type_name()
            )));
        };
        method(&container, std::slice::from_ref(&index))
    }

    /// Binary operators resolve to the left operand's magic method; `!=` and
    /// `!==` negate the result of `__equal`/`__identical`.
    fn eval_binary(
        &mut self,
        left: &ExprLoc,
        op: crate::expressions::BinaryOp,
        right: &ExprLoc,
        ctx: &mut Context,
    ) -> RunResult<Value> {
        let left_value = propagate!(self.eval_expr(left, ctx)?);
        let right_value = propagate!(self.eval_expr(right, ctx)?);
        let (method_name, negate) = classes::operator_method(op);
        let Some(method) = left_value.class().find_method(method_name) else {
            return Err(RunError::type_error(format!(
                "operator '{}' is not defined for class {}",
                op.symbol(),
                left_value.type_name()
            )));
        };
        let result = method(&left_value, std::slice::from_ref(&right_value))?;
        if !negate {
            return Ok(result);
        }
        match result {
            Value::Bool(b) => Ok(Value::Bool(!b)),
            other => Err(RunError::type_error(format!(
                "{method_name} returned a value of class {}, expected Boolean",
                other.type_name()
            ))),
        }
    }

    fn eval_unary(&mut self, op: UnaryOp, operand: &ExprLoc, prefix: bool, ctx: &mut Context) -> RunResult<Value> {
        match op {
            UnaryOp::Minus => {
                let value = propagate!(self.eval_expr(operand, ctx)?);
                match value {
                    Value::Int(v) => v
                        .checked_neg()
                        .map(Value::Int)
                        .ok_or_else(|| RunError::value("integer overflow")),
                    other => Err(RunError::type_error(format!(
                        "unsupported operand of class {} for unary '-'",
                        other.type_name()
                    ))),
                }
            }
            UnaryOp::Not => {
                let value = propagate!(self.eval_expr(operand, ctx)?);
                Ok(Value::Bool(!classes::to_boolean(&value)?))
            }
            UnaryOp::Increment | UnaryOp::Decrement => {
                let Expr::Variable(name) = &operand.expr else {
                    return Err(RunError::type_error(format!(
                        "'{}' expects a variable",
                        op.symbol()
                    )));
                };
                let current = match ctx.get_var(name).unwrap_or(Value::Null) {
                    Value::Int(current) => current,
                    other => {
                        return Err(RunError::type_error(format!(
                            "'{}' expects an Int variable, ${name} is {}",
                            op.symbol(),
                            other.type_name()
                        )));
                    }
                };
                let updated = match op {
                    UnaryOp::Increment => current.checked_add(1),
                    _ => current.checked_sub(1),
                }
                .ok_or_else(|| RunError::value("integer overflow"))?;
                ctx.set_var(name, Value::Int(updated));
                Ok(Value::Int(if prefix { updated } else { current }))
            }
        }
    }

    /// `a..b` with Int endpoints, end-exclusive in both directions:
    /// `0..3` is `[0, 1, 2]`, `5..0` is `[5, 4, 3, 2, 1]`, `a..a` is empty.
    fn eval_range(&mut self, start: &ExprLoc, end: &ExprLoc, ctx: &mut Context) -> RunResult<Value> {
        let start_value = propagate!(self.eval_expr(start, ctx)?);
        let end_value = propagate!(self.eval_expr(end, ctx)?);
        let (Value::Int(start), Value::Int(end)) = (&start_value, &end_value) else {
            return Err(RunError::type_error(format!(
                "range endpoints must be Int, got {} and {}",
                start_value.type_name(),
                end_value.type_name()
            )));
        };
        let (start, end) = (*start, *end);
        let count = start.abs_diff(end);
        let count = usize::try_from(count).map_err(|_| RunError::value("range is too large"))?;
        self.tracker.on_allocate(count).map_err(RunError::from)?;
        let mut values = Vec::with_capacity(count);
        if start <= end {
            for v in start..end {
                values.push(Value::Int(v));
            }
        } else {
            let mut v = start;
            while v > end {
                values.push(Value::Int(v));
                v -= 1;
            }
        }
        Ok(Value::array(values))
    }

    fn eval_assignment(&mut self, target: &ExprLoc, value: &ExprLoc, ctx: &mut Context) -> RunResult<Value> {
        let assigned = propagate!(self.eval_expr(value, ctx)?);
        match &target.expr {
            Expr::Variable(name) => {
                ctx.set_var(name, assigned.clone());
                Ok(assigned)
            }
            Expr::Constant(name) => {
                ctx.set_global(name, assigned.clone())
                    .map_err(|e| e.ensure_offset(target.offset))?;
                Ok(assigned)
            }
            Expr::Index { left, index } => {
                let container = propagate!(self.eval_expr(left, ctx)?);
                let index_value = propagate!(self.eval_expr(index, ctx)?);
                let Value::Array(values) = &container else {
                    return Err(RunError::type_error(format!(
                        "can not assign into a value of class {}",
                        container.type_name()
                    )));
                };
                let index = classes::to_int(&index_value)?;
                let mut values = values.borrow_mut();
                let position = usize::try_from(index).ok().filter(|&i| i < values.len());
                match position {
                    Some(i) => {
                        values[i] = assigned.clone();
                        Ok(assigned)
                    }
                    None => Err(RunError::value(format!(
                        "array index {index} out of range for length {}",
                        values.len()
                    ))),
                }
            }
            // the parser validates targets; anything else cannot reach here
            _ => Err(RunError::type_error("invalid assignment target")),
        }
    }

    fn eval_instanceof(&mut self, object: &ExprLoc, class: &ExprLoc, ctx: &mut Context) -> RunResult<Value> {
        let object_value = propagate!(self.eval_expr(object, ctx)?);
        let class_name = match &class.expr {
            Expr::Identifier(name) => match self.resolve_name(name, ctx) {
                Ok(Value::Class(c)) => c.name().to_owned(),
                _ => name.clone(),
            },
            _ => {
                let value = propagate!(self.eval_expr(class, ctx)?);
                match value {
                    Value::Class(c) => c.name().to_owned(),
                    other => {
                        return Err(RunError::type_error(format!(
                            "instanceof expects a class, got a value of class {}",
                            other.type_name()
                        )));
                    }
                }
            }
        };
        let mut class = Some(object_value.class());
        while let Some(c) = class {
            if c.name == class_name {
                return Ok(Value::Bool(true));
            }
            class = c.parent;
        }
        Ok(Value::Bool(false))
    }

    fn eval_if(
        &mut self,
        condition: &ExprLoc,
        consequence: &Block,
        alternative: Option<&Block>,
        ctx: &mut Context,
    ) -> RunResult<Value> {
        let condition = propagate!(self.eval_expr(condition, ctx)?);
        if classes::to_boolean(&condition)? {
            self.eval_block(consequence, ctx)
        } else {
            match alternative {
                Some(block) => self.eval_block(block, ctx),
                None => Ok(Value::Null),
            }
        }
    }

    fn eval_while(&mut self, condition: &ExprLoc, body: &Block, ctx: &mut Context) -> RunResult<Value> {
        loop {
            let condition_value = propagate!(self.eval_expr(condition, ctx)?);
            if !classes::to_boolean(&condition_value)? {
                return Ok(Value::Null);
            }
            let value = self.eval_block(body, ctx)?;
            if value.is_returned() {
                return Ok(value);
            }
        }
    }

    /// Binds the value variable (and the 0-based Int key when requested) for
    /// each element, iterating over a snapshot so the body may mutate the
    /// array.
    fn eval_foreach(
        &mut self,
        array: &ExprLoc,
        key_var: Option<&str>,
        value_var: &str,
        body: &Block,
        ctx: &mut Context,
    ) -> RunResult<Value> {
        let array_value = propagate!(self.eval_expr(array, ctx)?);
        let Value::Array(values) = &array_value else {
            return Err(RunError::type_error(format!(
                "foreach expects an Array, got a value of class {}",
                array_value.type_name()
            )));
        };
        let items: Vec<Value> = values.borrow().clone();
        for (i, item) in items.into_iter().enumerate() {
            if let Some(key) = key_var {
                ctx.set_var(key, Value::Int(i64::try_from(i).unwrap_or(i64::MAX)));
            }
            ctx.set_var(value_var, item);
            let value = self.eval_block(body, ctx)?;
            if value.is_returned() {
                return Ok(value);
            }
        }
        Ok(Value::Null)
    }

    fn eval_call(&mut self, target: &ExprLoc, args: &[ExprLoc], ctx: &mut Context) -> RunResult<Value> {
        let callee = match &target.expr {
            Expr::Identifier(name) => self
                .resolve_name(name, ctx)
                .map_err(|e| e.ensure_offset(target.offset))?,
            _ => propagate!(self.eval_expr(target, ctx)?),
        };
        let function = match callee {
            Value::Function(function) => function,
            other => {
                return Err(RunError::type_error(format!(
                    "value of class {} is not callable",
                    other.type_name()
                )));
            }
        };
        let mut arg_values: SmallVec<[Value; 4]> = SmallVec::with_capacity(args.len());
        for arg in args {
            arg_values.push(propagate!(self.eval_expr(arg, ctx)?));
        }
        self.call_function(&function, &arg_values, ctx)
    }

    fn eval_method_call(
        &mut self,
        object: &ExprLoc,
        name: &str,
        args: &[ExprLoc],
        ctx: &mut Context,
    ) -> RunResult<Value> {
        let object_value = propagate!(self.eval_expr(object, ctx)?);
        let mut arg_values: SmallVec<[Value; 4]> = SmallVec::with_capacity(args.len());
        for arg in args {
            arg_values.push(propagate!(self.eval_expr(arg, ctx)?));
        }
        let Some(method) = object_value.class().find_method(name) else {
            return Err(RunError::type_error(format!(
                "method '{name}' is not defined on class {}",
                object_value.type_name()
            )));
        };
        method(&object_value, &arg_values)
    }

    /// Invokes a function value. The only place the return sentinel is
    /// unwrapped: a body without an explicit `return` yields its last
    /// statement's value.
    pub(crate) fn call_function(
        &mut self,
        function: &FunctionValue,
        args: &[Value],
        ctx: &mut Context,
    ) -> RunResult<Value> {
        match function {
            FunctionValue::Internal(builtin) => self.call_builtin(*builtin, args),
            FunctionValue::User(function) => {
                let depth = self.state.call_stack.len();
                self.tracker.check_recursion_depth(depth).map_err(RunError::from)?;
                self.tracer.on_call(&function.name, depth + 1);
                self.state.call_stack.push(function.name.clone());

                let mut callee_ctx = ctx.for_call();
                for (i, spec) in function.args.iter().enumerate() {
                    let value = match args.get(i) {
                        Some(value) => value.clone(),
                        None => match &spec.default {
                            Some(default) => self.eval_expr(default, &mut callee_ctx)?.unwrap_returned(),
                            None => Value::Null,
                        },
                    };
                    callee_ctx.set_var(&spec.name, value);
                }

                // on error the frame stays on the stack for the diagnostic
                let value = self.eval_block(&function.body, &mut callee_ctx)?;
                self.state.call_stack.pop();
                self.tracer.on_return(&function.name, depth);
                Ok(value.unwrap_returned())
            }
        }
    }

    fn call_builtin(&mut self, builtin: Builtin, args: &[Value]) -> RunResult<Value> {
        match builtin {
            Builtin::Print => builtins::print::builtin_print(args, &mut *self.writer),
            Builtin::Println => builtins::print::builtin_println(args, &mut *self.writer),
            Builtin::Exit => {
                // the one operation that terminates the host process
                std::process::exit(0);
            }
            Builtin::MathRandom => {
                builtins::expect_no_args("math\\random", args)?;
                builtins::math::builtin_random(&mut self.state.rng)
            }
            Builtin::OsArgs => {
                builtins::expect_no_args("os\\args", args)?;
                builtins::os::builtin_os_args(&self.state.argv)
            }
        }
    }

    /// Named declarations register a user function in globals under the
    /// namespace-qualified name and yield Null; anonymous declarations yield
    /// the function value and touch nothing.
    fn eval_function_decl(&mut self, decl: &FunctionDecl, ctx: &mut Context) -> RunResult<Value> {
        match &decl.name {
            Some(name) => {
                let qualified = self.qualified_name(name);
                let function = self.build_user_function(qualified.clone(), decl, false);
                ctx.set_global(&qualified, Value::Function(FunctionValue::User(function)))?;
                Ok(Value::Null)
            }
            None => {
                self.state.anon_counter += 1;
                let name = format!("{{closure:{}}}", self.state.anon_counter);
                let function = self.build_user_function(name, decl, true);
                Ok(Value::Function(FunctionValue::User(function)))
            }
        }
    }

    fn build_user_function(&self, name: String, decl: &FunctionDecl, anonymous: bool) -> std::rc::Rc<UserFunction> {
        std::rc::Rc::new(UserFunction {
            name,
            args: decl.args.clone(),
            captures: decl.captures.clone(),
            body: decl.body.clone(),
            anonymous,
        })
    }

    /// Registers a user class built from the `MethodDecl` statements of the
    /// class body. Instantiation stays unsupported; the class value exists
    /// for registration and `instanceof`.
    fn eval_class_decl(&mut self, name: &str, body: &Block, ctx: &mut Context) -> RunResult<Value> {
        let mut methods = AHashMap::new();
        for node in &body.statements {
            let Stmt::Expression(expr) = &node.stmt else {
                return Err(RunError::type_error("unexpected statement in class body").ensure_offset(node.offset));
            };
            let Expr::MethodDecl {
                visibility,
                is_final,
                is_abstract,
                function,
            } = &expr.expr
            else {
                return Err(RunError::type_error("unexpected statement in class body").ensure_offset(node.offset));
            };
            let Some(method_name) = function.name.clone() else {
                return Err(RunError::type_error("class methods must be named").ensure_offset(node.offset));
            };
            let function = self.build_user_function(format!("{name}::{method_name}"), function, false);
            methods.insert(
                method_name,
                UserMethod {
                    visibility: *visibility,
                    is_final: *is_final,
                    is_abstract: *is_abstract,
                    function,
                },
            );
        }
        let qualified = self.qualified_name(name);
        let class = UserClass {
            name: qualified.clone(),
            methods,
        };
        ctx.set_global(&qualified, Value::Class(ClassValue::User(std::rc::Rc::new(class))))?;
        Ok(Value::Null)
    }

    fn eval_new(&mut self, class_name: &str, ctx: &Context) -> RunResult<Value> {
        let class = self
            .resolve_name(class_name, ctx)
            .map_err(|_| RunError::name(format!("class '{class_name}' does not exist")))?;
        match class {
            Value::Class(_) => Err(RunError::type_error("class instantiation is not supported")),
            other => Err(RunError::type_error(format!(
                "'{class_name}' is not a class, it is a value of class {}",
                other.type_name()
            ))),
        }
    }
}
