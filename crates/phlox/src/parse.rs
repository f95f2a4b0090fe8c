//! Pratt parser: token stream → AST.
//!
//! Expression parsing is driven by per-token prefix and infix handlers with
//! a numeric precedence ladder; statement recognition dispatches on the
//! current token. Parsing stops at the first error.

use crate::{
    errors::{RunError, RunResult},
    expressions::{
        ArgSpec, BinaryOp, Block, Expr, ExprLoc, FunctionDecl, Module, Node, Stmt, UnaryOp, Visibility,
    },
    printer,
    scanner::Scanner,
    token::{Token, TokenKind},
};

/// Binding strength of infix operators, ascending.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Precedence {
    Lowest,
    Braces,
    /// `=`, `..` and the compound assignment operators (right-associative).
    Assign,
    Comparison,
    Sum,
    Product,
    /// `->`
    Fetch,
    /// Call `(` and index `[`.
    CallIndex,
    Prefix,
}

fn precedence_of(kind: TokenKind) -> Precedence {
    match kind {
        TokenKind::Equal
        | TokenKind::Range
        | TokenKind::PlusEqual
        | TokenKind::MinusEqual
        | TokenKind::MulEqual
        | TokenKind::DivEqual
        | TokenKind::ModEqual => Precedence::Assign,
        TokenKind::IsEqual
        | TokenKind::IsIdentical
        | TokenKind::IsNotEqual
        | TokenKind::IsNotIdentical
        | TokenKind::IsSmaller
        | TokenKind::IsGreater
        | TokenKind::IsSmallerOrEqual
        | TokenKind::IsGreaterOrEqual
        | TokenKind::InstanceOf
        | TokenKind::Ampersand
        | TokenKind::Pipe => Precedence::Comparison,
        TokenKind::Plus | TokenKind::Minus => Precedence::Sum,
        TokenKind::Mul | TokenKind::Div | TokenKind::Mod => Precedence::Product,
        TokenKind::ObjectOperator => Precedence::Fetch,
        TokenKind::ParenOpen | TokenKind::BracketOpen => Precedence::CallIndex,
        TokenKind::Increment | TokenKind::Decrement => Precedence::Prefix,
        _ => Precedence::Lowest,
    }
}

fn binary_op_of(kind: TokenKind) -> Option<BinaryOp> {
    let op = match kind {
        TokenKind::Plus => BinaryOp::Add,
        TokenKind::Minus => BinaryOp::Sub,
        TokenKind::Mul => BinaryOp::Mul,
        TokenKind::Div => BinaryOp::Div,
        TokenKind::Mod => BinaryOp::Mod,
        TokenKind::IsEqual => BinaryOp::Equal,
        TokenKind::IsIdentical => BinaryOp::Identical,
        TokenKind::IsNotEqual => BinaryOp::NotEqual,
        TokenKind::IsNotIdentical => BinaryOp::NotIdentical,
        TokenKind::IsSmaller => BinaryOp::Smaller,
        TokenKind::IsGreater => BinaryOp::Greater,
        TokenKind::IsSmallerOrEqual => BinaryOp::SmallerOrEqual,
        TokenKind::IsGreaterOrEqual => BinaryOp::GreaterOrEqual,
        TokenKind::Ampersand => BinaryOp::BitAnd,
        TokenKind::Pipe => BinaryOp::BitOr,
        _ => return None,
    };
    Some(op)
}

/// The compound assignment operators and the binary operator each desugars to.
fn compound_op_of(kind: TokenKind) -> Option<BinaryOp> {
    let op = match kind {
        TokenKind::PlusEqual => BinaryOp::Add,
        TokenKind::MinusEqual => BinaryOp::Sub,
        TokenKind::MulEqual => BinaryOp::Mul,
        TokenKind::DivEqual => BinaryOp::Div,
        TokenKind::ModEqual => BinaryOp::Mod,
        _ => return None,
    };
    Some(op)
}

pub(crate) struct Parser {
    scanner: Scanner,
    cur: Token,
    peeked: Option<Token>,
}

/// Parses a complete source text into a [`Module`].
pub(crate) fn parse(source: &str) -> RunResult<Module> {
    Parser::new(Scanner::new(source))?.parse_module()
}

impl Parser {
    pub fn new(mut scanner: Scanner) -> RunResult<Self> {
        let cur = scanner.next_token()?;
        Ok(Self {
            scanner,
            cur,
            peeked: None,
        })
    }

    fn next(&mut self) -> RunResult<()> {
        self.cur = match self.peeked.take() {
            Some(token) => token,
            None => self.scanner.next_token()?,
        };
        Ok(())
    }

    fn peek(&mut self) -> RunResult<&Token> {
        if self.peeked.is_none() {
            self.peeked = Some(self.scanner.next_token()?);
        }
        Ok(self.peeked.as_ref().expect("just filled"))
    }

    fn expect(&self, kind: TokenKind, what: &str) -> RunResult<()> {
        if self.cur.kind == kind {
            Ok(())
        } else {
            Err(RunError::parse(
                format!("expected {what}, got {}", self.cur.describe()),
                self.cur.offset,
            ))
        }
    }

    fn unexpected(&self) -> RunError {
        RunError::parse(format!("unexpected token {}", self.cur.describe()), self.cur.offset)
    }

    pub fn parse_module(&mut self) -> RunResult<Module> {
        let mut statements = Vec::new();
        loop {
            while self.cur.kind == TokenKind::Semicolon {
                self.next()?;
            }
            if self.cur.kind == TokenKind::Eof {
                return Ok(Module { statements });
            }
            statements.push(self.parse_statement()?);
        }
    }

    fn parse_statement(&mut self) -> RunResult<Node> {
        let offset = self.cur.offset;
        let stmt = match self.cur.kind {
            TokenKind::Use => self.parse_use_statement()?,
            TokenKind::Namespace => self.parse_namespace_statement()?,
            TokenKind::Return => self.parse_return_statement()?,
            _ => Stmt::Expression(self.parse_expression(Precedence::Lowest)?),
        };
        if self.cur.kind == TokenKind::Semicolon {
            self.next()?;
        }
        Ok(Node { stmt, offset })
    }

    /// `use Ns\Sub\Name;` — the last segment is the imported name.
    fn parse_use_statement(&mut self) -> RunResult<Stmt> {
        let offset = self.cur.offset;
        self.next()?;
        let path = self.parse_path()?;
        if path.len() < 2 {
            return Err(RunError::parse("empty namespace in use directive", offset));
        }
        let classes = vec![path[path.len() - 1].clone()];
        let namespace = path[..path.len() - 1].join("\\");
        Ok(Stmt::Use { namespace, classes })
    }

    fn parse_namespace_statement(&mut self) -> RunResult<Stmt> {
        let offset = self.cur.offset;
        self.next()?;
        let path = self.parse_path()?;
        if path.is_empty() {
            return Err(RunError::parse("empty path in namespace directive", offset));
        }
        Ok(Stmt::Namespace { path: path.join("\\") })
    }

    /// `IDENT (\ IDENT)*`
    fn parse_path(&mut self) -> RunResult<Vec<String>> {
        let mut segments = Vec::new();
        loop {
            self.expect(TokenKind::Ident, "identifier")?;
            segments.push(self.cur.literal.clone());
            self.next()?;
            if self.cur.kind == TokenKind::Backslash {
                self.next()?;
            } else {
                return Ok(segments);
            }
        }
    }

    fn parse_return_statement(&mut self) -> RunResult<Stmt> {
        self.next()?;
        if matches!(
            self.cur.kind,
            TokenKind::Semicolon | TokenKind::CurlyClose | TokenKind::Eof
        ) {
            return Ok(Stmt::Return(None));
        }
        Ok(Stmt::Return(Some(self.parse_expression(Precedence::Lowest)?)))
    }

    fn parse_expression(&mut self, precedence: Precedence) -> RunResult<ExprLoc> {
        let mut left = self.parse_prefix()?;
        loop {
            if self.cur.kind == TokenKind::Semicolon {
                return Ok(left);
            }
            if precedence >= precedence_of(self.cur.kind) {
                return Ok(left);
            }
            left = self.parse_infix(left)?;
        }
    }

    fn parse_prefix(&mut self) -> RunResult<ExprLoc> {
        let offset = self.cur.offset;
        let expr = match self.cur.kind {
            TokenKind::Number => {
                let value: i64 = self
                    .cur
                    .literal
                    .parse()
                    .map_err(|_| RunError::lex(format!("malformed numeric literal '{}'", self.cur.literal), offset))?;
                self.next()?;
                Expr::Int(value)
            }
            TokenKind::String => {
                let value = self.cur.literal.clone();
                self.next()?;
                Expr::Str(value)
            }
            TokenKind::Ident => self.parse_identifier()?,
            TokenKind::Var => Expr::Variable(self.parse_variable_name()?),
            TokenKind::Const => {
                self.next()?;
                self.expect(TokenKind::Ident, "identifier")?;
                let name = self.cur.literal.clone();
                self.next()?;
                Expr::Constant(name)
            }
            TokenKind::Function => Expr::FunctionDecl(self.parse_function_decl()?),
            TokenKind::Class => self.parse_class_decl()?,
            TokenKind::Public | TokenKind::Protected | TokenKind::Private => self.parse_method_decl()?,
            TokenKind::New => self.parse_new()?,
            TokenKind::BracketOpen => self.parse_array_literal()?,
            TokenKind::ParenOpen => return self.parse_grouped(),
            TokenKind::If => self.parse_if()?,
            TokenKind::While => self.parse_while()?,
            TokenKind::Foreach => self.parse_foreach()?,
            TokenKind::Minus => self.parse_unary(UnaryOp::Minus)?,
            TokenKind::Not => self.parse_unary(UnaryOp::Not)?,
            TokenKind::Increment => self.parse_unary(UnaryOp::Increment)?,
            TokenKind::Decrement => self.parse_unary(UnaryOp::Decrement)?,
            _ => return Err(self.unexpected()),
        };
        Ok(ExprLoc { expr, offset })
    }

    /// A bare identifier: `true`/`false`/`null` literals, or a possibly
    /// namespace-qualified name folded into one `Identifier`.
    fn parse_identifier(&mut self) -> RunResult<Expr> {
        let mut name = self.cur.literal.clone();
        self.next()?;
        if self.cur.kind != TokenKind::Backslash {
            return Ok(match name.as_str() {
                "true" => Expr::Bool(true),
                "false" => Expr::Bool(false),
                "null" => Expr::Null,
                _ => Expr::Identifier(name),
            });
        }
        while self.cur.kind == TokenKind::Backslash {
            if self.peek()?.kind != TokenKind::Ident {
                break;
            }
            self.next()?;
            name.push('\\');
            name.push_str(&self.cur.literal);
            self.next()?;
        }
        Ok(Expr::Identifier(name))
    }

    /// `$NAME` — the sigil then the identifier.
    fn parse_variable_name(&mut self) -> RunResult<String> {
        self.next()?;
        self.expect(TokenKind::Ident, "identifier after '$'")?;
        let name = self.cur.literal.clone();
        self.next()?;
        Ok(name)
    }

    fn parse_unary(&mut self, op: UnaryOp) -> RunResult<Expr> {
        self.next()?;
        let operand = self.parse_expression(Precedence::Prefix)?;
        Ok(Expr::Unary {
            op,
            operand: Box::new(operand),
            prefix: true,
        })
    }

    fn parse_grouped(&mut self) -> RunResult<ExprLoc> {
        self.next()?;
        let inner = self.parse_expression(Precedence::Lowest)?;
        self.expect(TokenKind::ParenClose, "')'")?;
        self.next()?;
        Ok(inner)
    }

    fn parse_array_literal(&mut self) -> RunResult<Expr> {
        self.next()?;
        let mut elements = Vec::new();
        if self.cur.kind == TokenKind::BracketClose {
            self.next()?;
            return Ok(Expr::Array(elements));
        }
        loop {
            elements.push(self.parse_expression(Precedence::Lowest)?);
            match self.cur.kind {
                TokenKind::Comma => self.next()?,
                TokenKind::BracketClose => {
                    self.next()?;
                    return Ok(Expr::Array(elements));
                }
                _ => {
                    return Err(RunError::parse(
                        format!("expected ',' or ']', got {}", self.cur.describe()),
                        self.cur.offset,
                    ));
                }
            }
        }
    }

    /// `if EXPR BLOCK (else BLOCK)?` — `else if` chains nest the inner `if`
    /// as a single-statement alternative block.
    fn parse_if(&mut self) -> RunResult<Expr> {
        self.next()?;
        let condition = self.parse_expression(Precedence::Lowest)?;
        let consequence = self.parse_block()?;
        let alternative = if self.cur.kind == TokenKind::Else {
            self.next()?;
            if self.cur.kind == TokenKind::If {
                let offset = self.cur.offset;
                let nested = self.parse_if()?;
                Some(Block {
                    statements: vec![Node {
                        stmt: Stmt::Expression(ExprLoc { expr: nested, offset }),
                        offset,
                    }],
                })
            } else {
                Some(self.parse_block()?)
            }
        } else {
            None
        };
        Ok(Expr::If {
            condition: Box::new(condition),
            consequence,
            alternative,
        })
    }

    fn parse_while(&mut self) -> RunResult<Expr> {
        self.next()?;
        let condition = self.parse_expression(Precedence::Lowest)?;
        let body = self.parse_block()?;
        Ok(Expr::While {
            condition: Box::new(condition),
            body,
        })
    }

    /// `foreach ( EXPR as $VAR (=> $VAR)? ) BLOCK`, parens optional.
    fn parse_foreach(&mut self) -> RunResult<Expr> {
        self.next()?;
        let parenthesized = self.cur.kind == TokenKind::ParenOpen;
        if parenthesized {
            self.next()?;
        }
        let array = self.parse_expression(Precedence::Lowest)?;
        self.expect(TokenKind::As, "'as'")?;
        self.next()?;
        self.expect(TokenKind::Var, "'$'")?;
        let first = self.parse_variable_name()?;
        let (key_var, value_var) = if self.cur.kind == TokenKind::DoubleArrow {
            self.next()?;
            self.expect(TokenKind::Var, "'$'")?;
            let second = self.parse_variable_name()?;
            (Some(first), second)
        } else {
            (None, first)
        };
        if parenthesized {
            self.expect(TokenKind::ParenClose, "')'")?;
            self.next()?;
        }
        let body = self.parse_block()?;
        Ok(Expr::ForEach {
            array: Box::new(array),
            key_var,
            value_var,
            body,
        })
    }

    fn parse_new(&mut self) -> RunResult<Expr> {
        self.next()?;
        self.expect(TokenKind::Ident, "class name")?;
        let Expr::Identifier(class_name) = self.parse_identifier()? else {
            return Err(self.unexpected());
        };
        let args = if self.cur.kind == TokenKind::ParenOpen {
            self.parse_call_args()?
        } else {
            Vec::new()
        };
        Ok(Expr::New { class_name, args })
    }

    /// `function IDENT? ( ARGS ) (use (VARS))? (: IDENT)? BLOCK`
    fn parse_function_decl(&mut self) -> RunResult<FunctionDecl> {
        self.next()?;
        let name = if self.cur.kind == TokenKind::Ident {
            let name = self.cur.literal.clone();
            self.next()?;
            Some(name)
        } else {
            None
        };
        self.expect(TokenKind::ParenOpen, "'('")?;
        let args = self.parse_arg_specs()?;

        let mut captures = Vec::new();
        if self.cur.kind == TokenKind::Use {
            self.next()?;
            self.expect(TokenKind::ParenOpen, "'('")?;
            self.next()?;
            loop {
                self.expect(TokenKind::Var, "'$'")?;
                captures.push(self.parse_variable_name()?);
                match self.cur.kind {
                    TokenKind::Comma => self.next()?,
                    TokenKind::ParenClose => {
                        self.next()?;
                        break;
                    }
                    _ => {
                        return Err(RunError::parse(
                            format!("expected ',' or ')', got {}", self.cur.describe()),
                            self.cur.offset,
                        ));
                    }
                }
            }
        }

        let return_type = if self.cur.kind == TokenKind::Colon {
            self.next()?;
            self.expect(TokenKind::Ident, "return type")?;
            let ty = self.cur.literal.clone();
            self.next()?;
            Some(ty)
        } else {
            None
        };

        if self.cur.kind != TokenKind::CurlyOpen {
            return Err(RunError::parse(
                format!("expected ':' or '{{', got {}", self.cur.describe()),
                self.cur.offset,
            ));
        }
        let body = self.parse_block()?;

        Ok(FunctionDecl {
            name,
            args,
            captures,
            return_type,
            body,
        })
    }

    /// Comma-separated arg specs between parens: `Type? &? ...? $NAME (= EXPR)?`
    fn parse_arg_specs(&mut self) -> RunResult<Vec<ArgSpec>> {
        self.next()?;
        let mut args = Vec::new();
        if self.cur.kind == TokenKind::ParenClose {
            self.next()?;
            return Ok(args);
        }
        loop {
            let type_name = if self.cur.kind == TokenKind::Ident {
                let ty = self.cur.literal.clone();
                self.next()?;
                Some(ty)
            } else {
                None
            };
            let by_ref = if self.cur.kind == TokenKind::Ampersand {
                self.next()?;
                true
            } else {
                false
            };
            let variadic = if self.cur.kind == TokenKind::Ellipsis {
                self.next()?;
                true
            } else {
                false
            };
            self.expect(TokenKind::Var, "'$'")?;
            let name = self.parse_variable_name()?;
            let default = if self.cur.kind == TokenKind::Equal {
                self.next()?;
                Some(self.parse_expression(Precedence::Lowest)?)
            } else {
                None
            };
            args.push(ArgSpec {
                type_name,
                name,
                default,
                variadic,
                by_ref,
            });
            match self.cur.kind {
                TokenKind::ParenClose => {
                    self.next()?;
                    return Ok(args);
                }
                TokenKind::Comma => self.next()?,
                _ => {
                    return Err(RunError::parse(
                        format!("expected ',' or ')', got {}", self.cur.describe()),
                        self.cur.offset,
                    ));
                }
            }
        }
    }

    /// `class IDENT BLOCK` — block statements are member declarations.
    fn parse_class_decl(&mut self) -> RunResult<Expr> {
        self.next()?;
        self.expect(TokenKind::Ident, "class name")?;
        let name = self.cur.literal.clone();
        self.next()?;
        let body = self.parse_block()?;
        Ok(Expr::ClassDecl { name, body })
    }

    /// `public|protected|private (final|abstract)? function …`
    fn parse_method_decl(&mut self) -> RunResult<Expr> {
        let visibility = match self.cur.kind {
            TokenKind::Protected => Visibility::Protected,
            TokenKind::Private => Visibility::Private,
            _ => Visibility::Public,
        };
        self.next()?;
        let mut is_final = false;
        let mut is_abstract = false;
        loop {
            match self.cur.kind {
                TokenKind::Final => {
                    is_final = true;
                    self.next()?;
                }
                TokenKind::Abstract => {
                    is_abstract = true;
                    self.next()?;
                }
                _ => break,
            }
        }
        self.expect(TokenKind::Function, "'function'")?;
        let function = self.parse_function_decl()?;
        Ok(Expr::MethodDecl {
            visibility,
            is_final,
            is_abstract,
            function,
        })
    }

    fn parse_block(&mut self) -> RunResult<Block> {
        self.expect(TokenKind::CurlyOpen, "'{'")?;
        self.next()?;
        let mut statements = Vec::new();
        loop {
            while self.cur.kind == TokenKind::Semicolon {
                self.next()?;
            }
            match self.cur.kind {
                TokenKind::CurlyClose => {
                    self.next()?;
                    return Ok(Block { statements });
                }
                TokenKind::Eof => {
                    return Err(RunError::parse("expected '}', got end of file", self.cur.offset));
                }
                _ => statements.push(self.parse_statement()?),
            }
        }
    }

    fn parse_infix(&mut self, left: ExprLoc) -> RunResult<ExprLoc> {
        let offset = left.offset;
        let expr = match self.cur.kind {
            TokenKind::Equal => {
                self.validate_assignment_target(&left)?;
                self.next()?;
                let value = self.parse_expression(Precedence::Braces)?;
                Expr::Assignment {
                    target: Box::new(left),
                    value: Box::new(value),
                }
            }
            kind if compound_op_of(kind).is_some() => {
                let op = compound_op_of(kind).expect("guarded");
                self.validate_assignment_target(&left)?;
                self.next()?;
                let right = self.parse_expression(Precedence::Braces)?;
                // `$x op= e` is sugar for `$x = $x op e`
                let binary = ExprLoc {
                    expr: Expr::Binary {
                        left: Box::new(left.clone()),
                        op,
                        right: Box::new(right),
                    },
                    offset,
                };
                Expr::Assignment {
                    target: Box::new(left),
                    value: Box::new(binary),
                }
            }
            TokenKind::Range => {
                self.next()?;
                let end = self.parse_expression(Precedence::Braces)?;
                Expr::Range {
                    start: Box::new(left),
                    end: Box::new(end),
                }
            }
            TokenKind::InstanceOf => {
                self.next()?;
                let class = self.parse_expression(Precedence::Comparison)?;
                Expr::InstanceOf {
                    object: Box::new(left),
                    class: Box::new(class),
                }
            }
            TokenKind::ObjectOperator => return self.parse_fetch(left),
            TokenKind::ParenOpen => {
                let args = self.parse_call_args()?;
                Expr::Call {
                    target: Box::new(left),
                    args,
                }
            }
            TokenKind::BracketOpen => {
                self.next()?;
                let index = self.parse_expression(Precedence::Lowest)?;
                self.expect(TokenKind::BracketClose, "']'")?;
                self.next()?;
                Expr::Index {
                    left: Box::new(left),
                    index: Box::new(index),
                }
            }
            TokenKind::Increment => {
                self.next()?;
                Expr::Unary {
                    op: UnaryOp::Increment,
                    operand: Box::new(left),
                    prefix: false,
                }
            }
            TokenKind::Decrement => {
                self.next()?;
                Expr::Unary {
                    op: UnaryOp::Decrement,
                    operand: Box::new(left),
                    prefix: false,
                }
            }
            kind => match binary_op_of(kind) {
                Some(op) => {
                    let level = precedence_of(kind);
                    self.next()?;
                    let right = self.parse_expression(level)?;
                    Expr::Binary {
                        left: Box::new(left),
                        op,
                        right: Box::new(right),
                    }
                }
                None => return Err(self.unexpected()),
            },
        };
        Ok(ExprLoc { expr, offset })
    }

    /// `left -> IDENT` is a property read; `left -> IDENT ( … )` a method call.
    fn parse_fetch(&mut self, left: ExprLoc) -> RunResult<ExprLoc> {
        let offset = left.offset;
        self.next()?;
        self.expect(TokenKind::Ident, "property or method name")?;
        let name = self.cur.literal.clone();
        self.next()?;
        let expr = if self.cur.kind == TokenKind::ParenOpen {
            let args = self.parse_call_args()?;
            Expr::MethodCall {
                object: Box::new(left),
                name,
                args,
            }
        } else {
            Expr::PropertyRead {
                object: Box::new(left),
                name,
            }
        };
        Ok(ExprLoc { expr, offset })
    }

    fn parse_call_args(&mut self) -> RunResult<Vec<ExprLoc>> {
        self.next()?;
        let mut args = Vec::new();
        if self.cur.kind == TokenKind::ParenClose {
            self.next()?;
            return Ok(args);
        }
        loop {
            args.push(self.parse_expression(Precedence::Lowest)?);
            match self.cur.kind {
                TokenKind::ParenClose => {
                    self.next()?;
                    return Ok(args);
                }
                TokenKind::Comma => self.next()?,
                _ => {
                    return Err(RunError::parse(
                        format!("expected ',' or ')', got {}", self.cur.describe()),
                        self.cur.offset,
                    ));
                }
            }
        }
    }

    /// Only variables, constants and index expressions are assignable.
    fn validate_assignment_target(&self, target: &ExprLoc) -> RunResult<()> {
        match target.expr {
            Expr::Variable(_) | Expr::Constant(_) | Expr::Index { .. } => Ok(()),
            _ => Err(RunError::parse(
                format!("can not assign to {}", printer::expr_to_string(target)),
                target.offset,
            )),
        }
    }
}
