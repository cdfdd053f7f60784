//! Tree-walking interpreter for NuwaScript.
//!
//! Executes a `Script` against a mutable scope and the tool registry's
//! shared state. Statements run strictly in source order; a tool call
//! completes before the next statement starts, so side effects reach the
//! host exactly in the order they appear on the executed path.

use crate::builtins;
use crate::errors::{InterpreterError, ScriptError};
use crate::tools::{ToolArgs, ToolRegistry};
use indexmap::IndexMap;
use nuwa_compiler::compiler::ast::{
    BinOp, Expr, NamedArg, Script, Stmt, UnaryOp,
};
use nuwa_compiler::compiler::tokens::Span;
use nuwa_core::Value;

/// The variable environment of a running script. Flat: `FOR` loops bind
/// their iterator in place and restore the previous binding on exit.
pub type Scope = IndexMap<String, Value>;

/// Callback receiving each `PRINT` line.
pub type OutputHandler = Box<dyn Fn(&str) + Send + Sync>;

pub struct Interpreter {
    registry: ToolRegistry,
    output: OutputHandler,
}

impl Interpreter {
    /// An interpreter whose `PRINT` output goes to stdout.
    pub fn new(registry: ToolRegistry) -> Self {
        Self {
            registry,
            output: Box::new(|line| println!("{}", line)),
        }
    }

    pub fn with_output(registry: ToolRegistry, output: OutputHandler) -> Self {
        Self { registry, output }
    }

    pub fn set_output(&mut self, output: OutputHandler) {
        self.output = output;
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut ToolRegistry {
        &mut self.registry
    }

    /// End-to-end convenience: lex, parse, and execute `source`, returning
    /// the final scope. The registry (and its state store) persists across
    /// calls.
    pub fn run(&mut self, source: &str, initial_scope: Scope) -> Result<Scope, ScriptError> {
        let script = nuwa_compiler::parse(source)?;
        let mut scope = initial_scope;
        self.execute(&script, &mut scope)?;
        Ok(scope)
    }

    /// Execute a parsed script against an existing scope.
    pub fn execute(&mut self, script: &Script, scope: &mut Scope) -> Result<(), InterpreterError> {
        for stmt in &script.statements {
            self.exec_stmt(stmt, scope)?;
        }
        Ok(())
    }

    fn exec_stmt(&mut self, stmt: &Stmt, scope: &mut Scope) -> Result<(), InterpreterError> {
        match stmt {
            Stmt::Let(ls) => {
                let value = self.eval_expr(&ls.value, scope)?;
                scope.insert(ls.name.clone(), value);
                Ok(())
            }
            Stmt::Call(cs) => {
                self.dispatch_tool(&cs.tool, &cs.args, scope, cs.span)?;
                Ok(())
            }
            Stmt::If(is) => {
                let cond = match self.eval_expr(&is.condition, scope)? {
                    Value::Bool(b) => b,
                    other => {
                        return Err(InterpreterError::InvalidCondition {
                            found: other.type_name().to_string(),
                            span: Some(is.condition.span()),
                        })
                    }
                };
                let body = if cond {
                    Some(&is.then_body)
                } else {
                    is.else_body.as_ref()
                };
                if let Some(body) = body {
                    for stmt in body {
                        self.exec_stmt(stmt, scope)?;
                    }
                }
                Ok(())
            }
            Stmt::For(fs) => {
                let items = match self.eval_expr(&fs.iter, scope)? {
                    Value::Array(items) => items,
                    other => {
                        return Err(InterpreterError::InvalidIterable {
                            found: other.type_name().to_string(),
                            span: Some(fs.iter.span()),
                        })
                    }
                };
                // The iterator variable shadows any existing binding for
                // the duration of the loop; the prior binding (or its
                // absence) is reinstated on exit.
                let saved = scope.get(&fs.var).cloned();
                let mut outcome = Ok(());
                'iterations: for item in items {
                    scope.insert(fs.var.clone(), item);
                    for stmt in &fs.body {
                        if let Err(err) = self.exec_stmt(stmt, scope) {
                            outcome = Err(err);
                            break 'iterations;
                        }
                    }
                }
                match saved {
                    Some(prev) => {
                        scope.insert(fs.var.clone(), prev);
                    }
                    None => {
                        scope.shift_remove(&fs.var);
                    }
                }
                outcome
            }
            Stmt::Expr(es) => {
                self.eval_expr(&es.expr, scope)?;
                Ok(())
            }
        }
    }

    fn eval_expr(&mut self, expr: &Expr, scope: &mut Scope) -> Result<Value, InterpreterError> {
        match expr {
            Expr::Literal(value, _) => Ok(value.clone()),
            Expr::Variable(name, span) => {
                scope
                    .get(name)
                    .cloned()
                    .ok_or_else(|| InterpreterError::UndefinedVariable {
                        name: name.clone(),
                        span: Some(*span),
                    })
            }
            Expr::BinOp(lhs, op, rhs, span) => self.eval_binop(lhs, *op, rhs, scope, *span),
            Expr::UnaryOp(op, operand, span) => {
                let value = self.eval_expr(operand, scope)?;
                eval_unary(*op, value, *span)
            }
            Expr::FunctionCall { name, args, span } => {
                let mut values = Vec::with_capacity(args.len());
                for arg in args {
                    values.push(self.eval_expr(arg, scope)?);
                }
                builtins::call_builtin(name, &values, self.output.as_ref(), Some(*span))
            }
            Expr::ToolCall { tool, args, span } => self.dispatch_tool(tool, args, scope, *span),
            Expr::IndexAccess(target, index, span) => {
                let target = self.eval_expr(target, scope)?;
                let index = self.eval_expr(index, scope)?;
                eval_index(target, index, *span)
            }
            Expr::MemberAccess(target, property, span) => {
                let target = self.eval_expr(target, scope)?;
                eval_member(target, property, *span)
            }
            Expr::ListLit(elements, _) => {
                let mut items = Vec::with_capacity(elements.len());
                for element in elements {
                    items.push(self.eval_expr(element, scope)?);
                }
                Ok(Value::Array(items))
            }
            Expr::ObjectLit(entries, _) => {
                let mut object = IndexMap::with_capacity(entries.len());
                for (key, value) in entries {
                    let value = self.eval_expr(value, scope)?;
                    object.insert(key.clone(), value);
                }
                Ok(Value::Object(object))
            }
        }
    }

    fn eval_binop(
        &mut self,
        lhs: &Expr,
        op: BinOp,
        rhs: &Expr,
        scope: &mut Scope,
        span: Span,
    ) -> Result<Value, InterpreterError> {
        let left = self.eval_expr(lhs, scope)?;
        let right = self.eval_expr(rhs, scope)?;
        let span = Some(span);
        match op {
            BinOp::Eq => Ok(Value::Bool(left == right)),
            BinOp::NotEq => Ok(Value::Bool(left != right)),
            BinOp::Gt | BinOp::Lt | BinOp::GtEq | BinOp::LtEq => {
                let (a, b) = numeric_operands(op, &left, &right, span)?;
                Ok(Value::Bool(match op {
                    BinOp::Gt => a > b,
                    BinOp::Lt => a < b,
                    BinOp::GtEq => a >= b,
                    _ => a <= b,
                }))
            }
            BinOp::And | BinOp::Or => {
                let (a, b) = bool_operands(op, &left, &right, span)?;
                Ok(Value::Bool(if op == BinOp::And { a && b } else { a || b }))
            }
            BinOp::Add | BinOp::Sub | BinOp::Mul => {
                let (a, b) = numeric_operands(op, &left, &right, span)?;
                Ok(Value::Number(match op {
                    BinOp::Add => a + b,
                    BinOp::Sub => a - b,
                    _ => a * b,
                }))
            }
            BinOp::Div | BinOp::Mod => {
                let (a, b) = numeric_operands(op, &left, &right, span)?;
                if b == 0.0 {
                    return Err(InterpreterError::DivisionByZero { span });
                }
                // f64 `%` is the truncated remainder: the sign follows the
                // dividend, which is the contract here.
                Ok(Value::Number(if op == BinOp::Div { a / b } else { a % b }))
            }
        }
    }

    fn dispatch_tool(
        &mut self,
        tool: &str,
        args: &[NamedArg],
        scope: &mut Scope,
        span: Span,
    ) -> Result<Value, InterpreterError> {
        let span = Some(span);
        if !self.registry.is_registered(tool) {
            return Err(InterpreterError::ToolNotFound {
                tool: tool.to_string(),
                span,
            });
        }
        let mut evaluated = ToolArgs::new();
        for arg in args {
            let value = self.eval_expr(&arg.value, scope)?;
            evaluated.insert(arg.name.clone(), value);
        }
        let missing = self.registry.get(tool).and_then(|t| {
            t.schema
                .parameters
                .iter()
                .find(|p| p.required && !evaluated.contains_key(&p.name))
                .map(|p| p.name.clone())
        });
        if let Some(param) = missing {
            return Err(InterpreterError::ToolArgument {
                tool: tool.to_string(),
                param,
                span,
            });
        }
        self.registry
            .invoke(tool, &evaluated)
            .map_err(|source| InterpreterError::ToolExecution {
                tool: tool.to_string(),
                source,
                span,
            })
    }
}

fn numeric_operands(
    op: BinOp,
    left: &Value,
    right: &Value,
    span: Option<Span>,
) -> Result<(f64, f64), InterpreterError> {
    match (left.as_number(), right.as_number()) {
        (Some(a), Some(b)) => Ok((a, b)),
        _ => Err(InterpreterError::Type {
            op: op.to_string(),
            expected: "number operands".to_string(),
            found: format!("{} and {}", left.type_name(), right.type_name()),
            span,
        }),
    }
}

fn bool_operands(
    op: BinOp,
    left: &Value,
    right: &Value,
    span: Option<Span>,
) -> Result<(bool, bool), InterpreterError> {
    match (left.as_bool(), right.as_bool()) {
        (Some(a), Some(b)) => Ok((a, b)),
        _ => Err(InterpreterError::Type {
            op: op.to_string(),
            expected: "boolean operands".to_string(),
            found: format!("{} and {}", left.type_name(), right.type_name()),
            span,
        }),
    }
}

fn eval_unary(op: UnaryOp, operand: Value, span: Span) -> Result<Value, InterpreterError> {
    let span = Some(span);
    match op {
        UnaryOp::Not => match operand.as_bool() {
            Some(b) => Ok(Value::Bool(!b)),
            None => Err(InterpreterError::Type {
                op: op.to_string(),
                expected: "a boolean operand".to_string(),
                found: operand.type_name().to_string(),
                span,
            }),
        },
        UnaryOp::Pos | UnaryOp::Neg => match operand.as_number() {
            Some(n) => Ok(Value::Number(if op == UnaryOp::Neg { -n } else { n })),
            None => Err(InterpreterError::Type {
                op: op.to_string(),
                expected: "a number operand".to_string(),
                found: operand.type_name().to_string(),
                span,
            }),
        },
    }
}

fn eval_index(target: Value, index: Value, span: Span) -> Result<Value, InterpreterError> {
    let span = Some(span);
    let Value::Array(items) = &target else {
        return Err(InterpreterError::Type {
            op: "[]".to_string(),
            expected: "an array target".to_string(),
            found: target.type_name().to_string(),
            span,
        });
    };
    let idx = match &index {
        Value::Number(n) if index.is_integer() => *n as i64,
        other => {
            return Err(InterpreterError::Type {
                op: "[]".to_string(),
                expected: "an integer index".to_string(),
                found: match other {
                    Value::Number(n) => format!("number {}", n),
                    v => v.type_name().to_string(),
                },
                span,
            })
        }
    };
    if idx < 0 || idx as usize >= items.len() {
        return Err(InterpreterError::IndexOutOfBounds {
            index: idx,
            length: items.len(),
            span,
        });
    }
    Ok(items[idx as usize].clone())
}

fn eval_member(target: Value, property: &str, span: Span) -> Result<Value, InterpreterError> {
    let span = Some(span);
    let Value::Object(entries) = &target else {
        return Err(InterpreterError::MemberAccess {
            property: property.to_string(),
            detail: format!("target is {}, not an object", target.type_name()),
            span,
        });
    };
    match entries.get(property) {
        Some(value) => Ok(value.clone()),
        None => Err(InterpreterError::MemberAccess {
            property: property.to_string(),
            detail: "no such property".to_string(),
            span,
        }),
    }
}
