use crate::compiler::tokens::Span;
use nuwa_core::Value;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A complete NuwaScript program: an ordered sequence of statements.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Script {
    pub statements: Vec<Stmt>,
    pub span: Span,
}

// ── Statements ──

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Stmt {
    Let(LetStmt),
    Call(CallStmt),
    If(IfStmt),
    For(ForStmt),
    Expr(ExprStmt),
}

impl Stmt {
    pub fn span(&self) -> Span {
        match self {
            Stmt::Let(s) => s.span,
            Stmt::Call(s) => s.span,
            Stmt::If(s) => s.span,
            Stmt::For(s) => s.span,
            Stmt::Expr(s) => s.span,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LetStmt {
    pub name: String,
    pub value: Expr,
    pub span: Span,
}

/// Statement-form tool invocation; the result is discarded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallStmt {
    pub tool: String,
    pub args: Vec<NamedArg>,
    pub span: Span,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IfStmt {
    pub condition: Expr,
    pub then_body: Vec<Stmt>,
    pub else_body: Option<Vec<Stmt>>,
    pub span: Span,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForStmt {
    pub var: String,
    pub iter: Expr,
    pub body: Vec<Stmt>,
    pub span: Span,
}

/// A side-effectful expression in statement position. The parser only
/// admits function calls and tool calls here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExprStmt {
    pub expr: Expr,
    pub span: Span,
}

/// One `name: value` pair in a tool call's braces. Argument order in the
/// source is preserved because evaluation order follows it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NamedArg {
    pub name: String,
    pub value: Expr,
    pub span: Span,
}

// ── Expressions ──

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Expr {
    /// Literal value: number, string, boolean, or null
    Literal(Value, Span),
    /// Variable reference
    Variable(String, Span),
    /// Binary operation
    BinOp(Box<Expr>, BinOp, Box<Expr>, Span),
    /// Unary operation
    UnaryOp(UnaryOp, Box<Expr>, Span),
    /// Built-in function call: NAME(positional args)
    FunctionCall {
        name: String,
        args: Vec<Expr>,
        span: Span,
    },
    /// Expression-form tool call: CALL name { k: v, ... }
    ToolCall {
        tool: String,
        args: Vec<NamedArg>,
        span: Span,
    },
    /// Index access: expr[index]
    IndexAccess(Box<Expr>, Box<Expr>, Span),
    /// Member access: expr.property
    MemberAccess(Box<Expr>, String, Span),
    /// List literal: [a, b, c]
    ListLit(Vec<Expr>, Span),
    /// Object literal: { key: value, ... }
    ObjectLit(Vec<(String, Expr)>, Span),
}

impl Expr {
    pub fn span(&self) -> Span {
        match self {
            Expr::Literal(_, s)
            | Expr::Variable(_, s)
            | Expr::BinOp(_, _, _, s)
            | Expr::UnaryOp(_, _, s)
            | Expr::IndexAccess(_, _, s)
            | Expr::MemberAccess(_, _, s)
            | Expr::ListLit(_, s)
            | Expr::ObjectLit(_, s) => *s,
            Expr::FunctionCall { span, .. } => *span,
            Expr::ToolCall { span, .. } => *span,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BinOp {
    Eq,
    NotEq,
    Gt,
    Lt,
    GtEq,
    LtEq,
    And,
    Or,
    Add,
    Sub,
    Mul,
    Div,
    Mod,
}

impl fmt::Display for BinOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BinOp::Eq => write!(f, "=="),
            BinOp::NotEq => write!(f, "!="),
            BinOp::Gt => write!(f, ">"),
            BinOp::Lt => write!(f, "<"),
            BinOp::GtEq => write!(f, ">="),
            BinOp::LtEq => write!(f, "<="),
            BinOp::And => write!(f, "AND"),
            BinOp::Or => write!(f, "OR"),
            BinOp::Add => write!(f, "+"),
            BinOp::Sub => write!(f, "-"),
            BinOp::Mul => write!(f, "*"),
            BinOp::Div => write!(f, "/"),
            BinOp::Mod => write!(f, "%"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnaryOp {
    Not,
    Pos,
    Neg,
}

impl fmt::Display for UnaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnaryOp::Not => write!(f, "NOT"),
            UnaryOp::Pos => write!(f, "+"),
            UnaryOp::Neg => write!(f, "-"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ast_serializes_to_json() {
        let script = Script {
            statements: vec![Stmt::Let(LetStmt {
                name: "x".to_string(),
                value: Expr::Literal(Value::Number(1.0), Span::dummy()),
                span: Span::dummy(),
            })],
            span: Span::dummy(),
        };
        let json = serde_json::to_string(&script).unwrap();
        assert!(json.contains("\"Let\""));
        assert!(json.contains("\"x\""));
    }
}
