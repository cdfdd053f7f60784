//! Error taxonomy for script execution.
//!
//! The first failure aborts the whole run and surfaces to the host; nothing
//! is caught inside the interpreter. Tool executor failures are always
//! wrapped in `ToolExecution` so tool authors never leak raw errors.

use crate::tools::ToolError;
use nuwa_compiler::compiler::tokens::Span;
use nuwa_compiler::{compiler::lexer::LexError, compiler::parser::ParseError, CompileError};
use thiserror::Error;

fn at(span: &Option<Span>) -> String {
    match span {
        Some(s) => format!(" at line {}, col {}", s.line, s.col),
        None => String::new(),
    }
}

/// Failure raised while evaluating a script. Every variant carries the
/// source span of the node it originated from, when one is available.
#[derive(Debug, Error)]
pub enum InterpreterError {
    #[error("{message}{}", at(.span))]
    Runtime {
        message: String,
        span: Option<Span>,
    },
    #[error("division by zero{}", at(.span))]
    DivisionByZero { span: Option<Span> },
    #[error("index {index} out of bounds for array of length {length}{}", at(.span))]
    IndexOutOfBounds {
        index: i64,
        length: usize,
        span: Option<Span>,
    },
    #[error("operator '{op}' expected {expected}, got {found}{}", at(.span))]
    Type {
        op: String,
        expected: String,
        found: String,
        span: Option<Span>,
    },
    #[error("IF condition must be a boolean, got {found}{}", at(.span))]
    InvalidCondition {
        found: String,
        span: Option<Span>,
    },
    #[error("undefined variable '{name}'{}", at(.span))]
    UndefinedVariable {
        name: String,
        span: Option<Span>,
    },
    #[error("cannot access property '{property}': {detail}{}", at(.span))]
    MemberAccess {
        property: String,
        detail: String,
        span: Option<Span>,
    },
    #[error("tool not found: {tool}{}", at(.span))]
    ToolNotFound {
        tool: String,
        span: Option<Span>,
    },
    #[error("missing required argument '{param}' for tool '{tool}'{}", at(.span))]
    ToolArgument {
        tool: String,
        param: String,
        span: Option<Span>,
    },
    #[error("tool '{tool}' failed: {source}{}", at(.span))]
    ToolExecution {
        tool: String,
        #[source]
        source: ToolError,
        span: Option<Span>,
    },
    #[error("unsupported operation '{op}'{}", at(.span))]
    UnsupportedOperation {
        op: String,
        span: Option<Span>,
    },
    #[error("FOR iterable must be an array, got {found}{}", at(.span))]
    InvalidIterable {
        found: String,
        span: Option<Span>,
    },
}

impl InterpreterError {
    /// The source location the failure is anchored to, if known.
    pub fn span(&self) -> Option<Span> {
        match self {
            InterpreterError::Runtime { span, .. }
            | InterpreterError::DivisionByZero { span }
            | InterpreterError::IndexOutOfBounds { span, .. }
            | InterpreterError::Type { span, .. }
            | InterpreterError::InvalidCondition { span, .. }
            | InterpreterError::UndefinedVariable { span, .. }
            | InterpreterError::MemberAccess { span, .. }
            | InterpreterError::ToolNotFound { span, .. }
            | InterpreterError::ToolArgument { span, .. }
            | InterpreterError::ToolExecution { span, .. }
            | InterpreterError::UnsupportedOperation { span, .. }
            | InterpreterError::InvalidIterable { span, .. } => *span,
        }
    }
}

/// End-to-end failure of `execute`: any stage of the pipeline.
#[derive(Debug, Error)]
pub enum ScriptError {
    #[error("lex error: {0}")]
    Lex(#[from] LexError),
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),
    #[error(transparent)]
    Interpreter(#[from] InterpreterError),
}

impl From<CompileError> for ScriptError {
    fn from(err: CompileError) -> Self {
        match err {
            CompileError::Lex(e) => ScriptError::Lex(e),
            CompileError::Parse(e) => ScriptError::Parse(e),
        }
    }
}
