//! NuwaScript Runtime
//!
//! Executes parsed scripts: the tree-walking interpreter, the built-in
//! functions, the tool registry with its schemas, and the state store
//! shared between tools and across runs.

mod builtins;

pub mod errors;
pub mod interpreter;
pub mod prompt;
pub mod state;
pub mod tools;

pub use errors::{InterpreterError, ScriptError};
pub use interpreter::{Interpreter, OutputHandler, Scope};
pub use state::{StateFormatter, StateMetadata, StateStore};
pub use tools::{
    ParamSpec, ParamType, RegistryError, ReturnSpec, ToolArgs, ToolContext, ToolError,
    ToolExecutor, ToolRegistry, ToolSchema,
};

/// End-to-end convenience over an empty tool registry: run lexer, parser,
/// and interpreter on `source` and return the final scope. Hosts that
/// register tools keep an [`Interpreter`] instead and call
/// [`Interpreter::run`], which shares one registry across executions.
pub fn execute(source: &str, initial_scope: Scope) -> Result<Scope, ScriptError> {
    Interpreter::new(ToolRegistry::new()).run(source, initial_scope)
}
