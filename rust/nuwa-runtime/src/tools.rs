//! Tool registry, schemas, and the dispatch boundary to host-registered
//! tools.
//!
//! A tool is an externally-registered operation invoked from scripts via
//! `CALL name { k: v, ... }`. The registry owns the registered executors
//! and the state store they share.

use crate::state::{StateMetadata, StateStore};
use indexmap::IndexMap;
use nuwa_core::Value;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Types a tool schema can declare for parameters and returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamType {
    String,
    Number,
    Boolean,
    Array,
    Object,
    Null,
    Any,
}

impl fmt::Display for ParamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamType::String => write!(f, "string"),
            ParamType::Number => write!(f, "number"),
            ParamType::Boolean => write!(f, "boolean"),
            ParamType::Array => write!(f, "array"),
            ParamType::Object => write!(f, "object"),
            ParamType::Null => write!(f, "null"),
            ParamType::Any => write!(f, "any"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParamSpec {
    pub name: String,
    #[serde(rename = "type")]
    pub param_type: ParamType,
    pub description: Option<String>,
    pub required: bool,
}

impl ParamSpec {
    pub fn required(name: impl Into<String>, param_type: ParamType) -> Self {
        Self {
            name: name.into(),
            param_type,
            description: None,
            required: true,
        }
    }

    pub fn optional(name: impl Into<String>, param_type: ParamType) -> Self {
        Self {
            name: name.into(),
            param_type,
            description: None,
            required: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReturnSpec {
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub return_type: ParamType,
}

impl ReturnSpec {
    pub fn of(return_type: ParamType) -> Self {
        Self {
            description: None,
            return_type,
        }
    }
}

/// Normalised description of a registered tool, rendered into the LLM
/// prompt by the host's prompt builder.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolSchema {
    pub name: String,
    pub description: String,
    pub parameters: Vec<ParamSpec>,
    pub returns: ReturnSpec,
}

/// Failure raised by a tool executor. The interpreter always wraps these
/// in `InterpreterError::ToolExecution`, preserving the cause.
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("tool invocation failed: {0}")]
    InvocationFailed(String),
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

/// Failure mode of tool registration.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("tool already registered: {0}")]
    Duplicate(String),
    #[error("invalid tool schema for '{name}': {reason}")]
    InvalidSchema { name: String, reason: String },
}

/// Evaluated call arguments handed to an executor, in source order.
pub type ToolArgs = IndexMap<String, Value>;

/// State access granted to an executor for the duration of one invocation.
pub struct ToolContext<'a> {
    state: &'a mut StateStore,
}

impl ToolContext<'_> {
    pub fn set_state(&mut self, key: &str, value: Value) {
        self.state.set(key, value);
    }

    pub fn set_state_with_metadata(&mut self, key: &str, value: Value, metadata: StateMetadata) {
        self.state.set_with_metadata(key, value, metadata);
    }

    pub fn state_value(&self, key: &str) -> Option<&Value> {
        self.state.get(key)
    }

    pub fn has_state(&self, key: &str) -> bool {
        self.state.has(key)
    }

    pub fn all_state(&self) -> &IndexMap<String, Value> {
        self.state.all()
    }

    pub fn clear_state(&mut self) {
        self.state.clear();
    }
}

/// A registered tool's callback. Implemented for any suitable closure.
///
/// Execution blocks the (single) script thread until the tool completes,
/// which is what gives scripts their strict source-order side effects.
pub trait ToolExecutor: Send + Sync {
    fn execute(&self, args: &ToolArgs, ctx: &mut ToolContext<'_>) -> Result<Value, ToolError>;
}

impl<F> ToolExecutor for F
where
    F: Fn(&ToolArgs, &mut ToolContext<'_>) -> Result<Value, ToolError> + Send + Sync,
{
    fn execute(&self, args: &ToolArgs, ctx: &mut ToolContext<'_>) -> Result<Value, ToolError> {
        self(args, ctx)
    }
}

pub struct RegisteredTool {
    pub schema: ToolSchema,
    executor: Box<dyn ToolExecutor>,
}

/// Mapping from tool name to registered tool, plus the shared state store.
/// Outlives individual script executions.
#[derive(Default)]
pub struct ToolRegistry {
    tools: IndexMap<String, RegisteredTool>,
    state: StateStore,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool. Fails on a duplicate name or a malformed schema.
    pub fn register(
        &mut self,
        schema: ToolSchema,
        executor: impl ToolExecutor + 'static,
    ) -> Result<(), RegistryError> {
        validate_schema(&schema)?;
        if self.tools.contains_key(&schema.name) {
            return Err(RegistryError::Duplicate(schema.name));
        }
        self.tools.insert(
            schema.name.clone(),
            RegisteredTool {
                schema,
                executor: Box::new(executor),
            },
        );
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&RegisteredTool> {
        self.tools.get(name)
    }

    pub fn is_registered(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    /// All schemas, in registration order.
    pub fn all_schemas(&self) -> Vec<&ToolSchema> {
        self.tools.values().map(|t| &t.schema).collect()
    }

    pub fn state(&self) -> &StateStore {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut StateStore {
        &mut self.state
    }

    pub fn format_state_for_prompt(&self) -> String {
        self.state.format_for_prompt()
    }

    /// Run a registered executor against the shared state store.
    pub fn invoke(&mut self, name: &str, args: &ToolArgs) -> Result<Value, ToolError> {
        let tool = self
            .tools
            .get(name)
            .ok_or_else(|| ToolError::InvocationFailed(format!("unknown tool '{}'", name)))?;
        let mut ctx = ToolContext {
            state: &mut self.state,
        };
        tool.executor.execute(args, &mut ctx)
    }
}

fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn validate_schema(schema: &ToolSchema) -> Result<(), RegistryError> {
    if !is_identifier(&schema.name) {
        return Err(RegistryError::InvalidSchema {
            name: schema.name.clone(),
            reason: "tool name must be an identifier".to_string(),
        });
    }
    let mut seen = Vec::with_capacity(schema.parameters.len());
    for param in &schema.parameters {
        if !is_identifier(&param.name) {
            return Err(RegistryError::InvalidSchema {
                name: schema.name.clone(),
                reason: format!("parameter name '{}' must be an identifier", param.name),
            });
        }
        if seen.contains(&param.name.as_str()) {
            return Err(RegistryError::InvalidSchema {
                name: schema.name.clone(),
                reason: format!("duplicate parameter '{}'", param.name),
            });
        }
        seen.push(param.name.as_str());
    }
    Ok(())
}
