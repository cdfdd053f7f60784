//! Prompt assembly for hosts that feed the registry to an LLM.
//!
//! The interpreter does not consume any of this; it exists so the host can
//! describe the available tools and the current state in the system prompt
//! that elicits a script.

use crate::tools::ToolRegistry;
use std::fmt::Write;

/// One block per registered tool, in registration order.
pub fn render_tool_schemas(registry: &ToolRegistry) -> String {
    let mut out = String::new();
    for schema in registry.all_schemas() {
        let _ = writeln!(out, "- {}: {}", schema.name, schema.description);
        for param in &schema.parameters {
            let requirement = if param.required { "required" } else { "optional" };
            match &param.description {
                Some(description) => {
                    let _ = writeln!(
                        out,
                        "    {}: {} ({}) - {}",
                        param.name, param.param_type, requirement, description
                    );
                }
                None => {
                    let _ = writeln!(
                        out,
                        "    {}: {} ({})",
                        param.name, param.param_type, requirement
                    );
                }
            }
        }
        match &schema.returns.description {
            Some(description) => {
                let _ = writeln!(
                    out,
                    "    returns {} - {}",
                    schema.returns.return_type, description
                );
            }
            None => {
                let _ = writeln!(out, "    returns {}", schema.returns.return_type);
            }
        }
    }
    out
}

/// Substitute `{tools_schema}` and `{state_info}` in a host-supplied
/// template. Any other placeholder belongs to the host and is left as-is.
pub fn build_prompt(registry: &ToolRegistry, template: &str) -> String {
    template
        .replace("{tools_schema}", &render_tool_schemas(registry))
        .replace("{state_info}", &registry.format_state_for_prompt())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::{ParamSpec, ParamType, ReturnSpec, ToolArgs, ToolContext, ToolSchema};
    use nuwa_core::Value;

    fn registry_with_tool() -> ToolRegistry {
        let mut registry = ToolRegistry::new();
        registry
            .register(
                ToolSchema {
                    name: "move_to".to_string(),
                    description: "Move the agent to a position".to_string(),
                    parameters: vec![
                        ParamSpec {
                            name: "x".to_string(),
                            param_type: ParamType::Number,
                            description: Some("target x".to_string()),
                            required: true,
                        },
                        ParamSpec::optional("speed", ParamType::Number),
                    ],
                    returns: ReturnSpec::of(ParamType::Null),
                },
                |_: &ToolArgs, _: &mut ToolContext<'_>| Ok(Value::Null),
            )
            .unwrap();
        registry
    }

    #[test]
    fn test_render_tool_schemas() {
        let rendered = render_tool_schemas(&registry_with_tool());
        assert!(rendered.contains("- move_to: Move the agent to a position"));
        assert!(rendered.contains("x: number (required) - target x"));
        assert!(rendered.contains("speed: number (optional)"));
        assert!(rendered.contains("returns null"));
    }

    #[test]
    fn test_build_prompt_substitutes_placeholders() {
        let mut registry = registry_with_tool();
        registry.state_mut().set("target", Value::String("home".into()));
        let prompt = build_prompt(
            &registry,
            "Tools:\n{tools_schema}\nState:\n{state_info}\nKeep {this}.",
        );
        assert!(prompt.contains("- move_to"));
        assert!(prompt.contains("target: \"home\""));
        assert!(prompt.contains("Keep {this}."));
    }
}
