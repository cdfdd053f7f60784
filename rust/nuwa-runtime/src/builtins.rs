//! Built-in functions: `NOW`, `PRINT`, `FORMAT`.
//!
//! Built-ins are called with parentheses and positional arguments, unlike
//! tools. Calling any other name that way is a runtime failure — the
//! language has no user-defined functions.

use crate::errors::InterpreterError;
use chrono::Utc;
use indexmap::IndexMap;
use nuwa_compiler::compiler::tokens::Span;
use nuwa_core::Value;

pub(crate) fn call_builtin(
    name: &str,
    args: &[Value],
    output: &dyn Fn(&str),
    span: Option<Span>,
) -> Result<Value, InterpreterError> {
    match name {
        "NOW" => now(args, span),
        "PRINT" => print(args, output, span),
        "FORMAT" => format_values(args, span),
        other => Err(InterpreterError::Runtime {
            message: format!("unknown function '{}'", other),
            span,
        }),
    }
}

/// `NOW()` — the current Unix timestamp in whole seconds.
fn now(args: &[Value], span: Option<Span>) -> Result<Value, InterpreterError> {
    if !args.is_empty() {
        return Err(InterpreterError::Runtime {
            message: format!("NOW takes no arguments, got {}", args.len()),
            span,
        });
    }
    Ok(Value::Number(Utc::now().timestamp() as f64))
}

/// `PRINT(value)` — hand the value's string form to the output handler.
fn print(
    args: &[Value],
    output: &dyn Fn(&str),
    span: Option<Span>,
) -> Result<Value, InterpreterError> {
    if args.len() != 1 {
        return Err(InterpreterError::Runtime {
            message: format!("PRINT takes exactly one argument, got {}", args.len()),
            span,
        });
    }
    output(&args[0].to_string());
    Ok(Value::Null)
}

/// `FORMAT(template, values)` — substitute `{identifier}` placeholders from
/// `values` into `template`. `{{` and `}}` emit literal braces.
fn format_values(args: &[Value], span: Option<Span>) -> Result<Value, InterpreterError> {
    if args.len() != 2 {
        return Err(InterpreterError::Runtime {
            message: format!("FORMAT takes exactly two arguments, got {}", args.len()),
            span,
        });
    }
    let Value::String(template) = &args[0] else {
        return Err(InterpreterError::Type {
            op: "FORMAT".to_string(),
            expected: "a string template".to_string(),
            found: args[0].type_name().to_string(),
            span,
        });
    };
    let Value::Object(values) = &args[1] else {
        return Err(InterpreterError::Type {
            op: "FORMAT".to_string(),
            expected: "an object of values".to_string(),
            found: args[1].type_name().to_string(),
            span,
        });
    };
    render_template(template, values, span).map(Value::String)
}

fn is_placeholder_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn render_template(
    template: &str,
    values: &IndexMap<String, Value>,
    span: Option<Span>,
) -> Result<String, InterpreterError> {
    let mut out = String::with_capacity(template.len());
    let mut chars = template.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '{' if chars.peek() == Some(&'{') => {
                chars.next();
                out.push('{');
            }
            '}' if chars.peek() == Some(&'}') => {
                chars.next();
                out.push('}');
            }
            '{' => {
                let mut name = String::new();
                loop {
                    match chars.next() {
                        Some('}') => break,
                        Some(c) => name.push(c),
                        None => {
                            return Err(InterpreterError::Runtime {
                                message: format!("unterminated placeholder '{{{}'", name),
                                span,
                            })
                        }
                    }
                }
                if !is_placeholder_name(&name) {
                    return Err(InterpreterError::Runtime {
                        message: format!("invalid placeholder '{{{}}}'", name),
                        span,
                    });
                }
                match values.get(&name) {
                    Some(value) => out.push_str(&value.to_string()),
                    None => {
                        return Err(InterpreterError::Runtime {
                            message: format!("missing key '{}' for FORMAT placeholder", name),
                            span,
                        })
                    }
                }
            }
            other => out.push(other),
        }
    }
    Ok(out)
}
