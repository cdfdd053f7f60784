//! NuwaScript command-line interface.
//!
//! Runs scripts against an empty tool registry: `PRINT` goes to stdout and
//! any `CALL` fails with a tool-not-found error, which is the correct
//! behaviour for a script executed outside an embedding host.

use clap::{Parser, Subcommand};
use nuwa_runtime::{Interpreter, Scope, ToolRegistry};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "nuwa", version, about = "Run and inspect NuwaScript programs")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Execute a script and print the final scope as JSON
    Run {
        /// Path to the script file
        script: PathBuf,
        /// Initial scope as a JSON object
        #[arg(long)]
        scope: Option<String>,
        /// Suppress the final scope dump
        #[arg(long)]
        quiet: bool,
    },
    /// Lex and parse a script, reporting the first syntax error
    Check {
        /// Path to the script file
        script: PathBuf,
    },
    /// Print the parsed AST as JSON
    Ast {
        /// Path to the script file
        script: PathBuf,
    },
}

fn main() -> ExitCode {
    match run(Cli::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            eprintln!("{}", message);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), String> {
    match cli.command {
        Command::Run {
            script,
            scope,
            quiet,
        } => {
            let source = read(&script)?;
            let mut final_scope = match scope {
                Some(json) => parse_scope(&json)?,
                None => Scope::new(),
            };
            let ast = parse_with_snippets(&source, &script)?;
            let mut interpreter = Interpreter::new(ToolRegistry::new());
            interpreter
                .execute(&ast, &mut final_scope)
                .map_err(|err| format!("error: {}", err))?;
            if !quiet {
                println!("{}", scope_to_json(final_scope)?);
            }
            Ok(())
        }
        Command::Check { script } => {
            let source = read(&script)?;
            parse_with_snippets(&source, &script)?;
            println!("ok");
            Ok(())
        }
        Command::Ast { script } => {
            let source = read(&script)?;
            let ast = parse_with_snippets(&source, &script)?;
            let json =
                serde_json::to_string_pretty(&ast).map_err(|err| format!("error: {}", err))?;
            println!("{}", json);
            Ok(())
        }
    }
}

fn parse_with_snippets(
    source: &str,
    path: &Path,
) -> Result<nuwa_compiler::compiler::ast::Script, String> {
    nuwa_compiler::parse(source).map_err(|err| {
        nuwa_compiler::diagnostics::format_error(&err, source, &path.display().to_string())
    })
}

fn read(path: &Path) -> Result<String, String> {
    std::fs::read_to_string(path)
        .map_err(|err| format!("error: cannot read {}: {}", path.display(), err))
}

fn parse_scope(json: &str) -> Result<Scope, String> {
    let value: serde_json::Value =
        serde_json::from_str(json).map_err(|err| format!("error: invalid --scope JSON: {}", err))?;
    let serde_json::Value::Object(entries) = value else {
        return Err("error: --scope must be a JSON object".to_string());
    };
    Ok(entries
        .into_iter()
        .map(|(key, value)| (key, nuwa_core::Value::from(value)))
        .collect())
}

fn scope_to_json(scope: Scope) -> Result<String, String> {
    let entries: serde_json::Map<String, serde_json::Value> = scope
        .into_iter()
        .map(|(key, value)| (key, serde_json::Value::from(value)))
        .collect();
    serde_json::to_string_pretty(&serde_json::Value::Object(entries))
        .map_err(|err| format!("error: {}", err))
}
