//! Error diagnostics with source snippets.
//!
//! Scripts arrive from an LLM, so syntax failures are common and the host
//! usually feeds them back into the next prompt. A rendered diagnostic
//! carries the offending line and a caret so the failure is legible to
//! both humans and models.

use crate::compiler::lexer::LexError;
use crate::compiler::parser::ParseError;
use crate::CompileError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
}

/// A diagnostic with optional source context.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub severity: Severity,
    pub message: String,
    pub line: Option<usize>,
    pub col: Option<usize>,
    pub source_line: Option<String>,
}

impl Diagnostic {
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            message: message.into(),
            line: None,
            col: None,
            source_line: None,
        }
    }

    /// Attach a 1-based line/col location and capture that source line.
    pub fn with_location(mut self, source: &str, line: usize, col: usize) -> Self {
        self.line = Some(line);
        self.col = Some(col);
        self.source_line = line
            .checked_sub(1)
            .and_then(|n| source.lines().nth(n))
            .map(str::to_string);
        self
    }

    /// Plain-text rendering: the message, then the offending line with a
    /// caret under the reported column.
    pub fn render(&self, file: &str) -> String {
        let label = match self.severity {
            Severity::Error => "error",
            Severity::Warning => "warning",
        };
        let mut out = match (self.line, self.col) {
            (Some(line), Some(col)) => format!(
                "{}: {}\n  --> {}:{}:{}\n",
                label, self.message, file, line, col
            ),
            _ => format!("{}: {}\n  --> {}\n", label, self.message, file),
        };
        if let (Some(line), Some(col), Some(text)) = (self.line, self.col, &self.source_line) {
            let gutter = line.to_string();
            out.push_str(&format!("   {} | {}\n", gutter, text));
            out.push_str(&format!(
                "   {} | {}^\n",
                " ".repeat(gutter.len()),
                " ".repeat(col.saturating_sub(1))
            ));
        }
        out
    }
}

fn lex_location(err: &LexError) -> (usize, usize) {
    match err {
        LexError::UnexpectedChar { line, col, .. }
        | LexError::UnterminatedString { line, col }
        | LexError::InvalidEscape { line, col } => (*line, *col),
    }
}

fn parse_location(err: &ParseError) -> (usize, usize) {
    match err {
        ParseError::Unexpected { line, col, .. }
        | ParseError::InvalidNumber { line, col, .. }
        | ParseError::BareExpression { line, col } => (*line, *col),
    }
}

/// Build the diagnostic for a front-end failure, with the offending line.
pub fn diagnose(error: &CompileError, source: &str) -> Diagnostic {
    let (message, (line, col)) = match error {
        CompileError::Lex(err) => (err.to_string(), lex_location(err)),
        CompileError::Parse(err) => (err.to_string(), parse_location(err)),
    };
    Diagnostic::error(message).with_location(source, line, col)
}

/// Render a front-end failure for terminal display.
pub fn format_error(error: &CompileError, source: &str, file: &str) -> String {
    diagnose(error, source).render(file)
}
