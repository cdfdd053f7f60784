//! NuwaScript Compiler
//!
//! Transforms NuwaScript source text into a `Script` AST: lexer, token
//! definitions, and recursive-descent parser.

pub mod compiler;
pub mod diagnostics;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CompileError {
    #[error("lex error: {0}")]
    Lex(#[from] compiler::lexer::LexError),
    #[error("parse error: {0}")]
    Parse(#[from] compiler::parser::ParseError),
}

/// Parse a complete NuwaScript source string into its AST.
pub fn parse(source: &str) -> Result<compiler::ast::Script, CompileError> {
    let mut lexer = compiler::lexer::Lexer::new(source);
    let tokens = lexer.tokenize()?;
    let mut parser = compiler::parser::Parser::new(tokens);
    Ok(parser.parse_script()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use compiler::ast::Stmt;

    #[test]
    fn test_parse_simple() {
        let script = parse("LET x = 1 + 2").unwrap();
        assert_eq!(script.statements.len(), 1);
        assert!(matches!(script.statements[0], Stmt::Let(_)));
    }

    #[test]
    fn test_parse_reports_lex_errors() {
        let err = parse("LET x = 1 ~ 2").unwrap_err();
        assert!(matches!(err, CompileError::Lex(_)));
    }

    #[test]
    fn test_parse_reports_parse_errors() {
        let err = parse("LET = 3").unwrap_err();
        assert!(matches!(err, CompileError::Parse(_)));
    }
}
