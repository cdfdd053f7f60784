//! Recursive descent parser for NuwaScript.
//!
//! One method per precedence level, lowest binding first: OR, AND, NOT,
//! comparison, additive, multiplicative, unary, postfix, primary.
//! Comparison is non-associative: a single optional comparison operator
//! per level, so `a == b > c` is a syntax error rather than a silent
//! grouping.

use crate::compiler::ast::*;
use crate::compiler::tokens::{Span, Token, TokenKind};
use nuwa_core::Value;
use thiserror::Error;

#[derive(Debug, Error, Clone)]
pub enum ParseError {
    #[error("unexpected token {found} at line {line}, col {col}; expected {expected}")]
    Unexpected {
        found: String,
        expected: String,
        line: usize,
        col: usize,
    },
    #[error("invalid number literal '{lexeme}' at line {line}, col {col}")]
    InvalidNumber {
        lexeme: String,
        line: usize,
        col: usize,
    },
    #[error("expression cannot stand alone at line {line}, col {col}; only function and tool calls may be used as statements")]
    BareExpression { line: usize, col: usize },
}

pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    pub fn new(mut tokens: Vec<Token>) -> Self {
        if tokens.is_empty() {
            tokens.push(Token::new(TokenKind::Eof, Span::dummy()));
        }
        Self { tokens, pos: 0 }
    }

    fn current(&self) -> &Token {
        self.tokens
            .get(self.pos)
            .unwrap_or_else(|| self.tokens.last().unwrap())
    }

    fn peek_kind(&self) -> &TokenKind {
        &self.current().kind
    }

    fn advance(&mut self) -> &Token {
        let tok = &self.tokens[self.pos.min(self.tokens.len() - 1)];
        if self.pos < self.tokens.len() {
            self.pos += 1;
        }
        tok
    }

    fn at_end(&self) -> bool {
        matches!(self.peek_kind(), TokenKind::Eof)
    }

    fn prev_span(&self) -> Span {
        if self.pos == 0 {
            self.current().span
        } else {
            self.tokens[self.pos - 1].span
        }
    }

    fn unexpected(&self, expected: &str) -> ParseError {
        let tok = self.current();
        ParseError::Unexpected {
            found: format!("{}", tok.kind),
            expected: expected.to_string(),
            line: tok.span.line,
            col: tok.span.col,
        }
    }

    fn expect(&mut self, kind: &TokenKind) -> Result<Token, ParseError> {
        let tok = self.current().clone();
        if std::mem::discriminant(&tok.kind) == std::mem::discriminant(kind) {
            self.advance();
            Ok(tok)
        } else {
            Err(ParseError::Unexpected {
                found: format!("{}", tok.kind),
                expected: format!("{}", kind),
                line: tok.span.line,
                col: tok.span.col,
            })
        }
    }

    fn expect_ident(&mut self) -> Result<String, ParseError> {
        let tok = self.current().clone();
        if let TokenKind::Ident(name) = tok.kind {
            self.advance();
            Ok(name)
        } else {
            Err(ParseError::Unexpected {
                found: format!("{}", tok.kind),
                expected: "an identifier".to_string(),
                line: tok.span.line,
                col: tok.span.col,
            })
        }
    }

    // ── Statements ──

    pub fn parse_script(&mut self) -> Result<Script, ParseError> {
        let start = self.current().span;
        let mut statements = Vec::new();
        while !self.at_end() {
            statements.push(self.parse_stmt()?);
        }
        let span = statements.iter().fold(start, |acc, s| acc.merge(s.span()));
        Ok(Script { statements, span })
    }

    fn parse_stmt(&mut self) -> Result<Stmt, ParseError> {
        match self.peek_kind() {
            TokenKind::Let => self.parse_let(),
            TokenKind::If => self.parse_if(),
            TokenKind::For => self.parse_for(),
            TokenKind::Call => {
                let (tool, args, span) = self.parse_tool_call()?;
                Ok(Stmt::Call(CallStmt { tool, args, span }))
            }
            _ => self.parse_expr_stmt(),
        }
    }

    fn parse_let(&mut self) -> Result<Stmt, ParseError> {
        let start = self.advance().span; // LET
        let name = self.expect_ident()?;
        self.expect(&TokenKind::Assign)?;
        let value = self.parse_expression()?;
        let span = start.merge(value.span());
        Ok(Stmt::Let(LetStmt { name, value, span }))
    }

    fn parse_if(&mut self) -> Result<Stmt, ParseError> {
        let start = self.advance().span; // IF
        let condition = self.parse_expression()?;
        self.expect(&TokenKind::Then)?;
        let then_body = self.parse_block(&[TokenKind::Else, TokenKind::End])?;
        let else_body = if matches!(self.peek_kind(), TokenKind::Else) {
            self.advance();
            Some(self.parse_block(&[TokenKind::End])?)
        } else {
            None
        };
        let end = self.expect(&TokenKind::End)?;
        let span = start.merge(end.span);
        Ok(Stmt::If(IfStmt {
            condition,
            then_body,
            else_body,
            span,
        }))
    }

    fn parse_for(&mut self) -> Result<Stmt, ParseError> {
        let start = self.advance().span; // FOR
        let var = self.expect_ident()?;
        self.expect(&TokenKind::In)?;
        let iter = self.parse_expression()?;
        self.expect(&TokenKind::Do)?;
        let body = self.parse_block(&[TokenKind::End])?;
        let end = self.expect(&TokenKind::End)?;
        let span = start.merge(end.span);
        Ok(Stmt::For(ForStmt {
            var,
            iter,
            body,
            span,
        }))
    }

    fn parse_block(&mut self, stops: &[TokenKind]) -> Result<Vec<Stmt>, ParseError> {
        let mut body = Vec::new();
        while !self.at_end() && !stops.contains(self.peek_kind()) {
            body.push(self.parse_stmt()?);
        }
        Ok(body)
    }

    fn parse_expr_stmt(&mut self) -> Result<Stmt, ParseError> {
        let expr = self.parse_expression()?;
        let span = expr.span();
        if !matches!(expr, Expr::FunctionCall { .. } | Expr::ToolCall { .. }) {
            return Err(ParseError::BareExpression {
                line: span.line,
                col: span.col,
            });
        }
        Ok(Stmt::Expr(ExprStmt { expr, span }))
    }

    /// Parse `CALL name { k: v, ... }`, shared by the statement and
    /// expression forms. Tool calls always use braces and named arguments;
    /// parenthesised positional calls are reserved for built-ins.
    fn parse_tool_call(&mut self) -> Result<(String, Vec<NamedArg>, Span), ParseError> {
        let start = self.expect(&TokenKind::Call)?.span;
        let tool = self.expect_ident()?;
        self.expect(&TokenKind::LBrace)?;
        let mut args = Vec::new();
        if !matches!(self.peek_kind(), TokenKind::RBrace) {
            loop {
                let arg_start = self.current().span;
                let name = self.expect_ident()?;
                self.expect(&TokenKind::Colon)?;
                let value = self.parse_expression()?;
                let span = arg_start.merge(value.span());
                args.push(NamedArg { name, value, span });
                if matches!(self.peek_kind(), TokenKind::Comma) {
                    self.advance();
                } else {
                    break;
                }
            }
        }
        let end = self.expect(&TokenKind::RBrace)?.span;
        Ok((tool, args, start.merge(end)))
    }

    // ── Expressions ──

    fn parse_expression(&mut self) -> Result<Expr, ParseError> {
        self.parse_or()
    }

    fn parse_or(&mut self) -> Result<Expr, ParseError> {
        let mut lhs = self.parse_and()?;
        while matches!(self.peek_kind(), TokenKind::Or) {
            self.advance();
            let rhs = self.parse_and()?;
            let span = lhs.span().merge(rhs.span());
            lhs = Expr::BinOp(Box::new(lhs), BinOp::Or, Box::new(rhs), span);
        }
        Ok(lhs)
    }

    fn parse_and(&mut self) -> Result<Expr, ParseError> {
        let mut lhs = self.parse_not()?;
        while matches!(self.peek_kind(), TokenKind::And) {
            self.advance();
            let rhs = self.parse_not()?;
            let span = lhs.span().merge(rhs.span());
            lhs = Expr::BinOp(Box::new(lhs), BinOp::And, Box::new(rhs), span);
        }
        Ok(lhs)
    }

    fn parse_not(&mut self) -> Result<Expr, ParseError> {
        if matches!(self.peek_kind(), TokenKind::Not) {
            let start = self.advance().span;
            let operand = self.parse_not()?;
            let span = start.merge(operand.span());
            Ok(Expr::UnaryOp(UnaryOp::Not, Box::new(operand), span))
        } else {
            self.parse_comparison()
        }
    }

    fn parse_comparison(&mut self) -> Result<Expr, ParseError> {
        let lhs = self.parse_additive()?;
        let op = match self.peek_kind() {
            TokenKind::Eq => BinOp::Eq,
            TokenKind::NotEq => BinOp::NotEq,
            TokenKind::Gt => BinOp::Gt,
            TokenKind::Lt => BinOp::Lt,
            TokenKind::GtEq => BinOp::GtEq,
            TokenKind::LtEq => BinOp::LtEq,
            _ => return Ok(lhs),
        };
        self.advance();
        let rhs = self.parse_additive()?;
        let span = lhs.span().merge(rhs.span());
        Ok(Expr::BinOp(Box::new(lhs), op, Box::new(rhs), span))
    }

    fn parse_additive(&mut self) -> Result<Expr, ParseError> {
        let mut lhs = self.parse_multiplicative()?;
        loop {
            let op = match self.peek_kind() {
                TokenKind::Plus => BinOp::Add,
                TokenKind::Minus => BinOp::Sub,
                _ => break,
            };
            self.advance();
            let rhs = self.parse_multiplicative()?;
            let span = lhs.span().merge(rhs.span());
            lhs = Expr::BinOp(Box::new(lhs), op, Box::new(rhs), span);
        }
        Ok(lhs)
    }

    fn parse_multiplicative(&mut self) -> Result<Expr, ParseError> {
        let mut lhs = self.parse_unary()?;
        loop {
            let op = match self.peek_kind() {
                TokenKind::Star => BinOp::Mul,
                TokenKind::Slash => BinOp::Div,
                TokenKind::Percent => BinOp::Mod,
                _ => break,
            };
            self.advance();
            let rhs = self.parse_unary()?;
            let span = lhs.span().merge(rhs.span());
            lhs = Expr::BinOp(Box::new(lhs), op, Box::new(rhs), span);
        }
        Ok(lhs)
    }

    fn parse_unary(&mut self) -> Result<Expr, ParseError> {
        let op = match self.peek_kind() {
            TokenKind::Plus => UnaryOp::Pos,
            TokenKind::Minus => UnaryOp::Neg,
            _ => return self.parse_postfix(),
        };
        let start = self.advance().span;
        let operand = self.parse_unary()?;
        let span = start.merge(operand.span());
        Ok(Expr::UnaryOp(op, Box::new(operand), span))
    }

    fn parse_postfix(&mut self) -> Result<Expr, ParseError> {
        let mut expr = self.parse_primary()?;
        loop {
            match self.peek_kind() {
                TokenKind::Dot => {
                    self.advance();
                    let prop = self.expect_ident()?;
                    let span = expr.span().merge(self.prev_span());
                    expr = Expr::MemberAccess(Box::new(expr), prop, span);
                }
                TokenKind::LBracket => {
                    self.advance();
                    let index = self.parse_expression()?;
                    let end = self.expect(&TokenKind::RBracket)?.span;
                    let span = expr.span().merge(end);
                    expr = Expr::IndexAccess(Box::new(expr), Box::new(index), span);
                }
                _ => break,
            }
        }
        Ok(expr)
    }

    fn parse_primary(&mut self) -> Result<Expr, ParseError> {
        let tok = self.current().clone();
        match tok.kind {
            TokenKind::NumberLit(lexeme) => {
                self.advance();
                let n: f64 = lexeme.parse().map_err(|_| ParseError::InvalidNumber {
                    lexeme: lexeme.clone(),
                    line: tok.span.line,
                    col: tok.span.col,
                })?;
                Ok(Expr::Literal(Value::Number(n), tok.span))
            }
            TokenKind::StringLit(s) => {
                self.advance();
                Ok(Expr::Literal(Value::String(s), tok.span))
            }
            TokenKind::BoolLit(b) => {
                self.advance();
                Ok(Expr::Literal(Value::Bool(b), tok.span))
            }
            TokenKind::NullLit => {
                self.advance();
                Ok(Expr::Literal(Value::Null, tok.span))
            }
            TokenKind::LBracket => self.parse_list_literal(),
            TokenKind::LBrace => self.parse_object_literal(),
            TokenKind::LParen => {
                self.advance();
                let expr = self.parse_expression()?;
                self.expect(&TokenKind::RParen)?;
                Ok(expr)
            }
            TokenKind::Call => {
                let (tool, args, span) = self.parse_tool_call()?;
                Ok(Expr::ToolCall { tool, args, span })
            }
            TokenKind::Ident(name) => {
                self.advance();
                if matches!(self.peek_kind(), TokenKind::LParen) {
                    self.parse_function_call(name, tok.span)
                } else {
                    Ok(Expr::Variable(name, tok.span))
                }
            }
            _ => Err(self.unexpected("an expression")),
        }
    }

    fn parse_function_call(&mut self, name: String, start: Span) -> Result<Expr, ParseError> {
        self.advance(); // (
        let mut args = Vec::new();
        if !matches!(self.peek_kind(), TokenKind::RParen) {
            loop {
                args.push(self.parse_expression()?);
                if matches!(self.peek_kind(), TokenKind::Comma) {
                    self.advance();
                } else {
                    break;
                }
            }
        }
        let end = self.expect(&TokenKind::RParen)?.span;
        Ok(Expr::FunctionCall {
            name,
            args,
            span: start.merge(end),
        })
    }

    fn parse_list_literal(&mut self) -> Result<Expr, ParseError> {
        let start = self.advance().span; // [
        let mut elements = Vec::new();
        if !matches!(self.peek_kind(), TokenKind::RBracket) {
            loop {
                elements.push(self.parse_expression()?);
                if matches!(self.peek_kind(), TokenKind::Comma) {
                    self.advance();
                } else {
                    break;
                }
            }
        }
        let end = self.expect(&TokenKind::RBracket)?.span;
        Ok(Expr::ListLit(elements, start.merge(end)))
    }

    fn parse_object_literal(&mut self) -> Result<Expr, ParseError> {
        let start = self.advance().span; // {
        let mut entries = Vec::new();
        if !matches!(self.peek_kind(), TokenKind::RBrace) {
            loop {
                let key = match self.peek_kind().clone() {
                    TokenKind::Ident(k) => {
                        self.advance();
                        k
                    }
                    TokenKind::StringLit(k) => {
                        self.advance();
                        k
                    }
                    _ => return Err(self.unexpected("a property name")),
                };
                self.expect(&TokenKind::Colon)?;
                let value = self.parse_expression()?;
                entries.push((key, value));
                if matches!(self.peek_kind(), TokenKind::Comma) {
                    self.advance();
                } else {
                    break;
                }
            }
        }
        let end = self.expect(&TokenKind::RBrace)?.span;
        Ok(Expr::ObjectLit(entries, start.merge(end)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::lexer::Lexer;

    fn parse(source: &str) -> Result<Script, ParseError> {
        let tokens = Lexer::new(source).tokenize().expect("lex failure");
        Parser::new(tokens).parse_script()
    }

    #[test]
    fn test_precedence() {
        // 10 + 6 / 2 parses as 10 + (6 / 2)
        let script = parse("LET r = 10 + 6 / 2").unwrap();
        let Stmt::Let(ls) = &script.statements[0] else {
            panic!("expected LET");
        };
        let Expr::BinOp(_, BinOp::Add, rhs, _) = &ls.value else {
            panic!("expected + at top, got {:?}", ls.value);
        };
        assert!(matches!(**rhs, Expr::BinOp(_, BinOp::Div, _, _)));
    }

    #[test]
    fn test_comparison_is_single_shot() {
        assert!(parse("LET r = 1 == 2 > 3").is_err());
    }

    #[test]
    fn test_not_is_right_associative() {
        let script = parse("LET r = NOT NOT true").unwrap();
        let Stmt::Let(ls) = &script.statements[0] else {
            panic!("expected LET");
        };
        let Expr::UnaryOp(UnaryOp::Not, inner, _) = &ls.value else {
            panic!("expected NOT");
        };
        assert!(matches!(**inner, Expr::UnaryOp(UnaryOp::Not, _, _)));
    }

    #[test]
    fn test_tool_call_requires_braces() {
        assert!(parse("CALL get_price { token: \"BTC\" }").is_ok());
        assert!(parse("CALL get_price(\"BTC\")").is_err());
    }

    #[test]
    fn test_bare_expression_statement_rejected() {
        assert!(matches!(
            parse("1 + 2").unwrap_err(),
            ParseError::BareExpression { .. }
        ));
        assert!(parse("PRINT(1)").is_ok());
    }

    #[test]
    fn test_postfix_chain() {
        let script = parse("LET n = data.items[0].name").unwrap();
        let Stmt::Let(ls) = &script.statements[0] else {
            panic!("expected LET");
        };
        assert!(matches!(ls.value, Expr::MemberAccess(_, ref prop, _) if prop == "name"));
    }
}
