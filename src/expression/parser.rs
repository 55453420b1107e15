//! Recursive-descent parser for the condition grammar.
//!
//! ```text
//! or         := and (("||" | "or") and)*
//! and        := comparison (("&&" | "and") comparison)*
//! comparison := unary (compare-op unary)*
//! unary      := ("!" | "not" | "-" | "+") unary | postfix
//! postfix    := primary ("." name | "[" or "]")*
//! primary    := number | string | true | false | null | name
//!             | "(" or ")" | "[" (or ("," or)*)? "]"
//! ```

use super::ast::{CompareOp, Expr, LogicalOp, UnaryOp};
use super::lexer::{Spanned, Token, tokenize};
use crate::error::ExpressionError;
use serde_json::Value;

/// Deepest nesting of sub-expressions the parser will descend into.
const MAX_PARSE_DEPTH: usize = 64;

/// Parse a condition into an [`Expr`].
pub fn parse_expression(source: &str) -> Result<Expr, ExpressionError> {
    let fail = |reason: String| ExpressionError::new(source, reason);

    let tokens = tokenize(source).map_err(fail)?;
    if tokens.is_empty() {
        return Err(fail("empty expression".to_string()));
    }

    let mut parser = Parser {
        tokens,
        pos: 0,
        depth: 0,
    };
    let expr = parser.or().map_err(fail)?;
    if let Some(extra) = parser.peek_spanned() {
        return Err(fail(format!(
            "unexpected {} at position {}",
            extra.token.describe(),
            extra.offset
        )));
    }
    Ok(expr)
}

struct Parser {
    tokens: Vec<Spanned>,
    pos: usize,
    depth: usize,
}

type ParseResult = Result<Expr, String>;

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|s| &s.token)
    }

    fn peek_spanned(&self) -> Option<&Spanned> {
        self.tokens.get(self.pos)
    }

    fn peek_at(&self, ahead: usize) -> Option<&Token> {
        self.tokens.get(self.pos + ahead).map(|s| &s.token)
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).map(|s| s.token.clone());
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn expect(&mut self, expected: Token) -> Result<(), String> {
        match self.peek_spanned() {
            Some(spanned) if spanned.token == expected => {
                self.pos += 1;
                Ok(())
            }
            Some(spanned) => Err(format!(
                "expected {} but found {} at position {}",
                expected.describe(),
                spanned.token.describe(),
                spanned.offset
            )),
            None => Err(format!(
                "expected {} but reached end of expression",
                expected.describe()
            )),
        }
    }

    fn enter(&mut self) -> Result<(), String> {
        self.depth += 1;
        if self.depth > MAX_PARSE_DEPTH {
            return Err(format!(
                "expression nesting exceeds {} levels",
                MAX_PARSE_DEPTH
            ));
        }
        Ok(())
    }

    fn or(&mut self) -> ParseResult {
        self.enter()?;
        let mut left = self.and()?;
        while self.peek() == Some(&Token::Or) {
            self.pos += 1;
            let right = self.and()?;
            left = Expr::Logical {
                op: LogicalOp::Or,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
        self.depth -= 1;
        Ok(left)
    }

    fn and(&mut self) -> ParseResult {
        let mut left = self.comparison()?;
        while self.peek() == Some(&Token::And) {
            self.pos += 1;
            let right = self.comparison()?;
            left = Expr::Logical {
                op: LogicalOp::And,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
        Ok(left)
    }

    fn comparison(&mut self) -> ParseResult {
        let mut left = self.unary()?;
        while let Some(op) = self.compare_op() {
            let right = self.unary()?;
            left = Expr::Compare {
                op,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
        Ok(left)
    }

    /// Consume a comparison operator, including the two-token `not in`.
    fn compare_op(&mut self) -> Option<CompareOp> {
        let op = match self.peek()? {
            Token::Eq => CompareOp::Eq,
            Token::NotEq => CompareOp::NotEq,
            Token::Lt => CompareOp::Lt,
            Token::Le => CompareOp::Le,
            Token::Gt => CompareOp::Gt,
            Token::Ge => CompareOp::Ge,
            Token::In => CompareOp::In,
            Token::Not if self.peek_at(1) == Some(&Token::In) => {
                self.pos += 1;
                CompareOp::NotIn
            }
            _ => return None,
        };
        self.pos += 1;
        Some(op)
    }

    fn unary(&mut self) -> ParseResult {
        let op = match self.peek() {
            Some(Token::Not) => UnaryOp::Not,
            Some(Token::Minus) => UnaryOp::Negate,
            Some(Token::Plus) => UnaryOp::Plus,
            _ => return self.postfix(),
        };
        self.pos += 1;
        self.enter()?;
        let operand = self.unary()?;
        self.depth -= 1;
        Ok(Expr::Unary {
            op,
            operand: Box::new(operand),
        })
    }

    fn postfix(&mut self) -> ParseResult {
        let mut expr = self.primary()?;
        loop {
            match self.peek() {
                Some(Token::Dot) => {
                    self.pos += 1;
                    let property = match self.next() {
                        Some(Token::Ident(name)) => name,
                        Some(other) => {
                            return Err(format!(
                                "expected property name after '.', found {}",
                                other.describe()
                            ));
                        }
                        None => {
                            return Err("expected property name after '.'".to_string());
                        }
                    };
                    expr = Expr::Member {
                        object: Box::new(expr),
                        property,
                    };
                }
                Some(Token::LBracket) => {
                    self.pos += 1;
                    let index = self.or()?;
                    self.expect(Token::RBracket)?;
                    expr = Expr::Index {
                        object: Box::new(expr),
                        index: Box::new(index),
                    };
                }
                Some(Token::LParen) => {
                    return Err("function calls are not supported".to_string());
                }
                _ => return Ok(expr),
            }
        }
    }

    fn primary(&mut self) -> ParseResult {
        let Some(spanned) = self.peek_spanned() else {
            return Err("unexpected end of expression".to_string());
        };
        let offset = spanned.offset;

        match self.next() {
            Some(Token::Number(n)) => Ok(Expr::Literal(Value::Number(n))),
            Some(Token::Str(s)) => Ok(Expr::Literal(Value::String(s))),
            Some(Token::True) => Ok(Expr::Literal(Value::Bool(true))),
            Some(Token::False) => Ok(Expr::Literal(Value::Bool(false))),
            Some(Token::Null) => Ok(Expr::Literal(Value::Null)),
            Some(Token::Ident(name)) => Ok(Expr::Identifier(name)),
            Some(Token::LParen) => {
                let inner = self.or()?;
                self.expect(Token::RParen)?;
                Ok(inner)
            }
            Some(Token::LBracket) => self.array_literal(),
            Some(other) => Err(format!(
                "unexpected {} at position {}",
                other.describe(),
                offset
            )),
            None => Err("unexpected end of expression".to_string()),
        }
    }

    fn array_literal(&mut self) -> ParseResult {
        let mut items = Vec::new();
        if self.peek() == Some(&Token::RBracket) {
            self.pos += 1;
            return Ok(Expr::Array(items));
        }
        loop {
            items.push(self.or()?);
            match self.next() {
                Some(Token::Comma) => continue,
                Some(Token::RBracket) => return Ok(Expr::Array(items)),
                Some(other) => {
                    return Err(format!(
                        "expected ',' or ']' in array literal, found {}",
                        other.describe()
                    ));
                }
                None => return Err("unterminated array literal".to_string()),
            }
        }
    }
}
