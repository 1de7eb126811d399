//! Parsing and evaluation of the `:expr(...)` sub-language.
//!
//! Expressions are parsed from expression-dialect tokens by precedence
//! climbing. Evaluation binds the variable `x` to the candidate node's value.
use crate::ast::{BinaryOperator, Expression, Literal, UnaryOperator};
use crate::error::{ParseError, SelectError};
use crate::lexer::{self, Dialect, Token, TokenKind};
use crate::operators;
use serde_json::{Map, Value};
use std::borrow::Cow;
use std::fmt;

/// Operator tiers from loosest to tightest binding. All tiers are
/// left-associative.
const PRECEDENCE: &[&[BinaryOperator]] = &[
    &[BinaryOperator::Or],
    &[BinaryOperator::And],
    &[
        BinaryOperator::Equals,
        BinaryOperator::NotEquals,
        BinaryOperator::LessThan,
        BinaryOperator::LessThanOrEqual,
        BinaryOperator::GreaterThan,
        BinaryOperator::GreaterThanOrEqual,
        BinaryOperator::StartsWith,
        BinaryOperator::EndsWith,
        BinaryOperator::Contains,
    ],
    &[BinaryOperator::Plus, BinaryOperator::Minus],
    &[
        BinaryOperator::Multiply,
        BinaryOperator::Divide,
        BinaryOperator::Modulo,
    ],
];

// --- Main Public Parser ---

/// Lexes and parses `text`. `base` is the offset of `text` inside the
/// enclosing selector and `max_depth` bounds parenthesis nesting.
pub fn parse_expression(text: &str, base: usize, max_depth: usize) -> Result<Expression, SelectError> {
    let tokens = lexer::lex_at(text, Dialect::Expression, base)?;
    let mut parser = ExpressionParser {
        tokens: &tokens,
        pos: 0,
        depth: 0,
        max_depth,
    };
    let expr = parser.binary_layer(0)?;
    match parser.peek() {
        None => Ok(expr),
        Some(token) => Err(ParseError::MalformedExpression(format!(
            "unexpected '{}' at offset {}",
            token.kind, token.offset
        ))
        .into()),
    }
}

struct ExpressionParser<'t> {
    tokens: &'t [Token],
    pos: usize,
    depth: usize,
    max_depth: usize,
}

impl<'t> ExpressionParser<'t> {
    fn peek(&self) -> Option<&'t Token> {
        self.tokens.get(self.pos)
    }

    fn advance(&mut self) -> Option<&'t Token> {
        let token = self.tokens.get(self.pos);
        self.pos += 1;
        token
    }

    fn peek_operator(&self, tier: &[BinaryOperator]) -> Option<BinaryOperator> {
        match self.peek() {
            Some(Token {
                kind: TokenKind::BinaryOperator(op),
                ..
            }) if tier.contains(op) => Some(*op),
            _ => None,
        }
    }

    /// Folds `sub (op sub)*` into a left-leaning tree for one precedence tier.
    fn binary_layer(&mut self, tier: usize) -> Result<Expression, ParseError> {
        let Some(tier_ops) = PRECEDENCE.get(tier) else {
            return self.unary();
        };
        let mut left = self.binary_layer(tier + 1)?;
        while let Some(op) = self.peek_operator(tier_ops) {
            self.advance();
            let right = self.binary_layer(tier + 1)?;
            left = Expression::BinaryOp {
                left: Box::new(left),
                op,
                right: Box::new(right),
            };
        }
        Ok(left)
    }

    fn unary(&mut self) -> Result<Expression, ParseError> {
        if self.peek_operator(&[BinaryOperator::Minus]).is_some() {
            self.advance();
            self.enter()?;
            let expr = self.unary()?;
            self.depth -= 1;
            return Ok(Expression::UnaryOp {
                op: UnaryOperator::Minus,
                expr: Box::new(expr),
            });
        }
        self.primary()
    }

    fn primary(&mut self) -> Result<Expression, ParseError> {
        match self.advance() {
            Some(Token {
                kind: TokenKind::Literal(literal),
                ..
            }) => Ok(Expression::Literal(literal.clone())),
            Some(Token {
                kind: TokenKind::Variable,
                ..
            }) => Ok(Expression::Variable),
            Some(Token {
                kind: TokenKind::OpenParen,
                offset,
            }) => {
                self.enter()?;
                let inner = self.binary_layer(0)?;
                self.depth -= 1;
                match self.advance() {
                    Some(Token {
                        kind: TokenKind::CloseParen,
                        ..
                    }) => Ok(inner),
                    _ => Err(ParseError::MalformedExpression(format!(
                        "unclosed '(' at offset {}",
                        offset
                    ))),
                }
            }
            Some(token) => Err(ParseError::MalformedExpression(format!(
                "unexpected '{}' at offset {}",
                token.kind, token.offset
            ))),
            None => Err(ParseError::MalformedExpression(
                "unexpected end of expression".to_string(),
            )),
        }
    }

    fn enter(&mut self) -> Result<(), ParseError> {
        self.depth += 1;
        if self.depth > self.max_depth {
            return Err(ParseError::NestingTooDeep {
                limit: self.max_depth,
            });
        }
        Ok(())
    }
}

// --- Evaluation ---

/// The value of an expression or sub-expression.
#[derive(Debug, Clone, PartialEq)]
pub enum ExprValue<'a> {
    Null,
    Boolean(bool),
    Number(f64),
    String(Cow<'a, str>),
    Array(&'a [Value]),
    Object(&'a Map<String, Value>),
}

impl<'a> ExprValue<'a> {
    pub fn from_value(value: &'a Value) -> Self {
        match value {
            Value::Null => ExprValue::Null,
            Value::Bool(b) => ExprValue::Boolean(*b),
            Value::Number(n) => ExprValue::Number(n.as_f64().unwrap_or(f64::NAN)),
            Value::String(s) => ExprValue::String(Cow::Borrowed(s)),
            Value::Array(items) => ExprValue::Array(items),
            Value::Object(members) => ExprValue::Object(members),
        }
    }

    pub fn from_literal(literal: &'a Literal) -> Self {
        match literal {
            Literal::Null => ExprValue::Null,
            Literal::Bool(b) => ExprValue::Boolean(*b),
            Literal::Number(n) => ExprValue::Number(*n),
            Literal::String(s) => ExprValue::String(Cow::Borrowed(s)),
        }
    }

    /// Non-empty strings, non-zero numbers, `true` and every container are
    /// truthy. `null` is not.
    pub fn is_truthy(&self) -> bool {
        match self {
            ExprValue::Null => false,
            ExprValue::Boolean(b) => *b,
            ExprValue::Number(n) => *n != 0.0 && !n.is_nan(),
            ExprValue::String(s) => !s.is_empty(),
            ExprValue::Array(_) | ExprValue::Object(_) => true,
        }
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            ExprValue::Null => "null",
            ExprValue::Boolean(_) => "boolean",
            ExprValue::Number(_) => "number",
            ExprValue::String(_) => "string",
            ExprValue::Array(_) => "array",
            ExprValue::Object(_) => "object",
        }
    }
}

impl fmt::Display for ExprValue<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExprValue::Null => f.write_str("null"),
            ExprValue::Boolean(b) => write!(f, "{}", b),
            ExprValue::Number(n) => write!(f, "{}", n),
            ExprValue::String(s) => write!(f, "{:?}", s),
            ExprValue::Array(items) => write!(f, "array of {}", items.len()),
            ExprValue::Object(members) => write!(f, "object of {}", members.len()),
        }
    }
}

/// Evaluates `expr` with `x` bound to `subject`.
pub fn evaluate<'a>(expr: &'a Expression, subject: &'a Value) -> Result<ExprValue<'a>, SelectError> {
    match expr {
        Expression::Literal(literal) => Ok(ExprValue::from_literal(literal)),
        Expression::Variable => Ok(ExprValue::from_value(subject)),
        Expression::UnaryOp { op, expr } => {
            let val = evaluate(expr, subject)?;
            match (op, val) {
                (UnaryOperator::Minus, ExprValue::Number(n)) => Ok(ExprValue::Number(-n)),
                (UnaryOperator::Minus, other) => Err(SelectError::MalformedExpression(format!(
                    "cannot negate {} {}",
                    other.kind_name(),
                    other
                ))),
            }
        }
        Expression::BinaryOp { left, op, right } => {
            let left_val = evaluate(left, subject)?;
            operators::evaluate(*op, left_val, || evaluate(right, subject))
        }
    }
}
