//! Tree-walking evaluation of parsed conditions.

use super::ast::{CompareOp, Expr, LogicalOp, UnaryOp};
use super::parser::parse_expression;
use crate::error::{ExpressionError, Result};
use crate::path::{PathStep, resolve_steps, step_into, value_kind};
use crate::security::SecurityValidator;
use serde_json::{Map, Number, Value};
use std::cmp::Ordering;

/// Evaluates conditions against a variable snapshot.
///
/// Every call re-runs the expression length and deny-list checks, parses a
/// fresh AST and walks it. Nothing is ever executed as code.
#[derive(Debug, Clone, Copy)]
pub struct ExpressionEvaluator<'a> {
    validator: &'a SecurityValidator,
}

impl<'a> ExpressionEvaluator<'a> {
    pub fn new(validator: &'a SecurityValidator) -> Self {
        Self { validator }
    }

    /// Evaluate `expression` and coerce the result to a boolean.
    ///
    /// # Returns
    ///
    /// * `Ok(bool)` - The truthiness of the result
    /// * `Err(ItsError::Security)` - The expression failed the length or
    ///   deny-list check
    /// * `Err(ItsError::Expression)` - Parse failure or runtime error
    pub fn evaluate(&self, expression: &str, variables: &Map<String, Value>) -> Result<bool> {
        self.validator.validate_expression(expression)?;
        let ast = parse_expression(expression)?;
        let value = evaluate_ast(&ast, variables)
            .map_err(|reason| ExpressionError::new(expression, reason))?;
        Ok(is_truthy(&value))
    }
}

/// Evaluate a parsed tree to a value.
///
/// Errors carry a reason only; the caller attaches the expression text.
pub fn evaluate_ast(expr: &Expr, variables: &Map<String, Value>) -> std::result::Result<Value, String> {
    Scope { variables }.eval(expr)
}

struct Scope<'a> {
    variables: &'a Map<String, Value>,
}

type Eval = std::result::Result<Value, String>;

impl Scope<'_> {
    fn eval(&self, expr: &Expr) -> Eval {
        match expr {
            Expr::Literal(value) => Ok(value.clone()),
            Expr::Identifier(name) => {
                resolve_steps(self.variables, &[PathStep::Property(name.clone())]).map_err(|e| {
                    match e.available_keys() {
                        [] => format!("undefined variable '{}': {}", name, e),
                        keys => format!(
                            "undefined variable '{}': {} (available: {})",
                            name,
                            e,
                            keys.join(", ")
                        ),
                    }
                })
            }
            Expr::Member { object, property } => {
                let base = self.eval(object)?;
                step(&base, &PathStep::Property(property.clone()))
            }
            Expr::Index { object, index } => {
                let base = self.eval(object)?;
                let index = self.eval(index)?;
                step(&base, &index_step(&index)?)
            }
            Expr::Unary { op, operand } => {
                let value = self.eval(operand)?;
                unary(*op, value)
            }
            Expr::Compare { op, left, right } => {
                let left = self.eval(left)?;
                let right = self.eval(right)?;
                compare(*op, &left, &right).map(Value::Bool)
            }
            Expr::Logical { op, left, right } => {
                let left = self.eval(left)?;
                match (op, is_truthy(&left)) {
                    (LogicalOp::And, false) | (LogicalOp::Or, true) => Ok(left),
                    _ => self.eval(right),
                }
            }
            Expr::Array(items) => items
                .iter()
                .map(|item| self.eval(item))
                .collect::<std::result::Result<Vec<_>, _>>()
                .map(Value::Array),
        }
    }
}

fn step(base: &Value, path_step: &PathStep) -> Eval {
    step_into(base, path_step)
        .map(|value| value.into_owned())
        .map_err(|e| e.to_string())
}

fn index_step(index: &Value) -> std::result::Result<PathStep, String> {
    match index {
        Value::Number(n) => integer(n)
            .map(PathStep::Index)
            .ok_or_else(|| format!("array index must be an integer, got {}", n)),
        Value::String(s) => Ok(PathStep::Property(s.clone())),
        other => Err(format!("cannot index with {}", value_kind(other))),
    }
}

fn integer(n: &Number) -> Option<i64> {
    if let Some(i) = n.as_i64() {
        return Some(i);
    }
    let f = n.as_f64()?;
    if f.fract() == 0.0 && f.abs() < i64::MAX as f64 {
        Some(f as i64)
    } else {
        None
    }
}

fn unary(op: UnaryOp, value: Value) -> Eval {
    match op {
        UnaryOp::Not => Ok(Value::Bool(!is_truthy(&value))),
        UnaryOp::Plus => match value {
            Value::Number(_) => Ok(value),
            other => Err(format!("unary '+' requires a number, got {}", value_kind(&other))),
        },
        UnaryOp::Negate => match &value {
            Value::Number(n) => negate(n),
            other => Err(format!("unary '-' requires a number, got {}", value_kind(other))),
        },
    }
}

fn negate(n: &Number) -> Eval {
    if let Some(i) = n.as_i64().and_then(i64::checked_neg) {
        return Ok(Value::from(i));
    }
    n.as_f64()
        .and_then(|f| Number::from_f64(-f))
        .map(Value::Number)
        .ok_or_else(|| format!("cannot negate {}", n))
}

fn compare(op: CompareOp, left: &Value, right: &Value) -> std::result::Result<bool, String> {
    match op {
        CompareOp::Eq => Ok(values_equal(left, right)),
        CompareOp::NotEq => Ok(!values_equal(left, right)),
        CompareOp::In => contains(right, left),
        CompareOp::NotIn => contains(right, left).map(|found| !found),
        CompareOp::Lt | CompareOp::Le | CompareOp::Gt | CompareOp::Ge => {
            let ordering = order(left, right).ok_or_else(|| {
                format!(
                    "cannot compare {} {} {}",
                    value_kind(left),
                    op.symbol(),
                    value_kind(right)
                )
            })?;
            Ok(match op {
                CompareOp::Lt => ordering == Ordering::Less,
                CompareOp::Le => ordering != Ordering::Greater,
                CompareOp::Gt => ordering == Ordering::Greater,
                _ => ordering != Ordering::Less,
            })
        }
    }
}

/// Structural equality with numbers compared by value, so `1 == 1.0`.
fn values_equal(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Number(a), Value::Number(b)) => match (a.as_f64(), b.as_f64()) {
            (Some(x), Some(y)) => x == y,
            _ => a == b,
        },
        (Value::Array(a), Value::Array(b)) => {
            a.len() == b.len() && a.iter().zip(b).all(|(x, y)| values_equal(x, y))
        }
        (Value::Object(a), Value::Object(b)) => {
            a.len() == b.len()
                && a
                    .iter()
                    .all(|(key, x)| b.get(key).is_some_and(|y| values_equal(x, y)))
        }
        _ => left == right,
    }
}

fn order(left: &Value, right: &Value) -> Option<Ordering> {
    match (left, right) {
        (Value::Number(a), Value::Number(b)) => a.as_f64()?.partial_cmp(&b.as_f64()?),
        (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
        _ => None,
    }
}

fn contains(haystack: &Value, needle: &Value) -> std::result::Result<bool, String> {
    match (haystack, needle) {
        (Value::Array(items), _) => Ok(items.iter().any(|item| values_equal(item, needle))),
        (Value::String(text), Value::String(part)) => Ok(text.contains(part.as_str())),
        (Value::Object(map), Value::String(key)) => Ok(map.contains_key(key)),
        _ => Err(format!(
            "'in' is not supported between {} and {}",
            value_kind(needle),
            value_kind(haystack)
        )),
    }
}

/// Truthiness: `null`, `false`, zero and the empty string are false.
///
/// Arrays and objects are always true, even when empty; test emptiness
/// with `.length`.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}
