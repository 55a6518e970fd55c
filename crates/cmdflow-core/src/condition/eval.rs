//! Tree-walking evaluator with JavaScript-like coercions
//!
//! `undefined` is modelled as `None`, everything else as `Some(Value)`.

use std::cmp::Ordering;

use crate::condition::parser::{BinaryOp, Expr, LogicalOp, UnaryOp};
use crate::value::Value;

/// Names bound while evaluating a condition
#[derive(Debug, Clone, Default)]
pub struct Scope {
    /// Outcomes of earlier steps, keyed by step id
    pub steps: Value,
    /// Snapshot of the host context
    pub context: Value,
}

impl Scope {
    pub fn new(steps: Value, context: Value) -> Self {
        Self { steps, context }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EvalError {
    pub message: String,
}

impl EvalError {
    fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

type Eval = Result<Option<Value>, EvalError>;

pub fn eval(expr: &Expr, scope: &Scope) -> Eval {
    match expr {
        Expr::Literal(v) => Ok(Some(v.clone())),
        Expr::Undefined => Ok(None),
        Expr::Ident(name) => match name.as_str() {
            "steps" => Ok(Some(scope.steps.clone())),
            "context" => Ok(Some(scope.context.clone())),
            other => Err(EvalError::new(format!("{other} is not defined"))),
        },
        Expr::Member { object, property } => {
            let target = eval(object, scope)?;
            let key = eval(property, scope)?;
            member(target, key)
        }
        Expr::Unary { op, expr } => {
            let v = eval(expr, scope)?;
            Ok(Some(match op {
                UnaryOp::Not => Value::Bool(!truthy(&v)),
                UnaryOp::Neg => Value::Number(-to_number(&v)),
            }))
        }
        Expr::Logical { op, left, right } => {
            let l = eval(left, scope)?;
            match (op, truthy(&l)) {
                (LogicalOp::And, false) | (LogicalOp::Or, true) => Ok(l),
                _ => eval(right, scope),
            }
        }
        Expr::Binary { op, left, right } => {
            let l = eval(left, scope)?;
            let r = eval(right, scope)?;
            let out = match op {
                BinaryOp::StrictEq => strict_eq(&l, &r),
                BinaryOp::StrictNe => !strict_eq(&l, &r),
                BinaryOp::LooseEq => loose_eq(&l, &r),
                BinaryOp::LooseNe => !loose_eq(&l, &r),
                BinaryOp::Lt => compare(&l, &r).is_some_and(Ordering::is_lt),
                BinaryOp::Le => compare(&l, &r).is_some_and(Ordering::is_le),
                BinaryOp::Gt => compare(&l, &r).is_some_and(Ordering::is_gt),
                BinaryOp::Ge => compare(&l, &r).is_some_and(Ordering::is_ge),
            };
            Ok(Some(Value::Bool(out)))
        }
    }
}

fn member(target: Option<Value>, key: Option<Value>) -> Eval {
    let key_text = key.as_ref().map_or_else(|| "undefined".to_string(), Value::to_string);
    let target = match target {
        None => {
            return Err(EvalError::new(format!(
                "Cannot read properties of undefined (reading '{key_text}')"
            )))
        }
        Some(Value::Null) => {
            return Err(EvalError::new(format!(
                "Cannot read properties of null (reading '{key_text}')"
            )))
        }
        Some(v) => v,
    };

    if let Some(Value::Number(n)) = key {
        if n >= 0.0 && n.fract() == 0.0 {
            let i = n as usize;
            match &target {
                Value::Array(items) => return Ok(items.get(i).cloned()),
                Value::String(s) => {
                    return Ok(s.chars().nth(i).map(|c| Value::String(c.to_string())))
                }
                _ => {}
            }
        }
    }

    Ok(target.property(&key_text))
}

/// JavaScript truthiness: undefined, null, false, 0, NaN and "" are falsy
pub fn truthy(v: &Option<Value>) -> bool {
    match v {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => *n != 0.0 && !n.is_nan(),
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Array(_) | Value::Object(_) | Value::Reference(_)) => true,
    }
}

fn to_number(v: &Option<Value>) -> f64 {
    match v {
        Some(Value::Number(n)) => *n,
        Some(Value::Bool(b)) => f64::from(u8::from(*b)),
        Some(Value::Null) => 0.0,
        Some(Value::String(s)) => string_to_number(s),
        _ => f64::NAN,
    }
}

fn string_to_number(s: &str) -> f64 {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        0.0
    } else {
        trimmed.parse().unwrap_or(f64::NAN)
    }
}

/// Same type and same value; arrays and objects compare structurally
fn strict_eq(l: &Option<Value>, r: &Option<Value>) -> bool {
    match (l, r) {
        (None, None) => true,
        (Some(a), Some(b)) => a == b,
        _ => false,
    }
}

fn loose_eq(l: &Option<Value>, r: &Option<Value>) -> bool {
    match (l, r) {
        (None | Some(Value::Null), None | Some(Value::Null)) => true,
        (None | Some(Value::Null), _) | (_, None | Some(Value::Null)) => false,
        (Some(Value::Number(n)), Some(Value::String(s)))
        | (Some(Value::String(s)), Some(Value::Number(n))) => *n == string_to_number(s),
        (Some(Value::Bool(_)), _) => loose_eq(&Some(Value::Number(to_number(l))), r),
        (_, Some(Value::Bool(_))) => loose_eq(l, &Some(Value::Number(to_number(r)))),
        _ => strict_eq(l, r),
    }
}

/// Numbers compare numerically, strings lexicographically; any other pairing
/// is unordered
fn compare(l: &Option<Value>, r: &Option<Value>) -> Option<Ordering> {
    match (l, r) {
        (Some(Value::Number(a)), Some(Value::Number(b))) => a.partial_cmp(b),
        (Some(Value::String(a)), Some(Value::String(b))) => Some(a.cmp(b)),
        _ => None,
    }
}
