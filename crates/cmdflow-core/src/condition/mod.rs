//! Condition expressions guarding declarative steps
//!
//! A small side-effect-free expression language over two bindings:
//! `steps` (outcomes of earlier steps keyed by id) and `context` (host
//! snapshot). Supports `||`, `&&`, `===`, `!==`, `==`, `!=`, `<`, `<=`, `>`,
//! `>=`, `!`, unary `-`, member access with `.name` or `[expr]`, and
//! number, string, boolean, `null` and `undefined` literals. Nothing can be
//! called or assigned.

pub mod eval;
pub mod lexer;
pub mod parser;

pub use eval::Scope;

use crate::errors::{CmdFlowError, Result};
use parser::Expr;

/// A parsed condition, reusable across evaluations
#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    source: String,
    expr: Expr,
}

impl Condition {
    /// # Errors
    ///
    /// `ConditionParse` with the byte offset of the offending token.
    pub fn parse(source: &str) -> Result<Self> {
        let expr = parser::parse(source).map_err(|e| CmdFlowError::ConditionParse {
            expression: source.to_string(),
            position: e.pos,
            message: e.message,
        })?;
        Ok(Self {
            source: source.to_string(),
            expr,
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// # Errors
    ///
    /// `ConditionEvaluation` for runtime faults such as member access on
    /// `null` or an unknown identifier.
    pub fn evaluate(&self, scope: &Scope) -> Result<bool> {
        eval::eval(&self.expr, scope)
            .map(|v| eval::truthy(&v))
            .map_err(|e| CmdFlowError::ConditionEvaluation {
                expression: self.source.clone(),
                message: e.message,
            })
    }
}

/// Parse and evaluate in one go
///
/// # Errors
///
/// `ConditionParse` or `ConditionEvaluation`.
pub fn evaluate(source: &str, scope: &Scope) -> Result<bool> {
    Condition::parse(source)?.evaluate(scope)
}
