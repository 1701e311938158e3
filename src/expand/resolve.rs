// src/expand/resolve.rs

use tracing::debug;

use crate::errors::{BulkExecError, Result};
use crate::expr::{EvalContext, EvalError, Value, evaluate, iterate};

/// What one raw token turned into.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolved {
    /// Same text in every invocation.
    Scalar(String),
    /// One rendered element per invocation, cycled when shorter than the
    /// longest expandable.
    Expandable(Vec<String>),
}

impl Resolved {
    pub fn len(&self) -> usize {
        match self {
            Resolved::Scalar(_) => 1,
            Resolved::Expandable(items) => items.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Resolved::Expandable(items) if items.is_empty())
    }

    pub fn is_expandable(&self) -> bool {
        matches!(self, Resolved::Expandable(_))
    }

    /// Text for invocation `index`. Must not be called on an empty
    /// expandable.
    pub fn at(&self, index: usize) -> &str {
        match self {
            Resolved::Scalar(text) => text,
            Resolved::Expandable(items) => &items[index % items.len()],
        }
    }
}

/// Evaluate a single token.
///
/// Any evaluation failure leaves the token as literal text; only an
/// unbounded sequence is reported.
pub fn resolve_token(token: &str, ctx: &EvalContext) -> Result<Resolved> {
    let value = match evaluate(token, ctx) {
        Ok(value) => value,
        Err(EvalError::Unbounded { len, limit }) => {
            debug!(token, len = %len, limit, "expression exceeds the sequence limit");
            return Err(BulkExecError::UnboundedSequence {
                token: token.to_string(),
                limit,
            });
        }
        Err(err) => {
            debug!(token, error = %err, "token is not an expression; keeping it literal");
            return Ok(Resolved::Scalar(token.to_string()));
        }
    };
    debug!(token, value = %value, "evaluated token");

    if !value.is_expandable() {
        return Ok(Resolved::Scalar(value.to_string()));
    }
    let items = match iterate(&value, &ctx.limits) {
        Ok(items) => items,
        Err(EvalError::Unbounded { limit, .. }) => {
            return Err(BulkExecError::UnboundedSequence {
                token: token.to_string(),
                limit,
            });
        }
        Err(err) => {
            debug!(token, error = %err, "could not iterate value; keeping it literal");
            return Ok(Resolved::Scalar(token.to_string()));
        }
    };
    Ok(Resolved::Expandable(
        items.iter().map(Value::to_string).collect(),
    ))
}
