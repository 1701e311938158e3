// src/expr/error.rs

use thiserror::Error;

/// Why a single expression failed to evaluate.
///
/// Everything except [`EvalError::Unbounded`] is recovered by the expander:
/// the token is passed through as literal text.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EvalError {
    #[error("syntax error: {0}")]
    Syntax(String),

    #[error("name '{0}' is not defined")]
    Name(String),

    #[error("type error: {0}")]
    Type(String),

    #[error("value error: {0}")]
    Value(String),

    #[error("index out of range")]
    Index,

    #[error("key not found: {0}")]
    Key(String),

    #[error("division by zero")]
    ZeroDivision,

    #[error("integer overflow")]
    Overflow,

    #[error("sequence of {len} elements exceeds the limit of {limit}")]
    Unbounded { len: u128, limit: usize },
}

impl EvalError {
    pub fn syntax(msg: impl Into<String>) -> Self {
        EvalError::Syntax(msg.into())
    }

    pub fn type_error(msg: impl Into<String>) -> Self {
        EvalError::Type(msg.into())
    }

    pub fn value_error(msg: impl Into<String>) -> Self {
        EvalError::Value(msg.into())
    }

    /// True for the one failure that must reach the user.
    pub fn is_unbounded(&self) -> bool {
        matches!(self, EvalError::Unbounded { .. })
    }
}

pub type EvalResult<T> = std::result::Result<T, EvalError>;
