// src/expr/limits.rs

use super::error::{EvalError, EvalResult};

/// Default cap on how many elements a single expression may produce.
pub const DEFAULT_MAX_SEQUENCE_LEN: usize = 1_000_000;

/// Resource bounds applied while evaluating one token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limits {
    /// Longest sequence (range, repetition, comprehension, string) an
    /// expression may materialize.
    pub max_sequence_len: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_sequence_len: DEFAULT_MAX_SEQUENCE_LEN,
        }
    }
}

impl Limits {
    pub fn new(max_sequence_len: usize) -> Self {
        Self { max_sequence_len }
    }

    /// Fail with [`EvalError::Unbounded`] if `len` is over the cap.
    pub fn check(&self, len: u128) -> EvalResult<()> {
        if len > self.max_sequence_len as u128 {
            return Err(EvalError::Unbounded {
                len,
                limit: self.max_sequence_len,
            });
        }
        Ok(())
    }
}
