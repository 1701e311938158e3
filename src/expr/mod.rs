// src/expr/mod.rs

//! A small, side-effect-free Python-style expression language.
//!
//! Tokens on the command line are evaluated with [`evaluate`]. The language
//! covers literals, containers, comprehensions, operators and a fixed set of
//! builtins, plus the read-only name `n`. There is no access to the host:
//! no imports, attributes other than string/dict methods, or assignment.

mod ast;
mod builtins;
mod error;
mod eval;
mod format;
mod lexer;
mod limits;
mod ops;
mod parser;
mod render;
mod value;

pub use error::{EvalError, EvalResult};
pub use eval::{EvalContext, evaluate};
pub use limits::{DEFAULT_MAX_SEQUENCE_LEN, Limits};
pub use ops::iterate;
pub use render::float_repr;
pub use value::{RangeValue, Value};
