// src/expand/mod.rs

//! Argument expansion.
//!
//! Each raw token is evaluated as an expression. Text and numbers become
//! scalars that are the same in every invocation; lists, tuples, sets,
//! dicts and ranges become expandables. The run has as many invocations as
//! the longest expandable, and shorter ones cycle:
//!
//! ```text
//! echo range(2) range(4)   ->   echo 0 0 / echo 1 1 / echo 0 2 / echo 1 3
//! ```
//!
//! Tokens that fail to evaluate (`echo`, `-l`, `foo.txt`) are kept verbatim.

mod plan;
mod resolve;

pub use plan::{ExpansionPlan, Invocation, expand};
pub use resolve::{Resolved, resolve_token};
