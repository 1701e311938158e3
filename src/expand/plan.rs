// src/expand/plan.rs

use tracing::{debug, warn};

use crate::errors::{BulkExecError, Result};
use crate::expr::{EvalContext, Limits};

use super::resolve::{Resolved, resolve_token};

/// One resolved argument list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    /// Zero-based position in the run.
    pub index: usize,
    pub argv: Vec<String>,
}

impl Invocation {
    pub fn program(&self) -> &str {
        self.argv.first().map(String::as_str).unwrap_or_default()
    }
}

/// The evaluated command line, from which invocations are produced lazily.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpansionPlan {
    tokens: Vec<String>,
    slots: Vec<Resolved>,
    count: usize,
}

impl ExpansionPlan {
    /// Evaluate every token left to right.
    ///
    /// The name `n` seen by a token is the longest expandable found among the
    /// tokens before it, starting at 1.
    pub fn build(tokens: &[String], limits: &Limits) -> Result<Self> {
        if tokens.is_empty() {
            return Err(BulkExecError::EmptyCommand);
        }

        let mut n = 1usize;
        let mut slots = Vec::with_capacity(tokens.len());
        for token in tokens {
            let resolved = resolve_token(token, &EvalContext::new(n, *limits))?;
            if resolved.is_expandable() {
                n = n.max(resolved.len());
            }
            slots.push(resolved);
        }

        let count = if let Some(position) = slots.iter().position(Resolved::is_empty) {
            warn!(
                token = %tokens[position],
                "argument expanded to an empty sequence; nothing will run"
            );
            0
        } else {
            slots.iter().map(Resolved::len).max().unwrap_or(1)
        };
        debug!(invocations = count, "expansion plan ready");

        Ok(Self {
            tokens: tokens.to_vec(),
            slots,
            count,
        })
    }

    /// The raw tokens as given on the command line.
    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    pub fn slots(&self) -> &[Resolved] {
        &self.slots
    }

    pub fn invocation_count(&self) -> usize {
        self.count
    }

    /// Invocation `index`, or `None` past the end.
    pub fn invocation(&self, index: usize) -> Option<Invocation> {
        if index >= self.count {
            return None;
        }
        Some(Invocation {
            index,
            argv: self
                .slots
                .iter()
                .map(|slot| slot.at(index).to_string())
                .collect(),
        })
    }

    pub fn invocations(&self) -> impl Iterator<Item = Invocation> + '_ {
        (0..self.count).filter_map(|i| self.invocation(i))
    }
}

/// Expand `tokens` into every invocation's argument list, in order.
pub fn expand(tokens: &[String], limits: &Limits) -> Result<Vec<Vec<String>>> {
    let plan = ExpansionPlan::build(tokens, limits)?;
    Ok(plan.invocations().map(|inv| inv.argv).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn n_tracks_longest_expandable_to_the_left() {
        let plan = ExpansionPlan::build(
            &tokens(&["echo", "n", "range(3)", "n", "range(2)", "n"]),
            &Limits::default(),
        )
        .unwrap();
        let first = plan.invocation(0).unwrap();
        assert_eq!(first.argv, ["echo", "1", "0", "3", "0", "3"]);
        assert_eq!(plan.invocation_count(), 3);
        assert_eq!(plan.invocation(3), None);
    }

    #[test]
    fn empty_command_is_rejected() {
        assert!(matches!(
            ExpansionPlan::build(&[], &Limits::default()),
            Err(BulkExecError::EmptyCommand)
        ));
    }
}
