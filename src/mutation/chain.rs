//! Mutation Chains - Ordered operator sequences
//!
//! A chain is what the caller reports back on, and what the success memory
//! replays. It serializes as a plain list of operator names.

use serde::{Deserialize, Serialize};

use super::operator::MutationOperator;

/// Ordered sequence of applied operators
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Chain {
    operators: Vec<MutationOperator>,
}

impl Chain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, op: MutationOperator) {
        self.operators.push(op);
    }

    pub fn len(&self) -> usize {
        self.operators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operators.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = MutationOperator> + '_ {
        self.operators.iter().copied()
    }

    pub fn operators(&self) -> &[MutationOperator] {
        &self.operators
    }

    /// Operator names in application order
    pub fn names(&self) -> Vec<&'static str> {
        self.operators.iter().map(|op| op.as_str()).collect()
    }

    /// Keep only the most recent `n` operators
    pub fn retain_last(&mut self, n: usize) {
        if self.operators.len() > n {
            let excess = self.operators.len() - n;
            self.operators.drain(..excess);
        }
    }
}

impl From<Vec<MutationOperator>> for Chain {
    fn from(operators: Vec<MutationOperator>) -> Self {
        Self { operators }
    }
}

impl std::fmt::Display for Chain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.operators.is_empty() {
            return write!(f, "(empty)");
        }
        write!(f, "{}", self.names().join(" -> "))
    }
}
