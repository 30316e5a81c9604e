//! Mutation Module - Operator registry for SQL payload mutation
//!
//! Provides the fixed, ordered set of named operators and the
//! string transforms behind them.

pub mod chain;
pub mod dictionary;
pub mod operator;
pub mod sql;

use rand::Rng;
use thiserror::Error;

pub use self::chain::Chain;
pub use self::dictionary::{Dictionary, TokenCategory};
pub use self::operator::MutationOperator;
pub use self::sql::{shannon_entropy, SqlMutator};

/// Reasons an operator rejects its input
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TransformError {
    #[error("input is empty")]
    EmptyInput,

    #[error("input has no characters this operator can rewrite")]
    NoCandidates,

    #[error("input contains no SQL keywords")]
    NoKeywords,
}

/// Errors from registry lookups and operator application
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MutationError {
    #[error("unknown mutation operator: {0}")]
    UnknownOperator(String),

    #[error("operator {operator} failed: {source}")]
    Transform {
        operator: MutationOperator,
        #[source]
        source: TransformError,
    },
}

/// Fixed, ordered registry of mutation operators
pub struct MutationRegistry {
    operators: Vec<MutationOperator>,
    mutator: SqlMutator,
}

impl Default for MutationRegistry {
    fn default() -> Self {
        Self::new(SqlMutator::default())
    }
}

impl MutationRegistry {
    /// Registry with every operator over the given mutator
    pub fn new(mutator: SqlMutator) -> Self {
        Self::with_operators(MutationOperator::all(), mutator)
    }

    /// Registry restricted to a subset, kept in registry order without duplicates
    pub fn with_operators(operators: Vec<MutationOperator>, mutator: SqlMutator) -> Self {
        let operators = MutationOperator::all()
            .into_iter()
            .filter(|op| operators.contains(op))
            .collect();
        Self { operators, mutator }
    }

    pub fn operators(&self) -> &[MutationOperator] {
        &self.operators
    }

    pub fn mutator(&self) -> &SqlMutator {
        &self.mutator
    }

    pub fn contains(&self, op: MutationOperator) -> bool {
        self.operators.contains(&op)
    }

    /// Resolve an operator name
    pub fn lookup(&self, name: &str) -> Result<MutationOperator, MutationError> {
        let op: MutationOperator = name.parse()?;
        if self.operators.contains(&op) {
            Ok(op)
        } else {
            Err(MutationError::UnknownOperator(name.to_string()))
        }
    }

    /// Resolve a list of names, collecting any this registry does not hold
    pub fn resolve<S: AsRef<str>>(&self, names: &[S]) -> (Chain, Vec<String>) {
        let mut chain = Chain::new();
        let mut unknown = Vec::new();

        for name in names {
            match self.lookup(name.as_ref()) {
                Ok(op) => chain.push(op),
                Err(_) => unknown.push(name.as_ref().to_string()),
            }
        }

        (chain, unknown)
    }

    /// Apply an operator by name
    pub fn apply(
        &self,
        name: &str,
        input: &str,
        rng: &mut impl Rng,
    ) -> Result<String, MutationError> {
        let op = self.lookup(name)?;
        self.apply_operator(op, input, rng)
    }

    /// Apply a resolved operator
    pub fn apply_operator(
        &self,
        op: MutationOperator,
        input: &str,
        rng: &mut impl Rng,
    ) -> Result<String, MutationError> {
        if !self.contains(op) {
            return Err(MutationError::UnknownOperator(op.as_str().to_string()));
        }
        op.apply(&self.mutator, input, rng)
            .map_err(|source| MutationError::Transform {
                operator: op,
                source,
            })
    }
}
