//! Feedback - Online learning state for operator selection
//!
//! Tracks per-operator outcomes, turns them into selection weights,
//! remembers chains that worked, and owns the pacing backoff.

pub mod backoff;
pub mod memory;
pub mod selector;
pub mod stats;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub use self::backoff::{pace, Backoff, BackoffConfig, PacingConfig, MAX_DELAY};
pub use self::memory::SuccessChainMemory;
pub use self::selector::OperatorSelector;
pub use self::stats::{weight_for, OperatorStats, WeightingConfig};

use crate::mutation::{Chain, MutationOperator};

/// Outcome a caller reports for an emitted payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Success,
    Fail,
}

impl Outcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Fail => "fail",
        }
    }
}

impl From<bool> for Outcome {
    fn from(succeeded: bool) -> Self {
        if succeeded {
            Self::Success
        } else {
            Self::Fail
        }
    }
}

impl std::fmt::Display for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Per-operator statistics, created lazily on first report
#[derive(Debug, Clone)]
pub struct FeedbackStore {
    stats: HashMap<MutationOperator, OperatorStats>,
    weighting: WeightingConfig,
}

impl FeedbackStore {
    pub fn new(weighting: WeightingConfig) -> Self {
        Self {
            stats: HashMap::new(),
            weighting,
        }
    }

    /// Record `outcome` for every operator in the chain
    pub fn record_chain(&mut self, chain: &Chain, outcome: Outcome, now: DateTime<Utc>) {
        for op in chain.iter() {
            self.stats.entry(op).or_default().record(outcome, now);
        }
    }

    pub fn stats(&self, op: MutationOperator) -> Option<&OperatorStats> {
        self.stats.get(&op)
    }

    /// Current weight; operators never reported on get the neutral prior
    pub fn weight(&self, op: MutationOperator, now: DateTime<Utc>) -> f64 {
        match self.stats.get(&op) {
            Some(stats) => stats.weight(now, &self.weighting),
            None => self.weighting.neutral_prior,
        }
    }

    pub fn weighting(&self) -> &WeightingConfig {
        &self.weighting
    }

    pub fn iter(&self) -> impl Iterator<Item = (&MutationOperator, &OperatorStats)> {
        self.stats.iter()
    }
}
