//! Operator Selection - Roulette-wheel choice over feedback weights
//!
//! Operators are walked in descending weight order while accumulating
//! weight until the running sum reaches a uniform draw over the total.

use chrono::{DateTime, Utc};
use rand::Rng;

use super::FeedbackStore;
use crate::mutation::MutationOperator;

/// Weighted-random operator selection
pub struct OperatorSelector;

impl OperatorSelector {
    /// Score every operator, highest weight first (registry order on ties)
    pub fn ranked(
        operators: &[MutationOperator],
        store: &FeedbackStore,
        now: DateTime<Utc>,
    ) -> Vec<(MutationOperator, f64)> {
        let mut ranked: Vec<(MutationOperator, f64)> = operators
            .iter()
            .map(|&op| (op, store.weight(op, now)))
            .collect();
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
        ranked
    }

    /// Pick one operator. Returns `None` only for an empty registry.
    pub fn select(
        operators: &[MutationOperator],
        store: &FeedbackStore,
        now: DateTime<Utc>,
        rng: &mut impl Rng,
    ) -> Option<MutationOperator> {
        if operators.is_empty() {
            return None;
        }

        let ranked = Self::ranked(operators, store, now);
        let total: f64 = ranked.iter().map(|(_, w)| w).sum();

        if total.is_finite() && total > 0.0 {
            let target = rng.gen_range(0.0..total);
            let mut acc = 0.0;
            for (op, weight) in &ranked {
                acc += weight;
                if acc >= target {
                    return Some(*op);
                }
            }
        }

        tracing::trace!("Weighted draw fell through, picking uniformly");
        Some(operators[rng.gen_range(0..operators.len())])
    }
}
