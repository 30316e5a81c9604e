//! Operator Statistics - Success/fail counters and recency-weighted scoring
//!
//! Weight combines the observed success rate, pushed through a steep sigmoid,
//! with a hyperbolic decay on time since the operator was last reported on.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Outcome;

/// Per-operator feedback counters
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OperatorStats {
    pub success_count: u64,
    pub fail_count: u64,
    /// Last time this operator was part of a reported chain
    pub last_used: Option<DateTime<Utc>>,
}

/// Parameters of the weighting function
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WeightingConfig {
    /// Weight of an operator with no reports
    pub neutral_prior: f64,
    /// Sigmoid slope around a 0.5 success rate
    pub sigmoid_slope: f64,
    /// Age in seconds at which decay halves the weight
    pub decay_horizon_secs: f64,
}

impl Default for WeightingConfig {
    fn default() -> Self {
        Self {
            neutral_prior: 0.5,
            sigmoid_slope: 12.0,
            decay_horizon_secs: 3600.0,
        }
    }
}

impl OperatorStats {
    pub fn total(&self) -> u64 {
        self.success_count + self.fail_count
    }

    /// Observed success rate, if any reports exist
    pub fn success_rate(&self) -> Option<f64> {
        match self.total() {
            0 => None,
            total => Some(self.success_count as f64 / total as f64),
        }
    }

    /// Seconds since the last report, clamped at zero
    pub fn age_secs(&self, now: DateTime<Utc>) -> f64 {
        match self.last_used {
            Some(last) => ((now - last).num_milliseconds() as f64 / 1000.0).max(0.0),
            None => 0.0,
        }
    }

    /// Record one outcome; the timestamp never moves backwards
    pub fn record(&mut self, outcome: Outcome, now: DateTime<Utc>) {
        match outcome {
            Outcome::Success => self.success_count += 1,
            Outcome::Fail => self.fail_count += 1,
        }
        self.last_used = Some(match self.last_used {
            Some(last) if last > now => last,
            _ => now,
        });
    }

    /// Selection weight at time `now`
    pub fn weight(&self, now: DateTime<Utc>, config: &WeightingConfig) -> f64 {
        match self.success_rate() {
            None => config.neutral_prior,
            Some(rate) => weight_for(rate, self.age_secs(now), config),
        }
    }
}

/// `sigmoid(slope * (rate - 0.5)) / (1 + age / horizon)`
pub fn weight_for(rate: f64, age_secs: f64, config: &WeightingConfig) -> f64 {
    let decay = 1.0 / (1.0 + age_secs.max(0.0) / config.decay_horizon_secs);
    sigmoid(config.sigmoid_slope * (rate - 0.5)) * decay
}

fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}
