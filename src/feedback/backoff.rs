//! Backoff & Pacing - Bounded multiplicative backoff and cancellable delay
//!
//! Failures stretch the delay between emitted payloads, successes shrink it.
//! The delay itself is advisory and may be cut short by a cancellation token.

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Longest pacing delay ever returned
pub const MAX_DELAY: Duration = Duration::from_secs(300);

/// Backoff bounds and adjustment factors
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackoffConfig {
    pub min: f64,
    pub max: f64,
    /// Multiplier applied after a success
    pub relax_factor: f64,
    /// Multiplier applied after a failure
    pub tighten_factor: f64,
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self {
            min: 1.0,
            max: 5.0,
            relax_factor: 0.8,
            tighten_factor: 1.5,
        }
    }
}

/// Delay applied before returning each payload
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PacingConfig {
    pub enabled: bool,
    /// Base delay, scaled by the backoff factor
    pub base_secs: f64,
    /// Upper bound of the uniform jitter added on top
    pub jitter_secs: f64,
}

impl Default for PacingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            base_secs: 1.5,
            jitter_secs: 1.5,
        }
    }
}

impl PacingConfig {
    /// No delay at all
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }
}

/// Backoff factor, always within `[config.min, config.max]`
#[derive(Debug, Clone)]
pub struct Backoff {
    factor: f64,
    config: BackoffConfig,
}

impl Backoff {
    pub fn new(config: BackoffConfig) -> Self {
        Self {
            factor: config.min,
            config,
        }
    }

    pub fn factor(&self) -> f64 {
        self.factor
    }

    /// Shrink after a success
    pub fn relax(&mut self) -> f64 {
        self.factor = (self.factor * self.config.relax_factor).max(self.config.min);
        self.factor
    }

    /// Grow after a failure
    pub fn tighten(&mut self) -> f64 {
        self.factor = (self.factor * self.config.tighten_factor).min(self.config.max);
        self.factor
    }

    /// `base * factor + U(0, jitter)` capped at [`MAX_DELAY`], or zero when
    /// pacing is off
    pub fn delay(&self, pacing: &PacingConfig, rng: &mut impl Rng) -> Duration {
        if !pacing.enabled {
            return Duration::ZERO;
        }

        let jitter = if pacing.jitter_secs.is_finite() && pacing.jitter_secs > 0.0 {
            rng.gen_range(0.0..=pacing.jitter_secs)
        } else {
            0.0
        };
        // NaN collapses to zero through `max`
        let secs = (pacing.base_secs.max(0.0) * self.factor + jitter)
            .max(0.0)
            .min(MAX_DELAY.as_secs_f64());
        Duration::try_from_secs_f64(secs).unwrap_or(MAX_DELAY)
    }
}

/// Sleep for `delay` unless `cancel` fires first. Returns `false` when cancelled.
pub async fn pace(delay: Duration, cancel: &CancellationToken) -> bool {
    if delay.is_zero() {
        return !cancel.is_cancelled();
    }

    tokio::select! {
        _ = tokio::time::sleep(delay) => true,
        _ = cancel.cancelled() => {
            tracing::debug!("Pacing delay cancelled after request");
            false
        }
    }
}
