//! Chain Builder - Fresh chain construction and verbatim replay
//!
//! A fresh chain repeatedly asks the selector for an operator, applies it,
//! and on success may append noise or hex-obfuscate the running payload.
//! Failed applications use up an iteration but not a chain slot.

use chrono::{DateTime, Utc};
use rand::Rng;

use super::config::EngineConfig;
use crate::feedback::{FeedbackStore, OperatorSelector};
use crate::mutation::{Chain, MutationOperator, MutationRegistry};

/// Payload produced by a fresh chain, before encoding
#[derive(Debug, Clone)]
pub struct BuiltChain {
    /// Logic-wrapped payload
    pub payload: String,
    /// Reportable chain, trimmed to the most recent operators
    pub chain: Chain,
    /// Operator applications that were rejected
    pub skipped: usize,
}

/// Builds and replays chains against one snapshot of feedback state
pub struct ChainBuilder<'a> {
    registry: &'a MutationRegistry,
    feedback: &'a FeedbackStore,
    config: &'a EngineConfig,
    now: DateTime<Utc>,
}

impl<'a> ChainBuilder<'a> {
    pub fn new(
        registry: &'a MutationRegistry,
        feedback: &'a FeedbackStore,
        config: &'a EngineConfig,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            registry,
            feedback,
            config,
            now,
        }
    }

    /// Build a fresh chain over `payload`
    pub fn build(&self, payload: &str, rng: &mut impl Rng) -> BuiltChain {
        let mutator = self.registry.mutator();
        let mut current = payload.to_string();
        let mut chain = Chain::new();
        let mut skipped = 0;

        for _ in 0..self.config.max_depth {
            let Some(op) =
                OperatorSelector::select(self.registry.operators(), self.feedback, self.now, rng)
            else {
                break;
            };

            match self.apply(op, &current, rng) {
                Some(next) => current = next,
                None => {
                    skipped += 1;
                    continue;
                }
            }
            chain.push(op);

            if rng.gen_bool(self.config.noise_probability) {
                let len = rng.gen_range(self.config.noise_min_len..=self.config.noise_max_len);
                let noise = mutator.noise(len, rng);
                if current.len() + noise.len() <= self.config.max_payload_bytes {
                    current.push_str(&noise);
                }
            }

            if rng.gen_bool(self.config.hex_probability) {
                let hexed = mutator.hex_obfuscate(&current, rng);
                if hexed.len() <= self.config.max_payload_bytes {
                    current = hexed;
                }
            }
        }

        let payload = mutator.logic_wrap(&current, rng);
        chain.retain_last(self.config.chain_retain);

        tracing::debug!(
            "Built chain {} ({} applied, {} skipped)",
            chain,
            chain.len(),
            skipped
        );

        BuiltChain {
            payload,
            chain,
            skipped,
        }
    }

    /// Apply a remembered chain in order, skipping steps that fail
    pub fn replay(&self, chain: &Chain, payload: &str, rng: &mut impl Rng) -> String {
        let mut current = payload.to_string();
        for op in chain.iter() {
            if let Some(next) = self.apply(op, &current, rng) {
                current = next;
            }
        }

        tracing::debug!("Replayed chain {}", chain);
        current
    }

    fn apply(&self, op: MutationOperator, input: &str, rng: &mut impl Rng) -> Option<String> {
        match self.registry.apply_operator(op, input, rng) {
            Ok(next) if next.len() > self.config.max_payload_bytes => {
                tracing::trace!("Dropping {} output of {} bytes", op, next.len());
                None
            }
            Ok(next) => Some(next),
            Err(e) => {
                tracing::trace!("Skipping step: {}", e);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feedback::WeightingConfig;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    fn fixtures() -> (MutationRegistry, FeedbackStore, EngineConfig) {
        (
            MutationRegistry::default(),
            FeedbackStore::new(WeightingConfig::default()),
            EngineConfig::default(),
        )
    }

    #[test]
    fn chain_is_bounded() {
        let (registry, feedback, config) = fixtures();
        let builder = ChainBuilder::new(&registry, &feedback, &config, Utc::now());
        let mut rng = SmallRng::seed_from_u64(1);

        for _ in 0..50 {
            let built = builder.build("SELECT * FROM users WHERE id=1", &mut rng);
            assert!(built.chain.len() <= config.chain_retain);
            assert!(built.chain.len() + built.skipped <= config.max_depth);
        }
    }

    #[test]
    fn output_is_logic_wrapped() {
        let (registry, feedback, config) = fixtures();
        let builder = ChainBuilder::new(&registry, &feedback, &config, Utc::now());
        let mut rng = SmallRng::seed_from_u64(2);

        let built = builder.build("1=1", &mut rng);
        let wrapped = [
            "IF(1=1,(",
            "CASE WHEN 1=1 THEN (",
            "IFNULL(NULL,(",
            "COALESCE(NULL,(",
            "CONCAT(CHAR(115,101,108),(",
        ];
        assert!(wrapped.iter().any(|prefix| built.payload.starts_with(prefix)));
    }

    #[test]
    fn zero_depth_only_wraps() {
        let (registry, feedback, config) = fixtures();
        let config = config.with_max_depth(0);
        let builder = ChainBuilder::new(&registry, &feedback, &config, Utc::now());
        let mut rng = SmallRng::seed_from_u64(3);

        let built = builder.build("abc", &mut rng);
        assert!(built.chain.is_empty());
        assert!(built.payload.contains("(abc)"));
    }

    #[test]
    fn empty_payload_still_produces_output() {
        let (registry, feedback, config) = fixtures();
        let builder = ChainBuilder::new(&registry, &feedback, &config, Utc::now());
        let mut rng = SmallRng::seed_from_u64(4);

        let built = builder.build("", &mut rng);
        assert!(!built.payload.is_empty());
    }

    #[test]
    fn failing_operators_are_not_recorded() {
        let registry = MutationRegistry::with_operators(
            vec![MutationOperator::KeywordSplit],
            Default::default(),
        );
        let feedback = FeedbackStore::new(WeightingConfig::default());
        let config = EngineConfig::default().with_max_depth(3);
        let builder = ChainBuilder::new(&registry, &feedback, &config, Utc::now());
        let mut rng = SmallRng::seed_from_u64(5);

        let built = builder.build("12345", &mut rng);
        assert_eq!(built.skipped, 3);
        assert!(built.chain.is_empty());
        assert!(built.payload.contains("(12345)"));
    }

    #[test]
    fn noise_respects_payload_cap() {
        let registry =
            MutationRegistry::with_operators(vec![MutationOperator::Reverse], Default::default());
        let feedback = FeedbackStore::new(WeightingConfig::default());
        let mut config = EngineConfig::default().with_max_depth(3);
        config.noise_probability = 1.0;
        config.hex_probability = 0.0;
        config.max_payload_bytes = 6;
        let builder = ChainBuilder::new(&registry, &feedback, &config, Utc::now());
        let mut rng = SmallRng::seed_from_u64(7);

        let built = builder.build("abcdef", &mut rng);
        assert_eq!(built.chain.len(), 3);
        assert!(built.payload.contains("(fedcba)"));
    }

    #[test]
    fn replay_applies_in_order() {
        let (registry, feedback, config) = fixtures();
        let builder = ChainBuilder::new(&registry, &feedback, &config, Utc::now());
        let mut rng = SmallRng::seed_from_u64(6);

        let chain = Chain::from(vec![
            MutationOperator::Reverse,
            MutationOperator::KeywordSplit,
            MutationOperator::Base64Percent,
        ]);
        // keyword split fails on the reversed text and is skipped
        let out = builder.replay(&chain, "abc", &mut rng);
        assert_eq!(out, registry.mutator().base64_percent("cba"));
    }
}
